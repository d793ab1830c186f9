use serde::{Deserialize, Serialize};

/// Text used for unlabeled numbered siblings, both in group heads and inside tails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardStyle {
    /// `*`
    Generic,
    /// `seq::*`, which the tree provider can create on replay.
    #[default]
    Positional,
}

impl WildcardStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            WildcardStyle::Generic => "*",
            WildcardStyle::Positional => "seq::*",
        }
    }

    /// Interprets a yes/no flag: only `n` and `no` (any case) select `*`.
    pub fn from_seq_flag(flag: &str) -> Self {
        match flag.to_ascii_lowercase().as_str() {
            "n" | "no" => WildcardStyle::Generic,
            _ => WildcardStyle::Positional,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub wildcard: WildcardStyle,
}

impl Config {
    pub fn with_wildcard(wildcard: WildcardStyle) -> Self {
        Self { wildcard }
    }
}
