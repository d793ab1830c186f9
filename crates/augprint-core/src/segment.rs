//! Splitting raw tree paths into literal fragments and positional tokens.
//!
//! A path such as `/files/etc/hosts/2/alias[1]` decomposes into
//!
//! ```text
//! Literal("/files/etc/hosts/") Bare("2") Literal("/") Labeled("alias", "1") Literal("")
//! ```
//!
//! Positional tokens are only recognized as whole path components: right after
//! a `/` and right before the next `/` (or the end of the path). Anything else,
//! including labels with characters outside `[-0-9A-Za-z_#]`, stays literal.

use regex::Regex;

/// One piece of a segmented path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Separator/prefix text between positional tokens.
    Literal(String),
    /// `label[index]`
    Labeled { label: String, index: String },
    /// A bare numbered component.
    Bare { index: String },
}

impl Segment {
    /// The original text of this segment.
    pub fn text(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Labeled { label, index } => format!("{label}[{index}]"),
            Segment::Bare { index } => index.clone(),
        }
    }
}

/// A positional token together with the literal fragment preceding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub prefix: &'a str,
    /// `None` for bare numbered components.
    pub label: Option<&'a str>,
    pub index: &'a str,
}

/// A path split into alternating literal fragments and positional tokens.
///
/// Invariant: `segments` starts and ends with a `Literal` (possibly empty) and
/// literals and positional tokens strictly alternate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedPath {
    segments: Vec<Segment>,
}

impl SegmentedPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Positional tokens, left to right, each with its preceding literal.
    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> + '_ {
        self.segments.chunks(2).filter_map(|pair| match pair {
            [Segment::Literal(prefix), Segment::Labeled { label, index }] => Some(Token {
                prefix,
                label: Some(label),
                index,
            }),
            [Segment::Literal(prefix), Segment::Bare { index }] => Some(Token {
                prefix,
                label: None,
                index,
            }),
            _ => None,
        })
    }

    pub fn token_count(&self) -> usize {
        self.segments.len() / 2
    }

    /// Trailing literal after the last positional token.
    pub fn trailing(&self) -> &str {
        match self.segments.last() {
            Some(Segment::Literal(text)) => text,
            _ => "",
        }
    }

    /// Rebuilds the exact input path.
    pub fn to_path(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }
}

/// Recognizes the two positional token grammars.
#[derive(Debug, Clone)]
pub struct PathSegmenter {
    labeled: Regex,
    bare: Regex,
}

impl Default for PathSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathSegmenter {
    pub fn new() -> Self {
        Self {
            labeled: Regex::new(r"^([-0-9A-Za-z_#]+)\[([0-9]+)\]$").expect("labeled token pattern"),
            bare: Regex::new(r"^[0-9]+$").expect("bare token pattern"),
        }
    }

    pub fn segment(&self, path: &str) -> SegmentedPath {
        let mut segments = Vec::new();
        let mut components = path.split('/');
        // Text before the first `/` can never hold a token.
        let mut literal = components.next().unwrap_or_default().to_string();

        for component in components {
            literal.push('/');
            match self.classify(component) {
                Some(token) => {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    segments.push(token);
                }
                None => literal.push_str(component),
            }
        }
        segments.push(Segment::Literal(literal));

        SegmentedPath { segments }
    }

    fn classify(&self, component: &str) -> Option<Segment> {
        if self.bare.is_match(component) {
            return Some(Segment::Bare {
                index: component.to_string(),
            });
        }
        let caps = self.labeled.captures(component)?;
        Some(Segment::Labeled {
            label: caps[1].to_string(),
            index: caps[2].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(path: &str) -> SegmentedPath {
        PathSegmenter::new().segment(path)
    }

    #[test]
    fn splits_bare_and_labeled_tokens() {
        let path = seg("/files/etc/hosts/2/alias[1]");
        assert_eq!(
            path.segments(),
            &[
                Segment::Literal("/files/etc/hosts/".into()),
                Segment::Bare { index: "2".into() },
                Segment::Literal("/".into()),
                Segment::Labeled {
                    label: "alias".into(),
                    index: "1".into()
                },
                Segment::Literal(String::new()),
            ]
        );
        assert_eq!(path.token_count(), 2);
    }

    #[test]
    fn tokens_carry_their_prefix() {
        let path = seg("/files/p/item[3]/sub/4/leaf");
        let tokens: Vec<_> = path.tokens().collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].prefix, "/files/p/");
        assert_eq!(tokens[0].label, Some("item"));
        assert_eq!(tokens[0].index, "3");
        assert_eq!(tokens[1].prefix, "/sub/");
        assert_eq!(tokens[1].label, None);
        assert_eq!(path.trailing(), "/leaf");
    }

    #[test]
    fn unrecognized_labels_stay_literal() {
        let path = seg("/files/etc/x/odd.label[2]/v");
        assert_eq!(path.token_count(), 0);
        assert_eq!(path.to_path(), "/files/etc/x/odd.label[2]/v");
    }

    #[test]
    fn tokens_must_fill_a_whole_component() {
        assert_eq!(seg("/files/a2b/x[1]y").token_count(), 0);
        assert_eq!(seg("12/files").token_count(), 0);
        assert_eq!(seg("/files/#comment[12]").token_count(), 1);
    }

    #[test]
    fn reconstruction_is_exact() {
        for path in [
            "",
            "/",
            "//",
            "/files/etc/hosts/1/ipaddr",
            "/files/etc/squid/squid.conf/acl[12]/Safe_ports/setting",
            "relative/3/",
        ] {
            assert_eq!(seg(path).to_path(), path);
        }
    }
}
