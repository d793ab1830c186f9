//! Built-in grammars mapping file text to labeled trees.
//!
//! Each grammar declares the files it applies to as glob patterns, the same
//! way a lens declares its `incl` list. `Simplelines` applies to nothing on its
//! own and is only used when asked for by name, typically as the fallback.

mod hosts;
mod shellvars;
mod simplelines;
mod treedump;

use glob::Pattern;

use crate::error::ParseError;

pub use hosts::Hosts;
pub use shellvars::Shellvars;
pub use simplelines::Simplelines;
pub use treedump::Treedump;

/// Name of the generic line-oriented grammar used when nothing else applies.
pub const FALLBACK_GRAMMAR: &str = "Simplelines";

/// A node produced by a grammar, before it is mounted under `/files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub value: Option<String>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn branch(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            value: None,
            children,
        }
    }
}

/// Grammar output for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub nodes: Vec<TreeNode>,
    /// Set when the tree does not reproduce the text byte for byte (e.g.
    /// surrounding whitespace was dropped).
    pub normalized: bool,
}

pub trait Grammar: Send + Sync {
    fn name(&self) -> &'static str;

    /// Glob patterns of the files this grammar loads by default.
    fn includes(&self) -> &'static [&'static str] {
        &[]
    }

    fn parse(&self, filename: &str, text: &str) -> Result<Parsed, ParseError>;
}

struct Entry {
    grammar: Box<dyn Grammar>,
    includes: Vec<Pattern>,
}

/// Lookup of grammars by name and by filename.
pub struct GrammarRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.grammar.name()))
            .finish()
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GrammarRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Hosts));
        registry.register(Box::new(Shellvars::new()));
        registry.register(Box::new(Treedump));
        registry.register(Box::new(Simplelines));
        registry
    }

    pub fn register(&mut self, grammar: Box<dyn Grammar>) {
        let includes = grammar
            .includes()
            .iter()
            .filter_map(|pattern| Pattern::new(pattern).ok())
            .collect();
        self.entries.push(Entry { grammar, includes });
    }

    /// Finds a grammar by name. Accepts `@Name` and `Name.lns` spellings.
    pub fn lookup(&self, name: &str) -> Option<&dyn Grammar> {
        let name = normalize_name(name);
        self.entries
            .iter()
            .find(|e| e.grammar.name().eq_ignore_ascii_case(name))
            .map(|e| e.grammar.as_ref())
    }

    /// The first grammar whose include patterns match `filename`.
    pub fn detect(&self, filename: &str) -> Option<&dyn Grammar> {
        self.entries
            .iter()
            .find(|e| e.includes.iter().any(|p| p.matches(filename)))
            .map(|e| e.grammar.as_ref())
    }
}

/// Strips the `@` marker and `.lns` suffix some callers use for grammar names.
pub fn normalize_name(name: &str) -> &str {
    let name = name.trim_start_matches('@');
    name.strip_suffix(".lns").unwrap_or(name)
}

/// Iterates non-empty lines as `(line number, trimmed text, was trimmed)`.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str, bool)> + '_ {
    text.lines().enumerate().filter_map(|(n, raw)| {
        let line = raw.trim();
        (!line.is_empty()).then_some((n + 1, line, line.len() != raw.len()))
    })
}

/// `# text` → `text`; `None` for a non-comment or an empty comment.
pub(crate) fn comment_text(line: &str) -> Option<Option<&str>> {
    let rest = line.strip_prefix('#')?;
    let rest = rest.trim();
    Some((!rest.is_empty()).then_some(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_accepts_lens_spellings() {
        let registry = GrammarRegistry::builtin();
        assert_eq!(registry.lookup("Hosts").map(|g| g.name()), Some("Hosts"));
        assert_eq!(registry.lookup("@Hosts").map(|g| g.name()), Some("Hosts"));
        assert_eq!(registry.lookup("Hosts.lns").map(|g| g.name()), Some("Hosts"));
        assert_eq!(registry.lookup("simplelines").map(|g| g.name()), Some("Simplelines"));
        assert!(registry.lookup("Nginx").is_none());
    }

    #[test]
    fn detect_uses_include_globs() {
        let registry = GrammarRegistry::builtin();
        assert_eq!(registry.detect("/etc/hosts").map(|g| g.name()), Some("Hosts"));
        assert_eq!(
            registry.detect("/etc/default/grub").map(|g| g.name()),
            Some("Shellvars")
        );
        assert_eq!(registry.detect("/srv/app/.env").map(|g| g.name()), Some("Shellvars"));
        assert_eq!(
            registry.detect("/tmp/dump.augtree").map(|g| g.name()),
            Some("Treedump")
        );
        assert!(registry.detect("/etc/motd").is_none());
    }

    #[test]
    fn content_lines_reports_trimming() {
        let lines: Vec<_> = content_lines("a\n\n  b \nc").collect();
        assert_eq!(lines, [(1, "a", false), (3, "b", true), (4, "c", false)]);
    }
}
