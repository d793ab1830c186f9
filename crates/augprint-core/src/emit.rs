//! Directive text: value quoting, `set` lines and unresolved-group diagnostics.

use std::fmt;

use serde::Serialize;

/// Quotes a value for the directive syntax.
///
/// Single quotes are preferred. The syntax cannot escape a quote inside its
/// own delimiter, so a value containing `'` is wrapped in double quotes instead.
pub fn quote_value(value: &str) -> String {
    let delimiter = if value.contains('\'') { '"' } else { '\'' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(delimiter);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' if delimiter == '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// One `set` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    /// Canonical, value-qualified path.
    pub path: String,
    /// Raw (unquoted) value.
    pub value: String,
    /// The path this directive was generated from.
    pub source: String,
}

impl Directive {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            source: path.clone(),
            path,
            value: value.into(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set {}  {}", self.path, quote_value(&self.value))
    }
}

/// A head with siblings that fell back to positional addressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedGroup {
    pub head: String,
    /// Original paths affected, in entry order.
    pub paths: Vec<String>,
}

/// Advisory listing of every unresolved group, rendered for the error stream.
#[derive(Debug, Clone, Copy)]
pub struct UnresolvedReport<'a>(pub &'a [UnresolvedGroup]);

impl fmt::Display for UnresolvedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        writeln!(f, "Warning: no suitably unique tail was found for some paths")?;
        for group in self.0 {
            writeln!(f, "{}", group.head)?;
            for path in &group.paths {
                writeln!(f, "    {path}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_use_single_quotes() {
        assert_eq!(quote_value("localhost"), "'localhost'");
        assert_eq!(quote_value(""), "''");
        assert_eq!(quote_value("say \"hi\""), "'say \"hi\"'");
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(quote_value("a\tb\nc\\d"), r"'a\tb\nc\\d'");
    }

    #[test]
    fn single_quote_switches_to_double_quotes() {
        assert_eq!(quote_value(r#"it's "x" \ y"#), r#""it's \"x\" \\ y""#);
    }

    #[test]
    fn directive_line_has_two_space_separator() {
        let d = Directive::new("/files/etc/hosts/seq::*[ipaddr='::1']/ipaddr", "::1");
        assert_eq!(
            d.to_string(),
            "set /files/etc/hosts/seq::*[ipaddr='::1']/ipaddr  '::1'"
        );
    }

    #[test]
    fn report_lists_heads_and_indented_paths() {
        let groups = vec![UnresolvedGroup {
            head: "/files/p/item".into(),
            paths: vec!["/files/p/item[1]/name".into(), "/files/p/item[2]/name".into()],
        }];
        assert_eq!(
            UnresolvedReport(&groups).to_string(),
            "Warning: no suitably unique tail was found for some paths\n\
             /files/p/item\n    /files/p/item[1]/name\n    /files/p/item[2]/name\n"
        );
        assert_eq!(UnresolvedReport(&[]).to_string(), "");
    }
}
