use regex::Regex;

use super::{comment_text, content_lines, Grammar, Parsed, TreeNode};
use crate::error::ParseError;

/// Shell variable assignments: `[export ]KEY=value`.
///
/// Values are kept verbatim, quotes included. `export` becomes an empty child
/// of the variable node.
#[derive(Debug, Clone)]
pub struct Shellvars {
    key: Regex,
}

impl Default for Shellvars {
    fn default() -> Self {
        Self::new()
    }
}

impl Shellvars {
    pub fn new() -> Self {
        Self {
            key: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("shell variable name pattern"),
        }
    }
}

impl Grammar for Shellvars {
    fn name(&self) -> &'static str {
        "Shellvars"
    }

    fn includes(&self) -> &'static [&'static str] {
        &["/etc/default/*", "/etc/sysconfig/*", "*.env"]
    }

    fn parse(&self, _filename: &str, text: &str) -> Result<Parsed, ParseError> {
        let mut parsed = Parsed::default();

        for (line_no, line, trimmed) in content_lines(text) {
            parsed.normalized |= trimmed;
            if let Some(comment) = comment_text(line) {
                if let Some(comment) = comment {
                    parsed.nodes.push(TreeNode::leaf("#comment", comment));
                }
                continue;
            }

            let (exported, assignment) = match line.strip_prefix("export ") {
                Some(rest) => (true, rest.trim_start()),
                None => (false, line),
            };
            let Some((key, value)) = assignment.split_once('=') else {
                return Err(ParseError::new(line_no, "expected KEY=value"));
            };
            if !self.key.is_match(key) {
                return Err(ParseError::new(
                    line_no,
                    format!("invalid variable name `{key}`"),
                ));
            }

            let mut node = TreeNode::leaf(key, value);
            if exported {
                node.children.push(TreeNode::empty("export"));
            }
            parsed.nodes.push(node);
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignments_and_exports() {
        let text = "# grub\nGRUB_TIMEOUT=5\nexport PATH=\"/usr/bin\"\n";
        let parsed = Shellvars::new().parse("/etc/default/grub", text).unwrap();
        assert_eq!(parsed.nodes[1], TreeNode::leaf("GRUB_TIMEOUT", "5"));
        assert_eq!(parsed.nodes[2].value.as_deref(), Some("\"/usr/bin\""));
        assert_eq!(parsed.nodes[2].children, [TreeNode::empty("export")]);
    }

    #[test]
    fn rejects_lines_without_assignment() {
        let err = Shellvars::new().parse("/x.env", "A=1\nnot a var\n").unwrap_err();
        assert_eq!(err.line, 2);
        let err = Shellvars::new().parse("/x.env", "1A=1\n").unwrap_err();
        assert!(err.message.contains("1A"));
    }
}
