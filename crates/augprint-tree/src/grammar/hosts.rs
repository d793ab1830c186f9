use super::{comment_text, content_lines, Grammar, Parsed, TreeNode};
use crate::error::ParseError;

/// `/etc/hosts`: `ipaddr canonical [alias...] [# comment]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hosts;

impl Grammar for Hosts {
    fn name(&self) -> &'static str {
        "Hosts"
    }

    fn includes(&self) -> &'static [&'static str] {
        &["/etc/hosts"]
    }

    fn parse(&self, _filename: &str, text: &str) -> Result<Parsed, ParseError> {
        let mut parsed = Parsed::default();
        let mut seq = 0usize;

        for (line_no, line, trimmed) in content_lines(text) {
            parsed.normalized |= trimmed;
            if let Some(comment) = comment_text(line) {
                if let Some(comment) = comment {
                    parsed.nodes.push(TreeNode::leaf("#comment", comment));
                }
                continue;
            }

            let (fields, comment) = match line.split_once('#') {
                Some((fields, comment)) => (fields, comment.trim()),
                None => (line, ""),
            };
            let mut fields = fields.split_whitespace();
            let (Some(ipaddr), Some(canonical)) = (fields.next(), fields.next()) else {
                return Err(ParseError::new(
                    line_no,
                    "expected an address followed by a canonical name",
                ));
            };

            let mut children = vec![
                TreeNode::leaf("ipaddr", ipaddr),
                TreeNode::leaf("canonical", canonical),
            ];
            children.extend(fields.map(|alias| TreeNode::leaf("alias", alias)));
            if !comment.is_empty() {
                children.push(TreeNode::leaf("#comment", comment));
            }

            seq += 1;
            parsed.nodes.push(TreeNode::branch(seq.to_string(), children));
        }
        Ok(parsed)
    }
}
