use super::{comment_text, content_lines, Grammar, Parsed, TreeNode};
use crate::error::ParseError;

/// One numbered node per non-blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplelines;

impl Grammar for Simplelines {
    fn name(&self) -> &'static str {
        "Simplelines"
    }

    fn parse(&self, _filename: &str, text: &str) -> Result<Parsed, ParseError> {
        let mut parsed = Parsed::default();
        let mut seq = 0usize;

        for (_, line, trimmed) in content_lines(text) {
            parsed.normalized |= trimmed;
            match comment_text(line) {
                Some(Some(comment)) => parsed.nodes.push(TreeNode::leaf("#comment", comment)),
                Some(None) => {}
                None => {
                    seq += 1;
                    parsed.nodes.push(TreeNode::leaf(seq.to_string(), line));
                }
            }
        }
        Ok(parsed)
    }
}
