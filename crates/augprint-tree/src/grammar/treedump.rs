use super::{Grammar, Parsed, TreeNode};
use crate::error::ParseError;

/// Tree dumps in `print` format:
///
/// ```text
/// /files/etc/app.augtree/server[1]/name = "alpha"
/// /files/etc/app.augtree/server[1]/tls
/// ```
///
/// Paths under `/files<filename>` are re-rooted at the file; other paths are
/// taken relative to it. Siblings are created in line order, so `label[n]` must
/// refer to an existing sibling or the next new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Treedump;

impl Grammar for Treedump {
    fn name(&self) -> &'static str {
        "Treedump"
    }

    fn includes(&self) -> &'static [&'static str] {
        &["*.augtree"]
    }

    fn parse(&self, filename: &str, text: &str) -> Result<Parsed, ParseError> {
        let root_prefix = format!("/files{filename}");
        let mut parsed = Parsed::default();

        for (n, raw) in text.lines().enumerate() {
            let line_no = n + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let (path, value) = split_line(raw).map_err(|m| ParseError::new(line_no, m))?;

            let relative = path.strip_prefix(&root_prefix).unwrap_or(path);
            let relative = relative.trim_start_matches('/');
            if relative.is_empty() {
                continue;
            }

            let steps = split_steps(relative).map_err(|m| ParseError::new(line_no, m))?;
            let node =
                insert(&mut parsed.nodes, &steps).map_err(|m| ParseError::new(line_no, m))?;
            if value.is_some() {
                node.value = value;
            }
        }
        Ok(parsed)
    }
}

fn split_line(line: &str) -> Result<(&str, Option<String>), String> {
    let Some((path, rest)) = line.split_once(" = ") else {
        return Ok((line.trim_end(), None));
    };
    let rest = rest.trim_end();
    let quoted = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| format!("value must be double quoted: {rest}"))?;
    Ok((path, Some(unescape(quoted)?)))
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => return Err("dangling escape at end of value".to_string()),
        }
    }
    Ok(out)
}

/// Splits on unescaped `/` into `(label, position)` pairs.
fn split_steps(path: &str) -> Result<Vec<(String, usize)>, String> {
    let mut steps = Vec::new();
    let mut label = String::new();
    let mut chars = path.chars().peekable();

    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some(c) => label.push(c),
                None => return Err("dangling escape in path".to_string()),
            },
            Some('[') => {
                let digits: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let position = digits
                    .parse::<usize>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| format!("bad position `[{digits}]`"))?;
                if label.is_empty() {
                    return Err("position without label".to_string());
                }
                match chars.next() {
                    None | Some('/') => steps.push((std::mem::take(&mut label), position)),
                    Some(c) => return Err(format!("unexpected `{c}` after position")),
                }
                if chars.peek().is_none() {
                    break;
                }
            }
            Some('/') | None => {
                if label.is_empty() {
                    return Err("empty path component".to_string());
                }
                steps.push((std::mem::take(&mut label), 1));
                if chars.peek().is_none() {
                    break;
                }
            }
            Some(c) => label.push(c),
        }
    }
    Ok(steps)
}

fn insert<'a>(
    nodes: &'a mut Vec<TreeNode>,
    steps: &[(String, usize)],
) -> Result<&'a mut TreeNode, String> {
    let Some(((label, position), rest)) = steps.split_first() else {
        return Err("empty path".to_string());
    };

    let existing: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| &n.label == label)
        .map(|(i, _)| i)
        .collect();
    let slot = match existing.get(position - 1) {
        Some(&slot) => slot,
        None if *position == existing.len() + 1 => {
            nodes.push(TreeNode::empty(label.clone()));
            nodes.len() - 1
        }
        None => return Err(format!("{label}[{position}] skips a sibling")),
    };

    let node = &mut nodes[slot];
    if rest.is_empty() {
        Ok(node)
    } else {
        insert(&mut node.children, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuilds_tree_from_absolute_dump() {
        let text = r#"
/files/srv/app.augtree/server[1]/name = "alpha"
/files/srv/app.augtree/server[1]/port = "80"
/files/srv/app.augtree/server[2]/name = "beta"
/files/srv/app.augtree/server[2]/tls
/files/srv/app.augtree/1 = "say \"hi\"\n"
"#;
        let parsed = Treedump.parse("/srv/app.augtree", text).unwrap();
        assert_eq!(parsed.nodes.len(), 3);
        assert_eq!(
            parsed.nodes[0],
            TreeNode::branch(
                "server",
                vec![TreeNode::leaf("name", "alpha"), TreeNode::leaf("port", "80")]
            )
        );
        assert_eq!(parsed.nodes[1].children[1], TreeNode::empty("tls"));
        assert_eq!(parsed.nodes[2], TreeNode::leaf("1", "say \"hi\"\n"));
    }

    #[test]
    fn relative_paths_and_escaped_labels() {
        let parsed = Treedump
            .parse("/x.augtree", "dir/a\\/b = \"v\"\n")
            .unwrap();
        assert_eq!(parsed.nodes[0].children[0], TreeNode::leaf("a/b", "v"));
    }

    #[test]
    fn rejects_gaps_and_unquoted_values() {
        let err = Treedump.parse("/x.augtree", "a[2] = \"v\"\n").unwrap_err();
        assert_eq!(err.line, 1);
        let err = Treedump.parse("/x.augtree", "a = v\n").unwrap_err();
        assert!(err.message.contains("double quoted"));
    }
}
