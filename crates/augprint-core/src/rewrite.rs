//! Rewriting positional paths into value-qualified filter expressions.
//!
//! `/files/p/item[2]/port` becomes `/files/p/item[name='b']/port` once the
//! `item` group has chosen `name` as its discriminator.

use std::collections::HashSet;

use crate::emit::quote_value;
use crate::group::{placements, GroupRegistry};
use crate::segment::SegmentedPath;

/// Result of rewriting one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub path: String,
    /// Heads where this path fell back to positional addressing.
    pub unresolved: Vec<String>,
}

/// Rewrites paths against finalized groups.
///
/// The rewriter is stateful across calls: it remembers the last sibling index
/// it addressed and whether the chosen tail for that index has been written
/// yet. Until it has, a replay against a partially built tree may not find the
/// discriminating child, so the predicate also accepts a sibling that lacks the
/// chosen tail but matches on its first tail instead.
#[derive(Debug)]
pub struct PathRewriter<'a> {
    registry: &'a GroupRegistry,
    last_index: Option<String>,
    tail_created: bool,
}

fn tail_or_dot(tail: &str) -> &str {
    if tail.is_empty() {
        "."
    } else {
        tail
    }
}

impl<'a> PathRewriter<'a> {
    pub fn new(registry: &'a GroupRegistry) -> Self {
        Self {
            registry,
            last_index: None,
            tail_created: false,
        }
    }

    pub fn rewrite(&mut self, path: &SegmentedPath) -> Rewritten {
        let wildcard = self.registry.wildcard();
        let placements = placements(path, wildcard);
        let path_tails: HashSet<&str> = placements.iter().map(|p| p.tail.as_str()).collect();

        let mut out = String::new();
        let mut unresolved = Vec::new();

        for (token, placement) in path.tokens().zip(&placements) {
            out.push_str(token.prefix);
            out.push_str(token.label.unwrap_or(wildcard.as_str()));

            // Every head was registered from these same placements.
            let group = self.registry.get(&placement.head);
            debug_assert!(group.is_some(), "unregistered group {}", placement.head);

            let index = token.index;
            let index_changed = self.last_index.as_deref() != Some(index);
            if index_changed {
                self.tail_created = false;
            }

            let first_tail = group.and_then(|g| g.first_tail(index)).unwrap_or_default();
            let first_value = group
                .and_then(|g| g.first_tail_value(index))
                .unwrap_or_default();

            let addressed_tail = match group.and_then(|g| g.chosen_tail(index)) {
                Some(tail) => {
                    let value = group
                        .and_then(|g| g.chosen_value(index))
                        .unwrap_or_default();
                    let t = tail_or_dot(tail);
                    if self.tail_created || index_changed || tail == first_tail {
                        out.push_str(&format!("[{t}={}]", quote_value(value)));
                    } else {
                        out.push_str(&format!(
                            "[{t}={} or (count({t})=0 and {}={})]",
                            quote_value(value),
                            tail_or_dot(first_tail),
                            quote_value(first_value),
                        ));
                    }
                    tail
                }
                None => {
                    unresolved.push(placement.head.clone());
                    match token.label {
                        Some(_) => out.push_str(&format!("[position() = {index}]")),
                        None => out.push_str(&format!("[label() = '{index}']")),
                    }
                    // First-tail anchor, a starting point for manual edits.
                    out.push_str(&format!(
                        "[{}={}]",
                        tail_or_dot(first_tail),
                        quote_value(first_value)
                    ));
                    first_tail
                }
            };

            if path_tails.contains(addressed_tail) {
                self.tail_created = true;
            }
            self.last_index = Some(index.to_string());
        }
        out.push_str(path.trailing());

        Rewritten {
            path: out,
            unresolved,
        }
    }
}
