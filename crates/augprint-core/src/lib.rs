//! Idempotent `set` directives for positionally addressed configuration trees.
//!
//! Tree paths address siblings by position (`label[3]`, `/3/`). Positions shift
//! whenever entries are inserted, removed or reordered, so directives built on
//! them stop being idempotent once the tree is rebuilt. This crate replaces
//! every positional token with a predicate on a child value that uniquely
//! identifies the sibling:
//!
//! ```text
//! /files/p/item[2]/port  '80'   →   set /files/p/item[name='b']/port  '80'
//! ```
//!
//! Pipeline (two passes over the entries, in enumeration order):
//!
//! 1. [`segment`] splits each path into literals and positional tokens.
//! 2. [`group`] registers every token level into a [`SiblingGroup`].
//! 3. [`select`] picks a discriminating tail per sibling.
//! 4. [`rewrite`] re-emits each path with value predicates.
//! 5. [`emit`] quotes values and renders directives and diagnostics.
//!
//! Groups that have no unique tail fall back to `position()`/`label()`
//! predicates anchored on the first tail and are reported as [`UnresolvedGroup`]s.

pub mod config;
pub mod emit;
pub mod entry;
pub mod group;
pub mod rewrite;
pub mod segment;
pub mod select;

use indexmap::IndexMap;
use serde::Serialize;

pub use config::{Config, WildcardStyle};
pub use emit::{quote_value, Directive, UnresolvedGroup, UnresolvedReport};
pub use entry::FlatEntry;
pub use group::{GroupRegistry, SiblingGroup};
pub use rewrite::PathRewriter;
pub use segment::{PathSegmenter, Segment, SegmentedPath};
pub use select::TailSelection;

/// Output of one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversion {
    /// One directive per kept entry, in entry order.
    pub directives: Vec<Directive>,
    /// Heads that fell back to positional addressing, in first-seen order.
    pub unresolved: Vec<UnresolvedGroup>,
    /// Value-less interior entries that were dropped.
    pub skipped: usize,
}

impl Conversion {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Builds the sibling groups for `entries` and finalizes their selection.
pub fn build_registry(entries: &[&FlatEntry], config: &Config) -> GroupRegistry {
    let segmenter = PathSegmenter::new();
    let mut registry = GroupRegistry::new(config.wildcard);
    for entry in entries {
        registry.register(&segmenter.segment(&entry.path), entry.value_or_empty());
    }
    registry.finalize();
    registry
}

/// Converts a flat tree enumeration into replay-safe directives.
pub fn generate(entries: &[FlatEntry], config: &Config) -> Conversion {
    let kept = entry::drop_interior_nodes(entries);
    let skipped = entries.len() - kept.len();

    let registry = build_registry(&kept, config);

    let segmenter = PathSegmenter::new();
    let segmented: Vec<_> = kept
        .iter()
        .map(|entry| (*entry, segmenter.segment(&entry.path)))
        .collect();

    let mut rewriter = PathRewriter::new(&registry);
    let mut directives = Vec::with_capacity(segmented.len());
    let mut unresolved: IndexMap<String, Vec<String>> = IndexMap::new();

    for (entry, path) in &segmented {
        let rewritten = rewriter.rewrite(path);
        tracing::info!(source = %entry.path, value = ?entry.value, "set");
        for head in rewritten.unresolved {
            unresolved.entry(head).or_default().push(entry.path.clone());
        }
        directives.push(Directive {
            path: rewritten.path,
            value: entry.value_or_empty().to_string(),
            source: entry.path.clone(),
        });
    }

    Conversion {
        directives,
        unresolved: unresolved
            .into_iter()
            .map(|(head, paths)| UnresolvedGroup { head, paths })
            .collect(),
        skipped,
    }
}
