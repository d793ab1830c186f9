//! Sibling groups: per (parent prefix, label) aggregation of every value found
//! beneath each numbered sibling.
//!
//! Given
//!
//! ```text
//! /files/some/path/label[1]/tail_a    value_1_a
//! /files/some/path/label[1]/tail_b    value_1_b
//! /files/some/path/label[2]/tail_a    value_2_a
//! ```
//!
//! the group keyed by the head `/files/some/path/label` records, for index `1`,
//! the tails `tail_a` and `tail_b` with their values, plus the inverted view
//! `tail_a → value_1_a → [1]` used to spot values that are unique in the group.
//!
//! Every map is insertion ordered. First-seen order decides which tail wins
//! when several are unique, so it must not depend on hashing.

use indexmap::{IndexMap, IndexSet};

use crate::config::WildcardStyle;
use crate::segment::SegmentedPath;
use crate::select::TailSelection;

/// Where one positional token of a path lands in the group registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Group key: parent prefix plus label (or the wildcard for bare tokens).
    pub head: String,
    /// `None` for bare numbered tokens.
    pub label: Option<String>,
    pub index: String,
    /// Path below the sibling, nested tokens rendered without their index.
    pub tail: String,
}

/// Computes one placement per positional token, outermost first.
pub fn placements(path: &SegmentedPath, wildcard: WildcardStyle) -> Vec<Placement> {
    let tokens: Vec<_> = path.tokens().collect();
    let mut head = String::new();
    let mut out = Vec::with_capacity(tokens.len());

    for (k, token) in tokens.iter().enumerate() {
        head.push_str(token.prefix);
        let name = token.label.unwrap_or(wildcard.as_str());

        let mut tail = String::new();
        for nested in &tokens[k + 1..] {
            tail.push_str(nested.prefix);
            tail.push_str(nested.label.unwrap_or(wildcard.as_str()));
        }
        tail.push_str(path.trailing());

        out.push(Placement {
            head: format!("{head}{name}"),
            label: token.label.map(str::to_string),
            index: token.index.to_string(),
            tail: tail.trim_start_matches('/').to_string(),
        });

        match token.label {
            Some(label) => {
                head.push_str(label);
                head.push('[');
                head.push_str(token.index);
                head.push(']');
            }
            None => head.push_str(token.index),
        }
    }
    out
}

/// All siblings sharing one head.
#[derive(Debug, Clone, Default)]
pub struct SiblingGroup {
    /// index → tail → values, in registration order.
    values: IndexMap<String, IndexMap<String, Vec<String>>>,
    /// tail → indices where it occurs.
    has_tail: IndexMap<String, IndexSet<String>>,
    /// tail → value → indices carrying that exact pair (duplicates kept).
    has_value: IndexMap<String, IndexMap<String, Vec<String>>>,
    /// index → first tail registered for it.
    first_tail: IndexMap<String, String>,
    selection: TailSelection,
}

impl SiblingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, index: &str, tail: &str, value: &str) {
        let tail = tail.trim_start_matches('/');

        if !self.values.contains_key(index) {
            self.first_tail.insert(index.to_string(), tail.to_string());
        }
        self.values
            .entry(index.to_string())
            .or_default()
            .entry(tail.to_string())
            .or_default()
            .push(value.to_string());
        self.has_tail
            .entry(tail.to_string())
            .or_default()
            .insert(index.to_string());
        self.has_value
            .entry(tail.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default()
            .push(index.to_string());
    }

    /// Number of distinct sibling indices.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Sibling indices in first-seen order.
    pub fn indices(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Tails in first-seen order.
    pub fn tails(&self) -> impl Iterator<Item = &str> + '_ {
        self.has_tail.keys().map(String::as_str)
    }

    /// Values registered for `tail` in first-seen order, each with the indices
    /// carrying it.
    pub fn values_of_tail(&self, tail: &str) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.has_value
            .get(tail)
            .into_iter()
            .flat_map(|values| values.iter().map(|(v, idx)| (v.as_str(), idx.as_slice())))
    }

    /// The first value registered for `(index, tail)`.
    pub fn value(&self, index: &str, tail: &str) -> Option<&str> {
        self.values
            .get(index)?
            .get(tail)?
            .first()
            .map(String::as_str)
    }

    pub fn first_tail(&self, index: &str) -> Option<&str> {
        self.first_tail.get(index).map(String::as_str)
    }

    pub fn first_tail_value(&self, index: &str) -> Option<&str> {
        let tail = self.first_tail(index)?;
        self.value(index, tail)
    }

    pub fn selection(&self) -> &TailSelection {
        &self.selection
    }

    /// Runs discriminator selection and stores the result.
    pub fn choose_tail(&mut self) -> &TailSelection {
        self.selection = crate::select::choose(self);
        &self.selection
    }

    pub fn chosen_tail(&self, index: &str) -> Option<&str> {
        self.selection.tail_for(index)
    }

    /// Value of the chosen tail, empty string included.
    pub fn chosen_value(&self, index: &str) -> Option<&str> {
        self.value(index, self.chosen_tail(index)?)
    }

    /// Indices for which no unique tail exists.
    pub fn unresolved_indices(&self) -> impl Iterator<Item = &str> + '_ {
        self.indices().filter(|index| self.chosen_tail(index).is_none())
    }
}

/// Every sibling group of one conversion, keyed by head in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: IndexMap<String, SiblingGroup>,
    wildcard: WildcardStyle,
}

impl GroupRegistry {
    pub fn new(wildcard: WildcardStyle) -> Self {
        Self {
            groups: IndexMap::new(),
            wildcard,
        }
    }

    pub fn wildcard(&self) -> WildcardStyle {
        self.wildcard
    }

    /// Registers `value` once per positional token of `path`.
    pub fn register(&mut self, path: &SegmentedPath, value: &str) {
        for placement in placements(path, self.wildcard) {
            tracing::trace!(
                head = %placement.head,
                index = %placement.index,
                tail = %placement.tail,
                value,
                "register"
            );
            self.groups
                .entry(placement.head)
                .or_default()
                .add(&placement.index, &placement.tail, value);
        }
    }

    /// Selects a discriminator for every group.
    pub fn finalize(&mut self) {
        for (head, group) in &mut self.groups {
            let selection = group.choose_tail();
            tracing::debug!(head = %head, ?selection, "chose tail");
        }
    }

    pub fn get(&self, head: &str) -> Option<&SiblingGroup> {
        self.groups.get(head)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SiblingGroup)> + '_ {
        self.groups.iter().map(|(head, group)| (head.as_str(), group))
    }
}
