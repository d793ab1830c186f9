//! Discriminator selection.
//!
//! A tail is a usable discriminator for sibling `i` when the value `i` carries
//! under it occurs exactly once in the whole group. Distinct siblings may end
//! up with distinct tails: squid-style `acl` blocks are keyed by a different
//! sub-setting each, and no single attribute tells them all apart.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::group::SiblingGroup;

/// Outcome of discriminator selection for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "tails", rename_all = "snake_case")]
pub enum TailSelection {
    /// Every sibling is told apart by the same tail.
    Uniform(String),
    /// Siblings use different tails; missing indices have none.
    PerIndex(IndexMap<String, String>),
    /// No sibling has a unique tail (or selection has not run yet).
    #[default]
    Unresolved,
}

impl TailSelection {
    pub fn tail_for(&self, index: &str) -> Option<&str> {
        match self {
            TailSelection::Uniform(tail) => Some(tail),
            TailSelection::PerIndex(tails) => tails.get(index).map(String::as_str),
            TailSelection::Unresolved => None,
        }
    }
}

/// Picks, per sibling, the first tail (in first-seen order) whose value is
/// unique within the group.
pub fn choose(group: &SiblingGroup) -> TailSelection {
    // A sibling can carry several values under one tail (`alias[1]`, `alias[2]`).
    // Only the first is ever written into a predicate, so that is the one that
    // has to be unique.
    let mut unique: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for tail in group.tails() {
        let owners = unique.entry(tail).or_default();
        for (value, indices) in group.values_of_tail(tail) {
            if let [only] = indices {
                if group.value(only, tail) == Some(value) {
                    owners.insert(only.as_str());
                }
            }
        }
    }

    let mut chosen: IndexMap<String, String> = IndexMap::new();
    for index in group.indices() {
        let found = unique
            .iter()
            .find(|(_, owners)| owners.contains(index))
            .map(|(tail, _)| *tail);
        if let Some(tail) = found {
            chosen.insert(index.to_string(), tail.to_string());
        }
    }

    if chosen.is_empty() {
        return TailSelection::Unresolved;
    }
    if chosen.len() == group.count() {
        let mut tails = chosen.values();
        if let Some(first) = tails.next() {
            if tails.all(|tail| tail == first) {
                return TailSelection::Uniform(first.clone());
            }
        }
    }
    TailSelection::PerIndex(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(rows: &[(&str, &str, &str)]) -> SiblingGroup {
        let mut group = SiblingGroup::new();
        for (index, tail, value) in rows {
            group.add(index, tail, value);
        }
        group
    }

    #[test]
    fn shared_values_are_skipped() {
        let mut g = group(&[
            ("1", "name", "a"),
            ("1", "port", "80"),
            ("2", "name", "b"),
            ("2", "port", "80"),
        ]);
        assert_eq!(g.choose_tail(), &TailSelection::Uniform("name".into()));
        assert_eq!(g.chosen_value("1"), Some("a"));
    }

    #[test]
    fn first_unique_tail_wins_per_index() {
        let g = group(&[
            ("2", "localnet/setting", "10.0.0.0/8"),
            ("3", "localnet/setting", "100.64.0.0/10"),
            ("9", "SSL_ports/setting", "443"),
            ("12", "Safe_ports/setting", "443"),
        ]);
        let selection = choose(&g);
        assert_eq!(selection.tail_for("2"), Some("localnet/setting"));
        assert_eq!(selection.tail_for("3"), Some("localnet/setting"));
        assert_eq!(selection.tail_for("9"), Some("SSL_ports/setting"));
        assert_eq!(selection.tail_for("12"), Some("Safe_ports/setting"));
        assert!(matches!(selection, TailSelection::PerIndex(_)));
    }

    #[test]
    fn fully_colliding_group_is_unresolved() {
        let g = group(&[
            ("1", "name", "x"),
            ("1", "port", "80"),
            ("2", "name", "x"),
            ("2", "port", "80"),
        ]);
        assert_eq!(choose(&g), TailSelection::Unresolved);
        assert_eq!(g.chosen_tail("1"), None);
    }

    #[test]
    fn partially_resolved_group_keeps_missing_indices_empty() {
        let mut g = group(&[
            ("1", "name", "x"),
            ("2", "name", "x"),
            ("3", "name", "y"),
        ]);
        g.choose_tail();
        assert_eq!(g.chosen_tail("3"), Some("name"));
        assert_eq!(g.unresolved_indices().collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn repeated_registration_of_same_pair_is_not_unique() {
        let g = group(&[("1", "alias", "h"), ("1", "alias", "h"), ("2", "alias", "k")]);
        let selection = choose(&g);
        assert_eq!(selection.tail_for("1"), None);
        assert_eq!(selection.tail_for("2"), Some("alias"));
    }

    #[test]
    fn only_the_first_value_of_a_tail_counts() {
        let g = group(&[
            ("1", "alias", "shared"),
            ("1", "alias", "mine"),
            ("2", "alias", "shared"),
            ("2", "name", "two"),
        ]);
        let selection = choose(&g);
        assert_eq!(selection.tail_for("1"), None);
        assert_eq!(selection.tail_for("2"), Some("name"));
    }

    #[test]
    fn selection_is_idempotent() {
        let mut g = group(&[
            ("1", "", "one"),
            ("2", "", "two"),
            ("2", "x", "one"),
        ]);
        let first = g.choose_tail().clone();
        let second = g.choose_tail().clone();
        assert_eq!(first, second);
        assert_eq!(first, TailSelection::Uniform(String::new()));
    }

    #[test]
    fn empty_chosen_value_is_kept_as_is() {
        let mut g = group(&[("1", "name", ""), ("2", "name", "b")]);
        g.choose_tail();
        assert_eq!(g.chosen_value("1"), Some(""));
        assert_eq!(g.chosen_value("2"), Some("b"));
    }
}
