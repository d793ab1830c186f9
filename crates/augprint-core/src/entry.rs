use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One `(path, value)` pair of the flat tree enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub path: String,
    pub value: Option<String>,
}

impl FlatEntry {
    pub fn new(path: impl Into<String>, value: Option<String>) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    pub fn leaf(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(path, Some(value.into()))
    }

    /// The value as emitted: missing values become empty strings.
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Drops value-less entries that have descendants; writing a descendant
/// creates them anyway.
pub fn drop_interior_nodes(entries: &[FlatEntry]) -> Vec<&FlatEntry> {
    let parents: HashSet<&str> = entries
        .iter()
        .filter_map(|entry| parent_of(&entry.path))
        .collect();

    entries
        .iter()
        .filter(|entry| entry.value.is_some() || !parents.contains(entry.path.as_str()))
        .collect()
}

/// Path up to the last `/` that is not escaped with a backslash.
fn parent_of(path: &str) -> Option<&str> {
    let mut last = None;
    let mut escaped = false;
    for (i, c) in path.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => last = Some(i),
            _ => {}
        }
    }
    last.map(|i| &path[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_nodes_without_value_are_dropped() {
        let entries = vec![
            FlatEntry::new("/files/etc/hosts/1", None),
            FlatEntry::leaf("/files/etc/hosts/1/ipaddr", "127.0.0.1"),
            FlatEntry::new("/files/etc/hosts/2", None),
        ];
        let kept: Vec<_> = drop_interior_nodes(&entries)
            .into_iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(kept, ["/files/etc/hosts/1/ipaddr", "/files/etc/hosts/2"]);
    }

    #[test]
    fn interior_nodes_with_value_are_kept() {
        let entries = vec![
            FlatEntry::leaf("/files/etc/x/a", "v"),
            FlatEntry::leaf("/files/etc/x/a/b", "w"),
        ];
        assert_eq!(drop_interior_nodes(&entries).len(), 2);
    }

    #[test]
    fn escaped_slashes_stay_in_the_label() {
        assert_eq!(parent_of(r"/files/etc/fstab/a\/b"), Some("/files/etc/fstab"));
        assert_eq!(parent_of(r"/files/x\\/y"), Some(r"/files/x\\"));
        assert_eq!(parent_of("label"), None);

        let entries = vec![
            FlatEntry::new(r"/files/srv/a\/b", None),
            FlatEntry::new("/files/srv/a", None),
            FlatEntry::leaf(r"/files/srv/a\/b/c", "v"),
        ];
        let kept: Vec<_> = drop_interior_nodes(&entries)
            .into_iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(kept, ["/files/srv/a", r"/files/srv/a\/b/c"]);
    }
}
