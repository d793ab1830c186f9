//! # augprint-tree
//!
//! The tree side of augprint: load configuration files through a grammar into
//! an in-memory tree mounted under `/files`, query it with path expressions,
//! and replay `set` directives against it.
//!
//! [`TreeProvider`] is the seam the CLI programs against; [`MemTree`] is the
//! built-in implementation.

pub mod error;
pub mod grammar;
pub mod pathx;
mod tree;

use augprint_core::FlatEntry;

pub use error::{ParseError, TreeError};
pub use grammar::{Grammar, GrammarRegistry, FALLBACK_GRAMMAR};
pub use pathx::escape_label;
pub use tree::MemTree;

/// Access to a loaded configuration tree.
pub trait TreeProvider {
    /// Loads `filename`, with the named grammar or the one whose includes
    /// match. Returns the grammar used.
    fn load_file(&mut self, filename: &str, grammar: Option<&str>) -> Result<String, TreeError>;

    /// Canonical paths of all nodes matching `expr`, in document order.
    fn match_paths(&self, expr: &str) -> Result<Vec<String>, TreeError>;

    /// Value of the single node `expr` addresses. `None` when nothing matches
    /// or the node has no value.
    fn get(&self, expr: &str) -> Result<Option<String>, TreeError>;

    /// Whether loading dropped or normalized any source text.
    fn modified_by_normalization(&self) -> bool {
        false
    }
}

/// `/files<filename>` with each component escaped.
pub fn file_root(filename: &str) -> String {
    filename
        .split('/')
        .filter(|c| !c.is_empty())
        .fold(String::from("/files"), |mut root, component| {
            root.push('/');
            root.push_str(&escape_label(component));
            root
        })
}

/// Every node under a loaded file as a flat `(path, value)` entry, in
/// document order.
pub fn collect_entries(
    tree: &dyn TreeProvider,
    filename: &str,
) -> Result<Vec<FlatEntry>, TreeError> {
    let pattern = format!("{}//*", file_root(filename));
    let paths = tree.match_paths(&pattern)?;
    tracing::debug!(filename, nodes = paths.len(), "collected entries");

    paths
        .into_iter()
        .map(|path| {
            let value = tree.get(&path)?;
            Ok(FlatEntry::new(path, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_root_escapes_components() {
        assert_eq!(file_root("/etc/hosts"), "/files/etc/hosts");
        assert_eq!(file_root("/tmp/my file"), r"/files/tmp/my\ file");
    }

    #[test]
    fn collects_hosts_entries_in_document_order() {
        let mut tree = MemTree::new();
        tree.load_text("/etc/hosts", None, "127.0.0.1 localhost lh\n")
            .unwrap();
        let entries = collect_entries(&tree, "/etc/hosts").unwrap();
        assert_eq!(
            entries,
            [
                FlatEntry::new("/files/etc/hosts/1", None),
                FlatEntry::leaf("/files/etc/hosts/1/ipaddr", "127.0.0.1"),
                FlatEntry::leaf("/files/etc/hosts/1/canonical", "localhost"),
                FlatEntry::leaf("/files/etc/hosts/1/alias", "lh"),
            ]
        );
    }

    #[test]
    fn unloaded_file_has_no_entries() {
        let tree = MemTree::new();
        assert!(collect_entries(&tree, "/etc/hosts").unwrap().is_empty());
    }
}
