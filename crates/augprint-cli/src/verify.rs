use anyhow::{Context, Result};
use augprint_core::{generate, Config, Directive};
use augprint_tree::{collect_entries, MemTree};
use serde::Serialize;

/// Result of replaying a directive stream twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Nodes set while rebuilding the file from nothing.
    pub rebuilt: usize,
    /// Nodes the regenerated directives changed on the rebuilt tree.
    pub second_pass_changes: usize,
}

impl Verification {
    pub fn is_idempotent(&self) -> bool {
        self.second_pass_changes == 0
    }
}

/// Replays `directives` into an empty tree, regenerates directives from the
/// result and applies those again.
pub fn replay(filename: &str, directives: &[Directive], config: &Config) -> Result<Verification> {
    let mut tree = MemTree::new();
    let rebuilt = tree
        .apply(directives)
        .context("replaying directives into an empty tree")?;

    let entries = collect_entries(&tree, filename)?;
    let regenerated = generate(&entries, config);
    let second_pass_changes = tree
        .apply(&regenerated.directives)
        .context("replaying regenerated directives")?;

    tracing::debug!(rebuilt, second_pass_changes, "verified replay");
    Ok(Verification {
        rebuilt,
        second_pass_changes,
    })
}
