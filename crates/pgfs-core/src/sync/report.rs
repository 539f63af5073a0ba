//! Outcome of a synchronization pass

use serde::{Deserialize, Serialize};

/// Counts of the mutations applied by one [`TreeSynchronizer::sync`] call.
///
/// [`TreeSynchronizer::sync`]: super::TreeSynchronizer::sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Directories and links that did not exist before
    pub created: usize,
    /// Entries that existed under the right name but pointed at the wrong
    /// storage (or had the wrong type) and were replaced
    pub repaired: usize,
    /// Entries removed because their name is gone from the catalog
    pub pruned: usize,
    /// Catalog entries not mirrored because their name is not a usable
    /// path component
    pub skipped: usize,
}

impl SyncReport {
    /// Total number of filesystem mutations.
    pub fn mutations(&self) -> usize {
        self.created + self.repaired + self.pruned
    }

    /// Whether the tree was already converged.
    pub fn is_noop(&self) -> bool {
        self.mutations() == 0
    }
}
