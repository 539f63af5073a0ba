//! TreeSynchronizer for reconciling a mirror tree with a catalog snapshot
//!
//! This module provides:
//! - **engine**: forward pass creating and repairing directories and links
//! - **prune**: reverse pass removing dropped databases, schemas and tables
//! - **report**: mutation counts for one pass

mod engine;
mod index;
mod prune;
mod report;

pub use engine::TreeSynchronizer;
pub use report::SyncReport;
