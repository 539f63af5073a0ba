//! Filesystem primitives for pgfs
//!
//! Provides the pieces that keep a mirror tree safe to mutate:
//!
//! - **guard**: decide whether a destination root is fresh or already managed
//! - **lock**: non-blocking exclusive lock on the sentinel file
//! - **identity**: storage identity and volume comparisons for hard links
//! - **path**: single-component name validation

pub mod constants;
pub mod error;
pub mod guard;
pub mod identity;
pub mod lock;
pub mod path;

pub use constants::{SENTINEL, sentinel_path};
pub use error::{Error, Result};
pub use guard::{RootState, prepare};
pub use identity::{same_file, same_volume};
pub use lock::{DefaultBackend, LockBackend, TreeLock};
pub use path::is_valid_component;
