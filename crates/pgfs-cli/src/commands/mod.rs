//! Command implementations for pgfs-cli

pub mod mirror;

pub use mirror::run_mirror;
