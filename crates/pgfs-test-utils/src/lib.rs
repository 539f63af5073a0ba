//! Shared test utilities for the pgfs workspace.
//!
//! This crate provides standardised fixtures so each crate's test suite
//! does not hand-roll its own fake data directory. It is a dev-dependency
//! only, never published.
//!
//! # Modules
//!
//! - [`cluster`]: [`TestCluster`], a fake storage root plus mirror root

pub mod cluster;

pub use cluster::TestCluster;
