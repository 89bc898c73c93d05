//! Lakehook - lakeFS branches, commits and objects from workflow orchestrators
//!
//! Lakehook wraps the lakeFS REST API (v1) in a small typed client and adds
//! the pieces orchestrators need around it: connection resolution, commit
//! provenance, sensors and a command-line tool.
//!
//! # Architecture
//!
//! - [`core`] - Connection descriptors, configuration, run provenance
//! - [`store`] - `VersionedStore` trait, lakeFS HTTP client, commit log, mock
//! - [`sensors`] - Pollers for new commits and object arrival
//! - [`cli`] - Command-line interface (parses args, calls the store)
//! - [`ui`] - Terminal output helpers
//!
//! # Behavior
//!
//! 1. Every store operation is one round trip; nothing is retried
//! 2. Remote failures surface as `RemoteError`, never as panics
//! 3. Credentials never appear in `Debug` output

pub mod cli;
pub mod core;
pub mod sensors;
pub mod store;
pub mod ui;
