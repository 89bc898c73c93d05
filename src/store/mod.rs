//! store
//!
//! Client side of the lakeFS versioned store.
//!
//! # Architecture
//!
//! The [`VersionedStore`] trait defines branch, commit, merge, object and
//! log operations. Callers (sensors, the CLI, orchestrator glue) depend on
//! the trait; [`LakeFsClient`] implements it over HTTP and
//! [`mock::MockStore`] in memory.
//!
//! # Modules
//!
//! - `traits`: the `VersionedStore` trait, records and `RemoteError`
//! - [`lakefs`]: HTTP implementation, connection check
//! - `log`: lazy commit-history cursor
//! - [`mock`]: in-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use lakehook::core::connection::Connection;
//! use lakehook::store::{CommitRequest, LakeFsClient, VersionedStore};
//!
//! let client = LakeFsClient::build(&Connection::new("localhost:8000", key, secret))?;
//! client.create_branch("lake", "etl", "main").await?;
//! let id = client.commit("lake", "etl", CommitRequest::new("load")).await?;
//! let mut log = client.log_commits("lake", &id, 100);
//! while let Some(commit) = log.next().await {
//!     println!("{}", commit?.message);
//! }
//! ```

pub mod lakefs;
mod log;
pub mod mock;
mod traits;

pub use lakefs::{test_connection, ClientSettings, CommitLookup, LakeFsClient};
pub use log::{CommitLog, DEFAULT_PAGE_SIZE};
pub use traits::*;
