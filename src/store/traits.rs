//! store::traits
//!
//! Store trait definition and the typed records exchanged with lakeFS.
//!
//! # Design
//!
//! The `VersionedStore` trait is async because every operation is a network
//! round trip. All methods return `Result<_, RemoteError>`; nothing is retried
//! here. Retry, backoff and timeouts belong to the caller.
//!
//! # Example
//!
//! ```ignore
//! use lakehook::store::{CommitRequest, RemoteError, VersionedStore};
//!
//! async fn publish(store: &dyn VersionedStore) -> Result<String, RemoteError> {
//!     store.create_branch("lake", "etl-run", "main").await?;
//!     let id = store
//!         .commit("lake", "etl-run", CommitRequest::new("load partitions"))
//!         .await?;
//!     store.merge("lake", "etl-run", "main", CommitRequest::new("publish")).await
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Free-form commit metadata. Keys are not interpreted by this crate.
pub type Metadata = BTreeMap<String, String>;

/// Errors from remote store operations.
///
/// `NotFound` is kept distinct so pollers can treat an absent branch or
/// object as "not ready yet" instead of a hard failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The branch, commit or object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials were rejected or lack permission.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server refused the change because it conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A success response whose body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether this error reports an absent resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// A commit as returned by lakeFS. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub committer: String,
    #[serde(default)]
    pub message: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub creation_date: i64,
    #[serde(default)]
    pub meta_range_id: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub metadata: Metadata,
}

impl Commit {
    /// Creation date as a UTC timestamp, if it is in range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.creation_date, 0)
    }
}

/// One page of commit history.
///
/// This is the unit of the log pagination protocol; most callers iterate a
/// [`CommitLog`](super::CommitLog) instead of handling pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPage {
    /// Commits in the order the server returned them.
    pub results: Vec<Commit>,
    /// Whether the server has more commits after this page.
    pub has_more: bool,
    /// Opaque continuation token for the next page.
    pub next_offset: String,
}

/// Object metadata from a stat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStats {
    pub path: String,
    #[serde(default)]
    pub path_type: String,
    #[serde(default)]
    pub physical_address: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub mtime: i64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub metadata: Metadata,
}

/// Message and metadata for a commit or merge commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    pub metadata: Metadata,
}

impl CommitRequest {
    /// A request with the given message and no metadata.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: Metadata::new(),
        }
    }

    /// Replace the metadata mapping.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add one metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Default source branch for new branches.
pub const DEFAULT_SOURCE_BRANCH: &str = "main";

/// The store trait for branch, commit and object operations.
///
/// Implemented by [`LakeFsClient`](super::LakeFsClient) over HTTP and by
/// [`MockStore`](super::mock::MockStore) in memory.
///
/// # Error Handling
///
/// - `NotFound`: the branch, ref or object does not exist
/// - `Conflict`: the server rejected a merge or branch creation
/// - `AuthFailed`: credentials were rejected
/// - `ApiError` / `NetworkError`: report and let the caller decide on retry
#[async_trait]
pub trait VersionedStore: Send + Sync {
    /// Store name for diagnostics (e.g. "lakefs", "mock").
    fn name(&self) -> &'static str;

    /// Create branch `name` from `source`, returning the new reference.
    async fn create_branch(
        &self,
        repo: &str,
        name: &str,
        source: &str,
    ) -> Result<String, RemoteError>;

    /// Delete a branch.
    ///
    /// Not idempotent: an absent branch fails with `NotFound`.
    async fn delete_branch(&self, repo: &str, branch: &str) -> Result<(), RemoteError>;

    /// Current head commit id of a branch.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch does not exist
    async fn get_branch_commit_id(&self, repo: &str, branch: &str)
        -> Result<String, RemoteError>;

    /// Commit staged changes on `branch`, returning the new commit id.
    async fn commit(
        &self,
        repo: &str,
        branch: &str,
        request: CommitRequest,
    ) -> Result<String, RemoteError>;

    /// Fetch a single commit by any ref.
    async fn get_commit(&self, repo: &str, reference: &str) -> Result<Commit, RemoteError>;

    /// Fetch one page of history backwards from `reference`.
    ///
    /// `after` is the continuation token from the previous page, empty for
    /// the first page.
    async fn log_page(
        &self,
        repo: &str,
        reference: &str,
        amount: usize,
        after: &str,
    ) -> Result<CommitPage, RemoteError>;

    /// Merge `source_ref` into `destination_branch`, returning the resulting
    /// reference.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the server reports a merge conflict; the destination
    ///   branch is left untouched
    async fn merge(
        &self,
        repo: &str,
        source_ref: &str,
        destination_branch: &str,
        request: CommitRequest,
    ) -> Result<String, RemoteError>;

    /// Upload an object, returning its physical address.
    async fn upload(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: Vec<u8>,
    ) -> Result<String, RemoteError>;

    /// Read a whole object into memory.
    async fn get_object(
        &self,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, RemoteError>;

    /// Object metadata without content.
    async fn stat_object(
        &self,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<ObjectStats, RemoteError>;

    /// Generate a symlink manifest for `branch`, returning where it was written.
    ///
    /// When `location` is `None` the server picks the location.
    async fn create_symlink_file(
        &self,
        repo: &str,
        branch: &str,
        location: Option<&str>,
    ) -> Result<String, RemoteError>;
}

/// lakeFS sends `null` for empty metadata on some endpoints.
fn nullable_map<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}
