//! store::mock
//!
//! In-memory store for deterministic testing.
//!
//! # Design
//!
//! `MockStore` models just enough of lakeFS to drive callers: repositories
//! with branches, commits with parent links, per-branch objects and
//! per-commit object snapshots. Every call is recorded, and any operation
//! can be configured to fail with a chosen [`RemoteError`].
//!
//! # Example
//!
//! ```
//! use lakehook::store::mock::MockStore;
//! use lakehook::store::{CommitRequest, VersionedStore};
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new().with_repo("lake", "main");
//!
//! store.create_branch("lake", "etl", "main").await.unwrap();
//! store.upload("lake", "etl", "data/a.csv", b"a,b\n".to_vec()).await.unwrap();
//! let id = store.commit("lake", "etl", CommitRequest::new("load")).await.unwrap();
//!
//! assert_eq!(store.get_branch_commit_id("lake", "etl").await.unwrap(), id);
//! assert_eq!(store.get_object("lake", &id, "data/a.csv").await.unwrap(), b"a,b\n");
//! # });
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{
    Commit, CommitPage, CommitRequest, Metadata, ObjectStats, RemoteError, VersionedStore,
};

/// First fake creation timestamp handed out.
const EPOCH: i64 = 1_700_000_000;

/// Committer recorded on mock commits.
pub const MOCK_COMMITTER: &str = "mock";

/// Mock store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    repos: HashMap<String, MockRepo>,
    /// Sequence for commit ids, timestamps and addresses.
    next_seq: u64,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

type Objects = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
struct MockRepo {
    /// Branch name to head commit id.
    branches: HashMap<String, String>,
    /// Commit id to (sequence, commit).
    commits: HashMap<String, (u64, Commit)>,
    /// Working objects per branch.
    staging: HashMap<String, Objects>,
    /// Objects as of each commit.
    snapshots: HashMap<String, Objects>,
}

impl MockRepo {
    /// Resolve a branch name or commit id to a commit id.
    fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(head) = self.branches.get(reference) {
            return Some(head.clone());
        }
        self.commits
            .contains_key(reference)
            .then(|| reference.to_string())
    }

    /// Objects visible at a ref: staged objects for branches, snapshots for
    /// commits.
    fn objects_at(&self, reference: &str) -> Option<&Objects> {
        if self.branches.contains_key(reference) {
            return self.staging.get(reference);
        }
        self.snapshots.get(reference)
    }

    /// All ancestors of `id` (inclusive), newest first.
    fn history(&self, id: &str) -> Vec<Commit> {
        let mut seen = HashSet::new();
        let mut stack = vec![id.to_string()];
        let mut found = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some((seq, commit)) = self.commits.get(&id) {
                stack.extend(commit.parents.iter().cloned());
                found.push((*seq, commit.clone()));
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.into_iter().map(|(_, c)| c).collect()
    }
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    CreateBranch(RemoteError),
    DeleteBranch(RemoteError),
    GetBranch(RemoteError),
    Commit(RemoteError),
    GetCommit(RemoteError),
    LogPage(RemoteError),
    Merge(RemoteError),
    Upload(RemoteError),
    GetObject(RemoteError),
    StatObject(RemoteError),
    CreateSymlink(RemoteError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateBranch {
        repo: String,
        name: String,
        source: String,
    },
    DeleteBranch {
        repo: String,
        branch: String,
    },
    GetBranch {
        repo: String,
        branch: String,
    },
    Commit {
        repo: String,
        branch: String,
        message: String,
        metadata: Metadata,
    },
    GetCommit {
        repo: String,
        reference: String,
    },
    LogPage {
        repo: String,
        reference: String,
        amount: usize,
        after: String,
    },
    Merge {
        repo: String,
        source_ref: String,
        destination_branch: String,
        message: String,
    },
    Upload {
        repo: String,
        branch: String,
        path: String,
        size: usize,
    },
    GetObject {
        repo: String,
        reference: String,
        path: String,
    },
    StatObject {
        repo: String,
        reference: String,
        path: String,
    },
    CreateSymlink {
        repo: String,
        branch: String,
        location: Option<String>,
    },
}

impl MockStore {
    /// Create an empty mock store with no repositories.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner::default())),
        }
    }

    /// Add a repository whose `default_branch` points at an initial commit.
    pub fn with_repo(self, repo: &str, default_branch: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let seq = inner.bump();
            let commit = Commit {
                id: commit_id(seq),
                parents: Vec::new(),
                committer: String::new(),
                message: "Repository created".to_string(),
                creation_date: EPOCH + seq as i64,
                meta_range_id: String::new(),
                metadata: Metadata::new(),
            };
            let mut state = MockRepo::default();
            state
                .branches
                .insert(default_branch.to_string(), commit.id.clone());
            state
                .staging
                .insert(default_branch.to_string(), Objects::new());
            state.snapshots.insert(commit.id.clone(), Objects::new());
            state.commits.insert(commit.id.clone(), (seq, commit));
            inner.repos.insert(repo.to_string(), state);
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use lakehook::store::mock::{FailOn, MockStore};
    /// use lakehook::store::RemoteError;
    ///
    /// let store = MockStore::new()
    ///     .fail_on(FailOn::Merge(RemoteError::Conflict("conflict found".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.set_fail_on(fail_on);
        self
    }

    /// Configure a failure on a shared handle.
    pub fn set_fail_on(&self, fail_on: FailOn) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = Some(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Branch head without recording an operation (for test verification).
    pub fn branch_head(&self, repo: &str, branch: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .repos
            .get(repo)
            .and_then(|r| r.branches.get(branch).cloned())
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Result<(), RemoteError> {
        let inner = self.inner.lock().unwrap();
        let err = match &inner.fail_on {
            Some(FailOn::CreateBranch(e)) if expected == "create_branch" => e,
            Some(FailOn::DeleteBranch(e)) if expected == "delete_branch" => e,
            Some(FailOn::GetBranch(e)) if expected == "get_branch" => e,
            Some(FailOn::Commit(e)) if expected == "commit" => e,
            Some(FailOn::GetCommit(e)) if expected == "get_commit" => e,
            Some(FailOn::LogPage(e)) if expected == "log_page" => e,
            Some(FailOn::Merge(e)) if expected == "merge" => e,
            Some(FailOn::Upload(e)) if expected == "upload" => e,
            Some(FailOn::GetObject(e)) if expected == "get_object" => e,
            Some(FailOn::StatObject(e)) if expected == "stat_object" => e,
            Some(FailOn::CreateSymlink(e)) if expected == "create_symlink" => e,
            _ => return Ok(()),
        };
        Err(err.clone())
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStoreInner {
    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn repo(&self, repo: &str) -> Result<&MockRepo, RemoteError> {
        self.repos
            .get(repo)
            .ok_or_else(|| RemoteError::NotFound(format!("repository {}", repo)))
    }

    fn repo_mut(&mut self, repo: &str) -> Result<&mut MockRepo, RemoteError> {
        self.repos
            .get_mut(repo)
            .ok_or_else(|| RemoteError::NotFound(format!("repository {}", repo)))
    }

    /// Create a commit on `branch` with the branch's staged objects.
    fn add_commit(
        &mut self,
        repo: &str,
        branch: &str,
        parents: Vec<String>,
        request: CommitRequest,
    ) -> Result<String, RemoteError> {
        let seq = self.bump();
        let state = self.repo_mut(repo)?;
        let commit = Commit {
            id: commit_id(seq),
            parents,
            committer: MOCK_COMMITTER.to_string(),
            message: request.message,
            creation_date: EPOCH + seq as i64,
            meta_range_id: format!("mr{:08x}", seq),
            metadata: request.metadata,
        };
        let id = commit.id.clone();
        let snapshot = state.staging.get(branch).cloned().unwrap_or_default();
        state.snapshots.insert(id.clone(), snapshot);
        state.commits.insert(id.clone(), (seq, commit));
        state.branches.insert(branch.to_string(), id.clone());
        Ok(id)
    }
}

fn commit_id(seq: u64) -> String {
    format!("{:064x}", seq)
}

fn branch_not_found(branch: &str) -> RemoteError {
    RemoteError::NotFound(format!("branch {}", branch))
}

fn object_not_found(path: &str) -> RemoteError {
    RemoteError::NotFound(format!("object {}", path))
}

#[async_trait]
impl VersionedStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_branch(
        &self,
        repo: &str,
        name: &str,
        source: &str,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::CreateBranch {
            repo: repo.to_string(),
            name: name.to_string(),
            source: source.to_string(),
        });
        self.check_fail("create_branch")?;

        let mut inner = self.inner.lock().unwrap();
        let state = inner.repo_mut(repo)?;
        if state.branches.contains_key(name) {
            return Err(RemoteError::Conflict(format!("branch {} already exists", name)));
        }
        let head = state
            .resolve(source)
            .ok_or_else(|| RemoteError::NotFound(format!("ref {}", source)))?;
        let objects = state.objects_at(source).cloned().unwrap_or_default();
        state.staging.insert(name.to_string(), objects);
        state.branches.insert(name.to_string(), head.clone());
        Ok(head)
    }

    async fn delete_branch(&self, repo: &str, branch: &str) -> Result<(), RemoteError> {
        self.record(MockOperation::DeleteBranch {
            repo: repo.to_string(),
            branch: branch.to_string(),
        });
        self.check_fail("delete_branch")?;

        let mut inner = self.inner.lock().unwrap();
        let state = inner.repo_mut(repo)?;
        state
            .branches
            .remove(branch)
            .ok_or_else(|| branch_not_found(branch))?;
        state.staging.remove(branch);
        Ok(())
    }

    async fn get_branch_commit_id(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::GetBranch {
            repo: repo.to_string(),
            branch: branch.to_string(),
        });
        self.check_fail("get_branch")?;

        let inner = self.inner.lock().unwrap();
        inner
            .repo(repo)?
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| branch_not_found(branch))
    }

    async fn commit(
        &self,
        repo: &str,
        branch: &str,
        request: CommitRequest,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::Commit {
            repo: repo.to_string(),
            branch: branch.to_string(),
            message: request.message.clone(),
            metadata: request.metadata.clone(),
        });
        self.check_fail("commit")?;

        let mut inner = self.inner.lock().unwrap();
        let head = inner
            .repo(repo)?
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| branch_not_found(branch))?;
        inner.add_commit(repo, branch, vec![head], request)
    }

    async fn get_commit(&self, repo: &str, reference: &str) -> Result<Commit, RemoteError> {
        self.record(MockOperation::GetCommit {
            repo: repo.to_string(),
            reference: reference.to_string(),
        });
        self.check_fail("get_commit")?;

        let inner = self.inner.lock().unwrap();
        let state = inner.repo(repo)?;
        state
            .resolve(reference)
            .and_then(|id| state.commits.get(&id))
            .map(|(_, commit)| commit.clone())
            .ok_or_else(|| RemoteError::NotFound(format!("commit {}", reference)))
    }

    async fn log_page(
        &self,
        repo: &str,
        reference: &str,
        amount: usize,
        after: &str,
    ) -> Result<CommitPage, RemoteError> {
        self.record(MockOperation::LogPage {
            repo: repo.to_string(),
            reference: reference.to_string(),
            amount,
            after: after.to_string(),
        });
        self.check_fail("log_page")?;

        let inner = self.inner.lock().unwrap();
        let state = inner.repo(repo)?;
        let head = state
            .resolve(reference)
            .ok_or_else(|| RemoteError::NotFound(format!("ref {}", reference)))?;
        let history = state.history(&head);

        let start = if after.is_empty() {
            0
        } else {
            history
                .iter()
                .position(|c| c.id == after)
                .map(|i| i + 1)
                .unwrap_or(history.len())
        };
        let results: Vec<Commit> = history.iter().skip(start).take(amount).cloned().collect();
        let has_more = start + results.len() < history.len();
        let next_offset = results.last().map(|c| c.id.clone()).unwrap_or_default();

        Ok(CommitPage {
            results,
            has_more,
            next_offset,
        })
    }

    async fn merge(
        &self,
        repo: &str,
        source_ref: &str,
        destination_branch: &str,
        request: CommitRequest,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::Merge {
            repo: repo.to_string(),
            source_ref: source_ref.to_string(),
            destination_branch: destination_branch.to_string(),
            message: request.message.clone(),
        });
        self.check_fail("merge")?;

        let mut inner = self.inner.lock().unwrap();
        let state = inner.repo_mut(repo)?;
        let source_head = state
            .resolve(source_ref)
            .ok_or_else(|| RemoteError::NotFound(format!("ref {}", source_ref)))?;
        let destination_head = state
            .branches
            .get(destination_branch)
            .cloned()
            .ok_or_else(|| branch_not_found(destination_branch))?;

        let incoming = state.objects_at(source_ref).cloned().unwrap_or_default();
        state
            .staging
            .entry(destination_branch.to_string())
            .or_default()
            .extend(incoming);

        inner.add_commit(
            repo,
            destination_branch,
            vec![destination_head, source_head],
            request,
        )
    }

    async fn upload(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: Vec<u8>,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::Upload {
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
            size: content.len(),
        });
        self.check_fail("upload")?;

        let mut inner = self.inner.lock().unwrap();
        let seq = inner.bump();
        let state = inner.repo_mut(repo)?;
        if !state.branches.contains_key(branch) {
            return Err(branch_not_found(branch));
        }
        state
            .staging
            .entry(branch.to_string())
            .or_default()
            .insert(path.to_string(), content);
        Ok(format!("mock://{}/data/{:08x}", repo, seq))
    }

    async fn get_object(
        &self,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        self.record(MockOperation::GetObject {
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        });
        self.check_fail("get_object")?;

        let inner = self.inner.lock().unwrap();
        inner
            .repo(repo)?
            .objects_at(reference)
            .and_then(|objects| objects.get(path))
            .cloned()
            .ok_or_else(|| object_not_found(path))
    }

    async fn stat_object(
        &self,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<ObjectStats, RemoteError> {
        self.record(MockOperation::StatObject {
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        });
        self.check_fail("stat_object")?;

        let inner = self.inner.lock().unwrap();
        let content = inner
            .repo(repo)?
            .objects_at(reference)
            .and_then(|objects| objects.get(path))
            .ok_or_else(|| object_not_found(path))?;
        Ok(ObjectStats {
            path: path.to_string(),
            path_type: "object".to_string(),
            physical_address: format!("mock://{}/{}", repo, path),
            checksum: format!("{:016x}", content.len()),
            size_bytes: Some(content.len() as u64),
            mtime: EPOCH,
            content_type: Some("application/octet-stream".to_string()),
            metadata: Metadata::new(),
        })
    }

    async fn create_symlink_file(
        &self,
        repo: &str,
        branch: &str,
        location: Option<&str>,
    ) -> Result<String, RemoteError> {
        self.record(MockOperation::CreateSymlink {
            repo: repo.to_string(),
            branch: branch.to_string(),
            location: location.map(str::to_string),
        });
        self.check_fail("create_symlink")?;

        let inner = self.inner.lock().unwrap();
        if !inner.repo(repo)?.branches.contains_key(branch) {
            return Err(branch_not_found(branch));
        }
        Ok(location
            .map(str::to_string)
            .unwrap_or_else(|| format!("mock://{}/_lakefs/symlinks/{}", repo, branch)))
    }
}
