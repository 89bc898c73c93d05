//! store::log
//!
//! Lazy, pull-based iteration over commit history.
//!
//! [`CommitLog`] fetches one page per round trip and hands out commits one at
//! a time. A new page is requested only after the current one is drained, so
//! dropping the cursor between pages cancels the walk with nothing to clean
//! up. Commits come out in exactly the order the server returned them; pages
//! are never re-sorted or deduplicated.

use std::collections::VecDeque;

use tracing::debug;

use super::traits::{Commit, CommitPage, RemoteError, VersionedStore};

/// Default number of commits fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Cursor over the history of a ref.
///
/// Finite and not restartable. After an error is yielded the cursor is
/// exhausted.
///
/// # Example
///
/// ```
/// use lakehook::store::mock::MockStore;
/// use lakehook::store::{CommitLog, CommitRequest, VersionedStore};
///
/// # tokio_test::block_on(async {
/// let store = MockStore::new().with_repo("lake", "main");
/// store.commit("lake", "main", CommitRequest::new("one")).await.unwrap();
/// store.commit("lake", "main", CommitRequest::new("two")).await.unwrap();
///
/// let mut log = CommitLog::new(&store, "lake", "main", 1);
/// let mut messages = Vec::new();
/// while let Some(commit) = log.next().await {
///     messages.push(commit.unwrap().message);
/// }
/// assert_eq!(messages[..2], ["two".to_string(), "one".to_string()]);
/// # });
/// ```
pub struct CommitLog<'a> {
    store: &'a dyn VersionedStore,
    repo: String,
    reference: String,
    page_size: usize,
    /// Continuation token for the next page.
    after: String,
    /// Commits of the current page not yet handed out.
    buffer: VecDeque<Commit>,
    /// No further pages will be fetched.
    exhausted: bool,
    pages_fetched: usize,
}

impl std::fmt::Debug for CommitLog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitLog")
            .field("store", &self.store.name())
            .field("repo", &self.repo)
            .field("reference", &self.reference)
            .field("page_size", &self.page_size)
            .field("after", &self.after)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}

impl<'a> CommitLog<'a> {
    /// Start a walk backwards from `reference`. A `page_size` of 0 is
    /// treated as 1.
    pub fn new(
        store: &'a dyn VersionedStore,
        repo: &str,
        reference: &str,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            repo: repo.to_string(),
            reference: reference.to_string(),
            page_size: page_size.max(1),
            after: String::new(),
            buffer: VecDeque::new(),
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Next commit, fetching a page if the current one is drained.
    ///
    /// Returns `None` once history is exhausted.
    pub async fn next(&mut self) -> Option<Result<Commit, RemoteError>> {
        loop {
            if let Some(commit) = self.buffer.pop_front() {
                return Some(Ok(commit));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page().await {
                return Some(Err(e));
            }
        }
    }

    /// Drain the cursor into a vector, stopping at the first error.
    pub async fn try_collect(mut self) -> Result<Vec<Commit>, RemoteError> {
        let mut commits = Vec::new();
        while let Some(commit) = self.next().await {
            commits.push(commit?);
        }
        Ok(commits)
    }

    /// Number of page round trips made so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether no further pages will be requested.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    async fn fetch_page(&mut self) -> Result<(), RemoteError> {
        let result = self
            .store
            .log_page(&self.repo, &self.reference, self.page_size, &self.after)
            .await;
        self.pages_fetched += 1;

        let page: CommitPage = match result {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };

        debug!(
            repo = %self.repo,
            reference = %self.reference,
            page = self.pages_fetched,
            commits = page.results.len(),
            has_more = page.has_more,
            "log page"
        );

        // A server claiming more results without a token would make us
        // refetch the first page forever.
        self.exhausted = !page.has_more || page.next_offset.is_empty();
        self.after = page.next_offset;
        self.buffer.extend(page.results);
        Ok(())
    }
}
