//! sensors
//!
//! Pollers that wait for something to happen in a lakeFS repository.
//!
//! # Design
//!
//! A [`Sensor`] answers one question per [`poke`](Sensor::poke): "has it
//! happened yet?". Pokes are single round trips against a
//! [`VersionedStore`]; [`wait_for`] adds the polling loop with an interval
//! and an overall timeout. The store itself never polls or retries.
//!
//! - [`CommitSensor`]: fires once a branch head moves past a baseline commit
//! - [`FileSensor`]: fires once an object exists at a path
//!
//! # Example
//!
//! ```ignore
//! use lakehook::sensors::{wait_for, FileSensor, PollPolicy};
//!
//! let mut sensor = FileSensor::new(&client, "lake", "main", "_SUCCESS");
//! wait_for(&mut sensor, &PollPolicy::default()).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::store::{RemoteError, VersionedStore};

/// Default delay between pokes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default overall wait.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Errors from waiting on a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// The condition did not hold before the timeout.
    #[error("sensor timed out after {waited:?}")]
    Timeout { waited: Duration },

    /// A poke failed with an error the sensor does not tolerate.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// How often and how long to poke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// A condition checked with one remote call per poke.
#[async_trait]
pub trait Sensor: Send {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Check the condition once.
    async fn poke(&mut self) -> Result<bool, RemoteError>;
}

/// Poke `sensor` until it reports `true`.
///
/// Sleeps `policy.interval` between pokes. Remote errors end the wait
/// immediately; retry policy for them is the caller's.
///
/// # Errors
///
/// - `SensorError::Timeout` once `policy.timeout` has elapsed
/// - `SensorError::Remote` when a poke fails
pub async fn wait_for<S: Sensor + ?Sized>(
    sensor: &mut S,
    policy: &PollPolicy,
) -> Result<(), SensorError> {
    let started = Instant::now();
    let mut pokes = 0u32;
    loop {
        pokes += 1;
        if sensor.poke().await? {
            info!(sensor = %sensor.describe(), pokes, "sensor condition met");
            return Ok(());
        }

        let waited = started.elapsed();
        if waited >= policy.timeout {
            info!(sensor = %sensor.describe(), pokes, "sensor timed out");
            return Err(SensorError::Timeout { waited });
        }
        debug!(sensor = %sensor.describe(), pokes, "condition not met, sleeping");
        sleep(policy.interval.min(policy.timeout - waited)).await;
    }
}

/// Fires once a branch head differs from a baseline commit.
///
/// The baseline is either supplied with [`with_previous_commit`] or taken
/// from the first successful read of the branch head.
///
/// [`with_previous_commit`]: CommitSensor::with_previous_commit
pub struct CommitSensor<'a> {
    store: &'a dyn VersionedStore,
    repo: String,
    branch: String,
    /// When false, a missing branch is "not yet" instead of an error.
    branch_exists: bool,
    baseline: Option<String>,
}

impl<'a> CommitSensor<'a> {
    /// A sensor on `branch`, which must exist.
    pub fn new(store: &'a dyn VersionedStore, repo: &str, branch: &str) -> Self {
        Self {
            store,
            repo: repo.to_string(),
            branch: branch.to_string(),
            branch_exists: true,
            baseline: None,
        }
    }

    /// Tolerate the branch not existing yet.
    pub fn allow_missing_branch(mut self) -> Self {
        self.branch_exists = false;
        self
    }

    /// Compare against a commit observed earlier by the caller.
    pub fn with_previous_commit(mut self, commit_id: impl Into<String>) -> Self {
        self.baseline = Some(commit_id.into());
        self
    }

    /// The commit the head is compared against, once known.
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }
}

#[async_trait]
impl<'a> Sensor for CommitSensor<'a> {
    fn describe(&self) -> String {
        format!("commit on {}/{}", self.repo, self.branch)
    }

    async fn poke(&mut self) -> Result<bool, RemoteError> {
        debug!(repo = %self.repo, branch = %self.branch, "poking branch");
        let current = match self
            .store
            .get_branch_commit_id(&self.repo, &self.branch)
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_not_found() && !self.branch_exists => {
                debug!(repo = %self.repo, branch = %self.branch, "branch not there yet");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        self.branch_exists = true;

        if let Some(previous) = &self.baseline {
            debug!(previous = %previous, current = %current, "comparing heads");
            return Ok(*previous != current);
        }
        self.baseline = Some(current);
        Ok(false)
    }
}

/// Fires once an object exists at `path` on a ref.
pub struct FileSensor<'a> {
    store: &'a dyn VersionedStore,
    repo: String,
    reference: String,
    path: String,
}

impl<'a> FileSensor<'a> {
    pub fn new(store: &'a dyn VersionedStore, repo: &str, reference: &str, path: &str) -> Self {
        Self {
            store,
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl<'a> Sensor for FileSensor<'a> {
    fn describe(&self) -> String {
        format!("object {} on {}/{}", self.path, self.repo, self.reference)
    }

    async fn poke(&mut self) -> Result<bool, RemoteError> {
        match self
            .store
            .stat_object(&self.repo, &self.reference, &self.path)
            .await
        {
            Ok(_) => {
                info!(path = %self.path, reference = %self.reference, "found object");
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path, reference = %self.reference, "object not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{FailOn, MockStore};
    use crate::store::CommitRequest;

    fn fast() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn commit_sensor_fires_after_new_commit() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = CommitSensor::new(&store, "lake", "main");

        assert!(!sensor.poke().await.unwrap());
        assert!(sensor.baseline().is_some());
        assert!(!sensor.poke().await.unwrap());

        store
            .commit("lake", "main", CommitRequest::new("new data"))
            .await
            .unwrap();
        assert!(sensor.poke().await.unwrap());
    }

    #[tokio::test]
    async fn commit_sensor_uses_supplied_baseline() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = CommitSensor::new(&store, "lake", "main").with_previous_commit("older");
        assert!(sensor.poke().await.unwrap());
    }

    #[tokio::test]
    async fn missing_branch_fails_by_default() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = CommitSensor::new(&store, "lake", "later");
        assert!(sensor.poke().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn missing_branch_tolerated_when_allowed() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = CommitSensor::new(&store, "lake", "later").allow_missing_branch();
        assert!(!sensor.poke().await.unwrap());

        store.create_branch("lake", "later", "main").await.unwrap();
        assert!(!sensor.poke().await.unwrap());
        store
            .commit("lake", "later", CommitRequest::new("x"))
            .await
            .unwrap();
        assert!(sensor.poke().await.unwrap());

        // Observed once, so a later disappearance is an error
        store.delete_branch("lake", "later").await.unwrap();
        assert!(sensor.poke().await.is_err());
    }

    #[tokio::test]
    async fn file_sensor_waits_for_object() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = FileSensor::new(&store, "lake", "main", "out/_SUCCESS");
        assert!(!sensor.poke().await.unwrap());

        store
            .upload("lake", "main", "out/_SUCCESS", Vec::new())
            .await
            .unwrap();
        assert!(sensor.poke().await.unwrap());
    }

    #[tokio::test]
    async fn file_sensor_propagates_other_errors() {
        let store = MockStore::new()
            .with_repo("lake", "main")
            .fail_on(FailOn::StatObject(RemoteError::AuthFailed("nope".into())));
        let mut sensor = FileSensor::new(&store, "lake", "main", "x");
        assert!(matches!(
            sensor.poke().await,
            Err(RemoteError::AuthFailed(_))
        ));
    }

    #[tokio::test]
    async fn wait_for_times_out() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = FileSensor::new(&store, "lake", "main", "never");
        let err = wait_for(&mut sensor, &fast()).await.unwrap_err();
        assert!(matches!(err, SensorError::Timeout { .. }));
    }

    #[tokio::test]
    async fn wait_for_returns_when_condition_holds() {
        let store = MockStore::new().with_repo("lake", "main");
        store
            .upload("lake", "main", "ready", b"1".to_vec())
            .await
            .unwrap();
        let mut sensor = FileSensor::new(&store, "lake", "main", "ready");
        wait_for(&mut sensor, &fast()).await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_stops_on_remote_error() {
        let store = MockStore::new().with_repo("lake", "main");
        let mut sensor = CommitSensor::new(&store, "lake", "ghost");
        let err = wait_for(&mut sensor, &fast()).await.unwrap_err();
        assert!(matches!(err, SensorError::Remote(RemoteError::NotFound(_))));
    }
}
