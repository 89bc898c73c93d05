//! core::provenance
//!
//! Orchestrator run provenance for commits, and links back to commits.
//!
//! # Run Context
//!
//! Orchestrators describe the run that produced a commit through an explicit
//! [`RunContext`]. [`RunContext::enrich`] writes that description into the
//! commit metadata under keys prefixed `::lakefs::{orchestrator}::`, so the
//! lakeFS UI can show where the data came from.
//!
//! # Commit Links
//!
//! [`CommitLink`] renders the lakeFS UI address of a commit.
//!
//! # Example
//!
//! ```
//! use lakehook::core::provenance::RunContext;
//! use lakehook::store::Metadata;
//!
//! let ctx = RunContext::new("Airflow", "daily_load", "scheduled__2024-01-01")
//!     .with_endpoint_url("https://airflow.example");
//! let mut metadata = Metadata::new();
//! ctx.enrich(&mut metadata);
//! assert_eq!(
//!     metadata.get("::lakefs::Airflow::dag_id").map(String::as_str),
//!     Some("daily_load"),
//! );
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Metadata;

/// Orchestrator name used when none is given.
pub const DEFAULT_ORCHESTRATOR: &str = "Airflow";

/// Description of the orchestrator run that produced a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunContext {
    /// Name embedded in the metadata prefix, e.g. "Airflow".
    pub orchestrator: String,
    pub dag_id: String,
    pub run_id: String,
    pub logical_date: Option<DateTime<Utc>>,
    pub data_interval_start: Option<DateTime<Utc>>,
    pub data_interval_end: Option<DateTime<Utc>>,
    pub run_type: Option<String>,
    pub external_trigger: Option<bool>,
    /// Run parameters, rendered as given.
    pub conf: Option<String>,
    pub note: Option<String>,
    /// Base URL of the orchestrator web server.
    pub endpoint_url: Option<String>,
}

impl RunContext {
    pub fn new(
        orchestrator: impl Into<String>,
        dag_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            dag_id: dag_id.into(),
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn with_logical_date(mut self, date: DateTime<Utc>) -> Self {
        self.logical_date = Some(date);
        self
    }

    pub fn with_data_interval(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.data_interval_start = Some(start);
        self.data_interval_end = Some(end);
        self
    }

    pub fn with_run_type(mut self, run_type: impl Into<String>) -> Self {
        self.run_type = Some(run_type.into());
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Metadata key prefix for this orchestrator.
    pub fn prefix(&self) -> String {
        let name = if self.orchestrator.is_empty() {
            DEFAULT_ORCHESTRATOR
        } else {
            &self.orchestrator
        };
        format!("::lakefs::{}::", name)
    }

    /// Write run provenance into `metadata`. Absent values are skipped;
    /// existing keys with the same name are overwritten.
    pub fn enrich(&self, metadata: &mut Metadata) {
        let prefix = self.prefix();
        let mut put = |key: &str, value: String| {
            metadata.insert(format!("{}{}", prefix, key), value);
        };

        put("dag_run_id", self.run_id.clone());
        put("dag_id", self.dag_id.clone());
        if let Some(date) = self.logical_date {
            put("logical_date", date.to_rfc3339());
        }
        if let Some(start) = self.data_interval_start {
            put("data_interval_start[iso8601]", start.to_rfc3339());
        }
        if let Some(end) = self.data_interval_end {
            put("data_interval_end[iso8601]", end.to_rfc3339());
        }
        if let Some(run_type) = &self.run_type {
            put("run_type", run_type.clone());
        }
        if let Some(external) = self.external_trigger {
            put("external_trigger", external.to_string());
        }
        if let Some(conf) = &self.conf {
            put("conf", conf.clone());
        }
        if let Some(note) = &self.note {
            put("note", note.clone());
        }
        if let Some(base) = &self.endpoint_url {
            put(
                "url[url:id]",
                format!("{}/api/v1/dags/{}/dagRuns/{}", base, self.dag_id, self.run_id),
            );
            let logical = self
                .logical_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default();
            put(
                "url[url:ui]",
                format!(
                    "{}/dags/{}/graph?dag_run_id={}&root=&logical_date={}",
                    base, self.dag_id, self.run_id, logical
                ),
            );
        }
    }
}

/// UI link to a commit: `{base_url}/repositories/{repo}/commits/{commit_digest}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLink {
    pub base_url: String,
    pub repo: String,
    pub commit_digest: String,
}

impl CommitLink {
    pub fn new(
        base_url: impl Into<String>,
        repo: impl Into<String>,
        commit_digest: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            commit_digest: commit_digest.into(),
        }
    }
}

impl fmt::Display for CommitLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/repositories/{}/commits/{}",
            self.base_url, self.repo, self.commit_digest
        )
    }
}
