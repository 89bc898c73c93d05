//! cli::commands::commit
//!
//! Commit, merge and history commands.
//!
//! # Example
//!
//! ```bash
//! lakehook commit lake etl -m "load" --meta rows=1200
//! lakehook merge lake etl main -m "publish"
//! lakehook log lake main --limit 5
//! ```

use anyhow::Result;
use tracing::debug;

use crate::cli::args::{MetadataArgs, ProvenanceArgs};
use crate::cli::Context;
use crate::store::{CommitRequest, VersionedStore};
use crate::ui::output;

/// Build the request from flags, adding run provenance when given.
fn commit_request(
    message: &str,
    metadata: &MetadataArgs,
    provenance: &ProvenanceArgs,
) -> CommitRequest {
    let mut entries = metadata.to_metadata();
    if let Some(run) = provenance.run_context() {
        run.enrich(&mut entries);
    }
    CommitRequest::new(message).with_metadata(entries)
}

/// Commit staged changes on `branch` and print the new commit id.
pub async fn commit(
    ctx: &Context,
    repo: &str,
    branch: &str,
    message: &str,
    metadata: &MetadataArgs,
    provenance: &ProvenanceArgs,
) -> Result<()> {
    let client = ctx.client()?;
    let request = commit_request(message, metadata, provenance);
    debug!(entries = request.metadata.len(), "committing");

    let id = client.commit(repo, branch, request).await?;
    println!("{}", id);
    output::print(client.commit_url(repo, &id), ctx.verbosity);
    Ok(())
}

/// Merge `source_ref` into `destination_branch` and print the merge reference.
pub async fn merge(
    ctx: &Context,
    repo: &str,
    source_ref: &str,
    destination_branch: &str,
    message: &str,
    metadata: &MetadataArgs,
    provenance: &ProvenanceArgs,
) -> Result<()> {
    let client = ctx.client()?;
    let request = commit_request(message, metadata, provenance);
    let reference = client
        .merge(repo, source_ref, destination_branch, request)
        .await?;
    println!("{}", reference);
    Ok(())
}

/// Print a commit as JSON.
pub async fn show(ctx: &Context, repo: &str, reference: &str) -> Result<()> {
    let client = ctx.client()?;
    let commit = client.get_commit(repo, reference).await?;
    output::json(&commit)?;
    Ok(())
}

/// Print history from `reference`, newest first.
pub async fn log(
    ctx: &Context,
    repo: &str,
    reference: &str,
    page_size: Option<usize>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let client = ctx.client()?;
    let page_size = page_size.unwrap_or_else(|| ctx.config.page_size());
    let mut history = client.log_commits(repo, reference, page_size);

    let mut shown = 0usize;
    while limit.map_or(true, |limit| shown < limit) {
        let Some(commit) = history.next().await else {
            break;
        };
        let commit = commit?;
        if json {
            println!("{}", serde_json::to_string(&commit)?);
        } else {
            println!("{}", output::format_commit(&commit));
        }
        shown += 1;
    }
    debug!(shown, pages = history.pages_fetched(), "log done");
    Ok(())
}

/// Print the UI link for a commit. No request is made.
pub fn link(ctx: &Context, repo: &str, commit: &str) -> Result<()> {
    let client = ctx.client()?;
    println!("{}", client.commit_url(repo, commit));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_without_run_keeps_flags() {
        let metadata = MetadataArgs {
            entries: vec![("rows".into(), "10".into())],
        };
        let request = commit_request("load", &metadata, &ProvenanceArgs::default());
        assert_eq!(request.message, "load");
        assert_eq!(request.metadata.len(), 1);
    }

    #[test]
    fn request_with_run_adds_provenance() {
        let provenance = ProvenanceArgs {
            dag_id: Some("daily".into()),
            run_id: Some("r1".into()),
            orchestrator: "Airflow".into(),
            orchestrator_url: None,
        };
        let request = commit_request("load", &MetadataArgs::default(), &provenance);
        assert_eq!(request.metadata["::lakefs::Airflow::dag_id"], "daily");
        assert_eq!(request.metadata["::lakefs::Airflow::dag_run_id"], "r1");
    }
}
