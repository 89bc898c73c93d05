//! cli::commands::branch
//!
//! Branch create, delete and head lookup.
//!
//! Commit ids are the commands' results and print even with `--quiet`.

use anyhow::Result;

use crate::cli::Context;
use crate::store::VersionedStore;
use crate::ui::output;

/// Create `name` from `source` and print the new branch's head commit.
pub async fn create_branch(ctx: &Context, repo: &str, name: &str, source: &str) -> Result<()> {
    let client = ctx.client()?;
    let head = client.create_branch(repo, name, source).await?;
    println!("{}", head);
    Ok(())
}

/// Delete branch `name`.
pub async fn delete_branch(ctx: &Context, repo: &str, name: &str) -> Result<()> {
    let client = ctx.client()?;
    client.delete_branch(repo, name).await?;
    output::print(format!("Deleted branch '{}'", name), ctx.verbosity);
    Ok(())
}

/// Print the head commit id of `branch`.
pub async fn head(ctx: &Context, repo: &str, branch: &str) -> Result<()> {
    let client = ctx.client()?;
    let id = client.get_branch_commit_id(repo, branch).await?;
    println!("{}", id);
    Ok(())
}
