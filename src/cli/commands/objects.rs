//! cli::commands::objects
//!
//! Object upload, download, stat and symlink commands.

use anyhow::{Context as _, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::cli::Context;
use crate::store::VersionedStore;
use crate::ui::output;

/// Read upload content from a file, or stdin for `-`.
async fn read_source(source: &str) -> Result<Vec<u8>> {
    if source == "-" {
        let mut content = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut content)
            .await
            .context("failed to read stdin")?;
        return Ok(content);
    }
    tokio::fs::read(source)
        .await
        .with_context(|| format!("failed to read '{}'", source))
}

/// Upload `source` to `path` on `branch` and print the stored path.
pub async fn upload(ctx: &Context, repo: &str, branch: &str, path: &str, source: &str) -> Result<()> {
    let content = read_source(source).await?;
    debug!(bytes = content.len(), path, "uploading");

    let client = ctx.client()?;
    let stored = client.upload(repo, branch, path, content).await?;
    output::print(format!("Uploaded {}", stored), ctx.verbosity);
    Ok(())
}

/// Write an object's bytes to stdout unchanged.
pub async fn cat(ctx: &Context, repo: &str, reference: &str, path: &str) -> Result<()> {
    let client = ctx.client()?;
    let content = client.get_object(repo, reference, path).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&content).await?;
    stdout.flush().await?;
    Ok(())
}

/// Print object metadata as JSON.
pub async fn stat(ctx: &Context, repo: &str, reference: &str, path: &str) -> Result<()> {
    let client = ctx.client()?;
    let stats = client.stat_object(repo, reference, path).await?;
    output::json(&stats)?;
    Ok(())
}

/// Create symlink files and print their storage location.
pub async fn symlink(
    ctx: &Context,
    repo: &str,
    branch: &str,
    location: Option<&str>,
) -> Result<()> {
    let client = ctx.client()?;
    let uri = client.create_symlink_file(repo, branch, location).await?;
    println!("{}", uri);
    Ok(())
}
