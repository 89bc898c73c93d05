//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Builds a client for the selected connection
//! 2. Makes the store or sensor call
//! 3. Formats and displays output
//!
//! Handlers are async and run on the runtime created in [`crate::cli::run`].

mod branch;
mod commit;
mod completion;
mod connection;
mod objects;
mod wait;

// Re-export command functions for testing and direct invocation
pub use branch::{create_branch, delete_branch, head};
pub use commit::{commit, link, log, merge, show};
pub use completion::completion;
pub use connection::test_connection;
pub use objects::{cat, stat, symlink, upload};
pub use wait::{wait_commit, wait_file};

use anyhow::Result;

use crate::cli::args::{BranchAction, Command, WaitTarget};
use crate::cli::Context;

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::TestConnection => connection::test_connection(ctx).await,
        Command::Branch { action } => match action {
            BranchAction::Create { repo, name, source } => {
                branch::create_branch(ctx, &repo, &name, &source).await
            }
            BranchAction::Delete { repo, name } => branch::delete_branch(ctx, &repo, &name).await,
            BranchAction::Head { repo, branch } => branch::head(ctx, &repo, &branch).await,
        },
        Command::Commit {
            repo,
            branch,
            message,
            metadata,
            provenance,
        } => commit::commit(ctx, &repo, &branch, &message, &metadata, &provenance).await,
        Command::Merge {
            repo,
            source_ref,
            destination_branch,
            message,
            metadata,
            provenance,
        } => {
            commit::merge(
                ctx,
                &repo,
                &source_ref,
                &destination_branch,
                &message,
                &metadata,
                &provenance,
            )
            .await
        }
        Command::Show { repo, reference } => commit::show(ctx, &repo, &reference).await,
        Command::Log {
            repo,
            reference,
            page_size,
            limit,
            json,
        } => commit::log(ctx, &repo, &reference, page_size, limit, json).await,
        Command::Upload {
            repo,
            branch,
            path,
            source,
        } => objects::upload(ctx, &repo, &branch, &path, &source).await,
        Command::Cat {
            repo,
            reference,
            path,
        } => objects::cat(ctx, &repo, &reference, &path).await,
        Command::Stat {
            repo,
            reference,
            path,
        } => objects::stat(ctx, &repo, &reference, &path).await,
        Command::Symlink {
            repo,
            branch,
            location,
        } => objects::symlink(ctx, &repo, &branch, location.as_deref()).await,
        Command::Wait { target } => match target {
            WaitTarget::Commit {
                repo,
                branch,
                previous,
                allow_missing,
                poll,
            } => {
                wait::wait_commit(ctx, &repo, &branch, previous.as_deref(), allow_missing, &poll)
                    .await
            }
            WaitTarget::File {
                repo,
                reference,
                path,
                poll,
            } => wait::wait_file(ctx, &repo, &reference, &path, &poll).await,
        },
        Command::Link { repo, commit } => commit::link(ctx, &repo, &commit),
        Command::Completion { shell } => completion::completion(shell),
    }
}
