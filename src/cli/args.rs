//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--conn <id>`: Connection id to use (default `lakefs_default`)
//! - `--config <path>`: Config file to load instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::config::DEFAULT_CONNECTION_ID;
use crate::core::provenance::{RunContext, DEFAULT_ORCHESTRATOR};
use crate::store::{Metadata, DEFAULT_SOURCE_BRANCH};

/// Lakehook - drive lakeFS branches, commits and objects from the command line
#[derive(Parser, Debug)]
#[command(name = "lakehook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection id to resolve credentials from
    #[arg(long = "conn", global = true, value_name = "ID", default_value = DEFAULT_CONNECTION_ID)]
    pub conn_id: String,

    /// Config file to load instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the connection's host and credentials work
    #[command(
        name = "test-connection",
        long_about = "Check that the connection's host and credentials work.\n\n\
            Logs in to the lakeFS server with the resolved credentials. Prints the \
            outcome and exits non-zero when the server cannot be reached or rejects \
            the credentials.",
        after_help = "\
EXAMPLES:
    lakehook test-connection
    lakehook --conn lakefs_prod test-connection"
    )]
    TestConnection,

    /// Create, delete or inspect branches
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Commit staged changes on a branch
    #[command(after_help = "\
EXAMPLES:
    lakehook commit lake etl -m 'load 2024-01-01'
    lakehook commit lake etl -m 'load' --meta source=s3 --meta rows=1200

    # Record orchestrator provenance in the commit metadata
    lakehook commit lake etl -m 'load' --dag-id daily_load --run-id manual__1")]
    Commit {
        /// Repository name
        repo: String,

        /// Branch to commit on
        branch: String,

        /// Commit message
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        metadata: MetadataArgs,

        #[command(flatten)]
        provenance: ProvenanceArgs,
    },

    /// Merge a ref into a branch
    Merge {
        /// Repository name
        repo: String,

        /// Branch, tag or commit to merge from
        source_ref: String,

        /// Branch to merge into
        destination_branch: String,

        /// Merge commit message
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        metadata: MetadataArgs,

        #[command(flatten)]
        provenance: ProvenanceArgs,
    },

    /// Show a commit as JSON
    Show {
        /// Repository name
        repo: String,

        /// Branch, tag or commit id
        reference: String,
    },

    /// List commit history backwards from a ref
    #[command(after_help = "\
EXAMPLES:
    lakehook log lake main
    lakehook log lake main --limit 20
    lakehook log lake main --json --page-size 500")]
    Log {
        /// Repository name
        repo: String,

        /// Branch, tag or commit id to start from
        reference: String,

        /// Commits fetched per request (default from config, else 100)
        #[arg(long, value_name = "N")]
        page_size: Option<usize>,

        /// Stop after this many commits
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<usize>,

        /// Print one JSON object per commit
        #[arg(long)]
        json: bool,
    },

    /// Upload a local file (or stdin) to a path on a branch
    #[command(after_help = "\
EXAMPLES:
    lakehook upload lake etl data/part-0.parquet ./part-0.parquet
    echo done | lakehook upload lake etl _SUCCESS -")]
    Upload {
        /// Repository name
        repo: String,

        /// Branch to upload to
        branch: String,

        /// Object path in the repository
        path: String,

        /// Local file to upload, or `-` for stdin
        source: String,
    },

    /// Write an object's content to stdout
    Cat {
        /// Repository name
        repo: String,

        /// Branch, tag or commit id
        reference: String,

        /// Object path in the repository
        path: String,
    },

    /// Show object metadata as JSON
    Stat {
        /// Repository name
        repo: String,

        /// Branch, tag or commit id
        reference: String,

        /// Object path in the repository
        path: String,
    },

    /// Create symlink files for a branch and print their location
    Symlink {
        /// Repository name
        repo: String,

        /// Branch to create symlinks for
        branch: String,

        /// Restrict to objects under this prefix
        #[arg(long)]
        location: Option<String>,
    },

    /// Block until a commit lands or an object appears
    Wait {
        #[command(subcommand)]
        target: WaitTarget,
    },

    /// Print the lakeFS UI link for a commit
    Link {
        /// Repository name
        repo: String,

        /// Commit id
        commit: String,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    lakehook completion bash > ~/.local/share/bash-completion/completions/lakehook
    lakehook completion zsh > ~/.zfunc/_lakehook")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Branch subcommands.
#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// Create a branch and print its head commit
    Create {
        /// Repository name
        repo: String,

        /// Name of the new branch
        name: String,

        /// Ref to branch from
        #[arg(long, default_value = DEFAULT_SOURCE_BRANCH)]
        source: String,
    },

    /// Delete a branch
    Delete {
        /// Repository name
        repo: String,

        /// Branch to delete
        name: String,
    },

    /// Print a branch's head commit id
    Head {
        /// Repository name
        repo: String,

        /// Branch name
        branch: String,
    },
}

/// What to wait for.
#[derive(Subcommand, Debug)]
pub enum WaitTarget {
    /// Wait until a branch head moves
    Commit {
        /// Repository name
        repo: String,

        /// Branch to watch
        branch: String,

        /// Commit to compare against (default: head at first poll)
        #[arg(long, value_name = "COMMIT")]
        previous: Option<String>,

        /// Keep waiting while the branch does not exist yet
        #[arg(long)]
        allow_missing: bool,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait until an object exists
    File {
        /// Repository name
        repo: String,

        /// Branch, tag or commit id
        reference: String,

        /// Object path in the repository
        path: String,

        #[command(flatten)]
        poll: PollArgs,
    },
}

/// Polling overrides for `wait`.
#[derive(Args, Debug, Default)]
pub struct PollArgs {
    /// Seconds between polls (default from config, else 60)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Give up after this many seconds (default from config, else 7 days)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Commit metadata given as repeated `--meta key=value`.
#[derive(Args, Debug, Default)]
pub struct MetadataArgs {
    /// Metadata entry, may be repeated
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub entries: Vec<(String, String)>,
}

impl MetadataArgs {
    pub fn to_metadata(&self) -> Metadata {
        self.entries.iter().cloned().collect()
    }
}

/// Orchestrator run to record in commit metadata.
#[derive(Args, Debug, Default)]
pub struct ProvenanceArgs {
    /// Workflow (DAG) id of the producing run
    #[arg(long, requires = "run_id")]
    pub dag_id: Option<String>,

    /// Run id of the producing run
    #[arg(long, requires = "dag_id")]
    pub run_id: Option<String>,

    /// Orchestrator name used in the metadata key prefix
    #[arg(long, default_value = DEFAULT_ORCHESTRATOR)]
    pub orchestrator: String,

    /// Orchestrator web server URL, for links back to the run
    #[arg(long, value_name = "URL")]
    pub orchestrator_url: Option<String>,
}

impl ProvenanceArgs {
    /// The run context, if a run was named.
    pub fn run_context(&self) -> Option<RunContext> {
        let (dag_id, run_id) = (self.dag_id.as_ref()?, self.run_id.as_ref()?);
        let ctx = RunContext::new(self.orchestrator.clone(), dag_id.clone(), run_id.clone());
        Some(match &self.orchestrator_url {
            Some(url) => ctx.with_endpoint_url(url.clone()),
            None => ctx,
        })
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Shell type for completions.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_connection_id() {
        let cli = Cli::try_parse_from(["lakehook", "test-connection"]).unwrap();
        assert_eq!(cli.conn_id, DEFAULT_CONNECTION_ID);
        assert!(matches!(cli.command, Command::TestConnection));
    }

    #[test]
    fn commit_metadata_entries() {
        let cli = Cli::try_parse_from([
            "lakehook", "commit", "lake", "etl", "-m", "load", "--meta", "a=1", "--meta", "b=x=y",
        ])
        .unwrap();
        let Command::Commit { metadata, .. } = cli.command else {
            panic!("expected commit");
        };
        let metadata = metadata.to_metadata();
        assert_eq!(metadata["a"], "1");
        assert_eq!(metadata["b"], "x=y");
    }

    #[test]
    fn malformed_metadata_rejected() {
        let result =
            Cli::try_parse_from(["lakehook", "commit", "lake", "etl", "-m", "x", "--meta", "=v"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_id_requires_dag_id() {
        let result =
            Cli::try_parse_from(["lakehook", "commit", "lake", "etl", "-m", "x", "--run-id", "r"]);
        assert!(result.is_err());
    }

    #[test]
    fn provenance_builds_run_context() {
        let args = ProvenanceArgs {
            dag_id: Some("daily".into()),
            run_id: Some("r1".into()),
            orchestrator: "Airflow".into(),
            orchestrator_url: None,
        };
        let ctx = args.run_context().unwrap();
        assert_eq!(ctx.dag_id, "daily");
        assert!(ProvenanceArgs::default().run_context().is_none());
    }

    #[test]
    fn branch_create_defaults_to_main() {
        let cli = Cli::try_parse_from(["lakehook", "branch", "create", "lake", "etl"]).unwrap();
        let Command::Branch {
            action: BranchAction::Create { source, .. },
        } = cli.command
        else {
            panic!("expected branch create");
        };
        assert_eq!(source, "main");
    }
}
