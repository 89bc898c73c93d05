//! cli::commands::wait
//!
//! Block on a sensor until its condition holds.
//!
//! Exits with an error on timeout, so `lakehook wait ... && next-step`
//! chains only when the condition was met.

use std::time::Duration;

use anyhow::Result;

use crate::cli::args::PollArgs;
use crate::cli::Context;
use crate::sensors::{wait_for, CommitSensor, FileSensor, PollPolicy, Sensor};
use crate::ui::output;

/// Config policy with command-line overrides applied.
fn policy(ctx: &Context, poll: &PollArgs) -> PollPolicy {
    let mut policy = ctx.config.poll_policy();
    if let Some(secs) = poll.interval {
        policy.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.timeout {
        policy.timeout = Duration::from_secs(secs);
    }
    policy
}

async fn run(ctx: &Context, sensor: &mut dyn Sensor, poll: &PollArgs) -> Result<()> {
    wait_for(sensor, &policy(ctx, poll)).await?;
    output::print(format!("Done waiting for {}", sensor.describe()), ctx.verbosity);
    Ok(())
}

/// Wait for the head of `branch` to move.
pub async fn wait_commit(
    ctx: &Context,
    repo: &str,
    branch: &str,
    previous: Option<&str>,
    allow_missing: bool,
    poll: &PollArgs,
) -> Result<()> {
    let client = ctx.client()?;
    let mut sensor = CommitSensor::new(&client, repo, branch);
    if allow_missing {
        sensor = sensor.allow_missing_branch();
    }
    if let Some(previous) = previous {
        sensor = sensor.with_previous_commit(previous);
    }
    run(ctx, &mut sensor, poll).await
}

/// Wait for an object to exist at `path`.
pub async fn wait_file(
    ctx: &Context,
    repo: &str,
    reference: &str,
    path: &str,
    poll: &PollArgs,
) -> Result<()> {
    let client = ctx.client()?;
    let mut sensor = FileSensor::new(&client, repo, reference, path);
    run(ctx, &mut sensor, poll).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::ui::output::Verbosity;

    #[test]
    fn flags_override_config_policy() {
        let ctx = Context {
            conn_id: "x".into(),
            config: Config::default(),
            verbosity: Verbosity::Quiet,
        };
        let poll = PollArgs {
            interval: Some(3),
            timeout: None,
        };
        let policy = policy(&ctx, &poll);
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.timeout, PollPolicy::default().timeout);
    }
}
