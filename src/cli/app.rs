use super::args::{Cli, Command};
use anyhow::{Context, Result, anyhow};
use fantasy_admin::maintenance::to_json;
use fantasy_admin::{BatchOptions, Session, run_budget_migration, run_cleanup};
use serde::Serialize;
use std::fmt::Display;

/// How a run that did not hit a fatal error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Complete,
    /// Some records failed; the summary names them.
    PartialFailure,
}

pub async fn run(cli: Cli) -> Result<RunOutcome> {
    let config = cli
        .store
        .to_config()
        .map_err(|e| anyhow!(e))
        .context("invalid store configuration")?;

    let mut session = Session::open(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.redacted_url()))?;
    if cli.dry_run {
        session = session.into_dry_run();
    }

    let options = BatchOptions::default().concurrency(cli.concurrency);
    let client = session.client();

    let (report, has_failures) = match cli.command {
        Command::Cleanup => {
            let summary = run_cleanup(client.as_ref(), &options)
                .await
                .context("cleanup aborted")?;
            (render(&summary, cli.json, &session)?, summary.has_failures())
        }
        Command::MigrateBudgets { target } => {
            let summary = run_budget_migration(client.as_ref(), target, &options)
                .await
                .context("budget migration aborted")?;
            (render(&summary, cli.json, &session)?, summary.has_failures())
        }
    };

    if session.is_dry_run() && !cli.json {
        println!(
            "[dry run] {} write(s) were not sent to {}",
            session.planned_writes().len(),
            session.endpoint()
        );
    }
    print!("{report}");

    Ok(if has_failures {
        RunOutcome::PartialFailure
    } else {
        RunOutcome::Complete
    })
}

fn render<T: Serialize + Display>(summary: &T, json: bool, session: &Session) -> Result<String> {
    if json {
        let planned = session
            .is_dry_run()
            .then(|| session.planned_writes().len());
        Ok(format!("{}\n", to_json(summary, planned)?))
    } else {
        Ok(summary.to_string())
    }
}
