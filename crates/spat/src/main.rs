//! spat - SD Prod Access Tools Manager

mod output;

use clap::{Parser, Subcommand};
use spat_core::{
    CheckReport, Error, Orchestrator, Settings, ToolRegistry, UpgradeOutcome, UpgradeReport,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `spat_core=debug`)
const LOG_ENV: &str = "SPAT_LOG";

#[derive(Parser, Debug)]
#[command(name = "spat")]
#[command(about = "SD Prod Access Tools Manager")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize spat and install prod access tools
    Init,
    /// Check local and upstream versions of all managed tools
    Check,
    /// Upgrade (chosen) managed tools to their latest versions
    Upgrade(UpgradeArgs),
}

#[derive(Parser, Debug)]
pub struct UpgradeArgs {
    /// Tools to upgrade (default: all managed tools)
    #[arg(value_name = "TOOL")]
    pub tools: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            output::fatal(&e);
            return ExitCode::from(e.exit_code());
        }
    };
    tracing::debug!(
        home = %settings.home.display(),
        github_api = %settings.github_api_url,
        platform = %settings.platform,
        "resolved settings"
    );
    let orchestrator = Orchestrator::new(settings, ToolRegistry::builtin());

    let code = match args.command {
        Command::Init => run_init(&orchestrator).await,
        Command::Check => run_check(&orchestrator).await,
        Command::Upgrade(upgrade_args) => run_upgrade(&orchestrator, &upgrade_args.tools).await,
    };

    ExitCode::from(code)
}

async fn run_init(orchestrator: &Orchestrator) -> u8 {
    output::step("Creating directory structure…");
    if let Err(e) = orchestrator.settings().ensure_layout() {
        output::step_failed();
        output::fatal(&e);
        return e.exit_code();
    }
    output::step_done(&format!(
        "in `{}`",
        orchestrator.settings().home.display()
    ));

    match orchestrator.bootstrap().await {
        Ok(outcomes) => {
            for outcome in &outcomes {
                output::installed(outcome);
            }
            0
        }
        Err(e) => {
            output::fatal(&e);
            e.exit_code()
        }
    }
}

async fn run_check(orchestrator: &Orchestrator) -> u8 {
    output::heading("Latest versions:");

    let reports = orchestrator.check().await;
    for report in &reports {
        output::check_line(report);
    }

    check_exit_code(&reports)
}

async fn run_upgrade(orchestrator: &Orchestrator, tools: &[String]) -> u8 {
    output::heading("Upgrading tools…");

    let reports = match orchestrator.upgrade(tools).await {
        Ok(reports) => reports,
        Err(e) => {
            output::fatal(&e);
            if matches!(e, Error::UnknownTool(_)) {
                output::hint(&format!(
                    "managed tools: {}",
                    orchestrator.registry().ids().join(", ")
                ));
            }
            return e.exit_code();
        }
    };

    for report in &reports {
        output::upgrade_line(report);
    }

    upgrade_exit_code(&reports)
}

/// Exit code of the first failed lookup, 0 when every lookup succeeded
fn check_exit_code(reports: &[CheckReport]) -> u8 {
    reports
        .iter()
        .find_map(|r| r.result.as_ref().err())
        .map_or(0, Error::exit_code)
}

/// Exit code of the first failed upgrade, 0 when none failed
fn upgrade_exit_code(reports: &[UpgradeReport]) -> u8 {
    reports
        .iter()
        .find_map(|r| match &r.outcome {
            UpgradeOutcome::Failed(e) => Some(e.exit_code()),
            _ => None,
        })
        .unwrap_or(0)
}
