//! Console report lines

use colored::Colorize;
use spat_core::{CheckReport, Error, InstallOutcome, UpgradeOutcome, UpgradeReport};
use std::io::Write;

pub fn heading(text: &str) {
    println!("{}", text.cyan().bold());
}

/// Start a step whose result is printed on the same line
pub fn step(text: &str) {
    print!("{:<40}", text);
    let _ = std::io::stdout().flush();
}

pub fn step_done(detail: &str) {
    println!("{} ({})", "DONE".green(), detail);
}

pub fn step_failed() {
    println!("{}", "FAILED".red());
}

pub fn fatal(error: &Error) {
    eprintln!("{} {}: {}", "Error:".red().bold(), error.kind(), error);
}

pub fn hint(text: &str) {
    eprintln!("  {}", text.dimmed());
}

pub fn installed(outcome: &InstallOutcome) {
    let binary = outcome
        .binary_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!(
        "{} {} {} as binary '{}'",
        "Installed".green(),
        outcome.tool_id,
        outcome.version,
        binary
    );
}

pub fn check_line(report: &CheckReport) {
    let tool = format!("{} ({})", report.tool_id, report.provider);
    match &report.result {
        Ok(release) => {
            let installed = match &report.installed {
                Some(version) if version == &release.version => "up to date".green().to_string(),
                Some(version) => format!("installed {}", version).yellow().to_string(),
                None => "not installed".dimmed().to_string(),
            };
            println!(
                "{:<14}{:>4} assets   {:<32}{}",
                release.version, release.artifacts.len(), tool, installed
            );
        }
        Err(e) => {
            println!(
                "{:<14}{:>4}          {:<32}{}",
                "?".red(),
                "-",
                tool,
                format!("{} error: {}", e.kind(), e).red()
            );
        }
    }
}

pub fn upgrade_line(report: &UpgradeReport) {
    match &report.outcome {
        UpgradeOutcome::UpToDate { version } => {
            println!("  {} {} {}", "✓".green(), report.tool_id, version.dimmed());
        }
        UpgradeOutcome::Installed { previous, outcome } => {
            let from = previous.as_deref().unwrap_or("none");
            println!(
                "  {} {} {} -> {}",
                "↑".blue(),
                report.tool_id,
                from.dimmed(),
                outcome.version.green()
            );
        }
        UpgradeOutcome::Failed(e) => {
            println!(
                "  {} {} {}",
                "✗".red(),
                report.tool_id,
                format!("{} error: {}", e.kind(), e).red()
            );
        }
    }
}
