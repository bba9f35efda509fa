//! Terminal output: progress, outcome lines, and the final summary

use crate::error::CliResult;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::{Table, Tabled};
use warroom_core::{
    DiscoveryIssue, DiscoveryResult, ExecutionPhase, ExecutionPlan, PauseOutcome, Reporter,
    RunReport, RunStatus, SchemaVersion, TargetSpec, VaultStatus,
};

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

fn bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.red/white} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Live run progress on the terminal.
///
/// Discovery shows a spinner, execution a bar over the planned pauses. In
/// quiet mode nothing is drawn and the caller prints the final report.
pub struct ConsoleReporter {
    quiet: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress: None,
        }
    }

    /// Switch from the discovery spinner to the execution bar.
    pub fn start_execution(&mut self, total: usize) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        self.progress = Some(bar(total as u64));
    }

    fn line(&self, text: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| println!("{}", text)),
            None => println!("{}", text),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn listing_fetched(&mut self, schema: SchemaVersion, status: VaultStatus, count: usize) {
        if self.quiet {
            return;
        }
        let pb = self
            .progress
            .get_or_insert_with(|| spinner("Walking the registry..."));
        pb.set_message(format!("Listed {} {} vaults ({})", count, schema, status));
        pb.tick();
    }

    fn discovery_issue(&mut self, issue: &DiscoveryIssue) {
        if !self.quiet {
            self.line(format!("{} {}", "⚠".yellow(), issue.reason));
        }
    }

    fn discovery_finished(&mut self, result: &DiscoveryResult) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        print_info(&format!(
            "Discovered {} V1 and {} V1.5 vaults, {} strategies, {} vaults to pause directly",
            result.vaults_v1.len(),
            result.vaults_v1_5.len(),
            result.strategies.len(),
            result.non_gated_vaults.len()
        ));
    }

    fn phase_started(&mut self, phase: ExecutionPhase, targets: usize) {
        if self.quiet {
            return;
        }
        self.line(format!(
            "{} {} ({})",
            "==>".bold(),
            phase.title().bold(),
            targets
        ));
        if let Some(pb) = &self.progress {
            pb.set_message(phase.title());
        }
    }

    fn outcome(&mut self, outcome: &PauseOutcome) {
        if self.quiet {
            return;
        }
        let target = outcome
            .address
            .map(|address| format!(" ({})", address.short()))
            .unwrap_or_default();
        let text = if outcome.succeeded {
            format!("  {} {}{}", "✓".green(), outcome.label, target.dimmed())
        } else {
            format!(
                "  {} {}{} - {}",
                "✗".red(),
                outcome.label,
                target.dimmed(),
                outcome.reason.as_deref().unwrap_or("failed").dimmed()
            )
        };
        self.line(text);
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn finished(&mut self, _report: &RunReport) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&PauseOutcome> for OutcomeRow {
    fn from(outcome: &PauseOutcome) -> Self {
        Self {
            phase: outcome.phase.title().to_string(),
            target: outcome.label.clone(),
            address: outcome
                .address
                .map(|address| address.to_string())
                .unwrap_or_else(|| "-".to_string()),
            result: if outcome.succeeded {
                "paused".to_string()
            } else {
                "FAILED".to_string()
            },
        }
    }
}

/// Summary table and the list of targets that still need attention.
pub fn print_report(report: &RunReport) {
    println!();
    if !report.outcomes.is_empty() {
        let rows: Vec<OutcomeRow> = report.outcomes.iter().map(OutcomeRow::from).collect();
        println!("{}", Table::new(rows));
    }

    for issue in &report.issues {
        print_warning(&issue.reason);
    }

    match &report.status {
        RunStatus::Completed => print_success(&format!(
            "All {} pause transactions confirmed",
            report.succeeded_count()
        )),
        RunStatus::CompletedWithFailures { failed } => {
            print_warning(&format!(
                "{} of {} pauses failed, handle these manually:",
                failed,
                report.outcomes.len()
            ));
            for outcome in report.failed() {
                println!(
                    "  {} {}",
                    "✗".red(),
                    outcome.reason.as_deref().unwrap_or(&outcome.label)
                );
            }
        }
        RunStatus::Halted { reason } => {
            print_error(&format!("Run halted: {}", reason));
        }
    }
}

/// Ordered targets a dry run would pause.
pub fn print_plan(plan: &ExecutionPlan) {
    println!("{}", "Dry run, nothing will be sent".bold());
    for (index, step) in plan.steps().iter().enumerate() {
        let target = match &step.spec {
            TargetSpec::Known(address) => address.to_string(),
            TargetSpec::Named(name) => format!("resolve '{}'", name),
            TargetSpec::CoreOf(name) => format!("core of '{}'", name),
        };
        println!(
            "{:>3}. [{}] {} {}",
            index + 1,
            step.phase.title(),
            step.label,
            target.dimmed()
        );
    }
    print_info(&format!("{} pause transactions planned", plan.len()));
}
