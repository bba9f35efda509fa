//! Run reporting surface.

use crate::discovery::{DiscoveryIssue, DiscoveryResult};
use crate::fee::FeeSchedule;
use crate::outcome::PauseOutcome;
use crate::plan::ExecutionPhase;
use crate::types::{Caller, SchemaVersion, VaultStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Receives progress of a run as it happens. All hooks default to no-ops.
pub trait Reporter: Send {
    fn listing_fetched(&mut self, _schema: SchemaVersion, _status: VaultStatus, _count: usize) {}

    fn discovery_issue(&mut self, _issue: &DiscoveryIssue) {}

    fn discovery_finished(&mut self, _result: &DiscoveryResult) {}

    fn phase_started(&mut self, _phase: ExecutionPhase, _targets: usize) {}

    fn outcome(&mut self, _outcome: &PauseOutcome) {}

    fn finished(&mut self, _report: &RunReport) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Event captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Listing(SchemaVersion, VaultStatus, usize),
    Issue(String),
    DiscoveryFinished,
    Phase(ExecutionPhase, usize),
    Outcome(String, bool),
    Finished,
}

/// Keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl Reporter for RecordingReporter {
    fn listing_fetched(&mut self, schema: SchemaVersion, status: VaultStatus, count: usize) {
        self.events.push(ReportEvent::Listing(schema, status, count));
    }

    fn discovery_issue(&mut self, issue: &DiscoveryIssue) {
        self.events.push(ReportEvent::Issue(issue.reason.clone()));
    }

    fn discovery_finished(&mut self, _result: &DiscoveryResult) {
        self.events.push(ReportEvent::DiscoveryFinished);
    }

    fn phase_started(&mut self, phase: ExecutionPhase, targets: usize) {
        self.events.push(ReportEvent::Phase(phase, targets));
    }

    fn outcome(&mut self, outcome: &PauseOutcome) {
        self.events
            .push(ReportEvent::Outcome(outcome.label.clone(), outcome.succeeded));
    }

    fn finished(&mut self, _report: &RunReport) {
        self.events.push(ReportEvent::Finished);
    }
}

/// Final status of a run that passed preflight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunStatus {
    /// Every attempt succeeded.
    Completed,
    /// Every target was attempted, some failed.
    CompletedWithFailures { failed: usize },
    /// Execution stopped early under the gate-failure policy.
    Halted { reason: String },
}

/// Everything a run produced, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub caller: Caller,
    pub fees: FeeSchedule,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub issues: Vec<DiscoveryIssue>,
    pub outcomes: Vec<PauseOutcome>,
    pub status: RunStatus,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &PauseOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded)
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Status implied by the outcomes when execution was not halted.
    pub fn status_for(outcomes: &[PauseOutcome]) -> RunStatus {
        let failed = outcomes.iter().filter(|outcome| !outcome.succeeded).count();
        if failed == 0 {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithFailures { failed }
        }
    }
}
