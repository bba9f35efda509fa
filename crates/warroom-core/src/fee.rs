//! Escalating fee schedule for pause transactions.
//!
//! The schedule is chosen once per run, before any pause transaction, and is
//! handed to the pause gate when it is connected. Nothing mutates it afterwards.

use crate::error::WarRoomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Multiplier applied once per elapsed interval while a transaction is pending.
pub const ESCALATION_FACTOR: f64 = 1.125;

/// Reasons a custom schedule is rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeeScheduleError {
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("initial fee {initial} gwei exceeds max fee {max} gwei")]
    InitialAboveMax { initial: f64, max: f64 },

    #[error("interval of {0} seconds is out of range")]
    IntervalOutOfRange(f64),
}

/// Exponential fee escalation from `initial` to `max` gwei, stepping every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    initial_gwei: f64,
    max_gwei: f64,
    interval: Duration,
}

impl FeeSchedule {
    /// Validate operator-supplied parameters.
    pub fn validate(
        initial_gwei: f64,
        max_gwei: f64,
        interval_secs: f64,
    ) -> Result<Self, FeeScheduleError> {
        ensure_positive("initial fee", initial_gwei)?;
        ensure_positive("max fee", max_gwei)?;
        ensure_positive("interval", interval_secs)?;
        if initial_gwei > max_gwei {
            return Err(FeeScheduleError::InitialAboveMax {
                initial: initial_gwei,
                max: max_gwei,
            });
        }
        let interval = Duration::try_from_secs_f64(interval_secs)
            .map_err(|_| FeeScheduleError::IntervalOutOfRange(interval_secs))?;
        Ok(Self {
            initial_gwei,
            max_gwei,
            interval,
        })
    }

    pub fn initial_gwei(&self) -> f64 {
        self.initial_gwei
    }

    pub fn max_gwei(&self) -> f64 {
        self.max_gwei
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fee bid for a transaction that has been pending for `elapsed`.
    ///
    /// Non-decreasing in `elapsed` and never above `max_gwei`.
    pub fn fee_at(&self, elapsed: Duration) -> f64 {
        let steps = (elapsed.as_secs_f64() / self.interval.as_secs_f64()).floor();
        let steps = steps.min(i32::MAX as f64) as i32;
        let fee = self.initial_gwei * ESCALATION_FACTOR.powi(steps);
        if fee.is_finite() {
            fee.min(self.max_gwei)
        } else {
            self.max_gwei
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            initial_gwei: 100.0,
            max_gwei: 200.0,
            interval: Duration::from_secs(30),
        }
    }
}

impl fmt::Display for FeeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exponential from {} gwei to {} gwei every {}s",
            self.initial_gwei,
            self.max_gwei,
            self.interval.as_secs_f64()
        )
    }
}

fn ensure_positive(field: &'static str, value: f64) -> Result<(), FeeScheduleError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FeeScheduleError::NotPositive { field, value })
    }
}

/// Raw custom parameters as entered by the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeDraft {
    pub initial_gwei: f64,
    pub max_gwei: f64,
    pub interval_secs: f64,
}

/// Operator-side input for the fee schedule.
pub trait FeePrompt {
    /// Ask whether to replace the default schedule.
    fn wants_custom(&mut self, default: &FeeSchedule) -> Result<bool, WarRoomError>;

    /// Read the three custom parameters.
    fn read_draft(&mut self) -> Result<FeeDraft, WarRoomError>;

    /// Ask the operator to confirm a valid schedule.
    fn confirm(&mut self, schedule: &FeeSchedule) -> Result<bool, WarRoomError>;

    /// Tell the operator why a draft was rejected.
    fn rejected(&mut self, draft: &FeeDraft, reason: &FeeScheduleError);
}

/// Drives a [`FeePrompt`] until a schedule is confirmed.
#[derive(Debug, Clone)]
pub struct FeeConfigurator {
    default: FeeSchedule,
}

impl FeeConfigurator {
    pub fn new(default: FeeSchedule) -> Self {
        Self { default }
    }

    pub fn default_schedule(&self) -> FeeSchedule {
        self.default
    }

    /// Run the prompt loop. Invalid or unconfirmed drafts are asked again;
    /// there is no fallback to the default once custom input was chosen.
    pub fn configure(&self, prompt: &mut dyn FeePrompt) -> Result<FeeSchedule, WarRoomError> {
        if !prompt.wants_custom(&self.default)? {
            info!(schedule = %self.default, "Using default fee schedule");
            return Ok(self.default);
        }

        loop {
            let draft = prompt.read_draft()?;
            match FeeSchedule::validate(draft.initial_gwei, draft.max_gwei, draft.interval_secs) {
                Ok(schedule) => {
                    if prompt.confirm(&schedule)? {
                        info!(schedule = %schedule, "Using custom fee schedule");
                        return Ok(schedule);
                    }
                }
                Err(reason) => {
                    warn!(error = %reason, "Rejected fee schedule");
                    prompt.rejected(&draft, &reason);
                }
            }
        }
    }
}

impl Default for FeeConfigurator {
    fn default() -> Self {
        Self::new(FeeSchedule::default())
    }
}
