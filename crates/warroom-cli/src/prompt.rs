//! Interactive fee schedule prompt

use crate::output::print_error;
use dialoguer::{Confirm, Input};
use warroom_core::{FeeDraft, FeePrompt, FeeSchedule, FeeScheduleError, WarRoomError};

/// Reads the fee schedule from the operator's terminal.
#[derive(Debug, Default)]
pub struct TerminalFeePrompt;

fn input_error(err: dialoguer::Error) -> WarRoomError {
    WarRoomError::Input(err.to_string())
}

fn read_number(prompt: &str) -> Result<f64, WarRoomError> {
    Input::<f64>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(input_error)
}

impl FeePrompt for TerminalFeePrompt {
    fn wants_custom(&mut self, default: &FeeSchedule) -> Result<bool, WarRoomError> {
        Confirm::new()
            .with_prompt(format!(
                "Default fee schedule: {}. Set a custom fee schedule?",
                default
            ))
            .default(false)
            .interact()
            .map_err(input_error)
    }

    fn read_draft(&mut self) -> Result<FeeDraft, WarRoomError> {
        Ok(FeeDraft {
            initial_gwei: read_number("Initial fee (gwei)")?,
            max_gwei: read_number("Maximum fee (gwei)")?,
            interval_secs: read_number("Escalation interval (seconds)")?,
        })
    }

    fn confirm(&mut self, schedule: &FeeSchedule) -> Result<bool, WarRoomError> {
        Confirm::new()
            .with_prompt(format!("Use {}?", schedule))
            .default(true)
            .interact()
            .map_err(input_error)
    }

    fn rejected(&mut self, _draft: &FeeDraft, reason: &FeeScheduleError) {
        print_error(&format!("{}, try again", reason));
    }
}
