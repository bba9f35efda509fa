//! CLI error types

use thiserror::Error;
use warroom_adapters::SnapshotError;
use warroom_core::WarRoomError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    WarRoom(#[from] WarRoomError),

    #[error("Ledger snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
