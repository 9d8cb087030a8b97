//! Error types for bracket generation and result processing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bracket::entities::{MatchId, ParticipantId};

/// Errors that can occur while generating or mutating a bracket.
///
/// Everything except [`BracketError::CyclicOrInconsistentBracket`] is a user
/// input error: the bracket is left untouched and the call can be retried
/// with corrected input.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum BracketError {
    #[error("need 2+ participants, got {0}")]
    InvalidRosterSize(usize),
    #[error("unknown format: {0}")]
    UnknownFormat(String),
    #[error("invalid seeding: {0}")]
    InvalidSeeding(String),
    #[error("participant {0} appears more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("match {0} is already completed")]
    MatchAlreadyCompleted(MatchId),
    #[error("match {0} is not ready: both slots need a participant")]
    MatchNotReady(MatchId),
    #[error("invalid score {scores:?} for match {match_id}: {reason}")]
    InvalidScore {
        match_id: MatchId,
        scores: [i64; 2],
        reason: String,
    },
    #[error("{operation} is not supported by {format} brackets")]
    UnsupportedOperation { format: String, operation: String },
    #[error("round {round} still has unfinished matches")]
    RoundIncomplete { round: u32 },
    #[error("all {total} rounds have already been paired")]
    RoundsExhausted { total: u32 },
    #[error("no pairing without a rematch exists for round {round}")]
    NoValidPairing { round: u32 },
    #[error("corrupted bracket: {0}")]
    CyclicOrInconsistentBracket(String),
}

impl BracketError {
    /// Whether the caller may retry with corrected input.
    ///
    /// An inconsistent bracket must be regenerated instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BracketError::CyclicOrInconsistentBracket(_))
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;

/// Errors from encoding or decoding bracket snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Failed to encode a snapshot
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Failed to decode a snapshot
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot decoded but the bracket inside is malformed
    #[error("Invalid snapshot: {0}")]
    Invalid(#[from] BracketError),
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
