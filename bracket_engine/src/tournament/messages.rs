//! Tournament actor message types.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    bracket::{Bracket, Match, MatchId, MatchUpdate, ParticipantId},
    errors::{BracketError, BracketResult},
    pairing::Format,
    standings::StandingRow,
};

/// Tournament identifier within a [`TournamentManager`](super::TournamentManager)
pub type TournamentId = i64;

/// Messages that can be sent to a TournamentActor
#[derive(Debug)]
pub enum TournamentMessage {
    /// Report a match result
    ReportResult {
        match_id: MatchId,
        scores: [i64; 2],
        response: oneshot::Sender<BracketResult<MatchUpdate>>,
    },

    /// Mark a match as in progress
    StartMatch {
        match_id: MatchId,
        response: oneshot::Sender<BracketResult<bool>>,
    },

    /// Pair the next Swiss round
    PairNextRound {
        response: oneshot::Sender<BracketResult<Vec<MatchId>>>,
    },

    /// Get a copy of the bracket
    GetBracket { response: oneshot::Sender<Bracket> },

    /// Get the current standings
    GetStandings {
        response: oneshot::Sender<Vec<StandingRow>>,
    },

    /// Get summary information
    GetSummary {
        response: oneshot::Sender<TournamentSummary>,
    },

    /// Subscribe to bracket change notifications
    Subscribe {
        subscriber_id: i64,
        sender: mpsc::Sender<BracketNotification>,
    },

    /// Unsubscribe from bracket change notifications
    Unsubscribe { subscriber_id: i64 },

    /// Stop the actor
    Close { response: oneshot::Sender<()> },
}

/// Notification sent to subscribers after a successful mutation
#[derive(Clone, Debug, Serialize)]
pub enum BracketNotification {
    /// Matches changed; `completed` lists the ones that finished
    MatchesCompleted {
        tournament_id: TournamentId,
        changed: Vec<Match>,
        completed: Vec<MatchId>,
    },
    /// A new Swiss round was paired
    RoundPaired {
        tournament_id: TournamentId,
        round: u32,
        matches: Vec<MatchId>,
    },
    /// Every match has been played
    TournamentComplete {
        tournament_id: TournamentId,
        champion: Option<ParticipantId>,
    },
}

/// Tournament summary for listings
#[derive(Clone, Debug, Serialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub format: Format,
    pub participant_count: usize,
    pub rounds: usize,
    /// Played matches completed so far, byes excluded
    pub completed_matches: usize,
    pub playable_matches: usize,
    pub is_complete: bool,
}

/// Errors from talking to a tournament
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament {0} is closed")]
    Closed(TournamentId),
    #[error(transparent)]
    Bracket(#[from] BracketError),
}

pub type TournamentResult<T> = Result<T, TournamentError>;
