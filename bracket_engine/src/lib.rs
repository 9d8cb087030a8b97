//! # Bracket Engine
//!
//! Tournament bracket generation, result propagation and standings for four
//! competitive formats: single elimination, double elimination, round robin
//! and Swiss.
//!
//! A [`Bracket`] is created once from a roster by a format-specific pairing
//! strategy (dispatched with `enum_dispatch`) and then only changes through
//! [`Bracket::report_result`], which validates a score, completes the match
//! and pushes the winner (and, in double elimination, the loser) forward.
//! Byes resolve on their own, transitively. Standings are derived from the
//! completed matches on demand.
//!
//! ## Core Modules
//!
//! - [`bracket`]: match graph, result processor and snapshots
//! - [`pairing`]: the four format strategies and seeding
//! - [`standings`]: ranked tables with tie-breaks
//! - [`tournament`]: Tokio actor serializing mutations per tournament
//!
//! ## Example
//!
//! ```
//! use bracket_engine::{Format, FormatOptions, Participant, generate};
//!
//! let roster: Vec<_> = ["A", "B", "C", "D"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, id)| Participant::new(id, id).with_seed(i as u32 + 1))
//!     .collect();
//! let mut bracket = generate(&roster, Format::SingleElimination, &FormatOptions::seeded())?;
//!
//! bracket.report_result(1, [2, 1])?; // A beats D
//! bracket.report_result(2, [0, 3])?; // C beats B
//! let update = bracket.report_result(3, [1, 2])?;
//! assert_eq!(update.champion.as_ref().map(|c| c.as_str()), Some("C"));
//! assert_eq!(bracket.standings()[0].participant.as_str(), "C");
//! # Ok::<(), bracket_engine::BracketError>(())
//! ```

/// Bracket aggregate, entities, result processing and snapshots.
pub mod bracket;
pub use bracket::{
    Bracket, Match, MatchId, MatchState, MatchUpdate, Occupant, Participant, ParticipantId,
    Round, RoundStatus, Section, Slot, SlotRef,
};

/// Format options and scoring.
pub mod config;
pub use config::{FormatOptions, StandingsConfig, TournamentConfig};

pub mod errors;
pub use errors::{BracketError, BracketResult, SnapshotError, SnapshotResult};

/// Pairing strategies per format.
pub mod pairing;
pub use pairing::{Format, PairingStrategy, generate, generate_from_tag, generate_with_scoring};

pub mod standings;
pub use standings::{StandingRow, compute_standings};

/// Concurrent per-tournament service.
pub mod tournament;
pub use tournament::{
    BracketNotification, TournamentActor, TournamentError, TournamentHandle, TournamentId,
    TournamentManager, TournamentSummary,
};
