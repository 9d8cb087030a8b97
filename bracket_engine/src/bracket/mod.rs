//! Bracket structure, result processing and snapshots.
//!
//! - [`entities`]: participants, slots, matches and rounds
//! - [`structure`]: the [`Bracket`] aggregate and its queries
//! - [`processor`]: reporting results and propagating winners/losers
//! - [`snapshot`]: JSON and binary encodings for persistence

pub mod entities;
pub mod processor;
pub mod snapshot;
pub mod structure;

pub use entities::{
    Match, MatchId, MatchState, Occupant, Participant, ParticipantId, Round, RoundStatus,
    Section, Slot, SlotRef,
};
pub use processor::MatchUpdate;
pub use structure::{Bracket, SwissState};
