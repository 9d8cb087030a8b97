//! Core bracket entities: participants, slots, matches and rounds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Match identifier, unique within one bracket.
pub type MatchId = u32;

/// Identifier of a registered participant, supplied by the registration
/// system. Surrounding whitespace is trimmed, decoding included.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// A registered entrant. Immutable once a bracket is generated from it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Seed rank, lower is stronger
    #[serde(default)]
    pub seed: Option<u32>,
}

impl Participant {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: name.to_string(),
            seed: None,
        }
    }

    /// Attach a seed rank
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// What currently sits in a match slot.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Occupant {
    /// Waiting on the result of a predecessor match
    #[default]
    Tbd,
    /// Synthetic marker for "no opponent"
    Bye,
    Participant(ParticipantId),
}

impl Occupant {
    pub fn is_bound(&self) -> bool {
        !matches!(self, Occupant::Tbd)
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Occupant::Bye)
    }

    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Occupant::Participant(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occupant::Tbd => write!(f, "TBD"),
            Occupant::Bye => write!(f, "BYE"),
            Occupant::Participant(id) => write!(f, "{id}"),
        }
    }
}

/// One side of a match.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Slot {
    pub occupant: Occupant,
    /// Only meaningful once the match is reported
    pub score: i64,
}

impl Slot {
    pub fn participant(id: ParticipantId) -> Self {
        Self {
            occupant: Occupant::Participant(id),
            score: 0,
        }
    }

    pub fn bye() -> Self {
        Self {
            occupant: Occupant::Bye,
            score: 0,
        }
    }

    pub fn participant_id(&self) -> Option<&ParticipantId> {
        self.occupant.participant()
    }

    pub fn is_bye(&self) -> bool {
        self.occupant.is_bye()
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            MatchState::Scheduled => "SCHEDULED",
            MatchState::InProgress => "IN_PROGRESS",
            MatchState::Completed => "COMPLETED",
        };
        write!(f, "{repr}")
    }
}

/// Part of the bracket a round belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// The only section of single elimination, round robin and Swiss
    Main,
    Winners,
    Losers,
    GrandFinal,
}

impl Section {
    /// Position in the flow of a double elimination bracket. Results only
    /// ever move to the same or a later stage.
    pub(crate) fn stage(self) -> u8 {
        match self {
            Section::Main | Section::Winners => 0,
            Section::Losers => 1,
            Section::GrandFinal => 2,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Section::Main => "main",
            Section::Winners => "winners",
            Section::Losers => "losers",
            Section::GrandFinal => "grand final",
        };
        write!(f, "{repr}")
    }
}

/// Forward reference into a slot of another match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SlotRef {
    pub match_id: MatchId,
    pub slot: usize,
}

impl SlotRef {
    pub fn new(match_id: MatchId, slot: usize) -> Self {
        Self { match_id, slot }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    /// 1-indexed within the section
    pub round: u32,
    pub section: Section,
    pub slots: [Slot; 2],
    pub state: MatchState,
    /// Where the winner advances to, `None` for the deciding match
    pub next_match: Option<SlotRef>,
    /// Where the loser drops to (double elimination only)
    pub loser_next_match: Option<SlotRef>,
}

impl Match {
    pub fn new(id: MatchId, section: Section, round: u32) -> Self {
        Self {
            id,
            round,
            section,
            slots: [Slot::default(), Slot::default()],
            state: MatchState::Scheduled,
            next_match: None,
            loser_next_match: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == MatchState::Completed
    }

    /// Whether either slot holds a bye marker
    pub fn is_bye_match(&self) -> bool {
        self.slots.iter().any(Slot::is_bye)
    }

    /// Both slots are bound to real participants
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| slot.participant_id().is_some())
    }

    /// Slot index of the winner once completed. A match between two byes has
    /// no winner.
    pub fn winner_slot(&self) -> Option<usize> {
        if !self.is_completed() {
            return None;
        }
        match (&self.slots[0].occupant, &self.slots[1].occupant) {
            (Occupant::Participant(_), Occupant::Participant(_)) => {
                if self.slots[0].score > self.slots[1].score {
                    Some(0)
                } else {
                    Some(1)
                }
            }
            (Occupant::Participant(_), _) => Some(0),
            (_, Occupant::Participant(_)) => Some(1),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<&ParticipantId> {
        self.winner_slot()
            .and_then(|idx| self.slots[idx].participant_id())
    }

    /// Loser of a played match. Bye matches have no loser.
    pub fn loser(&self) -> Option<&ParticipantId> {
        self.winner_slot()
            .and_then(|idx| self.slots[1 - idx].participant_id())
    }

    /// Occupants to hand to the winner and loser destinations of a completed
    /// match. Byes travel forward as byes.
    pub(crate) fn outcome(&self) -> Option<(Occupant, Occupant)> {
        if !self.is_completed() {
            return None;
        }
        Some(match self.winner_slot() {
            Some(idx) => (
                self.slots[idx].occupant.clone(),
                self.slots[1 - idx].occupant.clone(),
            ),
            None => (Occupant::Bye, Occupant::Bye),
        })
    }

    pub fn involves(&self, participant: &ParticipantId) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.participant_id() == Some(participant))
    }

    pub fn opponent_of(&self, participant: &ParticipantId) -> Option<&ParticipantId> {
        match (self.slots[0].participant_id(), self.slots[1].participant_id()) {
            (Some(a), Some(b)) if a == participant => Some(b),
            (Some(a), Some(b)) if b == participant => Some(a),
            _ => None,
        }
    }

    /// Whether this match may hand a result to `target`: same section with
    /// a strictly later round, or a later section of the double elimination
    /// flow.
    pub(crate) fn feeds(&self, target: &Match) -> bool {
        if self.section == target.section {
            return target.round > self.round;
        }
        self.section != Section::Main
            && target.section != Section::Main
            && self.section.stage() < target.section.stage()
    }
}

/// Round progress, derived from its matches
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RoundStatus {
    Pending,
    InProgress,
    Completed,
}

/// Matches sharing one round number within one section.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Round {
    pub section: Section,
    pub number: u32,
    pub matches: Vec<MatchId>,
    /// Participants sitting this round out (round robin)
    pub byes: Vec<ParticipantId>,
}

impl Round {
    pub fn new(section: Section, number: u32) -> Self {
        Self {
            section,
            number,
            matches: Vec::new(),
            byes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(a: &str, b: &str, scores: [i64; 2]) -> Match {
        let mut m = Match::new(1, Section::Main, 1);
        m.slots = [
            Slot::participant(ParticipantId::new(a)),
            Slot::participant(ParticipantId::new(b)),
        ];
        m.slots[0].score = scores[0];
        m.slots[1].score = scores[1];
        m.state = MatchState::Completed;
        m
    }

    #[test]
    fn test_participant_id_trims_whitespace() {
        assert_eq!(ParticipantId::new("  alice "), ParticipantId::new("alice"));
    }

    #[test]
    fn test_decoded_ids_are_trimmed() {
        let roster: Vec<Participant> =
            serde_json::from_str(r#"[{"id": " a", "name": "A"}, {"id": "a", "name": "B"}]"#)
                .unwrap();
        assert_eq!(roster[0].id, roster[1].id);
        assert_eq!(roster[0].id.as_str(), "a");
        assert_eq!(
            crate::pairing::seeding::validate_roster(&roster),
            Err(crate::errors::BracketError::DuplicateParticipant(
                ParticipantId::new("a")
            ))
        );
    }

    #[test]
    fn test_winner_is_higher_score() {
        let m = played("a", "b", [1, 3]);
        assert_eq!(m.winner_slot(), Some(1));
        assert_eq!(m.winner(), Some(&ParticipantId::new("b")));
        assert_eq!(m.loser(), Some(&ParticipantId::new("a")));
    }

    #[test]
    fn test_no_winner_until_completed() {
        let mut m = played("a", "b", [1, 3]);
        m.state = MatchState::InProgress;
        assert_eq!(m.winner(), None);
        assert_eq!(m.outcome(), None);
    }

    #[test]
    fn test_bye_outcome() {
        let mut m = Match::new(1, Section::Main, 1);
        m.slots = [Slot::bye(), Slot::participant(ParticipantId::new("a"))];
        m.state = MatchState::Completed;
        assert!(m.is_bye_match());
        assert_eq!(m.winner(), Some(&ParticipantId::new("a")));
        assert_eq!(m.loser(), None);
        assert_eq!(
            m.outcome(),
            Some((Occupant::Participant(ParticipantId::new("a")), Occupant::Bye))
        );

        m.slots[1] = Slot::bye();
        assert_eq!(m.winner_slot(), None);
        assert_eq!(m.outcome(), Some((Occupant::Bye, Occupant::Bye)));
    }

    #[test]
    fn test_opponent_of() {
        let m = played("a", "b", [1, 0]);
        assert_eq!(
            m.opponent_of(&ParticipantId::new("a")),
            Some(&ParticipantId::new("b"))
        );
        assert_eq!(m.opponent_of(&ParticipantId::new("c")), None);
    }

    #[test]
    fn test_feeds_respects_round_and_section_order() {
        let w1 = Match::new(1, Section::Winners, 1);
        let w2 = Match::new(2, Section::Winners, 2);
        let l1 = Match::new(3, Section::Losers, 1);
        let gf = Match::new(4, Section::GrandFinal, 1);
        let main = Match::new(5, Section::Main, 2);

        assert!(w1.feeds(&w2));
        assert!(!w2.feeds(&w1));
        assert!(w1.feeds(&l1));
        assert!(!l1.feeds(&w2));
        assert!(l1.feeds(&gf));
        assert!(!gf.feeds(&l1));
        assert!(!w1.feeds(&main));
    }
}
