//! The bracket aggregate and its read-only views.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::entities::{
    Match, MatchId, MatchState, Occupant, Participant, ParticipantId, Round, RoundStatus,
    Section, SlotRef,
};
use crate::{
    config::{FormatOptions, StandingsConfig},
    errors::{BracketError, BracketResult},
    pairing::Format,
    standings::StandingRow,
};

/// Running state of a Swiss bracket
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SwissState {
    /// Rounds to play in total
    pub total_rounds: u32,
    /// Standings the latest round was paired from
    pub snapshot: Vec<StandingRow>,
}

/// The full match graph of one tournament.
///
/// Matches live in an id-indexed arena and refer to each other only by id,
/// so the whole aggregate serializes as-is. It is mutated exclusively
/// through [`Bracket::report_result`], [`Bracket::start_match`] and (Swiss)
/// [`Bracket::pair_next_round`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bracket {
    pub(crate) format: Format,
    pub(crate) participants: Vec<Participant>,
    pub(crate) options: FormatOptions,
    pub(crate) scoring: StandingsConfig,
    pub(crate) matches: BTreeMap<MatchId, Match>,
    pub(crate) rounds: Vec<Round>,
    /// Deciding match of an elimination bracket
    pub(crate) final_match: Option<MatchId>,
    /// First grand final of a double elimination bracket
    pub(crate) grand_final: Option<MatchId>,
    pub(crate) swiss: Option<SwissState>,
    pub(crate) next_match_id: MatchId,
}

impl Bracket {
    pub fn format(&self) -> Format {
        self.format
    }

    /// Roster the bracket was generated from, in roster order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn scoring(&self) -> &StandingsConfig {
        &self.scoring
    }

    pub fn get_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(&id)
    }

    /// All matches in id order
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }

    /// Matches that are actually played, i.e. not bye matches
    pub fn playable_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values().filter(|m| !m.is_bye_match())
    }

    /// Lowest-id match that has both participants and no result yet
    pub fn next_playable_match(&self) -> Option<MatchId> {
        self.matches
            .values()
            .find(|m| m.is_ready() && !m.is_completed())
            .map(|m| m.id)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round(&self, section: Section, number: u32) -> Option<&Round> {
        self.rounds
            .iter()
            .find(|r| r.section == section && r.number == number)
    }

    pub fn rounds_in(&self, section: Section) -> impl Iterator<Item = &Round> {
        self.rounds.iter().filter(move |r| r.section == section)
    }

    /// Matches of a round, in bracket order
    pub fn round_matches(&self, round: &Round) -> Vec<&Match> {
        round
            .matches
            .iter()
            .filter_map(|id| self.matches.get(id))
            .collect()
    }

    pub fn round_status(&self, round: &Round) -> RoundStatus {
        let matches = self.round_matches(round);
        if matches.iter().all(|m| m.is_completed()) {
            RoundStatus::Completed
        } else if matches
            .iter()
            .any(|m| m.state != MatchState::Scheduled && !m.is_bye_match())
        {
            RoundStatus::InProgress
        } else {
            RoundStatus::Pending
        }
    }

    /// Display name of a round, e.g. "Semifinal" or "Losers Round 3"
    pub fn round_label(&self, round: &Round) -> String {
        let last = self
            .rounds_in(round.section)
            .map(|r| r.number)
            .max()
            .unwrap_or(round.number);
        let from_end = last.saturating_sub(round.number);

        match round.section {
            Section::Main if self.format == Format::SingleElimination => {
                elimination_label(from_end)
            }
            Section::Main => format!("Round {}", round.number),
            Section::Winners => format!("Winners {}", elimination_label(from_end)),
            Section::Losers if from_end == 0 => "Losers Final".to_string(),
            Section::Losers => format!("Losers Round {}", round.number),
            Section::GrandFinal if round.number == 1 => "Grand Final".to_string(),
            Section::GrandFinal => "Bracket Reset".to_string(),
        }
    }

    /// Deciding match of an elimination bracket. Moves to the reset match if
    /// one gets played.
    pub fn final_match(&self) -> Option<&Match> {
        self.final_match.and_then(|id| self.matches.get(&id))
    }

    /// First grand final of a double elimination bracket
    pub fn grand_final(&self) -> Option<&Match> {
        self.grand_final.and_then(|id| self.matches.get(&id))
    }

    /// Winner of the deciding match, elimination formats only
    pub fn champion(&self) -> Option<&ParticipantId> {
        self.final_match().and_then(Match::winner)
    }

    /// Loser of the deciding match, elimination formats only
    pub fn runner_up(&self) -> Option<&ParticipantId> {
        self.final_match().and_then(Match::loser)
    }

    /// Every match completed and, for Swiss, every round paired
    pub fn is_complete(&self) -> bool {
        let all_played = self.matches.values().all(Match::is_completed);
        match &self.swiss {
            Some(swiss) => all_played && self.rounds.len() as u32 >= swiss.total_rounds,
            None => all_played,
        }
    }

    /// Total Swiss rounds, `None` for other formats
    pub fn swiss_total_rounds(&self) -> Option<u32> {
        self.swiss.as_ref().map(|s| s.total_rounds)
    }

    /// Standings the latest Swiss round was paired from
    pub fn swiss_snapshot(&self) -> Option<&[StandingRow]> {
        self.swiss.as_ref().map(|s| s.snapshot.as_slice())
    }

    /// Ids of the matches a participant was bound into, in round order
    pub fn participant_path(&self, participant: &ParticipantId) -> Vec<MatchId> {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter())
            .filter_map(|id| self.matches.get(id))
            .filter(|m| m.involves(participant))
            .map(|m| m.id)
            .collect()
    }

    /// Check the structural invariants: every reference resolves, every
    /// match sits in exactly one round that agrees with it, every slot has
    /// at most one feeder and every link moves forward (which also rules
    /// out cycles).
    pub fn validate(&self) -> BracketResult<()> {
        let corrupt = |msg: String| Err(BracketError::CyclicOrInconsistentBracket(msg));

        for (id, m) in &self.matches {
            if *id != m.id {
                return corrupt(format!("match stored under {id} claims id {}", m.id));
            }
            if *id >= self.next_match_id {
                return corrupt(format!("match {id} is beyond the id counter"));
            }
        }

        let mut placed = HashSet::with_capacity(self.matches.len());
        for round in &self.rounds {
            for id in &round.matches {
                let Some(m) = self.matches.get(id) else {
                    return corrupt(format!("round lists unknown match {id}"));
                };
                if m.section != round.section || m.round != round.number {
                    return corrupt(format!("match {id} sits in the wrong round"));
                }
                if !placed.insert(*id) {
                    return corrupt(format!("match {id} appears in two rounds"));
                }
            }
        }
        if placed.len() != self.matches.len() {
            return corrupt("some matches belong to no round".to_string());
        }

        let mut feeders: HashMap<SlotRef, MatchId> = HashMap::new();
        for m in self.matches.values() {
            for link in [m.next_match, m.loser_next_match].into_iter().flatten() {
                let Some(target) = self.matches.get(&link.match_id) else {
                    return corrupt(format!("match {} links to unknown match", m.id));
                };
                if link.slot > 1 {
                    return corrupt(format!("match {} links to slot {}", m.id, link.slot));
                }
                if !m.feeds(target) {
                    return corrupt(format!(
                        "match {} links backwards to match {}",
                        m.id, target.id
                    ));
                }
                if let Some(other) = feeders.insert(link, m.id) {
                    return corrupt(format!(
                        "slot {} of match {} is fed by both {} and {}",
                        link.slot, link.match_id, other, m.id
                    ));
                }
            }
        }

        if let Some(id) = self.final_match
            && !self.matches.contains_key(&id)
        {
            return corrupt(format!("final match {id} does not exist"));
        }

        Ok(())
    }
}

fn elimination_label(rounds_from_end: u32) -> String {
    match rounds_from_end {
        0 => "Final".to_string(),
        1 => "Semifinal".to_string(),
        2 => "Quarterfinal".to_string(),
        n => format!("Round of {}", 1u64 << (n + 1).min(63)),
    }
}

/// Incremental construction of a bracket by the pairing strategies.
///
/// Only this crate can create one; strategies receive it from [`generate`].
///
/// [`generate`]: crate::pairing::generate
pub struct BracketBuilder {
    next_id: MatchId,
    matches: BTreeMap<MatchId, Match>,
    rounds: Vec<Round>,
    pub(crate) final_match: Option<MatchId>,
    pub(crate) grand_final: Option<MatchId>,
    pub(crate) swiss_rounds: Option<u32>,
}

impl BracketBuilder {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            matches: BTreeMap::new(),
            rounds: Vec::new(),
            final_match: None,
            grand_final: None,
            swiss_rounds: None,
        }
    }

    /// Open a new round and return its index
    pub(crate) fn add_round(&mut self, section: Section, number: u32) -> usize {
        self.rounds.push(Round::new(section, number));
        self.rounds.len() - 1
    }

    pub(crate) fn round_mut(&mut self, idx: usize) -> BracketResult<&mut Round> {
        self.rounds
            .get_mut(idx)
            .ok_or_else(|| BracketError::CyclicOrInconsistentBracket(format!("no round {idx}")))
    }

    /// Add an empty match to the round at `round_idx`
    pub(crate) fn add_match(&mut self, round_idx: usize) -> BracketResult<MatchId> {
        let id = self.next_id;
        let round = self.round_mut(round_idx)?;
        let m = Match::new(id, round.section, round.number);
        round.matches.push(id);
        self.matches.insert(id, m);
        self.next_id += 1;
        Ok(id)
    }

    /// Add a match with both slots already bound
    pub(crate) fn add_pairing(
        &mut self,
        round_idx: usize,
        first: Occupant,
        second: Occupant,
    ) -> BracketResult<MatchId> {
        let id = self.add_match(round_idx)?;
        self.bind(SlotRef::new(id, 0), first)?;
        self.bind(SlotRef::new(id, 1), second)?;
        Ok(id)
    }

    fn match_mut(&mut self, id: MatchId) -> BracketResult<&mut Match> {
        self.matches
            .get_mut(&id)
            .ok_or_else(|| BracketError::CyclicOrInconsistentBracket(format!("no match {id}")))
    }

    pub(crate) fn bind(&mut self, target: SlotRef, occupant: Occupant) -> BracketResult<()> {
        let m = self.match_mut(target.match_id)?;
        let slot = m.slots.get_mut(target.slot).ok_or_else(|| {
            BracketError::CyclicOrInconsistentBracket(format!("no slot {}", target.slot))
        })?;
        slot.occupant = occupant;
        Ok(())
    }

    pub(crate) fn link_winner(&mut self, from: MatchId, to: SlotRef) -> BracketResult<()> {
        self.match_mut(from)?.next_match = Some(to);
        Ok(())
    }

    pub(crate) fn link_loser(&mut self, from: MatchId, to: SlotRef) -> BracketResult<()> {
        self.match_mut(from)?.loser_next_match = Some(to);
        Ok(())
    }

    pub(crate) fn build(
        self,
        format: Format,
        participants: Vec<Participant>,
        options: FormatOptions,
        scoring: StandingsConfig,
    ) -> Bracket {
        Bracket {
            format,
            participants,
            options,
            scoring,
            matches: self.matches,
            rounds: self.rounds,
            final_match: self.final_match,
            grand_final: self.grand_final,
            swiss: self.swiss_rounds.map(|total_rounds| SwissState {
                total_rounds,
                snapshot: Vec::new(),
            }),
            next_match_id: self.next_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_round_bracket() -> Bracket {
        let mut builder = BracketBuilder::new();
        let r1 = builder.add_round(Section::Main, 1);
        let r2 = builder.add_round(Section::Main, 2);
        let a = builder
            .add_pairing(
                r1,
                Occupant::Participant(ParticipantId::new("a")),
                Occupant::Participant(ParticipantId::new("b")),
            )
            .unwrap();
        let b = builder
            .add_pairing(
                r1,
                Occupant::Participant(ParticipantId::new("c")),
                Occupant::Participant(ParticipantId::new("d")),
            )
            .unwrap();
        let f = builder.add_match(r2).unwrap();
        builder.link_winner(a, SlotRef::new(f, 0)).unwrap();
        builder.link_winner(b, SlotRef::new(f, 1)).unwrap();
        builder.final_match = Some(f);
        let roster = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Participant::new(id, id))
            .collect();
        builder.build(
            Format::SingleElimination,
            roster,
            FormatOptions::default(),
            StandingsConfig::default(),
        )
    }

    #[test]
    fn test_builder_assigns_sequential_ids() {
        let bracket = two_round_bracket();
        let ids: Vec<_> = bracket.matches().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(bracket.next_match_id, 4);
        assert!(bracket.validate().is_ok());
    }

    #[test]
    fn test_round_labels() {
        let bracket = two_round_bracket();
        let labels: Vec<_> = bracket
            .rounds()
            .iter()
            .map(|r| bracket.round_label(r))
            .collect();
        assert_eq!(labels, vec!["Semifinal", "Final"]);
        assert_eq!(elimination_label(2), "Quarterfinal");
        assert_eq!(elimination_label(3), "Round of 16");
    }

    #[test]
    fn test_validate_rejects_backward_link() {
        let mut bracket = two_round_bracket();
        if let Some(m) = bracket.matches.get_mut(&3) {
            m.next_match = Some(SlotRef::new(1, 0));
        }
        assert!(matches!(
            bracket.validate(),
            Err(BracketError::CyclicOrInconsistentBracket(_))
        ));
    }

    #[test]
    fn test_validate_rejects_double_feeder() {
        let mut bracket = two_round_bracket();
        if let Some(m) = bracket.matches.get_mut(&2) {
            m.next_match = Some(SlotRef::new(3, 0));
        }
        assert!(bracket.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_orphan_match() {
        let mut bracket = two_round_bracket();
        bracket.rounds[1].matches.clear();
        assert!(bracket.validate().is_err());
    }

    #[test]
    fn test_participant_path_and_status() {
        let bracket = two_round_bracket();
        assert_eq!(bracket.participant_path(&ParticipantId::new("c")), vec![2]);
        assert_eq!(bracket.round_status(&bracket.rounds()[0]), RoundStatus::Pending);
        assert!(!bracket.is_complete());
        assert_eq!(bracket.champion(), None);
    }

    #[test]
    fn test_next_playable_match_drives_a_full_play_out() {
        let mut bracket = two_round_bracket();
        assert_eq!(bracket.next_playable_match(), Some(1));

        let mut reported = Vec::new();
        while let Some(id) = bracket.next_playable_match() {
            bracket.report_result(id, [1, 0]).unwrap();
            reported.push(id);
        }
        assert_eq!(reported, vec![1, 2, 3]);
        assert!(bracket.is_complete());
        assert_eq!(bracket.champion(), Some(&ParticipantId::new("a")));
    }
}
