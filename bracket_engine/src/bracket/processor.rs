//! Result reporting and winner/loser propagation.
//!
//! Every mutation is staged on copies of the touched matches and only
//! committed once propagation has run to a fixed point, so a rejected call
//! leaves the bracket exactly as it was.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque, btree_map::Entry};

use super::{
    entities::{Match, MatchId, MatchState, Occupant, ParticipantId, Round, Section, SlotRef},
    structure::Bracket,
};
use crate::errors::{BracketError, BracketResult};

/// What a successful mutation changed, for persisting and broadcasting only
/// the affected matches.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchUpdate {
    /// The reported match
    pub match_id: MatchId,
    /// Every match whose slots, scores or state changed, in id order
    pub changed: Vec<Match>,
    /// Matches that became COMPLETED, in completion order
    pub completed: Vec<MatchId>,
    /// Set when this report decided the bracket
    pub champion: Option<ParticipantId>,
}

impl Bracket {
    /// Apply a reported result and propagate the winner (and loser) forward.
    ///
    /// Requires the match to exist, not be completed, have real participants
    /// in both slots, and non-negative unequal scores.
    pub fn report_result(
        &mut self,
        match_id: MatchId,
        scores: [i64; 2],
    ) -> BracketResult<MatchUpdate> {
        if let Err(err) = self.check_reportable(match_id, scores) {
            warn!("Rejected result for match {match_id}: {err}");
            return Err(err);
        }

        let reset_enabled = self.options.bracket_reset;
        let mut staging = Staging::new(self);

        let m = staging.get_mut(match_id)?;
        m.slots[0].score = scores[0];
        m.slots[1].score = scores[1];
        m.state = MatchState::Completed;
        let lower_seat_won = m.winner_slot() == Some(1);
        staging.completed.push(match_id);

        // The losers-bracket finalist sits in slot 1 of the grand final. If
        // they win, both go on to a deciding reset match.
        if self.grand_final == Some(match_id) && reset_enabled && lower_seat_won {
            staging.add_reset_match(match_id)?;
        }

        if let Err(err) = staging.propagate(match_id) {
            error!("Propagation from match {match_id} failed: {err}");
            return Err(err);
        }

        let completed = staging.completed.clone();
        let staged = staging.finish();
        let changed = self.commit(staged);
        let champion = self
            .final_match
            .filter(|id| completed.contains(id))
            .and_then(|_| self.champion().cloned());

        debug!(
            "Match {match_id} reported {}-{}, {} match(es) changed",
            scores[0],
            scores[1],
            changed.len()
        );

        Ok(MatchUpdate {
            match_id,
            changed,
            completed,
            champion,
        })
    }

    /// Mark a scheduled match as in progress.
    ///
    /// Returns `false` if it was already in progress.
    pub fn start_match(&mut self, match_id: MatchId) -> BracketResult<bool> {
        let m = self
            .matches
            .get_mut(&match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;

        match m.state {
            MatchState::Completed => Err(BracketError::MatchAlreadyCompleted(match_id)),
            _ if !m.is_ready() => Err(BracketError::MatchNotReady(match_id)),
            MatchState::InProgress => Ok(false),
            MatchState::Scheduled => {
                m.state = MatchState::InProgress;
                Ok(true)
            }
        }
    }

    /// Complete every match that holds a participant (or bye) against a bye
    /// and propagate, until nothing else resolves. Returns the ids that
    /// completed.
    pub(crate) fn settle_byes(&mut self) -> BracketResult<Vec<MatchId>> {
        let ids: Vec<MatchId> = self.matches.keys().copied().collect();
        let mut staging = Staging::new(self);

        for id in ids {
            if staging.try_auto_resolve(id)? {
                staging.propagate(id)?;
            }
        }

        let completed = staging.completed.clone();
        let staged = staging.finish();
        self.commit(staged);
        Ok(completed)
    }

    fn check_reportable(&self, match_id: MatchId, scores: [i64; 2]) -> BracketResult<()> {
        let m = self
            .matches
            .get(&match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;

        if m.is_completed() {
            return Err(BracketError::MatchAlreadyCompleted(match_id));
        }
        if !m.is_ready() {
            return Err(BracketError::MatchNotReady(match_id));
        }

        let reason = if scores.iter().any(|&s| s < 0) {
            Some("scores must be non-negative")
        } else if scores[0] == scores[1] {
            Some("ties are not allowed")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(BracketError::InvalidScore {
                match_id,
                scores,
                reason: reason.to_string(),
            });
        }

        Ok(())
    }

    fn commit(&mut self, staging: Staged) -> Vec<Match> {
        let Staged {
            edits,
            next_id,
            new_rounds,
            final_match,
        } = staging;

        let changed: Vec<Match> = edits.values().cloned().collect();
        self.matches.extend(edits);
        self.rounds.extend(new_rounds);
        self.next_match_id = next_id;
        if final_match.is_some() {
            self.final_match = final_match;
        }
        changed
    }
}

/// Pending changes on top of a borrowed match arena
struct Staging<'a> {
    base: &'a BTreeMap<MatchId, Match>,
    edits: BTreeMap<MatchId, Match>,
    completed: Vec<MatchId>,
    next_id: MatchId,
    new_rounds: Vec<Round>,
    final_match: Option<MatchId>,
}

/// Staged changes detached from the arena borrow
struct Staged {
    edits: BTreeMap<MatchId, Match>,
    next_id: MatchId,
    new_rounds: Vec<Round>,
    final_match: Option<MatchId>,
}

fn inconsistent(msg: String) -> BracketError {
    BracketError::CyclicOrInconsistentBracket(msg)
}

impl<'a> Staging<'a> {
    fn new(bracket: &'a Bracket) -> Self {
        Self {
            base: &bracket.matches,
            edits: BTreeMap::new(),
            completed: Vec::new(),
            next_id: bracket.next_match_id,
            new_rounds: Vec::new(),
            final_match: None,
        }
    }

    fn finish(self) -> Staged {
        Staged {
            edits: self.edits,
            next_id: self.next_id,
            new_rounds: self.new_rounds,
            final_match: self.final_match,
        }
    }

    fn get(&self, id: MatchId) -> BracketResult<&Match> {
        self.edits
            .get(&id)
            .or_else(|| self.base.get(&id))
            .ok_or_else(|| inconsistent(format!("match {id} is referenced but missing")))
    }

    fn get_mut(&mut self, id: MatchId) -> BracketResult<&mut Match> {
        match self.edits.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let m = self
                    .base
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| inconsistent(format!("match {id} is referenced but missing")))?;
                Ok(entry.insert(m))
            }
        }
    }

    /// Bind an occupant into a downstream slot. Each slot is bound exactly
    /// once, by its single feeder.
    fn bind(&mut self, from: MatchId, target: SlotRef, occupant: Occupant) -> BracketResult<()> {
        if !self.get(from)?.feeds(self.get(target.match_id)?) {
            return Err(inconsistent(format!(
                "match {from} feeds match {} which is not later in the bracket",
                target.match_id
            )));
        }

        let m = self.get_mut(target.match_id)?;
        if m.is_completed() {
            return Err(inconsistent(format!(
                "match {} is already completed but still receives from {from}",
                m.id
            )));
        }
        let slot = m
            .slots
            .get_mut(target.slot)
            .ok_or_else(|| inconsistent(format!("match {from} links to slot {}", target.slot)))?;
        if slot.occupant.is_bound() {
            return Err(inconsistent(format!(
                "slot {} of match {} is bound twice",
                target.slot, target.match_id
            )));
        }

        debug!(
            "{occupant} moves from match {from} to match {} slot {}",
            target.match_id, target.slot
        );
        slot.occupant = occupant;
        Ok(())
    }

    /// Complete a match that has both slots bound and at least one bye.
    fn try_auto_resolve(&mut self, id: MatchId) -> BracketResult<bool> {
        let m = self.get(id)?;
        let resolvable = !m.is_completed()
            && m.slots.iter().all(|s| s.occupant.is_bound())
            && m.is_bye_match();
        if !resolvable {
            return Ok(false);
        }

        let m = self.get_mut(id)?;
        m.slots[0].score = 0;
        m.slots[1].score = 0;
        m.state = MatchState::Completed;
        self.completed.push(id);
        debug!("Match {id} resolved by bye");
        Ok(true)
    }

    /// Push results forward from `start` until no further match resolves.
    fn propagate(&mut self, start: MatchId) -> BracketResult<()> {
        let mut queue = VecDeque::from([start]);
        // Every step binds at least one previously unbound slot
        let budget = 2 * (self.base.len() + self.edits.len()) + 1;
        let mut steps = 0;

        while let Some(id) = queue.pop_front() {
            steps += 1;
            if steps > budget {
                return Err(inconsistent(format!(
                    "propagation from match {start} does not terminate"
                )));
            }

            let m = self.get(id)?;
            let Some((winner, loser)) = m.outcome() else {
                continue;
            };
            let links = [(m.next_match, winner), (m.loser_next_match, loser)];

            for (link, occupant) in links {
                let Some(link) = link else {
                    continue;
                };
                self.bind(id, link, occupant)?;
                if self.try_auto_resolve(link.match_id)? {
                    queue.push_back(link.match_id);
                }
            }
        }

        Ok(())
    }

    /// Append the bracket reset match and route both grand finalists into it
    fn add_reset_match(&mut self, grand_final: MatchId) -> BracketResult<()> {
        let id = self.next_id;
        self.next_id += 1;

        let round_number = self.get(grand_final)?.round + 1;
        let mut round = Round::new(Section::GrandFinal, round_number);
        round.matches.push(id);
        self.new_rounds.push(round);
        self.edits
            .insert(id, Match::new(id, Section::GrandFinal, round_number));

        let gf = self.get_mut(grand_final)?;
        gf.next_match = Some(SlotRef::new(id, 1));
        gf.loser_next_match = Some(SlotRef::new(id, 0));
        self.final_match = Some(id);

        debug!("Grand final {grand_final} won from the losers side, reset match {id} added");
        Ok(())
    }
}
