//! Swiss system: a fixed number of rounds, each paired from the standings
//! once the previous round is over.

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::{HashMap, HashSet};

use super::{Format, PairingStrategy};
use crate::{
    bracket::{
        Bracket,
        entities::{Match, MatchId, Occupant, Participant, ParticipantId, Round, RoundStatus, Section},
        structure::BracketBuilder,
    },
    config::FormatOptions,
    errors::{BracketError, BracketResult},
};

/// Upper bound on backtracking steps when searching for a repeat-free
/// pairing
const PAIRING_SEARCH_LIMIT: usize = 250_000;

/// Pairs of one round plus whoever gets the bye
type RoundPairing = (Vec<(ParticipantId, ParticipantId)>, Option<ParticipantId>);

/// Most rounds a Swiss event can run while pairing each round on its own.
///
/// Up to `n / 2` rounds every entrant still has at least half of the others
/// left to meet, so a repeat-free pairing always exists (Dirac). Longer
/// events pick their rounds from a full round robin schedule instead.
fn free_pairing_limit(participants: usize) -> u32 {
    (participants / 2) as u32
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Swiss;

impl PairingStrategy for Swiss {
    fn layout(
        &self,
        ordered: &[Participant],
        options: &FormatOptions,
        builder: &mut BracketBuilder,
    ) -> BracketResult<()> {
        builder.swiss_rounds = Some(options.swiss_round_count(ordered.len()));

        let mut field: Vec<ParticipantId> = ordered.iter().map(|p| p.id.clone()).collect();
        // The weakest entrant sits out when the field is odd
        let resting = if field.len() % 2 == 1 { field.pop() } else { None };

        let pairs: Vec<(ParticipantId, ParticipantId)> = if options.seeding {
            let bottom = field.split_off(field.len() / 2);
            field.into_iter().zip(bottom).collect()
        } else {
            match options.shuffle_seed {
                Some(seed) => field.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => field.shuffle(&mut rand::rng()),
            }
            field
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect()
        };

        let idx = builder.add_round(Section::Main, 1);
        for (a, b) in pairs {
            builder.add_pairing(idx, Occupant::Participant(a), Occupant::Participant(b))?;
        }
        if let Some(resting) = resting {
            builder.add_pairing(idx, Occupant::Participant(resting), Occupant::Bye)?;
        }
        Ok(())
    }
}

/// Who has met whom, and who has already had a bye
struct History {
    played: HashSet<(ParticipantId, ParticipantId)>,
    had_bye: HashSet<ParticipantId>,
}

impl History {
    fn of(bracket: &Bracket) -> Self {
        let mut played = HashSet::new();
        let mut had_bye = HashSet::new();
        for m in bracket.matches() {
            match (m.slots[0].participant_id(), m.slots[1].participant_id()) {
                (Some(a), Some(b)) => {
                    played.insert(key(a, b));
                }
                (Some(p), None) | (None, Some(p)) if m.is_bye_match() => {
                    had_bye.insert(p.clone());
                }
                _ => {}
            }
        }
        Self { played, had_bye }
    }

    fn have_met(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        self.played.contains(&key(a, b))
    }
}

fn key(a: &ParticipantId, b: &ParticipantId) -> (ParticipantId, ParticipantId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Pair `ranked` top-down, each entrant taking the nearest-ranked opponent
/// they have not met, backtracking when the rest cannot be completed.
fn pair_up(
    ranked: &[ParticipantId],
    history: &History,
    budget: &mut usize,
) -> Option<Vec<(ParticipantId, ParticipantId)>> {
    let Some((first, rest)) = ranked.split_first() else {
        return Some(Vec::new());
    };
    if *budget == 0 {
        return None;
    }
    *budget -= 1;

    for (j, opponent) in rest.iter().enumerate() {
        if history.have_met(first, opponent) {
            continue;
        }
        let remaining: Vec<ParticipantId> = rest
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != j)
            .map(|(_, p)| p.clone())
            .collect();
        if let Some(mut pairs) = pair_up(&remaining, history, budget) {
            pairs.insert(0, (first.clone(), opponent.clone()));
            return Some(pairs);
        }
    }
    None
}

/// Pick the bye (odd fields) and pair everyone else. Bye candidates are
/// tried from the bottom of the table up, those without a previous bye
/// first.
fn pair_round(ranked: &[ParticipantId], history: &History) -> Option<RoundPairing> {
    let mut budget = PAIRING_SEARCH_LIMIT;
    if ranked.len() % 2 == 0 {
        return pair_up(ranked, history, &mut budget).map(|pairs| (pairs, None));
    }

    let mut candidates: Vec<&ParticipantId> = ranked.iter().rev().collect();
    candidates.sort_by_key(|p| history.had_bye.contains(*p));
    for candidate in candidates {
        let others: Vec<ParticipantId> = ranked.iter().filter(|p| *p != candidate).cloned().collect();
        if let Some(pairs) = pair_up(&others, history, &mut budget) {
            return Some((pairs, Some(candidate.clone())));
        }
    }
    None
}

/// Circle method schedule whose first round is the round-1 pairing that
/// was actually played. Its rounds are pairwise disjoint and give every
/// entrant of an odd field exactly one bye, so any of them can follow without
/// a rematch.
fn circle_schedule(first_round: &[&Match]) -> Vec<RoundPairing> {
    let mut resting = None;
    let mut top = Vec::new();
    let mut bottom = Vec::new();
    for m in first_round {
        match (m.slots[0].participant_id(), m.slots[1].participant_id()) {
            (Some(a), Some(b)) => {
                top.push(Some(a.clone()));
                bottom.push(Some(b.clone()));
            }
            (Some(p), None) | (None, Some(p)) => resting = Some(p.clone()),
            (None, None) => {}
        }
    }

    // circle[i] meets circle[size - 1 - i]; the phantom entrant sits last
    let odd = resting.is_some();
    let mut circle: Vec<Option<ParticipantId>> = Vec::with_capacity(2 * top.len() + 2);
    if let Some(resting) = resting {
        circle.push(Some(resting));
    }
    circle.extend(top);
    circle.extend(bottom.into_iter().rev());
    if odd {
        circle.push(None);
    }

    let size = circle.len();
    let mut schedule = Vec::with_capacity(size.saturating_sub(1));
    for _ in 1..size {
        let mut pairs = Vec::with_capacity(size / 2);
        let mut bye = None;
        for i in 0..size / 2 {
            match (&circle[i], &circle[size - 1 - i]) {
                (Some(a), Some(b)) => pairs.push((a.clone(), b.clone())),
                (Some(p), None) | (None, Some(p)) => bye = Some(p.clone()),
                (None, None) => {}
            }
        }
        schedule.push((pairs, bye));
        circle[1..].rotate_right(1);
    }
    schedule
}

/// Choose the unplayed scheduled round that keeps opponents closest in the
/// standings and rests the lowest ranked entrant.
fn pick_scheduled_round(
    schedule: Vec<RoundPairing>,
    ranked: &[ParticipantId],
    history: &History,
) -> Option<RoundPairing> {
    let rank: HashMap<&ParticipantId, usize> =
        ranked.iter().enumerate().map(|(i, p)| (p, i)).collect();
    let rank_of = |p: &ParticipantId| rank.get(p).copied().unwrap_or(ranked.len());

    let (mut pairs, resting) = schedule
        .into_iter()
        .filter(|(pairs, _)| pairs.iter().all(|(a, b)| !history.have_met(a, b)))
        .min_by_key(|(pairs, resting)| {
            let spread: usize = pairs
                .iter()
                .map(|(a, b)| rank_of(a).abs_diff(rank_of(b)))
                .sum();
            let rest_height = resting
                .as_ref()
                .map_or(0, |p| ranked.len().saturating_sub(rank_of(p)));
            spread + rest_height
        })?;

    // Present the round in table order, stronger entrant first
    for pair in &mut pairs {
        if rank_of(&pair.1) < rank_of(&pair.0) {
            std::mem::swap(&mut pair.0, &mut pair.1);
        }
    }
    pairs.sort_by_key(|(a, _)| rank_of(a));
    Some((pairs, resting))
}

impl Bracket {
    /// Pair the next Swiss round from the current standings.
    ///
    /// Fails if the bracket is not Swiss, the latest round still has open
    /// matches, every round has been paired, or no pairing avoids a
    /// rematch. Returns the new match ids; a bye match is already completed.
    pub fn pair_next_round(&mut self) -> BracketResult<Vec<MatchId>> {
        let total = match (&self.swiss, self.format) {
            (Some(swiss), Format::Swiss) => swiss.total_rounds,
            _ => {
                return Err(BracketError::UnsupportedOperation {
                    format: self.format.to_string(),
                    operation: "pair_next_round".to_string(),
                });
            }
        };

        let current = self.rounds.len() as u32;
        if current >= total {
            return Err(BracketError::RoundsExhausted { total });
        }
        if let Some(round) = self.rounds.last()
            && self.round_status(round) != RoundStatus::Completed
        {
            return Err(BracketError::RoundIncomplete { round: current });
        }

        let standings = self.standings();
        let ranked: Vec<ParticipantId> = standings.iter().map(|r| r.participant.clone()).collect();
        let history = History::of(self);
        let number = current + 1;
        let paired = if total <= free_pairing_limit(self.participants.len()) {
            pair_round(&ranked, &history)
        } else {
            let first_round = self
                .rounds
                .first()
                .map(|round| self.round_matches(round))
                .unwrap_or_default();
            pick_scheduled_round(circle_schedule(&first_round), &ranked, &history)
        };
        let (pairs, resting) = paired.ok_or(BracketError::NoValidPairing { round: number })?;

        // Built on a copy and swapped in once byes have settled
        let mut next = self.clone();
        let mut round = Round::new(Section::Main, number);
        let entries = pairs
            .into_iter()
            .map(|(a, b)| (Occupant::Participant(a), Occupant::Participant(b)))
            .chain(resting.map(|p| (Occupant::Participant(p), Occupant::Bye)));
        for (a, b) in entries {
            let id = next.next_match_id;
            next.next_match_id += 1;
            let mut m = Match::new(id, Section::Main, number);
            m.slots[0].occupant = a;
            m.slots[1].occupant = b;
            next.matches.insert(id, m);
            round.matches.push(id);
        }
        let ids = round.matches.clone();
        next.rounds.push(round);
        if let Some(swiss) = next.swiss.as_mut() {
            swiss.snapshot = standings;
        }
        next.settle_byes()?;
        *self = next;

        debug!("Paired Swiss round {number} of {total}: matches {ids:?}");
        Ok(ids)
    }

    /// Record the current standings as the ones the latest round was paired
    /// from
    pub(crate) fn refresh_swiss_snapshot(&mut self) {
        let snapshot = self.standings();
        if let Some(swiss) = self.swiss.as_mut() {
            swiss.snapshot = snapshot;
        }
    }
}
