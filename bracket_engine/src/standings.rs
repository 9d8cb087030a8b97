//! Ranked standings derived from completed matches.
//!
//! Standings are never stored on their own; they are recomputed from the
//! bracket on every read, so two calls without an intervening result always
//! agree.

use serde::{Deserialize, Serialize};
use std::{
    cmp::{Ordering, Reverse},
    collections::{HashMap, HashSet},
};

use crate::{
    bracket::{
        Bracket,
        entities::{Occupant, ParticipantId},
    },
    config::StandingsConfig,
};

/// One line of the standings table
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StandingRow {
    pub participant: ParticipantId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    /// Matches won by walkover against a bye
    pub byes: u32,
    pub points: i64,
    /// Matches actually played, byes excluded
    pub matches_played: u32,
    /// Sum of the wins of every opponent faced
    pub strength_of_schedule: u32,
    /// 1-based position in the table
    pub rank: u32,
}

/// Per-participant accumulator
struct Tally {
    roster_index: usize,
    seed: Option<u32>,
    row: StandingRow,
    opponents: Vec<ParticipantId>,
}

impl Bracket {
    /// Standings using the bracket's own scoring
    pub fn standings(&self) -> Vec<StandingRow> {
        compute_standings(self, &self.scoring)
    }
}

/// Rank every roster entry.
///
/// Sorted by points, then head-to-head wins inside a tied group (only when
/// every pair in the group has met), then strength of schedule, then seed
/// and roster order. When an elimination bracket has been decided, the
/// champion and runner-up take the top two places regardless of points.
pub fn compute_standings(bracket: &Bracket, config: &StandingsConfig) -> Vec<StandingRow> {
    let mut tallies: Vec<Tally> = bracket
        .participants()
        .iter()
        .enumerate()
        .map(|(roster_index, p)| Tally {
            roster_index,
            seed: p.seed,
            row: StandingRow {
                participant: p.id.clone(),
                name: p.name.clone(),
                wins: 0,
                losses: 0,
                byes: 0,
                points: 0,
                matches_played: 0,
                strength_of_schedule: 0,
                rank: 0,
            },
            opponents: Vec::new(),
        })
        .collect();
    let index: HashMap<ParticipantId, usize> = tallies
        .iter()
        .enumerate()
        .map(|(i, t)| (t.row.participant.clone(), i))
        .collect();

    let mut beat: HashMap<(ParticipantId, ParticipantId), u32> = HashMap::new();
    let mut met: HashSet<(ParticipantId, ParticipantId)> = HashSet::new();

    for m in bracket.matches().filter(|m| m.is_completed()) {
        match (&m.slots[0].occupant, &m.slots[1].occupant) {
            (Occupant::Participant(_), Occupant::Participant(_)) => {
                let (Some(winner), Some(loser)) = (m.winner(), m.loser()) else {
                    continue;
                };
                let (Some(&w), Some(&l)) = (index.get(winner), index.get(loser)) else {
                    continue;
                };
                tallies[w].row.wins += 1;
                tallies[w].row.matches_played += 1;
                tallies[w].opponents.push(loser.clone());
                tallies[l].row.losses += 1;
                tallies[l].row.matches_played += 1;
                tallies[l].opponents.push(winner.clone());
                *beat.entry((winner.clone(), loser.clone())).or_default() += 1;
                met.insert(pair_key(winner, loser));
            }
            (Occupant::Participant(id), Occupant::Bye)
            | (Occupant::Bye, Occupant::Participant(id)) => {
                if let Some(&i) = index.get(id) {
                    tallies[i].row.byes += 1;
                }
            }
            _ => {}
        }
    }

    let wins: HashMap<ParticipantId, u32> = tallies
        .iter()
        .map(|t| (t.row.participant.clone(), t.row.wins))
        .collect();
    for tally in &mut tallies {
        tally.row.points = i64::from(tally.row.wins)
            .saturating_mul(config.win_points)
            .saturating_add(i64::from(tally.row.byes).saturating_mul(config.bye_points));
        tally.row.strength_of_schedule = tally
            .opponents
            .iter()
            .filter_map(|o| wins.get(o))
            .sum();
    }

    tallies.sort_by_key(|t| Reverse(t.row.points));
    let mut ordered = Vec::with_capacity(tallies.len());
    let mut rest = tallies.into_iter().peekable();
    while let Some(first) = rest.next() {
        let mut group = vec![first];
        while let Some(next) = rest.next_if(|t| t.row.points == group[0].row.points) {
            group.push(next);
        }
        order_tied_group(&mut group, &beat, &met);
        ordered.extend(group);
    }

    if bracket.format().is_elimination() {
        pin_finalists(&mut ordered, bracket);
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, t)| StandingRow {
            rank: i as u32 + 1,
            ..t.row
        })
        .collect()
}

fn pair_key(a: &ParticipantId, b: &ParticipantId) -> (ParticipantId, ParticipantId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

fn order_tied_group(
    group: &mut [Tally],
    beat: &HashMap<(ParticipantId, ParticipantId), u32>,
    met: &HashSet<(ParticipantId, ParticipantId)>,
) {
    if group.len() < 2 {
        return;
    }

    let all_met = group.iter().enumerate().all(|(i, a)| {
        group[i + 1..]
            .iter()
            .all(|b| met.contains(&pair_key(&a.row.participant, &b.row.participant)))
    });
    let head_to_head: HashMap<ParticipantId, u32> = if all_met {
        group
            .iter()
            .map(|a| {
                let won: u32 = group
                    .iter()
                    .filter_map(|b| {
                        beat.get(&(a.row.participant.clone(), b.row.participant.clone()))
                    })
                    .sum();
                (a.row.participant.clone(), won)
            })
            .collect()
    } else {
        HashMap::new()
    };

    group.sort_by(|a, b| {
        let h2h = |t: &Tally| head_to_head.get(&t.row.participant).copied().unwrap_or(0);
        h2h(b)
            .cmp(&h2h(a))
            .then(b.row.strength_of_schedule.cmp(&a.row.strength_of_schedule))
            .then(compare_seeds(a.seed, b.seed))
            .then(a.roster_index.cmp(&b.roster_index))
    });
}

/// Lower seed first, unseeded entries last
fn compare_seeds(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn pin_finalists(ordered: &mut Vec<Tally>, bracket: &Bracket) {
    let finalists = [bracket.runner_up(), bracket.champion()];
    for finalist in finalists.into_iter().flatten() {
        if let Some(pos) = ordered.iter().position(|t| &t.row.participant == finalist) {
            let tally = ordered.remove(pos);
            ordered.insert(0, tally);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bracket::entities::Participant,
        config::FormatOptions,
        pairing::{Format, generate},
    };

    fn ids(rows: &[StandingRow]) -> Vec<&str> {
        rows.iter().map(|r| r.participant.as_str()).collect()
    }

    fn seeded(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Participant::new(id, id).with_seed(i as u32 + 1))
            .collect()
    }

    #[test]
    fn test_fresh_bracket_orders_by_seed() {
        let bracket = generate(
            &seeded(&["A", "B", "C", "D"]),
            Format::RoundRobin,
            &FormatOptions::seeded(),
        )
        .unwrap();
        let rows = bracket.standings();
        assert_eq!(ids(&rows), vec!["A", "B", "C", "D"]);
        assert!(rows.iter().all(|r| r.points == 0 && r.matches_played == 0));
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_head_to_head() {
        // Round robin of three: C beats A, A beats B, B beats C -> all on one
        // win, a cycle, so head-to-head wins are equal and seeds decide.
        let mut bracket = generate(
            &seeded(&["A", "B", "C"]),
            Format::RoundRobin,
            &FormatOptions::seeded(),
        )
        .unwrap();
        let ids_of = |b: &Bracket, x: &str, y: &str| {
            b.matches()
                .find(|m| {
                    m.involves(&ParticipantId::new(x)) && m.involves(&ParticipantId::new(y))
                })
                .map(|m| m.id)
                .unwrap()
        };
        let report = |b: &mut Bracket, winner: &str, loser: &str| {
            let id = ids_of(b, winner, loser);
            let first_is_winner = b.get_match(id).unwrap().slots[0].participant_id()
                == Some(&ParticipantId::new(winner));
            let scores = if first_is_winner { [1, 0] } else { [0, 1] };
            b.report_result(id, scores).unwrap();
        };
        report(&mut bracket, "C", "A");
        report(&mut bracket, "A", "B");
        report(&mut bracket, "B", "C");
        assert_eq!(ids(&bracket.standings()), vec!["A", "B", "C"]);

        // Two-way tie on points resolved by the direct meeting
        let mut bracket = generate(
            &seeded(&["A", "B", "C", "D"]),
            Format::RoundRobin,
            &FormatOptions::seeded(),
        )
        .unwrap();
        report(&mut bracket, "B", "A");
        report(&mut bracket, "A", "C");
        let rows = bracket.standings();
        assert_eq!(ids(&rows), vec!["B", "A", "C", "D"]);
        assert_eq!(rows[1].points, 1);
        assert_eq!(rows[2].strength_of_schedule, 1);
    }

    #[test]
    fn test_custom_points() {
        let bracket = generate(
            &seeded(&["A", "B", "C"]),
            Format::SingleElimination,
            &FormatOptions::seeded(),
        )
        .unwrap();
        let rows = compute_standings(&bracket, &StandingsConfig::new(3, 2));
        // A got the bye
        assert_eq!(rows[0].participant.as_str(), "A");
        assert_eq!(rows[0].byes, 1);
        assert_eq!(rows[0].points, 2);
        assert_eq!(rows[0].matches_played, 0);
    }

    #[test]
    fn test_huge_point_values_saturate() {
        let mut bracket = generate(
            &seeded(&["A", "B", "C", "D"]),
            Format::SingleElimination,
            &FormatOptions::seeded(),
        )
        .unwrap();
        bracket.report_result(1, [2, 1]).unwrap();
        bracket.report_result(2, [2, 1]).unwrap();
        bracket.report_result(3, [2, 1]).unwrap();

        let rows = compute_standings(&bracket, &StandingsConfig::new(i64::MAX, i64::MAX));
        assert_eq!(rows[0].participant.as_str(), "A");
        assert_eq!(rows[0].wins, 2);
        assert_eq!(rows[0].points, i64::MAX);
    }

    #[test]
    fn test_idempotent() {
        let mut bracket = generate(
            &seeded(&["A", "B", "C", "D", "E"]),
            Format::SingleElimination,
            &FormatOptions::seeded(),
        )
        .unwrap();
        let playable = bracket
            .matches()
            .find(|m| m.is_ready() && !m.is_completed())
            .map(|m| m.id)
            .unwrap();
        bracket.report_result(playable, [2, 1]).unwrap();
        assert_eq!(bracket.standings(), bracket.standings());
    }
}
