//! Integration tests for single and double elimination brackets.
//!
//! Covers seeded pairings, bye propagation, the grand final with and without
//! a bracket reset, and final standings placement.

use bracket_engine::{
    Bracket, BracketError, Format, FormatOptions, Match, MatchState, Occupant, Participant,
    ParticipantId, Section, generate,
};
use std::collections::HashMap;

fn seeded(ids: &[&str]) -> Vec<Participant> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| Participant::new(id, &format!("Team {id}")).with_seed(i as u32 + 1))
        .collect()
}

fn numbered(n: usize) -> Vec<Participant> {
    (1..=n)
        .map(|i| Participant::new(&format!("s{i}"), &format!("Seed {i}")).with_seed(i as u32))
        .collect()
}

fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id)
}

/// Report every playable match until none is left, scores chosen by `pick`
fn play_out(bracket: &mut Bracket, mut pick: impl FnMut(&Match) -> [i64; 2]) {
    while let Some(id) = bracket.next_playable_match() {
        let scores = pick(bracket.get_match(id).unwrap());
        bracket.report_result(id, scores).unwrap();
    }
}

/// The better seed always wins
fn favourite_wins(m: &Match) -> [i64; 2] {
    let seed = |slot: usize| {
        m.slots[slot]
            .participant_id()
            .and_then(|id| id.as_str().trim_start_matches('s').parse::<u32>().ok())
            .unwrap_or(u32::MAX)
    };
    if seed(0) < seed(1) { [2, 1] } else { [1, 2] }
}

#[test]
fn test_four_seeded_single_elimination_scenario() {
    let mut bracket = generate(
        &seeded(&["A", "B", "C", "D"]),
        Format::SingleElimination,
        &FormatOptions::seeded(),
    )
    .unwrap();

    let round_one = bracket.round(Section::Main, 1).unwrap();
    let pairs: Vec<_> = bracket
        .round_matches(round_one)
        .iter()
        .map(|m| (m.slots[0].occupant.clone(), m.slots[1].occupant.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Occupant::Participant(pid("A")), Occupant::Participant(pid("D"))),
            (Occupant::Participant(pid("B")), Occupant::Participant(pid("C"))),
        ]
    );

    bracket.report_result(1, [2, 1]).unwrap();
    bracket.report_result(2, [0, 3]).unwrap();
    let final_match = bracket.final_match().unwrap();
    assert_eq!(final_match.slots[0].participant_id(), Some(&pid("A")));
    assert_eq!(final_match.slots[1].participant_id(), Some(&pid("C")));

    let update = bracket.report_result(3, [1, 2]).unwrap();
    assert_eq!(update.champion, Some(pid("C")));
    assert_eq!(bracket.champion(), Some(&pid("C")));
    assert_eq!(bracket.runner_up(), Some(&pid("A")));
    assert!(bracket.is_complete());

    let order: Vec<_> = bracket
        .standings()
        .iter()
        .map(|r| r.participant.as_str().to_string())
        .collect();
    assert_eq!(order, vec!["C", "A", "B", "D"]);
}

#[test]
fn test_three_players_bye_resolves_at_generation() {
    let bracket = generate(
        &seeded(&["A", "B", "C"]),
        Format::SingleElimination,
        &FormatOptions::seeded(),
    )
    .unwrap();

    let bye = bracket.get_match(1).unwrap();
    assert!(bye.is_bye_match());
    assert_eq!(bye.state, MatchState::Completed);
    assert_eq!(bye.winner(), Some(&pid("A")));

    let final_match = bracket.final_match().unwrap();
    assert_eq!(final_match.slots[0].participant_id(), Some(&pid("A")));
    assert_eq!(bracket.playable_matches().count(), 2);
    assert_eq!(bracket.rounds().len(), 2);
}

#[test]
fn test_reporting_twice_is_rejected_without_change() {
    let mut bracket = generate(&numbered(8), Format::SingleElimination, &FormatOptions::seeded())
        .unwrap();
    bracket.report_result(1, [3, 0]).unwrap();
    let before = bracket.clone();
    assert_eq!(
        bracket.report_result(1, [0, 3]),
        Err(BracketError::MatchAlreadyCompleted(1))
    );
    assert_eq!(bracket, before);
}

#[test]
fn test_start_match() {
    let mut bracket = generate(&numbered(4), Format::SingleElimination, &FormatOptions::seeded())
        .unwrap();
    assert_eq!(bracket.start_match(1), Ok(true));
    assert_eq!(bracket.start_match(1), Ok(false));
    assert_eq!(bracket.start_match(3), Err(BracketError::MatchNotReady(3)));
    assert_eq!(bracket.start_match(42), Err(BracketError::MatchNotFound(42)));

    let round = &bracket.rounds()[0];
    assert_eq!(
        bracket.round_status(round),
        bracket_engine::RoundStatus::InProgress
    );

    bracket.report_result(1, [1, 0]).unwrap();
    assert_eq!(
        bracket.start_match(1),
        Err(BracketError::MatchAlreadyCompleted(1))
    );
}

#[test]
fn test_favourites_win_sixteen() {
    let mut bracket = generate(&numbered(16), Format::SingleElimination, &FormatOptions::seeded())
        .unwrap();
    play_out(&mut bracket, favourite_wins);
    assert_eq!(bracket.champion(), Some(&pid("s1")));
    assert_eq!(bracket.runner_up(), Some(&pid("s2")));
    assert_eq!(bracket.participant_path(&pid("s1")).len(), 4);

    let labels: Vec<_> = bracket.rounds().iter().map(|r| bracket.round_label(r)).collect();
    assert_eq!(labels, vec!["Round of 16", "Quarterfinal", "Semifinal", "Final"]);
}

#[test]
fn test_double_elimination_bracket_reset() {
    let mut bracket = generate(
        &numbered(4),
        Format::DoubleElimination,
        &FormatOptions::seeded(),
    )
    .unwrap();

    bracket.report_result(1, [2, 0]).unwrap(); // s1 beats s4
    bracket.report_result(2, [2, 0]).unwrap(); // s2 beats s3
    bracket.report_result(3, [2, 1]).unwrap(); // s1 takes the winners final
    bracket.report_result(4, [0, 2]).unwrap(); // s3 knocks out s4
    bracket.report_result(5, [2, 1]).unwrap(); // s3 beats s2 in the losers final

    let grand_final = bracket.grand_final().unwrap();
    assert_eq!(grand_final.slots[0].participant_id(), Some(&pid("s1")));
    assert_eq!(grand_final.slots[1].participant_id(), Some(&pid("s3")));

    // The losers-side finalist wins: both now have one loss
    let update = bracket.report_result(6, [1, 2]).unwrap();
    assert_eq!(update.champion, None);
    assert!(!bracket.is_complete());

    let reset = bracket.final_match().unwrap().clone();
    assert_eq!(reset.id, 7);
    assert_eq!(reset.section, Section::GrandFinal);
    assert_eq!(bracket.round_label(bracket.rounds().last().unwrap()), "Bracket Reset");
    assert!(reset.is_ready());
    assert!(update.changed.iter().any(|m| m.id == 7));

    let update = bracket.report_result(7, [3, 1]).unwrap();
    assert_eq!(update.champion, Some(pid("s1")));
    assert_eq!(bracket.runner_up(), Some(&pid("s3")));
    assert!(bracket.validate().is_ok());

    let standings = bracket.standings();
    assert_eq!(standings[0].participant, pid("s1"));
    assert_eq!(standings[1].participant, pid("s3"));
    assert_eq!(standings[0].wins, 3);
    assert_eq!(standings[1].wins, 3);
}

#[test]
fn test_double_elimination_without_reset() {
    let mut bracket = generate(
        &numbered(4),
        Format::DoubleElimination,
        &FormatOptions::seeded().without_reset(),
    )
    .unwrap();
    for (id, scores) in [(1, [2, 0]), (2, [2, 0]), (3, [2, 1]), (4, [0, 2]), (5, [2, 1])] {
        bracket.report_result(id, scores).unwrap();
    }
    let update = bracket.report_result(6, [1, 2]).unwrap();
    assert_eq!(update.champion, Some(pid("s3")));
    assert!(bracket.is_complete());
    assert_eq!(bracket.matches().count(), 6);
}

#[test]
fn test_double_elimination_every_loser_drops_once() {
    for n in [3, 5, 6, 8, 11, 16] {
        let mut bracket = generate(&numbered(n), Format::DoubleElimination, &FormatOptions::seeded())
            .unwrap();
        // Underdogs win whenever they can, to exercise the losers bracket
        play_out(&mut bracket, |m| {
            let [a, b] = favourite_wins(m);
            [b, a]
        });
        assert!(bracket.is_complete(), "{n} entrants");

        let mut losses: HashMap<ParticipantId, u32> = HashMap::new();
        for m in bracket.playable_matches() {
            *losses.entry(m.loser().unwrap().clone()).or_default() += 1;
        }
        let champion = bracket.champion().unwrap().clone();
        assert!(losses.get(&champion).copied().unwrap_or(0) <= 1);
        for (participant, count) in &losses {
            assert!(*count <= 2, "{participant} lost {count} times with {n} entrants");
        }
        // Everyone but the champion is eliminated
        assert_eq!(losses.values().filter(|&&c| c == 2).count(), n - 1);
        assert_eq!(bracket.standings()[0].participant, champion);
    }
}

#[test]
fn test_losers_bracket_receives_dropdowns_in_reverse() {
    let bracket = generate(&numbered(8), Format::DoubleElimination, &FormatOptions::seeded())
        .unwrap();
    let winners_two: Vec<&Match> = bracket.round_matches(bracket.round(Section::Winners, 2).unwrap());
    let losers_two: Vec<u32> = bracket.round(Section::Losers, 2).unwrap().matches.clone();
    assert_eq!(winners_two.len(), 2);
    assert_eq!(winners_two[0].loser_next_match.unwrap().match_id, losers_two[1]);
    assert_eq!(winners_two[1].loser_next_match.unwrap().match_id, losers_two[0]);
    assert_eq!(
        bracket.round_label(bracket.rounds_in(Section::Losers).last().unwrap()),
        "Losers Final"
    );
}
