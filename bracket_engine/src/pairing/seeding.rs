//! Roster validation and seed placement.

use std::collections::HashSet;

use crate::{
    bracket::entities::{Occupant, Participant},
    errors::{BracketError, BracketResult},
};

/// Check roster size and participant id uniqueness.
pub fn validate_roster(participants: &[Participant]) -> BracketResult<()> {
    if participants.len() < 2 {
        return Err(BracketError::InvalidRosterSize(participants.len()));
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(&participant.id) {
            return Err(BracketError::DuplicateParticipant(participant.id.clone()));
        }
    }

    Ok(())
}

/// Order the roster by strength.
///
/// With seeding on, every participant needs a unique seed >= 1 and the
/// roster is sorted by seed (gaps are fine). Otherwise roster order is kept.
pub fn strength_order(participants: &[Participant], seeding: bool) -> BracketResult<Vec<Participant>> {
    if !seeding {
        return Ok(participants.to_vec());
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        match participant.seed {
            None => {
                return Err(BracketError::InvalidSeeding(format!(
                    "{} has no seed",
                    participant.id
                )));
            }
            Some(0) => {
                return Err(BracketError::InvalidSeeding(format!(
                    "{} has seed 0, seeds start at 1",
                    participant.id
                )));
            }
            Some(seed) => {
                if !seen.insert(seed) {
                    return Err(BracketError::InvalidSeeding(format!(
                        "seed {seed} is used more than once"
                    )));
                }
            }
        }
    }

    let mut ordered = participants.to_vec();
    ordered.sort_by_key(|p| p.seed);
    Ok(ordered)
}

/// Standard bracket order of seed numbers for a power-of-two field, e.g.
/// `[1, 8, 4, 5, 2, 7, 3, 6]` for 8. Adjacent pairs meet in round 1 and the
/// top two seeds can only meet in the final.
pub fn bracket_positions(size: usize) -> Vec<usize> {
    let mut positions = vec![1];
    while positions.len() < size {
        let span = positions.len() * 2 + 1;
        positions = positions
            .iter()
            .flat_map(|&seed| [seed, span - seed])
            .collect();
    }
    positions
}

/// Fill a power-of-two field with the ordered entrants and byes.
///
/// Seeded fields use [`bracket_positions`], so the missing seeds (byes) face
/// the top seeds. Unseeded fields give byes to the first roster entries and
/// pair the rest in roster order. Either way no round-1 pairing holds two
/// byes.
pub fn fill_field(ordered: &[Participant], size: usize, seeding: bool) -> Vec<Occupant> {
    let occupant = |idx: usize| match ordered.get(idx) {
        Some(participant) => Occupant::Participant(participant.id.clone()),
        None => Occupant::Bye,
    };

    if seeding {
        return bracket_positions(size)
            .into_iter()
            .map(|seed| occupant(seed - 1))
            .collect();
    }

    let byes = size.saturating_sub(ordered.len());
    let mut field = Vec::with_capacity(size);
    for idx in 0..byes {
        field.push(occupant(idx));
        field.push(Occupant::Bye);
    }
    for idx in byes..ordered.len() {
        field.push(occupant(idx));
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::entities::ParticipantId;

    fn roster(n: usize) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant::new(&format!("p{i}"), &format!("Player {i}")).with_seed(i as u32))
            .collect()
    }

    #[test]
    fn test_roster_too_small() {
        assert_eq!(
            validate_roster(&roster(1)),
            Err(BracketError::InvalidRosterSize(1))
        );
        assert_eq!(
            validate_roster(&[]),
            Err(BracketError::InvalidRosterSize(0))
        );
        assert!(validate_roster(&roster(2)).is_ok());
    }

    #[test]
    fn test_duplicate_participant() {
        let mut players = roster(3);
        players[2].id = ParticipantId::new("p1");
        assert_eq!(
            validate_roster(&players),
            Err(BracketError::DuplicateParticipant(ParticipantId::new("p1")))
        );
    }

    #[test]
    fn test_strength_order_sorts_by_seed() {
        let mut players = roster(4);
        players.reverse();
        let ordered = strength_order(&players, true).unwrap();
        let seeds: Vec<_> = ordered.iter().map(|p| p.seed.unwrap()).collect();
        assert_eq!(seeds, vec![1, 2, 3, 4]);

        // Roster order is untouched without seeding
        let unseeded = strength_order(&players, false).unwrap();
        assert_eq!(unseeded[0].id, ParticipantId::new("p4"));
    }

    #[test]
    fn test_invalid_seeds() {
        let mut missing = roster(3);
        missing[1].seed = None;
        assert!(matches!(
            strength_order(&missing, true),
            Err(BracketError::InvalidSeeding(_))
        ));

        let mut duplicate = roster(3);
        duplicate[2].seed = Some(1);
        assert!(matches!(
            strength_order(&duplicate, true),
            Err(BracketError::InvalidSeeding(_))
        ));

        let mut zero = roster(2);
        zero[0].seed = Some(0);
        assert!(strength_order(&zero, true).is_err());

        // Missing seeds don't matter when seeding is off
        assert!(strength_order(&missing, false).is_ok());
    }

    #[test]
    fn test_bracket_positions() {
        assert_eq!(bracket_positions(1), vec![1]);
        assert_eq!(bracket_positions(2), vec![1, 2]);
        assert_eq!(bracket_positions(4), vec![1, 4, 2, 3]);
        assert_eq!(bracket_positions(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn test_seeded_byes_face_top_seeds() {
        let players = roster(5);
        let field = fill_field(&players, 8, true);
        // 1 v bye, 4 v 5, 2 v bye, 3 v bye
        assert_eq!(field[0], Occupant::Participant(ParticipantId::new("p1")));
        assert_eq!(field[1], Occupant::Bye);
        assert_eq!(field[4], Occupant::Participant(ParticipantId::new("p2")));
        assert_eq!(field[5], Occupant::Bye);
        assert_eq!(field[7], Occupant::Bye);
        assert_eq!(field.iter().filter(|o| o.is_bye()).count(), 3);
    }

    #[test]
    fn test_unseeded_byes_go_to_roster_head() {
        let players = roster(3);
        let field = fill_field(&players, 4, false);
        assert_eq!(
            field,
            vec![
                Occupant::Participant(ParticipantId::new("p1")),
                Occupant::Bye,
                Occupant::Participant(ParticipantId::new("p2")),
                Occupant::Participant(ParticipantId::new("p3")),
            ]
        );
    }

    #[test]
    fn test_never_two_byes_in_one_pairing() {
        for n in 2..=33 {
            let players = roster(n);
            let size = n.next_power_of_two();
            for seeding in [true, false] {
                let field = fill_field(&players, size, seeding);
                assert_eq!(field.len(), size);
                for pair in field.chunks(2) {
                    assert!(!(pair[0].is_bye() && pair[1].is_bye()), "n={n}");
                }
            }
        }
    }
}
