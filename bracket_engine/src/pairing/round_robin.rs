//! Round robin by the circle method.
//!
//! The first entrant stays put while the others rotate one position per
//! round. An odd field gets a phantom entrant; whoever is paired with it sits
//! the round out and is recorded in [`Round::byes`](crate::bracket::Round).

use super::PairingStrategy;
use crate::{
    bracket::{
        entities::{Occupant, Participant, Section},
        structure::BracketBuilder,
    },
    config::FormatOptions,
    errors::BracketResult,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct RoundRobin;

impl PairingStrategy for RoundRobin {
    fn layout(
        &self,
        ordered: &[Participant],
        _options: &FormatOptions,
        builder: &mut BracketBuilder,
    ) -> BracketResult<()> {
        let mut circle: Vec<Option<&Participant>> = ordered.iter().map(Some).collect();
        if circle.len() % 2 == 1 {
            circle.push(None);
        }
        let size = circle.len();

        for number in 1..size as u32 {
            let idx = builder.add_round(Section::Main, number);
            for i in 0..size / 2 {
                let (mut home, mut away) = (circle[i], circle[size - 1 - i]);
                // Alternate sides for the fixed entrant
                if i == 0 && number % 2 == 0 {
                    std::mem::swap(&mut home, &mut away);
                }
                match (home, away) {
                    (Some(a), Some(b)) => {
                        builder.add_pairing(
                            idx,
                            Occupant::Participant(a.id.clone()),
                            Occupant::Participant(b.id.clone()),
                        )?;
                    }
                    (Some(resting), None) | (None, Some(resting)) => {
                        builder.round_mut(idx)?.byes.push(resting.id.clone());
                    }
                    (None, None) => {}
                }
            }
            circle[1..].rotate_right(1);
        }

        Ok(())
    }
}
