//! Single elimination: a binary merge tree over a power-of-two field.

use super::{PairingStrategy, seeding};
use crate::{
    bracket::{
        entities::{MatchId, Occupant, Participant, Section, SlotRef},
        structure::BracketBuilder,
    },
    config::{FormatOptions, ceil_log2},
    errors::BracketResult,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct SingleElimination;

impl PairingStrategy for SingleElimination {
    fn layout(
        &self,
        ordered: &[Participant],
        options: &FormatOptions,
        builder: &mut BracketBuilder,
    ) -> BracketResult<()> {
        let field = seeding::fill_field(ordered, field_size(ordered.len()), options.seeding);
        let tree = build_tree(builder, Section::Main, &field)?;
        builder.final_match = tree.last().and_then(|round| round.first()).copied();
        Ok(())
    }
}

/// Smallest power of two that fits `participants`
pub(crate) fn field_size(participants: usize) -> usize {
    1 << ceil_log2(participants)
}

/// Lay out a full elimination tree in `section` for `field` (a power of two
/// of occupants, adjacent entries meeting in round 1).
///
/// Match `i` of round `r` feeds slot `i % 2` of match `i / 2` of round
/// `r + 1`. Returns the match ids of every round, first round first.
pub(crate) fn build_tree(
    builder: &mut BracketBuilder,
    section: Section,
    field: &[Occupant],
) -> BracketResult<Vec<Vec<MatchId>>> {
    let mut tree: Vec<Vec<MatchId>> = Vec::new();

    let first = builder.add_round(section, 1);
    let mut current = Vec::with_capacity(field.len() / 2);
    for pair in field.chunks(2) {
        let (a, b) = match pair {
            [a, b] => (a.clone(), b.clone()),
            [a] => (a.clone(), Occupant::Bye),
            _ => continue,
        };
        current.push(builder.add_pairing(first, a, b)?);
    }

    let mut number = 1;
    while current.len() > 1 {
        number += 1;
        let idx = builder.add_round(section, number);
        let mut next = Vec::with_capacity(current.len() / 2);
        for _ in 0..current.len().div_ceil(2) {
            next.push(builder.add_match(idx)?);
        }
        for (i, &id) in current.iter().enumerate() {
            builder.link_winner(id, SlotRef::new(next[i / 2], i % 2))?;
        }
        tree.push(current);
        current = next;
    }
    tree.push(current);

    Ok(tree)
}
