//! Double elimination: a winners tree, a losers bracket fed by drop-downs,
//! and a grand final between the two section winners.
//!
//! With `R` winners rounds the losers bracket has `2(R - 1)` rounds. Losers
//! of winners round 1 meet each other in losers round 1. Losers of winners
//! round `k >= 2` drop into losers round `2k - 2`, in reverse order so that
//! rematches are pushed as late as possible. Odd losers rounds after the
//! first halve the field.

use super::{
    PairingStrategy, seeding,
    single_elimination::{build_tree, field_size},
};
use crate::{
    bracket::{
        entities::{MatchId, Participant, Section, SlotRef},
        structure::BracketBuilder,
    },
    config::FormatOptions,
    errors::{BracketError, BracketResult},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleElimination;

impl PairingStrategy for DoubleElimination {
    fn layout(
        &self,
        ordered: &[Participant],
        options: &FormatOptions,
        builder: &mut BracketBuilder,
    ) -> BracketResult<()> {
        let field = seeding::fill_field(ordered, field_size(ordered.len()), options.seeding);
        let winners = build_tree(builder, Section::Winners, &field)?;
        let winners_final = last_match(&winners)?;

        let losers_final = match winners.len() {
            1 => None,
            _ => Some(build_losers(builder, &winners)?),
        };

        let grand_final_round = builder.add_round(Section::GrandFinal, 1);
        let grand_final = builder.add_match(grand_final_round)?;
        builder.link_winner(winners_final, SlotRef::new(grand_final, 0))?;
        match losers_final {
            Some(losers_final) => {
                builder.link_winner(losers_final, SlotRef::new(grand_final, 1))?;
            }
            // Two entrants: the loser gets a second life straight in the final
            None => builder.link_loser(winners_final, SlotRef::new(grand_final, 1))?,
        }

        builder.grand_final = Some(grand_final);
        builder.final_match = Some(grand_final);
        Ok(())
    }
}

fn last_match(rounds: &[Vec<MatchId>]) -> BracketResult<MatchId> {
    rounds
        .last()
        .and_then(|round| round.first())
        .copied()
        .ok_or_else(|| BracketError::CyclicOrInconsistentBracket("empty bracket tree".to_string()))
}

/// Add the losers rounds and wire every winners match loser into them.
/// Returns the losers final.
fn build_losers(builder: &mut BracketBuilder, winners: &[Vec<MatchId>]) -> BracketResult<MatchId> {
    // Losers round 1: winners round 1 losers, pairwise
    let idx = builder.add_round(Section::Losers, 1);
    let mut survivors = Vec::with_capacity(winners[0].len() / 2);
    for _ in 0..winners[0].len() / 2 {
        survivors.push(builder.add_match(idx)?);
    }
    for (i, &id) in winners[0].iter().enumerate() {
        builder.link_loser(id, SlotRef::new(survivors[i / 2], i % 2))?;
    }

    let mut number = 1;
    for dropping in &winners[1..] {
        // Drop-down round: survivors in slot 0, fresh losers in slot 1
        number += 1;
        let idx = builder.add_round(Section::Losers, number);
        let mut next = Vec::with_capacity(survivors.len());
        for _ in 0..survivors.len() {
            next.push(builder.add_match(idx)?);
        }
        for (i, &id) in survivors.iter().enumerate() {
            builder.link_winner(id, SlotRef::new(next[i], 0))?;
        }
        let count = dropping.len();
        for (m, &id) in dropping.iter().enumerate() {
            let target = next.get(count - 1 - m).copied().ok_or_else(|| {
                BracketError::CyclicOrInconsistentBracket(format!(
                    "no losers match to receive the loser of match {id}"
                ))
            })?;
            builder.link_loser(id, SlotRef::new(target, 1))?;
        }
        survivors = next;

        if survivors.len() > 1 {
            // Consolidation round
            number += 1;
            let idx = builder.add_round(Section::Losers, number);
            let mut next = Vec::with_capacity(survivors.len() / 2);
            for _ in 0..survivors.len() / 2 {
                next.push(builder.add_match(idx)?);
            }
            for (i, &id) in survivors.iter().enumerate() {
                builder.link_winner(id, SlotRef::new(next[i / 2], i % 2))?;
            }
            survivors = next;
        }
    }

    survivors.first().copied().ok_or_else(|| {
        BracketError::CyclicOrInconsistentBracket("losers bracket has no final".to_string())
    })
}
