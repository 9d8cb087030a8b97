//! Pairing strategies, one per competitive format.
//!
//! Each strategy lays out the initial rounds of a [`Bracket`]; dispatch on
//! the [`Format`] tag happens once, at generation time. Everything after that
//! (result processing, standings) only sees the generic bracket shape.

pub mod double_elimination;
pub mod round_robin;
pub mod seeding;
pub mod single_elimination;
pub mod swiss;

use enum_dispatch::enum_dispatch;
use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    bracket::{
        entities::Participant,
        structure::{Bracket, BracketBuilder},
    },
    config::{FormatOptions, StandingsConfig},
    errors::{BracketError, BracketResult},
};

pub use double_elimination::DoubleElimination;
pub use round_robin::RoundRobin;
pub use single_elimination::SingleElimination;
pub use swiss::Swiss;

/// Competitive format tag
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

impl Format {
    pub fn strategy(self) -> Strategy {
        match self {
            Format::SingleElimination => SingleElimination.into(),
            Format::DoubleElimination => DoubleElimination.into(),
            Format::RoundRobin => RoundRobin.into(),
            Format::Swiss => Swiss.into(),
        }
    }

    /// Whether results propagate along forward links
    pub fn is_elimination(self) -> bool {
        matches!(self, Format::SingleElimination | Format::DoubleElimination)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Format::SingleElimination => "single_elimination",
            Format::DoubleElimination => "double_elimination",
            Format::RoundRobin => "round_robin",
            Format::Swiss => "swiss",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Format {
    type Err = BracketError;

    /// Case-insensitive, accepts `_`, `-` or spaces between words
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "singleelimination" => Ok(Format::SingleElimination),
            "doubleelimination" => Ok(Format::DoubleElimination),
            "roundrobin" => Ok(Format::RoundRobin),
            "swiss" => Ok(Format::Swiss),
            _ => Err(BracketError::UnknownFormat(s.to_string())),
        }
    }
}

/// Lays out the initial rounds for one format.
#[enum_dispatch]
pub trait PairingStrategy {
    /// Add the format's rounds and matches to `builder`. `ordered` is the
    /// roster in strength order (seed order when seeding is on, roster order
    /// otherwise).
    fn layout(
        &self,
        ordered: &[Participant],
        options: &FormatOptions,
        builder: &mut BracketBuilder,
    ) -> BracketResult<()>;
}

#[enum_dispatch(PairingStrategy)]
#[derive(Clone, Copy, Debug)]
pub enum Strategy {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

/// Generate a bracket with default standings scoring.
pub fn generate(
    participants: &[Participant],
    format: Format,
    options: &FormatOptions,
) -> BracketResult<Bracket> {
    generate_with_scoring(participants, format, options, &StandingsConfig::default())
}

/// Generate a bracket from a format tag such as `"double_elimination"`.
pub fn generate_from_tag(
    participants: &[Participant],
    tag: &str,
    options: &FormatOptions,
) -> BracketResult<Bracket> {
    generate(participants, tag.parse()?, options)
}

/// Generate a bracket, validating the roster and options first.
///
/// Byes are resolved before returning, so every match that faces a bye is
/// already completed and its participant has moved on.
pub fn generate_with_scoring(
    participants: &[Participant],
    format: Format,
    options: &FormatOptions,
    scoring: &StandingsConfig,
) -> BracketResult<Bracket> {
    seeding::validate_roster(participants)?;
    options.validate(format, participants.len())?;
    let ordered = seeding::strength_order(participants, options.seeding)?;

    let mut builder = BracketBuilder::new();
    format.strategy().layout(&ordered, options, &mut builder)?;

    let mut bracket = builder.build(
        format,
        participants.to_vec(),
        options.clone(),
        scoring.clone(),
    );
    bracket.validate()?;
    if format == Format::Swiss {
        bracket.refresh_swiss_snapshot();
    }
    let resolved = bracket.settle_byes()?;

    info!(
        "Generated {format} bracket: {} participants, {} rounds, {} matches ({} resolved by bye)",
        participants.len(),
        bracket.rounds().len(),
        bracket.matches().count(),
        resolved.len()
    );

    Ok(bracket)
}
