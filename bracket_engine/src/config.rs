//! Format options and scoring configuration.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{BracketError, BracketResult},
    pairing::Format,
};

/// Default points for a win
pub const DEFAULT_WIN_POINTS: i64 = 1;

/// Format-specific generation options
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FormatOptions {
    /// Use seed ranks to place participants instead of roster order
    pub seeding: bool,
    /// Number of Swiss rounds, defaults to ceil(log2(N))
    pub swiss_rounds: Option<u32>,
    /// Play a second grand final when the losers-bracket finalist wins the
    /// first one (double elimination)
    pub bracket_reset: bool,
    /// Seed for the Swiss round-1 shuffle, random when absent
    pub shuffle_seed: Option<u64>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            seeding: false,
            swiss_rounds: None,
            bracket_reset: true,
            shuffle_seed: None,
        }
    }
}

impl FormatOptions {
    pub fn seeded() -> Self {
        Self {
            seeding: true,
            ..Self::default()
        }
    }

    pub fn with_swiss_rounds(mut self, rounds: u32) -> Self {
        self.swiss_rounds = Some(rounds);
        self
    }

    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn without_reset(mut self) -> Self {
        self.bracket_reset = false;
        self
    }

    /// Swiss round count for a roster of `participants`
    pub fn swiss_round_count(&self, participants: usize) -> u32 {
        self.swiss_rounds
            .unwrap_or_else(|| ceil_log2(participants).max(1))
    }

    /// Validate options against the format and roster size
    pub fn validate(&self, format: Format, participants: usize) -> BracketResult<()> {
        if format == Format::Swiss {
            let rounds = self.swiss_round_count(participants);
            // An odd roster can play one extra round thanks to the rotating bye
            let max = if participants % 2 == 0 {
                participants.saturating_sub(1)
            } else {
                participants
            };
            if rounds == 0 || rounds as usize > max {
                return Err(BracketError::InvalidOptions(format!(
                    "swiss rounds must be between 1 and {max}, got {rounds}"
                )));
            }
        }
        Ok(())
    }
}

/// Points awarded when deriving standings
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StandingsConfig {
    /// Points per win
    pub win_points: i64,
    /// Points per bye
    pub bye_points: i64,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            win_points: DEFAULT_WIN_POINTS,
            bye_points: DEFAULT_WIN_POINTS,
        }
    }
}

impl StandingsConfig {
    pub fn new(win_points: i64, bye_points: i64) -> Self {
        Self {
            win_points,
            bye_points,
        }
    }
}

/// Everything needed to run one tournament's bracket
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TournamentConfig {
    pub name: String,
    pub format: Format,
    pub options: FormatOptions,
    pub standings: StandingsConfig,
    /// Pair the next Swiss round as soon as the current one completes
    pub auto_advance_rounds: bool,
}

impl TournamentConfig {
    pub fn new(name: &str, format: Format) -> Self {
        Self {
            name: name.to_string(),
            format,
            options: FormatOptions::default(),
            standings: StandingsConfig::default(),
            auto_advance_rounds: true,
        }
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_standings(mut self, standings: StandingsConfig) -> Self {
        self.standings = standings;
        self
    }
}

/// ceil(log2(n)) for n >= 1
pub(crate) fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
