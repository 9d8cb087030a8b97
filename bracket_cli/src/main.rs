//! File-based command line front end for the bracket engine.
//!
//! Brackets live on disk as JSON snapshots; every mutating command loads the
//! snapshot, applies one operation and writes it back.

mod config;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Error, anyhow, bail};
use bracket_engine::{
    Bracket, Format, MatchId, MatchState, Participant, ParticipantId, StandingsConfig,
    compute_standings, generate_with_scoring,
};
use config::{CliConfig, Overrides};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Generate and run tournament brackets stored as JSON files

USAGE:
  bracket_cli <COMMAND> [OPTIONS]

COMMANDS:
  generate     Build a bracket from a roster file
  start        Mark a match as in progress
  report       Report a match result and propagate it
  next-round   Pair the next Swiss round
  standings    Print the standings table
  show         Print every round and match

OPTIONS:
  --bracket      PATH    Bracket snapshot file              [default: bracket.json]
  --roster       PATH    Roster file (generate only), a JSON array of
                         {\"id\", \"name\", \"seed\"?} entries
  --format       TAG     single_elimination, double_elimination,
                         round_robin or swiss                [generate only]
  --match        ID      Match to start or report
  --scores       A-B     Reported scores, e.g. 2-1
  --rounds       N       Swiss round count                   [default: env BRACKET_SWISS_ROUNDS or ceil(log2 N)]
  --shuffle-seed N       Seed for the Swiss round-1 shuffle
  --win-points   N       Points per win                      [default: env BRACKET_WIN_POINTS or 1]
  --bye-points   N       Points per bye                      [default: env BRACKET_BYE_POINTS or win points]

FLAGS:
  --seeded               Place participants by seed          [default: env BRACKET_SEEDING or off]
  --unseeded             Keep roster order
  --no-reset             Skip the double elimination bracket reset
  -h, --help             Print help information

ENVIRONMENT:
  RUST_LOG               Log level (e.g., info, debug)
  (A .env file in the working directory is loaded if present)
";

enum Command {
    Generate { roster: PathBuf, format: String },
    Start { match_id: MatchId },
    Report { match_id: MatchId, scores: [i64; 2] },
    NextRound,
    Standings,
    Show,
}

struct Args {
    command: Command,
    bracket: PathBuf,
    overrides: Overrides,
    scoring_given: bool,
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    env_logger::builder().format_target(false).init();

    let args = parse_args(&mut pargs)?;
    let leftover = pargs.finish();
    if !leftover.is_empty() {
        bail!("unexpected arguments: {leftover:?}");
    }

    let config = CliConfig::from_env(args.overrides)?;
    run(args.command, &args.bracket, &config, args.scoring_given)
}

fn parse_args(pargs: &mut Arguments) -> Result<Args, Error> {
    let name = pargs
        .subcommand()?
        .ok_or_else(|| anyhow!("missing command, see --help"))?;

    let command = match name.as_str() {
        "generate" => Command::Generate {
            roster: pargs.value_from_str("--roster")?,
            format: pargs.value_from_str("--format")?,
        },
        "start" => Command::Start {
            match_id: pargs.value_from_str("--match")?,
        },
        "report" => Command::Report {
            match_id: pargs.value_from_str("--match")?,
            scores: pargs.value_from_fn("--scores", parse_scores)?,
        },
        "next-round" => Command::NextRound,
        "standings" => Command::Standings,
        "show" => Command::Show,
        other => bail!("unknown command {other:?}, see --help"),
    };

    let seeding = match (pargs.contains("--seeded"), pargs.contains("--unseeded")) {
        (true, true) => bail!("--seeded and --unseeded are mutually exclusive"),
        (true, false) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let overrides = Overrides {
        seeding,
        bracket_reset: pargs.contains("--no-reset").then_some(false),
        swiss_rounds: pargs.opt_value_from_str("--rounds")?,
        shuffle_seed: pargs.opt_value_from_str("--shuffle-seed")?,
        win_points: pargs.opt_value_from_str("--win-points")?,
        bye_points: pargs.opt_value_from_str("--bye-points")?,
    };
    let scoring_given = overrides.win_points.is_some() || overrides.bye_points.is_some();

    Ok(Args {
        command,
        bracket: pargs
            .opt_value_from_str("--bracket")?
            .unwrap_or_else(|| PathBuf::from("bracket.json")),
        overrides,
        scoring_given,
    })
}

/// Parse `A-B` or `A:B`
fn parse_scores(s: &str) -> Result<[i64; 2], String> {
    let (a, b) = s
        .split_once(['-', ':'])
        .ok_or_else(|| format!("expected scores like 2-1, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<i64>()
            .map_err(|e| format!("bad score {v:?}: {e}"))
    };
    Ok([parse(a)?, parse(b)?])
}

fn run(
    command: Command,
    path: &Path,
    config: &CliConfig,
    scoring_given: bool,
) -> Result<(), Error> {
    match command {
        Command::Generate { roster, format } => {
            let json = fs::read_to_string(&roster)
                .with_context(|| format!("reading roster {}", roster.display()))?;
            let participants: Vec<Participant> =
                serde_json::from_str(&json).context("parsing roster")?;
            let format: Format = format.parse()?;
            let bracket =
                generate_with_scoring(&participants, format, &config.options, &config.standings)?;
            save(&bracket, path)?;
            println!(
                "Generated {} bracket for {} participants: {} rounds, {} matches",
                bracket.format(),
                participants.len(),
                bracket.rounds().len(),
                bracket.playable_matches().count()
            );
        }

        Command::Start { match_id } => {
            let mut bracket = load(path)?;
            if bracket.start_match(match_id)? {
                save(&bracket, path)?;
                println!("Match {match_id} started");
            } else {
                println!("Match {match_id} was already in progress");
            }
        }

        Command::Report { match_id, scores } => {
            let mut bracket = load(path)?;
            let update = bracket.report_result(match_id, scores)?;
            save(&bracket, path)?;
            println!("Match {match_id} reported {}-{}", scores[0], scores[1]);
            for id in update.completed.iter().filter(|&&id| id != match_id) {
                println!("  match {id} completed by bye");
            }
            for m in update.changed.iter().filter(|m| m.state != MatchState::Completed) {
                println!(
                    "  match {}: {} vs {}",
                    m.id, m.slots[0].occupant, m.slots[1].occupant
                );
            }
            if let Some(champion) = update.champion {
                println!("Champion: {}", display_name(&bracket, &champion));
            }
        }

        Command::NextRound => {
            let mut bracket = load(path)?;
            let ids = bracket.pair_next_round()?;
            save(&bracket, path)?;
            println!("Paired round {}", bracket.rounds().len());
            for id in ids {
                if let Some(m) = bracket.get_match(id) {
                    println!(
                        "  match {id}: {} vs {}",
                        m.slots[0].occupant, m.slots[1].occupant
                    );
                }
            }
        }

        Command::Standings => {
            let bracket = load(path)?;
            let scoring: StandingsConfig = if scoring_given {
                config.standings.clone()
            } else {
                bracket.scoring().clone()
            };
            println!(
                "{:>4}  {:<24} {:>4} {:>4} {:>4} {:>6} {:>5}",
                "Rank", "Participant", "W", "L", "Bye", "Pts", "SoS"
            );
            for row in compute_standings(&bracket, &scoring) {
                println!(
                    "{:>4}  {:<24} {:>4} {:>4} {:>4} {:>6} {:>5}",
                    row.rank,
                    row.name,
                    row.wins,
                    row.losses,
                    row.byes,
                    row.points,
                    row.strength_of_schedule
                );
            }
        }

        Command::Show => {
            let bracket = load(path)?;
            for round in bracket.rounds() {
                println!(
                    "{} [{:?}]",
                    bracket.round_label(round),
                    bracket.round_status(round)
                );
                for m in bracket.round_matches(round) {
                    let score = if m.is_completed() && !m.is_bye_match() {
                        format!("{}-{}", m.slots[0].score, m.slots[1].score)
                    } else {
                        String::new()
                    };
                    println!(
                        "  #{:<4} {:<20} vs {:<20} {:<6} {}",
                        m.id,
                        m.slots[0].occupant.to_string(),
                        m.slots[1].occupant.to_string(),
                        score,
                        m.state
                    );
                }
                if !round.byes.is_empty() {
                    let resting: Vec<_> = round.byes.iter().map(|id| id.as_str()).collect();
                    println!("  sitting out: {}", resting.join(", "));
                }
            }
            if let Some(champion) = bracket.champion() {
                println!("Champion: {}", display_name(&bracket, champion));
            }
        }
    }

    Ok(())
}

fn display_name(bracket: &Bracket, id: &ParticipantId) -> String {
    bracket
        .participant(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn load(path: &Path) -> Result<Bracket, Error> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading bracket {}", path.display()))?;
    let bracket = Bracket::from_json(&json)?;
    info!("Loaded {} bracket from {}", bracket.format(), path.display());
    Ok(bracket)
}

fn save(bracket: &Bracket, path: &Path) -> Result<(), Error> {
    fs::write(path, bracket.to_json()?)
        .with_context(|| format!("writing bracket {}", path.display()))?;
    info!("Saved bracket to {}", path.display());
    Ok(())
}
