//! Command-line front end.
//!
//! Argument definitions plus `execute`, which runs one parsed command
//! against a ledger and writes human-readable output. Selection context
//! (the competition or team a command applies to) is always passed as an
//! explicit flag.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::ledger::{EntityStore, Ledger};
use crate::report::Reporter;
use crate::storage::{BlobStore, Snapshot};
use crate::strategy::recovery::StakingEngine;
use crate::types::{BetDraft, CompetitionDraft, Game, GameDraft, GameResult, LedgerError};

/// Draw-betting ledger with loss-recovery staking.
#[derive(Parser, Debug)]
#[command(name = "drawbook")]
#[command(version = "0.1.0")]
#[command(about = "Track draw bets per team and size the next stake", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(short, long, default_value = "drawbook.toml")]
    pub config: PathBuf,

    /// Override the data directory from the config file
    #[arg(long, env = "DRAWBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD) when picking upcoming games
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage competitions
    Competition {
        #[command(subcommand)]
        action: CompetitionCommand,
    },

    /// Manage teams of a competition
    Team {
        #[command(subcommand)]
        action: TeamCommand,
    },

    /// Schedule, settle and remove games
    Game {
        #[command(subcommand)]
        action: GameCommand,
    },

    /// Place and remove bets
    Bet {
        #[command(subcommand)]
        action: BetCommand,
    },

    /// Show the recommended next stake for a team
    Advice {
        #[arg(long)]
        team: String,
        /// Size against these odds instead of the team's next priced game
        #[arg(long)]
        odds: Option<Decimal>,
    },

    /// Team cards for a competition, favorites first
    Board {
        #[arg(long)]
        competition: String,
    },

    /// Competition summaries and the overall tally
    Stats {
        #[arg(long)]
        competition: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },

    /// Games, pending and upcoming first
    Schedule {
        #[arg(long)]
        competition: Option<String>,
    },

    /// Bets, pending first
    Bets {
        #[arg(long)]
        competition: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },

    /// Write every collection as one JSON document
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace every collection with a previously exported document
    Import {
        path: PathBuf,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CompetitionCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        country: String,
    },
    List,
    /// Delete a competition with all of its teams, games and bets
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    Add {
        #[arg(long)]
        competition: Option<String>,
        /// Team name, or a comma-separated list with --bulk
        name: String,
        #[arg(long)]
        bulk: bool,
    },
    List {
        #[arg(long)]
        competition: Option<String>,
    },
    /// Toggle the favorite flag
    Favorite { id: String },
    /// Delete a team with its games and the bets booked against it
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GameCommand {
    Add {
        #[arg(long)]
        competition: Option<String>,
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        draw_odds: Option<Decimal>,
    },
    /// Record the result (draw | no-draw) and settle every bet on the game
    Settle { id: String, result: GameResult },
    /// Delete a game and every bet on it
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BetCommand {
    /// Place a draw bet. Amount defaults to the recommended stake, odds
    /// to the game's draw odds.
    Place {
        #[arg(long)]
        game: String,
        #[arg(long)]
        team: String,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        odds: Option<Decimal>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

/// Run one command against `ledger`.
pub fn execute<S: BlobStore>(
    ledger: &mut Ledger<S>,
    engine: &StakingEngine,
    command: Command,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Competition { action } => match action {
            CompetitionCommand::Add { name, country } => {
                let competition = ledger.add_competition(CompetitionDraft { name, country })?;
                writeln!(out, "Added {competition}")?;
            }
            CompetitionCommand::List => {
                for competition in ledger.entities().competitions() {
                    writeln!(out, "{competition}")?;
                }
            }
            CompetitionCommand::Delete { id, yes } => {
                confirm(yes, "a competition")?;
                let report = ledger.delete_competition(&id)?;
                writeln!(out, "{report}")?;
            }
        },

        Command::Team { action } => match action {
            TeamCommand::Add {
                competition,
                name,
                bulk,
            } => {
                if bulk {
                    let teams = ledger.add_teams_bulk(competition.as_deref(), &name)?;
                    for team in teams {
                        writeln!(out, "Added {team}")?;
                    }
                } else {
                    let team = ledger.add_team(competition.as_deref(), &name)?;
                    writeln!(out, "Added {team}")?;
                }
            }
            TeamCommand::List { competition } => {
                for team in ledger.entities().teams(competition.as_deref()) {
                    writeln!(out, "{team}")?;
                }
            }
            TeamCommand::Favorite { id } => {
                let favorite = ledger.toggle_favorite(&id)?;
                let name = ledger.entities().team_name(&id);
                let state = if favorite { "now" } else { "no longer" };
                writeln!(out, "{name} is {state} a favorite")?;
            }
            TeamCommand::Delete { id, yes } => {
                confirm(yes, "a team")?;
                let report = ledger.delete_team(&id)?;
                writeln!(out, "{report}")?;
            }
        },

        Command::Game { action } => match action {
            GameCommand::Add {
                competition,
                home,
                away,
                date,
                draw_odds,
            } => {
                let game = ledger.add_game(
                    competition.as_deref(),
                    GameDraft {
                        home_team_id: home,
                        away_team_id: away,
                        game_date: date,
                        draw_odds,
                    },
                )?;
                writeln!(out, "Scheduled {}", describe_game(ledger.entities(), &game))?;
            }
            GameCommand::Settle { id, result } => {
                let settled = ledger.settle_game(&id, result)?;
                writeln!(out, "Game {id} settled as {result}, {settled} bet(s) updated")?;
            }
            GameCommand::Delete { id, yes } => {
                confirm(yes, "a game")?;
                let report = ledger.delete_game(&id)?;
                writeln!(out, "{report}")?;
            }
        },

        Command::Bet { action } => match action {
            BetCommand::Place {
                game,
                team,
                amount,
                odds,
            } => {
                let draw_odds = ledger
                    .entities()
                    .game(&game)
                    .ok_or_else(|| LedgerError::not_found("game", &game))?
                    .draw_odds;
                let odds = odds.or(draw_odds).ok_or_else(|| {
                    LedgerError::Validation("no odds given and the game has no draw odds".into())
                })?;
                let amount = match amount {
                    Some(amount) => amount,
                    // Booked to the cent, like a stake typed in by hand.
                    None => Reporter::new(ledger.entities(), engine)
                        .stake_advice(&team, Some(odds), today)
                        .next_stake
                        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                };

                let draft = BetDraft {
                    game_id: game,
                    team_id: team,
                    amount,
                    odds,
                };
                draft.validate()?;
                let bet = ledger.add_bet(draft)?;
                writeln!(out, "Placed {bet}")?;
            }
            BetCommand::Delete { id, yes } => {
                confirm(yes, "a bet")?;
                let report = ledger.delete_bet(&id)?;
                writeln!(out, "{report}")?;
            }
        },

        Command::Advice { team, odds } => {
            let store = ledger.entities();
            let team_rec = store
                .team(&team)
                .ok_or_else(|| LedgerError::not_found("team", &team))?;
            let advice = Reporter::new(store, engine).stake_advice(&team, odds, today);
            writeln!(out, "{}: {advice}", team_rec.name)?;
        }

        Command::Board { competition } => {
            let store = ledger.entities();
            let name = store
                .competition(&competition)
                .ok_or_else(|| LedgerError::not_found("competition", &competition))?
                .name
                .clone();
            writeln!(out, "{name}")?;
            for card in Reporter::new(store, engine).team_board(&competition, today) {
                writeln!(out, "  {card}")?;
            }
        }

        Command::Stats { competition, team } => {
            let reporter = Reporter::new(ledger.entities(), engine);
            let summaries: Vec<_> = match competition.as_deref() {
                Some(id) => reporter.competition_summary(id).into_iter().collect(),
                None => reporter.competition_summaries(),
            };
            for summary in summaries {
                writeln!(out, "{summary}")?;
            }
            let overall = reporter.overall(competition.as_deref(), team.as_deref());
            writeln!(out, "Overall: {overall}")?;
        }

        Command::Schedule { competition } => {
            let store = ledger.entities();
            for game in Reporter::new(store, engine).game_schedule(competition.as_deref(), today) {
                writeln!(out, "{}", describe_game(store, game))?;
            }
        }

        Command::Bets { competition, team } => {
            let store = ledger.entities();
            for bet in Reporter::new(store, engine).bet_slip(competition.as_deref(), team.as_deref())
            {
                writeln!(
                    out,
                    "{} | {} | {bet}",
                    store.competition_name(&bet.competition_id),
                    store.team_name(&bet.team_id),
                )?;
            }
        }

        Command::Export { output } => {
            let json = ledger.entities().to_snapshot().export_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("Failed to write export: {}", path.display()))?;
                    info!(path = %path.display(), "Ledger exported");
                    writeln!(out, "Exported to {}", path.display())?;
                }
                None => writeln!(out, "{json}")?,
            }
        }

        Command::Import { path, yes } => {
            confirm(yes, "the current ledger")?;
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read import: {}", path.display()))?;
            let snapshot = Snapshot::import_json(&json)?;
            ledger.replace_all(snapshot)?;
            info!(path = %path.display(), "Ledger imported");
            writeln!(out, "Imported {}", path.display())?;
        }
    }

    Ok(())
}

fn confirm(yes: bool, what: &str) -> Result<(), LedgerError> {
    if yes {
        Ok(())
    } else {
        Err(LedgerError::Precondition(format!(
            "deleting {what} cannot be undone, pass --yes to confirm"
        )))
    }
}

fn describe_game(store: &EntityStore, game: &Game) -> String {
    let odds = game
        .draw_odds
        .map(|o| o.to_string())
        .unwrap_or_else(|| "-".to_string());
    let result = game
        .result
        .map(|r| r.to_string())
        .unwrap_or_else(|| "PENDING".to_string());
    format!(
        "{} {} vs {} | draw odds {odds} | {result} [{}]",
        game.game_date,
        store.team_name(&game.home_team_id),
        store.team_name(&game.away_team_id),
        game.id,
    )
}
