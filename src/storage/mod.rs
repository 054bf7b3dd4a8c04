//! Persistence layer.
//!
//! The ledger is persisted as four named JSON blobs, one per collection,
//! loaded wholesale at startup and written back wholesale after every
//! mutation. `BlobStore` is the seam; `JsonDirStore` keeps one file per
//! blob on disk and `MemoryStore` keeps them in process.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{Bet, Competition, Game, Team};

pub const COMPETITIONS_KEY: &str = "drawBetting_competitions";
pub const TEAMS_KEY: &str = "drawBetting_teams";
pub const GAMES_KEY: &str = "drawBetting_games";
pub const BETS_KEY: &str = "drawBetting_bets";

// ---------------------------------------------------------------------------
// Blob stores
// ---------------------------------------------------------------------------

/// Key-value store holding one serialized collection per key.
#[cfg_attr(test, mockall::automock)]
pub trait BlobStore {
    /// Read a blob. `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace a blob.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per blob inside a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open (and create if needed) the data directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for JsonDirStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(path = %path.display(), "No blob on disk");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// In-process blob store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The four collections, as persisted and exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "drawBetting_competitions", default)]
    pub competitions: Vec<Competition>,
    #[serde(rename = "drawBetting_teams", default)]
    pub teams: Vec<Team>,
    #[serde(rename = "drawBetting_games", default)]
    pub games: Vec<Game>,
    #[serde(rename = "drawBetting_bets", default)]
    pub bets: Vec<Bet>,
}

impl Snapshot {
    /// Load all four collections. Missing blobs load as empty.
    pub fn load(store: &impl BlobStore) -> Result<Self> {
        let snapshot = Self {
            competitions: read_collection(store, COMPETITIONS_KEY)?,
            teams: read_collection(store, TEAMS_KEY)?,
            games: read_collection(store, GAMES_KEY)?,
            bets: read_collection(store, BETS_KEY)?,
        };
        info!(
            competitions = snapshot.competitions.len(),
            teams = snapshot.teams.len(),
            games = snapshot.games.len(),
            bets = snapshot.bets.len(),
            "Ledger loaded"
        );
        Ok(snapshot)
    }

    /// Write all four collections back.
    pub fn save(&self, store: &mut impl BlobStore) -> Result<()> {
        write_collection(store, COMPETITIONS_KEY, &self.competitions)?;
        write_collection(store, TEAMS_KEY, &self.teams)?;
        write_collection(store, GAMES_KEY, &self.games)?;
        write_collection(store, BETS_KEY, &self.bets)?;
        debug!(bets = self.bets.len(), "Ledger saved");
        Ok(())
    }

    /// Single JSON document keyed by collection name.
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialise ledger export")
    }

    pub fn import_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse ledger export")
    }

    /// References in the snapshot that break the ledger's integrity rules.
    pub fn integrity_violations(&self) -> Vec<IntegrityViolation> {
        let competitions: HashSet<&str> = self.competitions.iter().map(|c| c.id.as_str()).collect();
        let teams: HashMap<&str, &Team> = self.teams.iter().map(|t| (t.id.as_str(), t)).collect();
        let games: HashMap<&str, &Game> = self.games.iter().map(|g| (g.id.as_str(), g)).collect();
        let mut violations = Vec::new();

        for team in &self.teams {
            if !competitions.contains(team.competition_id.as_str()) {
                violations.push(IntegrityViolation::OrphanTeam {
                    team_id: team.id.clone(),
                    competition_id: team.competition_id.clone(),
                });
            }
        }

        for game in &self.games {
            if game.home_team_id == game.away_team_id {
                violations.push(IntegrityViolation::SameTeamTwice {
                    game_id: game.id.clone(),
                });
            }
            for team_id in [&game.home_team_id, &game.away_team_id] {
                let in_competition = teams
                    .get(team_id.as_str())
                    .is_some_and(|t| t.competition_id == game.competition_id);
                if !in_competition {
                    violations.push(IntegrityViolation::ForeignTeam {
                        game_id: game.id.clone(),
                        team_id: team_id.clone(),
                    });
                }
            }
        }

        for bet in &self.bets {
            let Some(game) = games.get(bet.game_id.as_str()) else {
                violations.push(IntegrityViolation::OrphanBet {
                    bet_id: bet.id.clone(),
                    game_id: bet.game_id.clone(),
                });
                continue;
            };
            if !game.involves(&bet.team_id) || bet.competition_id != game.competition_id {
                violations.push(IntegrityViolation::MismatchedBet {
                    bet_id: bet.id.clone(),
                });
            }
            if bet.result != game.result.map(|r| r.bet_result()) {
                violations.push(IntegrityViolation::UnsettledBet {
                    bet_id: bet.id.clone(),
                });
            }
        }

        violations
    }
}

fn read_collection<T>(store: &impl BlobStore, key: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    match store.read(key)? {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str(&json).with_context(|| format!("Failed to parse {key}"))
        }
        _ => Ok(Vec::new()),
    }
}

fn write_collection<T: Serialize>(store: &mut impl BlobStore, key: &str, rows: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)
        .with_context(|| format!("Failed to serialise {key}"))?;
    store.write(key, &json)
}

/// A broken reference found in a loaded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    OrphanTeam { team_id: String, competition_id: String },
    SameTeamTwice { game_id: String },
    ForeignTeam { game_id: String, team_id: String },
    OrphanBet { bet_id: String, game_id: String },
    MismatchedBet { bet_id: String },
    UnsettledBet { bet_id: String },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolation::OrphanTeam { team_id, competition_id } => {
                write!(f, "team {team_id} references missing competition {competition_id}")
            }
            IntegrityViolation::SameTeamTwice { game_id } => {
                write!(f, "game {game_id} has the same home and away team")
            }
            IntegrityViolation::ForeignTeam { game_id, team_id } => {
                write!(f, "game {game_id} references team {team_id} outside its competition")
            }
            IntegrityViolation::OrphanBet { bet_id, game_id } => {
                write!(f, "bet {bet_id} references missing game {game_id}")
            }
            IntegrityViolation::MismatchedBet { bet_id } => {
                write!(f, "bet {bet_id} team/competition does not match its game")
            }
            IntegrityViolation::UnsettledBet { bet_id } => {
                write!(f, "bet {bet_id} result does not match its game's result")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
