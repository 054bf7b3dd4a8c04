//! Entity store — competitions, teams, games and bets with referential
//! integrity and cascading deletes.
//!
//! Every operation validates before it touches a table, so a failed call
//! leaves the store exactly as it was.

use chrono::Utc;
use deunicode::deunicode;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info};
use uuid::Uuid;

use super::table::Table;
use crate::storage::Snapshot;
use crate::types::{
    Bet, BetDraft, Competition, CompetitionDraft, Game, GameDraft, LedgerError, Team,
};

/// Rows removed by a delete, per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub competitions: usize,
    pub teams: usize,
    pub games: usize,
    pub bets: usize,
}

impl CascadeReport {
    pub fn total(&self) -> usize {
        self.competitions + self.teams + self.games + self.bets
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl std::fmt::Display for CascadeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "removed {} competitions, {} teams, {} games, {} bets",
            self.competitions, self.teams, self.games, self.bets,
        )
    }
}

/// Alphabetical name order that ignores case and diacritics (`Écija`
/// sorts with `E`). Ties fall back to the lowercased and then the raw
/// text so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> String {
    deunicode(name).to_lowercase()
}

/// Roster order: favorites first, then by name.
pub fn roster_order(a: &Team, b: &Team) -> Ordering {
    b.favorite
        .cmp(&a.favorite)
        .then_with(|| compare_names(&a.name, &b.name))
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn required(field: &str, value: &str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// In-memory collections for the four record types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    pub(super) competitions: Table<Competition>,
    pub(super) teams: Table<Team>,
    pub(super) games: Table<Game>,
    pub(super) bets: Table<Bet>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            competitions: Table::from_rows(snapshot.competitions),
            teams: Table::from_rows(snapshot.teams),
            games: Table::from_rows(snapshot.games),
            bets: Table::from_rows(snapshot.bets),
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            competitions: self.competitions.rows().to_vec(),
            teams: self.teams.rows().to_vec(),
            games: self.games.rows().to_vec(),
            bets: self.bets.rows().to_vec(),
        }
    }

    // -- Reads -------------------------------------------------------------

    pub fn competitions(&self) -> &[Competition] {
        self.competitions.rows()
    }

    pub fn competition(&self, id: &str) -> Option<&Competition> {
        self.competitions.get(id)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn game(&self, id: &str) -> Option<&Game> {
        self.games.get(id)
    }

    pub fn bet(&self, id: &str) -> Option<&Bet> {
        self.bets.get(id)
    }

    /// Teams in roster order, optionally limited to one competition.
    pub fn teams(&self, competition_id: Option<&str>) -> Vec<&Team> {
        let mut teams: Vec<&Team> = self
            .teams
            .iter()
            .filter(|t| competition_id.map_or(true, |c| t.competition_id == c))
            .collect();
        teams.sort_by(|a, b| roster_order(a, b));
        teams
    }

    /// Games in insertion order, optionally limited to one competition.
    pub fn games(&self, competition_id: Option<&str>) -> Vec<&Game> {
        self.games
            .iter()
            .filter(|g| competition_id.map_or(true, |c| g.competition_id == c))
            .collect()
    }

    /// All bets in insertion order.
    pub fn bets(&self) -> &[Bet] {
        self.bets.rows()
    }

    /// A team's bets ordered by creation time, oldest first. Bets created
    /// in the same instant keep their insertion order.
    pub fn team_bets(&self, team_id: &str) -> Vec<&Bet> {
        let mut bets: Vec<&Bet> = self.bets.iter().filter(|b| b.team_id == team_id).collect();
        bets.sort_by_key(|b| b.created_at);
        bets
    }

    /// Resolve a team name, for display.
    pub fn team_name(&self, team_id: &str) -> &str {
        self.team(team_id).map_or("Unknown Team", |t| t.name.as_str())
    }

    /// Resolve a competition name, for display.
    pub fn competition_name(&self, competition_id: &str) -> &str {
        self.competition(competition_id)
            .map_or("Unknown Competition", |c| c.name.as_str())
    }

    // -- Inserts -----------------------------------------------------------

    pub fn add_competition(&mut self, draft: CompetitionDraft) -> Result<Competition, LedgerError> {
        let competition = Competition {
            id: new_id(),
            name: required("competition name", &draft.name)?,
            country: required("country", &draft.country)?,
            created_at: Utc::now(),
        };

        self.competitions.upsert(competition.clone());
        info!(id = %competition.id, name = %competition.name, "Competition added");
        Ok(competition)
    }

    /// Add a team to the caller's selected competition.
    pub fn add_team(&mut self, selected: Option<&str>, name: &str) -> Result<Team, LedgerError> {
        let competition_id = self.selected_competition(selected)?;
        let team = Team {
            id: new_id(),
            competition_id,
            name: required("team name", name)?,
            favorite: false,
            created_at: Utc::now(),
        };

        self.teams.upsert(team.clone());
        info!(id = %team.id, name = %team.name, competition = %team.competition_id, "Team added");
        Ok(team)
    }

    /// Add several teams from a comma-separated list. Blank entries are
    /// skipped; nothing is added unless at least one name remains.
    pub fn add_teams_bulk(
        &mut self,
        selected: Option<&str>,
        names: &str,
    ) -> Result<Vec<Team>, LedgerError> {
        let competition_id = self.selected_competition(selected)?;
        let names: Vec<&str> = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(LedgerError::Validation(
                "enter at least one team name".into(),
            ));
        }

        let now = Utc::now();
        let teams: Vec<Team> = names
            .into_iter()
            .map(|name| Team {
                id: new_id(),
                competition_id: competition_id.clone(),
                name: name.to_string(),
                favorite: false,
                created_at: now,
            })
            .collect();

        for team in &teams {
            self.teams.upsert(team.clone());
        }
        info!(count = teams.len(), competition = %competition_id, "Teams added");
        Ok(teams)
    }

    /// Schedule a game in the caller's selected competition.
    pub fn add_game(&mut self, selected: Option<&str>, draft: GameDraft) -> Result<Game, LedgerError> {
        let competition_id = self.selected_competition(selected)?;
        let home = required("home team", &draft.home_team_id)?;
        let away = required("away team", &draft.away_team_id)?;

        if home == away {
            return Err(LedgerError::Validation(
                "home and away teams cannot be the same".into(),
            ));
        }
        for team_id in [&home, &away] {
            let team = self
                .teams
                .get(team_id)
                .ok_or_else(|| LedgerError::not_found("team", team_id))?;
            if team.competition_id != competition_id {
                return Err(LedgerError::Validation(format!(
                    "team {} does not play in competition {competition_id}",
                    team.name
                )));
            }
        }
        if let Some(odds) = draft.draw_odds {
            if odds < dec!(1) {
                return Err(LedgerError::Validation("draw odds must be 1 or greater".into()));
            }
        }

        let game = Game {
            id: new_id(),
            competition_id,
            home_team_id: home,
            away_team_id: away,
            game_date: draft.game_date,
            draw_odds: draft.draw_odds,
            result: None,
            created_at: Utc::now(),
        };

        self.games.upsert(game.clone());
        info!(
            id = %game.id,
            home = %self.team_name(&game.home_team_id),
            away = %self.team_name(&game.away_team_id),
            date = %game.game_date,
            odds = ?game.draw_odds,
            "Game added"
        );
        Ok(game)
    }

    /// Book a draw bet against one of a game's teams. The competition is
    /// taken from the game. Amount and odds ranges are the entry form's
    /// concern (`BetDraft::validate`).
    pub fn add_bet(&mut self, draft: BetDraft) -> Result<Bet, LedgerError> {
        let game = self
            .games
            .get(&draft.game_id)
            .ok_or_else(|| LedgerError::not_found("game", &draft.game_id))?;
        if !self.teams.contains(&draft.team_id) {
            return Err(LedgerError::not_found("team", &draft.team_id));
        }
        if !game.involves(&draft.team_id) {
            return Err(LedgerError::Validation(format!(
                "team {} does not play in game {}",
                draft.team_id, game.id
            )));
        }

        let bet = Bet {
            id: new_id(),
            game_id: game.id.clone(),
            team_id: draft.team_id,
            competition_id: game.competition_id.clone(),
            amount: draft.amount,
            odds: draft.odds,
            result: None,
            created_at: Utc::now(),
        };

        self.bets.upsert(bet.clone());
        info!(
            id = %bet.id,
            team = %self.team_name(&bet.team_id),
            amount = %bet.amount,
            odds = %bet.odds,
            "Bet placed"
        );
        Ok(bet)
    }

    // -- Updates -----------------------------------------------------------

    /// Flip a team's favorite flag. Returns the new value.
    pub fn toggle_favorite(&mut self, team_id: &str) -> Result<bool, LedgerError> {
        let team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| LedgerError::not_found("team", team_id))?;
        team.favorite = !team.favorite;
        info!(id = %team.id, name = %team.name, favorite = team.favorite, "Favorite toggled");
        Ok(team.favorite)
    }

    // -- Deletes -----------------------------------------------------------

    /// Remove a competition with all of its teams, games and bets.
    pub fn delete_competition(&mut self, competition_id: &str) -> CascadeReport {
        let report = CascadeReport {
            competitions: self.competitions.delete_where(|c| c.id == competition_id),
            teams: self.teams.delete_where(|t| t.competition_id == competition_id),
            games: self.games.delete_where(|g| g.competition_id == competition_id),
            bets: self.bets.delete_where(|b| b.competition_id == competition_id),
        };
        log_cascade("competition", competition_id, &report);
        report
    }

    /// Remove a team, the games it plays in, and the bets booked against it.
    ///
    /// Bets booked against the opponent on those games are left in place.
    pub fn delete_team(&mut self, team_id: &str) -> CascadeReport {
        let report = CascadeReport {
            competitions: 0,
            teams: self.teams.delete_where(|t| t.id == team_id),
            games: self.games.delete_where(|g| g.involves(team_id)),
            bets: self.bets.delete_where(|b| b.team_id == team_id),
        };
        log_cascade("team", team_id, &report);
        report
    }

    /// Remove a game and every bet on it.
    pub fn delete_game(&mut self, game_id: &str) -> CascadeReport {
        let report = CascadeReport {
            games: self.games.delete_where(|g| g.id == game_id),
            bets: self.bets.delete_where(|b| b.game_id == game_id),
            ..Default::default()
        };
        log_cascade("game", game_id, &report);
        report
    }

    pub fn delete_bet(&mut self, bet_id: &str) -> CascadeReport {
        let report = CascadeReport {
            bets: self.bets.delete_where(|b| b.id == bet_id),
            ..Default::default()
        };
        log_cascade("bet", bet_id, &report);
        report
    }

    // -- Helpers -----------------------------------------------------------

    fn selected_competition(&self, selected: Option<&str>) -> Result<String, LedgerError> {
        let id = selected
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| LedgerError::Precondition("select a competition first".into()))?;
        if !self.competitions.contains(id) {
            return Err(LedgerError::not_found("competition", id));
        }
        Ok(id.to_string())
    }
}

fn log_cascade(kind: &str, id: &str, report: &CascadeReport) {
    if report.is_empty() {
        debug!(kind, id, "Nothing to delete");
    } else {
        info!(
            kind,
            id,
            competitions = report.competitions,
            teams = report.teams,
            games = report.games,
            bets = report.bets,
            "Deleted"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
