//! Shared types for the DRAWBOOK ledger.
//!
//! These records form the data model persisted by `storage` and mutated
//! only through `ledger`. Field names serialize in camelCase, matching
//! existing `drawBetting_*` exports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A competition (league, cup). Root of the ownership hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Competition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.country, self.id)
    }
}

/// A team, owned by exactly one competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub competition_id: String,
    pub name: String,
    #[serde(default)]
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let star = if self.favorite { "★" } else { "☆" };
        write!(f, "{star} {} [{}]", self.name, self.id)
    }
}

/// A scheduled game between two teams of the same competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub competition_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub game_date: NaiveDate,
    /// Decimal payout for a draw, if known at scheduling time
    pub draw_odds: Option<Decimal>,
    pub result: Option<GameResult>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let odds = self
            .draw_odds
            .map(|o| o.to_string())
            .unwrap_or_else(|| "not set".to_string());
        let result = self
            .result
            .map(|r| r.to_string())
            .unwrap_or_else(|| "PENDING".to_string());
        write!(
            f,
            "{} {} vs {} | draw odds {} | {} [{}]",
            self.game_date, self.home_team_id, self.away_team_id, odds, result, self.id,
        )
    }
}

impl Game {
    /// Whether `team_id` plays in this game (home or away).
    pub fn involves(&self, team_id: &str) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }
}

/// A wager that a game ends in a draw, booked against one of its teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub game_id: String,
    pub team_id: String,
    pub competition_id: String,
    pub amount: Decimal,
    pub odds: Decimal,
    /// Derived from the game's result at settlement; never set directly
    pub result: Option<BetResult>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self
            .result
            .map(|r| r.to_string())
            .unwrap_or_else(|| "PENDING".to_string());
        write!(
            f,
            "${:.2} @ {} (potential ${:.2}) {} [{}]",
            self.amount,
            self.odds,
            self.potential_return(),
            result,
            self.id,
        )
    }
}

impl Bet {
    /// Gross payout if the game is drawn: amount × odds.
    pub fn potential_return(&self) -> Decimal {
        self.amount * self.odds
    }

    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_win(&self) -> bool {
        self.result == Some(BetResult::Win)
    }

    pub fn is_loss(&self) -> bool {
        self.result == Some(BetResult::Loss)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Final outcome of a game as far as draw betting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameResult {
    Draw,
    NoDraw,
}

impl GameResult {
    /// Every bet on a game is a draw bet, whichever team it is booked
    /// against, so the game result alone decides the bet result.
    pub fn bet_result(self) -> BetResult {
        match self {
            GameResult::Draw => BetResult::Win,
            GameResult::NoDraw => BetResult::Loss,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Draw => write!(f, "DRAW"),
            GameResult::NoDraw => write!(f, "NO DRAW"),
        }
    }
}

impl std::str::FromStr for GameResult {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draw" | "d" => Ok(GameResult::Draw),
            "no-draw" | "nodraw" | "no_draw" | "n" => Ok(GameResult::NoDraw),
            _ => Err(LedgerError::Validation(format!("unknown game result: {s}"))),
        }
    }
}

/// Settled outcome of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Win,
    Loss,
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetResult::Win => write!(f, "WIN"),
            BetResult::Loss => write!(f, "LOSS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Drafts (caller input)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CompetitionDraft {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct GameDraft {
    pub home_team_id: String,
    pub away_team_id: String,
    pub game_date: NaiveDate,
    pub draw_odds: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct BetDraft {
    pub game_id: String,
    pub team_id: String,
    pub amount: Decimal,
    pub odds: Decimal,
}

impl BetDraft {
    /// Range checks performed by the entry form before a bet is booked.
    /// `EntityStore::add_bet` does not repeat them.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "bet amount must be greater than 0".into(),
            ));
        }
        if self.odds < dec!(1) {
            return Err(LedgerError::Validation("odds must be 1 or greater".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures reported by ledger operations. None of them leave a partial
/// mutation behind.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        LedgerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
