//! End-to-end tests driven through the public ledger API.

mod persistence;
mod scenarios;

use chrono::NaiveDate;
use drawbook::ledger::Ledger;
use drawbook::storage::{BlobStore, MemoryStore};
use drawbook::strategy::recovery::{StakingConfig, StakingEngine};
use drawbook::types::{BetDraft, CompetitionDraft, Game, GameDraft, GameResult};
use rust_decimal::Decimal;

pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, n).unwrap()
}

/// A competition with two teams, ready for games and bets.
pub struct Harness<S: BlobStore> {
    pub ledger: Ledger<S>,
    pub engine: StakingEngine,
    pub competition: String,
    pub home: String,
    pub away: String,
    next_day: u32,
}

impl Harness<MemoryStore> {
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl<S: BlobStore> Harness<S> {
    pub fn with_store(store: S) -> Self {
        let mut ledger = Ledger::open(store).unwrap();
        let competition = ledger
            .add_competition(CompetitionDraft {
                name: "Ligue 1".into(),
                country: "France".into(),
            })
            .unwrap()
            .id;
        let home = ledger.add_team(Some(&competition), "Nantes").unwrap().id;
        let away = ledger.add_team(Some(&competition), "Angers").unwrap().id;
        Self {
            ledger,
            engine: StakingEngine::new(StakingConfig::default()),
            competition,
            home,
            away,
            next_day: 1,
        }
    }

    /// Schedule a game between the two teams on the next free day of
    /// February.
    pub fn game(&mut self, draw_odds: Option<Decimal>) -> Game {
        let date = day(self.next_day);
        self.next_day += 1;
        self.ledger
            .add_game(
                Some(&self.competition),
                GameDraft {
                    home_team_id: self.home.clone(),
                    away_team_id: self.away.clone(),
                    game_date: date,
                    draw_odds,
                },
            )
            .unwrap()
    }

    /// Bet on a fresh game for the home team and settle it.
    pub fn settled_bet(&mut self, amount: Decimal, odds: Decimal, result: GameResult) {
        let game = self.game(Some(odds));
        self.ledger
            .add_bet(BetDraft {
                game_id: game.id.clone(),
                team_id: self.home.clone(),
                amount,
                odds,
            })
            .unwrap();
        self.ledger.settle_game(&game.id, result).unwrap();
    }

    pub fn home_bets(&self) -> Vec<&drawbook::types::Bet> {
        self.ledger.entities().team_bets(&self.home)
    }
}
