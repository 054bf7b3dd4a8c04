//! Staking strategy — loss-recovery sizing of the next draw bet.

pub mod recovery;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::Bet;
use recovery::StakingEngine;

/// Everything the staking engine knows about one team right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeAdvice {
    pub team_id: String,
    /// Odds the stake was sized against, if any were usable
    pub odds: Option<Decimal>,
    pub next_stake: Decimal,
    pub drawdown: Decimal,
    pub losing_streak: usize,
    pub total_winnings: Decimal,
}

impl StakeAdvice {
    /// Evaluate the engine over a team's bets (creation order).
    pub fn evaluate(
        engine: &StakingEngine,
        team_id: &str,
        bets: &[&Bet],
        odds: Option<Decimal>,
    ) -> Self {
        Self {
            team_id: team_id.to_string(),
            odds,
            next_stake: engine.next_stake(bets, odds),
            drawdown: engine.drawdown(bets),
            losing_streak: engine.losing_streak(bets),
            total_winnings: engine.total_winnings(bets),
        }
    }

    /// Whether the advice is just the base unit (no streak to recover).
    pub fn is_base(&self, engine: &StakingEngine) -> bool {
        self.next_stake == engine.config().base_stake
    }
}

impl std::fmt::Display for StakeAdvice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let odds = self
            .odds
            .map(|o| o.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "next=${:.2} (odds {}) | drawdown=${:.2} over {} | winnings=${:.2}",
            self.next_stake, odds, self.drawdown, self.losing_streak, self.total_winnings,
        )
    }
}
