//! Loss-recovery staking.
//!
//! Sizes the next draw bet for a team so that a win at the current odds
//! recovers the stakes lost since the team's last win plus a margin.
//! The stake resets to the base unit after any win and is not capped.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::types::Bet;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Staking parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StakingConfig {
    /// Stake used with no history, after a win, or before a streak builds.
    pub base_stake: Decimal,
    /// Multiplier on accumulated losses (1.25 = recover losses + 25%).
    pub recovery_margin: Decimal,
    /// Flat amount added on top of the recovery stake.
    pub stake_increment: Decimal,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            base_stake: dec!(1),
            recovery_margin: dec!(1.25),
            stake_increment: dec!(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Staking calculations over one team's bets.
///
/// Every method expects the team's bets ordered by creation time,
/// oldest first (see `EntityStore::team_bets`).
#[derive(Debug, Clone, Default)]
pub struct StakingEngine {
    config: StakingConfig,
}

impl StakingEngine {
    pub fn new(config: StakingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    /// Gross return of settled winning bets: Σ amount × odds.
    pub fn total_winnings(&self, bets: &[&Bet]) -> Decimal {
        bets.iter()
            .filter(|b| b.is_win())
            .map(|b| b.potential_return())
            .sum()
    }

    /// Stakes of settled bets placed after the last settled win.
    /// Pending bets are ignored; zero when the last settled bet won.
    pub fn drawdown(&self, bets: &[&Bet]) -> Decimal {
        settled_since_last_win(bets).iter().map(|b| b.amount).sum()
    }

    /// Number of settled bets after the last settled win.
    pub fn losing_streak(&self, bets: &[&Bet]) -> usize {
        settled_since_last_win(bets).len()
    }

    /// Recommended stake for the team's next bet.
    ///
    /// The most recent bet is taken to be the one currently riding, so it
    /// is left out of the losses being recovered. With usable odds the
    /// stake is `losses × margin / odds + increment`; without them it
    /// falls back to `losses × margin + increment`.
    pub fn next_stake(&self, bets: &[&Bet], current_odds: Option<Decimal>) -> Decimal {
        let base = self.config.base_stake;

        let Some(last) = bets.last() else {
            return base;
        };
        if last.is_win() {
            return base;
        }

        let since_win = match bets.iter().rposition(|b| b.is_win()) {
            Some(i) => &bets[i + 1..],
            None => bets,
        };
        let prior = &since_win[..since_win.len().saturating_sub(1)];
        if prior.is_empty() {
            return base;
        }

        let total_losses: Decimal = prior.iter().map(|b| b.amount).sum();
        let target = total_losses * self.config.recovery_margin;

        let stake = match current_odds.filter(|o| *o > Decimal::ZERO) {
            Some(odds) => target / odds + self.config.stake_increment,
            None => target + self.config.stake_increment,
        };

        debug!(
            streak = prior.len(),
            total_losses = %total_losses,
            target = %target,
            odds = ?current_odds,
            stake = %stake,
            "Recovery stake computed"
        );

        stake
    }
}

fn settled_since_last_win<'a>(bets: &[&'a Bet]) -> Vec<&'a Bet> {
    let settled: Vec<&Bet> = bets.iter().copied().filter(|b| b.is_settled()).collect();
    match settled.iter().rposition(|b| b.is_win()) {
        Some(i) => settled[i + 1..].to_vec(),
        None => settled,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
