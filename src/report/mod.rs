//! Read-only views over the ledger: per-team and per-competition tallies,
//! stake advice, and the ordered listings the front end renders.
//!
//! Everything is recomputed from the current collections on each call.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;

use crate::ledger::{compare_names, EntityStore};
use crate::strategy::recovery::StakingEngine;
use crate::strategy::StakeAdvice;
use crate::types::{Bet, Game, Team};

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

/// Counts and sums over a set of bets.
///
/// `staked` covers settled bets only, so `profit` is realised profit;
/// stakes still riding are reported separately as `open_stake`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BetTally {
    pub bets: usize,
    pub settled: usize,
    pub wins: usize,
    pub losses: usize,
    pub pending: usize,
    pub staked: Decimal,
    pub open_stake: Decimal,
    pub winnings: Decimal,
}

impl BetTally {
    pub fn from_bets<'a>(bets: impl IntoIterator<Item = &'a Bet>) -> Self {
        let mut tally = Self::default();
        for bet in bets {
            tally.add(bet);
        }
        tally
    }

    fn add(&mut self, bet: &Bet) {
        self.bets += 1;
        match bet.result {
            None => {
                self.pending += 1;
                self.open_stake += bet.amount;
            }
            Some(_) => {
                self.settled += 1;
                self.staked += bet.amount;
                if bet.is_win() {
                    self.wins += 1;
                    self.winnings += bet.potential_return();
                } else {
                    self.losses += 1;
                }
            }
        }
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: &BetTally) {
        self.bets += other.bets;
        self.settled += other.settled;
        self.wins += other.wins;
        self.losses += other.losses;
        self.pending += other.pending;
        self.staked += other.staked;
        self.open_stake += other.open_stake;
        self.winnings += other.winnings;
    }

    /// Winnings minus settled stakes.
    pub fn profit(&self) -> Decimal {
        self.winnings - self.staked
    }

    /// Win rate over settled bets, as a percentage. 0.0 with none settled.
    pub fn win_rate(&self) -> f64 {
        if self.settled == 0 {
            0.0
        } else {
            (self.wins as f64 / self.settled as f64) * 100.0
        }
    }
}

impl fmt::Display for BetTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bets={} (W{}/L{}/P{}) | win_rate={:.1}% | staked=${:.2} | winnings=${:.2} | profit=${:.2}",
            self.bets,
            self.wins,
            self.losses,
            self.pending,
            self.win_rate(),
            self.staked,
            self.winnings,
            self.profit(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team_id: String,
    pub name: String,
    pub favorite: bool,
    pub tally: BetTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionSummary {
    pub competition_id: String,
    pub name: String,
    pub country: String,
    pub teams: usize,
    pub games: usize,
    pub settled_games: usize,
    pub tally: BetTally,
}

impl fmt::Display for CompetitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) | teams={} games={} ({} settled) | {}",
            self.name, self.country, self.teams, self.games, self.settled_games, self.tally,
        )
    }
}

/// A team's tally together with its current stake advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamCard {
    pub summary: TeamSummary,
    pub advice: StakeAdvice,
}

impl fmt::Display for TeamCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let star = if self.summary.favorite { "★" } else { "☆" };
        let status = if self.summary.tally.profit() >= Decimal::ZERO {
            "PROFIT"
        } else {
            "LOSS"
        };
        write!(
            f,
            "{star} {} [{status}] profit=${:.2} | bets={} wins={} | {}",
            self.summary.name,
            self.summary.tally.profit(),
            self.summary.tally.bets,
            self.summary.tally.wins,
            self.advice,
        )
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Read-only queries over an entity store.
pub struct Reporter<'a> {
    store: &'a EntityStore,
    engine: &'a StakingEngine,
}

impl<'a> Reporter<'a> {
    pub fn new(store: &'a EntityStore, engine: &'a StakingEngine) -> Self {
        Self { store, engine }
    }

    pub fn team_summary(&self, team: &Team) -> TeamSummary {
        TeamSummary {
            team_id: team.id.clone(),
            name: team.name.clone(),
            favorite: team.favorite,
            tally: BetTally::from_bets(self.store.team_bets(&team.id)),
        }
    }

    pub fn competition_summary(&self, competition_id: &str) -> Option<CompetitionSummary> {
        let competition = self.store.competition(competition_id)?;
        let games = self.store.games(Some(competition_id));
        let mut tally = BetTally::default();
        for team in self.store.teams(Some(competition_id)) {
            tally.merge(&self.team_summary(team).tally);
        }

        Some(CompetitionSummary {
            competition_id: competition.id.clone(),
            name: competition.name.clone(),
            country: competition.country.clone(),
            teams: self.store.teams(Some(competition_id)).len(),
            games: games.len(),
            settled_games: games.iter().filter(|g| g.is_settled()).count(),
            tally,
        })
    }

    /// Summaries for every competition, in creation order.
    pub fn competition_summaries(&self) -> Vec<CompetitionSummary> {
        self.store
            .competitions()
            .iter()
            .filter_map(|c| self.competition_summary(&c.id))
            .collect()
    }

    /// Tally over all bets, optionally narrowed to a competition and/or team.
    pub fn overall(&self, competition_id: Option<&str>, team_id: Option<&str>) -> BetTally {
        BetTally::from_bets(self.store.bets().iter().filter(|b| {
            competition_id.map_or(true, |c| b.competition_id == c)
                && team_id.map_or(true, |t| b.team_id == t)
        }))
    }

    /// Odds to size a team's next stake against: the nearest future game
    /// with draw odds set, else the most recent game with draw odds set.
    pub fn next_odds(&self, team_id: &str, today: NaiveDate) -> Option<Decimal> {
        let priced: Vec<&Game> = self
            .store
            .games(None)
            .into_iter()
            .filter(|g| g.involves(team_id) && g.draw_odds.is_some())
            .collect();

        let upcoming = priced
            .iter()
            .filter(|g| g.game_date > today)
            .min_by_key(|g| g.game_date);
        let chosen = upcoming.or_else(|| priced.iter().min_by_key(|g| Reverse(g.game_date)));
        chosen.and_then(|g| g.draw_odds)
    }

    /// Stake advice for a team. `odds` overrides the schedule lookup.
    pub fn stake_advice(&self, team_id: &str, odds: Option<Decimal>, today: NaiveDate) -> StakeAdvice {
        let odds = odds.or_else(|| self.next_odds(team_id, today));
        let bets = self.store.team_bets(team_id);
        StakeAdvice::evaluate(self.engine, team_id, &bets, odds)
    }

    /// Cards for a competition's teams: favorites first, then most
    /// profitable, then by name.
    pub fn team_board(&self, competition_id: &str, today: NaiveDate) -> Vec<TeamCard> {
        let mut cards: Vec<TeamCard> = self
            .store
            .teams(Some(competition_id))
            .into_iter()
            .map(|team| TeamCard {
                summary: self.team_summary(team),
                advice: self.stake_advice(&team.id, None, today),
            })
            .collect();

        cards.sort_by(|a, b| {
            b.summary
                .favorite
                .cmp(&a.summary.favorite)
                .then_with(|| b.summary.tally.profit().cmp(&a.summary.tally.profit()))
                .then_with(|| compare_names(&a.summary.name, &b.summary.name))
        });
        cards
    }

    /// Games for display: pending before settled, upcoming before past,
    /// then by date.
    pub fn game_schedule(&self, competition_id: Option<&str>, today: NaiveDate) -> Vec<&'a Game> {
        let mut games = self.store.games(competition_id);
        games.sort_by(|a, b| {
            a.is_settled()
                .cmp(&b.is_settled())
                .then_with(|| (b.game_date > today).cmp(&(a.game_date > today)))
                .then_with(|| a.game_date.cmp(&b.game_date))
        });
        games
    }

    /// Bets for display: pending first, then newest game date first.
    pub fn bet_slip(&self, competition_id: Option<&str>, team_id: Option<&str>) -> Vec<&'a Bet> {
        let mut bets: Vec<&Bet> = self
            .store
            .bets()
            .iter()
            .filter(|b| {
                competition_id.map_or(true, |c| b.competition_id == c)
                    && team_id.map_or(true, |t| b.team_id == t)
            })
            .collect();

        bets.sort_by(|a, b| {
            a.is_settled()
                .cmp(&b.is_settled())
                .then_with(|| self.game_date(b).cmp(&self.game_date(a)))
        });
        bets
    }

    fn game_date(&self, bet: &Bet) -> Option<NaiveDate> {
        self.store.game(&bet.game_id).map(|g| g.game_date)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
