//! Settlement — applies a game's result to the game and its bets.

use tracing::info;

use super::store::EntityStore;
use crate::types::{GameResult, LedgerError};

impl EntityStore {
    /// Record a game's result and derive the result of every bet on it.
    ///
    /// All bets on the game are draw bets, so a draw wins every one of
    /// them whichever team they are booked against. Settling again
    /// overwrites the previous outcome. Returns the number of bets settled.
    pub fn settle_game(&mut self, game_id: &str, result: GameResult) -> Result<usize, LedgerError> {
        let game = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| LedgerError::not_found("game", game_id))?;
        let previous = game.result.replace(result);

        let bet_result = result.bet_result();
        let mut settled = 0;
        for bet in self.bets.iter_mut().filter(|b| b.game_id == game_id) {
            bet.result = Some(bet_result);
            settled += 1;
        }

        info!(
            game = game_id,
            result = %result,
            previous = ?previous,
            bets = settled,
            "Game settled"
        );
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::EntityStore;
    use crate::types::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: EntityStore,
        game: String,
        other_game: String,
        home: String,
        away: String,
    }

    fn fixture() -> Fixture {
        let mut store = EntityStore::new();
        let comp = store
            .add_competition(CompetitionDraft {
                name: "Serie A".into(),
                country: "Italy".into(),
            })
            .unwrap()
            .id;
        let home = store.add_team(Some(&comp), "Inter").unwrap().id;
        let away = store.add_team(Some(&comp), "Milan").unwrap().id;
        let mut add_game = |day| {
            store
                .add_game(
                    Some(&comp),
                    GameDraft {
                        home_team_id: home.clone(),
                        away_team_id: away.clone(),
                        game_date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
                        draw_odds: Some(dec!(3.1)),
                    },
                )
                .unwrap()
                .id
        };
        let game = add_game(1);
        let other_game = add_game(8);

        for (g, t) in [(&game, &home), (&game, &away), (&other_game, &home)] {
            store
                .add_bet(BetDraft {
                    game_id: g.clone(),
                    team_id: t.clone(),
                    amount: dec!(1),
                    odds: dec!(3.1),
                })
                .unwrap();
        }
        Fixture { store, game, other_game, home, away }
    }

    fn results_for(store: &EntityStore, game_id: &str) -> Vec<Option<BetResult>> {
        store
            .bets()
            .iter()
            .filter(|b| b.game_id == game_id)
            .map(|b| b.result)
            .collect()
    }

    #[test]
    fn test_draw_wins_bets_on_both_sides() {
        let mut f = fixture();
        let settled = f.store.settle_game(&f.game, GameResult::Draw).unwrap();
        assert_eq!(settled, 2);
        assert_eq!(f.store.game(&f.game).unwrap().result, Some(GameResult::Draw));
        assert_eq!(
            results_for(&f.store, &f.game),
            vec![Some(BetResult::Win), Some(BetResult::Win)]
        );
        // Other games untouched
        assert_eq!(results_for(&f.store, &f.other_game), vec![None]);
    }

    #[test]
    fn test_no_draw_loses_all_bets() {
        let mut f = fixture();
        f.store.settle_game(&f.game, GameResult::NoDraw).unwrap();
        assert_eq!(
            results_for(&f.store, &f.game),
            vec![Some(BetResult::Loss), Some(BetResult::Loss)]
        );
        assert!(f.store.team_bets(&f.home).iter().any(|b| b.result.is_none()));
        assert!(f.store.team_bets(&f.away).iter().all(|b| b.is_loss()));
    }

    #[test]
    fn test_resettle_overwrites() {
        let mut f = fixture();
        f.store.settle_game(&f.game, GameResult::NoDraw).unwrap();
        f.store.settle_game(&f.game, GameResult::Draw).unwrap();
        assert_eq!(f.store.game(&f.game).unwrap().result, Some(GameResult::Draw));
        assert!(results_for(&f.store, &f.game)
            .iter()
            .all(|r| *r == Some(BetResult::Win)));
    }

    #[test]
    fn test_unknown_game_is_not_found() {
        let mut f = fixture();
        let before = f.store.clone();
        let err = f.store.settle_game("deleted", GameResult::Draw).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: "game", .. }));
        assert_eq!(f.store, before);
    }

    #[test]
    fn test_game_without_bets() {
        let mut f = fixture();
        let ids: Vec<String> = f
            .store
            .bets()
            .iter()
            .filter(|b| b.game_id == f.other_game)
            .map(|b| b.id.clone())
            .collect();
        for id in &ids {
            f.store.delete_bet(id);
        }
        assert_eq!(f.store.settle_game(&f.other_game, GameResult::Draw).unwrap(), 0);
        assert_eq!(f.store.game(&f.other_game).unwrap().result, Some(GameResult::Draw));
    }
}
