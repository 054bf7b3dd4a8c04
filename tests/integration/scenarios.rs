//! Staking and settlement walkthroughs on a single team.

use drawbook::report::Reporter;
use drawbook::types::{BetDraft, BetResult, GameDraft, GameResult, LedgerError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{day, Harness};

#[test]
fn test_no_bets_stakes_base_unit() {
    let h = Harness::in_memory();
    let reporter = Reporter::new(h.ledger.entities(), &h.engine);
    let advice = reporter.stake_advice(&h.home, None, day(1));
    assert_eq!(advice.next_stake, dec!(1));
    assert_eq!(advice.drawdown, Decimal::ZERO);
}

#[test]
fn test_two_losses_then_recovery_win() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(1), dec!(2.0), GameResult::NoDraw);
    let bets = h.home_bets();
    assert_eq!(h.engine.next_stake(&bets, Some(dec!(2.0))), dec!(1));
    assert_eq!(h.engine.drawdown(&bets), dec!(1));

    h.settled_bet(dec!(1), dec!(2.0), GameResult::NoDraw);
    let bets = h.home_bets();
    assert_eq!(h.engine.drawdown(&bets), dec!(2));
    assert_eq!(h.engine.losing_streak(&bets), 2);
    // Only the first loss counts: the latest bet is the one being recovered.
    assert_eq!(h.engine.next_stake(&bets, Some(dec!(2.0))), dec!(1.625));

    h.settled_bet(dec!(1.625), dec!(2.0), GameResult::Draw);
    let bets = h.home_bets();
    assert_eq!(h.engine.total_winnings(&bets), dec!(3.25));
    assert_eq!(h.engine.next_stake(&bets, Some(dec!(2.0))), dec!(1));
    assert_eq!(h.engine.drawdown(&bets), Decimal::ZERO);
}

#[test]
fn test_settlement_touches_only_the_settled_game() {
    let mut h = Harness::in_memory();
    let first = h.game(Some(dec!(3.1)));
    let second = h.game(Some(dec!(3.3)));
    for game in [&first, &second] {
        for team in [h.home.clone(), h.away.clone()] {
            h.ledger
                .add_bet(BetDraft {
                    game_id: game.id.clone(),
                    team_id: team,
                    amount: dec!(1),
                    odds: game.draw_odds.unwrap(),
                })
                .unwrap();
        }
    }

    assert_eq!(h.ledger.settle_game(&first.id, GameResult::Draw).unwrap(), 2);
    let store = h.ledger.entities();
    for bet in store.bets() {
        if bet.game_id == first.id {
            assert_eq!(bet.result, Some(BetResult::Win));
        } else {
            assert_eq!(bet.result, None);
        }
    }

    h.ledger.settle_game(&second.id, GameResult::NoDraw).unwrap();
    let store = h.ledger.entities();
    assert!(store
        .bets()
        .iter()
        .filter(|b| b.game_id == second.id)
        .all(|b| b.result == Some(BetResult::Loss)));
}

#[test]
fn test_same_team_game_rejected() {
    let mut h = Harness::in_memory();
    let err = h
        .ledger
        .add_game(
            Some(&h.competition),
            GameDraft {
                home_team_id: h.home.clone(),
                away_team_id: h.home.clone(),
                game_date: day(1),
                draw_odds: Some(dec!(3)),
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(h.ledger.entities().games(None).is_empty());
}

#[test]
fn test_drawdown_grows_then_resets() {
    let mut h = Harness::in_memory();
    let mut previous = Decimal::ZERO;
    for amount in [dec!(1), dec!(1.5), dec!(2.2), dec!(3)] {
        h.settled_bet(amount, dec!(3.0), GameResult::NoDraw);
        let drawdown = h.engine.drawdown(&h.home_bets());
        assert!(drawdown > previous);
        previous = drawdown;
    }
    assert_eq!(previous, dec!(7.7));

    h.settled_bet(dec!(4), dec!(3.0), GameResult::Draw);
    assert_eq!(h.engine.drawdown(&h.home_bets()), Decimal::ZERO);
}

#[test]
fn test_pending_bet_does_not_move_drawdown() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(1), dec!(3.0), GameResult::NoDraw);
    let game = h.game(Some(dec!(3.0)));
    h.ledger
        .add_bet(BetDraft {
            game_id: game.id,
            team_id: h.home.clone(),
            amount: dec!(5),
            odds: dec!(3.0),
        })
        .unwrap();
    assert_eq!(h.engine.drawdown(&h.home_bets()), dec!(1));
}

#[test]
fn test_resettle_flips_every_bet() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(1), dec!(2.5), GameResult::Draw);
    let game_id = h.home_bets()[0].game_id.clone();

    h.ledger.settle_game(&game_id, GameResult::NoDraw).unwrap();
    assert!(h.home_bets()[0].is_loss());
    assert_eq!(h.engine.total_winnings(&h.home_bets()), Decimal::ZERO);
}

#[test]
fn test_advice_uses_next_priced_game() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(2), dec!(2.0), GameResult::NoDraw);
    h.settled_bet(dec!(1), dec!(2.0), GameResult::NoDraw);
    h.game(None);
    h.game(Some(dec!(4.0)));

    // Played games fall on days 1 and 2; day 3 is unpriced.
    let reporter = Reporter::new(h.ledger.entities(), &h.engine);
    let advice = reporter.stake_advice(&h.home, None, day(3));
    assert_eq!(advice.odds, Some(dec!(4.0)));
    // 2 × 1.25 / 4 + 1
    assert_eq!(advice.next_stake, dec!(1.625));
}
