//! Reopening ledgers and the delete cascade as seen from storage.

use drawbook::ledger::Ledger;
use drawbook::storage::{JsonDirStore, MemoryStore, Snapshot, BETS_KEY};
use drawbook::storage::IntegrityViolation;
use drawbook::types::{BetDraft, GameResult};
use rust_decimal_macros::dec;
use std::path::PathBuf;

use crate::Harness;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("drawbook_it_{}", uuid::Uuid::new_v4()))
}

#[test]
fn test_json_dir_ledger_survives_reopen() {
    let dir = temp_dir();
    let mut h = Harness::with_store(JsonDirStore::open(&dir).unwrap());
    h.settled_bet(dec!(1), dec!(3.2), GameResult::NoDraw);
    h.ledger.toggle_favorite(&h.away).unwrap();
    let before = h.ledger.entities().clone();

    assert!(dir.join(format!("{BETS_KEY}.json")).exists());

    let reopened = Ledger::open(JsonDirStore::open(&dir).unwrap()).unwrap();
    assert_eq!(reopened.entities(), &before);
    assert!(reopened.entities().team(&h.away).unwrap().favorite);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_competition_delete_is_idempotent() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(1), dec!(3.0), GameResult::Draw);

    let first = h.ledger.delete_competition(&h.competition).unwrap();
    assert_eq!(first.competitions, 1);
    assert_eq!(first.teams, 2);
    assert_eq!(first.games, 1);
    assert_eq!(first.bets, 1);

    let second = h.ledger.delete_competition(&h.competition).unwrap();
    assert!(second.is_empty());
    assert!(h.ledger.entities().to_snapshot().integrity_violations().is_empty());
}

#[test]
fn test_team_delete_leaves_opponent_bets() {
    let mut h = Harness::in_memory();
    let game = h.game(Some(dec!(3.0)));
    for team in [h.home.clone(), h.away.clone()] {
        h.ledger
            .add_bet(BetDraft {
                game_id: game.id.clone(),
                team_id: team,
                amount: dec!(1),
                odds: dec!(3.0),
            })
            .unwrap();
    }

    let report = h.ledger.delete_team(&h.home).unwrap();
    assert_eq!(report.games, 1);
    assert_eq!(report.bets, 1);

    let (entities, blobs) = h.ledger.into_parts();
    assert_eq!(entities.bets().len(), 1);
    assert_eq!(entities.bets()[0].team_id, h.away);

    // The leftover bet loads fine but is flagged.
    let reopened = Ledger::open(blobs).unwrap();
    let violations = reopened.entities().to_snapshot().integrity_violations();
    assert!(matches!(
        violations.as_slice(),
        [IntegrityViolation::OrphanBet { .. }]
    ));
}

#[test]
fn test_export_import_between_ledgers() {
    let mut h = Harness::in_memory();
    h.settled_bet(dec!(1), dec!(2.8), GameResult::NoDraw);
    let json = h.ledger.entities().to_snapshot().export_json().unwrap();

    let mut other = Ledger::open(MemoryStore::new()).unwrap();
    other.replace_all(Snapshot::import_json(&json).unwrap()).unwrap();
    assert_eq!(other.entities(), h.ledger.entities());

    let (_, blobs) = other.into_parts();
    let reopened = Ledger::open(blobs).unwrap();
    assert_eq!(reopened.entities().bets().len(), 1);
}
