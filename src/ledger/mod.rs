//! Ledger — the entity store, settlement, and their persistence.
//!
//! `EntityStore` holds the records and enforces their invariants.
//! `Ledger` wraps it with a `BlobStore` and writes the whole snapshot back
//! after every successful mutation. Mutators take `&mut self`, so one
//! ledger value is one serialization point for its callers.

pub mod settlement;
pub mod store;
pub mod table;

pub use store::{compare_names, roster_order, CascadeReport, EntityStore};
pub use table::{Record, Table};

use tracing::warn;

use crate::storage::{BlobStore, Snapshot};
use crate::types::{
    Bet, BetDraft, Competition, CompetitionDraft, Game, GameDraft, GameResult, LedgerError, Team,
};

/// Persistent ledger over a blob store.
pub struct Ledger<S: BlobStore> {
    entities: EntityStore,
    blobs: S,
}

impl<S: BlobStore> Ledger<S> {
    /// Load the four collections from `blobs`. Broken references are
    /// logged but do not stop the load.
    pub fn open(blobs: S) -> Result<Self, LedgerError> {
        let snapshot = Snapshot::load(&blobs).map_err(storage_error)?;
        for violation in snapshot.integrity_violations() {
            warn!(%violation, "Integrity violation in stored ledger");
        }
        Ok(Self {
            entities: EntityStore::from_snapshot(snapshot),
            blobs,
        })
    }

    /// Read access for queries and reports.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    pub fn into_parts(self) -> (EntityStore, S) {
        (self.entities, self.blobs)
    }

    pub fn add_competition(&mut self, draft: CompetitionDraft) -> Result<Competition, LedgerError> {
        let competition = self.entities.add_competition(draft)?;
        self.commit()?;
        Ok(competition)
    }

    pub fn add_team(&mut self, selected: Option<&str>, name: &str) -> Result<Team, LedgerError> {
        let team = self.entities.add_team(selected, name)?;
        self.commit()?;
        Ok(team)
    }

    pub fn add_teams_bulk(
        &mut self,
        selected: Option<&str>,
        names: &str,
    ) -> Result<Vec<Team>, LedgerError> {
        let teams = self.entities.add_teams_bulk(selected, names)?;
        self.commit()?;
        Ok(teams)
    }

    pub fn add_game(&mut self, selected: Option<&str>, draft: GameDraft) -> Result<Game, LedgerError> {
        let game = self.entities.add_game(selected, draft)?;
        self.commit()?;
        Ok(game)
    }

    pub fn add_bet(&mut self, draft: BetDraft) -> Result<Bet, LedgerError> {
        let bet = self.entities.add_bet(draft)?;
        self.commit()?;
        Ok(bet)
    }

    pub fn toggle_favorite(&mut self, team_id: &str) -> Result<bool, LedgerError> {
        let favorite = self.entities.toggle_favorite(team_id)?;
        self.commit()?;
        Ok(favorite)
    }

    pub fn settle_game(&mut self, game_id: &str, result: GameResult) -> Result<usize, LedgerError> {
        let settled = self.entities.settle_game(game_id, result)?;
        self.commit()?;
        Ok(settled)
    }

    pub fn delete_competition(&mut self, competition_id: &str) -> Result<CascadeReport, LedgerError> {
        let report = self.entities.delete_competition(competition_id);
        self.commit_if_changed(report)
    }

    pub fn delete_team(&mut self, team_id: &str) -> Result<CascadeReport, LedgerError> {
        let report = self.entities.delete_team(team_id);
        self.commit_if_changed(report)
    }

    pub fn delete_game(&mut self, game_id: &str) -> Result<CascadeReport, LedgerError> {
        let report = self.entities.delete_game(game_id);
        self.commit_if_changed(report)
    }

    pub fn delete_bet(&mut self, bet_id: &str) -> Result<CascadeReport, LedgerError> {
        let report = self.entities.delete_bet(bet_id);
        self.commit_if_changed(report)
    }

    /// Replace every collection with `snapshot` (import).
    pub fn replace_all(&mut self, snapshot: Snapshot) -> Result<(), LedgerError> {
        for violation in snapshot.integrity_violations() {
            warn!(%violation, "Integrity violation in imported ledger");
        }
        self.entities = EntityStore::from_snapshot(snapshot);
        self.commit()
    }

    fn commit_if_changed(&mut self, report: CascadeReport) -> Result<CascadeReport, LedgerError> {
        if !report.is_empty() {
            self.commit()?;
        }
        Ok(report)
    }

    fn commit(&mut self) -> Result<(), LedgerError> {
        self.entities
            .to_snapshot()
            .save(&mut self.blobs)
            .map_err(storage_error)
    }
}

fn storage_error(err: anyhow::Error) -> LedgerError {
    LedgerError::Storage(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, MockBlobStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn draft() -> CompetitionDraft {
        CompetitionDraft {
            name: "Bundesliga".into(),
            country: "Germany".into(),
        }
    }

    #[test]
    fn test_mutations_persist() {
        let mut ledger = Ledger::open(MemoryStore::new()).unwrap();
        let comp = ledger.add_competition(draft()).unwrap();
        let home = ledger.add_team(Some(&comp.id), "Bochum").unwrap();
        let away = ledger.add_team(Some(&comp.id), "Mainz").unwrap();
        let game = ledger
            .add_game(
                Some(&comp.id),
                GameDraft {
                    home_team_id: home.id.clone(),
                    away_team_id: away.id.clone(),
                    game_date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
                    draw_odds: Some(dec!(3.4)),
                },
            )
            .unwrap();
        ledger
            .add_bet(BetDraft {
                game_id: game.id.clone(),
                team_id: home.id.clone(),
                amount: dec!(1),
                odds: dec!(3.4),
            })
            .unwrap();
        ledger.settle_game(&game.id, GameResult::NoDraw).unwrap();

        let (entities, blobs) = ledger.into_parts();
        let reopened = Ledger::open(blobs).unwrap();
        assert_eq!(reopened.entities(), &entities);
        assert!(reopened.entities().bets()[0].is_loss());
    }

    #[test]
    fn test_failed_operation_does_not_write() {
        let mut mock = MockBlobStore::new();
        mock.expect_read().returning(|_| Ok(None));
        mock.expect_write().never();

        let mut ledger = Ledger::open(mock).unwrap();
        assert!(ledger.add_team(None, "Union").is_err());
        assert!(ledger.delete_competition("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_successful_operation_writes_all_collections() {
        let mut mock = MockBlobStore::new();
        mock.expect_read().returning(|_| Ok(None));
        mock.expect_write().times(4).returning(|_, _| Ok(()));

        let mut ledger = Ledger::open(mock).unwrap();
        ledger.add_competition(draft()).unwrap();
    }

    #[test]
    fn test_write_failure_is_storage_error() {
        let mut mock = MockBlobStore::new();
        mock.expect_read().returning(|_| Ok(None));
        mock.expect_write()
            .returning(|_, _| Err(anyhow::anyhow!("read-only filesystem")));

        let mut ledger = Ledger::open(mock).unwrap();
        let err = ledger.add_competition(draft()).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_replace_all_imports_snapshot() {
        let mut source = Ledger::open(MemoryStore::new()).unwrap();
        source.add_competition(draft()).unwrap();
        let exported = source.entities().to_snapshot().export_json().unwrap();

        let mut target = Ledger::open(MemoryStore::new()).unwrap();
        target
            .replace_all(Snapshot::import_json(&exported).unwrap())
            .unwrap();
        assert_eq!(target.entities(), source.entities());
    }
}
