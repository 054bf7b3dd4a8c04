//! Insertion-ordered record table keyed by id.

use crate::types::{Bet, Competition, Game, Team};

/// A record with a stable, unique id.
pub trait Record {
    fn id(&self) -> &str;
}

impl Record for Competition {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Team {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Game {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Bet {
    fn id(&self) -> &str {
        &self.id
    }
}

/// In-memory collection with `get` / `upsert` / `delete_where` access.
///
/// Rows keep insertion order; the order is what breaks ties between
/// records created in the same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record> Table<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replace the row with the same id in place, or append it.
    pub fn upsert(&mut self, row: T) {
        match self.get_mut(row.id()) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    /// Remove every row matching `predicate`. Returns the number removed.
    pub fn delete_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|r| !predicate(r));
        before - self.rows.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.rows.iter_mut()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
