//! Exact-score memo table.
//!
//! Only terminal-derived scores (`±∞`) are ever stored. A finite score is a
//! depth-limited estimate: reusing it from a different remaining depth
//! would be wrong, so [`ExactMemo::record`] drops it instead of storing it.

use std::collections::HashMap;
use std::hash::Hash;

use crate::game::{is_exact, Player, Score};

/// Scores keyed by (player, state), one table per player so lookups can
/// borrow the state.
#[derive(Debug, Clone)]
pub struct ExactMemo<S> {
    tables: [HashMap<S, Score>; 2],
}

impl<S: Eq + Hash + Clone> Default for ExactMemo<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Hash + Clone> ExactMemo<S> {
    pub fn new() -> Self {
        Self {
            tables: [HashMap::new(), HashMap::new()],
        }
    }

    pub fn get(&self, player: Player, state: &S) -> Option<Score> {
        self.tables[player.index()].get(state).copied()
    }

    /// Stores `score` if it is exact. Returns whether it was stored.
    pub fn record(&mut self, player: Player, state: &S, score: Score) -> bool {
        if !is_exact(score) {
            return false;
        }
        self.tables[player.index()].insert(state.clone(), score);
        true
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scores(&self) -> impl Iterator<Item=Score> + '_ {
        self.tables.iter().flat_map(|table| table.values().copied())
    }

    pub fn clear(&mut self) {
        for table in self.tables.iter_mut() {
            table.clear();
        }
    }
}
