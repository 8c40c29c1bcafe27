//! The game capability surface the search consumes.
//!
//! The engine never looks inside a state. It only asks for legal actions,
//! successors, the terminal test and utility, and (for the heuristics)
//! where each player stands and which cells are reachable from there.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Search score. `±INFINITY` is an exact win or loss, anything finite is
/// a heuristic estimate.
pub type Score = f64;

pub const WIN: Score = f64::INFINITY;
pub const LOSS: Score = f64::NEG_INFINITY;

/// True when the score came from a terminal outcome.
#[inline]
pub fn is_exact(score: Score) -> bool {
    score.is_infinite()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    pub fn from_ply(ply_count: usize) -> Player {
        if ply_count % 2 == 0 { Player::First } else { Player::Second }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index() + 1)
    }
}

/// Immutable game position. Equal states must agree on actions, terminal
/// status and utility, since states double as memo keys.
pub trait GameState: Clone + Eq + Hash {
    type Action: Clone + Eq + fmt::Debug;

    /// Legal actions for the side to move, in a stable order.
    fn actions(&self) -> Vec<Self::Action>;

    /// Successor after a legal action.
    fn result(&self, action: &Self::Action) -> Self;

    fn terminal_test(&self) -> bool;

    /// `WIN`/`LOSS` for `player` on terminal states, 0 elsewhere.
    fn utility(&self, player: Player) -> Score;

    /// Side to move.
    fn player(&self) -> Player;
}

/// Positional view used by the liberty and area heuristics.
pub trait Territory: GameState {
    type Location: Copy + Eq + Hash;

    /// `None` until the player has been placed.
    fn location(&self, player: Player) -> Option<Self::Location>;

    /// Open cells one step away from `location`; every open cell for `None`.
    fn liberties(&self, location: Option<Self::Location>) -> Vec<Self::Location>;
}
