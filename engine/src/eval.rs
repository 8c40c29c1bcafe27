//! Heuristic evaluation of non-terminal positions
//!
//! Both heuristics score a position from one player's point of view as
//! "my mobility minus the opponent's mobility":
//! - [`liberty_difference`]: cells reachable in one step
//! - [`area_difference`]: cells reachable by a breadth-first flood fill,
//!   bounded by a ply depth and an area cap
//!
//! Evaluations are pure functions of the state, so any caching layered on
//! top is an optimization only.

use std::collections::HashSet;

use crate::game::{Player, Score, Territory};

/// Scores a non-terminal state for `player`. Higher is better for `player`.
pub trait Evaluator<S> {
    fn evaluate(&self, state: &S, player: Player) -> Score;
}

/// Own liberties minus opponent liberties.
pub fn liberty_difference<S: Territory>(state: &S, player: Player) -> Score {
    let own = state.liberties(state.location(player)).len();
    let opp = state.liberties(state.location(player.opponent())).len();
    own as Score - opp as Score
}

/// Cells reached from `start` by expanding liberties for at most `depth`
/// plies, capped at `cap`. The start cell itself counts. Each cell is
/// expanded at most once.
pub fn count_area<S: Territory>(state: &S, start: Option<S::Location>, depth: usize, cap: usize) -> usize {
    let start = match start {
        Some(loc) => loc,
        // unplaced: everything open is one step away
        None => return state.liberties(None).len().min(cap),
    };

    let mut area = HashSet::from([start]);
    let mut frontier = vec![start];
    let mut depth = depth;
    while !frontier.is_empty() && area.len() < cap && depth > 0 {
        let mut next = Vec::new();
        for cell in frontier {
            for lib in state.liberties(Some(cell)) {
                if area.insert(lib) {
                    next.push(lib);
                }
            }
        }
        frontier = next;
        depth -= 1;
    }
    area.len().min(cap)
}

/// Own reachable area minus opponent reachable area.
pub fn area_difference<S: Territory>(state: &S, player: Player, depth: usize, cap: usize) -> Score {
    let own = count_area(state, state.location(player), depth, cap);
    let opp = count_area(state, state.location(player.opponent()), depth, cap);
    own as Score - opp as Score
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Liberties,
    Area { depth: usize, cap: usize },
}

impl<S: Territory> Evaluator<S> for Heuristic {
    fn evaluate(&self, state: &S, player: Player) -> Score {
        match *self {
            Heuristic::Liberties => liberty_difference(state, player),
            Heuristic::Area { depth, cap } => area_difference(state, player, depth, cap),
        }
    }
}
