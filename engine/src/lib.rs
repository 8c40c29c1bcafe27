//! Adversarial search for two-player, zero-sum, perfect-information games.
//!
//! The search side ([`engine`], [`driver`], [`memo`]) only knows the
//! [`game::GameState`] trait. Knight's Isolation ([`board`]) is the concrete
//! game, scored by the liberty and area heuristics in [`eval`].

pub mod agent;
pub mod board;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod eval;
pub mod game;
pub mod matches;
pub mod memo;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use board::{Action, Board, Direction};
pub use config::{Config, HeuristicKind, SearchVariant};
pub use driver::{iterative_deepening, Deepening, MoveSink};
pub use engine::{Engine, SearchOutcome};
pub use error::{Error, Result};
pub use game::{GameState, Player, Score, Territory, LOSS, WIN};
