//! Iterative deepening over a move sink
//!
//! The driver searches at depth 1, 2, 3, ... and pushes each completed
//! depth's best action into a [`MoveSink`] the moment it is known. Before the
//! first search it publishes an arbitrary legal action, so whoever reads the
//! sink always has a playable move no matter when it stops listening.
//!
//! The driver has no notion of time. It stops when it reaches the maximum
//! depth, when a depth proves a win or loss, when the sink is closed, or when
//! the engine's stop flag interrupts a depth (that depth's work is dropped).

use log::debug;
use std::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::SearchVariant;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::game::{is_exact, GameState, Player, Score};

/// Append-only destination for successive best moves.
pub trait MoveSink<A> {
    /// Fails with [`Error::SinkClosed`] once nobody is listening.
    fn put(&mut self, action: A) -> Result<()>;
}

impl<A> MoveSink<A> for Vec<A> {
    fn put(&mut self, action: A) -> Result<()> {
        self.push(action);
        Ok(())
    }
}

impl<A> MoveSink<A> for UnboundedSender<A> {
    fn put(&mut self, action: A) -> Result<()> {
        self.send(action).map_err(|_| Error::SinkClosed)
    }
}

impl<A> MoveSink<A> for mpsc::Sender<A> {
    fn put(&mut self, action: A) -> Result<()> {
        self.send(action).map_err(|_| Error::SinkClosed)
    }
}

/// What one decision achieved before it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Deepening {
    /// Deepest fully searched depth; 0 if only the fallback was published
    pub depth: usize,
    /// Root score at that depth
    pub score: Option<Score>,
    pub nodes: u64,
}

pub fn iterative_deepening<S, E, K>(
    engine: &mut Engine<S, E>,
    variant: SearchVariant,
    state: &S,
    player: Player,
    max_depth: usize,
    sink: &mut K,
) -> Result<Deepening>
where
    S: GameState,
    E: Evaluator<S>,
    K: MoveSink<S::Action>,
{
    let fallback = state.actions().into_iter().next().ok_or(Error::NoLegalMoves)?;
    let start_nodes = engine.nodes();
    let mut report = Deepening { depth: 0, score: None, nodes: 0 };

    if sink.put(fallback).is_ok() {
        for depth in 1..=max_depth {
            let outcome = match engine.search(variant, state, player, depth) {
                Ok(outcome) => outcome,
                Err(Error::Interrupted) => {
                    debug!("interrupted during depth {}", depth);
                    break;
                }
                Err(e) => return Err(e),
            };
            report.depth = depth;
            report.score = Some(outcome.score);
            debug!("depth {} {:?} score {} nodes {}", depth, outcome.action, outcome.score, engine.nodes() - start_nodes);

            if sink.put(outcome.action).is_err() {
                break;
            }
            // a proven result cannot change with more depth
            if is_exact(outcome.score) {
                break;
            }
        }
    }

    report.nodes = engine.nodes() - start_nodes;
    Ok(report)
}
