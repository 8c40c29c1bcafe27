use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::Config;
use crate::driver::{iterative_deepening, Deepening, MoveSink};
use crate::engine::Engine;
use crate::error::Result;
use crate::eval::Heuristic;
use crate::game::Territory;

/// A decision-maker: one search variant and one heuristic, fixed by its
/// config, plus the engine (and memo tables) it keeps for one game.
pub struct Agent<S: Territory> {
    config: Config,
    engine: Engine<S, Heuristic>,
}

impl<S: Territory> Agent<S> {
    /// Rejects an invalid config before any search can run.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let mut engine = Engine::new(config.evaluator());
        if config.cache_heuristic {
            engine = engine.with_heuristic_cache(config.heuristic_cache_limit);
        }
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Engine<S, Heuristic> {
        &self.engine
    }

    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.engine.set_stop_flag(stop);
    }

    /// Pushes progressively better moves for the side to move into `sink`.
    pub fn get_action<K: MoveSink<S::Action>>(&mut self, state: &S, sink: &mut K) -> Result<Deepening> {
        iterative_deepening(
            &mut self.engine,
            self.config.search,
            state,
            state.player(),
            self.config.max_depth,
            sink,
        )
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }
}
