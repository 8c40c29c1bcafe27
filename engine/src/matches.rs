//! Self-play between two configured agents under a per-move deadline
//!
//! Each move runs the mover's agent on a blocking worker that publishes into
//! an unbounded channel. The supervisor waits for the worker's fallback move,
//! sleeps out the time limit, raises the agent's stop flag, and plays the
//! most recent move it received. A mover that published nothing forfeits.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::agent::Agent;
use crate::board::{Action, Board};
use crate::config::Config;
use crate::driver::Deepening;
use crate::error::{Error, Result};
use crate::game::{GameState, Player};

/// A named agent configuration taking part in a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contender {
    pub name: String,
    pub config: Config,
}

impl Contender {
    /// Parses `<search>:<heuristic>` (heuristic optional) on top of `base`.
    pub fn parse(label: &str, base: &Config) -> Result<Self> {
        let mut config = base.clone();
        let mut parts = label.splitn(2, ':');
        if let Some(search) = parts.next() {
            config.search = search.parse()?;
        }
        if let Some(heuristic) = parts.next() {
            config.heuristic = heuristic.parse()?;
        }
        config.validate()?;
        Ok(Self {
            name: format!("{}:{}", config.search, config.heuristic),
            config,
        })
    }
}

/// Outcome of one game, seats in play order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub first: String,
    pub second: String,
    pub winner: Player,
    pub forfeit: bool,
    pub moves: Vec<Action>,
}

impl GameRecord {
    pub fn winner_name(&self) -> &str {
        self.seat(self.winner)
    }

    pub fn loser_name(&self) -> &str {
        self.seat(self.winner.opponent())
    }

    fn seat(&self, player: Player) -> &str {
        match player {
            Player::First => &self.first,
            Player::Second => &self.second,
        }
    }
}

/// Latest move seen at the deadline, and what the worker reported.
#[derive(Debug)]
pub struct Decision {
    pub action: Option<Action>,
    pub report: Deepening,
}

/// Runs one decision with a wall-clock deadline.
pub async fn timed_decision(agent: Arc<Mutex<Agent<Board>>>, board: Board, time_limit: Duration) -> Result<Decision> {
    let deadline = Instant::now() + time_limit;
    let stop = Arc::new(AtomicBool::new(false));
    let (mut tx, mut rx) = mpsc::unbounded_channel();

    let flag = Arc::clone(&stop);
    let worker = tokio::task::spawn_blocking(move || {
        let mut agent = agent.lock().unwrap_or_else(PoisonError::into_inner);
        agent.set_stop_flag(flag);
        agent.get_action(&board, &mut tx)
    });

    // the fallback is published before any search, so it is never cut off
    let mut action = rx.recv().await;
    tokio::time::sleep_until(deadline).await;
    stop.store(true, Ordering::Relaxed);

    while let Ok(candidate) = rx.try_recv() {
        action = Some(candidate);
    }
    drop(rx);

    // the depth in flight unwinds at its next node
    let report = worker.await??;
    debug!("depth {} score {:?} nodes {}", report.depth, report.score, report.nodes);
    Ok(Decision { action, report })
}

pub async fn play_game(first: &Contender, second: &Contender, time_limit: Duration) -> Result<GameRecord> {
    let agents = [
        Arc::new(Mutex::new(Agent::new(first.config.clone())?)),
        Arc::new(Mutex::new(Agent::new(second.config.clone())?)),
    ];
    let mut board = Board::new();
    let mut moves = Vec::new();

    let (winner, forfeit) = loop {
        if board.terminal_test() {
            break (board.player().opponent(), false);
        }
        let mover = board.player();
        let decision = timed_decision(Arc::clone(&agents[mover.index()]), board, time_limit).await?;
        match decision.action {
            Some(action) => {
                board = board.make_move(&action)?;
                moves.push(action);
            }
            None => {
                warn!("{} published no move within {:?} and forfeits", mover, time_limit);
                break (mover.opponent(), true);
            }
        }
    };

    Ok(GameRecord {
        first: first.name.clone(),
        second: second.name.clone(),
        winner,
        forfeit,
        moves,
    })
}

/// Win/loss history from the first contender's point of view.
#[derive(Debug, Clone)]
pub struct MatchStats {
    names: [String; 2],
    results: Vec<bool>,
}

impl MatchStats {
    pub fn new(names: [String; 2]) -> Self {
        Self { names, results: Vec::new() }
    }

    pub fn record(&mut self, contender_won: bool) {
        self.results.push(contender_won);
    }

    pub fn contender(&self) -> &str {
        &self.names[0]
    }

    pub fn games(&self) -> usize {
        self.results.len()
    }

    pub fn wins(&self) -> usize {
        self.results.iter().filter(|won| **won).count()
    }

    /// Percentage of the last `window` games won (all games for `None`).
    pub fn win_rate(&self, window: Option<usize>) -> f64 {
        let start = window.map_or(0, |w| self.results.len().saturating_sub(w));
        let recent = &self.results[start..];
        if recent.is_empty() {
            return 0.0;
        }
        100.0 * recent.iter().filter(|won| **won).count() as f64 / recent.len() as f64
    }

    pub fn summary(&self, window: usize) -> String {
        format!(
            "match_id: {:4} | last {} = {:3.0}% | all = {:3.0}% | {} vs {}",
            self.games(),
            window,
            self.win_rate(Some(window)),
            self.win_rate(None),
            self.names[0],
            self.names[1],
        )
    }
}

pub struct MatchSettings {
    pub rounds: usize,
    pub time_limit: Duration,
    /// Log a summary every this many games (0 = only at the end)
    pub frequency: usize,
}

/// Plays `rounds` games, swapping who moves first each game.
pub async fn play_match(contenders: [Contender; 2], settings: &MatchSettings) -> Result<(MatchStats, Vec<GameRecord>)> {
    let [mut a, mut b] = contenders;
    if a.name == b.name {
        a.name.push('1');
        b.name.push('2');
    }
    let mut stats = MatchStats::new([a.name.clone(), b.name.clone()]);
    let mut records = Vec::with_capacity(settings.rounds);

    for match_id in 1..=settings.rounds {
        let (first, second) = if match_id % 2 == 1 { (&a, &b) } else { (&b, &a) };
        let record = play_game(first, second, settings.time_limit).await?;
        info!("game {}: {} beats {} after {} moves", match_id, record.winner_name(), record.loser_name(), record.moves.len());
        stats.record(record.winner_name() == a.name);
        records.push(record);

        let at_frequency = settings.frequency != 0 && match_id % settings.frequency == 0;
        if at_frequency || match_id == settings.rounds {
            info!("{}", stats.summary(settings.frequency.max(1)));
        }
    }
    Ok((stats, records))
}

pub fn write_records(path: &Path, records: &[GameRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).map_err(|source| Error::Io {
        operation: format!("write records to {}", path.display()),
        source,
    })
}
