//! Depth-limited adversarial search
//!
//! Two tree walkers share one shape: a root step that scores every legal
//! action with the opponent's value function and keeps the best, and a pair
//! of mutually recursive value functions that bottom out at terminal states
//! (exact utility) or at depth zero (heuristic estimate).
//!
//! - Minimax expands every child.
//! - Alpha-beta threads an `(alpha, beta)` window and stops enumerating once
//!   a node cannot affect its parent. It also memoizes exact (`±∞`) scores in
//!   two [`ExactMemo`] tables, one per value function.
//!
//! Every node checks a shared stop flag and unwinds with
//! [`Error::Interrupted`] once it is raised, so a supervisor can abandon the
//! depth in flight. The engine never reads a clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SearchVariant;
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::game::{GameState, Player, Score, LOSS, WIN};
use crate::memo::ExactMemo;

/// Best root action at one depth and the score that selected it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<A> {
    pub action: A,
    pub score: Score,
}

/// Heuristic values keyed by (player, state). Cleared wholesale when full.
struct EvalCache<S> {
    tables: [HashMap<S, Score>; 2],
    limit: usize,
}

impl<S: GameState> EvalCache<S> {
    fn new(limit: usize) -> Self {
        Self {
            tables: [HashMap::new(), HashMap::new()],
            limit,
        }
    }

    fn evaluate<E: Evaluator<S>>(&mut self, evaluator: &E, state: &S, player: Player) -> Score {
        let table = &mut self.tables[player.index()];
        if let Some(&score) = table.get(state) {
            return score;
        }
        if table.len() >= self.limit {
            table.clear();
        }
        let score = evaluator.evaluate(state, player);
        table.insert(state.clone(), score);
        score
    }

    fn clear(&mut self) {
        for table in self.tables.iter_mut() {
            table.clear();
        }
    }
}

pub struct Engine<S: GameState, E> {
    evaluator: E,
    min_memo: ExactMemo<S>,
    max_memo: ExactMemo<S>,
    eval_cache: Option<EvalCache<S>>,
    stop: Arc<AtomicBool>,
    nodes: u64,
}

impl<S: GameState, E: Evaluator<S>> Engine<S, E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            min_memo: ExactMemo::new(),
            max_memo: ExactMemo::new(),
            eval_cache: None,
            stop: Arc::new(AtomicBool::new(false)),
            nodes: 0,
        }
    }

    /// Caches heuristic values, holding at most `limit` states per player.
    pub fn with_heuristic_cache(mut self, limit: usize) -> Self {
        self.eval_cache = Some(EvalCache::new(limit));
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Replaces the stop flag, typically with a fresh one per decision.
    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.stop = stop;
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn min_memo(&self) -> &ExactMemo<S> {
        &self.min_memo
    }

    pub fn max_memo(&self) -> &ExactMemo<S> {
        &self.max_memo
    }

    /// Forgets everything learned so far (between games).
    pub fn clear(&mut self) {
        self.min_memo.clear();
        self.max_memo.clear();
        if let Some(cache) = self.eval_cache.as_mut() {
            cache.clear();
        }
        self.nodes = 0;
    }

    pub fn search(
        &mut self,
        variant: SearchVariant,
        state: &S,
        player: Player,
        depth: usize,
    ) -> Result<SearchOutcome<S::Action>> {
        match variant {
            SearchVariant::Minimax => self.minimax(state, player, depth),
            SearchVariant::AlphaBeta => self.alphabeta(state, player, depth),
        }
    }

    pub fn minimax(&mut self, state: &S, player: Player, depth: usize) -> Result<SearchOutcome<S::Action>> {
        self.best_root_action(state, depth, |engine, child, depth| {
            engine.minimax_min_value(child, player, depth)
        })
    }

    /// Every root child gets the full window, so root scores match minimax.
    pub fn alphabeta(&mut self, state: &S, player: Player, depth: usize) -> Result<SearchOutcome<S::Action>> {
        self.best_root_action(state, depth, |engine, child, depth| {
            engine.alphabeta_min_value(child, player, depth, LOSS, WIN)
        })
    }

    /// Scores each root action with `value` and keeps the first maximum.
    fn best_root_action<F>(&mut self, state: &S, depth: usize, mut value: F) -> Result<SearchOutcome<S::Action>>
    where
        F: FnMut(&mut Self, &S, usize) -> Result<Score>,
    {
        let mut best: Option<SearchOutcome<S::Action>> = None;
        for action in state.actions() {
            let child = state.result(&action);
            let score = value(self, &child, depth.saturating_sub(1))?;
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SearchOutcome { action, score });
            }
        }
        best.ok_or(Error::NoLegalMoves)
    }

    fn checkpoint(&mut self) -> Result<()> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(Error::Interrupted);
        }
        self.nodes += 1;
        Ok(())
    }

    fn heuristic(&mut self, state: &S, player: Player) -> Score {
        let evaluator = &self.evaluator;
        match self.eval_cache.as_mut() {
            Some(cache) => cache.evaluate(evaluator, state, player),
            None => evaluator.evaluate(state, player),
        }
    }

    // Terminal and depth-limit cases shared by both walkers.
    fn leaf(&mut self, state: &S, player: Player, depth: usize) -> Option<Score> {
        if state.terminal_test() {
            return Some(state.utility(player));
        }
        if depth == 0 {
            return Some(self.heuristic(state, player));
        }
        None
    }

    pub fn minimax_min_value(&mut self, state: &S, player: Player, depth: usize) -> Result<Score> {
        self.checkpoint()?;
        if let Some(score) = self.leaf(state, player, depth) {
            return Ok(score);
        }
        let actions = state.actions();
        // unreachable in a well-formed game: no actions means terminal
        if actions.is_empty() {
            return Ok(LOSS);
        }
        let mut score = WIN;
        for action in actions {
            let child = state.result(&action);
            score = score.min(self.minimax_max_value(&child, player, depth - 1)?);
        }
        Ok(score)
    }

    pub fn minimax_max_value(&mut self, state: &S, player: Player, depth: usize) -> Result<Score> {
        self.checkpoint()?;
        if let Some(score) = self.leaf(state, player, depth) {
            return Ok(score);
        }
        let actions = state.actions();
        if actions.is_empty() {
            return Ok(WIN);
        }
        let mut score = LOSS;
        for action in actions {
            let child = state.result(&action);
            score = score.max(self.minimax_min_value(&child, player, depth - 1)?);
        }
        Ok(score)
    }

    pub fn alphabeta_min_value(
        &mut self,
        state: &S,
        player: Player,
        depth: usize,
        alpha: Score,
        beta: Score,
    ) -> Result<Score> {
        if let Some(score) = self.min_memo.get(player, state) {
            return Ok(score);
        }
        let score = self.alphabeta_min_search(state, player, depth, alpha, beta)?;
        self.min_memo.record(player, state, score);
        Ok(score)
    }

    pub fn alphabeta_max_value(
        &mut self,
        state: &S,
        player: Player,
        depth: usize,
        alpha: Score,
        beta: Score,
    ) -> Result<Score> {
        if let Some(score) = self.max_memo.get(player, state) {
            return Ok(score);
        }
        let score = self.alphabeta_max_search(state, player, depth, alpha, beta)?;
        self.max_memo.record(player, state, score);
        Ok(score)
    }

    fn alphabeta_min_search(
        &mut self,
        state: &S,
        player: Player,
        depth: usize,
        alpha: Score,
        mut beta: Score,
    ) -> Result<Score> {
        self.checkpoint()?;
        if let Some(score) = self.leaf(state, player, depth) {
            return Ok(score);
        }
        let actions = state.actions();
        if actions.is_empty() {
            return Ok(LOSS);
        }
        let mut score = WIN;
        for action in actions {
            let child = state.result(&action);
            score = score.min(self.alphabeta_max_value(&child, player, depth - 1, alpha, beta)?);
            if score <= alpha {
                return Ok(score);
            }
            beta = beta.min(score);
        }
        Ok(score)
    }

    fn alphabeta_max_search(
        &mut self,
        state: &S,
        player: Player,
        depth: usize,
        mut alpha: Score,
        beta: Score,
    ) -> Result<Score> {
        self.checkpoint()?;
        if let Some(score) = self.leaf(state, player, depth) {
            return Ok(score);
        }
        let actions = state.actions();
        if actions.is_empty() {
            return Ok(WIN);
        }
        let mut score = LOSS;
        for action in actions {
            let child = state.result(&action);
            score = score.max(self.alphabeta_min_value(&child, player, depth - 1, alpha, beta)?);
            if score >= beta {
                return Ok(score);
            }
            alpha = alpha.max(score);
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NoEval, Tree, TreeEval, TreeState};
    use crate::game::is_exact;

    /// Depth-2 textbook tree: root max over three min nodes.
    /// Minimax value 3 via the first branch; the second and third are cut.
    fn textbook() -> TreeState {
        Tree::build(|t| {
            let a = t.node(&[t.leaf(3.0), t.leaf(12.0), t.leaf(8.0)]);
            let b = t.node(&[t.leaf(2.0), t.leaf(4.0), t.leaf(6.0)]);
            let c = t.node(&[t.leaf(14.0), t.leaf(5.0), t.leaf(2.0)]);
            t.node(&[a, b, c])
        })
    }

    #[test]
    fn test_minimax_picks_textbook_move() {
        let root = textbook();
        let mut engine = Engine::new(TreeEval);
        let outcome = engine.minimax(&root, Player::First, 2).unwrap();
        assert_eq!(outcome.action, 0);
        assert_eq!(outcome.score, 3.0);
    }

    #[test]
    fn test_alphabeta_agrees_with_minimax_on_textbook_tree() {
        let root = textbook();
        let mut minimax = Engine::new(TreeEval);
        let mut alphabeta = Engine::new(TreeEval);
        let slow = minimax.minimax(&root, Player::First, 2).unwrap();
        let fast = alphabeta.alphabeta(&root, Player::First, 2).unwrap();
        assert_eq!(slow, fast);
        // root children get a full window, so nothing is cut at depth 2
        assert_eq!(alphabeta.nodes(), minimax.nodes());
    }

    #[test]
    fn test_alphabeta_cuts_deeper_trees() {
        // the textbook max node two plies below the root: once its first
        // min child yields 3, the other two stop after one leaf each
        let root = Tree::build(|t| {
            let a = t.node(&[t.leaf(3.0), t.leaf(12.0), t.leaf(8.0)]);
            let b = t.node(&[t.leaf(2.0), t.leaf(4.0), t.leaf(6.0)]);
            let c = t.node(&[t.leaf(1.0), t.leaf(5.0), t.leaf(2.0)]);
            let x = t.node(&[a, b, c]);
            let top = t.node(&[x]);
            t.node(&[top])
        });
        let mut minimax = Engine::new(TreeEval);
        let mut alphabeta = Engine::new(TreeEval);
        let slow = minimax.minimax(&root, Player::First, 4).unwrap();
        let fast = alphabeta.alphabeta(&root, Player::First, 4).unwrap();
        assert_eq!(slow, fast);
        assert_eq!(fast.score, 3.0);
        assert_eq!(minimax.nodes(), 14);
        assert_eq!(alphabeta.nodes(), 10);
    }

    #[test]
    fn test_min_value_cuts_off_below_alpha() {
        let root = textbook();
        let b = root.child(1);
        let mut engine = Engine::new(TreeEval);
        // with alpha = 3 the first leaf (2) already refutes b
        let score = engine.alphabeta_min_value(&b, Player::First, 1, 3.0, WIN).unwrap();
        assert_eq!(score, 2.0);
        // node b plus a single leaf
        assert_eq!(engine.nodes(), 2);
    }

    #[test]
    fn test_max_value_cuts_off_above_beta() {
        let root = Tree::build(|t| t.node(&[t.leaf(9.0), t.leaf(1.0), t.leaf(20.0)]));
        let mut engine = Engine::new(TreeEval);
        let score = engine.alphabeta_max_value(&root, Player::First, 1, LOSS, 5.0).unwrap();
        assert_eq!(score, 9.0);
        assert_eq!(engine.nodes(), 2);
    }

    #[test]
    fn test_terminal_returns_utility_without_evaluating() {
        let root = Tree::build(|t| t.win_for(Player::First));
        let mut engine = Engine::new(NoEval);
        assert_eq!(engine.minimax_max_value(&root, Player::First, 0).unwrap(), WIN);
        assert_eq!(engine.minimax_min_value(&root, Player::First, 3).unwrap(), WIN);
        assert_eq!(engine.alphabeta_max_value(&root, Player::Second, 0, LOSS, WIN).unwrap(), LOSS);
    }

    #[test]
    fn test_depth_zero_uses_heuristic() {
        let root = Tree::build(|t| t.node(&[t.leaf(1.0)]));
        let mut engine = Engine::new(TreeEval);
        // the root itself is scored at depth zero: its estimate is 0
        assert_eq!(engine.minimax_max_value(&root, Player::First, 0).unwrap(), 0.0);
        assert_eq!(engine.minimax_max_value(&root, Player::First, 1).unwrap(), 1.0);
        // the estimate flips sign for the other player
        assert_eq!(engine.minimax_max_value(&root, Player::Second, 1).unwrap(), -1.0);
    }

    #[test]
    fn test_empty_interior_nodes_use_fixed_extremes() {
        let root = Tree::build(|t| t.dead_end());
        let mut engine = Engine::new(TreeEval);
        assert_eq!(engine.minimax_max_value(&root, Player::First, 2).unwrap(), WIN);
        assert_eq!(engine.minimax_min_value(&root, Player::First, 2).unwrap(), LOSS);
        assert_eq!(engine.alphabeta_max_value(&root, Player::First, 2, LOSS, WIN).unwrap(), WIN);
        assert_eq!(engine.alphabeta_min_value(&root, Player::First, 2, LOSS, WIN).unwrap(), LOSS);
    }

    #[test]
    fn test_ties_break_to_first_action() {
        let root = Tree::build(|t| t.node(&[t.leaf(4.0), t.leaf(7.0), t.leaf(7.0)]));
        let mut engine = Engine::new(TreeEval);
        assert_eq!(engine.minimax(&root, Player::First, 1).unwrap().action, 1);
        assert_eq!(engine.alphabeta(&root, Player::First, 1).unwrap().action, 1);
    }

    #[test]
    fn test_root_without_actions_is_an_error() {
        let root = Tree::build(|t| t.dead_end());
        let mut engine = Engine::new(TreeEval);
        assert!(matches!(engine.minimax(&root, Player::First, 3), Err(Error::NoLegalMoves)));
        assert!(matches!(engine.alphabeta(&root, Player::First, 3), Err(Error::NoLegalMoves)));
    }

    #[test]
    fn test_forced_line_to_win_is_exact() {
        // one move each for three plies, then player two is stuck
        let root = Tree::build(|t| {
            let end = t.win_for(Player::First);
            let c = t.node(&[end]);
            let b = t.node(&[c]);
            t.node(&[b])
        });
        let mut engine = Engine::new(TreeEval);
        let outcome = engine.alphabeta(&root, Player::First, 5).unwrap();
        assert_eq!(outcome.action, 0);
        assert_eq!(outcome.score, WIN);
        assert!(!engine.min_memo().is_empty());
    }

    #[test]
    fn test_memo_holds_only_exact_scores() {
        let root = Tree::build(|t| {
            let lose = t.win_for(Player::Second);
            let win = t.win_for(Player::First);
            let mixed = t.node(&[t.leaf(2.0), win]);
            let losing = t.node(&[lose, t.leaf(6.0)]);
            let quiet = t.node(&[t.leaf(-1.0), t.leaf(5.0)]);
            let x = t.node(&[mixed, losing]);
            let y = t.node(&[quiet, win]);
            t.node(&[x, y, t.leaf(0.5)])
        });
        let mut engine = Engine::new(TreeEval);
        for depth in 1..=4 {
            engine.alphabeta(&root, Player::First, depth).unwrap();
            engine.alphabeta(&root, Player::Second, depth).unwrap();
        }
        assert!(engine.min_memo().len() + engine.max_memo().len() > 0);
        assert!(engine.min_memo().scores().chain(engine.max_memo().scores()).all(is_exact));
    }

    #[test]
    fn test_memo_hit_skips_subtree() {
        let root = Tree::build(|t| {
            let end = t.win_for(Player::First);
            t.node(&[t.node(&[end])])
        });
        let mut engine = Engine::new(TreeEval);
        engine.alphabeta(&root, Player::First, 3).unwrap();
        let first = engine.nodes();
        engine.alphabeta(&root, Player::First, 3).unwrap();
        // the root's only child is memoized as an exact win
        assert_eq!(engine.nodes(), first);
    }

    #[test]
    fn test_alphabeta_matches_minimax_on_generated_trees() {
        for seed in 1..=25u64 {
            let root = Tree::random(seed, 4, 3);
            for depth in 1..=3 {
                let mut minimax = Engine::new(TreeEval);
                let mut alphabeta = Engine::new(TreeEval);
                let slow = minimax.minimax(&root, Player::First, depth).unwrap();
                let fast = alphabeta.alphabeta(&root, Player::First, depth).unwrap();
                assert_eq!(slow.score, fast.score, "seed {} depth {}", seed, depth);
                assert_eq!(slow.action, fast.action, "seed {} depth {}", seed, depth);
            }
        }
    }

    #[test]
    fn test_raised_stop_flag_interrupts() {
        let root = textbook();
        let mut engine = Engine::new(TreeEval);
        engine.stop_flag().store(true, Ordering::Relaxed);
        assert!(matches!(engine.alphabeta(&root, Player::First, 2), Err(Error::Interrupted)));
        assert!(engine.min_memo().is_empty());
    }

    #[test]
    fn test_heuristic_cache_returns_same_choice() {
        let root = Tree::random(7, 4, 3);
        let mut plain = Engine::new(TreeEval);
        let mut cached = Engine::new(TreeEval).with_heuristic_cache(4);
        for depth in 1..=3 {
            let a = plain.alphabeta(&root, Player::First, depth).unwrap();
            let b = cached.alphabeta(&root, Player::First, depth).unwrap();
            assert_eq!(a, b);
        }
        cached.clear();
        assert_eq!(cached.nodes(), 0);
    }
}
