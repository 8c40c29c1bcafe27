//! Synthetic game trees for search tests.
//!
//! Nodes are built bottom-up and may be shared, so transpositions are easy
//! to express. An action is the index of a child. Non-terminal nodes carry
//! a heuristic estimate from player one's point of view.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::eval::Evaluator;
use crate::game::{GameState, Player, Score, LOSS, WIN};

struct NodeData {
    children: Vec<usize>,
    estimate: Score,
    winner: Option<Player>,
}

#[derive(Clone)]
pub(crate) struct TreeState {
    nodes: Arc<Vec<NodeData>>,
    id: usize,
}

impl TreeState {
    pub fn child(&self, index: usize) -> TreeState {
        self.result(&index)
    }
}

impl PartialEq for TreeState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes) && self.id == other.id
    }
}

impl Eq for TreeState {}

impl Hash for TreeState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeState({})", self.id)
    }
}

impl GameState for TreeState {
    type Action = usize;

    fn actions(&self) -> Vec<usize> {
        (0..self.nodes[self.id].children.len()).collect()
    }

    fn result(&self, action: &usize) -> Self {
        TreeState {
            nodes: Arc::clone(&self.nodes),
            id: self.nodes[self.id].children[*action],
        }
    }

    fn terminal_test(&self) -> bool {
        self.nodes[self.id].winner.is_some()
    }

    fn utility(&self, player: Player) -> Score {
        match self.nodes[self.id].winner {
            Some(winner) if winner == player => WIN,
            Some(_) => LOSS,
            None => 0.0,
        }
    }

    // the root belongs to player one; nothing below asks
    fn player(&self) -> Player {
        Player::First
    }
}

/// Reads the stored estimate, negated for player two.
pub(crate) struct TreeEval;

impl Evaluator<TreeState> for TreeEval {
    fn evaluate(&self, state: &TreeState, player: Player) -> Score {
        let estimate = state.nodes[state.id].estimate;
        match player {
            Player::First => estimate,
            Player::Second => -estimate,
        }
    }
}

/// Fails the test if the search ever asks for an estimate.
pub(crate) struct NoEval;

impl Evaluator<TreeState> for NoEval {
    fn evaluate(&self, state: &TreeState, _player: Player) -> Score {
        panic!("heuristic called on {:?}", state)
    }
}

pub(crate) struct Tree {
    nodes: RefCell<Vec<NodeData>>,
}

impl Tree {
    /// Runs `f` to add nodes; the id it returns becomes the root.
    pub fn build(f: impl FnOnce(&Tree) -> usize) -> TreeState {
        let tree = Tree { nodes: RefCell::new(Vec::new()) };
        let root = f(&tree);
        TreeState {
            nodes: Arc::new(tree.nodes.into_inner()),
            id: root,
        }
    }

    fn push(&self, children: Vec<usize>, estimate: Score, winner: Option<Player>) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData { children, estimate, winner });
        nodes.len() - 1
    }

    /// Childless, non-terminal node with a fixed estimate.
    pub fn leaf(&self, estimate: Score) -> usize {
        self.push(Vec::new(), estimate, None)
    }

    pub fn node(&self, children: &[usize]) -> usize {
        self.scored(0.0, children)
    }

    /// Interior node with its own estimate, seen when the search stops here.
    pub fn scored(&self, estimate: Score, children: &[usize]) -> usize {
        self.push(children.to_vec(), estimate, None)
    }

    pub fn win_for(&self, player: Player) -> usize {
        self.push(Vec::new(), 0.0, Some(player))
    }

    /// Non-terminal node with nothing to play.
    pub fn dead_end(&self) -> usize {
        self.leaf(0.0)
    }

    /// Uniform-height tree with 1..=`branching` children per node, random
    /// estimates everywhere and some terminal nodes at the bottom.
    pub fn random(seed: u64, branching: usize, height: usize) -> TreeState {
        let mut rng = SmallRng::seed_from_u64(seed);
        Tree::build(|t| t.grow(&mut rng, branching, height))
    }

    fn grow(&self, rng: &mut impl Rng, branching: usize, height: usize) -> usize {
        let estimate = rng.gen_range(-10..=10) as Score;
        if height == 0 {
            return match rng.gen_range(0..8) {
                0 => self.win_for(Player::First),
                1 => self.win_for(Player::Second),
                _ => self.leaf(estimate),
            };
        }
        let count = rng.gen_range(1..=branching);
        let children: Vec<usize> = (0..count).map(|_| self.grow(rng, branching, height - 1)).collect();
        self.push(children, estimate, None)
    }
}
