use bitvec::{prelude::*, slice::IterOnes};
use serde::ser::{Serialize, Serializer, SerializeStruct};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use lazy_static::lazy_static;
use std::fmt;

use crate::error::{Error, Result};
use crate::game::{GameState, Player, Score, Territory, LOSS, WIN};

pub const WIDTH: usize = 11;
pub const HEIGHT: usize = 9;
const CELLS: usize = WIDTH * HEIGHT;
pub type BitBoard = BitArr!(for CELLS, in u8, Lsb0);
// cell index is y * WIDTH + x, row 0 at the top

pub trait BitArr2D {
    fn empty() -> Self;
    fn set_point(&mut self, x: usize, y: usize, value: bool);
    type IterPoints<'a>: Iterator<Item=(usize, usize)> + 'a where Self: 'a;
    fn iter_set_points(&'_ self) -> Self::IterPoints<'_>;
}

impl BitArr2D for BitBoard {
    fn empty() -> Self {
        bitarr!(u8, Lsb0; 0; CELLS)
    }

    fn set_point(&mut self, x: usize, y: usize, value: bool) {
        self.set(y * WIDTH + x, value);
    }

    type IterPoints<'a> = std::iter::Map<IterOnes<'a, u8, Lsb0>, fn(usize) -> (usize, usize)>;

    fn iter_set_points(&'_ self) -> Self::IterPoints<'_> {
        self[..CELLS].iter_ones().map(coords as fn(usize) -> (usize, usize))
    }
}

fn coords(cell: usize) -> (usize, usize) {
    (cell % WIDTH, cell / WIDTH)
}

fn in_bounds(x: usize, y: usize) -> bool {
    x < WIDTH && y < HEIGHT
}

/// Knight jumps, clockwise from north-north-east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    NNE,
    ENE,
    ESE,
    SSE,
    SSW,
    WSW,
    WNW,
    NNW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::NNE,
        Direction::ENE,
        Direction::ESE,
        Direction::SSE,
        Direction::SSW,
        Direction::WSW,
        Direction::WNW,
        Direction::NNW,
    ];

    fn offset(self) -> (isize, isize) {
        match self {
            Direction::NNE => (1, -2),
            Direction::ENE => (2, -1),
            Direction::ESE => (2, 1),
            Direction::SSE => (1, 2),
            Direction::SSW => (-1, 2),
            Direction::WSW => (-2, 1),
            Direction::WNW => (-2, -1),
            Direction::NNW => (-1, -2),
        }
    }
}

lazy_static! {
    // JUMPS[cell][direction] is the landing cell, if it is on the board
    static ref JUMPS: Vec<[Option<usize>; 8]> = {
        let mut jumps = Vec::with_capacity(CELLS);
        for cell in 0..CELLS {
            let (x, y) = coords(cell);
            let mut targets = [None; 8];
            for (i, dir) in Direction::ALL.iter().enumerate() {
                let (dx, dy) = dir.offset();
                let tx = x as isize + dx;
                let ty = y as isize + dy;
                if tx >= 0 && ty >= 0 && in_bounds(tx as usize, ty as usize) {
                    targets[i] = Some(ty as usize * WIDTH + tx as usize);
                }
            }
            jumps.push(targets);
        }
        jumps
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Opening placement on any open cell.
    Place { x: usize, y: usize },
    Jump(Direction),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place { x, y } => write!(f, "place ({}, {})", x, y),
            Action::Jump(dir) => write!(f, "jump {:?}", dir),
        }
    }
}

/// Knight's Isolation position. Cells entered by either player stay blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    blocked: BitBoard,
    locs: [Option<usize>; 2],
    ply_count: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            blocked: BitBoard::empty(),
            locs: [None, None],
            ply_count: 0,
        }
    }

    /// Builds an arbitrary position. Player locations are blocked implicitly.
    pub fn with_position(
        blocked: &[(usize, usize)],
        locs: [Option<(usize, usize)>; 2],
        ply_count: usize,
    ) -> Result<Self> {
        let mut board = Self::new();
        board.ply_count = ply_count;
        for &(x, y) in blocked.iter().chain(locs.iter().flatten()) {
            if !in_bounds(x, y) {
                return Err(Error::InvalidConfiguration {
                    message: format!("cell ({}, {}) is off the {}x{} board", x, y, WIDTH, HEIGHT),
                });
            }
            board.blocked.set_point(x, y, true);
        }
        for (slot, loc) in board.locs.iter_mut().zip(locs.iter()) {
            *slot = loc.map(|(x, y)| y * WIDTH + x);
        }
        Ok(board)
    }

    pub fn ply_count(&self) -> usize {
        self.ply_count
    }

    pub fn is_open(&self, cell: usize) -> bool {
        !self.blocked[cell]
    }

    pub fn location_of(&self, player: Player) -> Option<(usize, usize)> {
        self.locs[player.index()].map(coords)
    }

    fn open_cells(&self) -> Vec<usize> {
        self.blocked[..CELLS].iter_zeros().collect()
    }

    fn open_jumps(&self, cell: usize) -> impl Iterator<Item=(Direction, usize)> + '_ {
        Direction::ALL.iter().zip(JUMPS[cell].iter()).filter_map(move |(dir, &target)| {
            target.filter(|&t| self.is_open(t)).map(|t| (*dir, t))
        })
    }

    /// Landing cell of `action` for the side to move, if it resolves on the board.
    fn target(&self, action: &Action) -> Option<usize> {
        match *action {
            Action::Place { x, y } if in_bounds(x, y) => Some(y * WIDTH + x),
            Action::Place { .. } => None,
            Action::Jump(dir) => {
                let from = self.locs[self.player().index()]?;
                let idx = Direction::ALL.iter().position(|d| *d == dir)?;
                JUMPS[from][idx]
            }
        }
    }

    fn apply(&self, cell: usize) -> Self {
        let mut board = *self;
        board.blocked.set(cell, true);
        board.locs[self.player().index()] = Some(cell);
        board.ply_count += 1;
        board
    }

    /// Checked move, for actions arriving from outside the search.
    pub fn make_move(&self, action: &Action) -> Result<Self> {
        if !self.actions().contains(action) {
            return Err(Error::IllegalMove { action: action.to_string() });
        }
        Ok(self.result(action))
    }
}

impl GameState for Board {
    type Action = Action;

    fn actions(&self) -> Vec<Action> {
        match self.locs[self.player().index()] {
            None => self.open_cells().into_iter().map(|cell| {
                let (x, y) = coords(cell);
                Action::Place { x, y }
            }).collect(),
            Some(cell) => self.open_jumps(cell).map(|(dir, _)| Action::Jump(dir)).collect(),
        }
    }

    fn result(&self, action: &Action) -> Self {
        // actions() only yields open, on-board targets
        match self.target(action) {
            Some(cell) if self.is_open(cell) => self.apply(cell),
            _ => *self,
        }
    }

    fn terminal_test(&self) -> bool {
        let loc = self.locs[self.player().index()];
        self.liberties(loc).is_empty()
    }

    fn utility(&self, player: Player) -> Score {
        if !self.terminal_test() {
            return 0.0;
        }
        // the side to move is stuck
        if player == self.player() { LOSS } else { WIN }
    }

    fn player(&self) -> Player {
        Player::from_ply(self.ply_count)
    }
}

impl Territory for Board {
    type Location = usize;

    fn location(&self, player: Player) -> Option<usize> {
        self.locs[player.index()]
    }

    fn liberties(&self, location: Option<usize>) -> Vec<usize> {
        match location {
            None => self.open_cells(),
            Some(cell) => self.open_jumps(cell).map(|(_, target)| target).collect(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let cell = y * WIDTH + x;
                let ch = if self.locs[0] == Some(cell) {
                    '1'
                } else if self.locs[1] == Some(cell) {
                    '2'
                } else if self.blocked[cell] {
                    '#'
                } else {
                    '.'
                };
                write!(f, "{}", ch)?;
                if x + 1 < WIDTH {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> where S: Serializer {
        let blocked: Vec<[usize; 2]> = self.blocked.iter_set_points().map(|(x, y)| [x, y]).collect();
        let locs: Vec<Option<[usize; 2]>> = self.locs.iter()
            .map(|loc| loc.map(|cell| {
                let (x, y) = coords(cell);
                [x, y]
            }))
            .collect();

        let mut s = serializer.serialize_struct("Board", 3)?;
        s.serialize_field("blocked", &blocked)?;
        s.serialize_field("locs", &locs)?;
        s.serialize_field("ply_count", &self.ply_count)?;
        s.end()
    }
}

struct BoardVisitor;
impl<'de> Visitor<'de> for BoardVisitor {
    type Value = Board;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object for Board")
    }
    fn visit_map<V>(self, mut map: V) -> std::result::Result<Board, V::Error> where V: MapAccess<'de> {
        let mut blocked: Option<Vec<[usize; 2]>> = None;
        let mut locs: Option<[Option<[usize; 2]>; 2]> = None;
        let mut ply_count: Option<usize> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "blocked" => blocked = Some(map.next_value()?),
                "locs" => locs = Some(map.next_value()?),
                "ply_count" => ply_count = Some(map.next_value()?),
                _ => { return Err(serde::de::Error::unknown_field(&key, &["blocked", "locs", "ply_count"])); }
            }
        }
        let blocked = blocked.unwrap_or_default();
        let locs = locs.unwrap_or([None, None]);
        let ply_count = ply_count.ok_or_else(|| serde::de::Error::missing_field("ply_count"))?;

        let points: Vec<(usize, usize)> = blocked.iter().map(|p| (p[0], p[1])).collect();
        let locs = [locs[0].map(|p| (p[0], p[1])), locs[1].map(|p| (p[0], p[1]))];
        Board::with_position(&points, locs, ply_count).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error> where D: Deserializer<'de> {
        deserializer.deserialize_map(BoardVisitor)
    }
}
