pub mod agent;
pub mod audit;
pub mod board;
pub mod config;
pub mod error;
pub mod grid;
pub mod knowledge;
pub mod logging;
pub mod sentence;

pub use agent::{Agent, RandomMove};
pub use audit::{Analysis, DeducedState};
pub use board::Board;
pub use config::BotConfig;
pub use error::AgentError;
pub use grid::Grid;
pub use knowledge::KnowledgeBase;
pub use sentence::Sentence;

use std::fmt;

/// Represents a 2D coordinate on the minesweeper board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
