use crate::Cell;
use crate::error::{AgentError, Result};
use crate::grid::Grid;
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeSet;
use std::fmt;

/// The ground truth the agent plays against: where the mines actually are.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    mines: BTreeSet<Cell>,
}

impl Board {
    /// Places `mines` distinct mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let grid = Grid::new(height, width);
        if mines >= grid.len() {
            return Err(AgentError::TooManyMines {
                mines,
                cells: grid.len(),
            });
        }
        let mines = grid.cells().choose_multiple(rng, mines).into_iter().collect();
        Ok(Board { grid, mines })
    }

    /// A board with a fixed mine layout.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> Result<Self> {
        let grid = Grid::new(height, width);
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        if let Some(&cell) = mines.iter().find(|c| !grid.contains(**c)) {
            return Err(AgentError::OutOfBounds(cell));
        }
        if mines.len() >= grid.len() {
            return Err(AgentError::TooManyMines {
                mines: mines.len(),
                cells: grid.len(),
            });
        }
        Ok(Board { grid, mines })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines within one row and column of `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        self.grid.neighbors(cell).filter(|n| self.is_mine(*n)).count()
    }

    /// All mines have been flagged, and nothing else has.
    pub fn won(&self, flagged: &BTreeSet<Cell>) -> bool {
        *flagged == self.mines
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "--".repeat(self.grid.width);
        for row in 0..self.grid.height {
            writeln!(f, "{rule}-")?;
            for col in 0..self.grid.width {
                let mark = if self.is_mine(Cell { row, col }) { 'X' } else { ' ' };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{rule}-")
    }
}
