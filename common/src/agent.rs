use crate::audit::{self, Analysis};
use crate::error::{AgentError, Result};
use crate::grid::Grid;
use crate::knowledge::KnowledgeBase;
use crate::sentence::Sentence;
use crate::Cell;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Outcome of a randomised move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomMove {
    Found(Cell),
    /// Every cell has been played or is a known mine.
    NoCandidates,
    /// Candidates exist but none was drawn within the attempt budget.
    RetriesExhausted,
}

impl From<RandomMove> for Option<Cell> {
    fn from(value: RandomMove) -> Self {
        match value {
            RandomMove::Found(cell) => Some(cell),
            RandomMove::NoCandidates | RandomMove::RetriesExhausted => None,
        }
    }
}

/// A minesweeper player that only ever acts on what it has observed.
///
/// The driving loop reveals a cell on the board, passes the adjacent-mine count
/// to [`Agent::record_observation`], and asks for the next move. After an
/// [`AgentError::Contradiction`] the agent's knowledge is unsound and it should
/// be dropped.
#[derive(Debug, Clone)]
pub struct Agent {
    grid: Grid,
    moves_made: BTreeSet<Cell>,
    knowledge: KnowledgeBase,
}

impl Agent {
    pub fn new(height: usize, width: usize) -> Self {
        Agent {
            grid: Grid::new(height, width),
            moves_made: BTreeSet::new(),
            knowledge: KnowledgeBase::new(),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        self.knowledge.known_safe()
    }

    pub fn known_mine(&self) -> &BTreeSet<Cell> {
        self.knowledge.known_mine()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Marks a cell as a mine in every sentence. Does not run inference.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool> {
        self.check_bounds(cell)?;
        self.knowledge.mark_mine(cell)
    }

    /// Marks a cell as safe in every sentence. Does not run inference.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool> {
        self.check_bounds(cell)?;
        self.knowledge.mark_safe(cell)
    }

    fn check_bounds(&self, cell: Cell) -> Result<()> {
        if !self.grid.contains(cell) {
            return Err(AgentError::OutOfBounds(cell));
        }
        Ok(())
    }

    /// Called when the board tells us, for a safe cell we just revealed, how many
    /// of its neighbours are mines.
    ///
    /// The cell is recorded as played and safe, a sentence over its still-unknown
    /// neighbours is added, and the knowledge base is driven to a fixpoint before
    /// returning.
    #[instrument(skip(self))]
    pub fn record_observation(&mut self, cell: Cell, mine_count: usize) -> Result<()> {
        self.check_bounds(cell)?;
        if self.moves_made.contains(&cell) {
            return Err(AgentError::DuplicateObservation(cell));
        }
        let neighbors: Vec<Cell> = self.grid.neighbors(cell).collect();
        if mine_count > neighbors.len() {
            return Err(AgentError::InvalidObservation {
                cell,
                count: mine_count,
                neighbors: neighbors.len(),
            });
        }

        self.moves_made.insert(cell);
        self.knowledge.mark_safe(cell)?;

        let mut count = mine_count;
        let mut unknown = Vec::new();
        for neighbor in neighbors {
            if self.knowledge.known_mine().contains(&neighbor) {
                count = count.checked_sub(1).ok_or_else(|| {
                    AgentError::Contradiction(format!(
                        "{cell} reports {mine_count} mines but more neighbours are known mines"
                    ))
                })?;
            } else if !self.knowledge.known_safe().contains(&neighbor)
                && !self.moves_made.contains(&neighbor)
            {
                unknown.push(neighbor);
            }
        }

        let sentence = Sentence::new(unknown, count)?;
        debug!(%sentence, "observed");
        self.knowledge.insert(sentence);
        self.knowledge.settle()
    }

    /// A cell known to be safe that hasn't been played yet.
    pub fn suggest_deduced_move(&self) -> Option<Cell> {
        self.known_safe().difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that is neither played nor a known mine, or `None`.
    pub fn suggest_random_move<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_attempts: usize,
    ) -> Option<Cell> {
        self.random_move(rng, max_attempts).into()
    }

    /// Draws up to `max_attempts` cells uniformly from the grid, returning the first
    /// that is neither played nor a known mine.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R, max_attempts: usize) -> RandomMove {
        // Played cells are always safe, so the two sets are disjoint.
        if self.moves_made.len() + self.known_mine().len() >= self.grid.len() {
            return RandomMove::NoCandidates;
        }

        for _ in 0..max_attempts {
            let cell = Cell {
                row: rng.random_range(0..self.grid.height),
                col: rng.random_range(0..self.grid.width),
            };
            if !self.moves_made.contains(&cell) && !self.known_mine().contains(&cell) {
                return RandomMove::Found(cell);
            }
        }
        debug!(max_attempts, "random move attempts exhausted");
        RandomMove::RetriesExhausted
    }

    /// Checks the live sentences with a SAT solver and reports which cells they force.
    pub fn audit(&self) -> anyhow::Result<Analysis> {
        audit::analyze(self.knowledge.sentences())
    }
}
