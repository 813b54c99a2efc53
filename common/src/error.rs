//! Error types for the knowledge engine and the board.

use crate::Cell;

/// Errors raised while recording observations or propagating knowledge.
///
/// `Contradiction` is fatal: the observations fed to the agent cannot all be
/// true (or the engine is broken), so every later deduction would be unsound.
/// The agent that returned it should be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// A constraint or the known-safe/known-mine split became inconsistent.
    #[error("contradiction: {0}")]
    Contradiction(String),

    /// The cell was already observed.
    #[error("cell {0} has already been observed")]
    DuplicateObservation(Cell),

    /// The cell lies outside the grid.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Cell),

    /// The reported count cannot fit among the cell's neighbours.
    #[error("cell {cell} reports {count} adjacent mines but has only {neighbors} neighbours")]
    InvalidObservation {
        cell: Cell,
        count: usize,
        neighbors: usize,
    },

    /// A board cannot hold this many mines.
    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
}

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::DuplicateObservation(Cell::new(2, 3));
        assert_eq!(err.to_string(), "cell (2, 3) has already been observed");

        let err = AgentError::InvalidObservation {
            cell: Cell::new(0, 0),
            count: 4,
            neighbors: 3,
        };
        assert_eq!(
            err.to_string(),
            "cell (0, 0) reports 4 adjacent mines but has only 3 neighbours"
        );
    }
}
