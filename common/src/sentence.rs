use crate::Cell;
use crate::error::{AgentError, Result};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// The invariant `count <= cells.len()` holds after every successful mutation.
/// Any mutation that would break it returns [`AgentError::Contradiction`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Sentence {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self> {
        let sentence = Sentence {
            cells: cells.into_iter().collect(),
            count,
        };
        sentence.check()?;
        Ok(sentence)
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty sentence carries no information.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Cells that must all be mines, or nothing if the sentence doesn't force them.
    pub fn known_mines(&self) -> BTreeSet<Cell> {
        if !self.cells.is_empty() && self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Cells that must all be safe, or nothing if the sentence doesn't force them.
    pub fn known_safes(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell known to be a mine. Returns whether the sentence changed.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        let count = self.count.checked_sub(1).ok_or_else(|| {
            AgentError::Contradiction(format!("{cell} is a mine but {self} allows none"))
        })?;
        self.cells.remove(&cell);
        self.count = count;
        Ok(true)
    }

    /// Removes a cell known to be safe. Returns whether the sentence changed.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.remove(&cell) {
            return Ok(false);
        }
        self.check().map_err(|_| {
            AgentError::Contradiction(format!(
                "{cell} is safe but leaves too few cells in {self}"
            ))
        })?;
        Ok(true)
    }

    /// Derives `self - subset` when `subset` is a proper subset of `self`.
    ///
    /// Exactly `self.count - subset.count` of the remaining cells are mines.
    pub fn subtract(&self, subset: &Sentence) -> Result<Option<Sentence>> {
        if subset.cells.len() >= self.cells.len() || !subset.cells.is_subset(&self.cells) {
            return Ok(None);
        }
        let count = self.count.checked_sub(subset.count).ok_or_else(|| {
            AgentError::Contradiction(format!("{subset} needs more mines than {self}"))
        })?;
        let cells = self.cells.difference(&subset.cells).copied();
        Sentence::new(cells, count)
            .map(Some)
            .map_err(|_| AgentError::Contradiction(format!("{self} minus {subset} is unsatisfiable")))
    }

    fn check(&self) -> Result<()> {
        if self.count > self.cells.len() {
            return Err(AgentError::Contradiction(format!(
                "{self} has more mines than cells"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(usize, usize)]) -> Vec<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn test_new_rejects_overfull() {
        // Three mines cannot hide in two cells.
        let result = Sentence::new(cells(&[(0, 0), (0, 1)]), 3);
        assert!(matches!(result, Err(AgentError::Contradiction(_))));
    }

    #[test]
    fn test_known_mines_and_safes() {
        let full = Sentence::new(cells(&[(0, 0), (0, 1)]), 2).unwrap();
        assert_eq!(full.known_mines().len(), 2);
        assert!(full.known_safes().is_empty());

        let empty = Sentence::new(cells(&[(0, 0), (0, 1)]), 0).unwrap();
        assert!(empty.known_mines().is_empty());
        assert_eq!(empty.known_safes().len(), 2);

        let open = Sentence::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();
        assert!(open.known_mines().is_empty());
        assert!(open.known_safes().is_empty());
    }

    #[test]
    fn test_mark_mine() {
        let mut s = Sentence::new(cells(&[(0, 0), (0, 1), (1, 0)]), 1).unwrap();
        assert!(s.mark_mine(Cell::new(0, 1)).unwrap());
        assert_eq!(s.count(), 0);
        assert_eq!(s.len(), 2);

        // Second call is a no-op.
        assert!(!s.mark_mine(Cell::new(0, 1)).unwrap());
        assert_eq!(s.count(), 0);

        // No room left for another mine.
        let result = s.mark_mine(Cell::new(0, 0));
        assert!(matches!(result, Err(AgentError::Contradiction(_))));
    }

    #[test]
    fn test_mark_safe() {
        let mut s = Sentence::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();
        assert!(s.mark_safe(Cell::new(0, 0)).unwrap());
        assert_eq!(s.count(), 1);
        assert!(!s.mark_safe(Cell::new(0, 0)).unwrap());
        assert!(!s.mark_safe(Cell::new(5, 5)).unwrap());

        // The remaining cell must be the mine, so it cannot be safe.
        let result = s.mark_safe(Cell::new(0, 1));
        assert!(matches!(result, Err(AgentError::Contradiction(_))));
    }

    #[test]
    fn test_subtract() {
        let a = Sentence::new(cells(&[(0, 0), (0, 1), (0, 2)]), 2).unwrap();
        let b = Sentence::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();

        let derived = a.subtract(&b).unwrap().unwrap();
        assert_eq!(derived, Sentence::new(cells(&[(0, 2)]), 1).unwrap());

        // Not a proper subset in either of these.
        assert_eq!(b.subtract(&a).unwrap(), None);
        assert_eq!(a.subtract(&a).unwrap(), None);
    }

    #[test]
    fn test_subtract_contradiction() {
        let a = Sentence::new(cells(&[(0, 0), (0, 1), (0, 2)]), 1).unwrap();
        let b = Sentence::new(cells(&[(0, 0), (0, 1)]), 2).unwrap();
        assert!(matches!(a.subtract(&b), Err(AgentError::Contradiction(_))));

        // Remaining cell would need two mines.
        let a = Sentence::new(cells(&[(0, 0), (0, 1), (0, 2)]), 3).unwrap();
        let b = Sentence::new(cells(&[(0, 0), (0, 1)]), 0).unwrap();
        assert!(matches!(a.subtract(&b), Err(AgentError::Contradiction(_))));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Sentence::new(cells(&[(0, 1), (0, 0)]), 1).unwrap();
        let b = Sentence::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{(0, 0), (0, 1)} = 1");
    }
}
