//! The knowledge base and its inference engine.
//!
//! Knowledge is a set of [`Sentence`]s plus the cells already known to be safe
//! or mines. Every new fact is pushed into all sentences, and [`KnowledgeBase::settle`]
//! drives the store to a fixpoint with two rules:
//!
//! 1. Direct resolution: a sentence with `count == 0` makes all its cells safe,
//!    a sentence with `count == len` makes all its cells mines.
//! 2. Subset resolution: if `B ⊊ A`, then `A - B` holds `A.count - B.count` mines.
//!
//! Both rules only ever shrink sentences or add sentences drawn from a finite
//! powerset of the board, and candidates are deduplicated, so the loop terminates.

use crate::Cell;
use crate::error::{AgentError, Result};
use crate::sentence::Sentence;
use itertools::Itertools;
use std::collections::BTreeSet;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    sentences: Vec<Sentence>,
    safes: BTreeSet<Cell>,
    mines: BTreeSet<Cell>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.safes
    }

    pub fn known_mine(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    /// Records `cell` as a mine and removes it from every sentence.
    /// Returns whether anything changed.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool> {
        if self.safes.contains(&cell) {
            return Err(AgentError::Contradiction(format!(
                "{cell} is already known to be safe"
            )));
        }
        let mut changed = self.mines.insert(cell);
        for sentence in &mut self.sentences {
            changed |= sentence.mark_mine(cell)?;
        }
        Ok(changed)
    }

    /// Records `cell` as safe and removes it from every sentence.
    /// Returns whether anything changed.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool> {
        if self.mines.contains(&cell) {
            return Err(AgentError::Contradiction(format!(
                "{cell} is already known to be a mine"
            )));
        }
        let mut changed = self.safes.insert(cell);
        for sentence in &mut self.sentences {
            changed |= sentence.mark_safe(cell)?;
        }
        Ok(changed)
    }

    /// Adds a sentence unless it is empty or already known.
    pub fn insert(&mut self, sentence: Sentence) -> bool {
        if sentence.is_empty() || self.sentences.contains(&sentence) {
            return false;
        }
        trace!(%sentence, "learned");
        self.sentences.push(sentence);
        true
    }

    /// Applies direct resolution until a full pass changes nothing.
    ///
    /// Marking is global, so a sentence visited early in a pass may only become
    /// resolvable after a later one fires; hence the repeated passes.
    pub fn resolve_direct(&mut self) -> Result<bool> {
        let mut progress = false;
        loop {
            let mut mines = BTreeSet::new();
            let mut safes = BTreeSet::new();
            for sentence in &self.sentences {
                mines.extend(sentence.known_mines());
                safes.extend(sentence.known_safes());
            }

            let mut changed = false;
            for cell in mines {
                changed |= self.mark_mine(cell)?;
            }
            for cell in safes {
                changed |= self.mark_safe(cell)?;
            }
            self.compact();

            if !changed {
                return Ok(progress);
            }
            progress = true;
        }
    }

    /// Derives `A - B` for every pair of live sentences with `B ⊊ A`.
    /// Returns whether any new sentence was added.
    pub fn resolve_subsets(&mut self) -> Result<bool> {
        let mut derived = Vec::new();
        for (a, b) in self.sentences.iter().tuple_combinations() {
            if let Some(sentence) = a.subtract(b)? {
                derived.push(sentence);
            }
            if let Some(sentence) = b.subtract(a)? {
                derived.push(sentence);
            }
        }

        let mut added = false;
        for sentence in derived {
            added |= self.insert(sentence);
        }
        Ok(added)
    }

    /// Runs both rules until a combined cycle neither adds a sentence nor marks a cell.
    pub fn settle(&mut self) -> Result<()> {
        self.resolve_direct()?;
        let mut cycles = 0;
        loop {
            cycles += 1;
            let added = self.resolve_subsets()?;
            let marked = self.resolve_direct()?;
            if !added && !marked {
                break;
            }
        }
        debug!(
            cycles,
            sentences = self.sentences.len(),
            safes = self.safes.len(),
            mines = self.mines.len(),
            "knowledge settled"
        );
        Ok(())
    }

    /// Drops empty sentences and duplicates produced by marking.
    fn compact(&mut self) {
        self.sentences = std::mem::take(&mut self.sentences)
            .into_iter()
            .filter(|s| !s.is_empty())
            .unique()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(coords: &[(usize, usize)], count: usize) -> Sentence {
        Sentence::new(coords.iter().copied().map(Cell::from), count).unwrap()
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.insert(sentence(&[(0, 0), (0, 1)], 1)));
        assert!(!kb.insert(sentence(&[(0, 1), (0, 0)], 1)));
        assert!(!kb.insert(sentence(&[], 0)));
        assert_eq!(kb.sentences().len(), 1);
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 0), (0, 1), (0, 2)], 1));

        assert!(kb.mark_mine(Cell::new(0, 1)).unwrap());
        let after_once = kb.clone();
        assert!(!kb.mark_mine(Cell::new(0, 1)).unwrap());
        assert_eq!(kb.sentences(), after_once.sentences());
        assert_eq!(kb.known_mine(), after_once.known_mine());

        assert!(kb.mark_safe(Cell::new(0, 0)).unwrap());
        assert!(!kb.mark_safe(Cell::new(0, 0)).unwrap());
        assert_eq!(kb.sentences(), &[sentence(&[(0, 2)], 0)]);
    }

    #[test]
    fn test_mine_and_safe_are_exclusive() {
        let mut kb = KnowledgeBase::new();
        kb.mark_safe(Cell::new(1, 1)).unwrap();
        assert!(matches!(
            kb.mark_mine(Cell::new(1, 1)),
            Err(AgentError::Contradiction(_))
        ));

        kb.mark_mine(Cell::new(2, 2)).unwrap();
        assert!(matches!(
            kb.mark_safe(Cell::new(2, 2)),
            Err(AgentError::Contradiction(_))
        ));
    }

    #[test]
    fn test_direct_resolution_chains() {
        // {a} = 1 forces a; that turns {a, b} = 1 into {b} = 0, which forces b safe,
        // which in turn turns {b, c} = 1 into {c} = 1.
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 1), (0, 2)], 1));
        kb.insert(sentence(&[(0, 0), (0, 1)], 1));
        kb.insert(sentence(&[(0, 0)], 1));

        assert!(kb.resolve_direct().unwrap());
        assert!(kb.sentences().is_empty());
        assert_eq!(
            kb.known_mine(),
            &BTreeSet::from([Cell::new(0, 0), Cell::new(0, 2)])
        );
        assert_eq!(kb.known_safe(), &BTreeSet::from([Cell::new(0, 1)]));

        // Nothing left to do.
        assert!(!kb.resolve_direct().unwrap());
    }

    #[test]
    fn test_subset_resolution() {
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 0), (0, 1), (0, 2), (0, 3)], 2));
        kb.insert(sentence(&[(0, 0), (0, 1)], 1));

        assert!(kb.resolve_subsets().unwrap());
        assert!(kb.sentences().contains(&sentence(&[(0, 2), (0, 3)], 1)));

        // Running it again derives nothing new.
        assert!(!kb.resolve_subsets().unwrap());
    }

    #[test]
    fn test_settle_subset_then_direct() {
        // {a, b, c} = 1 and {a, b} = 1 leave c safe.
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 0), (0, 1), (0, 2)], 1));
        kb.insert(sentence(&[(0, 0), (0, 1)], 1));

        kb.settle().unwrap();
        assert_eq!(kb.known_safe(), &BTreeSet::from([Cell::new(0, 2)]));
        assert!(kb.known_mine().is_empty());
        assert_eq!(kb.sentences(), &[sentence(&[(0, 0), (0, 1)], 1)]);
    }

    #[test]
    fn test_settle_repeats_subset_resolution() {
        // The second derivation only becomes possible after the first one is learned:
        // {a,b,c,d} = 2 minus {a,b} = 1 gives {c,d} = 1, and {c,d,e} = 1 minus that gives e safe.
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 0), (0, 1), (0, 2), (0, 3)], 2));
        kb.insert(sentence(&[(0, 0), (0, 1)], 1));
        kb.insert(sentence(&[(0, 2), (0, 3), (0, 4)], 1));

        kb.settle().unwrap();
        assert!(kb.known_safe().contains(&Cell::new(0, 4)));
    }

    #[test]
    fn test_settle_detects_contradiction() {
        // Two mines among {a, b} but only one among {a, b, c}.
        let mut kb = KnowledgeBase::new();
        kb.insert(sentence(&[(0, 0), (0, 1), (0, 2)], 1));
        kb.insert(sentence(&[(0, 0), (0, 1)], 2));

        assert!(matches!(kb.settle(), Err(AgentError::Contradiction(_))));
    }

    #[test]
    fn test_settle_on_empty_store() {
        let mut kb = KnowledgeBase::new();
        kb.settle().unwrap();
        assert!(kb.sentences().is_empty());
    }
}
