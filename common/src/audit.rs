//! SAT-backed consistency check of the agent's knowledge.
//!
//! Propagation alone only finds what direct and subset resolution can reach.
//! This module encodes every live sentence as an "exactly k" constraint, asks
//! `varisat` whether the whole store is satisfiable, and then tests each cell
//! under both assumptions. It is a diagnostic: the agent never uses it to pick
//! moves.

use crate::Cell;
use crate::agent::Agent;
use crate::sentence::Sentence;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// What the constraints say about a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    /// Every model makes this cell a mine.
    ForcedMine,
    /// No model makes this cell a mine.
    ForcedSafe,
    /// Models exist either way.
    Undetermined,
}

/// The solver's view of every cell mentioned by a live sentence.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    deductions: BTreeMap<Cell, DeducedState>,
}

impl Analysis {
    pub fn deductions(&self) -> &BTreeMap<Cell, DeducedState> {
        &self.deductions
    }

    pub fn state(&self, cell: Cell) -> Option<DeducedState> {
        self.deductions.get(&cell).copied()
    }

    /// Forced cells the agent has not deduced yet.
    pub fn missed(&self, agent: &Agent) -> Vec<(Cell, DeducedState)> {
        self.deductions
            .iter()
            .filter(|(cell, state)| match state {
                DeducedState::ForcedMine => !agent.known_mine().contains(cell),
                DeducedState::ForcedSafe => !agent.known_safe().contains(cell),
                DeducedState::Undetermined => false,
            })
            .map(|(&cell, &state)| (cell, state))
            .collect()
    }
}

/// Checks that `sentences` have at least one model and classifies every cell they mention.
pub fn analyze(sentences: &[Sentence]) -> anyhow::Result<Analysis> {
    let mut solver = Solver::new();
    let mut var_map: HashMap<Cell, Var> = HashMap::new();

    // 1. Allocate a SAT variable per cell
    for sentence in sentences {
        for &cell in sentence.cells() {
            var_map.entry(cell).or_insert_with(|| solver.new_var());
        }
    }

    // 2. Encode all sentences as CNF
    let mut formula = CnfFormula::new();
    for sentence in sentences {
        let lits: Vec<Lit> = sentence
            .cells()
            .iter()
            .filter_map(|cell| var_map.get(cell).map(|&v| Lit::from_var(v, true)))
            .collect();
        encode_exactly_k_to_formula(&mut formula, &mut solver, &lits, sentence.count());
    }
    solver.add_formula(&formula);

    // 3. The store itself must be consistent.
    if !solver.solve()? {
        anyhow::bail!("unsatisfiable");
    }

    // 4. Test each cell both ways under assumptions.
    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &var_map {
        let mine_possible = solve_assuming(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = solve_assuming(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision at {cell}"),
        };
        deductions.insert(cell, state);
    }

    Ok(Analysis { deductions })
}

fn solve_assuming(solver: &mut Solver, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes an "exactly k" constraint into the CNF formula.
fn encode_exactly_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    encode_at_most_k_to_formula(formula, solver, vars, k);
    encode_at_least_k_to_formula(formula, solver, vars, k);
}

/// Encodes an "at most k" constraint into the CNF formula.
fn encode_at_most_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k >= vars.len() {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    if vars.len() <= 10 {
        // Any k + 1 cells can't all be mines.
        for combo in vars.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        encode_sequential_counter_at_most_k_to_formula(formula, solver, vars, k);
    }
}

/// Encodes an "at least k" constraint into the CNF formula.
fn encode_at_least_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k == 0 {
        return;
    }
    if k > vars.len() {
        formula.add_clause(&[]);
        return;
    }

    if vars.len() <= 10 {
        // Any n - k + 1 cells must contain a mine.
        for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        // At least k mines is at most n - k safe cells.
        let negated: Vec<Lit> = vars.iter().map(|&lit| !lit).collect();
        encode_sequential_counter_at_most_k_to_formula(formula, solver, &negated, vars.len() - k);
    }
}

/// Sinz sequential counter for "at most k".
///
/// `s[i][j]` means at least `j + 1` of the first `i + 1` literals are true.
fn encode_sequential_counter_at_most_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    let n = vars.len();
    if k >= n {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    let s: Vec<Vec<Lit>> = (0..n)
        .map(|_| (0..k).map(|_| Lit::from_var(solver.new_var(), true)).collect())
        .collect();

    formula.add_clause(&[!vars[0], s[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!s[0][j]]);
    }

    for i in 1..n {
        formula.add_clause(&[!vars[i], s[i][0]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!vars[i], !s[i - 1][j - 1], s[i][j]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
        }
        formula.add_clause(&[!vars[i], !s[i - 1][k - 1]]);
    }
}
