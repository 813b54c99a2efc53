use anyhow::Context;
use clap::Parser;
use minesweeper_ai::config::{BotConfig, load_config};
use minesweeper_ai::{Agent, Board, Cell, logging};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Plays one game of minesweeper using only logical deduction and, when stuck, a guess.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML config file; missing files fall back to defaults.
    #[arg(long, default_value = "minesweeper_ai.toml")]
    config: PathBuf,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    mines: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_random_attempts: Option<usize>,
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Cross-check the agent's knowledge with a SAT solver after every move.
    #[arg(long)]
    audit: bool,
}

impl Args {
    fn resolve(self) -> anyhow::Result<BotConfig> {
        let mut config = load_config(&self.config)?;
        config.height = self.height.unwrap_or(config.height);
        config.width = self.width.unwrap_or(config.width);
        config.mines = self.mines.unwrap_or(config.mines);
        config.seed = self.seed.or(config.seed);
        config.max_random_attempts = self.max_random_attempts.unwrap_or(config.max_random_attempts);
        config.delay_ms = self.delay_ms.unwrap_or(config.delay_ms);
        config.audit |= self.audit;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Won,
    Lost(Cell),
    Stuck,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Args::parse().resolve()?;

    // --- 1. Initialization ---
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let board = Board::new(config.height, config.width, config.mines, &mut rng)?;
    let mut agent = Agent::new(config.height, config.width);
    info!(seed, ?config, "starting game");

    println!("--- Autonomous Minesweeper Agent ---");
    println!("Strategy: play deduced safe cells, guess randomly otherwise.");
    println!("Mine layout (hidden from the agent):");
    print!("{board}");

    // --- 2. Game Loop ---
    let delay = Duration::from_millis(config.delay_ms);
    let mut move_count = 0;
    let outcome = loop {
        if agent.moves_made().len() + board.mines().len() == board.grid().len()
            || board.won(agent.known_mine())
        {
            break Outcome::Won;
        }

        // --- 3. Decision Logic ---
        let cell = match agent.suggest_deduced_move() {
            Some(cell) => {
                println!("Logic found a guaranteed safe cell.");
                cell
            }
            None => match agent.suggest_random_move(&mut rng, config.max_random_attempts) {
                Some(cell) => {
                    println!("No logically safe move found. Making a random guess...");
                    cell
                }
                None => break Outcome::Stuck,
            },
        };

        // --- 4. Execute the Chosen Move ---
        move_count += 1;
        println!("\n--- Move #{move_count}: reveal {cell} ---");
        if board.is_mine(cell) {
            break Outcome::Lost(cell);
        }
        let count = board.nearby_mines(cell);
        agent
            .record_observation(cell, count)
            .with_context(|| format!("recording {cell} = {count}"))?;

        if config.audit {
            audit(&agent)?;
        }
        print_knowledge(&agent, &board);

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    };

    // --- 5. Final Result ---
    println!("\n--- Game Over after {move_count} moves ---");
    match outcome {
        Outcome::Won => println!("Result: the agent won!"),
        Outcome::Lost(cell) => println!("Result: the agent hit a mine at {cell} and lost."),
        Outcome::Stuck => println!("Result: no move could be found."),
    }
    Ok(())
}

fn audit(agent: &Agent) -> anyhow::Result<()> {
    let analysis = agent.audit().context("knowledge base is inconsistent")?;
    for (cell, state) in analysis.missed(agent) {
        warn!(%cell, ?state, "deduction missed by propagation");
    }
    Ok(())
}

/// Prints the board as the agent sees it: numbers for played cells, flags for
/// known mines, dots for known safes.
fn print_knowledge(agent: &Agent, board: &Board) {
    let grid = agent.grid();

    print!("   ");
    for col in 0..grid.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(grid.width));

    for row in 0..grid.height {
        print!("{:^2}|", row);
        for col in 0..grid.width {
            let cell = Cell { row, col };
            let display = if agent.moves_made().contains(&cell) {
                format!(" {} ", board.nearby_mines(cell))
            } else if agent.known_mine().contains(&cell) {
                " F ".to_string()
            } else if agent.known_safe().contains(&cell) {
                " . ".to_string()
            } else {
                " ■ ".to_string()
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
