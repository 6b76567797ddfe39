//! Autoplay - a scored search over the legal swaps
//!
//! The bot probes every adjacent pair through [`Board::probe_swap`], so it
//! sees exactly what a player sees and never mutates the board while
//! deciding. Run length dominates the score, then closeness to the gravity
//! exit edge (deep matches undermine more of the board), then a small
//! jitter from the bot's own rng to vary play between equal moves without
//! touching the board's replay stream.

use crate::core::grid::Grid;
use crate::core::rng::SimpleRng;
use crate::core::{Board, SwapOutcome};
use crate::types::{GravityDir, BOT_COOLDOWN_MS};

/// One legal swap the bot is willing to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotMove {
    pub origin: usize,
    pub dx: i32,
    pub dy: i32,
    /// Longest run the swap lines up
    pub run_len: usize,
}

/// Commits the best available swap on a fixed cooldown
#[derive(Debug)]
pub struct BotPlayer {
    rng: SimpleRng,
    cooldown_ms: u32,
}

impl BotPlayer {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            cooldown_ms: BOT_COOLDOWN_MS,
        }
    }

    /// Count down the cooldown and commit the best swap once the board is
    /// settled. Returns the committed outcome, if any.
    pub fn update(&mut self, board: &mut Board, dt_ms: u32) -> Option<SwapOutcome> {
        self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
        if self.cooldown_ms > 0 || board.is_busy() {
            return None;
        }
        self.cooldown_ms = BOT_COOLDOWN_MS;
        let mv = self.pick_swap(board)?;
        let outcome = board.try_swap(mv.origin, mv.dx, mv.dy);
        outcome.accepted.then_some(outcome)
    }

    /// Best-scored legal swap right now, if any
    ///
    /// Every adjacent pair is covered once by probing right and toward
    /// the next row from each cell.
    pub fn pick_swap(&mut self, board: &Board) -> Option<BotMove> {
        let grid = board.grid();
        let gravity = board.cfg().gravity;
        let mut best: Option<(u32, BotMove)> = None;
        for idx in 0..grid.len() {
            for (dx, dy) in [(1, 0), (0, 1)] {
                let Some(run_len) = board.probe_swap(idx, dx, dy) else {
                    continue;
                };
                let (x, y) = grid.coords(idx);
                let Some(target) = grid.index(x + dx, y + dy) else {
                    continue;
                };
                let depth = exit_progress(grid, gravity, idx).max(exit_progress(
                    grid,
                    gravity,
                    target,
                ));
                let score = run_len as u32 * 1000 + depth * 10 + self.rng.next_range(8);
                let mv = BotMove {
                    origin: idx,
                    dx,
                    dy,
                    run_len,
                };
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, mv));
                }
            }
        }
        best.map(|(_, mv)| mv)
    }

    pub fn reset(&mut self) {
        self.cooldown_ms = BOT_COOLDOWN_MS;
    }
}

/// Cells along the gravity axis between this slot and the entry edge
fn exit_progress(grid: &Grid, gravity: GravityDir, idx: usize) -> u32 {
    let (x, y) = grid.coords(idx);
    match gravity {
        GravityDir::Down => y as u32,
        GravityDir::Up => grid.height() as u32 - 1 - y as u32,
        GravityDir::Right => x as u32,
        GravityDir::Left => grid.width() as u32 - 1 - x as u32,
    }
}
