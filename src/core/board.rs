//! Board orchestration - swaps, ticks, and lifecycle
//!
//! `Board` owns the grid, the catalog, the action registry, the rng, and
//! the combo meter, and wires them into the fixed per-tick order: combo
//! decay, destruction countdowns, physics, then one resolution pass if
//! anything settled. Everything observable leaves through the event
//! outbox, which the embedding layer drains once per frame.
//!
//! Swaps are validated by probing the exchanged payloads before any cell
//! starts moving, so a rejected swap leaves the board bit-identical and
//! only ever costs a bad-move event.

use crate::core::actions::{ActionCtx, ActionKind, ActionSystem};
use crate::core::catalog::BlockCatalog;
use crate::core::events::BoardEvent;
use crate::core::grid::{CellState, Grid};
use crate::core::matcher::{self, ComboMeter, DestroySet};
use crate::core::physics;
use crate::core::rng::SimpleRng;
use crate::core::solver;
use crate::types::{BlockId, BoardConfig};

/// Re-rolls per slot during the initial fill before a run is accepted
const INIT_REROLL_MAX: usize = 32;

/// Result of a swap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub accepted: bool,
    /// Longest run the committed swap lines up; zero when rejected
    pub run_len: usize,
}

impl SwapOutcome {
    const REJECTED: Self = Self {
        accepted: false,
        run_len: 0,
    };
}

#[derive(Debug)]
pub struct Board {
    cfg: BoardConfig,
    grid: Grid,
    catalog: BlockCatalog,
    actions: ActionSystem,
    rng: SimpleRng,
    combo: ComboMeter,
    events: Vec<BoardEvent>,
    /// Landing slot of the most recent committed swap; biases trigger origins
    last_swap_target: Option<usize>,
    /// Largest group resolved since the last committed swap
    last_move_group: usize,
    was_busy: bool,
}

impl Board {
    pub fn new(cfg: BoardConfig) -> Self {
        Self::with_catalog(cfg, BlockCatalog::standard())
    }

    pub fn with_catalog(cfg: BoardConfig, catalog: BlockCatalog) -> Self {
        Self::with_systems(cfg, catalog, ActionSystem::standard())
    }

    /// Full construction with a custom action registration table
    pub fn with_systems(cfg: BoardConfig, catalog: BlockCatalog, actions: ActionSystem) -> Self {
        let mut board = Self {
            cfg,
            grid: Grid::new(cfg.width, cfg.height),
            catalog,
            actions,
            rng: SimpleRng::new(cfg.seed),
            combo: ComboMeter::new(cfg.combo_policy),
            events: Vec::new(),
            last_swap_target: None,
            last_move_group: 0,
            was_busy: false,
        };
        board.fill_initial();
        board.ensure_solvable();
        board
    }

    pub fn cfg(&self) -> &BoardConfig {
        &self.cfg
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn combo(&self) -> &ComboMeter {
        &self.combo
    }

    pub fn last_move_group(&self) -> usize {
        self.last_move_group
    }

    /// True while any cell is moving, matched, or counting down
    pub fn is_busy(&self) -> bool {
        !self.grid.all_idle()
    }

    /// Drain the event outbox
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// A swap the player could make right now, if the board is settled
    pub fn find_hint(&self) -> Option<(usize, usize)> {
        solver::find_hint(&self.grid, &self.catalog)
    }

    /// Install or clear a block at rest; level setup and tests
    pub fn place(&mut self, x: i32, y: i32, block: Option<BlockId>) -> bool {
        let hp = block
            .and_then(|id| self.catalog.get(id))
            .map_or(0, |d| d.max_hp);
        self.grid.put_block(x, y, block, hp)
    }

    /// Attempt to swap the block at `origin` with its neighbor at
    /// `(dx, dy)`
    ///
    /// Unit offsets only. Out-of-bounds targets, unswappable or empty
    /// endpoints, and swaps that line up no run are rejected with a
    /// bad-move event; attempts on cells that are still moving are
    /// rejected silently. A committed swap starts both blocks gliding
    /// and the match resolves when they arrive.
    pub fn try_swap(&mut self, origin: usize, dx: i32, dy: i32) -> SwapOutcome {
        if origin >= self.grid.len() || dx.abs() + dy.abs() != 1 {
            return SwapOutcome::REJECTED;
        }
        if self.grid.cell(origin).state != CellState::Idle {
            return SwapOutcome::REJECTED;
        }
        let (x, y) = self.grid.coords(origin);
        let Some(target) = self.grid.index(x + dx, y + dy) else {
            self.events.push(BoardEvent::BadMove { x: x + dx, y: y + dy });
            return SwapOutcome::REJECTED;
        };
        if self.grid.cell(target).state != CellState::Idle {
            return SwapOutcome::REJECTED;
        }
        if !self.is_swappable(origin) || !self.is_swappable(target) {
            self.events.push(BoardEvent::BadMove { x: x + dx, y: y + dy });
            return SwapOutcome::REJECTED;
        }

        self.grid.swap_blocks(origin, target);
        let run_len = matcher::longest_run_at(&self.grid, &self.catalog, origin)
            .max(matcher::longest_run_at(&self.grid, &self.catalog, target));
        if run_len < 3 {
            self.grid.swap_blocks(origin, target);
            self.events.push(BoardEvent::BadMove { x: x + dx, y: y + dy });
            return SwapOutcome::REJECTED;
        }

        // Commit: each payload glides in from the slot it came from
        let (tx, ty) = self.grid.coords(target);
        {
            let cell = self.grid.cell_mut(origin);
            cell.state = CellState::Swapping;
            cell.pos = (tx as f32, ty as f32);
        }
        {
            let cell = self.grid.cell_mut(target);
            cell.state = CellState::Swapping;
            cell.pos = (x as f32, y as f32);
        }
        self.combo.reset_for_move();
        self.last_swap_target = Some(target);
        self.last_move_group = 0;
        self.was_busy = true;
        SwapOutcome {
            accepted: true,
            run_len,
        }
    }

    /// Longest run a legal swap would line up, without committing it
    pub fn probe_swap(&self, origin: usize, dx: i32, dy: i32) -> Option<usize> {
        if origin >= self.grid.len() || dx.abs() + dy.abs() != 1 {
            return None;
        }
        let (x, y) = self.grid.coords(origin);
        let target = self.grid.index(x + dx, y + dy)?;
        if self.grid.cell(origin).state != CellState::Idle
            || self.grid.cell(target).state != CellState::Idle
            || !self.is_swappable(origin)
            || !self.is_swappable(target)
        {
            return None;
        }
        let mut scratch = self.grid.clone();
        scratch.swap_blocks(origin, target);
        let run_len = matcher::longest_run_at(&scratch, &self.catalog, origin)
            .max(matcher::longest_run_at(&scratch, &self.catalog, target));
        (run_len >= 3).then_some(run_len)
    }

    /// Run one effect at a cell outside of match resolution
    ///
    /// The origin is queued for destruction unless it is empty or holds
    /// an indestructible block; the effect then spreads from there.
    /// Returns the number of cells queued.
    pub fn run_action(&mut self, kind: ActionKind, origin: usize) -> usize {
        if origin >= self.grid.len() {
            return 0;
        }
        let seed_origin = self
            .grid
            .cell(origin)
            .block
            .and_then(|id| self.catalog.get(id))
            .is_some_and(|d| !d.indestructible);

        let mut destroy = DestroySet::new();
        let mut bonus_ms = 0u32;
        {
            let mut ctx = ActionCtx {
                grid: &mut self.grid,
                catalog: &self.catalog,
                rng: &mut self.rng,
                destroy: &mut destroy,
                bonus_ms: &mut bonus_ms,
                events: &mut self.events,
            };
            if seed_origin {
                ctx.destroy.insert(origin);
            }
            self.actions.dispatch(kind, origin, 0, &mut ctx);
        }
        let destroyed = matcher::finalize_destruction(&mut self.grid, &destroy, &mut self.events);
        self.combo.add_bonus_ms(bonus_ms);
        if destroyed > 0 {
            self.was_busy = true;
        }
        destroyed
    }

    /// Advance the simulation by `dt_ms`
    ///
    /// Order is fixed: combo decay, destruction countdowns, physics, then
    /// one resolution pass if anything settled. When the board comes to
    /// rest the cascade ends and solvability is re-checked.
    pub fn tick(&mut self, dt_ms: u32) {
        let busy = !self.grid.all_idle();
        self.combo.tick(dt_ms, busy);

        for idx in 0..self.grid.len() {
            let cell = self.grid.cell_mut(idx);
            if cell.state != CellState::Exploding {
                continue;
            }
            cell.explode_ms = cell.explode_ms.saturating_sub(dt_ms);
            if cell.explode_ms == 0 {
                cell.block = None;
                cell.hp = 0;
                cell.max_hp = 0;
                cell.state = CellState::Idle;
            }
        }

        let report = physics::step(&mut self.grid, &self.cfg, &self.catalog, &mut self.rng, dt_ms);

        for idx in report.exit_landings.iter().copied() {
            let hook = self
                .grid
                .cell(idx)
                .block
                .and_then(|id| self.catalog.get(id))
                .and_then(|d| d.on_settle);
            if let Some(kind) = hook {
                self.run_action(kind, idx);
            }
        }

        if !report.settled.is_empty() {
            let pass = matcher::resolve_pass(
                &mut self.grid,
                &self.catalog,
                &self.actions,
                &mut self.rng,
                &mut self.combo,
                self.last_swap_target,
                &mut self.events,
            );
            if pass.groups > 0 {
                self.last_move_group = self.last_move_group.max(pass.largest_group);
            }
        }

        let now_busy = !self.grid.all_idle();
        if self.was_busy && !now_busy {
            self.combo.end_chain();
            self.last_swap_target = None;
            self.ensure_solvable();
        }
        self.was_busy = now_busy;
    }

    fn is_swappable(&self, idx: usize) -> bool {
        self.grid
            .cell(idx)
            .block
            .and_then(|id| self.catalog.get(id))
            .is_some_and(|d| d.swappable)
    }

    /// Weighted draws per slot, re-rolling away runs that would resolve
    /// on the first tick
    fn fill_initial(&mut self) {
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let Some(idx) = self.grid.index(x, y) else {
                    continue;
                };
                for _ in 0..INIT_REROLL_MAX {
                    let Some(id) = self
                        .catalog
                        .weighted_random_id(&mut self.rng, self.cfg.active_types)
                    else {
                        break;
                    };
                    let hp = self.catalog.get(id).map_or(1, |d| d.max_hp);
                    self.grid.put_block(x, y, Some(id), hp);
                    if !matcher::check_match_at(&self.grid, &self.catalog, idx) {
                        break;
                    }
                }
            }
        }
    }

    /// Repair or report a board with no producing swap
    fn ensure_solvable(&mut self) {
        if solver::find_hint(&self.grid, &self.catalog).is_some() {
            return;
        }
        match solver::find_deadlock_fix(&self.grid, &self.catalog) {
            Some((cell, block)) => {
                let (x, y) = self.grid.coords(cell);
                let hp = self.catalog.get(block).map_or(1, |d| d.max_hp);
                self.grid.put_block(x, y, Some(block), hp);
                self.events.push(BoardEvent::DeadlockFixed { cell, block });
            }
            None => self.events.push(BoardEvent::Deadlocked),
        }
    }
}
