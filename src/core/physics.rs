//! Grid physics - gravity compaction and motion integration
//!
//! One [`step`] advances the board by a tick: first every lane (column under
//! vertical gravity, row under horizontal) is compacted toward the gravity
//! exit edge and its entry-edge vacancies are refilled from the catalog,
//! then every moving cell is integrated. The step is stateless; all
//! positional state lives in the cells themselves.
//!
//! Lanes are walked from the exit edge toward the entry edge with a running
//! vacancy count. A gravity-immune block, or a cell that is mid swap,
//! matched, or counting down, resets the count and acts as a solid floor;
//! relocating such a cell would tear its animation or drop its timer.
//! Relocation moves the carried state (block, hit-points, position,
//! velocity) to the slot `count` places closer to the exit and leaves the
//! source slot empty.
//!
//! Refill draws one type per remaining entry-edge vacancy and parks the new
//! cell a full lane-gap outside the entry edge, so a multi-cell refill
//! arrives as a train with one-cell spacing instead of a stack.

use crate::core::catalog::BlockCatalog;
use crate::core::grid::{Cell, CellState, Grid};
use crate::core::rng::SimpleRng;
use crate::types::{
    BoardConfig, DRIFT_SPEED, FALL_ACCEL, FALL_SPEED_MAX, SWAP_SPEED,
};

/// What one physics tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Cells that transitioned to Idle this tick
    pub settled: Vec<usize>,
    /// Subset of `settled` that landed on the gravity-exit edge
    pub exit_landings: Vec<usize>,
    /// True when any cell is still in motion after this tick
    pub any_motion: bool,
}

/// Advance compaction and movement by `dt_ms`
pub fn step(
    grid: &mut Grid,
    cfg: &BoardConfig,
    catalog: &BlockCatalog,
    rng: &mut SimpleRng,
    dt_ms: u32,
) -> TickReport {
    compact_and_refill(grid, cfg, catalog, rng);
    integrate(grid, cfg, dt_ms)
}

fn is_floor(catalog: &BlockCatalog, cell: &Cell) -> bool {
    if matches!(
        cell.state,
        CellState::Swapping | CellState::Matched | CellState::Exploding
    ) {
        return true;
    }
    match cell.block {
        Some(id) => catalog.get(id).is_some_and(|d| d.gravity_immune),
        None => false,
    }
}

fn compact_and_refill(grid: &mut Grid, cfg: &BoardConfig, catalog: &BlockCatalog, rng: &mut SimpleRng) {
    let gravity = cfg.gravity;
    let unit = gravity.step();
    let lane_len = grid.lane_len(gravity);

    for lane in 0..grid.lane_count(gravity) {
        let mut vacancies = 0usize;
        for k in 0..lane_len {
            let idx = grid.lane_cell(gravity, lane, k);
            let cell = *grid.cell(idx);

            if cell.block.is_none() {
                vacancies += 1;
                continue;
            }
            if is_floor(catalog, &cell) {
                vacancies = 0;
                continue;
            }
            if vacancies > 0 {
                let dst = grid.lane_cell(gravity, lane, k - vacancies);
                relocate(grid, idx, dst);
            }
        }

        // The final count is exactly the contiguous vacancy stretch at the
        // entry edge; spawn one drawn tile per slot, parked a full stretch
        // outside the edge.
        if vacancies == 0 {
            continue;
        }
        for j in 0..vacancies {
            let Some(id) = catalog.weighted_random_id(rng, cfg.active_types) else {
                break;
            };
            let hp = catalog.get(id).map_or(1, |d| d.max_hp);
            let dst = grid.lane_cell(gravity, lane, lane_len - vacancies + j);
            let (tx, ty) = grid.coords(dst);

            let cell = grid.cell_mut(dst);
            cell.block = Some(id);
            cell.hp = hp;
            cell.max_hp = hp;
            cell.state = CellState::Falling;
            cell.velocity = 0.0;
            cell.target = (tx as f32, ty as f32);
            cell.pos = (
                tx as f32 - unit.0 as f32 * vacancies as f32,
                ty as f32 - unit.1 as f32 * vacancies as f32,
            );
        }
    }
}

fn relocate(grid: &mut Grid, src: usize, dst: usize) {
    let carried = *grid.cell(src);
    let (dx, dy) = grid.coords(dst);

    let cell = grid.cell_mut(dst);
    cell.block = carried.block;
    cell.hp = carried.hp;
    cell.max_hp = carried.max_hp;
    cell.pos = carried.pos;
    cell.velocity = carried.velocity;
    cell.state = CellState::Falling;
    cell.target = (dx as f32, dy as f32);

    let (sx, sy) = grid.coords(src);
    *grid.cell_mut(src) = Cell::empty_at(sx as u8, sy as u8);
}

fn integrate(grid: &mut Grid, cfg: &BoardConfig, dt_ms: u32) -> TickReport {
    let mut report = TickReport::default();
    let gravity = cfg.gravity;
    let unit = gravity.step();
    let dt = dt_ms as f32;

    for idx in 0..grid.len() {
        let cell = grid.cell_mut(idx);
        match cell.state {
            CellState::Falling => {
                cell.velocity = (cell.velocity + FALL_ACCEL * dt).min(FALL_SPEED_MAX);
                cell.pos.0 += unit.0 as f32 * cell.velocity * dt;
                cell.pos.1 += unit.1 as f32 * cell.velocity * dt;

                // Landed once the position reaches or passes the target
                // along the gravity axis
                let progress =
                    cell.pos.0 * unit.0 as f32 + cell.pos.1 * unit.1 as f32;
                let goal =
                    cell.target.0 * unit.0 as f32 + cell.target.1 * unit.1 as f32;
                if progress >= goal {
                    cell.pos = cell.target;
                    cell.velocity = 0.0;
                    cell.state = CellState::Idle;
                    report.settled.push(idx);
                    if grid.is_exit_edge(gravity, idx) {
                        report.exit_landings.push(idx);
                    }
                } else {
                    report.any_motion = true;
                }
            }
            CellState::Swapping => {
                let arrived = move_toward(&mut cell.pos, cell.target, SWAP_SPEED * dt);
                if arrived {
                    cell.state = CellState::Idle;
                    cell.velocity = 0.0;
                    report.settled.push(idx);
                } else {
                    report.any_motion = true;
                }
            }
            CellState::Idle => {
                // Corrective drift after teleport-style mutations; no
                // settle notification since the state never changed
                if cell.pos != cell.target {
                    move_toward(&mut cell.pos, cell.target, DRIFT_SPEED * dt);
                    if cell.pos != cell.target {
                        report.any_motion = true;
                    }
                }
            }
            CellState::Matched | CellState::Exploding => {}
        }
    }

    report
}

/// Per-axis linear motion toward a target; true once both axes converge
fn move_toward(pos: &mut (f32, f32), target: (f32, f32), max_delta: f32) -> bool {
    let dx = target.0 - pos.0;
    let dy = target.1 - pos.1;
    pos.0 += dx.clamp(-max_delta, max_delta);
    pos.1 += dy.clamp(-max_delta, max_delta);
    if (target.0 - pos.0).abs() < 1e-4 && (target.1 - pos.1).abs() < 1e-4 {
        *pos = target;
        return true;
    }
    false
}
