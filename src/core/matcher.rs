//! Match/cascade engine - run scanning, grouping, and resolution
//!
//! A resolution pass scans the settled grid for runs of three or more
//! same-type cells, flood-fills the found cells into connected same-type
//! groups, resolves each group's trigger from the catalog, dispatches the
//! trigger through the action system, and finally flips every queued cell
//! into its destruction countdown. The pass is synchronous; the board calls
//! it whenever physics reports that cells settled, which is what turns
//! refills into cascades.
//!
//! The destroy set is the shared ledger of one pass: scanning seeds it,
//! effects add to it, and the block-creation action removes from it to
//! rescue a cell. It iterates in ascending slot order so event emission is
//! deterministic.

use std::collections::{BTreeSet, VecDeque};

use crate::core::actions::{ActionCtx, ActionKind, ActionSystem};
use crate::core::catalog::BlockCatalog;
use crate::core::events::BoardEvent;
use crate::core::grid::{CellState, Grid};
use crate::core::rng::SimpleRng;
use crate::types::{BlockId, ComboPolicy, COMBO_DECAY_MS, COMBO_EXTEND_MS, EXPLODE_DELAY_MS};

/// Cells queued for destruction during one resolution pass
#[derive(Debug, Clone, Default)]
pub struct DestroySet {
    cells: BTreeSet<usize>,
}

impl DestroySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, idx: usize) -> bool {
        self.cells.insert(idx)
    }

    /// Rescue a queued cell
    pub fn remove(&mut self, idx: usize) -> bool {
        self.cells.remove(&idx)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.cells.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.iter().copied()
    }
}

/// Combo and cascade bookkeeping
///
/// A combo is a streak of resolution passes. Under the time-decay policy
/// the streak survives as long as its timer; under the move-scoped policy
/// it lasts one committed swap. Cascade depth counts passes within the
/// current resolution chain and is cleared when the board goes quiet.
#[derive(Debug, Clone)]
pub struct ComboMeter {
    policy: ComboPolicy,
    combo: u32,
    best: u32,
    decay_ms: u32,
    cascade_depth: u32,
}

impl ComboMeter {
    pub fn new(policy: ComboPolicy) -> Self {
        Self {
            policy,
            combo: 0,
            best: 0,
            decay_ms: 0,
            cascade_depth: 0,
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn cascade_depth(&self) -> u32 {
        self.cascade_depth
    }

    pub fn decay_ms(&self) -> u32 {
        self.decay_ms
    }

    /// Record one resolving pass
    pub fn bump(&mut self) {
        self.combo += 1;
        self.cascade_depth += 1;
        self.best = self.best.max(self.combo);
        if matches!(self.policy, ComboPolicy::TimeDecay { .. }) {
            if self.combo == 1 {
                self.decay_ms = COMBO_DECAY_MS;
            } else {
                self.decay_ms += COMBO_EXTEND_MS;
            }
        }
    }

    /// Extra decay time granted by bonus actions
    pub fn add_bonus_ms(&mut self, ms: u32) {
        if ms > 0 && matches!(self.policy, ComboPolicy::TimeDecay { .. }) {
            self.decay_ms += ms;
        }
    }

    /// Advance the decay timer
    pub fn tick(&mut self, dt_ms: u32, busy: bool) {
        let ComboPolicy::TimeDecay { decay_while_busy } = self.policy else {
            return;
        };
        if busy && !decay_while_busy {
            return;
        }
        if self.combo == 0 {
            return;
        }
        self.decay_ms = self.decay_ms.saturating_sub(dt_ms);
        if self.decay_ms == 0 {
            self.combo = 0;
            self.cascade_depth = 0;
        }
    }

    /// Move-scoped combos restart at each committed swap
    pub fn reset_for_move(&mut self) {
        if self.policy == ComboPolicy::MoveScoped {
            self.combo = 0;
            self.cascade_depth = 0;
        }
    }

    /// The resolution chain ended; the next pass starts a fresh cascade
    pub fn end_chain(&mut self) {
        self.cascade_depth = 0;
    }
}

/// Outcome summary of one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPass {
    /// Connected groups resolved
    pub groups: usize,
    /// Size of the largest resolved group
    pub largest_group: usize,
    /// Cells queued for destruction after rescues
    pub destroyed: usize,
}

/// Type of a cell as the scanner sees it: present, Idle, and matchable
fn scannable(grid: &Grid, catalog: &BlockCatalog, x: i32, y: i32) -> Option<BlockId> {
    let cell = grid.get(x, y)?;
    if cell.state != CellState::Idle {
        return None;
    }
    let id = cell.block?;
    catalog.get(id).filter(|d| d.matchable).map(|_| id)
}

/// Collect every cell belonging to a run of three or more
///
/// Rows are scanned left to right, columns top to bottom; the union of
/// both sweeps is returned in ascending slot order.
pub fn scan(grid: &Grid, catalog: &BlockCatalog) -> Vec<usize> {
    let mut found = BTreeSet::new();
    let w = grid.width() as i32;
    let h = grid.height() as i32;

    for y in 0..h {
        let mut x = 0;
        while x < w {
            let Some(id) = scannable(grid, catalog, x, y) else {
                x += 1;
                continue;
            };
            let mut run = 1;
            while x + run < w && scannable(grid, catalog, x + run, y) == Some(id) {
                run += 1;
            }
            if run >= 3 {
                for i in 0..run {
                    if let Some(slot) = grid.index(x + i, y) {
                        found.insert(slot);
                    }
                }
            }
            x += run;
        }
    }

    for x in 0..w {
        let mut y = 0;
        while y < h {
            let Some(id) = scannable(grid, catalog, x, y) else {
                y += 1;
                continue;
            };
            let mut run = 1;
            while y + run < h && scannable(grid, catalog, x, y + run) == Some(id) {
                run += 1;
            }
            if run >= 3 {
                for i in 0..run {
                    if let Some(slot) = grid.index(x, y + i) {
                        found.insert(slot);
                    }
                }
            }
            y += run;
        }
    }

    found.into_iter().collect()
}

/// Longest contiguous run through one slot, horizontal or vertical
///
/// Pure probe over Idle matchable cells; used for pre-commit swap
/// validation and by the solver.
pub fn longest_run_at(grid: &Grid, catalog: &BlockCatalog, idx: usize) -> usize {
    let (x, y) = grid.coords(idx);
    let Some(id) = scannable(grid, catalog, x, y) else {
        return 0;
    };

    let mut horizontal = 1;
    let mut step = x - 1;
    while scannable(grid, catalog, step, y) == Some(id) {
        horizontal += 1;
        step -= 1;
    }
    step = x + 1;
    while scannable(grid, catalog, step, y) == Some(id) {
        horizontal += 1;
        step += 1;
    }

    let mut vertical = 1;
    step = y - 1;
    while scannable(grid, catalog, x, step) == Some(id) {
        vertical += 1;
        step -= 1;
    }
    step = y + 1;
    while scannable(grid, catalog, x, step) == Some(id) {
        vertical += 1;
        step += 1;
    }

    horizontal.max(vertical)
}

/// True when the slot sits in a run of three or more
pub fn check_match_at(grid: &Grid, catalog: &BlockCatalog, idx: usize) -> bool {
    longest_run_at(grid, catalog, idx) >= 3
}

/// Partition found cells into connected same-type groups
///
/// Seeds are taken in ascending order, so each group's first element is
/// its lowest slot index.
fn group_components(grid: &Grid, initial: &[usize]) -> Vec<Vec<usize>> {
    let mut member = vec![false; grid.len()];
    for &idx in initial {
        member[idx] = true;
    }
    let mut visited = vec![false; grid.len()];
    let mut groups = Vec::new();

    for &seed in initial {
        if visited[seed] {
            continue;
        }
        let id = grid.cell(seed).block;
        visited[seed] = true;
        let mut group = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(at) = queue.pop_front() {
            for n in grid.neighbors4(at) {
                if member[n] && !visited[n] && grid.cell(n).block == id {
                    visited[n] = true;
                    group.push(n);
                    queue.push_back(n);
                }
            }
        }
        groups.push(group);
    }
    groups
}

/// Flip every queued cell into its destruction countdown
///
/// Cells already counting down keep their timers. Emits one explosion
/// event per newly flipped cell, in ascending slot order. Returns the
/// number of cells flipped.
pub fn finalize_destruction(
    grid: &mut Grid,
    destroy: &DestroySet,
    events: &mut Vec<BoardEvent>,
) -> usize {
    let mut destroyed = 0;
    for idx in destroy.iter() {
        let cell = grid.cell_mut(idx);
        if cell.state == CellState::Exploding {
            continue;
        }
        let Some(id) = cell.block else {
            continue;
        };
        cell.state = CellState::Exploding;
        cell.explode_ms = EXPLODE_DELAY_MS;
        destroyed += 1;
        let (x, y) = grid.coords(idx);
        events.push(BoardEvent::Explode { cell: idx, block: id, x, y });
    }
    destroyed
}

/// The dispatch origin: the most recent swap target when it belongs to the
/// group, otherwise the group's first member
fn choose_origin(group: &[usize], swap_target: Option<usize>) -> usize {
    match swap_target {
        Some(t) if group.contains(&t) => t,
        _ => group[0],
    }
}

/// Run one full resolution pass over a settled grid
///
/// Returns the zero pass when nothing matches. `swap_target` biases each
/// group's trigger origin toward the player's most recent swap.
#[allow(clippy::too_many_arguments)]
pub fn resolve_pass(
    grid: &mut Grid,
    catalog: &BlockCatalog,
    actions: &ActionSystem,
    rng: &mut SimpleRng,
    combo: &mut ComboMeter,
    swap_target: Option<usize>,
    events: &mut Vec<BoardEvent>,
) -> MatchPass {
    let initial = scan(grid, catalog);
    if initial.is_empty() {
        return MatchPass::default();
    }

    for &idx in &initial {
        grid.cell_mut(idx).state = CellState::Matched;
    }

    let mut destroy = DestroySet::new();
    for &idx in &initial {
        let indestructible = grid
            .cell(idx)
            .block
            .and_then(|id| catalog.get(id))
            .is_some_and(|d| d.indestructible);
        if !indestructible {
            destroy.insert(idx);
        }
    }

    let groups = group_components(grid, &initial);
    let largest_group = groups.iter().map(|g| g.len()).max().unwrap_or(0);

    let mut bonus_ms = 0u32;
    {
        let mut ctx = ActionCtx {
            grid,
            catalog,
            rng,
            destroy: &mut destroy,
            bonus_ms: &mut bonus_ms,
            events,
        };
        for group in &groups {
            let Some(id) = ctx.grid.cell(group[0]).block else {
                continue;
            };
            let Some(def) = catalog.get(id) else {
                ctx.events.push(BoardEvent::UnknownBlock { id });
                continue;
            };
            let Some(kind) = def.trigger_for_run(group.len()) else {
                continue;
            };
            if kind == ActionKind::Noop {
                continue;
            }
            let origin = choose_origin(group, swap_target);
            actions.dispatch(kind, origin, 0, &mut ctx);
        }
    }

    let destroyed = finalize_destruction(grid, &destroy, events);

    // Members that were neither queued nor rescued (indestructible types
    // caught by the scan) return to rest
    for &idx in &initial {
        if grid.cell(idx).state == CellState::Matched && !destroy.contains(idx) {
            grid.cell_mut(idx).state = CellState::Idle;
        }
    }

    combo.bump();
    combo.add_bonus_ms(bonus_ms);

    MatchPass {
        groups: groups.len(),
        largest_group,
        destroyed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checkerboard of two gem types; never contains a run
    fn checkerboard(width: u8, height: u8) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                grid.put_block(x, y, Some(((x + y) % 2) as BlockId), 1);
            }
        }
        grid
    }

    #[test]
    fn test_destroy_set_orders_and_rescues() {
        let mut set = DestroySet::new();
        set.insert(9);
        set.insert(2);
        set.insert(4);
        assert!(!set.insert(2));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 4, 9]);

        assert!(set.remove(4));
        assert!(!set.contains(4));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_scan_finds_horizontal_run() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 1..4 {
            grid.put_block(x, 2, Some(3), 1);
        }

        let found = scan(&grid, &catalog);
        let expected: Vec<usize> = (1..4).map(|x| grid.index(x, 2).unwrap()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_scan_unions_crossing_runs() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        // Horizontal and vertical 3-runs of topaz sharing the corner (1, 1)
        for x in 1..4 {
            grid.put_block(x, 1, Some(3), 1);
        }
        for y in 1..4 {
            grid.put_block(1, y, Some(3), 1);
        }

        let found = scan(&grid, &catalog);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_scan_skips_moving_cells() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 1..4 {
            grid.put_block(x, 2, Some(3), 1);
        }
        let idx = grid.index(2, 2).unwrap();
        grid.cell_mut(idx).state = CellState::Falling;

        assert!(scan(&grid, &catalog).is_empty());
    }

    #[test]
    fn test_scan_skips_unmatchable_types() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        // Stones are unmatchable no matter how they line up
        for x in 0..5 {
            grid.put_block(x, 2, Some(7), 1);
        }

        assert!(scan(&grid, &catalog).is_empty());
    }

    #[test]
    fn test_check_match_at_is_pure() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 1..4 {
            grid.put_block(x, 2, Some(3), 1);
        }
        let before = grid.clone();

        assert!(check_match_at(&grid, &catalog, grid.index(2, 2).unwrap()));
        assert!(!check_match_at(&grid, &catalog, grid.index(0, 0).unwrap()));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_longest_run_counts_both_axes() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 0..4 {
            grid.put_block(x, 3, Some(3), 1);
        }

        assert_eq!(longest_run_at(&grid, &catalog, grid.index(2, 3).unwrap()), 4);
    }

    #[test]
    fn test_plain_run_resolution() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        // Topaz's 3-run trigger is empty: plain destruction only
        for x in 1..4 {
            grid.put_block(x, 2, Some(3), 1);
        }

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        let pass = resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);

        assert_eq!(pass.groups, 1);
        assert_eq!(pass.largest_group, 3);
        assert_eq!(pass.destroyed, 3);
        assert_eq!(combo.combo(), 1);
        for x in 1..4 {
            assert_eq!(grid.get(x, 2).unwrap().state, CellState::Exploding);
        }
        let explosions = events
            .iter()
            .filter(|e| matches!(e, BoardEvent::Explode { .. }))
            .count();
        assert_eq!(explosions, 3);
    }

    #[test]
    fn test_trigger_halo_around_first_member() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        // Opal's 3-run trigger is the small explosion
        for x in 1..4 {
            grid.put_block(x, 2, Some(5), 1);
        }

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        let pass = resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);

        // Three run cells plus the ring around the first member (1, 2),
        // minus the ring cell that is itself part of the run
        assert_eq!(pass.destroyed, 10);
    }

    #[test]
    fn test_five_run_leaves_one_prism() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 0..5 {
            grid.put_block(x, 2, Some(3), 1);
        }

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        let pass = resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);

        assert_eq!(pass.largest_group, 5);
        assert_eq!(pass.destroyed, 4);
        let first = grid.index(0, 2).unwrap();
        assert_eq!(grid.cell(first).block, Some(8));
        assert_eq!(grid.cell(first).state, CellState::Idle);
        for x in 1..5 {
            assert_eq!(grid.get(x, 2).unwrap().state, CellState::Exploding);
        }
    }

    #[test]
    fn test_swap_target_takes_priority_as_origin() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 0..5 {
            grid.put_block(x, 2, Some(3), 1);
        }
        let middle = grid.index(2, 2).unwrap();

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, Some(middle), &mut events);

        assert_eq!(grid.cell(middle).block, Some(8));
        assert_eq!(grid.cell(middle).state, CellState::Idle);
    }

    #[test]
    fn test_pass_is_idempotent_on_scan() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        for x in 1..4 {
            grid.put_block(x, 2, Some(3), 1);
        }

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);
        assert!(scan(&grid, &catalog).is_empty());

        let second = resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);
        assert_eq!(second, MatchPass::default());
        assert_eq!(combo.combo(), 1);
    }

    #[test]
    fn test_combo_meter_decays_to_zero() {
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        combo.bump();
        combo.bump();
        assert_eq!(combo.combo(), 2);
        assert_eq!(combo.best(), 2);

        combo.tick(COMBO_DECAY_MS + COMBO_EXTEND_MS, false);
        assert_eq!(combo.combo(), 0);
        assert_eq!(combo.best(), 2);
        assert_eq!(combo.cascade_depth(), 0);
    }

    #[test]
    fn test_combo_decay_pauses_while_busy() {
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: false });
        combo.bump();
        combo.tick(COMBO_DECAY_MS * 2, true);
        assert_eq!(combo.combo(), 1);

        combo.tick(COMBO_DECAY_MS * 2, false);
        assert_eq!(combo.combo(), 0);
    }

    #[test]
    fn test_move_scoped_resets_on_swap() {
        let mut combo = ComboMeter::new(ComboPolicy::MoveScoped);
        combo.bump();
        combo.bump();
        combo.tick(1_000_000, false);
        assert_eq!(combo.combo(), 2, "move-scoped combos never time out");

        combo.reset_for_move();
        assert_eq!(combo.combo(), 0);
        assert_eq!(combo.best(), 2);
    }

    #[test]
    fn test_magic_bonus_extends_decay_timer() {
        let mut grid = checkerboard(5, 5);
        let catalog = BlockCatalog::standard();
        // Amethyst's 4-run trigger grants bonus decay time
        for x in 0..4 {
            grid.put_block(x, 2, Some(4), 1);
        }

        let actions = ActionSystem::standard();
        let mut rng = SimpleRng::new(1);
        let mut combo = ComboMeter::new(ComboPolicy::TimeDecay { decay_while_busy: true });
        let mut events = Vec::new();

        resolve_pass(&mut grid, &catalog, &actions, &mut rng, &mut combo, None, &mut events);

        assert_eq!(combo.combo(), 1);
        assert!(combo.decay_ms() > COMBO_DECAY_MS);
    }

    #[test]
    fn test_groups_split_by_type() {
        let mut grid = checkerboard(7, 5);
        let catalog = BlockCatalog::standard();
        for x in 0..3 {
            grid.put_block(x, 1, Some(2), 1);
        }
        for x in 3..6 {
            grid.put_block(x, 3, Some(3), 1);
        }

        let initial = scan(&grid, &catalog);
        let groups = group_components(&grid, &initial);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.len() == 3));
    }
}
