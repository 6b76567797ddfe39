//! Hint search and deadlock repair
//!
//! Both searches run on a scratch sheet of block ids copied out of the
//! grid, so probing swaps and substitutions never touches live cell
//! state. They are only meaningful on a fully settled board; callers get
//! `None` while anything is still moving.
//!
//! Scan order is fixed: slots ascending, and for each slot the swap with
//! its right neighbor is probed before the swap with its down neighbor.
//! The first producing swap wins, which keeps hints stable for a given
//! layout.

use crate::core::catalog::BlockCatalog;
use crate::core::grid::Grid;
use crate::types::BlockId;

/// Flat copy of the board used for what-if probing
struct Sheet<'a> {
    cells: Vec<Option<BlockId>>,
    width: i32,
    height: i32,
    catalog: &'a BlockCatalog,
}

impl<'a> Sheet<'a> {
    fn from_grid(grid: &Grid, catalog: &'a BlockCatalog) -> Self {
        Self {
            cells: grid.block_sheet(),
            width: grid.width() as i32,
            height: grid.height() as i32,
            catalog,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    /// Type at a slot, for run purposes: present and matchable
    fn type_at(&self, x: i32, y: i32) -> Option<BlockId> {
        let id = self.cells[self.index(x, y)?]?;
        self.catalog.get(id).filter(|d| d.matchable).map(|_| id)
    }

    fn swappable(&self, idx: usize) -> bool {
        self.cells[idx]
            .and_then(|id| self.catalog.get(id))
            .is_some_and(|d| d.swappable)
    }

    /// Longest run through a slot after hypothetical edits
    fn run_at(&self, idx: usize) -> usize {
        let x = idx as i32 % self.width;
        let y = idx as i32 / self.width;
        let Some(id) = self.type_at(x, y) else {
            return 0;
        };

        let mut horizontal = 1;
        let mut s = x - 1;
        while self.type_at(s, y) == Some(id) {
            horizontal += 1;
            s -= 1;
        }
        s = x + 1;
        while self.type_at(s, y) == Some(id) {
            horizontal += 1;
            s += 1;
        }

        let mut vertical = 1;
        s = y - 1;
        while self.type_at(x, s) == Some(id) {
            vertical += 1;
            s -= 1;
        }
        s = y + 1;
        while self.type_at(x, s) == Some(id) {
            vertical += 1;
            s += 1;
        }

        horizontal.max(vertical)
    }

    /// Probe one swap and undo it
    fn swap_makes_match(&mut self, a: usize, b: usize) -> bool {
        self.cells.swap(a, b);
        let hit = self.run_at(a) >= 3 || self.run_at(b) >= 3;
        self.cells.swap(a, b);
        hit
    }

    /// First producing swap in scan order
    fn find_hint(&mut self) -> Option<(usize, usize)> {
        for idx in 0..self.cells.len() {
            if !self.swappable(idx) {
                continue;
            }
            let x = idx as i32 % self.width;
            let y = idx as i32 / self.width;
            for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                let Some(other) = self.index(nx, ny) else {
                    continue;
                };
                if !self.swappable(other) {
                    continue;
                }
                if self.swap_makes_match(idx, other) {
                    return Some((idx, other));
                }
            }
        }
        None
    }
}

/// Find a swap the player could make right now
///
/// Returns the two slots to exchange, or `None` when the board is still
/// moving or no producing swap exists.
pub fn find_hint(grid: &Grid, catalog: &BlockCatalog) -> Option<(usize, usize)> {
    if !grid.all_idle() {
        return None;
    }
    Sheet::from_grid(grid, catalog).find_hint()
}

/// Find the smallest repair for a board without producing swaps
///
/// Tries every swappable slot against every other catalog type; the
/// first substitution that reopens a hint is returned as
/// `(slot, new type)`. `None` means no single substitution helps and the
/// board is truly stuck.
pub fn find_deadlock_fix(grid: &Grid, catalog: &BlockCatalog) -> Option<(usize, BlockId)> {
    if !grid.all_idle() {
        return None;
    }
    let mut sheet = Sheet::from_grid(grid, catalog);

    for idx in 0..sheet.cells.len() {
        if !sheet.swappable(idx) {
            continue;
        }
        let original = sheet.cells[idx];
        for candidate in 0..catalog.len() as BlockId {
            if Some(candidate) == original {
                continue;
            }
            sheet.cells[idx] = Some(candidate);
            let found = sheet.find_hint().is_some();
            sheet.cells[idx] = original;
            if found {
                return Some((idx, candidate));
            }
        }
    }
    None
}
