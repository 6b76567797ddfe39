//! Grid module - cell storage and geometry
//!
//! The grid is a width x height sheet of slots in a flat row-major vector
//! (index = y * width + x) for cache locality. Slots are permanent; blocks
//! move between them during compaction. Each slot carries its block id, a
//! lifecycle state, a continuous position for motion, and hit-points.
//!
//! Lane helpers map (gravity, lane, offset-from-exit-edge) to slot indices
//! so the physics pass can walk any gravity direction with one loop shape.

use arrayvec::ArrayVec;

use crate::types::{BlockId, GravityDir};

/// Lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// At rest (or drifting back to rest after a rejected swap)
    Idle,
    /// Mid swap animation toward `target`
    Swapping,
    /// Claimed by the current match pass, pending finalization
    Matched,
    /// Destruction countdown running
    Exploding,
    /// Relocated by compaction, moving toward `target`
    Falling,
}

/// One grid slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub block: Option<BlockId>,
    pub state: CellState,
    /// Visual position in cell units; equals `target` at rest
    pub pos: (f32, f32),
    /// The slot's own coordinates, where motion converges
    pub target: (f32, f32),
    /// Current speed in cells per ms along the active motion
    pub velocity: f32,
    /// Remaining destruction countdown
    pub explode_ms: u32,
    pub hp: u8,
    pub max_hp: u8,
}

impl Cell {
    /// An empty slot at rest on its own coordinates
    pub fn empty_at(x: u8, y: u8) -> Self {
        Self {
            block: None,
            state: CellState::Idle,
            pos: (x as f32, y as f32),
            target: (x as f32, y as f32),
            velocity: 0.0,
            explode_ms: 0,
            hp: 0,
            max_hp: 0,
        }
    }

    /// True when the slot holds a block with no motion or countdown pending
    pub fn is_settled(&self) -> bool {
        self.state == CellState::Idle && self.pos == self.target
    }
}

/// The cell sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u8,
    height: u8,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an all-empty grid
    pub fn new(width: u8, height: u8) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::empty_at(x, y));
            }
        }
        Self { width, height, cells }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width as i32 || y < 0 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Coordinates of a slot index
    #[inline(always)]
    pub fn coords(&self, idx: usize) -> (i32, i32) {
        (
            (idx % self.width as usize) as i32,
            (idx / self.width as usize) as i32,
        )
    }

    /// Borrow a slot by index
    #[inline(always)]
    pub fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    /// Mutably borrow a slot by index
    #[inline(always)]
    pub fn cell_mut(&mut self, idx: usize) -> &mut Cell {
        &mut self.cells[idx]
    }

    /// Get the slot at (x, y), None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    /// Mutable slot at (x, y), None if out of bounds
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        match self.index(x, y) {
            Some(idx) => Some(&mut self.cells[idx]),
            None => None,
        }
    }

    /// Block id at (x, y); None when empty or out of bounds
    pub fn block_at(&self, x: i32, y: i32) -> Option<BlockId> {
        self.get(x, y).and_then(|c| c.block)
    }

    /// Install a block at rest with the given hit-points, or clear the slot
    ///
    /// Resets motion and countdown state; used by board setup, the deadlock
    /// fix, and block-creating actions. Returns false if out of bounds.
    pub fn put_block(&mut self, x: i32, y: i32, block: Option<BlockId>, hp: u8) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let mut cell = Cell::empty_at(x as u8, y as u8);
        cell.block = block;
        if block.is_some() {
            cell.hp = hp;
            cell.max_hp = hp;
        }
        self.cells[idx] = cell;
        true
    }

    /// Exchange the payloads of two slots; motion state stays put
    pub fn swap_blocks(&mut self, a: usize, b: usize) {
        if a == b || a >= self.cells.len() || b >= self.cells.len() {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.cells.split_at_mut(hi);
        let first = &mut head[lo];
        let second = &mut tail[0];
        std::mem::swap(&mut first.block, &mut second.block);
        std::mem::swap(&mut first.hp, &mut second.hp);
        std::mem::swap(&mut first.max_hp, &mut second.max_hp);
    }

    /// The 4-neighborhood of a slot
    pub fn neighbors4(&self, idx: usize) -> ArrayVec<usize, 4> {
        let (x, y) = self.coords(idx);
        let mut out = ArrayVec::new();
        for (dx, dy) in [(0, -1), (-1, 0), (1, 0), (0, 1)] {
            if let Some(n) = self.index(x + dx, y + dy) {
                out.push(n);
            }
        }
        out
    }

    /// Number of lanes for a gravity direction
    pub fn lane_count(&self, gravity: GravityDir) -> usize {
        if gravity.is_vertical() {
            self.width as usize
        } else {
            self.height as usize
        }
    }

    /// Slots per lane for a gravity direction
    pub fn lane_len(&self, gravity: GravityDir) -> usize {
        if gravity.is_vertical() {
            self.height as usize
        } else {
            self.width as usize
        }
    }

    /// Slot index at offset `k` from the gravity-exit edge of a lane
    ///
    /// `k = 0` is the exit edge; `k = lane_len - 1` is the entry edge.
    #[inline(always)]
    pub fn lane_cell(&self, gravity: GravityDir, lane: usize, k: usize) -> usize {
        let w = self.width as usize;
        let h = self.height as usize;
        match gravity {
            GravityDir::Down => (h - 1 - k) * w + lane,
            GravityDir::Up => k * w + lane,
            GravityDir::Left => lane * w + k,
            GravityDir::Right => lane * w + (w - 1 - k),
        }
    }

    /// True when the slot lies on the gravity-exit edge
    pub fn is_exit_edge(&self, gravity: GravityDir, idx: usize) -> bool {
        let (x, y) = self.coords(idx);
        match gravity {
            GravityDir::Down => y == self.height as i32 - 1,
            GravityDir::Up => y == 0,
            GravityDir::Left => x == 0,
            GravityDir::Right => x == self.width as i32 - 1,
        }
    }

    /// True when every slot is in the Idle state with its motion converged
    ///
    /// Empty slots count as idle; a board that cannot refill still goes
    /// quiet.
    pub fn all_idle(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.state == CellState::Idle && c.pos == c.target)
    }

    /// Snapshot of the type sheet, for solver probing
    pub fn block_sheet(&self) -> Vec<Option<BlockId>> {
        self.cells.iter().map(|c| c.block).collect()
    }

    /// Iterate all slots with indices
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate()
    }
}
