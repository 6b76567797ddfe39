//! Action system - special effects fired by match triggers
//!
//! Actions are a closed set of kinds dispatched through strategy objects
//! held in a registration table. Every strategy works against [`ActionCtx`]:
//! it may queue cells into the shared destroy set, chip hit-points, mutate
//! the grid, and recursively dispatch further actions through the system
//! reference it receives (chain reactions). Recursion is bounded by
//! [`CHAIN_DEPTH_MAX`]; the destroy-set membership check is the guard that
//! actually terminates explosive rings.
//!
//! The standard table wires the kinds the standard catalog references. A
//! custom table may re-register any kind; dispatching a kind with no entry
//! is a warning event and a no-op.

use std::fmt;

use crate::core::catalog::BlockCatalog;
use crate::core::events::BoardEvent;
use crate::core::grid::{CellState, Grid};
use crate::core::matcher::DestroySet;
use crate::core::rng::SimpleRng;
use crate::types::{BlockId, CHAIN_DEPTH_MAX, MAGIC_BONUS_MS, PRISM_ID};

/// The closed set of action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Noop,
    ExplodeSmall,
    ExplodeBig,
    ClearRow,
    ClearCol,
    MagicBonus,
    CreatePrism,
}

/// Mutable state shared by every strategy in one resolution pass
pub struct ActionCtx<'a> {
    pub grid: &'a mut Grid,
    pub catalog: &'a BlockCatalog,
    pub rng: &'a mut SimpleRng,
    pub destroy: &'a mut DestroySet,
    /// Combo-decay time granted by bonus actions, applied after the pass
    pub bonus_ms: &'a mut u32,
    pub events: &'a mut Vec<BoardEvent>,
}

impl ActionCtx<'_> {
    /// Apply one effect hit to a slot
    ///
    /// Empty, already-queued, already-exploding, and indestructible slots
    /// are skipped. A multi-hit block is chipped by one point and reported
    /// as damage instead of queued. With `chain`, a queued block's own
    /// reaction is dispatched recursively from its slot.
    pub fn hit(&mut self, idx: usize, depth: u8, system: &ActionSystem, chain: bool) {
        if self.destroy.contains(idx) {
            return;
        }
        let cell = self.grid.cell(idx);
        let Some(id) = cell.block else {
            return;
        };
        if cell.state == CellState::Exploding {
            return;
        }
        let Some(def) = self.catalog.get(id) else {
            self.events.push(BoardEvent::UnknownBlock { id });
            return;
        };
        if def.indestructible {
            return;
        }

        if cell.hp > 1 {
            let cell = self.grid.cell_mut(idx);
            cell.hp -= 1;
            self.events.push(BoardEvent::Damage {
                cell: idx,
                hp: cell.hp,
                max_hp: cell.max_hp,
            });
            return;
        }

        self.destroy.insert(idx);
        if chain {
            if let Some(reaction) = def.chain_reaction() {
                system.dispatch(reaction, idx, depth + 1, self);
            }
        }
    }
}

/// One effect implementation; `system` enables chain-reaction recursion
pub trait ActionStrategy {
    fn apply(&self, origin: usize, depth: u8, ctx: &mut ActionCtx<'_>, system: &ActionSystem);
}

/// Registration table from kind to strategy
pub struct ActionSystem {
    entries: Vec<(ActionKind, Box<dyn ActionStrategy>)>,
}

impl ActionSystem {
    /// An empty table
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// The table matching the standard catalog
    pub fn standard() -> Self {
        let mut system = Self::new();
        system.register(ActionKind::Noop, Box::new(Noop));
        system.register(ActionKind::ExplodeSmall, Box::new(Explosion { radius: 1 }));
        system.register(ActionKind::ExplodeBig, Box::new(Explosion { radius: 2 }));
        system.register(ActionKind::ClearRow, Box::new(LineClear { horizontal: true }));
        system.register(ActionKind::ClearCol, Box::new(LineClear { horizontal: false }));
        system.register(ActionKind::MagicBonus, Box::new(MagicBonus));
        system.register(
            ActionKind::CreatePrism,
            Box::new(CreateBlock { candidates: vec![PRISM_ID] }),
        );
        system
    }

    /// Install or replace the strategy for a kind
    pub fn register(&mut self, kind: ActionKind, strategy: Box<dyn ActionStrategy>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = strategy;
        } else {
            self.entries.push((kind, strategy));
        }
    }

    /// Run a kind's strategy at an origin slot
    ///
    /// Exceeding the recursion cap is a silent stop; an unregistered kind
    /// is reported and skipped.
    pub fn dispatch(&self, kind: ActionKind, origin: usize, depth: u8, ctx: &mut ActionCtx<'_>) {
        if depth >= CHAIN_DEPTH_MAX {
            return;
        }
        match self.entries.iter().find(|(k, _)| *k == kind) {
            Some((_, strategy)) => strategy.apply(origin, depth, ctx, self),
            None => ctx.events.push(BoardEvent::UnknownAction { kind }),
        }
    }
}

impl Default for ActionSystem {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ActionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<ActionKind> = self.entries.iter().map(|(k, _)| *k).collect();
        f.debug_struct("ActionSystem").field("kinds", &kinds).finish()
    }
}

/// Queue every cell within Chebyshev `radius` of the origin
///
/// Falling cells are exempt: mid-flight blocks pass through explosions.
pub struct Explosion {
    pub radius: i32,
}

impl ActionStrategy for Explosion {
    fn apply(&self, origin: usize, depth: u8, ctx: &mut ActionCtx<'_>, system: &ActionSystem) {
        let (ox, oy) = ctx.grid.coords(origin);
        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let Some(idx) = ctx.grid.index(ox + dx, oy + dy) else {
                    continue;
                };
                if ctx.grid.cell(idx).state == CellState::Falling {
                    continue;
                }
                ctx.hit(idx, depth, system, true);
            }
        }
    }
}

/// Queue the origin's full row or column
pub struct LineClear {
    pub horizontal: bool,
}

impl ActionStrategy for LineClear {
    fn apply(&self, origin: usize, depth: u8, ctx: &mut ActionCtx<'_>, system: &ActionSystem) {
        let (ox, oy) = ctx.grid.coords(origin);
        if self.horizontal {
            for x in 0..ctx.grid.width() as i32 {
                let Some(idx) = ctx.grid.index(x, oy) else {
                    continue;
                };
                ctx.hit(idx, depth, system, false);
            }
        } else {
            for y in 0..ctx.grid.height() as i32 {
                let Some(idx) = ctx.grid.index(ox, y) else {
                    continue;
                };
                ctx.hit(idx, depth, system, false);
            }
        }
    }
}

/// Grant combo-decay time; touches no cells
pub struct MagicBonus;

impl ActionStrategy for MagicBonus {
    fn apply(&self, _origin: usize, _depth: u8, ctx: &mut ActionCtx<'_>, _system: &ActionSystem) {
        *ctx.bonus_ms += MAGIC_BONUS_MS;
    }
}

/// Transform the origin into a drawn candidate type and rescue it
pub struct CreateBlock {
    pub candidates: Vec<BlockId>,
}

impl ActionStrategy for CreateBlock {
    fn apply(&self, origin: usize, _depth: u8, ctx: &mut ActionCtx<'_>, _system: &ActionSystem) {
        if self.candidates.is_empty() {
            return;
        }
        let pick = self.candidates[ctx.rng.next_range(self.candidates.len() as u32) as usize];
        let Some(def) = ctx.catalog.get(pick) else {
            ctx.events.push(BoardEvent::UnknownBlock { id: pick });
            return;
        };
        ctx.destroy.remove(origin);
        let (x, y) = ctx.grid.coords(origin);
        ctx.grid.put_block(x, y, Some(pick), def.max_hp);
    }
}

/// Table default for untriggered slots
pub struct Noop;

impl ActionStrategy for Noop {
    fn apply(&self, _origin: usize, _depth: u8, _ctx: &mut ActionCtx<'_>, _system: &ActionSystem) {}
}
