//! Block catalog - the data-driven table of block types
//!
//! Every block on the board is described by a [`BlockDefinition`] looked up
//! by id. The definition carries identity, presentation hooks, spawn weight,
//! physics flags, hit-points, the run-length trigger table, the on-settle
//! trigger fired when the block lands on the gravity-exit edge, and the
//! chain reaction used when the block is destroyed by an effect. The engine
//! itself hardcodes no block type; swapping in a custom table changes the
//! game.
//!
//! Ids index the table directly, so `defs[id as usize].id == id` must hold.
//! [`BlockCatalog::standard`] ships the default set: six gems, ice (2 hp,
//! always in the draw pool), and the reserved stone and prism entries.

use crate::core::actions::ActionKind;
use crate::core::rng::SimpleRng;
use crate::types::{BlockId, PRISM_ID, STONE_ID};

/// Static description of one block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDefinition {
    pub id: BlockId,
    pub name: &'static str,
    /// Symbol drawn by the terminal view
    pub glyph: char,
    /// Fill and icon colors as (r, g, b)
    pub color_fill: (u8, u8, u8),
    pub color_icon: (u8, u8, u8),
    /// Relative spawn weight; 0 = never drawn naturally
    pub weight: u32,
    pub max_hp: u8,
    pub swappable: bool,
    pub matchable: bool,
    pub indestructible: bool,
    /// Pinned in place; acts as a solid floor for compaction
    pub gravity_immune: bool,
    /// Drawn regardless of the active-types cutoff
    pub always_in_pool: bool,
    /// Actions keyed by run length 3, 4, 5+; `None` = plain destruction
    pub triggers: [Option<ActionKind>; 3],
    /// Action fired when the block settles on the gravity-exit edge
    pub on_settle: Option<ActionKind>,
    /// Action chained when an effect destroys this block
    pub reaction: Option<ActionKind>,
}

impl BlockDefinition {
    /// Trigger for a run of `len` cells; lengths past 5 use the 5 slot
    pub fn trigger_for_run(&self, len: usize) -> Option<ActionKind> {
        if len < 3 {
            return None;
        }
        self.triggers[(len - 3).min(2)]
    }

    /// Action chained when this block is destroyed by an explosion
    pub fn chain_reaction(&self) -> Option<ActionKind> {
        self.reaction.or(self.triggers[0])
    }
}

/// Table of block definitions indexed by id
#[derive(Debug, Clone)]
pub struct BlockCatalog {
    defs: Vec<BlockDefinition>,
}

impl BlockCatalog {
    /// Build a catalog from a definition table; ids must equal indices
    pub fn new(defs: Vec<BlockDefinition>) -> Self {
        debug_assert!(defs.iter().enumerate().all(|(i, d)| d.id as usize == i));
        Self { defs }
    }

    /// The default table: gems 0-5, ice 6, stone 7, prism 8, bedrock 9
    pub fn standard() -> Self {
        let gem = |id, name, glyph, fill, icon, triggers| BlockDefinition {
            id,
            name,
            glyph,
            color_fill: fill,
            color_icon: icon,
            weight: 10,
            max_hp: 1,
            swappable: true,
            matchable: true,
            indestructible: false,
            gravity_immune: false,
            always_in_pool: false,
            triggers,
            on_settle: None,
            reaction: None,
        };

        Self::new(vec![
            gem(
                0,
                "ruby",
                '\u{25cf}',
                (205, 48, 62),
                (255, 128, 144),
                [None, Some(ActionKind::ExplodeSmall), Some(ActionKind::CreatePrism)],
            ),
            gem(
                1,
                "sapphire",
                '\u{25c6}',
                (48, 98, 222),
                (130, 170, 255),
                [None, Some(ActionKind::ClearRow), Some(ActionKind::CreatePrism)],
            ),
            gem(
                2,
                "emerald",
                '\u{25a0}',
                (36, 168, 84),
                (120, 230, 160),
                [None, Some(ActionKind::ClearCol), Some(ActionKind::CreatePrism)],
            ),
            gem(
                3,
                "topaz",
                '\u{25b2}',
                (226, 158, 32),
                (255, 214, 120),
                [None, Some(ActionKind::ExplodeSmall), Some(ActionKind::CreatePrism)],
            ),
            gem(
                4,
                "amethyst",
                '\u{2665}',
                (148, 66, 200),
                (208, 150, 255),
                [None, Some(ActionKind::MagicBonus), Some(ActionKind::CreatePrism)],
            ),
            gem(
                5,
                "opal",
                '\u{25cb}',
                (210, 210, 220),
                (255, 255, 255),
                [Some(ActionKind::ExplodeSmall), Some(ActionKind::ExplodeBig), Some(ActionKind::CreatePrism)],
            ),
            BlockDefinition {
                id: 6,
                name: "ice",
                glyph: '\u{2591}',
                color_fill: (140, 200, 230),
                color_icon: (220, 245, 255),
                weight: 3,
                max_hp: 2,
                swappable: true,
                matchable: true,
                indestructible: false,
                gravity_immune: false,
                always_in_pool: true,
                triggers: [None, None, None],
                on_settle: None,
                reaction: None,
            },
            BlockDefinition {
                id: STONE_ID,
                name: "stone",
                glyph: '\u{2593}',
                color_fill: (120, 116, 110),
                color_icon: (160, 156, 150),
                weight: 0,
                max_hp: 1,
                swappable: false,
                matchable: false,
                indestructible: false,
                gravity_immune: false,
                always_in_pool: false,
                triggers: [None, None, None],
                on_settle: None,
                reaction: None,
            },
            BlockDefinition {
                id: PRISM_ID,
                name: "prism",
                glyph: '\u{2726}',
                color_fill: (235, 120, 200),
                color_icon: (255, 255, 255),
                weight: 0,
                max_hp: 1,
                swappable: true,
                matchable: true,
                indestructible: false,
                gravity_immune: false,
                always_in_pool: false,
                triggers: [
                    Some(ActionKind::ExplodeBig),
                    Some(ActionKind::ExplodeBig),
                    Some(ActionKind::ExplodeBig),
                ],
                on_settle: None,
                reaction: Some(ActionKind::ExplodeBig),
            },
            BlockDefinition {
                id: 9,
                name: "bedrock",
                glyph: '\u{2588}',
                color_fill: (70, 66, 64),
                color_icon: (96, 92, 90),
                weight: 0,
                max_hp: 1,
                swappable: false,
                matchable: false,
                indestructible: true,
                gravity_immune: true,
                always_in_pool: false,
                triggers: [None, None, None],
                on_settle: None,
                reaction: None,
            },
        ])
    }

    /// Look up a definition by id
    pub fn get(&self, id: BlockId) -> Option<&BlockDefinition> {
        self.defs.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Draw a random id from the spawn pool
    ///
    /// The pool is the first `active_types` entries plus every entry flagged
    /// always-in-pool, weighted by spawn weight. Returns `None` when the
    /// pool's total weight is zero.
    pub fn weighted_random_id(&self, rng: &mut SimpleRng, active_types: u8) -> Option<BlockId> {
        let in_pool = |d: &BlockDefinition| {
            d.weight > 0 && ((d.id as usize) < active_types as usize || d.always_in_pool)
        };

        let total: u32 = self.defs.iter().filter(|d| in_pool(d)).map(|d| d.weight).sum();
        if total == 0 {
            return None;
        }

        let mut roll = rng.next_range(total);
        for def in self.defs.iter().filter(|d| in_pool(d)) {
            if roll < def.weight {
                return Some(def.id);
            }
            roll -= def.weight;
        }
        None
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
