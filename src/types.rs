//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Default board dimensions
pub const DEFAULT_BOARD_WIDTH: u8 = 7;
pub const DEFAULT_BOARD_HEIGHT: u8 = 9;
pub const DEFAULT_ACTIVE_TYPES: u8 = 5;

/// Game timing constants (in milliseconds)
pub const TICK_MS: u32 = 16;
pub const EXPLODE_DELAY_MS: u32 = 180;
pub const COMBO_DECAY_MS: u32 = 2000;
pub const COMBO_EXTEND_MS: u32 = 750;
pub const MAGIC_BONUS_MS: u32 = 3000;
pub const HINT_DELAY_MS: u32 = 5000;
pub const BOT_COOLDOWN_MS: u32 = 350;

/// Held-key cursor repeat: delay before auto-shift and repeat interval
pub const CURSOR_DAS_MS: u32 = 170;
pub const CURSOR_ARR_MS: u32 = 60;

/// Cell motion tuning (distances in cell units, time in milliseconds)
pub const FALL_ACCEL: f32 = 0.000_05;
pub const FALL_SPEED_MAX: f32 = 0.030;
pub const SWAP_SPEED: f32 = 0.012;
pub const DRIFT_SPEED: f32 = 0.020;

/// Chain reaction recursion cap; the destroy set is the real cycle guard,
/// this bounds pathological custom catalogs
pub const CHAIN_DEPTH_MAX: u8 = 16;

/// Catalog index of a block type
pub type BlockId = u8;

/// Reserved ids in the standard catalog
pub const STONE_ID: BlockId = 7;
pub const PRISM_ID: BlockId = 8;

/// Direction blocks fall toward (the gravity exit edge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GravityDir {
    Down,
    Up,
    Left,
    Right,
}

impl GravityDir {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "down" | "d" => Some(GravityDir::Down),
            "up" | "u" => Some(GravityDir::Up),
            "left" | "l" => Some(GravityDir::Left),
            "right" | "r" => Some(GravityDir::Right),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            GravityDir::Down => "down",
            GravityDir::Up => "up",
            GravityDir::Left => "left",
            GravityDir::Right => "right",
        }
    }

    /// Unit step from the entry edge toward the exit edge
    pub fn step(&self) -> (i32, i32) {
        match self {
            GravityDir::Down => (0, 1),
            GravityDir::Up => (0, -1),
            GravityDir::Left => (-1, 0),
            GravityDir::Right => (1, 0),
        }
    }

    /// True when lanes run along the y axis
    pub fn is_vertical(&self) -> bool {
        matches!(self, GravityDir::Down | GravityDir::Up)
    }
}

/// How the combo counter cools off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboPolicy {
    /// Counter decays on a timer; cascades and magic bonuses extend it.
    /// With `decay_while_busy` the timer also runs during cascades
    /// (single-player feel); without it the timer pauses while the board
    /// is in motion.
    TimeDecay { decay_while_busy: bool },
    /// Counter resets when a new swap is committed
    MoveScoped,
}

impl ComboPolicy {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "decay" => Some(ComboPolicy::TimeDecay { decay_while_busy: true }),
            "decay-paused" => Some(ComboPolicy::TimeDecay { decay_while_busy: false }),
            "move" => Some(ComboPolicy::MoveScoped),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComboPolicy::TimeDecay { decay_while_busy: true } => "decay",
            ComboPolicy::TimeDecay { decay_while_busy: false } => "decay-paused",
            ComboPolicy::MoveScoped => "move",
        }
    }
}

/// Board construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub width: u8,
    pub height: u8,
    pub gravity: GravityDir,
    pub active_types: u8,
    pub combo_policy: ComboPolicy,
    pub seed: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            gravity: GravityDir::Down,
            active_types: DEFAULT_ACTIVE_TYPES,
            combo_policy: ComboPolicy::TimeDecay { decay_while_busy: true },
            seed: 1,
        }
    }
}

/// Player intents produced by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    Select,
    Hint,
    Pause,
    Restart,
    Quit,
}
