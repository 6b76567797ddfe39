//! Core module - pure board simulation with no external dependencies
//!
//! Everything under here is deterministic and free of I/O: the grid and
//! its cell state machine, the block catalog, cell physics, the match
//! engine, the action system, the hint/deadlock solver, and the board
//! orchestrator that ties them together. The terminal layers sit on top
//! and only ever observe through `Board` accessors and drained events.

pub mod actions;
pub mod board;
pub mod catalog;
pub mod events;
pub mod grid;
pub mod matcher;
pub mod physics;
pub mod rng;
pub mod solver;

// Re-export commonly used types
pub use actions::{ActionKind, ActionSystem};
pub use board::{Board, SwapOutcome};
pub use catalog::{BlockCatalog, BlockDefinition};
pub use events::BoardEvent;
pub use grid::{Cell, CellState, Grid};
pub use matcher::ComboMeter;
pub use rng::SimpleRng;
