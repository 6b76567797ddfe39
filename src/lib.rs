//! Deterministic match-3 board simulation with a terminal front end.
//!
//! The simulation lives in [`core`] and is pure: same seed and same moves
//! produce a bit-identical board, which makes replays and tests cheap.
//! [`engine`] adds an autoplay bot on top, [`input`] maps keys and held-key
//! repeats, and [`term`] draws the board into a diffed framebuffer.
//!
//! # Example
//!
//! ```
//! use tui_gems::core::Board;
//! use tui_gems::types::{BoardConfig, TICK_MS};
//!
//! let mut board = Board::new(BoardConfig::default());
//!
//! // Ask the solver for a producing swap and play it.
//! if let Some((a, b)) = board.find_hint() {
//!     let (ax, ay) = board.grid().coords(a);
//!     let (bx, by) = board.grid().coords(b);
//!     assert!(board.try_swap(a, bx - ax, by - ay).accepted);
//! }
//!
//! // Run the cascade to rest and drain what happened.
//! for _ in 0..4000 {
//!     if !board.is_busy() {
//!         break;
//!     }
//!     board.tick(TICK_MS);
//! }
//! assert!(!board.take_events().is_empty());
//! ```

pub mod core;
pub mod engine;
pub mod input;
pub mod term;
pub mod types;
