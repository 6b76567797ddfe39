//! Engine module - automated play on top of the core board

pub mod bot;

pub use bot::{BotMove, BotPlayer};
