//! Typed events reported by the board
//!
//! The board accumulates events in an outbox during `tick`/`try_swap` and
//! the host drains them once per frame with `Board::take_events`. Keeping
//! them as plain records instead of callbacks keeps the core free of host
//! references and makes replays comparable event-for-event.

use crate::core::actions::ActionKind;
use crate::types::BlockId;

/// Facts the board reports to its host, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A block was destroyed and entered its removal countdown
    Explode { cell: usize, block: BlockId, x: i32, y: i32 },
    /// An effect chipped a multi-hit block without destroying it
    Damage { cell: usize, hp: u8, max_hp: u8 },
    /// A structurally valid swap was rejected
    BadMove { x: i32, y: i32 },
    /// A block was replaced to restore a legal move
    DeadlockFixed { cell: usize, block: BlockId },
    /// No legal move exists and no single-cell replacement restores one
    Deadlocked,
    /// An action kind with no registered strategy was dispatched
    UnknownAction { kind: ActionKind },
    /// A cell held a block id missing from the catalog
    UnknownBlock { id: BlockId },
}
