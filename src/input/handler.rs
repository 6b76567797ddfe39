//! DAS/ARR cursor repeat for terminal environments.
//!
//! Holding a direction key auto-shifts the cursor after a short delay and
//! then repeats at a fixed rate. Terminals that never emit key release
//! events are handled with a timeout on the last press.

use crossterm::event::KeyCode;

use arrayvec::ArrayVec;

use crate::types::{UiAction, CURSOR_ARR_MS, CURSOR_DAS_MS};

/// Direction currently held, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldDirection {
    Left,
    Right,
    Up,
    Down,
    None,
}

impl HeldDirection {
    fn from_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(HeldDirection::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(HeldDirection::Right),
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(HeldDirection::Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(HeldDirection::Down),
            _ => None,
        }
    }

    fn action(self) -> Option<UiAction> {
        match self {
            HeldDirection::Left => Some(UiAction::CursorLeft),
            HeldDirection::Right => Some(UiAction::CursorRight),
            HeldDirection::Up => Some(UiAction::CursorUp),
            HeldDirection::Down => Some(UiAction::CursorDown),
            HeldDirection::None => None,
        }
    }
}

/// Tracks held-key state for DAS/ARR handling.
#[derive(Debug, Clone)]
pub struct InputHandler {
    held: HeldDirection,
    last_key_time: std::time::Instant,
    das_timer: u32,
    arr_accumulator: u32,
    das_delay: u32,
    arr_rate: u32,
    key_release_timeout_ms: u32,
}

// In terminals without key-release events, a short timeout prevents a single tap
// from turning into a sustained "held" state that triggers DAS/ARR repeats.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(CURSOR_DAS_MS, CURSOR_ARR_MS)
    }

    pub fn with_config(das_delay: u32, arr_rate: u32) -> Self {
        Self {
            held: HeldDirection::None,
            last_key_time: std::time::Instant::now(),
            das_timer: 0,
            arr_accumulator: 0,
            das_delay,
            arr_rate,
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn key_release_timeout_ms(&self) -> u32 {
        self.key_release_timeout_ms
    }

    /// Returns the one-shot cursor move for a fresh press; a key already
    /// held repeats through [`update`](Self::update) instead.
    pub fn handle_key_press(&mut self, code: KeyCode) -> Option<UiAction> {
        let dir = HeldDirection::from_code(code)?;
        self.last_key_time = std::time::Instant::now();
        if self.held == dir {
            None
        } else {
            self.held = dir;
            self.das_timer = 0;
            self.arr_accumulator = 0;
            dir.action()
        }
    }

    pub fn handle_key_release(&mut self, code: KeyCode) {
        if HeldDirection::from_code(code) == Some(self.held) {
            self.held = HeldDirection::None;
            self.das_timer = 0;
            self.arr_accumulator = 0;
        }
    }

    pub fn update(&mut self, elapsed_ms: u32) -> ArrayVec<UiAction, 32> {
        let mut actions = ArrayVec::<UiAction, 32>::new();

        // Auto-release when terminal does not emit release events.
        let time_since_last_key = self.last_key_time.elapsed().as_millis() as u32;
        if time_since_last_key > self.key_release_timeout_ms && self.held != HeldDirection::None {
            self.held = HeldDirection::None;
            self.das_timer = 0;
            self.arr_accumulator = 0;
        }

        let Some(repeat) = self.held.action() else {
            self.das_timer = 0;
            self.arr_accumulator = 0;
            return actions;
        };

        let prev_das = self.das_timer;
        self.das_timer += elapsed_ms;

        if self.das_timer >= self.das_delay {
            let excess = if prev_das < self.das_delay {
                self.das_timer - self.das_delay
            } else {
                elapsed_ms
            };
            self.arr_accumulator += excess;

            while self.arr_accumulator >= self.arr_rate {
                let _ = actions.try_push(repeat);
                self.arr_accumulator -= self.arr_rate;
            }
        }

        actions
    }

    pub fn reset(&mut self) {
        self.held = HeldDirection::None;
        self.last_key_time = std::time::Instant::now();
        self.das_timer = 0;
        self.arr_accumulator = 0;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
