//! Terminal match-3 runner (default binary).
//!
//! This is the primary gameplay entrypoint.
//! It uses crossterm for input and a custom framebuffer-based renderer
//! (no ratatui widgets/layout).

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossterm::event::{self, Event, KeyEventKind};

use tui_gems::core::{Board, BoardEvent};
use tui_gems::engine::BotPlayer;
use tui_gems::input::{handle_key_event, should_quit, InputHandler};
use tui_gems::term::{GameView, HudState, TerminalRenderer, Viewport};
use tui_gems::types::{
    BoardConfig, ComboPolicy, GravityDir, UiAction, HINT_DELAY_MS, TICK_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunConfig {
    board: BoardConfig,
    bot: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(cfg) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, cfg);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(term: &mut TerminalRenderer, cfg: RunConfig) -> Result<()> {
    let mut board = Board::new(cfg.board);
    let view = GameView::default();
    let mut input_handler = InputHandler::new();
    let mut bot = cfg.bot.then(|| BotPlayer::new(cfg.board.seed.wrapping_add(1)));

    let mut hud = HudState::default();
    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);
    // Milliseconds since the last key press; drives the automatic hint.
    let mut idle_ms: u32 = 0;

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let mut fb = view.render(&board, &hud, Viewport::new(w, h));
        term.draw_swap(&mut fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        idle_ms = 0;

                        if let Some(action) = input_handler.handle_key_press(key.code) {
                            apply_ui_action(&mut board, &mut hud, action);
                        }

                        if let Some(action) = handle_key_event(key) {
                            match action {
                                UiAction::CursorLeft
                                | UiAction::CursorRight
                                | UiAction::CursorUp
                                | UiAction::CursorDown => {
                                    // Handled by input_handler above.
                                }
                                UiAction::Restart => {
                                    board = Board::new(cfg.board);
                                    hud = HudState::default();
                                    input_handler.reset();
                                    if let Some(bot) = bot.as_mut() {
                                        bot.reset();
                                    }
                                }
                                _ => apply_ui_action(&mut board, &mut hud, action),
                            }
                        }
                    }
                    KeyEventKind::Repeat => {
                        // Ignore terminal auto-repeat; DAS/ARR handles repeats internally.
                    }
                    KeyEventKind::Release => {
                        input_handler.handle_key_release(key.code);
                    }
                }
            }
        }

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();

            for action in input_handler.update(TICK_MS) {
                apply_ui_action(&mut board, &mut hud, action);
            }

            if !hud.paused {
                board.tick(TICK_MS);
                if let Some(bot) = bot.as_mut() {
                    if bot.update(&mut board, TICK_MS).is_some() {
                        hud.hint = None;
                    }
                }
            }

            idle_ms = idle_ms.saturating_add(TICK_MS);
            if idle_ms >= HINT_DELAY_MS && hud.hint.is_none() && !board.is_busy() {
                hud.hint = board.find_hint();
            }

            drain_events(&mut board, &mut hud);
        }
    }
}

fn apply_ui_action(board: &mut Board, hud: &mut HudState, action: UiAction) {
    match action {
        UiAction::CursorLeft => move_cursor(board, hud, -1, 0),
        UiAction::CursorRight => move_cursor(board, hud, 1, 0),
        UiAction::CursorUp => move_cursor(board, hud, 0, -1),
        UiAction::CursorDown => move_cursor(board, hud, 0, 1),
        UiAction::Select => select(board, hud),
        UiAction::Hint => hud.hint = board.find_hint(),
        UiAction::Pause => hud.paused = !hud.paused,
        // Handled by the main loop.
        UiAction::Restart | UiAction::Quit => {}
    }
}

fn move_cursor(board: &Board, hud: &mut HudState, dx: i32, dy: i32) {
    let (w, h) = (board.grid().width() as i32, board.grid().height() as i32);
    hud.cursor.0 = (hud.cursor.0 + dx).clamp(0, w - 1);
    hud.cursor.1 = (hud.cursor.1 + dy).clamp(0, h - 1);
}

/// Grab the slot under the cursor, or swap the grabbed slot with it.
///
/// Selecting the grabbed slot again cancels; selecting a non-adjacent slot
/// moves the grab there instead.
fn select(board: &mut Board, hud: &mut HudState) {
    match hud.selected {
        None => hud.selected = Some(hud.cursor),
        Some(sel) if sel == hud.cursor => hud.selected = None,
        Some(sel) => {
            let (dx, dy) = (hud.cursor.0 - sel.0, hud.cursor.1 - sel.1);
            if dx.abs() + dy.abs() == 1 {
                if let Some(origin) = board.grid().index(sel.0, sel.1) {
                    if board.try_swap(origin, dx, dy).accepted {
                        hud.hint = None;
                    }
                }
                hud.selected = None;
            } else {
                hud.selected = Some(hud.cursor);
            }
        }
    }
}

/// Fold board events into session score and status flags.
///
/// Scoring is presentation only: ten points per destroyed block scaled by
/// the combo counter, five per chip of multi-hit damage.
fn drain_events(board: &mut Board, hud: &mut HudState) {
    let combo = board.combo().combo().max(1) as u64;
    for event in board.take_events() {
        match event {
            BoardEvent::Explode { .. } => hud.score += 10 * combo,
            BoardEvent::Damage { .. } => hud.score += 5,
            BoardEvent::Deadlocked => hud.deadlocked = true,
            BoardEvent::DeadlockFixed { .. } => hud.deadlocked = false,
            BoardEvent::BadMove { .. }
            | BoardEvent::UnknownAction { .. }
            | BoardEvent::UnknownBlock { .. } => {}
        }
    }
}

fn parse_args(args: &[String]) -> Result<Option<RunConfig>> {
    let mut board = BoardConfig::default();
    let mut bot = false;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                return Ok(None);
            }
            "--seed" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --seed"))?;
                board.seed = v
                    .parse::<u32>()
                    .map_err(|_| anyhow!("invalid --seed value: {}", v))?;
            }
            "--width" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --width"))?;
                board.width = parse_dimension(v, "--width")?;
            }
            "--height" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --height"))?;
                board.height = parse_dimension(v, "--height")?;
            }
            "--gravity" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --gravity"))?;
                board.gravity = GravityDir::from_str(v)
                    .ok_or_else(|| anyhow!("invalid --gravity value: {}", v))?;
            }
            "--types" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --types"))?;
                let n = v
                    .parse::<u8>()
                    .map_err(|_| anyhow!("invalid --types value: {}", v))?;
                if !(3..=6).contains(&n) {
                    return Err(anyhow!("--types must be between 3 and 6, got {}", n));
                }
                board.active_types = n;
            }
            "--combo" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --combo"))?;
                board.combo_policy = ComboPolicy::from_str(v)
                    .ok_or_else(|| anyhow!("invalid --combo value: {}", v))?;
            }
            "--bot" => {
                bot = true;
            }
            other => {
                return Err(anyhow!("unknown argument: {}", other));
            }
        }
        i += 1;
    }

    Ok(Some(RunConfig { board, bot }))
}

fn parse_dimension(v: &str, flag: &str) -> Result<u8> {
    let n = v
        .parse::<u8>()
        .map_err(|_| anyhow!("invalid {} value: {}", flag, v))?;
    if !(3..=32).contains(&n) {
        return Err(anyhow!("{} must be between 3 and 32, got {}", flag, n));
    }
    Ok(n)
}

fn print_usage() {
    println!("tui-gems: deterministic terminal match-3");
    println!();
    println!("USAGE:");
    println!("  tui-gems [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --seed <u32>      board seed (default 1)");
    println!("  --width <cells>   board width, 3-32 (default 7)");
    println!("  --height <cells>  board height, 3-32 (default 9)");
    println!("  --gravity <dir>   down | up | left | right (default down)");
    println!("  --types <n>       active gem types, 3-6 (default 5)");
    println!("  --combo <policy>  decay | decay-paused | move (default decay)");
    println!("  --bot             let the autoplayer drive");
    println!("  -h, --help        show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_uses_defaults() {
        let cfg = parse_args(&[]).unwrap().unwrap();
        assert_eq!(cfg.board, BoardConfig::default());
        assert!(!cfg.bot);
    }

    #[test]
    fn parse_args_reads_all_flags() {
        let cfg = parse_args(&args(&[
            "--seed", "42", "--width", "8", "--height", "10", "--gravity", "up", "--types", "4",
            "--combo", "move", "--bot",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(cfg.board.seed, 42);
        assert_eq!(cfg.board.width, 8);
        assert_eq!(cfg.board.height, 10);
        assert_eq!(cfg.board.gravity, GravityDir::Up);
        assert_eq!(cfg.board.active_types, 4);
        assert_eq!(cfg.board.combo_policy, ComboPolicy::MoveScoped);
        assert!(cfg.bot);
    }

    #[test]
    fn parse_args_rejects_bad_values() {
        assert!(parse_args(&args(&["--width", "2"])).is_err());
        assert!(parse_args(&args(&["--gravity", "sideways"])).is_err());
        assert!(parse_args(&args(&["--seed"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn parse_args_help_short_circuits() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
        assert!(parse_args(&args(&["-h", "--frobnicate"])).unwrap().is_none());
    }

    #[test]
    fn cursor_clamps_to_board_edges() {
        let board = Board::new(BoardConfig::default());
        let mut hud = HudState::default();
        move_cursor(&board, &mut hud, -1, 0);
        assert_eq!(hud.cursor, (0, 0));
        for _ in 0..100 {
            move_cursor(&board, &mut hud, 1, 1);
        }
        assert_eq!(hud.cursor, (6, 8));
    }

    #[test]
    fn select_grabs_cancels_and_regrabs() {
        let mut board = Board::new(BoardConfig::default());
        let mut hud = HudState::default();

        select(&mut board, &mut hud);
        assert_eq!(hud.selected, Some((0, 0)));

        // Selecting the grabbed slot again cancels.
        select(&mut board, &mut hud);
        assert_eq!(hud.selected, None);

        // A non-adjacent select moves the grab instead of swapping.
        select(&mut board, &mut hud);
        hud.cursor = (2, 2);
        select(&mut board, &mut hud);
        assert_eq!(hud.selected, Some((2, 2)));
    }
}
