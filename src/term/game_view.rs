//! GameView: maps `core::Board` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! Blocks draw at their interpolated positions, so gliding swaps and
//! falling columns animate without the view keeping any state of its own.
//! Everything the board does not know (cursor, grab selection, shown hint,
//! session score, pause) comes in through [`HudState`].

use crate::core::catalog::BlockCatalog;
use crate::core::grid::{Cell as GridCell, CellState};
use crate::core::Board;
use crate::term::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::types::EXPLODE_DELAY_MS;

const PLAY_BG: Rgb = Rgb::new(30, 30, 40);
const CURSOR_BG: Rgb = Rgb::new(70, 70, 110);
const SELECT_BG: Rgb = Rgb::new(110, 80, 30);
const HINT_BG: Rgb = Rgb::new(30, 90, 45);
const EXPLODE_GLYPH: char = '✶';

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Session state layered over the board by the main loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct HudState {
    /// Cursor slot in board coordinates.
    pub cursor: (i32, i32),
    /// Slot grabbed for the next swap, if any.
    pub selected: Option<(i32, i32)>,
    /// Hint pair as grid indices, shown until the next move.
    pub hint: Option<(usize, usize)>,
    pub score: u64,
    pub paused: bool,
    pub deadlocked: bool,
}

/// Board frame placement inside the viewport.
#[derive(Debug, Clone, Copy)]
struct Frame {
    start_x: u16,
    start_y: u16,
    px_w: u16,
    px_h: u16,
}

/// A lightweight terminal view of the board.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self { cell_w, cell_h }
    }

    /// Render the board and hud into a framebuffer.
    pub fn render(&self, board: &Board, hud: &HudState, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        fb.clear(Cell::new(' ', CellStyle::default()));

        let grid = board.grid();
        let px_w = grid.width() as u16 * self.cell_w;
        let px_h = grid.height() as u16 * self.cell_h;
        let frame = Frame {
            start_x: viewport.width.saturating_sub(px_w + 2) / 2,
            start_y: viewport.height.saturating_sub(px_h + 2) / 2,
            px_w,
            px_h,
        };

        let bg = CellStyle {
            fg: Rgb::new(80, 80, 90),
            bg: PLAY_BG,
            bold: false,
            dim: false,
        };
        let border = CellStyle {
            fg: Rgb::new(200, 200, 200),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: false,
        };

        fb.fill_rect(frame.start_x + 1, frame.start_y + 1, frame.px_w, frame.px_h, ' ', bg);
        self.draw_border(&mut fb, &frame, border);

        // Empty slots and slot highlights first, so blocks draw over them.
        for (idx, cell) in grid.iter() {
            let (x, y) = grid.coords(idx);
            let slot_bg = slot_bg(hud, idx, x, y);
            if cell.block.is_none() {
                let style = CellStyle {
                    fg: Rgb::new(90, 90, 100),
                    bg: slot_bg,
                    bold: false,
                    dim: true,
                };
                self.fill_slot(&mut fb, &frame, x, y, '·', style);
            } else if slot_bg != PLAY_BG {
                self.fill_slot(&mut fb, &frame, x, y, ' ', CellStyle { bg: slot_bg, ..bg });
            }
        }

        // Settled blocks, then movers over them.
        for moving in [false, true] {
            for (idx, cell) in grid.iter() {
                let is_moving =
                    matches!(cell.state, CellState::Falling | CellState::Swapping);
                if cell.block.is_none() || is_moving != moving {
                    continue;
                }
                let (x, y) = grid.coords(idx);
                let slot_bg = slot_bg(hud, idx, x, y);
                self.draw_block(&mut fb, &frame, board.catalog(), cell, slot_bg);
            }
        }

        self.draw_side_panel(&mut fb, board, hud, viewport, &frame);
        self.draw_controls_line(&mut fb, viewport);

        if hud.paused {
            self.draw_overlay_text(&mut fb, &frame, "PAUSED");
        } else if hud.deadlocked {
            self.draw_overlay_text(&mut fb, &frame, "DEADLOCKED");
        }

        fb
    }

    fn draw_block(
        &self,
        fb: &mut FrameBuffer,
        frame: &Frame,
        catalog: &BlockCatalog,
        cell: &GridCell,
        slot_bg: Rgb,
    ) {
        let Some(id) = cell.block else {
            return;
        };
        let Some((px, py)) = self.cell_px(frame, cell.pos) else {
            return;
        };
        let Some(def) = catalog.get(id) else {
            let style = CellStyle {
                bg: slot_bg,
                ..CellStyle::default()
            };
            fb.fill_rect(px, py, self.cell_w, self.cell_h, '?', style);
            return;
        };

        let (ch, style) = match cell.state {
            CellState::Exploding => {
                let t = (cell.explode_ms as f32 / EXPLODE_DELAY_MS as f32).clamp(0.0, 1.0);
                let style = CellStyle {
                    fg: Rgb::new(255, 255, 255).scaled(t),
                    bg: Rgb::from(def.color_fill).scaled(t),
                    bold: true,
                    dim: false,
                };
                (EXPLODE_GLYPH, style)
            }
            _ => {
                let bg = if slot_bg == PLAY_BG {
                    def.color_fill.into()
                } else {
                    slot_bg
                };
                let style = CellStyle {
                    fg: def.color_icon.into(),
                    bg,
                    bold: true,
                    // Damaged multi-hit blocks read as cracked.
                    dim: cell.hp < cell.max_hp,
                };
                (def.glyph, style)
            }
        };
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    /// Interpolated position to framebuffer pixel, clipped to the play area.
    ///
    /// Refill blocks spawn beyond the entry edge; the parts still outside
    /// the frame simply do not draw.
    fn cell_px(&self, frame: &Frame, pos: (f32, f32)) -> Option<(u16, u16)> {
        let px = (pos.0 * self.cell_w as f32).round() as i32;
        let py = (pos.1 * self.cell_h as f32).round() as i32;
        if px < 0 || py < 0 {
            return None;
        }
        let (px, py) = (px as u16, py as u16);
        if px + self.cell_w > frame.px_w || py + self.cell_h > frame.px_h {
            return None;
        }
        Some((frame.start_x + 1 + px, frame.start_y + 1 + py))
    }

    fn fill_slot(
        &self,
        fb: &mut FrameBuffer,
        frame: &Frame,
        x: i32,
        y: i32,
        ch: char,
        style: CellStyle,
    ) {
        let px = frame.start_x + 1 + x as u16 * self.cell_w;
        let py = frame.start_y + 1 + y as u16 * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_border(&self, fb: &mut FrameBuffer, frame: &Frame, style: CellStyle) {
        let (x, y) = (frame.start_x, frame.start_y);
        let (w, h) = (frame.px_w + 2, frame.px_h + 2);
        if w < 2 || h < 2 {
            return;
        }

        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        board: &Board,
        hud: &HudState,
        viewport: Viewport,
        frame: &Frame,
    ) {
        let panel_x = frame.start_x.saturating_add(frame.px_w + 2).saturating_add(2);
        if panel_x >= viewport.width {
            return;
        }
        let panel_w = viewport.width - panel_x;
        if panel_w < 12 {
            return;
        }

        let label = CellStyle {
            fg: Rgb::new(220, 220, 220),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        let value = CellStyle {
            fg: Rgb::new(200, 200, 200),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: false,
        };

        let mut y = frame.start_y;
        fb.put_str(panel_x, y, "SCORE", label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, &format!("{}", hud.score), value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "COMBO", label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, &format!("x{}", board.combo().combo()), value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "BEST", label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, &format!("x{}", board.combo().best()), value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "GRAVITY", label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, board.cfg().gravity.as_str(), value);
    }

    fn draw_controls_line(&self, fb: &mut FrameBuffer, viewport: Viewport) {
        if viewport.height < 2 {
            return;
        }
        let style = CellStyle {
            fg: Rgb::new(130, 130, 140),
            bg: Rgb::new(0, 0, 0),
            bold: false,
            dim: true,
        };
        fb.put_str(
            1,
            viewport.height - 1,
            "arrows move  enter swap  h hint  p pause  r restart  q quit",
            style,
        );
    }

    fn draw_overlay_text(&self, fb: &mut FrameBuffer, frame: &Frame, text: &str) {
        let mid_y = frame.start_y.saturating_add((frame.px_h + 2) / 2);
        let text_w = text.chars().count() as u16;
        let x = frame
            .start_x
            .saturating_add((frame.px_w + 2).saturating_sub(text_w) / 2);
        let style = CellStyle {
            fg: Rgb::new(255, 255, 255),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        fb.put_str(x, mid_y, text, style);
    }
}

/// Background for a slot: grab selection beats cursor beats hint.
fn slot_bg(hud: &HudState, idx: usize, x: i32, y: i32) -> Rgb {
    if hud.selected == Some((x, y)) {
        return SELECT_BG;
    }
    if hud.cursor == (x, y) {
        return CURSOR_BG;
    }
    if let Some((a, b)) = hud.hint {
        if idx == a || idx == b {
            return HINT_BG;
        }
    }
    PLAY_BG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::ActionKind;
    use crate::core::catalog::BlockDefinition;
    use crate::types::{BlockId, BoardConfig, TICK_MS};

    fn gem(id: BlockId, glyph: char) -> BlockDefinition {
        BlockDefinition {
            id,
            name: "test",
            glyph,
            color_fill: (10, 20, 30),
            color_icon: (200, 210, 220),
            weight: 0,
            max_hp: 1,
            swappable: true,
            matchable: true,
            indestructible: false,
            gravity_immune: false,
            always_in_pool: false,
            triggers: [None, None, None],
            on_settle: None,
            reaction: None,
        }
    }

    fn empty_board(w: u8, h: u8, glyphs: &[char]) -> Board {
        let defs = glyphs
            .iter()
            .enumerate()
            .map(|(i, &g)| gem(i as BlockId, g))
            .collect();
        let cfg = BoardConfig {
            width: w,
            height: h,
            ..BoardConfig::default()
        };
        let mut board = Board::with_catalog(cfg, BlockCatalog::new(defs));
        board.take_events();
        board
    }

    fn row_text(fb: &FrameBuffer, y: u16) -> String {
        (0..fb.width())
            .map(|x| fb.get(x, y).map_or(' ', |c| c.ch))
            .collect()
    }

    #[test]
    fn test_frame_is_centered_with_corners() {
        let board = Board::new(BoardConfig::default());
        let view = GameView::default();
        let fb = view.render(&board, &HudState::default(), Viewport::new(40, 20));

        // 7x9 board at 2x1 cells: 16x11 frame centered in 40x20.
        assert_eq!(fb.get(12, 4).map(|c| c.ch), Some('┌'));
        assert_eq!(fb.get(27, 4).map(|c| c.ch), Some('┐'));
        assert_eq!(fb.get(12, 14).map(|c| c.ch), Some('└'));
        assert_eq!(fb.get(27, 14).map(|c| c.ch), Some('┘'));
    }

    #[test]
    fn test_idle_block_draws_catalog_glyph_and_colors() {
        let mut board = empty_board(4, 3, &['◉', 'x']);
        board.place(0, 0, Some(0));
        let view = GameView::default();
        let hud = HudState {
            cursor: (3, 2),
            ..HudState::default()
        };
        let fb = view.render(&board, &hud, Viewport::new(40, 20));

        // 4x3 board: 10x5 frame at (15, 7); cell (0,0) starts at (16, 8).
        let cell = fb.get(16, 8).unwrap();
        assert_eq!(cell.ch, '◉');
        assert_eq!(cell.style.fg, Rgb::new(200, 210, 220));
        assert_eq!(cell.style.bg, Rgb::new(10, 20, 30));
        assert!(cell.style.bold);

        // Neighbor slot is empty: grid dot on the play background.
        let dot = fb.get(18, 8).unwrap();
        assert_eq!(dot.ch, '·');
        assert_eq!(dot.style.bg, PLAY_BG);
    }

    #[test]
    fn test_cursor_selection_and_hint_backgrounds() {
        let mut board = empty_board(4, 3, &['◉', 'x']);
        board.place(0, 0, Some(0));
        board.place(1, 0, Some(1));
        let hud = HudState {
            cursor: (0, 0),
            selected: Some((1, 0)),
            hint: Some((
                board.grid().index(2, 0).unwrap(),
                board.grid().index(3, 0).unwrap(),
            )),
            ..HudState::default()
        };
        let view = GameView::default();
        let fb = view.render(&board, &hud, Viewport::new(40, 20));

        assert_eq!(fb.get(16, 8).unwrap().style.bg, CURSOR_BG);
        assert_eq!(fb.get(18, 8).unwrap().style.bg, SELECT_BG);
        // Hint covers empty slots too.
        assert_eq!(fb.get(20, 8).unwrap().style.bg, HINT_BG);
        assert_eq!(fb.get(22, 8).unwrap().style.bg, HINT_BG);
    }

    #[test]
    fn test_swap_glide_draws_at_interpolated_rows() {
        let mut board = empty_board(5, 4, &['0', '1', '2', '3', '4']);
        for y in 0..4 {
            for x in 0..5 {
                board.place(x, y, Some(((x + y) % 3) as BlockId));
            }
        }
        board.place(1, 2, Some(3));
        board.place(2, 2, Some(4));
        board.place(3, 2, Some(3));
        board.place(2, 3, Some(3));

        let origin = board.grid().index(2, 2).unwrap();
        assert!(board.try_swap(origin, 0, 1).accepted);

        let view = GameView::default();
        let vp = Viewport::new(40, 20);
        // 5x4 board: 12x6 frame at (14, 7); cell (2,2) -> (19,10), (2,3) -> (19,11).

        // Just committed: payloads exchanged slots but not yet moved.
        let fb = view.render(&board, &HudState::default(), vp);
        assert_eq!(fb.get(19, 10).unwrap().ch, '4');
        assert_eq!(fb.get(19, 11).unwrap().ch, '3');

        // Past the halfway point the rounded rows flip.
        for _ in 0..3 {
            board.tick(TICK_MS);
        }
        let fb = view.render(&board, &HudState::default(), vp);
        assert_eq!(fb.get(19, 10).unwrap().ch, '3');
        assert_eq!(fb.get(19, 11).unwrap().ch, '4');
    }

    #[test]
    fn test_exploding_block_fades_with_countdown() {
        let mut board = empty_board(4, 3, &['◉']);
        board.place(1, 2, Some(0));
        let idx = board.grid().index(1, 2).unwrap();
        board.run_action(ActionKind::Noop, idx);

        let view = GameView::default();
        let vp = Viewport::new(40, 20);

        // 4x3 board: 10x5 frame at (15, 7); cell (1,2) starts at (18, 10).
        let fb = view.render(&board, &HudState::default(), vp);
        let fresh = fb.get(18, 10).unwrap();
        assert_eq!(fresh.ch, EXPLODE_GLYPH);
        assert_eq!(fresh.style.bg, Rgb::new(10, 20, 30));

        board.tick(EXPLODE_DELAY_MS / 2);
        let fb = view.render(&board, &HudState::default(), vp);
        let faded = fb.get(18, 10).unwrap();
        assert_eq!(faded.style.bg, Rgb::new(5, 10, 15));
    }

    #[test]
    fn test_overlays_and_controls_line() {
        let board = Board::new(BoardConfig::default());
        let view = GameView::default();
        let vp = Viewport::new(60, 20);

        let paused = view.render(
            &board,
            &HudState {
                paused: true,
                ..HudState::default()
            },
            vp,
        );
        // Frame is 16x11 at start_y 4; overlay sits on the middle row.
        assert!(row_text(&paused, 9).contains("PAUSED"));

        let stuck = view.render(
            &board,
            &HudState {
                deadlocked: true,
                ..HudState::default()
            },
            vp,
        );
        assert!(row_text(&stuck, 9).contains("DEADLOCKED"));
        assert!(row_text(&stuck, 19).contains("h hint"));
    }
}
