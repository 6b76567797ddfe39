//! Physics tests - compaction, refills, and lane anchors through the board tick

use tui_gems::core::{ActionKind, Board, BlockCatalog, BlockDefinition, CellState};
use tui_gems::types::{BlockId, BoardConfig, GravityDir, TICK_MS};

/// A two-type catalog that never matches: id 0 is the only spawnable
/// tile, id 1 is a hand-placed marker
fn drab_catalog() -> BlockCatalog {
    let tile = |id: BlockId, weight| BlockDefinition {
        id,
        name: "drab",
        glyph: '#',
        color_fill: (0, 0, 0),
        color_icon: (0, 0, 0),
        weight,
        max_hp: 1,
        swappable: true,
        matchable: false,
        indestructible: false,
        gravity_immune: false,
        always_in_pool: false,
        triggers: [None, None, None],
        on_settle: None,
        reaction: None,
    };
    BlockCatalog::new(vec![tile(0, 10), tile(1, 0)])
}

fn run_until_idle(board: &mut Board, max_ticks: usize) {
    for _ in 0..max_ticks {
        board.tick(TICK_MS);
        if !board.is_busy() {
            return;
        }
    }
    panic!("board never settled");
}

#[test]
fn test_holes_compact_and_refill_to_a_full_board() {
    let mut board = Board::with_catalog(BoardConfig::default(), drab_catalog());
    board.place(2, 6, None);
    board.place(2, 7, None);
    board.place(2, 8, None);
    board.place(4, 3, None);
    board.take_events();

    board.tick(TICK_MS);
    assert!(board.is_busy());
    // Compaction assigns slots on the first tick: survivors relocate and
    // refills park above the entry edge, all mid-flight
    let falling = board
        .grid()
        .iter()
        .filter(|(_, c)| c.state == CellState::Falling)
        .count();
    assert!(falling > 0);

    run_until_idle(&mut board, 600);
    assert!(board.grid().iter().all(|(_, c)| c.block == Some(0)));
    assert!(board.grid().all_idle());
}

#[test]
fn test_countdown_expiry_opens_the_lane() {
    let mut board = Board::with_catalog(BoardConfig::default(), drab_catalog());
    board.place(3, 3, Some(1));
    board.take_events();

    let pinned = board.grid().index(3, 4).unwrap();
    board.run_action(ActionKind::Noop, pinned);
    assert_eq!(board.grid().cell(pinned).state, CellState::Exploding);

    // While the countdown runs, the cell anchors its column
    for _ in 0..3 {
        board.tick(TICK_MS);
    }
    let marker = board.grid().index(3, 3).unwrap();
    assert_eq!(board.grid().cell(pinned).state, CellState::Exploding);
    assert_eq!(board.grid().cell(marker).block, Some(1));
    assert_eq!(board.grid().cell(marker).state, CellState::Idle);

    // Expiry clears the slot and the marker drops into it
    run_until_idle(&mut board, 600);
    assert_eq!(board.grid().cell(pinned).block, Some(1));
    assert!(board.grid().iter().all(|(_, c)| c.block.is_some()));
}

#[test]
fn test_bedrock_shelters_the_hole_beneath() {
    let mut board = Board::new(BoardConfig::default());
    for y in 0..board.grid().height() as i32 {
        for x in 0..board.grid().width() as i32 {
            board.place(x, y, Some(((x + y) % 3) as BlockId));
        }
    }
    board.place(2, 3, Some(9));
    board.place(2, 4, None);
    board.take_events();

    let before = board.grid().clone();
    for _ in 0..50 {
        board.tick(TICK_MS);
        assert!(!board.is_busy(), "a sealed hole must cause no motion");
    }

    assert_eq!(board.grid(), &before);
    let hole = board.grid().index(2, 4).unwrap();
    let shelf = board.grid().index(2, 3).unwrap();
    assert_eq!(board.grid().cell(hole).block, None);
    assert_eq!(board.grid().cell(shelf).block, Some(9));
}

#[test]
fn test_gravity_left_compacts_rows_to_the_west_edge() {
    let tile = |id: BlockId| BlockDefinition {
        id,
        name: "drab",
        glyph: '#',
        color_fill: (0, 0, 0),
        color_icon: (0, 0, 0),
        weight: 0,
        max_hp: 1,
        swappable: true,
        matchable: false,
        indestructible: false,
        gravity_immune: false,
        always_in_pool: false,
        triggers: [None, None, None],
        on_settle: None,
        reaction: None,
    };
    let catalog = BlockCatalog::new(vec![tile(0), tile(1)]);
    let cfg = BoardConfig {
        width: 6,
        height: 3,
        gravity: GravityDir::Left,
        ..BoardConfig::default()
    };
    let mut board = Board::with_catalog(cfg, catalog);
    board.place(2, 1, Some(0));
    board.place(4, 1, Some(1));
    board.take_events();

    board.tick(TICK_MS);
    assert!(board.is_busy());
    run_until_idle(&mut board, 600);

    // Both tiles slide west in order; the vacated slots stay empty since
    // this catalog spawns nothing
    assert_eq!(board.grid().cell(board.grid().index(0, 1).unwrap()).block, Some(0));
    assert_eq!(board.grid().cell(board.grid().index(1, 1).unwrap()).block, Some(1));
    assert_eq!(board.grid().cell(board.grid().index(2, 1).unwrap()).block, None);
    assert_eq!(board.grid().cell(board.grid().index(4, 1).unwrap()).block, None);
}
