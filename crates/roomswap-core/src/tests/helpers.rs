//! Test setup utilities.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use glam::Vec2;

use crate::board::{BoardLayout, CellIndex, GridBoard, TileKind};
use crate::config::{BoardConfig, GameConfig};
use crate::game::Game;
use crate::input::Gesture;
use crate::output::GameEvent;
use crate::spawn::SpawnTable;

/// Fixed frame step used by the scenario tests.
pub const FRAME: f32 = 1.0 / 60.0;

// =============================================================================
// Setup
// =============================================================================

/// Builds a board from layout rows with one actor per occupied cell.
pub fn board_from_rows(rows: &[&str]) -> GridBoard {
    let layout = BoardLayout::from_rows(rows).expect("valid layout");
    let mut spawner = SpawnTable::for_layout(&layout);
    GridBoard::new(&layout, &mut spawner, &BoardConfig::default()).expect("board builds")
}

/// Builds a game on exactly this layout; the initial shuffle is disabled.
pub fn game_from_rows(rows: &[&str]) -> Game {
    let mut config = GameConfig::default();
    config.board.shuffle_iterations = 0;
    game_with_config(rows, config)
}

/// Builds a game on a layout with a custom config.
pub fn game_with_config(rows: &[&str], config: GameConfig) -> Game {
    let layout = BoardLayout::from_rows(rows).expect("valid layout");
    let mut spawner = SpawnTable::for_layout(&layout);
    Game::new(&layout, &mut spawner, config).expect("game builds")
}

/// Builds the shuffled reference game with a given seed.
pub fn reference_game(seed: u64) -> Game {
    let layout = BoardLayout::reference();
    let mut spawner = SpawnTable::for_layout(&layout);
    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    Game::new(&layout, &mut spawner, config).expect("game builds")
}

// =============================================================================
// Driving
// =============================================================================

/// Advances the game in fixed frames until at least `seconds` have passed.
pub fn run_for(game: &mut Game, seconds: f32) {
    let frames = (seconds / FRAME).ceil() as usize;
    for _ in 0..frames {
        game.update(FRAME).expect("frame runs");
    }
}

/// Presses a cell, drags one cell in `(dx, dy)` and releases.
pub fn swipe(game: &mut Game, cell: CellIndex, dx: f32, dy: f32) {
    game.handle_gesture(Gesture::PointerDown {
        col: cell.col as i64,
        row: cell.row as i64,
    })
    .expect("press");
    game.handle_gesture(Gesture::PointerDrag {
        delta: Vec2::new(dx, dy),
    })
    .expect("drag");
    game.handle_gesture(Gesture::PointerUp).expect("release");
}

// =============================================================================
// Inspection
// =============================================================================

/// Counts events matching a predicate.
pub fn count_events(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

/// Reference win rule: compares every occupied cell with all four neighbors.
pub fn brute_force_win(board: &GridBoard) -> bool {
    let (w, h) = (board.width() as i64, board.height() as i64);
    for cell in board.cells() {
        if cell.kind == TileKind::Empty {
            continue;
        }
        let (c, r) = (cell.index.col as i64, cell.index.row as i64);
        for (dc, dr) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let (nc, nr) = (c + dc, r + dr);
            if nc < 0 || nr < 0 || nc >= w || nr >= h {
                continue;
            }
            let other = board
                .cell(CellIndex::new(nc as usize, nr as usize))
                .expect("in bounds");
            if other.kind == cell.kind {
                return false;
            }
        }
    }
    true
}
