//! # Roomswap Core
//!
//! Simulation core for Roomswap, a sliding tile puzzle where every tile
//! carries a character and same-kind neighbors fight.
//!
//! This crate owns everything with timing contracts and invariants: the
//! per-actor state machines, the board, neighbor conflict resolution and the
//! level flow. Rendering, raw input and asset loading are left to the host.
//!
//! ## Architecture
//!
//! - **Actors** ([`actor`], [`arena`]): Idle/Move/Attack state machines with
//!   a FIFO command queue and a transient knockback body, stored by id
//! - **Board** ([`board`]): cells, swaps, neighbors, locks, the win rule
//! - **Resolver** ([`resolver`]): what happens when a dragged tile lands
//! - **Game** ([`game`]): the frame loop, gestures, win and reset timers
//!
//! The host talks to the core through [`spawn::Spawner`] (populating cells),
//! [`input::Gesture`] (decoded pointer input) and [`output`] (events and
//! snapshots).
//!
//! ## Usage
//!
//! ```
//! use roomswap_core::{BoardLayout, Game, GameConfig, Gesture, SpawnTable};
//! use glam::Vec2;
//!
//! let layout = BoardLayout::reference();
//! let mut spawner = SpawnTable::for_layout(&layout);
//! let mut game = Game::new(&layout, &mut spawner, GameConfig::default())?;
//!
//! game.handle_gesture(Gesture::PointerDown { col: 1, row: 0 })?;
//! game.handle_gesture(Gesture::PointerDrag { delta: Vec2::new(0.0, 1.0) })?;
//! game.handle_gesture(Gesture::PointerUp)?;
//! game.update(1.0 / 60.0)?;
//!
//! let snapshot = game.snapshot();
//! assert_eq!(snapshot.cells.len(), 9);
//! # Ok::<(), roomswap_core::GameError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actor;
pub mod arena;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod output;
pub mod resolver;
pub mod spawn;

pub use actor::{Actor, ActorId, StateKind, Team};
pub use board::{BoardLayout, CellIndex, GridBoard, TileKind};
pub use config::GameConfig;
pub use error::GameError;
pub use game::Game;
pub use input::Gesture;
pub use output::{GameEvent, GameSnapshot, LevelState};
pub use spawn::{SpawnTable, Spawner};

#[cfg(test)]
mod tests;
