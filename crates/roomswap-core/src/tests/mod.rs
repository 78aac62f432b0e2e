//! Cross-module tests for the board, resolver and game loop.
//!
//! - `scenarios.rs`: end-to-end behaviour of swaps, attacks, wins and resets
//! - `determinism.rs`: same seed and inputs give identical runs
//! - `properties.rs`: proptest checks of the board and actor invariants
//! - `helpers.rs`: shared setup

mod helpers;

pub use helpers::*;
