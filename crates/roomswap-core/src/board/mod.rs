//! The grid of cells and the actors standing on it.
//!
//! [`GridBoard`] owns:
//! - the fixed-size array of [`Cell`]s, row-major
//! - the [`ActorArena`] holding every actor
//! - the world-space geometry used to place actors on cells
//!
//! It implements the mechanics that do not depend on game flow: swapping
//! two cells, neighbor queries, the win rule, cell locks and the random
//! shuffle. Deciding *which* swaps to make is the orchestrator's job.
//!
//! # Geometry
//!
//! The board lies on the x/z plane. Cell `(col, row)` is centred at
//! `(col * (1 + margin) + origin_offset, 0, row * (1 + margin) + origin_offset)`.
//!
//! # Example
//!
//! ```
//! use roomswap_core::board::{BoardLayout, CellIndex, GridBoard};
//! use roomswap_core::config::BoardConfig;
//! use roomswap_core::spawn::SpawnTable;
//!
//! let layout = BoardLayout::reference();
//! let mut spawner = SpawnTable::for_layout(&layout);
//! let mut board = GridBoard::new(&layout, &mut spawner, &BoardConfig::default()).unwrap();
//!
//! assert!(board.check_win());
//! board.swap(CellIndex::new(1, 1), CellIndex::new(1, 0), false).unwrap();
//! assert!(!board.check_win());
//! ```

mod cell;
mod layout;

pub use cell::{Cell, CellIndex, TileKind};
pub use layout::{BoardLayout, MAX_SIDE};

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::actor::ActorId;
use crate::arena::ActorArena;
use crate::config::BoardConfig;
use crate::error::GameError;
use crate::spawn::{SpawnRequest, Spawner};

/// The board: cells, their actors and their world placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBoard {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    actors: ActorArena,
    margin: f32,
    origin_offset: f32,
}

impl GridBoard {
    /// Builds a board from a layout, spawning one actor per occupied cell.
    ///
    /// # Errors
    ///
    /// Propagates [`GameError::MissingSpawn`] from the spawner; construction
    /// stops at the first cell that cannot be populated.
    pub fn new(
        layout: &BoardLayout,
        spawner: &mut dyn Spawner,
        config: &BoardConfig,
    ) -> Result<Self, GameError> {
        let mut board = Self {
            width: layout.width(),
            height: layout.height(),
            cells: Vec::with_capacity(layout.kinds().len()),
            actors: ActorArena::new(),
            margin: config.margin,
            origin_offset: config.origin_offset,
        };

        for (cell_id, kind) in layout.kinds().iter().copied().enumerate() {
            let index = CellIndex::from_id(cell_id, board.width);
            let occupant = if kind.is_occupied() {
                let spawn = spawner.spawn(&SpawnRequest {
                    cell_id,
                    cell: index,
                    kind,
                })?;
                let rest = board.cell_position(index) + spawn.anchor_offset;
                let id = board.actors.spawn(spawn.team, rest, spawn.anchor_offset);
                trace!(cell = %index, actor = %id, team = %spawn.team, "Spawned actor");
                Some(id)
            } else {
                None
            };
            board.cells.push(Cell::new(index, kind, occupant));
        }

        debug!(
            width = board.width,
            height = board.height,
            actors = board.actors.len(),
            "Board built"
        );
        Ok(board)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns a cell, if the index is on the grid.
    #[must_use]
    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        if !index.in_bounds(self.width, self.height) {
            return None;
        }
        self.cells.get(index.id(self.width))
    }

    fn checked(&self, index: CellIndex) -> Result<usize, GameError> {
        if index.in_bounds(self.width, self.height) {
            Ok(index.id(self.width))
        } else {
            Err(GameError::OutOfBounds {
                cell: index,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Iterates cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Kinds in row-major order.
    #[must_use]
    pub fn kinds(&self) -> Vec<TileKind> {
        self.cells.iter().map(|cell| cell.kind).collect()
    }

    /// The actor arena.
    #[must_use]
    pub const fn actors(&self) -> &ActorArena {
        &self.actors
    }

    /// The actor arena, mutably.
    pub fn actors_mut(&mut self) -> &mut ActorArena {
        &mut self.actors
    }

    /// Actor standing on a cell.
    #[must_use]
    pub fn occupant(&self, index: CellIndex) -> Option<ActorId> {
        self.cell(index).and_then(|cell| cell.occupant)
    }

    /// Cell an actor currently stands on.
    #[must_use]
    pub fn cell_of(&self, actor: ActorId) -> Option<CellIndex> {
        self.cells
            .iter()
            .find(|cell| cell.occupant == Some(actor))
            .map(|cell| cell.index)
    }

    /// The free slot, if there is one.
    #[must_use]
    pub fn empty_cell(&self) -> Option<CellIndex> {
        self.cells
            .iter()
            .find(|cell| cell.is_empty())
            .map(|cell| cell.index)
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_position(&self, index: CellIndex) -> Vec3 {
        #[allow(clippy::cast_precision_loss)]
        let (col, row) = (index.col as f32, index.row as f32);
        Vec3::new(
            col + self.margin * col + self.origin_offset,
            0.0,
            row + self.margin * row + self.origin_offset,
        )
    }

    /// Centre of the whole board, used as the origin of board-wide effects.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let first = self.cell_position(CellIndex::new(0, 0));
        let last = self.cell_position(CellIndex::new(
            self.width.saturating_sub(1),
            self.height.saturating_sub(1),
        ));
        (first + last) * 0.5
    }

    /// Exchanges the tiles (kind and occupant) of two cells.
    ///
    /// When `animated`, every affected actor is asked to move to its new
    /// cell; otherwise it is placed there immediately. Locks stay with the
    /// slots. No adjacency rule is checked, and swapping a cell with itself
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if either index is off the grid.
    pub fn swap(&mut self, a: CellIndex, b: CellIndex, animated: bool) -> Result<(), GameError> {
        let ia = self.checked(a)?;
        let ib = self.checked(b)?;
        self.swap_slots(ia, ib, animated);
        trace!(a = %a, b = %b, animated, "Swapped cells");
        Ok(())
    }

    /// Swaps two slots by row-major id. Both ids must be on the grid.
    fn swap_slots(&mut self, ia: usize, ib: usize, animated: bool) {
        if ia == ib {
            return;
        }
        let (a, b) = (self.cells[ia].index, self.cells[ib].index);

        let (kind_a, occupant_a) = (self.cells[ia].kind, self.cells[ia].occupant);
        let (kind_b, occupant_b) = (self.cells[ib].kind, self.cells[ib].occupant);
        self.cells[ia].kind = kind_b;
        self.cells[ia].occupant = occupant_b;
        self.cells[ib].kind = kind_a;
        self.cells[ib].occupant = occupant_a;

        for (occupant, destination) in [(occupant_a, b), (occupant_b, a)] {
            if let Some(id) = occupant {
                self.place(id, destination, animated);
            }
        }
    }

    /// Sends an actor to the rest point of `destination`.
    fn place(&mut self, id: ActorId, destination: CellIndex, animated: bool) {
        let center = self.cell_position(destination);
        let Some(actor) = self.actors.get_mut(id) else {
            return;
        };
        let rest = center + actor.anchor_offset();
        actor.set_rest_point(rest);
        if animated {
            actor.request_move(rest);
        } else {
            actor.teleport(rest);
        }
    }

    /// Orthogonal neighbors of a cell in scan order: left, right, down, up.
    ///
    /// "Down" is the next row (`row + 1`) and "up" the previous one. Edge
    /// cells have fewer neighbors.
    #[must_use]
    pub fn neighbors(&self, index: CellIndex) -> Vec<CellIndex> {
        let mut out = Vec::with_capacity(4);
        if !index.in_bounds(self.width, self.height) {
            return out;
        }
        if index.col > 0 {
            out.push(CellIndex::new(index.col - 1, index.row));
        }
        if index.col + 1 < self.width {
            out.push(CellIndex::new(index.col + 1, index.row));
        }
        if index.row + 1 < self.height {
            out.push(CellIndex::new(index.col, index.row + 1));
        }
        if index.row > 0 {
            out.push(CellIndex::new(index.col, index.row - 1));
        }
        out
    }

    /// Calls `f` once for every orthogonally adjacent pair of occupied cells
    /// sharing a kind. Each cell is compared with its right and down
    /// neighbor only, so every pair is visited once.
    fn for_each_conflict(&self, mut f: impl FnMut(CellIndex, CellIndex)) {
        for cell in &self.cells {
            if cell.is_empty() {
                continue;
            }
            let CellIndex { col, row } = cell.index;
            let right = (col + 1 < self.width).then(|| CellIndex::new(col + 1, row));
            let down = (row + 1 < self.height).then(|| CellIndex::new(col, row + 1));
            for other in [right, down].into_iter().flatten() {
                if self.cell(other).is_some_and(|o| o.kind == cell.kind) {
                    f(cell.index, other);
                }
            }
        }
    }

    /// True iff no two orthogonally adjacent occupied cells share a kind.
    #[must_use]
    pub fn check_win(&self) -> bool {
        let mut won = true;
        self.for_each_conflict(|_, _| won = false);
        won
    }

    /// Every occupied cell that shares its kind with an adjacent cell.
    ///
    /// Sorted row-major, without duplicates.
    #[must_use]
    pub fn conflicting_cells(&self) -> Vec<CellIndex> {
        let mut flagged = vec![false; self.cells.len()];
        self.for_each_conflict(|a, b| {
            flagged[a.id(self.width)] = true;
            flagged[b.id(self.width)] = true;
        });
        self.cells
            .iter()
            .filter(|cell| flagged[cell.index.id(self.width)])
            .map(|cell| cell.index)
            .collect()
    }

    /// Locks a cell for `duration` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if the index is off the grid.
    pub fn lock(&mut self, index: CellIndex, duration: f32) -> Result<(), GameError> {
        let i = self.checked(index)?;
        self.cells[i].lock(duration);
        trace!(cell = %index, duration, "Cell locked");
        Ok(())
    }

    /// Locks a cell until [`GridBoard::release_lock`] is called for it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if the index is off the grid.
    pub fn hold_lock(&mut self, index: CellIndex) -> Result<(), GameError> {
        let i = self.checked(index)?;
        self.cells[i].hold();
        trace!(cell = %index, "Cell lock held");
        Ok(())
    }

    /// Releases a held lock; the cell stays locked for at least `linger`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if the index is off the grid.
    pub fn release_lock(&mut self, index: CellIndex, linger: f32) -> Result<(), GameError> {
        let i = self.checked(index)?;
        self.cells[i].release(linger);
        trace!(cell = %index, linger, "Cell lock released");
        Ok(())
    }

    /// True while the cell is locked. Off-grid indices are never locked.
    #[must_use]
    pub fn is_locked(&self, index: CellIndex) -> bool {
        self.cell(index).is_some_and(|cell| cell.locked)
    }

    /// Counts every lock down by `dt`, returning the cells that cleared.
    pub fn tick_locks(&mut self, dt: f32) -> Vec<CellIndex> {
        self.cells
            .iter_mut()
            .filter_map(|cell| cell.tick_lock(dt).then_some(cell.index))
            .collect()
    }

    /// Drops every lock immediately.
    pub fn clear_locks(&mut self) {
        for cell in &mut self.cells {
            cell.locked = false;
            cell.lock_remaining = 0.0;
            cell.held = false;
        }
    }

    /// Performs `iterations` non-animated swaps between uniformly random
    /// cells, then evaluates the win rule once.
    ///
    /// A pair may name the same cell twice, which is a no-op.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, iterations: u32, rng: &mut R) -> bool {
        let count = self.cells.len();
        for _ in 0..iterations {
            let a = rng.gen_range(0..count);
            let b = rng.gen_range(0..count);
            self.swap_slots(a, b, false);
        }
        let solved = self.check_win();
        debug!(iterations, solved, "Board shuffled");
        solved
    }

    /// A uniformly random cell.
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> CellIndex {
        CellIndex::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height))
    }

    /// True when every occupied cell has a distinct live occupant, every
    /// empty cell has none, and there is exactly one empty cell.
    #[must_use]
    pub fn occupancy_consistent(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        let mut empties = 0;
        for cell in &self.cells {
            match (cell.kind.is_occupied(), cell.occupant) {
                (true, Some(id)) => {
                    if self.actors.get(id).is_none() || !seen.insert(id) {
                        return false;
                    }
                }
                (false, None) => empties += 1,
                _ => return false,
            }
        }
        empties == 1 && seen.len() == self.actors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Team;
    use crate::spawn::SpawnTable;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn board(rows: &[&str]) -> GridBoard {
        let layout = BoardLayout::from_rows(rows).unwrap();
        let mut spawner = SpawnTable::for_layout(&layout);
        GridBoard::new(&layout, &mut spawner, &BoardConfig::default()).unwrap()
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn spawns_one_actor_per_occupied_cell() {
            let board = board(&["ABA", "B_B", "ABA"]);
            assert_eq!(board.actors().len(), 8);
            assert!(board.occupancy_consistent());
            assert_eq!(board.empty_cell(), Some(CellIndex::new(1, 1)));
            let id = board.occupant(CellIndex::new(1, 0)).unwrap();
            assert_eq!(board.actors().get(id).unwrap().team(), Team::Dark);
        }

        #[test]
        fn missing_spawn_aborts() {
            let layout = BoardLayout::reference();
            let mut spawner = SpawnTable::default();
            let err = GridBoard::new(&layout, &mut spawner, &BoardConfig::default()).unwrap_err();
            assert!(matches!(err, GameError::MissingSpawn { cell_id: 0 }));
        }

        #[test]
        fn actors_rest_on_their_cells() {
            let board = board(&["AB", "_A"]);
            for cell in board.cells() {
                if let Some(id) = cell.occupant {
                    let actor = board.actors().get(id).unwrap();
                    assert_eq!(actor.position(), board.cell_position(cell.index));
                }
            }
        }

        #[test]
        fn geometry_uses_margin_and_offset() {
            let board = board(&["ABA", "B_B", "ABA"]);
            assert_eq!(board.cell_position(CellIndex::new(0, 0)), Vec3::new(0.5, 0.0, 0.5));
            let p = board.cell_position(CellIndex::new(2, 1));
            assert!((p - Vec3::new(2.9, 0.0, 1.7)).length() < 1e-5);
            assert!((board.center() - Vec3::new(1.7, 0.0, 1.7)).length() < 1e-5);
        }
    }

    mod swap_tests {
        use super::*;

        #[test]
        fn instant_swap_moves_tiles_and_actors() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let top = CellIndex::new(1, 0);
            let centre = CellIndex::new(1, 1);
            let id = board.occupant(top).unwrap();

            board.swap(top, centre, false).unwrap();
            assert_eq!(board.occupant(centre), Some(id));
            assert_eq!(board.cell(centre).unwrap().kind, TileKind::Triangle);
            assert!(board.cell(top).unwrap().is_empty());
            let actor = board.actors().get(id).unwrap();
            assert_eq!(actor.position(), board.cell_position(centre));
            assert!(!actor.is_busy());
            assert!(board.occupancy_consistent());
        }

        #[test]
        fn animated_swap_queues_a_move() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let top = CellIndex::new(1, 0);
            let centre = CellIndex::new(1, 1);
            let id = board.occupant(top).unwrap();
            let start = board.actors().get(id).unwrap().position();

            board.swap(top, centre, true).unwrap();
            let actor = board.actors().get(id).unwrap();
            assert_eq!(actor.position(), start, "animated swap must not teleport");
            assert_eq!(actor.rest_point(), board.cell_position(centre));
            assert_eq!(actor.pending_len(), 1);
        }

        #[test]
        fn self_swap_is_a_noop() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let before = board.clone();
            board.swap(CellIndex::new(0, 0), CellIndex::new(0, 0), true).unwrap();
            assert_eq!(board, before);
        }

        #[test]
        fn swap_is_an_involution() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let kinds = board.kinds();
            let occupants: Vec<_> = board.cells().map(|c| c.occupant).collect();
            let (a, b) = (CellIndex::new(0, 0), CellIndex::new(2, 2));
            board.swap(a, b, false).unwrap();
            board.swap(a, b, false).unwrap();
            assert_eq!(board.kinds(), kinds);
            assert_eq!(board.cells().map(|c| c.occupant).collect::<Vec<_>>(), occupants);
        }

        #[test]
        fn out_of_bounds_swap_fails() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let err = board
                .swap(CellIndex::new(0, 0), CellIndex::new(3, 0), false)
                .unwrap_err();
            assert!(matches!(err, GameError::OutOfBounds { .. }));
        }

        #[test]
        fn locks_stay_with_the_slot() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            board.lock(CellIndex::new(1, 0), 1.0).unwrap();
            board.swap(CellIndex::new(1, 0), CellIndex::new(1, 1), false).unwrap();
            assert!(board.is_locked(CellIndex::new(1, 0)));
            assert!(!board.is_locked(CellIndex::new(1, 1)));
        }
    }

    mod neighbor_tests {
        use super::*;

        #[test]
        fn centre_scan_order() {
            let board = board(&["ABA", "B_B", "ABA"]);
            assert_eq!(
                board.neighbors(CellIndex::new(1, 1)),
                vec![
                    CellIndex::new(0, 1),
                    CellIndex::new(2, 1),
                    CellIndex::new(1, 2),
                    CellIndex::new(1, 0),
                ]
            );
        }

        #[test]
        fn corners_and_edges_have_fewer() {
            let board = board(&["ABA", "B_B", "ABA"]);
            assert_eq!(
                board.neighbors(CellIndex::new(0, 0)),
                vec![CellIndex::new(1, 0), CellIndex::new(0, 1)]
            );
            assert_eq!(board.neighbors(CellIndex::new(1, 2)).len(), 3);
            assert!(board.neighbors(CellIndex::new(5, 5)).is_empty());
        }
    }

    mod win_tests {
        use super::*;

        #[test]
        fn checkerboard_wins() {
            assert!(board(&["ABA", "B_B", "ABA"]).check_win());
        }

        #[test]
        fn empty_cells_never_conflict() {
            assert!(board(&["AB", "_A"]).check_win());
        }

        #[test]
        fn horizontal_and_vertical_pairs_lose() {
            assert!(!board(&["AAB", "B_A", "ABA"]).check_win());
            assert!(!board(&["ABA", "AB_", "BAB"]).check_win());
        }

        #[test]
        fn conflicting_cells_lists_both_ends() {
            let board = board(&["AAB", "B_A", "ABB"]);
            assert_eq!(
                board.conflicting_cells(),
                vec![
                    CellIndex::new(0, 0),
                    CellIndex::new(1, 0),
                    CellIndex::new(1, 2),
                    CellIndex::new(2, 2),
                ]
            );
        }
    }

    mod lock_tests {
        use super::*;

        #[test]
        fn locks_tick_down_and_report_clearing() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let cell = CellIndex::new(0, 0);
            board.lock(cell, 0.5).unwrap();
            assert!(board.is_locked(cell));
            assert!(board.tick_locks(0.25).is_empty());
            assert_eq!(board.tick_locks(0.25), vec![cell]);
            assert!(!board.is_locked(cell));
            assert_eq!(board.cell(cell).unwrap().lock_remaining, 0.0);
        }

        #[test]
        fn held_lock_outlasts_its_countdown() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let cell = CellIndex::new(0, 1);
            board.lock(cell, 0.5).unwrap();
            board.hold_lock(cell).unwrap();
            assert!(board.tick_locks(3.0).is_empty());
            assert!(board.is_locked(cell));

            board.release_lock(cell, 0.5).unwrap();
            assert!(board.tick_locks(0.25).is_empty());
            assert_eq!(board.tick_locks(0.25), vec![cell]);
            assert!(!board.is_locked(cell));
        }

        #[test]
        fn clear_locks_drops_holds() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let cell = CellIndex::new(2, 1);
            board.hold_lock(cell).unwrap();
            board.clear_locks();
            assert!(!board.is_locked(cell));
            assert!(!board.cell(cell).unwrap().held);
        }

        #[test]
        fn off_grid_is_never_locked() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            assert!(board.lock(CellIndex::new(9, 9), 1.0).is_err());
            assert!(!board.is_locked(CellIndex::new(9, 9)));
        }
    }

    mod shuffle_tests {
        use super::*;

        #[test]
        fn shuffle_preserves_occupancy() {
            let mut board = board(&["ABA", "B_B", "ABA"]);
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            for _ in 0..20 {
                let solved = board.shuffle(5, &mut rng);
                assert_eq!(solved, board.check_win());
                assert!(board.occupancy_consistent());
                for cell in board.cells() {
                    if let Some(id) = cell.occupant {
                        let actor = board.actors().get(id).unwrap();
                        assert_eq!(actor.position(), board.cell_position(cell.index));
                    }
                }
            }
        }

        #[test]
        fn shuffle_is_deterministic_per_seed() {
            let mut a = board(&["ABA", "B_B", "ABA"]);
            let mut b = a.clone();
            a.shuffle(5, &mut ChaCha8Rng::seed_from_u64(3));
            b.shuffle(5, &mut ChaCha8Rng::seed_from_u64(3));
            assert_eq!(a, b);
        }

        #[test]
        fn zero_iterations_only_checks() {
            let mut board = board(&["AAB", "B_A", "ABA"]);
            let before = board.kinds();
            assert!(!board.shuffle(0, &mut ChaCha8Rng::seed_from_u64(1)));
            assert_eq!(board.kinds(), before);
        }
    }
}
