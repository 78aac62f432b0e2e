//! Cells, cell indices and tile kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

/// Position of a cell on the grid, column first.
///
/// # Example
///
/// ```
/// use roomswap_core::board::CellIndex;
///
/// let cell = CellIndex::new(2, 1);
/// assert_eq!(cell.id(3), 5);
/// assert_eq!(CellIndex::from_id(5, 3), cell);
/// assert_eq!(CellIndex::clamped(-4, 9, 3, 3), CellIndex::new(0, 2));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellIndex {
    /// Column, growing along world +x.
    pub col: usize,
    /// Row, growing along world +z.
    pub row: usize,
}

impl CellIndex {
    /// Creates an index.
    #[must_use]
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Row-major id on a grid of the given width.
    #[must_use]
    pub const fn id(self, width: usize) -> usize {
        self.row * width + self.col
    }

    /// Inverse of [`CellIndex::id`].
    #[must_use]
    pub const fn from_id(id: usize, width: usize) -> Self {
        Self {
            col: id % width,
            row: id / width,
        }
    }

    /// Builds an index from signed coordinates, clamping into the grid.
    ///
    /// A zero-sized grid clamps to the origin.
    #[must_use]
    pub fn clamped(col: i64, row: i64, width: usize, height: usize) -> Self {
        let max_col = i64::try_from(width.saturating_sub(1)).unwrap_or(i64::MAX);
        let max_row = i64::try_from(height.saturating_sub(1)).unwrap_or(i64::MAX);
        // Both values are clamped into [0, max] so the casts are lossless.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let (col, row) = (col.clamp(0, max_col) as usize, row.clamp(0, max_row) as usize);
        Self { col, row }
    }

    /// Returns the cell `(dx, dy)` away, clamped into the grid.
    #[must_use]
    pub fn offset_clamped(self, dx: i64, dy: i64, width: usize, height: usize) -> Self {
        let col = i64::try_from(self.col).unwrap_or(i64::MAX).saturating_add(dx);
        let row = i64::try_from(self.row).unwrap_or(i64::MAX).saturating_add(dy);
        Self::clamped(col, row, width, height)
    }

    /// True if the index lies on a grid of the given size.
    #[must_use]
    pub const fn in_bounds(self, width: usize, height: usize) -> bool {
        self.col < width && self.row < height
    }

    /// True if the two cells share an edge.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row) == 1
    }
}

impl fmt::Debug for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellIndex({}, {})", self.col, self.row)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// What a tile is, which decides whether neighbors conflict.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    /// The single free slot tiles slide into.
    #[default]
    Empty,
    /// First occupied kind.
    Circle,
    /// Second occupied kind.
    Triangle,
}

impl TileKind {
    /// Parses a layout character: `A`/`O` circle, `B`/`X` triangle, `_`/`.` empty.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'A' | 'a' | 'O' | 'o' => Some(Self::Circle),
            'B' | 'b' | 'X' | 'x' => Some(Self::Triangle),
            '_' | '.' => Some(Self::Empty),
            _ => None,
        }
    }

    /// Layout character for this kind.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Empty => '_',
            Self::Circle => 'A',
            Self::Triangle => 'B',
        }
    }

    /// True for every kind except [`TileKind::Empty`].
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Circle => write!(f, "Circle"),
            Self::Triangle => write!(f, "Triangle"),
        }
    }
}

/// One grid slot.
///
/// `kind` and `occupant` travel together when cells swap; the lock stays
/// with the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Where this slot sits on the grid.
    pub index: CellIndex,
    /// Kind of the tile currently in the slot.
    pub kind: TileKind,
    /// Actor standing on the tile, if any.
    pub occupant: Option<ActorId>,
    /// True while the slot refuses new gestures and commands.
    pub locked: bool,
    /// Seconds until the lock clears. Never negative.
    pub lock_remaining: f32,
    /// Keeps the lock past its countdown until released.
    #[serde(default)]
    pub held: bool,
}

impl Cell {
    /// Creates an unlocked cell.
    #[must_use]
    pub const fn new(index: CellIndex, kind: TileKind, occupant: Option<ActorId>) -> Self {
        Self {
            index,
            kind,
            occupant,
            locked: false,
            lock_remaining: 0.0,
            held: false,
        }
    }

    /// True if the cell has no tile.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.kind.is_occupied()
    }

    /// Locks the cell for `duration` seconds; a non-positive duration is ignored.
    pub fn lock(&mut self, duration: f32) {
        if duration > 0.0 {
            self.locked = true;
            self.lock_remaining = self.lock_remaining.max(duration);
        }
    }

    /// Locks the cell until [`Cell::release`], whatever the countdown says.
    pub fn hold(&mut self) {
        self.locked = true;
        self.held = true;
    }

    /// Drops a hold and keeps the cell locked for at least `linger` seconds.
    pub fn release(&mut self, linger: f32) {
        self.held = false;
        self.lock(linger);
    }

    /// Counts the lock down. Returns true on the tick it clears.
    ///
    /// A held lock counts down but never clears.
    pub fn tick_lock(&mut self, dt: f32) -> bool {
        if !self.locked {
            return false;
        }
        self.lock_remaining = (self.lock_remaining - dt).max(0.0);
        if self.lock_remaining <= 0.0 && !self.held {
            self.locked = false;
            return true;
        }
        false
    }
}
