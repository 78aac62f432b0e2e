//! Decoded pointer gestures and swipe classification.
//!
//! The host hit-tests the pointer against the board and hands the core
//! board-relative gestures. A drag is classified by its dominant axis into a
//! [`Swipe`] of one cell; the orchestrator turns that into a swap with the
//! empty neighbor, if there is one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::board::CellIndex;

/// A gesture already decoded by the host.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gesture {
    /// Pointer pressed over a cell. Coordinates may lie off the grid and are
    /// clamped.
    PointerDown {
        /// Hit-tested column.
        col: i64,
        /// Hit-tested row.
        row: i64,
    },
    /// Pointer moved by `delta` board units since the previous gesture.
    PointerDrag {
        /// Movement along columns (x) and rows (y).
        delta: Vec2,
    },
    /// Pointer released.
    PointerUp,
}

/// One-cell step along the dominant axis of a drag.
///
/// Exactly one of `dx`/`dy` is non-zero, and it is `-1` or `1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Swipe {
    /// Column step.
    pub dx: i64,
    /// Row step.
    pub dy: i64,
}

impl Swipe {
    /// Classifies a drag vector.
    ///
    /// Returns `None` when the drag is shorter than `dead_zone` or has no
    /// dominant axis. Ties go to the horizontal axis.
    ///
    /// # Example
    ///
    /// ```
    /// use glam::Vec2;
    /// use roomswap_core::input::Swipe;
    ///
    /// assert_eq!(Swipe::from_drag(Vec2::new(0.2, -0.9), 0.25), Some(Swipe { dx: 0, dy: -1 }));
    /// assert_eq!(Swipe::from_drag(Vec2::new(0.1, 0.1), 0.25), None);
    /// ```
    #[must_use]
    pub fn from_drag(drag: Vec2, dead_zone: f32) -> Option<Self> {
        if !drag.is_finite() || drag.length() < dead_zone || drag == Vec2::ZERO {
            return None;
        }
        let swipe = if drag.x.abs() >= drag.y.abs() {
            Self {
                dx: if drag.x > 0.0 { 1 } else { -1 },
                dy: 0,
            }
        } else {
            Self {
                dx: 0,
                dy: if drag.y > 0.0 { 1 } else { -1 },
            }
        };
        Some(swipe)
    }

    /// The cell one step away from `from`, clamped into the grid.
    #[must_use]
    pub fn target(self, from: CellIndex, width: usize, height: usize) -> CellIndex {
        from.offset_clamped(self.dx, self.dy, width, height)
    }
}

/// Pointer state between press and release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureTracker {
    selected: Option<CellIndex>,
    drag: Vec2,
}

impl GestureTracker {
    /// Creates a tracker with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a source cell and restarts the drag.
    pub fn press(&mut self, cell: CellIndex) {
        self.selected = Some(cell);
        self.drag = Vec2::ZERO;
    }

    /// Accumulates drag movement. Ignored while nothing is selected.
    pub fn drag(&mut self, delta: Vec2) {
        if self.selected.is_some() && delta.is_finite() {
            self.drag += delta;
        }
    }

    /// Releases the pointer, returning the source and its accumulated drag.
    pub fn release(&mut self) -> Option<(CellIndex, Vec2)> {
        let selected = self.selected.take()?;
        let drag = std::mem::take(&mut self.drag);
        Some((selected, drag))
    }

    /// Drops the selection without producing a swipe.
    pub fn cancel(&mut self) {
        self.selected = None;
        self.drag = Vec2::ZERO;
    }

    /// The selected source cell.
    #[must_use]
    pub const fn selected(&self) -> Option<CellIndex> {
        self.selected
    }

    /// Drag accumulated since the press.
    #[must_use]
    pub const fn drag_offset(&self) -> Vec2 {
        self.drag
    }
}
