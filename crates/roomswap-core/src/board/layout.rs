//! Board layouts: the starting arrangement of tile kinds.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

use super::{CellIndex, TileKind};

/// Largest supported grid side.
pub const MAX_SIDE: usize = 8;

/// Starting tile kinds, row-major.
///
/// A valid layout has exactly one empty cell, the slot tiles slide into.
///
/// # Example
///
/// ```
/// use roomswap_core::board::{BoardLayout, CellIndex, TileKind};
///
/// let layout = BoardLayout::from_rows(&["ABA", "B_B", "ABA"]).unwrap();
/// assert_eq!(layout.width(), 3);
/// assert_eq!(layout.kind_at(CellIndex::new(1, 1)), Some(TileKind::Empty));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    width: usize,
    height: usize,
    kinds: Vec<TileKind>,
}

impl BoardLayout {
    /// Builds a layout from row-major kinds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLayout`] if the dimensions are zero or
    /// above [`MAX_SIDE`], the kind count does not match, or there is not
    /// exactly one empty cell.
    pub fn new(width: usize, height: usize, kinds: Vec<TileKind>) -> Result<Self, GameError> {
        let layout = Self {
            width,
            height,
            kinds,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Parses one string per row using [`TileKind::from_char`].
    ///
    /// Whitespace and commas inside a row are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLayout`] on unknown characters, ragged
    /// rows, or any of the conditions checked by [`BoardLayout::new`].
    pub fn from_rows(rows: &[&str]) -> Result<Self, GameError> {
        let mut kinds = Vec::new();
        let mut width = None;
        for (row_index, row) in rows.iter().enumerate() {
            let parsed = row
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',')
                .map(|c| {
                    TileKind::from_char(c).ok_or_else(|| {
                        GameError::InvalidLayout(format!(
                            "unknown tile '{c}' in row {row_index}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            match width {
                None => width = Some(parsed.len()),
                Some(w) if w != parsed.len() => {
                    return Err(GameError::InvalidLayout(format!(
                        "row {row_index} has {} tiles, expected {w}",
                        parsed.len()
                    )));
                }
                Some(_) => {}
            }
            kinds.extend(parsed);
        }
        Self::new(width.unwrap_or(0), rows.len(), kinds)
    }

    /// The 3x3 board the game ships with: alternating kinds around a free centre.
    #[must_use]
    pub fn reference() -> Self {
        use TileKind::{Circle as A, Empty as E, Triangle as B};
        Self {
            width: 3,
            height: 3,
            kinds: vec![A, B, A, B, E, B, A, B, A],
        }
    }

    fn validate(&self) -> Result<(), GameError> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidLayout("grid has no cells".to_string()));
        }
        if self.width > MAX_SIDE || self.height > MAX_SIDE {
            return Err(GameError::InvalidLayout(format!(
                "{}x{} exceeds the maximum side of {MAX_SIDE}",
                self.width, self.height
            )));
        }
        if self.kinds.len() != self.width * self.height {
            return Err(GameError::InvalidLayout(format!(
                "{} kinds for a {}x{} grid",
                self.kinds.len(),
                self.width,
                self.height
            )));
        }
        let empties = self.kinds.iter().filter(|k| !k.is_occupied()).count();
        if empties != 1 {
            return Err(GameError::InvalidLayout(format!(
                "expected exactly one empty cell, found {empties}"
            )));
        }
        Ok(())
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

    /// Row-major kinds.
    #[must_use]
    pub fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    /// Kind at a cell, if it is on the grid.
    #[must_use]
    pub fn kind_at(&self, index: CellIndex) -> Option<TileKind> {
        if !index.in_bounds(self.width, self.height) {
            return None;
        }
        self.kinds.get(index.id(self.width)).copied()
    }
}
