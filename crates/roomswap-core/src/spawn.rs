//! Spawning actors for cells.
//!
//! The core never builds visual assets. When a board is constructed it asks
//! a [`Spawner`] which team stands on each occupied cell and where its rest
//! anchor sits relative to the cell; the board then creates the actor in its
//! arena. A missing entry is a configuration error that aborts construction.
//!
//! [`SpawnTable`] is the bundled spawner: a list of named entries keyed by
//! cell id, loadable from JSON.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::actor::Team;
use crate::board::{BoardLayout, CellIndex, TileKind};
use crate::error::GameError;

/// What the board asks the spawner for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Row-major id of the cell.
    pub cell_id: usize,
    /// Grid position of the cell.
    pub cell: CellIndex,
    /// Kind of the tile on the cell.
    pub kind: TileKind,
}

/// What the spawner answers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ActorSpawn {
    /// Team of the new actor.
    pub team: Team,
    /// Rest anchor relative to the cell centre.
    pub anchor_offset: Vec3,
}

/// Host-side capability to populate a cell with an actor.
pub trait Spawner {
    /// Describes the actor for a cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingSpawn`] when the cell has no mapping.
    fn spawn(&mut self, request: &SpawnRequest) -> Result<ActorSpawn, GameError>;
}

/// One row of a [`SpawnTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Human-readable name of the character.
    pub name: String,
    /// Cell id this entry populates.
    pub cell_id: usize,
    /// Team of the character.
    pub team: Team,
    /// Rest anchor relative to the cell centre.
    #[serde(default)]
    pub anchor_offset: Vec3,
}

/// Spawner backed by a static list of entries.
///
/// # Example
///
/// ```
/// use roomswap_core::board::BoardLayout;
/// use roomswap_core::spawn::SpawnTable;
///
/// let table = SpawnTable::for_layout(&BoardLayout::reference());
/// assert_eq!(table.len(), 8);
/// assert!(table.entry_for(4).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTable {
    entries: Vec<SpawnEntry>,
}

impl SpawnTable {
    /// Creates a table from entries.
    #[must_use]
    pub fn new(entries: Vec<SpawnEntry>) -> Self {
        Self { entries }
    }

    /// One entry per occupied cell, with the team matching the tile kind.
    #[must_use]
    pub fn for_layout(layout: &BoardLayout) -> Self {
        let entries = layout
            .kinds()
            .iter()
            .enumerate()
            .filter(|(_, kind)| kind.is_occupied())
            .map(|(cell_id, kind)| SpawnEntry {
                name: format!("{kind} {cell_id}"),
                cell_id,
                team: Team::for_kind(*kind),
                anchor_offset: Vec3::ZERO,
            })
            .collect();
        Self { entries }
    }

    /// Parses a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let entries: Vec<SpawnEntry> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// Finds the first entry for a cell id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MissingSpawn`] if there is none.
    pub fn entry_for(&self, cell_id: usize) -> Result<&SpawnEntry, GameError> {
        self.entries
            .iter()
            .find(|entry| entry.cell_id == cell_id)
            .ok_or(GameError::MissingSpawn { cell_id })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Spawner for SpawnTable {
    fn spawn(&mut self, request: &SpawnRequest) -> Result<ActorSpawn, GameError> {
        let entry = self.entry_for(request.cell_id)?;
        Ok(ActorSpawn {
            team: entry.team,
            anchor_offset: entry.anchor_offset,
        })
    }
}
