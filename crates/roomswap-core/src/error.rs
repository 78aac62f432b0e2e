//! Error types for the Roomswap core.
//!
//! Only two classes of failure surface as errors: setup problems (missing
//! spawn entries, malformed layouts or configs) and invariant violations that
//! indicate a programming error. Recoverable situations such as out-of-range
//! gestures or commands sent to a busy actor are absorbed and logged instead.

use thiserror::Error;

use crate::actor::ActorId;
use crate::board::CellIndex;

/// Errors produced by the simulation core.
#[derive(Debug, Error)]
pub enum GameError {
    /// The spawn collaborator has no entry for a non-empty cell.
    #[error("no spawn entry for cell id {cell_id}")]
    MissingSpawn {
        /// Row-major id of the cell that could not be populated.
        cell_id: usize,
    },

    /// The board layout is malformed.
    #[error("invalid board layout: {0}")]
    InvalidLayout(String),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The configuration document could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Conflict resolution was requested for a cell with no occupant.
    ///
    /// The resolver only ever runs on the cell the user dragged, so this
    /// always indicates a bug in the caller.
    #[error("conflict resolution requested for empty cell {cell}")]
    EmptySourceCell {
        /// The offending cell.
        cell: CellIndex,
    },

    /// A cell index fell outside the grid.
    #[error("cell {cell} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// The offending cell.
        cell: CellIndex,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// An actor id did not resolve to a live actor.
    #[error("unknown actor {id}")]
    UnknownActor {
        /// The id that failed to resolve.
        id: ActorId,
    },

    /// A command was addressed to the occupant of a locked cell.
    #[error("cell {cell} is locked")]
    CellLocked {
        /// The locked cell.
        cell: CellIndex,
    },

    /// A command was addressed to an actor that is still moving or attacking.
    #[error("actor on cell {cell} is busy")]
    ActorBusy {
        /// The busy actor's cell.
        cell: CellIndex,
    },
}
