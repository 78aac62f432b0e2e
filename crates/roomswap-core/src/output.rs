//! What the core reports to its collaborators.
//!
//! - [`GameEvent`]: notifications of things that happened, drained with
//!   `Game::take_events`. Tests use them as an audit trail; the presentation
//!   layer uses them to trigger sounds and effects.
//! - [`GameSnapshot`]: the authoritative per-tick view of every actor and
//!   cell, plus the level state and reset countdown for the UI.
//!
//! Both are plain data and serialize with serde.

use std::fmt;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorFlags, ActorId, Reaction, StateKind, Team};
use crate::board::{Cell, CellIndex, TileKind};

// =============================================================================
// Events
// =============================================================================

/// Why the board was rebuilt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetReason {
    /// The win delay elapsed.
    Win,
    /// A manual reset was requested.
    Manual,
}

/// Why a gesture had no effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The level is not in the playing state.
    NotPlaying,
    /// A swap or its resolution is still in progress.
    Busy,
    /// The pressed cell has no tile.
    EmptyCell,
    /// The pressed cell is locked.
    Locked,
    /// The pressed cell's actor is frozen.
    Frozen,
    /// Released without a selection.
    NoSelection,
    /// The drag was inside the dead zone.
    NoSwipe,
    /// The swipe does not lead into the empty cell.
    TargetOccupied,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotPlaying => "not playing",
            Self::Busy => "busy",
            Self::EmptyCell => "empty cell",
            Self::Locked => "locked",
            Self::Frozen => "frozen",
            Self::NoSelection => "no selection",
            Self::NoSwipe => "no swipe",
            Self::TargetOccupied => "target occupied",
        };
        f.write_str(text)
    }
}

/// Something that happened during a call into the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An animated swap was started.
    SwapStarted {
        /// Cell the tile left.
        from: CellIndex,
        /// Cell the tile is heading to.
        to: CellIndex,
        /// Actor travelling with the tile, if the source was occupied.
        actor: Option<ActorId>,
    },
    /// The dragged tile settled and its neighbors are being resolved.
    ResolutionStarted {
        /// The dragged tile's new cell.
        source: CellIndex,
        /// Its occupant.
        attacker: ActorId,
    },
    /// A matching neighbor is about to be attacked.
    AttackIssued {
        /// Actor on the dragged tile.
        attacker: ActorId,
        /// Actor on the neighbor.
        target: ActorId,
        /// The neighbor's cell, now locked.
        target_cell: CellIndex,
    },
    /// A neighbor was told to play a reaction.
    ReactionIssued {
        /// Actor that reacts.
        actor: ActorId,
        /// What it plays.
        reaction: Reaction,
    },
    /// An attack's strike landed and knocked its target back.
    StrikeLanded {
        /// Actor that struck.
        attacker: ActorId,
        /// Actor that was struck.
        target: ActorId,
    },
    /// An actor's knockback reverted.
    KnockbackReverted {
        /// Actor that recovered.
        actor: ActorId,
    },
    /// All neighbors of a resolution have been handled.
    ResolutionFinished {
        /// Number of attacks issued.
        attacks: usize,
    },
    /// The board reached the win condition.
    Won,
    /// The board was shuffled and every actor sent back to its anchor.
    BoardReset {
        /// What triggered the reset.
        reason: ResetReason,
    },
    /// A gesture was ignored.
    GestureRejected {
        /// Why.
        reason: RejectReason,
    },
}

// =============================================================================
// Snapshots
// =============================================================================

/// Level-wide state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LevelState {
    /// Gestures are accepted.
    #[default]
    Playing,
    /// The board is solved; a reset is pending.
    Won,
    /// A manual reset flourish is playing.
    Resetting,
}

impl fmt::Display for LevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => write!(f, "Playing"),
            Self::Won => write!(f, "Won"),
            Self::Resetting => write!(f, "Resetting"),
        }
    }
}

/// What the presentation layer needs to draw one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorView {
    /// Actor id.
    pub id: ActorId,
    /// Team.
    pub team: Team,
    /// Logical position.
    pub position: Vec3,
    /// Position of the visible body, including knockback.
    pub visible_position: Vec3,
    /// Facing.
    pub orientation: Quat,
    /// Active state.
    pub state: StateKind,
    /// Stored and derived flags.
    pub flags: ActorFlags,
    /// Reaction being played.
    pub reaction: Option<Reaction>,
    /// True while the knockback body is active.
    pub knocked_back: bool,
    /// Seconds until the knockback body rejoins the actor.
    pub recover_in: Option<f32>,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        let flags = actor.flags();
        Self {
            id: actor.id(),
            team: actor.team(),
            position: actor.position(),
            visible_position: actor.visible_position(),
            orientation: actor.orientation(),
            state: actor.state_kind(),
            flags,
            reaction: actor.reaction(),
            knocked_back: flags.contains(ActorFlags::KNOCKED_BACK),
            recover_in: actor.knockback().revert_in(),
        }
    }
}

/// What the presentation layer needs to draw one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    /// Grid position.
    pub index: CellIndex,
    /// Tile kind.
    pub kind: TileKind,
    /// Actor standing on the tile.
    pub occupant: Option<ActorId>,
    /// Lock flag.
    pub locked: bool,
    /// Seconds until the lock clears.
    pub lock_remaining: f32,
    /// Shares its kind with a neighbor.
    pub conflicting: bool,
    /// Can be picked as a gesture source.
    pub interactable: bool,
}

impl CellView {
    /// Builds a view; `conflicting` comes from the board-wide scan.
    #[must_use]
    pub fn new(cell: &Cell, conflicting: bool) -> Self {
        Self {
            index: cell.index,
            kind: cell.kind,
            occupant: cell.occupant,
            locked: cell.locked,
            lock_remaining: cell.lock_remaining,
            conflicting,
            interactable: !cell.is_empty() && !cell.locked,
        }
    }
}

/// Everything the collaborators need after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Level state.
    pub level: LevelState,
    /// True once the board is solved, until it is reset.
    pub won: bool,
    /// Seconds until a pending reset fires.
    pub reset_countdown: Option<f32>,
    /// Cell picked as the gesture source.
    pub selected: Option<CellIndex>,
    /// Drag accumulated since the press, for the tile following the pointer.
    pub drag_offset: Vec2,
    /// Every actor, in id order.
    pub actors: Vec<ActorView>,
    /// Every cell, row-major.
    pub cells: Vec<CellView>,
}
