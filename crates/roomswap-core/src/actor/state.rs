//! Actor state machine: the closed set of states and the pending-command queue.
//!
//! An actor is always in exactly one [`ActorState`]. Commands never pre-empt
//! the active state; they are appended to a FIFO of [`PendingState`]s that
//! the active handler drains when it finishes. The handlers themselves live
//! on [`Actor`](super::Actor) because they drive its pose.

use std::collections::VecDeque;
use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::ActorId;

/// Squared horizontal length below which a direction is treated as zero.
const TURN_EPSILON: f32 = 1e-8;

/// Discriminant of an [`ActorState`], used for reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Resting on (or returning to) the rest point.
    Idle,
    /// Interpolating between two points.
    Move,
    /// Running an attack sequence.
    Attack,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Move => write!(f, "Move"),
            Self::Attack => write!(f, "Attack"),
        }
    }
}

/// One attack, created per attack command and discarded when the attack ends.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSequence {
    /// The actor performing the attack.
    pub attacker: ActorId,
    /// The actor being attacked.
    pub target: ActorId,
    /// Point the attacker closes on before striking.
    pub target_position: Vec3,
    /// Total length of the sequence in seconds.
    pub total_duration: f32,
}

/// A queued command waiting for the active state to finish.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingState {
    /// Move from wherever the actor is when the move starts to `to`.
    Move {
        /// Destination of the move.
        to: Vec3,
    },
    /// Run the given attack sequence.
    Attack(AttackSequence),
}

impl PendingState {
    /// Returns the state this command will enter.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Move { .. } => StateKind::Move,
            Self::Attack(_) => StateKind::Attack,
        }
    }
}

/// Data for an active move.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveState {
    /// Position at the moment the move began.
    pub from: Vec3,
    /// Destination.
    pub to: Vec3,
    /// Length of the move in seconds.
    pub duration: f32,
    /// Time spent so far.
    pub elapsed: f32,
}

impl MoveState {
    /// Interpolation parameter, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Returns true once the full duration has elapsed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Data for an active attack.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackState {
    /// The sequence being executed.
    pub sequence: AttackSequence,
    /// Time left before the sequence ends. Only counts down once engaged.
    pub remaining: f32,
    /// Set once both attacker and target have settled and the approach began.
    pub engaged: bool,
    /// Set when the strike has landed, so it lands only once.
    pub struck: bool,
}

impl AttackState {
    /// Starts a fresh attack from a sequence.
    #[must_use]
    pub fn new(sequence: AttackSequence) -> Self {
        Self {
            sequence,
            remaining: sequence.total_duration,
            engaged: false,
            struck: false,
        }
    }

    /// Remaining-time threshold at which the strike lands.
    #[must_use]
    pub fn strike_threshold(&self, strike_delay: f32) -> f32 {
        self.sequence.total_duration - strike_delay
    }
}

/// The active state of an actor.
///
/// There is no "none" variant: an actor is constructed `Idle` and every
/// transition lands on one of these three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorState {
    /// Resting.
    Idle,
    /// Moving between two points.
    Move(MoveState),
    /// Attacking another actor.
    Attack(AttackState),
}

impl ActorState {
    /// Returns the discriminant of this state.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Move(_) => StateKind::Move,
            Self::Attack(_) => StateKind::Attack,
        }
    }
}

/// Active state plus the FIFO of commands waiting behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    state: ActorState,
    queue: VecDeque<PendingState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Creates an idle machine with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ActorState::Idle,
            queue: VecDeque::new(),
        }
    }

    /// Returns the active state.
    #[must_use]
    pub fn state(&self) -> &ActorState {
        &self.state
    }

    /// Returns the active state mutably.
    pub fn state_mut(&mut self) -> &mut ActorState {
        &mut self.state
    }

    /// Returns the discriminant of the active state.
    #[must_use]
    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// True whenever the active state is not `Idle`.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.kind() != StateKind::Idle
    }

    /// Appends a command behind everything already queued.
    pub fn push(&mut self, pending: PendingState) {
        self.queue.push_back(pending);
    }

    /// Removes the oldest queued command.
    pub fn pop(&mut self) -> Option<PendingState> {
        self.queue.pop_front()
    }

    /// Number of queued commands.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Iterates queued commands oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingState> + '_ {
        self.queue.iter()
    }

    /// Replaces the active state.
    pub fn set(&mut self, state: ActorState) {
        self.state = state;
    }

    /// Drops every queued command and returns to `Idle`.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.state = ActorState::Idle;
    }
}

/// Turns `orientation` toward the horizontal part of `direction`.
///
/// Uses an exponential-decay blend so the turn rate is frame-rate
/// independent. A direction with no horizontal component leaves the
/// orientation untouched.
pub fn turn_towards(orientation: &mut Quat, direction: Vec3, rate: f32, dt: f32) {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= TURN_EPSILON || dt <= 0.0 {
        return;
    }
    let target = Quat::from_rotation_y(flat.x.atan2(flat.z));
    let blend = 1.0 - (-rate * dt).exp();
    *orientation = orientation.slerp(target, blend).normalize();
}
