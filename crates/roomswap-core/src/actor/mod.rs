//! Actors: the characters standing on occupied cells.
//!
//! This module provides:
//! - [`ActorId`]: stable identifier, also the arena key
//! - [`Team`]: which side an actor belongs to
//! - [`ActorFlags`]: presentation and input flags
//! - [`Actor`]: pose, rest point, state machine and knockback for one actor
//!
//! # State handlers
//!
//! [`Actor::update`] advances whichever of the three handlers is active:
//!
//! - **Idle** pulls the head of the queue if there is one, otherwise walks
//!   back to the rest point when displaced, otherwise holds the rest pose.
//! - **Move** interpolates linearly from the start point to the destination
//!   and turns toward the direction of travel.
//! - **Attack** waits until both sides have settled, then faces the target,
//!   closes on the approach point and lands a single strike.
//!
//! Cross-actor consequences (a strike landing on the target, the target's
//! recovery) are returned as [`ActorEffect`]s and applied by the caller, so
//! an actor never needs mutable access to another actor.
//!
//! # Example
//!
//! ```
//! use roomswap_core::actor::{Actor, ActorId, StateKind, Team};
//! use roomswap_core::arena::PoseSnapshot;
//! use roomswap_core::config::ActorConfig;
//! use glam::Vec3;
//!
//! let config = ActorConfig::default();
//! let mut actor = Actor::new(ActorId::new(0), Team::Light, Vec3::ZERO, Vec3::ZERO);
//! actor.set_rest_point(Vec3::X);
//! actor.request_move(Vec3::X);
//!
//! let poses = PoseSnapshot::default();
//! actor.update(0.5, &poses, &config);
//! assert_eq!(actor.state_kind(), StateKind::Move);
//! actor.update(0.5, &poses, &config);
//! assert_eq!(actor.position(), Vec3::X);
//! assert!(!actor.is_busy());
//! ```

pub mod knockback;
pub mod state;

use std::fmt;

use bitflags::bitflags;
use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::arena::PoseSnapshot;
use crate::board::TileKind;
use crate::config::ActorConfig;

pub use knockback::Knockback;
pub use state::{
    turn_towards, ActorState, AttackSequence, AttackState, MoveState, PendingState, StateKind,
    StateMachine,
};

/// Unique identifier for an actor.
///
/// Ids are assigned by the arena in increasing order and never reused while
/// the board exists, which makes them safe to hold across ticks.
///
/// # Example
///
/// ```
/// use roomswap_core::actor::ActorId;
///
/// let a = ActorId::new(1);
/// let b = ActorId::new(2);
/// assert!(a < b);
/// assert_eq!(a.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates an id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// The side an actor fights for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    /// Unaligned.
    #[default]
    None,
    /// Team standing on [`TileKind::Circle`] tiles by default.
    Light,
    /// Team standing on [`TileKind::Triangle`] tiles by default.
    Dark,
}

impl Team {
    /// The team conventionally spawned on a tile of the given kind.
    #[must_use]
    pub const fn for_kind(kind: TileKind) -> Self {
        match kind {
            TileKind::Empty => Self::None,
            TileKind::Circle => Self::Light,
            TileKind::Triangle => Self::Dark,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Light => write!(f, "Light"),
            Self::Dark => write!(f, "Dark"),
        }
    }
}

bitflags! {
    /// Input and presentation flags for an actor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActorFlags: u8 {
        /// Cannot be picked as a gesture source.
        const FROZEN = 1 << 0;
        /// Currently picked as a gesture source.
        const SELECTED = 1 << 1;
        /// Playing the win celebration.
        const CELEBRATING = 1 << 2;
        /// Playing the benign "no match" dance.
        const DANCING = 1 << 3;
        /// Knockback body is active. Derived, never stored.
        const KNOCKED_BACK = 1 << 4;
    }
}

/// Non-positional reactions the presentation layer plays on request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    /// Short dance for a neighbor that did not match.
    Dance,
    /// Celebration played by everyone on a win.
    Celebrate,
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dance => write!(f, "Dance"),
            Self::Celebrate => write!(f, "Celebrate"),
        }
    }
}

/// Cross-actor consequence of an actor update, applied by the caller.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorEffect {
    /// The attacker's strike landed; the target should be knocked back.
    StrikeLanded {
        /// Actor that struck.
        attacker: ActorId,
        /// Actor that was struck.
        target: ActorId,
        /// Origin of the force, the attacker's position at the strike.
        force_position: Vec3,
    },
    /// The attack sequence finished; the target may recover after a grace delay.
    AttackFinished {
        /// Actor that attacked.
        attacker: ActorId,
        /// Actor that was attacked.
        target: ActorId,
    },
    /// This actor's knockback reverted.
    KnockbackReverted {
        /// Actor that recovered.
        actor: ActorId,
    },
}

/// A character bound to a board cell.
///
/// The actor owns its pose exclusively; while busy, nothing else writes its
/// position or orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    team: Team,
    position: Vec3,
    orientation: Quat,
    rest_point: Vec3,
    anchor_offset: Vec3,
    fsm: StateMachine,
    knockback: Knockback,
    flags: ActorFlags,
    dance_remaining: f32,
}

impl Actor {
    /// Creates an idle actor standing on its rest point.
    ///
    /// `anchor_offset` is the rest point's offset from the cell it occupies;
    /// it follows the actor when it changes cells.
    #[must_use]
    pub fn new(id: ActorId, team: Team, rest_point: Vec3, anchor_offset: Vec3) -> Self {
        Self {
            id,
            team,
            position: rest_point,
            orientation: Quat::IDENTITY,
            rest_point,
            anchor_offset,
            fsm: StateMachine::new(),
            knockback: Knockback::new(),
            flags: ActorFlags::empty(),
            dance_remaining: 0.0,
        }
    }

    /// Returns the actor's id.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Returns the actor's team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Logical position driven by the state machine.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Position of the visible body, including any knockback displacement.
    #[must_use]
    pub fn visible_position(&self) -> Vec3 {
        self.position + self.knockback.displacement()
    }

    /// Current facing.
    #[must_use]
    pub const fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Point the actor returns to when idle.
    #[must_use]
    pub const fn rest_point(&self) -> Vec3 {
        self.rest_point
    }

    /// Offset of the rest point from the occupied cell's center.
    #[must_use]
    pub const fn anchor_offset(&self) -> Vec3 {
        self.anchor_offset
    }

    /// Moves the rest point, e.g. when the actor changes cells.
    pub fn set_rest_point(&mut self, rest_point: Vec3) {
        self.rest_point = rest_point;
    }

    /// Returns the active state.
    #[must_use]
    pub fn state(&self) -> &ActorState {
        self.fsm.state()
    }

    /// Returns the discriminant of the active state.
    #[must_use]
    pub fn state_kind(&self) -> StateKind {
        self.fsm.kind()
    }

    /// True whenever the active state is not `Idle`.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.fsm.is_busy()
    }

    /// True while a move is interpolating or the knockback body is active.
    #[must_use]
    pub fn in_animation(&self) -> bool {
        self.fsm.kind() == StateKind::Move || self.knockback.is_active()
    }

    /// Queued commands, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingState> + '_ {
        self.fsm.pending()
    }

    /// Number of queued commands.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.fsm.pending_len()
    }

    /// Returns the knockback effect.
    #[must_use]
    pub const fn knockback(&self) -> &Knockback {
        &self.knockback
    }

    /// Stored flags plus [`ActorFlags::KNOCKED_BACK`] when applicable.
    #[must_use]
    pub fn flags(&self) -> ActorFlags {
        let mut flags = self.flags;
        flags.set(ActorFlags::KNOCKED_BACK, self.knockback.is_active());
        flags
    }

    /// Sets or clears stored flags.
    pub fn set_flag(&mut self, flag: ActorFlags, value: bool) {
        self.flags.set(flag - ActorFlags::KNOCKED_BACK, value);
    }

    /// True when the actor is frozen against new gestures.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.flags.contains(ActorFlags::FROZEN)
    }

    /// The reaction currently playing, if any.
    #[must_use]
    pub fn reaction(&self) -> Option<Reaction> {
        if self.flags.contains(ActorFlags::CELEBRATING) {
            Some(Reaction::Celebrate)
        } else if self.flags.contains(ActorFlags::DANCING) {
            Some(Reaction::Dance)
        } else {
            None
        }
    }

    /// Queues a move to `target`.
    ///
    /// The move starts once everything queued before it has finished.
    pub fn request_move(&mut self, target: Vec3) {
        self.enqueue(PendingState::Move { to: target });
    }

    /// Queues an attack on `target`, closing on `attack_position`.
    pub fn request_attack(&mut self, target: ActorId, attack_position: Vec3, duration: f32) {
        self.enqueue(PendingState::Attack(AttackSequence {
            attacker: self.id,
            target,
            target_position: attack_position,
            total_duration: duration,
        }));
    }

    fn enqueue(&mut self, pending: PendingState) {
        if self.fsm.kind() == StateKind::Attack {
            debug!(
                actor = %self.id,
                command = %pending.kind(),
                queued = self.fsm.pending_len() + 1,
                "Command queued behind active attack"
            );
        }
        self.fsm.push(pending);
    }

    /// Starts a reaction. A celebration lasts until cleared; a dance times out.
    pub fn play_reaction(&mut self, reaction: Reaction, config: &ActorConfig) {
        match reaction {
            Reaction::Dance => {
                self.flags.insert(ActorFlags::DANCING);
                self.dance_remaining = config.dance_duration;
            }
            Reaction::Celebrate => self.flags.insert(ActorFlags::CELEBRATING),
        }
    }

    /// Stops any reaction.
    pub fn clear_reaction(&mut self) {
        self.flags
            .remove(ActorFlags::CELEBRATING | ActorFlags::DANCING);
        self.dance_remaining = 0.0;
    }

    /// Starts the knockback effect, pushing away from `force_position`.
    ///
    /// The effect reverts by itself after `duration`.
    pub fn spawn_knockback<R: Rng + ?Sized>(
        &mut self,
        force_position: Vec3,
        duration: f32,
        config: &ActorConfig,
        rng: &mut R,
    ) {
        self.knockback.spawn(
            self.position,
            force_position,
            duration,
            (config.knockback_impulse_min, config.knockback_impulse_max),
            rng,
        );
    }

    /// Reschedules the knockback revert; the latest schedule wins.
    pub fn schedule_knockback_revert(&mut self, delay: f32) {
        self.knockback.schedule_revert(delay);
    }

    /// Ends the knockback effect immediately.
    pub fn cancel_knockback(&mut self) {
        self.knockback.cancel();
    }

    /// Drops all queued work and places the actor on its rest point.
    ///
    /// Used when the board is rebuilt after a win or a manual reset.
    pub fn teleport_to_rest(&mut self) {
        self.fsm.clear();
        self.knockback.cancel();
        self.clear_reaction();
        self.position = self.rest_point;
        self.orientation = Quat::IDENTITY;
    }

    /// Places the actor at `position` without animating.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Advances the active handler, the knockback body and reaction timers.
    pub fn update(
        &mut self,
        dt: f32,
        poses: &PoseSnapshot,
        config: &ActorConfig,
    ) -> Vec<ActorEffect> {
        let mut effects = Vec::new();

        if self.knockback.update(dt, config.knockback_damping) {
            effects.push(ActorEffect::KnockbackReverted { actor: self.id });
        }

        if self.flags.contains(ActorFlags::DANCING) {
            self.dance_remaining -= dt;
            if self.dance_remaining <= 0.0 {
                self.flags.remove(ActorFlags::DANCING);
                self.dance_remaining = 0.0;
            }
        }

        if self.fsm.kind() == StateKind::Idle {
            self.leave_idle(config);
        }

        match self.fsm.kind() {
            StateKind::Idle => self.hold_rest_pose(dt, config),
            StateKind::Move => self.update_move(dt, config),
            StateKind::Attack => self.update_attack(dt, poses, config, &mut effects),
        }

        effects
    }

    /// Idle exits straight to the head of the queue, or walks home when displaced.
    fn leave_idle(&mut self, config: &ActorConfig) {
        if let Some(next) = self.fsm.pop() {
            self.begin(next, config);
        } else if self.position.distance(self.rest_point) > config.settle_epsilon {
            trace!(actor = %self.id, "Not settled, returning to rest point");
            self.begin(PendingState::Move { to: self.rest_point }, config);
        }
    }

    fn hold_rest_pose(&mut self, dt: f32, config: &ActorConfig) {
        self.position = self.rest_point;
        let blend = 1.0 - (-config.move_turn_rate * dt).exp();
        self.orientation = self.orientation.slerp(Quat::IDENTITY, blend).normalize();
    }

    fn update_move(&mut self, dt: f32, config: &ActorConfig) {
        let ActorState::Move(mv) = self.fsm.state_mut() else {
            return;
        };
        mv.elapsed += dt;
        let (from, to) = (mv.from, mv.to);
        let done = mv.is_complete();
        let t = mv.progress();

        self.position = if done { to } else { from.lerp(to, t) };
        turn_towards(&mut self.orientation, to - from, config.move_turn_rate, dt);

        if done {
            self.finish(config);
        }
    }

    fn update_attack(
        &mut self,
        dt: f32,
        poses: &PoseSnapshot,
        config: &ActorConfig,
        effects: &mut Vec<ActorEffect>,
    ) {
        let self_animating = self.knockback.is_active();
        let ActorState::Attack(attack) = self.fsm.state_mut() else {
            return;
        };
        let target = poses.get(attack.sequence.target);

        if !attack.engaged {
            let target_animating = target.is_some_and(|t| t.in_animation);
            if target_animating || self_animating {
                return;
            }
            attack.engaged = true;
            trace!(
                attacker = %attack.sequence.attacker,
                target = %attack.sequence.target,
                "Attack engaged"
            );
        }

        attack.remaining -= dt;
        let sequence = attack.sequence;
        let strike_now =
            !attack.struck && attack.remaining <= attack.strike_threshold(config.strike_delay);
        if strike_now {
            attack.struck = true;
        }
        let done = attack.remaining <= 0.0;

        let facing_point = target.map_or(sequence.target_position, |t| t.position);
        turn_towards(
            &mut self.orientation,
            facing_point - self.position,
            config.attack_turn_rate,
            dt,
        );
        let blend = 1.0 - (-config.attack_approach_rate * dt).exp();
        self.position = self.position.lerp(sequence.target_position, blend);

        if strike_now {
            debug!(attacker = %sequence.attacker, target = %sequence.target, "Strike landed");
            effects.push(ActorEffect::StrikeLanded {
                attacker: sequence.attacker,
                target: sequence.target,
                force_position: self.position,
            });
        }

        if done {
            effects.push(ActorEffect::AttackFinished {
                attacker: sequence.attacker,
                target: sequence.target,
            });
            self.finish(config);
        }
    }

    /// Leaves the active state for the head of the queue, or `Idle`.
    fn finish(&mut self, config: &ActorConfig) {
        match self.fsm.pop() {
            Some(next) => self.begin(next, config),
            None => {
                trace!(actor = %self.id, from = %self.fsm.kind(), "Back to idle");
                self.fsm.set(ActorState::Idle);
            }
        }
    }

    fn begin(&mut self, pending: PendingState, config: &ActorConfig) {
        trace!(actor = %self.id, from = %self.fsm.kind(), to = %pending.kind(), "State change");
        let state = match pending {
            PendingState::Move { to } => ActorState::Move(MoveState {
                from: self.position,
                to,
                duration: config.move_duration,
                elapsed: 0.0,
            }),
            PendingState::Attack(sequence) => ActorState::Attack(AttackState::new(sequence)),
        };
        self.fsm.set(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::TargetPose;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn actor_at(id: u64, position: Vec3) -> Actor {
        Actor::new(ActorId::new(id), Team::Light, position, Vec3::ZERO)
    }

    fn count_strikes(effects: &[ActorEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, ActorEffect::StrikeLanded { .. }))
            .count()
    }

    fn target_poses(in_animation: bool) -> PoseSnapshot {
        let mut poses = PoseSnapshot::default();
        poses.insert(
            ActorId::new(1),
            TargetPose {
                position: Vec3::new(1.2, 0.0, 0.0),
                in_animation,
            },
        );
        poses
    }

    mod actor_id_tests {
        use super::*;

        #[test]
        fn ordering_and_conversion() {
            let mut ids = vec![ActorId::new(3), ActorId::new(1), ActorId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![ActorId::new(1), ActorId::new(2), ActorId::new(3)]);
            let raw: u64 = ActorId::from(42u64).into();
            assert_eq!(raw, 42);
        }

        #[test]
        fn formatting() {
            assert_eq!(format!("{:?}", ActorId::new(5)), "ActorId(5)");
            assert_eq!(format!("{}", ActorId::new(5)), "5");
        }
    }

    mod team_tests {
        use super::*;

        #[test]
        fn team_for_kind() {
            assert_eq!(Team::for_kind(TileKind::Empty), Team::None);
            assert_eq!(Team::for_kind(TileKind::Circle), Team::Light);
            assert_eq!(Team::for_kind(TileKind::Triangle), Team::Dark);
        }
    }

    mod move_tests {
        use super::*;

        #[test]
        fn interpolates_linearly_and_lands_exactly() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let target = Vec3::new(1.0, 0.0, 0.0);
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.set_rest_point(target);
            actor.request_move(target);

            actor.update(0.5, &poses, &config);
            assert_eq!(actor.state_kind(), StateKind::Move);
            assert!((actor.position() - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-5);

            actor.update(0.5, &poses, &config);
            assert_eq!(actor.position(), target);
            assert_eq!(actor.state_kind(), StateKind::Idle);
        }

        #[test]
        fn overshooting_tick_still_lands_exactly() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let target = Vec3::new(1.0, 0.0, 2.0);
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.set_rest_point(target);
            actor.request_move(target);

            actor.update(0.7, &poses, &config);
            actor.update(0.7, &poses, &config);
            assert_eq!(actor.position(), target);
            assert!(!actor.is_busy());
        }

        #[test]
        fn turns_toward_travel_gradually() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.set_rest_point(Vec3::X);
            actor.request_move(Vec3::X);

            actor.update(1.0 / 60.0, &poses, &config);
            let facing = actor.orientation() * Vec3::Z;
            assert!(facing.x > 0.0);
            assert!(facing.x < 0.99);
        }

        #[test]
        fn vertical_move_does_not_turn() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.set_rest_point(Vec3::Y);
            actor.request_move(Vec3::Y);
            actor.update(0.5, &poses, &config);
            assert_eq!(actor.orientation(), Quat::IDENTITY);
        }

        #[test]
        fn queued_moves_run_back_to_back() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.set_rest_point(Vec3::new(2.0, 0.0, 0.0));
            actor.request_move(Vec3::X);
            actor.request_move(Vec3::new(2.0, 0.0, 0.0));
            assert_eq!(actor.pending_len(), 2);

            actor.update(1.0, &poses, &config);
            assert_eq!(actor.position(), Vec3::X);
            assert_eq!(actor.state_kind(), StateKind::Move);
            assert_eq!(actor.pending_len(), 0);

            actor.update(1.0, &poses, &config);
            assert_eq!(actor.position(), Vec3::new(2.0, 0.0, 0.0));
            assert!(!actor.is_busy());
        }
    }

    mod idle_tests {
        use super::*;

        #[test]
        fn displaced_actor_walks_home() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.teleport(Vec3::new(0.0, 0.0, 1.0));

            actor.update(0.1, &poses, &config);
            assert_eq!(actor.state_kind(), StateKind::Move);

            for _ in 0..10 {
                actor.update(0.1, &poses, &config);
            }
            assert_eq!(actor.position(), Vec3::ZERO);
            assert_eq!(actor.state_kind(), StateKind::Idle);
        }

        #[test]
        fn settled_actor_stays_idle() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::new(3.0, 0.0, 3.0));
            for _ in 0..5 {
                actor.update(0.1, &poses, &config);
            }
            assert_eq!(actor.state_kind(), StateKind::Idle);
            assert_eq!(actor.position(), Vec3::new(3.0, 0.0, 3.0));
        }
    }

    mod attack_tests {
        use super::*;

        fn attacker() -> Actor {
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.request_attack(ActorId::new(1), Vec3::new(0.7, 0.0, 0.0), 1.0);
            actor
        }

        #[test]
        fn strike_lands_once_at_half_second() {
            let config = ActorConfig::default();
            let poses = target_poses(false);
            let mut actor = attacker();

            let first = actor.update(0.25, &poses, &config);
            assert_eq!(count_strikes(&first), 0);
            assert_eq!(actor.state_kind(), StateKind::Attack);

            let second = actor.update(0.25, &poses, &config);
            assert_eq!(count_strikes(&second), 1);

            let mut rest = Vec::new();
            for _ in 0..8 {
                rest.extend(actor.update(0.25, &poses, &config));
            }
            assert_eq!(count_strikes(&rest), 0);
            assert!(rest
                .iter()
                .any(|e| matches!(e, ActorEffect::AttackFinished { .. })));
        }

        #[test]
        fn overshooting_ticks_strike_once() {
            let config = ActorConfig::default();
            let poses = target_poses(false);
            let mut actor = attacker();

            let mut strikes = Vec::new();
            for _ in 0..10 {
                strikes.push(count_strikes(&actor.update(0.3, &poses, &config)));
            }
            assert_eq!(strikes.iter().sum::<usize>(), 1);
            assert_eq!(strikes[1], 1, "0.6s is the first tick past 0.5s");
        }

        #[test]
        fn waits_for_target_to_settle() {
            let config = ActorConfig::default();
            let busy = target_poses(true);
            let mut actor = attacker();

            for _ in 0..5 {
                let effects = actor.update(0.25, &busy, &config);
                assert!(effects.is_empty());
            }
            let ActorState::Attack(attack) = actor.state() else {
                panic!("expected attack state");
            };
            assert!(!attack.engaged);
            assert_eq!(attack.remaining, 1.0);
            assert_eq!(actor.position(), Vec3::ZERO);

            let settled = target_poses(false);
            actor.update(0.25, &settled, &config);
            let ActorState::Attack(attack) = actor.state() else {
                panic!("expected attack state");
            };
            assert!(attack.engaged);
        }

        #[test]
        fn approaches_and_faces_target() {
            let config = ActorConfig::default();
            let poses = target_poses(false);
            let mut actor = attacker();
            for _ in 0..3 {
                actor.update(0.25, &poses, &config);
            }
            assert!(actor.position().x > 0.3);
            assert!((actor.orientation() * Vec3::Z).x > 0.5);
        }

        #[test]
        fn commands_during_attack_are_queued() {
            let config = ActorConfig::default();
            let poses = target_poses(false);
            let mut actor = attacker();
            actor.update(0.25, &poses, &config);
            assert_eq!(actor.state_kind(), StateKind::Attack);

            actor.request_move(Vec3::new(0.0, 0.0, 5.0));
            actor.request_attack(ActorId::new(1), Vec3::X, 1.0);
            assert_eq!(actor.state_kind(), StateKind::Attack);
            let kinds: Vec<_> = actor.pending().map(PendingState::kind).collect();
            assert_eq!(kinds, vec![StateKind::Move, StateKind::Attack]);

            for _ in 0..3 {
                actor.update(0.25, &poses, &config);
            }
            assert_eq!(actor.state_kind(), StateKind::Move);
        }
    }

    mod reaction_tests {
        use super::*;

        #[test]
        fn dance_times_out() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.play_reaction(Reaction::Dance, &config);
            assert_eq!(actor.reaction(), Some(Reaction::Dance));
            actor.update(config.dance_duration + 0.01, &poses, &config);
            assert_eq!(actor.reaction(), None);
        }

        #[test]
        fn celebration_persists_until_cleared() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.play_reaction(Reaction::Celebrate, &config);
            actor.update(10.0, &poses, &config);
            assert_eq!(actor.reaction(), Some(Reaction::Celebrate));
            actor.clear_reaction();
            assert_eq!(actor.reaction(), None);
        }
    }

    mod knockback_tests {
        use super::*;

        #[test]
        fn knocked_back_flag_is_derived() {
            let config = ActorConfig::default();
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut actor = actor_at(0, Vec3::ZERO);
            assert!(!actor.flags().contains(ActorFlags::KNOCKED_BACK));

            actor.spawn_knockback(Vec3::X, 1.0, &config, &mut rng);
            assert!(actor.flags().contains(ActorFlags::KNOCKED_BACK));
            assert!(actor.in_animation());

            actor.set_flag(ActorFlags::KNOCKED_BACK, false);
            assert!(actor.flags().contains(ActorFlags::KNOCKED_BACK));

            actor.cancel_knockback();
            assert!(!actor.flags().contains(ActorFlags::KNOCKED_BACK));
        }

        #[test]
        fn revert_is_reported_once() {
            let config = ActorConfig::default();
            let poses = PoseSnapshot::default();
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut actor = actor_at(0, Vec3::ZERO);
            actor.spawn_knockback(Vec3::X, 0.5, &config, &mut rng);

            let mut reverts = 0;
            for _ in 0..10 {
                reverts += actor
                    .update(0.1, &poses, &config)
                    .iter()
                    .filter(|e| matches!(e, ActorEffect::KnockbackReverted { .. }))
                    .count();
            }
            assert_eq!(reverts, 1);
            assert_eq!(actor.visible_position(), actor.position());
        }
    }

    #[test]
    fn teleport_to_rest_clears_everything() {
        let config = ActorConfig::default();
        let poses = target_poses(false);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut actor = actor_at(0, Vec3::ZERO);
        actor.request_attack(ActorId::new(1), Vec3::X, 1.0);
        actor.request_move(Vec3::Z);
        actor.update(0.25, &poses, &config);
        actor.spawn_knockback(Vec3::X, 5.0, &config, &mut rng);
        actor.play_reaction(Reaction::Celebrate, &config);

        actor.teleport_to_rest();
        assert!(!actor.is_busy());
        assert_eq!(actor.pending_len(), 0);
        assert_eq!(actor.position(), Vec3::ZERO);
        assert!(!actor.knockback().is_active());
        assert_eq!(actor.reaction(), None);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut actor = actor_at(4, Vec3::new(1.0, 0.0, 2.0));
        actor.request_move(Vec3::X);
        let json = serde_json::to_string(&actor).unwrap();
        let back: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(actor, back);
    }
}
