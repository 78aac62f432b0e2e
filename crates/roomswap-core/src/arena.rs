//! Arena holding every actor on the board.
//!
//! The arena is the only owner of [`Actor`]s. Cells refer to their occupant
//! by [`ActorId`], so there is no ownership cycle between cells and actors.
//!
//! # Architecture
//!
//! Actors are stored in a `BTreeMap` so iteration is always in id order,
//! which keeps updates and event order deterministic. Ids are assigned
//! monotonically and never reused while the arena lives.
//!
//! # Updating
//!
//! Actors read each other (an attacker faces its target, an attack waits for
//! the target to settle) but never write each other. [`ActorArena::update`]
//! therefore takes a [`PoseSnapshot`] of every actor first, advances each
//! actor against that frozen snapshot, and returns the resulting
//! [`ActorEffect`]s for the caller to apply.
//!
//! # Example
//!
//! ```
//! use roomswap_core::actor::Team;
//! use roomswap_core::arena::ActorArena;
//! use glam::Vec3;
//!
//! let mut arena = ActorArena::new();
//! let a = arena.spawn(Team::Light, Vec3::ZERO, Vec3::ZERO);
//! let b = arena.spawn(Team::Dark, Vec3::X, Vec3::ZERO);
//!
//! let ids: Vec<_> = arena.ids_sorted().collect();
//! assert_eq!(ids, vec![a, b]);
//! assert_eq!(arena.get(b).unwrap().team(), Team::Dark);
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorEffect, ActorId, Team};
use crate::config::ActorConfig;

// =============================================================================
// Pose Snapshot
// =============================================================================

/// What one actor can observe about another during an update.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPose {
    /// Logical position at the start of the tick.
    pub position: Vec3,
    /// True while the actor is moving or knocked back.
    pub in_animation: bool,
}

/// Frozen view of every actor's pose, taken once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    poses: BTreeMap<ActorId, TargetPose>,
}

impl PoseSnapshot {
    /// Records an actor's pose.
    pub fn insert(&mut self, id: ActorId, pose: TargetPose) {
        self.poses.insert(id, pose);
    }

    /// Returns an actor's pose, if it was captured.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<TargetPose> {
        self.poses.get(&id).copied()
    }
}

// =============================================================================
// Actor Arena
// =============================================================================

/// Container for every actor, keyed by stable id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorArena {
    /// Monotonically increasing id counter.
    next_id: u64,
    /// Actor storage with deterministic iteration order.
    actors: BTreeMap<ActorId, Actor>,
}

impl ActorArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            actors: BTreeMap::new(),
        }
    }

    /// Creates an idle actor standing on `rest_point` and returns its id.
    pub fn spawn(&mut self, team: Team, rest_point: Vec3, anchor_offset: Vec3) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        self.actors
            .insert(id, Actor::new(id, team, rest_point, anchor_offset));
        id
    }

    /// Removes every actor. Ids keep increasing afterwards.
    pub fn clear(&mut self) {
        self.actors.clear();
    }

    /// Returns an actor by id.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Returns an actor mutably by id.
    #[must_use]
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Iterates ids in ascending order.
    pub fn ids_sorted(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Iterates actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.actors.values()
    }

    /// Iterates actors mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> + '_ {
        self.actors.values_mut()
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if the arena holds no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// True if any actor is in a non-idle state.
    #[must_use]
    pub fn any_busy(&self) -> bool {
        self.actors.values().any(Actor::is_busy)
    }

    /// Captures every actor's pose.
    #[must_use]
    pub fn snapshot(&self) -> PoseSnapshot {
        let mut snapshot = PoseSnapshot::default();
        for actor in self.actors.values() {
            snapshot.insert(
                actor.id(),
                TargetPose {
                    position: actor.position(),
                    in_animation: actor.in_animation(),
                },
            );
        }
        snapshot
    }

    /// Advances every actor against a snapshot taken at the start of the call.
    ///
    /// Effects are returned in actor id order.
    pub fn update(&mut self, dt: f32, config: &ActorConfig) -> Vec<ActorEffect> {
        let poses = self.snapshot();
        let mut effects = Vec::new();
        for actor in self.actors.values_mut() {
            effects.extend(actor.update(dt, &poses, config));
        }
        effects
    }
}
