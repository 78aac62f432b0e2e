//! Knockback: the transient reactive pose a landed strike puts an actor in.
//!
//! While active, the actor's visible body is displaced by a small ballistic
//! simulation started from a randomized impulse. The logical position that
//! the state machine drives is left alone, so recovering is just dropping
//! the displacement. Reverting is a countdown, not a blocking wait; a later
//! schedule always overwrites an earlier one.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Downward acceleration applied to the knocked-back body.
const GRAVITY: f32 = 9.81;

/// Maximum random deviation of the impulse from the push direction, in radians.
const SPREAD: f32 = 0.4;

/// Share of the impulse magnitude that goes upward.
const LIFT: f32 = 0.5;

/// Reactive body state for a single actor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    active: bool,
    displacement: Vec3,
    velocity: Vec3,
    revert_in: Option<f32>,
}

impl Knockback {
    /// Creates an inactive effect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while the reactive body replaces the normal one.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Offset of the visible body from the logical position.
    #[must_use]
    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    /// Seconds until the effect reverts, if a revert is scheduled.
    #[must_use]
    pub fn revert_in(&self) -> Option<f32> {
        self.revert_in
    }

    /// Starts the effect with an impulse pushing away from `force_position`.
    ///
    /// Magnitude is drawn from `impulse` and the direction is jittered by a
    /// random yaw. When the force originates directly above or below the
    /// actor a random horizontal direction is used. Re-triggering an active
    /// effect restarts it.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        actor_position: Vec3,
        force_position: Vec3,
        duration: f32,
        impulse: (f32, f32),
        rng: &mut R,
    ) {
        let away = actor_position - force_position;
        let flat = Vec3::new(away.x, 0.0, away.z);
        let base = if flat.length_squared() > f32::EPSILON {
            flat.normalize()
        } else {
            Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU)) * Vec3::Z
        };
        let direction = Quat::from_rotation_y(rng.gen_range(-SPREAD..=SPREAD)) * base;
        let (min, max) = impulse;
        let magnitude = if max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };

        self.active = true;
        self.displacement = Vec3::ZERO;
        self.velocity = direction * magnitude + Vec3::Y * magnitude * LIFT;
        self.revert_in = Some(duration.max(0.0));
    }

    /// Overwrites the pending revert so the effect ends after `delay`.
    ///
    /// Has no effect when the knockback is not active.
    pub fn schedule_revert(&mut self, delay: f32) {
        if self.active {
            self.revert_in = Some(delay.max(0.0));
        }
    }

    /// Ends the effect immediately and restores the normal body.
    pub fn cancel(&mut self) {
        self.active = false;
        self.displacement = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.revert_in = None;
    }

    /// Advances the reactive body and the revert countdown.
    ///
    /// Returns true on the tick the effect reverts.
    pub fn update(&mut self, dt: f32, damping: f32) -> bool {
        if !self.active {
            return false;
        }

        self.displacement += self.velocity * dt;
        let decay = (-damping * dt).exp();
        self.velocity.x *= decay;
        self.velocity.z *= decay;
        self.velocity.y -= GRAVITY * dt;
        if self.displacement.y <= 0.0 {
            self.displacement.y = 0.0;
            self.velocity.y = self.velocity.y.max(0.0);
        }

        if let Some(remaining) = self.revert_in.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.cancel();
                return true;
            }
        }
        false
    }
}
