//! Tunable timings and geometry for the simulation.
//!
//! Every struct implements `Default` with the reference values, and every
//! field is optional when deserializing, so a config document only needs to
//! name what it overrides.
//!
//! # Example
//!
//! ```
//! use roomswap_core::config::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "win_reset_delay": 3.0 }"#).unwrap();
//! assert_eq!(config.win_reset_delay, 3.0);
//! assert_eq!(config.actor.move_duration, 1.0);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Per-actor state machine timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Duration of a single move between two points, in seconds.
    pub move_duration: f32,
    /// Exponential-decay turn rate while moving.
    pub move_turn_rate: f32,
    /// Exponential-decay turn rate while attacking. Faster than moving.
    pub attack_turn_rate: f32,
    /// Exponential-decay rate at which an attacker closes on its approach point.
    pub attack_approach_rate: f32,
    /// Elapsed attack time at which the strike lands.
    pub strike_delay: f32,
    /// How long a landed strike keeps the target knocked back.
    pub knockback_duration: f32,
    /// Delay between an attack finishing and the target recovering.
    pub knockback_grace: f32,
    /// Lower bound of the randomized knockback impulse.
    pub knockback_impulse_min: f32,
    /// Upper bound of the randomized knockback impulse.
    pub knockback_impulse_max: f32,
    /// Per-second velocity damping applied to the knocked-back body.
    pub knockback_damping: f32,
    /// Distance under which an idle actor counts as settled on its rest point.
    pub settle_epsilon: f32,
    /// How long the benign "dance" reaction plays.
    pub dance_duration: f32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            move_duration: 1.0,
            move_turn_rate: 8.0,
            attack_turn_rate: 16.0,
            attack_approach_rate: 6.0,
            strike_delay: 0.5,
            knockback_duration: 2.0,
            knockback_grace: 0.5,
            knockback_impulse_min: 2.0,
            knockback_impulse_max: 5.0,
            knockback_damping: 4.0,
            settle_epsilon: 1e-3,
            dance_duration: 1.5,
        }
    }
}

/// Board geometry and shuffling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Gap between neighboring cells, as a fraction of the cell size.
    pub margin: f32,
    /// Offset of cell (0, 0) from the world origin along x and z.
    pub origin_offset: f32,
    /// Number of random non-animated swaps performed by a shuffle.
    pub shuffle_iterations: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            margin: 0.2,
            origin_offset: 0.5,
            shuffle_iterations: 5,
        }
    }
}

/// Conflict resolution timings and approach geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Total duration of an attack sequence.
    pub attack_duration: f32,
    /// Minimum time a matched neighbor cell stays locked. The lock is also
    /// held until the attack on that neighbor finishes.
    pub lock_duration: f32,
    /// Window after which every actor is unfrozen regardless of outcome.
    pub grace_window: f32,
    /// Distance from the target at which the attacker stops, along the approach direction.
    pub approach_factor: f32,
    /// Horizontal separation below which the fallback direction is used.
    pub min_horizontal_offset: f32,
    /// Direction substituted when attacker and target overlap horizontally.
    pub fallback_direction: Vec3,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            attack_duration: 2.0,
            lock_duration: 2.5,
            grace_window: 3.0,
            approach_factor: 0.5,
            min_horizontal_offset: 0.1,
            fallback_direction: Vec3::X,
        }
    }
}

/// Top-level configuration for a [`Game`](crate::game::Game).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Actor state machine settings.
    pub actor: ActorConfig,
    /// Board geometry settings.
    pub board: BoardConfig,
    /// Conflict resolver settings.
    pub resolver: ResolverConfig,
    /// Delay between winning and the board reshuffling.
    pub win_reset_delay: f32,
    /// Length of the knockback flourish played by a manual reset.
    pub manual_reset_delay: f32,
    /// Drag length below which a release does not count as a swipe.
    pub swipe_dead_zone: f32,
    /// Seed for every random decision the game makes.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            actor: ActorConfig::default(),
            board: BoardConfig::default(),
            resolver: ResolverConfig::default(),
            win_reset_delay: 5.0,
            manual_reset_delay: 2.0,
            swipe_dead_zone: 0.25,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigParse`] for malformed JSON and
    /// [`GameError::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every duration and rate is finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), GameError> {
        let positive = [
            ("actor.move_duration", self.actor.move_duration),
            ("actor.move_turn_rate", self.actor.move_turn_rate),
            ("actor.attack_turn_rate", self.actor.attack_turn_rate),
            ("actor.attack_approach_rate", self.actor.attack_approach_rate),
            ("actor.knockback_duration", self.actor.knockback_duration),
            ("actor.settle_epsilon", self.actor.settle_epsilon),
            ("resolver.attack_duration", self.resolver.attack_duration),
            ("resolver.min_horizontal_offset", self.resolver.min_horizontal_offset),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let non_negative = [
            ("actor.strike_delay", self.actor.strike_delay),
            ("actor.knockback_grace", self.actor.knockback_grace),
            ("actor.knockback_impulse_min", self.actor.knockback_impulse_min),
            ("actor.knockback_damping", self.actor.knockback_damping),
            ("actor.dance_duration", self.actor.dance_duration),
            ("board.margin", self.board.margin),
            ("board.origin_offset", self.board.origin_offset),
            ("resolver.lock_duration", self.resolver.lock_duration),
            ("resolver.grace_window", self.resolver.grace_window),
            ("resolver.approach_factor", self.resolver.approach_factor),
            ("win_reset_delay", self.win_reset_delay),
            ("manual_reset_delay", self.manual_reset_delay),
            ("swipe_dead_zone", self.swipe_dead_zone),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        if self.actor.knockback_impulse_max < self.actor.knockback_impulse_min
            || !self.actor.knockback_impulse_max.is_finite()
        {
            return Err(GameError::InvalidConfig(
                "actor.knockback_impulse_max must be >= knockback_impulse_min".to_string(),
            ));
        }
        if self.actor.strike_delay > self.resolver.attack_duration {
            return Err(GameError::InvalidConfig(format!(
                "actor.strike_delay ({}) exceeds resolver.attack_duration ({})",
                self.actor.strike_delay, self.resolver.attack_duration
            )));
        }
        let fallback = Vec3::new(
            self.resolver.fallback_direction.x,
            0.0,
            self.resolver.fallback_direction.z,
        );
        if !fallback.is_finite() || fallback.length_squared() <= f32::EPSILON {
            return Err(GameError::InvalidConfig(
                "resolver.fallback_direction must have a horizontal component".to_string(),
            ));
        }
        Ok(())
    }
}
