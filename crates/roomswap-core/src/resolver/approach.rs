//! Where an attacker stands when it strikes.

use glam::Vec3;

use crate::config::ResolverConfig;

/// Horizontal unit direction from `target` toward `attacker`.
///
/// When the two stand closer than `min_horizontal_offset` on the x/z plane
/// the configured fallback direction is used instead, so the attacker never
/// collapses onto the target.
#[must_use]
pub fn attack_direction(attacker: Vec3, target: Vec3, config: &ResolverConfig) -> Vec3 {
    let mut offset = attacker - target;
    offset.y = 0.0;
    if offset.length() < config.min_horizontal_offset {
        let mut fallback = config.fallback_direction;
        fallback.y = 0.0;
        return fallback.normalize_or_zero();
    }
    offset.normalize()
}

/// The point `approach_factor` away from the target along [`attack_direction`].
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use roomswap_core::config::ResolverConfig;
/// use roomswap_core::resolver::approach_point;
///
/// let config = ResolverConfig::default();
/// let point = approach_point(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.2), &config);
/// assert!((point - Vec3::new(0.0, 0.0, 0.7)).length() < 1e-5);
/// ```
#[must_use]
pub fn approach_point(attacker: Vec3, target: Vec3, config: &ResolverConfig) -> Vec3 {
    target + attack_direction(attacker, target, config) * config.approach_factor
}
