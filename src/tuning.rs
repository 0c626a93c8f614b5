//! Data-driven gameplay tuning
//!
//! Every knob the level rulesets disagree on across revisions lives here:
//! the solid-tile set, the ground-probe velocity gate, whether the
//! collectible bob moves its hitbox, and what touching an enemy does.
//! Out-of-range values are rejected when a session is constructed, not
//! discovered mid-simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::body::GravityParams;
use crate::sim::tilemap::TileKind;

/// What happens when a hostile touches the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContactOutcome {
    /// Log and carry on (early-revision behavior)
    Ignore,
    /// Fail the run; the session owner resets the level
    #[default]
    ResetLevel,
}

/// Invalid tuning detected at session construction
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error(
        "jump impulse range is inverted: min {min} exceeds max {max}"
    )]
    InvertedJumpRange { min: f32, max: f32 },
    #[error("solid tile set is empty")]
    EmptySolidSet,
}

/// Gameplay tuning for one level session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Player horizontal speed while a direction is held (pixels/frame)
    pub move_speed: f32,
    /// Seconds after leaving ground during which a jump still counts
    pub coyote_time: f32,
    /// Charged-jump impulse floor (magnitude)
    pub jump_impulse_min: f32,
    /// Charged-jump impulse ceiling (magnitude)
    pub jump_impulse_max: f32,
    /// Charge gained per held frame
    pub jump_charge_rate: f32,

    pub player_gravity: GravityParams,
    pub enemy_gravity: GravityParams,
    /// No slow-descent damping: projectiles are not player-controlled
    pub projectile_gravity: GravityParams,

    /// Euclidean range within which a thrower attacks
    pub throw_radius: f32,
    /// Seconds between throws
    pub throw_cooldown: f32,
    /// Scale from captured player offset to launch velocity
    pub throw_speed_factor: f32,
    /// Fixed upward velocity added to every throw
    pub throw_lob_bias: f32,

    /// Upward velocity a burrower imparts on contact (magnitude)
    pub burrow_launch: f32,

    /// Patrol enemy walk speed (pixels/frame)
    pub patrol_speed: f32,

    /// Sine amplitude of the collectible bob (pixels)
    pub bob_amplitude: f32,
    /// Whether the bob drifts the collision rectangle too, or stays a
    /// purely cosmetic render offset
    pub bob_moves_hitbox: bool,

    /// Which tile kinds collide for this ruleset
    pub solid_kinds: Vec<TileKind>,
    /// Require `vel.y >= 0` in the ground probe
    pub ground_check_requires_descent: bool,
    /// What hostile contact with the player does
    pub contact_outcome: ContactOutcome,

    /// Logical view size for camera centering
    pub view_size: Vec2,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            coyote_time: COYOTE_TIME,
            jump_impulse_min: JUMP_IMPULSE_MIN,
            jump_impulse_max: JUMP_IMPULSE_MAX,
            jump_charge_rate: JUMP_CHARGE_RATE,
            player_gravity: GravityParams::default(),
            enemy_gravity: GravityParams::default(),
            projectile_gravity: GravityParams {
                slow_descent_factor: 1.0,
                ..GravityParams::default()
            },
            throw_radius: 120.0,
            throw_cooldown: 1.5,
            throw_speed_factor: 1.0 / 30.0,
            throw_lob_bias: 3.0,
            burrow_launch: 6.0,
            patrol_speed: 0.5,
            bob_amplitude: 0.25,
            bob_moves_hitbox: true,
            solid_kinds: vec![TileKind::Solid],
            ground_check_requires_descent: true,
            contact_outcome: ContactOutcome::ResetLevel,
            view_size: Vec2::new(VIEW_WIDTH, VIEW_HEIGHT),
        }
    }
}

impl Tuning {
    /// Reject out-of-range values before any simulation runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &'static str, value: f32| {
            if value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NotPositive { name, value })
            }
        };
        let non_negative = |name: &'static str, value: f32| {
            if value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Negative { name, value })
            }
        };

        positive("move_speed", self.move_speed)?;
        non_negative("coyote_time", self.coyote_time)?;
        positive("jump_impulse_min", self.jump_impulse_min)?;
        positive("jump_impulse_max", self.jump_impulse_max)?;
        if self.jump_impulse_min > self.jump_impulse_max {
            return Err(ConfigError::InvertedJumpRange {
                min: self.jump_impulse_min,
                max: self.jump_impulse_max,
            });
        }
        positive("jump_charge_rate", self.jump_charge_rate)?;
        positive("player_gravity.fall_accel", self.player_gravity.fall_accel)?;
        positive(
            "player_gravity.max_fall_speed",
            self.player_gravity.max_fall_speed,
        )?;
        positive("enemy_gravity.fall_accel", self.enemy_gravity.fall_accel)?;
        positive(
            "projectile_gravity.fall_accel",
            self.projectile_gravity.fall_accel,
        )?;
        non_negative("throw_radius", self.throw_radius)?;
        positive("throw_cooldown", self.throw_cooldown)?;
        positive("throw_speed_factor", self.throw_speed_factor)?;
        non_negative("throw_lob_bias", self.throw_lob_bias)?;
        non_negative("burrow_launch", self.burrow_launch)?;
        positive("patrol_speed", self.patrol_speed)?;
        non_negative("bob_amplitude", self.bob_amplitude)?;
        positive("view_size.x", self.view_size.x)?;
        positive("view_size.y", self.view_size.y)?;
        if self.solid_kinds.is_empty() {
            return Err(ConfigError::EmptySolidSet);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_nonpositive_speed() {
        let tuning = Tuning {
            move_speed: 0.0,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::NotPositive { name: "move_speed", .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_jump_range() {
        let tuning = Tuning {
            jump_impulse_min: 12.0,
            jump_impulse_max: 4.0,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::InvertedJumpRange { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_solid_set() {
        let tuning = Tuning {
            solid_kinds: Vec::new(),
            ..Tuning::default()
        };
        assert!(matches!(tuning.validate(), Err(ConfigError::EmptySolidSet)));
    }
}
