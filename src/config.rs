//! Controller configuration.
//!
//! All tunables live in one component that is handed to the controller
//! every step. Nothing here is global: two characters may use different
//! layer masks or speeds in the same world.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::LayerMask;
use crate::error::ControllerError;

/// How horizontal input is treated when a wall is detected in the direction
/// of travel.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WallPolicy {
    /// Drop the input contribution so the character does not press into
    /// the wall (prevents sticking to walls while airborne).
    #[default]
    Suppress,
    /// Keep the input velocity and let the physics engine resolve the
    /// contact.
    PhysicsResolves,
}

/// When contact flags are re-derived from probes.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassifyMode {
    /// Re-derive every fixed step.
    #[default]
    EveryStep,
    /// Re-derive only after a contact begin/end notification.
    /// Flags may be one step stale.
    OnContactChange,
}

/// Configuration parameters for the character controller.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct ControllerConfig {
    // === Classification ===
    /// Layers treated as solid level geometry (ground and walls).
    pub environment_mask: LayerMask,
    /// Layers treated as other characters (carry detection).
    pub character_mask: LayerMask,
    /// Sweep distance of every probe. Zero means "touching only".
    pub probe_distance: f32,
    /// When flags are re-derived.
    pub classify_mode: ClassifyMode,

    // === Movement ===
    /// Horizontal speed at full input (units/second).
    pub move_speed: f32,
    /// Wall handling for horizontal input.
    pub wall_policy: WallPolicy,

    // === Jump ===
    /// Vertical velocity set when a jump starts (units/second).
    pub jump_force: f32,
    /// Gravity multiplier while rising with the jump button released.
    pub low_jump_multiplier: f32,
    /// Gravity multiplier while falling.
    pub fall_multiplier: f32,
    /// Gravity scale used outside the two cases above.
    pub gravity_scale: f32,

    // === Mass ===
    /// Resting mass. `None` captures the body's own mass on the first step
    /// where the host reports one.
    pub mass: Option<f32>,

    // === Recording ===
    /// Append accepted move/jump commands to the controller's action log.
    pub record_actions: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            environment_mask: LayerMask::ENVIRONMENT,
            character_mask: LayerMask::CHARACTER,
            probe_distance: 0.1,
            classify_mode: ClassifyMode::EveryStep,

            move_speed: 5.0,
            wall_policy: WallPolicy::Suppress,

            jump_force: 10.0,
            low_jump_multiplier: 2.0,
            fall_multiplier: 2.5,
            gravity_scale: 1.0,

            mass: None,

            record_actions: false,
        }
    }
}

impl ControllerConfig {
    /// Config for a player-controlled character that records its actions.
    pub fn player() -> Self {
        Self {
            record_actions: true,
            ..default()
        }
    }

    /// Config for a replayed "ghost" character. Ghosts are driven by a log,
    /// so they do not record.
    pub fn ghost() -> Self {
        Self {
            record_actions: false,
            ..default()
        }
    }

    /// Builder: set layer masks.
    pub fn with_masks(mut self, environment: LayerMask, character: LayerMask) -> Self {
        self.environment_mask = environment;
        self.character_mask = character;
        self
    }

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set jump force.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set the low-jump and fall gravity multipliers.
    pub fn with_gravity_multipliers(mut self, low_jump: f32, fall: f32) -> Self {
        self.low_jump_multiplier = low_jump;
        self.fall_multiplier = fall;
        self
    }

    /// Builder: set base gravity scale.
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Builder: set probe distance.
    pub fn with_probe_distance(mut self, distance: f32) -> Self {
        self.probe_distance = distance;
        self
    }

    /// Builder: set wall policy.
    pub fn with_wall_policy(mut self, policy: WallPolicy) -> Self {
        self.wall_policy = policy;
        self
    }

    /// Builder: set classification mode.
    pub fn with_classify_mode(mut self, mode: ClassifyMode) -> Self {
        self.classify_mode = mode;
        self
    }

    /// Builder: set resting mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Builder: enable or disable action recording.
    pub fn with_recording(mut self, enabled: bool) -> Self {
        self.record_actions = enabled;
        self
    }

    /// Check that every field holds a usable value.
    pub fn validate(&self) -> Result<(), ControllerError> {
        fn non_negative(field: &'static str, value: f32) -> Result<(), ControllerError> {
            if !value.is_finite() || value < 0.0 {
                return Err(ControllerError::InvalidConfig {
                    field,
                    reason: format!("must be finite and non-negative, got {value}"),
                });
            }
            Ok(())
        }

        fn positive(field: &'static str, value: f32) -> Result<(), ControllerError> {
            if !value.is_finite() || value <= 0.0 {
                return Err(ControllerError::InvalidConfig {
                    field,
                    reason: format!("must be finite and positive, got {value}"),
                });
            }
            Ok(())
        }

        if self.environment_mask.is_empty() {
            return Err(ControllerError::InvalidConfig {
                field: "environment_mask",
                reason: "must contain at least one layer".into(),
            });
        }
        if self.character_mask.is_empty() {
            return Err(ControllerError::InvalidConfig {
                field: "character_mask",
                reason: "must contain at least one layer".into(),
            });
        }
        non_negative("probe_distance", self.probe_distance)?;
        non_negative("move_speed", self.move_speed)?;
        non_negative("jump_force", self.jump_force)?;
        positive("low_jump_multiplier", self.low_jump_multiplier)?;
        positive("fall_multiplier", self.fall_multiplier)?;
        non_negative("gravity_scale", self.gravity_scale)?;
        if let Some(mass) = self.mass {
            positive("mass", mass)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_distance, 0.1);
        assert_eq!(config.wall_policy, WallPolicy::Suppress);
        assert_eq!(config.classify_mode, ClassifyMode::EveryStep);
    }

    #[test]
    fn presets_differ_only_in_recording() {
        let player = ControllerConfig::player();
        let ghost = ControllerConfig::ghost();
        assert!(player.record_actions);
        assert!(!ghost.record_actions);
        assert_eq!(player.move_speed, ghost.move_speed);
    }

    #[test]
    fn builders_set_fields() {
        let config = ControllerConfig::default()
            .with_move_speed(7.5)
            .with_jump_force(12.0)
            .with_gravity_multipliers(3.0, 4.0)
            .with_wall_policy(WallPolicy::PhysicsResolves)
            .with_mass(2.0);

        assert_eq!(config.move_speed, 7.5);
        assert_eq!(config.jump_force, 12.0);
        assert_eq!(config.low_jump_multiplier, 3.0);
        assert_eq!(config.fall_multiplier, 4.0);
        assert_eq!(config.wall_policy, WallPolicy::PhysicsResolves);
        assert_eq!(config.mass, Some(2.0));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = ControllerConfig::default().with_move_speed(f32::NAN);
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfig { field: "move_speed", .. })
        ));

        let config = ControllerConfig::default().with_gravity_multipliers(0.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfig { field: "low_jump_multiplier", .. })
        ));

        let config = ControllerConfig::default().with_masks(LayerMask::NONE, LayerMask::CHARACTER);
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfig { field: "environment_mask", .. })
        ));

        let config = ControllerConfig::default().with_mass(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_loads_from_json_with_defaults() {
        let json = r#"{ "move_speed": 8.0, "wall_policy": "PhysicsResolves", "environment_mask": 5 }"#;
        let config: ControllerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.move_speed, 8.0);
        assert_eq!(config.wall_policy, WallPolicy::PhysicsResolves);
        assert_eq!(config.environment_mask, LayerMask(5));
        assert_eq!(config.jump_force, ControllerConfig::default().jump_force);
    }
}
