//! Jump state machine.
//!
//! Three states with a held-button latch. A jump can only start from
//! [`JumpState::Grounded`]; presses in the air are dropped, not buffered.
//! Releasing the button while rising raises gravity (low jump), and any
//! descent raises it further (fall multiplier).

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::intent::InputSnapshot;

/// Vertical movement phase.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpState {
    /// Standing on something; a jump may start.
    #[default]
    Grounded,
    /// Moving up after a jump with the latch held.
    Rising,
    /// Descending, or rising after the latch was released.
    Falling,
}

/// Jump state plus the held-button latch.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpMachine {
    state: JumpState,
    latched: bool,
}

impl JumpMachine {
    #[inline]
    pub fn state(&self) -> JumpState {
        self.state
    }

    /// Whether the jump input is still held since the last jump started.
    #[inline]
    pub fn latched(&self) -> bool {
        self.latched
    }

    /// Back to grounded with no latch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one fixed step.
    ///
    /// `supported` is whether ground or a carrier is underneath; `vy` is the
    /// vertical velocity at the start of the step. Returns `true` when a
    /// jump starts this step; the caller is then responsible for writing the
    /// jump velocity.
    pub fn step(&mut self, supported: bool, vy: f32, input: &InputSnapshot) -> bool {
        // The latch only follows the button downwards: once released it stays
        // released until the next jump starts.
        self.latched &= input.jump_held;

        self.state = match self.state {
            JumpState::Grounded if supported => JumpState::Grounded,
            JumpState::Grounded => JumpState::Falling,
            // Right after take-off the probe still sees the ground.
            JumpState::Rising if supported && vy <= 0.0 => JumpState::Grounded,
            JumpState::Rising if vy <= 0.0 || !self.latched => JumpState::Falling,
            JumpState::Rising => JumpState::Rising,
            JumpState::Falling if supported => JumpState::Grounded,
            JumpState::Falling => JumpState::Falling,
        };

        if self.state == JumpState::Grounded && input.jump_pressed {
            self.state = JumpState::Rising;
            self.latched = true;
            return true;
        }
        false
    }
}

/// Gravity scale for the given vertical velocity and latch state.
///
/// `vy < 0` uses the fall multiplier, `vy > 0` with the latch released uses
/// the low-jump multiplier, anything else the base scale.
pub fn gravity_scale_for(config: &ControllerConfig, vy: f32, latched: bool) -> f32 {
    if vy < 0.0 {
        config.gravity_scale * config.fall_multiplier
    } else if vy > 0.0 && !latched {
        config.gravity_scale * config.low_jump_multiplier
    } else {
        config.gravity_scale
    }
}
