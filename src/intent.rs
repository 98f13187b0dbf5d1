//! Movement intent and per-step input snapshots.
//!
//! Intents hold the desired movement from player input, AI or a replay.
//! Once per fixed step the controller samples the intent into an
//! [`InputSnapshot`], which is all the core ever sees of input.

use bevy::prelude::*;

/// Input for one fixed step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Horizontal axis in [-1, 1].
    pub axis: f32,
    /// Jump went from released to held since the previous sample.
    pub jump_pressed: bool,
    /// Jump is currently held.
    pub jump_held: bool,
}

impl InputSnapshot {
    /// Create a snapshot. The axis is clamped to [-1, 1]; a press implies held.
    pub fn new(axis: f32, jump_pressed: bool, jump_held: bool) -> Self {
        Self {
            axis: if axis.is_finite() { axis.clamp(-1.0, 1.0) } else { 0.0 },
            jump_pressed,
            jump_held: jump_held || jump_pressed,
        }
    }

    /// No input at all.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Horizontal input only.
    pub fn walk(axis: f32) -> Self {
        Self::new(axis, false, false)
    }
}

/// Movement intent component.
///
/// # Example
///
/// ```rust
/// use platformer_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_walk(1.0);
/// intent.set_jump_pressed(true);
///
/// let first = intent.sample();
/// assert!(first.jump_pressed);
///
/// // Still held on the next step, but no new edge.
/// let second = intent.sample();
/// assert!(!second.jump_pressed);
/// assert!(second.jump_held);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Horizontal movement intent (-1.0 = left, 1.0 = right).
    pub walk: f32,
    /// Whether the jump action is currently held.
    ///
    /// Set this every frame from any boolean source; the controller detects
    /// the rising edge itself and uses the held state for the jump latch.
    pub jump_pressed: bool,
    /// Held state at the previous sample, for edge detection.
    pub(crate) jump_pressed_prev: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the walking direction (-1.0 = left, 1.0 = right).
    pub fn set_walk(&mut self, direction: f32) {
        self.walk = direction.clamp(-1.0, 1.0);
    }

    /// Set whether jump is held.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Check if jump is currently held.
    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    /// Check if there is active walking input.
    pub fn is_walking(&self) -> bool {
        self.walk.abs() > 0.001
    }

    /// Clear walking and jump input.
    ///
    /// The previous jump state is kept so a held button released and pressed
    /// again still produces a fresh edge.
    pub fn clear(&mut self) {
        self.walk = 0.0;
        self.jump_pressed = false;
    }

    /// Take this step's snapshot and advance edge detection.
    pub fn sample(&mut self) -> InputSnapshot {
        let edge = self.jump_pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        InputSnapshot::new(self.walk, edge, self.jump_pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_clamps_axis() {
        assert_eq!(InputSnapshot::walk(4.0).axis, 1.0);
        assert_eq!(InputSnapshot::walk(-4.0).axis, -1.0);
        assert_eq!(InputSnapshot::walk(f32::NAN).axis, 0.0);
    }

    #[test]
    fn snapshot_press_implies_held() {
        let snapshot = InputSnapshot::new(0.0, true, false);
        assert!(snapshot.jump_held);
    }

    #[test]
    fn movement_intent_set_walk() {
        let mut intent = MovementIntent::new();
        intent.set_walk(0.5);
        assert_eq!(intent.walk, 0.5);

        // Clamps to valid range
        intent.set_walk(5.0);
        assert_eq!(intent.walk, 1.0);

        intent.set_walk(-5.0);
        assert_eq!(intent.walk, -1.0);
    }

    #[test]
    fn sample_detects_rising_edge_once() {
        let mut intent = MovementIntent::new();
        assert!(!intent.sample().jump_pressed);

        intent.set_jump_pressed(true);
        let first = intent.sample();
        assert!(first.jump_pressed);
        assert!(first.jump_held);

        let second = intent.sample();
        assert!(!second.jump_pressed);
        assert!(second.jump_held);

        intent.set_jump_pressed(false);
        let released = intent.sample();
        assert!(!released.jump_pressed);
        assert!(!released.jump_held);

        intent.set_jump_pressed(true);
        assert!(intent.sample().jump_pressed);
    }

    #[test]
    fn clear_resets_input() {
        let mut intent = MovementIntent::new();
        intent.set_walk(1.0);
        intent.set_jump_pressed(true);
        intent.clear();
        assert!(!intent.is_walking());
        assert!(!intent.is_jump_pressed());
    }

    #[test]
    fn movement_intent_jump_pressed_default() {
        let intent = MovementIntent::new();
        assert!(!intent.jump_pressed);
        assert!(!intent.jump_pressed_prev);
    }
}
