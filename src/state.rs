//! State marker components.
//!
//! These components mirror the controller's current classification so game
//! code (animation, audio, UI) can query them without reading the
//! controller. They are added and removed by [`crate::systems::sync_state_markers`].

use bevy::prelude::*;

/// Marker component indicating the character is supported by ground or by
/// another character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is touching a wall.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct TouchingWall {
    pub left: bool,
    pub right: bool,
}

impl TouchingWall {
    pub fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    /// Check if the wall is on the left side.
    pub fn is_left(&self) -> bool {
        self.left
    }

    /// Check if the wall is on the right side.
    pub fn is_right(&self) -> bool {
        self.right
    }

    /// Walls on both sides.
    pub fn is_squeezed(&self) -> bool {
        self.left && self.right
    }
}

/// The character is standing on another character.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct Riding {
    pub carrier: Entity,
}

/// The character is dead and waiting for a respawn.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Dead;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_wall_sides() {
        let wall = TouchingWall::new(true, false);
        assert!(wall.is_left());
        assert!(!wall.is_right());
        assert!(!wall.is_squeezed());

        let wall = TouchingWall::new(true, true);
        assert!(wall.is_squeezed());
    }
}
