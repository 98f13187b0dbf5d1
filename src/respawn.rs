//! Death and respawn.
//!
//! Death is a normal state transition, not an error: the body stops being
//! simulated and is moved to its spawn point until a respawn request
//! re-enables it.

use bevy::prelude::*;

/// Whether the character is currently alive.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifeState {
    #[default]
    Alive,
    /// Simulation disabled; waiting for a respawn.
    Dead,
}

impl LifeState {
    #[inline]
    pub fn is_alive(self) -> bool {
        self == Self::Alive
    }
}

/// Spawn position for a character.
///
/// Read once when the controller is initialized; afterwards the controller
/// keeps its own copy, which this component overrides on every change.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SpawnPoint(pub Vec2);

/// Marker for colliders that kill characters on contact.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Lethal;

/// A character died. Sent on lethal contact or by game code.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterDied {
    pub entity: Entity,
}

/// Bring a dead character back at its spawn point.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnRequested {
    pub entity: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn life_state_defaults_to_alive() {
        assert!(LifeState::default().is_alive());
        assert!(!LifeState::Dead.is_alive());
    }
}
