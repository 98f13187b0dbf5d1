//! Engine-agnostic body collaborator.
//!
//! The controller core never owns a physics body. Everything it reads or
//! writes goes through this trait, which a host implements once per
//! character per step. The Bevy integration implements it in
//! [`crate::backend::BackendBody`]; tests implement it with plain structs.

use bevy::prelude::*;

use crate::collision::{LayerMask, ProbeDirection, ProbeHit};

/// The physics body driven by one [`CharacterController`](crate::controller::CharacterController).
pub trait CharacterBody {
    /// Identity of the body being driven.
    fn entity(&self) -> Entity;

    /// Overlap query from the body's own bounds, swept `distance` units in
    /// `direction`, against colliders in `mask`.
    ///
    /// May include the body's own collider; callers filter it out.
    fn probe(&self, direction: ProbeDirection, distance: f32, mask: LayerMask) -> Vec<ProbeHit>;

    /// Current linear velocity.
    fn velocity(&self) -> Vec2;

    /// Overwrite the linear velocity.
    fn set_velocity(&mut self, velocity: Vec2);

    /// Current mass as reported by the host. Zero or negative if not yet known.
    fn mass(&self) -> f32;

    /// Set the body's mass.
    fn set_mass(&mut self, mass: f32);

    /// Set the multiplier applied to world gravity for this body.
    fn set_gravity_scale(&mut self, scale: f32);

    /// Enable or disable simulation of the body.
    fn set_simulated(&mut self, simulated: bool);

    /// Teleport the body.
    fn set_position(&mut self, position: Vec2);

    /// Velocity of another body, if it still exists.
    fn velocity_of(&self, other: Entity) -> Option<Vec2>;

    /// The carrier another character is currently riding, if known.
    fn carrier_of(&self, _other: Entity) -> Option<Entity> {
        None
    }
}
