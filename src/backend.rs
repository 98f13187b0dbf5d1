//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. This allows easy swapping
//! between physics engines (Rapier2D, Avian, custom, etc.).
//!
//! Backends do not answer probes directly from `&World`: shape queries
//! usually need a system parameter (e.g. Rapier's context). Instead the
//! backend plugin runs its queries in [`CharacterControllerSet::Sensors`](crate::CharacterControllerSet)
//! and stores the hits in [`SensorReadings`], which [`BackendBody`] then
//! serves to the controller.

use bevy::prelude::*;

use crate::body::CharacterBody;
use crate::collision::{LayerMask, ProbeDirection, ProbeHit};
use crate::controller::CharacterController;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the character
/// controller. For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    ///
    /// The plugin must fill [`SensorReadings`] for every controller during
    /// the `Sensors` set and forward contact begin/end as
    /// [`CharacterContact`] events.
    fn plugin() -> impl Plugin;

    /// Get the velocity of an entity, if it has one.
    fn try_get_velocity(world: &World, entity: Entity) -> Option<Vec2>;

    /// Get the current velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        Self::try_get_velocity(world, entity).unwrap_or(Vec2::ZERO)
    }

    /// Set the velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Get the mass of an entity. Zero if not yet computed.
    fn get_mass(world: &World, entity: Entity) -> f32;

    /// Set the mass of an entity.
    fn set_mass(world: &mut World, entity: Entity, mass: f32);

    /// Set the gravity multiplier of an entity.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Enable or disable simulation of an entity.
    fn set_simulated(world: &mut World, entity: Entity, simulated: bool);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Teleport an entity.
    fn set_position(world: &mut World, entity: Entity, position: Vec2);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// A contact between a character and another collider began or ended.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterContact {
    /// The character.
    pub entity: Entity,
    /// The other collider's entity.
    pub other: Entity,
    /// `true` on begin, `false` on end.
    pub began: bool,
}

/// Probe hits gathered by the backend for one character this step.
///
/// Each direction holds every hit within the cast distance, across all
/// layers the character's config cares about.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct SensorReadings {
    pub left: Vec<ProbeHit>,
    pub right: Vec<ProbeHit>,
    pub up: Vec<ProbeHit>,
    pub down: Vec<ProbeHit>,
}

impl SensorReadings {
    pub fn hits(&self, direction: ProbeDirection) -> &[ProbeHit] {
        match direction {
            ProbeDirection::Left => &self.left,
            ProbeDirection::Right => &self.right,
            ProbeDirection::Up => &self.up,
            ProbeDirection::Down => &self.down,
        }
    }

    pub fn hits_mut(&mut self, direction: ProbeDirection) -> &mut Vec<ProbeHit> {
        match direction {
            ProbeDirection::Left => &mut self.left,
            ProbeDirection::Right => &mut self.right,
            ProbeDirection::Up => &mut self.up,
            ProbeDirection::Down => &mut self.down,
        }
    }

    /// Hits in `direction` within `distance` on layers in `mask`.
    pub fn query(&self, direction: ProbeDirection, distance: f32, mask: LayerMask) -> Vec<ProbeHit> {
        self.hits(direction)
            .iter()
            .filter(|hit| hit.distance <= distance && hit.matches(mask))
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        for direction in ProbeDirection::ALL {
            self.hits_mut(direction).clear();
        }
    }
}

/// [`CharacterBody`] over a Bevy world through a backend.
pub struct BackendBody<'w, B: CharacterPhysicsBackend> {
    world: &'w mut World,
    entity: Entity,
    readings: SensorReadings,
    _marker: std::marker::PhantomData<B>,
}

impl<'w, B: CharacterPhysicsBackend> BackendBody<'w, B> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        let readings = world.get::<SensorReadings>(entity).cloned().unwrap_or_default();
        Self {
            world,
            entity,
            readings,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: CharacterPhysicsBackend> CharacterBody for BackendBody<'_, B> {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn probe(&self, direction: ProbeDirection, distance: f32, mask: LayerMask) -> Vec<ProbeHit> {
        self.readings.query(direction, distance, mask)
    }

    fn velocity(&self) -> Vec2 {
        B::get_velocity(&*self.world, self.entity)
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        B::set_velocity(self.world, self.entity, velocity);
    }

    fn mass(&self) -> f32 {
        B::get_mass(&*self.world, self.entity)
    }

    fn set_mass(&mut self, mass: f32) {
        B::set_mass(self.world, self.entity, mass);
    }

    fn set_gravity_scale(&mut self, scale: f32) {
        B::set_gravity_scale(self.world, self.entity, scale);
    }

    fn set_simulated(&mut self, simulated: bool) {
        B::set_simulated(self.world, self.entity, simulated);
    }

    fn set_position(&mut self, position: Vec2) {
        B::set_position(self.world, self.entity, position);
    }

    fn velocity_of(&self, other: Entity) -> Option<Vec2> {
        B::try_get_velocity(&*self.world, other)
    }

    fn carrier_of(&self, other: Entity) -> Option<Entity> {
        self.world
            .get::<CharacterController>(other)
            .and_then(|controller| controller.carried_by())
    }
}
