//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{CharacterContact, CharacterPhysicsBackend, SensorReadings};
use crate::collision::{LayerMask, ProbeDirection, ProbeHit};
use crate::config::ControllerConfig;
use crate::controller::CharacterController;

/// Smallest mass written to a Rapier body.
///
/// Rapier treats a zero-mass dynamic body as immovable, so a rider's
/// "massless" state is approximated with this value.
pub const MIN_BODY_MASS: f32 = 1.0e-4;

/// Inset applied to the probe box perpendicular to the cast direction, so
/// side probes do not report the floor and vertical probes do not report
/// walls the character is merely touching.
pub const PROBE_SKIN: f32 = 0.02;

/// Upper bound on hits gathered per probe direction.
const MAX_PROBE_HITS: usize = 8;

/// Rapier2D physics backend for the character controller.
///
/// This backend uses `bevy_rapier2d` for velocity, mass and gravity
/// manipulation. Probes are answered by [`rapier_probe_sensors`], which
/// receives the Rapier context as a system parameter.
pub struct Rapier2dBackend;

impl CharacterPhysicsBackend for Rapier2dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn try_get_velocity(world: &World, entity: Entity) -> Option<Vec2> {
        world.get::<Velocity>(entity).map(|v| v.linvel)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|mass| mass.is_finite())
            .unwrap_or(0.0)
    }

    fn set_mass(world: &mut World, entity: Entity, mass: f32) {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };
        entity_mut.insert(ColliderMassProperties::Mass(mass.max(MIN_BODY_MASS)));
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            if gravity.0 != scale {
                gravity.0 = scale;
            }
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(GravityScale(scale));
        }
    }

    fn set_simulated(world: &mut World, entity: Entity, simulated: bool) {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };
        if simulated {
            entity_mut.remove::<RigidBodyDisabled>();
        } else {
            entity_mut.insert(RigidBodyDisabled);
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for the character controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::CharacterControllerSet;

        // Preparation: turn Rapier collision events into controller contacts
        app.add_systems(
            FixedUpdate,
            forward_collision_events.in_set(CharacterControllerSet::Preparation),
        );

        // Sensors: box probes on all four sides
        app.add_systems(
            FixedUpdate,
            rapier_probe_sensors.in_set(CharacterControllerSet::Sensors),
        );
    }
}

/// Half extents of the axis-aligned box enclosing a collider.
pub fn collider_half_extents(collider: &Collider) -> Vec2 {
    if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents()
    } else if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half_segment = (segment.a() - segment.b()).abs() / 2.0;
        half_segment + Vec2::splat(capsule.radius())
    } else if let Some(ball) = collider.as_ball() {
        Vec2::splat(ball.radius())
    } else {
        Vec2::ZERO
    }
}

/// Probe box for `direction`: the body's box, inset perpendicular to the cast.
fn probe_half_extents(half_extents: Vec2, direction: ProbeDirection) -> Vec2 {
    match direction {
        ProbeDirection::Left | ProbeDirection::Right => {
            Vec2::new(half_extents.x, (half_extents.y - PROBE_SKIN).max(PROBE_SKIN))
        }
        ProbeDirection::Up | ProbeDirection::Down => {
            Vec2::new((half_extents.x - PROBE_SKIN).max(PROBE_SKIN), half_extents.y)
        }
    }
}

fn probe_filter<'a>(
    entity: Entity,
    mask: LayerMask,
    predicate: &'a impl Fn(Entity) -> bool,
) -> QueryFilter<'a> {
    QueryFilter::default()
        .exclude_rigid_body(entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask.bits()),
        ))
        .predicate(predicate)
}

/// Cast a box and collect every distinct collider it meets.
///
/// Rapier's shape cast stops at the first hit, so the cast is repeated with
/// earlier hits excluded.
#[allow(clippy::too_many_arguments)]
fn rapier_box_cast_all(
    context: &RapierContext,
    origin: Vec2,
    half_extents: Vec2,
    direction: Vec2,
    max_distance: f32,
    exclude_entity: Entity,
    mask: LayerMask,
    layers_of: impl Fn(Entity) -> LayerMask,
) -> Vec<ProbeHit> {
    let shape = Collider::cuboid(half_extents.x, half_extents.y);
    let mut hits: Vec<ProbeHit> = Vec::new();

    while hits.len() < MAX_PROBE_HITS {
        let seen: Vec<Entity> = hits.iter().map(|hit| hit.entity).collect();
        let not_seen = move |e: Entity| !seen.contains(&e);
        let filter = probe_filter(exclude_entity, mask, &not_seen);

        let Some((hit_entity, hit)) = context.cast_shape(
            origin,
            0.0,
            direction,
            &shape,
            ShapeCastOptions {
                max_time_of_impact: max_distance,
                stop_at_penetration: true,
                ..default()
            },
            filter,
        ) else {
            break;
        };

        hits.push(ProbeHit::new(
            hit_entity,
            hit.time_of_impact.max(0.0),
            layers_of(hit_entity),
        ));
    }

    hits
}

/// Fill [`SensorReadings`] for every controller using Rapier shape casts.
pub fn rapier_probe_sensors(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &Collider,
        &mut SensorReadings,
    )>,
    q_groups: Query<&CollisionGroups>,
    q_characters: Query<(), With<CharacterController>>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    // Colliders without explicit groups count as characters if they carry a
    // controller and as environment otherwise.
    let layers_of = |entity: Entity| match q_groups.get(entity) {
        Ok(groups) => LayerMask(groups.memberships.bits()),
        Err(_) if q_characters.contains(entity) => LayerMask::CHARACTER,
        Err(_) => LayerMask::ENVIRONMENT,
    };

    for (entity, transform, config, collider, mut readings) in &mut q_controllers {
        let origin = transform.translation().xy();
        let half_extents = collider_half_extents(collider);
        let mask = config.environment_mask | config.character_mask;

        readings.clear();
        for direction in ProbeDirection::ALL {
            *readings.hits_mut(direction) = rapier_box_cast_all(
                &context,
                origin,
                probe_half_extents(half_extents, direction),
                direction.vector(),
                config.probe_distance,
                entity,
                mask,
                layers_of,
            );
        }
    }
}

/// Forward Rapier collision events that involve a controller.
pub fn forward_collision_events(
    mut collisions: EventReader<CollisionEvent>,
    q_characters: Query<(), With<CharacterController>>,
    mut contacts: EventWriter<CharacterContact>,
) {
    for event in collisions.read() {
        let (a, b, began) = match *event {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };
        for (entity, other) in [(a, b), (b, a)] {
            if q_characters.contains(entity) {
                contacts.write(CharacterContact {
                    entity,
                    other,
                    began,
                });
            }
        }
    }
}

/// Bundle containing all Rapier2D physics components needed for a character controller.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
/// use platformer_controller::rapier::Rapier2dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         ControllerConfig::player(),
///         MovementIntent::default(),
///         SpawnPoint(Vec2::new(0.0, 2.0)),
///         Rapier2dCharacterBundle::new(),
///         Collider::cuboid(0.5, 0.5),
///         CollisionGroups::new(Group::GROUP_2, Group::ALL),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `active_events`: collision events, so contact-driven classification and
///   lethal contacts work
/// - `mass_properties`: computed by Rapier from the collider
#[derive(Bundle, Default)]
pub struct Rapier2dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. The controller overwrites the linear part.
    pub velocity: Velocity,
    /// Gravity multiplier, selected by the controller every step.
    pub gravity_scale: GravityScale,
    pub locked_axes: LockedAxes,
    /// Computed mass properties. Read once to learn the resting mass.
    pub mass_properties: ReadMassProperties,
    pub active_events: ActiveEvents,
    pub sensor_readings: SensorReadings,
}

impl Rapier2dCharacterBundle {
    /// Create a dynamic, rotation-locked character bundle.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            mass_properties: ReadMassProperties::default(),
            active_events: ActiveEvents::COLLISION_EVENTS,
            sensor_readings: SensorReadings::default(),
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
