//! Core controller systems.
//!
//! These systems drive [`CharacterController`] from Bevy's fixed update.
//! They are generic over the physics backend to allow different physics
//! engines to be used.

use bevy::prelude::*;

use crate::backend::{BackendBody, CharacterContact, CharacterPhysicsBackend};
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::intent::MovementIntent;
use crate::respawn::{CharacterDied, Lethal, RespawnRequested, SpawnPoint};
use crate::state::{Airborne, Dead, Grounded, Riding, TouchingWall};

/// Warn about unusable configuration as soon as it is added or changed.
pub fn validate_configs(q_configs: Query<(Entity, &ControllerConfig), Changed<ControllerConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            warn!("character {entity}: {err}");
        }
    }
}

/// Forward contact begin/end to the controllers involved.
pub fn apply_contact_events(
    mut contacts: EventReader<CharacterContact>,
    mut q_controllers: Query<&mut CharacterController>,
) {
    for contact in contacts.read() {
        if let Ok(mut controller) = q_controllers.get_mut(contact.entity) {
            controller.notify_contact(contact.other);
        }
    }
}

/// Turn contact with a [`Lethal`] collider into a [`CharacterDied`] event.
pub fn detect_lethal_contacts(
    mut contacts: EventReader<CharacterContact>,
    q_lethal: Query<(), With<Lethal>>,
    q_controllers: Query<&CharacterController>,
    mut died: EventWriter<CharacterDied>,
) {
    for contact in contacts.read() {
        if !contact.began || !q_lethal.contains(contact.other) {
            continue;
        }
        if q_controllers
            .get(contact.entity)
            .is_ok_and(|controller| controller.is_alive())
        {
            died.write(CharacterDied {
                entity: contact.entity,
            });
        }
    }
}

/// Run one controller step for every character.
///
/// Characters are stepped one at a time in entity order so the result does
/// not depend on query iteration order. The controller is taken out of the
/// world while it steps and written back afterwards.
pub fn step_characters<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let mut entities: Vec<Entity> = world
        .query_filtered::<Entity, With<CharacterController>>()
        .iter(world)
        .collect();
    entities.sort();

    for entity in entities {
        let Some(mut controller) = world
            .get_mut::<CharacterController>(entity)
            .map(|mut controller| std::mem::take(&mut *controller))
        else {
            continue;
        };
        let config = world
            .get::<ControllerConfig>(entity)
            .copied()
            .unwrap_or_default();
        let spawn = world.get::<SpawnPoint>(entity).map(|spawn| spawn.0);
        let input = world
            .get_mut::<MovementIntent>(entity)
            .map(|mut intent| intent.sample())
            .unwrap_or_default();

        {
            let mut body = BackendBody::<B>::new(world, entity);
            if !controller.is_initialized() {
                controller.init(spawn, &mut body);
                debug!("character {entity} initialized at {:?}", controller.spawn);
            } else if spawn.is_some() && spawn != controller.spawn {
                controller.spawn = spawn;
            }
            controller.step(&config, dt, input, &mut body);
        }

        if let Some(mut slot) = world.get_mut::<CharacterController>(entity) {
            *slot = controller;
        }
    }
}

/// Kill characters named in [`CharacterDied`] events.
pub fn handle_deaths<B: CharacterPhysicsBackend>(
    mut commands: Commands,
    mut deaths: EventReader<CharacterDied>,
) {
    for died in deaths.read() {
        let entity = died.entity;
        commands.queue(move |world: &mut World| {
            with_controller::<B>(world, entity, |controller, body| {
                if controller.is_alive() {
                    controller.die(body);
                    info!("character {entity} died");
                }
            });
        });
    }
}

/// Respawn characters named in [`RespawnRequested`] events.
pub fn handle_respawns<B: CharacterPhysicsBackend>(
    mut commands: Commands,
    mut requests: EventReader<RespawnRequested>,
) {
    for request in requests.read() {
        let entity = request.entity;
        commands.queue(move |world: &mut World| {
            with_controller::<B>(world, entity, |controller, body| {
                match controller.respawn(body) {
                    Ok(()) => info!("character {entity} respawned at {:?}", controller.spawn),
                    Err(err) => warn!("character {entity} cannot respawn: {err}"),
                }
            });
        });
    }
}

fn with_controller<B: CharacterPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut CharacterController, &mut BackendBody<'_, B>),
) {
    let Some(mut controller) = world
        .get_mut::<CharacterController>(entity)
        .map(|mut controller| std::mem::take(&mut *controller))
    else {
        warn!("character {entity} has no controller");
        return;
    };
    if let Some(spawn) = world.get::<SpawnPoint>(entity) {
        controller.spawn = Some(spawn.0);
    }

    {
        let mut body = BackendBody::<B>::new(world, entity);
        f(&mut controller, &mut body);
    }

    if let Some(mut slot) = world.get_mut::<CharacterController>(entity) {
        *slot = controller;
    }
}

/// Sync state marker components with the controller's classification.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Option<&TouchingWall>,
        Option<&Riding>,
        Has<Grounded>,
        Has<Airborne>,
        Has<Dead>,
    )>,
) {
    for (entity, controller, wall, riding, has_grounded, has_airborne, has_dead) in &q_controllers {
        let mut entity_commands = commands.entity(entity);

        // Sync Dead
        if !controller.is_alive() {
            if !has_dead {
                entity_commands.insert(Dead);
            }
            entity_commands.remove::<(Grounded, Airborne, TouchingWall, Riding)>();
            continue;
        } else if has_dead {
            entity_commands.remove::<Dead>();
        }

        // Sync Grounded/Airborne
        let supported = controller.flags.supported();
        if supported && !has_grounded {
            entity_commands.insert(Grounded).remove::<Airborne>();
        } else if !supported && !has_airborne {
            entity_commands.insert(Airborne).remove::<Grounded>();
        }

        // Sync TouchingWall
        let flags = controller.flags;
        let touching = TouchingWall::new(flags.blocked_left, flags.blocked_right);
        if flags.blocked_left || flags.blocked_right {
            if wall != Some(&touching) {
                entity_commands.insert(touching);
            }
        } else if wall.is_some() {
            entity_commands.remove::<TouchingWall>();
        }

        // Sync Riding
        match (controller.carried_by(), riding) {
            (Some(carrier), Some(current)) if current.carrier == carrier => {}
            (Some(carrier), _) => {
                entity_commands.insert(Riding { carrier });
            }
            (None, Some(_)) => {
                entity_commands.remove::<Riding>();
            }
            (None, None) => {}
        }
    }
}
