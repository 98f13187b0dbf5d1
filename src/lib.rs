//! # `platformer_controller`
//!
//! A 2D side-view platformer character controller with physics backend
//! abstraction.
//!
//! This crate provides a physics-driven character controller that:
//! - Probes the four sides of the body to classify contacts
//! - Overwrites horizontal velocity from a one-dimensional walk axis
//! - Jumps once per press, with variable height from gravity multipliers
//! - Lets characters stand on and ride each other
//! - Kills characters on lethal contact and respawns them at a spawn point
//! - Optionally records accepted commands with timestamps for replay
//! - Abstracts physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! The core ([`CharacterController`](controller::CharacterController)) is
//! engine-agnostic: it is driven by explicit `init`/`step` calls against a
//! [`CharacterBody`](body::CharacterBody). [`CharacterControllerPlugin`]
//! drives it from Bevy's `FixedUpdate`:
//! 1. Contact events are forwarded to controllers
//! 2. The backend fills [`SensorReadings`](backend::SensorReadings)
//! 3. Each controller steps once, in entity order
//! 4. Deaths and respawn requests are applied
//! 5. State marker components are synced
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_controller::prelude::*;
//!
//! // Create controller components for a player character
//! let controller = CharacterController::at_spawn(Vec2::new(0.0, 2.0));
//! let config = ControllerConfig::player();
//! let intent = MovementIntent::default();
//!
//! // These can be spawned as a bundle with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod body;
pub mod carry;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod error;
pub mod input;
pub mod intent;
pub mod jump;
pub mod movement;
pub mod recording;
pub mod respawn;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{CharacterContact, CharacterPhysicsBackend, SensorReadings};
    pub use crate::body::CharacterBody;
    pub use crate::collision::{LayerMask, ProbeDirection, ProbeHit};
    pub use crate::config::{ClassifyMode, ControllerConfig, WallPolicy};
    pub use crate::controller::{CharacterController, StepReport};
    pub use crate::detection::ContactFlags;
    pub use crate::error::ControllerError;
    pub use crate::input::{ActionEvent, InputBus, InputSubscription};
    pub use crate::intent::{InputSnapshot, MovementIntent};
    pub use crate::jump::JumpState;
    pub use crate::recording::{ActionKind, ActionLog, ActionReplay, RecordedAction};
    pub use crate::respawn::{CharacterDied, Lethal, RespawnRequested, SpawnPoint};
    pub use crate::state::{Airborne, Dead, Grounded, Riding, TouchingWall};
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets for the controller, run in this order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Config validation and backend contact forwarding.
    Preparation,
    /// Contact bookkeeping and lethal contact detection.
    Contacts,
    /// Backend probes fill [`SensorReadings`](backend::SensorReadings).
    Sensors,
    /// One controller step per character.
    Step,
    /// Deaths, then respawns.
    Lifecycle,
    /// State marker components.
    Markers,
}

/// Main plugin for the character controller system.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (probes, velocity, mass, gravity scale).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(CharacterControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<respawn::SpawnPoint>();
        app.register_type::<respawn::Lethal>();
        app.register_type::<backend::SensorReadings>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::Riding>();
        app.register_type::<state::Dead>();

        app.add_event::<backend::CharacterContact>();
        app.add_event::<respawn::CharacterDied>();
        app.add_event::<respawn::RespawnRequested>();

        app.configure_sets(
            FixedUpdate,
            (
                CharacterControllerSet::Preparation,
                CharacterControllerSet::Contacts,
                CharacterControllerSet::Sensors,
                CharacterControllerSet::Step,
                CharacterControllerSet::Lifecycle,
                CharacterControllerSet::Markers,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::validate_configs.in_set(CharacterControllerSet::Preparation),
                (systems::apply_contact_events, systems::detect_lethal_contacts)
                    .in_set(CharacterControllerSet::Contacts),
                systems::step_characters::<B>.in_set(CharacterControllerSet::Step),
                (systems::handle_deaths::<B>, systems::handle_respawns::<B>)
                    .chain()
                    .in_set(CharacterControllerSet::Lifecycle),
                systems::sync_state_markers.in_set(CharacterControllerSet::Markers),
            ),
        );
    }
}
