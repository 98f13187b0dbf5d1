//! The character controller core.
//!
//! [`CharacterController`] is the central hub for one character's movement
//! state. It is driven explicitly: [`CharacterController::init`] once at
//! spawn, then [`CharacterController::step`] once per fixed tick with that
//! tick's input and a [`CharacterBody`] giving access to the physics body.
//! The Bevy systems in [`crate::systems`] are one such driver.
//!
//! Order inside a step:
//! 1. classify contacts (every step, or after a contact change)
//! 2. update the carry link and effective mass
//! 3. overwrite horizontal velocity
//! 4. advance the jump state machine and write the jump velocity
//! 5. select gravity scale

use bevy::prelude::*;

use crate::body::CharacterBody;
use crate::carry::{CarryChange, CarryLink};
use crate::config::{ClassifyMode, ControllerConfig};
use crate::detection::{classify, ContactFlags};
use crate::error::ControllerError;
use crate::intent::InputSnapshot;
use crate::jump::{gravity_scale_for, JumpMachine, JumpState};
use crate::movement::resolve_horizontal;
use crate::recording::{ActionKind, ActionLog};
use crate::respawn::LifeState;

/// What a single step did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// The character was alive and the step ran.
    pub active: bool,
    /// Flags were re-derived this step.
    pub classified: bool,
    pub jumped: bool,
    pub carry: Option<CarryChange>,
    /// Velocity written to the body (before the host integrates it).
    pub velocity: Vec2,
    pub gravity_scale: f32,
}

/// Core character controller component.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct CharacterController {
    /// Contact flags from the most recent classification.
    pub flags: ContactFlags,
    pub jump: JumpMachine,
    pub carry: CarryLink,
    pub life: LifeState,

    /// Where the character is placed on init, death and respawn.
    pub spawn: Option<Vec2>,
    /// Session time: sum of step deltas since init, dead steps included.
    /// Actions are stamped with the time at the start of their step.
    pub elapsed: f32,

    /// Accepted move/jump commands, when recording is enabled.
    #[reflect(ignore)]
    pub log: ActionLog,

    resting_mass: Option<f32>,
    applied_mass: Option<f32>,
    last_input_vx: f32,
    contact_dirty: bool,
    contact_trigger: Option<Entity>,
    initialized: bool,
}

impl CharacterController {
    /// Create a controller with no spawn point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller that spawns at `position`.
    pub fn at_spawn(position: Vec2) -> Self {
        Self {
            spawn: Some(position),
            ..default()
        }
    }

    /// Place the body at the spawn point and start a fresh session.
    pub fn init<B: CharacterBody>(&mut self, spawn: Option<Vec2>, body: &mut B) {
        if spawn.is_some() {
            self.spawn = spawn;
        }
        self.reset_state();
        self.elapsed = 0.0;
        self.log.take_session();
        self.life = LifeState::Alive;
        self.initialized = true;

        if let Some(position) = self.spawn {
            body.set_position(position);
        }
        body.set_simulated(true);
    }

    /// Whether [`Self::init`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the character is grounded (environment below).
    pub fn is_grounded(&self) -> bool {
        self.flags.grounded
    }

    /// The character this one is riding, if any.
    pub fn carried_by(&self) -> Option<Entity> {
        self.carry.carrier()
    }

    pub fn jump_state(&self) -> JumpState {
        self.jump.state()
    }

    pub fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    /// Resting mass, once known.
    pub fn resting_mass(&self) -> Option<f32> {
        self.resting_mass
    }

    /// Mass last written to the body.
    pub fn effective_mass(&self) -> Option<f32> {
        self.applied_mass
    }

    /// Report a contact begin/end with `other`.
    ///
    /// Forces re-classification on the next step. In
    /// [`ClassifyMode::OnContactChange`] this is the only thing that does.
    pub fn notify_contact(&mut self, other: Entity) {
        self.contact_dirty = true;
        self.contact_trigger = Some(other);
    }

    /// Advance one fixed step.
    pub fn step<B: CharacterBody>(
        &mut self,
        config: &ControllerConfig,
        dt: f32,
        input: InputSnapshot,
        body: &mut B,
    ) -> StepReport {
        if !self.life.is_alive() {
            self.elapsed += dt;
            return StepReport::default();
        }

        let mut report = StepReport {
            active: true,
            ..default()
        };
        let resting_mass = self.capture_resting_mass(config, body);

        // 1-2. Classification and carry link.
        let needs_classify = match config.classify_mode {
            ClassifyMode::EveryStep => true,
            ClassifyMode::OnContactChange => self.contact_dirty,
        };
        if needs_classify {
            let this = body.entity();
            let mut result = classify(body, config, self.contact_trigger.take());
            self.contact_dirty = false;

            // Only the lower character's down probe links the pair; refuse a
            // candidate that already rides this character.
            if let Some(candidate) = result.carrier {
                if body.carrier_of(candidate) == Some(this) {
                    result.carrier = None;
                    result.flags.riding = false;
                }
            }

            self.flags = result.flags;
            report.classified = true;
            report.carry = Some(self.carry.update(result.carrier));
        }

        // Carrier velocity is read once per step. A carrier that no longer
        // resolves is treated as no carrier.
        let platform_velocity = match self.carry.carrier() {
            Some(carrier) => match body.velocity_of(carrier) {
                Some(velocity) => velocity,
                None => {
                    report.carry = Some(self.carry.clear());
                    self.flags.riding = false;
                    Vec2::ZERO
                }
            },
            None => Vec2::ZERO,
        };

        if let Some(change) = report.carry {
            match change {
                CarryChange::Attached(carrier) => {
                    debug!("{:?} now riding {:?}", body.entity(), carrier)
                }
                CarryChange::Detached(carrier) => {
                    debug!("{:?} no longer riding {:?}", body.entity(), carrier)
                }
                CarryChange::Unchanged => {}
            }
        }
        if let Some(mass) = resting_mass {
            self.apply_mass(body, self.carry.effective_mass(mass));
        }

        // 3. Horizontal velocity.
        let velocity = body.velocity();
        let resolve = |platform_vx| {
            resolve_horizontal(
                input.axis,
                config.move_speed,
                &self.flags,
                config.wall_policy,
                platform_vx,
            )
        };
        let input_vx = resolve(0.0);
        let mut next = Vec2::new(resolve(platform_velocity.x), velocity.y);
        body.set_velocity(next);

        if config.record_actions && self.last_input_vx != input_vx {
            self.record(ActionKind::Move, input_vx);
        }
        self.last_input_vx = input_vx;

        // 4. Jump.
        if self.jump.step(self.flags.supported(), velocity.y, &input) {
            if let Some(mass) = resting_mass {
                self.apply_mass(body, mass);
            }
            next.y = config.jump_force;
            body.set_velocity(next);
            report.jumped = true;
            debug!("{:?} jumped with vy {}", body.entity(), config.jump_force);

            if config.record_actions {
                self.record(ActionKind::Jump, config.jump_force);
            }
        }

        // 5. Gravity scale.
        let scale = gravity_scale_for(config, next.y, self.jump.latched());
        body.set_gravity_scale(scale);

        report.velocity = next;
        report.gravity_scale = scale;
        self.elapsed += dt;
        report
    }

    /// Lethal contact: stop simulating and move to the spawn point.
    ///
    /// Without a spawn point the body is disabled where it stands. Dying
    /// while already dead does nothing.
    pub fn die<B: CharacterBody>(&mut self, body: &mut B) {
        if !self.life.is_alive() {
            return;
        }
        self.life = LifeState::Dead;
        self.reset_state();

        body.set_simulated(false);
        body.set_velocity(Vec2::ZERO);
        if let Some(mass) = self.resting_mass {
            self.apply_mass(body, mass);
        }
        match self.spawn {
            Some(position) => body.set_position(position),
            None => warn!("{:?} died with no spawn point", body.entity()),
        }
    }

    /// Bring a dead character back at its spawn point.
    pub fn respawn<B: CharacterBody>(&mut self, body: &mut B) -> Result<(), ControllerError> {
        let position = self.spawn.ok_or(ControllerError::NoSpawnPoint)?;
        self.reset_state();
        self.life = LifeState::Alive;

        body.set_position(position);
        body.set_velocity(Vec2::ZERO);
        body.set_simulated(true);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.flags = ContactFlags::default();
        self.jump.reset();
        self.carry.clear();
        self.last_input_vx = 0.0;
        self.contact_dirty = true;
        self.contact_trigger = None;
    }

    fn capture_resting_mass<B: CharacterBody>(
        &mut self,
        config: &ControllerConfig,
        body: &B,
    ) -> Option<f32> {
        if let Some(mass) = config.mass {
            self.resting_mass = Some(mass);
        } else if self.resting_mass.is_none() {
            let mass = body.mass();
            if mass > 0.0 && mass.is_finite() {
                self.resting_mass = Some(mass);
            }
        }
        self.resting_mass
    }

    fn apply_mass<B: CharacterBody>(&mut self, body: &mut B, mass: f32) {
        if self.applied_mass != Some(mass) {
            body.set_mass(mass);
            self.applied_mass = Some(mass);
        }
    }

    fn record(&mut self, kind: ActionKind, value: f32) {
        if let Err(err) = self.log.record(self.elapsed, kind, value) {
            warn!("dropping recorded action: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{LayerMask, ProbeDirection, ProbeHit};

    #[derive(Default)]
    struct TestBody {
        velocity: Vec2,
        mass: f32,
        gravity_scale: f32,
        simulated: bool,
        position: Vec2,
        below: Vec<ProbeHit>,
        mass_writes: usize,
        others_carrier: Option<Entity>,
    }

    impl CharacterBody for TestBody {
        fn entity(&self) -> Entity {
            Entity::from_raw(1)
        }

        fn probe(&self, direction: ProbeDirection, _distance: f32, mask: LayerMask) -> Vec<ProbeHit> {
            match direction {
                ProbeDirection::Down => self.below.iter().copied().filter(|h| h.matches(mask)).collect(),
                _ => Vec::new(),
            }
        }

        fn velocity(&self) -> Vec2 {
            self.velocity
        }
        fn set_velocity(&mut self, velocity: Vec2) {
            self.velocity = velocity;
        }
        fn mass(&self) -> f32 {
            self.mass
        }
        fn set_mass(&mut self, mass: f32) {
            self.mass = mass;
            self.mass_writes += 1;
        }
        fn set_gravity_scale(&mut self, scale: f32) {
            self.gravity_scale = scale;
        }
        fn set_simulated(&mut self, simulated: bool) {
            self.simulated = simulated;
        }
        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }
        fn velocity_of(&self, _other: Entity) -> Option<Vec2> {
            Some(Vec2::new(1.5, 0.0))
        }
        fn carrier_of(&self, _other: Entity) -> Option<Entity> {
            self.others_carrier
        }
    }

    fn grounded_body() -> TestBody {
        TestBody {
            mass: 2.0,
            below: vec![ProbeHit::new(Entity::from_raw(100), 0.0, LayerMask::ENVIRONMENT)],
            ..default()
        }
    }

    #[test]
    fn init_places_at_spawn_and_enables() {
        let mut body = TestBody::default();
        let mut controller = CharacterController::new();
        controller.init(Some(Vec2::new(3.0, 4.0)), &mut body);

        assert_eq!(body.position, Vec2::new(3.0, 4.0));
        assert!(body.simulated);
        assert!(controller.is_alive());
        assert!(controller.is_initialized());
        assert_eq!(controller.spawn, Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn step_walks_and_reports() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::default();

        let report = controller.step(&config, 0.02, InputSnapshot::walk(1.0), &mut body);
        assert!(report.active);
        assert!(report.classified);
        assert_eq!(body.velocity.x, 5.0);
        assert_eq!(controller.resting_mass(), Some(2.0));
        assert!(controller.is_grounded());
    }

    #[test]
    fn mass_is_written_only_on_change() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::default();

        for _ in 0..5 {
            controller.step(&config, 0.02, InputSnapshot::idle(), &mut body);
        }
        assert_eq!(body.mass_writes, 1);
    }

    #[test]
    fn config_mass_overrides_body_mass() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::default().with_mass(7.0);

        controller.step(&config, 0.02, InputSnapshot::idle(), &mut body);
        assert_eq!(controller.resting_mass(), Some(7.0));
        assert_eq!(body.mass, 7.0);
    }

    #[test]
    fn unknown_mass_is_not_captured() {
        let mut body = grounded_body();
        body.mass = 0.0;
        let mut controller = CharacterController::new();

        controller.step(&ControllerConfig::default(), 0.02, InputSnapshot::idle(), &mut body);
        assert_eq!(controller.resting_mass(), None);
        assert_eq!(body.mass_writes, 0);
    }

    #[test]
    fn contact_mode_only_classifies_after_notification() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::default().with_classify_mode(ClassifyMode::OnContactChange);
        controller.init(None, &mut body);

        // init marks contacts dirty
        assert!(controller.step(&config, 0.02, InputSnapshot::idle(), &mut body).classified);
        assert!(!controller.step(&config, 0.02, InputSnapshot::idle(), &mut body).classified);

        // Ground disappears without an event: the flag goes stale.
        body.below.clear();
        controller.step(&config, 0.02, InputSnapshot::idle(), &mut body);
        assert!(controller.is_grounded());

        controller.notify_contact(Entity::from_raw(100));
        assert!(controller.step(&config, 0.02, InputSnapshot::idle(), &mut body).classified);
        assert!(!controller.is_grounded());
    }

    #[test]
    fn recording_logs_changes_and_jumps() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::player();

        controller.step(&config, 0.1, InputSnapshot::walk(1.0), &mut body);
        controller.step(&config, 0.1, InputSnapshot::walk(1.0), &mut body);
        controller.step(&config, 0.1, InputSnapshot::new(1.0, true, true), &mut body);
        controller.step(&config, 0.1, InputSnapshot::walk(0.0), &mut body);

        let kinds: Vec<ActionKind> = controller.log.entries().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Move, ActionKind::Jump, ActionKind::Move]);

        let entries = controller.log.entries();
        assert_eq!(entries[0].value, 5.0);
        assert_eq!(entries[1].value, config.jump_force);
        assert_eq!(entries[0].time, 0.0);
        assert!((entries[1].time - 0.2).abs() < 1e-5);
        assert_eq!(entries[2].value, 0.0);
    }

    #[test]
    fn idle_input_records_nothing() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        let config = ControllerConfig::player();
        controller.init(None, &mut body);

        for _ in 0..3 {
            controller.step(&config, 0.1, InputSnapshot::idle(), &mut body);
        }
        assert!(controller.log.is_empty());

        controller.step(&config, 0.1, InputSnapshot::walk(-1.0), &mut body);
        let entries = controller.log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ActionKind::Move);
        assert_eq!(entries[0].value, -5.0);
        assert!((entries[0].time - 0.3).abs() < 1e-5);
    }

    #[test]
    fn session_time_advances_while_dead() {
        let mut body = grounded_body();
        let mut controller = CharacterController::at_spawn(Vec2::ZERO);
        let config = ControllerConfig::player();
        controller.init(None, &mut body);

        controller.step(&config, 0.1, InputSnapshot::idle(), &mut body);
        controller.die(&mut body);
        for _ in 0..5 {
            let report = controller.step(&config, 0.1, InputSnapshot::walk(1.0), &mut body);
            assert!(!report.active);
        }
        assert!((controller.elapsed - 0.6).abs() < 1e-5);
        assert!(controller.log.is_empty());

        controller.respawn(&mut body).unwrap();
        controller.step(&config, 0.1, InputSnapshot::walk(1.0), &mut body);
        let entries = controller.log.entries();
        assert_eq!(entries.len(), 1);
        assert!((entries[0].time - 0.6).abs() < 1e-5);
    }

    #[test]
    fn riding_adds_carrier_velocity() {
        let mut body = TestBody {
            mass: 2.0,
            below: vec![ProbeHit::new(Entity::from_raw(2), 0.0, LayerMask::CHARACTER)],
            ..default()
        };
        let mut controller = CharacterController::new();

        let report = controller.step(&ControllerConfig::default(), 0.02, InputSnapshot::walk(1.0), &mut body);
        assert_eq!(report.carry, Some(CarryChange::Attached(Entity::from_raw(2))));
        assert_eq!(body.velocity.x, 6.5);
        assert_eq!(body.mass, 0.0);
        assert!(controller.flags.supported());
    }

    #[test]
    fn carrier_riding_us_is_refused() {
        let mut body = TestBody {
            mass: 2.0,
            below: vec![ProbeHit::new(Entity::from_raw(2), 0.0, LayerMask::CHARACTER)],
            others_carrier: Some(Entity::from_raw(1)),
            ..default()
        };
        let mut controller = CharacterController::new();

        controller.step(&ControllerConfig::default(), 0.02, InputSnapshot::idle(), &mut body);
        assert_eq!(controller.carried_by(), None);
        assert!(!controller.flags.riding);
        assert_eq!(body.mass, 2.0);
    }

    #[test]
    fn respawn_without_spawn_fails() {
        let mut body = grounded_body();
        let mut controller = CharacterController::new();
        controller.die(&mut body);
        assert!(!body.simulated);
        assert_eq!(controller.respawn(&mut body), Err(ControllerError::NoSpawnPoint));
        assert!(!controller.is_alive());
    }
}
