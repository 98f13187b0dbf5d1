//! Input bus with scoped subscriptions.
//!
//! For hosts that deliver input as discrete action events (started,
//! performed, cancelled) rather than polled state. A character subscribes
//! when it is enabled and holds the returned [`InputSubscription`]; dropping
//! the guard deregisters it, so teardown always mirrors registration.
//!
//! The bus is single-threaded (`Rc`/`RefCell`), matching the fixed-step
//! driver loop it feeds.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::intent::{InputSnapshot, MovementIntent};

/// A discrete input action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionEvent {
    /// Horizontal axis changed (started, performed or cancelled).
    Move(f32),
    JumpStarted,
    JumpReleased,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    queues: Vec<(u64, VecDeque<ActionEvent>)>,
}

/// Publish side of the input bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct InputBus {
    inner: Rc<RefCell<BusInner>>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscription.
    pub fn publish(&self, event: ActionEvent) {
        for (_, queue) in self.inner.borrow_mut().queues.iter_mut() {
            queue.push_back(event);
        }
    }

    /// Register a subscriber. Events published from now on are queued for it
    /// until it is dropped.
    pub fn subscribe(&self) -> InputSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.queues.push((id, VecDeque::new()));
        InputSubscription {
            id,
            bus: Rc::downgrade(&self.inner),
            intent: MovementIntent::default(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().queues.len()
    }
}

/// Receive side of one registration. Deregisters on drop.
pub struct InputSubscription {
    id: u64,
    bus: Weak<RefCell<BusInner>>,
    intent: MovementIntent,
}

impl InputSubscription {
    /// Fold all pending events into the held input state and take this
    /// step's snapshot.
    ///
    /// If the bus is gone the last known state is held.
    pub fn sample(&mut self) -> InputSnapshot {
        let pending = self
            .bus
            .upgrade()
            .map(|bus| {
                let mut inner = bus.borrow_mut();
                inner
                    .queues
                    .iter_mut()
                    .find(|(id, _)| *id == self.id)
                    .map(|(_, queue)| queue.drain(..).collect::<Vec<_>>())
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        // A press and release inside one step still counts as a tap.
        let mut tapped = false;
        for event in pending {
            match event {
                ActionEvent::Move(axis) => self.intent.set_walk(axis),
                ActionEvent::JumpStarted => {
                    if !self.intent.is_jump_pressed() {
                        tapped = true;
                    }
                    self.intent.set_jump_pressed(true);
                }
                ActionEvent::JumpReleased => self.intent.set_jump_pressed(false),
            }
        }

        let snapshot = self.intent.sample();
        if tapped {
            InputSnapshot::new(snapshot.axis, true, snapshot.jump_held)
        } else {
            snapshot
        }
    }

    /// Current held intent.
    pub fn intent(&self) -> &MovementIntent {
        &self.intent
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().queues.retain(|(id, _)| *id != self.id);
        }
    }
}
