//! Recorded action log.
//!
//! An append-only, time-stamped list of accepted move and jump commands for
//! one play session. A replay system consumes it to drive a "ghost" through
//! the same inputs on the next loop.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// Kind of recorded command.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `value` is the horizontal input velocity (`axis * move_speed`).
    Move,
    /// `value` is the jump force.
    Jump,
}

/// One recorded command.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RecordedAction {
    /// Session time in seconds.
    pub time: f32,
    pub kind: ActionKind,
    pub value: f32,
}

/// Time-ordered log of one session.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    entries: Vec<RecordedAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Time-stamps must not go backwards within a session.
    pub fn record(&mut self, time: f32, kind: ActionKind, value: f32) -> Result<(), ControllerError> {
        if let Some(last) = self.entries.last() {
            if time < last.time {
                return Err(ControllerError::NonMonotonicTimestamp {
                    last: last.time,
                    got: time,
                });
            }
        }
        self.entries.push(RecordedAction { time, kind, value });
        Ok(())
    }

    pub fn entries(&self) -> &[RecordedAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time-stamp of the newest entry.
    pub fn last_time(&self) -> Option<f32> {
        self.entries.last().map(|entry| entry.time)
    }

    /// Hand the current session to a consumer and start a new one.
    pub fn take_session(&mut self) -> Vec<RecordedAction> {
        std::mem::take(&mut self.entries)
    }

    /// A replay cursor over a copy of the current session.
    pub fn replay(&self) -> ActionReplay {
        ActionReplay::new(self.entries.clone())
    }
}

/// Cursor handing out recorded actions as session time catches up with them.
#[derive(Debug, Clone, Default)]
pub struct ActionReplay {
    entries: Vec<RecordedAction>,
    cursor: usize,
}

impl ActionReplay {
    pub fn new(entries: Vec<RecordedAction>) -> Self {
        Self { entries, cursor: 0 }
    }

    /// Every not-yet-returned action with `time <= now`, in order.
    pub fn advance(&mut self, now: f32) -> &[RecordedAction] {
        let start = self.cursor;
        while self
            .entries
            .get(self.cursor)
            .is_some_and(|entry| entry.time <= now)
        {
            self.cursor += 1;
        }
        &self.entries[start..self.cursor]
    }

    /// All actions have been handed out.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    /// Start over from the first action.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
