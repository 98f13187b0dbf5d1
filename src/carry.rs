//! Carry linkage between stacked characters.
//!
//! A rider keeps a weak link (identity only) to the character it stands
//! on. While linked, the rider's effective mass is zero so it does not load
//! the carrier, and the carrier's horizontal velocity is composed into the
//! rider's. Chains are not propagated: a rider's riders see only the rider's
//! own velocity.

use bevy::prelude::*;

/// Link from a rider to the body beneath it.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarryLink {
    carrier: Option<Entity>,
}

/// What changed when the link was updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryChange {
    Unchanged,
    /// Started riding, or switched to a different carrier.
    Attached(Entity),
    Detached(Entity),
}

impl CarryLink {
    /// The character currently carrying this one.
    #[inline]
    pub fn carrier(&self) -> Option<Entity> {
        self.carrier
    }

    #[inline]
    pub fn is_riding(&self) -> bool {
        self.carrier.is_some()
    }

    /// Replace the link with this step's candidate.
    pub fn update(&mut self, candidate: Option<Entity>) -> CarryChange {
        let previous = std::mem::replace(&mut self.carrier, candidate);
        match (previous, candidate) {
            (a, b) if a == b => CarryChange::Unchanged,
            (_, Some(new)) => CarryChange::Attached(new),
            (Some(old), None) => CarryChange::Detached(old),
            (None, None) => CarryChange::Unchanged,
        }
    }

    /// Drop the link.
    pub fn clear(&mut self) -> CarryChange {
        self.update(None)
    }

    /// Mass the body should have given the current link.
    #[inline]
    pub fn effective_mass(&self, resting_mass: f32) -> f32 {
        if self.is_riding() {
            0.0
        } else {
            resting_mass
        }
    }
}
