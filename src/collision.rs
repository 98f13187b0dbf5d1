//! Probe result structures and collision layer masks.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Bitset of collision layers a probe considers.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// Default layer for static level geometry.
    pub const ENVIRONMENT: Self = Self(1 << 0);
    /// Default layer for characters.
    pub const CHARACTER: Self = Self(1 << 1);

    /// Mask for a single layer index (0..32).
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index & 31))
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the two masks share at least one layer.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of both masks.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Cardinal directions the controller probes in.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl ProbeDirection {
    /// All four directions, in a fixed order.
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    /// Unit vector for the direction.
    pub fn vector(self) -> Vec2 {
        match self {
            Self::Left => Vec2::NEG_X,
            Self::Right => Vec2::X,
            Self::Up => Vec2::Y,
            Self::Down => Vec2::NEG_Y,
        }
    }
}

/// A collider found by a shape probe.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Entity owning the collider that was hit.
    pub entity: Entity,
    /// Distance along the probe direction at which the hit occurs.
    /// Zero for colliders already touching or overlapping the bounds.
    pub distance: f32,
    /// Collision layers the hit collider belongs to.
    pub layers: LayerMask,
}

impl ProbeHit {
    /// Create a probe hit.
    pub fn new(entity: Entity, distance: f32, layers: LayerMask) -> Self {
        Self {
            entity,
            distance,
            layers,
        }
    }

    /// Whether this hit belongs to any layer in `mask`.
    #[inline]
    pub fn matches(&self, mask: LayerMask) -> bool {
        self.layers.intersects(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_mask_intersects() {
        let both = LayerMask::ENVIRONMENT | LayerMask::CHARACTER;
        assert!(both.intersects(LayerMask::CHARACTER));
        assert!(!LayerMask::ENVIRONMENT.intersects(LayerMask::CHARACTER));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
        assert_eq!(LayerMask::layer(3).bits(), 8);
    }

    #[test]
    fn probe_hit_matches_mask() {
        let hit = ProbeHit::new(Entity::from_raw(7), 0.05, LayerMask::CHARACTER);
        assert!(hit.matches(LayerMask::CHARACTER));
        assert!(!hit.matches(LayerMask::ENVIRONMENT));
    }

    #[test]
    fn probe_direction_vectors() {
        assert_eq!(ProbeDirection::Left.vector(), Vec2::NEG_X);
        assert_eq!(ProbeDirection::Down.vector(), Vec2::NEG_Y);
    }
}
