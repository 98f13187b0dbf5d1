//! Ground, wall and carry classification.
//!
//! Turns raw probe hits into the boolean flags the movement resolver and
//! jump state machine consume.

use bevy::prelude::*;

use crate::body::CharacterBody;
use crate::collision::{ProbeDirection, ProbeHit};
use crate::config::{ClassifyMode, ControllerConfig};

/// Contact flags derived from one round of probes.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactFlags {
    /// Environment geometry directly below.
    pub grounded: bool,
    /// Environment geometry directly to the left.
    pub blocked_left: bool,
    /// Environment geometry directly to the right.
    pub blocked_right: bool,
    /// Another character is standing on top of this one.
    pub carrying_another: bool,
    /// This character is standing on another character.
    pub riding: bool,
}

impl ContactFlags {
    /// Whether something solid is underneath (ground or another character).
    #[inline]
    pub fn supported(&self) -> bool {
        self.grounded || self.riding
    }

    /// Walls on both sides.
    #[inline]
    pub fn squeezed(&self) -> bool {
        self.blocked_left && self.blocked_right
    }

    /// Whether horizontal travel with sign of `direction` runs into a wall.
    pub fn is_blocked(&self, direction: f32) -> bool {
        (direction < 0.0 && self.blocked_left) || (direction > 0.0 && self.blocked_right)
    }
}

/// Result of classifying one character.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classification {
    pub flags: ContactFlags,
    /// Character directly beneath, if this one is riding it.
    pub carrier: Option<Entity>,
}

/// Drop hits on the probing body itself.
pub fn exclude_self(hits: Vec<ProbeHit>, this: Entity) -> Vec<ProbeHit> {
    hits.into_iter().filter(|hit| hit.entity != this).collect()
}

/// Nearest hit along the probe direction.
pub fn nearest(hits: &[ProbeHit]) -> Option<&ProbeHit> {
    hits.iter().min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Probe in all directions and derive contact flags.
///
/// `trigger` is the body whose contact begin/end caused this
/// classification. In [`ClassifyMode::OnContactChange`] a character below
/// only counts as a carrier when it is that trigger; in
/// [`ClassifyMode::EveryStep`] the nearest character below is used.
pub fn classify<B: CharacterBody>(
    body: &B,
    config: &ControllerConfig,
    trigger: Option<Entity>,
) -> Classification {
    let this = body.entity();
    let distance = config.probe_distance;
    let probe = |direction, mask| exclude_self(body.probe(direction, distance, mask), this);

    let blocked_right = !probe(ProbeDirection::Right, config.environment_mask).is_empty();
    let blocked_left = !probe(ProbeDirection::Left, config.environment_mask).is_empty();
    let grounded = !probe(ProbeDirection::Down, config.environment_mask).is_empty();
    let carrying_another = !probe(ProbeDirection::Up, config.character_mask).is_empty();

    let below: Vec<ProbeHit> = probe(ProbeDirection::Down, config.character_mask)
        .into_iter()
        .filter(|hit| hit.matches(config.character_mask))
        .collect();

    let carrier = match config.classify_mode {
        ClassifyMode::EveryStep => nearest(&below).map(|hit| hit.entity),
        ClassifyMode::OnContactChange => trigger
            .filter(|trigger| below.iter().any(|hit| hit.entity == *trigger)),
    };

    Classification {
        flags: ContactFlags {
            grounded,
            blocked_left,
            blocked_right,
            carrying_another,
            riding: carrier.is_some(),
        },
        carrier,
    }
}
