//! Horizontal movement resolution.

use crate::config::WallPolicy;
use crate::detection::ContactFlags;

/// Compute next-step horizontal velocity.
///
/// Horizontal velocity is fully overwritten: the only carry-over from the
/// previous step is the carrier's velocity, passed in as `platform_vx`.
/// A character squeezed between two walls gets zero, whatever the policy.
pub fn resolve_horizontal(
    axis: f32,
    move_speed: f32,
    flags: &ContactFlags,
    policy: WallPolicy,
    platform_vx: f32,
) -> f32 {
    if flags.squeezed() {
        return 0.0;
    }

    let axis = axis.clamp(-1.0, 1.0);
    let input_vx = match policy {
        WallPolicy::Suppress if flags.is_blocked(axis) => 0.0,
        _ => axis * move_speed,
    };

    input_vx + platform_vx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_movement_uses_full_speed() {
        let flags = ContactFlags {
            grounded: true,
            ..Default::default()
        };
        assert_eq!(resolve_horizontal(1.0, 5.0, &flags, WallPolicy::Suppress, 0.0), 5.0);
        assert_eq!(resolve_horizontal(-0.5, 5.0, &flags, WallPolicy::Suppress, 0.0), -2.5);
        assert_eq!(resolve_horizontal(0.0, 5.0, &flags, WallPolicy::Suppress, 0.0), 0.0);
    }

    #[test]
    fn axis_is_clamped() {
        let flags = ContactFlags::default();
        assert_eq!(resolve_horizontal(3.0, 5.0, &flags, WallPolicy::Suppress, 0.0), 5.0);
    }

    #[test]
    fn suppress_policy_drops_input_into_wall() {
        let flags = ContactFlags {
            blocked_right: true,
            ..Default::default()
        };
        assert_eq!(resolve_horizontal(1.0, 5.0, &flags, WallPolicy::Suppress, 0.0), 0.0);
        // Moving away from the wall is allowed.
        assert_eq!(resolve_horizontal(-1.0, 5.0, &flags, WallPolicy::Suppress, 0.0), -5.0);
    }

    #[test]
    fn physics_policy_keeps_input_into_wall() {
        let flags = ContactFlags {
            blocked_right: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_horizontal(1.0, 5.0, &flags, WallPolicy::PhysicsResolves, 0.0),
            5.0
        );
    }

    #[test]
    fn squeezed_is_zero_for_both_policies() {
        let flags = ContactFlags {
            blocked_left: true,
            blocked_right: true,
            ..Default::default()
        };
        for policy in [WallPolicy::Suppress, WallPolicy::PhysicsResolves] {
            assert_eq!(resolve_horizontal(1.0, 5.0, &flags, policy, 3.0), 0.0);
        }
    }

    #[test]
    fn platform_velocity_is_added() {
        let flags = ContactFlags {
            riding: true,
            ..Default::default()
        };
        assert_eq!(resolve_horizontal(1.0, 5.0, &flags, WallPolicy::Suppress, 2.0), 7.0);
        assert_eq!(resolve_horizontal(0.0, 5.0, &flags, WallPolicy::Suppress, -2.0), -2.0);
    }
}
