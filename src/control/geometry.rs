//! Spatial queries used by cast validation: distance, line of sight against
//! pillars, and facing.
//!
//! All tests are done on the ground plane (x, z). Facing follows Bevy's
//! convention: a unit looks down its local -Z axis.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A cylindrical sight blocker standing on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

/// Sight blockers of the region the units live in.
#[derive(Resource, Clone, Debug, Default)]
pub struct LineOfSight {
    pub pillars: Vec<Pillar>,
}

impl LineOfSight {
    pub fn new(pillars: Vec<Pillar>) -> Self {
        Self { pillars }
    }

    /// True if no pillar cuts the segment between `from` and `to`.
    pub fn is_clear(&self, from: Vec3, to: Vec3) -> bool {
        let a = from.xz();
        let b = to.xz();
        self.pillars
            .iter()
            .all(|p| !segment_hits_circle(a, b, Vec2::new(p.x, p.z), p.radius))
    }
}

fn segment_hits_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > f32::EPSILON {
        ((center - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = a + ab * t;
    closest.distance_squared(center) < radius * radius
}

/// Ground-plane distance between two positions.
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    a.xz().distance(b.xz())
}

/// Whether `target` lies in the front half-plane of `transform`.
pub fn is_in_front(transform: &Transform, target: Vec3) -> bool {
    let to_target = (target - transform.translation).xz();
    if to_target.length_squared() <= f32::EPSILON {
        return true;
    }
    let forward = (transform.rotation * Vec3::NEG_Z).xz();
    forward.dot(to_target) >= 0.0
}

/// Turn `transform` about the vertical axis to look at `target`.
pub fn face_towards(transform: &mut Transform, target: Vec3) {
    let dir = (target - transform.translation).xz();
    if dir.length_squared() <= f32::EPSILON {
        return;
    }
    // rotation_y(yaw) * -Z = (-sin yaw, 0, -cos yaw)
    let yaw = (-dir.x).atan2(-dir.y);
    transform.rotation = Quat::from_rotation_y(yaw);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillar_blocks_sight() {
        let los = LineOfSight::new(vec![Pillar { x: 0.0, z: 0.0, radius: 1.0 }]);
        assert!(!los.is_clear(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)));
        assert!(los.is_clear(Vec3::new(-5.0, 0.0, 3.0), Vec3::new(5.0, 0.0, 3.0)));
        // Both ends on the same side of the pillar
        assert!(los.is_clear(Vec3::new(2.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_default_facing_is_negative_z() {
        let t = Transform::default();
        assert!(is_in_front(&t, Vec3::new(0.0, 0.0, -4.0)));
        assert!(!is_in_front(&t, Vec3::new(0.0, 0.0, 4.0)));
    }

    #[test]
    fn test_face_towards_turns_unit() {
        let mut t = Transform::default();
        let behind = Vec3::new(3.0, 0.0, 4.0);
        assert!(!is_in_front(&t, behind));
        face_towards(&mut t, behind);
        assert!(is_in_front(&t, behind));
        let forward = t.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-4);
    }

    #[test]
    fn test_ground_distance_ignores_height() {
        let d = ground_distance(Vec3::new(0.0, 10.0, 0.0), Vec3::new(3.0, 0.0, 4.0));
        assert!((d - 5.0).abs() < 1e-5);
    }
}
