//! Collision detection based on axis-aligned bounding boxes.

use nalgebra::Vector3;

use super::Pose;

pub trait HasBounds {
    fn bounds(&self) -> Aabb;

    fn intersects(&self, other: &dyn HasBounds) -> bool {
        self.bounds().intersects(&other.bounds())
    }
}

/// Axis-aligned box described by its center and half-extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    center: Vector3<f64>,
    half_extents: Vector3<f64>,
}

impl Aabb {
    pub fn new(center: Vector3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn around(pose: Pose, half_extents: Vector3<f64>) -> Self {
        Self::new(Vector3::new(pose.x(), pose.y(), pose.z()), half_extents)
    }

    /// Overlap test on all three axes. Touching boxes count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let gap = self.center - other.center;
        let reach = self.half_extents + other.half_extents;
        gap.x.abs() <= reach.x && gap.y.abs() <= reach.y && gap.z.abs() <= reach.z
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn unit_box(x: f64, y: f64, z: f64) -> Aabb {
        Aabb::new(Vector3::new(x, y, z), Vector3::new(1.0, 1.0, 1.0))
    }

    #[rstest]
    #[case::identical(unit_box(0.0, 0.0, 0.0), true)]
    #[case::overlapping(unit_box(1.5, 0.0, 0.5), true)]
    #[case::touching_x(unit_box(2.0, 0.0, 0.0), true)]
    #[case::touching_corner(unit_box(2.0, 2.0, 2.0), true)]
    #[case::separated_x(unit_box(2.1, 0.0, 0.0), false)]
    #[case::separated_y(unit_box(0.0, 3.0, 0.0), false)]
    #[case::separated_z(unit_box(0.0, 0.0, -2.5), false)]
    fn test_intersects(#[case] other: Aabb, #[case] expected: bool) {
        let a = unit_box(0.0, 0.0, 0.0);
        assert_eq!(a.intersects(&other), expected);
        assert_eq!(other.intersects(&a), expected);
    }

    #[test]
    fn test_around_uses_pose_coordinates() {
        let bounds = Aabb::around(Pose::new(1.0, 2.0, 3.0), Vector3::new(0.5, 0.5, 0.5));
        assert!(bounds.intersects(&unit_box(1.0, 2.0, 3.0)));
        assert!(!bounds.intersects(&unit_box(4.0, 2.0, 3.0)));
    }
}
