//! Robot commanded by absolute and relative movement targets.

use nalgebra::Vector3;

use super::{
    apply_absolute_target, apply_relative_target, Aabb, HasBounds, Pose, ValidationError,
};

/// Half-extents of the robot's bounding volume.
pub const ROBOT_HALF_EXTENTS: Vector3<f64> = Vector3::new(1.0, 1.0, 1.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RobotStatus {
    #[default]
    Normal,
    Collided,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Robot {
    pose: Pose,
    initial_pose: Pose,
    status: RobotStatus,
    target: Option<Pose>,
}

impl Robot {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            initial_pose: pose,
            status: RobotStatus::default(),
            target: None,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn status(&self) -> RobotStatus {
        self.status
    }

    /// The last commanded destination, kept until `stop` or a collision
    /// clears it. Viewers animate toward it.
    pub fn target(&self) -> Option<Pose> {
        self.target
    }

    pub fn move_to(&mut self, x: f64, z: f64) -> Result<Pose, ValidationError> {
        let pose = apply_absolute_target(self.pose, x, z)?;
        self.pose = pose;
        self.target = Some(pose);
        Ok(pose)
    }

    pub fn move_relative(&mut self, turn: f64, distance: f64) -> Result<Pose, ValidationError> {
        let pose = apply_relative_target(self.pose, turn, distance)?;
        self.pose = pose;
        self.target = Some(pose);
        Ok(pose)
    }

    /// Clear any pending target motion without touching the pose.
    pub fn stop(&mut self) {
        self.target = None;
    }

    pub fn mark_collided(&mut self) {
        self.status = RobotStatus::Collided;
        self.target = None;
    }

    pub fn clear_collided(&mut self) {
        self.status = RobotStatus::Normal;
    }

    pub fn reset(&mut self) {
        self.pose = self.initial_pose;
        self.status = RobotStatus::Normal;
        self.target = None;
    }
}

impl HasBounds for Robot {
    fn bounds(&self) -> Aabb {
        Aabb::around(self.pose, ROBOT_HALF_EXTENTS)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_move_to_updates_pose_and_target() {
        let mut robot = Robot::new(Pose::default());
        let pose = robot.move_to(10.0, -5.0).unwrap();
        assert_abs_diff_eq!(pose.x(), 10.0);
        assert_abs_diff_eq!(pose.z(), -5.0);
        assert_eq!(robot.target(), Some(pose));
    }

    #[test]
    fn test_failed_move_leaves_robot_untouched() {
        let mut robot = Robot::new(Pose::new(1.0, 0.0, 1.0));
        let before = robot.clone();
        assert!(robot.move_to(f64::NAN, 0.0).is_err());
        assert_eq!(robot, before);
    }

    #[test]
    fn test_stop_clears_target_keeps_pose() {
        let mut robot = Robot::new(Pose::default());
        robot.move_to(3.0, 4.0).unwrap();
        robot.stop();
        assert_eq!(robot.target(), None);
        assert_abs_diff_eq!(robot.pose().x(), 3.0);
    }

    #[test]
    fn test_collision_halts_pending_motion() {
        let mut robot = Robot::new(Pose::default());
        robot.move_to(3.0, 4.0).unwrap();
        robot.mark_collided();
        assert_eq!(robot.status(), RobotStatus::Collided);
        assert_eq!(robot.target(), None);
    }

    #[test]
    fn test_reset_restores_initial_pose_and_status() {
        let mut robot = Robot::new(Pose::new(2.0, 0.0, -2.0));
        robot.move_relative(90.0, 5.0).unwrap();
        robot.mark_collided();
        robot.reset();
        assert_eq!(robot.status(), RobotStatus::Normal);
        assert_eq!(robot.pose(), Pose::new(2.0, 0.0, -2.0));
        assert_eq!(robot.target(), None);
    }
}
