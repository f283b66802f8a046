//! The domain module encapsulates the core business logic: poses and the
//! kinematic target operations, bounding-box collision tests, the robot, the
//! obstacle environment with its motion policies, and the goal region.
//!
//! By minimizing hard dependencies, this module keeps the simulation rules
//! independent of the transport and runtime layers built on top of it.

mod basis;
mod collision;
mod environment;
mod goal;
mod robot;

pub use basis::{
    apply_absolute_target, apply_relative_target, ensure_finite, wrap_degrees, Pose,
    ValidationError,
};
pub use collision::{Aabb, HasBounds};
pub use environment::{
    random_unit_velocity, reflect_or_wrap, BoundaryPolicy, Bounds, Environment, MotionConfig,
    Obstacle, OBSTACLE_HALF_EXTENTS,
};
pub use goal::{Corner, Goal, FLOOR_HALF_EXTENT, GOAL_INSET_MARGIN};
pub use robot::{Robot, RobotStatus, ROBOT_HALF_EXTENTS};
