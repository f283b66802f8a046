//! Canonical world state: robot, obstacles, goal, motion config and the
//! collision counter, advanced by the simulation clock.
//!
//! All mutation funnels through one `World` value owned behind a single
//! mutex (see `main`); command handlers and the tick task never interleave
//! partially. The detector here is the authoritative collision source —
//! viewers only display what gets broadcast and never simulate themselves.

use nalgebra::Vector2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::{
    ensure_finite, Bounds, BoundaryPolicy, Corner, Environment, Goal, HasBounds, MotionConfig,
    Pose, Robot, RobotStatus, ValidationError, FLOOR_HALF_EXTENT, GOAL_INSET_MARGIN,
};

#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub obstacle_count: usize,
    pub obstacle_y: f64,
    pub goal_half_extent: f64,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            obstacle_count: 4,
            obstacle_y: 2.0,
            goal_half_extent: 2.0,
            seed: 0x0b57,
        }
    }
}

/// One `set obstacle motion` command after field defaulting. Absent fields
/// fall back to the original wire defaults rather than the previous config.
#[derive(Clone, Debug, Default)]
pub struct MotionUpdate {
    pub enabled: bool,
    pub speed: Option<f64>,
    pub bounds: Option<Bounds>,
    pub bounce: Option<bool>,
    pub velocities: Option<Vec<Vector2<f64>>>,
}

/// Event produced by the per-tick detector.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    Collision {
        robot: Pose,
        obstacle_id: u32,
        obstacle: Pose,
    },
    GoalReached {
        position: Pose,
    },
}

pub struct World {
    robot: Robot,
    environment: Environment,
    goal: Goal,
    motion: MotionConfig,
    collisions: u64,
    in_goal: bool,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let motion = MotionConfig::default();
        let environment = Environment::generate(
            config.obstacle_count,
            &motion.bounds,
            config.obstacle_y,
            &mut rng,
        );
        let goal = Goal::new(
            Corner::NorthEast.resolve(FLOOR_HALF_EXTENT, GOAL_INSET_MARGIN),
            config.goal_half_extent,
        );
        Self {
            robot: Robot::new(Pose::default()),
            environment,
            goal,
            motion,
            collisions: 0,
            in_goal: false,
            rng,
        }
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn set_robot_target(&mut self, x: f64, z: f64) -> Result<Pose, ValidationError> {
        self.robot.move_to(x, z)
    }

    pub fn set_robot_target_relative(
        &mut self,
        turn: f64,
        distance: f64,
    ) -> Result<Pose, ValidationError> {
        self.robot.move_relative(turn, distance)
    }

    pub fn stop(&mut self) {
        self.robot.stop();
    }

    pub fn set_goal_corner(&mut self, corner: Corner) -> Pose {
        let pose = corner.resolve(FLOOR_HALF_EXTENT, GOAL_INSET_MARGIN);
        self.goal.set_pose(pose);
        pose
    }

    pub fn set_goal_position(&mut self, x: f64, z: f64, y: f64) -> Result<Pose, ValidationError> {
        ensure_finite("x", x)?;
        ensure_finite("z", z)?;
        ensure_finite("y", y)?;
        let pose = Pose::new(x, y, z);
        self.goal.set_pose(pose);
        Ok(pose)
    }

    /// Validate and apply a motion update, then normalize the velocity list:
    /// one velocity per obstacle, random unit vectors where the caller
    /// supplied none. Happens once per call, never per tick.
    pub fn set_motion(&mut self, update: MotionUpdate) -> Result<MotionConfig, ValidationError> {
        let speed = update.speed.unwrap_or(0.05);
        ensure_finite("speed", speed)?;
        if speed <= 0.0 {
            return Err(ValidationError::NonPositiveSpeed(speed));
        }
        if let Some(velocities) = &update.velocities {
            for velocity in velocities {
                ensure_finite("velocities", velocity.x)?;
                ensure_finite("velocities", velocity.y)?;
            }
        }
        let policy = if update.bounce.unwrap_or(true) {
            BoundaryPolicy::Bounce
        } else {
            BoundaryPolicy::Wrap
        };
        self.motion = MotionConfig {
            enabled: update.enabled,
            speed,
            bounds: update.bounds.unwrap_or_default(),
            policy,
        };
        self.environment
            .assign_velocities(update.velocities.as_deref(), &mut self.rng);
        Ok(self.motion)
    }

    pub fn set_obstacle_positions(&mut self, positions: &[Pose]) -> Result<usize, ValidationError> {
        if positions.is_empty() {
            return Err(ValidationError::EmptyPositions);
        }
        for pose in positions {
            ensure_finite("x", pose.x())?;
            ensure_finite("y", pose.y())?;
            ensure_finite("z", pose.z())?;
        }
        Ok(self.environment.set_positions(positions))
    }

    pub fn increment_collisions(&mut self) -> u64 {
        self.collisions += 1;
        self.collisions
    }

    /// Atomic full reset: counter to zero, robot and obstacles back to their
    /// initial poses, collided flag cleared.
    pub fn reset_all(&mut self) {
        self.collisions = 0;
        self.robot.reset();
        self.environment.reset();
        self.in_goal = false;
    }

    /// One simulation tick: integrate obstacle motion, then run collision
    /// and goal detection against current poses.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        if self.motion.enabled {
            self.environment.integrate(&self.motion);
        }

        let mut events = Vec::new();
        let robot_bounds = self.robot.bounds();
        let hit = self
            .environment
            .obstacles()
            .iter()
            .find(|obstacle| obstacle.bounds().intersects(&robot_bounds));
        match (hit, self.robot.status()) {
            (Some(obstacle), RobotStatus::Normal) => {
                let event = SimEvent::Collision {
                    robot: self.robot.pose(),
                    obstacle_id: obstacle.id(),
                    obstacle: obstacle.pose(),
                };
                self.robot.mark_collided();
                self.collisions += 1;
                events.push(event);
            }
            (None, RobotStatus::Collided) => self.robot.clear_collided(),
            _ => {}
        }

        let in_goal = self.goal.bounds().intersects(&robot_bounds);
        if in_goal && !self.in_goal {
            events.push(SimEvent::GoalReached {
                position: self.robot.pose(),
            });
        }
        self.in_goal = in_goal;

        events
    }
}
