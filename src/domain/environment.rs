//! Environment with dynamic obstacles.
//!
//! Obstacle motion is kinematic: each simulation tick advances every obstacle
//! by its velocity scaled with the configured speed, then applies the
//! boundary policy against the motion bounds.

use std::f64::consts::TAU;

use nalgebra::{Vector2, Vector3};
use rand::Rng;

use super::{Aabb, HasBounds, Pose, ValidationError};

/// Half-extents of an obstacle's bounding box.
pub const OBSTACLE_HALF_EXTENTS: Vector3<f64> = Vector3::new(1.0, 1.0, 1.0);

/// Rectangular motion bounds on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Result<Self, ValidationError> {
        if min_x >= max_x {
            return Err(ValidationError::MalformedBounds {
                axis: "x",
                min: min_x,
                max: max_x,
            });
        }
        if min_z >= max_z {
            return Err(ValidationError::MalformedBounds {
                axis: "z",
                min: min_z,
                max: max_z,
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_z,
            max_z,
        })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: -45.0,
            max_x: 45.0,
            min_z: -45.0,
            max_z: 45.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryPolicy {
    #[default]
    Bounce,
    Wrap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    pub enabled: bool,
    pub speed: f64,
    pub bounds: Bounds,
    pub policy: BoundaryPolicy,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: 0.05,
            bounds: Bounds::default(),
            policy: BoundaryPolicy::default(),
        }
    }
}

/// Apply the boundary policy to a pose that may have left the bounds. Bounce
/// clamps the exceeded coordinate to the boundary and negates that velocity
/// component; wrap teleports the coordinate to the opposite boundary and
/// keeps the velocity.
pub fn reflect_or_wrap(
    pose: Pose,
    velocity: Vector2<f64>,
    bounds: &Bounds,
    policy: BoundaryPolicy,
) -> (Pose, Vector2<f64>) {
    let mut planar = pose.planar();
    let mut velocity = velocity;

    let mut axis = |value: &mut f64, component: &mut f64, min: f64, max: f64| match policy {
        BoundaryPolicy::Bounce => {
            if *value < min {
                *value = min;
                *component = -*component;
            } else if *value > max {
                *value = max;
                *component = -*component;
            }
        }
        BoundaryPolicy::Wrap => {
            if *value < min {
                *value = max;
            } else if *value > max {
                *value = min;
            }
        }
    };

    axis(&mut planar.x, &mut velocity.x, bounds.min_x, bounds.max_x);
    axis(&mut planar.y, &mut velocity.y, bounds.min_z, bounds.max_z);

    let mut pose = pose;
    pose.set_planar(planar);
    (pose, velocity)
}

/// Velocity vector of unit length pointing in a uniformly random direction.
pub fn random_unit_velocity(rng: &mut impl Rng) -> Vector2<f64> {
    let angle = rng.random_range(0.0..TAU);
    Vector2::new(angle.cos(), angle.sin())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    id: u32,
    pose: Pose,
    initial_pose: Pose,
    velocity: Vector2<f64>,
}

impl Obstacle {
    pub fn new(id: u32, pose: Pose, velocity: Vector2<f64>) -> Self {
        Self {
            id,
            pose,
            initial_pose: pose,
            velocity,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn velocity(&self) -> Vector2<f64> {
        self.velocity
    }
}

impl HasBounds for Obstacle {
    fn bounds(&self) -> Aabb {
        Aabb::around(self.pose, OBSTACLE_HALF_EXTENTS)
    }
}

/// Fixed-size obstacle collection. The count never changes after
/// construction; only poses and velocities do.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// Scatter `count` obstacles uniformly inside `bounds` at height `y`.
    pub fn generate(count: usize, bounds: &Bounds, y: f64, rng: &mut impl Rng) -> Self {
        let obstacles = (0..count)
            .map(|id| {
                let pose = Pose::new(
                    rng.random_range(bounds.min_x..=bounds.max_x),
                    y,
                    rng.random_range(bounds.min_z..=bounds.max_z),
                );
                Obstacle::new(id as u32, pose, random_unit_velocity(rng))
            })
            .collect();
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Advance every obstacle by one tick under the given config. Callers
    /// skip this entirely while motion is disabled.
    pub fn integrate(&mut self, config: &MotionConfig) {
        for obstacle in &mut self.obstacles {
            let planar = obstacle.pose.planar() + obstacle.velocity * config.speed;
            let mut moved = obstacle.pose;
            moved.set_planar(planar);
            let (pose, velocity) =
                reflect_or_wrap(moved, obstacle.velocity, &config.bounds, config.policy);
            obstacle.pose = pose;
            obstacle.velocity = velocity;
        }
    }

    /// Assign one velocity per obstacle. Missing entries are filled with
    /// random unit vectors, surplus entries are discarded.
    pub fn assign_velocities(&mut self, supplied: Option<&[Vector2<f64>]>, rng: &mut impl Rng) {
        for (index, obstacle) in self.obstacles.iter_mut().enumerate() {
            obstacle.velocity = supplied
                .and_then(|list| list.get(index).copied())
                .unwrap_or_else(|| random_unit_velocity(rng));
        }
    }

    /// Reposition existing obstacles pairwise by index. Returns how many
    /// positions were applied; surplus entries are discarded.
    pub fn set_positions(&mut self, positions: &[Pose]) -> usize {
        let applied = positions.len().min(self.obstacles.len());
        for (obstacle, pose) in self.obstacles.iter_mut().zip(positions) {
            obstacle.pose = *pose;
        }
        applied
    }

    /// Return every obstacle to its initial pose. Velocities are kept.
    pub fn reset(&mut self) {
        for obstacle in &mut self.obstacles {
            obstacle.pose = obstacle.initial_pose;
        }
    }
}
