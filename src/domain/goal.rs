//! Goal region and symbolic corner placement.

use std::str::FromStr;

use nalgebra::Vector3;

use super::{Aabb, HasBounds, Pose, ValidationError};

/// The floor plane is 100x100 centered at the origin.
pub const FLOOR_HALF_EXTENT: f64 = 50.0;

/// Corner goals are inset this far from each floor edge toward the origin.
pub const GOAL_INSET_MARGIN: f64 = 5.0;

/// Exactly one goal exists per simulation; repositioning overwrites in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Goal {
    pose: Pose,
    half_extent: f64,
}

impl Goal {
    pub fn new(pose: Pose, half_extent: f64) -> Self {
        Self { pose, half_extent }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn half_extent(&self) -> f64 {
        self.half_extent
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }
}

impl HasBounds for Goal {
    fn bounds(&self) -> Aabb {
        Aabb::around(
            self.pose,
            Vector3::new(self.half_extent, self.half_extent, self.half_extent),
        )
    }
}

/// Symbolic floor corner. East is +x, south is +z; the TR/TL/BR/BL aliases
/// follow the renderer's screen orientation (top of the screen is north).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Corner {
    pub fn resolve(self, floor_half: f64, margin: f64) -> Pose {
        let inset = floor_half - margin;
        let (x, z) = match self {
            Corner::NorthEast => (inset, -inset),
            Corner::NorthWest => (-inset, -inset),
            Corner::SouthEast => (inset, inset),
            Corner::SouthWest => (-inset, inset),
        };
        Pose::new(x, 0.0, z)
    }
}

impl FromStr for Corner {
    type Err = ValidationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_uppercase().as_str() {
            "NE" | "TR" => Ok(Corner::NorthEast),
            "NW" | "TL" => Ok(Corner::NorthWest),
            "SE" | "BR" => Ok(Corner::SouthEast),
            "SW" | "BL" => Ok(Corner::SouthWest),
            _ => Err(ValidationError::UnknownCorner(token.to_string())),
        }
    }
}
