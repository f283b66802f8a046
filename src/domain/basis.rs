//! Basic building blocks.
//!
//! Coordinate convention, applied throughout the crate: the ground plane is
//! spanned by x and z, y is vertical and stays 0 for ground entities. Heading
//! is measured in degrees and normalized to [0, 360); heading 0 points along
//! the positive x-axis and positive headings rotate toward the positive
//! z-axis.

use nalgebra::Vector2;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Pose {
    x: f64,
    y: f64,
    z: f64,
    heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            heading: 0.0,
        }
    }

    pub fn with_heading(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            z,
            heading: wrap_degrees(heading),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Projection onto the ground plane.
    pub fn planar(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.z)
    }

    pub fn set_planar(&mut self, planar: Vector2<f64>) {
        self.x = planar.x;
        self.z = planar.y;
    }
}

/// Normalize an angle in degrees to [0, 360).
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Place the pose at the given ground coordinates, keeping heading and the
/// vertical coordinate.
pub fn apply_absolute_target(pose: Pose, x: f64, z: f64) -> Result<Pose, ValidationError> {
    ensure_finite("x", x)?;
    ensure_finite("z", z)?;
    Ok(Pose { x, z, ..pose })
}

/// Turn by `turn_degrees`, then advance `distance` along the new heading:
/// position + distance * (cos heading, 0, sin heading).
pub fn apply_relative_target(
    pose: Pose,
    turn_degrees: f64,
    distance: f64,
) -> Result<Pose, ValidationError> {
    ensure_finite("turn", turn_degrees)?;
    ensure_finite("distance", distance)?;
    if distance < 0.0 {
        return Err(ValidationError::NegativeDistance(distance));
    }
    let heading = wrap_degrees(pose.heading + turn_degrees);
    let radians = heading.to_radians();
    Ok(Pose {
        x: pose.x + distance * radians.cos(),
        y: pose.y,
        z: pose.z + distance * radians.sin(),
        heading,
    })
}

pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

/// A command with an invalid field. The world state is left untouched when
/// one of these is returned.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("field {field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("distance must be non-negative, got {0}")]
    NegativeDistance(f64),
    #[error("speed must be positive, got {0}")]
    NonPositiveSpeed(f64),
    #[error("malformed bounds on {axis}: min {min} must be below max {max}")]
    MalformedBounds {
        axis: &'static str,
        min: f64,
        max: f64,
    },
    #[error("unknown corner token {0:?}")]
    UnknownCorner(String),
    #[error("provide either a corner token or explicit x and z")]
    MissingGoalTarget,
    #[error("positions must be a non-empty list")]
    EmptyPositions,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    const EPSILON: f64 = 1e-9;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(359.0, 359.0)]
    #[case(360.0, 0.0)]
    #[case(405.0, 45.0)]
    #[case(-45.0, 315.0)]
    #[case(-720.0, 0.0)]
    fn test_wrap_degrees(#[case] degrees: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(wrap_degrees(degrees), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_apply_absolute_target_sets_exact_coordinates() {
        let pose = Pose::with_heading(1.0, 0.0, 2.0, 90.0);
        let updated = apply_absolute_target(pose, 10.0, -5.0).unwrap();
        assert_abs_diff_eq!(updated.x(), 10.0);
        assert_abs_diff_eq!(updated.z(), -5.0);
        assert_abs_diff_eq!(updated.y(), 0.0);
        assert_abs_diff_eq!(updated.heading(), 90.0);
    }

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    #[case(f64::NEG_INFINITY, f64::NAN)]
    fn test_apply_absolute_target_rejects_non_finite(#[case] x: f64, #[case] z: f64) {
        assert!(matches!(
            apply_absolute_target(Pose::default(), x, z),
            Err(ValidationError::NonFinite { .. })
        ));
    }

    #[rstest]
    #[case::east(0.0, 10.0, (10.0, 0.0), 0.0)]
    #[case::quarter_turn(90.0, 2.0, (0.0, 2.0), 90.0)]
    #[case::half_turn(180.0, 1.0, (-1.0, 0.0), 180.0)]
    #[case::diagonal(45.0, 10.0, (7.071067811865476, 7.071067811865475), 45.0)]
    #[case::negative_turn(-90.0, 3.0, (0.0, -3.0), 270.0)]
    fn test_apply_relative_target(
        #[case] turn: f64,
        #[case] distance: f64,
        #[case] position: (f64, f64),
        #[case] heading: f64,
    ) {
        let updated = apply_relative_target(Pose::default(), turn, distance).unwrap();
        assert_abs_diff_eq!(updated.x(), position.0, epsilon = EPSILON);
        assert_abs_diff_eq!(updated.z(), position.1, epsilon = EPSILON);
        assert_abs_diff_eq!(updated.heading(), heading, epsilon = EPSILON);
    }

    #[test]
    fn test_apply_relative_target_moves_exactly_distance() {
        let start = Pose::with_heading(3.0, 0.0, -2.0, 123.0);
        let updated = apply_relative_target(start, 77.0, 4.5).unwrap();
        let moved = (updated.planar() - start.planar()).norm();
        assert_abs_diff_eq!(moved, 4.5, epsilon = EPSILON);
        assert!((0.0..360.0).contains(&updated.heading()));
    }

    #[test]
    fn test_apply_relative_target_rejects_negative_distance() {
        assert_eq!(
            apply_relative_target(Pose::default(), 0.0, -1.0),
            Err(ValidationError::NegativeDistance(-1.0))
        );
    }

    #[test]
    fn test_apply_relative_target_rejects_non_finite_turn() {
        assert!(matches!(
            apply_relative_target(Pose::default(), f64::NAN, 1.0),
            Err(ValidationError::NonFinite { field: "turn", .. })
        ));
    }
}
