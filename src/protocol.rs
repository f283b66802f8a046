//! Wire protocol shared by the command gateway and viewer sessions.
//!
//! Two message families travel to viewers: mirrored commands discriminated by
//! `command` (the renderer animates from these) and simulation events
//! discriminated by `type`. Inbound telemetry from viewers uses the same
//! `type` discriminant.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::domain::{BoundaryPolicy, Bounds, MotionConfig, Pose, RobotStatus};
use crate::world::{SimEvent, World};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Pose> for Vec3 {
    fn from(pose: Pose) -> Self {
        Self {
            x: pose.x(),
            y: pose.y(),
            z: pose.z(),
        }
    }
}

/// Ground-plane velocity as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarVelocity {
    pub x: f64,
    pub z: f64,
}

impl From<PlanarVelocity> for Vector2<f64> {
    fn from(velocity: PlanarVelocity) -> Self {
        Vector2::new(velocity.x, velocity.z)
    }
}

impl From<Vector2<f64>> for PlanarVelocity {
    fn from(velocity: Vector2<f64>) -> Self {
        Self {
            x: velocity.x,
            z: velocity.y,
        }
    }
}

/// Motion bounds with the original camel-case field names.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundsBody {
    #[serde(rename = "minX")]
    pub min_x: f64,
    #[serde(rename = "maxX")]
    pub max_x: f64,
    #[serde(rename = "minZ")]
    pub min_z: f64,
    #[serde(rename = "maxZ")]
    pub max_z: f64,
}

impl From<Bounds> for BoundsBody {
    fn from(bounds: Bounds) -> Self {
        Self {
            min_x: bounds.min_x,
            max_x: bounds.max_x,
            min_z: bounds.min_z,
            max_z: bounds.max_z,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionConfigBody {
    pub enabled: bool,
    pub speed: f64,
    pub bounds: BoundsBody,
    pub bounce: bool,
}

impl From<MotionConfig> for MotionConfigBody {
    fn from(config: MotionConfig) -> Self {
        Self {
            enabled: config.enabled,
            speed: config.speed,
            bounds: config.bounds.into(),
            bounce: config.policy == BoundaryPolicy::Bounce,
        }
    }
}

/// Command mirrored to every viewer session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ViewerCommand {
    Move {
        target: Vec3,
    },
    MoveRelative {
        turn: f64,
        distance: f64,
    },
    Stop,
    CaptureImage,
    SetGoal {
        position: Vec3,
    },
    SetObstacles {
        positions: Vec<Vec3>,
    },
    SetObstacleMotion {
        #[serde(flatten)]
        config: MotionConfigBody,
    },
    Reset,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfirmationTarget {
    Position(Vec3),
    Relative { angle: f64, distance: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObstacleRef {
    pub position: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RobotBody {
    pub position: Vec3,
    pub heading: f64,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec3>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObstacleBody {
    pub id: u32,
    pub position: Vec3,
    pub velocity: PlanarVelocity,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalBody {
    pub position: Vec3,
    #[serde(rename = "halfExtent")]
    pub half_extent: f64,
}

/// Image capture result relayed verbatim from the rendering client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureImage {
    pub image: String,
    #[serde(default)]
    pub timestamp: serde_json::Value,
    pub position: Vec3,
}

/// Simulation event broadcast to viewers (and, for confirmations and the
/// capture response, returned to HTTP callers).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Confirmation {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<ConfirmationTarget>,
        #[serde(skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
    Collision {
        collision: bool,
        position: Vec3,
        obstacle: ObstacleRef,
    },
    GoalReached {
        position: Vec3,
    },
    CaptureImageResponse {
        #[serde(flatten)]
        capture: CaptureImage,
    },
    State {
        robot: RobotBody,
        obstacles: Vec<ObstacleBody>,
        goal: GoalBody,
        collisions: u64,
    },
}

impl Event {
    pub fn confirmation(message: &str) -> Self {
        Self::Confirmation {
            message: message.to_string(),
            target: None,
            enabled: None,
        }
    }

    pub fn confirmation_with_target(message: &str, target: ConfirmationTarget) -> Self {
        Self::Confirmation {
            message: message.to_string(),
            target: Some(target),
            enabled: None,
        }
    }

    pub fn confirmation_with_enabled(message: &str, enabled: bool) -> Self {
        Self::Confirmation {
            message: message.to_string(),
            target: None,
            enabled: Some(enabled),
        }
    }

    /// Snapshot of the current world for pure-observer viewers.
    pub fn state_of(world: &World) -> Self {
        let robot = world.robot();
        Self::State {
            robot: RobotBody {
                position: robot.pose().into(),
                heading: robot.pose().heading(),
                status: match robot.status() {
                    RobotStatus::Normal => "normal",
                    RobotStatus::Collided => "collided",
                },
                target: robot.target().map(Vec3::from),
            },
            obstacles: world
                .environment()
                .obstacles()
                .iter()
                .map(|obstacle| ObstacleBody {
                    id: obstacle.id(),
                    position: obstacle.pose().into(),
                    velocity: obstacle.velocity().into(),
                })
                .collect(),
            goal: GoalBody {
                position: world.goal().pose().into(),
                half_extent: world.goal().half_extent(),
            },
            collisions: world.collisions(),
        }
    }
}

impl From<SimEvent> for Event {
    fn from(event: SimEvent) -> Self {
        match event {
            SimEvent::Collision {
                robot, obstacle, ..
            } => Event::Collision {
                collision: true,
                position: robot.into(),
                obstacle: ObstacleRef {
                    position: obstacle.into(),
                },
            },
            SimEvent::GoalReached { position } => Event::GoalReached {
                position: position.into(),
            },
        }
    }
}

/// Telemetry pushed by a viewer session over its WebSocket.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Confirmation {
        #[serde(default)]
        message: Option<String>,
    },
    Collision {
        #[serde(default)]
        collision: bool,
        #[serde(default)]
        position: Option<Vec3>,
    },
    GoalReached {
        #[serde(default)]
        position: Option<Vec3>,
    },
    CaptureImageResponse {
        #[serde(flatten)]
        capture: CaptureImage,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_move_confirmation_shape() {
        let event = Event::confirmation_with_target(
            "Move command received",
            ConfirmationTarget::Position(Vec3 {
                x: 10.0,
                y: 0.0,
                z: -5.0,
            }),
        );
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "confirmation",
                "message": "Move command received",
                "target": {"x": 10.0, "y": 0.0, "z": -5.0},
            })
        );
    }

    #[test]
    fn test_relative_confirmation_shape() {
        let event = Event::confirmation_with_target(
            "Relative move command executed",
            ConfirmationTarget::Relative {
                angle: 45.0,
                distance: 10.0,
            },
        );
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "confirmation",
                "message": "Relative move command executed",
                "target": {"angle": 45.0, "distance": 10.0},
            })
        );
    }

    #[test]
    fn test_collision_event_shape() {
        let event = Event::Collision {
            collision: true,
            position: Vec3 {
                x: 1.5,
                y: 0.0,
                z: -3.2,
            },
            obstacle: ObstacleRef {
                position: Vec3 {
                    x: 2.0,
                    y: 2.0,
                    z: -3.0,
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "collision",
                "collision": true,
                "position": {"x": 1.5, "y": 0.0, "z": -3.2},
                "obstacle": {"position": {"x": 2.0, "y": 2.0, "z": -3.0}},
            })
        );
    }

    #[test]
    fn test_viewer_command_uses_command_discriminant() {
        let command = ViewerCommand::Move {
            target: Vec3 {
                x: 1.0,
                y: 0.0,
                z: 2.0,
            },
        };
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "command": "move",
                "target": {"x": 1.0, "y": 0.0, "z": 2.0},
            })
        );
        assert_eq!(
            serde_json::to_value(ViewerCommand::Reset).unwrap(),
            json!({"command": "reset"})
        );
    }

    #[test]
    fn test_capture_response_round_trip() {
        let text = r#"{
            "type": "capture_image_response",
            "image": "iVBORw0KGgo=",
            "timestamp": 1723948.5,
            "position": {"x": 0.0, "y": 0.0, "z": 0.0}
        }"#;
        let inbound: InboundMessage = serde_json::from_str(text).unwrap();
        let InboundMessage::CaptureImageResponse { capture } = inbound else {
            panic!("expected capture response");
        };
        assert_eq!(capture.image, "iVBORw0KGgo=");

        let relayed = serde_json::to_value(Event::CaptureImageResponse { capture }).unwrap();
        assert_eq!(relayed["type"], "capture_image_response");
        assert_eq!(relayed["timestamp"], json!(1723948.5));
    }

    #[test]
    fn test_inbound_collision_parses() {
        let inbound: InboundMessage = serde_json::from_str(
            r#"{"type": "collision", "collision": true, "position": {"x": 1.0, "y": 0.0, "z": 2.0}}"#,
        )
        .unwrap();
        assert!(matches!(
            inbound,
            InboundMessage::Collision {
                collision: true,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_inbound_type_is_an_error() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type": "telemetry"}"#).is_err());
    }
}
