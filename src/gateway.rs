//! Command gateway: validates external commands, applies them to the world
//! and triggers the resulting broadcasts.
//!
//! Every state-changing command commits under the world lock first; the
//! mirrored viewer broadcast happens after the mutation and is best-effort.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use nalgebra::Vector2;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::domain::{Bounds, Corner, Pose, ValidationError};
use crate::hub::{CaptureError, Hub, SessionId};
use crate::protocol::{
    BoundsBody, ConfirmationTarget, Event, MotionConfigBody, PlanarVelocity, Vec3, ViewerCommand,
};
use crate::world::{MotionUpdate, World, WorldConfig};

/// How long a capture command waits for a rendering client to answer.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Obstacles sit above the floor by default (renderer convention).
const DEFAULT_OBSTACLE_Y: f64 = 2.0;

#[derive(Clone)]
pub struct AppState {
    pub world: Arc<Mutex<World>>,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            world: Arc::new(Mutex::new(World::new(config))),
            hub: Arc::new(Hub::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/move", post(move_absolute))
        .route("/move_rel", post(move_relative))
        .route("/stop", post(stop))
        .route("/capture", post(capture))
        .route("/goal", post(set_goal))
        .route("/obstacles/positions", post(set_obstacle_positions))
        .route("/obstacles/motion", post(set_obstacle_motion))
        .route("/collisions", get(collisions))
        .route("/reset", post(reset))
        .route("/ws", get(viewer_socket))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Capture(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    x: f64,
    z: f64,
}

async fn move_absolute(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Event>, GatewayError> {
    let pose = state
        .world
        .lock()
        .await
        .set_robot_target(request.x, request.z)?;
    let target = Vec3::from(pose);
    state.hub.broadcast(&ViewerCommand::Move { target }).await;
    Ok(Json(Event::confirmation_with_target(
        "Move command received",
        ConfirmationTarget::Position(target),
    )))
}

#[derive(Debug, Deserialize)]
struct MoveRelativeRequest {
    turn: f64,
    distance: f64,
}

async fn move_relative(
    State(state): State<AppState>,
    Json(request): Json<MoveRelativeRequest>,
) -> Result<Json<Event>, GatewayError> {
    state
        .world
        .lock()
        .await
        .set_robot_target_relative(request.turn, request.distance)?;
    state
        .hub
        .broadcast(&ViewerCommand::MoveRelative {
            turn: request.turn,
            distance: request.distance,
        })
        .await;
    Ok(Json(Event::confirmation_with_target(
        "Relative move command executed",
        ConfirmationTarget::Relative {
            angle: request.turn,
            distance: request.distance,
        },
    )))
}

async fn stop(State(state): State<AppState>) -> Json<Event> {
    state.world.lock().await.stop();
    state.hub.broadcast(&ViewerCommand::Stop).await;
    Json(Event::confirmation("Stop command received"))
}

async fn capture(State(state): State<AppState>) -> Result<Json<Event>, GatewayError> {
    let capture = state.hub.capture(CAPTURE_TIMEOUT).await?;
    Ok(Json(Event::CaptureImageResponse { capture }))
}

#[derive(Debug, Deserialize)]
struct GoalRequest {
    corner: Option<String>,
    x: Option<f64>,
    z: Option<f64>,
    y: Option<f64>,
}

async fn set_goal(
    State(state): State<AppState>,
    Json(request): Json<GoalRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let pose = {
        let mut world = state.world.lock().await;
        match (&request.corner, request.x, request.z) {
            (Some(token), _, _) => {
                let corner: Corner = token.parse()?;
                world.set_goal_corner(corner)
            }
            (None, Some(x), Some(z)) => world.set_goal_position(x, z, request.y.unwrap_or(0.0))?,
            _ => return Err(ValidationError::MissingGoalTarget.into()),
        }
    };
    let position = Vec3::from(pose);
    state
        .hub
        .broadcast(&ViewerCommand::SetGoal { position })
        .await;
    state.hub.broadcast(&Event::confirmation("Goal set")).await;
    Ok(Json(json!({ "status": "goal set", "goal": position })))
}

#[derive(Debug, Deserialize)]
struct PositionBody {
    x: f64,
    z: f64,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PositionsRequest {
    positions: Vec<PositionBody>,
}

async fn set_obstacle_positions(
    State(state): State<AppState>,
    Json(request): Json<PositionsRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let poses: Vec<Pose> = request
        .positions
        .iter()
        .map(|body| Pose::new(body.x, body.y.unwrap_or(DEFAULT_OBSTACLE_Y), body.z))
        .collect();
    let applied = state.world.lock().await.set_obstacle_positions(&poses)?;
    state
        .hub
        .broadcast(&ViewerCommand::SetObstacles {
            positions: poses.iter().copied().map(Vec3::from).collect(),
        })
        .await;
    Ok(Json(json!({ "status": "obstacles updated", "count": applied })))
}

#[derive(Debug, Deserialize)]
struct MotionRequest {
    enabled: bool,
    speed: Option<f64>,
    bounds: Option<BoundsBody>,
    bounce: Option<bool>,
    velocities: Option<Vec<PlanarVelocity>>,
}

async fn set_obstacle_motion(
    State(state): State<AppState>,
    Json(request): Json<MotionRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let bounds = match request.bounds {
        Some(body) => Some(Bounds::new(body.min_x, body.max_x, body.min_z, body.max_z)?),
        None => None,
    };
    let update = MotionUpdate {
        enabled: request.enabled,
        speed: request.speed,
        bounds,
        bounce: request.bounce,
        velocities: request
            .velocities
            .map(|list| list.into_iter().map(Vector2::from).collect()),
    };
    let config = state.world.lock().await.set_motion(update)?;
    let body = MotionConfigBody::from(config);
    state
        .hub
        .broadcast(&ViewerCommand::SetObstacleMotion {
            config: body.clone(),
        })
        .await;
    state
        .hub
        .broadcast(&Event::confirmation_with_enabled(
            "Obstacle motion updated",
            config.enabled,
        ))
        .await;
    Ok(Json(
        json!({ "status": "obstacle motion updated", "config": body }),
    ))
}

async fn collisions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let count = state.world.lock().await.collisions();
    Json(json!({ "count": count }))
}

/// The world reset commits first; the broadcast outcome only selects the
/// response phrase. Both paths leave the world in the same reset condition.
async fn reset(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.world.lock().await.reset_all();
    let delivered = state.hub.broadcast(&ViewerCommand::Reset).await;
    let status = if delivered > 0 {
        "reset broadcast"
    } else {
        "reset done (no simulators connected)"
    };
    Json(json!({ "status": status, "collisions": 0 }))
}

async fn viewer_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_viewer_socket(socket, state))
}

async fn handle_viewer_socket(socket: WebSocket, state: AppState) {
    let (sender, mut outbound) = mpsc::unbounded_channel::<String>();
    let session: SessionId = state.hub.register(sender).await;
    let (mut sink, mut stream) = socket.split();

    let forward = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => state.hub.handle_inbound(session, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(session, "viewer socket error: {err}");
                break;
            }
        }
    }

    state.hub.unregister(session).await;
    forward.abort();
}
