//! Simulation clock: a fixed-rate tick task that advances the world and
//! broadcasts the resulting events plus a full state snapshot.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::gateway::AppState;
use crate::protocol::Event;

pub const TICK_RATE_HZ: u64 = 20;

/// Spawn the tick loop. The world lock is held only while stepping; the
/// broadcasts run after release so a slow viewer channel cannot stall
/// command handlers.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state))
}

async fn run(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_millis(1000 / TICK_RATE_HZ));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let (events, snapshot) = {
            let mut world = state.world.lock().await;
            let events = world.tick();
            (events, Event::state_of(&world))
        };

        for event in events {
            let event = Event::from(event);
            debug!(?event, "simulation event");
            state.hub.broadcast(&event).await;
        }
        state.hub.broadcast(&snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::Pose;
    use crate::world::WorldConfig;

    #[tokio::test]
    async fn test_tick_loop_broadcasts_state_snapshots() {
        let state = AppState::new(WorldConfig::default());
        state
            .world
            .lock()
            .await
            .set_obstacle_positions(&[
                Pose::new(40.0, 2.0, 40.0),
                Pose::new(-40.0, 2.0, 40.0),
                Pose::new(40.0, 2.0, -40.0),
                Pose::new(-40.0, 2.0, -40.0),
            ])
            .unwrap();
        let (sender, mut viewer) = mpsc::unbounded_channel();
        state.hub.register(sender).await;

        let task = spawn(state.clone());
        let snapshot: Value =
            serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
        task.abort();

        assert_eq!(snapshot["type"], "state");
        assert_eq!(snapshot["robot"]["status"], "normal");
        assert_eq!(snapshot["obstacles"].as_array().unwrap().len(), 4);
        assert_eq!(snapshot["collisions"], 0);
    }

    #[tokio::test]
    async fn test_tick_loop_broadcasts_collision_before_snapshot() {
        let state = AppState::new(WorldConfig::default());
        {
            let mut world = state.world.lock().await;
            world
                .set_obstacle_positions(&[Pose::new(2.0, 2.0, -3.0)])
                .unwrap();
            world.set_robot_target(1.5, -3.2).unwrap();
        }
        let (sender, mut viewer) = mpsc::unbounded_channel();
        state.hub.register(sender).await;

        let task = spawn(state.clone());
        let first: Value = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
        let second: Value = serde_json::from_str(&viewer.recv().await.unwrap()).unwrap();
        task.abort();

        assert_eq!(first["type"], "collision");
        assert_eq!(first["collision"], true);
        assert_eq!(second["type"], "state");
        assert_eq!(second["robot"]["status"], "collided");
        assert_eq!(second["collisions"], 1);
    }
}
