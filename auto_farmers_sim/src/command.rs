// Commands that mutate simulation state from outside.
//
// All host-side changes to the farm go through `SimCommand`: spawning and
// despawning agents, and editing grid cells (seeding rocks, soil, storage,
// or clearing a cell). The sim is a function
// `(state, commands) -> (new_state, events)` and commands are its only
// external input.
//
// A `SimCommand` carries the `tick` it applies at and a `SimAction`.
// Current actions:
// - `SpawnAgent`: add an agent at a plane position, waiting for a task.
//   `speed: None` takes `FarmConfig::agent_speed`. A non-finite position or
//   a speed that is not positive and finite is rejected with a
//   `SpawnRejected` event.
// - `DespawnAgent`: remove an agent, releasing any resource it had claimed.
// - `PlaceResource`: set a cell's resource code. Out-of-bounds cells are
//   rejected with a `PlacementRejected` event.
// - `ClearCell`: remove a cell's entry.
//
// See also: `sim.rs` for `apply_command()` which dispatches these,
// `event.rs` for the events they emit.
//
// **Critical constraint: determinism.** Commands are applied in slice order
// at the start of their tick, before any phase runs.

use crate::types::{AgentId, GridCoord, PlanePos, ResourceCode};
use serde::{Deserialize, Serialize};

/// A host-issued command targeting a specific simulation tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimCommand {
    pub tick: u64,
    pub action: SimAction,
}

/// The specific action a command performs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SimAction {
    /// Add an agent. IDs are handed out in spawn order.
    SpawnAgent {
        position: PlanePos,
        speed: Option<f32>,
    },
    /// Remove an agent. No-op for an unknown id.
    DespawnAgent { agent_id: AgentId },
    /// Put a resource in a cell. `Empty` clears it.
    PlaceResource { cell: GridCoord, code: ResourceCode },
    ClearCell { cell: GridCoord },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serialization_roundtrip() {
        let cmd = SimCommand {
            tick: 12,
            action: SimAction::PlaceResource {
                cell: GridCoord::new(4, 9),
                code: ResourceCode::Storage,
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: SimCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.tick, 12);
        match restored.action {
            SimAction::PlaceResource { cell, code } => {
                assert_eq!(cell, GridCoord::new(4, 9));
                assert_eq!(code, ResourceCode::Storage);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn spawn_speed_is_optional_in_json() {
        let json = r#"{ "tick": 1, "action": { "SpawnAgent": { "position": { "x": 1.5, "z": 2.5 }, "speed": null } } }"#;
        let cmd: SimCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(
            cmd.action,
            SimAction::SpawnAgent { speed: None, .. }
        ));
    }
}
