// Narrative events emitted by the simulation.
//
// The farm sim has no internal event queue: every tick runs the same fixed
// phases (commands, movement, work, assignment). What it does emit is a
// stream of `SimEvent`s describing what happened, for a host UI, a log, or
// tests that want to observe decisions without poking at state.
//
// Events are pushed in the order they happen within a tick, and within a
// phase in agent id order, so the stream is as deterministic as the state.
//
// See also: `sim.rs` which pushes these into `StepResult::events`,
// `work.rs` for `WorkResult`.

use crate::types::{AgentId, GridCoord, Intent, PlanePos, ResourceCode};
use crate::work::WorkResult;
use serde::{Deserialize, Serialize};

/// An event emitted by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

/// Types of events the sim reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    AgentSpawned {
        agent_id: AgentId,
        position: PlanePos,
    },
    /// An agent was removed. `released` is the resource put back on the
    /// grid, if it had claimed one.
    AgentDespawned {
        agent_id: AgentId,
        released: Option<GridCoord>,
    },
    /// An agent got a target and started moving.
    TaskAssigned {
        agent_id: AgentId,
        intent: Intent,
        cell: GridCoord,
    },
    /// The route to a task was blocked; the agent goes to clear `rock`
    /// first and `deferred` waits.
    ObstructionDetected {
        agent_id: AgentId,
        rock: GridCoord,
        deferred: Intent,
    },
    /// Nothing matching within the search radius.
    SearchMissed {
        agent_id: AgentId,
        wanted: ResourceCode,
    },
    /// Another agent took the target between evaluation and commit.
    ClaimContended { agent_id: AgentId, cell: GridCoord },
    AgentArrived { agent_id: AgentId, intent: Intent },
    WorkDone {
        agent_id: AgentId,
        cell: Option<GridCoord>,
        result: WorkResult,
    },
    /// A `SpawnAgent` command carried a non-finite position or an unusable
    /// speed. No agent was added and no id was used up.
    SpawnRejected { position: PlanePos, speed: Option<f32> },
    /// A `PlaceResource` command named a cell outside the grid.
    PlacementRejected { cell: GridCoord },
}
