// Farming agent entity.
//
// An agent is a position on the plane plus the state the two per-tick
// phases hand back and forth: the assignment phase fills in target, intent
// and first axis and moves the tag to `Moving`; the movement phase closes
// the distance and moves the tag back to `NeedsTask` on arrival. Only those
// two phases (and the work applied on arrival) mutate an agent.
//
// `claimed` remembers the resource taken from the grid at assignment so a
// despawned agent can release it.
//
// See also: `assignment.rs`, `movement.rs`, `work.rs`, `sim.rs` which owns
// agents in a `BTreeMap<AgentId, Agent>`.

use crate::types::{AgentId, Axis, GridCoord, Intent, PlanePos, ResourceCode, TaskTag};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: PlanePos,
    /// Position when the current target was assigned.
    pub start: PlanePos,
    pub target: PlanePos,
    /// The cell the current target is the centre of.
    pub target_cell: Option<GridCoord>,
    /// Cells per second.
    pub speed: f32,
    pub intent: Intent,
    /// Task put on hold while a blocking rock is cleared.
    pub deferred_intent: Option<Intent>,
    pub tag: TaskTag,
    /// Axis closed first on the way to `target`, fixed at decision time.
    pub first_axis: Axis,
    /// Resource removed from the grid for the current task.
    pub claimed: Option<(GridCoord, ResourceCode)>,
    /// Holding harvested produce that has not reached storage yet.
    pub carrying: bool,
    pub consecutive_misses: u32,
    /// Not evaluated for a task before this tick.
    pub retry_at_tick: u64,
}

impl Agent {
    /// A freshly spawned agent, waiting for its first task.
    pub fn spawn(id: AgentId, position: PlanePos, speed: f32) -> Self {
        Self {
            id,
            position,
            start: position,
            target: position,
            target_cell: None,
            speed,
            intent: Intent::None,
            deferred_intent: None,
            tag: TaskTag::NeedsTask,
            first_axis: Axis::X,
            claimed: None,
            carrying: false,
            consecutive_misses: 0,
            retry_at_tick: 0,
        }
    }

    /// The grid cell the agent stands in.
    pub fn cell(&self) -> GridCoord {
        GridCoord::containing(self.position)
    }

    /// Whether the assignment phase should evaluate this agent at `tick`.
    pub fn is_pending(&self, tick: u64) -> bool {
        self.tag == TaskTag::NeedsTask && self.retry_at_tick <= tick
    }

    /// Book a failed search or lost claim. With a positive `backoff_cap`
    /// the agent sits out `min(misses, backoff_cap)` ticks.
    pub fn record_miss(&mut self, tick: u64, backoff_cap: u32) {
        self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        self.deferred_intent = None;
        self.retry_at_tick = if backoff_cap == 0 {
            tick + 1
        } else {
            tick + u64::from(self.consecutive_misses.min(backoff_cap)) + 1
        };
    }
}
