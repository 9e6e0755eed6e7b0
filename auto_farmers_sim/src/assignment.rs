// Task assignment: draw, search, obstruction check, claim.
//
// One decision per idle agent per tick, split into a pure half and a
// mutating half so the sim can run the pure half in parallel:
//
// - `evaluate()` reads the agent, the grid and the agent's random draw and
//   returns a `Decision`. It picks the task rule from the draw (or resumes a
//   deferred task, or heads for storage when carrying produce), ring-searches
//   for the rule's resource, and checks the L route to the hit for rocks. A
//   blocked route turns into a trip to clear the first rock.
// - `commit()` applies a decision to the agent and the grid in one step:
//   re-validates the target, claims it when the rule claims, and moves the
//   tag to `Moving`. A target that no longer holds what the decision
//   expected is reported as contended and changes nothing.
//
// The task table (`TASK_RULES`, `TILL_RULE`, `DELIVERY_RULE`) is the only
// place intents are joined to resource codes.
//
// See also: `grid.rs` (search, claim), `obstacle.rs` (route check),
// `random_pool.rs` (`AgentDraw`), `sim.rs` which schedules evaluation and
// commit per `AssignmentMode`.
//
// **Critical constraint: determinism.** `evaluate` depends only on its
// arguments, so serial and parallel evaluation produce the same decisions
// for the same grid snapshot.

use crate::agent::Agent;
use crate::config::{FarmConfig, TillStrategy};
use crate::grid::FarmGrid;
use crate::movement::choose_first_axis;
use crate::obstacle::{bend_point, find_obstruction};
use crate::random_pool::AgentDraw;
use crate::types::{Axis, GridCoord, Intent, PlanePos, ResourceCode, TagTransition};

/// One row of the task table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskRule {
    pub intent: Intent,
    /// Resource the task searches for.
    pub wanted: ResourceCode,
    /// Whether assignment removes the found resource from the grid.
    pub claims: bool,
}

/// Rules selected by the drawn task value 1, 2, 3.
pub const TASK_RULES: [TaskRule; 3] = [
    TaskRule {
        intent: Intent::Rock,
        wanted: ResourceCode::Rock,
        claims: true,
    },
    TaskRule {
        intent: Intent::Plant,
        wanted: ResourceCode::TilledSoil,
        claims: true,
    },
    TaskRule {
        intent: Intent::Store,
        wanted: ResourceCode::Plant,
        claims: true,
    },
];

/// Fallback when the drawn task finds nothing.
pub const TILL_RULE: TaskRule = TaskRule {
    intent: Intent::Till,
    wanted: ResourceCode::Empty,
    claims: false,
};

/// Taking harvested produce to a storage cell. Storage is shared, never
/// claimed.
pub const DELIVERY_RULE: TaskRule = TaskRule {
    intent: Intent::MovingToStore,
    wanted: ResourceCode::Storage,
    claims: false,
};

/// Map a pool value to a task value in `1..=3`.
pub fn task_value(draw: u32) -> u32 {
    draw % 3 + 1
}

/// The rule for a task value in `1..=3`.
pub fn rule_for_value(value: u32) -> TaskRule {
    TASK_RULES[((value + 2) % 3) as usize]
}

/// The rule that assigns `intent`, if any.
pub fn rule_for_intent(intent: Intent) -> Option<TaskRule> {
    TASK_RULES
        .iter()
        .chain([&TILL_RULE, &DELIVERY_RULE])
        .find(|rule| rule.intent == intent)
        .copied()
}

/// A target picked for an agent, not yet applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Assignment {
    pub intent: Intent,
    pub cell: GridCoord,
    pub target: PlanePos,
    pub first_axis: Axis,
    /// What `cell` must still hold at commit time.
    pub expected: ResourceCode,
    pub claims: bool,
    /// The task waiting behind a rock-clearing trip.
    pub deferred_intent: Option<Intent>,
}

/// Outcome of evaluating one agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    Assign(Assignment),
    /// Nothing matching within the search radius.
    Miss { wanted: ResourceCode },
}

/// Outcome of committing a decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommitOutcome {
    Assigned(Assignment),
    /// The target changed between evaluation and commit.
    Contended { cell: GridCoord, expected: ResourceCode },
    Missed { wanted: ResourceCode },
}

/// Decide an idle agent's next task. Reads only.
pub fn evaluate(agent: &Agent, grid: &FarmGrid, draw: AgentDraw<'_>, config: &FarmConfig) -> Decision {
    let origin = agent.cell();
    let radius = config.search_radius;

    let delivery = agent
        .carrying
        .then(|| grid.search(origin, radius, DELIVERY_RULE.wanted))
        .flatten();
    if let Some(cell) = delivery {
        return plan(agent, grid, DELIVERY_RULE, cell, config);
    }

    let rule = agent
        .deferred_intent
        .and_then(rule_for_intent)
        .unwrap_or_else(|| rule_for_value(task_value(draw.value())));

    if let Some(cell) = find_target(grid, origin, rule, draw, config) {
        return plan(agent, grid, rule, cell, config);
    }
    let fallback = (config.till_fallback && rule.intent != Intent::Till)
        .then(|| find_target(grid, origin, TILL_RULE, draw, config))
        .flatten();
    if let Some(cell) = fallback {
        return plan(agent, grid, TILL_RULE, cell, config);
    }
    Decision::Miss { wanted: rule.wanted }
}

fn find_target(
    grid: &FarmGrid,
    origin: GridCoord,
    rule: TaskRule,
    draw: AgentDraw<'_>,
    config: &FarmConfig,
) -> Option<GridCoord> {
    let radius = config.search_radius;
    match (rule.wanted, config.till_strategy) {
        (ResourceCode::Empty, TillStrategy::RandomProbe { attempts }) => {
            probe_for_empty(grid, origin, radius, draw, attempts)
                .or_else(|| grid.search(origin, radius, ResourceCode::Empty))
        }
        (wanted, _) => grid.search(origin, radius, wanted),
    }
}

/// Try up to `attempts` random cells in the radius box around `origin`.
/// Probe `k` reads draws `2k + 1` and `2k + 2` for its x and y offsets.
fn probe_for_empty(
    grid: &FarmGrid,
    origin: GridCoord,
    radius: u32,
    draw: AgentDraw<'_>,
    attempts: u32,
) -> Option<GridCoord> {
    let radius = i64::from(radius);
    let span = 2 * radius + 1;
    let last = i64::from(grid.width()) - 1;
    let offset = |n: usize| i64::from(draw.nth(n)) % span - radius;
    (0..attempts as usize).find_map(|k| {
        let x = (i64::from(origin.x) + offset(2 * k + 1)).clamp(0, last);
        let y = (i64::from(origin.y) + offset(2 * k + 2)).clamp(0, last);
        // Both lie in [0, width), and the width fits an i32.
        let cell = GridCoord::new(x as i32, y as i32);
        grid.matches(cell, ResourceCode::Empty).then_some(cell)
    })
}

/// Turn a search hit into a decision, diverting to the first rock on the
/// route if there is one.
fn plan(agent: &Agent, grid: &FarmGrid, rule: TaskRule, cell: GridCoord, config: &FarmConfig) -> Decision {
    let start = agent.cell();
    let first_axis = choose_first_axis(config.axis_priority, agent.position, cell.center());
    let midpoint = bend_point(start, cell, first_axis);

    // The rock is on the same route, so the leg to it keeps the axis order.
    let assignment = match find_obstruction(grid, start, midpoint, cell) {
        Some(rock) => Assignment {
            intent: Intent::MoveToRock,
            cell: rock,
            target: rock.center(),
            first_axis,
            expected: ResourceCode::Rock,
            claims: true,
            deferred_intent: Some(rule.intent),
        },
        None => Assignment {
            intent: rule.intent,
            cell,
            target: cell.center(),
            first_axis,
            expected: rule.wanted,
            claims: rule.claims,
            deferred_intent: None,
        },
    };
    Decision::Assign(assignment)
}

/// Apply a decision: re-validate, claim, and start the agent moving.
pub fn commit(decision: &Decision, agent: &mut Agent, grid: &mut FarmGrid) -> CommitOutcome {
    let a = match *decision {
        Decision::Miss { wanted } => return CommitOutcome::Missed { wanted },
        Decision::Assign(a) => a,
    };

    if !grid.matches(a.cell, a.expected) {
        return CommitOutcome::Contended {
            cell: a.cell,
            expected: a.expected,
        };
    }
    agent.claimed = if a.claims {
        grid.claim(grid.key(a.cell)).map(|code| (a.cell, code))
    } else {
        None
    };

    agent.start = agent.position;
    agent.target = a.target;
    agent.target_cell = Some(a.cell);
    agent.first_axis = a.first_axis;
    agent.intent = a.intent;
    agent.deferred_intent = a.deferred_intent;
    agent.consecutive_misses = 0;
    agent.tag = TagTransition::StartMoving.apply(agent.tag);
    CommitOutcome::Assigned(a)
}
