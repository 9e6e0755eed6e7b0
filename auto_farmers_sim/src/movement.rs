// Axis-aligned movement stepper.
//
// Agents move along one axis at a time: first the axis chosen at decision
// time (`choose_first_axis`), then the other. An axis counts as done once
// the integer-truncated remaining delta on it is zero, i.e. the agent is
// within one cell length of the target on that axis. When both axes are
// done the agent has arrived and its tag goes back to `NeedsTask`.
//
// Each step covers `speed * frame_time` along the active axis, clamped to
// the remaining delta so the agent never overshoots. Movement is never
// diagonal: a step changes at most one coordinate.
//
// `step()` is pure: it reads an agent and returns the new position and an
// optional tag transition. The sim's movement phase runs it in parallel and
// applies each outcome to its own agent (`apply`).
//
// See also: `obstacle.rs` which checks the same L-shaped route for rocks,
// `assignment.rs` which stores the first axis on the agent.

use crate::agent::Agent;
use crate::config::AxisPriority;
use crate::types::{Axis, PlanePos, TagTransition, TaskTag};

/// Result of one movement step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub position: PlanePos,
    pub transition: Option<TagTransition>,
}

/// Pick the axis closed first on the way from `position` to `target`.
pub fn choose_first_axis(priority: AxisPriority, position: PlanePos, target: PlanePos) -> Axis {
    match priority {
        AxisPriority::TargetMagnitude => {
            if target.x.abs() < target.z.abs() {
                Axis::X
            } else {
                Axis::Z
            }
        }
        AxisPriority::LargerDelta => {
            if (target.x - position.x).abs() >= (target.z - position.z).abs() {
                Axis::X
            } else {
                Axis::Z
            }
        }
    }
}

/// Advance a moving agent by one frame.
pub fn step(agent: &Agent, frame_time: f32) -> StepOutcome {
    if agent.tag != TaskTag::Moving {
        return StepOutcome {
            position: agent.position,
            transition: None,
        };
    }

    for axis in [agent.first_axis, agent.first_axis.other()] {
        let delta = agent.target.along(axis) - agent.position.along(axis);
        // Truncated delta is non-zero.
        if delta.abs() >= 1.0 {
            let distance = (agent.speed * frame_time).min(delta.abs());
            let moved = agent.position.along(axis) + distance.copysign(delta);
            return StepOutcome {
                position: agent.position.with(axis, moved),
                transition: None,
            };
        }
    }

    StepOutcome {
        position: agent.position,
        transition: Some(TagTransition::Arrived),
    }
}

/// Write a step's result back to its agent. Returns whether it arrived.
pub fn apply(agent: &mut Agent, outcome: &StepOutcome) -> bool {
    agent.position = outcome.position;
    match outcome.transition {
        Some(transition) => {
            agent.tag = transition.apply(agent.tag);
            transition == TagTransition::Arrived
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentId;

    fn moving(from: PlanePos, to: PlanePos, speed: f32, priority: AxisPriority) -> Agent {
        let mut agent = Agent::spawn(AgentId(0), from, speed);
        agent.target = to;
        agent.first_axis = choose_first_axis(priority, from, to);
        agent.tag = TaskTag::Moving;
        agent
    }

    /// Step until arrival, returning the number of steps taken.
    fn run_to_arrival(agent: &mut Agent, frame_time: f32) -> usize {
        for n in 1..10_000 {
            let outcome = step(agent, frame_time);
            if apply(agent, &outcome) {
                return n;
            }
        }
        panic!("agent never arrived");
    }

    #[test]
    fn straight_line_arrival() {
        let mut agent = moving(
            PlanePos::new(1.0, 1.0),
            PlanePos::new(1.0, 4.0),
            2.0,
            AxisPriority::TargetMagnitude,
        );
        let steps = run_to_arrival(&mut agent, 0.5);
        // Three unit steps along z, then the arrival check.
        assert_eq!(steps, 4);
        assert_eq!(agent.position, PlanePos::new(1.0, 4.0));
        assert_eq!(agent.tag, TaskTag::NeedsTask);
    }

    #[test]
    fn arrival_fires_once() {
        let mut agent = moving(
            PlanePos::new(0.5, 0.5),
            PlanePos::new(0.5, 0.5),
            2.0,
            AxisPriority::TargetMagnitude,
        );
        let first = step(&agent, 0.05);
        assert_eq!(first.transition, Some(TagTransition::Arrived));
        assert!(apply(&mut agent, &first));
        for _ in 0..5 {
            let again = step(&agent, 0.05);
            assert_eq!(again.transition, None);
            assert_eq!(again.position, agent.position);
            assert!(!apply(&mut agent, &again));
        }
    }

    #[test]
    fn steps_are_never_diagonal() {
        let mut agent = moving(
            PlanePos::new(0.5, 0.5),
            PlanePos::new(7.5, 3.5),
            2.0,
            AxisPriority::LargerDelta,
        );
        loop {
            let before = agent.position;
            let outcome = step(&agent, 0.05);
            let changed_x = outcome.position.x != before.x;
            let changed_z = outcome.position.z != before.z;
            assert!(!(changed_x && changed_z));
            if apply(&mut agent, &outcome) {
                break;
            }
        }
    }

    #[test]
    fn first_axis_is_closed_before_the_second() {
        let mut agent = moving(
            PlanePos::new(0.5, 0.5),
            PlanePos::new(4.5, 2.5),
            2.0,
            AxisPriority::LargerDelta,
        );
        assert_eq!(agent.first_axis, Axis::X);
        while (agent.target.x - agent.position.x).abs() >= 1.0 {
            let outcome = step(&agent, 0.25);
            assert_eq!(outcome.position.z, 0.5);
            apply(&mut agent, &outcome);
        }
        let outcome = step(&agent, 0.25);
        assert!(outcome.position.z > 0.5);
    }

    #[test]
    fn fast_agent_does_not_overshoot() {
        let mut agent = moving(
            PlanePos::new(0.5, 0.5),
            PlanePos::new(3.5, 0.5),
            100.0,
            AxisPriority::LargerDelta,
        );
        let outcome = step(&agent, 1.0);
        assert_eq!(outcome.position, PlanePos::new(3.5, 0.5));
        apply(&mut agent, &outcome);
        assert_eq!(step(&agent, 1.0).transition, Some(TagTransition::Arrived));
    }

    #[test]
    fn negative_deltas_move_backwards() {
        let agent = moving(
            PlanePos::new(6.5, 6.5),
            PlanePos::new(2.5, 6.5),
            2.0,
            AxisPriority::LargerDelta,
        );
        let outcome = step(&agent, 0.5);
        assert_eq!(outcome.position, PlanePos::new(5.5, 6.5));
    }

    #[test]
    fn idle_agent_does_not_move() {
        let mut agent = Agent::spawn(AgentId(1), PlanePos::new(2.0, 2.0), 2.0);
        agent.target = PlanePos::new(9.0, 9.0);
        let outcome = step(&agent, 0.5);
        assert_eq!(outcome.position, agent.position);
        assert_eq!(outcome.transition, None);
    }

    #[test]
    fn axis_priorities_can_disagree() {
        let from = PlanePos::new(8.5, 0.5);
        let to = PlanePos::new(2.5, 9.5);
        // |2.5| < |9.5| on the raw target, but the z delta is the larger one.
        assert_eq!(choose_first_axis(AxisPriority::TargetMagnitude, from, to), Axis::X);
        assert_eq!(choose_first_axis(AxisPriority::LargerDelta, from, to), Axis::Z);
    }

    #[test]
    fn target_magnitude_ties_go_to_z() {
        let at = PlanePos::new(0.0, 0.0);
        assert_eq!(
            choose_first_axis(AxisPriority::TargetMagnitude, at, PlanePos::new(3.5, 3.5)),
            Axis::Z
        );
    }
}
