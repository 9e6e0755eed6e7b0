// Work done when an agent reaches its target.
//
// The movement phase only moves agents; whatever the trip was for happens
// here, serially and in agent id order, because it writes to the grid:
//
// - Rock trips (`Rock`, `MoveToRock`): the rock was removed when it was
//   claimed, so arrival just books it as cleared.
// - `Till`: the cell becomes tilled soil if it is still untouched. Till
//   targets are not claimed, so another agent may have used the cell first;
//   in that case nothing happens.
// - `Plant`: the claimed soil becomes a plant.
// - `Store`: the claimed plant is harvested; the cell is left empty and the
//   agent carries the produce.
// - `MovingToStore`: the produce is deposited.
//
// After the work the agent's label moves to the matching `Perform*` intent
// where one exists, and the agent waits for its next task.
//
// See also: `assignment.rs` which claims the targets, `sim.rs` which calls
// `perform` for each arrival and folds the result into `FarmStats`.

use crate::agent::Agent;
use crate::grid::FarmGrid;
use crate::types::{GridCoord, Intent, ResourceCode};
use serde::{Deserialize, Serialize};

/// What an arrival accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkResult {
    RockCleared,
    Tilled,
    /// The till target was no longer empty.
    TillSkipped,
    Planted,
    /// The claimed soil was replaced before the agent got there.
    PlantSkipped,
    Harvested,
    Stored,
    /// The agent arrived with nothing to do.
    Idle,
}

/// Running totals of finished work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmStats {
    pub rocks_cleared: u64,
    pub tilled: u64,
    pub planted: u64,
    pub harvested: u64,
    pub stored: u64,
    pub misses: u64,
    pub contended: u64,
}

impl FarmStats {
    pub fn record(&mut self, result: WorkResult) {
        match result {
            WorkResult::RockCleared => self.rocks_cleared += 1,
            WorkResult::Tilled => self.tilled += 1,
            WorkResult::Planted => self.planted += 1,
            WorkResult::Harvested => self.harvested += 1,
            WorkResult::Stored => self.stored += 1,
            WorkResult::TillSkipped | WorkResult::PlantSkipped | WorkResult::Idle => {}
        }
    }
}

/// Apply the work for an arrived agent's intent.
pub fn perform(agent: &mut Agent, grid: &mut FarmGrid) -> WorkResult {
    let cell = agent.target_cell.take();
    agent.claimed = None;

    let result = match (agent.intent, cell) {
        (Intent::Rock | Intent::MoveToRock, _) => WorkResult::RockCleared,
        (Intent::Till, Some(cell)) => {
            if place_if_empty(grid, cell, ResourceCode::TilledSoil) {
                WorkResult::Tilled
            } else {
                WorkResult::TillSkipped
            }
        }
        (Intent::Plant, Some(cell)) => {
            if place_if_empty(grid, cell, ResourceCode::Plant) {
                WorkResult::Planted
            } else {
                WorkResult::PlantSkipped
            }
        }
        (Intent::Store, Some(_)) => {
            agent.carrying = true;
            WorkResult::Harvested
        }
        (Intent::MovingToStore, Some(_)) if agent.carrying => {
            agent.carrying = false;
            WorkResult::Stored
        }
        _ => WorkResult::Idle,
    };

    agent.intent = match result {
        WorkResult::Stored => Intent::None,
        WorkResult::TillSkipped | WorkResult::PlantSkipped | WorkResult::Idle => agent.intent,
        _ => agent.intent.performed(),
    };
    result
}

fn place_if_empty(grid: &mut FarmGrid, cell: GridCoord, code: ResourceCode) -> bool {
    grid.matches(cell, ResourceCode::Empty) && grid.try_place(cell, code).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentId, PlanePos};

    fn arrived(intent: Intent, cell: (i32, i32)) -> Agent {
        let cell = GridCoord::new(cell.0, cell.1);
        let mut agent = Agent::spawn(AgentId(0), cell.center(), 2.0);
        agent.intent = intent;
        agent.target_cell = Some(cell);
        agent
    }

    #[test]
    fn rock_trip_books_a_clear() {
        let mut grid = FarmGrid::new(8);
        let mut agent = arrived(Intent::MoveToRock, (2, 2));
        agent.deferred_intent = Some(Intent::Plant);
        assert_eq!(perform(&mut agent, &mut grid), WorkResult::RockCleared);
        assert_eq!(agent.intent, Intent::PerformRock);
        // The deferred task survives for the next assignment.
        assert_eq!(agent.deferred_intent, Some(Intent::Plant));
        assert_eq!(agent.target_cell, None);
    }

    #[test]
    fn till_places_soil_on_empty_ground() {
        let mut grid = FarmGrid::new(8);
        let mut agent = arrived(Intent::Till, (4, 1));
        assert_eq!(perform(&mut agent, &mut grid), WorkResult::Tilled);
        assert_eq!(grid.get(GridCoord::new(4, 1)), ResourceCode::TilledSoil);
        assert_eq!(agent.intent, Intent::PerformTill);
    }

    #[test]
    fn till_skips_used_ground() {
        let mut grid = FarmGrid::new(8);
        grid.try_place(GridCoord::new(4, 1), ResourceCode::TilledSoil).unwrap();
        let mut agent = arrived(Intent::Till, (4, 1));
        assert_eq!(perform(&mut agent, &mut grid), WorkResult::TillSkipped);
        assert_eq!(agent.intent, Intent::Till);
    }

    #[test]
    fn plant_then_harvest_then_store() {
        let mut grid = FarmGrid::new(8);
        let mut stats = FarmStats::default();

        let mut agent = arrived(Intent::Plant, (3, 3));
        stats.record(perform(&mut agent, &mut grid));
        assert_eq!(grid.get(GridCoord::new(3, 3)), ResourceCode::Plant);
        assert_eq!(agent.intent, Intent::PerformPlanting);

        // Harvest: assignment claimed the plant, so the cell is empty now.
        grid.claim(grid.hash(3, 3));
        agent.intent = Intent::Store;
        agent.target_cell = Some(GridCoord::new(3, 3));
        stats.record(perform(&mut agent, &mut grid));
        assert!(agent.carrying);
        assert_eq!(grid.get(GridCoord::new(3, 3)), ResourceCode::Empty);

        agent.intent = Intent::MovingToStore;
        agent.target_cell = Some(GridCoord::new(0, 0));
        stats.record(perform(&mut agent, &mut grid));
        assert!(!agent.carrying);
        assert_eq!(agent.intent, Intent::None);

        assert_eq!(
            stats,
            FarmStats {
                planted: 1,
                harvested: 1,
                stored: 1,
                ..FarmStats::default()
            }
        );
    }

    #[test]
    fn arrival_without_a_task_is_idle() {
        let mut grid = FarmGrid::new(8);
        let mut agent = Agent::spawn(AgentId(2), PlanePos::new(1.0, 1.0), 2.0);
        assert_eq!(perform(&mut agent, &mut grid), WorkResult::Idle);
        assert!(grid.is_empty());
    }
}
