// Seeded initial field population.
//
// A fresh grid is all empty ground. `populate_field` scatters rocks and
// tilled soil over it from a `FieldProfile` and then places the storage
// cells, so the headless runner and the integration tests start from a
// farm with something to do. Hosts that lay out their own field use
// `PlaceResource` commands instead and never call this.
//
// Cells are visited in x-major, y-minor order with one or two generator
// draws each, so the same seed and profile always give the same field.
//
// See also: `config.rs` for `FieldProfile`, `sim.rs` for
// `SimState::populate_field`.

use crate::config::FieldProfile;
use crate::grid::FarmGrid;
use crate::prng::GameRng;
use crate::types::{GridCoord, ResourceCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Counts of what was placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub rocks: usize,
    pub tilled: usize,
    pub storage: usize,
}

pub fn populate_field(grid: &mut FarmGrid, profile: &FieldProfile, rng: &mut GameRng) -> FieldSummary {
    let mut summary = FieldSummary::default();
    let width = grid.width() as i32;

    for x in 0..width {
        for y in 0..width {
            let code = if rng.random_bool(profile.rock_density) {
                ResourceCode::Rock
            } else if rng.random_bool(profile.tilled_density) {
                ResourceCode::TilledSoil
            } else {
                continue;
            };
            // In range by construction.
            if grid.try_place(GridCoord::new(x, y), code).is_ok() {
                match code {
                    ResourceCode::Rock => summary.rocks += 1,
                    _ => summary.tilled += 1,
                }
            }
        }
    }

    for &cell in &profile.storage_cells {
        let replaced = grid.get(cell);
        match grid.try_place(cell, ResourceCode::Storage) {
            Ok(()) => match replaced {
                ResourceCode::Storage => {}
                ResourceCode::Rock => {
                    summary.rocks -= 1;
                    summary.storage += 1;
                }
                ResourceCode::TilledSoil => {
                    summary.tilled -= 1;
                    summary.storage += 1;
                }
                _ => summary.storage += 1,
            },
            Err(err) => warn!(%err, "skipping storage cell"),
        }
    }

    summary
}
