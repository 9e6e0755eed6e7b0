// Data-driven farm configuration.
//
// Every tunable the sim reads lives in `FarmConfig`: grid width, search
// radius, movement speed, the random seed, tick duration, and the policy
// switches for the behaviours that have more than one reasonable reading
// (axis priority, till strategy, assignment mode, miss backoff). The sim
// never hardcodes any of these. Field bootstrap parameters are grouped in
// a nested `FieldProfile`, used only by `bootstrap.rs`.
//
// Configs are loaded from JSON (`from_json_str`, `load`). Missing fields
// take their defaults, so a file only has to name what it changes.
// `validate()` runs before a `SimState` is built.
//
// See also: `sim.rs` which owns the config, `assignment.rs` and
// `movement.rs` which read the policy switches.
//
// **Critical constraint: determinism.** Two runs with equal configs and
// equal command streams produce identical state.

use crate::error::ConfigError;
use crate::types::GridCoord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest width whose `x * width + y` key still fits in an `i32`.
pub const MAX_GRID_WIDTH: u32 = 46_340;

/// How the movement stepper orders its two axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisPriority {
    /// Step x first when `|target.x| < |target.z|`, otherwise z first. This
    /// compares the target's raw coordinates, not the remaining deltas.
    TargetMagnitude,
    /// Step along the axis with the larger remaining delta first.
    LargerDelta,
}

/// How a till task finds untouched ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TillStrategy {
    /// Ring search for the nearest cell with no entry.
    EmptinessSearch,
    /// Probe up to `attempts` random cells in the search box, then fall
    /// back to the emptiness ring search.
    RandomProbe { attempts: u32 },
}

/// How the assignment phase schedules its per-agent decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentMode {
    /// Evaluate and commit one agent at a time, in id order.
    Serial,
    /// Evaluate every pending agent in parallel against the grid as it was
    /// at the start of the phase, then commit in id order, re-validating
    /// each claim.
    Deferred,
}

/// Initial field population for the headless runner.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldProfile {
    /// Probability that a cell starts as rock.
    pub rock_density: f64,
    /// Probability that a non-rock cell starts as tilled soil.
    pub tilled_density: f64,
    /// Deposit cells. Placed after the random scatter, overwriting it.
    pub storage_cells: Vec<GridCoord>,
}

impl Default for FieldProfile {
    fn default() -> Self {
        Self {
            rock_density: 0.08,
            tilled_density: 0.02,
            storage_cells: vec![GridCoord::new(0, 0)],
        }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Seed for the sim's `GameRng` (random pool, per-tick start index,
    /// field bootstrap).
    pub seed: u64,
    /// Cells per side of the square grid. Fixed for the life of the sim.
    pub grid_width: u32,
    /// Maximum ring radius for task searches, at most `MAX_GRID_WIDTH`.
    pub search_radius: u32,
    /// Default agent speed in cells per second.
    pub agent_speed: f32,
    /// Simulated milliseconds per tick; the movement frame time.
    pub tick_duration_ms: u32,
    /// Number of pre-generated values in the random pool.
    pub random_pool_size: usize,
    pub axis_priority: AxisPriority,
    pub till_strategy: TillStrategy,
    /// When the drawn task finds nothing, try a till task instead.
    pub till_fallback: bool,
    pub assignment_mode: AssignmentMode,
    /// Cap on the wait after consecutive search misses. 0 retries every tick.
    pub miss_backoff_max_ticks: u32,
    pub field: FieldProfile,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid_width: 100,
            search_radius: 5,
            agent_speed: 2.0,
            tick_duration_ms: 50,
            random_pool_size: 256,
            axis_priority: AxisPriority::TargetMagnitude,
            till_strategy: TillStrategy::EmptinessSearch,
            till_fallback: true,
            assignment_mode: AssignmentMode::Serial,
            miss_backoff_max_ticks: 0,
            field: FieldProfile::default(),
        }
    }
}

impl FarmConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Movement frame time in seconds.
    pub fn frame_time(&self) -> f32 {
        self.tick_duration_ms as f32 / 1000.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_width > MAX_GRID_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "grid_width must be in 1..={MAX_GRID_WIDTH}, got {}",
                self.grid_width
            )));
        }
        if self.search_radius > MAX_GRID_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "search_radius must be at most {MAX_GRID_WIDTH}, got {}",
                self.search_radius
            )));
        }
        if !(self.agent_speed.is_finite() && self.agent_speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "agent_speed must be positive, got {}",
                self.agent_speed
            )));
        }
        if self.tick_duration_ms == 0 {
            return Err(ConfigError::Invalid("tick_duration_ms must be positive".into()));
        }
        if self.random_pool_size == 0 {
            return Err(ConfigError::Invalid("random_pool_size must be positive".into()));
        }
        for (name, p) in [
            ("rock_density", self.field.rock_density),
            ("tilled_density", self.field.tilled_density),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "field.{name} must be in [0, 1], got {p}"
                )));
            }
        }
        let width = self.grid_width as i32;
        if let Some(cell) = self
            .field
            .storage_cells
            .iter()
            .find(|c| c.x < 0 || c.y < 0 || c.x >= width || c.y >= width)
        {
            return Err(ConfigError::Invalid(format!(
                "storage cell {cell} is outside the {width}x{width} grid"
            )));
        }
        Ok(())
    }
}
