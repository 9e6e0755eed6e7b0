// auto_farmers_sim, a pure Rust farming-agent simulation library.
//
// This crate contains the simulation core for AutoFarmers: autonomous
// agents repeatedly pick a task, find a matching resource cell on a shared
// grid, walk to it around rocks, and do the work. It has no rendering or
// engine dependencies and can be tested, benchmarked, and run headless
// (`farm_headless`, see `main.rs`).
//
// Module overview:
// - `sim.rs`:         Top-level SimState, tick loop, phases, command processing.
// - `grid.rs`:        Sparse cell-key -> resource-code index with ring search and claims.
// - `random_pool.rs`: Pre-generated random pool with a per-tick rotating start index.
// - `assignment.rs`:  Task table plus the evaluate/commit assignment state machine.
// - `obstacle.rs`:    First-rock detection along an L-shaped route.
// - `movement.rs`:    Axis-at-a-time movement stepper.
// - `agent.rs`:       The Agent entity.
// - `work.rs`:        Arrival effects and FarmStats.
// - `bootstrap.rs`:   Seeded initial field population.
// - `command.rs`:     SimCommand / SimAction: all host mutations.
// - `event.rs`:       Narrative SimEvents.
// - `config.rs`:      FarmConfig + FieldProfile: all tunables and policy switches.
// - `error.rs`:       ConfigError and GridError.
// - `prng`:           Re-exported from `auto_farmers_prng`: xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:       GridCoord, PlanePos, ResourceCode, Intent, TaskTag, AgentId.
//
// **Critical constraint: determinism.** The simulation is a pure function:
// `(state, commands) -> (new_state, events)`. All randomness comes from a
// seeded xoshiro256++ PRNG (re-exported from `auto_farmers_prng`). The grid
// map uses `FxHashMap` and is only ever read by point lookups; agents live
// in a `BTreeMap`. Parallel phases compute per-agent results that are
// applied in agent id order.

pub mod agent;
pub mod assignment;
pub mod bootstrap;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod movement;
pub mod obstacle;
pub use auto_farmers_prng as prng;
pub mod random_pool;
pub mod sim;
pub mod types;
pub mod work;
