// Core simulation state and tick loop.
//
// `SimState` owns everything the farm is: the grid, the agents, the random
// stream, the config and the running totals. The sim is a function
// `(state, commands) -> (new_state, events)`; `step()` applies host commands
// and advances one tick at a time up to a target tick.
//
// ## Tick phases
//
// Every tick runs the same four phases, in order, never interleaved:
//
//   1. Commands scheduled for this tick, in slice order.
//   2. Movement: every `Moving` agent takes one step (`movement::step`). The
//      agents are independent here (each writes only its own position and
//      tag), so the phase fans out with rayon. Arrivals are collected and
//      sorted by id.
//   3. Work: each arrival's work is applied (`work::perform`), serially in
//      id order, since it writes to the grid.
//   4. Assignment: the random stream draws this tick's start index once,
//      then every pending agent (`NeedsTask`, not backing off) gets a
//      decision. The agent's index into the tick draws is its position in
//      the pending batch.
//
// ## Assignment modes
//
// `Serial` evaluates and commits one agent at a time in id order, so each
// agent sees the claims made by the agents before it. `Deferred` evaluates
// the whole batch in parallel against the grid as it stood when the phase
// began, then commits in id order. Commit re-validates each target, so two
// agents that picked the same cell never both get it: the later one is
// reported as contended and treated as a miss.
//
// Misses (including contention) bump the agent's miss counter; with
// `miss_backoff_max_ticks > 0` the agent then sits out a few ticks.
//
// See also: `assignment.rs` for `evaluate`/`commit`, `movement.rs` for the
// stepper, `work.rs` for arrival effects, `command.rs` for `SimCommand`,
// `event.rs` for `SimEvent`, `config.rs` for `FarmConfig`.
//
// **Critical constraint: determinism.** All randomness comes from the
// seeded `RandomStream`. Agents live in a `BTreeMap` and every serial phase
// walks them in id order; the parallel phases only compute per-agent
// results that are applied in id order.

use crate::agent::Agent;
use crate::assignment::{self, CommitOutcome, Decision};
use crate::bootstrap::{self, FieldSummary};
use crate::command::{SimAction, SimCommand};
use crate::config::{AssignmentMode, FarmConfig};
use crate::error::{ConfigError, SpawnError};
use crate::event::{SimEvent, SimEventKind};
use crate::grid::FarmGrid;
use crate::movement;
use crate::random_pool::RandomStream;
use crate::types::{AgentId, GridCoord, Intent, PlanePos, ResourceCode};
use crate::work::{self, FarmStats};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Top-level simulation state.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Current simulation tick.
    pub tick: u64,
    pub config: FarmConfig,
    pub stream: RandomStream,
    pub grid: FarmGrid,
    pub agents: BTreeMap<AgentId, Agent>,
    next_agent_id: u32,
    pub stats: FarmStats,
}

/// The result of processing commands and advancing the simulation.
pub struct StepResult {
    /// Events emitted during this step, in order.
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Create a new simulation with default config and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::build(FarmConfig {
            seed,
            ..FarmConfig::default()
        })
    }

    /// Create a new simulation from a config, rejecting invalid ones.
    pub fn with_config(config: FarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FarmConfig) -> Self {
        let stream = RandomStream::new(config.seed, config.random_pool_size);
        let grid = FarmGrid::new(config.grid_width);
        debug!(
            seed = config.seed,
            width = config.grid_width,
            pool = config.random_pool_size,
            "sim created"
        );
        Self {
            tick: 0,
            config,
            stream,
            grid,
            agents: BTreeMap::new(),
            next_agent_id: 0,
            stats: FarmStats::default(),
        }
    }

    /// Scatter the configured field over the grid. Draws from the sim's
    /// generator, so call it before the first `step()` for reproducible runs.
    pub fn populate_field(&mut self) -> FieldSummary {
        let summary =
            bootstrap::populate_field(&mut self.grid, &self.config.field, self.stream.rng_mut());
        info!(
            rocks = summary.rocks,
            tilled = summary.tilled,
            storage = summary.storage,
            "field populated"
        );
        summary
    }

    /// Add an agent directly, outside the command stream. Returns its id.
    ///
    /// The position must be finite and a speed override must be positive and
    /// finite, the same rule `FarmConfig::validate` applies to the default.
    pub fn spawn_agent(
        &mut self,
        position: PlanePos,
        speed: Option<f32>,
    ) -> Result<AgentId, SpawnError> {
        if !(position.x.is_finite() && position.z.is_finite()) {
            return Err(SpawnError::NonFinitePosition(position));
        }
        let speed = speed.unwrap_or(self.config.agent_speed);
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SpawnError::InvalidSpeed(speed));
        }
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        self.agents.insert(id, Agent::spawn(id, position, speed));
        debug!(agent = %id, x = position.x, z = position.z, speed, "agent spawned");
        Ok(id)
    }

    /// Apply a batch of commands and advance the sim to the target tick.
    ///
    /// Commands must be sorted by tick. Commands with tick > `target_tick`
    /// are ignored (caller error). Commands for a tick already passed apply
    /// at the next tick run.
    pub fn step(&mut self, commands: &[SimCommand], target_tick: u64) -> StepResult {
        let mut events = Vec::new();
        let mut cmd_idx = 0;

        while self.tick < target_tick {
            self.tick += 1;

            while cmd_idx < commands.len() && commands[cmd_idx].tick <= self.tick {
                let cmd = &commands[cmd_idx];
                cmd_idx += 1;
                self.apply_command(cmd, &mut events);
            }

            self.run_tick(&mut events);
        }

        StepResult { events }
    }

    fn run_tick(&mut self, events: &mut Vec<SimEvent>) {
        let arrivals = self.movement_phase();
        self.work_phase(&arrivals, events);
        self.assignment_phase(events);
        trace!(tick = self.tick, arrivals = arrivals.len(), "tick done");
    }

    /// Apply a single command to the simulation.
    fn apply_command(&mut self, cmd: &SimCommand, events: &mut Vec<SimEvent>) {
        match &cmd.action {
            SimAction::SpawnAgent { position, speed } => match self.spawn_agent(*position, *speed) {
                Ok(agent_id) => self.emit(
                    events,
                    SimEventKind::AgentSpawned {
                        agent_id,
                        position: *position,
                    },
                ),
                Err(err) => {
                    warn!(%err, "spawn rejected");
                    self.emit(
                        events,
                        SimEventKind::SpawnRejected {
                            position: *position,
                            speed: *speed,
                        },
                    );
                }
            },
            SimAction::DespawnAgent { agent_id } => self.despawn_agent(*agent_id, events),
            SimAction::PlaceResource { cell, code } => self.place_resource(*cell, *code, events),
            SimAction::ClearCell { cell } => {
                self.place_resource(*cell, ResourceCode::Empty, events);
            }
        }
    }

    /// Remove an agent. A resource it claimed but never worked goes back on
    /// the grid if its cell is still empty. Silent no-op for unknown ids.
    fn despawn_agent(&mut self, agent_id: AgentId, events: &mut Vec<SimEvent>) {
        let Some(agent) = self.agents.remove(&agent_id) else {
            return;
        };
        let released = agent.claimed.and_then(|(cell, code)| {
            let free = self.grid.matches(cell, ResourceCode::Empty);
            (free && self.grid.try_place(cell, code).is_ok()).then_some(cell)
        });
        debug!(agent = %agent_id, ?released, "agent despawned");
        self.emit(events, SimEventKind::AgentDespawned { agent_id, released });
    }

    fn place_resource(&mut self, cell: GridCoord, code: ResourceCode, events: &mut Vec<SimEvent>) {
        if let Err(err) = self.grid.try_place(cell, code) {
            warn!(%err, "placement rejected");
            self.emit(events, SimEventKind::PlacementRejected { cell });
        }
    }

    /// One step for every moving agent. Returns the ids that arrived, sorted.
    fn movement_phase(&mut self) -> Vec<AgentId> {
        let frame_time = self.config.frame_time();
        let mut arrivals: Vec<AgentId> = self
            .agents
            .par_iter_mut()
            .filter_map(|(&id, agent)| {
                let outcome = movement::step(agent, frame_time);
                movement::apply(agent, &outcome).then_some(id)
            })
            .collect();
        arrivals.sort_unstable();
        arrivals
    }

    fn work_phase(&mut self, arrivals: &[AgentId], events: &mut Vec<SimEvent>) {
        let tick = self.tick;
        for &agent_id in arrivals {
            let Some(agent) = self.agents.get_mut(&agent_id) else {
                continue;
            };
            let intent = agent.intent;
            let cell = agent.target_cell;
            let result = work::perform(agent, &mut self.grid);
            self.stats.record(result);
            debug!(agent = %agent_id, ?intent, ?result, "arrived");
            events.push(SimEvent {
                tick,
                kind: SimEventKind::AgentArrived { agent_id, intent },
            });
            events.push(SimEvent {
                tick,
                kind: SimEventKind::WorkDone {
                    agent_id,
                    cell,
                    result,
                },
            });
        }
    }

    fn assignment_phase(&mut self, events: &mut Vec<SimEvent>) {
        self.stream.advance();

        let tick = self.tick;
        let pending: Vec<AgentId> = self
            .agents
            .values()
            .filter(|a| a.is_pending(tick))
            .map(|a| a.id)
            .collect();
        if pending.is_empty() {
            return;
        }

        match self.config.assignment_mode {
            AssignmentMode::Serial => {
                for (index, agent_id) in pending.iter().enumerate() {
                    let Some(agent) = self.agents.get(agent_id) else {
                        continue;
                    };
                    let draw = self.stream.draws().for_agent(index);
                    let decision = assignment::evaluate(agent, &self.grid, draw, &self.config);
                    self.commit_decision(*agent_id, &decision, events);
                }
            }
            AssignmentMode::Deferred => {
                let draws = self.stream.draws();
                let agents = &self.agents;
                let grid = &self.grid;
                let config = &self.config;
                let decisions: Vec<(AgentId, Decision)> = pending
                    .par_iter()
                    .enumerate()
                    .filter_map(|(index, agent_id)| {
                        let agent = agents.get(agent_id)?;
                        let draw = draws.for_agent(index);
                        Some((*agent_id, assignment::evaluate(agent, grid, draw, config)))
                    })
                    .collect();
                for (agent_id, decision) in &decisions {
                    self.commit_decision(*agent_id, decision, events);
                }
            }
        }
    }

    fn commit_decision(&mut self, agent_id: AgentId, decision: &Decision, events: &mut Vec<SimEvent>) {
        let tick = self.tick;
        let backoff_cap = self.config.miss_backoff_max_ticks;
        let Some(agent) = self.agents.get_mut(&agent_id) else {
            return;
        };

        let kind = match assignment::commit(decision, agent, &mut self.grid) {
            CommitOutcome::Assigned(a) => {
                debug!(agent = %agent_id, intent = ?a.intent, cell = %a.cell, "task assigned");
                match (a.intent, a.deferred_intent) {
                    (Intent::MoveToRock, Some(deferred)) => SimEventKind::ObstructionDetected {
                        agent_id,
                        rock: a.cell,
                        deferred,
                    },
                    _ => SimEventKind::TaskAssigned {
                        agent_id,
                        intent: a.intent,
                        cell: a.cell,
                    },
                }
            }
            CommitOutcome::Contended { cell, .. } => {
                agent.record_miss(tick, backoff_cap);
                self.stats.contended += 1;
                debug!(agent = %agent_id, %cell, "claim contended");
                SimEventKind::ClaimContended { agent_id, cell }
            }
            CommitOutcome::Missed { wanted } => {
                agent.record_miss(tick, backoff_cap);
                self.stats.misses += 1;
                trace!(agent = %agent_id, ?wanted, "search missed");
                SimEventKind::SearchMissed { agent_id, wanted }
            }
        };
        events.push(SimEvent { tick, kind });
    }

    fn emit(&self, events: &mut Vec<SimEvent>, kind: SimEventKind) {
        events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }
}
