// Pre-generated random pool with a per-tick rotating start index.
//
// Agents evaluated in the same tick must not share a stateful generator
// (that would either race or force serial evaluation). Instead the sim
// draws a fixed pool of non-negative integers once at startup and, once
// per tick, a start index. Agent `i` of the tick reads
// `pool[(start + i + k) mod N]` for its k-th draw. The pool is read-only
// after construction; only the start index moves, and it moves on the sim
// thread before the assignment batch fans out.
//
// `TickDraws` is the explicit per-tick value handed to the assignment
// batch; `AgentDraw` is one agent's view of it.
//
// See also: `assignment.rs` which consumes `AgentDraw`, `sim.rs` which
// advances the stream once per tick.
//
// **Critical constraint: determinism.** The pool and the sequence of start
// indices are pure functions of the seed.

use crate::prng::GameRng;

/// Pool size used when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 256;

/// An immutable buffer of non-negative pseudo-random integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomPool {
    values: Vec<u32>,
}

impl RandomPool {
    /// Generate the default-sized pool for `seed`.
    pub fn generate(seed: u64) -> Self {
        Self::from_rng(&mut GameRng::new(seed), DEFAULT_POOL_SIZE)
    }

    /// Fill a pool of `size` values from `rng`. A zero size is bumped to 1.
    pub fn from_rng(rng: &mut GameRng, size: usize) -> Self {
        let values = (0..size.max(1)).map(|_| rng.next_u31()).collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read with wraparound.
    pub fn get(&self, index: usize) -> u32 {
        self.values[index % self.values.len()]
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

/// The pool plus the generator that rotates its start index.
#[derive(Clone, Debug)]
pub struct RandomStream {
    pool: RandomPool,
    rng: GameRng,
    start_index: usize,
}

impl RandomStream {
    /// Seed the generator, fill the pool from it, and keep the generator for
    /// the per-tick start indices.
    pub fn new(seed: u64, pool_size: usize) -> Self {
        let mut rng = GameRng::new(seed);
        let pool = RandomPool::from_rng(&mut rng, pool_size);
        Self {
            pool,
            rng,
            start_index: 0,
        }
    }

    pub fn pool(&self) -> &RandomPool {
        &self.pool
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Draw this tick's start index. One generator call per tick.
    pub fn advance(&mut self) -> usize {
        self.start_index = self.rng.range_usize(0, self.pool.len());
        self.start_index
    }

    /// The current tick's view of the pool.
    pub fn draws(&self) -> TickDraws<'_> {
        TickDraws {
            pool: &self.pool,
            start: self.start_index,
        }
    }

    /// The underlying generator, for one-off seeded work outside the tick
    /// loop (field bootstrap).
    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }
}

/// One tick's rotated view of the pool.
#[derive(Clone, Copy, Debug)]
pub struct TickDraws<'a> {
    pool: &'a RandomPool,
    start: usize,
}

impl<'a> TickDraws<'a> {
    pub fn new(pool: &'a RandomPool, start: usize) -> Self {
        Self { pool, start }
    }

    /// The draw for the `agent_index`-th agent of the batch.
    pub fn for_agent(self, agent_index: usize) -> AgentDraw<'a> {
        AgentDraw {
            pool: self.pool,
            offset: self.start.wrapping_add(agent_index),
        }
    }
}

/// One agent's random values for a tick.
#[derive(Clone, Copy, Debug)]
pub struct AgentDraw<'a> {
    pool: &'a RandomPool,
    offset: usize,
}

impl AgentDraw<'_> {
    /// The agent's primary value.
    pub fn value(self) -> u32 {
        self.pool.get(self.offset)
    }

    /// The `k`-th value after the primary one.
    pub fn nth(self, k: usize) -> u32 {
        self.pool.get(self.offset.wrapping_add(k))
    }
}
