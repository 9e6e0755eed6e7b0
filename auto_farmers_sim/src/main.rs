// CLI entry point for a headless AutoFarmers run.
//
// Builds a sim from a config (file or defaults), scatters the initial
// field, spawns a row of agents through the command stream, runs a fixed
// number of ticks and prints the farm totals as JSON. Useful for checking
// determinism by hand (same flags, same output) and for profiling the tick
// loop without a host.
//
// Usage:
//   farm_headless [OPTIONS]
//     --config <PATH>   JSON FarmConfig (default: built-in defaults)
//     --ticks <N>       Ticks to run (default: 2000)
//     --agents <N>      Agents to spawn at tick 1 (default: 16)
//     --seed <N>        Override the config seed
//
// Logging goes through `tracing`; set `RUST_LOG=auto_farmers_sim=debug` for
// per-decision output.

use auto_farmers_sim::command::{SimAction, SimCommand};
use auto_farmers_sim::config::FarmConfig;
use auto_farmers_sim::sim::SimState;
use auto_farmers_sim::types::{GridCoord, PlanePos};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct RunArgs {
    config: Option<PathBuf>,
    ticks: u64,
    agents: u32,
    seed: Option<u64>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: None,
            ticks: 2000,
            agents: 16,
            seed: None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = parse_args();
    let mut config = match &args.config {
        Some(path) => FarmConfig::load(path)?,
        None => FarmConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    info!(
        seed = config.seed,
        width = config.grid_width,
        radius = config.search_radius,
        mode = ?config.assignment_mode,
        "configuration loaded"
    );

    let mut sim = SimState::with_config(config)?;
    sim.populate_field();

    let commands = spawn_row(sim.grid.width(), args.agents);
    let result = sim.step(&commands, args.ticks);
    info!(ticks = sim.tick, events = result.events.len(), "run finished");

    println!("{}", serde_json::to_string_pretty(&sim.stats)?);
    Ok(())
}

/// One spawn command per agent, spread along the grid diagonal.
fn spawn_row(width: u32, agents: u32) -> Vec<SimCommand> {
    let width = width as i32;
    (0..agents as i32)
        .map(|i| {
            let cell = GridCoord::new((i * 7) % width, (i * 13) % width);
            SimCommand {
                tick: 1,
                action: SimAction::SpawnAgent {
                    position: PlanePos::new(cell.x as f32 + 0.25, cell.y as f32 + 0.25),
                    speed: None,
                },
            }
        })
        .collect()
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> RunArgs {
    let mut run = RunArgs::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                run.config = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--ticks" => {
                i += 1;
                run.ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--agents" => {
                i += 1;
                run.agents = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--agents requires a valid number");
                    std::process::exit(1);
                });
            }
            "--seed" => {
                i += 1;
                run.seed = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                println!("Usage: farm_headless [--config PATH] [--ticks N] [--agents N] [--seed N]");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    run
}
