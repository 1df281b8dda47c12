use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sand_sim_core::{CellType, GridBackend, PaintCommand, Simulation, SimulationConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Starting layout painted before the first tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scene {
    /// Sand pile dropped onto a stone floor
    Sand,
    /// Water column pouring into a stone basin
    Water,
    /// Oil pool set alight, napalm on a ledge
    Fire,
    /// A bit of everything
    Mixed,
}

/// Headless falling-sand demo
#[derive(Parser, Debug)]
#[command(name = "sand-sim-demo")]
#[command(about = "Falling-sand cellular automaton without a window", long_about = None)]
struct Args {
    /// Grid width in cells
    #[arg(long)]
    width: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<u32>,

    /// Engine: sequential or device
    #[arg(short, long)]
    backend: Option<GridBackend>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 200)]
    ticks: u32,

    /// Timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Starting layout
    #[arg(long, value_enum, default_value_t = Scene::Mixed)]
    scene: Scene,

    /// JSON config file (flags override its fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the final grid snapshot here
    #[arg(long)]
    save: Option<PathBuf>,

    /// Start from a grid snapshot instead of the scene
    #[arg(long)]
    load: Option<PathBuf>,

    /// Print an ASCII frame every N ticks (0 = only the last)
    #[arg(short, long, default_value_t = 0)]
    print_every: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    println!("=== Falling Sand Demo ===\n");
    println!(
        "Grid {}x{}, backend {:?}, {} ticks at dt={:.4}s",
        config.width, config.height, config.backend, args.ticks, args.dt
    );

    let mut sim = Simulation::new(&config);

    if let Some(path) = &args.load {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        sim.load(BufReader::new(file))
            .with_context(|| format!("loading {}", path.display()))?;
    } else {
        paint_scene(&mut sim, args.scene, config.width, config.height);
    }

    println!("\nInitial state:\n{}", sim.grid().render_ascii());

    for tick in 1..=args.ticks {
        sim.update(args.dt);
        if args.print_every > 0 && tick % args.print_every == 0 && tick != args.ticks {
            println!("Tick {tick}:\n{}", sim.grid().render_ascii());
        }
    }

    println!("Final state after {} ticks:\n{}", sim.ticks(), sim.grid().render_ascii());
    print_census(&sim);
    println!(
        "\nSimulated {:.2}s, average tick {:.3}ms",
        sim.simulation_time(),
        sim.average_frame_time_ms()
    );

    if let Some(path) = &args.save {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        sim.save(BufWriter::new(file))
            .with_context(|| format!("saving {}", path.display()))?;
        info!("Snapshot written to {}", path.display());
    }

    Ok(())
}

/// Config file first, then command-line overrides
fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            SimulationConfig::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimulationConfig {
            width: 80,
            height: 40,
            ..SimulationConfig::default()
        },
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    anyhow::ensure!(
        config.width > 0 && config.height > 0,
        "grid must be at least 1x1"
    );
    Ok(config)
}

fn paint_scene(sim: &mut Simulation, scene: Scene, width: u32, height: u32) {
    let floor = height - 1;
    for x in 0..width {
        paint(sim, (x, floor), 0, CellType::Stone);
    }

    match scene {
        Scene::Sand => {
            paint(sim, (width / 2, height / 4), height / 8, CellType::Sand);
        }
        Scene::Water => {
            for y in height / 2..floor {
                paint(sim, (width / 4, y), 0, CellType::Stone);
                paint(sim, (3 * width / 4, y), 0, CellType::Stone);
            }
            paint(sim, (width / 2, height / 5), height / 6, CellType::Water);
        }
        Scene::Fire => {
            let ledge = height / 3;
            paint(sim, (width / 3, floor.saturating_sub(2)), 2, CellType::Oil);
            paint(sim, (width / 3, floor.saturating_sub(5)), 0, CellType::Fire);
            paint(sim, (2 * width / 3, ledge), 0, CellType::Stone);
            paint(sim, (2 * width / 3, ledge.saturating_sub(1)), 0, CellType::Napalm);
        }
        Scene::Mixed => {
            paint(sim, (width / 5, height / 4), height / 8, CellType::Sand);
            paint(sim, (width / 2, height / 4), height / 8, CellType::Water);
            paint(sim, (4 * width / 5, floor.saturating_sub(3)), 2, CellType::Oil);
            paint(sim, (4 * width / 5, floor.saturating_sub(7)), 0, CellType::Fire);
        }
    }
}

fn paint(sim: &mut Simulation, center: (u32, u32), radius: u32, material: CellType) {
    sim.paint(PaintCommand {
        center,
        radius,
        material,
    });
}

fn print_census(sim: &Simulation) {
    let census = sim.census();
    println!("Material census:");
    for kind in CellType::ALL_MATERIALS {
        let count = census.get(&kind).copied().unwrap_or(0);
        if count > 0 {
            println!("  {:<7} {:>7}", kind.name(), count);
        }
    }
}
