use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use chunk_terrain::ascii::{self, RenderOptions};
use chunk_terrain::config::GeneratorConfig;
use chunk_terrain::logging;
use chunk_terrain::world::TerrainWorld;
use chunk_terrain::Result;

#[derive(Parser, Debug)]
#[command(name = "chunk_terrain")]
#[command(about = "Stream procedurally generated 2D terrain around a moving viewpoint")]
struct Args {
    /// JSON generator config (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config; random if neither sets one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Chunk edge length in cells (1-100)
    #[arg(short = 'c', long)]
    chunk_size: Option<usize>,

    /// Streaming radius in chunks
    #[arg(short = 'r', long)]
    radius: Option<i32>,

    /// Number of ticks to simulate
    #[arg(short = 't', long, default_value = "60")]
    ticks: u64,

    /// Viewpoint movement per tick along X, in cells
    #[arg(long, default_value = "8.0")]
    step_x: f32,

    /// Viewpoint movement per tick along Y, in cells
    #[arg(long, default_value = "0.0")]
    step_y: f32,

    /// Print the visible window as ASCII when done
    #[arg(long)]
    ascii: bool,

    /// Colour the ASCII output with ANSI escapes
    #[arg(long)]
    color: bool,

    /// Place villages in visible chunks and overlay them on the ASCII output
    #[arg(long)]
    structures: bool,

    /// Write the effective config to this path
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig {
            seed: rand::random(),
            ..GeneratorConfig::default()
        },
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(radius) = args.radius {
        config.view_radius = radius;
    }
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!(path = %path.display(), "Saved config");
    }

    println!("Generating terrain with seed: {}", config.seed);
    println!(
        "Chunk size: {}, view radius: {}, ocean radius: {}",
        config.chunk_size, config.view_radius, config.ocean_radius
    );

    let mut world = TerrainWorld::new(config)?;
    let (mut x, mut y) = (0.0f32, 0.0f32);

    for _ in 0..args.ticks {
        world.set_viewpoint(x, y);
        let report = world.tick()?;
        if let Some(change) = &report.visibility {
            info!(
                tick = report.tick,
                shown = change.shown.len(),
                hidden = change.hidden.len(),
                enqueued = change.enqueued.len(),
                pending = change.pending,
                "Window moved"
            );
        }
        if report.pass.processed > 0 {
            info!(
                tick = report.tick,
                regions = report.pass.processed,
                chunks = report.pass.chunks_committed,
                remaining = report.pass.remaining,
                "Generated"
            );
        }
        x += args.step_x;
        y += args.step_y;
    }

    // Let the last window finish so the dump has no gaps.
    world.generate_pending(usize::MAX)?;
    world.tick()?;

    let stats = world.store().stats();
    println!(
        "After {} ticks: {} chunks stored, {} visible, {} regions queued",
        world.ticks(),
        stats.chunks,
        stats.visible,
        world.scheduler().pending()
    );

    let mut biome_counts: Vec<_> = ascii::calculate_biome_stats(world.store()).into_iter().collect();
    biome_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let total: usize = biome_counts.iter().map(|(_, n)| n).sum();
    for (biome, count) in biome_counts {
        println!(
            "  {:<10} {:>8} ({:.1}%)",
            biome.name(),
            count,
            100.0 * count as f64 / total.max(1) as f64
        );
    }

    if args.ascii {
        let window = world.streaming().window();
        let mut structures = Vec::new();
        if args.structures {
            for coord in window.coords() {
                match world.place_structures(coord) {
                    Some(mut placed) => structures.append(&mut placed),
                    None => warn!(chunk_x = coord.x, chunk_y = coord.y, "Chunk not generated"),
                }
            }
            println!("Placed {} structures", structures.len());
        }
        let options = RenderOptions {
            visible_only: true,
            colored: args.color,
        };
        print!(
            "{}",
            ascii::render_chunks(world.store(), &window, world.config().chunk_size, &structures, &options)
        );
        print!("{}", ascii::biome_legend());
    }

    Ok(())
}
