//! Debug script to dump the ocean map and the chunks around the origin as ASCII

use std::fs::File;
use std::io::Write;

use chunk_terrain::ascii::{self, RenderOptions};
use chunk_terrain::chunk::ChunkCoord;
use chunk_terrain::config::{GeneratorConfig, OCEAN_MAP};
use chunk_terrain::logging;
use chunk_terrain::streaming::ChunkWindow;
use chunk_terrain::world::TerrainWorld;

fn main() -> chunk_terrain::Result<()> {
    logging::init(1);

    let config = GeneratorConfig {
        seed: 12345,
        chunk_size: 10,
        ocean_radius: 1,
        ..GeneratorConfig::default()
    };
    let chunk_size = config.chunk_size;
    let seed = config.seed;

    let mut world = TerrainWorld::new(config)?;
    world.generate_pending(usize::MAX)?;

    let mut file = File::create("chunk_debug.txt")?;

    writeln!(file, "=== CHUNK DEBUG MAP seed={} chunk_size={} ===", seed, chunk_size)?;
    writeln!(file)?;
    write!(file, "{}", ascii::biome_legend())?;
    writeln!(file)?;

    if let Some(ocean) = world.layer(OCEAN_MAP) {
        writeln!(file, "OCEAN MAP ({}x{}):", ocean.width, ocean.height)?;
        write!(file, "{}", ascii::render_field(ocean))?;
        writeln!(file)?;
    }

    // Regions -1..=1 around the origin
    let per_region = world.scheduler().chunks_per_region();
    let window = ChunkWindow {
        min: ChunkCoord::new(-per_region, -per_region),
        max: ChunkCoord::new(2 * per_region - 1, 2 * per_region - 1),
    };
    let mut structures = Vec::new();
    for coord in window.coords() {
        if let Some(mut placed) = world.place_structures(coord) {
            structures.append(&mut placed);
        }
    }

    writeln!(file, "CHUNK MAP ({} structures):", structures.len())?;
    write!(
        file,
        "{}",
        ascii::render_chunks(world.store(), &window, chunk_size, &structures, &RenderOptions::default())
    )?;
    writeln!(file)?;

    writeln!(file, "BIOME DISTRIBUTION:")?;
    let mut counts: Vec<_> = ascii::calculate_biome_stats(world.store()).into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    for (biome, count) in counts {
        writeln!(
            file,
            "  {} {:<10} {:>8} ({:.1}%)",
            ascii::biome_char(&biome),
            biome.name(),
            count,
            100.0 * count as f64 / total.max(1) as f64
        )?;
    }

    println!("Wrote chunk_debug.txt ({} chunks)", world.store().len());
    Ok(())
}
