//! ASCII rendering for chunks and noise layers
//!
//! Debug output only: one character per terrain cell, rows top to bottom.

use std::collections::{HashMap, HashSet};

use crate::biomes::BiomeType;
use crate::chunk::{ChunkCoord, ChunkStore};
use crate::noise_field::NoiseField;
use crate::quadtree::Point;
use crate::streaming::ChunkWindow;

/// Drawn for cells of chunks that are not generated yet
pub const MISSING_CHAR: char = '?';
/// Drawn for cells of stored chunks that are currently hidden
pub const HIDDEN_CHAR: char = ' ';
/// Drawn over cells holding a placed structure
pub const STRUCTURE_CHAR: char = 'V';

/// Get ASCII character for a biome
pub fn biome_char(biome: &BiomeType) -> char {
    match biome {
        BiomeType::Water => '~',
        BiomeType::Desert => 'd',
        BiomeType::Grassland => '"',
        BiomeType::Forest => 'T',
        BiomeType::Tundra => ':',
    }
}

/// Get ASCII character for a `[0, 1]` noise value
pub fn noise_char(value: f32) -> char {
    const CHARS: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
    let idx = (value.clamp(0.0, 1.0) * (CHARS.len() - 1) as f32) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

/// Background color for a biome
pub fn biome_color(biome: &BiomeType) -> (u8, u8, u8) {
    match biome {
        BiomeType::Water => (30, 80, 160),
        BiomeType::Desert => (220, 200, 120),
        BiomeType::Grassland => (110, 170, 70),
        BiomeType::Forest => (30, 100, 40),
        BiomeType::Tundra => (190, 200, 205),
    }
}

/// Format a single character with ANSI true color (24-bit) - foreground and background
pub fn ansi_colored_char(ch: char, fg: (u8, u8, u8), bg: (u8, u8, u8)) -> String {
    format!(
        "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}\x1b[0m",
        fg.0, fg.1, fg.2,
        bg.0, bg.1, bg.2,
        ch
    )
}

/// Render a noise field as a gradient
pub fn render_field(field: &NoiseField) -> String {
    let mut result = String::with_capacity((field.width + 1) * field.height);
    for y in 0..field.height {
        for v in field.row(y) {
            result.push(noise_char(*v));
        }
        result.push('\n');
    }
    result
}

/// Options for [`render_chunks`]
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Blank out stored chunks that are not visible
    pub visible_only: bool,
    /// Wrap each cell in ANSI colour codes
    pub colored: bool,
}

/// Render every cell of the chunks in `window`, optionally overlaying structures.
pub fn render_chunks(
    store: &ChunkStore,
    window: &ChunkWindow,
    chunk_size: usize,
    structures: &[Point],
    options: &RenderOptions,
) -> String {
    let overlay: HashSet<Point> = structures.iter().copied().collect();
    let chunks_wide = (window.max.x - window.min.x + 1).max(0) as usize;
    let mut result = String::with_capacity((chunks_wide * chunk_size + 1) * chunk_size);

    for cy in window.min.y..=window.max.y {
        let row_chunks: Vec<_> = (window.min.x..=window.max.x)
            .map(|cx| store.get(&ChunkCoord::new(cx, cy)))
            .collect();

        for ly in 0..chunk_size {
            for (i, chunk) in row_chunks.iter().enumerate() {
                let cx = window.min.x + i as i32;
                for lx in 0..chunk_size {
                    let world = Point::new(
                        cx * chunk_size as i32 + lx as i32,
                        cy * chunk_size as i32 + ly as i32,
                    );
                    let (ch, biome) = match chunk {
                        None => (MISSING_CHAR, None),
                        Some(c) if options.visible_only && !c.is_visible() => (HIDDEN_CHAR, None),
                        Some(c) => {
                            let biome = c.biome(lx, ly);
                            let ch = if overlay.contains(&world) {
                                STRUCTURE_CHAR
                            } else {
                                biome_char(&biome)
                            };
                            (ch, Some(biome))
                        }
                    };
                    match biome {
                        Some(b) if options.colored => {
                            result.push_str(&ansi_colored_char(ch, (0, 0, 0), biome_color(&b)))
                        }
                        _ => result.push(ch),
                    }
                }
            }
            result.push('\n');
        }
    }

    result
}

/// Generate legend for biome characters
pub fn biome_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== BIOME LEGEND ===\n");
    for biome in BiomeType::ALL {
        legend.push_str(&format!("  {} {}\n", biome_char(&biome), biome.name()));
    }
    legend.push_str(&format!("  {} Structure\n", STRUCTURE_CHAR));
    legend.push_str(&format!("  {} Not generated\n", MISSING_CHAR));
    legend
}

/// Count cells per biome over every stored chunk
pub fn calculate_biome_stats(store: &ChunkStore) -> HashMap<BiomeType, usize> {
    let mut stats = HashMap::new();
    for coord in store.coords() {
        if let Some(chunk) = store.get(&coord) {
            for (i, count) in chunk.biome_histogram().iter().enumerate() {
                if *count > 0 {
                    *stats.entry(BiomeType::ALL[i]).or_insert(0) += count;
                }
            }
        }
    }
    stats
}
