//! Chunk terrain synthesis.
//!
//! Each layer is partitioned into Voronoi regions around a fixed set of seed
//! points placed deterministically in world space, so region shapes are
//! stable across chunk boundaries. A region maps to a palette entry for its
//! layer, a low-frequency noise field modulates per-pixel brightness, and
//! region seams are widened by iterative dilation into a banded outline.
//!
//! Generation is a pure function of (seeds, layer, cx, cy): repeated calls
//! produce bit-identical buffers, which is what lets the cache regenerate
//! evicted chunks invisibly.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{WorldConfig, LAYER_COUNT};
use crate::seeds::{mix64, WorldSeeds};

/// Base colors per layer, indexed by region modulo palette length.
pub const LAYER_PALETTES: [[(u8, u8, u8); 5]; LAYER_COUNT as usize] = [
    // Surface: grass, meadow, scrub
    [
        (96, 140, 72),
        (124, 162, 80),
        (150, 170, 94),
        (110, 126, 66),
        (136, 120, 74),
    ],
    // Caverns: wet stone, slate, gravel
    [
        (86, 94, 110),
        (70, 80, 96),
        (104, 114, 128),
        (62, 70, 88),
        (92, 104, 122),
    ],
    // Abyss: basalt, ember rock, violet shale
    [
        (96, 54, 66),
        (76, 44, 70),
        (112, 64, 58),
        (64, 40, 58),
        (88, 56, 84),
    ],
];

/// Frequency of the brightness noise field (low, so variation spans chunks).
const SHADE_FREQUENCY: f64 = 0.015;

/// Maximum brightness swing from the noise field.
const SHADE_AMPLITUDE: f32 = 0.18;

/// Generated pixel buffer for one chunk, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<(u8, u8, u8)>,
}

impl ChunkBuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![(0, 0, 0); (width * height) as usize],
        }
    }

    /// Pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> (u8, u8, u8) {
        self.pixels[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: u32, y: u32, color: (u8, u8, u8)) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Iterate all pixels with coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, (u8, u8, u8))> + '_ {
        self.pixels.iter().enumerate().map(move |(i, &c)| {
            let x = i as u32 % self.width;
            let y = i as u32 / self.width;
            (x, y, c)
        })
    }

    /// Raw pixel slice, row-major.
    pub fn pixels(&self) -> &[(u8, u8, u8)] {
        &self.pixels
    }
}

/// Per-layer derived state: region points and shading noise.
struct LayerField {
    points: Vec<(f32, f32)>,
    shading: Perlin,
}

/// Synthesizes chunk buffers for every layer of one world.
pub struct TerrainGenerator {
    chunk_size: u32,
    world_extent: f32,
    dilation_passes: usize,
    layers: Vec<LayerField>,
}

impl TerrainGenerator {
    pub fn new(config: &WorldConfig, seeds: &WorldSeeds) -> Self {
        let world_extent = config.world_extent();

        let layers = (0..LAYER_COUNT)
            .map(|layer| {
                let point_seed = mix64(seeds.regions.wrapping_add(layer as u64));
                let mut rng = ChaCha8Rng::seed_from_u64(point_seed);
                let points = (0..config.region_points)
                    .map(|_| {
                        (
                            rng.gen_range(0.0..world_extent),
                            rng.gen_range(0.0..world_extent),
                        )
                    })
                    .collect();

                let shade_seed = mix64(seeds.shading.wrapping_add(layer as u64));
                let shading = Perlin::new(shade_seed as u32);

                LayerField { points, shading }
            })
            .collect();

        Self {
            chunk_size: config.chunk_size,
            world_extent,
            dilation_passes: config.dilation_passes,
            layers,
        }
    }

    /// Generate the pixel buffer for one chunk.
    pub fn generate(&self, layer: u8, cx: i32, cy: i32) -> ChunkBuffer {
        let size = self.chunk_size as usize;
        // The margin covers the neighbor check plus every dilation pass, so
        // bands near chunk edges match what adjacent chunks compute.
        let margin = self.dilation_passes + 1;
        let grid = size + 2 * margin;

        let field = &self.layers[layer as usize % self.layers.len()];
        let origin_x = cx as f32 * self.chunk_size as f32;
        let origin_y = cy as f32 * self.chunk_size as f32;

        let sample = |gx: usize, gy: usize| -> (f32, f32) {
            let wx = origin_x + gx as f32 - margin as f32;
            let wy = origin_y + gy as f32 - margin as f32;
            (
                wx.clamp(0.0, self.world_extent - 1.0),
                wy.clamp(0.0, self.world_extent - 1.0),
            )
        };

        // Phase 1: region assignment over the chunk plus margin.
        let mut region = vec![0u16; grid * grid];
        for gy in 0..grid {
            for gx in 0..grid {
                let (wx, wy) = sample(gx, gy);
                region[gy * grid + gx] = nearest_point(&field.points, wx, wy);
            }
        }

        // Phase 2: seam detection and band dilation.
        let band = trace_seams(&region, grid, self.dilation_passes);

        // Phase 3: compose pixels.
        let palette = &LAYER_PALETTES[layer as usize % LAYER_PALETTES.len()];
        let mut buffer = ChunkBuffer::new(self.chunk_size, self.chunk_size);
        for y in 0..size {
            for x in 0..size {
                let gi = (y + margin) * grid + (x + margin);
                let base = palette[region[gi] as usize % palette.len()];

                let (wx, wy) = sample(x + margin, y + margin);
                let noise = field
                    .shading
                    .get([wx as f64 * SHADE_FREQUENCY, wy as f64 * SHADE_FREQUENCY])
                    as f32;
                let mut brightness = 1.0 + noise * SHADE_AMPLITUDE;
                if band[gi] != u8::MAX {
                    brightness *= band_shade(band[gi]);
                }

                buffer.set(x as u32, y as u32, scale_color(base, brightness));
            }
        }

        buffer
    }
}

/// Index of the nearest region point; the first of equidistant points wins.
fn nearest_point(points: &[(f32, f32)], wx: f32, wy: f32) -> u16 {
    let mut best = 0usize;
    let mut best_dist = f32::MAX;
    for (i, &(px, py)) in points.iter().enumerate() {
        let dx = wx - px;
        let dy = wy - py;
        let dist = dx * dx + dy * dy;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u16
}

/// Mark region seams (any differing 8-neighbor) as band 0, then widen by
/// `passes - 1` further dilation rounds, recording the round that reached
/// each cell. `u8::MAX` means untouched.
fn trace_seams(region: &[u16], grid: usize, passes: usize) -> Vec<u8> {
    let mut band = vec![u8::MAX; grid * grid];
    if passes == 0 {
        return band;
    }

    for gy in 0..grid {
        for gx in 0..grid {
            let here = region[gy * grid + gx];
            if neighbors8(gx, gy, grid).any(|(nx, ny)| region[ny * grid + nx] != here) {
                band[gy * grid + gx] = 0;
            }
        }
    }

    for pass in 1..passes as u8 {
        let mut reached = Vec::new();
        for gy in 0..grid {
            for gx in 0..grid {
                let gi = gy * grid + gx;
                if band[gi] != u8::MAX {
                    continue;
                }
                if neighbors8(gx, gy, grid).any(|(nx, ny)| band[ny * grid + nx] < pass) {
                    reached.push(gi);
                }
            }
        }
        for gi in reached {
            band[gi] = pass;
        }
    }

    band
}

/// In-bounds 8-neighborhood of a grid cell.
fn neighbors8(gx: usize, gy: usize, grid: usize) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(i32, i32); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let nx = gx as i32 + dx;
        let ny = gy as i32 + dy;
        if nx >= 0 && ny >= 0 && (nx as usize) < grid && (ny as usize) < grid {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    })
}

/// Darkening factor for an outline band; the innermost band is darkest.
fn band_shade(band: u8) -> f32 {
    (0.5 + band as f32 * 0.15).min(1.0)
}

fn scale_color(color: (u8, u8, u8), factor: f32) -> (u8, u8, u8) {
    let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    (scale(color.0), scale(color.1), scale(color.2))
}
