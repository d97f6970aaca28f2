//! PNG and JSON export of generated world areas.
//!
//! Stitches chunk buffers into an image for inspection outside the terminal,
//! optionally with entrance mouths drawn on top, and dumps entrance
//! descriptors as JSON for analysis.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::config::LAYER_COUNT;
use crate::coords::{ChunkRange, Direction};
use crate::portal::Entrance;
use crate::world::WorldService;

/// Marker color for entrance mouth outlines.
const MOUTH_COLOR: Rgb<u8> = Rgb([255, 224, 96]);

/// Marker color for the facing tick.
const FACING_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Options for area export.
pub struct ExportOptions {
    /// Each world pixel becomes scale x scale image pixels.
    pub scale: u32,
    /// Draw entrance mouths and facing ticks on top of the terrain.
    pub mark_entrances: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1,
            mark_entrances: true,
        }
    }
}

/// Export the chunks within `radius` of a center chunk as a PNG.
///
/// Returns the image dimensions in pixels. The chunk range is clamped to
/// world bounds, so a center near the border exports a smaller image rather
/// than failing.
pub fn export_area(
    world: &mut WorldService,
    layer: u8,
    center_cx: i32,
    center_cy: i32,
    radius: i32,
    path: &str,
    options: &ExportOptions,
    now: f64,
) -> Result<(u32, u32), image::ImageError> {
    let cs = world.config().chunk_size;
    let last = world.config().world_chunks as i32 - 1;
    let scale = options.scale.max(1);

    let range = ChunkRange {
        min_cx: (center_cx - radius).clamp(0, last),
        min_cy: (center_cy - radius).clamp(0, last),
        max_cx: (center_cx + radius).clamp(0, last),
        max_cy: (center_cy + radius).clamp(0, last),
    };

    let width = (range.max_cx - range.min_cx + 1) as u32 * cs * scale;
    let height = (range.max_cy - range.min_cy + 1) as u32 * cs * scale;
    let mut img: RgbImage = ImageBuffer::new(width, height);

    // World position of the image's top-left corner.
    let origin_x = range.min_cx as f32 * cs as f32;
    let origin_y = range.min_cy as f32 * cs as f32;

    let mut entrances = Vec::new();
    for (cx, cy) in range.iter() {
        let chunk = world.chunk(layer, cx, cy, now);
        if let Some(entrance) = &chunk.entrance {
            entrances.push(entrance.clone());
        }

        let base_x = (cx - range.min_cx) as u32 * cs * scale;
        let base_y = (cy - range.min_cy) as u32 * cs * scale;
        for (x, y, (r, g, b)) in chunk.buffer.iter() {
            let color = Rgb([r, g, b]);
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(base_x + x * scale + dx, base_y + y * scale + dy, color);
                }
            }
        }
    }

    if options.mark_entrances {
        for entrance in &entrances {
            draw_entrance(&mut img, entrance, origin_x, origin_y, scale);
        }
    }

    img.save(path)?;
    Ok((width, height))
}

/// Axis-aligned half-extents of a mouth rectangle in world space. The mouth
/// is oriented along the facing, so a vertical facing keeps width across x.
fn mouth_half_extents(entrance: &Entrance) -> (f32, f32) {
    match entrance.direction {
        Direction::Up | Direction::Down => {
            (entrance.mouth_width * 0.5, entrance.mouth_height * 0.5)
        }
        Direction::Left | Direction::Right => {
            (entrance.mouth_height * 0.5, entrance.mouth_width * 0.5)
        }
    }
}

/// Draw the mouth outline and a facing tick for one entrance.
fn draw_entrance(img: &mut RgbImage, entrance: &Entrance, origin_x: f32, origin_y: f32, scale: u32) {
    let (half_w, half_h) = mouth_half_extents(entrance);
    let min_x = (entrance.position.x - half_w - origin_x) as i32;
    let max_x = (entrance.position.x + half_w - origin_x) as i32;
    let min_y = (entrance.position.y - half_h - origin_y) as i32;
    let max_y = (entrance.position.y + half_h - origin_y) as i32;

    for x in min_x..=max_x {
        plot(img, x, min_y, scale, MOUTH_COLOR);
        plot(img, x, max_y, scale, MOUTH_COLOR);
    }
    for y in min_y..=max_y {
        plot(img, min_x, y, scale, MOUTH_COLOR);
        plot(img, max_x, y, scale, MOUTH_COLOR);
    }

    // Facing tick from the mouth center toward the opening.
    let unit = entrance.direction.unit();
    for step in 0..entrance.depth as i32 {
        let px = (entrance.position.x + unit.x * step as f32 - origin_x) as i32;
        let py = (entrance.position.y + unit.y * step as f32 - origin_y) as i32;
        plot(img, px, py, scale, FACING_COLOR);
    }
}

/// Fill one scaled world pixel, ignoring out-of-image positions.
fn plot(img: &mut RgbImage, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    for dy in 0..scale {
        for dx in 0..scale {
            let px = x as u32 * scale + dx;
            let py = y as u32 * scale + dy;
            if px < img.width() && py < img.height() {
                img.put_pixel(px, py, color);
            }
        }
    }
}

/// Dump entrance descriptors over the whole world as pretty JSON.
///
/// `layer` restricts the dump to one layer; `None` covers all of them. Reads
/// the planner directly, so the chunk cache is left untouched. Returns the
/// number of descriptors written.
pub fn export_entrances(
    world: &WorldService,
    layer: Option<u8>,
    path: &str,
) -> Result<usize, Box<dyn Error>> {
    let last = world.config().world_chunks as i32 - 1;
    let layers: Vec<u8> = match layer {
        Some(layer) => vec![layer],
        None => (0..LAYER_COUNT).collect(),
    };

    let mut descriptors = Vec::new();
    for &layer in &layers {
        for cy in (0..=last).step_by(2) {
            for cx in (0..=last).step_by(2) {
                if let Some(entrance) = world.entrance_at(layer, cx, cy) {
                    descriptors.push(entrance);
                }
            }
        }
    }

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &descriptors)?;
    Ok(descriptors.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::coords::{ChunkCoord, Vec2};
    use crate::portal::PortalMode;
    use crate::seeds::WorldSeeds;

    fn world() -> WorldService {
        WorldService::new(WorldConfig::default(), WorldSeeds::from_master(42))
    }

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn entrance_facing(direction: Direction) -> Entrance {
        Entrance {
            id: 1,
            chunk: ChunkCoord::new(0, 0, 0),
            group: 0,
            position: Vec2::new(32.0, 32.0),
            direction,
            mouth_width: 40.0,
            mouth_height: 20.0,
            depth: 10.0,
            mode: PortalMode::TwoWay,
            to_layer: 1,
        }
    }

    #[test]
    fn test_export_area_dimensions() {
        let mut world = world();
        let cs = world.config().chunk_size;
        let path = temp_path("rift_export_area.png");

        let (width, height) =
            export_area(&mut world, 0, 4, 4, 1, &path, &ExportOptions::default(), 0.0).unwrap();
        assert_eq!(width, 3 * cs);
        assert_eq!(height, 3 * cs);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_area_clamps_at_border() {
        let mut world = world();
        let cs = world.config().chunk_size;
        let path = temp_path("rift_export_border.png");

        // Center (0, 0) with radius 1 keeps only the in-world 2x2 quadrant.
        let (width, height) =
            export_area(&mut world, 0, 0, 0, 1, &path, &ExportOptions::default(), 0.0).unwrap();
        assert_eq!(width, 2 * cs);
        assert_eq!(height, 2 * cs);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_area_respects_scale() {
        let mut world = world();
        let cs = world.config().chunk_size;
        let path = temp_path("rift_export_scaled.png");

        let options = ExportOptions {
            scale: 2,
            mark_entrances: false,
        };
        let (width, _) = export_area(&mut world, 1, 6, 6, 1, &path, &options, 0.0).unwrap();
        assert_eq!(width, 3 * cs * 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_entrances_round_trips() {
        let world = world();
        let path = temp_path("rift_export_entrances.json");

        let count = export_entrances(&world, None, &path).unwrap();
        assert!(count > 0);

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Entrance> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), count);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_entrances_single_layer_is_subset() {
        let world = world();
        let path_all = temp_path("rift_export_all.json");
        let path_one = temp_path("rift_export_one.json");

        let all = export_entrances(&world, None, &path_all).unwrap();
        let one = export_entrances(&world, Some(0), &path_one).unwrap();
        assert!(one > 0);
        assert!(one < all);
        std::fs::remove_file(&path_all).ok();
        std::fs::remove_file(&path_one).ok();
    }

    #[test]
    fn test_mouth_half_extents_follow_orientation() {
        let down = entrance_facing(Direction::Down);
        assert_eq!(mouth_half_extents(&down), (20.0, 10.0));

        let right = entrance_facing(Direction::Right);
        assert_eq!(mouth_half_extents(&right), (10.0, 20.0));
    }
}
