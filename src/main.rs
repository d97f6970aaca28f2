use clap::Parser;

use rift_world::config::{layer_name, WorldConfig, LAYER_COUNT};
use rift_world::explorer;
use rift_world::export::{self, ExportOptions};
use rift_world::seeds::WorldSeeds;
use rift_world::world::WorldService;

#[derive(Parser, Debug)]
#[command(name = "rift_world")]
#[command(about = "Generate and explore a layered world connected by portals")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of chunks kept in the cache
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Export a PNG of chunks around a center (specify output path)
    #[arg(long)]
    export: Option<String>,

    /// Layer to export (0 = surface)
    #[arg(long, default_value = "0")]
    export_layer: u8,

    /// Center chunk X for export (default: center of world)
    #[arg(long)]
    export_cx: Option<i32>,

    /// Center chunk Y for export (default: center of world)
    #[arg(long)]
    export_cy: Option<i32>,

    /// Radius in chunks for export
    #[arg(long, default_value = "3")]
    export_radius: i32,

    /// Scale factor for export (1-4)
    #[arg(long, default_value = "1")]
    export_scale: u32,

    /// Draw entrance mouths on the exported image
    #[arg(long)]
    export_markers: bool,

    /// Export all entrance descriptors as JSON (specify output path)
    #[arg(long)]
    export_entrances: Option<String>,

    /// Launch the terminal explorer even when exporting
    #[arg(long)]
    explore: bool,
}

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut config = WorldConfig::default();
    if let Some(capacity) = args.cache_capacity {
        config.cache_capacity = capacity;
    }

    println!("Generating layered world with seed: {}", seed);
    println!(
        "World size: {0}x{0} chunks per layer, {1} layers, {2}px chunks",
        config.world_chunks, LAYER_COUNT, config.chunk_size
    );

    let seeds = WorldSeeds::from_master(seed);
    let mut world = WorldService::new(config.clone(), seeds);

    let mut exported = false;

    // Export a stitched area image if requested
    if let Some(ref path) = args.export {
        exported = true;
        let center = config.world_chunks as i32 / 2;
        let cx = args.export_cx.unwrap_or(center);
        let cy = args.export_cy.unwrap_or(center);

        println!(
            "Exporting {} around chunk ({}, {})...",
            layer_name(args.export_layer),
            cx,
            cy
        );
        println!("  Radius: {} chunks", args.export_radius);
        println!("  Scale: {}x", args.export_scale);

        let options = ExportOptions {
            scale: args.export_scale.clamp(1, 4),
            mark_entrances: args.export_markers,
        };

        match export::export_area(
            &mut world,
            args.export_layer,
            cx,
            cy,
            args.export_radius,
            path,
            &options,
            0.0,
        ) {
            Ok((width, height)) => {
                println!("Exported to: {}", path);
                println!("  Image size: {}x{} pixels", width, height);
            }
            Err(e) => {
                eprintln!("Failed to export image: {}", e);
            }
        }
    }

    // Export entrance descriptors if requested
    if let Some(ref path) = args.export_entrances {
        exported = true;
        match export::export_entrances(&world, None, path) {
            Ok(count) => {
                println!("Exported {} entrance descriptors to: {}", count, path);
            }
            Err(e) => {
                eprintln!("Failed to export entrances: {}", e);
            }
        }
    }

    // Export-only runs exit without the explorer
    if exported && !args.explore {
        return;
    }

    println!("Launching terminal explorer...");
    if let Err(e) = explorer::run_explorer(world) {
        eprintln!("Explorer error: {}", e);
    }
}
