//! World configuration.
//!
//! All tunables for generation, portal placement and transitions live here as
//! an explicit context struct threaded through the other systems, so multiple
//! independently-configured worlds can coexist in one process.

/// Number of parallel world layers (surface, caverns, abyss).
pub const LAYER_COUNT: u8 = 3;

/// Configuration for a single world instance.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Side length of a chunk in world units (one unit = one pixel).
    pub chunk_size: u32,
    /// World extent per axis, in chunks. Layers share the same extent.
    pub world_chunks: u32,
    /// Voronoi region seed points per layer.
    pub region_points: usize,
    /// Dilation passes applied to region boundaries (outline band count).
    pub dilation_passes: usize,
    /// Maximum number of chunks kept in the cache.
    pub cache_capacity: usize,
    /// Probability that a portal-eligible coordinate carries a one-way portal.
    pub one_way_chance: f32,
    /// Inset from the chunk edge when anchoring an entrance, in world units.
    pub edge_padding: f32,
    /// Engagement mouth extent across the facing axis.
    pub mouth_width: f32,
    /// Engagement mouth extent along the facing axis.
    pub mouth_height: f32,
    /// Visual depth of the portal opening (consumed by renderers).
    pub portal_depth: f32,
    /// Minimum cosine between movement and facing to engage an entrance.
    pub entry_dot_threshold: f32,
    /// Crossing duration in seconds of simulated time.
    pub transition_duration: f32,
    /// Re-trigger block after a completed crossing, in seconds.
    pub cooldown: f32,
}

impl WorldConfig {
    /// World extent per axis in world units.
    pub fn world_extent(&self) -> f32 {
        (self.chunk_size * self.world_chunks) as f32
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            world_chunks: 48,
            region_points: 18,
            dilation_passes: 3,
            cache_capacity: 256,
            one_way_chance: 0.35,
            edge_padding: 10.0,
            mouth_width: 44.0,
            mouth_height: 22.0,
            portal_depth: 28.0,
            entry_dot_threshold: 0.55,
            transition_duration: 1.1,
            cooldown: 0.75,
        }
    }
}

/// Human-readable name for a layer index.
pub fn layer_name(layer: u8) -> &'static str {
    match layer {
        0 => "Surface",
        1 => "Caverns",
        2 => "Abyss",
        _ => "Unknown",
    }
}
