//! World service: cached chunk access and spatial queries.
//!
//! Owns the generator, planner and cache for one world instance and exposes
//! the two queries rendering and gameplay need: which chunks cover a
//! viewport, and which entrances sit near a world point.

use crate::cache::{CacheStats, Chunk, ChunkCache};
use crate::config::WorldConfig;
use crate::coords::{ChunkCoord, ChunkRange, Vec2, Viewport};
use crate::portal::{Entrance, PortalPlanner};
use crate::seeds::WorldSeeds;
use crate::terrain::TerrainGenerator;

pub struct WorldService {
    config: WorldConfig,
    seeds: WorldSeeds,
    generator: TerrainGenerator,
    planner: PortalPlanner,
    cache: ChunkCache,
}

impl WorldService {
    pub fn new(config: WorldConfig, seeds: WorldSeeds) -> Self {
        let generator = TerrainGenerator::new(&config, &seeds);
        let planner = PortalPlanner::new(&config, &seeds);
        let cache = ChunkCache::new(config.cache_capacity);
        Self {
            config,
            seeds,
            generator,
            planner,
            cache,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn seeds(&self) -> &WorldSeeds {
        &self.seeds
    }

    /// Chunk at (layer, cx, cy), generated on demand and cached.
    pub fn chunk(&mut self, layer: u8, cx: i32, cy: i32, now: f64) -> &Chunk {
        self.cache
            .get(ChunkCoord::new(layer, cx, cy), now, &self.generator, &self.planner)
    }

    /// Chunk rectangle covering a viewport, expanded by one chunk of margin
    /// to avoid visible popping, clamped to world chunk bounds.
    pub fn chunk_range(&self, view: &Viewport) -> ChunkRange {
        let cs = self.config.chunk_size as f32;
        let last = self.config.world_chunks as i32 - 1;

        let min_cx = ((view.x / cs).floor() as i32 - 1).clamp(0, last);
        let min_cy = ((view.y / cs).floor() as i32 - 1).clamp(0, last);
        let max_cx = (((view.x + view.width) / cs).floor() as i32 + 1).clamp(0, last);
        let max_cy = (((view.y + view.height) / cs).floor() as i32 + 1).clamp(0, last);

        ChunkRange {
            min_cx,
            min_cy,
            max_cx,
            max_cy,
        }
    }

    /// Entrances within `radius` chunks of a world point, in row-major order
    /// over the scanned window. At most one entrance per chunk.
    pub fn entrances_near(
        &mut self,
        layer: u8,
        point: Vec2,
        radius: i32,
        now: f64,
    ) -> Vec<Entrance> {
        let cs = self.config.chunk_size as f32;
        let last = self.config.world_chunks as i32 - 1;
        let ccx = ((point.x / cs).floor() as i32).clamp(0, last);
        let ccy = ((point.y / cs).floor() as i32).clamp(0, last);

        let window = ChunkRange {
            min_cx: (ccx - radius).clamp(0, last),
            min_cy: (ccy - radius).clamp(0, last),
            max_cx: (ccx + radius).clamp(0, last),
            max_cy: (ccy + radius).clamp(0, last),
        };

        let mut found = Vec::new();
        for (cx, cy) in window.iter() {
            if let Some(entrance) = &self.chunk(layer, cx, cy, now).entrance {
                found.push(entrance.clone());
            }
        }
        found
    }

    /// Entrance descriptor at a chunk coordinate, without touching the
    /// cache. Export and analysis paths use this to scan the whole world
    /// cheaply.
    pub fn entrance_at(&self, layer: u8, cx: i32, cy: i32) -> Option<Entrance> {
        self.planner.entrance_for(layer, cx, cy)
    }

    /// Number of chunks currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> WorldService {
        WorldService::new(WorldConfig::default(), WorldSeeds::from_master(42))
    }

    fn small_service(capacity: usize) -> WorldService {
        let mut config = WorldConfig::default();
        config.cache_capacity = capacity;
        WorldService::new(config, WorldSeeds::from_master(42))
    }

    #[test]
    fn test_chunk_range_includes_margin() {
        let world = service();
        let cs = world.config().chunk_size as f32;

        // A viewport inside chunks (4..6, 4..5) plus one chunk of margin.
        let view = Viewport::new(cs * 4.0 + 1.0, cs * 4.0 + 1.0, cs * 1.5, cs * 0.5);
        let range = world.chunk_range(&view);
        assert_eq!(range.min_cx, 3);
        assert_eq!(range.min_cy, 3);
        assert_eq!(range.max_cx, 6);
        assert_eq!(range.max_cy, 5);
    }

    #[test]
    fn test_chunk_range_clamps_at_world_edge() {
        let world = service();
        let last = world.config().world_chunks as i32 - 1;

        let view = Viewport::new(-500.0, -500.0, 100.0, 100.0);
        let range = world.chunk_range(&view);
        assert_eq!(range.min_cx, 0);
        assert_eq!(range.min_cy, 0);

        let far = world.config().world_extent() + 500.0;
        let range = world.chunk_range(&Viewport::new(far, far, 100.0, 100.0));
        assert_eq!(range.max_cx, last);
        assert_eq!(range.max_cy, last);
    }

    #[test]
    fn test_entrances_near_finds_chunk_entrances() {
        let mut world = service();
        let cs = world.config().chunk_size as f32;

        // Center of chunk (4, 4); the 1-chunk window spans chunks 3..=5,
        // which contains the eligible coordinate (4, 4).
        let point = Vec2::new(cs * 4.5, cs * 4.5);
        let found = world.entrances_near(0, point, 1, 0.0);

        for entrance in &found {
            assert!(entrance.chunk.cx >= 3 && entrance.chunk.cx <= 5);
            assert!(entrance.chunk.cy >= 3 && entrance.chunk.cy <= 5);
            assert_eq!(entrance.chunk.layer, 0);
        }

        // A wider window over several eligible coordinates must find at
        // least one portal for some layer.
        let any: usize = (0..3u8)
            .map(|layer| world.entrances_near(layer, point, 3, 0.0).len())
            .sum();
        assert!(any > 0);
    }

    #[test]
    fn test_entrance_at_matches_chunk_and_skips_cache() {
        let mut world = service();

        let before = world.cache_len();
        let planned = world.entrance_at(0, 4, 4);
        assert_eq!(world.cache_len(), before, "entrance_at must not cache");

        let cached = world.chunk(0, 4, 4, 0.0).entrance.clone();
        assert_eq!(
            planned.as_ref().map(|e| (e.id, e.direction)),
            cached.as_ref().map(|e| (e.id, e.direction))
        );
    }

    #[test]
    fn test_cache_bound_under_query_load() {
        let mut world = small_service(6);
        for cy in 0..6 {
            for cx in 0..6 {
                world.chunk(0, cx, cy, (cx + cy) as f64);
                assert!(world.cache_len() <= 6);
            }
        }
    }

    #[test]
    fn test_eviction_is_invisible_to_callers() {
        let mut world = small_service(2);

        let first = world.chunk(0, 2, 2, 0.0).clone();
        // Overflow the cache so (0, 2, 2) is regenerated from scratch.
        world.chunk(0, 3, 2, 1.0);
        world.chunk(0, 4, 2, 2.0);
        let second = world.chunk(0, 2, 2, 3.0);

        assert_eq!(first.buffer.pixels(), second.buffer.pixels());
        assert_eq!(
            first.entrance.as_ref().map(|e| (e.id, e.direction)),
            second.entrance.as_ref().map(|e| (e.id, e.direction))
        );
    }
}
