//! Chunk caching with LRU eviction.
//!
//! Memoizes generated chunks keyed by (layer, cx, cy) with a bounded
//! capacity. Eviction removes the entry with the oldest last-access stamp;
//! stamp ties are broken by insertion sequence so the victim is well-defined
//! no matter how the underlying map iterates.

use std::collections::HashMap;

use crate::coords::ChunkCoord;
use crate::portal::{Entrance, PortalPlanner};
use crate::terrain::{ChunkBuffer, TerrainGenerator};

/// One generated chunk: terrain pixels plus the entrance originating in it.
///
/// Logically immutable once built; regenerating from the same coordinates
/// and seeds yields an identical chunk, so eviction is invisible to callers.
#[derive(Clone)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub buffer: ChunkBuffer,
    pub entrance: Option<Entrance>,
}

/// Cache counters for the status line.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

impl CacheStats {
    /// Hit rate in [0, 1].
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Hits: {} | Misses: {} | Rate: {:.1}% | Evictions: {}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions
        )
    }
}

struct CacheEntry {
    chunk: Chunk,
    last_access: f64,
    seq: u64,
}

/// Bounded chunk cache with least-recently-used eviction.
pub struct ChunkCache {
    entries: HashMap<ChunkCoord, CacheEntry>,
    capacity: usize,
    next_seq: u64,
    stats: CacheStats,
}

impl ChunkCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            capacity,
            next_seq: 0,
            stats: CacheStats::default(),
        }
    }

    /// Get the chunk at `coord`, generating it on a miss.
    ///
    /// `now` stamps the access; on a miss the generator and planner build the
    /// chunk, it is inserted, and if the cache then exceeds capacity exactly
    /// one other entry is evicted: the one with the oldest (stamp, sequence)
    /// pair. The entry just inserted is never the victim.
    pub fn get(
        &mut self,
        coord: ChunkCoord,
        now: f64,
        generator: &TerrainGenerator,
        planner: &PortalPlanner,
    ) -> &Chunk {
        if self.entries.contains_key(&coord) {
            self.stats.hits += 1;
            let entry = self.entries.get_mut(&coord).unwrap();
            entry.last_access = now;
            return &entry.chunk;
        }

        self.stats.misses += 1;
        let chunk = Chunk {
            coord,
            buffer: generator.generate(coord.layer, coord.cx, coord.cy),
            entrance: planner.entrance_for(coord.layer, coord.cx, coord.cy),
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            coord,
            CacheEntry {
                chunk,
                last_access: now,
                seq,
            },
        );

        if self.entries.len() > self.capacity {
            self.evict_oldest(coord);
        }

        &self.entries.get(&coord).unwrap().chunk
    }

    /// Remove the stalest entry, never the one at `keep`.
    fn evict_oldest(&mut self, keep: ChunkCoord) {
        let victim = self
            .entries
            .iter()
            .filter(|(coord, _)| **coord != keep)
            .min_by(|(_, a), (_, b)| {
                a.last_access
                    .partial_cmp(&b.last_access)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|(coord, _)| *coord);

        if let Some(coord) = victim {
            self.entries.remove(&coord);
            self.stats.evictions += 1;
        }
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.entries.contains_key(coord)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }
}
