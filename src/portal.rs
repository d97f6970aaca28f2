//! Portal placement and entrance descriptors.
//!
//! Entrances connect adjacent layers and exist only at "portal-eligible"
//! chunk coordinates (both cx and cy even). Which pair of layers a portal
//! connects is fixed by coordinate parity, so placement needs no search and
//! no stored state: any chunk can answer locally whether it hosts an
//! entrance, for which layers, facing where, and in which travel mode.

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::coords::{ChunkCoord, Direction, Vec2};
use crate::seeds::{hash_cell, mix64, uniform01, WorldSeeds};

const DIRECTION_SALT: u32 = 0x51ED_270B;
const MODE_SALT: u32 = 0xA24B_AED4;
const SOURCE_SALT: u32 = 0x3C6E_F372;
const ID_SALT: u32 = 0x9216_D5D9;

/// Travel mode of an entrance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalMode {
    /// Usable only from a fixed source layer.
    OneWay { from_layer: u8 },
    /// Usable from either connected layer.
    TwoWay,
}

/// A coordinate-anchored, direction-oriented gateway between two layers.
///
/// For a two-way portal the same logical entrance surfaces once per
/// connected layer, sharing its id and world position; the far side's facing
/// is mirrored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entrance {
    /// Stable identifier, shared by both sides of a two-way portal.
    pub id: u64,
    /// Owning chunk, with `layer` set to the queried side.
    pub chunk: ChunkCoord,
    /// Portal group: 0 connects layers 0↔1, 1 connects layers 1↔2.
    pub group: u8,
    /// World position of the mouth center.
    pub position: Vec2,
    /// Facing on the queried side.
    pub direction: Direction,
    /// Mouth extent across the facing axis.
    pub mouth_width: f32,
    /// Mouth extent along the facing axis.
    pub mouth_height: f32,
    /// Visual depth of the opening.
    pub depth: f32,
    /// Travel mode.
    pub mode: PortalMode,
    /// Destination layer when crossing from the queried side.
    pub to_layer: u8,
}

impl Entrance {
    /// Whether a world point lies inside the oriented mouth rectangle.
    ///
    /// The mouth is centered on `position` in the entrance's local frame:
    /// half of `mouth_height` along the facing axis, half of `mouth_width`
    /// across it.
    pub fn mouth_contains(&self, point: Vec2) -> bool {
        let rel = point - self.position;
        let along = rel.dot(self.direction.unit());
        let lateral = rel.dot(self.direction.perpendicular());
        along.abs() <= self.mouth_height * 0.5 && lateral.abs() <= self.mouth_width * 0.5
    }

    /// The layer this descriptor was surfaced for.
    pub fn from_layer(&self) -> u8 {
        self.chunk.layer
    }
}

/// Decides entrance existence, geometry and mode for chunk coordinates.
pub struct PortalPlanner {
    seed: u64,
    chunk_size: f32,
    edge_padding: f32,
    mouth_width: f32,
    mouth_height: f32,
    depth: f32,
    one_way_chance: f32,
}

impl PortalPlanner {
    pub fn new(config: &WorldConfig, seeds: &WorldSeeds) -> Self {
        Self {
            seed: seeds.portals,
            chunk_size: config.chunk_size as f32,
            edge_padding: config.edge_padding,
            mouth_width: config.mouth_width,
            mouth_height: config.mouth_height,
            depth: config.portal_depth,
            one_way_chance: config.one_way_chance,
        }
    }

    /// The entrance originating in chunk (cx, cy) as seen from `layer`, if
    /// any. Odd coordinates and layers outside the portal's pair yield None.
    pub fn entrance_for(&self, layer: u8, cx: i32, cy: i32) -> Option<Entrance> {
        if cx % 2 != 0 || cy % 2 != 0 {
            return None;
        }

        let group = ((cx / 2 + cy / 2).rem_euclid(2)) as u8;
        let near_layer = group;
        let far_layer = group + 1;
        if layer != near_layer && layer != far_layer {
            return None;
        }
        let to_layer = if layer == near_layer { far_layer } else { near_layer };

        let base_direction = Direction::from_index(hash_cell(
            self.seed,
            cx,
            cy,
            DIRECTION_SALT ^ group as u32,
        ));

        let mode_roll = uniform01(hash_cell(self.seed, cx, cy, MODE_SALT));
        let mode = if mode_roll < self.one_way_chance {
            let from_layer = if hash_cell(self.seed, cx, cy, SOURCE_SALT) & 1 == 0 {
                near_layer
            } else {
                far_layer
            };
            PortalMode::OneWay { from_layer }
        } else {
            PortalMode::TwoWay
        };

        // One-way portals only surface on their source layer.
        let direction = match mode {
            PortalMode::OneWay { from_layer } => {
                if layer != from_layer {
                    return None;
                }
                base_direction
            }
            // The far side of a two-way portal faces back the other way.
            PortalMode::TwoWay => {
                if layer == far_layer {
                    base_direction.mirrored()
                } else {
                    base_direction
                }
            }
        };

        Some(Entrance {
            id: mix64(self.seed ^ hash_cell(self.seed, cx, cy, ID_SALT) as u64),
            chunk: ChunkCoord::new(layer, cx, cy),
            group,
            position: self.anchor_position(cx, cy, base_direction),
            direction,
            mouth_width: self.mouth_width,
            mouth_height: self.mouth_height,
            depth: self.depth,
            mode,
            to_layer,
        })
    }

    /// Anchor the entrance to the chunk edge its base direction points at,
    /// inset by the configured padding. Both sides of a two-way portal share
    /// this position; only the facing mirrors.
    fn anchor_position(&self, cx: i32, cy: i32, base: Direction) -> Vec2 {
        let ox = cx as f32 * self.chunk_size;
        let oy = cy as f32 * self.chunk_size;
        let half = self.chunk_size * 0.5;
        let pad = self.edge_padding;

        match base {
            Direction::Up => Vec2::new(ox + half, oy + pad),
            Direction::Right => Vec2::new(ox + self.chunk_size - pad, oy + half),
            Direction::Down => Vec2::new(ox + half, oy + self.chunk_size - pad),
            Direction::Left => Vec2::new(ox + pad, oy + half),
        }
    }
}
