//! Cross-layer transition state machine.
//!
//! Watches the player against nearby entrance mouths and, once an entrance
//! is engaged, drives crossing progress over simulated time. The player is
//! never teleported: movement physics stays with the caller, which flips the
//! active layer only when the machine reports completion. After completion a
//! cooldown blocks immediate re-triggering on the same or a nearby entrance.

use crate::config::WorldConfig;
use crate::coords::Vec2;
use crate::portal::Entrance;
use crate::world::WorldService;

/// Player state, owned by the caller. The machine only reads it.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub layer: u8,
}

impl Player {
    pub fn new(position: Vec2, layer: u8) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            layer,
        }
    }
}

/// An in-flight crossing. Always runs to completion; there is no
/// cancellation path.
#[derive(Clone, Debug)]
pub struct ActiveCrossing {
    pub entrance: Entrance,
    /// Progress in [0, 1].
    pub progress: f32,
    pub duration: f32,
    pub from_layer: u8,
    pub to_layer: u8,
}

/// Idle / cooling-down / transitioning, driven once per frame.
pub struct TransitionMachine {
    active: Option<ActiveCrossing>,
    cooldown_left: f32,
    duration: f32,
    cooldown: f32,
    entry_dot_threshold: f32,
    engagement_radius: i32,
}

impl TransitionMachine {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            active: None,
            cooldown_left: 0.0,
            duration: config.transition_duration.max(1e-3),
            cooldown: config.cooldown,
            entry_dot_threshold: config.entry_dot_threshold,
            engagement_radius: 1,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Whether the re-trigger block after a completed crossing is running.
    pub fn cooling_down(&self) -> bool {
        self.active.is_none() && self.cooldown_left > 0.0
    }

    /// The crossing in flight, if any.
    pub fn active(&self) -> Option<&ActiveCrossing> {
        self.active.as_ref()
    }

    /// Progress of the crossing in flight.
    pub fn progress(&self) -> Option<f32> {
        self.active.as_ref().map(|a| a.progress)
    }

    /// Try to engage one of `entrances` (first match wins, in the order
    /// given). Succeeds only when idle, not cooling down, the player stands
    /// inside an entrance mouth, and the movement direction agrees with the
    /// entrance facing at least up to the configured cosine threshold.
    pub fn try_engage(&mut self, player: &Player, movement: Vec2, entrances: &[Entrance]) -> bool {
        if self.active.is_some() || self.cooldown_left > 0.0 {
            return false;
        }

        let heading = movement.normalized();
        if heading == Vec2::ZERO {
            return false;
        }

        for entrance in entrances {
            if !entrance.mouth_contains(player.position) {
                continue;
            }
            if heading.dot(entrance.direction.unit()) < self.entry_dot_threshold {
                continue;
            }

            self.active = Some(ActiveCrossing {
                entrance: entrance.clone(),
                progress: 0.0,
                duration: self.duration,
                from_layer: player.layer,
                to_layer: entrance.to_layer,
            });
            return true;
        }

        false
    }

    /// Advance by `dt` seconds of simulated time.
    ///
    /// While transitioning, progress grows monotonically at 1/duration per
    /// second; on reaching 1 the machine returns the destination layer (the
    /// caller flips the player's active layer), resets to idle and starts
    /// the cooldown. While idle, the cooldown timer drains.
    pub fn tick(&mut self, dt: f32) -> Option<u8> {
        match &mut self.active {
            Some(crossing) => {
                crossing.progress = (crossing.progress + dt / crossing.duration).min(1.0);
                if crossing.progress >= 1.0 {
                    let destination = crossing.to_layer;
                    self.active = None;
                    self.cooldown_left = self.cooldown;
                    Some(destination)
                } else {
                    None
                }
            }
            None => {
                self.cooldown_left = (self.cooldown_left - dt).max(0.0);
                None
            }
        }
    }

    /// Per-frame driver: query entrances around the player, attempt
    /// engagement, then advance time. Returns the destination layer on the
    /// frame a crossing completes.
    pub fn update(
        &mut self,
        world: &mut WorldService,
        player: &Player,
        movement: Vec2,
        dt: f32,
        now: f64,
    ) -> Option<u8> {
        if self.active.is_none() && self.cooldown_left <= 0.0 && movement != Vec2::ZERO {
            let nearby =
                world.entrances_near(player.layer, player.position, self.engagement_radius, now);
            self.try_engage(player, movement, &nearby);
        }
        self.tick(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::coords::{ChunkCoord, Direction};
    use crate::portal::PortalMode;
    use crate::seeds::WorldSeeds;

    fn machine() -> TransitionMachine {
        TransitionMachine::new(&WorldConfig::default())
    }

    fn down_entrance(position: Vec2) -> Entrance {
        let config = WorldConfig::default();
        Entrance {
            id: 77,
            chunk: ChunkCoord::new(0, 0, 0),
            group: 0,
            position,
            direction: Direction::Down,
            mouth_width: config.mouth_width,
            mouth_height: config.mouth_height,
            depth: config.portal_depth,
            mode: PortalMode::TwoWay,
            to_layer: 1,
        }
    }

    #[test]
    fn test_engages_inside_mouth_moving_with_facing() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);

        // Facing Down, moving (0, 1): dot = 1.0, well over the threshold.
        let engaged = machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance]);
        assert!(engaged);
        assert!(!machine.is_idle());
        assert_eq!(machine.progress(), Some(0.0));
    }

    #[test]
    fn test_rejects_outside_mouth() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(300.0, 300.0), 0);

        assert!(!machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance]));
        assert!(machine.is_idle());
    }

    #[test]
    fn test_rejects_movement_against_facing() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);

        // Moving up against a Down-facing mouth: dot = -1.
        assert!(!machine.try_engage(&player, Vec2::new(0.0, -1.0), &[entrance.clone()]));
        // Pure sideways motion fails the cosine gate too.
        assert!(!machine.try_engage(&player, Vec2::new(1.0, 0.0), &[entrance.clone()]));
        // A diagonal within the threshold passes.
        assert!(machine.try_engage(&player, Vec2::new(0.4, 1.0), &[entrance]));
    }

    #[test]
    fn test_zero_movement_never_engages() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);

        assert!(!machine.try_engage(&player, Vec2::ZERO, &[entrance]));
    }

    #[test]
    fn test_first_entrance_wins_tie() {
        let mut machine = machine();
        let mut first = down_entrance(Vec2::new(100.0, 100.0));
        first.id = 1;
        let mut second = down_entrance(Vec2::new(102.0, 100.0));
        second.id = 2;
        let player = Player::new(Vec2::new(101.0, 100.0), 0);

        assert!(machine.try_engage(&player, Vec2::new(0.0, 1.0), &[first, second]));
        assert_eq!(machine.active().map(|a| a.entrance.id), Some(1));
    }

    #[test]
    fn test_progress_is_monotonic_and_completes() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);
        machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance]);

        let dt = 0.1;
        let mut last = 0.0f32;
        let mut completed = None;
        for _ in 0..60 {
            let result = machine.tick(dt);
            if let Some(p) = machine.progress() {
                assert!(p >= last);
                last = p;
            }
            if result.is_some() {
                completed = result;
                break;
            }
        }

        assert_eq!(completed, Some(1));
        assert!(machine.is_idle());
        assert!(machine.cooling_down());
        assert!(last <= 1.0);
    }

    #[test]
    fn test_no_second_engagement_while_active() {
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);

        assert!(machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance.clone()]));
        machine.tick(0.1);
        assert!(!machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance]));
    }

    #[test]
    fn test_cooldown_blocks_retrigger_until_elapsed() {
        let config = WorldConfig::default();
        let mut machine = machine();
        let entrance = down_entrance(Vec2::new(100.0, 100.0));
        let player = Player::new(Vec2::new(100.0, 100.0), 0);

        machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance.clone()]);
        // Run the crossing to completion in one oversized step.
        assert_eq!(machine.tick(10.0), Some(1));
        assert!(machine.cooling_down());

        // Blocked during cooldown.
        assert!(!machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance.clone()]));

        // Drain the cooldown, then engagement works again.
        let mut remaining = config.cooldown;
        while remaining > 0.0 {
            machine.tick(0.1);
            remaining -= 0.1;
        }
        machine.tick(0.1);
        assert!(!machine.cooling_down());
        assert!(machine.try_engage(&player, Vec2::new(0.0, 1.0), &[entrance]));
    }

    #[test]
    fn test_update_engages_against_world_entrances() {
        let config = WorldConfig::default();
        let mut world = WorldService::new(config.clone(), WorldSeeds::from_master(42));
        let cs = config.chunk_size as f32;

        // Find a real entrance and park the player in its mouth.
        let mut target = None;
        'search: for cy in (0..40).step_by(2) {
            for cx in (0..40).step_by(2) {
                let point = Vec2::new((cx as f32 + 0.5) * cs, (cy as f32 + 0.5) * cs);
                for layer in 0..3u8 {
                    if let Some(e) = world.entrances_near(layer, point, 0, 0.0).first() {
                        target = Some((layer, e.clone()));
                        break 'search;
                    }
                }
            }
        }
        let (layer, entrance) = target.expect("no entrance in sample window");

        let mut machine = TransitionMachine::new(&config);
        let player = Player::new(entrance.position, layer);
        let movement = entrance.direction.unit();

        machine.update(&mut world, &player, movement, 0.05, 1.0);
        assert!(!machine.is_idle(), "player in mouth moving into facing must engage");
        assert_eq!(machine.active().map(|a| a.to_layer), Some(entrance.to_layer));
    }
}
