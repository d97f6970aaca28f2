//! Terminal-based world explorer using ratatui
//!
//! Walks a player across streamed chunks and through portals. Movement keys
//! nudge the player; entering an entrance mouth while moving into its facing
//! starts a crossing, rendered as a crossfade toward the destination layer.
//! The active layer flips when the crossing completes.

use std::error::Error;
use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::Paragraph};

use crate::config::layer_name;
use crate::coords::{Vec2, Viewport};
use crate::export::{self, ExportOptions};
use crate::seeds::WorldSeeds;
use crate::transition::{Player, TransitionMachine};
use crate::world::WorldService;

/// Player speed in world units per second.
const PLAYER_SPEED: f32 = 80.0;

/// Upper bound on a single frame step, so a stalled terminal cannot jump
/// the simulation.
const MAX_DT: f32 = 0.1;

/// Chunk radius scanned for portal highlighting around the player.
const HIGHLIGHT_RADIUS: i32 = 1;

/// Explorer state
struct Explorer {
    world: WorldService,
    machine: TransitionMachine,
    player: Player,
    /// Simulated clock in seconds; stamps every cache access.
    clock: f64,
    /// Message to display temporarily
    message: Option<String>,
}

impl Explorer {
    fn new(world: WorldService) -> Self {
        let center = world.config().world_extent() * 0.5;
        let machine = TransitionMachine::new(world.config());

        Explorer {
            world,
            machine,
            player: Player::new(Vec2::new(center, center), 0),
            clock: 0.0,
            message: None,
        }
    }

    /// Rebuild the world with a new random seed, keeping the player where
    /// they stand.
    fn regenerate(&mut self) {
        let config = self.world.config().clone();
        let new_seed: u64 = rand::random();
        self.world = WorldService::new(config.clone(), WorldSeeds::from_master(new_seed));
        self.machine = TransitionMachine::new(&config);
        self.message = Some(format!("New world generated! Seed: {}", new_seed));
    }

    /// Advance one frame: move the player, feed the transition machine, and
    /// flip the layer when a crossing completes.
    fn step(&mut self, intent: Vec2, dt: f32) {
        let heading = intent.normalized();
        self.player.velocity = heading.scaled(PLAYER_SPEED);

        let extent = self.world.config().world_extent();
        let pos = self.player.position + self.player.velocity.scaled(dt);
        self.player.position = Vec2::new(
            pos.x.clamp(0.0, extent - 1.0),
            pos.y.clamp(0.0, extent - 1.0),
        );

        if let Some(destination) =
            self.machine
                .update(&mut self.world, &self.player, heading, dt, self.clock)
        {
            self.player.layer = destination;
            self.message = Some(format!("Crossed into the {}", layer_name(destination)));
        }

        self.clock += dt as f64;
    }

    /// Color of the world pixel at (wx, wy) on a layer.
    fn sample(&mut self, layer: u8, wx: f32, wy: f32) -> (u8, u8, u8) {
        let cs = self.world.config().chunk_size as i32;
        let now = self.clock;
        let cx = (wx as i32).div_euclid(cs);
        let cy = (wy as i32).div_euclid(cs);
        let px = (wx as i32).rem_euclid(cs) as u32;
        let py = (wy as i32).rem_euclid(cs) as u32;
        self.world.chunk(layer, cx, cy, now).buffer.get(px, py)
    }

    /// Render the world around the player, one terminal cell per world unit.
    fn render_map(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Preload the visible chunk window plus margin before per-cell
        // sampling, so popping never reaches the screen edge.
        let view = Viewport::centered_on(
            self.player.position,
            area.width as f32,
            area.height as f32,
        );
        for (cx, cy) in self.world.chunk_range(&view).iter() {
            self.world.chunk(self.player.layer, cx, cy, self.clock);
        }

        let extent = self.world.config().world_extent();
        let crossing = self.machine.active().cloned();
        let highlight = self.world.entrances_near(
            self.player.layer,
            self.player.position,
            HIGHLIGHT_RADIUS,
            self.clock,
        );

        let cam_x = self.player.position.x - area.width as f32 * 0.5;
        let cam_y = self.player.position.y - area.height as f32 * 0.5;

        for dy in 0..area.height {
            for dx in 0..area.width {
                let wx = (cam_x + dx as f32).clamp(0.0, extent - 1.0);
                let wy = (cam_y + dy as f32).clamp(0.0, extent - 1.0);

                let mut color = self.sample(self.player.layer, wx, wy);
                if let Some(active) = &crossing {
                    let far = self.sample(active.to_layer, wx, wy);
                    color = blend(color, far, active.progress);
                }

                if highlight
                    .iter()
                    .any(|e| e.mouth_contains(Vec2::new(wx, wy)))
                {
                    color = lighten(color);
                }

                let cell = buf.get_mut(area.x + dx, area.y + dy);
                if dx == area.width / 2 && dy == area.height / 2 {
                    // The camera is centered on the player.
                    cell.set_char('@').set_style(
                        Style::default()
                            .fg(Color::White)
                            .bg(Color::Rgb(color.0, color.1, color.2))
                            .add_modifier(Modifier::BOLD),
                    );
                } else {
                    cell.set_char(' ')
                        .set_style(Style::default().bg(Color::Rgb(color.0, color.1, color.2)));
                }
            }
        }
    }

    fn status_line(&self) -> String {
        let state = if let Some(active) = self.machine.active() {
            format!(
                "Crossing to {}: {:3.0}%",
                layer_name(active.to_layer),
                active.progress * 100.0
            )
        } else if self.machine.cooling_down() {
            "Portal cooling down".to_string()
        } else {
            "Walking".to_string()
        };
        let msg = self
            .message
            .as_ref()
            .map(|m| format!(" | {}", m))
            .unwrap_or_default();

        format!(
            " {} ({:.0},{:.0}) | {} | Chunks:{} | {}{} | WASD:Move  E:Export  R:New world  Q:Quit",
            layer_name(self.player.layer),
            self.player.position.x,
            self.player.position.y,
            state,
            self.world.cache_len(),
            self.world.cache_stats().summary(),
            msg,
        )
    }

    /// Export the chunks around the player to a PNG in the working directory.
    fn export_surroundings(&mut self) {
        let cs = self.world.config().chunk_size as f32;
        let cx = (self.player.position.x / cs) as i32;
        let cy = (self.player.position.y / cs) as i32;
        let filename = format!(
            "rift_{}_layer{}.png",
            self.world.seeds().master,
            self.player.layer
        );

        let options = ExportOptions {
            scale: 1,
            mark_entrances: true,
        };
        match export::export_area(
            &mut self.world,
            self.player.layer,
            cx,
            cy,
            2,
            &filename,
            &options,
            self.clock,
        ) {
            Ok(_) => self.message = Some(format!("Exported: {}", filename)),
            Err(e) => self.message = Some(format!("Export failed: {}", e)),
        }
    }
}

/// Linear blend between two colors, t in [0, 1].
fn blend(near: (u8, u8, u8), far: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
    (mix(near.0, far.0), mix(near.1, far.1), mix(near.2, far.2))
}

/// Brighten a color to mark an entrance mouth.
fn lighten((r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
    let lift = |c: u8| -> u8 { (c as u16 + 70).min(255) as u8 };
    (lift(r), lift(g), lift(b))
}

/// Run the explorer
pub fn run_explorer(world: WorldService) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut explorer = Explorer::new(world);
    let mut last_frame = Instant::now();

    loop {
        // Render
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(size);

            explorer.render_map(chunks[0], f.buffer_mut());

            let status = Paragraph::new(explorer.status_line())
                .style(Style::default().bg(Color::DarkGray).fg(Color::White));
            f.render_widget(status, chunks[1]);
        })?;

        // Clear message after display
        explorer.message = None;

        // Handle input
        let mut intent = Vec2::ZERO;
        if event::poll(Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,

                    // Movement
                    KeyCode::Up | KeyCode::Char('w') => intent.y -= 1.0,
                    KeyCode::Down | KeyCode::Char('s') => intent.y += 1.0,
                    KeyCode::Left | KeyCode::Char('a') => intent.x -= 1.0,
                    KeyCode::Right | KeyCode::Char('d') => intent.x += 1.0,

                    // Export image
                    KeyCode::Char('e') | KeyCode::Char('E') => explorer.export_surroundings(),

                    // Regenerate world with new seed
                    KeyCode::Char('r') | KeyCode::Char('R') => explorer.regenerate(),

                    _ => {}
                }
            }
        }

        let dt = last_frame.elapsed().as_secs_f32().min(MAX_DT);
        last_frame = Instant::now();
        explorer.step(intent, dt);
    }

    // Cleanup
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
