//! Interactive lightning storm.
//!
//! Click to strike, drag to keep striking; the newest bolt of a drag stays
//! lit until the button is released. The camera slowly orbits the scene.
//!
//! # Controls
//! - Mouse: click/drag to spawn bolts
//! - e / Space: explosion at the centre
//! - + / -: thicker/thinner bolts
//! - 1-9, 0: frame speed; Shift+digit: color scheme
//! - c: clear, p: pause, ?: help, q/Esc: quit

use crate::colors::ColorState;
use crate::config::{clock_seed, StormConfig};
use crate::help::show_help_modal;
use crate::lightning::{BoltField, BoltId};
use crate::projection::OrbitCamera;
use crate::raster::{Canvas, MAX_THICKNESS, MIN_THICKNESS, THICKNESS_STEP};
use crate::terminal::Terminal;
use crossterm::event::{Event, KeyCode, MouseButton, MouseEvent, MouseEventKind};
use crossterm::style::Color;
use std::io;
use std::time::{Duration, Instant};

const HELP: &str = "\
THUNDERBOLT
─────────────────
Click   Strike
Drag    Keep striking (held)
e/Space Explosion
+/-     Thickness
1-9,0   Speed
Shift+# Color scheme
c       Clear
p       Pause
q/Esc   Quit
?       Close help";

/// Sleep time when paused
const PAUSE_SLEEP: f32 = 0.1;

/// What a keypress asks the loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StormAction {
    None,
    Quit,
    Explode,
    Clear,
    Help,
}

/// Runtime state for interactive controls
pub struct StormState {
    pub speed: f32,
    pub thickness: f32,
    pub colors: ColorState,
    pub paused: bool,
}

impl StormState {
    pub fn new(config: &StormConfig) -> Self {
        Self {
            speed: config.time_step,
            thickness: config.thickness.clamp(MIN_THICKNESS, MAX_THICKNESS),
            colors: ColorState::new(config.color_scheme),
            paused: false,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> StormAction {
        if self.colors.handle_key(code) {
            return StormAction::None;
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return StormAction::Quit,
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Char(' ') => return StormAction::Explode,
            KeyCode::Char('c') => return StormAction::Clear,
            KeyCode::Char('?') => return StormAction::Help,
            KeyCode::Char('p') => self.paused = !self.paused,
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.thickness = (self.thickness + THICKNESS_STEP).min(MAX_THICKNESS);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.thickness = (self.thickness - THICKNESS_STEP).max(MIN_THICKNESS);
            }
            // Number keys: frame time (1=fastest, 9=slowest, 0=very slow)
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.speed = match c {
                    '1' => 0.005,
                    '2' => 0.01,
                    '3' => 0.016,
                    '4' => 0.025,
                    '5' => 0.035,
                    '6' => 0.05,
                    '7' => 0.07,
                    '8' => 0.1,
                    '9' => 0.15,
                    _ => 0.25,
                };
            }
            _ => {}
        }
        StormAction::None
    }

    fn status_line(&self, field: &BoltField) -> String {
        format!(
            " bolts {:>2}/{} | thickness {:>3}% | {} | ? help ",
            field.len(),
            field.config().capacity,
            (self.thickness * 100.0).round() as u32,
            self.colors.name(),
        )
    }
}

/// Tracks an in-progress mouse drag
struct Drag {
    last_spawn: Instant,
}

/// Run the interactive storm view
pub fn run(config: StormConfig) -> io::Result<()> {
    let seed = config.seed.unwrap_or_else(clock_seed);
    tracing::info!(seed, capacity = config.field.capacity, "starting storm");

    let mut term = Terminal::new(true, true)?;
    term.clear_screen()?;

    let (mut w, mut h) = term.size();
    let mut camera = OrbitCamera::new(w, h);
    let mut canvas = Canvas::new(w, h);
    let mut field = BoltField::new(config.field, seed);
    let mut state = StormState::new(&config);
    let spawn_interval = Duration::from_millis(config.spawn_interval_ms);
    let mut drag: Option<Drag> = None;
    let clock = Instant::now();

    loop {
        let (new_w, new_h) = crossterm::terminal::size().unwrap_or((w, h));
        if new_w != w || new_h != h {
            w = new_w;
            h = new_h;
            term.resize(w, h);
            term.clear_screen()?;
            camera.resize(w, h);
            canvas.resize(w, h);
        }

        while let Some(event) = term.poll_event()? {
            match event {
                Event::Key(key) => match state.handle_key(key.code) {
                    StormAction::Quit => return Ok(()),
                    StormAction::Explode => {
                        let centre = camera.unproject(w / 2, h / 2);
                        field.spawn(centre, true);
                    }
                    StormAction::Clear => {
                        field.clear();
                        drag = None;
                    }
                    StormAction::Help => {
                        if show_help_modal(&mut term, HELP)? {
                            return Ok(());
                        }
                    }
                    StormAction::None => {}
                },
                Event::Mouse(mouse) => handle_mouse(mouse, &camera, &mut field, &mut drag, spawn_interval),
                _ => {}
            }
        }

        if state.paused {
            term.sleep(PAUSE_SLEEP);
            continue;
        }

        camera.advance();
        let died = field.tick(clock.elapsed().as_secs_f64() * 1000.0);
        if died > 0 {
            tracing::trace!(died, live = field.len(), "bolts burned out");
        }

        canvas.clear();
        for bolt in field.iter() {
            canvas.draw_bolt(&camera, bolt, state.thickness);
        }
        canvas.blit(&mut term, state.colors.scheme);
        if h > 0 {
            term.set_str(0, h as i32 - 1, &state.status_line(&field), Some(Color::DarkGrey), false);
        }

        term.present()?;
        term.sleep(state.speed);
    }
}

fn handle_mouse(
    mouse: MouseEvent,
    camera: &OrbitCamera,
    field: &mut BoltField,
    drag: &mut Option<Drag>,
    spawn_interval: Duration,
) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            strike(camera, field, mouse.column, mouse.row);
            *drag = Some(Drag { last_spawn: Instant::now() });
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(d) = drag.as_mut() {
                if d.last_spawn.elapsed() >= spawn_interval {
                    strike(camera, field, mouse.column, mouse.row);
                    d.last_spawn = Instant::now();
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            *drag = None;
            field.release();
        }
        _ => {}
    }
}

/// Spawn at a cell and keep the new bolt alive while the button is down
fn strike(camera: &OrbitCamera, field: &mut BoltField, col: u16, row: u16) -> BoltId {
    let id = field.spawn(camera.unproject(col, row), false);
    field.hold(id);
    id
}
