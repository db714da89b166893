//! Non-interactive output: structure dumps and single printed frames.

use crate::config::{clock_seed, FrameConfig, GenerateConfig, GenerateFormat};
use crate::lightning::{BoltField, BoltStructure, FractalBoltGenerator, GeneratorParams};
use crate::projection::OrbitCamera;
use crate::raster::Canvas;
use crate::terminal::Terminal;
use crate::vec3::Vec3;
use rand::prelude::*;
use std::io::{self, Write};

/// Fallback frame size when stdout is not a terminal
const DEFAULT_FRAME_SIZE: (u16, u16) = (100, 40);
/// Bolts start above the origin so the strike fills the frame
const FRAME_ORIGIN_HEIGHT: f32 = 12.0;
/// Tick length fed to the animator clock
const TICK_MS: f64 = 1000.0 / 60.0;

/// Build one structure and write it in the requested format
pub fn generate<W: Write>(config: &GenerateConfig, params: GeneratorParams, out: &mut W) -> io::Result<()> {
    let seed = config.seed.unwrap_or_else(clock_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let structure = FractalBoltGenerator::new(params).generate(config.origin, config.mode, config.max_depth, &mut rng);
    tracing::info!(seed, branches = structure.branches.len(), "generated structure");

    match config.format {
        GenerateFormat::Json => serde_json::to_writer(&mut *out, &structure)?,
        GenerateFormat::PrettyJson => serde_json::to_writer_pretty(&mut *out, &structure)?,
        GenerateFormat::Summary => write!(out, "{}", summary(&structure))?,
    }
    writeln!(out)
}

/// One-line description of a structure
pub fn summary(structure: &BoltStructure) -> String {
    let deepest = structure.branches.iter().map(|b| b.depth).max().unwrap_or(0);
    let length: f32 = structure
        .segments
        .iter()
        .filter(|s| !s.is_tip)
        .map(|s| s.length())
        .sum();
    format!(
        "mode={:?} branches={} segments={} tips={} depth={} length={:.1}",
        structure.mode,
        structure.branches.len(),
        structure.segments.len(),
        structure.tip_count(),
        deepest,
        length,
    )
}

/// Animate one bolt for `ticks` frames and render the result into a back buffer
pub fn render_frame(config: &FrameConfig) -> Terminal {
    let seed = config.seed.unwrap_or_else(clock_seed);
    let (w, h) = config
        .size
        .or_else(|| crossterm::terminal::size().ok())
        .unwrap_or(DEFAULT_FRAME_SIZE);

    let mut field = BoltField::new(config.field, seed);
    field.spawn_mode(Vec3::new(0.0, FRAME_ORIGIN_HEIGHT, 0.0), config.mode);
    for tick in 0..config.ticks {
        if field.tick(tick as f64 * TICK_MS) > 0 {
            tracing::warn!(tick, "bolt burned out before the requested frame");
            break;
        }
    }

    let camera = OrbitCamera::new(w, h);
    let mut canvas = Canvas::new(w, h);
    for bolt in field.iter() {
        canvas.draw_bolt(&camera, bolt, config.thickness);
    }
    let mut term = Terminal::headless(w, h);
    canvas.blit(&mut term, config.color_scheme);
    term
}

/// Print mode: render a frame straight to stdout
pub fn run_frame(config: FrameConfig) -> io::Result<()> {
    render_frame(&config).print_to_stdout()
}
