use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thunderbolt::config::{FrameConfig, GenerateConfig, GenerateFormat, StormConfig};
use thunderbolt::lightning::BoltMode;
use thunderbolt::settings::Settings;
use thunderbolt::{snapshot, storm, Vec3};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thunderbolt")]
#[command(author = "Terminal Art Generator")]
#[command(version)]
#[command(about = "Terminal-based generative art: fractal Lichtenberg lightning", long_about = None)]
struct Cli {
    /// Write logs to this file (the storm view logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive storm: click and drag to summon lightning
    Storm {
        /// Animation speed (seconds per frame)
        #[arg(short, long)]
        time: Option<f32>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum bolts alive at once
        #[arg(short = 'n', long)]
        max_bolts: Option<usize>,

        /// Chance (0-1) that a strike is an explosion
        #[arg(short = 'x', long)]
        explosion_chance: Option<f64>,

        /// Bolt thickness (0.2-3.0)
        #[arg(short = 'w', long)]
        thickness: Option<f32>,

        /// Color scheme (0-9)
        #[arg(short, long)]
        color: Option<u8>,
    },

    /// Generate one bolt structure and print it
    Generate {
        /// Radial explosion instead of a downward strike
        #[arg(short, long)]
        explosion: bool,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Recursion depth (root is 0)
        #[arg(short, long)]
        depth: Option<u32>,

        /// Origin as x,y,z
        #[arg(short, long, value_parser = parse_point, default_value = "0,0,0")]
        origin: Vec3,

        /// Pretty-print the JSON
        #[arg(short, long, conflicts_with = "summary")]
        pretty: bool,

        /// Print a one-line summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Animate one bolt for a number of ticks and print the frame
    Frame {
        /// Radial explosion instead of a downward strike
        #[arg(short, long)]
        explosion: bool,

        /// Ticks to run before printing
        #[arg(short, long, default_value = "60")]
        ticks: usize,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Frame width in columns (defaults to the terminal)
        #[arg(long, requires = "height")]
        width: Option<u16>,

        /// Frame height in rows (defaults to the terminal)
        #[arg(long, requires = "width")]
        height: Option<u16>,

        /// Bolt thickness (0.2-3.0)
        #[arg(short = 'w', long)]
        thickness: Option<f32>,

        /// Color scheme (0-9)
        #[arg(short, long)]
        color: Option<u8>,
    },
}

fn parse_point(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{}: {}", p.trim(), e)))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(Vec3::new(*x, *y, *z)),
        [_, _, _] => Err("coordinates must be finite".to_string()),
        _ => Err(format!("expected x,y,z but got {} values", parts.len())),
    }
}

fn mode(explosion: bool) -> BoltMode {
    if explosion {
        BoltMode::Explosion
    } else {
        BoltMode::Directional
    }
}

/// Install the log subscriber. The storm view owns the screen, so it only
/// logs when a file is given; other commands log to stderr.
fn init_tracing(level: &str, file: Option<&Path>, interactive: bool) -> io::Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    match file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None if !interactive => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .compact()
                .init();
        }
        None => {}
    }
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let (settings, settings_error) = match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let interactive = matches!(cli.command, Commands::Storm { .. });
    let log_file = cli.log_file.as_deref().or(settings.log.file.as_deref());
    init_tracing(&settings.log.level, log_file, interactive)?;
    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "using default settings");
    }

    let storm_settings = &settings.storm;

    match cli.command {
        Commands::Storm {
            time,
            seed,
            max_bolts,
            explosion_chance,
            thickness,
            color,
        } => {
            let mut field = storm_settings.field_config();
            if let Some(n) = max_bolts {
                field.capacity = n.max(1);
            }
            if let Some(chance) = explosion_chance {
                field.explosion_chance = chance.clamp(0.0, 1.0);
            }
            let config = StormConfig {
                time_step: time.unwrap_or(storm_settings.frame_time),
                seed,
                thickness: thickness.unwrap_or(storm_settings.thickness),
                color_scheme: color.unwrap_or(storm_settings.color_scheme).min(9),
                spawn_interval_ms: storm_settings.spawn_interval_ms,
                field,
            };
            storm::run(config)?;
        }
        Commands::Generate {
            explosion,
            seed,
            depth,
            origin,
            pretty,
            summary,
        } => {
            let format = if summary {
                GenerateFormat::Summary
            } else if pretty {
                GenerateFormat::PrettyJson
            } else {
                GenerateFormat::Json
            };
            let config = GenerateConfig {
                mode: mode(explosion),
                origin,
                max_depth: depth.unwrap_or(storm_settings.max_depth),
                seed,
                format,
            };
            snapshot::generate(&config, storm_settings.generator, &mut io::stdout().lock())?;
        }
        Commands::Frame {
            explosion,
            ticks,
            seed,
            width,
            height,
            thickness,
            color,
        } => {
            let config = FrameConfig {
                mode: mode(explosion),
                ticks,
                seed,
                size: width.zip(height),
                thickness: thickness.unwrap_or(storm_settings.thickness),
                color_scheme: color.unwrap_or(storm_settings.color_scheme).min(9),
                field: storm_settings.field_config(),
            };
            snapshot::run_frame(config)?;
        }
    }

    Ok(())
}
