use crate::lightning::{BoltMode, FieldConfig};
use crate::vec3::Vec3;

/// Configuration for the interactive storm view
#[derive(Clone, Debug)]
pub struct StormConfig {
    pub time_step: f32,
    pub seed: Option<u64>,
    pub thickness: f32,
    pub color_scheme: u8,
    /// Minimum milliseconds between spawns while dragging
    pub spawn_interval_ms: u64,
    pub field: FieldConfig,
}

/// Configuration for a single printed frame
#[derive(Clone, Debug)]
pub struct FrameConfig {
    pub mode: BoltMode,
    pub ticks: usize,
    pub seed: Option<u64>,
    pub size: Option<(u16, u16)>,
    pub thickness: f32,
    pub color_scheme: u8,
    pub field: FieldConfig,
}

/// Output shape of the `generate` command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GenerateFormat {
    Json,
    PrettyJson,
    Summary,
}

/// Configuration for dumping one generated structure
#[derive(Clone, Debug)]
pub struct GenerateConfig {
    pub mode: BoltMode,
    pub origin: Vec3,
    pub max_depth: u32,
    pub seed: Option<u64>,
    pub format: GenerateFormat,
}

/// Seed from the wall clock, for runs without `--seed`
pub fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0) // Fallback seed for misconfigured system clocks
}
