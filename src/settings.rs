use crate::colors::DEFAULT_SCHEME;
use crate::error::SettingsError;
use crate::lightning::{AnimatorParams, FieldConfig, GeneratorParams, DEFAULT_MAX_DEPTH};
use crate::raster::DEFAULT_THICKNESS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub storm: StormSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StormSettings {
    pub max_bolts: usize,
    pub explosion_chance: f64,
    pub max_depth: u32,
    pub thickness: f32,
    pub color_scheme: u8,
    pub frame_time: f32,
    pub spawn_interval_ms: u64,
    pub generator: GeneratorParams,
    pub animator: AnimatorParams,
}

impl Default for StormSettings {
    fn default() -> Self {
        let field = FieldConfig::default();
        Self {
            max_bolts: field.capacity,
            explosion_chance: field.explosion_chance,
            max_depth: DEFAULT_MAX_DEPTH,
            thickness: DEFAULT_THICKNESS,
            color_scheme: DEFAULT_SCHEME,
            frame_time: 0.016,
            spawn_interval_ms: 50,
            generator: GeneratorParams::default(),
            animator: AnimatorParams::default(),
        }
    }
}

impl StormSettings {
    pub fn field_config(&self) -> FieldConfig {
        FieldConfig {
            capacity: self.max_bolts.max(1),
            explosion_chance: self.explosion_chance.clamp(0.0, 1.0),
            max_depth: self.max_depth,
            generator: self.generator,
            animator: self.animator,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive
    pub level: String,
    /// Log destination for the interactive view
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Settings {
    /// Load from the user config file; a missing file yields defaults
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("thunderbolt")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.storm.max_bolts, 50);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [storm]
            max_bolts = 12
            explosion_chance = 0.25

            [storm.animator]
            growth_speed = 0.02

            [log]
            level = "thunderbolt=debug"
            file = "/tmp/thunderbolt.log"
            "#,
        )
        .unwrap();
        assert_eq!(settings.storm.max_bolts, 12);
        assert_eq!(settings.storm.thickness, DEFAULT_THICKNESS);
        assert_eq!(settings.storm.animator.growth_speed, 0.02);
        assert_eq!(settings.storm.animator.shrink_speed, 0.01);
        assert_eq!(settings.log.file, Some(PathBuf::from("/tmp/thunderbolt.log")));

        let field = settings.storm.field_config();
        assert_eq!(field.capacity, 12);
        assert_eq!(field.explosion_chance, 0.25);
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("thunderbolt-no-such-dir").join("config.toml");
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn broken_file_reports_path() {
        let path = std::env::temp_dir().join(format!("thunderbolt-broken-{}.toml", std::process::id()));
        fs::write(&path, "[storm\nmax_bolts = ").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("thunderbolt-broken"));
    }

    #[test]
    fn config_path_is_namespaced() {
        assert!(Settings::config_path().ends_with("thunderbolt/config.toml"));
    }
}
