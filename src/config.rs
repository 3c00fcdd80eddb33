use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional, and the
/// tool deliberately has no command-line surface.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Media-library root holding `database.xml` and `History/`
    /// (overrides `~/Documents/VirtualDJ`).
    pub library_dir: Option<PathBuf>,
    /// Where chart files and the index are written (default: current dir).
    pub output_dir: Option<PathBuf>,
    /// Chart geometry and timeline bounds.
    pub chart: ChartConfig,
}

/// Chart coordinate-space bounds. Every field has a fixed default; the
/// config file can stretch the calendar range without a rebuild.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    /// Width of each svg in pixels.
    pub width: u32,
    /// Height of each svg in pixels.
    pub height: u32,
    /// Where the name of the dance ends and the graph starts.
    pub offset: u32,
    /// Radius of one play's circle.
    pub radius: u32,
    /// First year on the calendar axis (inclusive boundary line).
    pub start_year: i32,
    /// Year closing the calendar axis.
    pub end_year: i32,
    /// Start of the evening window, whole hour (local clock).
    pub evening_start_hour: u32,
    /// End of the evening window, whole hour (local clock).
    pub evening_end_hour: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 60,
            offset: 200,
            radius: 2,
            start_year: 2021,
            end_year: 2026,
            evening_start_hour: 19,
            evening_end_hour: 22,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/danceplot/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the library root: config override, else
    /// `~/Documents/VirtualDJ`, else a `VirtualDJ` dir under the cwd.
    pub fn resolve_library_dir(&self) -> PathBuf {
        if let Some(dir) = &self.library_dir {
            return dir.clone();
        }
        match UserDirs::new() {
            Some(dirs) => dirs.home_dir().join("Documents").join("VirtualDJ"),
            None => PathBuf::from("VirtualDJ"),
        }
    }

    /// Resolve the output directory (default: current directory).
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// The catalog document inside the library root.
    pub fn catalog_path(&self) -> PathBuf {
        self.resolve_library_dir().join("database.xml")
    }

    /// The per-day playlist tree inside the library root.
    pub fn history_dir(&self) -> PathBuf {
        self.resolve_library_dir().join("History")
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
