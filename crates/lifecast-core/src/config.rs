//! Configuration loading and typed config structures for Lifecast.
//!
//! The optional configuration file is `lifecast-config.yaml` in the
//! working directory. Every field has a default, so an absent file or a
//! partial file is fine. A few environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LIFECAST_HOST` | `server.host` |
//! | `LIFECAST_PORT` | `server.port` |
//! | `LIFECAST_SEED` | `world.seed` |

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use lifecast_render::FrameFormat;
use lifecast_world::{Grid, WorldError};
use serde::Deserialize;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "lifecast-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifecastConfig {
    /// Listening address.
    #[serde(default)]
    pub server: ServerConfig,

    /// Grid dimensions and initial population.
    #[serde(default)]
    pub world: WorldConfig,

    /// Frame encoding for the simulation stream.
    #[serde(default)]
    pub render: RenderConfig,

    /// Producer cadences.
    #[serde(default)]
    pub timing: TimingConfig,
}

impl LifecastConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    /// Environment overrides apply either way.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string and apply environment overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LIFECAST_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LIFECAST_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LIFECAST_PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("LIFECAST_PORT={port:?}: {e}"),
            })?;
        }
        if let Some(seed) = lookup("LIFECAST_SEED") {
            let parsed = seed.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "world.seed",
                reason: format!("LIFECAST_SEED={seed:?}: {e}"),
            })?;
            self.world.seed = Some(parsed);
        }
        Ok(())
    }

    /// Check value ranges serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(ConfigError::Invalid {
                field: "world.width/world.height",
                reason: format!(
                    "dimensions must be non-zero (got {}x{})",
                    self.world.width, self.world.height
                ),
            });
        }
        if self.world.density_percent > 100 {
            return Err(ConfigError::Invalid {
                field: "world.density_percent",
                reason: format!("must be at most 100 (got {})", self.world.density_percent),
            });
        }
        self.render.cell_scale()?;
        if self.timing.step_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.step_interval_ms",
                reason: String::from("must be non-zero"),
            });
        }
        if self.timing.counter_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.counter_interval_ms",
                reason: String::from("must be non-zero"),
            });
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` as a single string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Grid settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Columns.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Rows.
    #[serde(default = "default_height")]
    pub height: usize,

    /// Chance, in percent, that a cell starts live.
    #[serde(default = "default_density_percent")]
    pub density_percent: u32,

    /// Seed for the initial grid. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WorldConfig {
    /// The configured seed, or a fresh random one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Build the initial grid from these settings and `seed`.
    pub fn build_grid(&self, seed: u64) -> Result<Grid, WorldError> {
        Grid::random(self.width, self.height, self.density_percent, seed)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            density_percent: default_density_percent(),
            seed: None,
        }
    }
}

/// Frame encoding settings for the simulation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// Pixels per cell. Must be non-zero.
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Image format of simulation frames.
    #[serde(default)]
    pub format: FrameFormat,
}

impl RenderConfig {
    /// [`scale`](Self::scale) as a [`NonZeroU32`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the scale is zero.
    pub fn cell_scale(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.scale).ok_or_else(|| ConfigError::Invalid {
            field: "render.scale",
            reason: String::from("must be non-zero"),
        })
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            format: FrameFormat::default(),
        }
    }
}

/// Producer cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Delay between simulation steps while someone is watching.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    /// Period of unconditional viewer-count refreshes.
    #[serde(default = "default_counter_interval_ms")]
    pub counter_interval_ms: u64,
}

impl TimingConfig {
    /// [`step_interval_ms`](Self::step_interval_ms) as a [`Duration`].
    pub const fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// [`counter_interval_ms`](Self::counter_interval_ms) as a [`Duration`].
    pub const fn counter_interval(&self) -> Duration {
        Duration::from_millis(self.counter_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: default_step_interval_ms(),
            counter_interval_ms: default_counter_interval_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

const fn default_width() -> usize {
    80
}

const fn default_height() -> usize {
    60
}

const fn default_density_percent() -> u32 {
    20
}

const fn default_scale() -> u32 {
    10
}

const fn default_step_interval_ms() -> u64 {
    1_000
}

const fn default_counter_interval_ms() -> u64 {
    1_000
}
