use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use foundation::color::{DEFAULT_ABOVE_COLOUR, DEFAULT_BELOW_COLOUR};
use scene::picking::DEFAULT_HIT_RADIUS_PX;
use scene::query::DEFAULT_PROPERTY_KEYS;
use serde::Deserialize;
use thiserror::Error;

pub const SETTINGS_ENV_VAR: &str = "ENTMAP_SETTINGS";

/// Root of `entmap.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub logging: LoggingSettings,
    pub filters: FilterSettings,
    pub heights: HeightSettings,
    pub paint: PaintSettings,
    pub ziplines: ZiplineSettings,
}

impl ViewerSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `$ENTMAP_SETTINGS` if set, else `./config/entmap.toml` if present, else defaults.
    pub fn discover() -> Result<Self, SettingsError> {
        let cwd = env::current_dir().map_err(|source| SettingsError::Context {
            message: "cannot read current directory".to_string(),
            source,
        })?;
        Self::discover_in(env::var_os(SETTINGS_ENV_VAR), &cwd)
    }

    fn discover_in(explicit: Option<OsString>, cwd: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::from_file(PathBuf::from(path));
        }
        let default_path = cwd.join("config").join("entmap.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` still wins when set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub property_keys: Vec<String>,
    /// Start every include set with all values present after a load.
    pub seed_include_sets: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            property_keys: DEFAULT_PROPERTY_KEYS.iter().map(|k| k.to_string()).collect(),
            seed_include_sets: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeightSettings {
    pub below_colour: String,
    pub above_colour: String,
    pub hide_out_of_range: bool,
}

impl Default for HeightSettings {
    fn default() -> Self {
        Self {
            below_colour: DEFAULT_BELOW_COLOUR.to_string(),
            above_colour: DEFAULT_ABOVE_COLOUR.to_string(),
            hide_out_of_range: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaintSettings {
    pub height_dot_radius_px: f64,
    pub hit_radius_px: f64,
    /// Apply filters and the height gate to entity-type overlays as well.
    pub overlay_gating: bool,
    /// Colour assigned to a freshly loaded dataset.
    pub dataset_colour: String,
}

impl Default for PaintSettings {
    fn default() -> Self {
        Self {
            height_dot_radius_px: 5.0,
            hit_radius_px: DEFAULT_HIT_RADIUS_PX,
            overlay_gating: false,
            dataset_colour: "#e6194b".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZiplineSettings {
    pub class_field: String,
    pub start_marker: String,
    pub end_marker: String,
    pub link_field: String,
}

impl Default for ZiplineSettings {
    fn default() -> Self {
        Self {
            class_field: "classname".to_string(),
            start_marker: "zipline".to_string(),
            end_marker: "zipline_end".to_string(),
            link_field: "link_guid".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
