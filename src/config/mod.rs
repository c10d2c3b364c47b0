use crate::error::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf};

pub mod shortcuts;
use shortcuts::Shortcuts;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Default amount for the skip commands, in seconds
    pub skip_seconds: f64,
    /// How often the status line refreshes
    pub tick_millis: u64,
    pub mpv_ao: Option<String>,
    pub keybindings: Shortcuts,
}

static INSTANCE: OnceCell<Config> = OnceCell::new();

impl Config {
    /// The global config. Falls back to the defaults if [Config::set_global] was never called.
    pub fn global() -> &'static Self {
        INSTANCE.get_or_init(Config::default)
    }

    pub fn set_global(instance: Self) -> Result<()> {
        INSTANCE
            .set(instance)
            .map_err(|_| "the global config was already set".into())
    }

    /// `$CONFIG_DIR/tonearm.yaml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir().unwrap_or_default().join("tonearm.yaml")
    }

    pub fn merge(mut self, other: OptionalConfig) -> Self {
        if let Some(skip_seconds) = other.skip_seconds {
            self.skip_seconds = skip_seconds;
        }

        if let Some(tick_millis) = other.tick_millis {
            self.tick_millis = tick_millis;
        }

        if let Some(keybindings) = other.keybindings {
            for (k, v) in keybindings.0 {
                self.keybindings.0.insert(k, v);
            }
        }

        if other.mpv_ao.is_some() {
            self.mpv_ao = other.mpv_ao;
        }

        self
    }
}

impl Default for Config {
    fn default() -> Self {
        serde_yaml::from_str(std::include_str!("../default_config.yaml"))
            .unwrap_or_else(|e| panic!("src/default_config.yaml is not valid yaml! {}", e))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OptionalConfig {
    pub skip_seconds: Option<f64>,
    pub tick_millis: Option<u64>,
    pub mpv_ao: Option<String>,
    pub keybindings: Option<Shortcuts>,
}

impl OptionalConfig {
    /// Loads the config from some path. A missing file is the same as an empty one.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        match std::fs::File::open(path) {
            Ok(file) => serde_yaml::from_reader(file).map_err(|e| {
                format!("Couldn't parse your tonearm.yaml config file. Reason: {}", e).into()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
