use std::{env, path::PathBuf, time::Duration};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::core::TeamId;
use crate::logging::LOG_FILE;

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
}

/// Where the dashboard backend lives and who we are to it.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub api_host: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default = "default_project_name")]
    pub project_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_host: "http://localhost:4019".to_string(),
            api_token: None,
            team_id: None,
            project_name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "New dashboard".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            completion_delay_ms: default_completion_delay_ms(),
        }
    }
}

fn default_completion_delay_ms() -> u64 {
    2000
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Layer the embedded defaults, the user file and `CHARTMOLD_*`
    /// environment variables, later sources winning.
    ///
    /// An explicit `config_path` must exist. Without one the home file
    /// `~/.chartmold-config.json5` is read when present.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        builder = match config_path {
            Some(p) => builder.add_source(
                config::File::from(expand_tilde(p))
                    .format(config::FileFormat::Json5)
                    .required(true),
            ),
            None => builder.add_source(
                config::File::from(default_home_config_path())
                    .format(config::FileFormat::Json5)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(PROJECT_NAME.as_str())
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.generation.completion_delay_ms)
    }

    /// The log file lives in the data directory.
    pub fn log_path(&self) -> PathBuf {
        self.config.data_dir.join(LOG_FILE.as_str())
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(rest) = s.strip_prefix('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(format!("{}{rest}", base.home_dir().display()));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".chartmold-config.json5");
    }
    PathBuf::from(".chartmold-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".data")
    }
}
