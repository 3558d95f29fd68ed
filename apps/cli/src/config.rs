use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use monitor_app::{AppError, MonitorConfig, Result, ViewPreferences};

const CONFIG_DIR_NAME: &str = "agent-monitor";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub monitor: MonitorConfig,
    pub preferences: ViewPreferences,
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub paths: ConfigPaths,
    pub created: bool,
}

pub fn load_or_create(dir_override: Option<&Path>) -> Result<ConfigLoad> {
    let dir = match dir_override {
        Some(dir) => dir.to_path_buf(),
        None => config_dir()?,
    };
    fs::create_dir_all(&dir)?;
    let paths = ConfigPaths {
        file: dir.join(CONFIG_FILE_NAME),
    };

    if paths.file.exists() {
        let contents = fs::read_to_string(&paths.file)?;
        let config: CliConfig = toml::from_str(&contents).map_err(|err| {
            AppError::Config(format!("parse config {}: {}", paths.file.display(), err))
        })?;
        return Ok(ConfigLoad {
            config,
            paths,
            created: false,
        });
    }

    let config = CliConfig::default();
    save(&paths, &config)?;
    Ok(ConfigLoad {
        config,
        paths,
        created: true,
    })
}

pub fn save(paths: &ConfigPaths, config: &CliConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|err| AppError::Config(format!("serialize config: {}", err)))?;
    fs::write(&paths.file, contents)?;
    Ok(())
}

fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("AGENT_MONITOR_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(dir).join(CONFIG_DIR_NAME));
    }
    let home = std::env::var("HOME")
        .map_err(|err| AppError::Config(format!("resolve HOME: {}", err)))?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}
