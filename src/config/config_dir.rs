use std::path::PathBuf;

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

/// Explicit config path, wins over every other location.
pub static CONFIG_ENV: &str = "GRITFLOW_CONFIG";

pub fn find_config_file(use_local: bool) -> PathBuf {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(explicit);
    }

    if use_local {
        return PathBuf::from("./config.toml");
    }

    #[cfg(unix)]
    let base = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"));
    #[cfg(windows)]
    let base = std::env::var_os("APPDATA").map(PathBuf::from);

    if let Some(base) = base {
        let path = base.join(crate::APPLICATION_NAME).join("config.toml");
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("./config.toml")
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    read_config_at(find_config_file(use_local))
}

fn read_config_at(filename: PathBuf) -> ConfigResult<Vec<u8>> {
    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("using {} as configuration file", filename.display());

    Ok(std::fs::read(filename)?)
}
