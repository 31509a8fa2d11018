use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::config::StoredConfig;
use crate::errors::DeobfuscateError;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_CONFIG_DIR_NAME: &str = ".ai-js-anti-obfuscation";

/// JSON file holding the API key and user-level defaults.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/.ai-js-anti-obfuscation/config.json`, or `config.json` in the
    /// working directory when no home directory is known.
    #[must_use]
    pub fn default_location() -> Self {
        let path = dirs::home_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE_NAME),
            |home| home.join(APP_CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        );
        Self::at(path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not valid JSON.
    /// A missing file is a first run and yields an empty record.
    pub fn load(&self) -> Result<StoredConfig, DeobfuscateError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using empty record", self.path.display());
                return Ok(StoredConfig::default());
            }
            Err(source) => {
                return Err(DeobfuscateError::ConfigIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&data).map_err(|e| DeobfuscateError::ConfigParse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Writes the record as indented JSON, readable by the owner only.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn save(&self, config: &StoredConfig) -> Result<(), DeobfuscateError> {
        let io_err = |source: std::io::Error| DeobfuscateError::ConfigIo {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let data = serde_json::to_string_pretty(config).map_err(|e| {
            DeobfuscateError::ConfigParse {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;

        let mut file = open_private(&self.path).map_err(io_err)?;
        file.write_all(data.as_bytes()).map_err(io_err)?;

        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
