use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{ServerInfo, SettingsError};

/// On-disk shape. Unknown keys are kept across updates.
#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_port: Option<i64>,
    #[serde(flatten)]
    extra: toml::Table,
}

/// TOML-backed persistence for the server connection settings.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as "nothing configured"; an out-of-range port reads as absent.
    pub fn load(&self) -> Result<ServerInfo, SettingsError> {
        let file = self.read_file()?;
        let port = file.server_port.and_then(|port| {
            let port = u16::try_from(port).ok().filter(|port| *port != 0);
            if port.is_none() {
                debug!("settings: ignoring out-of-range port in {}", self.path.display());
            }
            port
        });
        Ok(ServerInfo {
            address: file.server_address.filter(|address| !address.is_empty()),
            port,
        })
    }

    /// Upserts both keys. `None` removes a key. The file is replaced atomically.
    pub fn save(&self, info: &ServerInfo) -> Result<(), SettingsError> {
        let mut file = self.read_file()?;
        file.server_address = info.address.clone().filter(|address| !address.is_empty());
        file.server_port = info.port.map(i64::from);
        let encoded = toml::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let staging = self.staging_path();
        fs::write(&staging, encoded).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| {
            let _ = fs::remove_file(&staging);
            self.io_error(err)
        })?;
        debug!("settings: saved {}", self.path.display());
        Ok(())
    }

    fn read_file(&self) -> Result<SettingsFile, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(SettingsFile::default()),
            Err(err) => return Err(self.io_error(err)),
        };
        toml::from_str(&raw).map_err(|source| SettingsError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
