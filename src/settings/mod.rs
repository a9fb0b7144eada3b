//! Persisted server connection settings, served asynchronously from a background thread.

pub mod address;
mod store;


use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use crate::config::SETTINGS_THREAD_NAME;
use crate::link::ConnectionTarget;

pub use store::SettingsStore;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is malformed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("settings encode failed: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("settings manager is disposed")]
    Disposed,
}

/// Stored server endpoint. Either half may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerInfo {
    pub address: Option<String>,
    pub port: Option<u16>,
}

impl ServerInfo {
    pub fn new(address: Option<String>, port: Option<u16>) -> Self {
        Self { address, port }
    }

    /// Complete, usable target, or `None` when either half is missing or invalid.
    pub fn target(&self) -> Option<ConnectionTarget> {
        ConnectionTarget::new(self.address.as_deref()?, self.port?)
    }
}

pub type ServerInfoReply = Receiver<Result<ServerInfo, SettingsError>>;
pub type UpdateReply = Receiver<Result<(), SettingsError>>;

enum Request {
    Get(Sender<Result<ServerInfo, SettingsError>>),
    Set(ServerInfo, Sender<Result<(), SettingsError>>),
}

impl Request {
    fn reject(self) {
        match self {
            Self::Get(reply) => {
                let _ = reply.send(Err(SettingsError::Disposed));
            }
            Self::Set(_, reply) => {
                let _ = reply.send(Err(SettingsError::Disposed));
            }
        }
    }
}

/// Serves reads and upserts of [`ServerInfo`] on a dedicated thread. Every call returns
/// at once with a receiver that yields exactly one result.
pub struct SettingsManager {
    path: PathBuf,
    requests: Option<Sender<Request>>,
    handle: Option<JoinHandle<()>>,
}

impl SettingsManager {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let store = SettingsStore::new(path);
        let path = store.path().to_path_buf();
        let (requests, queue) = crossbeam_channel::unbounded();
        let handle = thread::Builder::new()
            .name(SETTINGS_THREAD_NAME.into())
            .spawn(move || serve(&store, &queue))
            .map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            requests: Some(requests),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_server_connection_info(&self) -> ServerInfoReply {
        let (reply, result) = crossbeam_channel::bounded(1);
        self.submit(Request::Get(reply));
        result
    }

    pub fn set_server_connection_info(
        &self,
        address: Option<String>,
        port: Option<u16>,
    ) -> UpdateReply {
        let (reply, result) = crossbeam_channel::bounded(1);
        self.submit(Request::Set(ServerInfo::new(address, port), reply));
        result
    }

    pub fn is_disposed(&self) -> bool {
        self.requests.is_none()
    }

    /// Finishes queued requests and stops the thread. Later calls reply `Disposed`.
    pub fn dispose(&mut self) {
        if self.requests.take().is_none() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("settings: worker thread panicked");
            }
        }
        debug!("settings: disposed {}", self.path.display());
    }

    fn submit(&self, request: Request) {
        match &self.requests {
            Some(requests) => {
                if let Err(err) = requests.send(request) {
                    err.into_inner().reject();
                }
            }
            None => request.reject(),
        }
    }
}

impl Drop for SettingsManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn serve(store: &SettingsStore, queue: &Receiver<Request>) {
    for request in queue {
        match request {
            Request::Get(reply) => {
                let result = store.load();
                if let Err(err) = &result {
                    warn!("settings: load failed: {err}");
                }
                let _ = reply.send(result);
            }
            Request::Set(info, reply) => {
                let result = store.save(&info);
                if let Err(err) = &result {
                    warn!("settings: save failed: {err}");
                }
                let _ = reply.send(result);
            }
        }
    }
}
