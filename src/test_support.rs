//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::transport::{Session, SessionConfig, Transport};

/// Operation observed by [`MemoryTransport`], in call order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransportEvent {
    /// A connect attempt, successful or not.
    Connect,
    /// An upload to the named remote path.
    Upload(String),
    /// A download of the named remote path.
    Download(String),
    /// A removal of the named remote path.
    Delete(String),
    /// A session teardown.
    Disconnect,
}

/// Errors produced by [`MemoryTransport`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MemoryTransportError {
    /// Scripted connect failure.
    #[error("authentication rejected for user {0}")]
    ConnectRejected(String),
    /// Scripted upload failure.
    #[error("upload of {0} interrupted")]
    UploadInterrupted(String),
    /// Download of a path that was never uploaded.
    #[error("no such remote file: {0}")]
    Missing(String),
    /// Local stream failure while copying.
    #[error("local stream error: {0}")]
    Local(String),
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    events: Vec<TransportEvent>,
    connected: bool,
    disconnect_calls: u32,
    fail_connect: bool,
    fail_upload: bool,
    corrupt_download_at: Option<usize>,
    truncate_download: bool,
}

/// In-memory SFTP stand-in that echoes uploaded bytes back on download.
///
/// Clones share state, so a test can keep one handle for assertions while the
/// verifier owns another. Faults are scripted up front.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    state: Rc<RefCell<State>>,
}

impl MemoryTransport {
    /// Creates a lossless echo transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent connect fail as if the credentials were wrong.
    pub fn fail_on_connect(&self) {
        self.state.borrow_mut().fail_connect = true;
    }

    /// Makes uploads fail after the remote file has been created empty.
    pub fn fail_on_upload(&self) {
        self.state.borrow_mut().fail_upload = true;
    }

    /// Flips the byte at `index` (clamped to the last byte) in downloads.
    pub fn corrupt_download_at(&self, index: usize) {
        self.state.borrow_mut().corrupt_download_at = Some(index);
    }

    /// Drops the final byte from downloads.
    pub fn truncate_download(&self) {
        self.state.borrow_mut().truncate_download = true;
    }

    /// Returns a snapshot of recorded operations.
    #[must_use]
    pub fn events(&self) -> Vec<TransportEvent> {
        self.state.borrow().events.clone()
    }

    /// Returns the names of objects currently stored remotely.
    #[must_use]
    pub fn remote_files(&self) -> Vec<String> {
        self.state.borrow().files.keys().cloned().collect()
    }

    /// Returns the stored bytes for `remote_path`, if present.
    #[must_use]
    pub fn remote_file(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.state.borrow().files.get(remote_path).cloned()
    }

    /// Returns `true` while a session is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Returns how many times a session was disconnected.
    #[must_use]
    pub fn disconnect_calls(&self) -> u32 {
        self.state.borrow().disconnect_calls
    }
}

impl Transport for MemoryTransport {
    type Error = MemoryTransportError;
    type Session = MemorySession;

    fn connect(&self, config: &SessionConfig) -> Result<Self::Session, Self::Error> {
        let mut state = self.state.borrow_mut();
        state.events.push(TransportEvent::Connect);
        if state.fail_connect {
            return Err(MemoryTransportError::ConnectRejected(
                config.username.clone(),
            ));
        }
        state.connected = true;
        Ok(MemorySession {
            state: Rc::clone(&self.state),
        })
    }
}

/// Session handed out by [`MemoryTransport`].
#[derive(Debug)]
pub struct MemorySession {
    state: Rc<RefCell<State>>,
}

impl Session for MemorySession {
    type Error = MemoryTransportError;

    fn upload(&mut self, source: &mut dyn Read, remote_path: &str) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state
            .events
            .push(TransportEvent::Upload(remote_path.to_owned()));
        if state.fail_upload {
            state.files.insert(remote_path.to_owned(), Vec::new());
            return Err(MemoryTransportError::UploadInterrupted(
                remote_path.to_owned(),
            ));
        }
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|err| MemoryTransportError::Local(err.to_string()))?;
        state.files.insert(remote_path.to_owned(), bytes);
        Ok(())
    }

    fn download(&mut self, remote_path: &str, sink: &mut dyn Write) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state
            .events
            .push(TransportEvent::Download(remote_path.to_owned()));
        let mut bytes = state
            .files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| MemoryTransportError::Missing(remote_path.to_owned()))?;
        if let Some(index) = state.corrupt_download_at {
            let last = bytes.len().saturating_sub(1);
            if let Some(byte) = bytes.get_mut(index.min(last)) {
                *byte ^= 0xFF;
            }
        }
        if state.truncate_download {
            bytes.pop();
        }
        sink.write_all(&bytes)
            .map_err(|err| MemoryTransportError::Local(err.to_string()))
    }

    fn delete(&mut self, remote_path: &str) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state
            .events
            .push(TransportEvent::Delete(remote_path.to_owned()));
        state
            .files
            .remove(remote_path)
            .map(|_| ())
            .ok_or_else(|| MemoryTransportError::Missing(remote_path.to_owned()))
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.events.push(TransportEvent::Disconnect);
        state.connected = false;
        state.disconnect_calls += 1;
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
