//! Transport abstraction for the remote side of a round trip.
//!
//! The verifier talks to the endpoint only through [`Transport`] and
//! [`Session`], so tests can substitute an in-memory store for the real
//! SFTP implementation.

use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Connection parameters handed to a transport.
#[derive(Clone, Eq, PartialEq)]
pub struct SessionConfig {
    /// Hostname or IP address of the endpoint.
    pub host: String,
    /// TCP port of the SSH server.
    pub port: u16,
    /// Account used for password authentication.
    pub username: String,
    /// Password for the account.
    pub password: String,
    /// Optional socket and session timeout.
    pub timeout: Option<Duration>,
}

impl SessionConfig {
    /// Returns the `host:port` address used to open the TCP stream.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// An authenticated session able to move whole files in both directions.
pub trait Session {
    /// Error raised by transfer operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Streams `source` to the remote object `remote_path`, replacing any
    /// existing content.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the remote file cannot be opened or
    /// written.
    fn upload(&mut self, source: &mut dyn Read, remote_path: &str) -> Result<(), Self::Error>;

    /// Streams the remote object `remote_path` into `sink` in full.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the remote file cannot be opened or
    /// read.
    fn download(&mut self, remote_path: &str, sink: &mut dyn Write) -> Result<(), Self::Error>;

    /// Removes the remote object `remote_path`.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the server refuses the removal.
    fn delete(&mut self, remote_path: &str) -> Result<(), Self::Error>;

    /// Tears the session down. Must be safe to call on a session whose
    /// connection already failed.
    fn disconnect(&mut self);
}

/// Factory for [`Session`]s.
pub trait Transport {
    /// Error raised while connecting or transferring.
    type Error: std::error::Error + Send + Sync + 'static;
    /// Session type produced by a successful connect.
    type Session: Session<Error = Self::Error>;

    /// Opens and authenticates a session against `config.host`.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the endpoint is unreachable or
    /// rejects the credentials.
    fn connect(&self, config: &SessionConfig) -> Result<Self::Session, Self::Error>;
}

/// Owns a session and disconnects it exactly once, either through
/// [`SessionGuard::close`] or when dropped on an early return.
#[derive(Debug)]
pub struct SessionGuard<S: Session> {
    session: S,
    open: bool,
}

impl<S: Session> SessionGuard<S> {
    /// Takes ownership of a freshly connected session.
    pub const fn new(session: S) -> Self {
        Self {
            session,
            open: true,
        }
    }

    /// Disconnects the session.
    pub fn close(mut self) {
        self.disconnect_once();
    }

    fn disconnect_once(&mut self) {
        if self.open {
            self.open = false;
            self.session.disconnect();
        }
    }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.disconnect_once();
    }
}
