//! SFTP transport backed by libssh2.
//!
//! Opens a TCP stream, performs the SSH handshake, authenticates with a
//! username and password, and starts the SFTP subsystem. Transfers stream
//! whole files with [`std::io::copy`].

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::Path;

use log::debug;
use ssh2::{OpenFlags, OpenType, Sftp};
use thiserror::Error;

use crate::transport::{Session, SessionConfig, Transport};

/// Permission bits applied to uploaded probe files.
const REMOTE_FILE_MODE: i32 = 0o644;

/// Errors raised by the SFTP transport.
#[derive(Debug, Error)]
pub enum SftpError {
    /// Raised when the TCP connection cannot be established.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// `host:port` that was dialled.
        address: String,
        /// Operating system error.
        #[source]
        source: io::Error,
    },
    /// Raised when the SSH session cannot be created or negotiated.
    #[error("SSH handshake with {address} failed: {source}")]
    Handshake {
        /// `host:port` of the peer.
        address: String,
        /// libssh2 error.
        #[source]
        source: ssh2::Error,
    },
    /// Raised when the server rejects the credentials.
    #[error("authentication failed for user {username}")]
    Authentication {
        /// Account that attempted to log in.
        username: String,
        /// libssh2 error, when the library reported one.
        #[source]
        source: Option<ssh2::Error>,
    },
    /// Raised when the SFTP subsystem cannot be started.
    #[error("failed to start SFTP subsystem: {0}")]
    Subsystem(#[source] ssh2::Error),
    /// Raised when an upload or download fails part-way.
    #[error("failed to {operation} {path}: {source}")]
    Transfer {
        /// `upload` or `download`.
        operation: &'static str,
        /// Remote path involved in the transfer.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Raised when the remote file cannot be removed.
    #[error("failed to delete {path}: {source}")]
    Delete {
        /// Remote path that should have been removed.
        path: String,
        /// libssh2 error.
        #[source]
        source: ssh2::Error,
    },
    /// Raised when an operation is attempted after disconnecting.
    #[error("SFTP session is already closed")]
    Closed,
}

/// Real transport that speaks SFTP through the `ssh2` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SftpTransport;

impl Transport for SftpTransport {
    type Error = SftpError;
    type Session = SftpSession;

    fn connect(&self, config: &SessionConfig) -> Result<Self::Session, Self::Error> {
        let address = config.address();
        let stream = TcpStream::connect(&address).map_err(|source| SftpError::Connect {
            address: address.clone(),
            source,
        })?;
        if let Some(timeout) = config.timeout {
            stream
                .set_read_timeout(Some(timeout))
                .and_then(|()| stream.set_write_timeout(Some(timeout)))
                .map_err(|source| SftpError::Connect {
                    address: address.clone(),
                    source,
                })?;
        }

        let mut session = ssh2::Session::new().map_err(|source| SftpError::Handshake {
            address: address.clone(),
            source,
        })?;
        session.set_tcp_stream(stream);
        if let Some(timeout) = config.timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }
        session
            .handshake()
            .map_err(|source| SftpError::Handshake { address, source })?;

        session
            .userauth_password(&config.username, &config.password)
            .map_err(|source| SftpError::Authentication {
                username: config.username.clone(),
                source: Some(source),
            })?;
        if !session.authenticated() {
            return Err(SftpError::Authentication {
                username: config.username.clone(),
                source: None,
            });
        }

        let sftp = session.sftp().map_err(SftpError::Subsystem)?;
        Ok(SftpSession {
            session,
            sftp: Some(sftp),
        })
    }
}

/// Authenticated SFTP session.
pub struct SftpSession {
    session: ssh2::Session,
    sftp: Option<Sftp>,
}

impl std::fmt::Debug for SftpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpSession")
            .field("open", &self.sftp.is_some())
            .finish_non_exhaustive()
    }
}

impl SftpSession {
    fn sftp(&self) -> Result<&Sftp, SftpError> {
        self.sftp.as_ref().ok_or(SftpError::Closed)
    }
}

impl Session for SftpSession {
    type Error = SftpError;

    fn upload(&mut self, source: &mut dyn Read, remote_path: &str) -> Result<(), Self::Error> {
        let transfer_error = |err: io::Error| SftpError::Transfer {
            operation: "upload",
            path: remote_path.to_owned(),
            source: err,
        };
        let flags = OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE;
        let mut remote = self
            .sftp()?
            .open_mode(
                Path::new(remote_path),
                flags,
                REMOTE_FILE_MODE,
                OpenType::File,
            )
            .map_err(|err| transfer_error(err.into()))?;

        io::copy(source, &mut remote).map_err(transfer_error)?;
        remote.flush().map_err(transfer_error)?;
        Ok(())
    }

    fn download(&mut self, remote_path: &str, sink: &mut dyn Write) -> Result<(), Self::Error> {
        let transfer_error = |err: io::Error| SftpError::Transfer {
            operation: "download",
            path: remote_path.to_owned(),
            source: err,
        };
        let mut remote = self
            .sftp()?
            .open(Path::new(remote_path))
            .map_err(|err| transfer_error(err.into()))?;

        io::copy(&mut remote, sink).map_err(transfer_error)?;
        sink.flush().map_err(transfer_error)?;
        Ok(())
    }

    fn delete(&mut self, remote_path: &str) -> Result<(), Self::Error> {
        self.sftp()?
            .unlink(Path::new(remote_path))
            .map_err(|source| SftpError::Delete {
                path: remote_path.to_owned(),
                source,
            })
    }

    fn disconnect(&mut self) {
        if self.sftp.take().is_none() {
            return;
        }
        if let Err(err) = self.session.disconnect(None, "sftp-probe finished", None) {
            debug!("SSH disconnect reported an error: {err}");
        }
    }
}
