//! Core library for the `sftp-probe` health check.
//!
//! The crate builds a dummy file of a requested size, uploads it to an SFTP
//! endpoint, downloads it back, and compares SHA-256 digests to detect
//! corruption introduced by the transport or the remote storage. Transport
//! access sits behind the [`Transport`] trait so the round trip can be driven
//! against an in-memory store in tests.

pub mod checksum;
pub mod config;
pub mod dummy;
pub mod logging;
pub mod naming;
pub mod sftp;
pub mod test_support;
pub mod transport;
pub mod verify;

pub use config::{ConfigError, ProbeConfig};
pub use naming::{Clock, FixedClock, SystemClock, remote_file_name};
pub use sftp::{SftpError, SftpSession, SftpTransport};
pub use transport::{Session, SessionConfig, SessionGuard, Transport};
pub use verify::{FailureKind, RoundTripVerifier, RunReport, VerifyError};
