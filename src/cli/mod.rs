//! Command-line interface definitions for the `sftp-probe` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `sftp-probe` binary.
///
/// Every flag overrides the matching value loaded from `sftp-probe.toml` or
/// `SFTP_PROBE_*` environment variables. The password is deliberately only
/// accepted from those sources.
#[derive(Debug, Parser)]
#[command(
    name = "sftp-probe",
    version,
    about = "Upload, download, and checksum a dummy file to verify an SFTP endpoint"
)]
pub(crate) struct Cli {
    /// Requested payload size in bytes; the uploaded file is one byte longer.
    #[arg(long, value_name = "BYTES")]
    pub(crate) size: Option<u64>,
    /// SFTP host to probe.
    #[arg(long, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// SSH port of the SFTP host.
    #[arg(long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// Account used for password authentication.
    #[arg(long, value_name = "USER")]
    pub(crate) username: Option<String>,
    /// Remote directory that receives the probe file.
    #[arg(long, value_name = "DIR")]
    pub(crate) remote_dir: Option<String>,
    /// Remove the probe file from the server once it has been downloaded.
    #[arg(long)]
    pub(crate) delete: bool,
    /// Socket and session timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub(crate) timeout_secs: Option<u64>,
    /// Log connection and transfer steps at debug level.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}
