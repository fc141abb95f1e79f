//! Binary entry point for the `sftp-probe` health check.
//!
//! Exit codes: `0` when the round trip verified, `1` for configuration
//! errors, `3` when the endpoint is unreachable or a transfer failed, `4`
//! when the downloaded copy differs from the upload, and `5` for local file
//! failures. Clap reserves `2` for usage errors.

use std::process;

use clap::Parser;
use log::{LevelFilter, error, info};
use thiserror::Error;

use sftp_probe::logging::init_logger;
use sftp_probe::{
    ConfigError, FailureKind, ProbeConfig, RoundTripVerifier, RunReport, SftpTransport, Transport,
    VerifyError,
};

mod cli;

use cli::Cli;


#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("endpoint unreachable: {0}")]
    Transport(String),
    #[error("data integrity violation: {0}")]
    Corrupted(String),
    #[error("local file error: {0}")]
    Local(String),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Transport(_) => 3,
            Self::Corrupted(_) => 4,
            Self::Local(_) => 5,
        }
    }
}

impl<E: std::error::Error + 'static> From<VerifyError<E>> for CliError {
    fn from(err: VerifyError<E>) -> Self {
        let message = err.to_string();
        match err.kind() {
            FailureKind::Transport => Self::Transport(message),
            FailureKind::Corruption => Self::Corrupted(message),
            FailureKind::Local => Self::Local(message),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let exit_code = match dispatch(&cli) {
        Ok(report) => {
            info!(
                "Round trip of {} verified ({} bytes)",
                report.remote_file_name, report.payload_len
            );
            0
        }
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

fn dispatch(cli: &Cli) -> Result<RunReport, CliError> {
    let mut config = ProbeConfig::load_without_cli_args()?;
    apply_overrides(&mut config, cli);

    #[cfg(feature = "test-backdoors")]
    if let Some(transport) = fake_transport_from_env() {
        return probe(transport, &config);
    }

    probe(SftpTransport, &config)
}

fn apply_overrides(config: &mut ProbeConfig, cli: &Cli) {
    if let Some(size) = cli.size {
        config.file_size = size;
    }
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(username) = &cli.username {
        config.username.clone_from(username);
    }
    if let Some(dir) = &cli.remote_dir {
        config.remote_dir = Some(dir.clone());
    }
    if cli.delete {
        config.delete_remote_file = true;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = Some(secs);
    }
}

fn probe<T: Transport>(transport: T, config: &ProbeConfig) -> Result<RunReport, CliError> {
    let session = config.session_config()?;
    let mut verifier = RoundTripVerifier::new(transport)
        .with_remote_dir(config.remote_directory())
        .with_remote_cleanup(config.delete_remote_file);
    Ok(verifier.run(config.file_size, &session)?)
}

/// Swaps the SFTP transport for the in-memory one when
/// `SFTP_PROBE_FAKE_TRANSPORT` names a known mode.
#[cfg(feature = "test-backdoors")]
fn fake_transport_from_env() -> Option<sftp_probe::test_support::MemoryTransport> {
    let mode = std::env::var("SFTP_PROBE_FAKE_TRANSPORT").ok()?;
    let transport = sftp_probe::test_support::MemoryTransport::new();
    match mode.as_str() {
        "echo" => {}
        "corrupt" => transport.corrupt_download_at(0),
        "refuse" => transport.fail_on_connect(),
        _ => return None,
    }
    Some(transport)
}
