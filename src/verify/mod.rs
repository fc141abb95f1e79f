//! Round-trip integrity verification.
//!
//! A run builds a sparse dummy payload in an anonymous temporary file,
//! hashes it, uploads it under a timestamped name, downloads it into a second
//! temporary file, hashes that, and compares the digests. Transport failures
//! abort the run unchanged; a digest mismatch is reported as
//! [`VerifyError::Corrupted`]. The session is disconnected and both local
//! files are released on every exit path.

use std::io::{self, Seek};

use camino::Utf8PathBuf;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;

use crate::checksum::sha256_hex;
use crate::dummy::write_dummy_payload;
use crate::naming::{Clock, SystemClock, remote_file_name, remote_path};
use crate::transport::{Session, SessionConfig, SessionGuard, Transport};

/// Broad failure category, used by callers to pick an alert or exit code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The endpoint could not be reached or a transfer failed.
    Transport,
    /// Both transfers succeeded but the content changed.
    Corruption,
    /// A local temporary file could not be created, written, or read.
    Local,
}

/// Errors surfaced by [`RoundTripVerifier::run`].
#[derive(Debug, Error)]
pub enum VerifyError<TransportError>
where
    TransportError: std::error::Error + 'static,
{
    /// Connection, authentication, or transfer failure, passed through as-is.
    #[error(transparent)]
    Transport(TransportError),
    /// Upload and download digests differ.
    #[error("{file_name} - upload: [{upload}] download: [{download}]")]
    Corrupted {
        /// Remote path of the probe file.
        file_name: String,
        /// Digest of the local payload before upload.
        upload: String,
        /// Digest of the downloaded copy.
        download: String,
    },
    /// Failure on one of the local ephemeral files.
    #[error("local {stage} failed: {source}")]
    LocalIo {
        /// Step that touched the local file.
        stage: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl<E: std::error::Error + 'static> VerifyError<E> {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Corrupted { .. } => FailureKind::Corruption,
            Self::LocalIo { .. } => FailureKind::Local,
        }
    }
}

/// Outcome of a successful run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunReport {
    /// Requested payload size in bytes.
    pub size: u64,
    /// Logical length of the uploaded file (`size + 1`).
    pub payload_len: u64,
    /// Remote path the payload was written to and read from.
    pub remote_file_name: String,
    /// Hex SHA-256 of the local payload.
    pub upload_checksum: String,
    /// Hex SHA-256 of the downloaded copy.
    pub download_checksum: String,
    /// Whether the remote file was removed after the download.
    pub remote_deleted: bool,
}

/// Runs round-trip checks through a [`Transport`].
#[derive(Debug)]
pub struct RoundTripVerifier<T, C = SystemClock, R = StdRng> {
    transport: T,
    clock: C,
    rng: R,
    remote_dir: Option<Utf8PathBuf>,
    delete_remote_file: bool,
}

impl<T: Transport> RoundTripVerifier<T> {
    /// Creates a verifier using the wall clock and an entropy-seeded RNG.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            clock: SystemClock,
            rng: StdRng::from_entropy(),
            remote_dir: None,
            delete_remote_file: false,
        }
    }
}

impl<T, C, R> RoundTripVerifier<T, C, R>
where
    T: Transport,
    C: Clock,
    R: RngCore,
{
    /// Replaces the clock used to name remote files.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RoundTripVerifier<T, C2, R> {
        RoundTripVerifier {
            transport: self.transport,
            clock,
            rng: self.rng,
            remote_dir: self.remote_dir,
            delete_remote_file: self.delete_remote_file,
        }
    }

    /// Replaces the source of the random payload byte.
    #[must_use]
    pub fn with_rng<R2: RngCore>(self, rng: R2) -> RoundTripVerifier<T, C, R2> {
        RoundTripVerifier {
            transport: self.transport,
            clock: self.clock,
            rng,
            remote_dir: self.remote_dir,
            delete_remote_file: self.delete_remote_file,
        }
    }

    /// Places probe files under `dir` on the server.
    #[must_use]
    pub fn with_remote_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.remote_dir = dir;
        self
    }

    /// Removes the probe file after a successful download when `enabled`.
    #[must_use]
    pub const fn with_remote_cleanup(mut self, enabled: bool) -> Self {
        self.delete_remote_file = enabled;
        self
    }

    /// Returns the transport, mainly so tests can inspect it.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn local_io(stage: &'static str) -> impl FnOnce(io::Error) -> VerifyError<T::Error> {
        move |source| VerifyError::LocalIo { stage, source }
    }

    /// Executes one round trip for a payload of `size` bytes.
    ///
    /// The upload digest is computed before anything is sent; the download
    /// digest is computed after the full copy is received and before the
    /// session is closed. The comparison happens last.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Transport`] when connecting, transferring, or
    /// the optional cleanup fails, [`VerifyError::LocalIo`] when a temporary
    /// file misbehaves, and [`VerifyError::Corrupted`] when the digests
    /// differ.
    pub fn run(
        &mut self,
        size: u64,
        config: &SessionConfig,
    ) -> Result<RunReport, VerifyError<T::Error>> {
        let file_name = remote_file_name(size, self.clock.now());
        let remote = remote_path(self.remote_dir.as_deref(), &file_name);

        let mut upload_file = tempfile::tempfile().map_err(Self::local_io("create"))?;
        let payload_len = write_dummy_payload(&mut upload_file, size, &mut self.rng)
            .map_err(Self::local_io("payload write"))?;
        let upload_checksum =
            sha256_hex(&mut upload_file).map_err(Self::local_io("upload hash"))?;
        info!("Checksum of {file_name} before upload: {upload_checksum}");
        upload_file
            .rewind()
            .map_err(Self::local_io("rewind"))?;

        debug!("Connecting via SFTP to {}..", config.address());
        let mut session = SessionGuard::new(
            self.transport
                .connect(config)
                .map_err(VerifyError::Transport)?,
        );

        debug!("Uploading {remote} ({payload_len} bytes)..");
        session
            .upload(&mut upload_file, &remote)
            .map_err(VerifyError::Transport)?;

        debug!("Downloading {remote}..");
        let mut download_file = tempfile::tempfile().map_err(Self::local_io("create"))?;
        session
            .download(&remote, &mut download_file)
            .map_err(VerifyError::Transport)?;
        let download_checksum =
            sha256_hex(&mut download_file).map_err(Self::local_io("download hash"))?;
        info!("Checksum of {file_name} after download: {download_checksum}");
        drop(download_file);
        drop(upload_file);

        if self.delete_remote_file {
            debug!("Deleting {remote}..");
            session.delete(&remote).map_err(VerifyError::Transport)?;
        }
        session.close();

        if upload_checksum != download_checksum {
            return Err(VerifyError::Corrupted {
                file_name: remote,
                upload: upload_checksum,
                download: download_checksum,
            });
        }

        Ok(RunReport {
            size,
            payload_len,
            remote_file_name: remote,
            upload_checksum,
            download_checksum,
            remote_deleted: self.delete_remote_file,
        })
    }
}
