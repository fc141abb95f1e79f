//! BDD step definitions for the round-trip workflow.

use rstest_bdd_macros::{given, then, when};
use sftp_probe::checksum::DIGEST_HEX_LEN;
use sftp_probe::test_support::TransportEvent;
use sftp_probe::{FailureKind, RoundTripVerifier, VerifyError};

use super::test_helpers::{RoundTripContext, RunOutcome, is_timestamped_name};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("an SFTP endpoint that echoes uploads")]
fn echoing_endpoint(round_trip_context: RoundTripContext) -> RoundTripContext {
    round_trip_context
}

#[given("an SFTP endpoint that corrupts byte \"{index}\" of downloads")]
fn corrupting_endpoint(round_trip_context: RoundTripContext, index: usize) -> RoundTripContext {
    round_trip_context.transport.corrupt_download_at(index);
    round_trip_context
}

#[given("an SFTP endpoint that rejects the credentials")]
fn rejecting_endpoint(round_trip_context: RoundTripContext) -> RoundTripContext {
    round_trip_context.transport.fail_on_connect();
    round_trip_context
}

#[given("remote cleanup is enabled")]
fn cleanup_enabled(round_trip_context: RoundTripContext) -> RoundTripContext {
    round_trip_context.cleanup.set(true);
    round_trip_context
}

#[when("I verify a round trip of \"{size}\" bytes")]
fn verify_round_trip(round_trip_context: RoundTripContext, size: u64) -> RoundTripContext {
    let mut verifier = RoundTripVerifier::new(round_trip_context.transport.clone())
        .with_remote_cleanup(round_trip_context.cleanup.get());
    let outcome = match verifier.run(size, &round_trip_context.session) {
        Ok(report) => RunOutcome::Success(report),
        Err(err) => {
            let digests = match &err {
                VerifyError::Corrupted {
                    upload, download, ..
                } => Some((upload.clone(), download.clone())),
                _ => None,
            };
            RunOutcome::Failure {
                kind: err.kind(),
                message: err.to_string(),
                digests,
            }
        }
    };
    round_trip_context.outcome.replace(Some(outcome));
    round_trip_context
}

#[then("the run succeeds with matching checksums")]
fn run_succeeds(round_trip_context: &RoundTripContext) -> Result<(), StepError> {
    match round_trip_context.outcome() {
        Some(RunOutcome::Success(report))
            if report.upload_checksum == report.download_checksum
                && report.upload_checksum.len() == DIGEST_HEX_LEN =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected matching checksums, got {other:?}"
        ))),
    }
}

#[then("the remote file name embeds \"{size}\" and a millisecond timestamp")]
fn remote_name_is_timestamped(
    round_trip_context: &RoundTripContext,
    size: String,
) -> Result<(), StepError> {
    let Some(RunOutcome::Success(report)) = round_trip_context.outcome() else {
        return Err(StepError::Assertion(String::from("missing successful run")));
    };
    if is_timestamped_name(&report.remote_file_name, size.trim()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "unexpected remote name {}",
            report.remote_file_name
        )))
    }
}

#[then("the run fails with a corruption error for \"{size}\"")]
fn run_fails_with_corruption(
    round_trip_context: &RoundTripContext,
    size: String,
) -> Result<(), StepError> {
    match round_trip_context.outcome() {
        Some(RunOutcome::Failure {
            kind: FailureKind::Corruption,
            message,
            digests: Some((upload, download)),
        }) if upload != download
            && upload.len() == DIGEST_HEX_LEN
            && download.len() == DIGEST_HEX_LEN
            && message.starts_with(&format!("{}-", size.trim()))
            && message.contains(&upload)
            && message.contains(&download) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected corruption failure, got {other:?}"
        ))),
    }
}

#[then("the run fails with a transport error")]
fn run_fails_with_transport_error(round_trip_context: &RoundTripContext) -> Result<(), StepError> {
    match round_trip_context.outcome() {
        Some(RunOutcome::Failure {
            kind: FailureKind::Transport,
            ..
        }) => {
            let events = round_trip_context.transport.events();
            if events == vec![TransportEvent::Connect] {
                Ok(())
            } else {
                Err(StepError::Assertion(format!(
                    "transfers ran after a failed connect: {events:?}"
                )))
            }
        }
        other => Err(StepError::Assertion(format!(
            "expected transport failure, got {other:?}"
        ))),
    }
}

#[then("no remote file was created")]
fn no_remote_file(round_trip_context: &RoundTripContext) -> Result<(), StepError> {
    let files = round_trip_context.transport.remote_files();
    if files.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "remote files left behind: {files:?}"
        )))
    }
}

#[then("the session is disconnected")]
fn session_disconnected(round_trip_context: &RoundTripContext) -> Result<(), StepError> {
    let transport = &round_trip_context.transport;
    if !transport.is_connected() && transport.disconnect_calls() == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a single disconnect, saw {}",
            transport.disconnect_calls()
        )))
    }
}
