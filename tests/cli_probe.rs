//! End-to-end CLI runs against the in-memory transport.
//!
//! The binary is rebuilt with the `test-backdoors` feature so that
//! `SFTP_PROBE_FAKE_TRANSPORT` can replace the SFTP connection.

use std::sync::LazyLock;

use escargot::CargoBuild;
use predicates::str::contains;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[expect(
    clippy::expect_used,
    reason = "test setup requires panic on build failure"
)]
static PROBE_BIN: LazyLock<escargot::CargoRun> = LazyLock::new(|| {
    CargoBuild::new()
        .bin("sftp-probe")
        .features("test-backdoors")
        .run()
        .expect("failed to build sftp-probe with test-backdoors feature")
});

#[fixture]
fn home() -> TempDir {
    TempDir::new().unwrap_or_else(|err| panic!("create temp dir: {err}"))
}

fn probe_cmd(home: &TempDir, mode: &str) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = PROBE_BIN.command().into();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("SFTP_PROBE_FAKE_TRANSPORT", mode)
        .env("SFTP_PROBE_HOST", "sftp.example.test")
        .env("SFTP_PROBE_USERNAME", "probe")
        .env("SFTP_PROBE_PASSWORD", "secret")
        .current_dir(home.path());
    cmd
}

#[rstest]
fn echo_endpoint_passes_and_logs_checksums(home: TempDir) {
    let mut cmd = probe_cmd(&home, "echo");
    cmd.args(["--size", "0"]);

    cmd.assert()
        .success()
        .stderr(contains("Checksum of 0-"))
        .stderr(contains("verified (1 bytes)"));
}

#[rstest]
fn verbose_flag_logs_transfer_steps(home: TempDir) {
    let mut cmd = probe_cmd(&home, "echo");
    cmd.args(["--size", "16", "--verbose", "--delete"]);

    cmd.assert()
        .success()
        .stderr(contains("Connecting via SFTP to sftp.example.test:22"))
        .stderr(contains("Uploading 16-"))
        .stderr(contains("Downloading 16-"))
        .stderr(contains("Deleting 16-"));
}

#[rstest]
#[case::corrupt("corrupt", 4, "data integrity violation")]
#[case::refuse("refuse", 3, "endpoint unreachable")]
fn failures_map_to_distinct_exit_codes(
    home: TempDir,
    #[case] mode: &str,
    #[case] code: i32,
    #[case] message: &str,
) {
    let mut cmd = probe_cmd(&home, mode);
    cmd.args(["--size", "1024"]);

    cmd.assert().failure().code(code).stderr(contains(message));
}
