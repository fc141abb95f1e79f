//! BDD scenarios for the round-trip workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{RoundTripContext, round_trip_context};

#[scenario(
    path = "tests/features/round_trip.feature",
    name = "Verify an empty payload against a lossless endpoint"
)]
fn scenario_verify_empty_payload(round_trip_context: RoundTripContext) {
    let _ = round_trip_context;
}

#[scenario(
    path = "tests/features/round_trip.feature",
    name = "Detect a corrupted byte in a one mebibyte payload"
)]
fn scenario_detect_corruption(round_trip_context: RoundTripContext) {
    let _ = round_trip_context;
}

#[scenario(
    path = "tests/features/round_trip.feature",
    name = "Abort before transferring when the credentials are rejected"
)]
fn scenario_abort_on_rejected_credentials(round_trip_context: RoundTripContext) {
    let _ = round_trip_context;
}

#[scenario(
    path = "tests/features/round_trip.feature",
    name = "Remove the probe file when cleanup is enabled"
)]
fn scenario_remove_probe_file(round_trip_context: RoundTripContext) {
    let _ = round_trip_context;
}
