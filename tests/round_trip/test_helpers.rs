//! Shared fixtures for round-trip BDD scenarios.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rstest::fixture;
use sftp_probe::test_support::MemoryTransport;
use sftp_probe::{FailureKind, RunReport, SessionConfig};

use crate::session_config::session_config;

#[derive(Clone, Debug)]
pub enum RunOutcome {
    Success(RunReport),
    Failure {
        kind: FailureKind,
        message: String,
        digests: Option<(String, String)>,
    },
}

/// Scenario state. Clones share the transport and outcome cells so that
/// steps observe each other's effects.
#[derive(Clone, Debug)]
pub struct RoundTripContext {
    pub transport: MemoryTransport,
    pub session: SessionConfig,
    pub cleanup: Rc<Cell<bool>>,
    pub outcome: Rc<RefCell<Option<RunOutcome>>>,
}

impl RoundTripContext {
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome.borrow().clone()
    }
}

#[fixture]
pub fn round_trip_context() -> RoundTripContext {
    RoundTripContext {
        transport: MemoryTransport::new(),
        session: session_config(),
        cleanup: Rc::new(Cell::new(false)),
        outcome: Rc::new(RefCell::new(None)),
    }
}

/// Returns `true` when `name` reads `<size>-` followed by seventeen digits.
pub fn is_timestamped_name(name: &str, size: &str) -> bool {
    name.strip_prefix(size)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|stamp| stamp.len() == 17 && stamp.chars().all(|ch| ch.is_ascii_digit()))
}
