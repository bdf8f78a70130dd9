//! Structured observability hooks for the release run lifecycle.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for lifecycle events: start, check, finish
//!
//! Events are emitted at `info!` level except failed checks, which use
//! `warn!`. For JSON output pass `--json` to the binary.

use tracing::{info, warn};

use crate::report::{CheckRecord, Outcome};

/// RAII guard that enters a run-scoped span for the duration of a command.
///
/// ```ignore
/// let _span = RunSpan::enter("prepare-release", "REL-42");
/// // every tracing call now carries command and release_id
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(command: &str, release_id: &str) -> Self {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "relman.run",
            command = %command,
            release_id = %release_id,
            run_id = %run_id,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a command started.
pub fn emit_release_started(command: &str, release_id: &str) {
    info!(event = "release.started", command = %command, release_id = %release_id);
}

/// Emit event: one check record was produced.
pub fn emit_check(record: &CheckRecord) {
    match record.outcome {
        Outcome::Fail => warn!(
            event = "release.check",
            phase = %record.phase,
            entity = %record.entity,
            code = %record.code,
            outcome = "fail",
            "{}",
            record.reason
        ),
        Outcome::Pass => info!(
            event = "release.check",
            phase = %record.phase,
            entity = %record.entity,
            code = %record.code,
            outcome = "pass",
            "{}",
            record.reason
        ),
        Outcome::Skipped => info!(
            event = "release.check",
            phase = %record.phase,
            entity = %record.entity,
            code = %record.code,
            outcome = "skipped",
            "{}",
            record.reason
        ),
    }
}

/// Emit event: a command finished with its verdict.
pub fn emit_release_finished(command: &str, release_id: &str, passed: bool, failures: usize) {
    info!(
        event = "release.finished",
        command = %command,
        release_id = %release_id,
        passed = passed,
        failures = failures,
    );
}
