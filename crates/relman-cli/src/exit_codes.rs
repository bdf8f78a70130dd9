//! Stable exit codes for relman commands.

/// Command completed and the release may proceed.
pub const OK: u8 = 0;
/// Hard fault: authentication, transport, configuration or invalid input.
pub const FAULT: u8 = 1;
/// Validation completed but the release is not ready.
pub const NOT_READY: u8 = 2;
