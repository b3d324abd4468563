/// Longest client description the legacy tables can hold; longer inputs are
/// truncated, never rejected.
pub const LEGACY_DESCRIPTION_MAX_LENGTH: usize = 1000;

/// How long an authorized intent may wait before the sweeper drives it to
/// capture.
pub const DEFAULT_CAPTURE_AFTER_SECONDS: u64 = 2 * 60 * 60;

/// Intents authorized earlier than this are no longer captureable at the
/// provider and are skipped by the sweeper.
pub const DEFAULT_CAPTURE_SWEEP_CUTOFF_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Pause between deferred-capture sweep runs.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 5 * 60;

/// Page size for the sweeper's lazy cursor over due intents.
pub const DEFAULT_SWEEP_BATCH_SIZE: i64 = 100;

/// Outbound provider call budget.
pub const DEFAULT_GATEWAY_TIMEOUT_SECONDS: u64 = 30;
