//! Constants for the download module (timeouts, retry ceiling, concurrency bounds).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Attempt ceiling for a single fetch, initial attempt included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base of the exponential backoff: delay(n) = base * 2^n.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Parallel chapters per comic and parallel images per chapter.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Smallest accepted runner bound.
pub const MIN_CONCURRENCY: usize = 1;

/// Largest accepted runner bound.
pub const MAX_CONCURRENCY: usize = 100;
