use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_NONCE: AtomicU64 = AtomicU64::new(0);

/// Next request nonce for this process
///
/// Milliseconds since the epoch, bumped past the previous value whenever the
/// clock has not advanced (or went backwards), so every call returns a value
/// strictly greater than any earlier one, across threads.
pub fn next_nonce() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);

    let previous = LAST_NONCE
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);

    now.max(previous + 1)
}
