//! Packet id generation.

use crate::collector::SENTINEL_OFFSET;
use std::sync::atomic::{AtomicI32, Ordering};

/// Largest id handed out for a request. Keeps `id + SENTINEL_OFFSET` in range.
pub const MAX_REQUEST_ID: i32 = i32::MAX - SENTINEL_OFFSET;

/// Monotonic source of request ids, starting at 1.
///
/// Ids are never reused: once `MAX_REQUEST_ID` has been handed out the
/// generator is exhausted rather than wrapping.
#[derive(Debug, Default)]
pub struct PacketIdGenerator {
    last: AtomicI32,
}

impl PacketIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id, or `None` once the id space is used up.
    pub fn next(&self) -> Option<i32> {
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                if last >= MAX_REQUEST_ID {
                    None
                } else {
                    Some(last + 1)
                }
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Returns the most recently issued id (0 if none).
    pub fn last(&self) -> i32 {
        self.last.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn starting_after(last: i32) -> Self {
        Self {
            last: AtomicI32::new(last),
        }
    }
}
