//! Token-bucket rate limiter
//!
//! Guards the RPC surface against runaway pollers. Lock-free: the token
//! count and the last-refill timestamp share one atomic word, updated with
//! a CAS loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket over a packed atomic
///
/// Upper 32 bits: available tokens. Lower 32 bits: last refill time in
/// milliseconds since construction (wraps after ~49 days, which outlives
/// any realistic daemon session).
pub struct RateLimiter {
    packed: AtomicU64,
    creation_time: Instant,
    max_tokens: u32,
    refill_rate: u32,
}

impl RateLimiter {
    /// `max_tokens` bounds the burst, `refill_rate` is tokens per second.
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            packed: AtomicU64::new((max_tokens as u64) << 32),
            creation_time: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Try to consume one token. Returns false when throttled.
    pub fn check(&self) -> bool {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let tokens = (packed >> 32) as u32;
            let last_refill_ms = (packed & 0xFFFF_FFFF) as u32;

            let elapsed_ms = self.creation_time.elapsed().as_millis() as u32;
            let delta_ms = elapsed_ms.saturating_sub(last_refill_ms);
            let refilled = (delta_ms as u64 * self.refill_rate as u64) / 1000;
            let available = ((tokens as u64 + refilled).min(self.max_tokens as u64)) as u32;

            if available == 0 {
                // Leave the word untouched; sub-token refill credit keeps
                // accruing against the stored timestamp.
                return false;
            }

            // Advance the refill clock only when whole tokens were credited.
            let refill_ms = if refilled > 0 { elapsed_ms } else { last_refill_ms };
            let new_packed = (((available - 1) as u64) << 32) | (refill_ms as u64);
            match self.packed.compare_exchange(
                packed,
                new_packed,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(_) => continue,
            }
        }
    }
}
