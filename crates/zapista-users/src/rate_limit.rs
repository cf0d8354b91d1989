//! Per-(channel, chat_id) token bucket rate limiting.
//!
//! Token bucket over a fixed-size map guarded by one mutex, O(1) per call —
//! same shape the teacher uses for its resolver cache, applied here to the
//! rate-bucket invariant in the spec's data model.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: std::time::Instant,
}

pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, window_secs: u64) -> Self {
        let capacity = capacity as f64;
        let refill_per_second = if window_secs == 0 {
            capacity
        } else {
            capacity / window_secs as f64
        };
        Self {
            capacity,
            refill_per_second,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Refills then attempts to consume one token. Returns `true` if the
    /// caller is rate-limited (no token available) and should be rejected.
    pub fn is_rate_limited(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            false
        } else {
            true
        }
    }

    pub fn remaining(&self, key: &str) -> u32 {
        let now = std::time::Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        let tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        tokens.floor().max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_capacity_then_rejects() {
        let rl = RateLimiter::new(3, 60);
        assert!(!rl.is_rate_limited("whatsapp:U1"));
        assert!(!rl.is_rate_limited("whatsapp:U1"));
        assert!(!rl.is_rate_limited("whatsapp:U1"));
        assert!(rl.is_rate_limited("whatsapp:U1"));
    }

    #[test]
    fn buckets_are_independent_per_key() {
        let rl = RateLimiter::new(1, 60);
        assert!(!rl.is_rate_limited("a"));
        assert!(!rl.is_rate_limited("b"));
        assert!(rl.is_rate_limited("a"));
    }
}
