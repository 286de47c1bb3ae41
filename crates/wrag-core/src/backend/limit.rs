// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
}

/// injected rate-limiting capability. the engine consults it when a
/// request carries a client key; swapping the in-memory implementation for
/// a distributed store touches nothing else.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> Decision;
}

/// fixed-window in-memory limiter keyed by caller-supplied string
pub struct MemoryRateLimiter {
    max_per_window: u32,
    window: Duration,
    state: Mutex<HashMap<String, (Instant, u32)>>,
}

impl MemoryRateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for MemoryRateLimiter {
    fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut state = self.state.lock();
        let entry = state.entry(key.to_string()).or_insert((now, 0));

        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        if entry.1 >= self.max_per_window {
            return Decision {
                allowed: false,
                remaining: 0,
            };
        }

        entry.1 += 1;
        Decision {
            allowed: true,
            remaining: self.max_per_window - entry.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_under_limit() {
        let limiter = MemoryRateLimiter::new(3, Duration::from_secs(60));
        for remaining in [2, 1, 0] {
            let decision = limiter.check("1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, remaining);
        }
    }

    #[test]
    fn test_limiter_blocks_over_limit() {
        let limiter = MemoryRateLimiter::new(2, Duration::from_secs(60));
        limiter.check("1.2.3.4");
        limiter.check("1.2.3.4");
        let decision = limiter.check("1.2.3.4");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_limiter_keys_are_independent() {
        let limiter = MemoryRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
        assert!(!limiter.check("a").allowed);
    }

    #[test]
    fn test_limiter_window_resets() {
        let limiter = MemoryRateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check("a").allowed);
    }
}
