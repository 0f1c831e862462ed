//! Rate limiting configuration for the API.
//!
//! Each client gets a budget of `max_requests` per `window_seconds`. The
//! budget is enforced with a Governor quota whose burst equals the window
//! budget and which replenishes one request every `window / max_requests`,
//! so a client that spends its whole budget at once waits out the window.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_ENABLED`: `false` or `0` disables limiting (default: enabled)
//! - `RATE_LIMIT_WINDOW_SECONDS`: window length (default: 300)
//! - `RATE_LIMIT_MAX_REQUESTS`: requests allowed per window (default: 50)

use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_seconds: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_seconds: 300,
            max_requests: 50,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            window_seconds: env_or("RATE_LIMIT_WINDOW_SECONDS", defaults.window_seconds),
            max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", defaults.max_requests),
        }
    }

    /// A disabled limiter.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Builds the Governor quota, or `None` when limiting is disabled or the
    /// configuration cannot express a quota (zero requests or zero window).
    #[must_use]
    pub fn quota(&self) -> Option<Quota> {
        if !self.enabled {
            return None;
        }

        let burst = NonZeroU32::new(self.max_requests)?;
        let period = Duration::from_secs(self.window_seconds) / burst.get();

        Quota::with_period(period).map(|q| q.allow_burst(burst))
    }
}
