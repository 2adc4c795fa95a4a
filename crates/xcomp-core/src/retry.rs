//! Retry policy for upstream rate limiting and transient failures.

use std::time::Duration;

/// Backoff strategy for retrying failed requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Grows the delay by a constant step: `base + step * attempt`.
    Linear {
        base: Duration,
        step: Duration,
        max: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            base: Duration::from_secs(2),
            step: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// Calculate the delay for a given retry attempt (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Linear { base, step, max } => base.saturating_add(step.saturating_mul(attempt)).min(max),
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Backoff family selected by name in collection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffKind {
    Fixed,
    #[default]
    Linear,
    Exponential,
}

impl BackoffKind {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "linear" => Some(Self::Linear),
            "exponential" | "exp" => Some(Self::Exponential),
            _ => None,
        }
    }
}

/// Configuration for the upstream retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// The maximum number of retries to attempt.
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// HTTP status codes that should trigger a retry.
    pub retry_on_status: Vec<u16>,
    /// Whether transport failures flagged retryable are retried.
    pub retry_on_transport: bool,
    /// Prefer the server's `Retry-After` seconds over the backoff on 429.
    pub honor_retry_after: bool,
    /// Upper bound applied to any `Retry-After` value.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 6,
            backoff: Backoff::default(),
            retry_on_status: vec![429, 502, 503, 504],
            retry_on_transport: true,
            honor_retry_after: true,
            max_retry_after: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with exponential backoff.
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                factor: 2.0,
                max: Duration::from_secs(3),
                jitter: true,
            },
            ..Self::default()
        }
    }

    /// Create a new retry configuration with fixed backoff.
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// Disable retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Retry policy for a named backoff family. Zero retries disables
    /// retrying whatever the family.
    pub fn for_kind(kind: BackoffKind, max_retries: u32) -> Self {
        if max_retries == 0 {
            return Self::no_retry();
        }
        match kind {
            BackoffKind::Fixed => Self::fixed(Duration::from_secs(2), max_retries),
            BackoffKind::Linear => Self {
                max_retries,
                ..Self::default()
            },
            BackoffKind::Exponential => Self::exponential(max_retries),
        }
    }

    /// Check if a given HTTP status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Calculate the delay for a given retry attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Delay before retrying a response, using `Retry-After` on 429 when the
    /// header holds a whole number of seconds.
    pub fn delay_for_response(&self, attempt: u32, status: u16, retry_after: Option<&str>) -> Duration {
        if self.honor_retry_after && status == 429 {
            if let Some(seconds) = retry_after.and_then(parse_retry_after) {
                return Duration::from_secs(seconds).min(self.max_retry_after);
            }
        }
        self.delay_for_attempt(attempt)
    }
}

fn parse_retry_after(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(10), Duration::from_millis(100));
    }

    #[test]
    fn test_default_backoff_is_linear_from_two_seconds() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay(0), Duration::from_secs(2));
        assert_eq!(backoff.delay(1), Duration::from_secs(3));
        assert_eq!(backoff.delay(5), Duration::from_secs(7));
        assert_eq!(backoff.delay(100), Duration::from_secs(30));
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1)); // capped
    }

    #[test]
    fn test_exponential_backoff_with_jitter_stays_in_band() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..10 {
            for attempt in 0..5 {
                let delay_ms = backoff.delay(attempt).as_millis() as f64;
                let expected = (100.0 * 2_f64.powi(attempt as i32)).min(1000.0);
                assert!(delay_ms >= expected * 0.49, "attempt={attempt}, delay_ms={delay_ms}");
                assert!(delay_ms <= expected * 1.51, "attempt={attempt}, delay_ms={delay_ms}");
            }
        }
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();

        assert_eq!(config.max_retries, 6);
        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(400));
        assert!(!config.should_retry_status(403));
        assert!(!config.should_retry_status(404));
    }

    #[test]
    fn test_retry_after_wins_on_rate_limit() {
        let config = RetryConfig::default();

        assert_eq!(
            config.delay_for_response(0, 429, Some("5")),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.delay_for_response(1, 429, Some("soon")),
            Duration::from_secs(3)
        );
        assert_eq!(
            config.delay_for_response(0, 503, Some("5")),
            Duration::from_secs(2)
        );
        assert_eq!(
            config.delay_for_response(0, 429, Some("9999")),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_retry_config_no_retry() {
        let config = RetryConfig::no_retry();
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_backoff_kind_selects_policy() {
        assert_eq!(BackoffKind::parse(" Exponential "), Some(BackoffKind::Exponential));
        assert_eq!(BackoffKind::parse("fixed"), Some(BackoffKind::Fixed));
        assert_eq!(BackoffKind::parse("sometimes"), None);

        let exponential = RetryConfig::for_kind(BackoffKind::Exponential, 3);
        assert_eq!(exponential.max_retries, 3);
        assert!(matches!(
            exponential.backoff,
            Backoff::Exponential { jitter: true, .. }
        ));

        let linear = RetryConfig::for_kind(BackoffKind::Linear, 4);
        assert_eq!(linear.max_retries, 4);
        assert_eq!(linear.backoff, Backoff::default());

        let fixed = RetryConfig::for_kind(BackoffKind::Fixed, 1);
        assert_eq!(fixed.delay_for_attempt(5), Duration::from_secs(2));

        let disabled = RetryConfig::for_kind(BackoffKind::Exponential, 0);
        assert_eq!(disabled.max_retries, 0);
    }
}
