use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{bucket::Bucket, error::RateLimitError};

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

type Buckets = DashMap<String, Bucket>;

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whole tokens left after this check, zero on denial
    pub remaining: u32,
    /// Whether the request may proceed
    pub permitted: bool,
}

/// Per-credential token bucket rate limiter
///
/// Buckets are created full on a credential's first check and refilled
/// lazily on every later check. A background task reclaims buckets idle
/// longer than the retention window; it stops when the controller drops.
pub struct AdmissionController {
    buckets: Arc<Buckets>,
    rate: f64,
    burst: u32,
    idle_timeout: Duration,
    _sweeper: Option<DropGuard>,
}

/// Builder for [`AdmissionController`]
pub struct AdmissionControllerBuilder {
    rate: f64,
    burst: u32,
    sweep_interval: Duration,
    idle_timeout: Duration,
}

impl AdmissionControllerBuilder {
    #[must_use]
    pub const fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Validate the settings and start the reclamation task
    ///
    /// Outside a tokio runtime the controller still admits correctly but
    /// idle buckets are only reclaimed through [`AdmissionController::sweep`].
    pub fn build(self) -> Result<AdmissionController, RateLimitError> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(RateLimitError::Config(format!(
                "refill rate must be greater than 0, got {}",
                self.rate
            )));
        }
        if self.burst == 0 {
            return Err(RateLimitError::Config("burst must be at least 1".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(RateLimitError::Config("sweep interval must be greater than 0".to_string()));
        }

        let buckets = Arc::new(Buckets::new());
        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let token = CancellationToken::new();
                handle.spawn(sweep_loop(
                    Arc::clone(&buckets),
                    self.sweep_interval,
                    self.idle_timeout,
                    token.clone(),
                ));
                Some(token.drop_guard())
            }
            Err(_) => {
                tracing::debug!("no tokio runtime, idle rate limit buckets will not be swept automatically");
                None
            }
        };

        Ok(AdmissionController {
            buckets,
            rate: self.rate,
            burst: self.burst,
            idle_timeout: self.idle_timeout,
            _sweeper: sweeper,
        })
    }
}

impl AdmissionController {
    /// Start configuring a controller with the given refill rate (tokens per
    /// second) and burst capacity shared by every credential
    pub const fn builder(rate: f64, burst: u32) -> AdmissionControllerBuilder {
        AdmissionControllerBuilder {
            rate,
            burst,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Controller with the default reclamation schedule
    pub fn new(rate: f64, burst: u32) -> Result<Self, RateLimitError> {
        Self::builder(rate, burst).build()
    }

    /// Check and consume one token for `key`
    pub fn allow(&self, key: &str) -> Admission {
        self.allow_at(key, Instant::now())
    }

    /// [`allow`](Self::allow) evaluated at an explicit instant
    pub fn allow_at(&self, key: &str, now: Instant) -> Admission {
        let burst = f64::from(self.burst);

        // the shard lock is held for the whole read-modify-write
        let taken = match self.buckets.get_mut(key) {
            Some(mut bucket) => bucket.take(now, self.rate, burst),
            None => self
                .buckets
                .entry(key.to_owned())
                .or_insert_with(|| Bucket::full(burst, now))
                .take(now, self.rate, burst),
        };

        match taken {
            Some(remaining) => Admission {
                remaining,
                permitted: true,
            },
            None => Admission {
                remaining: 0,
                permitted: false,
            },
        }
    }

    /// Drop buckets idle for longer than the retention window
    ///
    /// Returns the number of buckets removed.
    pub fn sweep(&self) -> usize {
        sweep_at(&self.buckets, Instant::now(), self.idle_timeout)
    }

    /// [`sweep`](Self::sweep) evaluated at an explicit instant
    pub fn sweep_at(&self, now: Instant) -> usize {
        sweep_at(&self.buckets, now, self.idle_timeout)
    }

    /// Configured burst capacity, disclosed as `X-RateLimit-Limit`
    pub const fn burst(&self) -> u32 {
        self.burst
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn sweep_at(buckets: &Buckets, now: Instant, idle_timeout: Duration) -> usize {
    let before = buckets.len();
    buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen()) <= idle_timeout);
    before.saturating_sub(buckets.len())
}

async fn sweep_loop(buckets: Arc<Buckets>, interval: Duration, idle_timeout: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                let removed = sweep_at(&buckets, Instant::now(), idle_timeout);
                if removed > 0 {
                    tracing::debug!(removed, remaining = buckets.len(), "reclaimed idle rate limit buckets");
                }
            }
        }
    }
}
