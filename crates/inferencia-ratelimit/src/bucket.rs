use std::time::Instant;

/// One credential's token count and last refill time
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

impl Bucket {
    pub(crate) const fn full(burst: f64, now: Instant) -> Self {
        Self { tokens: burst, last_seen: now }
    }

    /// Refill for the time elapsed since the last check, then try to take one token
    ///
    /// Returns the floored count left after taking, or `None` when fewer
    /// than one token is available.
    pub(crate) fn take(&mut self, now: Instant, rate: f64, burst: f64) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.last_seen).as_secs_f64();
        self.tokens = elapsed.mul_add(rate, self.tokens).min(burst);
        self.last_seen = self.last_seen.max(now);

        if self.tokens < 1.0 {
            return None;
        }

        self.tokens -= 1.0;

        // tokens is within [0, burst] and burst came from a u32
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(self.tokens.floor() as u32)
    }

    pub(crate) const fn last_seen(&self) -> Instant {
        self.last_seen
    }

    #[cfg(test)]
    pub(crate) const fn tokens(&self) -> f64 {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn refill_never_exceeds_burst() {
        let start = Instant::now();
        let mut bucket = Bucket::full(3.0, start);

        assert_eq!(bucket.take(start, 1.0, 3.0), Some(2));
        assert_eq!(bucket.take(start + Duration::from_secs(3600), 1.0, 3.0), Some(2));
        assert!((bucket.tokens() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn denial_does_not_consume() {
        let start = Instant::now();
        let mut bucket = Bucket::full(1.0, start);

        assert_eq!(bucket.take(start, 1.0, 1.0), Some(0));
        assert_eq!(bucket.take(start, 1.0, 1.0), None);
        assert!(bucket.tokens().abs() < f64::EPSILON);
    }

    #[test]
    fn partial_refill_is_kept() {
        let start = Instant::now();
        let mut bucket = Bucket::full(1.0, start);
        bucket.take(start, 2.0, 1.0);

        // a quarter second at 2 tokens/s refills half a token
        assert_eq!(bucket.take(start + Duration::from_millis(250), 2.0, 1.0), None);
        assert_eq!(bucket.take(start + Duration::from_millis(500), 2.0, 1.0), Some(0));
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut bucket = Bucket::full(1.0, start);
        bucket.take(start, 1.0, 1.0);

        assert_eq!(bucket.take(start - Duration::from_secs(5), 1.0, 1.0), None);
        assert_eq!(bucket.last_seen(), start);
    }
}
