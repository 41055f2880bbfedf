//! Process-wide request rate limiting
//!
//! One token bucket shared by every request, regardless of client or
//! credential. The bucket is owned by the router through an `Arc`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse_common::Error;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            tokens: max_tokens as f64,
            max_tokens: max_tokens as f64,
            refill_rate: refill_rate as f64,
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    fn time_until_token(&self) -> Duration {
        if self.tokens >= 1.0 || self.refill_rate <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// Global token bucket guarding every route
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// `per_second` tokens are added each second, up to `burst`
    pub fn new(per_second: u32, burst: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(burst.max(1), per_second)),
        }
    }

    /// Take one token, or report how long until the next one
    pub fn check(&self) -> Result<(), Duration> {
        // a poisoned bucket still holds a usable count
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        if bucket.try_acquire(Instant::now()) {
            Ok(())
        } else {
            Err(bucket.time_until_token())
        }
    }
}

/// Middleware rejecting requests with 429 once the bucket is empty
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if let Err(retry_after) = limiter.check() {
        tracing::warn!(
            path = %request.uri().path(),
            retry_after_ms = retry_after.as_millis() as u64,
            "Rate limit exceeded"
        );
        return Err(Error::RateLimit);
    }

    Ok(next.run(request).await)
}
