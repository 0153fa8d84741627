use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use poem::{
    Endpoint, IntoResponse, Middleware, Request, Response, Result as PoemResult,
    http::{Method, StatusCode},
    web::Json,
};
use serde::Serialize;
use tokio::time::Instant;

/// Expired windows are swept once every this many checks.
const PRUNE_INTERVAL: u64 = 1_024;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client. A `max` of zero disables
/// limiting.
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    windows: DashMap<String, Window>,
    checks: AtomicU64,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Counts a request for `key`. Returns how long the client has to wait
    /// when the current window is already full.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        if self.max == 0 {
            return Ok(());
        }

        let now = Instant::now();

        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            self.prune(now);
        }

        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max {
            return Err(self.window.saturating_sub(now.duration_since(window.started)));
        }

        window.count += 1;
        Ok(())
    }

    /// Number of clients with a tracked window.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    fn prune(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

/// Rejects POST requests from clients that exceeded their window with 429.
pub struct RateLimit {
    limiter: Arc<FixedWindowLimiter>,
}

impl RateLimit {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::new(max, window)),
        }
    }
}

impl<E: Endpoint> Middleware<E> for RateLimit {
    type Output = RateLimitEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RateLimitEndpoint {
            inner: ep,
            limiter: self.limiter.clone(),
        }
    }
}

pub struct RateLimitEndpoint<E> {
    inner: E,
    limiter: Arc<FixedWindowLimiter>,
}

impl<E: Endpoint> Endpoint for RateLimitEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> PoemResult<Self::Output> {
        if req.method() == Method::POST {
            let key = client_key(&req);
            if let Err(retry_after) = self.limiter.check(&key) {
                tracing::warn!(
                    client = %key,
                    retry_after_secs = retry_after.as_secs(),
                    "rate limit exceeded"
                );
                return Ok(too_many_requests(retry_after));
            }
        }

        self.inner.call(req).await.map(IntoResponse::into_response)
    }
}

fn client_key(req: &Request) -> String {
    req.remote_addr()
        .as_socket_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Same shape as the email result body so clients parse one format.
#[derive(Serialize)]
struct RateLimited {
    success: bool,
    error: &'static str,
    code: &'static str,
    timestamp: String,
}

fn too_many_requests(retry_after: Duration) -> Response {
    Json(RateLimited {
        success: false,
        error: "too many requests",
        code: "ERATELIMIT",
        timestamp: Utc::now().to_rfc3339(),
    })
    .with_status(StatusCode::TOO_MANY_REQUESTS)
    .with_header("Retry-After", retry_after.as_secs().max(1))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_max_requests_per_window() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        assert_eq!(
            limiter.check("10.0.0.1"),
            Err(Duration::from_secs(60))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.2").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_it_elapses() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("10.0.0.1").is_ok());
        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(
            limiter.check("10.0.0.1"),
            Err(Duration::from_secs(15))
        );
        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(limiter.check("10.0.0.1").is_ok());
    }

    #[tokio::test]
    async fn zero_max_disables_limiting() {
        let limiter = FixedWindowLimiter::new(0, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        assert_eq!(limiter.tracked(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_windows_are_swept_periodically() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));

        for i in 0..100 {
            assert!(limiter.check(&format!("10.0.1.{i}")).is_ok());
        }
        assert_eq!(limiter.tracked(), 100);

        tokio::time::advance(Duration::from_secs(61)).await;

        for _ in 100..PRUNE_INTERVAL {
            let _ = limiter.check("10.0.2.1");
        }

        assert_eq!(limiter.tracked(), 1);
    }
}
