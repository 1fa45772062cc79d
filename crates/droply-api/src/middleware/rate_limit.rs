//! In-memory fixed-window rate limiting.
//!
//! One counter map per process: horizontal scaling weakens the guarantee
//! to per-instance limiting, which is an accepted approximation. Counters
//! are not persisted and reset on restart.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Per-identifier window state.
#[derive(Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter keyed by client identifier.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    max_requests: u32,
    window: Duration,
    /// Capacity guard: expired entries are evicted inline once the map
    /// grows past this, in addition to the periodic sweep.
    max_buckets: usize,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_requests,
            window,
            max_buckets: 10_000,
        }
    }

    /// Admit or reject one request for `identifier`.
    ///
    /// A missing or expired entry resets to count=1 and admits. Below the
    /// maximum the count increments and admits; at the maximum the request
    /// is rejected without incrementing further.
    ///
    /// Returns remaining requests in the window, or the time until reset
    /// on rejection.
    pub async fn admit(&self, identifier: &str) -> Result<u32, Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        if buckets.len() >= self.max_buckets && !buckets.contains_key(identifier) {
            buckets.retain(|_, bucket| bucket.reset_at > now);
        }

        let bucket = buckets.entry(identifier.to_string()).or_insert(Bucket {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= bucket.reset_at {
            bucket.count = 0;
            bucket.reset_at = now + self.window;
        }

        if bucket.count < self.max_requests {
            bucket.count += 1;
            Ok(self.max_requests - bucket.count)
        } else {
            Err(bucket.reset_at.saturating_duration_since(now))
        }
    }

    /// Drop expired buckets; returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.reset_at > now);
        before - buckets.len()
    }

    /// Spawn the periodic sweep that bounds memory independent of the
    /// request path.
    pub fn start_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick is immediate
            loop {
                ticker.tick().await;
                let removed = self.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired rate-limit buckets");
                }
            }
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

/// Axum middleware applying the limiter per client IP.
///
/// Adds `X-RateLimit-Limit` / `X-RateLimit-Remaining` to responses and
/// `Retry-After` on 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = client_identifier(&request);

    match limiter.admit(&identifier).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            set_header(&mut response, "X-RateLimit-Limit", limiter.max_requests());
            set_header(&mut response, "X-RateLimit-Remaining", remaining);
            response
        }
        Err(reset_in) => {
            tracing::warn!(
                identifier = %identifier,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(serde_json::json!({
                    "error": "Too many requests. Please slow down.",
                    "code": "RATE_LIMITED"
                })),
            )
                .into_response();

            set_header(&mut response, "X-RateLimit-Limit", limiter.max_requests());
            set_header(&mut response, "X-RateLimit-Remaining", 0u32);
            set_header(&mut response, "Retry-After", reset_in.as_secs().max(1));
            response
        }
    }
}

fn client_identifier(request: &Request) -> String {
    // Behind a proxy the left-most forwarded address is the client.
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return format!("ip:{}", forwarded);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| format!("ip:{}", info.0.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

fn set_header(response: &mut Response, name: &'static str, value: impl ToString) {
    if let Ok(header_value) = HeaderValue::from_str(&value.to_string()) {
        response.headers_mut().insert(name, header_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_until_the_maximum() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert_eq!(limiter.admit("ip:1.2.3.4").await, Ok(2));
        assert_eq!(limiter.admit("ip:1.2.3.4").await, Ok(1));
        assert_eq!(limiter.admit("ip:1.2.3.4").await, Ok(0));
        assert!(limiter.admit("ip:1.2.3.4").await.is_err());
        // Rejection does not increment: a different key is unaffected
        assert_eq!(limiter.admit("ip:5.6.7.8").await, Ok(2));
    }

    #[tokio::test]
    async fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(1, Duration::from_millis(30));

        assert!(limiter.admit("k").await.is_ok());
        assert!(limiter.admit("k").await.is_err());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.admit("k").await.is_ok());
    }

    #[tokio::test]
    async fn rejection_reports_time_until_reset() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        limiter.admit("k").await.expect("first admit");
        let reset_in = limiter.admit("k").await.expect_err("second must reject");
        assert!(reset_in <= Duration::from_secs(60));
        assert!(reset_in > Duration::from_secs(0));
    }

    #[tokio::test]
    async fn sweep_drops_only_expired_buckets() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));

        limiter.admit("a").await.expect("admit a");
        limiter.admit("b").await.expect("admit b");
        assert_eq!(limiter.sweep().await, 0);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(limiter.sweep().await, 2);
    }
}
