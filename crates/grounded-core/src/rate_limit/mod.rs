//! Per-client, per-endpoint request limiting.
//!
//! Fixed-window counters keyed by `(client, endpoint)`. The check and the
//! increment happen under the same DashMap shard lock, so concurrent requests
//! from one client can never both take the last slot.


use axum::http::{HeaderName, HeaderValue};
use dashmap::DashMap;
use grounded_types::models::RateLimitConfig;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Opportunistic sweep kicks in once the table grows past this many keys.
const CLEANUP_THRESHOLD: usize = 10_000;

/// Rate-limited endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Chat,
    ChatStream,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ChatStream => "chat_stream",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    client: String,
    endpoint: Endpoint,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_after: Duration,
    /// Unix timestamp (seconds) at which the window resets
    pub reset_at: i64,
}

impl RateLimitDecision {
    /// Whole seconds a rejected client should wait (never zero).
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        let rounded = if self.reset_after.subsec_nanos() > 0 { secs + 1 } else { secs };
        rounded.max(1)
    }

    /// Headers communicating limit state; `Retry-After` only on rejection.
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(self.limit)),
            (HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from(self.remaining)),
            (HeaderName::from_static("x-ratelimit-reset"), HeaderValue::from(self.reset_at)),
        ];
        if !self.allowed {
            headers.push((
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(self.retry_after_secs()),
            ));
        }
        headers
    }
}

/// Process-wide keyed counter store.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<WindowKey, Window>,
    window: Duration,
    chat_max: u32,
    stream_max: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_secs(config.window_secs),
            chat_max: config.chat_max_requests,
            stream_max: config.stream_max_requests,
        }
    }

    /// Limiter with an explicit window, mainly for tests.
    pub fn with_window(window: Duration, chat_max: u32, stream_max: u32) -> Self {
        Self { windows: DashMap::new(), window, chat_max, stream_max }
    }

    pub fn limit_for(&self, endpoint: Endpoint) -> u32 {
        match endpoint {
            Endpoint::Chat => self.chat_max,
            Endpoint::ChatStream => self.stream_max,
        }
    }

    /// Count this request against `(client, endpoint)` and decide admission.
    pub fn check(&self, client: &str, endpoint: Endpoint) -> RateLimitDecision {
        self.cleanup_if_needed();

        let limit = self.limit_for(endpoint);
        let now = Instant::now();
        let key = WindowKey { client: client.to_string(), endpoint };

        let mut entry = self.windows.entry(key).or_insert(Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        let reset_after = self.window.saturating_sub(now.duration_since(entry.started));
        let reset_at = chrono::Utc::now().timestamp()
            + i64::try_from(reset_after.as_secs()).unwrap_or(i64::MAX / 2)
            + i64::from(reset_after.subsec_nanos() > 0);

        if entry.count >= limit {
            drop(entry);
            warn!(client = %client, endpoint = %endpoint, "[RateLimit] Request rejected, ceiling {} reached", limit);
            return RateLimitDecision { allowed: false, limit, remaining: 0, reset_after, reset_at };
        }

        entry.count += 1;
        let remaining = limit - entry.count;
        RateLimitDecision { allowed: true, limit, remaining, reset_after, reset_at }
    }

    /// Evict windows that have fully elapsed. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.windows.len();
        let now = Instant::now();
        self.windows.retain(|_, w| now.duration_since(w.started) < self.window);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!("[RateLimit] Swept {} expired windows", removed);
        }
        removed
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    fn cleanup_if_needed(&self) {
        if self.windows.len() > CLEANUP_THRESHOLD {
            self.sweep_expired();
        }
    }

    /// Periodically evict expired windows until the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                limiter.sweep_expired();
            }
        })
    }
}
