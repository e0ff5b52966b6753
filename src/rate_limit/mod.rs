//! Per-session throttling of outbound model requests.
//!
//! Requests are counted against a fixed quota per window. The window state
//! lives in the session under [`RATE_TIMER_START`] and [`RATE_REQUEST_COUNT`],
//! so a limiter can be shared by any number of sessions. When the quota is
//! exceeded the calling thread sleeps until the window has passed, then a
//! fresh window starts with that request.

use crate::config::RateLimitSettings;
use crate::llm::ModelRequest;
use crate::session::{SessionState, RATE_REQUEST_COUNT, RATE_TIMER_START};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Time source for the limiter.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> f64;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

/// Wall clock with a real blocking sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Quota-per-window limiter applied once per model request.
#[derive(Clone)]
pub struct RateLimiter {
    quota: u64,
    window_secs: f64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(quota: u32, window_secs: u64) -> Self {
        Self::with_clock(quota, window_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(quota: u32, window_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota: quota as u64,
            window_secs: window_secs as f64,
            clock,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.quota, settings.window_secs)
    }

    /// Admit one outbound request, sleeping first if the quota is used up.
    ///
    /// Empty text segments in `request` are rewritten to a single space
    /// before any bookkeeping. Returns the delay that was slept, if any.
    pub fn before_model_request(
        &self,
        state: &mut SessionState,
        request: &mut ModelRequest,
    ) -> Option<Duration> {
        let rewritten = request.fill_empty_text();
        if rewritten > 0 {
            debug!(rewritten, "Replaced empty text segments");
        }

        let now = self.clock.now();

        let (window_start, count) = match self.current_window(state) {
            Some(window) => window,
            None => {
                state.insert(RATE_TIMER_START, now);
                state.insert(RATE_REQUEST_COUNT, 1u64);
                debug!(timestamp = now, request_count = 1, "Rate limit window opened");
                return None;
            }
        };

        let count = count.saturating_add(1);
        let elapsed = now - window_start;
        debug!(
            timestamp = now,
            request_count = count,
            elapsed_secs = elapsed,
            "Rate limit check"
        );

        if count <= self.quota {
            state.insert(RATE_REQUEST_COUNT, count);
            return None;
        }

        // A start time in the future can't stretch the wait past one window.
        let delay = (self.window_secs - elapsed + 1.0).min(self.window_secs + 1.0);
        let slept = if delay > 0.0 {
            let delay = Duration::from_secs_f64(delay);
            info!(sleep_secs = delay.as_secs_f64(), "Rate limit reached, waiting");
            self.clock.sleep(delay);
            Some(delay)
        } else {
            debug!(delay_secs = delay, "Window already elapsed, no wait needed");
            None
        };

        state.insert(RATE_TIMER_START, self.clock.now());
        state.insert(RATE_REQUEST_COUNT, 1u64);
        slept
    }

    /// The stored window, or `None` when there is none yet. Malformed state
    /// is logged and treated as no window.
    fn current_window(&self, state: &SessionState) -> Option<(f64, u64)> {
        let start = state.get(RATE_TIMER_START);
        let count = state.get(RATE_REQUEST_COUNT);
        match (start, count) {
            (None, None) => None,
            (Some(start), Some(count)) => match (start.as_f64(), count.as_u64()) {
                (Some(start), Some(count)) => Some((start, count)),
                _ => {
                    warn!("Rate limit state is malformed, starting a new window");
                    None
                }
            },
            _ => {
                warn!("Rate limit state is incomplete, starting a new window");
                None
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("quota", &self.quota)
            .field("window_secs", &self.window_secs)
            .finish()
    }
}

/// Read the current request count, for display.
pub fn request_count(state: &SessionState) -> u64 {
    state
        .get(RATE_REQUEST_COUNT)
        .and_then(Value::as_u64)
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Manually driven clock; sleeping advances it.
    #[derive(Default)]
    pub struct FakeClock {
        now: Mutex<f64>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl FakeClock {
        pub fn starting_at(now: f64) -> Self {
            Self {
                now: Mutex::new(now),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub fn advance(&self, secs: f64) {
            *self.now.lock().unwrap() += secs;
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> f64 {
            *self.now.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration.as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeClock;
    use super::*;
    use crate::llm::Message;

    fn request() -> ModelRequest {
        ModelRequest {
            model: "test".to_string(),
            system: String::new(),
            messages: vec![Message::user("oi")],
            tools: Vec::new(),
            temperature: 0.0,
            max_output_tokens: 10,
        }
    }

    fn limiter(clock: &Arc<FakeClock>) -> RateLimiter {
        RateLimiter::with_clock(10, 60, clock.clone())
    }

    #[test]
    fn test_first_request_opens_window() {
        let clock = Arc::new(FakeClock::starting_at(1_000.0));
        let mut state = SessionState::new();

        assert_eq!(limiter(&clock).before_model_request(&mut state, &mut request()), None);
        assert_eq!(state.get(RATE_TIMER_START).and_then(Value::as_f64), Some(1_000.0));
        assert_eq!(request_count(&state), 1);
    }

    #[test]
    fn test_quota_within_window_never_waits() {
        let clock = Arc::new(FakeClock::starting_at(0.0));
        let limiter = limiter(&clock);
        let mut state = SessionState::new();

        for _ in 0..10 {
            assert_eq!(limiter.before_model_request(&mut state, &mut request()), None);
            clock.advance(1.0);
        }
        assert_eq!(request_count(&state), 10);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_eleventh_request_waits_out_the_window() {
        let clock = Arc::new(FakeClock::starting_at(0.0));
        let limiter = limiter(&clock);
        let mut state = SessionState::new();

        for _ in 0..10 {
            limiter.before_model_request(&mut state, &mut request());
        }
        clock.advance(5.0);

        let delay = limiter.before_model_request(&mut state, &mut request());
        assert_eq!(delay, Some(Duration::from_secs(56)));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(56)]);
        assert_eq!(request_count(&state), 1);
        assert_eq!(state.get(RATE_TIMER_START).and_then(Value::as_f64), Some(61.0));

        // The next request counts into the new window.
        assert_eq!(limiter.before_model_request(&mut state, &mut request()), None);
        assert_eq!(request_count(&state), 2);
    }

    #[test]
    fn test_elapsed_window_skips_the_wait_but_resets() {
        let clock = Arc::new(FakeClock::starting_at(0.0));
        let limiter = limiter(&clock);
        let mut state = SessionState::new();

        for _ in 0..10 {
            limiter.before_model_request(&mut state, &mut request());
        }
        clock.advance(90.0);

        assert_eq!(limiter.before_model_request(&mut state, &mut request()), None);
        assert!(clock.sleeps().is_empty());
        assert_eq!(request_count(&state), 1);
        assert_eq!(state.get(RATE_TIMER_START).and_then(Value::as_f64), Some(90.0));
    }

    #[test]
    fn test_saturated_count_still_throttles() {
        let clock = Arc::new(FakeClock::starting_at(30.0));
        let mut state = SessionState::new();
        state.insert(RATE_TIMER_START, 0.0);
        state.insert(RATE_REQUEST_COUNT, u64::MAX);

        let slept = limiter(&clock).before_model_request(&mut state, &mut request());
        assert_eq!(slept, Some(Duration::from_secs(31)));
        assert_eq!(request_count(&state), 1);
    }

    #[test]
    fn test_malformed_state_starts_fresh() {
        let clock = Arc::new(FakeClock::starting_at(50.0));
        let mut state = SessionState::new();
        state.insert(RATE_TIMER_START, "yesterday");
        state.insert(RATE_REQUEST_COUNT, 99);

        assert_eq!(limiter(&clock).before_model_request(&mut state, &mut request()), None);
        assert_eq!(request_count(&state), 1);
        assert_eq!(state.get(RATE_TIMER_START).and_then(Value::as_f64), Some(50.0));
    }

    #[test]
    fn test_future_start_caps_the_wait() {
        let clock = Arc::new(FakeClock::starting_at(0.0));
        let mut state = SessionState::new();
        state.insert(RATE_TIMER_START, 500.0);
        state.insert(RATE_REQUEST_COUNT, 10);

        let delay = limiter(&clock).before_model_request(&mut state, &mut request());
        assert_eq!(delay, Some(Duration::from_secs(61)));
    }

    #[test]
    fn test_empty_text_rewritten_before_dispatch() {
        let clock = Arc::new(FakeClock::starting_at(0.0));
        let mut state = SessionState::new();
        let mut req = request();
        req.messages.push(Message::user(""));

        limiter(&clock).before_model_request(&mut state, &mut req);
        assert_eq!(req.messages[1].parts, vec![" "]);
    }
}
