//! Session expiry monitoring.
//!
//! Two pieces: a cancelable polling loop that watches a session's expiry and
//! fires warning/expired callbacks, and a request-scoped check deciding
//! whether a session should be refreshed before serving a navigation.
//! The loop is cooperative: callbacks run to completion before the next tick,
//! and the owning context must call `MonitorHandle::stop` on teardown so the
//! repeating timer does not leak.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_WARNING_THRESHOLD_SECONDS: i64 = 5 * 60;
const REFRESH_THRESHOLD_SECONDS: i64 = 60 * 60;

/// A session is valid iff the current time is before its expiry.
#[must_use]
pub fn is_session_valid(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < expires_at
}

/// Request-scoped check: refresh when remaining lifetime drops below one hour.
#[must_use]
pub fn needs_refresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at - now < ChronoDuration::seconds(REFRESH_THRESHOLD_SECONDS)
}

#[derive(Clone, Copy, Debug)]
pub struct MonitorConfig {
    poll_interval: Duration,
    warning_threshold: ChronoDuration,
}

impl MonitorConfig {
    /// Default monitor config: 60s poll interval, 5 minute warning threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            warning_threshold: ChronoDuration::seconds(DEFAULT_WARNING_THRESHOLD_SECONDS),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_warning_threshold_seconds(mut self, seconds: i64) -> Self {
        self.warning_threshold = ChronoDuration::seconds(seconds);
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a single poll observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionTick {
    Ok,
    ExpiringSoon,
    Expired,
}

/// Evaluate one tick of the monitor against the clock.
#[must_use]
pub fn evaluate_tick(
    config: &MonitorConfig,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SessionTick {
    if !is_session_valid(expires_at, now) {
        SessionTick::Expired
    } else if expires_at - now <= config.warning_threshold {
        SessionTick::ExpiringSoon
    } else {
        SessionTick::Ok
    }
}

/// Cancelation handle returned by `spawn_session_monitor`.
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the polling loop. The owning context calls this on teardown.
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Start polling the session expiry.
///
/// `expiry` is consulted every tick so a rotated session is picked up without
/// restarting the monitor; `None` (no active session) skips the tick.
/// `on_expired` fires once and ends the loop; `on_warning` fires on every
/// tick inside the warning threshold.
pub fn spawn_session_monitor<E, W, X>(
    config: MonitorConfig,
    expiry: E,
    on_warning: W,
    on_expired: X,
) -> MonitorHandle
where
    E: Fn() -> Option<DateTime<Utc>> + Send + 'static,
    W: Fn() + Send + 'static,
    X: Fn() + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.poll_interval);
        loop {
            interval.tick().await;
            let Some(expires_at) = expiry() else {
                continue;
            };
            match evaluate_tick(&config, expires_at, Utc::now()) {
                SessionTick::Expired => {
                    debug!("session expired; stopping monitor");
                    on_expired();
                    return;
                }
                SessionTick::ExpiringSoon => on_warning(),
                SessionTick::Ok => {}
            }
        }
    });
    MonitorHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn session_valid_until_expiry() {
        let now = Utc::now();
        let expires_at = now + ChronoDuration::seconds(3600);
        assert!(is_session_valid(expires_at, now));
        assert!(!is_session_valid(
            expires_at,
            now + ChronoDuration::seconds(3601)
        ));
    }

    #[test]
    fn refresh_below_one_hour_remaining() {
        let now = Utc::now();
        assert!(!needs_refresh(now + ChronoDuration::seconds(3601), now));
        assert!(needs_refresh(now + ChronoDuration::seconds(3599), now));
        assert!(needs_refresh(now - ChronoDuration::seconds(1), now));
    }

    #[test]
    fn evaluate_tick_thresholds() {
        let config = MonitorConfig::new();
        let now = Utc::now();
        assert_eq!(
            evaluate_tick(&config, now + ChronoDuration::seconds(3600), now),
            SessionTick::Ok
        );
        assert_eq!(
            evaluate_tick(&config, now + ChronoDuration::seconds(299), now),
            SessionTick::ExpiringSoon
        );
        assert_eq!(
            evaluate_tick(&config, now - ChronoDuration::seconds(1), now),
            SessionTick::Expired
        );
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_fires_expired_once_and_stops() {
        let expired = Arc::new(AtomicUsize::new(0));
        let warned = Arc::new(AtomicUsize::new(0));
        let expired_clone = Arc::clone(&expired);
        let warned_clone = Arc::clone(&warned);

        let past = Utc::now() - ChronoDuration::seconds(10);
        let handle = spawn_session_monitor(
            MonitorConfig::new(),
            move || Some(past),
            move || {
                warned_clone.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                expired_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        // Several poll intervals elapse; the loop must have ended after one fire.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(warned.load(Ordering::SeqCst), 0);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_warns_inside_threshold() {
        let warned = Arc::new(AtomicUsize::new(0));
        let warned_clone = Arc::clone(&warned);

        // Expiry comfortably past the sleep below, but inside the 5 minute
        // warning threshold from the first tick onwards.
        let expires_at = Utc::now() + ChronoDuration::seconds(240);
        let handle = spawn_session_monitor(
            MonitorConfig::new().with_poll_interval(Duration::from_secs(1)),
            move || Some(expires_at),
            move || {
                warned_clone.fetch_add(1, Ordering::SeqCst);
            },
            || {},
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(warned.load(Ordering::SeqCst) >= 2);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_monitor_invokes_no_callbacks() {
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = Arc::clone(&expired);

        let past = Utc::now() - ChronoDuration::seconds(10);
        let handle = spawn_session_monitor(
            MonitorConfig::new().with_poll_interval(Duration::from_secs(60)),
            move || Some(past),
            || {},
            move || {
                expired_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        // Cancel before the first tick callback can run again; yield so the
        // abort lands.
        handle.stop();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(expired.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_session_skips_ticks() {
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = Arc::clone(&expired);

        let handle = spawn_session_monitor(
            MonitorConfig::new().with_poll_interval(Duration::from_secs(1)),
            || None,
            || {},
            move || {
                expired_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
        handle.stop();
    }
}
