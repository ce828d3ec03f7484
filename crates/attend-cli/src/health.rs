use attend_client::{AttendClient, ClientError};
use attend_types::HealthStatus;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendHealth {
    #[default]
    Unknown,
    Ok,
    Error,
}

impl fmt::Display for BackendHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendHealth::Unknown => "unknown",
            BackendHealth::Ok => "ok",
            BackendHealth::Error => "error",
        };
        f.write_str(label)
    }
}

/// Remembers the last check outcome so only changes get reported
#[derive(Debug, Default)]
pub struct HealthTracker {
    current: BackendHealth,
    last_error: Option<String>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> BackendHealth {
        self.current
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a check result. Returns the new state when it differs from the
    /// previous one.
    pub fn observe(&mut self, check: &Result<HealthStatus, ClientError>) -> Option<BackendHealth> {
        let next = match check {
            Ok(status) if status.is_ok() => {
                self.last_error = None;
                BackendHealth::Ok
            }
            Ok(status) => {
                self.last_error = Some(format!("backend reported '{}'", status.status));
                BackendHealth::Error
            }
            Err(_) => {
                self.last_error = Some("Backend unavailable".to_string());
                BackendHealth::Error
            }
        };

        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

/// Poll `/health` every `interval` until the task is aborted
pub async fn monitor(client: AttendClient, interval: Duration) {
    let mut tracker = HealthTracker::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let check = client.health().check().await;
        if let Err(e) = &check {
            tracing::debug!(error = %e, "Health check failed");
        }

        match tracker.observe(&check) {
            Some(BackendHealth::Ok) => tracing::info!(health = %BackendHealth::Ok, "Backend reachable"),
            Some(state) => tracing::warn!(
                health = %state,
                reason = tracker.last_error().unwrap_or_default(),
                "Backend unhealthy"
            ),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(value: &str) -> HealthStatus {
        HealthStatus {
            status: value.to_string(),
            timestamp: None,
            service: None,
        }
    }

    #[test]
    fn test_reports_only_transitions() {
        let mut tracker = HealthTracker::new();
        assert_eq!(tracker.current(), BackendHealth::Unknown);

        assert_eq!(tracker.observe(&Ok(status("ok"))), Some(BackendHealth::Ok));
        assert_eq!(tracker.observe(&Ok(status("ok"))), None);

        let down = Err(ClientError::InvalidConfig("connection refused".to_string()));
        assert_eq!(tracker.observe(&down), Some(BackendHealth::Error));
        assert_eq!(tracker.last_error(), Some("Backend unavailable"));
        assert_eq!(tracker.observe(&down), None);

        assert_eq!(tracker.observe(&Ok(status("ok"))), Some(BackendHealth::Ok));
        assert_eq!(tracker.last_error(), None);
    }

    #[test]
    fn test_degraded_status_is_an_error() {
        let mut tracker = HealthTracker::new();
        assert_eq!(tracker.observe(&Ok(status("degraded"))), Some(BackendHealth::Error));
        assert_eq!(tracker.last_error(), Some("backend reported 'degraded'"));
    }
}
