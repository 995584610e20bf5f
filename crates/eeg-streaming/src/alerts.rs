//! Bounded alert queue with per-severity expiry

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Alerts kept before the oldest is evicted
pub const ALERT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    /// How long an alert of this severity stays queued; warnings persist
    pub fn lifetime(&self) -> Option<Duration> {
        match self {
            AlertSeverity::Info => Some(Duration::from_secs(5)),
            AlertSeverity::Warning => None,
            AlertSeverity::Critical => Some(Duration::from_secs(10)),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub message: String,
    pub severity: AlertSeverity,
    /// Session time at which the alert was raised
    pub timestamp: Duration,
    /// Session time at which the alert is dropped
    pub expires_at: Option<Duration>,
}

impl Alert {
    pub fn is_expired(&self, now: Duration) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Newest-first alert queue
#[derive(Debug, Clone)]
pub struct AlertQueue {
    alerts: VecDeque<Alert>,
    capacity: usize,
    next_id: u64,
}

impl Default for AlertQueue {
    fn default() -> Self {
        Self::with_capacity(ALERT_CAPACITY)
    }
}

impl AlertQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Raise an alert, evicting the oldest one when full
    pub fn push(
        &mut self,
        message: impl Into<String>,
        severity: AlertSeverity,
        now: Duration,
    ) -> Alert {
        let alert = Alert {
            id: self.next_id,
            message: message.into(),
            severity,
            timestamp: now,
            expires_at: severity.lifetime().map(|lifetime| now + lifetime),
        };
        self.next_id += 1;

        self.alerts.push_front(alert.clone());
        self.alerts.truncate(self.capacity);
        alert
    }

    /// Remove an alert before it expires
    pub fn remove(&mut self, id: u64) -> Option<Alert> {
        let index = self.alerts.iter().position(|a| a.id == id)?;
        self.alerts.remove(index)
    }

    /// Drop every alert due at `now`, returning the dropped alerts
    pub fn expire(&mut self, now: Duration) -> Vec<Alert> {
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.alerts.drain(..).partition(|a| a.is_expired(now));
        self.alerts = kept.into();
        expired
    }

    /// Earliest pending expiry
    pub fn next_expiry(&self) -> Option<Duration> {
        self.alerts.iter().filter_map(|a| a.expires_at).min()
    }

    /// Alerts, newest first
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_newest_first_and_capacity() {
        let mut queue = AlertQueue::default();
        for i in 0..6 {
            queue.push(format!("alert {}", i), AlertSeverity::Warning, secs(i));
        }
        assert_eq!(queue.len(), ALERT_CAPACITY);
        let messages: Vec<_> = queue.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["alert 5", "alert 4", "alert 3", "alert 2", "alert 1"]
        );
    }

    #[test]
    fn test_expiry_by_severity() {
        let mut queue = AlertQueue::default();
        queue.push("critical", AlertSeverity::Critical, secs(0));
        queue.push("info", AlertSeverity::Info, secs(0));
        queue.push("warning", AlertSeverity::Warning, secs(0));
        assert_eq!(queue.next_expiry(), Some(secs(5)));

        assert!(queue.expire(Duration::from_millis(4999)).is_empty());

        let expired = queue.expire(secs(5));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message, "info");

        let expired = queue.expire(secs(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].severity, AlertSeverity::Critical);

        assert!(queue.expire(secs(3600)).is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_expiry(), None);
    }

    #[test]
    fn test_removal_cancels_expiry() {
        let mut queue = AlertQueue::default();
        let critical = queue.push("spike", AlertSeverity::Critical, secs(0));
        let info = queue.push("done", AlertSeverity::Info, secs(1));

        assert_eq!(queue.remove(critical.id), Some(critical.clone()));
        assert_eq!(queue.remove(critical.id), None);
        assert_eq!(queue.next_expiry(), info.expires_at);

        let expired = queue.expire(secs(10));
        assert_eq!(expired, vec![info]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_eviction_drops_expiry() {
        let mut queue = AlertQueue::with_capacity(1);
        queue.push("old", AlertSeverity::Critical, secs(0));
        queue.push("new", AlertSeverity::Warning, secs(1));
        assert_eq!(queue.next_expiry(), None);
        assert!(queue.expire(secs(20)).is_empty());
    }
}
