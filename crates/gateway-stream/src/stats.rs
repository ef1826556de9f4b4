//! Streaming delivery counters.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

/// Connection lifecycle state, owned by the connection actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
        }
    }
}

/// Lock-free counters for the event stream.
///
/// `in_flight` may go negative after a restart: replayed events are
/// acknowledged against a `published` count that reset to zero.
pub struct StreamStats {
    state: AtomicU8,
    reconnect_delay_secs: AtomicU64,
    published: AtomicU64,
    acked: AtomicU64,
    in_flight: AtomicI64,
    errors: AtomicU64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            reconnect_delay_secs: AtomicU64::new(1),
            published: AtomicU64::new(0),
            acked: AtomicU64::new(0),
            in_flight: AtomicI64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn set_reconnect_delay(&self, secs: u64) {
        self.reconnect_delay_secs.store(secs, Ordering::Relaxed);
    }

    /// Count one event handed to the transport; returns the new in-flight
    /// depth for backlog watermark checks.
    pub fn record_published(&self) -> i64 {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_errors(&self, count: u64) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Point-in-time stats document for operator inspection.
    pub fn snapshot(&self, enabled: bool, wal_pending: u64) -> Value {
        json!({
            "enabled": enabled,
            "connected": self.is_connected(),
            "state": self.state().as_str(),
            "walPending": wal_pending,
            "published": self.published(),
            "acked": self.acked(),
            "inFlight": self.in_flight(),
            "errors": self.errors(),
            "reconnectDelaySecs": self.reconnect_delay_secs.load(Ordering::Relaxed),
        })
    }
}

impl Default for StreamStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let stats = StreamStats::new();
        assert_eq!(stats.state(), ConnectionState::Disconnected);
        assert!(!stats.is_connected());
        assert_eq!(stats.published(), 0);
        assert_eq!(stats.in_flight(), 0);
    }

    #[test]
    fn test_publish_ack_cycle() {
        let stats = StreamStats::new();
        assert_eq!(stats.record_published(), 1);
        assert_eq!(stats.record_published(), 2);
        stats.record_acked();
        assert_eq!(stats.published(), 2);
        assert_eq!(stats.acked(), 1);
        assert_eq!(stats.in_flight(), 1);
    }

    #[test]
    fn test_in_flight_can_go_negative_after_replay() {
        let stats = StreamStats::new();
        // Ack for an event published before a restart.
        stats.record_acked();
        assert_eq!(stats.in_flight(), -1);
    }

    #[test]
    fn test_snapshot_fields() {
        let stats = StreamStats::new();
        stats.set_state(ConnectionState::Connected);
        stats.record_published();
        stats.record_error();

        let snap = stats.snapshot(true, 3);
        assert_eq!(snap["enabled"], true);
        assert_eq!(snap["connected"], true);
        assert_eq!(snap["state"], "CONNECTED");
        assert_eq!(snap["walPending"], 3);
        assert_eq!(snap["published"], 1);
        assert_eq!(snap["inFlight"], 1);
        assert_eq!(snap["errors"], 1);
    }
}
