//! Correlation ids and durable-event keys.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of the hex timestamp embedded in metrics/trxlog event keys.
const KEY_TIMESTAMP_WIDTH: usize = 14;

/// Current wall-clock time in microseconds since the epoch.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Generate a client-side transaction id for log correlation.
///
/// The id combines a microsecond clock value with a random byte so that
/// two calls issued in the same microsecond remain distinguishable.
pub fn client_trx_id() -> String {
    let byte: u8 = rand::thread_rng().gen();
    format!("{:x}", (now_micros() << 8) | u64::from(byte))
}

/// Build an event key whose prefix is a zero-padded hex microsecond
/// timestamp, enabling age-based garbage collection without an index.
pub fn event_key(micros: u64) -> String {
    format!("{:014x}", micros)
}

/// Extract the microsecond timestamp embedded in an event key.
///
/// Returns None for keys that do not start with a full-width hex timestamp.
pub fn parse_key_timestamp(key: &str) -> Option<u64> {
    if key.len() < KEY_TIMESTAMP_WIDTH {
        return None;
    }
    u64::from_str_radix(&key[..KEY_TIMESTAMP_WIDTH], 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_roundtrip() {
        let micros = 1_733_000_000_123_456u64;
        let key = event_key(micros);
        assert_eq!(key.len(), 14);
        assert_eq!(parse_key_timestamp(&key), Some(micros));
    }

    #[test]
    fn test_event_key_zero_padded() {
        let key = event_key(0x1a2b);
        assert_eq!(key, "00000000001a2b");
    }

    #[test]
    fn test_parse_key_timestamp_short_key() {
        assert_eq!(parse_key_timestamp("abc"), None);
        assert_eq!(parse_key_timestamp(""), None);
    }

    #[test]
    fn test_parse_key_timestamp_non_hex() {
        assert_eq!(parse_key_timestamp("zzzzzzzzzzzzzz"), None);
    }

    #[test]
    fn test_parse_key_timestamp_ignores_suffix() {
        let key = format!("{}-extra", event_key(42));
        assert_eq!(parse_key_timestamp(&key), Some(42));
    }

    #[test]
    fn test_client_trx_id_unique() {
        let a = client_trx_id();
        let b = client_trx_id();
        assert!(!a.is_empty());
        // Clock plus random byte makes collisions vanishingly unlikely.
        assert_ne!(a, b);
    }

    #[test]
    fn test_now_micros_monotonic_enough() {
        let a = now_micros();
        let b = now_micros();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000_000);
    }
}
