//! Composite key handling for queued events.
//!
//! A queued event is identified by `channel:key`; the key portion for the
//! metrics/trxlog channels embeds a hex microsecond timestamp (see
//! `gateway_core::event_key`) used for age-based garbage collection.

/// Build the composite store key for an event.
pub fn composite_key(channel: &str, key: &str) -> String {
    format!("{}:{}", channel, key)
}

/// Split a composite key back into (channel, key).
///
/// Returns None for malformed keys without a separator.
pub fn split_composite_key(composite: &str) -> Option<(&str, &str)> {
    composite.split_once(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_roundtrip() {
        let composite = composite_key("metrics", "00000000000001");
        assert_eq!(composite, "metrics:00000000000001");
        assert_eq!(
            split_composite_key(&composite),
            Some(("metrics", "00000000000001"))
        );
    }

    #[test]
    fn test_split_malformed_key() {
        assert_eq!(split_composite_key("no-separator"), None);
    }

    #[test]
    fn test_split_key_with_colons_in_key_part() {
        // Only the first separator splits; keys may themselves contain colons.
        assert_eq!(
            split_composite_key("trxlog:abc:def"),
            Some(("trxlog", "abc:def"))
        );
    }
}
