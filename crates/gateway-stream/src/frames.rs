//! Wire frames for the event stream.
//!
//! Outbound events are tab-separated text frames:
//!
//! ```text
//! channel<TAB>key<TAB>payload-json<NEWLINE>
//! ```
//!
//! Inbound frames are either keep-alives (empty or `[]`) or per-event
//! acknowledgments as a JSON object.

use serde::Deserialize;

/// Acknowledgment statuses that complete delivery of an event.
const POSITIVE_STATUSES: [&str; 2] = ["ok", "duplicate_ok"];

/// Encode one outbound event frame.
///
/// The payload must be a single-line JSON document; `serde_json::to_string`
/// output always satisfies this.
pub fn encode_event_frame(channel: &str, key: &str, payload: &str) -> String {
    format!("{}\t{}\t{}\n", channel, key, payload)
}

/// Per-event acknowledgment sent back by the collector.
#[derive(Debug, Clone, Deserialize)]
pub struct AckFrame {
    pub channel: String,
    pub key: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckFrame {
    /// Whether this acknowledgment completes delivery.
    ///
    /// `duplicate_ok` means the collector already had the event, which is an
    /// expected outcome of at-least-once replay.
    pub fn is_positive(&self) -> bool {
        POSITIVE_STATUSES.contains(&self.status.as_str())
    }
}

/// A decoded inbound frame.
#[derive(Debug)]
pub enum InboundFrame {
    /// Connection keep-alive; carries no event state.
    KeepAlive,
    /// Acknowledgment for a previously published event.
    Ack(AckFrame),
}

/// Decode one inbound text frame.
pub fn parse_inbound(text: &str) -> Result<InboundFrame, serde_json::Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(InboundFrame::KeepAlive);
    }
    Ok(InboundFrame::Ack(serde_json::from_str(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_event_frame() {
        let frame = encode_event_frame("metrics", "00000000000001", "{\"a\":1}");
        assert_eq!(frame, "metrics\t00000000000001\t{\"a\":1}\n");
    }

    #[test]
    fn test_parse_ack() {
        let frame =
            parse_inbound(r#"{"channel":"metrics","key":"0001","status":"ok"}"#).unwrap();
        match frame {
            InboundFrame::Ack(ack) => {
                assert_eq!(ack.channel, "metrics");
                assert_eq!(ack.key, "0001");
                assert!(ack.is_positive());
                assert!(ack.message.is_none());
            }
            _ => panic!("expected ack"),
        }
    }

    #[test]
    fn test_parse_ack_with_message() {
        let frame = parse_inbound(
            r#"{"channel":"trxlog","key":"0002","status":"error","message":"schema mismatch"}"#,
        )
        .unwrap();
        match frame {
            InboundFrame::Ack(ack) => {
                assert!(!ack.is_positive());
                assert_eq!(ack.message.as_deref(), Some("schema mismatch"));
            }
            _ => panic!("expected ack"),
        }
    }

    #[test]
    fn test_duplicate_ok_is_positive() {
        let frame =
            parse_inbound(r#"{"channel":"metrics","key":"0001","status":"duplicate_ok"}"#)
                .unwrap();
        match frame {
            InboundFrame::Ack(ack) => assert!(ack.is_positive()),
            _ => panic!("expected ack"),
        }
    }

    #[test]
    fn test_keepalive_frames() {
        assert!(matches!(parse_inbound("").unwrap(), InboundFrame::KeepAlive));
        assert!(matches!(parse_inbound("[]").unwrap(), InboundFrame::KeepAlive));
        assert!(matches!(
            parse_inbound(" \n").unwrap(),
            InboundFrame::KeepAlive
        ));
    }

    #[test]
    fn test_malformed_frame_is_error() {
        assert!(parse_inbound("not json").is_err());
        assert!(parse_inbound("{\"channel\":\"metrics\"}").is_err());
    }
}
