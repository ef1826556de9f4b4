//! Durable event streaming over a persistent WebSocket.
//!
//! Events are written to a durable store before transmission and removed
//! only on positive acknowledgment from the remote collector, giving
//! at-least-once delivery across disconnects and restarts. A single
//! connection actor owns the socket lifecycle, including exponential
//! reconnect backoff and replay of the queued backlog.

mod connection;
mod error;
mod frames;
mod stats;
mod streamer;

pub use error::{StreamError, StreamResult};
pub use frames::{encode_event_frame, parse_inbound, AckFrame, InboundFrame};
pub use stats::{ConnectionState, StreamStats};
pub use streamer::EventStreamer;
