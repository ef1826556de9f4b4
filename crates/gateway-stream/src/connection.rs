//! WebSocket connection actor.
//!
//! One task owns the whole connection lifecycle: it dials, replays queued
//! events, pumps frames in both directions, and backs off after a drop. No
//! other task ever touches the socket, so connecting/reconnecting cannot
//! race.

use crate::streamer::StreamerShared;
use crate::stats::ConnectionState;
use crate::{StreamError, StreamResult};
use futures_util::{SinkExt, StreamExt};
use gateway_wal::split_composite_key;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Bytes, Message};
use tracing::{debug, error, info, warn};

pub(crate) const INITIAL_RECONNECT_DELAY_SECS: u64 = 1;
pub(crate) const MAX_RECONNECT_DELAY_SECS: u64 = 60;

const OUTBOUND_CAPACITY: usize = 256;

/// Exponential backoff step, capped.
pub(crate) fn next_delay(current_secs: u64) -> u64 {
    current_secs
        .saturating_mul(2)
        .min(MAX_RECONNECT_DELAY_SECS)
}

/// Messages handed to the writer half of the connection.
pub(crate) enum Outbound {
    /// A fully encoded event frame; counted as published once sent.
    Event(String),
    Pong(Bytes),
}

/// The connection actor; consumed by [`ConnectionActor::run`].
pub(crate) struct ConnectionActor {
    pub url: String,
    pub token: String,
    pub shared: Arc<StreamerShared>,
    pub shutdown: watch::Receiver<bool>,
}

impl ConnectionActor {
    /// Drive connect/serve/backoff until shutdown.
    pub async fn run(mut self) {
        let mut delay = INITIAL_RECONNECT_DELAY_SECS;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.shared.stats.set_state(ConnectionState::Connecting);
            if let Err(e) = self.session(&mut delay).await {
                self.shared.stats.record_error();
                warn!(error = %e, "Event stream connection failed");
            }

            self.shared.clear_outbound();
            self.shared.stats.set_state(ConnectionState::Disconnected);

            if *self.shutdown.borrow() {
                break;
            }

            self.shared.stats.set_reconnect_delay(delay);
            debug!(delay_secs = delay, "Event stream reconnect scheduled");
            tokio::select! {
                _ = sleep(Duration::from_secs(delay)) => {}
                _ = self.shutdown.changed() => break,
            }
            delay = next_delay(delay);
        }

        info!("Event stream connection actor stopped");
    }

    /// One connection attempt and, if it succeeds, the frame loop until the
    /// connection drops. Resets the backoff delay on a successful handshake.
    async fn session(&mut self, delay: &mut u64) -> StreamResult<()> {
        info!(url = %self.url, "Connecting to event stream");

        let mut request = self.url.as_str().into_client_request()?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| StreamError::InvalidToken)?;
        request.headers_mut().insert("Authorization", auth);

        let (ws_stream, _) = connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        *delay = INITIAL_RECONNECT_DELAY_SECS;
        self.shared
            .stats
            .set_reconnect_delay(INITIAL_RECONNECT_DELAY_SECS);
        self.shared.stats.set_state(ConnectionState::Connected);
        info!("Event stream connected");

        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(OUTBOUND_CAPACITY);
        self.shared.install_outbound(out_tx.clone());

        // Writer task owns the sink; publish paths only ever enqueue.
        let writer_shared = self.shared.clone();
        let writer = tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                let (msg, counted) = match out {
                    Outbound::Event(frame) => (Message::Text(frame.into()), true),
                    Outbound::Pong(data) => (Message::Pong(data), false),
                };
                if let Err(e) = write.send(msg).await {
                    warn!(error = %e, "Event stream send failed");
                    writer_shared.stats.record_error();
                    break;
                }
                if counted {
                    let in_flight = writer_shared.stats.record_published();
                    log_in_flight_watermark(in_flight);
                }
            }
        });

        // Replay runs concurrently with new publishes; duplicates are
        // resolved by the collector's duplicate_ok acks.
        let replay_shared = self.shared.clone();
        tokio::spawn(async move {
            replay_pending(replay_shared, out_tx).await;
        });

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.shared.handle_inbound_text(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            self.shared.try_send(Outbound::Pong(data));
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Event stream closed by remote");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Event stream read error");
                            self.shared.stats.record_error();
                            break;
                        }
                        None => break,
                    }
                }
                _ = self.shutdown.changed() => break,
            }
        }

        self.shared.clear_outbound();
        writer.abort();
        Ok(())
    }
}

/// Re-send every event still queued in the durable store.
async fn replay_pending(shared: Arc<StreamerShared>, tx: mpsc::Sender<Outbound>) {
    let entries = match shared.wal.scan_all() {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "Replay scan of durable store failed");
            shared.stats.record_error();
            return;
        }
    };
    if entries.is_empty() {
        return;
    }

    info!(count = entries.len(), "Replaying unacknowledged events");
    for (composite, payload) in entries {
        let Some((channel, key)) = split_composite_key(&composite) else {
            warn!(key = %composite, "Skipping malformed durable key during replay");
            continue;
        };
        let frame = crate::frames::encode_event_frame(channel, key, &payload);
        if tx.send(Outbound::Event(frame)).await.is_err() {
            // Connection dropped mid-replay; entries stay queued for the
            // next session.
            break;
        }
    }
}

fn log_in_flight_watermark(in_flight: i64) {
    if in_flight > 1000 {
        warn!(in_flight, "Unacknowledged event backlog is very high");
    } else if in_flight > 100 && in_flight % 100 == 0 {
        info!(in_flight, "Unacknowledged event backlog growing");
    }
}
