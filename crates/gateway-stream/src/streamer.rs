//! Durable event publisher.

use crate::connection::{ConnectionActor, Outbound};
use crate::frames::{encode_event_frame, parse_inbound, AckFrame, InboundFrame};
use crate::stats::StreamStats;
use crate::StreamResult;
use gateway_core::{event_key, now_micros, GatewayConfig};
use gateway_wal::{composite_key, WalStore};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const GC_INTERVAL_SECS: u64 = 1800;

/// State shared between the publisher facade and the connection actor.
pub(crate) struct StreamerShared {
    pub wal: WalStore,
    pub stats: StreamStats,
    outbound: Mutex<Option<mpsc::Sender<Outbound>>>,
}

impl StreamerShared {
    pub(crate) fn install_outbound(&self, tx: mpsc::Sender<Outbound>) {
        *self.outbound.lock().expect("outbound lock poisoned") = Some(tx);
    }

    pub(crate) fn clear_outbound(&self) {
        *self.outbound.lock().expect("outbound lock poisoned") = None;
    }

    /// Enqueue a frame for the writer if a connection exists; the event is
    /// already durable, so a miss here only defers delivery to replay.
    pub(crate) fn try_send(&self, out: Outbound) -> bool {
        let guard = self.outbound.lock().expect("outbound lock poisoned");
        match guard.as_ref() {
            Some(tx) => tx.try_send(out).is_ok(),
            None => false,
        }
    }

    pub(crate) fn handle_inbound_text(&self, text: &str) {
        match parse_inbound(text) {
            Ok(InboundFrame::KeepAlive) => {}
            Ok(InboundFrame::Ack(ack)) => self.handle_ack(&ack),
            Err(e) => {
                warn!(error = %e, raw = %text, "Unparseable stream frame");
                self.stats.record_error();
            }
        }
    }

    fn handle_ack(&self, ack: &AckFrame) {
        if !ack.is_positive() {
            warn!(
                channel = %ack.channel,
                key = %ack.key,
                status = %ack.status,
                message = ack.message.as_deref().unwrap_or(""),
                "Negative acknowledgment; event stays queued"
            );
            self.stats.record_error();
            return;
        }

        let composite = composite_key(&ack.channel, &ack.key);
        match self.wal.delete(&composite) {
            Ok(removed) => {
                if !removed {
                    debug!(key = %composite, "Acknowledgment for unknown event");
                }
                self.stats.record_acked();
            }
            Err(e) => {
                error!(error = %e, key = %composite, "Failed to remove acknowledged event");
                self.stats.record_error();
            }
        }
    }
}

/// Durable at-least-once event publisher.
///
/// `publish` records the event in the write-ahead store before any network
/// activity, then hands it to the connection actor if one is live. Events
/// are removed only on positive acknowledgment; everything else is retried
/// by replay on the next connection.
pub struct EventStreamer {
    enabled: bool,
    url: Option<String>,
    token: String,
    retention: Duration,
    pub(crate) shared: Arc<StreamerShared>,
    shutdown_tx: watch::Sender<bool>,
}

impl EventStreamer {
    /// Open the durable store and prepare the streamer.
    ///
    /// Streaming is enabled only when the gateway itself is enabled and a
    /// stream URL can be derived; a disabled streamer accepts and drops
    /// publishes.
    pub fn new(config: &GatewayConfig) -> StreamResult<Self> {
        let wal = WalStore::open(Path::new(&config.wal_dir))?;
        let url = config.derived_stream_url();
        let enabled = config.is_enabled() && url.is_some();
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            enabled,
            url,
            token: config.bearer_token().to_string(),
            retention: config.wal_retention(),
            shared: Arc::new(StreamerShared {
                wal,
                stats: StreamStats::new(),
                outbound: Mutex::new(None),
            }),
            shutdown_tx,
        })
    }

    /// Spawn the connection actor and the garbage collector.
    ///
    /// Must be called from within a tokio runtime. A disabled streamer
    /// spawns nothing.
    pub fn start(&self) {
        if !self.enabled {
            info!("Event streaming disabled");
            return;
        }
        let Some(url) = self.url.clone() else {
            return;
        };

        let actor = ConnectionActor {
            url,
            token: self.token.clone(),
            shared: self.shared.clone(),
            shutdown: self.shutdown_tx.subscribe(),
        };
        tokio::spawn(actor.run());

        let gc_shared = self.shared.clone();
        let retention = self.retention;
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(GC_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = ticker.tick() => run_gc(&gc_shared, retention),
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Durably record one event and transmit it if connected.
    ///
    /// Returns an error only when the durable write fails; transport
    /// problems are absorbed by replay.
    pub fn publish(&self, channel: &str, key: &str, payload: &Value) -> StreamResult<()> {
        if !self.enabled {
            debug!(channel, key, "Event streaming disabled; event dropped");
            return Ok(());
        }

        let payload = serde_json::to_string(payload)?;
        let composite = composite_key(channel, key);
        self.shared.wal.put(&composite, &payload)?;

        if self.shared.stats.is_connected() {
            let frame = encode_event_frame(channel, key, &payload);
            self.shared.try_send(Outbound::Event(frame));
        }
        Ok(())
    }

    /// Publish a transaction log entry.
    ///
    /// The key embeds the current timestamp ahead of the transaction id so
    /// garbage collection can age these entries out.
    pub fn publish_trx_log(&self, trx_id: &str, payload: &Value) -> StreamResult<()> {
        let key = format!("{}-{}", event_key(now_micros()), trx_id);
        self.publish("trxlog", &key, payload)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_connected(&self) -> bool {
        self.shared.stats.is_connected()
    }

    /// Number of events awaiting acknowledgment in the durable store.
    pub fn pending_count(&self) -> u64 {
        self.shared.wal.pending_count()
    }

    /// Point-in-time stats document for operator inspection.
    pub fn stats_snapshot(&self) -> Value {
        self.shared
            .stats
            .snapshot(self.enabled, self.shared.wal.pending_count())
    }

    /// Stop the connection actor and garbage collector.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Drop events older than the retention window.
///
/// Expiry means the collector never acknowledged them within the window;
/// they are counted as delivery errors and logged, then discarded.
fn run_gc(shared: &StreamerShared, retention: Duration) {
    let cutoff = now_micros().saturating_sub(retention.as_micros() as u64);
    match shared.wal.delete_older_than(cutoff) {
        Ok(0) => {}
        Ok(removed) => {
            warn!(
                removed,
                retention_secs = retention.as_secs(),
                "Dropped undeliverable events past the retention window"
            );
            shared.stats.record_errors(removed as u64);
        }
        Err(e) => {
            error!(error = %e, "Durable store garbage collection failed");
            shared.stats.record_error();
        }
    }
}
