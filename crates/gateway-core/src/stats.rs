//! Lock-free statistics counters for the gateway.

use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

/// Latency histogram bucket boundaries in milliseconds.
const LATENCY_BOUNDS_MS: [u64; 4] = [10, 50, 100, 500];

/// Atomic statistics for the approval call pipeline.
///
/// All counters are plain atomics; peak values are maintained with
/// compare-and-swap retry loops so no lock is ever taken on the hot path.
#[derive(Debug, Default)]
pub struct ApiStats {
    trx_count: AtomicU64,
    err_count: AtomicU64,
    outstanding_blocking_calls: AtomicU64,
    peak_concurrent_calls: AtomicU64,
    total_blocking_calls: AtomicU64,
    peak_queue_depth: AtomicU64,
    total_round_trip_ms: AtomicU64,
    total_request_ms: AtomicU64,
    latency_buckets: [AtomicU64; 5],
}

impl ApiStats {
    /// Create a zeroed statistics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one issued transaction.
    pub fn increment_trx(&self) {
        self.trx_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed transaction.
    pub fn increment_err(&self) {
        self.err_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn trx_count(&self) -> u64 {
        self.trx_count.load(Ordering::Relaxed)
    }

    pub fn err_count(&self) -> u64 {
        self.err_count.load(Ordering::Relaxed)
    }

    pub fn outstanding_blocking_calls(&self) -> u64 {
        self.outstanding_blocking_calls.load(Ordering::Relaxed)
    }

    pub fn peak_concurrent_calls(&self) -> u64 {
        self.peak_concurrent_calls.load(Ordering::Relaxed)
    }

    pub fn peak_queue_depth(&self) -> u64 {
        self.peak_queue_depth.load(Ordering::Relaxed)
    }

    /// Record the start of a blocking call, updating the concurrency peak.
    pub fn blocking_call_started(&self) {
        self.total_blocking_calls.fetch_add(1, Ordering::Relaxed);
        let current = self.outstanding_blocking_calls.fetch_add(1, Ordering::Relaxed) + 1;
        raise_peak(&self.peak_concurrent_calls, current);
    }

    /// Record the end of a blocking call.
    ///
    /// `remote_request_ms` is the remote-reported processing time, when the
    /// response carried one; the difference against `elapsed_ms` is the
    /// local overhead reported by `snapshot`. The latency histogram is fed
    /// separately by the dispatcher, which owns the single elapsed-time
    /// measurement per call.
    pub fn blocking_call_finished(&self, elapsed_ms: u64, remote_request_ms: Option<u64>) {
        self.outstanding_blocking_calls.fetch_sub(1, Ordering::Relaxed);
        self.total_round_trip_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        if let Some(req_ms) = remote_request_ms {
            self.total_request_ms.fetch_add(req_ms, Ordering::Relaxed);
        }
    }

    /// Record one round-trip latency sample in the histogram.
    pub fn record_latency(&self, elapsed_ms: u64) {
        let idx = LATENCY_BOUNDS_MS
            .iter()
            .position(|bound| elapsed_ms < *bound)
            .unwrap_or(LATENCY_BOUNDS_MS.len());
        self.latency_buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Track the completion-queue depth; returns true on a new peak.
    pub fn note_queue_depth(&self, depth: u64) -> bool {
        raise_peak(&self.peak_queue_depth, depth)
    }

    /// Bucket counts in ascending order: 0-10, 10-50, 50-100, 100-500, 500+.
    pub fn latency_buckets(&self) -> [u64; 5] {
        [
            self.latency_buckets[0].load(Ordering::Relaxed),
            self.latency_buckets[1].load(Ordering::Relaxed),
            self.latency_buckets[2].load(Ordering::Relaxed),
            self.latency_buckets[3].load(Ordering::Relaxed),
            self.latency_buckets[4].load(Ordering::Relaxed),
        ]
    }

    /// JSON snapshot for the admin surface and metrics export.
    pub fn snapshot(&self) -> serde_json::Value {
        let total = self.total_blocking_calls.load(Ordering::Relaxed);
        let round_trip = self.total_round_trip_ms.load(Ordering::Relaxed);
        let request = self.total_request_ms.load(Ordering::Relaxed);

        let (avg_round_trip, avg_request, avg_process) = if total > 0 {
            (
                round_trip / total,
                request / total,
                round_trip.saturating_sub(request) / total,
            )
        } else {
            (0, 0, 0)
        };

        let buckets = self.latency_buckets();

        json!({
            "trxCount": self.trx_count(),
            "errCount": self.err_count(),
            "outstandingBlockingCalls": self.outstanding_blocking_calls(),
            "peakConcurrentCalls": self.peak_concurrent_calls(),
            "peakQueueDepth": self.peak_queue_depth(),
            "totalBlockingCalls": total,
            "avgRoundTripMs": avg_round_trip,
            "avgRequestMs": avg_request,
            "avgProcessMs": avg_process,
            "latency": {
                "0-10ms": buckets[0],
                "10-50ms": buckets[1],
                "50-100ms": buckets[2],
                "100-500ms": buckets[3],
                "500ms+": buckets[4],
            },
        })
    }
}

/// Raise `peak` to `candidate` if it is higher; returns true when raised.
fn raise_peak(peak: &AtomicU64, candidate: u64) -> bool {
    let mut current = peak.load(Ordering::Relaxed);
    while candidate > current {
        match peak.compare_exchange_weak(current, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return true,
            Err(observed) => current = observed,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latency_bucket_boundaries() {
        let stats = ApiStats::new();
        stats.record_latency(0);
        stats.record_latency(9);
        stats.record_latency(10);
        stats.record_latency(49);
        stats.record_latency(50);
        stats.record_latency(99);
        stats.record_latency(100);
        stats.record_latency(499);
        stats.record_latency(500);
        stats.record_latency(12_000);

        assert_eq!(stats.latency_buckets(), [2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_blocking_call_counters() {
        let stats = ApiStats::new();

        stats.blocking_call_started();
        stats.blocking_call_started();
        assert_eq!(stats.outstanding_blocking_calls(), 2);
        assert_eq!(stats.peak_concurrent_calls(), 2);

        stats.blocking_call_finished(40, Some(30));
        stats.blocking_call_finished(60, None);
        assert_eq!(stats.outstanding_blocking_calls(), 0);
        // Peak is sticky.
        assert_eq!(stats.peak_concurrent_calls(), 2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot["totalBlockingCalls"], 2);
        assert_eq!(snapshot["avgRoundTripMs"], 50);
        assert_eq!(snapshot["avgRequestMs"], 15);
        assert_eq!(snapshot["avgProcessMs"], 35);
    }

    #[test]
    fn test_snapshot_zero_calls_has_zero_averages() {
        let stats = ApiStats::new();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot["avgRoundTripMs"], 0);
        assert_eq!(snapshot["avgRequestMs"], 0);
        assert_eq!(snapshot["avgProcessMs"], 0);
    }

    #[test]
    fn test_queue_depth_peak() {
        let stats = ApiStats::new();
        assert!(stats.note_queue_depth(3));
        assert!(!stats.note_queue_depth(2));
        assert!(!stats.note_queue_depth(3));
        assert!(stats.note_queue_depth(7));
        assert_eq!(stats.peak_queue_depth(), 7);
    }

    #[test]
    fn test_peak_tracking_concurrent() {
        let stats = Arc::new(ApiStats::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for depth in 1..=1000u64 {
                        stats.note_queue_depth(depth);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.peak_queue_depth(), 1000);
    }

    #[test]
    fn test_trx_and_err_counts() {
        let stats = ApiStats::new();
        stats.increment_trx();
        stats.increment_trx();
        stats.increment_err();
        assert_eq!(stats.trx_count(), 2);
        assert_eq!(stats.err_count(), 1);
    }
}
