//! SQLite-backed durable event store.

use crate::{split_composite_key, WalError, WalResult};
use gateway_core::parse_key_timestamp;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

const STORE_FILE: &str = "stream_wal.db";

/// Durable keyed store for unacknowledged events.
///
/// A `put` is durable before it returns (`synchronous = FULL`); an entry is
/// present exactly while the event awaits a positive acknowledgment. Point
/// operations go straight to the pool; full scans serialize on a dedicated
/// scan lock so replay and garbage collection never race each other's
/// cursors.
pub struct WalStore {
    pool: Pool<SqliteConnectionManager>,
    scan_lock: Mutex<()>,
    pending: AtomicU64,
}

impl WalStore {
    /// Open (or create) the store under the given directory.
    ///
    /// Entries surviving from a previous run are counted and reported.
    pub fn open(dir: &Path) -> WalResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE);

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = FULL;
                PRAGMA busy_timeout = 5000;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| WalError::Pool(e.to_string()))?;

        {
            let conn = pool.get().map_err(|e| WalError::Pool(e.to_string()))?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS wal_events (
                    composite_key TEXT PRIMARY KEY,
                    payload TEXT NOT NULL
                )",
                [],
            )?;
        }

        let store = Self {
            pool,
            scan_lock: Mutex::new(()),
            pending: AtomicU64::new(0),
        };

        let recovered = store.count_entries()?;
        store.pending.store(recovered, Ordering::Relaxed);

        if recovered > 0 {
            warn!(path = %path.display(), pending = recovered, "WAL has pending events from previous run");
        } else {
            info!(path = %path.display(), "WAL opened");
        }

        Ok(store)
    }

    fn conn(&self) -> WalResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| WalError::Pool(e.to_string()))
    }

    fn count_entries(&self) -> WalResult<u64> {
        let conn = self.conn()?;
        let count: u64 =
            conn.query_row("SELECT COUNT(*) FROM wal_events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Durably record an event; returns only after the write is synced.
    ///
    /// The existence probe and the insert run in one immediate transaction,
    /// so concurrent puts of the same key count it exactly once.
    pub fn put(&self, composite_key: &str, payload: &str) -> WalResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existed: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM wal_events WHERE composite_key = ?1)",
            params![composite_key],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO wal_events (composite_key, payload) VALUES (?1, ?2)",
            params![composite_key, payload],
        )?;
        tx.commit()?;
        if !existed {
            self.pending.fetch_add(1, Ordering::Relaxed);
        }
        debug!(key = %composite_key, "WAL append");
        Ok(())
    }

    /// Remove an acknowledged event; returns true if an entry was removed.
    pub fn delete(&self, composite_key: &str) -> WalResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM wal_events WHERE composite_key = ?1",
            params![composite_key],
        )?;
        if removed > 0 {
            self.pending.fetch_sub(1, Ordering::Relaxed);
        }
        Ok(removed > 0)
    }

    /// Snapshot every queued entry, in the store's natural key order.
    ///
    /// Used only by replay and garbage collection; holds the scan lock for
    /// the duration so scans never interleave.
    pub fn scan_all(&self) -> WalResult<Vec<(String, String)>> {
        let _guard = self.scan_lock.lock().expect("scan lock poisoned");

        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT composite_key, payload FROM wal_events ORDER BY composite_key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Delete entries whose embedded key timestamp is older than
    /// `cutoff_micros`; returns the number removed.
    ///
    /// Entries without a parseable timestamp are left alone.
    pub fn delete_older_than(&self, cutoff_micros: u64) -> WalResult<usize> {
        let _guard = self.scan_lock.lock().expect("scan lock poisoned");

        let conn = self.conn()?;
        let expired: Vec<String> = {
            let mut stmt = conn.prepare("SELECT composite_key FROM wal_events")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            keys.into_iter()
                .filter(|composite| {
                    split_composite_key(composite)
                        .and_then(|(_, key)| parse_key_timestamp(key))
                        .is_some_and(|ts| ts < cutoff_micros)
                })
                .collect()
        };

        self.delete_keys(&conn, &expired)
    }

    /// Delete the given keys, adjusting the pending gauge by the number of
    /// rows actually removed.
    ///
    /// An acknowledgment may delete a key between a scan and this pass;
    /// only the DELETE's affected-row count feeds the gauge, so such keys
    /// cannot drive it below zero.
    fn delete_keys(
        &self,
        conn: &PooledConnection<SqliteConnectionManager>,
        keys: &[String],
    ) -> WalResult<usize> {
        let mut removed = 0;
        for composite in keys {
            removed += conn.execute(
                "DELETE FROM wal_events WHERE composite_key = ?1",
                params![composite],
            )?;
        }
        if removed > 0 {
            self.pending.fetch_sub(removed as u64, Ordering::Relaxed);
        }
        Ok(removed)
    }

    /// Number of entries awaiting acknowledgment.
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite_key;
    use gateway_core::event_key;
    use tempfile::tempdir;

    #[test]
    fn test_put_delete_scan() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        store.put("metrics:0001", "{\"a\":1}").unwrap();
        store.put("trxlog:0002", "{\"b\":2}").unwrap();
        assert_eq!(store.pending_count(), 2);

        let all = store.scan_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "metrics:0001");
        assert_eq!(all[0].1, "{\"a\":1}");

        assert!(store.delete("metrics:0001").unwrap());
        assert_eq!(store.pending_count(), 1);

        // Deleting an absent key is a no-op.
        assert!(!store.delete("metrics:0001").unwrap());
        assert_eq!(store.pending_count(), 1);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = WalStore::open(dir.path()).unwrap();
            store.put("metrics:00000000000001", "{}").unwrap();
            store.put("metrics:00000000000002", "{}").unwrap();
        }

        // Reopen simulates a process restart.
        let store = WalStore::open(dir.path()).unwrap();
        assert_eq!(store.pending_count(), 2);

        let all = store.scan_all().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_delete_older_than_respects_window() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        let old_key = composite_key("metrics", &event_key(1_000));
        let new_key = composite_key("metrics", &event_key(5_000));
        store.put(&old_key, "{}").unwrap();
        store.put(&new_key, "{}").unwrap();

        let removed = store.delete_older_than(3_000).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.pending_count(), 1);

        let remaining = store.scan_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, new_key);
    }

    #[test]
    fn test_delete_older_than_boundary() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        let key = composite_key("metrics", &event_key(3_000));
        store.put(&key, "{}").unwrap();

        // Exactly at the cutoff is not older than the cutoff.
        assert_eq!(store.delete_older_than(3_000).unwrap(), 0);
        assert_eq!(store.delete_older_than(3_001).unwrap(), 1);
    }

    #[test]
    fn test_gc_skips_untimestamped_keys() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        store.put("session:short-key", "{}").unwrap();
        store.put("malformed-no-separator", "{}").unwrap();

        assert_eq!(store.delete_older_than(u64::MAX).unwrap(), 0);
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn test_scan_order_is_key_order() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        // Insert out of key order.
        store.put("metrics:00000000000003", "c").unwrap();
        store.put("metrics:00000000000001", "a").unwrap();
        store.put("metrics:00000000000002", "b").unwrap();

        let all = store.scan_all().unwrap();
        let keys: Vec<_> = all.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "metrics:00000000000001",
                "metrics:00000000000002",
                "metrics:00000000000003",
            ]
        );
    }

    #[test]
    fn test_expired_key_removed_elsewhere_keeps_gauge_intact() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        let acked = composite_key("metrics", &event_key(1_000));
        let stale = composite_key("metrics", &event_key(2_000));
        store.put(&acked, "{}").unwrap();
        store.put(&stale, "{}").unwrap();

        // An acknowledgment removes one key after a collector pass has
        // already selected it for expiry.
        assert!(store.delete(&acked).unwrap());
        assert_eq!(store.pending_count(), 1);

        let conn = store.conn().unwrap();
        let removed = store
            .delete_keys(&conn, &[acked.clone(), stale.clone()])
            .unwrap();

        // Only the row that still existed counts; the gauge must not wrap.
        assert_eq!(removed, 1);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_concurrent_puts_same_key_count_once() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let store = Arc::new(WalStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.put("metrics:00000000000001", "{}").unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let dir = tempdir().unwrap();
        let store = WalStore::open(dir.path()).unwrap();

        store.put("metrics:0001", "old").unwrap();
        store.put("metrics:0001", "new").unwrap();

        let all = store.scan_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1, "new");
        assert_eq!(store.pending_count(), 1);
    }
}
