//! Zone store adapter.
//!
//! Pulls zone records from an external [`ZoneSource`], validates them into
//! an immutable [`ZoneSnapshot`] and caches it for a short TTL. Resolution
//! always runs against one snapshot; edits made in the source show up on the
//! first refresh after the TTL expires.

mod snapshot;
mod source;

pub use snapshot::ZoneSnapshot;
pub use source::{JsonFileSource, MemorySource, ZoneSource};

use anyhow::Result;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::models::{Zone, ZoneKind, ZoneRecord};

impl<T: ZoneSource + ?Sized> ZoneSource for Arc<T> {
    fn fetch(&self, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> Result<Vec<ZoneRecord>> {
        (**self).fetch(owner_ref, kind)
    }
}

struct Cached {
    snapshot: Arc<ZoneSnapshot>,
    fetched_at: Instant,
}

/// TTL-cached snapshot of all zones from a source
pub struct ZoneStore {
    source: Box<dyn ZoneSource>,
    ttl: Duration,
    current: RwLock<Option<Cached>>,
    /// Held for the whole fetch-and-swap so only one reload runs at a time
    reload: Mutex<()>,
}

impl ZoneStore {
    /// A zero TTL reloads on every call
    pub fn new(source: impl ZoneSource + 'static, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            ttl,
            current: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot, reloading from the source once the TTL has passed.
    ///
    /// Only the first caller after expiry reloads; concurrent callers wait
    /// for it and share the result. If the reload fails and an older
    /// snapshot exists, the older snapshot keeps serving until the next TTL
    /// window.
    pub fn snapshot(&self) -> Result<Arc<ZoneSnapshot>> {
        if let Some(snapshot) = self.fresh(None) {
            return Ok(snapshot);
        }

        let requested_at = Instant::now();
        let _reload = self
            .reload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Someone else reloaded while we waited
        if let Some(snapshot) = self.fresh(Some(requested_at)) {
            return Ok(snapshot);
        }

        match self.reload_locked() {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let mut guard = self
                    .current
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                match guard.as_mut() {
                    Some(cached) => {
                        warn!("Zone refresh failed, serving stale snapshot: {:#}", e);
                        cached.fetched_at = Instant::now();
                        Ok(Arc::clone(&cached.snapshot))
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Reload from the source unconditionally
    pub fn refresh(&self) -> Result<Arc<ZoneSnapshot>> {
        let _reload = self
            .reload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.reload_locked()
    }

    /// Cached snapshot if it is within the TTL, or was stored after `since`
    fn fresh(&self, since: Option<Instant>) -> Option<Arc<ZoneSnapshot>> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let cached = guard.as_ref()?;
        let reloaded_since = since.is_some_and(|t| cached.fetched_at > t);
        (reloaded_since || cached.fetched_at.elapsed() < self.ttl)
            .then(|| Arc::clone(&cached.snapshot))
    }

    /// Fetch and swap; caller holds `self.reload`
    fn reload_locked(&self) -> Result<Arc<ZoneSnapshot>> {
        let records = self.source.fetch(None, None)?;
        let snapshot = Arc::new(ZoneSnapshot::build(records));
        debug!("Swapping in snapshot with {} zones", snapshot.len());

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Cached {
            snapshot: Arc::clone(&snapshot),
            fetched_at: Instant::now(),
        });

        Ok(snapshot)
    }

    /// Validated zones, optionally scoped to an owner and/or kind
    pub fn load_zones(
        &self,
        owner_ref: Option<&str>,
        kind: Option<ZoneKind>,
    ) -> Result<Vec<Arc<Zone>>> {
        Ok(self.snapshot()?.filtered(owner_ref, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RawPoint;
    use crate::models::CircleRecord;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    fn record(id: &str, owner: &str) -> ZoneRecord {
        ZoneRecord {
            id: id.into(),
            owner_ref: owner.into(),
            kind: Some(ZoneKind::ServiceArea),
            circles: vec![CircleRecord {
                center: Some(RawPoint { lat: 41.0, lng: 29.0 }),
                radius: Some(1000.0),
            }],
            ..Default::default()
        }
    }

    /// Counts fetches and can be switched into failure mode
    struct FlakySource {
        inner: MemorySource,
        failing: AtomicBool,
        fetches: AtomicUsize,
    }

    impl ZoneSource for FlakySource {
        fn fetch(
            &self,
            owner_ref: Option<&str>,
            kind: Option<ZoneKind>,
        ) -> Result<Vec<ZoneRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("document store unavailable");
            }
            self.inner.fetch(owner_ref, kind)
        }
    }

    /// First fetch is slow and returns one zone; later fetches return two
    struct SlowFirstFetch {
        fetches: AtomicUsize,
        started: Mutex<Option<mpsc::Sender<()>>>,
        delay: Duration,
    }

    impl SlowFirstFetch {
        fn new(delay: Duration, started: Option<mpsc::Sender<()>>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                started: Mutex::new(started),
                delay,
            }
        }
    }

    impl ZoneSource for SlowFirstFetch {
        fn fetch(&self, _: Option<&str>, _: Option<ZoneKind>) -> Result<Vec<ZoneRecord>> {
            if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
                if let Some(tx) = self.started.lock().unwrap().take() {
                    let _ = tx.send(());
                }
                thread::sleep(self.delay);
                return Ok(vec![record("a", "s1")]);
            }
            Ok(vec![record("a", "s1"), record("b", "s1")])
        }
    }

    #[test]
    fn test_snapshot_cached_within_ttl() {
        let source = Arc::new(MemorySource::new(vec![record("a", "s1")]));
        let store = ZoneStore::new(Arc::clone(&source), Duration::from_secs(3600));

        let first = store.snapshot().unwrap();
        source.replace(vec![record("a", "s1"), record("b", "s1")]);
        let second = store.snapshot().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        // Explicit refresh picks up the edit; the old snapshot is untouched
        let third = store.refresh().unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_zero_ttl_reloads_every_call() {
        let source = Arc::new(MemorySource::new(vec![record("a", "s1")]));
        let store = ZoneStore::new(Arc::clone(&source), Duration::ZERO);

        assert_eq!(store.snapshot().unwrap().len(), 1);
        source.replace(vec![]);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_stale_snapshot_served_on_failure() {
        let source = Arc::new(FlakySource {
            inner: MemorySource::new(vec![record("a", "s1")]),
            failing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        });
        let store = ZoneStore::new(Arc::clone(&source), Duration::ZERO);

        let fresh = store.snapshot().unwrap();
        source.failing.store(true, Ordering::SeqCst);
        let stale = store.snapshot().unwrap();

        assert!(Arc::ptr_eq(&fresh, &stale));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_without_snapshot_is_error() {
        let source = FlakySource {
            inner: MemorySource::default(),
            failing: AtomicBool::new(true),
            fetches: AtomicUsize::new(0),
        };
        let store = ZoneStore::new(source, Duration::from_secs(30));
        assert!(store.snapshot().is_err());
    }

    #[test]
    fn test_example_zone_file_loads_cleanly() {
        let records: Vec<ZoneRecord> =
            serde_json::from_str(include_str!("../../data/zones.example.json")).unwrap();
        let snapshot = ZoneSnapshot::build(records);

        // The draft record is skipped, everything else validates
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.diagnostics().is_empty());
        assert!(snapshot.get("sa-draft").is_err());
    }

    #[test]
    fn test_concurrent_expiry_fetches_once() {
        let source = Arc::new(SlowFirstFetch::new(Duration::from_millis(100), None));
        let store = ZoneStore::new(Arc::clone(&source), Duration::from_secs(3600));

        let snapshots: Vec<Arc<ZoneSnapshot>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| store.snapshot().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
    }

    #[test]
    fn test_slow_refresh_never_replaces_newer_snapshot() {
        let (tx, rx) = mpsc::channel();
        let source = Arc::new(SlowFirstFetch::new(Duration::from_millis(200), Some(tx)));
        let store = ZoneStore::new(Arc::clone(&source), Duration::from_secs(3600));

        thread::scope(|s| {
            let slow = s.spawn(|| store.refresh().unwrap());
            // Second refresh starts while the first fetch is still in flight
            rx.recv().unwrap();
            let fast = s.spawn(|| store.refresh().unwrap());

            assert_eq!(slow.join().unwrap().len(), 1);
            assert_eq!(fast.join().unwrap().len(), 2);
        });

        assert_eq!(store.snapshot().unwrap().len(), 2);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_load_zones_scoped() {
        let source = MemorySource::new(vec![record("a", "s1"), record("b", "s2")]);
        let store = ZoneStore::new(source, Duration::from_secs(30));

        let zones = store.load_zones(Some("s2"), Some(ZoneKind::ServiceArea)).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "b");
    }
}
