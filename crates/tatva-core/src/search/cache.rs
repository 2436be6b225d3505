//! Snapshot cache for the search index
//!
//! A single [`SearchIndex`] owns the current [`IndexSnapshot`]. Readers take
//! an `Arc` to whatever snapshot is current and never wait on a build; a
//! rebuild replaces the snapshot only once it has fully succeeded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::time::Instant;

use super::builder::IndexBuilder;
use super::error::SearchResult;
use super::matcher::{match_query, MatchKeys};
use super::types::{EntryKind, ResultGroups, SearchEntry};
use crate::catalog::CatalogSource;
use crate::config::SearchBehaviorConfig;

#[derive(Debug, Clone)]
pub(crate) struct IndexedEntry {
    pub(crate) entry: SearchEntry,
    pub(crate) keys: MatchKeys,
}

/// One immutable build of the index.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: Vec<IndexedEntry>,
    built_at: Option<Instant>,
    built_at_iso: Option<String>,
}

impl IndexSnapshot {
    pub fn new(entries: Vec<SearchEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| IndexedEntry {
                keys: MatchKeys::for_entry(&entry),
                entry,
            })
            .collect();
        Self {
            entries,
            built_at: Some(Instant::now()),
            built_at_iso: Some(now_iso()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Entries in build order.
    pub fn iter(&self) -> impl Iterator<Item = &SearchEntry> {
        self.entries.iter().map(|e| &e.entry)
    }

    /// Time since this snapshot was built; `None` for the empty cold snapshot.
    pub fn age(&self) -> Option<Duration> {
        self.built_at.map(|t| t.elapsed())
    }

    pub fn built_at(&self) -> Option<&str> {
        self.built_at_iso.as_deref()
    }

    pub fn query(&self, query: &str) -> ResultGroups {
        match_query(self, query)
    }

    fn count(&self, kind: EntryKind) -> usize {
        self.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Build statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_entries: usize,
    pub books: usize,
    pub sections: usize,
    pub chapters: usize,
    /// Time elapsed in milliseconds
    pub elapsed_ms: u64,
    /// Build completion time (RFC 3339)
    pub built_at: Option<String>,
}

/// Readiness of the index, separate from query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IndexStatus {
    /// Nothing built yet
    Cold,
    /// A build is in flight; readers see the previous snapshot
    Building,
    Ready,
    /// The last build failed; readers see the previous snapshot, if any
    Failed { message: String },
}

#[derive(Debug)]
struct CacheState {
    status: IndexStatus,
    /// Bumped by every `invalidate()`
    invalidations: u64,
    /// Invalidation count observed when the current snapshot's fetch began
    clean_through: u64,
    last_failure: Option<Instant>,
}

impl CacheState {
    fn invalidated(&self) -> bool {
        self.invalidations != self.clean_through
    }
}

/// Cached, periodically rebuilt index over a catalog source.
pub struct SearchIndex {
    source: Arc<dyn CatalogSource>,
    builder: IndexBuilder,
    fresh_for: Duration,
    stale_for: Duration,
    build_timeout: Duration,
    retry_backoff: Duration,
    current: RwLock<Arc<IndexSnapshot>>,
    empty: Arc<IndexSnapshot>,
    state: Mutex<CacheState>,
    /// Serializes builds
    build_lock: tokio::sync::Mutex<()>,
    /// Set while a background refresh task is running
    refreshing: AtomicBool,
}

impl SearchIndex {
    pub fn new(source: Arc<dyn CatalogSource>, config: &SearchBehaviorConfig) -> Self {
        let empty = Arc::new(IndexSnapshot::empty());
        Self {
            source,
            builder: IndexBuilder::new(config.chapter_placeholder.clone()),
            fresh_for: config.fresh_for(),
            stale_for: config.stale_for(),
            build_timeout: config.build_timeout(),
            retry_backoff: config.retry_backoff(),
            current: RwLock::new(empty.clone()),
            empty,
            state: Mutex::new(CacheState {
                status: IndexStatus::Cold,
                invalidations: 0,
                clean_through: 0,
                last_failure: None,
            }),
            build_lock: tokio::sync::Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Current snapshot without waiting on any build. Snapshots past the
    /// stale window are not served; the empty snapshot is returned instead.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        let current = self.current.read().clone();
        match current.age() {
            Some(age) if age >= self.stale_for => self.empty.clone(),
            _ => current,
        }
    }

    /// Match against the current snapshot.
    pub fn query(&self, query: &str) -> ResultGroups {
        self.snapshot().query(query)
    }

    pub fn status(&self) -> IndexStatus {
        self.state.lock().status.clone()
    }

    /// Whether the current snapshot is within the fresh window and has not
    /// been invalidated.
    pub fn is_fresh(&self) -> bool {
        self.fresh_snapshot().is_some()
    }

    /// Whether a background refresh task is running.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Force the next refresh to rebuild. The current snapshot keeps being
    /// served until the rebuild lands; a build already in flight does not
    /// clear an invalidation issued after its fetch began.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.invalidations += 1;
        state.last_failure = None;
    }

    /// Snapshot for a keystroke: never waits on a build.
    ///
    /// When the current snapshot is not fresh, a single background rebuild
    /// is started and the snapshot on hand (stale, or empty when cold) is
    /// returned immediately. Must be called within a tokio runtime.
    pub fn serve(self: &Arc<Self>) -> Arc<IndexSnapshot> {
        if self.fresh_snapshot().is_none() && !self.in_backoff() {
            self.spawn_refresh();
        }
        self.snapshot()
    }

    fn spawn_refresh(self: &Arc<Self>) {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let index = Arc::clone(self);
        tokio::spawn(async move {
            index.ensure_fresh().await;
            index.refreshing.store(false, Ordering::SeqCst);
        });
    }

    /// Return a fresh snapshot, rebuilding first when the current one is
    /// stale, expired, invalidated or missing.
    ///
    /// Concurrent callers share one build. A failed build leaves the
    /// previous snapshot in place and is not retried until the backoff
    /// elapses, so the result may still be stale or empty; check
    /// [`SearchIndex::status`] to tell the cases apart.
    pub async fn ensure_fresh(&self) -> Arc<IndexSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            log::debug!("Search index cache hit");
            return snapshot;
        }
        if self.in_backoff() {
            return self.snapshot();
        }

        let _guard = self.build_lock.lock().await;
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }
        if self.in_backoff() {
            return self.snapshot();
        }

        // Failure is already logged and recorded in the status.
        let _ = self.rebuild_locked().await;
        self.snapshot()
    }

    /// Rebuild now, regardless of freshness or backoff.
    pub async fn rebuild(&self) -> SearchResult<IndexStats> {
        let _guard = self.build_lock.lock().await;
        self.rebuild_locked().await
    }

    async fn rebuild_locked(&self) -> SearchResult<IndexStats> {
        let generation = {
            let mut state = self.state.lock();
            state.status = IndexStatus::Building;
            state.invalidations
        };
        let start = std::time::Instant::now();
        log::info!("Building search index");

        match self
            .builder
            .build_from(self.source.as_ref(), self.build_timeout)
            .await
        {
            Ok(entries) => {
                let snapshot = Arc::new(IndexSnapshot::new(entries));
                let stats = IndexStats {
                    total_entries: snapshot.len(),
                    books: snapshot.count(EntryKind::Book),
                    sections: snapshot.count(EntryKind::Section),
                    chapters: snapshot.count(EntryKind::Chapter),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    built_at: snapshot.built_at().map(str::to_string),
                };

                *self.current.write() = snapshot;
                {
                    let mut state = self.state.lock();
                    state.status = IndexStatus::Ready;
                    state.clean_through = generation;
                    state.last_failure = None;
                    if state.invalidated() {
                        log::debug!("Search index invalidated during build");
                    }
                }

                log::info!(
                    "Search index ready: {} books, {} sections, {} chapters in {}ms",
                    stats.books,
                    stats.sections,
                    stats.chapters,
                    stats.elapsed_ms
                );
                Ok(stats)
            }
            Err(e) => {
                log::warn!("Search index build failed: {}", e);
                let mut state = self.state.lock();
                state.status = IndexStatus::Failed {
                    message: e.to_string(),
                };
                state.last_failure = Some(Instant::now());
                Err(e)
            }
        }
    }

    fn in_backoff(&self) -> bool {
        self.state
            .lock()
            .last_failure
            .is_some_and(|at| at.elapsed() < self.retry_backoff)
    }

    fn fresh_snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        if self.state.lock().invalidated() {
            return None;
        }
        let current = self.current.read().clone();
        match current.age() {
            Some(age) if age < self.fresh_for => Some(current),
            _ => None,
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
