use crate::cik::Cik;
use crate::error::{Error, Result};
use crate::source::{Source, Tickers};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

/// One row of the ticker directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DirectoryEntry {
    pub ticker: String,
    pub cik: Cik,
    pub title: String,
}

/// A complete copy of the ticker directory, as of `fetched_at`.
///
/// Entries keep the upstream listing order; lookups go through an uppercase ticker index.
#[derive(Debug)]
pub struct DirectorySnapshot {
    entries: Vec<DirectoryEntry>,
    index: HashMap<String, usize>,
    loaded: Instant,
    fetched_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn from_tickers(tickers: Tickers) -> Self {
        let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(tickers.0.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(tickers.0.len());

        for row in tickers.0 {
            let ticker = normalize(&row.ticker);
            let entry = DirectoryEntry {
                ticker: ticker.clone(),
                cik: row.cik,
                title: row.title,
            };

            // a repeated ticker overwrites the earlier value but keeps its slot
            match index.get(&ticker) {
                Some(&i) => {
                    trace!("duplicate ticker {ticker} in directory listing");
                    entries[i] = entry;
                }
                None => {
                    index.insert(ticker, entries.len());
                    entries.push(entry);
                }
            }
        }

        Self {
            entries,
            index,
            loaded: Instant::now(),
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn age(&self) -> Duration {
        self.loaded.elapsed()
    }

    /// Case-insensitive ticker lookup.
    pub fn get(&self, ticker: &str) -> Option<&DirectoryEntry> {
        self.index
            .get(&normalize(ticker))
            .map(|&i| &self.entries[i])
    }

    /// Case-insensitive substring match on ticker or title, in listing order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<DirectoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                entry.ticker.to_lowercase().contains(&query)
                    || entry.title.to_lowercase().contains(&query)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

// -------------------------------------------------------------------------------------------------

/// Process-wide ticker -> CIK directory, refreshed from the [`Source`] once it is older than
/// the TTL.
///
/// Readers always see a whole snapshot; a refresh builds the new one off to the side and swaps
/// it in. A failed refresh leaves the previous snapshot where it was.
pub struct DirectoryCache {
    source: Arc<dyn Source>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<DirectorySnapshot>>>,
    // holds the last failed refresh, numbered by `failures`
    refresh: Mutex<Option<(u64, Error)>>,
    failures: AtomicU64,
}

impl DirectoryCache {
    pub fn new(source: Arc<dyn Source>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(None),
            failures: AtomicU64::new(0),
        }
    }

    /// Make sure a snapshot exists and is no older than the TTL, fetching the directory if not.
    ///
    /// Concurrent callers share one in-flight fetch, and share its failure too: callers queued
    /// behind a refresh that fails get that error back instead of fetching again.
    pub async fn ensure_fresh(&self) -> Result<()> {
        if self.is_fresh().await {
            return Ok(());
        }

        let seen = self.failures.load(Ordering::Acquire);
        let mut last_failure = self.refresh.lock().await;
        if self.is_fresh().await {
            trace!("directory refreshed by a concurrent caller");
            return Ok(());
        }
        if let Some((attempt, e)) = last_failure.as_ref() {
            if *attempt > seen {
                trace!("directory refresh failed for a concurrent caller");
                return Err(e.clone());
            }
        }

        let time = std::time::Instant::now();
        debug!("refreshing ticker directory");
        let tickers = match self.source.tickers().await {
            Ok(tickers) => tickers,
            Err(e) => {
                let attempt = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                *last_failure = Some((attempt, e.clone()));
                return Err(e);
            }
        };
        let snapshot = DirectorySnapshot::from_tickers(tickers);
        debug!(
            "ticker directory loaded: {} entries, elapsed time: {} ms",
            snapshot.len(),
            time.elapsed().as_millis()
        );

        *self.snapshot.write().await = Some(Arc::new(snapshot));
        *last_failure = None;
        Ok(())
    }

    /// The current snapshot, fresh or not.
    pub async fn snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Case-insensitive lookup against the current snapshot; never fetches.
    pub async fn resolve(&self, ticker: &str) -> Option<DirectoryEntry> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .and_then(|snapshot| snapshot.get(ticker).cloned())
    }

    /// Up to `limit` entries whose ticker or title contains `query`, ignoring case.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<DirectoryEntry> {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => snapshot.search(query, limit),
            None => Vec::new(),
        }
    }

    async fn is_fresh(&self) -> bool {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => snapshot.age() <= self.ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSource;
    use crate::source::Source;

    const TTL: Duration = Duration::from_millis(3_600_000);

    fn source() -> Arc<MockSource> {
        Arc::new(
            MockSource::new()
                .with_ticker(320193, "AAPL", "Apple Inc.")
                .with_ticker(789019, "MSFT", "MICROSOFT CORP")
                .with_ticker(1018724, "AMZN", "AMAZON COM INC")
                .with_ticker(1418121, "APLE", "Apple Hospitality REIT, Inc.")
                .with_ticker(1652044, "GOOGL", "Alphabet Inc."),
        )
    }

    #[tokio::test]
    async fn test_resolve_is_case_insensitive() {
        let cache = DirectoryCache::new(source(), TTL);
        cache.ensure_fresh().await.unwrap();

        let upper = cache.resolve("AAPL").await.unwrap();
        assert_eq!(cache.resolve("aapl").await, Some(upper.clone()));
        assert_eq!(cache.resolve("AaPl").await, Some(upper.clone()));
        assert_eq!(upper.cik.as_str(), "0000320193");
        assert_eq!(upper.title, "Apple Inc.");
    }

    #[tokio::test]
    async fn test_every_cik_is_ten_digits() {
        let cache = DirectoryCache::new(source(), TTL);
        cache.ensure_fresh().await.unwrap();

        for entry in cache.search("", 100).await {
            let resolved = cache.resolve(&entry.ticker).await.unwrap();
            assert_eq!(resolved.cik.as_str().len(), 10);
            assert!(resolved.cik.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_resolve_without_snapshot_is_none() {
        let mock = source();
        let cache = DirectoryCache::new(mock.clone(), TTL);
        assert_eq!(cache.resolve("AAPL").await, None);
        assert_eq!(mock.ticker_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_none() {
        let cache = DirectoryCache::new(source(), TTL);
        cache.ensure_fresh().await.unwrap();
        assert_eq!(cache.resolve("ZZZZ").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_fresh_fetches_once_within_ttl() {
        let mock = source();
        let cache = DirectoryCache::new(mock.clone(), TTL);

        cache.ensure_fresh().await.unwrap();
        tokio::time::advance(Duration::from_secs(1800)).await;
        cache.ensure_fresh().await.unwrap();
        assert_eq!(mock.ticker_calls(), 1);

        tokio::time::advance(Duration::from_secs(1801)).await;
        cache.ensure_fresh().await.unwrap();
        assert_eq!(mock.ticker_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let mock = source();
        let cache = DirectoryCache::new(mock.clone(), TTL);
        cache.ensure_fresh().await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        mock.set_failing(true);
        assert!(matches!(
            cache.ensure_fresh().await,
            Err(Error::UpstreamUnavailable { .. })
        ));
        assert_eq!(cache.resolve("msft").await.unwrap().title, "MICROSOFT CORP");

        // still stale, so the next access tries again
        mock.set_failing(false);
        cache.ensure_fresh().await.unwrap();
        assert_eq!(mock.ticker_calls(), 3);
    }

    #[tokio::test]
    async fn test_first_fetch_failure_leaves_cache_empty() {
        let mock = source();
        mock.set_failing(true);
        let cache = DirectoryCache::new(mock.clone(), TTL);
        assert!(cache.ensure_fresh().await.is_err());
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_fetch() {
        let mock = source();
        let cache = Arc::new(DirectoryCache::new(mock.clone(), TTL));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            tasks.spawn(async move { cache.ensure_fresh().await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }
        assert_eq!(mock.ticker_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_callers_share_a_failed_refresh() {
        let mock = source();
        let cache = Arc::new(DirectoryCache::new(mock.clone(), TTL));
        cache.ensure_fresh().await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        mock.set_failing(true);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            tasks.spawn(async move { cache.ensure_fresh().await });
        }
        let mut failed = 0;
        while let Some(result) = tasks.join_next().await {
            assert!(matches!(
                result.unwrap(),
                Err(Error::UpstreamUnavailable { .. })
            ));
            failed += 1;
        }
        assert_eq!(failed, 8);
        // one fetch for the initial load, one for the failed refresh
        assert_eq!(mock.ticker_calls(), 2);
        assert_eq!(cache.resolve("AAPL").await.unwrap().title, "Apple Inc.");

        // a later caller does not inherit the old failure
        mock.set_failing(false);
        cache.ensure_fresh().await.unwrap();
        assert_eq!(mock.ticker_calls(), 3);
    }

    #[tokio::test]
    async fn test_search_matches_ticker_or_title() {
        let cache = DirectoryCache::new(source(), TTL);
        cache.ensure_fresh().await.unwrap();

        let results = cache.search("apple", 5).await;
        assert!(results.len() <= 5);
        let tickers: Vec<&str> = results.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAPL", "APLE"]);
        for entry in &results {
            assert!(
                entry.title.to_lowercase().contains("apple")
                    || entry.ticker.to_lowercase().contains("apple")
            );
        }

        // ticker hit, title miss
        let results = cache.search("googl", 5).await;
        assert_eq!(results[0].title, "Alphabet Inc.");
    }

    #[tokio::test]
    async fn test_search_limits() {
        let cache = DirectoryCache::new(source(), TTL);
        cache.ensure_fresh().await.unwrap();

        assert_eq!(cache.search("", 3).await.len(), 3);
        assert_eq!(cache.search("", 100).await.len(), 5);
        assert!(cache.search("apple", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ticker_keeps_first_slot() {
        let mock = MockSource::new()
            .with_ticker(1, "abc", "First")
            .with_ticker(2, "XYZ", "Other")
            .with_ticker(3, "ABC", "Second");
        let snapshot = DirectorySnapshot::from_tickers(mock.tickers().await.unwrap());

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("abc").unwrap().title, "Second");
        let order: Vec<String> = snapshot.search("", 10).into_iter().map(|e| e.ticker).collect();
        assert_eq!(order, ["ABC", "XYZ"]);
    }
}
