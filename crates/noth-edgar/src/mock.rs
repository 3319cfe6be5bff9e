//! In-memory [`Source`] that counts its fetches and can be switched to fail.

use crate::cik::Cik;
use crate::error::{Error, Result};
use crate::source::{Source, Submission, Ticker, Tickers};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MockSource {
    tickers: Mutex<Vec<Ticker>>,
    submissions: Mutex<HashMap<Cik, Submission>>,
    failing: AtomicBool,
    pub ticker_calls: AtomicUsize,
    pub submission_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(self, cik: u64, ticker: &str, title: &str) -> Self {
        self.tickers.lock().unwrap().push(Ticker {
            cik: Cik::from_number(cik).unwrap(),
            ticker: ticker.to_string(),
            title: title.to_string(),
        });
        self
    }

    pub fn with_submission(self, json: serde_json::Value) -> Self {
        let submission: Submission = serde_json::from_value(json).unwrap();
        self.submissions
            .lock()
            .unwrap()
            .insert(submission.cik.clone(), submission);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn ticker_calls(&self) -> usize {
        self.ticker_calls.load(Ordering::SeqCst)
    }

    pub fn submission_calls(&self) -> usize {
        self.submission_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    async fn tickers(&self) -> Result<Tickers> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        // yield so concurrent callers can pile up behind the refresh
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::upstream("mock://company_tickers.json", "status 503"));
        }
        Ok(Tickers(self.tickers.lock().unwrap().clone()))
    }

    async fn submission(&self, cik: &Cik) -> Result<Submission> {
        self.submission_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::upstream("mock://submissions", "status 503"));
        }
        self.submissions
            .lock()
            .unwrap()
            .get(cik)
            .cloned()
            .ok_or_else(|| Error::upstream(format!("mock://submissions/CIK{cik}.json"), "status 404"))
    }
}
