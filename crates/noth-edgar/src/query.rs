//! Typed inputs for each entrypoint, with their defaults and ceilings.
//!
//! | entrypoint      | option      | default | ceiling |
//! |-----------------|-------------|---------|---------|
//! | recent filings  | `limit`     | 20      | 100     |
//! | insider trades  | `limit`     | 20      | 50      |
//! | company search  | `limit`     | 10      | 50      |
//!
//! Limits below zero count as zero.

use crate::error::{Error, Result};
use serde::Deserialize;

pub const FILINGS_DEFAULT_LIMIT: i64 = 20;
pub const FILINGS_MAX_LIMIT: i64 = 100;
pub const INSIDER_DEFAULT_LIMIT: i64 = 20;
pub const INSIDER_MAX_LIMIT: i64 = 50;
pub const SEARCH_DEFAULT_LIMIT: i64 = 10;
pub const SEARCH_MAX_LIMIT: i64 = 50;

fn clamp(limit: Option<i64>, default: i64, max: i64) -> usize {
    limit.unwrap_or(default).clamp(0, max) as usize
}

fn ticker(raw: &str) -> Result<&str> {
    match raw.trim() {
        "" => Err(Error::InvalidInput("ticker must not be empty".into())),
        t => Ok(t),
    }
}

/// Profile and report entrypoints.
#[derive(Clone, Debug, Deserialize)]
pub struct TickerQuery {
    pub ticker: String,
}

impl TickerQuery {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
        }
    }

    pub fn ticker(&self) -> Result<&str> {
        ticker(&self.ticker)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsQuery {
    pub ticker: String,
    /// Keep only this form (e.g. `10-K`), ignoring case.
    #[serde(default)]
    pub form_type: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl FilingsQuery {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            form_type: None,
            limit: None,
        }
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_type = Some(form_type.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ticker(&self) -> Result<&str> {
        ticker(&self.ticker)
    }

    /// A blank form type means no filter.
    pub fn form_type(&self) -> Option<&str> {
        self.form_type
            .as_deref()
            .map(str::trim)
            .filter(|form| !form.is_empty())
    }

    pub fn limit(&self) -> usize {
        clamp(self.limit, FILINGS_DEFAULT_LIMIT, FILINGS_MAX_LIMIT)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InsiderQuery {
    pub ticker: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl InsiderQuery {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ticker(&self) -> Result<&str> {
        ticker(&self.ticker)
    }

    pub fn limit(&self) -> usize {
        clamp(self.limit, INSIDER_DEFAULT_LIMIT, INSIDER_MAX_LIMIT)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Matched against tickers and company names; empty matches everything.
    #[serde(default, alias = "q")]
    pub query: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn query(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn limit(&self) -> usize {
        clamp(self.limit, SEARCH_DEFAULT_LIMIT, SEARCH_MAX_LIMIT)
    }
}
