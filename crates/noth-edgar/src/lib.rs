//! Read-only views over SEC EDGAR, keyed by ticker symbol.
//!
//! ```rust,ignore
//! let config = EdgarConfig::from_env()?;
//! let edgar = Edgar::new(Arc::new(SecClient::new(&config)?), &config);
//! let filings = edgar.filings(&FilingsQuery::new("AAPL").with_form_type("10-K")).await?;
//! ```

pub mod cik;
pub mod config;
pub mod directory;
pub mod error;
pub mod filings;
pub mod query;
pub mod service;
pub mod source;

pub use cik::Cik;
pub use config::EdgarConfig;
pub use directory::{DirectoryCache, DirectoryEntry, DirectorySnapshot};
pub use error::{Error, Result};
pub use query::{FilingsQuery, InsiderQuery, SearchQuery, TickerQuery};
pub use service::{Edgar, Outcome};
pub use source::{BufferSource, SecClient, Source};

#[cfg(test)]
pub(crate) mod mock;
