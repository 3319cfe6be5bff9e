use crate::config::EdgarConfig;
use crate::directory::{DirectoryCache, DirectoryEntry};
use crate::error::{Error, Result};
use crate::filings::{CompanyProfile, CompanyReport, FilingsList, InsiderTrades, Projector};
use crate::query::{FilingsQuery, InsiderQuery, SearchQuery, TickerQuery};
use crate::source::{Source, Submission};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What an entrypoint hands back: the view, or the `{"error": ...}` payload for an unknown
/// ticker.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Found(T),
    NotFound { error: String },
}

impl<T> Outcome<T> {
    fn not_found(ticker: &str) -> Self {
        Outcome::NotFound {
            error: Error::TickerNotFound(ticker.to_uppercase()).to_string(),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(view) => Some(view),
            Outcome::NotFound { .. } => None,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub count: usize,
    pub results: Vec<DirectoryEntry>,
}

// -------------------------------------------------------------------------------------------------

/// The entrypoints: resolve the ticker, fetch the submission record, project it.
pub struct Edgar {
    source: Arc<dyn Source>,
    directory: DirectoryCache,
    projector: Projector,
}

impl Edgar {
    pub fn new(source: Arc<dyn Source>, config: &EdgarConfig) -> Self {
        Self {
            directory: DirectoryCache::new(source.clone(), config.directory_ttl),
            projector: Projector::new(config.archives_base.clone()),
            source,
        }
    }

    pub fn directory(&self) -> &DirectoryCache {
        &self.directory
    }

    /// Refresh the directory if due; a failed refresh is only fatal when there is nothing
    /// cached to fall back on.
    async fn directory_ready(&self) -> Result<()> {
        match self.directory.ensure_fresh().await {
            Ok(()) => Ok(()),
            Err(e) => match self.directory.snapshot().await {
                Some(snapshot) => {
                    warn!(
                        "directory refresh failed, serving snapshot fetched at {}: {e}",
                        snapshot.fetched_at()
                    );
                    Ok(())
                }
                None => Err(e),
            },
        }
    }

    async fn lookup(&self, ticker: &str) -> Result<Option<(DirectoryEntry, Submission)>> {
        self.directory_ready().await?;

        let Some(entry) = self.directory.resolve(ticker).await else {
            debug!("ticker {ticker} not in directory");
            return Ok(None);
        };

        let submission = self.source.submission(&entry.cik).await?;
        Ok(Some((entry, submission)))
    }

    pub async fn profile(&self, query: &TickerQuery) -> Result<Outcome<CompanyProfile>> {
        let ticker = query.ticker()?;
        Ok(match self.lookup(ticker).await? {
            Some((entry, submission)) => {
                Outcome::Found(self.projector.profile(&entry.ticker, &submission))
            }
            None => Outcome::not_found(ticker),
        })
    }

    pub async fn filings(&self, query: &FilingsQuery) -> Result<Outcome<FilingsList>> {
        let ticker = query.ticker()?;
        Ok(match self.lookup(ticker).await? {
            Some((entry, submission)) => Outcome::Found(self.projector.filings_list(
                &entry.ticker,
                &submission,
                query.form_type(),
                query.limit(),
            )),
            None => Outcome::not_found(ticker),
        })
    }

    pub async fn insider_trades(&self, query: &InsiderQuery) -> Result<Outcome<InsiderTrades>> {
        let ticker = query.ticker()?;
        Ok(match self.lookup(ticker).await? {
            Some((entry, submission)) => Outcome::Found(self.projector.insider_trades(
                &entry.ticker,
                &submission,
                query.limit(),
            )),
            None => Outcome::not_found(ticker),
        })
    }

    pub async fn report(&self, query: &TickerQuery) -> Result<Outcome<CompanyReport>> {
        let ticker = query.ticker()?;
        Ok(match self.lookup(ticker).await? {
            Some((entry, submission)) => {
                Outcome::Found(self.projector.report(&entry.ticker, &submission))
            }
            None => Outcome::not_found(ticker),
        })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        self.directory_ready().await?;
        let results = self.directory.search(query.query(), query.limit()).await;
        Ok(SearchResults {
            query: query.query().to_string(),
            count: results.len(),
            results,
        })
    }
}
