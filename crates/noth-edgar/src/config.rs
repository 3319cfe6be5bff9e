use crate::error::{Error, Result};
use dotenv::var;
use std::time::Duration;

pub const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
pub const SUBMISSIONS_BASE: &str = "https://data.sec.gov";
pub const ARCHIVES_BASE: &str = "https://www.sec.gov/Archives/edgar/data";
pub const DIRECTORY_TTL: Duration = Duration::from_millis(3_600_000);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings for talking to EDGAR.
#[derive(Clone, Debug)]
pub struct EdgarConfig {
    /// Sent on every upstream request; the SEC refuses anonymous clients.
    pub user_agent: String,
    pub tickers_url: String,
    pub submissions_base: String,
    pub archives_base: String,
    pub directory_ttl: Duration,
    pub request_timeout: Duration,
}

impl EdgarConfig {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            tickers_url: TICKERS_URL.to_string(),
            submissions_base: SUBMISSIONS_BASE.to_string(),
            archives_base: ARCHIVES_BASE.to_string(),
            directory_ttl: DIRECTORY_TTL,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Read the config from the environment (and `.env`, if present).
    ///
    /// `USER_AGENT` is required; everything else falls back to the public SEC endpoints.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let user_agent = var("USER_AGENT")
            .map_err(|_| Error::Config("unable to find environment variable: USER_AGENT".into()))?;
        let mut config = Self::new(user_agent);

        if let Ok(url) = var("EDGAR_TICKERS_URL") {
            config.tickers_url = url;
        }
        if let Ok(base) = var("EDGAR_SUBMISSIONS_BASE") {
            config.submissions_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(base) = var("EDGAR_ARCHIVES_BASE") {
            config.archives_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(ms) = var("EDGAR_DIRECTORY_TTL_MS") {
            config.directory_ttl = Duration::from_millis(parse_number("EDGAR_DIRECTORY_TTL_MS", &ms)?);
        }
        if let Ok(secs) = var("EDGAR_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("EDGAR_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a whole number, got {value:?}")))
}
