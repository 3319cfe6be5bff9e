use thiserror::Error;

/// Everything that can go wrong between an inbound request and its view.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The ticker is absent from the current directory snapshot.
    #[error("Ticker {0} not found")]
    TickerNotFound(String),

    /// An upstream fetch failed: transport, timeout, non-success status or an
    /// undecodable body.
    #[error("upstream unavailable: {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    /// Rejected at the boundary, before reaching the core.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn upstream(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::UpstreamUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
