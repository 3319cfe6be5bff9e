use crate::cik::Cik;
use crate::config::EdgarConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, trace};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// API Documentation: https://www.sec.gov/search-filings/edgar-application-programming-interfaces
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where the raw EDGAR data comes from.
///
/// Two endpoints are needed:
///
/// 1. `company_tickers.json` - the full ticker -> CIK directory.
/// 2. `submissions/CIK##########.json` - profile and filing history of one registrant.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch the whole ticker directory.
    async fn tickers(&self) -> Result<Tickers>;

    /// Fetch the submission record of a single registrant.
    async fn submission(&self, cik: &Cik) -> Result<Submission>;
}

// -------------------------------------------------------------------------------------------------

/// HTTP [`Source`], straight from the SEC.
pub struct SecClient {
    http_client: reqwest::Client,
    tickers_url: String,
    submissions_base: String,
}

impl SecClient {
    pub fn new(config: &EdgarConfig) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build reqwest client: {e}")))?;

        Ok(Self {
            http_client,
            tickers_url: config.tickers_url.clone(),
            submissions_base: config.submissions_base.clone(),
        })
    }

    pub fn submission_url(&self, cik: &Cik) -> String {
        format!("{}/submissions/CIK{}.json", self.submissions_base, cik)
    }

    async fn fetch_de<D: DeserializeOwned>(&self, url: &str) -> Result<D> {
        trace!("http GET requesting {url}");
        let response = self.http_client.get(url).send().await.map_err(|e| {
            error!("failed fetching response from {url}: {e}");
            Error::upstream(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("{url} responded with {status}");
            return Err(Error::upstream(url, format!("status {status}")));
        }

        response.json().await.map_err(|e| {
            error!("failed deserializing from {url}: {e}");
            Error::upstream(url, e)
        })
    }
}

#[async_trait]
impl Source for SecClient {
    async fn tickers(&self) -> Result<Tickers> {
        self.fetch_de(&self.tickers_url).await
    }

    async fn submission(&self, cik: &Cik) -> Result<Submission> {
        self.fetch_de(&self.submission_url(cik)).await
    }
}

// -------------------------------------------------------------------------------------------------

/// Offline [`Source`] over the bulk download layout:
///
/// ```text
/// ./buffer/company_tickers.json
/// ./buffer/submissions/CIK0000320193.json
/// ```
pub struct BufferSource {
    dir: PathBuf,
}

impl BufferSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Source for BufferSource {
    async fn tickers(&self) -> Result<Tickers> {
        read_json(&self.dir.join("company_tickers.json")).await
    }

    async fn submission(&self, cik: &Cik) -> Result<Submission> {
        let path = self.dir.join("submissions").join(format!("CIK{cik}.json"));
        read_json(&path).await
    }
}

/// Reads a `.json` file from `path`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let shown = path.display().to_string();
    trace!("reading file at path: \"{shown}\"");
    let file = tokio::fs::read(path).await.map_err(|e| {
        error!("failed to read file {shown}");
        Error::upstream(&shown, e)
    })?;
    serde_json::from_slice(&file).map_err(|e| Error::upstream(&shown, e))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The ticker directory, in the order the SEC lists it.
#[derive(Debug, Default)]
pub struct Tickers(pub Vec<Ticker>);

#[derive(Clone, Debug, Deserialize)]
pub struct Ticker {
    #[serde(rename = "cik_str")]
    pub cik: Cik,
    pub ticker: String,
    pub title: String,
}

pub(crate) struct TickerVisitor;

impl<'de> Visitor<'de> for TickerVisitor {
    type Value = Tickers;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("Map of tickers")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // each entry is in the form of:
        // `"0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
        //  "1": { ... },
        //  ...`
        let mut tickers: Vec<Ticker> = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((_, ticker)) = map.next_entry::<String, Ticker>()? {
            tickers.push(ticker);
        }
        Ok(Tickers(tickers))
    }
}

impl<'de> Deserialize<'de> for Tickers {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // we want a vector returned, but the deserialize will expect a map, given
        // how the API has been designed
        deserializer.deserialize_map(TickerVisitor)
    }
}

// {
//      "cik":"1045810",
//      "entityType":"operating",
//      "sic":"3674",
//      "sicDescription":"Semiconductors & Related Devices",
//      "name":"NVIDIA CORP",
//      "category":"Large accelerated filer",
//      "fiscalYearEnd":"0126",
//      "stateOfIncorporation":"DE",
//      "addresses": { "mailing": { ... }, "business": { ... } },
//      "phone":"408-486-2000",
//      "formerNames": [ { "name":"NVIDIA CORP/CA", "from":"...", "to":"..." } ],
//      "filings": {
//           "recent": {
//               "accessionNumber": ["0001045810-24-000316", ...],
//               "filingDate": ["2024-11-20", ...],
//               "reportDate": ["2024-10-27", "", ...],
//               "form": ["10-Q", "4", ...],
//               "primaryDocument": ["nvda-20241027.htm", "xslF345X05/wk-form4_1731.xml", ...],
//               "primaryDocDescription": ["10-Q", "FORM 4", ...],
//               ...
//           },
//           "files": [ ... ]
//      }
// }
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub cik: Cik,
    #[serde(default)]
    pub name: String,
    pub entity_type: Option<String>,
    pub sic: Option<String>,
    pub sic_description: Option<String>,
    pub category: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub state_of_incorporation: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub addresses: Option<Addresses>,
    pub former_names: Option<Vec<FormerName>>,
    pub filings: Option<Filings>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct Addresses {
    pub mailing: Option<Address>,
    pub business: Option<Address>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    pub state_or_country: Option<String>,
    pub zip_code: Option<String>,
    pub state_or_country_description: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct FormerName {
    pub name: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Filings {
    pub recent: Option<RecentFilings>,
}

/// Filing metadata as the SEC ships it: one array per field, where index `i` of every array
/// describes the same filing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    #[serde(default)]
    pub accession_number: Vec<String>,
    #[serde(default)]
    pub filing_date: Vec<String>,
    #[serde(default)]
    pub report_date: Vec<Option<String>>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default)]
    pub primary_document: Vec<String>,
    #[serde(default)]
    pub primary_doc_description: Vec<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKERS_JSON: &str = r#"{
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "1": {"cik_str": "789019", "ticker": "MSFT", "title": "MICROSOFT CORP"},
        "2": {"cik_str": 1045810, "ticker": "NVDA", "title": "NVIDIA CORP"}
    }"#;

    const SUBMISSION_JSON: &str = r#"{
        "cik": "320193",
        "entityType": "operating",
        "sic": "3571",
        "sicDescription": "Electronic Computers",
        "name": "Apple Inc.",
        "category": "Large accelerated filer",
        "fiscalYearEnd": "0928",
        "stateOfIncorporation": "CA",
        "phone": "(408) 996-1010",
        "website": "",
        "addresses": {
            "mailing": {"street1": "ONE APPLE PARK WAY", "street2": null, "city": "CUPERTINO",
                        "stateOrCountry": "CA", "zipCode": "95014", "stateOrCountryDescription": "CA"},
            "business": null
        },
        "formerNames": [{"name": "APPLE COMPUTER INC", "from": "1994-01-26", "to": "2007-01-04"}],
        "filings": {
            "recent": {
                "accessionNumber": ["0000320193-23-000106", "0000320193-23-000105"],
                "filingDate": ["2023-11-03", "2023-11-02"],
                "reportDate": ["2023-09-30", ""],
                "form": ["10-K", "4"],
                "primaryDocument": ["aapl-20230930.htm", "xslF345X05/wf-form4_1.xml"],
                "primaryDocDescription": ["10-K", "FORM 4"]
            },
            "files": []
        }
    }"#;

    #[test]
    fn test_tickers_keep_listing_order() {
        let tickers: Tickers = serde_json::from_str(TICKERS_JSON).unwrap();
        let symbols: Vec<&str> = tickers.0.iter().map(|t| t.ticker.as_str()).collect();
        assert_eq!(symbols, ["AAPL", "MSFT", "NVDA"]);
        assert_eq!(tickers.0[0].cik.as_str(), "0000320193");
        assert_eq!(tickers.0[1].cik.as_str(), "0000789019");
    }

    #[test]
    fn test_submission_parsing() {
        let submission: Submission = serde_json::from_str(SUBMISSION_JSON).unwrap();
        assert_eq!(submission.cik.as_str(), "0000320193");
        assert_eq!(submission.name, "Apple Inc.");
        let recent = submission.filings.unwrap().recent.unwrap();
        assert_eq!(recent.form, ["10-K", "4"]);
        assert_eq!(recent.report_date[1].as_deref(), Some(""));
        let mailing = submission.addresses.unwrap().mailing.unwrap();
        assert_eq!(mailing.city.as_deref(), Some("CUPERTINO"));
    }

    #[test]
    fn test_submission_without_filings() {
        let submission: Submission =
            serde_json::from_str(r#"{"cik": 1, "name": "SHELL CO"}"#).unwrap();
        assert!(submission.filings.is_none());
        assert!(submission.former_names.is_none());
    }

    #[test]
    fn test_submission_url() {
        let client = SecClient::new(&EdgarConfig::new("noth test@example.com")).unwrap();
        let cik = Cik::new("320193").unwrap();
        assert_eq!(
            client.submission_url(&cik),
            "https://data.sec.gov/submissions/CIK0000320193.json"
        );
    }

    #[tokio::test]
    async fn test_buffer_source_reads_bulk_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("company_tickers.json"), TICKERS_JSON).unwrap();
        std::fs::create_dir_all(dir.path().join("submissions")).unwrap();
        std::fs::write(
            dir.path().join("submissions").join("CIK0000320193.json"),
            SUBMISSION_JSON,
        )
        .unwrap();

        let source = BufferSource::new(dir.path());
        assert_eq!(source.tickers().await.unwrap().0.len(), 3);

        let apple = Cik::new("320193").unwrap();
        assert_eq!(source.submission(&apple).await.unwrap().name, "Apple Inc.");

        let missing = Cik::new("789019").unwrap();
        assert!(matches!(
            source.submission(&missing).await,
            Err(Error::UpstreamUnavailable { .. })
        ));
    }

    // -------------------------------------------------------------------------------------------------

    /// Answers one HTTP request with `response`, handing back the raw request it received.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_lowercase()
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base: &str) -> SecClient {
        let mut config = EdgarConfig::new("noth test@example.com");
        config.tickers_url = format!("{base}/files/company_tickers.json");
        config.submissions_base = base.to_string();
        SecClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_sec_client_sends_user_agent() {
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            TICKERS_JSON.len(),
            TICKERS_JSON
        );
        let (base, server) = serve_once(response).await;

        let tickers = client(&base).tickers().await.unwrap();
        assert_eq!(tickers.0.len(), 3);

        let request = server.await.unwrap();
        assert!(request.starts_with("get /files/company_tickers.json "));
        assert!(request.contains("user-agent: noth test@example.com\r\n"));
    }

    #[tokio::test]
    async fn test_sec_client_error_status() {
        let response =
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
        let (base, server) = serve_once(response.to_string()).await;

        let cik = Cik::new("320193").unwrap();
        match client(&base).submission(&cik).await {
            Err(Error::UpstreamUnavailable { url, reason }) => {
                assert_eq!(url, format!("{base}/submissions/CIK0000320193.json"));
                assert!(reason.contains("503"));
            }
            other => panic!("expected upstream failure, got {other:?}"),
        }
        assert!(server.await.unwrap().contains("user-agent: noth test@example.com"));
    }

    #[tokio::test]
    async fn test_sec_client_connection_refused() {
        // bind then drop, so nothing is listening on the port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(matches!(
            client(&base).tickers().await,
            Err(Error::UpstreamUnavailable { .. })
        ));
    }
}
