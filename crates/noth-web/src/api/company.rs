use actix_web::{get, web, HttpResponse, Responder};
use noth_edgar::filings::{CompanyProfile, CompanyReport, FilingsList, InsiderTrades};
use noth_edgar::service::SearchResults;
use noth_edgar::{Edgar, Error, FilingsQuery, InsiderQuery, Outcome, SearchQuery, TickerQuery};
use serde::{Deserialize, Serialize};
use tracing::error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Failure payload
///
/// ```json
/// { "error": "Ticker ZZZZ not found" }
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    error: String,
}

fn respond<T: Serialize>(result: Result<Outcome<T>, Error>) -> HttpResponse {
    match result {
        Ok(Outcome::Found(view)) => HttpResponse::Ok().json(view),
        Ok(missing @ Outcome::NotFound { .. }) => HttpResponse::NotFound().json(missing),
        Err(e) => failure(e),
    }
}

fn failure(e: Error) -> HttpResponse {
    match e {
        Error::InvalidInput(_) => HttpResponse::BadRequest().json(ErrorBody { error: e.to_string() }),
        Error::TickerNotFound(_) => HttpResponse::NotFound().json(ErrorBody { error: e.to_string() }),
        // upstream detail stays in the logs
        Error::UpstreamUnavailable { .. } => {
            error!("{e}");
            HttpResponse::BadGateway().json(ErrorBody {
                error: "upstream unavailable".to_string(),
            })
        }
        Error::Config(_) => {
            error!("{e}");
            HttpResponse::InternalServerError().json(ErrorBody {
                error: "internal error".to_string(),
            })
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(profile)
        .service(filings)
        .service(insider_trades)
        .service(report)
        .service(search);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[utoipa::path(
    get,
    path = "/company/{ticker}/profile",
    responses(
        (status = 200, description = "Company details from its latest submission record", body = CompanyProfile),
        (status = 404, description = "Ticker not in the SEC directory", body = ErrorBody),
        (status = 502, description = "SEC unreachable", body = ErrorBody)
    ),
    params(
        ("ticker" = String, Path, description = "Stock ticker symbol")
    )
)]
#[get("/company/{ticker}/profile")]
pub async fn profile(path: web::Path<String>, edgar: web::Data<Edgar>) -> impl Responder {
    respond(edgar.profile(&TickerQuery::new(path.into_inner())).await)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FilingsParams {
    /// Only keep this form type, e.g. `10-K` (case-insensitive)
    pub form_type: Option<String>,
    /// Maximum filings returned (default 20, max 100)
    pub limit: Option<i64>,
}

/// Recent filings, newest first
///
/// ```json
/// {
///     "ticker": "AAPL",
///     "cik": "0000320193",
///     "companyName": "Apple Inc.",
///     "totalFilings": 1000,
///     "filteredCount": 1,
///     "formType": "10-K",
///     "filings": [
///         {
///             "form": "10-K",
///             "filingDate": "2023-11-03",
///             "accessionNumber": "0000320193-23-000106",
///             "documentUrl": "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm",
///             "description": "10-K"
///         }
///     ]
/// }
/// ```
#[utoipa::path(
    get,
    path = "/company/{ticker}/filings",
    responses(
        (status = 200, description = "Recent filings, optionally narrowed to one form type", body = FilingsList),
        (status = 404, description = "Ticker not in the SEC directory", body = ErrorBody),
        (status = 502, description = "SEC unreachable", body = ErrorBody)
    ),
    params(
        ("ticker" = String, Path, description = "Stock ticker symbol"),
        FilingsParams
    )
)]
#[get("/company/{ticker}/filings")]
pub async fn filings(
    path: web::Path<String>,
    params: web::Query<FilingsParams>,
    edgar: web::Data<Edgar>,
) -> impl Responder {
    let params = params.into_inner();
    let query = FilingsQuery {
        ticker: path.into_inner(),
        form_type: params.form_type,
        limit: params.limit,
    };
    respond(edgar.filings(&query).await)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum filings returned (default 20, max 50)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/company/{ticker}/insider-trades",
    responses(
        (status = 200, description = "Insider ownership filings (forms 3, 4 and 5)", body = InsiderTrades),
        (status = 404, description = "Ticker not in the SEC directory", body = ErrorBody),
        (status = 502, description = "SEC unreachable", body = ErrorBody)
    ),
    params(
        ("ticker" = String, Path, description = "Stock ticker symbol"),
        LimitParams
    )
)]
#[get("/company/{ticker}/insider-trades")]
pub async fn insider_trades(
    path: web::Path<String>,
    params: web::Query<LimitParams>,
    edgar: web::Data<Edgar>,
) -> impl Responder {
    let query = InsiderQuery {
        ticker: path.into_inner(),
        limit: params.limit,
    };
    respond(edgar.insider_trades(&query).await)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[utoipa::path(
    get,
    path = "/company/{ticker}/report",
    responses(
        (status = 200, description = "Profile, filing counts per form type and the latest three filings of each", body = CompanyReport),
        (status = 404, description = "Ticker not in the SEC directory", body = ErrorBody),
        (status = 502, description = "SEC unreachable", body = ErrorBody)
    ),
    params(
        ("ticker" = String, Path, description = "Stock ticker symbol")
    )
)]
#[get("/company/{ticker}/report")]
pub async fn report(path: web::Path<String>, edgar: web::Data<Edgar>) -> impl Responder {
    respond(edgar.report(&TickerQuery::new(path.into_inner())).await)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text matched against tickers and company names
    pub q: Option<String>,
    /// Maximum matches returned (default 10, max 50)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/search",
    responses(
        (
            status = 200, description = "Companies whose ticker or name contains the query",
            body = SearchResults, content_type = "application/json",
            example = json!({
                "query": "apple",
                "count": 1,
                "results": [
                    {"ticker": "AAPL", "cik": "0000320193", "title": "Apple Inc."}
                ]
            })
        ),
        (status = 502, description = "SEC unreachable", body = ErrorBody)
    ),
    params(SearchParams)
)]
#[get("/search")]
pub async fn search(params: web::Query<SearchParams>, edgar: web::Data<Edgar>) -> impl Responder {
    let params = params.into_inner();
    let query = SearchQuery {
        query: params.q,
        limit: params.limit,
    };
    match edgar.search(&query).await {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(e) => failure(e),
    }
}
