use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::{dotenv, var};
use noth_edgar::{BufferSource, Edgar, EdgarConfig, SecClient, Source};
use std::sync::Arc;
use tracing::{info, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;

use api::company;

#[derive(OpenApi)]
#[openapi(
    paths(
        company::profile,
        company::filings,
        company::insider_trades,
        company::report,
        company::search
    ),
    components(schemas(company::ErrorBody)),
    tags((name = "noth", description = "SEC EDGAR company data, by ticker"))
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let level = var("NOTH_TRACE")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = EdgarConfig::from_env().map_err(std::io::Error::other)?;
    let source: Arc<dyn Source> = match var("EDGAR_BUFFER") {
        Ok(dir) => {
            info!("reading EDGAR data from {dir}");
            Arc::new(BufferSource::new(dir))
        }
        Err(_) => Arc::new(SecClient::new(&config).map_err(std::io::Error::other)?),
    };

    // one directory cache shared by every worker
    let edgar = web::Data::new(Edgar::new(source, &config));
    let openapi = ApiDoc::openapi();
    let bind = var("NOTH_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("listening on {bind}");

    // run server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(edgar.clone())
            // api endpoints
            .configure(company::routes)
            // api documentation
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi.clone()))
    })
    .bind(bind)?
    .run()
    .await
}
