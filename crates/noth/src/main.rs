use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*, TraceLevel};
use noth_edgar::{
    BufferSource, Edgar, EdgarConfig, FilingsQuery, InsiderQuery, Outcome, SearchQuery, SecClient,
    Source, TickerQuery,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;

fn preprocess(trace_level: Level) {
    dotenv::dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the view; a ticker miss prints the `{"error": ...}` payload and exits non-zero.
fn emit_outcome<T: Serialize>(outcome: Outcome<T>) -> Result<()> {
    let missing = matches!(outcome, Outcome::NotFound { .. });
    emit(&outcome)?;
    if missing {
        std::process::exit(2);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::TRACE => Level::TRACE,
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");

    // the SEC wants a USER_AGENT; reading from the buffer does not
    let (config, source) = match &cli.buffer {
        Some(dir) => {
            debug!("reading EDGAR data from {}", dir.display());
            let config = EdgarConfig::from_env().unwrap_or_else(|_| EdgarConfig::new("noth"));
            let source: Arc<dyn Source> = Arc::new(BufferSource::new(dir.clone()));
            (config, source)
        }
        None => {
            let config = EdgarConfig::from_env().map_err(|e| {
                error!("{e}");
                e
            })?;
            let source: Arc<dyn Source> = Arc::new(SecClient::new(&config)?);
            (config, source)
        }
    };
    let edgar = Edgar::new(source, &config);

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> noth <COMMAND>"
    match cli.command {
        // "> noth profile AAPL"
        Profile { ticker } => emit_outcome(edgar.profile(&TickerQuery::new(ticker)).await?)?,

        // "> noth filings AAPL --form-type 10-K --limit 5"
        Filings {
            ticker,
            form_type,
            limit,
        } => {
            let query = FilingsQuery {
                ticker,
                form_type,
                limit,
            };
            emit_outcome(edgar.filings(&query).await?)?
        }

        // "> noth insider AAPL --limit 10"
        Insider { ticker, limit } => {
            let query = InsiderQuery { ticker, limit };
            emit_outcome(edgar.insider_trades(&query).await?)?
        }

        // "> noth report AAPL"
        Report { ticker } => emit_outcome(edgar.report(&TickerQuery::new(ticker)).await?)?,

        // "> noth search apple --limit 5"
        Search { query, limit } => emit(&edgar.search(&SearchQuery { query, limit }).await?)?,

        // "> noth directory"
        Directory => {
            edgar.directory().ensure_fresh().await?;
            if let Some(snapshot) = edgar.directory().snapshot().await {
                emit(&serde_json::json!({
                    "entries": snapshot.len(),
                    "fetchedAt": snapshot.fetched_at(),
                }))?;
            }
        }
    }

    Ok(())
}
