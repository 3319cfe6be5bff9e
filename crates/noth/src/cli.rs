use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, global = true, value_enum, ignore_case = true, default_value_t = TraceLevel::INFO)]
    pub trace: TraceLevel,

    /// Read `company_tickers.json` and `submissions/` from this directory instead of the SEC.
    #[arg(long, global = true)]
    pub buffer: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Company details for a ticker.
    Profile { ticker: String },

    /// Recent filings for a ticker, newest first.
    Filings {
        ticker: String,

        /// Only keep this form type, e.g. 10-K (case-insensitive).
        #[arg(long)]
        form_type: Option<String>,

        /// Maximum filings returned [default: 20, max: 100]
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Insider ownership filings (forms 3, 4, 5) for a ticker.
    Insider {
        ticker: String,

        /// Maximum filings returned [default: 20, max: 50]
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Profile plus filing counts and the latest filings per form type.
    Report { ticker: String },

    /// Search companies by ticker or name.
    Search {
        query: Option<String>,

        /// Maximum matches returned [default: 10, max: 50]
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Load the ticker directory and show its size.
    Directory,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
