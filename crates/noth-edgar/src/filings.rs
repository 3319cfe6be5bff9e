use crate::cik::Cik;
use crate::source::{Addresses, FormerName, RecentFilings, Submission};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Forms that report a change in insider ownership.
pub const INSIDER_FORMS: [&str; 3] = ["3", "4", "5"];

/// How many filings of each form the grouped report keeps.
pub const RECENT_PER_FORM: usize = 3;

pub const NO_FILINGS: &str = "No filings found";

//////////////////////////////////////////////////////////////////////////////////////////////////
//
// Filings
//
//////////////////////////////////////////////////////////////////////////////////////////////////

/// One filing; the `i`th element of every array in [`RecentFilings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filing {
    pub form: String,
    pub filing_date: String,
    pub accession_number: String,
    pub primary_document: String,
    pub description: Option<String>,
    pub report_date: Option<String>,
}

impl RecentFilings {
    /// Zip the parallel arrays into one record per filing, keeping upstream order.
    ///
    /// Ragged core arrays are cut to the shortest; the optional arrays just give `None` where
    /// they run out or hold an empty string.
    pub fn into_filings(self) -> Vec<Filing> {
        let len = [
            self.form.len(),
            self.filing_date.len(),
            self.accession_number.len(),
            self.primary_document.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);

        if self.form.len() != len
            || self.filing_date.len() != len
            || self.accession_number.len() != len
            || self.primary_document.len() != len
        {
            warn!("filing arrays differ in length; truncating to {len}");
        }

        let mut descriptions = self.primary_doc_description.into_iter();
        let mut report_dates = self.report_date.into_iter();

        self.form
            .into_iter()
            .zip(self.filing_date)
            .zip(self.accession_number)
            .zip(self.primary_document)
            .map(|(((form, filing_date), accession_number), primary_document)| Filing {
                form,
                filing_date,
                accession_number,
                primary_document,
                description: non_empty(descriptions.next().flatten()),
                report_date: non_empty(report_dates.next().flatten()),
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Every filing in the submission's recent history; empty when there is none.
pub fn recent_filings(submission: &Submission) -> Vec<Filing> {
    submission
        .filings
        .as_ref()
        .and_then(|filings| filings.recent.clone())
        .map(RecentFilings::into_filings)
        .unwrap_or_default()
}

/// URL of a filing's primary document in the EDGAR archive:
/// `{base}/{cik without leading zeros}/{accession number without dashes}/{document}`.
///
/// ```text
/// https://www.sec.gov/Archives/edgar/data/1045810/000104581024000316/nvda-20241027.htm
/// ```
pub fn document_url(archives_base: &str, cik: &Cik, accession_number: &str, document: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        archives_base.trim_end_matches('/'),
        cik.trimmed(),
        accession_number.replace('-', ""),
        document
    )
}

//////////////////////////////////////////////////////////////////////////////////////////////////
//
// Views
//
//////////////////////////////////////////////////////////////////////////////////////////////////

/// Company details, without any filings.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub ticker: String,
    pub cik: Cik,
    pub name: String,
    pub sic: Option<String>,
    pub sic_description: Option<String>,
    pub category: Option<String>,
    pub entity_type: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub state_of_incorporation: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub addresses: Addresses,
    pub former_names: Vec<FormerName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilingView {
    pub form: String,
    pub filing_date: String,
    pub accession_number: String,
    pub document_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilingsList {
    pub ticker: String,
    pub cik: Cik,
    pub company_name: String,
    /// Filings in the history, before the form filter.
    pub total_filings: usize,
    /// Filings returned.
    pub filtered_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
    pub filings: Vec<FilingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTrade {
    pub form: String,
    pub filing_date: String,
    pub accession_number: String,
    pub report_date: Option<String>,
    pub document_url: String,
}

#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTrades {
    pub ticker: String,
    pub cik: Cik,
    pub company_name: String,
    pub count: usize,
    pub trades: Vec<InsiderTrade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilingSummary {
    pub total_filings: usize,
    /// Count per form over the whole history.
    pub by_type: BTreeMap<String, usize>,
    /// The first few filings seen per form.
    pub recent_by_type: BTreeMap<String, Vec<FilingView>>,
}

/// Profile and grouped filing history in one.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyReport {
    #[serde(flatten)]
    pub profile: CompanyProfile,
    pub filing_summary: FilingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// -------------------------------------------------------------------------------------------------

/// Turns a [`Submission`] into the response views. Pure; no I/O.
#[derive(Clone, Debug)]
pub struct Projector {
    archives_base: String,
}

impl Projector {
    pub fn new(archives_base: impl Into<String>) -> Self {
        Self {
            archives_base: archives_base.into(),
        }
    }

    fn view(&self, cik: &Cik, filing: &Filing) -> FilingView {
        FilingView {
            form: filing.form.clone(),
            filing_date: filing.filing_date.clone(),
            accession_number: filing.accession_number.clone(),
            document_url: document_url(
                &self.archives_base,
                cik,
                &filing.accession_number,
                &filing.primary_document,
            ),
            description: filing.description.clone(),
        }
    }

    pub fn profile(&self, ticker: &str, submission: &Submission) -> CompanyProfile {
        CompanyProfile {
            ticker: ticker.to_string(),
            cik: submission.cik.clone(),
            name: submission.name.clone(),
            sic: submission.sic.clone(),
            sic_description: submission.sic_description.clone(),
            category: submission.category.clone(),
            entity_type: submission.entity_type.clone(),
            fiscal_year_end: submission.fiscal_year_end.clone(),
            state_of_incorporation: submission.state_of_incorporation.clone(),
            phone: submission.phone.clone(),
            website: submission.website.clone(),
            addresses: submission.addresses.clone().unwrap_or_default(),
            former_names: submission.former_names.clone().unwrap_or_default(),
        }
    }

    /// Filings in upstream order, optionally narrowed to one form (ignoring case), up to `limit`.
    pub fn filings_list(
        &self,
        ticker: &str,
        submission: &Submission,
        form_type: Option<&str>,
        limit: usize,
    ) -> FilingsList {
        let filings = recent_filings(submission);
        let filtered: Vec<FilingView> = filings
            .iter()
            .filter(|f| form_type.map_or(true, |form| f.form.eq_ignore_ascii_case(form)))
            .take(limit)
            .map(|f| self.view(&submission.cik, f))
            .collect();
        trace!(
            "{ticker}: {} of {} filings kept for form {form_type:?}",
            filtered.len(),
            filings.len()
        );

        FilingsList {
            ticker: ticker.to_string(),
            cik: submission.cik.clone(),
            company_name: submission.name.clone(),
            total_filings: filings.len(),
            filtered_count: filtered.len(),
            form_type: form_type.map(str::to_string),
            filings: filtered,
            message: filings.is_empty().then(|| NO_FILINGS.to_string()),
        }
    }

    /// Ownership-change filings (forms 3, 4 and 5), in upstream order, up to `limit`.
    pub fn insider_trades(&self, ticker: &str, submission: &Submission, limit: usize) -> InsiderTrades {
        let filings = recent_filings(submission);
        let trades: Vec<InsiderTrade> = filings
            .iter()
            .filter(|f| INSIDER_FORMS.contains(&f.form.as_str()))
            .take(limit)
            .map(|f| InsiderTrade {
                form: f.form.clone(),
                filing_date: f.filing_date.clone(),
                accession_number: f.accession_number.clone(),
                report_date: f.report_date.clone(),
                document_url: document_url(
                    &self.archives_base,
                    &submission.cik,
                    &f.accession_number,
                    &f.primary_document,
                ),
            })
            .collect();

        InsiderTrades {
            ticker: ticker.to_string(),
            cik: submission.cik.clone(),
            company_name: submission.name.clone(),
            count: trades.len(),
            trades,
            message: filings.is_empty().then(|| NO_FILINGS.to_string()),
        }
    }

    /// Profile plus, in a single pass over the whole history, a count per form and the first
    /// [`RECENT_PER_FORM`] filings of each form.
    pub fn report(&self, ticker: &str, submission: &Submission) -> CompanyReport {
        let filings = recent_filings(submission);
        let mut summary = FilingSummary {
            total_filings: filings.len(),
            ..Default::default()
        };

        for filing in &filings {
            *summary.by_type.entry(filing.form.clone()).or_default() += 1;
            let recent = summary
                .recent_by_type
                .entry(filing.form.clone())
                .or_default();
            if recent.len() < RECENT_PER_FORM {
                recent.push(self.view(&submission.cik, filing));
            }
        }

        CompanyReport {
            profile: self.profile(ticker, submission),
            filing_summary: summary,
            message: filings.is_empty().then(|| NO_FILINGS.to_string()),
        }
    }
}
