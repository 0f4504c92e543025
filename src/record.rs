use anyhow::{bail, Result};
use serde::Serialize;

use crate::parser::fields::clean_phone;

/// Stand-in for any field that could not be determined.
pub const NA: &str = "N/A";

/// Column headers, in field order. Must match the serde renames below.
pub const COLUMNS: [&str; 6] = [
    "Company Name",
    "Phone Number",
    "GSTIN",
    "Address",
    "Location",
    "Search Term",
];

/// One extracted business listing. Every field is either a real value or `NA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    #[serde(rename = "GSTIN")]
    pub gstin: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Search Term")]
    pub search_term: String,
}

impl Record {
    /// Build a record, filling blanks with the sentinel and cleaning the phone.
    pub fn new(
        company_name: &str,
        phone: Option<&str>,
        gstin: Option<&str>,
        address: Option<&str>,
        request: &CrawlRequest,
    ) -> Self {
        Self {
            company_name: or_na(Some(company_name)),
            phone_number: clean_phone(phone),
            gstin: or_na(gstin),
            address: or_na(address),
            location: or_na(Some(request.location.as_str())),
            search_term: or_na(Some(request.search_term.as_str())),
        }
    }

    /// Field values in `COLUMNS` order.
    pub fn values(&self) -> [&str; 6] {
        [
            &self.company_name,
            &self.phone_number,
            &self.gstin,
            &self.address,
            &self.location,
            &self.search_term,
        ]
    }

    pub fn has_phone(&self) -> bool {
        self.phone_number != NA
    }

    pub fn has_gstin(&self) -> bool {
        self.gstin != NA
    }

    pub fn has_address(&self) -> bool {
        self.address != NA
    }
}

fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NA.to_string(),
    }
}

/// Immutable input for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub location: String,
    pub search_term: String,
    pub max_pages: u32,
    pub include_enrichment: bool,
}

impl CrawlRequest {
    pub fn new(
        location: &str,
        search_term: &str,
        max_pages: u32,
        include_enrichment: bool,
    ) -> Result<Self> {
        if location.trim().is_empty() {
            bail!("location must not be empty");
        }
        if search_term.trim().is_empty() {
            bail!("search term must not be empty");
        }
        if max_pages == 0 {
            bail!("max pages must be at least 1");
        }
        Ok(Self {
            location: location.trim().to_string(),
            search_term: search_term.trim().to_string(),
            max_pages,
            include_enrichment,
        })
    }
}

/// Why the page loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    MaxPages,
    NoResults { page: u32 },
    Aborted { page: u32, reason: String },
    Cancelled { page: u32 },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::MaxPages => write!(f, "max pages reached"),
            StopReason::NoResults { page } => write!(f, "no listings on page {}", page),
            StopReason::Aborted { page, reason } => write!(f, "aborted on page {}: {}", page, reason),
            StopReason::Cancelled { page } => write!(f, "cancelled before page {}", page),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Deduplicated, in crawl order.
    pub records: Vec<Record>,
    /// Count before dedup.
    pub extracted: usize,
    pub pages_visited: u32,
    pub stop: StopReason,
}

pub struct Metrics {
    pub total: usize,
    pub with_phone: usize,
    pub with_gstin: usize,
    pub with_address: usize,
}

impl Metrics {
    pub fn of(records: &[Record]) -> Self {
        Self {
            total: records.len(),
            with_phone: records.iter().filter(|r| r.has_phone()).count(),
            with_gstin: records.iter().filter(|r| r.has_gstin()).count(),
            with_address: records.iter().filter(|r| r.has_address()).count(),
        }
    }

    pub fn print(&self) {
        println!(
            "Total: {} | With phone: {} | With GSTIN: {} | With address: {}",
            self.total, self.with_phone, self.with_gstin, self.with_address
        );
    }
}

impl CrawlResult {
    pub fn metrics(&self) -> Metrics {
        Metrics::of(&self.records)
    }
}
