//! Bugzilla fetch layer
//!
//! - [`BugSource`]: async trait over the two endpoints the loader reads
//! - [`RestClient`]: `reqwest` implementation against a Bugzilla instance
//! - [`Paginator`]: offset/limit walk with a fixed pause between pages
//!
//! # Example
//!
//! ```rust,no_run
//! use bz2db::fetch::{BugQuery, Paginator, RestClient};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> bz2db::Result<()> {
//! let client = RestClient::new("https://bugzilla.mozilla.org")?;
//! let since = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
//!
//! let bugs = Paginator::default()
//!     .fetch_all(&client, &BugQuery::firefox_default(since))
//!     .await?;
//! println!("fetched {} bugs", bugs.len());
//! # Ok(())
//! # }
//! ```

mod rest;

pub use rest::RestClient;

use crate::bug::BugRecord;
use crate::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Substring marking per-release status flags.
pub const STATUS_FIELD_MARKER: &str = "cf_status_firefox";

/// Substring marking per-release tracking flags.
pub const TRACKING_FIELD_MARKER: &str = "cf_tracking_firefox";

/// One entry of the bug field metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldInfo {
    /// Field name, e.g. `cf_status_firefox50`
    pub name: String,
}

impl FieldInfo {
    /// Field named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Names of the per-release status fields followed by the tracking fields,
/// each group in API order.
#[must_use]
pub fn tracking_field_names(fields: &[FieldInfo]) -> Vec<String> {
    let matching = |marker: &'static str| {
        fields
            .iter()
            .filter(move |field| field.name.contains(marker))
            .map(|field| field.name.clone())
    };
    matching(STATUS_FIELD_MARKER)
        .chain(matching(TRACKING_FIELD_MARKER))
        .collect()
}

/// Filter parameters for the bug search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BugQuery {
    /// Products to include
    pub products: Vec<String>,
    /// Only bugs created on or after this date
    pub created_since: Option<NaiveDate>,
    /// Severities to include
    pub severities: Vec<String>,
    /// Resolutions to include (`---` is unresolved)
    pub resolutions: Vec<String>,
    /// Fields the API should return
    pub include_fields: Vec<String>,
    /// Fields the API should omit
    pub exclude_fields: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl BugQuery {
    /// Firefox desktop/mobile/platform bugs of every severity, created on or
    /// after `since`.
    #[must_use]
    pub fn firefox_default(since: NaiveDate) -> Self {
        Self {
            products: strings(&[
                "Core",
                "Firefox",
                "Firefox for Android",
                "Firefox for iOS",
                "Toolkit",
            ]),
            created_since: Some(since),
            severities: strings(&["blocker", "critical", "major", "normal", "minor", "trivial"]),
            resolutions: strings(&[
                "---",
                "FIXED",
                "WONTFIX",
                "DUPLICATE",
                "WORKSFORME",
                "SUPPORT",
                "EXPIRED",
                "MOVED",
            ]),
            include_fields: Vec::new(),
            exclude_fields: strings(&["cc", "cc_detail", "creator_detail"]),
        }
    }

    /// Replace the include list.
    #[must_use]
    pub fn with_include_fields(mut self, fields: Vec<String>) -> Self {
        self.include_fields = fields;
        self
    }

    /// Query-string pairs; list parameters repeat their key.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let repeated = |key: &str, values: &[String]| {
            values
                .iter()
                .map(|value| (key.to_string(), value.clone()))
                .collect::<Vec<_>>()
        };

        let mut params = repeated("product", &self.products);
        if let Some(since) = self.created_since {
            params.push(("creation_time".to_string(), since.format("%Y-%m-%d").to_string()));
        }
        params.extend(repeated("bug_severity", &self.severities));
        params.extend(repeated("resolution", &self.resolutions));
        params.extend(repeated("include_fields", &self.include_fields));
        params.extend(repeated("exclude_fields", &self.exclude_fields));
        params
    }
}

/// Read side of a Bugzilla instance.
pub trait BugSource: Send + Sync {
    /// List every bug field the instance defines.
    fn fetch_fields(&self) -> impl Future<Output = Result<Vec<FieldInfo>>> + Send;

    /// Fetch one page of bugs matching `query`.
    ///
    /// An empty page means there is nothing past `offset`.
    fn fetch_page(
        &self,
        query: &BugQuery,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<BugRecord>>> + Send;
}

/// Offset/limit pagination with a fixed delay after each non-empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    max_pages: usize,
    page_delay: Duration,
}

impl Default for Paginator {
    /// 2000 bugs per page, at most 50 pages, one second between pages.
    fn default() -> Self {
        Self::new(2000, 50, Duration::from_secs(1))
    }
}

impl Paginator {
    /// Create a paginator.
    #[must_use]
    pub const fn new(page_size: usize, max_pages: usize, page_delay: Duration) -> Self {
        Self {
            page_size,
            max_pages,
            page_delay,
        }
    }

    /// Bugs requested per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Upper bound on pages fetched.
    #[must_use]
    pub const fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Pause after each non-empty page.
    #[must_use]
    pub const fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Fetch pages until one comes back empty or `max_pages` have been read.
    ///
    /// # Errors
    ///
    /// Returns the first error from `source`; pages already read are dropped.
    pub async fn fetch_all<S: BugSource>(&self, source: &S, query: &BugQuery) -> Result<Vec<BugRecord>> {
        let limit = self.max_pages.saturating_mul(self.page_size);
        let mut offset = 0;
        let mut bugs = Vec::new();

        while offset < limit {
            info!(page = offset / self.page_size, offset, "fetching page");
            let page = source.fetch_page(query, self.page_size, offset).await?;
            if page.is_empty() {
                break;
            }
            bugs.extend(page);
            offset += self.page_size;
            tokio::time::sleep(self.page_delay).await;
        }

        info!(bugs = bugs.len(), "fetch complete");
        Ok(bugs)
    }
}
