//! Loader configuration
//!
//! Defaults, then environment overrides, then whatever the caller sets on the
//! builder (the CLI applies its flags last).
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `BZ2DB_API_URL` | Bugzilla root URL | `https://bugzilla.mozilla.org` |
//! | `BZ2DB_SINCE` | earliest creation date | `2015-06-01` |
//! | `BZ2DB_PAGE_SIZE` | bugs per page | `2000` |
//! | `BZ2DB_MAX_PAGES` | page limit | `50` |
//! | `BZ2DB_PAGE_DELAY_MS` | pause between pages | `1000` |
//! | `DATABASE_PATH` | SQLite output file | `bugzilla.sqlite3` |

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::Paginator;
use crate::{Error, Result};

/// Default Bugzilla instance.
pub const DEFAULT_API_URL: &str = "https://bugzilla.mozilla.org";

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "bugzilla.sqlite3";

/// Where the loaded table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// SQLite database file
    Sqlite(PathBuf),
    /// Parquet file
    Parquet(PathBuf),
}

/// Settings for one load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    api_url: String,
    since: NaiveDate,
    page_size: usize,
    max_pages: usize,
    page_delay: Duration,
    output: OutputTarget,
    calendar_path: Option<PathBuf>,
}

impl LoaderConfig {
    /// Builder starting from defaults.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Builder starting from defaults with process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<LoaderConfigBuilder> {
        LoaderConfigBuilder::default().with_env(|name| std::env::var(name).ok())
    }

    /// Bugzilla root URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Earliest bug creation date fetched.
    #[must_use]
    pub const fn since(&self) -> NaiveDate {
        self.since
    }

    /// Paginator built from the page settings.
    #[must_use]
    pub const fn paginator(&self) -> Paginator {
        Paginator::new(self.page_size, self.max_pages, self.page_delay)
    }

    /// Output destination.
    #[must_use]
    pub const fn output(&self) -> &OutputTarget {
        &self.output
    }

    /// Calendar document to load instead of the built-in one.
    #[must_use]
    pub fn calendar_path(&self) -> Option<&Path> {
        self.calendar_path.as_deref()
    }
}

/// Builder for `LoaderConfig`.
#[derive(Debug, Clone)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl Default for LoaderConfigBuilder {
    fn default() -> Self {
        Self {
            config: LoaderConfig {
                api_url: DEFAULT_API_URL.to_string(),
                since: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap_or(NaiveDate::MIN),
                page_size: 2000,
                max_pages: 50,
                page_delay: Duration::from_secs(1),
                output: OutputTarget::Sqlite(PathBuf::from(DEFAULT_DATABASE_PATH)),
                calendar_path: None,
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{name}={value:?}: {e}")))
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::Config`] if `value` is not such a date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("{value:?} is not a YYYY-MM-DD date: {e}")))
}

impl LoaderConfigBuilder {
    /// Apply overrides from a variable lookup (the process environment in
    /// [`LoaderConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but unparsable.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BZ2DB_API_URL") {
            self.config.api_url = url;
        }
        if let Some(since) = lookup("BZ2DB_SINCE") {
            self.config.since = parse_date(&since)?;
        }
        if let Some(size) = lookup("BZ2DB_PAGE_SIZE") {
            self.config.page_size = parse_env("BZ2DB_PAGE_SIZE", &size)?;
        }
        if let Some(pages) = lookup("BZ2DB_MAX_PAGES") {
            self.config.max_pages = parse_env("BZ2DB_MAX_PAGES", &pages)?;
        }
        if let Some(delay) = lookup("BZ2DB_PAGE_DELAY_MS") {
            self.config.page_delay = Duration::from_millis(parse_env("BZ2DB_PAGE_DELAY_MS", &delay)?);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.config.output = OutputTarget::Sqlite(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Set the Bugzilla root URL.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the earliest creation date.
    #[must_use]
    pub fn since(mut self, since: NaiveDate) -> Self {
        self.config.since = since;
        self
    }

    /// Set bugs per page.
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the page limit.
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the pause between pages.
    #[must_use]
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.config.page_delay = delay;
        self
    }

    /// Set the output destination.
    #[must_use]
    pub fn output(mut self, output: OutputTarget) -> Self {
        self.config.output = output;
        self
    }

    /// Load the calendar from a JSON document.
    #[must_use]
    pub fn calendar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.calendar_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the page size or page limit is zero.
    pub fn build(self) -> Result<LoaderConfig> {
        if self.config.page_size == 0 {
            return Err(Error::Config("page size must be positive".to_string()));
        }
        if self.config.max_pages == 0 {
            return Err(Error::Config("max pages must be positive".to_string()));
        }
        Ok(self.config)
    }
}
