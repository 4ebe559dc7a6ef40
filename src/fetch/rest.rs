//! `reqwest` client for the Bugzilla REST API.

use super::{BugQuery, BugSource, FieldInfo};
use crate::bug::BugRecord;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct FieldsResponse {
    fields: Vec<FieldInfo>,
}

#[derive(Deserialize)]
struct BugsResponse {
    bugs: Vec<BugRecord>,
}

/// Bugzilla REST API client (unauthenticated).
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for the instance at `base_url`, e.g.
    /// `https://bugzilla.mozilla.org`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bz2db/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Instance root URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(String, String)]) -> Result<T> {
        let url = self.endpoint(path);
        debug!(%url, params = params.len(), "GET");

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("GET {url} returned {status}")));
        }
        Ok(response.json().await?)
    }
}

impl BugSource for RestClient {
    async fn fetch_fields(&self) -> Result<Vec<FieldInfo>> {
        let response: FieldsResponse = self.get_json("field/bug", &[]).await?;
        Ok(response.fields)
    }

    async fn fetch_page(&self, query: &BugQuery, limit: usize, offset: usize) -> Result<Vec<BugRecord>> {
        let mut params = query.to_params();
        params.push(("limit".to_string(), limit.to_string()));
        params.push(("offset".to_string(), offset.to_string()));

        let response: BugsResponse = self.get_json("bug", &params).await?;
        Ok(response.bugs)
    }
}
