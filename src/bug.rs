//! Bug Record - one Bugzilla bug as returned by the REST API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::train::Channel;

/// Bug Record with the fields classification needs, plus an open bag for
/// everything else the API returned (status, severity, the per-release
/// `cf_status_firefox*` / `cf_tracking_firefox*` flags, ...).
///
/// ## Example
///
/// ```rust
/// use bz2db::bug::BugRecord;
///
/// let bug: BugRecord = serde_json::from_str(r#"{
///     "id": 1280001,
///     "creation_time": "2016-06-06T10:00:00Z",
///     "version": "47 Branch",
///     "status": "NEW",
///     "keywords": ["regression", "crash"]
/// }"#)?;
///
/// assert_eq!(bug.version(), "47 Branch");
/// assert_eq!(bug.field("status").and_then(|v| v.as_str()), Some("NEW"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugRecord {
    id: u64,
    creation_time: String,
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_channel: Option<Channel>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl BugRecord {
    /// Create a bug record with no extra fields.
    ///
    /// # Arguments
    ///
    /// * `id` - Bugzilla bug number
    /// * `creation_time` - ISO-8601 timestamp; the first ten characters must be a date
    /// * `version` - Free-text version the bug was reported against
    #[must_use]
    pub fn new(id: u64, creation_time: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id,
            creation_time: creation_time.into(),
            version: version.into(),
            release_cycle: None,
            release_channel: None,
            fields: BTreeMap::new(),
        }
    }

    /// Create a builder for a record carrying extra fields.
    #[must_use]
    pub fn builder(
        id: u64,
        creation_time: impl Into<String>,
        version: impl Into<String>,
    ) -> BugRecordBuilder {
        BugRecordBuilder::new(id, creation_time, version)
    }

    /// Get the bug number.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Get the creation timestamp as delivered by the API.
    #[must_use]
    pub fn creation_time(&self) -> &str {
        &self.creation_time
    }

    /// Get the reported version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the derived release cycle, once annotated.
    #[must_use]
    pub const fn release_cycle(&self) -> Option<u32> {
        self.release_cycle
    }

    /// Get the derived release channel, once annotated.
    #[must_use]
    pub const fn release_channel(&self) -> Option<Channel> {
        self.release_channel
    }

    /// Get an extra field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get all extra fields.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Set or overwrite an extra field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Record the derived release cycle and channel.
    pub fn set_release(&mut self, release_cycle: u32, channel: Channel) {
        self.release_cycle = Some(release_cycle);
        self.release_channel = Some(channel);
    }

    /// Drop every extra field for which `keep` returns false.
    pub fn retain_fields<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.fields.retain(|name, _| keep(name));
    }

    /// Flatten a `keywords` array into one comma-separated string.
    ///
    /// Non-string entries keep their JSON text. Leaves other shapes alone.
    pub fn join_keywords(&mut self) {
        if let Some(Value::Array(keywords)) = self.fields.get("keywords") {
            let joined = keywords
                .iter()
                .map(|keyword| match keyword {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            self.fields.insert("keywords".to_string(), Value::String(joined));
        }
    }

    /// Value of any column by name, including the typed fields.
    ///
    /// Returns `None` for absent fields.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "creation_time" => Some(Value::from(self.creation_time.as_str())),
            "version" => Some(Value::from(self.version.as_str())),
            "release_cycle" => self.release_cycle.map(Value::from),
            "release_channel" => self.release_channel.map(|c| Value::from(c.as_str())),
            other => self.fields.get(other).cloned(),
        }
    }
}

/// Builder for `BugRecord`.
#[derive(Debug)]
pub struct BugRecordBuilder {
    record: BugRecord,
}

impl BugRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: u64, creation_time: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            record: BugRecord::new(id, creation_time, version),
        }
    }

    /// Add an extra field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.set_field(name, value.into());
        self
    }

    /// Build the `BugRecord`.
    #[must_use]
    pub fn build(self) -> BugRecord {
        self.record
    }
}
