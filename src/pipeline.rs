//! Load pipeline: fetch, trim, annotate, replace the table
//!
//! ```text
//! BugSource ──> Paginator ──> prepare (field filter, keywords)
//!                                 │
//!                                 ▼
//!                        Classifier::annotate ──> failures (reported, not loaded)
//!                                 │
//!                                 ▼
//!                        BugTable ──> TableSink::replace
//! ```
//!
//! A bug that cannot be classified is kept out of the table and listed in the
//! [`LoadReport`]; the rest of the batch still loads.

use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::bug::BugRecord;
use crate::fetch::{tracking_field_names, BugQuery, BugSource, Paginator};
use crate::storage::{BugTable, TableSink};
use crate::train::Classifier;
use crate::Error;

/// Fields requested for every bug, before the tracking fields.
pub const BASE_FIELDS: [&str; 15] = [
    "id",
    "version",
    "target_milestone",
    "status",
    "severity",
    "resolution",
    "product",
    "platform",
    "op_sys",
    "keywords",
    "is_confirmed",
    "creator",
    "creation_time",
    "whiteboard",
    "dupe_of",
];

/// Base fields followed by `tracking_fields`.
#[must_use]
pub fn include_fields(tracking_fields: &[String]) -> Vec<String> {
    BASE_FIELDS
        .iter()
        .map(ToString::to_string)
        .chain(tracking_fields.iter().cloned())
        .collect()
}

/// Drop fields outside `include` and flatten keywords.
pub fn prepare(bug: &mut BugRecord, include: &HashSet<&str>) {
    bug.retain_fields(|name| include.contains(name));
    bug.join_keywords();
}

/// A bug that could not be classified.
#[derive(Debug)]
pub struct RecordFailure {
    /// Bug number
    pub bug_id: u64,
    /// Why classification failed
    pub error: Error,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bug {}: {}", self.bug_id, self.error)
    }
}

/// Annotated bugs and the ones that failed, each in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successfully classified bugs
    pub annotated: Vec<BugRecord>,
    /// Bugs left out of the load
    pub failures: Vec<RecordFailure>,
}

fn annotate_one(classifier: &Classifier, mut bug: BugRecord) -> Result<BugRecord, RecordFailure> {
    match classifier.annotate(&mut bug) {
        Ok(_) => Ok(bug),
        Err(error) => Err(RecordFailure {
            bug_id: bug.id(),
            error,
        }),
    }
}

/// Annotate every bug, collecting failures instead of stopping.
#[must_use]
pub fn annotate_batch(classifier: &Classifier, bugs: Vec<BugRecord>) -> BatchOutcome {
    #[cfg(feature = "parallel")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        bugs.into_par_iter()
            .map(|bug| annotate_one(classifier, bug))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = bugs
        .into_iter()
        .map(|bug| annotate_one(classifier, bug))
        .collect();

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(bug) => outcome.annotated.push(bug),
            Err(failure) => {
                warn!(bug_id = failure.bug_id, error = %failure.error, "skipping unclassifiable bug");
                outcome.failures.push(failure);
            }
        }
    }
    outcome
}

/// Summary of one load run.
#[derive(Debug)]
pub struct LoadReport {
    /// Bugs returned by the API
    pub fetched: usize,
    /// Rows written to the sink
    pub loaded: usize,
    /// Tracking/status columns added to the table
    pub tracking_fields: Vec<String>,
    /// Bugs left out because they could not be classified
    pub failures: Vec<RecordFailure>,
}

/// One full destructive reload from a source into a sink.
pub struct Loader<S, K> {
    source: S,
    sink: K,
    classifier: Classifier,
    paginator: Paginator,
    query: BugQuery,
}

impl<S: BugSource, K: TableSink> Loader<S, K> {
    /// Create a loader.
    pub const fn new(
        source: S,
        sink: K,
        classifier: Classifier,
        paginator: Paginator,
        query: BugQuery,
    ) -> Self {
        Self {
            source,
            sink,
            classifier,
            paginator,
            query,
        }
    }

    /// Sink the loader writes to.
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Fetch, annotate and replace the table.
    ///
    /// # Errors
    ///
    /// Returns error if fetching or writing fails. Per-bug classification
    /// errors do not fail the run; they are listed in the report.
    pub async fn run(&mut self) -> crate::Result<LoadReport> {
        let fields = self.source.fetch_fields().await?;
        let tracking = tracking_field_names(&fields);
        info!(tracking_fields = tracking.len(), "discovered tracking fields");

        let include = include_fields(&tracking);
        let query = self.query.clone().with_include_fields(include.clone());
        let mut bugs = self.paginator.fetch_all(&self.source, &query).await?;
        let fetched = bugs.len();

        let keep: HashSet<&str> = include.iter().map(String::as_str).collect();
        for bug in &mut bugs {
            prepare(bug, &keep);
        }

        let outcome = annotate_batch(&self.classifier, bugs);
        let table = BugTable::from_records(&tracking, &outcome.annotated)?;
        let loaded = self.sink.replace(&table)?;

        info!(
            fetched,
            loaded,
            failed = outcome.failures.len(),
            "load complete"
        );

        Ok(LoadReport {
            fetched,
            loaded,
            tracking_fields: tracking,
            failures: outcome.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::{Channel, ReleaseCalendar, ReleaseTrain};
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_include_fields_appends_tracking() {
        let fields = include_fields(&["cf_status_firefox50".to_string()]);
        assert_eq!(fields.len(), BASE_FIELDS.len() + 1);
        assert_eq!(fields[0], "id");
        assert_eq!(fields.last().unwrap(), "cf_status_firefox50");
    }

    #[test]
    fn test_prepare_filters_and_joins() {
        let mut bug = BugRecord::builder(1, "2016-06-06", "trunk")
            .field("keywords", json!(["a", "b"]))
            .field("cc", json!(["x@example.com"]))
            .field("cf_status_firefox50", "affected")
            .build();
        let include = include_fields(&["cf_status_firefox50".to_string()]);
        let keep: HashSet<&str> = include.iter().map(String::as_str).collect();

        prepare(&mut bug, &keep);

        assert_eq!(bug.field("keywords"), Some(&json!("a,b")));
        assert!(bug.field("cc").is_none());
        assert!(bug.field("cf_status_firefox50").is_some());
    }

    #[test]
    fn test_annotate_batch_keeps_order_and_collects_failures() {
        let classifier = Classifier::default();
        let bugs = vec![
            BugRecord::new(1, "2016-06-06", "trunk"),
            BugRecord::new(2, "2001-01-01", "trunk"),
            BugRecord::new(3, "2016-06-06", "47 branch"),
            BugRecord::new(4, "yesterday", "trunk"),
        ];

        let outcome = annotate_batch(&classifier, bugs);

        let ids: Vec<u64> = outcome.annotated.iter().map(BugRecord::id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(outcome.annotated[1].release_channel(), Some(Channel::Beta));

        let failed: Vec<u64> = outcome.failures.iter().map(|f| f.bug_id).collect();
        assert_eq!(failed, vec![2, 4]);
        assert!(matches!(
            outcome.failures[0].error,
            Error::NoApplicableTrain { .. }
        ));
        assert!(matches!(
            outcome.failures[1].error,
            Error::InvalidCreationTime(_)
        ));
    }

    #[test]
    fn test_offset_gap_is_reported_not_loaded() {
        let train_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let calendar =
            ReleaseCalendar::from_trains([ReleaseTrain::with_cycles(train_date, 70, 72, 73, 74)])
                .unwrap();
        let classifier = Classifier::new(calendar);

        let outcome = annotate_batch(
            &classifier,
            vec![BugRecord::new(9, "2020-02-02T00:00:00Z", "71 branch")],
        );

        assert!(outcome.annotated.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].to_string().starts_with("bug 9: Branch 71"));
    }
}
