//! Classify a handful of bugs and load them into a SQLite table, offline
//!
//! This example demonstrates:
//! - Discovery train lookup for a creation date
//! - Channel classification from the version string
//! - Per-bug failures reported without stopping the batch
//! - Destructive reload of the `bug` table
//!
//! Run with: cargo run --example classify_bugs

use bz2db::pipeline::annotate_batch;
use bz2db::storage::{BugTable, SqliteSink, TableSink};
use bz2db::train::{Classifier, ReleaseCalendar};
use bz2db::BugRecord;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== bz2db Classification Example ===\n");

    let classifier = Classifier::new(ReleaseCalendar::firefox());
    println!("Calendar: {} trains\n", classifier.calendar().len());

    let bugs = vec![
        BugRecord::new(1_275_001, "2016-06-06T09:12:44Z", "47 Branch"),
        BugRecord::new(1_275_002, "2016-06-06T17:40:01Z", "trunk"),
        BugRecord::new(1_275_003, "2016-06-07T08:00:00Z", "47 Branch"),
        BugRecord::new(1_275_004, "2016-08-01T11:30:00Z", "48 Branch"),
        BugRecord::new(1_275_005, "2016-08-02T11:30:00Z", "48 Branch"),
        BugRecord::new(1_275_006, "2016-09-20T14:05:00Z", "unspecified"),
        BugRecord::new(1_275_007, "2014-11-02T10:00:00Z", "trunk"),
    ];

    println!("{:<10} {:<22} {:<12} {:<14} cycle", "bug", "created", "version", "channel");
    let outcome = annotate_batch(&classifier, bugs);
    for bug in &outcome.annotated {
        println!(
            "{:<10} {:<22} {:<12} {:<14} {}",
            bug.id(),
            bug.creation_time(),
            bug.version(),
            bug.release_channel().map_or("-", |c| c.as_str()),
            bug.release_cycle().unwrap_or_default()
        );
    }

    println!("\nNot classified:");
    for failure in &outcome.failures {
        println!("  {failure}");
    }

    let table = BugTable::from_records(&[], &outcome.annotated)?;
    let mut sink = SqliteSink::open_in_memory()?;
    let rows = sink.replace(&table)?;
    println!("\nLoaded {rows} rows into an in-memory `bug` table");

    Ok(())
}
