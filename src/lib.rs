//! # bz2db: Bugzilla bugs into a relational table, by release train
//!
//! Fetches bugs from a Bugzilla REST API, tags each with the release cycle and
//! channel it was found on, and reloads them into a single wide `bug` table
//! (SQLite or Parquet), replacing the previous contents on every run.
//!
//! ## Release trains
//!
//! Releases ship on a fixed calendar. On each ship date `N` becomes release,
//! `N+1` beta, `N+2` aurora and `N+3` nightly. A bug created between two ship
//! dates belongs to the earlier one, and its reported version (`"47 branch"`,
//! `"trunk"`, ...) picks the channel within that train.
//!
//! ## Example Usage
//!
//! ```rust
//! use bz2db::train::{Channel, Classifier, ReleaseCalendar};
//!
//! let classifier = Classifier::new(ReleaseCalendar::firefox());
//!
//! // The day before 47 shipped, 47 was still on beta
//! let result = classifier.classify("2016-06-06T09:30:00Z", "47 branch")?;
//! assert_eq!(result.channel, Channel::Beta);
//! assert_eq!(result.release_cycle, 47);
//! # Ok::<(), bz2db::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod bug;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod storage;
pub mod train;

pub use bug::BugRecord;
pub use error::{Error, Result};
pub use train::{Channel, Classifier, ReleaseCalendar, ReleaseTrain};
