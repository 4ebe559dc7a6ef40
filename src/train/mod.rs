//! Release train classification
//!
//! A release train is the configuration of the four channels on a ship date:
//!
//! ```text
//! ship date ──> release = N
//!               beta    = N + 1
//!               aurora  = N + 2
//!               nightly = N + 3
//! ```
//!
//! A bug belongs to the latest train dated on or before its creation date.
//! Its `version` (`"47 branch"`, `"trunk"`, ...) is then placed on one of that
//! train's channels, or on `old release` / `unknown` / `unspecified`.
//!
//! ## Usage
//!
//! ```rust
//! use bz2db::bug::BugRecord;
//! use bz2db::train::{Channel, Classifier, ReleaseCalendar};
//!
//! let classifier = Classifier::new(ReleaseCalendar::firefox());
//!
//! let mut bug = BugRecord::new(1_234_567, "2016-06-06T08:00:00Z", "trunk");
//! classifier.annotate(&mut bug)?;
//!
//! assert_eq!(bug.release_channel(), Some(Channel::Nightly));
//! assert_eq!(bug.release_cycle(), Some(49));
//! # Ok::<(), bz2db::Error>(())
//! ```

mod calendar;
mod channel;
mod classifier;

pub use calendar::{ReleaseCalendar, ReleaseTrain};
pub use channel::Channel;
pub use classifier::{discovery_date, Classification, Classifier, VersionBranch};
