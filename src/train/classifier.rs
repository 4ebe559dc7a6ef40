//! Per-bug release classification

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::{Channel, ReleaseCalendar};
use crate::bug::BugRecord;
use crate::{Error, Result};

/// Two digits followed by " branch", anchored at the start only.
fn branch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{2}) branch").expect("branch pattern compiles"))
}

/// What a bug's `version` field says about the branch it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBranch {
    /// `trunk`
    Trunk,
    /// `unspecified`
    Unspecified,
    /// `NN branch...`
    Branch(u32),
    /// Anything else
    Unrecognized,
}

impl VersionBranch {
    /// Parse a version string, ignoring case.
    ///
    /// ```
    /// use bz2db::train::VersionBranch;
    ///
    /// assert_eq!(VersionBranch::parse("47 Branch"), VersionBranch::Branch(47));
    /// assert_eq!(VersionBranch::parse("Trunk"), VersionBranch::Trunk);
    /// assert_eq!(VersionBranch::parse("branch 47"), VersionBranch::Unrecognized);
    /// ```
    #[must_use]
    pub fn parse(version: &str) -> Self {
        let version = version.to_lowercase();
        match version.as_str() {
            "trunk" => Self::Trunk,
            "unspecified" => Self::Unspecified,
            other => branch_pattern()
                .captures(other)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
                .map_or(Self::Unrecognized, Self::Branch),
        }
    }
}

/// Result of classifying one bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Train in effect on the bug's creation date
    pub train_date: NaiveDate,
    /// Cycle the bug is attributed to
    pub release_cycle: u32,
    /// Channel the bug was reported against
    pub channel: Channel,
}

/// Calendar date a bug was discovered on: the first ten characters of its
/// `creation_time`.
///
/// # Errors
///
/// Returns [`Error::InvalidCreationTime`] if those characters are not a
/// `YYYY-MM-DD` date.
pub fn discovery_date(creation_time: &str) -> Result<NaiveDate> {
    let head = creation_time
        .char_indices()
        .nth(10)
        .map_or(creation_time, |(end, _)| &creation_time[..end]);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|_| Error::InvalidCreationTime(creation_time.to_string()))
}

/// Assigns release cycle and channel to bugs against a fixed calendar.
///
/// ## Example
///
/// ```rust
/// use bz2db::train::{Channel, Classifier, ReleaseCalendar};
///
/// let classifier = Classifier::new(ReleaseCalendar::firefox());
/// let result = classifier.classify("2016-06-06T10:00:00Z", "47 branch")?;
///
/// assert_eq!(result.channel, Channel::Beta);
/// assert_eq!(result.release_cycle, 47);
/// # Ok::<(), bz2db::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    calendar: ReleaseCalendar,
}

impl Classifier {
    /// Create a classifier over `calendar`.
    #[must_use]
    pub const fn new(calendar: ReleaseCalendar) -> Self {
        Self { calendar }
    }

    /// Calendar this classifier resolves against.
    #[must_use]
    pub const fn calendar(&self) -> &ReleaseCalendar {
        &self.calendar
    }

    /// See [`ReleaseCalendar::find_discovery_train`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoApplicableTrain`] if `as_of` precedes the calendar.
    pub fn find_discovery_train(&self, as_of: NaiveDate) -> Result<(NaiveDate, u32)> {
        self.calendar.find_discovery_train(as_of)
    }

    /// See [`ReleaseCalendar::classify_channel`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTrain`] or [`Error::UnrecognizedChannelOffset`].
    pub fn classify_channel(&self, train_date: NaiveDate, branch: u32) -> Result<Channel> {
        self.calendar.classify_channel(train_date, branch)
    }

    /// Classify a bug from its creation time and version string.
    ///
    /// The cycle is the train's number for the resolved channel; channels
    /// without a train slot (old release, unknown, unspecified) fall back to
    /// the release in effect on the creation date.
    ///
    /// # Errors
    ///
    /// Returns an error if the creation time has no date, the date precedes
    /// the calendar, or the branch number matches no channel slot.
    pub fn classify(&self, creation_time: &str, version: &str) -> Result<Classification> {
        let created = discovery_date(creation_time)?;
        let (train_date, current_release) = self.find_discovery_train(created)?;
        let train = self.calendar.train(train_date)?;

        let channel = match VersionBranch::parse(version) {
            VersionBranch::Trunk => Channel::Nightly,
            VersionBranch::Unspecified => Channel::Unspecified,
            VersionBranch::Branch(branch) => train.channel_of(branch)?,
            VersionBranch::Unrecognized => Channel::Unknown,
        };
        let release_cycle = train.cycle_for(channel).unwrap_or(current_release);

        debug!(%created, %train_date, version, %channel, release_cycle, "classified bug");

        Ok(Classification {
            train_date,
            release_cycle,
            channel,
        })
    }

    /// Set `release_cycle` and `release_channel` on `bug`.
    ///
    /// Leaves the record untouched on error.
    ///
    /// # Errors
    ///
    /// See [`classify`](Self::classify).
    pub fn annotate(&self, bug: &mut BugRecord) -> Result<Classification> {
        let classification = self.classify(bug.creation_time(), bug.version())?;
        bug.set_release(classification.release_cycle, classification.channel);
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_version_branch_parse() {
        assert_eq!(VersionBranch::parse("trunk"), VersionBranch::Trunk);
        assert_eq!(VersionBranch::parse("TRUNK"), VersionBranch::Trunk);
        assert_eq!(VersionBranch::parse("Unspecified"), VersionBranch::Unspecified);
        assert_eq!(VersionBranch::parse("47 branch"), VersionBranch::Branch(47));
        assert_eq!(VersionBranch::parse("47 branch (esr)"), VersionBranch::Branch(47));
        assert_eq!(VersionBranch::parse("trunk "), VersionBranch::Unrecognized);
        assert_eq!(VersionBranch::parse("470 branch"), VersionBranch::Unrecognized);
        assert_eq!(VersionBranch::parse("7 branch"), VersionBranch::Unrecognized);
        assert_eq!(VersionBranch::parse(" 47 branch"), VersionBranch::Unrecognized);
        assert_eq!(VersionBranch::parse("Firefox 47"), VersionBranch::Unrecognized);
        assert_eq!(VersionBranch::parse(""), VersionBranch::Unrecognized);
    }

    #[test]
    fn test_discovery_date() {
        assert_eq!(
            discovery_date("2016-06-06T12:34:56Z").unwrap(),
            date(2016, 6, 6)
        );
        assert_eq!(discovery_date("2016-06-06").unwrap(), date(2016, 6, 6));
        assert!(matches!(
            discovery_date("06/06/2016"),
            Err(Error::InvalidCreationTime(_))
        ));
        assert!(discovery_date("").is_err());
    }

    #[test]
    fn test_classify_unknown_version_uses_current_release() {
        let classifier = Classifier::default();
        let result = classifier.classify("2016-06-06", "blablabla").unwrap();
        assert_eq!(result.channel, Channel::Unknown);
        assert_eq!(result.release_cycle, 46);
        assert_eq!(result.train_date, date(2016, 4, 26));
    }

    #[test]
    fn test_classify_old_release_uses_current_release() {
        let classifier = Classifier::default();
        let result = classifier.classify("2016-06-06", "40 branch").unwrap();
        assert_eq!(result.channel, Channel::OldRelease);
        assert_eq!(result.release_cycle, 46);
    }

    #[test]
    fn test_classify_future_branch_is_nightly_of_train() {
        let classifier = Classifier::default();
        let result = classifier.classify("2016-06-06", "55 branch").unwrap();
        assert_eq!(result.channel, Channel::Nightly);
        assert_eq!(result.release_cycle, 49);
    }

    #[test]
    fn test_classify_before_calendar() {
        let classifier = Classifier::default();
        let err = classifier.classify("2014-01-01T00:00:00Z", "trunk").unwrap_err();
        assert!(matches!(err, Error::NoApplicableTrain { .. }));
    }

    #[test]
    fn test_annotate_leaves_record_untouched_on_error() {
        let classifier = Classifier::default();
        let mut bug = BugRecord::new(1, "not a date", "trunk");
        assert!(classifier.annotate(&mut bug).is_err());
        assert_eq!(bug.release_channel(), None);
        assert_eq!(bug.release_cycle(), None);
    }
}
