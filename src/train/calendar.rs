//! Release calendar: which train configuration was in effect on a date

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::Channel;
use crate::{Error, Result};

/// Firefox ship dates and the release that shipped on each.
const FIREFOX_SHIP_DATES: [((i32, u32, u32), u32); 15] = [
    ((2015, 3, 31), 37),
    ((2015, 5, 12), 38),
    ((2015, 6, 30), 39),
    ((2015, 8, 11), 40),
    ((2015, 9, 22), 41),
    ((2015, 11, 3), 42),
    ((2015, 12, 15), 43),
    ((2016, 1, 26), 44),
    ((2016, 3, 8), 45),
    ((2016, 4, 26), 46),
    ((2016, 6, 7), 47),
    ((2016, 8, 2), 48),
    ((2016, 9, 13), 49),
    ((2016, 11, 8), 50),
    ((2017, 1, 24), 51),
];

/// One ship date and the cycle number on each of the four channels that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTrain {
    train_date: NaiveDate,
    release: u32,
    beta: u32,
    aurora: u32,
    nightly: u32,
}

impl ReleaseTrain {
    /// Train shipping `release` on `train_date`, with the usual
    /// beta/aurora/nightly offsets of +1/+2/+3.
    #[must_use]
    pub const fn new(train_date: NaiveDate, release: u32) -> Self {
        Self {
            train_date,
            release,
            beta: release.saturating_add(1),
            aurora: release.saturating_add(2),
            nightly: release.saturating_add(3),
        }
    }

    /// Train with explicit cycle numbers for every channel.
    ///
    /// Lets callers model irregular calendars (skipped or merged cycles).
    #[must_use]
    pub const fn with_cycles(
        train_date: NaiveDate,
        release: u32,
        beta: u32,
        aurora: u32,
        nightly: u32,
    ) -> Self {
        Self {
            train_date,
            release,
            beta,
            aurora,
            nightly,
        }
    }

    /// Date this configuration took effect.
    #[must_use]
    pub const fn train_date(&self) -> NaiveDate {
        self.train_date
    }

    /// Cycle number shipping as release.
    #[must_use]
    pub const fn release(&self) -> u32 {
        self.release
    }

    /// Cycle number on beta.
    #[must_use]
    pub const fn beta(&self) -> u32 {
        self.beta
    }

    /// Cycle number on aurora.
    #[must_use]
    pub const fn aurora(&self) -> u32 {
        self.aurora
    }

    /// Cycle number on nightly.
    #[must_use]
    pub const fn nightly(&self) -> u32 {
        self.nightly
    }

    /// Cycle number of `channel` on this train, if it is one of the four slots.
    #[must_use]
    pub const fn cycle_for(&self, channel: Channel) -> Option<u32> {
        match channel {
            Channel::Release => Some(self.release),
            Channel::Beta => Some(self.beta),
            Channel::Aurora => Some(self.aurora),
            Channel::Nightly => Some(self.nightly),
            Channel::OldRelease | Channel::Unknown | Channel::Unspecified => None,
        }
    }

    /// Slots in fixed comparison order.
    const fn slots(&self) -> [(Channel, u32); 4] {
        [
            (Channel::Release, self.release),
            (Channel::Beta, self.beta),
            (Channel::Aurora, self.aurora),
            (Channel::Nightly, self.nightly),
        ]
    }

    fn min_cycle(&self) -> u32 {
        self.release.min(self.beta).min(self.aurora).min(self.nightly)
    }

    fn max_cycle(&self) -> u32 {
        self.release.max(self.beta).max(self.aurora).max(self.nightly)
    }

    /// Name the channel a branch number belongs to on this train.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedChannelOffset`] when `branch` lies within
    /// the train's range but matches none of its slots.
    pub fn channel_of(&self, branch: u32) -> Result<Channel> {
        if branch < self.min_cycle() {
            return Ok(Channel::OldRelease);
        }
        if branch > self.max_cycle() {
            return Ok(Channel::Nightly);
        }
        self.slots()
            .into_iter()
            .find_map(|(channel, cycle)| (cycle == branch).then_some(channel))
            .ok_or(Error::UnrecognizedChannelOffset {
                train_date: self.train_date,
                branch,
            })
    }
}

/// Immutable, date-ordered set of release trains.
///
/// Built once at startup and handed to the [`Classifier`](super::Classifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCalendar {
    trains: BTreeMap<NaiveDate, ReleaseTrain>,
}

impl ReleaseCalendar {
    /// Build a calendar from (ship date, release number) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCalendar`] if no dates are given or a date repeats.
    pub fn from_ship_dates<I>(ship_dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, u32)>,
    {
        Self::from_trains(
            ship_dates
                .into_iter()
                .map(|(date, release)| ReleaseTrain::new(date, release)),
        )
    }

    /// Build a calendar from fully specified trains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCalendar`] if no trains are given or a date repeats.
    pub fn from_trains<I>(trains: I) -> Result<Self>
    where
        I: IntoIterator<Item = ReleaseTrain>,
    {
        let mut map = BTreeMap::new();
        for train in trains {
            if map.insert(train.train_date(), train).is_some() {
                return Err(Error::InvalidCalendar(format!(
                    "train date {} appears more than once",
                    train.train_date()
                )));
            }
        }
        if map.is_empty() {
            return Err(Error::InvalidCalendar("calendar has no trains".to_string()));
        }
        Ok(Self { trains: map })
    }

    /// Firefox release calendar from 37 (2015-03-31) through 51 (2017-01-24).
    #[must_use]
    pub fn firefox() -> Self {
        let trains = FIREFOX_SHIP_DATES
            .iter()
            .filter_map(|&((y, m, d), release)| {
                NaiveDate::from_ymd_opt(y, m, d).map(|date| (date, ReleaseTrain::new(date, release)))
            })
            .collect();
        Self { trains }
    }

    /// Parse a JSON object mapping `YYYY-MM-DD` ship dates to release numbers.
    ///
    /// ```
    /// use bz2db::train::ReleaseCalendar;
    ///
    /// let calendar = ReleaseCalendar::from_json(r#"{"2016-06-07": 47, "2016-08-02": 48}"#)?;
    /// assert_eq!(calendar.len(), 2);
    /// # Ok::<(), bz2db::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not such an object, a key is not a
    /// date, or the calendar would be empty.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, u32> = serde_json::from_str(json)?;
        let ship_dates = raw
            .into_iter()
            .map(|(date, release)| {
                NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map(|date| (date, release))
                    .map_err(|e| Error::InvalidCalendar(format!("bad ship date {date:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_ship_dates(ship_dates)
    }

    /// Load a calendar document from disk (see [`from_json`](Self::from_json)).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Number of trains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trains.len()
    }

    /// Always false for a constructed calendar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    /// Trains in date order.
    pub fn trains(&self) -> impl Iterator<Item = &ReleaseTrain> {
        self.trains.values()
    }

    /// Train that took effect exactly on `train_date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTrain`] if no train is dated `train_date`.
    pub fn train(&self, train_date: NaiveDate) -> Result<&ReleaseTrain> {
        self.trains
            .get(&train_date)
            .ok_or(Error::UnknownTrain(train_date))
    }

    /// Latest train dated on or before `as_of`, as `(train_date, release)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoApplicableTrain`] if `as_of` precedes the first train.
    pub fn find_discovery_train(&self, as_of: NaiveDate) -> Result<(NaiveDate, u32)> {
        self.trains
            .range(..=as_of)
            .next_back()
            .map(|(date, train)| (*date, train.release()))
            .ok_or(Error::NoApplicableTrain { date: as_of })
    }

    /// Channel of `branch` on the train dated `train_date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTrain`] for a date not in the calendar and
    /// [`Error::UnrecognizedChannelOffset`] for an in-range branch with no slot.
    pub fn classify_channel(&self, train_date: NaiveDate, branch: u32) -> Result<Channel> {
        self.train(train_date)?.channel_of(branch)
    }
}

impl Default for ReleaseCalendar {
    fn default() -> Self {
        Self::firefox()
    }
}
