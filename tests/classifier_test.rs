//! Release-train classification against the Firefox calendar

use bz2db::train::{Channel, Classifier, ReleaseCalendar, ReleaseTrain};
use bz2db::{BugRecord, Error};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn firefox() -> Classifier {
    Classifier::new(ReleaseCalendar::firefox())
}

// ============================================================================
// find_discovery_train
// ============================================================================

#[test]
fn test_discovery_train_between_ship_dates() {
    let classifier = firefox();
    assert_eq!(
        classifier.find_discovery_train(date(2016, 6, 6)).unwrap(),
        (date(2016, 4, 26), 46)
    );
    assert_eq!(
        classifier.find_discovery_train(date(2016, 7, 15)).unwrap(),
        (date(2016, 6, 7), 47)
    );
}

#[test]
fn test_discovery_train_on_ship_date_is_that_train() {
    let classifier = firefox();
    for train in ReleaseCalendar::firefox().trains() {
        assert_eq!(
            classifier.find_discovery_train(train.train_date()).unwrap(),
            (train.train_date(), train.release())
        );
    }
}

#[test]
fn test_discovery_train_after_last_ship_date() {
    let classifier = firefox();
    assert_eq!(
        classifier.find_discovery_train(date(2030, 1, 1)).unwrap(),
        (date(2017, 1, 24), 51)
    );
}

#[test]
fn test_discovery_train_before_calendar_fails() {
    let err = firefox().find_discovery_train(date(2015, 3, 30)).unwrap_err();
    assert!(matches!(err, Error::NoApplicableTrain { date: d } if d == date(2015, 3, 30)));
}

// ============================================================================
// classify_channel
// ============================================================================

#[test]
fn test_channels_on_47_train() {
    let classifier = firefox();
    let train = date(2016, 6, 7);
    let expected = [
        (45, Channel::OldRelease),
        (46, Channel::OldRelease),
        (47, Channel::Release),
        (48, Channel::Beta),
        (49, Channel::Aurora),
        (50, Channel::Nightly),
        (51, Channel::Nightly),
    ];
    for (branch, channel) in expected {
        assert_eq!(
            classifier.classify_channel(train, branch).unwrap(),
            channel,
            "branch {branch}"
        );
    }
}

#[test]
fn test_channels_on_48_train() {
    let classifier = firefox();
    let train = date(2016, 8, 2);
    let expected = [
        (47, Channel::OldRelease),
        (48, Channel::Release),
        (49, Channel::Beta),
        (50, Channel::Aurora),
        (51, Channel::Nightly),
        (99, Channel::Nightly),
    ];
    for (branch, channel) in expected {
        assert_eq!(
            classifier.classify_channel(train, branch).unwrap(),
            channel,
            "branch {branch}"
        );
    }
}

#[test]
fn test_classify_channel_requires_exact_train_date() {
    let err = firefox().classify_channel(date(2016, 6, 8), 47).unwrap_err();
    assert!(matches!(err, Error::UnknownTrain(_)));
}

#[test]
fn test_irregular_train_gap_is_an_error() {
    let train_date = date(2020, 1, 1);
    let calendar =
        ReleaseCalendar::from_trains([ReleaseTrain::with_cycles(train_date, 70, 72, 73, 74)])
            .unwrap();
    let classifier = Classifier::new(calendar);

    assert_eq!(classifier.classify_channel(train_date, 69).unwrap(), Channel::OldRelease);
    assert_eq!(classifier.classify_channel(train_date, 72).unwrap(), Channel::Beta);
    assert_eq!(classifier.classify_channel(train_date, 75).unwrap(), Channel::Nightly);

    let err = classifier.classify_channel(train_date, 71).unwrap_err();
    assert!(matches!(
        err,
        Error::UnrecognizedChannelOffset { branch: 71, .. }
    ));
}

// ============================================================================
// annotate
// ============================================================================

fn annotate(created: &str, version: &str) -> BugRecord {
    let mut bug = BugRecord::new(1, created, version);
    firefox().annotate(&mut bug).unwrap();
    bug
}

#[test]
fn test_annotate_day_before_47_ships() {
    let created = "2016-06-06T12:00:00Z";
    let cases = [
        ("Firefox 47", Channel::Unknown, 46),
        ("47 branch", Channel::Beta, 47),
        ("48 Branch", Channel::Aurora, 48),
        ("trunk", Channel::Nightly, 49),
        ("unspecified", Channel::Unspecified, 46),
        ("46 branch", Channel::Release, 46),
        ("45 branch", Channel::OldRelease, 46),
    ];
    for (version, channel, cycle) in cases {
        let bug = annotate(created, version);
        assert_eq!(bug.release_channel(), Some(channel), "version {version:?}");
        assert_eq!(bug.release_cycle(), Some(cycle), "version {version:?}");
    }
}

#[test]
fn test_annotate_around_48_ship_date() {
    let before = annotate("2016-08-01T23:59:59Z", "48 branch");
    assert_eq!(before.release_channel(), Some(Channel::Beta));
    assert_eq!(before.release_cycle(), Some(48));

    let on = annotate("2016-08-02T00:00:00Z", "48 branch");
    assert_eq!(on.release_channel(), Some(Channel::Release));
    assert_eq!(on.release_cycle(), Some(48));

    let after = annotate("2016-08-03T08:00:00Z", "trunk");
    assert_eq!(after.release_channel(), Some(Channel::Nightly));
    assert_eq!(after.release_cycle(), Some(51));
}

#[test]
fn test_annotate_keeps_other_fields() {
    let mut bug = BugRecord::builder(7, "2016-06-06", "trunk")
        .field("status", "NEW")
        .build();
    firefox().annotate(&mut bug).unwrap();

    assert_eq!(bug.field("status"), Some(&serde_json::json!("NEW")));
    assert_eq!(bug.version(), "trunk");
}

#[test]
fn test_annotate_failure_leaves_record_unchanged() {
    let mut bug = BugRecord::new(1, "2014-01-01T00:00:00Z", "trunk");
    let err = firefox().annotate(&mut bug).unwrap_err();

    assert!(matches!(err, Error::NoApplicableTrain { .. }));
    assert_eq!(bug.release_channel(), None);
    assert_eq!(bug.release_cycle(), None);
}

#[test]
fn test_annotate_rejects_undated_creation_time() {
    let mut bug = BugRecord::new(1, "06/06/2016", "trunk");
    let err = firefox().annotate(&mut bug).unwrap_err();
    assert!(matches!(err, Error::InvalidCreationTime(_)));
}

#[test]
fn test_custom_calendar_from_json() {
    let calendar =
        ReleaseCalendar::from_json(r#"{"2016-06-07": 47, "2016-08-02": 48}"#).unwrap();
    let classifier = Classifier::new(calendar);

    let result = classifier.classify("2016-07-01", "50 branch").unwrap();
    assert_eq!(result.train_date, date(2016, 6, 7));
    assert_eq!(result.channel, Channel::Nightly);
    assert_eq!(result.release_cycle, 50);

    assert!(classifier.classify("2016-06-06", "trunk").is_err());
}
