//! Version expressions: parsed semantic versions and commit-derived pseudo-versions.

use std::cmp::Ordering;
use std::fmt;

use semver::Prerelease;
use time::OffsetDateTime;

use crate::error::{BpmError, Result};

/// A single point in the version ordering.
///
/// Either a normal semantic version (`v1.2.3`, `v2.0.0-rc.1`) or a
/// commit-derived pseudo-version minted when a caller supplies no tag.
/// The two are distinguished by `commit`, not by a separate enum, because
/// every other field (the `semver::Version` itself) is always present and
/// total ordering falls out of comparing it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    inner: semver::Version,
    commit: Option<CommitMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommitMeta {
    short_hash: String,
    timestamp: OffsetDateTime,
}

impl Version {
    /// Parses a version string with an optional leading `v`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.strip_prefix('v').unwrap_or(input);
        let inner = semver::Version::parse(trimmed)
            .map_err(|e| BpmError::BadVersion(format!("{input}: {e}")))?;
        let commit = if inner.major == 0 && inner.minor == 0 && inner.patch == 0 {
            parse_commit_pre(inner.pre.as_str())
        } else {
            None
        };
        Ok(Self { inner, commit })
    }

    /// Builds a commit-derived pseudo-version: `v0.0.0-<yyyymmddhhmmss>-<shorthash>`.
    pub fn from_commit(short_hash: &str, timestamp: OffsetDateTime) -> Self {
        let pre_str = format!("{}-{}", format_compact_timestamp(timestamp), short_hash);
        let pre = Prerelease::new(&pre_str).unwrap_or(Prerelease::EMPTY);
        Self {
            inner: semver::Version {
                major: 0,
                minor: 0,
                patch: 0,
                pre,
                build: semver::BuildMetadata::EMPTY,
            },
            commit: Some(CommitMeta {
                short_hash: short_hash.to_string(),
                timestamp,
            }),
        }
    }

    pub fn is_commit_derived(&self) -> bool {
        self.commit.is_some()
    }

    pub fn major(&self) -> u64 {
        self.inner.major
    }

    pub fn minor(&self) -> u64 {
        self.inner.minor
    }

    pub fn patch(&self) -> u64 {
        self.inner.patch
    }

    pub fn greater_than(&self, other: &Self) -> bool {
        self > other
    }

    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.inner)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner).then_with(|| {
            let a = self.commit.as_ref().map(|c| c.timestamp);
            let b = other.commit.as_ref().map(|c| c.timestamp);
            a.cmp(&b)
        })
    }
}

fn parse_commit_pre(pre: &str) -> Option<CommitMeta> {
    let (ts, hash) = pre.split_once('-')?;
    if ts.len() != 14 || !ts.bytes().all(|b| b.is_ascii_digit()) || hash.is_empty() {
        return None;
    }
    let timestamp = parse_compact_timestamp(ts)?;
    Some(CommitMeta {
        short_hash: hash.to_string(),
        timestamp,
    })
}

fn format_compact_timestamp(ts: OffsetDateTime) -> String {
    let ts = ts.to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

fn parse_compact_timestamp(ts: &str) -> Option<OffsetDateTime> {
    let year: i32 = ts[0..4].parse().ok()?;
    let month: u8 = ts[4..6].parse().ok()?;
    let day: u8 = ts[6..8].parse().ok()?;
    let hour: u8 = ts[8..10].parse().ok()?;
    let minute: u8 = ts[10..12].parse().ok()?;
    let second: u8 = ts[12..14].parse().ok()?;

    let month = time::Month::try_from(month).ok()?;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;
    let time = time::Time::from_hms(hour, minute, second).ok()?;
    Some(date.with_time(time).assume_utc())
}
