use crate::error::ValidationError;
use jiff::civil::{Date, ISOWeekDate, Weekday};
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Bookmark-count thresholds accepted by the aggregate views.
pub const ALLOWED_THRESHOLDS: [i64; 6] = [5, 10, 50, 100, 500, 1000];

const MIN_YEAR: i16 = 1970;
const MAX_YEAR: i16 = 9998;

/// Number of entries posted on one calendar day at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveCount {
    pub date: Date,
    pub count: u64,
}

/// A validated bookmark-count threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Threshold(i64);

impl Threshold {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if ALLOWED_THRESHOLDS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidThreshold(value))
        }
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Threshold {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Threshold> for i64 {
    fn from(value: Threshold) -> Self {
        value.0
    }
}

impl Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Year,
    Month,
    Week,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Year => "year",
            PeriodKind::Month => "month",
            PeriodKind::Week => "week",
        }
    }
}

/// A calendar year, month or ISO week that rankings are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankingPeriod {
    kind: PeriodKind,
    /// First day of the period.
    start: Date,
}

impl RankingPeriod {
    pub fn year(year: i16) -> Result<Self, ValidationError> {
        check_year(year)?;
        let start = Date::new(year, 1, 1).map_err(invalid_period)?;
        Ok(Self {
            kind: PeriodKind::Year,
            start,
        })
    }

    pub fn month(year: i16, month: i8) -> Result<Self, ValidationError> {
        check_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        let start = Date::new(year, month, 1).map_err(invalid_period)?;
        Ok(Self {
            kind: PeriodKind::Month,
            start,
        })
    }

    /// An ISO 8601 week; `year` is the ISO week-numbering year.
    pub fn week(year: i16, week: i8) -> Result<Self, ValidationError> {
        check_year(year)?;
        let start = ISOWeekDate::new(year, week, Weekday::Monday)
            .map_err(invalid_period)?
            .date();
        Ok(Self {
            kind: PeriodKind::Week,
            start,
        })
    }

    /// The period of the given kind that contains `date`.
    pub fn containing(kind: PeriodKind, date: Date) -> Result<Self, ValidationError> {
        match kind {
            PeriodKind::Year => Self::year(date.year()),
            PeriodKind::Month => Self::month(date.year(), date.month()),
            PeriodKind::Week => {
                let week = date.iso_week_date();
                Self::week(week.year(), week.week())
            }
        }
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn start(&self) -> Date {
        self.start
    }

    /// First day after the period.
    pub fn end(&self) -> Date {
        let span = match self.kind {
            PeriodKind::Year => 1.year(),
            PeriodKind::Month => 1.month(),
            PeriodKind::Week => 7.days(),
        };
        // Years are capped below the civil maximum, so this cannot overflow.
        self.start.checked_add(span).unwrap_or(Date::MAX)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end()
    }

    /// The `[start, end)` instants of the period in `tz`.
    pub fn range(&self, tz: &TimeZone) -> Result<(Timestamp, Timestamp), ValidationError> {
        let start = self
            .start
            .to_zoned(tz.clone())
            .map_err(invalid_period)?
            .timestamp();
        let end = self
            .end()
            .to_zoned(tz.clone())
            .map_err(invalid_period)?
            .timestamp();
        Ok((start, end))
    }
}

impl Display for RankingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            PeriodKind::Year => write!(f, "{:04}", self.start.year()),
            PeriodKind::Month => write!(f, "{:04}-{:02}", self.start.year(), self.start.month()),
            PeriodKind::Week => {
                let week = self.start.iso_week_date();
                write!(f, "{:04}-W{:02}", week.year(), week.week())
            }
        }
    }
}

fn check_year(year: i16) -> Result<(), ValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPeriod(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        )))
    }
}

fn invalid_period(err: jiff::Error) -> ValidationError {
    ValidationError::InvalidPeriod(err.to_string())
}
