//! Payroll period model.
//!
//! This module contains the [`PayrollMonth`] type: the calendar month a payroll
//! record belongs to and the month an adjustment corrects.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

/// A payroll processing month.
///
/// Serialized as `"YYYY-MM"` and displayed to people as `"January-2024"`.
/// Ordering is chronological.
///
/// # Example
///
/// ```
/// use adjustment_engine::models::PayrollMonth;
///
/// let month: PayrollMonth = "2024-01".parse().unwrap();
/// assert_eq!(month.year(), 2024);
/// assert_eq!(month.month(), 1);
/// assert_eq!(month.label(), "January-2024");
/// assert!(month < "2024-02".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayrollMonth {
    first_day: NaiveDate,
}

impl PayrollMonth {
    /// Creates a payroll month, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| EngineError::InvalidPeriod {
                value: format!("{}-{:02}", year, month),
            })
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The calendar month, 1-based.
    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Human-readable label, e.g. `"March-2025"`.
    pub fn label(&self) -> String {
        self.first_day.format("%B-%Y").to_string()
    }
}

impl fmt::Display for PayrollMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day.format("%Y-%m"))
    }
}

impl FromStr for PayrollMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(|first_day| Self { first_day })
            .map_err(|_| EngineError::InvalidPeriod {
                value: s.to_string(),
            })
    }
}

impl Serialize for PayrollMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PayrollMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_month_thirteen() {
        let result = PayrollMonth::new(2024, 13);
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let month: PayrollMonth = "2025-03".parse().unwrap();
        assert_eq!(month.to_string(), "2025-03");
        assert_eq!(month.label(), "March-2025");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("March".parse::<PayrollMonth>().is_err());
        assert!("2025-00".parse::<PayrollMonth>().is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec_2023 = PayrollMonth::new(2023, 12).unwrap();
        let jan_2024 = PayrollMonth::new(2024, 1).unwrap();
        assert!(dec_2023 < jan_2024);
    }

    #[test]
    fn test_first_day() {
        let month = PayrollMonth::new(2024, 2).unwrap();
        assert_eq!(
            month.first_day(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_serialize_as_string() {
        let month = PayrollMonth::new(2024, 7).unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2024-07\"");
    }

    #[test]
    fn test_deserialize_invalid_string_fails() {
        let result: Result<PayrollMonth, _> = serde_json::from_str("\"2024-99\"");
        assert!(result.is_err());
    }
}
