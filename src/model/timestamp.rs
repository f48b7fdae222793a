use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

const MONTH_BITS: u32 = 4;
const MONTH_MASK: u32 = (1 << MONTH_BITS) - 1;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Compact simulation date: a year and a month packed into one `u32`.
///
/// Bit layout: `[year:28][month:4]`, month 1–12.
/// Natural `u32` ordering equals chronological ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "DateRepr", try_from = "DateRepr")]
pub struct SimDate(u32);

#[derive(Serialize, Deserialize)]
struct DateRepr {
    year: u32,
    month: u32,
}

impl From<SimDate> for DateRepr {
    fn from(date: SimDate) -> Self {
        DateRepr {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl TryFrom<DateRepr> for SimDate {
    type Error = SimError;

    fn try_from(repr: DateRepr) -> Result<Self, Self::Error> {
        SimDate::try_new(repr.year, repr.month)
    }
}

impl SimDate {
    /// Create a date from a year and a month (1–12).
    ///
    /// # Panics
    /// Panics if the month is out of range. Use `try_new` for external input.
    pub fn new(year: u32, month: u32) -> Self {
        assert!(
            (1..=MONTHS_PER_YEAR).contains(&month),
            "month out of range: {month}"
        );
        Self((year << MONTH_BITS) | month)
    }

    pub fn try_new(year: u32, month: u32) -> SimResult<Self> {
        if !(1..=MONTHS_PER_YEAR).contains(&month) {
            return Err(SimError::Validation(format!("month out of range: {month}")));
        }
        Ok(Self((year << MONTH_BITS) | month))
    }

    pub fn year(self) -> u32 {
        self.0 >> MONTH_BITS
    }

    pub fn month(self) -> u32 {
        self.0 & MONTH_MASK
    }

    /// Linear month count (`year * 12 + month`), used as the decision timestamp.
    pub fn ordinal(self) -> u32 {
        self.year() * MONTHS_PER_YEAR + self.month()
    }

    /// Whole months elapsed since `earlier`; zero if `earlier` is in the future.
    pub fn months_since(self, earlier: SimDate) -> u32 {
        self.ordinal().saturating_sub(earlier.ordinal())
    }

    pub fn next_month(self) -> Self {
        if self.month() == MONTHS_PER_YEAR {
            Self::new(self.year() + 1, 1)
        } else {
            Self::new(self.year(), self.month() + 1)
        }
    }
}

impl Default for SimDate {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl fmt::Display for SimDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{}.M{}", self.year(), self.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks() {
        let d = SimDate::new(1450, 9);
        assert_eq!(d.year(), 1450);
        assert_eq!(d.month(), 9);
    }

    #[test]
    fn ordering_is_chronological() {
        assert!(SimDate::new(1450, 12) < SimDate::new(1451, 1));
        assert!(SimDate::new(1450, 2) < SimDate::new(1450, 3));
    }

    #[test]
    fn ordinal_matches_year_times_twelve_plus_month() {
        assert_eq!(SimDate::new(100, 5).ordinal(), 1205);
    }

    #[test]
    fn next_month_rolls_over_year() {
        assert_eq!(SimDate::new(1450, 12).next_month(), SimDate::new(1451, 1));
        assert_eq!(SimDate::new(1450, 3).next_month(), SimDate::new(1450, 4));
    }

    #[test]
    fn months_since_saturates() {
        let a = SimDate::new(1450, 1);
        let b = SimDate::new(1451, 3);
        assert_eq!(b.months_since(a), 14);
        assert_eq!(a.months_since(b), 0);
    }

    #[test]
    fn try_new_rejects_month_zero() {
        assert!(SimDate::try_new(1450, 0).is_err());
        assert!(SimDate::try_new(1450, 13).is_err());
    }

    #[test]
    fn serializes_as_year_and_month() {
        let json = serde_json::to_value(SimDate::new(1450, 6)).unwrap();
        assert_eq!(json["year"], 1450);
        assert_eq!(json["month"], 6);
        let back: SimDate = serde_json::from_value(json).unwrap();
        assert_eq!(back, SimDate::new(1450, 6));
    }

    #[test]
    fn deserialize_rejects_bad_month() {
        let result: Result<SimDate, _> =
            serde_json::from_value(serde_json::json!({"year": 1, "month": 14}));
        assert!(result.is_err());
    }
}
