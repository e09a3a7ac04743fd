use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Budget period key in `YYYY-MM` form. Lexicographic order is chronological,
/// which the monthly history view relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(String);

impl MonthKey {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidMonthKey(raw.to_string());

        let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        year.parse::<u16>().map_err(|_| invalid())?;
        let month_number = month.parse::<u8>().map_err(|_| invalid())?;
        if !(1..=12).contains(&month_number) {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y-%m").to_string())
    }

    /// Derives the key for the current wall-clock month.
    pub fn current() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable form, e.g. "January 2025".
    pub fn display_name(&self) -> String {
        let first_of_month = self
            .0
            .split_once('-')
            .and_then(|(year, month)| {
                let year = year.parse::<i32>().ok()?;
                let month = month.parse::<u32>().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1)
            })
            .unwrap_or_else(|| {
                NaiveDate::from_ymd_opt(Utc::now().year(), Utc::now().month(), 1)
                    .unwrap_or_default()
            });
        first_of_month.format("%B %Y").to_string()
    }
}

impl std::str::FromStr for MonthKey {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::MonthKey;
    use crate::errors::DomainError;

    #[test]
    fn parses_well_formed_keys() {
        let key = MonthKey::parse("2025-01").expect("valid key");
        assert_eq!(key.as_str(), "2025-01");
    }

    #[test]
    fn rejects_malformed_keys() {
        for raw in ["2025", "2025-13", "2025-00", "25-01", "2025-1", "January"] {
            let error = MonthKey::parse(raw).expect_err("should reject");
            assert!(matches!(error, DomainError::InvalidMonthKey(_)), "accepted `{raw}`");
        }
    }

    #[test]
    fn derives_key_from_datetime() {
        let at = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 0).unwrap();
        assert_eq!(MonthKey::from_datetime(at).as_str(), "2025-03");
    }

    #[test]
    fn lexicographic_order_is_chronological() {
        let december = MonthKey::parse("2024-12").expect("valid");
        let january = MonthKey::parse("2025-01").expect("valid");
        assert!(december < january);
    }

    #[test]
    fn display_name_renders_month_and_year() {
        let key = MonthKey::parse("2025-01").expect("valid");
        assert_eq!(key.display_name(), "January 2025");
    }
}
