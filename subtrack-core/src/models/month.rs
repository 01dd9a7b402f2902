use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};

/// A calendar month, written and stored as zero-padded `YYYY-MM`.
///
/// Ordering is chronological, which for the zero-padded text form is also
/// lexical; the SQL filters rely on that when comparing `TEXT` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid YYYY-MM month")]
pub struct ParseYearMonthError(String);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Stored as TEXT; decoding re-validates so a malformed row fails the read.
impl Type<Postgres> for YearMonth {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for YearMonth {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

impl Encode<'_, Postgres> for YearMonth {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <String as Encode<Postgres>>::encode_by_ref(&self.to_string(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_months() {
        let ym: YearMonth = "2025-07".parse().unwrap();
        assert_eq!(ym.year(), 2025);
        assert_eq!(ym.month(), 7);
        assert_eq!(ym.to_string(), "2025-07");

        let ym: YearMonth = "0999-12".parse().unwrap();
        assert_eq!(ym.to_string(), "0999-12");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "", "2025", "2025-7", "25-07", "2025-13", "2025-00", "2025/07", "2025-07-01",
            "abcd-ef", "+202-07", "2025-+7",
        ] {
            assert!(raw.parse::<YearMonth>().is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec: YearMonth = "2024-12".parse().unwrap();
        let jan: YearMonth = "2025-01".parse().unwrap();
        let mar: YearMonth = "2025-03".parse().unwrap();

        assert!(dec < jan);
        assert!(jan < mar);
        assert!(dec.to_string() < jan.to_string());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let ym: YearMonth = "2025-04".parse().unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2025-04\"");

        let back: YearMonth = serde_json::from_str("\"2025-04\"").unwrap();
        assert_eq!(back, ym);

        assert!(serde_json::from_str::<YearMonth>("\"April\"").is_err());
    }
}
