//! Tracking numbers.
//!
//! Issued tracking numbers look like `BZ123456`. Lookups accept any short
//! alphanumeric string, since customers type whatever is on their label.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Prefix of every tracking number issued by BeezeTrack.
pub const TRACKING_PREFIX: &str = "BZ";

/// Errors that can occur when parsing a [`TrackingNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingNumberError {
    /// The input is empty after trimming.
    #[error("tracking number is required")]
    Empty,
    /// The input is too long.
    #[error("tracking number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters other than ASCII letters and digits.
    #[error("tracking number may only contain letters and digits")]
    InvalidCharacter,
}

/// A user-facing delivery identifier.
///
/// Stored uppercased so `bz123456` and `BZ123456` refer to the same parcel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a tracking number typed by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or not ASCII alphanumeric.
    pub fn parse(s: &str) -> Result<Self, TrackingNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TrackingNumberError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TrackingNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TrackingNumberError::InvalidCharacter);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Generate a fresh `BZ` tracking number with six random digits.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let digits: u32 = rng.random_range(100_000..1_000_000);
        Self(format!("{TRACKING_PREFIX}{digits}"))
    }

    /// Whether this number has the issued `BZ<digits>` shape.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.0
            .strip_prefix(TRACKING_PREFIX)
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    /// Returns the tracking number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TrackingNumber {
    type Err = TrackingNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = TrackingNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TrackingNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TrackingNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TrackingNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_standard() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let tn = TrackingNumber::generate(&mut rng);
            assert!(tn.is_standard(), "{tn} should be standard");
            assert_eq!(tn.as_str().len(), 8);
        }
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let tn = TrackingNumber::parse(" bz123456 ").unwrap();
        assert_eq!(tn.as_str(), "BZ123456");
        assert!(tn.is_standard());
    }

    #[test]
    fn test_parse_accepts_non_standard_lookups() {
        let tn = TrackingNumber::parse("UNKNOWN123").unwrap();
        assert!(!tn.is_standard());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(TrackingNumber::parse("  "), Err(TrackingNumberError::Empty));
        assert_eq!(
            TrackingNumber::parse("BZ-123"),
            Err(TrackingNumberError::InvalidCharacter)
        );
        assert!(matches!(
            TrackingNumber::parse(&"9".repeat(40)),
            Err(TrackingNumberError::TooLong { .. })
        ));
    }

    #[test]
    fn test_prefix_only_is_not_standard() {
        assert!(!TrackingNumber::parse("BZ").unwrap().is_standard());
        assert!(!TrackingNumber::parse("BZ12A").unwrap().is_standard());
    }
}
