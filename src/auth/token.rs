//! The token stored in the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::UserID;

mod datetime_format {
    //! Serializes an [time::OffsetDateTime] with a fixed-width format.
    //!
    //! The default serializer writes midnight as "0:00:00.0", which the
    //! default deserializer then rejects because it expects two-digit hours.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies the owner of a request and when that identification lapses.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Whether the token is no longer valid at `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod token_tests {
    use time::{Duration, UtcOffset, macros::datetime};

    use crate::{UserID, auth::token::Token};

    #[test]
    fn token_survives_json_at_midnight() {
        let token = Token {
            user_id: UserID::new(3),
            expires_at: datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC),
        };

        let json = serde_json::to_string(&token).unwrap();
        let parsed: Token = serde_json::from_str(&json).unwrap();

        assert_eq!(
            json,
            r#"{"user_id":3,"expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#
        );
        assert_eq!(parsed, token);
    }

    #[test]
    fn token_expires_at_its_expiry() {
        let expires_at = datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC);
        let token = Token {
            user_id: UserID::new(1),
            expires_at,
        };

        assert!(!token.is_expired_at(expires_at - Duration::seconds(1)));
        assert!(token.is_expired_at(expires_at));
    }
}
