use time_tz::Tz;

use crate::Error;

pub fn get_timezone(canonical_timezone: &str) -> Option<&'static Tz> {
    time_tz::timezones::get_by_name(canonical_timezone)
}

/// Like [get_timezone], but fails with [Error::InvalidTimezoneError] for
/// unknown timezone names.
pub fn require_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    get_timezone(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}
