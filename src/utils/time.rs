use jiff::{SignedDuration, Timestamp};
use serde::{Serialize, Serializer};
use std::fmt;

const WINDOWS_TO_UNIX_SECS: i64 = 11_644_473_600;
/// Days between the OLE automation epoch (1899-12-30) and the unix epoch.
const OLE_DATE_TO_UNIX_DAYS: f64 = 25_569.0;
const SECS_PER_DAY: f64 = 86_400.0;

/// Convert a FILETIME (100ns ticks since 1601-01-01 UTC) into a timestamp.
#[inline]
pub fn filetime_to_timestamp(filetime: u64) -> Option<Timestamp> {
    let secs = (filetime / 10_000_000) as i64 - WINDOWS_TO_UNIX_SECS;
    let nanos = ((filetime % 10_000_000) * 100) as i32;
    Timestamp::new(secs, nanos).ok()
}

/// Convert an OLE automation date (fractional days since 1899-12-30) into a timestamp.
///
/// For negative dates the fractional part still counts forward from midnight,
/// so `-1.25` is 1899-12-29 06:00.
pub fn ole_date_to_timestamp(days: f64) -> Option<Timestamp> {
    if !days.is_finite() {
        return None;
    }
    let whole = days.trunc();
    let fraction = (days - whole).abs();
    let secs = (whole - OLE_DATE_TO_UNIX_DAYS) * SECS_PER_DAY + fraction * SECS_PER_DAY;
    if secs.abs() > i64::MAX as f64 {
        return None;
    }
    let millis = (secs * 1000.0).round() as i64;
    Timestamp::from_millisecond(millis).ok()
}

/// A raw FILETIME value.
///
/// The raw tick count is kept because some properties (such as the total editing time of a
/// document) store a duration rather than a point in time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileTime(pub u64);

impl FileTime {
    pub fn ticks(&self) -> u64 {
        self.0
    }

    /// `None` for a zero value or one that is out of the representable range.
    pub fn timestamp(&self) -> Option<Timestamp> {
        if self.0 == 0 {
            return None;
        }
        filetime_to_timestamp(self.0)
    }

    /// Interpret the ticks as an elapsed duration.
    pub fn as_duration(&self) -> SignedDuration {
        let secs = (self.0 / 10_000_000) as i64;
        let nanos = ((self.0 % 10_000_000) * 100) as i32;
        SignedDuration::new(secs, nanos)
    }
}

impl fmt::Display for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp() {
            Some(ts) => write!(f, "{}", ts),
            None => write!(f, "{:#018x}", self.0),
        }
    }
}

impl Serialize for FileTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.timestamp() {
            Some(ts) => ts.serialize(serializer),
            None => serializer.serialize_u64(self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filetime_epochs() {
        assert_eq!(
            filetime_to_timestamp(116_444_736_000_000_000),
            Some(Timestamp::UNIX_EPOCH)
        );
        assert_eq!(FileTime(0).timestamp(), None);
        assert_eq!(
            FileTime(126_444_736_000_000_000).timestamp().unwrap().to_string(),
            "2001-09-09T01:46:40Z"
        );
    }

    #[test]
    fn test_filetime_as_duration() {
        // 90 minutes of editing.
        let ft = FileTime(90 * 60 * 10_000_000);
        assert_eq!(ft.as_duration(), SignedDuration::from_mins(90));
    }

    #[test]
    fn test_ole_dates() {
        assert_eq!(ole_date_to_timestamp(25_569.0), Some(Timestamp::UNIX_EPOCH));
        assert_eq!(
            ole_date_to_timestamp(25_569.5).unwrap(),
            Timestamp::from_second(43_200).unwrap()
        );
        assert_eq!(
            ole_date_to_timestamp(-1.25).unwrap().to_string(),
            "1899-12-29T06:00:00Z"
        );
        assert_eq!(ole_date_to_timestamp(f64::NAN), None);
    }
}
