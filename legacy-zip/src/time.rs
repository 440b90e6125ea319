//! MS-DOS date and time fields.
//!
//! DOS timestamps have no time zone, two-second resolution and cover the
//! years 1980 through 2107. Values outside that range are clamped.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// A packed MS-DOS `(time, date)` pair as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    /// Bits 0-4 seconds/2, 5-10 minutes, 11-15 hours.
    pub time: u16,
    /// Bits 0-4 day, 5-8 month, 9-15 years since 1980.
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable value.
    pub const MIN: DosDateTime = DosDateTime { time: 0, date: (1 << 5) | 1 };

    /// 2107-12-31 23:59:58, the latest representable value.
    pub const MAX: DosDateTime = DosDateTime {
        time: (23 << 11) | (59 << 5) | 29,
        date: (127 << 9) | (12 << 5) | 31,
    };

    /// Create from raw header fields.
    pub fn from_parts(time: u16, date: u16) -> Self {
        DosDateTime { time, date }
    }

    /// Pack a wall-clock time, clamping to the representable range.
    pub fn from_naive(at: &NaiveDateTime) -> Self {
        if at.year() < 1980 {
            return Self::MIN;
        }
        if at.year() > 2107 {
            return Self::MAX;
        }

        let date = (((at.year() - 1980) as u16) << 9) | ((at.month() as u16) << 5) | at.day() as u16;
        // Leap seconds report 60; fold them into 59
        let seconds = at.second().min(59);
        let time = ((at.hour() as u16) << 11) | ((at.minute() as u16) << 5) | (seconds / 2) as u16;

        DosDateTime { time, date }
    }

    /// Unpack into a wall-clock time.
    ///
    /// Returns `None` when the fields do not form a valid date, which happens
    /// with archives written by tools that leave them zeroed.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let year = 1980 + i32::from(self.date >> 9);
        let month = u32::from((self.date >> 5) & 0x0f);
        let day = u32::from(self.date & 0x1f);
        let hour = u32::from(self.time >> 11);
        let minute = u32::from((self.time >> 5) & 0x3f);
        let second = u32::from(self.time & 0x1f) * 2;

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::MIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[rstest]
    #[case(naive(1980, 1, 1, 0, 0, 0), 0x0000, 0x0021)]
    #[case(naive(2023, 9, 15, 14, 30, 10), 0x73c5, 0x572f)]
    #[case(naive(2107, 12, 31, 23, 59, 58), 0xbf7d, 0xff9f)]
    fn test_pack_known_values(#[case] at: NaiveDateTime, #[case] time: u16, #[case] date: u16) {
        assert_eq!(DosDateTime::from_naive(&at), DosDateTime { time, date });
    }

    #[rstest]
    #[case(naive(1970, 1, 1, 0, 0, 0), DosDateTime::MIN)]
    #[case(naive(1979, 12, 31, 23, 59, 59), DosDateTime::MIN)]
    #[case(naive(2200, 6, 1, 12, 0, 0), DosDateTime::MAX)]
    fn test_clamps_out_of_range(#[case] at: NaiveDateTime, #[case] expected: DosDateTime) {
        assert_eq!(DosDateTime::from_naive(&at), expected);
    }

    #[test]
    fn test_two_second_resolution() {
        let packed = DosDateTime::from_naive(&naive(2024, 2, 29, 8, 15, 31));
        assert_eq!(packed.to_naive(), Some(naive(2024, 2, 29, 8, 15, 30)));
    }

    #[test]
    fn test_zeroed_fields_are_invalid() {
        assert_eq!(DosDateTime::from_parts(0, 0).to_naive(), None);
        assert_eq!(DosDateTime::MIN.to_naive(), Some(naive(1980, 1, 1, 0, 0, 0)));
    }
}
