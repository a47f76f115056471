use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use crate::error::AppError;

/// Computed slots start and end on these boundaries.
pub const SLOT_GRANULARITY_MINUTES: u32 = 30;
/// Shortest slot the platform will offer.
pub const MIN_SLOT_DURATION_MINUTES: u32 = 60;

const MINUTES_PER_DAY: u32 = 1440;

/// Half-open `[start, end)` range of minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinuteRange {
    pub start: u32,
    pub end: u32,
}

impl MinuteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start: naive_to_minutes(start), end: naive_to_minutes(end) }
    }

    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn start_time(&self) -> NaiveTime {
        minutes_to_naive(self.start)
    }

    pub fn end_time(&self) -> NaiveTime {
        minutes_to_naive(self.end)
    }
}

/// Parses `HH:MM` or `HH:MM:SS`; seconds are ignored.
pub fn time_to_minutes(time: &str) -> Result<u32, AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid time format: {}", time));

    let mut parts = time.trim().split(':');
    let hours: u32 = parts.next().and_then(|h| h.parse().ok()).ok_or_else(invalid)?;
    let minutes: u32 = parts.next().and_then(|m| m.parse().ok()).ok_or_else(invalid)?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight as zero-padded `HH:MM:00`.
pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}

pub fn parse_time(time: &str) -> Result<NaiveTime, AppError> {
    time_to_minutes(time).map(minutes_to_naive)
}

pub fn naive_to_minutes(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn minutes_to_naive(minutes: u32) -> NaiveTime {
    let minutes = minutes.min(MINUTES_PER_DAY - 1);
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

pub fn round_up_to_granularity(minutes: u32) -> u32 {
    minutes.div_ceil(SLOT_GRANULARITY_MINUTES) * SLOT_GRANULARITY_MINUTES
}

pub fn round_down_to_granularity(minutes: u32) -> u32 {
    (minutes / SLOT_GRANULARITY_MINUTES) * SLOT_GRANULARITY_MINUTES
}

/// Returns the parts of `free` not covered by any `busy` range.
/// `busy` must be sorted by start.
pub fn subtract_busy_from_free(free: MinuteRange, busy: &[MinuteRange]) -> Vec<MinuteRange> {
    let mut gaps = Vec::new();
    let mut cursor = free.start;

    for b in busy {
        if b.end <= cursor || b.start >= free.end {
            continue;
        }
        if b.start > cursor {
            gaps.push(MinuteRange::new(cursor, b.start));
        }
        cursor = cursor.max(b.end);
        if cursor >= free.end {
            break;
        }
    }

    if cursor < free.end {
        gaps.push(MinuteRange::new(cursor, free.end));
    }
    gaps
}

/// Snaps gaps inward to the granularity and drops those under the minimum duration.
pub fn bookable_gaps(gaps: &[MinuteRange]) -> Vec<MinuteRange> {
    gaps.iter()
        .filter_map(|gap| {
            let start = round_up_to_granularity(gap.start);
            let end = round_down_to_granularity(gap.end);
            (end > start && end - start >= MIN_SLOT_DURATION_MINUTES).then(|| MinuteRange::new(start, end))
        })
        .collect()
}

/// Resolves a venue-local wall-clock instant to UTC. Times skipped by a DST
/// transition resolve as if the offset had not changed.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: &str, end: &str) -> MinuteRange {
        MinuteRange::new(time_to_minutes(start).unwrap(), time_to_minutes(end).unwrap())
    }

    #[test]
    fn minutes_round_trip_for_whole_day() {
        for m in 0..MINUTES_PER_DAY {
            assert_eq!(time_to_minutes(&minutes_to_time(m)).unwrap(), m);
        }
    }

    #[test]
    fn parses_with_and_without_seconds() {
        assert_eq!(time_to_minutes("09:30").unwrap(), 570);
        assert_eq!(time_to_minutes("09:30:45").unwrap(), 570);
        assert_eq!(minutes_to_time(570), "09:30:00");
        assert!(time_to_minutes("25:00").is_err());
        assert!(time_to_minutes("nine").is_err());
    }

    #[test]
    fn rounding_snaps_to_half_hours() {
        assert_eq!(round_up_to_granularity(541), 570);
        assert_eq!(round_up_to_granularity(540), 540);
        assert_eq!(round_down_to_granularity(599), 570);
        assert_eq!(round_down_to_granularity(600), 600);
    }

    #[test]
    fn single_booking_splits_window() {
        let gaps = subtract_busy_from_free(r("09:00", "17:00"), &[r("12:00", "13:00")]);
        assert_eq!(gaps, vec![r("09:00", "12:00"), r("13:00", "17:00")]);
    }

    #[test]
    fn busy_outside_window_is_ignored() {
        let gaps = subtract_busy_from_free(r("09:00", "12:00"), &[r("07:00", "08:00"), r("13:00", "14:00")]);
        assert_eq!(gaps, vec![r("09:00", "12:00")]);
    }

    #[test]
    fn overlapping_busy_ranges_merge() {
        let gaps = subtract_busy_from_free(
            r("09:00", "17:00"),
            &[r("08:00", "10:00"), r("09:30", "11:00"), r("10:30", "12:00"), r("16:00", "18:00")],
        );
        assert_eq!(gaps, vec![r("12:00", "16:00")]);
    }

    #[test]
    fn fully_covered_window_has_no_gaps() {
        let gaps = subtract_busy_from_free(r("09:00", "10:00"), &[r("08:00", "11:00")]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn short_remainder_is_dropped() {
        let gaps = subtract_busy_from_free(r("09:00", "10:30"), &[r("09:00", "10:00")]);
        assert_eq!(gaps, vec![r("10:00", "10:30")]);
        assert!(bookable_gaps(&gaps).is_empty());
    }

    #[test]
    fn ragged_gaps_are_trimmed_to_clean_times() {
        let gaps = vec![r("09:10", "11:50"), r("13:15", "14:20")];
        assert_eq!(bookable_gaps(&gaps), vec![r("09:30", "11:30")]);
    }

    #[test]
    fn local_time_resolves_through_zone() {
        let tz: Tz = "America/Chicago".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let utc = local_to_utc(tz, date, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(utc.to_rfc3339(), "2026-01-15T15:00:00+00:00");
    }
}
