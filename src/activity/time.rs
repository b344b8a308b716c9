use crate::warehouse::TimeRow;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// UTC start time of an event timestamp in milliseconds since the epoch.
pub fn start_time_from_millis(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.naive_utc())
}

impl TimeRow {
    pub fn from_start_time(start_time: NaiveDateTime) -> Self {
        TimeRow {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        }
    }

    pub fn from_millis(ts: i64) -> Option<Self> {
        start_time_from_millis(ts).map(Self::from_start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn breaks_down_event_timestamp() {
        let row = TimeRow::from_millis(1541105830796).unwrap();

        let expected_start = NaiveDate::from_ymd_opt(2018, 11, 1)
            .unwrap()
            .and_hms_milli_opt(20, 57, 10, 796)
            .unwrap();
        assert_eq!(row.start_time, expected_start);
        assert_eq!(row.hour, 20);
        assert_eq!(row.day, 1);
        assert_eq!(row.week, 44);
        assert_eq!(row.month, 11);
        assert_eq!(row.year, 2018);
        assert_eq!(row.weekday, 3);
    }

    #[test]
    fn week_follows_iso_rules_at_year_boundary() {
        // 2018-12-31 is a Monday in ISO week 1 of 2019
        let ts = NaiveDate::from_ymd_opt(2018, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let row = TimeRow::from_millis(ts).unwrap();
        assert_eq!(row.week, 1);
        assert_eq!(row.year, 2018);
        assert_eq!(row.weekday, 0);
    }

    #[test]
    fn epoch_is_a_thursday() {
        let row = TimeRow::from_millis(0).unwrap();
        assert_eq!(row.year, 1970);
        assert_eq!(row.weekday, 3);
    }

    #[test]
    fn out_of_range_timestamp_has_no_row() {
        assert!(TimeRow::from_millis(i64::MAX).is_none());
    }
}
