use chrono::{DateTime, NaiveDate, NaiveTime};

/// 当日 00:00 UTC 的 Unix 秒
pub fn date_to_unix(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// 将 UTC 秒换算为交易所当地日历日期
pub fn unix_to_local_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_round_trip_with_offset() {
        let date = NaiveDate::from_ymd_opt(2016, 1, 11).unwrap();
        let ts = date_to_unix(date);
        assert_eq!(ts, 1_452_470_400);
        // 美东 09:30 开盘 = 14:30 UTC
        let open = ts + 14 * 3600 + 30 * 60;
        assert_eq!(unix_to_local_date(open, -5 * 3600), Some(date));
        // 04:00 UTC 在纽约仍是前一天
        assert_eq!(
            unix_to_local_date(ts + 4 * 3600, -5 * 3600),
            NaiveDate::from_ymd_opt(2016, 1, 10)
        );
    }
}
