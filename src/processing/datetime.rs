//! Day-first date and date-time parsing.
//!
//! Audit exports write dates the British way (`03/05/2024` is 3 May). ISO dates
//! (`2024-05-03`) are still recognised by their four-digit leading year. Parsing never fails
//! loudly: callers get `None` and decide which sentinel to substitute.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const TEXTUAL_DATE_FORMATS: &[&str] =
    &["%d %B %Y", "%d %b %Y", "%d-%b-%Y", "%d %B %y", "%d %b %y"];
const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%H.%M",
    "%I:%M %p",
    "%I:%M:%S %p",
];

/// Parse a date written day-first (`dd/mm/yyyy`, `dd-mm-yy`, `dd.mm.yyyy`, `3 May 2024`) or as
/// ISO `yyyy-mm-dd`. A trailing time component is accepted and ignored.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_date(raw).or_else(|| date_time_splits(raw).find_map(|(date, _)| parse_date(date)))
}

/// Parse a day-first date followed by an optional time (`03/05/2024 14:35`,
/// `3 May 2024 2:35 PM`).
///
/// A date with no time component resolves to midnight.
pub fn parse_day_first_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(date) = parse_date(raw) {
        return Some(date.and_time(NaiveTime::MIN));
    }
    date_time_splits(raw)
        .find_map(|(date, time)| Some(parse_date(date)?.and_time(parse_time(time)?)))
}

/// The most recent Friday on or before `today` (`today` itself when it is a Friday).
pub fn most_recent_friday(today: NaiveDate) -> NaiveDate {
    let from_monday = i64::from(today.weekday().num_days_from_monday());
    let friday = i64::from(Weekday::Fri.num_days_from_monday());
    let days_back = (from_monday - friday).rem_euclid(7);
    today - Duration::days(days_back)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    TEXTUAL_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_numeric_date(raw))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Candidate `(date, time)` splits: at every whitespace run, left to right, then at an ISO `T`.
///
/// Textual dates contain spaces themselves, so the first split is not always the right one.
fn date_time_splits(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    let at_whitespace = raw
        .match_indices(char::is_whitespace)
        .map(move |(pos, _)| (raw[..pos].trim_end(), raw[pos..].trim_start()))
        .filter(|(date, time)| !date.is_empty() && !time.is_empty());
    let at_iso_t = raw
        .find('T')
        .filter(|&pos| pos >= 8)
        .map(|pos| (&raw[..pos], &raw[pos + 1..]));
    at_whitespace.chain(at_iso_t)
}

fn parse_numeric_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['/', '-', '.']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if ![a, b, c].iter().all(|p| !p.is_empty() && p.bytes().all(|ch| ch.is_ascii_digit())) {
        return None;
    }

    let (year, month, day) = if a.len() == 4 {
        (a.parse::<i32>().ok()?, b.parse::<u32>().ok()?, c.parse::<u32>().ok()?)
    } else {
        let year = match c.len() {
            4 => c.parse::<i32>().ok()?,
            1 | 2 => expand_two_digit_year(c.parse::<i32>().ok()?),
            _ => return None,
        };
        (year, b.parse::<u32>().ok()?, a.parse::<u32>().ok()?)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_two_digit_year(yy: i32) -> i32 {
    if yy < 69 { 2000 + yy } else { 1900 + yy }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_first_numeric_dates() {
        assert_eq!(parse_day_first_date("03/05/2024"), Some(d(2024, 5, 3)));
        assert_eq!(parse_day_first_date("3-5-2024"), Some(d(2024, 5, 3)));
        assert_eq!(parse_day_first_date("03.05.24"), Some(d(2024, 5, 3)));
        assert_eq!(parse_day_first_date("31/12/99"), Some(d(1999, 12, 31)));
    }

    #[test]
    fn iso_dates_keep_year_first() {
        assert_eq!(parse_day_first_date("2024-05-03"), Some(d(2024, 5, 3)));
        assert_eq!(
            parse_day_first_date("2024-05-03 00:00:00"),
            Some(d(2024, 5, 3))
        );
        assert_eq!(
            parse_day_first_date("2024-05-03T10:00:00"),
            Some(d(2024, 5, 3))
        );
    }

    #[test]
    fn textual_month_dates() {
        assert_eq!(parse_day_first_date("3 May 2024"), Some(d(2024, 5, 3)));
        assert_eq!(parse_day_first_date("03 Sep 2024"), Some(d(2024, 9, 3)));
    }

    #[test]
    fn garbage_dates_are_none() {
        assert_eq!(parse_day_first_date(""), None);
        assert_eq!(parse_day_first_date("nan"), None);
        assert_eq!(parse_day_first_date("32/01/2024"), None);
        assert_eq!(parse_day_first_date("01/13/2024"), None);
        assert_eq!(parse_day_first_date("1/2"), None);
    }

    #[test]
    fn datetimes_with_and_without_seconds() {
        let expected = d(2024, 5, 3).and_hms_opt(14, 35, 0).unwrap();
        assert_eq!(parse_day_first_datetime("03/05/2024 14:35"), Some(expected));
        assert_eq!(parse_day_first_datetime("03/05/2024 14:35:00"), Some(expected));
        assert_eq!(parse_day_first_datetime("03/05/2024 2:35 PM"), Some(expected));
        assert_eq!(
            parse_day_first_datetime("03/05/2024"),
            Some(d(2024, 5, 3).and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_day_first_datetime("03/05/2024 lunchtime"), None);
    }

    #[test]
    fn textual_month_dates_with_times() {
        let expected = d(2024, 5, 3).and_hms_opt(14, 35, 0).unwrap();
        assert_eq!(parse_day_first_datetime("3 May 2024 14:35"), Some(expected));
        assert_eq!(parse_day_first_datetime("03 May 2024  2:35 PM"), Some(expected));
        assert_eq!(parse_day_first_datetime("03-May-2024 14:35"), Some(expected));
        assert_eq!(parse_day_first_date("3 May 2024 10:00"), Some(d(2024, 5, 3)));
        assert_eq!(parse_day_first_datetime("3 May 2024 teatime"), None);
    }

    #[test]
    fn most_recent_friday_for_every_weekday() {
        // 2024-05-03 is a Friday.
        let friday = d(2024, 5, 3);
        for offset in 0..7 {
            let today = friday + Duration::days(offset);
            assert_eq!(most_recent_friday(today), friday, "today={today}");
        }
        assert_eq!(most_recent_friday(d(2024, 5, 2)), d(2024, 4, 26));
    }
}
