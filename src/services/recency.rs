use crate::domain::constants::FIELD_VARYDATE;
use crate::domain::models::{Record, Table};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

/// Epoch timestamps from the API are China Standard Time dates.
const CST_OFFSET_SECS: i32 = 8 * 3600;

/// Parse an event date as the API or a snapshot spells it.
///
/// Accepts `YYYY-MM-DD` (optionally followed by a time part), `YYYY/MM/DD`,
/// `YYYYMMDD`, and epoch seconds or milliseconds. Returns `None` for anything
/// else.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return match value.len() {
            8 => NaiveDate::parse_from_str(value, "%Y%m%d").ok(),
            10 => epoch_date(value.parse::<i64>().ok()?.checked_mul(1000)?),
            13 => epoch_date(value.parse::<i64>().ok()?),
            _ => None,
        };
    }

    let day = value
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

fn epoch_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(market_today)
}

/// Calendar date at `now` in China Standard Time, the calendar the API's
/// dates are written in. The recency window ends on this day regardless of
/// the host's timezone.
pub fn market_today(now: DateTime<Utc>) -> NaiveDate {
    FixedOffset::east_opt(CST_OFFSET_SECS)
        .map(|offset| now.with_timezone(&offset).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

/// True when the row's variation date lies in `[today - window_days, today]`.
pub fn is_recent(row: &Record, window_days: u32, today: NaiveDate) -> bool {
    let Some(date) = parse_event_date(row.field(FIELD_VARYDATE)) else {
        return false;
    };
    let start = today
        .checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    start <= date && date <= today
}

/// Rows of `table` whose variation date falls inside the trailing window.
/// Rows with a missing or unparseable date are dropped.
pub fn filter_recent(table: &Table, window_days: u32, today: NaiveDate) -> Table {
    table.retain_rows(|row| is_recent(row, window_days, today))
}
