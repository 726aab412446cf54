use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats a stored date string as `"<Month> <Year>"` (English month names).
///
/// Returns an empty string for absent, empty, or unparseable input.
pub fn format_date(date: Option<&str>) -> String {
    date.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_calendar_date)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default()
}

/// Accepts the date shapes resume data arrives in: full dates, timestamps,
/// year-month, and bare years.
fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(d);
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}
