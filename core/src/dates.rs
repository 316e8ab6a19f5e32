//! Date and time formatting for display and for API parameters.
//!
//! All helpers render en-US text and return an empty string for missing or
//! unparsable input, so views can pass backend fields straight through.
//!
//! Date-only strings (`2024-01-05`) are calendar dates and never shift with
//! the local timezone. Timestamps carrying an offset are shown in local time;
//! naive timestamps are shown as-is.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// A value that can be read as a local wall-clock timestamp.
pub trait DateLike {
    fn to_local(&self) -> Option<NaiveDateTime>;
}

impl DateLike for str {
    fn to_local(&self) -> Option<NaiveDateTime> {
        let s = self.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date.and_time(NaiveTime::MIN));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Local).naive_local());
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    }
}

impl DateLike for String {
    fn to_local(&self) -> Option<NaiveDateTime> {
        self.as_str().to_local()
    }
}

impl DateLike for NaiveDate {
    fn to_local(&self) -> Option<NaiveDateTime> {
        Some(self.and_time(NaiveTime::MIN))
    }
}

impl DateLike for NaiveDateTime {
    fn to_local(&self) -> Option<NaiveDateTime> {
        Some(*self)
    }
}

impl<Tz: TimeZone> DateLike for DateTime<Tz> {
    fn to_local(&self) -> Option<NaiveDateTime> {
        Some(self.with_timezone(&Local).naive_local())
    }
}

impl<T: DateLike> DateLike for Option<T> {
    fn to_local(&self) -> Option<NaiveDateTime> {
        self.as_ref()?.to_local()
    }
}

/// Format with a custom `strftime` pattern.
pub fn format_date_with<D: DateLike + ?Sized>(date: &D, pattern: &str) -> String {
    match date.to_local() {
        Some(dt) => dt.format(pattern).to_string(),
        None => String::new(),
    }
}

/// `January 5, 2024`
pub fn format_date<D: DateLike + ?Sized>(date: &D) -> String {
    format_date_with(date, "%B %-d, %Y")
}

/// `January 5, 2024 at 03:07 PM`
pub fn format_date_time<D: DateLike + ?Sized>(date: &D) -> String {
    format_date_with(date, "%B %-d, %Y at %I:%M %p")
}

/// `01/05/2024`
pub fn format_short_date<D: DateLike + ?Sized>(date: &D) -> String {
    format_date_with(date, "%m/%d/%Y")
}

/// `03:07 PM`
pub fn format_time<D: DateLike + ?Sized>(date: &D) -> String {
    format_date_with(date, "%I:%M %p")
}

/// `2024-01-05`, the form the backend expects in query parameters.
pub fn format_date_for_api<D: DateLike + ?Sized>(date: &D) -> String {
    format_date_with(date, "%Y-%m-%d")
}
