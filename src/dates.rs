use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

pub const STRICT_DATE_FORMAT: &str = "%Y-%m-%d";

// Month-first before day-first for the ambiguous slash form.
const LENIENT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y"];
const LENIENT_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// 9999-12-31 in the 1900 date system.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn parse_strict(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), STRICT_DATE_FORMAT)
}

// Bulk import only. None means "no date", never an error.
pub fn parse_lenient(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    for fmt in LENIENT_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in LENIENT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(t).ok().map(|dt| dt.date_naive())
}

pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    // Excel counts a non-existent 1900-02-29 (serial 60).
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}
