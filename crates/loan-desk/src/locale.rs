//! Persian (fa-IR) rendering of amounts and dates for history and catalog views.

use chrono::{DateTime, Datelike, NaiveDate};

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const GROUP_SEPARATOR: char = '٬';
const DECIMAL_SEPARATOR: char = '٫';
const MINUS: &str = "\u{200e}\u{2212}";
const MAX_FRACTION_DIGITS: usize = 3;

/// Replace ASCII digits with their Persian forms, leaving everything else intact.
pub fn to_persian_digits(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_digit() {
                PERSIAN_DIGITS[usize::from(c as u8 - b'0')]
            } else {
                c
            }
        })
        .collect()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(c);
    }
    grouped
}

/// Format with grouping and at most three fraction digits, like `Intl.NumberFormat("fa-IR")`.
pub fn format_persian_number(value: f64) -> String {
    if value.is_nan() {
        return "ناعدد".to_string();
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { MINUS } else { "" };
        return format!("{sign}∞");
    }

    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut rendered = group_thousands(whole);
    if !fraction.is_empty() {
        rendered.push(DECIMAL_SEPARATOR);
        rendered.push_str(fraction);
    }

    let is_zero = whole.chars().all(|c| c == '0') && fraction.is_empty();
    let sign = if value < 0.0 && !is_zero { MINUS } else { "" };
    format!("{sign}{}", to_persian_digits(&rendered))
}

/// Solar Hijri (Jalali) year, month and day for a Gregorian date.
pub fn to_jalali(date: NaiveDate) -> (i32, u32, u32) {
    const CUMULATIVE_DAYS: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

    let gy = i64::from(date.year());
    let gm = date.month() as usize;
    let gd = i64::from(date.day());

    let leap_year = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (leap_year + 3) / 4 - (leap_year + 99) / 100
        + (leap_year + 399) / 400
        + gd
        + CUMULATIVE_DAYS[gm - 1];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    (jy as i32, jm as u32, jd as u32)
}

pub fn persian_date(date: NaiveDate) -> String {
    let (year, month, day) = to_jalali(date);
    to_persian_digits(&format!("{year}/{month:02}/{day:02}"))
}

/// Render an RFC 3339 timestamp or `YYYY-MM-DD` date as a Jalali `yyyy/mm/dd` string.
/// Timestamps are read in UTC.
pub fn format_persian_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let date = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc().date())
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .ok()?;
    Some(persian_date(date))
}
