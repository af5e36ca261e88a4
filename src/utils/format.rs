//! Formatting helpers for dates, durations and sizes.
//!
//! All timestamps are Unix milliseconds interpreted as UTC.

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Broken-down UTC time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub year: i64,
    /// 1-based month.
    pub month: usize,
    /// 1-based day of month.
    pub day: i64,
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
    /// 0 = Sunday.
    pub weekday: usize,
}

impl CivilTime {
    pub fn from_ms(timestamp_ms: u64) -> Self {
        let secs = timestamp_ms / 1000;
        let days = secs / 86400;
        let mut year = 1970i64;
        let mut remaining_days = days as i64;

        loop {
            let days_in_year = if is_leap_year(year) { 366 } else { 365 };
            if remaining_days < days_in_year {
                break;
            }
            remaining_days -= days_in_year;
            year += 1;
        }

        let days_in_months: [i64; 12] = if is_leap_year(year) {
            [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
        } else {
            [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
        };

        let mut month = 1;
        for days_in_month in days_in_months {
            if remaining_days < days_in_month {
                break;
            }
            remaining_days -= days_in_month;
            month += 1;
        }

        Self {
            year,
            month,
            day: remaining_days + 1,
            hour: (secs % 86400) / 3600,
            minute: (secs % 3600) / 60,
            second: secs % 60,
            // 1970-01-01 was a Thursday
            weekday: ((days + 4) % 7) as usize,
        }
    }

    fn month_name(&self) -> &'static str {
        MONTHS[(self.month - 1) % 12]
    }

    fn weekday_name(&self) -> &'static str {
        WEEKDAYS[self.weekday % 7]
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// `date` output on Unix, e.g. `Sat Oct 18 09:05:00 UTC 2026`.
pub fn format_unix_date(timestamp_ms: u64) -> String {
    let t = CivilTime::from_ms(timestamp_ms);
    format!(
        "{} {} {:2} {:02}:{:02}:{:02} UTC {}",
        t.weekday_name(),
        t.month_name(),
        t.day,
        t.hour,
        t.minute,
        t.second,
        t.year
    )
}

/// `ls -l` timestamp column, e.g. `Oct 18 09:05`.
pub fn format_listing_date(timestamp_ms: u64) -> String {
    let t = CivilTime::from_ms(timestamp_ms);
    format!(
        "{} {:2} {:02}:{:02}",
        t.month_name(),
        t.day,
        t.hour,
        t.minute
    )
}

/// DOS listing timestamp, e.g. `10/18/2026  09:05 AM`.
pub fn format_dos_timestamp(timestamp_ms: u64) -> String {
    let t = CivilTime::from_ms(timestamp_ms);
    let (hour12, meridiem) = match t.hour {
        0 => (12, "AM"),
        h @ 1..=11 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    };
    format!(
        "{:02}/{:02}/{:04}  {:02}:{:02} {}",
        t.month, t.day, t.year, hour12, t.minute, meridiem
    )
}

/// DOS `date` output, e.g. `Sat 10/18/2026`.
pub fn format_dos_date(timestamp_ms: u64) -> String {
    let t = CivilTime::from_ms(timestamp_ms);
    format!(
        "{} {:02}/{:02}/{:04}",
        t.weekday_name(),
        t.month,
        t.day,
        t.year
    )
}

/// Wall-clock part only, e.g. `09:05:00`.
pub fn format_clock(timestamp_ms: u64) -> String {
    let t = CivilTime::from_ms(timestamp_ms);
    format!("{:02}:{:02}:{:02}", t.hour, t.minute, t.second)
}

/// `uptime`-style duration, e.g. `2 days, 3:04` or `12 min`.
pub fn format_uptime(elapsed_ms: u64) -> String {
    let total_minutes = elapsed_ms / 60_000;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let clock = if hours == 0 {
        format!("{} min", minutes)
    } else {
        format!("{}:{:02}", hours, minutes)
    };

    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// Group digits in thousands, e.g. `1234567` -> `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
