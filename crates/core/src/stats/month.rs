//! Calendar month keys (`YYYY-MM`, UTC).

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// Month bucket key for a point in time.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Month bucket key for now.
pub fn current_month() -> String {
    month_key(Utc::now())
}

/// The current month followed by the `retain_months` months before it, newest first.
pub fn retained_month_keys(now: DateTime<Utc>, retain_months: u32) -> Vec<String> {
    let Some(first_of_month) = NaiveDate::from_ymd_opt(now.year(), now.month(), 1) else {
        return vec![month_key(now)];
    };

    (0..=retain_months)
        .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
        .map(|date| date.format("%Y-%m").to_string())
        .collect()
}
