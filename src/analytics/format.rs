//! Display formatting for dashboard values

use chrono::{DateTime, Utc};

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1247` → `"1,247"`
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// `129.99` → `"$129.99"`, `24891.5` → `"$24,891.50"`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        group_thousands(&(cents / 100).to_string()),
        cents % 100
    )
}

/// Currency rounded to whole units: `24891.49` → `"$24,891"`
pub fn format_currency_whole(value: f64) -> String {
    let units = value.abs().round() as u64;
    let sign = if value < 0.0 && units > 0 { "-" } else { "" };
    format!("{}${}", sign, format_count(units))
}

/// `32.4` → `"32%"`
pub fn format_percent(value: f64) -> String {
    format!("{}%", value.round() as i64)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Relative age such as "12 minutes ago" or "3 days ago"
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = elapsed.num_days();
    if days < 7 {
        return plural(days, "day");
    }
    if days < 30 {
        return plural(days / 7, "week");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    plural(days / 365, "year")
}
