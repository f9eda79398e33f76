use chrono::{Datelike, NaiveDate};

/// One decimal, rounded half up: `7.666` -> `"7.7"`.
pub fn format_rating(rating: f64) -> String {
    if !rating.is_finite() {
        return "0.0".to_string();
    }
    format!("{:.1}", (rating * 10.0).round() / 10.0)
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        None | Some(0) => "N/A".to_string(),
        Some(m) => format!("{}h {}m", m / 60, m % 60),
    }
}

/// Compact USD, at most one fraction digit: `$1.5M`, `$250M`, `$2K`.
pub fn format_revenue(amount: u64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    if amount == 0 {
        return "N/A".to_string();
    }
    let value = amount as f64;
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        if value < *scale {
            continue;
        }
        let scaled = (value / scale * 10.0).round() / 10.0;
        // 999_999 rounds to 1000.0K, which reads as $1M.
        if scaled >= 1000.0 && i > 0 {
            let (bigger, bigger_suffix) = UNITS[i - 1];
            let bumped = (value / bigger * 10.0).round() / 10.0;
            return format!("${}{}", trim_fraction(bumped), bigger_suffix);
        }
        return format!("${}{}", trim_fraction(scaled), suffix);
    }
    format!("${}", amount)
}

fn trim_fraction(value: f64) -> String {
    let text = format!("{:.1}", value);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

/// Year part of a TMDB release date, or `"N/A"`.
pub fn release_year(date: Option<&str>) -> String {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return "N/A".to_string();
    };
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return parsed.year().to_string();
    }
    let prefix: String = date.chars().take(4).collect();
    if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix
    } else {
        "N/A".to_string()
    }
}
