/// Format an integer salary with space-separated thousands groups.
///
/// # Examples
///
/// ```
/// use vacancy_core::formatting::format_salary;
///
/// assert_eq!(format_salary(47_500), "47 500");
/// assert_eq!(format_salary(1_234_567), "1 234 567");
/// assert_eq!(format_salary(0), "0");
/// assert_eq!(format_salary(-9_876), "-9 876");
/// ```
pub fn format_salary(value: i64) -> String {
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format a vacancy count with space-separated thousands groups.
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a population share (`0.0..=1.0`) as a percentage with two
/// decimals.
///
/// # Examples
///
/// ```
/// use vacancy_core::formatting::format_share;
///
/// assert_eq!(format_share(0.1234), "12.34%");
/// assert_eq!(format_share(1.0), "100.00%");
/// assert_eq!(format_share(0.01), "1.00%");
/// ```
pub fn format_share(share: f64) -> String {
    format!("{:.2}%", percentage(share, 1.0, 2))
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Insert a space every three digits from the right of a digit string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(' ');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
