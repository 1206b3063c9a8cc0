/// Group the integer digits of an unsigned decimal string with commas.
fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567.891` → `1,234,567.89` (with `decimals` = 2).
pub fn format_thousands(v: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let negative = v < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Invoice total as shown on the metric card: `$25.00`, `$1,234.50`.
pub fn format_currency(v: f64) -> String {
    format!("${}", format_thousands(v, 2))
}

/// Axis tick label: no decimals for large magnitudes, trimmed decimals for
/// small ones.
pub fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 || v == v.trunc() {
        return format_thousands(v, 0);
    }
    let s = format_thousands(v, 2);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
