/// Parse a cell as a finite number; surrounding spaces are ignored. Empty
/// cells are not numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer reading of a period cell (`"01"`, `" 2023 "`), if it has one.
pub fn parse_integer(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Canonical period keys: when every cell of the column reads as an integer
/// the column is rewritten as those integers (`"01"` and `"1"` both become
/// `"1"`). Any non-integer cell leaves the whole column untouched.
pub fn canonical_integers<'a, I>(cells: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    cells
        .into_iter()
        .map(|c| parse_integer(c).map(|i| i.to_string()))
        .collect()
}
