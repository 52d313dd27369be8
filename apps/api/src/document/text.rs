// Text helpers shared by editors, the bridge and the preview composer.

/// Trims an optional string; blank values collapse to `None`.
pub fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Splits a comma-separated list into trimmed, non-empty entries, preserving order.
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
