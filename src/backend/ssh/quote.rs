//! POSIX shell quoting for command arguments.

/// Quote `value` only when it contains characters outside the safe set.
///
/// The safe set is ASCII alphanumerics plus `-_./:@%+=,`. An empty string is
/// quoted so that it survives word splitting.
#[must_use]
pub fn quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,".contains(c));
    if safe {
        String::from(value)
    } else {
        single_quote(value)
    }
}

/// Wrap `value` in single quotes unconditionally.
///
/// Embedded single quotes become `'\''`.
#[must_use]
pub fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
