//! Dotted path helpers
//!
//! The separator only has meaning at the accessor boundary. Stored child keys
//! never contain it.

/// Hierarchy separator used when addressing nested nodes.
pub const SEPARATOR: char = '.';

/// Split a path at the first separator.
///
/// Returns the immediate key and the remaining path, which may itself contain
/// further separators. `None` for the remainder means `path` is a single key.
///
/// ```
/// use conftree::domain::split_first;
///
/// assert_eq!(split_first("a.b.c"), ("a", Some("b.c")));
/// assert_eq!(split_first("a"), ("a", None));
/// ```
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.split_once(SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Join a prefix and a key into a dotted path.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{key}")
    }
}
