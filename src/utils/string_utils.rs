//! UTF-8-safe string truncation.

/// Truncate a string to at most `max_chars` characters, respecting
/// character boundaries. Returns a slice of the original string and
/// never panics on multi-byte input.
#[inline]
#[must_use]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}
