//! Free-text dependency parsing.
//!
//! The dependency field is whatever the user typed: `"item-3, feature-5;7"`.
//! Only the trailing digits of each token matter; the kind prefix is a
//! display convention, not part of the reference (resolution is
//! type-agnostic, see [`super::graph`]).

/// Parse a raw dependency field into numeric ids.
///
/// Tokens are split on `;` or `,`; each token contributes the trailing run
/// of ASCII digits (`item-3` → 3, bare `7` → 7). Tokens without trailing
/// digits are dropped silently. No deduplication; first-appearance order is
/// preserved.
pub fn parse_dependencies(raw: &str) -> Vec<i64> {
    raw.split([';', ','])
        .filter_map(|token| {
            let token = token.trim();
            let bytes = token.as_bytes();
            let mut start = bytes.len();
            while start > 0 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            token[start..].parse::<i64>().ok()
        })
        .collect()
}
