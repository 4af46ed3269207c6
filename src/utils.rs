//! Small ordering and formatting helpers.

use std::time::Instant;

/// Split a vector after at most `n` elements.
pub(crate) fn split_at_most<T>(mut items: Vec<T>, n: usize) -> (Vec<T>, Vec<T>) {
    let n = n.min(items.len());
    let rest = items.split_off(n);
    (items, rest)
}

/// Render the time since `t` for status reports.
pub(crate) fn fmt_elapsed(t: Option<Instant>) -> String {
    match t {
        Some(t) => format!("{}s", t.elapsed().as_secs()),
        None => "never".to_string(),
    }
}
