//! Header normalization and column resolution.
//!
//! Labels are compared by a normalized key so that trivial authoring drift
//! ("Due Date", "due-date", "Due Date:") resolves to the same column.
//! Synonyms are never inferred; they must be listed as candidates.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Whitespace and punctuation runs collapsed during normalization.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\-_/\\?.:;,()\[\]{}]+").expect("Hardcode regex pattern")
});

/// Canonical comparison key of a header label.
pub fn normalize_header(label: &str) -> String {
    let lower = label.to_lowercase();
    SEPARATORS
        .replace_all(&lower, " ")
        .split_whitespace()
        .collect()
}

/// Normalized label to 0-based column index. When two labels normalize to
/// the same key, the rightmost column wins.
#[derive(Clone, Debug, Default)]
pub struct HeaderMap {
    indexes: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let indexes = headers
            .iter()
            .enumerate()
            .map(|(index, label)| (normalize_header(label.as_ref()), index))
            .collect();
        Self { indexes }
    }

    /// Index of the first candidate, in priority order, that names a header.
    pub fn find(&self, candidates: &[&str]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|candidate| self.indexes.get(&normalize_header(candidate)).copied())
    }
}

/// Exact-candidate lookup over a header row.
pub fn find_column<S: AsRef<str>>(headers: &[S], candidates: &[&str]) -> Option<usize> {
    HeaderMap::new(headers).find(candidates)
}

/// Loose lookup: the first header, in physical order, whose normalized form
/// contains `stem`.
pub fn find_column_loose<S: AsRef<str>>(headers: &[S], stem: &str) -> Option<usize> {
    let stem = normalize_header(stem);
    if stem.is_empty() {
        return None;
    }
    headers
        .iter()
        .position(|label| normalize_header(label.as_ref()).contains(&stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_punctuation_and_whitespace() {
        assert_eq!(normalize_header("Due Date"), "duedate");
        assert_eq!(normalize_header("due-date"), "duedate");
        assert_eq!(normalize_header(" DUE_DATE "), "duedate");
        assert_eq!(normalize_header("Due Date:"), "duedate");
        assert_eq!(normalize_header("Repeat (days)"), "repeatdays");
        assert_eq!(normalize_header("Recurring?"), "recurring");
        assert_eq!(normalize_header("a\\b/c[d]{e};f,g"), "abcdefg");
        assert_eq!(normalize_header(""), "");
        assert_eq!(normalize_header(" ?? "), "");
    }

    #[test]
    fn exact_lookup_tolerates_drift() {
        for label in ["Due Date", "due-date", " DUE_DATE "] {
            let headers = ["Task", label, "Status"];
            assert_eq!(find_column(&headers, &["Due Date", "Due"]), Some(1), "{label}");
        }
        assert_eq!(find_column(&["Task", "Status"], &["Due Date", "Due"]), None);
    }

    #[test]
    fn exact_lookup_honours_candidate_priority() {
        let headers = ["Modified", "Task", "Last Modified"];
        assert_eq!(find_column(&headers, &["Last Modified", "Updated", "Modified"]), Some(2));
        assert_eq!(find_column(&headers, &["Updated", "Modified"]), Some(0));
    }

    #[test]
    fn exact_lookup_last_label_wins_on_collision() {
        let headers = ["Status", "Task", "status:"];
        assert_eq!(find_column(&headers, &["Status"]), Some(2));
    }

    #[test]
    fn loose_lookup_takes_first_physical_match() {
        let headers = ["Task", "Reccuring", "Recurrence Notes", "Recurring"];
        assert_eq!(find_column_loose(&headers, "recur"), Some(2));
        assert_eq!(find_column_loose(&["Is it recurring?"], "recur"), Some(0));
        assert_eq!(find_column_loose(&["Recurse"], "recur"), Some(0));
        assert_eq!(find_column_loose(&["Task", "Status"], "recur"), None);
        assert_eq!(find_column_loose(&["Task"], ""), None);
    }
}
