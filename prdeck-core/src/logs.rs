//! Error-focused excerpts of CI job logs.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

const MAX_EXCERPT_LINES: usize = 50;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("ansi escape regex"));
static LEADING_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z\s?").expect("timestamp regex")
});
static FILE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\.\w+:\d+").expect("file:line regex"));

const ERROR_WORDS: [&str; 4] = ["error", "fail", "fatal", "panic"];
const ERROR_PREFIXES: [&str; 3] = ["error:", "fail:", "##[error]"];

/// Extracts the error-relevant lines of a raw job log.
///
/// ANSI escapes and runner timestamps are stripped first. Every matching line is kept with one
/// line of context on each side, non-adjacent regions are separated by `...`, and the excerpt is
/// capped at 50 lines. Returns an empty string when nothing matches.
pub fn extract_error_lines(log: &str) -> String {
    let cleaned: Vec<String> = log.split('\n').map(clean_line).collect();

    let mut keep = BTreeSet::new();
    for (i, line) in cleaned.iter().enumerate() {
        if is_error_line(line) {
            keep.insert(i.saturating_sub(1));
            keep.insert(i);
            if i + 1 < cleaned.len() {
                keep.insert(i + 1);
            }
        }
    }

    let mut excerpt: Vec<&str> = Vec::new();
    let mut previous: Option<usize> = None;
    for i in keep {
        if previous.is_some_and(|p| i > p + 1) {
            excerpt.push("...");
        }
        excerpt.push(&cleaned[i]);
        previous = Some(i);
        if excerpt.len() >= MAX_EXCERPT_LINES {
            break;
        }
    }
    excerpt.join("\n")
}

fn clean_line(line: &str) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(line, "");
    LEADING_TIMESTAMP.replace(&without_ansi, "").into_owned()
}

fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    let trimmed = lower.trim();
    ERROR_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        || ERROR_WORDS.iter().any(|w| lower.contains(w))
        || FILE_LINE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_context_and_marks_gaps() {
        let log = "setup\nok 1\nok 2\nerror: boom\nafter\nquiet\nquiet\nquiet\nFAIL pkg\n";
        let excerpt = extract_error_lines(log);
        assert_eq!(excerpt, "ok 2\nerror: boom\nafter\n...\nquiet\nFAIL pkg\n");
    }

    #[test]
    fn strips_ansi_and_timestamps() {
        let log = "2024-01-15T10:00:00.1234567Z \x1b[31mError\x1b[0m: denied";
        assert_eq!(extract_error_lines(log), "Error: denied");
    }

    #[test]
    fn clean_logs_have_no_excerpt() {
        assert_eq!(extract_error_lines("building\nlinking\ndone"), "");
    }

    #[test]
    fn excerpt_is_capped() {
        let log = vec!["error"; 200].join("\n");
        assert_eq!(extract_error_lines(&log).lines().count(), MAX_EXCERPT_LINES);
    }
}
