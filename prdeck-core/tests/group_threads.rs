//! Regrouping of fetched review threads.

use prdeck_core::group::{group_threads, GroupBy};
use prdeck_core::types::{Comment, CommentsResult, ReviewThread};

fn thread(id: &str, path: &str, author: Option<&str>, resolved: bool) -> ReviewThread {
    ReviewThread {
        id: id.to_owned(),
        path: path.to_owned(),
        line: 10,
        is_resolved: resolved,
        comments: author
            .map(|a| {
                vec![Comment {
                    author: a.to_owned(),
                    body: "looks off".to_owned(),
                    ..Comment::default()
                }]
            })
            .unwrap_or_default(),
        ..ReviewThread::default()
    }
}

fn sample() -> CommentsResult {
    CommentsResult::from_threads(
        42,
        vec![
            thread("t1", "src/main.rs", Some("bob"), false),
            thread("t2", "src/lib.rs", Some("alice"), true),
            thread("t3", "src/main.rs", None, false),
        ],
    )
}

#[test]
fn groups_by_file_in_lexicographic_order() {
    let result = sample();
    let grouped = group_threads(&result, GroupBy::File);

    let keys: Vec<&str> = grouped.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["src/lib.rs", "src/main.rs"]);
    let counts: Vec<usize> = grouped.groups.iter().map(|g| g.threads.len()).collect();
    assert_eq!(counts, [1, 2]);

    assert_eq!(grouped.total_count, 3);
    assert_eq!(grouped.resolved_count, 1);
    assert_eq!(grouped.unresolved_count, 2);
    assert_eq!(grouped.pr_number, 42);
}

#[test]
fn threads_keep_their_order_within_a_group() {
    let grouped = group_threads(&sample(), GroupBy::File);
    let ids: Vec<&str> = grouped.groups[1].threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t3"]);
}

#[test]
fn author_falls_back_to_unknown() {
    let grouped = group_threads(&sample(), GroupBy::Author);
    let keys: Vec<&str> = grouped.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["alice", "bob", "unknown"]);
}

#[test]
fn status_groups_put_unresolved_first() {
    let grouped = group_threads(&sample(), GroupBy::Status);
    let keys: Vec<&str> = grouped.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, ["unresolved", "resolved"]);
    assert_eq!(grouped.groups[0].threads.len(), 2);
}

#[test]
fn group_by_parses_cli_values() {
    assert_eq!("author".parse::<GroupBy>(), Ok(GroupBy::Author));
    assert!("reviewer".parse::<GroupBy>().is_err());
    assert_eq!(GroupBy::Status.to_string(), "status");
}
