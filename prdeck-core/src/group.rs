//! Regrouping of review threads by file, author or resolution status.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{CommentsResult, ReviewThread};

/// Grouping key for [`group_threads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    File,
    Author,
    Status,
}

impl GroupBy {
    fn key(self, thread: &ReviewThread) -> String {
        match self {
            GroupBy::File => thread.path.clone(),
            GroupBy::Author => thread
                .root_comment()
                .map(|c| c.author.clone())
                .unwrap_or_else(|| "unknown".to_owned()),
            GroupBy::Status => {
                if thread.is_resolved {
                    "resolved".to_owned()
                } else {
                    "unresolved".to_owned()
                }
            }
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupBy::File => "file",
            GroupBy::Author => "author",
            GroupBy::Status => "status",
        })
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "file" => Ok(GroupBy::File),
            "author" => Ok(GroupBy::Author),
            "status" => Ok(GroupBy::Status),
            other => Err(format!(
                "invalid group-by value {other:?}: must be file, author, or status"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentGroup {
    pub key: String,
    pub threads: Vec<ReviewThread>,
}

/// Threads regrouped under one key, with the source totals carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedComments {
    pub pr_number: u64,
    pub group_by: GroupBy,
    pub groups: Vec<CommentGroup>,
    pub total_count: usize,
    pub resolved_count: usize,
    pub unresolved_count: usize,
}

/// Groups threads by `group_by`.
///
/// File and author keys sort lexicographically. Status groups put `unresolved` first. Threads keep
/// their relative order inside a group.
pub fn group_threads(result: &CommentsResult, group_by: GroupBy) -> GroupedComments {
    let mut buckets: BTreeMap<String, Vec<ReviewThread>> = BTreeMap::new();
    for thread in &result.threads {
        buckets
            .entry(group_by.key(thread))
            .or_default()
            .push(thread.clone());
    }

    let mut groups: Vec<CommentGroup> = buckets
        .into_iter()
        .map(|(key, threads)| CommentGroup { key, threads })
        .collect();
    if group_by == GroupBy::Status {
        // BTreeMap order puts "resolved" first; stable sort moves "unresolved" ahead.
        groups.sort_by_key(|g| g.key != "unresolved");
    }

    GroupedComments {
        pr_number: result.pr_number,
        group_by,
        groups,
        total_count: result.total_count,
        resolved_count: result.resolved_count,
        unresolved_count: result.unresolved_count,
    }
}
