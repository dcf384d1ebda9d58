use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::content::{LearnLine, LearnLineId};
use crate::graph::{is_unlocked, LearnGraph};
use crate::profile::{LineStatus, UserProfile};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;

/// Badge of a line on the learn graph map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Completed,
    Available,
    Locked,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Completed => "completed",
            Availability::Available => "available",
            Availability::Locked => "locked",
        }
    }
}

/// Ids of lines whose prerequisites are all completed, in graph order.
pub fn available_lines(graph: &LearnGraph, completed: &HashSet<&str>) -> Vec<LearnLineId> {
    graph
        .lines()
        .filter(|line| is_unlocked(line, completed))
        .map(|line| line.id.clone())
        .collect()
}

/// Up to `limit` unlocked, unfinished lines: in-progress lines first, then
/// most recently accessed. Lines never touched sort last.
pub fn recommended_lines(graph: &LearnGraph, profile: &UserProfile, limit: usize) -> Vec<LearnLineId> {
    let completed = profile.completed_set();
    let mut candidates: Vec<(LearnLineId, bool, DateTime<Utc>)> = available_lines(graph, &completed)
        .into_iter()
        .filter(|id| !completed.contains(id.as_str()))
        .map(|id| {
            let status = profile.status(&id);
            let in_progress = status.is_some_and(|s| s.status == LineStatus::InProgress);
            let last_accessed = status
                .map(|s| s.last_accessed)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            (id, in_progress, last_accessed)
        })
        .collect();

    // sort_by_key is stable, equal keys keep graph order
    candidates.sort_by_key(|(_, in_progress, last_accessed)| (Reverse(*in_progress), Reverse(*last_accessed)));
    candidates.truncate(limit);
    candidates.into_iter().map(|(id, _, _)| id).collect()
}

/// Completed share of all lines in whole percent, 0 for an empty graph.
pub fn overall_progress(graph: &LearnGraph, profile: &UserProfile) -> u32 {
    let total = graph.len();
    if total == 0 {
        return 0;
    }
    let completed = profile.completed_learn_lines.len();
    let percent = (100.0 * completed as f64 / total as f64).round() as u32;
    percent.min(100)
}

pub fn availability(line: &LearnLine, profile: &UserProfile) -> Availability {
    if profile.is_completed(&line.id) {
        Availability::Completed
    } else if is_unlocked(line, &profile.completed_set()) {
        Availability::Available
    } else {
        Availability::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileLearnLineStatus;
    use chrono::TimeZone;

    fn graph(lines: &[(&str, &[&str])]) -> LearnGraph {
        LearnGraph::build(
            lines
                .iter()
                .map(|(id, pre)| LearnLine::new(*id, *id).with_prerequisites(pre.iter().copied())),
        )
    }

    fn status(id: &str, status: LineStatus, secs: i64) -> ProfileLearnLineStatus {
        let mut record = ProfileLearnLineStatus::new(id);
        record.status = status;
        record.last_accessed = Utc.timestamp_opt(secs, 0).unwrap();
        record
    }

    #[test]
    fn test_available_lines_follow_prerequisites() {
        let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        assert_eq!(available_lines(&graph, &HashSet::new()), vec!["a"]);
        assert_eq!(available_lines(&graph, &HashSet::from(["a"])), vec!["a", "b"]);
    }

    #[test]
    fn test_recommended_orders_in_progress_then_recent() {
        let graph = graph(&[("x", &[]), ("y", &[]), ("z", &[])]);
        let mut profile = UserProfile::new();
        profile.learn_line_status.insert("x".into(), status("x", LineStatus::InProgress, 1_000));
        profile.learn_line_status.insert("z".into(), status("z", LineStatus::InProgress, 2_000));

        assert_eq!(recommended_lines(&graph, &profile, 2), vec!["z", "x"]);
        assert_eq!(recommended_lines(&graph, &profile, 3), vec!["z", "x", "y"]);
    }

    #[test]
    fn test_recommended_mixed_statuses_and_timestamps() {
        let graph = graph(&[("fresh", &[]), ("review", &[]), ("old", &[]), ("stale", &[]), ("recent", &[])]);
        let mut profile = UserProfile::new();
        // accessed but not in progress: after every in-progress line, before untouched ones
        profile.learn_line_status.insert("review".into(), status("review", LineStatus::NeedsReview, 9_000));
        // mastered without being in the completed set still counts as accessed
        profile.learn_line_status.insert("stale".into(), status("stale", LineStatus::Mastered, 3_000));
        // an old in-progress line beats any more recent line that is not in progress
        profile.learn_line_status.insert("old".into(), status("old", LineStatus::InProgress, 100));
        profile.learn_line_status.insert("recent".into(), status("recent", LineStatus::InProgress, 5_000));

        assert_eq!(
            recommended_lines(&graph, &profile, 5),
            vec!["recent", "old", "review", "stale", "fresh"]
        );
        assert_eq!(recommended_lines(&graph, &profile, 3), vec!["recent", "old", "review"]);
    }

    #[test]
    fn test_recommended_excludes_completed_and_locked() {
        let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        let mut profile = UserProfile::new();
        profile.mark_completed("a");

        assert_eq!(recommended_lines(&graph, &profile, DEFAULT_RECOMMENDATION_LIMIT), vec!["b"]);
    }

    #[test]
    fn test_recommended_stable_for_untouched_lines() {
        let graph = graph(&[("c", &[]), ("a", &[]), ("b", &[])]);
        let profile = UserProfile::new();
        assert_eq!(recommended_lines(&graph, &profile, 10), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_overall_progress() {
        let empty = graph(&[]);
        assert_eq!(overall_progress(&empty, &UserProfile::new()), 0);

        let four = graph(&[("a", &[]), ("b", &[]), ("c", &[]), ("d", &[])]);
        let mut profile = UserProfile::new();
        profile.mark_completed("a");
        assert_eq!(overall_progress(&four, &profile), 25);

        profile.mark_completed("b");
        profile.mark_completed("c");
        assert_eq!(overall_progress(&four, &profile), 75);
    }

    #[test]
    fn test_overall_progress_capped() {
        let one = graph(&[("a", &[])]);
        let mut profile = UserProfile::new();
        profile.mark_completed("a");
        profile.mark_completed("removed-line");
        assert_eq!(overall_progress(&one, &profile), 100);
    }

    #[test]
    fn test_availability_badges() {
        let graph = graph(&[("a", &[]), ("b", &["a"])]);
        let mut profile = UserProfile::new();
        let a = graph.get("a").unwrap();
        let b = graph.get("b").unwrap();

        assert_eq!(availability(a, &profile), Availability::Available);
        assert_eq!(availability(b, &profile), Availability::Locked);

        profile.mark_completed("a");
        assert_eq!(availability(a, &profile), Availability::Completed);
        assert_eq!(availability(b, &profile).as_str(), "available");
    }
}
