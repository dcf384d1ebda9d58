use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::content::{LearnLine, LearnLineId};

/// Read-only index over a set of learn lines.
///
/// Lines keep the position of their first occurrence; a later line with the
/// same id replaces the earlier one in place.
#[derive(Debug, Clone, Default)]
pub struct LearnGraph {
    lines: Vec<LearnLine>,
    index: HashMap<LearnLineId, usize>,
    all_tags: Vec<String>,
}

impl LearnGraph {
    pub fn build<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = LearnLine>,
    {
        let mut graph = Self::default();
        let mut seen_tags: HashSet<String> = HashSet::new();

        for line in lines {
            for tag in &line.tags {
                if seen_tags.insert(tag.clone()) {
                    graph.all_tags.push(tag.clone());
                }
            }

            match graph.index.get(&line.id) {
                Some(&position) => {
                    debug!(line_id = %line.id, "duplicate learn line id, last definition wins");
                    graph.lines[position] = line;
                }
                None => {
                    graph.index.insert(line.id.clone(), graph.lines.len());
                    graph.lines.push(line);
                }
            }
        }

        for (line_id, missing) in graph.dangling_prerequisites() {
            warn!(line_id = %line_id, prerequisite = %missing, "prerequisite references unknown learn line");
        }

        graph
    }

    pub fn get(&self, id: &str) -> Option<&LearnLine> {
        self.index.get(id).map(|&position| &self.lines[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LearnLine> {
        self.lines.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Union of all line tags in first-seen order.
    pub fn all_tags(&self) -> &[String] {
        &self.all_tags
    }

    /// `(line, prerequisite)` pairs whose prerequisite is not in the graph.
    /// Such lines stay locked until the missing id shows up in the completed set.
    pub fn dangling_prerequisites(&self) -> Vec<(&str, &str)> {
        self.lines
            .iter()
            .flat_map(|line| {
                line.prerequisites
                    .iter()
                    .filter(|pre| !self.index.contains_key(pre.as_str()))
                    .map(move |pre| (line.id.as_str(), pre.as_str()))
            })
            .collect()
    }
}

/// A line is unlocked when every prerequisite is in the completed set.
pub fn is_unlocked(line: &LearnLine, completed: &HashSet<&str>) -> bool {
    line.prerequisites
        .iter()
        .all(|pre| completed.contains(pre.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, prereqs: &[&str], tags: &[&str]) -> LearnLine {
        LearnLine::new(id, id.to_uppercase())
            .with_prerequisites(prereqs.iter().copied())
            .with_tags(tags.iter().copied())
    }

    #[test]
    fn test_build_indexes_lines_in_order() {
        let graph = LearnGraph::build(vec![line("a", &[], &[]), line("b", &["a"], &[])]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(graph.contains("b"));
        assert!(graph.get("c").is_none());
    }

    #[test]
    fn test_duplicate_id_last_write_wins_in_place() {
        let mut replacement = line("a", &[], &[]);
        replacement.title = "Second".to_string();

        let graph = LearnGraph::build(vec![line("a", &[], &[]), line("b", &[], &[]), replacement]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(graph.get("a").unwrap().title, "Second");
    }

    #[test]
    fn test_all_tags_unique_in_insertion_order() {
        let graph = LearnGraph::build(vec![
            line("a", &[], &["algebra", "equations"]),
            line("b", &[], &["equations", "addition"]),
        ]);
        assert_eq!(graph.all_tags(), &["algebra", "equations", "addition"]);
    }

    #[test]
    fn test_is_unlocked() {
        let free = line("a", &[], &[]);
        let gated = line("b", &["a", "c"], &[]);

        assert!(is_unlocked(&free, &HashSet::new()));
        assert!(!is_unlocked(&gated, &HashSet::from(["a"])));
        assert!(is_unlocked(&gated, &HashSet::from(["a", "c", "z"])));
    }

    #[test]
    fn test_dangling_prerequisites_reported() {
        let graph = LearnGraph::build(vec![line("a", &["ghost"], &[]), line("b", &["a"], &[])]);
        assert_eq!(graph.dangling_prerequisites(), vec![("a", "ghost")]);
        assert!(!is_unlocked(graph.get("a").unwrap(), &HashSet::new()));
    }
}
