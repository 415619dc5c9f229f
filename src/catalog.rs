//! Problem catalog: problems keyed by title, built from seeds plus config.
//!
//! The catalog is read-only once built. Config entries are inserted first and
//! built-in seeds never overwrite a title that config already provides.

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use crate::config::CoachConfig;
use crate::domain::{Difficulty, Problem};
use crate::seeds::{hard_fallback_problem, seed_problems};

pub trait ProblemCatalog: Send + Sync {
    fn problem(&self, title: &str) -> Option<Problem>;

    /// Titles in listing order.
    fn titles(&self) -> Vec<String>;

    /// Sidebar labels (`"🟢 Two Sum - Easy"`) in listing order.
    fn labels(&self) -> Vec<String> {
        self.titles()
            .iter()
            .filter_map(|t| self.problem(t))
            .map(|p| p.display_label())
            .collect()
    }

    /// Resolve a sidebar label (or a bare title) back to its problem.
    fn by_label(&self, label: &str) -> Option<Problem> {
        self.problem(title_from_label(label))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    by_title: HashMap<String, Problem>,
    order: Vec<String>,
}

impl MemoryCatalog {
    /// Catalog from an explicit list; later duplicates of a title are skipped.
    /// An empty list gets the hard fallback problem so selection always works.
    pub fn from_problems(problems: impl IntoIterator<Item = Problem>) -> Self {
        let mut cat = Self::default();
        for p in problems {
            cat.insert_if_absent(p);
        }
        if cat.order.is_empty() {
            warn!(target: "catalog", "No problems available; inserting hard fallback");
            cat.insert_if_absent(hard_fallback_problem());
        }
        cat
    }

    /// Config problems first, then seeds for any title config did not define.
    #[instrument(level = "info", skip_all, fields(configured = cfg.problems.len()))]
    pub fn from_config(cfg: &CoachConfig) -> Self {
        let configured = cfg.problems.iter().cloned();
        let cat = Self::from_problems(configured.chain(seed_problems()));

        let mut count_by_diff: HashMap<Difficulty, usize> = HashMap::new();
        for p in cat.by_title.values() {
            *count_by_diff.entry(p.difficulty).or_insert(0) += 1;
        }
        for (difficulty, count) in count_by_diff {
            info!(target: "catalog", %difficulty, count, "Startup problem inventory");
        }
        cat
    }

    fn insert_if_absent(&mut self, p: Problem) {
        let title = p.title.trim().to_string();
        if title.is_empty() {
            warn!(target: "catalog", "Skipping problem with empty title");
            return;
        }
        if self.by_title.contains_key(&title) {
            return;
        }
        self.order.push(title.clone());
        self.by_title.insert(title, Problem { title: p.title.trim().to_string(), ..p });
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ProblemCatalog for MemoryCatalog {
    fn problem(&self, title: &str) -> Option<Problem> {
        self.by_title.get(title.trim()).cloned()
    }

    fn titles(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Strip the difficulty icon prefix and `" - <difficulty>"` suffix from a label.
/// Bare titles pass through unchanged.
pub fn title_from_label(label: &str) -> &str {
    let mut s = label.trim();
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        if let Some(rest) = s.strip_prefix(d.icon()) {
            s = rest.trim_start();
            break;
        }
    }
    if let Some((title, tail)) = s.rsplit_once(" - ") {
        if tail.trim().parse::<Difficulty>().is_ok() {
            s = title;
        }
    }
    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn seeds_fill_the_default_catalog() {
        let cat = MemoryCatalog::from_config(&CoachConfig::default());
        assert_eq!(cat.len(), seed_problems().len());
        assert!(cat.problem("Two Sum").is_some());
        assert_eq!(cat.titles()[0], "Two Sum");
    }

    #[test]
    fn config_entries_replace_same_titled_seeds() {
        let cfg = parse_config(r#"
            [[problems]]
            title = "Two Sum"
            difficulty = "Difícil"
            statement = "Harder variant."

            [[problems]]
            title = "Palindrome"
            difficulty = "Fácil"
        "#).unwrap();
        let cat = MemoryCatalog::from_config(&cfg);
        let two_sum = cat.problem("Two Sum").unwrap();
        assert_eq!(two_sum.difficulty, Difficulty::Hard);
        assert_eq!(two_sum.statement, "Harder variant.");
        assert!(two_sum.examples.is_empty());
        assert_eq!(cat.len(), seed_problems().len() + 1);
        assert_eq!(&cat.titles()[..2], &["Two Sum".to_string(), "Palindrome".to_string()]);
    }

    #[test]
    fn labels_round_trip_to_titles() {
        let cat = MemoryCatalog::from_config(&CoachConfig::default());
        for label in cat.labels() {
            let p = cat.by_label(&label).unwrap();
            assert_eq!(p.display_label(), label);
        }
        assert_eq!(title_from_label("🟡 Longest Substring - Medium"), "Longest Substring");
        assert_eq!(title_from_label("Two Sum"), "Two Sum");
        // a dash inside the title survives when the tail is not a difficulty
        assert_eq!(title_from_label("🔴 A - B"), "A - B");
    }

    #[test]
    fn empty_input_gets_the_fallback() {
        let cat = MemoryCatalog::from_problems(Vec::new());
        assert_eq!(cat.len(), 1);
        assert!(cat.problem(&hard_fallback_problem().title).is_some());
    }
}
