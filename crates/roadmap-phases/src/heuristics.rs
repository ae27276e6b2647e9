//! Title and objective heuristics
//!
//! Frequency counting only, no semantics.

use roadmap_model::{LearningItem, Phase};
use std::collections::{HashMap, HashSet};

/// Words shorter than this never count as keywords
const MIN_KEYWORD_CHARS: usize = 4;

/// Keywords shown in a phase title
const TITLE_KEYWORDS: usize = 2;

/// Words (more than 3 chars) occurring in more than one item's title and
/// description, most widespread first
///
/// A word is counted once per item. Ties keep first-seen order.
#[must_use]
pub fn common_keywords(items: &[LearningItem]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for item in items {
        let text = item.combined_text().to_lowercase();
        let mut seen_here = HashSet::new();
        for word in text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() >= MIN_KEYWORD_CHARS)
        {
            if !seen_here.insert(word) {
                continue;
            }
            let count = counts.entry(word.to_string()).or_insert(0);
            if *count == 0 {
                order.push(word.to_string());
            }
            *count += 1;
        }
    }

    let mut repeated: Vec<String> = order.into_iter().filter(|w| counts[w] > 1).collect();
    repeated.sort_by(|a, b| counts[b].cmp(&counts[a]));
    repeated
}

/// `"<Type>: <kw1>, <kw2>"`, or `"<Type> Phase <difficulty>"` when no
/// keyword repeats
#[must_use]
pub fn phase_title(phase: &Phase) -> String {
    let keywords = common_keywords(phase.items());
    if keywords.is_empty() {
        return phase.fallback_title();
    }
    let top: Vec<String> = keywords
        .iter()
        .take(TITLE_KEYWORDS)
        .map(|w| capitalize(w))
        .collect();
    format!("{}: {}", phase.phase_type().label(), top.join(", "))
}

/// Order objectives by how many items mention them (case-insensitive
/// substring of title + description), most mentioned first
#[must_use]
pub fn rank_objectives(objectives: &[String], items: &[LearningItem]) -> Vec<String> {
    let texts: Vec<String> = items
        .iter()
        .map(|i| i.combined_text().to_lowercase())
        .collect();

    let mut ranked: Vec<(usize, &String)> = objectives
        .iter()
        .map(|objective| {
            let needle = objective.to_lowercase();
            let mentions = texts.iter().filter(|t| t.contains(&needle)).count();
            (mentions, objective)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, o)| o.clone()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_model::PhaseType;

    fn item(title: &str, description: &str) -> LearningItem {
        LearningItem::new(title).with_description(description)
    }

    #[test]
    fn keywords_need_two_items() {
        let items = vec![
            item("Rust ownership basics", "ownership ownership ownership"),
            item("Borrowing in Rust", "references and borrowing"),
            item("Rust lifetimes", "lifetimes tie borrowing together"),
        ];
        // "rust" is in 3 items, "borrowing" in 2, "ownership" only in 1
        assert_eq!(common_keywords(&items), ["rust", "borrowing"]);
    }

    #[test]
    fn keywords_ignore_short_words_and_punctuation() {
        let items = vec![item("Use the API.", "api, api"), item("The API!", "")];
        assert!(common_keywords(&items).is_empty());

        let items = vec![item("Async tasks.", ""), item("Spawning tasks", "")];
        assert_eq!(common_keywords(&items), ["tasks"]);
    }

    #[test]
    fn title_uses_top_two_keywords() {
        let phase = Phase::new(
            PhaseType::Core,
            vec![
                item("Tokio runtime setup", "async runtime"),
                item("Tokio channels", "async message passing"),
                item("Runtime tuning", "tokio workers"),
            ],
        );
        assert_eq!(phase_title(&phase), "Core: Tokio, Runtime");
    }

    #[test]
    fn title_falls_back_without_repeats() {
        let phase = Phase::new(
            PhaseType::Foundation,
            vec![LearningItem::default().with_difficulty(1)],
        );
        assert_eq!(phase_title(&phase), "Foundation Phase 1");
    }

    #[test]
    fn objectives_ranked_by_mentions() {
        let items = vec![
            item("Traits", "generic code with traits"),
            item("Trait objects", "dynamic dispatch"),
            item("Generics", "generic functions"),
        ];
        let objectives = vec![
            "dispatch".to_string(),
            "Generic".to_string(),
            "trait".to_string(),
        ];
        assert_eq!(
            rank_objectives(&objectives, &items),
            ["Generic", "trait", "dispatch"]
        );
    }

    #[test]
    fn objective_ties_keep_order() {
        let items = vec![item("nothing relevant", "")];
        let objectives = vec!["b".to_string(), "a".to_string()];
        assert_eq!(rank_objectives(&objectives, &items), ["b", "a"]);
    }
}
