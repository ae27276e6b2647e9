//! Phase generator

use crate::heuristics::{phase_title, rank_objectives};
use crate::options::PhaseOptions;
use roadmap_model::{LearningItem, Phase, PhaseType};
use std::collections::BTreeMap;

/// Difficulty classified as [`PhaseType::Advanced`]
pub const ADVANCED_DIFFICULTY: i64 = 3;

/// Classify a difficulty bucket against the preferred difficulty
///
/// Below preferred is foundation, equal is core, exactly
/// [`ADVANCED_DIFFICULTY`] is advanced, anything else is mastery.
#[must_use]
pub fn classify_bucket(difficulty: i64, preferred: i64) -> PhaseType {
    if difficulty < preferred {
        PhaseType::Foundation
    } else if difficulty == preferred {
        PhaseType::Core
    } else if difficulty == ADVANCED_DIFFICULTY {
        PhaseType::Advanced
    } else {
        PhaseType::Mastery
    }
}

/// Groups learning items into ordered phases
#[derive(Debug, Clone, Default)]
pub struct PhaseGenerator {
    options: PhaseOptions,
}

impl PhaseGenerator {
    /// Create generator with options
    #[inline]
    #[must_use]
    pub fn new(options: PhaseOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PhaseOptions {
        &self.options
    }

    /// Group `items` into phases
    ///
    /// Never fails; empty input gives no phases.
    #[must_use]
    pub fn generate(&self, items: &[LearningItem]) -> Vec<Phase> {
        let mut phases = Vec::new();

        for (difficulty, bucket) in bucket_by_difficulty(items) {
            let phase_type = classify_bucket(difficulty, self.options.preferred_difficulty);
            self.split_bucket(phase_type, bucket, &mut phases);
        }

        if let Some(limit) = self.options.time_constraint {
            merge_adjacent(&mut phases, limit);
        }

        tracing::debug!(items = items.len(), phases = phases.len(), "Generated phases");
        phases
    }

    fn split_bucket(&self, phase_type: PhaseType, bucket: Vec<LearningItem>, out: &mut Vec<Phase>) {
        let mut current: Vec<LearningItem> = Vec::new();
        let mut current_duration = 0.0;

        for item in bucket {
            if !current.is_empty() && self.should_split(current.len(), current_duration, &item) {
                out.push(build_phase(phase_type, std::mem::take(&mut current)));
                current_duration = 0.0;
            }
            current_duration += item.duration;
            current.push(item);
        }

        if !current.is_empty() {
            out.push(build_phase(phase_type, current));
        }
    }

    fn should_split(&self, len: usize, duration: f64, next: &LearningItem) -> bool {
        if len >= self.options.max_items_per_phase {
            return true;
        }
        self.options
            .time_constraint
            .is_some_and(|limit| duration + next.duration > limit)
    }
}

/// Buckets in ascending difficulty, items in input order
fn bucket_by_difficulty(items: &[LearningItem]) -> BTreeMap<i64, Vec<LearningItem>> {
    let mut buckets: BTreeMap<i64, Vec<LearningItem>> = BTreeMap::new();
    for item in items {
        buckets.entry(item.difficulty).or_default().push(item.clone());
    }
    buckets
}

/// Single left-to-right pass; a merged phase is compared again with its
/// new neighbour before moving on
fn merge_adjacent(phases: &mut Vec<Phase>, limit: f64) {
    let mut i = 0;
    while i + 1 < phases.len() {
        let (left, right) = (&phases[i], &phases[i + 1]);
        let fits = left.estimated_duration() + right.estimated_duration() <= limit;
        let close = left.difficulty().abs_diff(right.difficulty()) <= 1;

        if fits && close {
            let next = phases.remove(i + 1);
            phases[i].absorb(next);
            finalize(&mut phases[i]);
        } else {
            i += 1;
        }
    }
}

fn build_phase(phase_type: PhaseType, items: Vec<LearningItem>) -> Phase {
    let mut phase = Phase::new(phase_type, items);
    finalize(&mut phase);
    phase
}

/// Derive title and objective order from the phase's items
fn finalize(phase: &mut Phase) {
    let ranked = rank_objectives(phase.objectives(), phase.items());
    phase.set_objectives(ranked);
    let title = phase_title(phase);
    phase.set_title(title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(difficulty: i64, duration: f64) -> LearningItem {
        LearningItem::default()
            .with_difficulty(difficulty)
            .with_duration(duration)
    }

    #[test]
    fn classification_ladder() {
        assert_eq!(classify_bucket(1, 2), PhaseType::Foundation);
        assert_eq!(classify_bucket(2, 2), PhaseType::Core);
        assert_eq!(classify_bucket(3, 2), PhaseType::Advanced);
        assert_eq!(classify_bucket(4, 2), PhaseType::Mastery);
        // equality with preferred wins over the advanced constant
        assert_eq!(classify_bucket(3, 3), PhaseType::Core);
        // above preferred but not exactly advanced is mastery
        assert_eq!(classify_bucket(2, 1), PhaseType::Mastery);
        assert_eq!(classify_bucket(4, 1), PhaseType::Mastery);
    }

    #[test]
    fn empty_input_gives_no_phases() {
        assert!(PhaseGenerator::default().generate(&[]).is_empty());
    }

    #[test]
    fn documented_scenario() {
        let items = vec![item(1, 2.0), item(1, 3.0), item(3, 5.0)];
        let phases = PhaseGenerator::default().generate(&items);

        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].phase_type(), PhaseType::Foundation);
        assert_eq!(phases[0].len(), 2);
        assert_eq!(phases[0].estimated_duration(), 5.0);
        assert_eq!(phases[0].difficulty(), 1);
        assert_eq!(phases[1].phase_type(), PhaseType::Advanced);
        assert_eq!(phases[1].len(), 1);
        assert_eq!(phases[1].estimated_duration(), 5.0);
        assert_eq!(phases[1].difficulty(), 3);
    }

    #[test]
    fn splits_on_item_count() {
        let items: Vec<_> = (0..7).map(|_| item(2, 1.0)).collect();
        let phases = PhaseGenerator::new(PhaseOptions::default().with_max_items(3)).generate(&items);
        let sizes: Vec<_> = phases.iter().map(Phase::len).collect();
        assert_eq!(sizes, [3, 3, 1]);
        assert!(phases.iter().all(|p| p.phase_type() == PhaseType::Core));
    }

    #[test]
    fn zero_max_items_still_places_every_item() {
        let items = vec![item(2, 1.0), item(2, 1.0)];
        let phases = PhaseGenerator::new(PhaseOptions::default().with_max_items(0)).generate(&items);
        assert_eq!(phases.len(), 2);
    }

    #[test]
    fn splits_on_time_budget_but_never_empty() {
        // the 9h item exceeds the budget alone and still gets a phase
        let items = vec![item(2, 3.0), item(2, 3.0), item(2, 9.0), item(2, 1.0)];
        let options = PhaseOptions::default().with_time_constraint(6.0);
        let phases = PhaseGenerator::new(options).generate(&items);

        let durations: Vec<_> = phases.iter().map(Phase::estimated_duration).collect();
        assert_eq!(durations, [6.0, 9.0, 1.0]);
    }

    #[test]
    fn merges_small_adjacent_phases() {
        let items = vec![item(1, 1.0), item(2, 1.0), item(4, 1.0)];
        let options = PhaseOptions::default().with_time_constraint(10.0);
        let phases = PhaseGenerator::new(options).generate(&items);

        // 1 and 2 merge; the merged difficulty (2) is too far from 4
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].len(), 2);
        assert_eq!(phases[0].phase_type(), PhaseType::Foundation);
        assert_eq!(phases[0].difficulty(), 2);
        assert_eq!(phases[0].estimated_duration(), 2.0);
        assert_eq!(phases[1].difficulty(), 4);
    }

    #[test]
    fn merge_repeats_at_same_index() {
        let items = vec![item(1, 1.0), item(2, 1.0), item(3, 1.0)];
        let options = PhaseOptions::default().with_time_constraint(10.0);
        let phases = PhaseGenerator::new(options).generate(&items);

        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].len(), 3);
        assert_eq!(phases[0].difficulty(), 2);
    }

    #[test]
    fn no_merge_without_time_budget() {
        let items = vec![item(1, 1.0), item(2, 1.0)];
        let phases = PhaseGenerator::default().generate(&items);
        assert_eq!(phases.len(), 2);
    }

    #[test]
    fn unexpected_difficulties_sort_numerically() {
        let items = vec![item(7, 1.0), item(2, 1.0), item(0, 1.0), item(-1, 1.0), item(4, 1.0)];
        let phases = PhaseGenerator::default().generate(&items);
        let difficulties: Vec<_> = phases.iter().map(Phase::difficulty).collect();
        assert_eq!(difficulties, [-1, 0, 2, 4, 7]);
        assert_eq!(phases[0].phase_type(), PhaseType::Foundation);
        assert_eq!(phases[4].phase_type(), PhaseType::Mastery);
    }

    #[test]
    fn extreme_difficulties_do_not_overflow() {
        let raw = r#"[
            {"difficulty": 9000000000000000000, "duration": 1},
            {"difficulty": 9000000000000000000, "duration": 1}
        ]"#;
        let items: Vec<LearningItem> = serde_json::from_str(raw).unwrap();
        let phases = PhaseGenerator::default().generate(&items);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].difficulty(), 9_000_000_000_000_000_000);

        let items = vec![item(i64::MIN, 1.0), item(i64::MAX, 1.0), item(i64::MAX, 1.0)];
        let options = PhaseOptions::default().with_time_constraint(100.0);
        let phases = PhaseGenerator::new(options).generate(&items);
        let difficulties: Vec<_> = phases.iter().map(Phase::difficulty).collect();
        assert_eq!(difficulties, [i64::MIN, i64::MAX]);
    }

    #[test]
    fn title_and_objectives_are_derived() {
        let items = vec![
            LearningItem::new("Async basics")
                .with_description("futures and executors")
                .with_difficulty(2)
                .with_objectives(["executors", "futures"]),
            LearningItem::new("Async streams")
                .with_description("futures as streams")
                .with_difficulty(2)
                .with_objectives(["streams"]),
        ];
        let phases = PhaseGenerator::default().generate(&items);

        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].title(), "Core: Async, Futures");
        assert_eq!(phases[0].objectives(), ["futures", "executors", "streams"]);
    }
}
