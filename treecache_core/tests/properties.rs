//! Property tests for the "universal invariants" over randomized event
//! sequences. Generates small forests and short event streams, then checks
//! recursive aggregates against a definition computed independently of the
//! cache under test.

use std::collections::HashMap;

use proptest::prelude::*;
use treecache_core::model::{Category, Event};
use treecache_core::{Coordinator, CoreConfig};

fn cat(id: i64, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: format!("cat-{id}"),
        parent_id,
        depth: 0,
        created: 0,
        description: String::new(),
    }
}

/// A small fixed forest: 1 and 2 are roots, 3 is a child of 1, 4 is a child
/// of 3 (so depth-3 chain exists to exercise ancestor propagation).
fn small_forest() -> Vec<Category> {
    vec![
        cat(1, None),
        cat(2, None),
        cat(3, Some(1)),
        cat(4, Some(3)),
    ]
}

fn descendants_of(forest: &[Category], id: i64) -> Vec<i64> {
    let children: HashMap<i64, Vec<i64>> = forest.iter().fold(HashMap::new(), |mut acc, c| {
        if let Some(p) = c.parent_id {
            acc.entry(p).or_default().push(c.id);
        }
        acc
    });
    let mut out = Vec::new();
    let mut stack = children.get(&id).cloned().unwrap_or_default();
    while let Some(next) = stack.pop() {
        out.push(next);
        stack.extend(children.get(&next).cloned().unwrap_or_default());
    }
    out
}

prop_compose! {
    fn post_delta_sequence()(
        deltas in prop::collection::vec((1i64..=4, prop::bool::ANY), 1..30)
    ) -> Vec<(i64, bool)> {
        deltas
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Post count equals the clamped signed sum of events touching it.
    #[test]
    fn post_count_matches_signed_sum(events in post_delta_sequence()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let coordinator = Coordinator::new(CoreConfig::default());
            coordinator.seed(small_forest(), HashMap::new());

            let mut running: HashMap<i64, i64> = HashMap::new();
            for (category_id, is_create) in &events {
                let delta = if *is_create { 1 } else { -1 };
                let event = if *is_create {
                    Event::PostCreated { category_id: *category_id, post_id: 0, timestamp_ms: 0 }
                } else {
                    Event::PostDeleted { category_id: *category_id, post_id: 0, timestamp_ms: 0 }
                };
                coordinator.submit(event);
                let entry = running.entry(*category_id).or_insert(0);
                *entry = (*entry + delta).max(0);
            }

            for (&category_id, &expected) in &running {
                prop_assert_eq!(coordinator.post_counts().get(category_id), expected);
            }
            Ok(())
        })?;
    }

    /// Recursive post count equals direct plus every descendant's direct,
    /// computed independently from the forest structure.
    #[test]
    fn recursive_post_count_sums_descendants(events in post_delta_sequence()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let forest = small_forest();
            let coordinator = Coordinator::new(CoreConfig::default());
            coordinator.seed(forest.clone(), HashMap::new());

            for (category_id, is_create) in &events {
                let event = if *is_create {
                    Event::PostCreated { category_id: *category_id, post_id: 0, timestamp_ms: 0 }
                } else {
                    Event::PostDeleted { category_id: *category_id, post_id: 0, timestamp_ms: 0 }
                };
                coordinator.submit(event);
            }

            for category in &forest {
                let direct = coordinator.post_counts().get(category.id);
                let expected_recursive = direct
                    + descendants_of(&forest, category.id)
                        .iter()
                        .map(|d| coordinator.post_counts().get(*d))
                        .sum::<i64>();
                prop_assert_eq!(coordinator.post_counts().get_recursive(category.id), expected_recursive);
            }
            Ok(())
        })?;
    }

    /// File stats recursive == direct + sum of descendants' direct.
    #[test]
    fn file_stats_recursive_sums_descendant_direct(sizes in prop::collection::vec(1i64..=1000, 1..20)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let forest = small_forest();
            let coordinator = Coordinator::new(CoreConfig::default());
            coordinator.seed(forest.clone(), HashMap::new());

            for (i, size) in sizes.iter().enumerate() {
                let category_id = (i as i64 % 4) + 1;
                coordinator.submit(Event::FileAdded { category_id, file_size: *size });
            }

            for category in &forest {
                let direct = coordinator.file_stats().get_direct(category.id);
                let expected_size: i64 = direct.size
                    + descendants_of(&forest, category.id)
                        .iter()
                        .map(|d| coordinator.file_stats().get_direct(*d).size)
                        .sum::<i64>();
                prop_assert_eq!(coordinator.file_stats().get_recursive(category.id).size, expected_size);
            }
            Ok(())
        })?;
    }

    /// Create then delete the same post returns the post count to its prior
    /// value (round-trip invariant).
    #[test]
    fn post_create_delete_round_trips(category_id in 1i64..=4, timestamp_ms in 0i64..2_000_000_000_000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let coordinator = Coordinator::new(CoreConfig::default());
            coordinator.seed(small_forest(), HashMap::new());

            let before = coordinator.post_counts().get(category_id);
            coordinator.submit(Event::PostCreated { category_id, post_id: 1, timestamp_ms });
            coordinator.submit(Event::PostDeleted { category_id, post_id: 1, timestamp_ms });
            let after = coordinator.post_counts().get(category_id);

            prop_assert_eq!(before, after);
            Ok(())
        })?;
    }

    /// No histogram bucket in direct or recursive activity is ever zero.
    #[test]
    fn activity_histograms_never_contain_zero_buckets(
        posts in prop::collection::vec((1i64..=4, 0i64..200_000_000_000i64, prop::bool::ANY), 1..30)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let coordinator = Coordinator::new(CoreConfig::default());
            coordinator.seed(small_forest(), HashMap::new());

            for (category_id, timestamp_ms, is_create) in &posts {
                let event = if *is_create {
                    Event::PostCreated { category_id: *category_id, post_id: 0, timestamp_ms: *timestamp_ms }
                } else {
                    Event::PostDeleted { category_id: *category_id, post_id: 0, timestamp_ms: *timestamp_ms }
                };
                coordinator.submit(event);
            }

            for category_id in 1i64..=4 {
                let activity = coordinator.activity().get(category_id);
                prop_assert!(activity.direct.values().all(|&count| count != 0));
                prop_assert!(activity.recursive.values().all(|&count| count != 0));
            }
            Ok(())
        })?;
    }
}
