use super::*;
use crate::comparison::SimilarityMetric;
use crate::frontend::{ExactKinds, TokenizeOutcome};
use crate::token::{Symbol, TokenSequence};

fn outcome(kinds: impl IntoIterator<Item = u32>) -> TokenizeOutcome {
    TokenizeOutcome {
        tokens: TokenSequence::from_kinds(kinds.into_iter().map(Symbol::new)),
        has_errors: false,
    }
}

fn registry(submissions: &[(&str, Vec<u32>)]) -> SubmissionRegistry {
    let mut registry = SubmissionRegistry::new();
    for (name, kinds) in submissions {
        registry
            .register(*name, *name, outcome(kinds.iter().copied()), &ExactKinds)
            .unwrap();
    }
    registry
}

fn options(min: usize) -> RunOptions {
    RunOptions {
        minimum_token_match: min,
        worker_threads: Some(2),
        ..RunOptions::default()
    }
}

fn template_and_copies() -> SubmissionRegistry {
    let template: Vec<u32> = (1..=6).collect();
    let solution: Vec<u32> = (1..=6).chain(20..=23).collect();
    let mut registry = registry(&[
        ("alice", solution.clone()),
        ("bob", solution),
        ("carol", (1..=6).chain(40..=45).collect()),
        ("template", template),
    ]);
    registry.designate_base_code("template").unwrap();
    registry
}

#[test]
fn normal_mode_pairs_each_submission_once() {
    let ids = [SubmissionId(0), SubmissionId(1), SubmissionId(2)];
    assert_eq!(
        comparison_pairs(&ids, ComparisonMode::Normal),
        vec![
            (SubmissionId(0), SubmissionId(1)),
            (SubmissionId(0), SubmissionId(2)),
            (SubmissionId(1), SubmissionId(2)),
        ]
    );
}

#[test]
fn ordered_mode_puts_later_submission_first() {
    let ids = [SubmissionId(0), SubmissionId(1), SubmissionId(2)];
    assert_eq!(
        comparison_pairs(&ids, ComparisonMode::Ordered),
        vec![
            (SubmissionId(1), SubmissionId(0)),
            (SubmissionId(2), SubmissionId(0)),
            (SubmissionId(2), SubmissionId(1)),
        ]
    );
    assert!(comparison_pairs(&ids[..1], ComparisonMode::Ordered).is_empty());
}

#[test]
fn base_code_positions_are_never_tiled() {
    let registry = template_and_copies();
    let outcome = compare_all(&registry, &options(3)).unwrap();

    assert_eq!(outcome.comparisons.len(), 3);
    assert_eq!(outcome.base_code_comparisons.len(), 3);
    for comparison in &outcome.comparisons {
        for tile in comparison.tiles() {
            assert!(tile.start_a >= 6 && tile.start_b >= 6, "{tile:?}");
        }
    }

    let alice_bob = &outcome.comparisons[0];
    assert_eq!(
        (alice_bob.first(), alice_bob.second()),
        (SubmissionId(0), SubmissionId(1))
    );
    assert_eq!(alice_bob.matched_tokens(), 4);
    assert_eq!(alice_bob.first_len(), 4);
    assert_eq!(alice_bob.similarity(SimilarityMetric::Avg), 1.0);

    let alice_carol = &outcome.comparisons[1];
    assert!(alice_carol.tiles().is_empty());
    assert_eq!(alice_carol.second_len(), 6);
}

#[test]
fn base_code_comparison_reports_template_share() {
    let registry = template_and_copies();
    let outcome = compare_all(&registry, &options(3)).unwrap();
    let alice = &outcome.base_code_comparisons[0];
    assert_eq!(alice.first(), SubmissionId(0));
    assert_eq!(alice.second(), SubmissionId(3));
    assert_eq!(alice.matched_tokens(), 6);
    assert!((alice.coverage_first() - 0.6).abs() < 1e-12);
    assert_eq!(alice.coverage_second(), 1.0);
}

#[test]
fn cached_masks_match_recomputed_masks() {
    let registry = template_and_copies();
    let outcome = compare_all(&registry, &options(3)).unwrap();
    let base_code = registry.base_code();
    for cached in &outcome.comparisons {
        let a = registry.get(cached.first()).unwrap();
        let b = registry.get(cached.second()).unwrap();
        let recomputed = compare_submissions(a, b, base_code, 3).unwrap();
        assert_eq!(&recomputed, cached);
    }
}

#[test]
fn comparisons_are_symmetric() {
    let registry = registry(&[
        ("a", vec![1, 2, 3, 4, 9, 5, 6, 7, 8]),
        ("b", vec![5, 6, 7, 8, 1, 2, 3, 4]),
    ]);
    let a = registry.get(SubmissionId(0)).unwrap();
    let b = registry.get(SubmissionId(1)).unwrap();
    let forward = compare_submissions(a, b, None, 2).unwrap();
    let backward = compare_submissions(b, a, None, 2).unwrap();
    assert_eq!(backward, forward.swapped());
    for metric in SimilarityMetric::ALL {
        assert_eq!(forward.similarity(metric), backward.similarity(metric));
    }
}

#[test]
fn ordered_mode_orients_results_later_first() {
    let registry = registry(&[
        ("first", vec![1, 2, 3, 4, 5]),
        ("second", vec![9, 1, 2, 3, 4, 5]),
    ]);
    let opts = RunOptions {
        comparison_mode: ComparisonMode::Ordered,
        ..options(2)
    };
    let outcome = compare_all(&registry, &opts).unwrap();
    let comparison = &outcome.comparisons[0];
    assert_eq!(comparison.first(), SubmissionId(1));
    assert_eq!(comparison.second(), SubmissionId(0));
    assert_eq!(comparison.tiles()[0].start_a, 1);
    assert_eq!(comparison.tiles()[0].start_b, 0);
    assert_eq!(comparison.first_len(), 6);
}

#[test]
fn coverage_stays_within_unit_interval() {
    let registry = registry(&[
        ("a", vec![1, 1, 1, 1, 1, 1]),
        ("b", vec![1, 1, 1]),
        ("c", vec![]),
    ]);
    let outcome = compare_all(&registry, &options(1)).unwrap();
    for comparison in &outcome.comparisons {
        for value in [comparison.coverage_first(), comparison.coverage_second()] {
            assert!((0.0..=1.0).contains(&value));
        }
    }
}

#[test]
fn failed_submissions_are_skipped() {
    let mut registry = registry(&[("a", vec![1, 2, 3]), ("b", vec![1, 2, 3])]);
    registry
        .register(
            "broken",
            "broken",
            TokenizeOutcome {
                tokens: TokenSequence::from_kinds([Symbol::new(1)]),
                has_errors: true,
            },
            &ExactKinds,
        )
        .unwrap();
    let outcome = compare_all(&registry, &options(2)).unwrap();
    assert_eq!(outcome.comparisons.len(), 1);
    assert!(!outcome.comparisons[0].involves(SubmissionId(2)));
}

#[test]
fn elapsed_deadline_aborts_the_run() {
    let registry = registry(&[("a", vec![1, 2, 3]), ("b", vec![1, 2, 3])]);
    let deadline = Deadline {
        at: Instant::now(),
        timeout: Duration::from_millis(5),
    };
    let err = compare_all_until(&registry, &options(2), Some(deadline)).unwrap_err();
    assert!(matches!(err, Error::Timeout(t) if t == Duration::from_millis(5)));
}

#[test]
fn zero_minimum_is_rejected_before_matching() {
    let registry = registry(&[("a", vec![1]), ("b", vec![1])]);
    let err = compare_all(&registry, &options(0)).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MinimumTokenMatch { value: 0 })
    ));
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    fn kinds() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(1u32..5, 0..60)
    }

    proptest! {
        #[test]
        fn either_orientation_gives_mirrored_tiles(a in kinds(), b in kinds(), min in 1usize..4) {
            let registry = registry(&[("a", a), ("b", b)]);
            let first = registry.get(SubmissionId(0)).unwrap();
            let second = registry.get(SubmissionId(1)).unwrap();
            let forward = compare_submissions(first, second, None, min).unwrap();
            let backward = compare_submissions(second, first, None, min).unwrap();
            prop_assert_eq!(backward, forward.swapped());
        }

        #[test]
        fn coverage_is_bounded_with_base_code(
            a in kinds(),
            b in kinds(),
            template in kinds(),
            min in 1usize..4,
        ) {
            let mut registry = registry(&[("a", a), ("b", b), ("template", template)]);
            registry.designate_base_code("template").unwrap();
            let outcome = compare_all(&registry, &options(min)).unwrap();
            let base = registry.base_code().unwrap();
            let base_mask = |id: SubmissionId| {
                base_code_mask(registry.get(id).unwrap(), base, min).unwrap().0
            };
            for comparison in &outcome.comparisons {
                prop_assert!((0.0..=1.0).contains(&comparison.coverage_first()));
                prop_assert!((0.0..=1.0).contains(&comparison.coverage_second()));
                let first_mask = base_mask(comparison.first());
                let second_mask = base_mask(comparison.second());
                for tile in comparison.tiles() {
                    prop_assert!(tile.length >= min);
                    prop_assert!(!first_mask.any_consumed(tile.range_a()));
                    prop_assert!(!second_mask.any_consumed(tile.range_b()));
                }
            }
        }
    }
}
