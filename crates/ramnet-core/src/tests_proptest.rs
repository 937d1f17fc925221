//! Property-based checks for mapping, training, bleaching and persistence

use proptest::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bleaching::{resolve, ResponseMatrix};
    use crate::codec;
    use crate::error::RamnetError;
    use crate::mapping::Mapping;
    use crate::memory::Counter;
    use crate::Classifier;

    /// (L, T) with 1 <= T <= min(L, 64)
    fn dimensions() -> impl Strategy<Value = (usize, usize)> {
        (1usize..200).prop_flat_map(|l| (Just(l), 1usize..=l.min(64)))
    }

    /// Small model shape plus a list of (pattern, label) training samples
    fn training_run() -> impl Strategy<Value = (usize, usize, usize, u64, Vec<(Vec<bool>, usize)>)> {
        (4usize..24, 1usize..4, any::<u64>()).prop_flat_map(|(l, c, seed)| {
            (
                Just(l),
                1usize..=l.min(8),
                Just(c),
                Just(seed),
                prop::collection::vec((prop::collection::vec(any::<bool>(), l), 0..c), 0..20),
            )
        })
    }

    // =========================================================================
    // Mapping
    // =========================================================================
    proptest! {
        #[test]
        fn test_mapping_is_deterministic((l, t) in dimensions(), seed in any::<u64>()) {
            let a = Mapping::build(l, t, seed).unwrap();
            let b = Mapping::build(l, t, seed).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn test_mapping_partitions_positions((l, t) in dimensions(), seed in any::<u64>()) {
            let mapping = Mapping::build(l, t, seed).unwrap();
            prop_assert_eq!(mapping.tuple_count(), l.div_ceil(t));

            let mut seen = vec![0u8; l];
            for tuple in mapping.tuples() {
                prop_assert!(!tuple.is_empty() && tuple.len() <= t);
                for &p in tuple {
                    seen[p] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&n| n == 1));
        }
    }

    // =========================================================================
    // Training
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_training_is_monotone_and_saturates(
            pattern in prop::collection::vec(any::<bool>(), 16),
            limit in 1u32..6,
            repeats in 1usize..12,
        ) {
            let config = crate::ClassifierConfig::new(16, 4, 1, 3).with_saturation(limit);
            let mut model = Classifier::from_config(&config).unwrap();
            let mut previous: Vec<Counter> = vec![0; model.tuple_count()];
            for _ in 0..repeats {
                model.train(&pattern, 0).unwrap();
                let row = model.responses(&pattern).unwrap().row(0).to_vec();
                for (now, before) in row.iter().zip(&previous) {
                    prop_assert!(now >= before);
                    prop_assert!(*now <= limit);
                }
                previous = row;
            }
            let expected = (repeats as u32).min(limit);
            prop_assert!(previous.iter().all(|&c| c == expected));
        }
    }

    // =========================================================================
    // Bleaching
    // =========================================================================
    proptest! {
        #[test]
        fn test_identical_rows_resolve_to_class_zero(
            row in prop::collection::vec(0u32..50, 1..12),
            classes in 2usize..6,
        ) {
            let m = ResponseMatrix::from_rows(vec![row; classes]).unwrap();
            let r = resolve(&m);
            prop_assert_eq!(r.label, 0);
            prop_assert!(r.fallback);
        }

        #[test]
        fn test_resolution_is_a_valid_label(
            rows in (1usize..6, 1usize..10).prop_flat_map(|(c, n)| {
                prop::collection::vec(prop::collection::vec(0u32..20, n), c)
            }),
        ) {
            let m = ResponseMatrix::from_rows(rows).unwrap();
            let r = resolve(&m);
            prop_assert!(r.label < m.classes());
            prop_assert!((0.0..=1.0).contains(&r.confidence));
            prop_assert_eq!(resolve(&m), r);
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn test_export_import_round_trip((l, t, c, seed, samples) in training_run()) {
            let mut model = Classifier::new(l, t, c, seed).unwrap();
            for (pattern, label) in &samples {
                model.train(pattern, *label).unwrap();
            }
            let mut bytes = Vec::new();
            model.export(&mut bytes).unwrap();
            let mut restored = Classifier::import(bytes.as_slice()).unwrap();
            prop_assert_eq!(&restored, &model);

            for (pattern, _) in &samples {
                prop_assert_eq!(restored.classify(pattern).unwrap(), model.classify(pattern).unwrap());
            }
            // keeps learning identically after the reload
            if let Some((pattern, label)) = samples.first() {
                model.train(pattern, *label).unwrap();
                restored.train(pattern, *label).unwrap();
                prop_assert_eq!(restored, model);
            }
        }

        #[test]
        fn test_truncated_stream_is_format_error(
            (l, t, c, seed, samples) in training_run(),
            cut in any::<prop::sample::Index>(),
        ) {
            let mut model = Classifier::new(l, t, c, seed).unwrap();
            for (pattern, label) in &samples {
                model.train(pattern, *label).unwrap();
            }
            let bytes = codec::encode(&model).unwrap();
            let len = cut.index(bytes.len());
            prop_assert!(matches!(codec::decode(&bytes[..len]), Err(RamnetError::Format(_))));
        }
    }
}
