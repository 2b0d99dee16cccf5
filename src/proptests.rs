use super::*;
use crate::point::first_diff_bit;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Interleaved-bit comparison: the order the trie enumerates in.
fn z_order_cmp<const D: usize>(a: &PhPoint<D>, b: &PhPoint<D>) -> Ordering {
    let (ab, bb) = (a.to_bits(), b.to_bits());
    let Some(bit) = first_diff_bit(&ab, &bb, None) else {
        return Ordering::Equal;
    };
    for d in 0..D {
        let (x, y) = ((ab[d] >> bit) & 1, (bb[d] >> bit) & 1);
        if x != y {
            return x.cmp(&y);
        }
    }
    unreachable!("some dimension differs at the first differing bit")
}

#[derive(Clone, Copy, Debug, Arbitrary)]
struct Coord(#[proptest(strategy = "coord_value()")] i64);

fn coord_value() -> impl Strategy<Value = i64> {
    // Mostly a tiny range so keys collide and split deep in the tree.
    prop_oneof![
        8 => -16i64..16,
        1 => any::<i64>(),
        1 => prop_oneof![Just(i64::MIN), Just(i64::MAX), Just(-1i64), Just(0i64)],
    ]
}

#[derive(Clone, Copy, Debug, Arbitrary)]
enum OpKind {
    #[proptest(weight = 5)]
    Insert,
    #[proptest(weight = 2)]
    Emplace,
    #[proptest(weight = 3)]
    Get,
    #[proptest(weight = 1)]
    Iterate,
}

fn key_strategy<const D: usize>() -> impl Strategy<Value = PhPoint<D>> {
    prop::collection::vec(any::<Coord>(), D)
        .prop_map(|cs| PhPoint::new(std::array::from_fn(|i| cs[i].0)))
}

fn ops_strategy<const D: usize>() -> impl Strategy<Value = Vec<(OpKind, PhPoint<D>, u32)>> {
    prop::collection::vec((any::<OpKind>(), key_strategy::<D>(), any::<u32>()), 0..=500)
}

fn run_against_model<const D: usize>(
    config: PhTreeConfig,
    ops: Vec<(OpKind, PhPoint<D>, u32)>,
) -> std::result::Result<(), TestCaseError> {
    let mut t: PhTree<u32, D> = PhTree::with_config(config).unwrap();
    let mut m: BTreeMap<[i64; D], u32> = BTreeMap::new();

    for (kind, key, value) in ops {
        match kind {
            OpKind::Insert => {
                prop_assert_eq!(t.insert(key, value), m.insert(*key.coords(), value));
            }
            OpKind::Emplace => {
                let was_present = m.contains_key(key.coords());
                let expected = *m.entry(*key.coords()).or_insert(value);
                let (stored, inserted) = t.emplace(key, value);
                prop_assert_eq!(*stored, expected);
                prop_assert_eq!(inserted, !was_present);
            }
            OpKind::Get => {
                prop_assert_eq!(t.get(&key), m.get(key.coords()));
                prop_assert_eq!(t.contains_key(&key), m.contains_key(key.coords()));
            }
            OpKind::Iterate => {
                prop_assert_eq!(t.iter().count(), m.len());
            }
        }
        prop_assert_eq!(t.len(), m.len());
    }

    t.check_consistency();

    let entries: Vec<(PhPoint<D>, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(entries.len(), m.len());
    for w in entries.windows(2) {
        prop_assert_eq!(z_order_cmp(&w[0].0, &w[1].0), Ordering::Less);
    }

    let mut sorted: Vec<([i64; D], u32)> = entries.iter().map(|(k, v)| (*k.coords(), *v)).collect();
    sorted.sort_unstable();
    let expected: Vec<([i64; D], u32)> = m.into_iter().collect();
    prop_assert_eq!(sorted, expected);

    let again: Vec<(PhPoint<D>, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(again, entries);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_d1(ops in ops_strategy::<1>()) {
        run_against_model(PhTreeConfig::default(), ops)?;
    }

    #[test]
    fn prop_equivalence_d3_dense(ops in ops_strategy::<3>()) {
        run_against_model(PhTreeConfig::default(), ops)?;
    }

    #[test]
    fn prop_equivalence_d3_sparse(ops in ops_strategy::<3>()) {
        run_against_model(PhTreeConfig { dense_max_dim: 0 }, ops)?;
    }

    #[test]
    fn prop_equivalence_d6_sparse(ops in ops_strategy::<6>()) {
        run_against_model(PhTreeConfig::default(), ops)?;
    }

    #[test]
    fn prop_equivalence_d6_dense(ops in ops_strategy::<6>()) {
        run_against_model(PhTreeConfig { dense_max_dim: 6 }, ops)?;
    }

    #[test]
    fn prop_into_iter_matches_iter(keys in prop::collection::vec(key_strategy::<2>(), 0..=300)) {
        let t: PhTree<usize, 2> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
        let borrowed: Vec<(PhPoint<2>, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let owned: Vec<(PhPoint<2>, usize)> = t.into_iter().collect();
        prop_assert_eq!(owned, borrowed);
    }
}
