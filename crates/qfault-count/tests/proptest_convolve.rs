//! Property-based tests for count convolution.
//!
//! Tables are convolved under key XOR and weight multiplication, so the
//! trivial table is the identity and operand order does not matter.

use proptest::prelude::*;
use qfault_count::convolve::{convolve_counts, convolve_dict};
use qfault_count::result::{Counts, total_weight, trivial_counts};
use qfault_count::{Key, RuntimeContext, RuntimeFlags};
use qfault_ir::Bits;

/// Random single-block table with 4-bit keys.
fn arb_table() -> impl Strategy<Value = Counts<u64>> {
    prop::collection::hash_map(0u64..16, 1u64..100, 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, w)| (Key::new(vec![Bits::from(k)]), w))
            .collect()
    })
}

fn arb_orders() -> impl Strategy<Value = Vec<Counts<u64>>> {
    prop::collection::vec(arb_table(), 1..4)
}

proptest! {
    #[test]
    fn prop_trivial_is_identity(a in arb_table()) {
        prop_assert_eq!(convolve_dict(&a, &trivial_counts(1)), a.clone());
        prop_assert_eq!(convolve_dict(&trivial_counts(1), &a), a);
    }

    #[test]
    fn prop_convolution_commutes(a in arb_table(), b in arb_table()) {
        prop_assert_eq!(convolve_dict(&a, &b), convolve_dict(&b, &a));
    }

    #[test]
    fn prop_total_weight_multiplies(a in arb_table(), b in arb_table()) {
        let c = convolve_dict(&a, &b);
        prop_assert_eq!(total_weight(&c), total_weight(&a) * total_weight(&b));
    }

    #[test]
    fn prop_orders_commute(a in arb_orders(), b in arb_orders()) {
        let ctx = RuntimeContext::sequential();
        let ab = convolve_counts(&ctx, &a, &b, None).unwrap();
        let ba = convolve_counts(&ctx, &b, &a, None).unwrap();
        prop_assert_eq!(ab.len(), a.len() + b.len() - 1);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn prop_chunking_is_invisible(a in arb_orders(), b in arb_orders(), chunk_size in 1usize..5) {
        let whole = convolve_counts(&RuntimeContext::sequential(), &a, &b, None).unwrap();
        let chunked = RuntimeContext::sequential().with_flags(RuntimeFlags {
            memoize: false,
            chunk_size,
        });
        prop_assert_eq!(convolve_counts(&chunked, &a, &b, None).unwrap(), whole);
    }
}
