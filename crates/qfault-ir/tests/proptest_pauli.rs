//! Property-based tests for Pauli error algebra and stabilizer keys.

use proptest::prelude::*;
use qfault_ir::{Code, Pauli, PauliError};

/// Random Pauli error on `len` qubits.
fn arb_pauli_error(len: usize) -> impl Strategy<Value = PauliError> {
    prop::collection::vec((any::<bool>(), any::<bool>()), len).prop_map(|bits| {
        let (x, z): (Vec<bool>, Vec<bool>) = bits.into_iter().unzip();
        PauliError::from_lists(&x, &z).unwrap()
    })
}

fn product_of(gens: &[PauliError], select: &[bool], len: usize) -> PauliError {
    gens.iter()
        .zip(select)
        .filter(|(_, s)| **s)
        .fold(PauliError::identity(len), |acc, (g, _)| &acc * g)
}

proptest! {
    #[test]
    fn prop_product_is_self_inverse(e in arb_pauli_error(7)) {
        prop_assert!((&e * &e).is_identity());
    }

    #[test]
    fn prop_product_commutes(a in arb_pauli_error(7), b in arb_pauli_error(7)) {
        prop_assert_eq!(&a * &b, &b * &a);
    }

    #[test]
    fn prop_commutation_is_symmetric(a in arb_pauli_error(9), b in arb_pauli_error(9)) {
        prop_assert_eq!(a.commutes_with(&b), b.commutes_with(&a));
    }

    #[test]
    fn prop_display_parses_back(e in arb_pauli_error(6)) {
        let parsed: PauliError = e.to_string().parse().unwrap();
        prop_assert_eq!(parsed, e);
    }

    #[test]
    fn prop_weight_counts_support(e in arb_pauli_error(10)) {
        let expected = e.to_list().iter().filter(|&&p| p != Pauli::I).count();
        prop_assert_eq!(e.weight(), expected);
        prop_assert_eq!(e.support().len(), expected);
    }

    /// Multiplying by a stabilizer leaves syndrome and decoded logical
    /// error unchanged.
    #[test]
    fn prop_stabilizer_equivalent_errors_agree(
        e in arb_pauli_error(4),
        select in prop::collection::vec(any::<bool>(), 2),
    ) {
        let code = Code::ed422(None);
        let s = product_of(&code.stabilizer_generators(), &select, 4);
        let f = &e * &s;
        prop_assert_eq!(code.syndrome(&e), code.syndrome(&f));
        prop_assert_eq!(code.decode_error(&e), code.decode_error(&f));
    }

    #[test]
    fn prop_golay_stabilizers_have_trivial_syndrome(
        select in prop::collection::vec(any::<bool>(), 22),
    ) {
        let code = Code::golay();
        let s = product_of(&code.stabilizer_generators(), &select, 23);
        prop_assert!(!code.detect_error(&s));
        prop_assert!(code.decode_error(&s).is_identity());
    }
}
