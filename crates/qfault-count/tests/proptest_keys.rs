//! Property-based tests for syndrome keys.

use proptest::prelude::*;
use qfault_count::SyndromeKeyGenerator;
use qfault_ir::golay::LENGTH;
use qfault_ir::{Bits, Code, PauliError};

fn x_error(len: usize, qubits: &[usize]) -> PauliError {
    let x = Bits::from_bools((0..len).map(|q| qubits.contains(&q)));
    PauliError::from_parts(len, x, Bits::zero())
}

fn arb_pauli_error(len: usize) -> impl Strategy<Value = PauliError> {
    prop::collection::vec((any::<bool>(), any::<bool>()), len).prop_map(|bits| {
        let (x, z): (Vec<bool>, Vec<bool>) = bits.into_iter().unzip();
        PauliError::from_lists(&x, &z).unwrap()
    })
}

proptest! {
    #[test]
    fn prop_key_ignores_stabilizers(
        e in arb_pauli_error(LENGTH),
        select in prop::collection::vec(any::<bool>(), 22),
    ) {
        let code = Code::golay();
        let keygen = SyndromeKeyGenerator::for_code(&code);
        let s = code
            .stabilizer_generators()
            .iter()
            .zip(&select)
            .filter(|(_, on)| **on)
            .fold(PauliError::identity(LENGTH), |acc, (g, _)| &acc * g);
        prop_assert_eq!(keygen.key(&e), keygen.key(&(&e * &s)));
    }

    #[test]
    fn prop_key_is_linear(a in arb_pauli_error(4), b in arb_pauli_error(4)) {
        let keygen = SyndromeKeyGenerator::for_code(&Code::ed422(None));
        let sum = &keygen.key(&a) ^ &keygen.key(&b);
        prop_assert_eq!(keygen.key(&(&a * &b)), sum);
    }

    /// Distinct X errors of weight at most 3 differ by less than the
    /// distance, so their keys differ too.
    #[test]
    fn prop_low_weight_golay_keys_are_distinct(
        a in prop::collection::btree_set(0..LENGTH, 0..=3),
        b in prop::collection::btree_set(0..LENGTH, 0..=3),
    ) {
        prop_assume!(a != b);
        let keygen = SyndromeKeyGenerator::for_code(&Code::golay());
        let a: Vec<usize> = a.into_iter().collect();
        let b: Vec<usize> = b.into_iter().collect();
        prop_assert_ne!(keygen.key(&x_error(LENGTH, &a)), keygen.key(&x_error(LENGTH, &b)));
    }
}
