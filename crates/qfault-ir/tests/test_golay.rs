//! Golay corrector tests over every correctable pattern and every syndrome.

use qfault_ir::bits;
use qfault_ir::golay::{GOLAY, LENGTH, LOGICAL_SYNDROME_BITS, SYNDROME_BITS};
use qfault_ir::{Code, PauliError};

fn patterns_up_to_weight_3() -> Vec<u32> {
    let mut out = vec![0];
    for a in 0..LENGTH {
        out.push(1 << a);
        for b in (a + 1)..LENGTH {
            out.push((1 << a) | (1 << b));
            for c in (b + 1)..LENGTH {
                out.push((1 << a) | (1 << b) | (1 << c));
            }
        }
    }
    out
}

fn parity(pattern: u32) -> bool {
    bits::parity(u64::from(pattern))
}

#[test]
fn test_correctable_patterns_decode() {
    let patterns = patterns_up_to_weight_3();
    assert_eq!(patterns.len(), 1 + 23 + 253 + 1771);

    for e in patterns {
        let s = GOLAY.syndrome(e);
        let correction = GOLAY.correction(s);
        assert_eq!(GOLAY.decode(e), parity(e) != parity(correction), "pattern {e:023b}");
        assert!(correction.count_ones() <= 3, "pattern {e:023b}");
        assert_eq!(GOLAY.syndrome(correction), s, "pattern {e:023b}");
        assert!(!GOLAY.decode(e));
    }
}

#[test]
fn test_every_syndrome_round_trips() {
    // The Golay code is perfect: every syndrome has a weight-≤3 coset leader.
    for s in 0..(1u32 << SYNDROME_BITS) {
        let correction = GOLAY.correction(s);
        assert!(correction.count_ones() <= 3);
        assert_eq!(GOLAY.syndrome(correction), s);
        assert_eq!(GOLAY.correct(correction), 0);
    }
}

#[test]
fn test_every_logical_syndrome_round_trips() {
    for s in 0..(1u32 << LOGICAL_SYNDROME_BITS) {
        let e = GOLAY.error_for_syndrome(s);
        assert_eq!(GOLAY.logical_syndrome(e), s, "syndrome {s:012b}");

        // The correction cancels the syndrome; what is left is the parity
        // of the residual codeword, i.e. the decoded logical error.
        let residual = s ^ GOLAY.correct_logical_syndrome(s);
        assert_eq!(residual & ((1 << SYNDROME_BITS) - 1), 0, "syndrome {s:012b}");
        assert_eq!(residual >> SYNDROME_BITS == 1, GOLAY.decode_syndrome(s), "syndrome {s:012b}");
        assert_eq!(GOLAY.decode_syndrome(s), GOLAY.decode(e), "syndrome {s:012b}");

        assert_eq!(GOLAY.correct_syndrome(s), s & ((1 << SYNDROME_BITS) - 1));
    }
}

#[test]
fn test_logical_syndrome_of_correctable_patterns() {
    for e in patterns_up_to_weight_3() {
        let s = GOLAY.logical_syndrome(e);
        assert!(!GOLAY.decode_syndrome(s), "pattern {e:023b}");
        assert_eq!(GOLAY.correct_logical_syndrome(s), s, "pattern {e:023b}");
    }
}

#[test]
fn test_weight_four_pattern_is_logical() {
    // Four flips are corrected to a weight-7 codeword (odd weight).
    let e = 0b1111;
    assert_eq!(GOLAY.correct(e).count_ones(), 7);
    assert!(GOLAY.decode(e));
}

#[test]
fn test_golay_code_corrects_single_qubit_errors() {
    let code = Code::golay();
    for q in [0, 11, 22] {
        let e = PauliError::single(LENGTH, q, qfault_ir::Pauli::Y);
        assert!(code.detect_error(&e));
        assert!(code.decode_error(&e).is_identity(), "Y on qubit {q}");
    }
}

#[test]
fn test_golay_code_serializes() {
    let json = serde_json::to_string(&Code::golay()).unwrap();
    let code: Code = serde_json::from_str(&json).unwrap();
    assert_eq!(code.n(), LENGTH);
    assert_eq!(code.stabilizer_generators().len(), 22);
}
