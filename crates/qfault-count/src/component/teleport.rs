//! Teleportation through an encoded Bell pair.
//!
//! [`Component::teleport_with_meas`] produces three blocks: the X- and
//! Z-measurement results of the Bell measurement (blocks 0 and 1) and the
//! teleported data (block 2), with the logical Pauli frame already applied
//! to the data. The other constructors trim or postselect on that output.

use std::fmt;
use std::sync::Arc;

use qfault_ir::{Bits, Block, ErrorType};

use super::{Component, KGood};
use crate::error::{CountError, CountingResult};
use crate::key::{Key, SyndromeKeyGenerator};
use crate::manipulator::{KeyOp, KeyPropagator};

/// Decides from a measured stabilizer syndrome whether error detection
/// accepts.
#[derive(Clone)]
pub struct SyndromeAcceptor {
    label: String,
    accept: Arc<dyn Fn(&Bits) -> bool + Send + Sync>,
}

impl SyndromeAcceptor {
    /// An acceptor named `label`. Acceptors with the same label must agree.
    pub fn new(label: impl Into<String>, accept: impl Fn(&Bits) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            accept: Arc::new(accept),
        }
    }

    /// Accept only the trivial syndrome.
    pub fn zero_syndrome() -> Self {
        Self::new("zeroSyndrome", Bits::is_zero)
    }

    /// Name used in descriptors.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True if `syndrome` is accepted.
    pub fn accepts(&self, syndrome: &Bits) -> bool {
        (self.accept)(syndrome)
    }
}

impl fmt::Debug for SyndromeAcceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyndromeAcceptor").field("label", &self.label).finish()
    }
}

impl Component {
    /// Teleport the first input block of `bell_meas` through `bell_pair`.
    ///
    /// The data block is joined by the Bell pair, measured together with its
    /// first half, and the second half becomes the output. With
    /// `enable_rest`, the output rests for one step during the measurement.
    pub fn teleport_with_meas(
        k_good: KGood,
        bell_pair: Component,
        bell_meas: Component,
        enable_rest: bool,
    ) -> CountingResult<Self> {
        let (meas_x, meas_z) = match bell_meas.out_blocks().as_slice() {
            [x, z] => (x.clone(), z.clone()),
            blocks => {
                return Err(CountError::InvalidResult {
                    expected: 2,
                    got: blocks.len(),
                });
            }
        };
        let out = match bell_pair.out_blocks().as_slice() {
            [_, out] => out.clone(),
            blocks => {
                return Err(CountError::InvalidResult {
                    expected: 2,
                    got: blocks.len(),
                });
            }
        };
        let data = bell_meas
            .in_blocks()
            .first()
            .cloned()
            .ok_or_else(|| CountError::Unsupported("Bell measurement without input".to_string()))?;

        let insert = Self::block_insert(vec![data.clone()], 1, bell_pair.in_blocks());
        let pair = Self::parallel(k_good, vec![Self::empty(data.code().clone(), data.name()), bell_pair])?;
        let meas = Self::parallel(k_good, vec![bell_meas, Self::empty(out.code().clone(), out.name())])?;
        let mut children = vec![insert, pair, meas];
        if enable_rest {
            children.push(Self::parallel(
                k_good,
                vec![
                    Self::empty(meas_x.code().clone(), meas_x.name()),
                    Self::empty(meas_z.code().clone(), meas_z.name()),
                    Self::trans_rest(k_good, out.code().clone(), out.name()),
                ],
            )?);
        }
        children.push(Self::teleport_correction(vec![meas_x, meas_z, out])?);
        Ok(Self::sequential(k_good, children)?.with_label("teleportWithMeas"))
    }

    /// Apply the logical corrections implied by the Bell measurement: the
    /// logical bits of both measurement blocks are copied onto the output.
    fn teleport_correction(blocks: Vec<Block>) -> CountingResult<Self> {
        let code = blocks[0].code().clone();
        let logical = code
            .logical_operators()
            .into_iter()
            .next()
            .ok_or_else(|| CountError::Unsupported(format!("{} has no logical qubit", code.name())))?;
        let checks = SyndromeKeyGenerator::for_code(&code).parity_checks();
        let logical_x = Bits::from_bools(checks.iter().map(|c| *c == logical.x));
        let logical_z = Bits::from_bools(checks.iter().map(|c| *c == logical.z));
        let propagator = KeyPropagator::from_op(KeyOp::Copy {
            from: 0,
            to: 2,
            mask: Some(logical_x),
        })
        .push(KeyOp::Copy {
            from: 1,
            to: 2,
            mask: Some(logical_z),
        });
        Ok(Self::filter_node("teleportCorrection", blocks.clone(), blocks, propagator, None))
    }

    /// [`Component::teleport_with_meas`] followed by discarding every block
    /// but `output_block` (2 keeps the teleported data).
    pub fn teleport(
        k_good: KGood,
        bell_pair: Component,
        bell_meas: Component,
        enable_rest: bool,
        output_block: usize,
    ) -> CountingResult<Self> {
        if output_block > 2 {
            return Err(CountError::Unsupported(format!(
                "teleportation has three output blocks, not {}",
                output_block + 1
            )));
        }
        let inner = Self::teleport_with_meas(k_good, bell_pair, bell_meas, enable_rest)?;
        let discard = Self::block_discard(inner.out_blocks(), (0..3).filter(|&i| i != output_block).collect());
        Ok(Self::sequential(k_good, vec![inner, discard])?.with_label("teleport"))
    }

    /// Teleportation with error detection: keys whose measured syndromes
    /// are not accepted are rejected and only the teleported block remains.
    ///
    /// `accept` defaults to [`SyndromeAcceptor::zero_syndrome`].
    pub fn teleport_ed(
        k_good: KGood,
        bell_pair: Component,
        bell_meas: Component,
        enable_rest: bool,
        accept: Option<SyndromeAcceptor>,
    ) -> CountingResult<Self> {
        let inner = Self::teleport_with_meas(k_good, bell_pair, bell_meas, enable_rest)?;
        let filter = Self::teleport_ed_filter(&inner, accept)?;
        Ok(Self::sequential(k_good, vec![inner, filter])?.with_label("teleportED"))
    }

    /// Error-detection postselection on the output of `teleport`, a
    /// [`Component::teleport_with_meas`].
    ///
    /// Both measurement blocks must be encoded in the same code, whose
    /// stabilizer bits must be contiguous in the key. Every stabilizer is
    /// used for detection, gauge stabilizers included.
    pub fn teleport_ed_filter(teleport: &Component, accept: Option<SyndromeAcceptor>) -> CountingResult<Self> {
        let in_blocks = teleport.out_blocks();
        let [meas_x, meas_z, out] = in_blocks.as_slice() else {
            return Err(CountError::InvalidResult {
                expected: 3,
                got: in_blocks.len(),
            });
        };
        if meas_x != meas_z {
            return Err(CountError::CodeMismatch(format!(
                "data block {meas_x} and ancilla block {meas_z}"
            )));
        }

        let code = meas_x.code();
        let stabilizers = code.stabilizer_generators();
        let checks = SyndromeKeyGenerator::for_code(code).parity_checks();
        let mask = Bits::from_bools(checks.iter().map(|c| stabilizers.contains(c)));
        let positions: Vec<usize> = mask.ones().collect();
        let shift = positions.first().copied().unwrap_or(0);
        if positions.iter().enumerate().any(|(i, &p)| p != shift + i) {
            return Err(CountError::Unsupported(format!(
                "stabilizer bits of {} are not contiguous",
                code.name()
            )));
        }

        let detect = match accept {
            None => KeyPropagator::from_op(KeyOp::RejectIf {
                block: 0,
                mask: mask.clone(),
            })
            .push(KeyOp::RejectIf { block: 1, mask }),
            Some(acceptor) => {
                let label = format!("accept.{}", acceptor.label());
                KeyPropagator::from_op(KeyOp::Custom {
                    label,
                    f: Arc::new(move |key: &Key| {
                        let syndrome = |i: usize| key.block(i).map(|b| &(b & &mask) >> shift).unwrap_or_default();
                        (acceptor.accepts(&syndrome(0)) && acceptor.accepts(&syndrome(1))).then(|| key.clone())
                    }),
                })
            }
        };
        let propagator = detect.push(KeyOp::Remove { indices: vec![0, 1] });
        let out_blocks = vec![out.clone()];
        Ok(Self::postselection(in_blocks.clone(), out_blocks, propagator, ErrorType::Y).with_label("teleportEDFilter"))
    }

    /// Keep the input keys that `ed` would accept, without teleporting them.
    ///
    /// The input is copied, one copy is passed through `ed` (faults
    /// included) and its output is then discarded.
    pub fn ed_input_filter(ed: Component) -> CountingResult<Self> {
        let k_good = ed.k_good();
        let in_blocks = ed.in_blocks();
        let n = in_blocks.len();
        let copy = (0..n).fold(
            KeyPropagator::from_op(KeyOp::Extend { num_blocks: n, index: n }),
            |p, i| {
                p.push(KeyOp::Copy {
                    from: i,
                    to: i + n,
                    mask: None,
                })
            },
        );
        let doubled: Vec<Block> = in_blocks.iter().chain(&in_blocks).cloned().collect();
        let fork = Self::filter_node("inputCopy", in_blocks.clone(), doubled, copy, None);

        let n_out = ed.out_blocks().len();
        let mut side = vec![ed];
        side.extend(in_blocks.iter().map(|b| Self::empty(b.code().clone(), b.name())));
        let tested = Self::parallel(k_good, side)?;
        let discard = Self::block_discard(tested.out_blocks(), (0..n_out).collect());
        Ok(Self::sequential(k_good, vec![fork, tested, discard])?.with_label("edInputFilter"))
    }
}
