//! Key manipulators.
//!
//! A [`KeyPropagator`] describes how a key changes when the error it stands
//! for passes through a piece of circuit, without re-deriving syndromes from
//! physical errors. It is an ordered chain of [`KeyOp`]s applied once per
//! count entry. An op returns `None` when the key is rejected by
//! postselection; the rest of the chain is then skipped.

use std::fmt;
use std::sync::Arc;

use qfault_ir::Weight;
use qfault_ir::bits::{self, Bits};
use rustc_hash::FxHashMap;

use crate::key::Key;
use crate::result::{Counts, add_count};

/// A user-supplied key transformation.
pub type KeyFn = Arc<dyn Fn(&Key) -> Option<Key> + Send + Sync>;

/// One step of a [`KeyPropagator`].
#[derive(Clone)]
pub enum KeyOp {
    /// Insert `num_blocks` zero blocks before block `index`.
    Extend {
        /// Number of blocks inserted.
        num_blocks: usize,
        /// Insertion point.
        index: usize,
    },
    /// Drop the blocks at `indices`.
    Remove {
        /// Block indices to drop.
        indices: Vec<usize>,
    },
    /// Reorder the first `permutation.len()` blocks: block `i` of the result
    /// is block `permutation[i]` of the input.
    Permute {
        /// The permutation.
        permutation: Vec<usize>,
    },
    /// Concatenate the first `lengths.len()` blocks into one, first block in
    /// the least significant bits.
    Merge {
        /// Key widths of the merged blocks.
        lengths: Vec<usize>,
    },
    /// `key[to] ^= key[from] & mask`. Out-of-range blocks are left alone.
    Copy {
        /// Source block.
        from: usize,
        /// Destination block.
        to: usize,
        /// Bits copied; `None` copies everything.
        mask: Option<Bits>,
    },
    /// AND the selected blocks (all blocks if `None`) with `mask`.
    Mask {
        /// Bits kept.
        mask: Bits,
        /// Blocks masked.
        blocks: Option<Vec<usize>>,
    },
    /// Clear the `n_norms` logical bits of block 0.
    SyndromeFilter {
        /// Number of normalizer bits.
        n_norms: usize,
    },
    /// Rotate blocks left by `r` (right for negative `r`).
    Rotate(isize),
    /// Split the key at `splits`, run `parts[i]` on part `i`, concatenate.
    Split {
        /// Ascending split points.
        splits: Vec<usize>,
        /// One propagator per part (`splits.len() + 1`).
        parts: Vec<KeyPropagator>,
    },
    /// Reject keys with any bit of `mask` set in `block`.
    RejectIf {
        /// Block tested.
        block: usize,
        /// Rejecting bits.
        mask: Bits,
    },
    /// Arbitrary transformation.
    Custom {
        /// Name used in descriptors.
        label: String,
        /// The transformation.
        f: KeyFn,
    },
}

impl KeyOp {
    /// Apply the op to `key`.
    pub fn apply(&self, key: Key) -> Option<Key> {
        let mut blocks = key.into_blocks();
        match self {
            KeyOp::Extend { num_blocks, index } => {
                let at = (*index).min(blocks.len());
                blocks.splice(at..at, std::iter::repeat_n(Bits::zero(), *num_blocks));
            }
            KeyOp::Remove { indices } => {
                blocks = blocks
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !indices.contains(i))
                    .map(|(_, b)| b)
                    .collect();
            }
            KeyOp::Permute { permutation } => {
                let n = permutation.len().min(blocks.len());
                let permuted: Vec<Bits> = permutation[..n]
                    .iter()
                    .map(|&p| blocks.get(p).cloned().unwrap_or_default())
                    .collect();
                blocks.splice(..n, permuted);
            }
            KeyOp::Merge { lengths } => {
                let n = lengths.len().min(blocks.len());
                let merged = bits::concatenate(&blocks[..n], lengths, true);
                blocks.splice(..n, std::iter::once(merged));
            }
            KeyOp::Copy { from, to, mask } => {
                if let (Some(src), true) = (blocks.get(*from), *to < blocks.len()) {
                    let copied = match mask {
                        Some(m) => src & m,
                        None => src.clone(),
                    };
                    blocks[*to] ^= copied;
                }
            }
            KeyOp::Mask { mask, blocks: selected } => match selected {
                Some(indices) => {
                    for &i in indices {
                        if let Some(b) = blocks.get_mut(i) {
                            *b &= mask;
                        }
                    }
                }
                None => {
                    for b in &mut blocks {
                        *b &= mask;
                    }
                }
            },
            KeyOp::SyndromeFilter { n_norms } => {
                if let Some(first) = blocks.first_mut() {
                    *first = (&*first >> *n_norms) << *n_norms;
                }
            }
            KeyOp::Rotate(r) => {
                let n = blocks.len();
                if n > 0 {
                    let r = r.rem_euclid(n as isize) as usize;
                    blocks.rotate_left(r);
                }
            }
            KeyOp::Split { splits, parts } => {
                let mut out = Vec::with_capacity(blocks.len());
                let mut last = 0;
                let bounds = splits.iter().copied().chain(std::iter::once(blocks.len()));
                for (i, split) in bounds.enumerate() {
                    let split = split.clamp(last, blocks.len());
                    let part = Key::new(blocks[last..split].to_vec());
                    let part = match parts.get(i) {
                        Some(p) => p.apply(&part)?,
                        None => part,
                    };
                    out.extend(part.into_blocks());
                    last = split;
                }
                blocks = out;
            }
            KeyOp::RejectIf { block, mask } => {
                if blocks.get(*block).is_some_and(|b| !(b & mask).is_zero()) {
                    return None;
                }
            }
            KeyOp::Custom { f, .. } => return f(&Key::new(blocks)),
        }
        Some(Key::new(blocks))
    }

    /// Stable text form, used for structural hashing.
    pub fn descriptor(&self) -> String {
        match self {
            KeyOp::Split { splits, parts } => {
                let parts: Vec<String> = parts.iter().map(KeyPropagator::descriptor).collect();
                format!("Split({splits:?}, [{}])", parts.join("; "))
            }
            KeyOp::Custom { label, .. } => format!("Custom({label})"),
            other => format!("{other:?}"),
        }
    }
}

impl fmt::Debug for KeyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOp::Extend { num_blocks, index } => f
                .debug_struct("Extend")
                .field("num_blocks", num_blocks)
                .field("index", index)
                .finish(),
            KeyOp::Remove { indices } => f.debug_struct("Remove").field("indices", indices).finish(),
            KeyOp::Permute { permutation } => f
                .debug_struct("Permute")
                .field("permutation", permutation)
                .finish(),
            KeyOp::Merge { lengths } => f.debug_struct("Merge").field("lengths", lengths).finish(),
            KeyOp::Copy { from, to, mask } => f
                .debug_struct("Copy")
                .field("from", from)
                .field("to", to)
                .field("mask", &mask.as_ref().map(ToString::to_string))
                .finish(),
            KeyOp::Mask { mask, blocks } => f
                .debug_struct("Mask")
                .field("mask", &mask.to_string())
                .field("blocks", blocks)
                .finish(),
            KeyOp::SyndromeFilter { n_norms } => f
                .debug_struct("SyndromeFilter")
                .field("n_norms", n_norms)
                .finish(),
            KeyOp::Rotate(r) => f.debug_tuple("Rotate").field(r).finish(),
            KeyOp::Split { splits, parts } => f
                .debug_struct("Split")
                .field("splits", splits)
                .field("parts", parts)
                .finish(),
            KeyOp::RejectIf { block, mask } => f
                .debug_struct("RejectIf")
                .field("block", block)
                .field("mask", &mask.to_string())
                .finish(),
            KeyOp::Custom { label, .. } => f.debug_struct("Custom").field("label", label).finish(),
        }
    }
}

/// An ordered chain of [`KeyOp`]s.
#[derive(Debug, Clone, Default)]
pub struct KeyPropagator {
    ops: Vec<KeyOp>,
}

impl KeyPropagator {
    /// The propagator that leaves keys unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A propagator with a single op.
    pub fn from_op(op: KeyOp) -> Self {
        Self { ops: vec![op] }
    }

    /// Append an op.
    #[must_use]
    pub fn push(mut self, op: KeyOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Run `self`, then `next`.
    #[must_use]
    pub fn then(mut self, next: KeyPropagator) -> Self {
        self.ops.extend(next.ops);
        self
    }

    /// True if the propagator has no ops.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// The ops, in application order.
    pub fn ops(&self) -> &[KeyOp] {
        &self.ops
    }

    /// Apply every op in order. `None` means the key was rejected.
    pub fn apply(&self, key: &Key) -> Option<Key> {
        self.ops
            .iter()
            .try_fold(key.clone(), |key, op| op.apply(key))
    }

    /// Stable text form, used for structural hashing.
    pub fn descriptor(&self) -> String {
        let ops: Vec<String> = self.ops.iter().map(KeyOp::descriptor).collect();
        ops.join(" -> ")
    }
}

/// Propagate every entry of `counts` through `propagator`.
///
/// Returns the propagated tables and, per order, the summed weight of the
/// rejected entries.
pub fn map_counts<W: Weight>(counts: &[Counts<W>], propagator: &KeyPropagator) -> (Vec<Counts<W>>, Vec<W>) {
    if propagator.is_identity() {
        return (counts.to_vec(), vec![W::zero(); counts.len()]);
    }
    let mut mapped = Vec::with_capacity(counts.len());
    let mut rejected = Vec::with_capacity(counts.len());
    for table in counts {
        let mut out: Counts<W> = FxHashMap::default();
        let mut lost = W::zero();
        for (key, weight) in table {
            match propagator.apply(key) {
                Some(k) => add_count(&mut out, k, weight),
                None => lost.accumulate(weight),
            }
        }
        mapped.push(out);
        rejected.push(lost);
    }
    (mapped, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[u64]) -> Key {
        Key::new(values.iter().map(|&v| Bits::from(v)).collect())
    }

    #[test]
    fn test_extend_and_remove() {
        let extend = KeyOp::Extend {
            num_blocks: 2,
            index: 1,
        };
        assert_eq!(extend.apply(key(&[1, 2])), Some(key(&[1, 0, 0, 2])));
        let remove = KeyOp::Remove {
            indices: vec![0, 2],
        };
        assert_eq!(remove.apply(key(&[1, 2, 3, 4])), Some(key(&[2, 4])));
    }

    #[test]
    fn test_permute_prefix() {
        let op = KeyOp::Permute {
            permutation: vec![1, 0],
        };
        assert_eq!(op.apply(key(&[1, 2, 3])), Some(key(&[2, 1, 3])));
    }

    #[test]
    fn test_merge_first_block_least_significant() {
        let op = KeyOp::Merge {
            lengths: vec![2, 2],
        };
        assert_eq!(op.apply(key(&[0b01, 0b10, 7])), Some(key(&[0b1001, 7])));
    }

    #[test]
    fn test_copy_with_mask() {
        let op = KeyOp::Copy {
            from: 0,
            to: 1,
            mask: Some(Bits::from(0b01)),
        };
        assert_eq!(op.apply(key(&[0b11, 0b10])), Some(key(&[0b11, 0b11])));
        let unmasked = KeyOp::Copy {
            from: 0,
            to: 1,
            mask: None,
        };
        assert_eq!(unmasked.apply(key(&[0b11, 0b10])), Some(key(&[0b11, 0b01])));
        // Out of range: unchanged.
        let far = KeyOp::Copy {
            from: 0,
            to: 5,
            mask: None,
        };
        assert_eq!(far.apply(key(&[1])), Some(key(&[1])));
    }

    #[test]
    fn test_mask_selected_and_all() {
        let some = KeyOp::Mask {
            mask: Bits::from(0b10),
            blocks: Some(vec![1]),
        };
        assert_eq!(some.apply(key(&[0b11, 0b11])), Some(key(&[0b11, 0b10])));
        let all = KeyOp::Mask {
            mask: Bits::from(0b10),
            blocks: None,
        };
        assert_eq!(all.apply(key(&[0b11, 0b01])), Some(key(&[0b10, 0])));
    }

    #[test]
    fn test_syndrome_filter() {
        let op = KeyOp::SyndromeFilter { n_norms: 2 };
        assert_eq!(op.apply(key(&[0b1111, 0b11])), Some(key(&[0b1100, 0b11])));
    }

    #[test]
    fn test_rotate() {
        assert_eq!(KeyOp::Rotate(1).apply(key(&[1, 2, 3])), Some(key(&[2, 3, 1])));
        assert_eq!(KeyOp::Rotate(-1).apply(key(&[1, 2, 3])), Some(key(&[3, 1, 2])));
        assert_eq!(KeyOp::Rotate(4).apply(key(&[1, 2, 3])), Some(key(&[2, 3, 1])));
        assert_eq!(KeyOp::Rotate(2).apply(Key::default()), Some(Key::default()));
    }

    #[test]
    fn test_split_applies_per_part() {
        let op = KeyOp::Split {
            splits: vec![1],
            parts: vec![
                KeyPropagator::identity(),
                KeyPropagator::from_op(KeyOp::Rotate(1)),
            ],
        };
        assert_eq!(op.apply(key(&[1, 2, 3])), Some(key(&[1, 3, 2])));
    }

    #[test]
    fn test_reject_if() {
        let op = KeyOp::RejectIf {
            block: 0,
            mask: Bits::from(0b10),
        };
        assert_eq!(op.apply(key(&[0b10])), None);
        assert_eq!(op.apply(key(&[0b01])), Some(key(&[0b01])));
    }

    #[test]
    fn test_chain_order_and_rejection() {
        let prop = KeyPropagator::identity()
            .push(KeyOp::Extend {
                num_blocks: 1,
                index: 0,
            })
            .push(KeyOp::Copy {
                from: 1,
                to: 0,
                mask: None,
            });
        assert_eq!(prop.apply(&key(&[5])), Some(key(&[5, 5])));
        let rejecting = prop.push(KeyOp::RejectIf {
            block: 0,
            mask: Bits::from(1),
        });
        assert_eq!(rejecting.apply(&key(&[5])), None);
        assert_eq!(rejecting.apply(&key(&[4])), Some(key(&[4, 4])));
    }

    #[test]
    fn test_map_counts_sums_and_rejects() {
        let mut table: Counts<u64> = FxHashMap::default();
        table.insert(key(&[0b01]), 2);
        table.insert(key(&[0b11]), 3);
        table.insert(key(&[0b10]), 5);
        let prop = KeyPropagator::from_op(KeyOp::RejectIf {
            block: 0,
            mask: Bits::from(0b10),
        })
        .push(KeyOp::Mask {
            mask: Bits::zero(),
            blocks: None,
        });
        let (mapped, rejected) = map_counts(&[table], &prop);
        assert_eq!(mapped[0].get(&key(&[0])), Some(&2));
        assert_eq!(mapped[0].len(), 1);
        assert_eq!(rejected, vec![8]);
    }

    #[test]
    fn test_custom_descriptor() {
        let op = KeyOp::Custom {
            label: "bell".to_string(),
            f: Arc::new(|k: &Key| Some(k.clone())),
        };
        assert_eq!(op.descriptor(), "Custom(bell)");
        assert_eq!(op.apply(key(&[3])), Some(key(&[3])));
    }
}
