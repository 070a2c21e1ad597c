//! Convolution of weighted count tables.
//!
//! Combining two independent fault distributions pairs every entry of one
//! table with every entry of the other: keys are XORed (Pauli composition)
//! and weights multiplied. Per fault order, the result at order `k` sums the
//! pairs of orders `(kA, kB)` with `kA + kB = k`.

use qfault_ir::Weight;
use tracing::{debug, instrument};

use crate::error::{CountError, CountingResult};
use crate::iteration::PartitionIterator;
use crate::key::Key;
use crate::leaf::merge_counts;
use crate::result::{Counts, add_count};
use crate::runtime::RuntimeContext;

/// Convolve two tables of the same fault order.
///
/// ```rust
/// use qfault_count::convolve::convolve_dict;
/// use qfault_count::key::Key;
/// use qfault_count::result::Counts;
/// use qfault_ir::Bits;
///
/// let key = |v: u64| Key::new(vec![Bits::from(v)]);
/// let a: Counts<u64> = [(key(0), 1), (key(1), 2)].into_iter().collect();
/// let b: Counts<u64> = [(key(0), 1), (key(2), 3)].into_iter().collect();
/// let c = convolve_dict(&a, &b);
/// assert_eq!(c[&key(3)], 6);
/// assert_eq!(c.len(), 4);
/// ```
pub fn convolve_dict<W: Weight>(a: &Counts<W>, b: &Counts<W>) -> Counts<W> {
    let mut out = Counts::default();
    for (kb, wb) in b {
        for (ka, wa) in a {
            add_count(&mut out, ka ^ kb, &wa.product(wb));
        }
    }
    out
}

fn convolve_slice<W: Weight>(a: &Counts<W>, b: &[(&Key, &W)]) -> Counts<W> {
    let mut out = Counts::default();
    for &(kb, wb) in b {
        for (ka, wa) in a {
            add_count(&mut out, ka ^ kb, &wa.product(wb));
        }
    }
    out
}

/// One unit of convolution work: orders `(ka, kb)` and a slice of the
/// right-hand table.
#[derive(Debug, Clone, Copy)]
struct ConvolveTask {
    ka: usize,
    kb: usize,
    start: usize,
    end: usize,
}

/// Convolve two per-order count lists.
///
/// The result has orders `0..=k_max`, where `k_max` defaults to (and is
/// capped at) the sum of the two inputs' highest orders. Right-hand tables
/// are cut into slices of `chunk_size` entries (sorted by key) so large
/// tables spread over the worker pool; partial results are merged in task
/// order.
#[instrument(skip(ctx, c1, c2), fields(len1 = c1.len(), len2 = c2.len()))]
pub fn convolve_counts<W: Weight>(
    ctx: &RuntimeContext,
    c1: &[Counts<W>],
    c2: &[Counts<W>],
    k_max: Option<usize>,
) -> CountingResult<Vec<Counts<W>>> {
    if c1.is_empty() || c2.is_empty() {
        return Ok(Vec::new());
    }
    let (k1_max, k2_max) = (c1.len() - 1, c2.len() - 1);
    let k_max = k_max.unwrap_or(k1_max + k2_max).min(k1_max + k2_max);

    let sorted: Vec<Vec<(&Key, &W)>> = c2
        .iter()
        .map(|table| {
            let mut entries: Vec<(&Key, &W)> = table.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            entries
        })
        .collect();
    let chunk = ctx.flags().chunk_size.max(1);

    let mut convolved = Vec::with_capacity(k_max + 1);
    for k in 0..=k_max {
        let mut tasks = Vec::new();
        for pair in PartitionIterator::new(k, 2, &[k1_max, k2_max]) {
            let (ka, kb) = (pair[0], pair[1]);
            let len = sorted[kb].len();
            tasks.extend((0..len).step_by(chunk).map(|start| ConvolveTask {
                ka,
                kb,
                start,
                end: (start + chunk).min(len),
            }));
        }
        let counts = ctx.map_reduce(
            &tasks,
            Counts::default(),
            |task| Ok(convolve_slice(&c1[task.ka], &sorted[task.kb][task.start..task.end])),
            merge_counts,
        )?;
        debug!(k, tasks = tasks.len(), keys = counts.len(), "Convolved order");
        convolved.push(counts);
    }
    Ok(convolved)
}

/// Convolve count lists whose keys have the given per-block widths.
///
/// The widths must agree on the common prefix; the result uses the longer
/// layout, with the shorter keys extended by zero blocks.
pub fn convolve_keyed<W: Weight>(
    ctx: &RuntimeContext,
    c1: &[Counts<W>],
    widths1: &[usize],
    c2: &[Counts<W>],
    widths2: &[usize],
    k_max: Option<usize>,
) -> CountingResult<Vec<Counts<W>>> {
    let common = widths1.len().min(widths2.len());
    if widths1[..common] != widths2[..common] {
        return Err(CountError::IncompatibleKeyLengths {
            left: widths1.to_vec(),
            right: widths2.to_vec(),
        });
    }
    convolve_counts(ctx, c1, c2, k_max)
}
