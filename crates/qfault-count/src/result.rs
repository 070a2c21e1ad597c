//! Weighted count tables and count results.

use qfault_ir::block::key_widths;
use qfault_ir::{Block, RationalFunction, Weight};
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::{CountError, CountingResult};
use crate::key::Key;
use crate::manipulator::KeyOp;

/// Summed weight per key, for one fault order.
pub type Counts<W> = FxHashMap<Key, W>;

/// `counts[key] += weight`.
pub fn add_count<W: Weight>(counts: &mut Counts<W>, key: Key, weight: &W) {
    match counts.get_mut(&key) {
        Some(w) => w.accumulate(weight),
        None => {
            counts.insert(key, weight.clone());
        }
    }
}

/// `{trivial key over num_blocks blocks: 1}`.
pub fn trivial_counts<W: Weight>(num_blocks: usize) -> Counts<W> {
    let mut counts = FxHashMap::default();
    counts.insert(Key::trivial(num_blocks), W::one());
    counts
}

/// Sum of all weights in a table.
pub fn total_weight<W: Weight>(counts: &Counts<W>) -> W {
    counts.values().fold(W::zero(), |mut acc, w| {
        acc.accumulate(w);
        acc
    })
}

/// Counts of a component, per fault order, together with the blocks the
/// keys span and the probability bounds attached by
/// [`Component::analyze`](crate::component::Component::analyze).
#[derive(Debug, Clone)]
pub struct CountResult<W: Weight> {
    /// `counts[k]` maps each key to the summed weight of the order-`k`
    /// fault configurations that produce it.
    pub counts: Vec<Counts<W>>,
    /// Blocks spanned by the keys, in key order.
    pub blocks: Vec<Block>,
    pr_accept: Option<RationalFunction>,
    pr_bad: Option<RationalFunction>,
}

impl<W: Weight> CountResult<W> {
    /// A result without attached bounds.
    pub fn new(counts: Vec<Counts<W>>, blocks: Vec<Block>) -> Self {
        Self {
            counts,
            blocks,
            pr_accept: None,
            pr_bad: None,
        }
    }

    /// The fault-free result over `blocks`.
    pub fn trivial(blocks: Vec<Block>) -> Self {
        let counts = vec![trivial_counts(blocks.len())];
        Self::new(counts, blocks)
    }

    /// Attach acceptance and failure bounds.
    #[must_use]
    pub fn with_bounds(mut self, pr_accept: RationalFunction, pr_bad: RationalFunction) -> Self {
        self.pr_accept = Some(pr_accept);
        self.pr_bad = Some(pr_bad);
        self
    }

    /// Highest fault order held.
    pub fn k_max(&self) -> usize {
        self.counts.len().saturating_sub(1)
    }

    /// Counts of order `k`.
    pub fn counts_at(&self, k: usize) -> CountingResult<&Counts<W>> {
        self.counts.get(k).ok_or(CountError::FaultOrderOutOfRange {
            k,
            k_max: self.k_max(),
        })
    }

    /// Total weight per order.
    pub fn summed(&self) -> Vec<W> {
        self.counts.iter().map(total_weight).collect()
    }

    /// Key widths of the blocks.
    pub fn key_widths(&self) -> Vec<usize> {
        key_widths(&self.blocks)
    }

    /// True if the result spans `expected_blocks` blocks and every key has
    /// that many entries.
    pub fn is_valid(&self, expected_blocks: usize) -> bool {
        self.blocks.len() == expected_blocks
            && self
                .counts
                .iter()
                .flat_map(|c| c.keys())
                .all(|key| key.len() == expected_blocks)
    }

    /// Error unless [`CountResult::is_valid`] holds.
    pub fn validate(&self, expected_blocks: usize) -> CountingResult<()> {
        if self.is_valid(expected_blocks) {
            return Ok(());
        }
        let got = self
            .counts
            .iter()
            .flat_map(|c| c.keys())
            .map(Key::len)
            .find(|&len| len != expected_blocks)
            .unwrap_or(self.blocks.len());
        Err(CountError::InvalidResult {
            expected: expected_blocks,
            got,
        })
    }

    /// Rotate keys and blocks left by `r` (right for negative `r`).
    #[must_use]
    pub fn rotated(mut self, r: isize) -> Self {
        let n = self.blocks.len();
        if n == 0 {
            return self;
        }
        let op = KeyOp::Rotate(r);
        self.counts = self
            .counts
            .into_iter()
            .map(|table| {
                table
                    .into_iter()
                    .filter_map(|(key, w)| op.apply(key).map(|k| (k, w)))
                    .collect()
            })
            .collect();
        self.blocks.rotate_left(r.rem_euclid(n as isize) as usize);
        self
    }

    /// Lower bound on the acceptance probability (1 if not attached).
    pub fn pr_accept(&self) -> RationalFunction {
        self.pr_accept.clone().unwrap_or_else(RationalFunction::one)
    }

    /// Upper bound on the probability of more than `k_good` faults (0 if not
    /// attached).
    pub fn pr_bad(&self) -> RationalFunction {
        self.pr_bad.clone().unwrap_or_else(RationalFunction::zero)
    }

    /// `pr_accept` at `gamma`.
    pub fn pr_accept_at(&self, gamma: f64) -> f64 {
        self.pr_accept().eval(gamma)
    }

    /// `pr_bad` at `gamma`. Values above 1 are vacuous and logged.
    pub fn pr_bad_at(&self, gamma: f64) -> f64 {
        let value = self.pr_bad().eval(gamma);
        if value > 1.0 {
            warn!(gamma, value, "Pr[bad] bound exceeds 1");
        }
        value
    }
}
