//! Probability bounds from weighted counts.
//!
//! Every bound has the form
//!
//! ```text
//! A · Σ_k c_k · L^k
//! ```
//!
//! where `A = Π (Pr[ideal]_type)^{n_type}` is the likelihood prefactor,
//! `L` is the noise model's likelihood (e.g. `γ / (1 − 15γ)`) and `c_k` the
//! summed weight of order-`k` fault configurations. The tail `Pr[k ≥ k_min]`
//! is the same sum with `c_k` replaced by the binomial count over location
//! types.

use qfault_ir::{Bound, LocationTotals, LocationType, NoiseModel, RationalFunction, Weight};
use tracing::{debug, instrument, warn};

use crate::error::CountingResult;
use crate::iteration::{PartitionIterator, binomial};
use crate::result::{CountResult, Counts, total_weight};
use crate::runtime::RuntimeContext;

/// Orders enumerated past `k_min` when the caller gives no ceiling.
const IMPLICIT_ORDERS: usize = 10;

/// `Π_type Pr[ideal]_type^{n_type}`.
pub fn likelihood_prefactor<W: Weight>(
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
    bound: Bound,
) -> RationalFunction {
    totals.iter().fold(RationalFunction::one(), |acc, (kind, n)| {
        &acc * &noise.pr_ideal(kind, bound).pow(n as u32)
    })
}

/// `A · Σ_k summed[k] · L^k`.
pub fn summed_counts_as_poly<W: Weight>(
    summed: &[W],
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
    bound: Bound,
) -> RationalFunction {
    let likelihood = noise.likelihood(bound);
    let sum: RationalFunction = summed
        .iter()
        .enumerate()
        .filter(|(_, w)| !w.is_zero())
        .map(|(k, w)| &w.to_rational() * &likelihood.pow(k as u32))
        .sum();
    &likelihood_prefactor(totals, noise, bound) * &sum
}

/// [`summed_counts_as_poly`] of the total weight per order.
pub fn counts_as_poly<W: Weight>(
    counts: &[Counts<W>],
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
    bound: Bound,
) -> RationalFunction {
    let summed: Vec<W> = counts.iter().map(total_weight).collect();
    summed_counts_as_poly(&summed, totals, noise, bound)
}

/// Upper bound `C(n, k) · pr^k` on the probability that an event with
/// probability `pr` occurs for at least `k` of `n` independent objects.
///
/// ```rust
/// use qfault_count::probability::pr_k_of_n_ub;
/// use qfault_ir::RationalFunction;
///
/// let pr = pr_k_of_n_ub(2, 4, &RationalFunction::constant(0.25));
/// assert!((pr.eval(0.0) - 0.375).abs() < 1e-12);
/// ```
pub fn pr_k_of_n_ub(k: usize, n: usize, pr: &RationalFunction) -> RationalFunction {
    pr.pow(k as u32).scale(binomial(n, k))
}

/// `Π_i C(totals_i, partition_i) · probs_i^{partition_i}`.
pub fn pr_failure_partition(
    totals: &[usize],
    probs: &[RationalFunction],
    partition: &[usize],
) -> RationalFunction {
    partition
        .iter()
        .zip(totals)
        .zip(probs)
        .fold(RationalFunction::one(), |acc, ((&k, &n), pr)| {
            &acc * &pr_k_of_n_ub(k, n, pr)
        })
}

/// Location types with equal total weight, merged.
struct WeightGroups {
    kinds: Vec<Vec<LocationType>>,
    totals: Vec<usize>,
    weights: Vec<RationalFunction>,
}

impl WeightGroups {
    fn new<W: Weight>(totals: &LocationTotals, noise: &dyn NoiseModel<Weight = W>) -> Self {
        let mut groups: Vec<(W, Vec<LocationType>, usize)> = Vec::new();
        for (kind, n) in totals.iter() {
            let weight = noise
                .error_list(kind)
                .iter()
                .fold(W::zero(), |mut acc, e| {
                    acc.accumulate(&noise.weight(kind, e, Bound::Upper));
                    acc
                });
            match groups.iter_mut().find(|(w, _, _)| *w == weight) {
                Some((_, kinds, total)) => {
                    kinds.push(kind);
                    *total += n;
                }
                None => groups.push((weight, vec![kind], n)),
            }
        }
        Self {
            totals: groups.iter().map(|g| g.2).collect(),
            weights: groups.iter().map(|g| g.0.to_rational()).collect(),
            kinds: groups.into_iter().map(|g| g.1).collect(),
        }
    }

    /// Upper bound on the failure probability of one location per group.
    /// Kinds in a group share their total weight, so any representative will do.
    fn pr_fail<W: Weight>(&self, noise: &dyn NoiseModel<Weight = W>) -> Vec<RationalFunction> {
        self.kinds
            .iter()
            .map(|kinds| {
                kinds
                    .first()
                    .map_or_else(RationalFunction::zero, |&kind| noise.pr_fail(kind, Bound::Upper))
            })
            .collect()
    }
}

/// `Σ over partitions of k of Π C(n_i, k_i) · probs_i^{k_i}`.
fn partition_sum(
    ctx: &RuntimeContext,
    k: usize,
    totals: &[usize],
    probs: &[RationalFunction],
) -> CountingResult<RationalFunction> {
    let partitions: Vec<Vec<usize>> = PartitionIterator::new(k, totals.len(), totals).collect();
    ctx.map_reduce(
        &partitions,
        RationalFunction::zero(),
        |partition| Ok(pr_failure_partition(totals, probs, partition)),
        |acc, pr| &acc + &pr,
    )
}

/// Upper bound on the probability that at least `k_min` (and at most
/// `k_max`) of the given locations fail.
///
/// Orders `k_min..=min(k_max, n)` are summed exactly. Without a `k_max`,
/// orders up to `k_min + 10` are summed and, if that leaves orders out, the
/// remainder is capped by the binomial bound at the next order using plain
/// failure probabilities (no prefactor).
#[instrument(skip(ctx, totals, noise), fields(n_locations = totals.total()))]
pub fn pr_at_least_k_failures<W: Weight>(
    ctx: &RuntimeContext,
    k_min: usize,
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
    k_max: Option<usize>,
) -> CountingResult<RationalFunction> {
    let n = totals.total();
    let (k_max, cap) = match k_max {
        Some(k_max) => (k_max, false),
        None => (k_min + IMPLICIT_ORDERS, true),
    };
    let k_end = k_max.min(n) + 1;

    let groups = WeightGroups::new(totals, noise);
    let likelihood = noise.likelihood(Bound::Upper);
    debug!(k_min, k_end, groups = ?groups.totals, noise = %noise.descriptor(), "Computing tail bound");

    let mut pr = RationalFunction::zero();
    for k in k_min..k_end {
        let weight = partition_sum(ctx, k, &groups.totals, &groups.weights)?;
        pr += &(&weight * &likelihood.pow(k as u32));
    }
    pr *= &likelihood_prefactor(totals, noise, Bound::Upper);

    if cap && n >= k_end {
        let remainder = partition_sum(ctx, k_end, &groups.totals, &groups.pr_fail(noise))?;
        debug!(k = k_end, "Adding tail cap");
        pr += &remainder;
    }
    Ok(pr)
}

/// Upper bound on the probability that more than `k_good` faults occur.
pub fn pr_bad_poly<W: Weight>(
    ctx: &RuntimeContext,
    k_good: usize,
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
    k_max: Option<usize>,
) -> CountingResult<RationalFunction> {
    pr_at_least_k_failures(ctx, k_good + 1, totals, noise, k_max)
}

/// `Pr[event] ≤ Pr[event, good] + Pr[bad]`, for `counts` of the event.
pub fn upper_bound_poly<W: Weight>(
    summed: &[W],
    pr_bad: &RationalFunction,
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
) -> RationalFunction {
    &summed_counts_as_poly(summed, totals, noise, Bound::Upper) + pr_bad
}

/// `1 − upper_bound_poly`, a lower bound on the complement of the event.
pub fn lower_bound_poly<W: Weight>(
    summed: &[W],
    pr_bad: &RationalFunction,
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
) -> RationalFunction {
    &RationalFunction::one() - &upper_bound_poly(summed, pr_bad, totals, noise)
}

/// Probability mass of a count result, conditioned on acceptance, plus its
/// `Pr[bad]`.
pub fn count_result_as_poly<W: Weight>(
    result: &CountResult<W>,
    totals: &LocationTotals,
    noise: &dyn NoiseModel<Weight = W>,
) -> RationalFunction {
    let mass = summed_counts_as_poly(&result.summed(), totals, noise, Bound::Upper);
    &(&mass / &result.pr_accept()) + &result.pr_bad()
}

/// Evaluate a bound at `gamma`, logging values above 1.
pub fn evaluate_bound(bound: &RationalFunction, gamma: f64, label: &str) -> f64 {
    let value = bound.eval(gamma);
    if value > 1.0 {
        warn!(label, gamma, value, "Probability bound exceeds 1");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfault_ir::{
        Basis, CountingNoiseModel, DepolarizingNoiseModel, ErrorType, Location, Locations,
        MarginalNoiseModel,
    };

    fn doctest_totals() -> LocationTotals {
        Locations::new(
            vec![
                Location::prep(Basis::Z, "test", 0),
                Location::prep(Basis::X, "test", 1),
                Location::cnot("test", 1, "test", 0),
                Location::meas(Basis::Z, "test", 1),
            ],
            "doctest",
        )
        .totals()
    }

    #[test]
    fn test_pr_k_of_n() {
        let pr = pr_k_of_n_ub(2, 4, &RationalFunction::constant(0.25));
        assert!((pr.eval(0.3) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_pr_failure_partition() {
        let probs = [RationalFunction::constant(0.1), RationalFunction::constant(0.2)];
        let pr = pr_failure_partition(&[4, 5], &probs, &[1, 2]);
        assert!((pr.eval(0.0) - 0.16).abs() < 1e-12);
    }

    #[test]
    fn test_pr_at_least_explicit_k_max() {
        let ctx = RuntimeContext::sequential();
        let pr =
            pr_at_least_k_failures(&ctx, 1, &doctest_totals(), &DepolarizingNoiseModel, Some(2))
                .unwrap();
        assert!((pr.eval(0.01) - 0.262610462117647).abs() < 1e-12);
    }

    #[test]
    fn test_pr_at_least_implicit_k_max() {
        let ctx = RuntimeContext::sequential();
        let pr = pr_at_least_k_failures(&ctx, 1, &doctest_totals(), &DepolarizingNoiseModel, None)
            .unwrap();
        assert!((pr.eval(0.01) - 0.263584338015876).abs() < 1e-12);
    }

    #[test]
    fn test_cap_added_when_orders_are_left_out() {
        let ctx = RuntimeContext::sequential();
        let mut totals = LocationTotals::default();
        totals.record(LocationType::Rest, 30);
        let noise = MarginalNoiseModel::new(ErrorType::X);
        let exact = pr_at_least_k_failures(&ctx, 1, &totals, &noise, Some(11)).unwrap();
        let capped = pr_at_least_k_failures(&ctx, 1, &totals, &noise, None).unwrap();
        // The cap is C(30, 12) · (8γ)^12.
        let gamma = 0.01;
        let cap = binomial(30, 12) * (8.0f64 * gamma).powi(12);
        let added = capped.eval(gamma) - exact.eval(gamma);
        assert!((added - cap).abs() < 1e-6 * cap);
    }

    #[test]
    fn test_pr_bad_is_tail_above_k_good() {
        let ctx = RuntimeContext::sequential();
        let totals = doctest_totals();
        let noise = DepolarizingNoiseModel;
        let bad = pr_bad_poly(&ctx, 0, &totals, &noise, Some(2)).unwrap();
        let tail = pr_at_least_k_failures(&ctx, 1, &totals, &noise, Some(2)).unwrap();
        assert_eq!(bad.eval(0.01), tail.eval(0.01));
    }

    #[test]
    fn test_counts_as_poly_order_zero_is_prefactor() {
        let totals = doctest_totals();
        let noise = DepolarizingNoiseModel;
        let poly = summed_counts_as_poly(&[1u64], &totals, &noise, Bound::Upper);
        let expected = (1.0 - 15.0 * 0.01) * (1.0f64 - 4.0 * 0.01).powi(3);
        assert!((poly.eval(0.01) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_are_complementary() {
        let mut totals = LocationTotals::default();
        totals.record(LocationType::Rest, 2);
        let noise = CountingNoiseModel::new(ErrorType::X);
        let pr_bad = RationalFunction::constant(0.01);
        let upper = upper_bound_poly(&[0u64, 2], &pr_bad, &totals, &noise);
        let lower = lower_bound_poly(&[0u64, 2], &pr_bad, &totals, &noise);
        assert!((upper.eval(0.1) + lower.eval(0.1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_count_result_as_poly() {
        let totals = LocationTotals::default();
        let noise = CountingNoiseModel::new(ErrorType::X);
        let result = CountResult::<u64>::trivial(Vec::new())
            .with_bounds(RationalFunction::constant(0.5), RationalFunction::constant(0.25));
        let poly = count_result_as_poly(&result, &totals, &noise);
        assert!((poly.eval(0.1) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_bound() {
        assert_eq!(evaluate_bound(&RationalFunction::constant(3.0), 0.1, "loose"), 3.0);
    }
}
