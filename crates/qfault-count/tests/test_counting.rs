//! End-to-end counting tests over small gadgets.

use std::sync::Arc;

use qfault_count::iteration::binomial;
use qfault_count::{Component, CountResult, KGood, Key, KeyOp, KeyPropagator, RuntimeContext};
use qfault_ir::{
    Basis, Bits, Block, Code, ErrorType, Location, LocationType, Locations, NoiseModel, NoiseModels,
    SharedNoiseModel, TransformedNoiseModel,
};

const I: u64 = 0b00;
const X: u64 = 0b01;
const Z: u64 = 0b10;
const Y: u64 = 0b11;

fn key(values: &[u64]) -> Key {
    Key::new(values.iter().map(|&v| Bits::from(v)).collect())
}

fn trivial() -> Arc<Code> {
    Arc::new(Code::trivial())
}

fn weight_of(result: &CountResult<u64>, k: usize, values: &[u64]) -> u64 {
    result.counts[k].get(&key(values)).copied().unwrap_or(0)
}

#[test]
fn test_single_rest_counts_model_weights() {
    let ctx = RuntimeContext::sequential();
    let noise = NoiseModels::depolarizing();
    let rest = Component::trans_rest(KGood::uniform(1), trivial(), "q");
    let result = rest.count(&ctx, &noise, ErrorType::Y, None, None).unwrap();

    assert_eq!(result.k_max(), 1);
    assert_eq!(result.counts[0].len(), 1);
    assert_eq!(weight_of(&result, 0, &[I]), 1);
    assert_eq!(result.counts[1].len(), 3);
    for outcome in [X, Z, Y] {
        assert_eq!(weight_of(&result, 1, &[outcome]), 4);
    }

    // Marginal X model: only the X outcome, with the rest weight.
    let x_only = rest.count(&ctx, &noise, ErrorType::X, None, None).unwrap();
    assert_eq!(x_only.counts[1].len(), 1);
    assert_eq!(weight_of(&x_only, 1, &[X]), 8);
}

#[test]
fn test_two_sequential_rests_fail_once() {
    let ctx = RuntimeContext::sequential();
    let noise = NoiseModels::depolarizing();
    let rest = Component::trans_rest(KGood::uniform(1), trivial(), "q");
    let single = rest.count(&ctx, &noise, ErrorType::Y, None, None).unwrap();
    let twice = Component::sequential(KGood::uniform(1), vec![rest.clone(), rest])
        .unwrap()
        .count(&ctx, &noise, ErrorType::Y, None, None)
        .unwrap();

    assert_eq!(twice.k_max(), 1);
    assert_eq!(twice.counts[0], single.counts[0]);
    assert_eq!(twice.counts[1].len(), single.counts[1].len());
    for (k, w) in &single.counts[1] {
        assert_eq!(twice.counts[1].get(k), Some(&(2 * w)));
    }
}

#[test]
fn test_cnot_then_measurement_leaf() {
    let ctx = RuntimeContext::sequential();
    let locations = Locations::new(
        vec![
            Location::cnot("test1", 0, "test2", 0),
            Location::meas(Basis::X, "test2", 0),
        ],
        "cnot-meas",
    );
    let blocks = vec![Block::new("test1", trivial()), Block::new("test2", trivial())];
    let leaf = Component::leaf(KGood::uniform(1), locations, blocks, KeyPropagator::identity()).unwrap();
    let result = leaf
        .count(&ctx, &NoiseModels::counting(), ErrorType::Y, None, None)
        .unwrap();

    let expected = [
        ([Z, Z], 2),
        ([I, I], 1),
        ([I, Z], 3),
        ([X, Z], 2),
        ([X, I], 2),
        ([Y, Z], 2),
        ([Y, I], 2),
        ([Z, I], 2),
    ];
    assert_eq!(result.counts[1].len(), expected.len());
    for (values, w) in expected {
        assert_eq!(weight_of(&result, 1, &values), w, "key {values:?}");
    }
}

#[test]
fn test_mass_bound() {
    let ctx = RuntimeContext::sequential();
    let code = Arc::new(Code::ed422(None));
    let cnot = Component::trans_cnot(KGood::uniform(2), code.clone(), code).unwrap();
    let result = cnot
        .count(&ctx, &NoiseModels::counting(), ErrorType::Y, None, None)
        .unwrap();

    // Four CNOTs with 15 outcomes each; unit weights reach the bound exactly.
    for (k, total) in result.summed().into_iter().enumerate() {
        let bound = binomial(4, k) * 15f64.powi(k as i32);
        assert!(total as f64 <= bound);
        assert_eq!(total as f64, bound, "order {k}");
    }
}

#[test]
fn test_worker_pool_matches_sequential() {
    let code = Arc::new(Code::ed422(None));
    let cnot = Component::trans_cnot(KGood::uniform(2), code.clone(), code.clone()).unwrap();
    let rest = Component::trans_rest(KGood::uniform(2), Arc::new(code.underlying().clone()), "ctrl");
    let rests = Component::parallel(
        KGood::uniform(2),
        vec![rest, Component::trans_rest(KGood::uniform(2), Arc::new(code.underlying().clone()), "targ")],
    )
    .unwrap();
    let gadget = Component::sequential(KGood::uniform(2), vec![cnot, rests]).unwrap();
    let noise = NoiseModels::depolarizing();

    let sequential = gadget
        .count(&RuntimeContext::sequential(), &noise, ErrorType::Y, None, None)
        .unwrap();
    let pooled = gadget
        .count(&RuntimeContext::with_workers(4).unwrap(), &noise, ErrorType::Y, None, None)
        .unwrap();
    assert_eq!(sequential.counts, pooled.counts);
    assert_eq!(sequential.k_max(), 2);
}

#[test]
fn test_bounds_are_monotone() {
    let ctx = RuntimeContext::sequential();
    let noise = NoiseModels::depolarizing();
    let code = Arc::new(Code::ed422(None));
    let block = Block::new("q", code.clone());

    // Reject any key with a non-zero stabilizer syndrome. Key bits, high to
    // low: XXXX, ZZZZ, logical X, logical Z.
    let reject = KeyPropagator::from_op(KeyOp::RejectIf {
        block: 0,
        mask: Bits::from(0b1100),
    });
    let gadget = Component::sequential(
        KGood::uniform(1),
        vec![
            Component::trans_rest(KGood::uniform(1), code, "q"),
            Component::postselection(vec![block.clone()], vec![block], reject, ErrorType::Y),
        ],
    )
    .unwrap();

    let model: &dyn NoiseModel<Weight = u64> = &**noise.get(ErrorType::Y);
    let pr_bad = gadget.pr_bad(&ctx, model, ErrorType::Y, None).unwrap();
    let pr_accept = gadget.pr_accept(&ctx, &noise, None, None).unwrap();
    let d_bad = pr_bad.derivative();
    let d_accept = pr_accept.derivative();

    for i in 0..=50 {
        let gamma = f64::from(i) * 1e-4;
        assert!(d_bad.eval(gamma) >= 0.0, "Pr[bad] decreasing at {gamma}");
        assert!(d_accept.eval(gamma) <= 0.0, "Pr[accept] increasing at {gamma}");
    }
    assert!(pr_accept.eval(1e-3) < 1.0);
    assert!(pr_accept.eval(1e-3) > 0.9);
}

#[test]
fn test_analyze_attaches_bounds() {
    let ctx = RuntimeContext::sequential();
    let code = Arc::new(Code::golay());
    let rest = Component::trans_rest(KGood::uniform(1), code, "q");
    let result = rest.analyze(&ctx, &NoiseModels::depolarizing(), ErrorType::Y).unwrap();

    // 23 rests, 3 outcomes of weight 4 each.
    assert_eq!(result.summed(), vec![1, 23 * 12]);
    assert_eq!(result.pr_accept_at(1e-3), 1.0);
    let pr_bad = result.pr_bad_at(1e-4);
    assert!(pr_bad > 0.0 && pr_bad < 1e-3);
}

#[test]
fn test_concatenation_merges_subblock_keys() {
    let ctx = RuntimeContext::sequential();
    let top = Arc::new(Code::ed422(None));
    let bottom = trivial();
    let rests: Vec<Component> = (0..4)
        .map(|i| Component::trans_rest(KGood::uniform(1), bottom.clone(), format!("Subblock{i}")))
        .collect();
    let level = Component::parallel(KGood::uniform(1), rests).unwrap();
    let merge = Component::concatenation(top, bottom).unwrap();

    let counted = level
        .count(&ctx, &NoiseModels::counting(), ErrorType::X, None, None)
        .unwrap();
    let merged = merge.propagate_counts(&counted);
    assert_eq!(merged.blocks.len(), 1);
    assert_eq!(merged.summed(), counted.summed());
    assert!(merged.is_valid(1));
}

#[test]
fn test_models_listing_different_errors_are_cached_apart() {
    let ctx = RuntimeContext::sequential();
    let rest = Component::trans_rest(KGood::uniform(1), trivial(), "q");
    let models = |error: &str| {
        let model: SharedNoiseModel<f64> = Arc::new(
            TransformedNoiseModel::new().with_weight(LocationType::Rest, error.parse().unwrap(), 1.0),
        );
        NoiseModels::new(model.clone(), model.clone(), model)
    };

    let x = rest.count(&ctx, &models("X"), ErrorType::Y, None, None).unwrap();
    let z = rest.count(&ctx, &models("Z"), ErrorType::Y, None, None).unwrap();
    assert_eq!(x.counts[1].len(), 1);
    assert_eq!(x.counts[1].get(&key(&[X])), Some(&1.0));
    assert_eq!(z.counts[1].len(), 1);
    assert_eq!(z.counts[1].get(&key(&[Z])), Some(&1.0));
}
