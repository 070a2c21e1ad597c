//! Bell-state preparation and Bell-basis measurement.

use std::sync::Arc;

use qfault_ir::{Basis, Bits, Block, Code};

use super::{Component, KGood};
use crate::error::{CountError, CountingResult};
use crate::key::{Key, SyndromeKeyGenerator};
use crate::manipulator::{KeyFn, KeyOp, KeyPropagator};

impl Component {
    /// Encoded Bell pair: `plus` and `zero` prepared side by side, then a
    /// transversal CNOT from the first onto the second, then a
    /// [`Component::bell_filter`].
    ///
    /// Each preparation must produce exactly one block.
    pub fn bell_pair(k_good: KGood, plus: Component, zero: Component, k_good_cnot: KGood) -> CountingResult<Self> {
        let ctrl = single_out_block(&plus)?;
        let targ = single_out_block(&zero)?;
        let cnot = Self::trans_cnot(k_good_cnot, ctrl.code().clone(), targ.code().clone())?;
        let code = Arc::new(ctrl.code().underlying().clone());
        let prep = Self::parallel(k_good, vec![plus, zero])?;
        let filter = Self::bell_filter(code)?;
        Ok(Self::sequential(k_good, vec![prep, cnot, filter])?.with_label("bellPair"))
    }

    /// Logical XX and ZZ (and so YY) errors act trivially on a Bell pair
    /// encoded in `code`; their keys are mapped to the trivial key.
    pub fn bell_filter(code: Arc<Code>) -> CountingResult<Self> {
        let generator = SyndromeKeyGenerator::for_code(&code);
        let logical = code
            .logical_operators()
            .into_iter()
            .next()
            .ok_or_else(|| CountError::Unsupported(format!("{} has no logical qubit", code.name())))?;
        let x = generator.key(&logical.x);
        let z = generator.key(&logical.z);
        let y = &x ^ &z;
        let trivial_on_pair: Vec<[Bits; 2]> = [x, z, y].into_iter().map(|b| [b.clone(), b]).collect();

        let f: KeyFn = Arc::new(move |key: &Key| {
            let mut blocks = key.blocks().to_vec();
            if blocks.len() >= 2 && trivial_on_pair.iter().any(|pair| blocks[..2] == pair[..]) {
                blocks[0] = Bits::zero();
                blocks[1] = Bits::zero();
            }
            Some(Key::new(blocks))
        });
        let propagator = KeyPropagator::from_op(KeyOp::Custom {
            label: format!("bellFilter.{}", code.name()),
            f,
        });
        let blocks = vec![Block::new("A", code.clone()), Block::new("B", code)];
        Ok(Self::filter_node("bellFilter", blocks.clone(), blocks, propagator, None))
    }

    /// Transversal Bell-basis measurement: a CNOT from the first block onto
    /// the second, then X-basis measurement of the first and Z-basis
    /// measurement of the second.
    ///
    /// Output block 0 holds the X-measurement result, block 1 the
    /// Z-measurement result. Budgets left as `None` default to `k_good`.
    pub fn bell_meas(
        k_good: KGood,
        code: Arc<Code>,
        k_good_meas_x: Option<KGood>,
        k_good_meas_z: Option<KGood>,
        k_good_cnot: Option<KGood>,
    ) -> CountingResult<Self> {
        let cnot = Self::trans_cnot(k_good_cnot.unwrap_or(k_good), code.clone(), code.clone())?;
        let measured = Arc::new(code.underlying().clone());
        let meas_x = Self::trans_meas(k_good_meas_x.unwrap_or(k_good), measured.clone(), Basis::X, "ctrl")?;
        let meas_z = Self::trans_meas(k_good_meas_z.unwrap_or(k_good), measured, Basis::Z, "targ")?;
        let meas = Self::parallel(k_good, vec![meas_x, meas_z])?;
        Ok(Self::sequential(k_good, vec![cnot, meas])?.with_label("bellMeas"))
    }
}

fn single_out_block(component: &Component) -> CountingResult<Block> {
    match component.out_blocks().as_slice() {
        [block] => Ok(block.clone()),
        blocks => Err(CountError::InvalidResult {
            expected: 1,
            got: blocks.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfault_ir::{ErrorType, Location, Locations, NoiseModels};

    use crate::runtime::RuntimeContext;

    fn key(values: &[u64]) -> Key {
        Key::new(values.iter().map(|&v| Bits::from(v)).collect())
    }

    fn prep(basis: Basis, name: &str) -> Component {
        let locations = Locations::new(vec![Location::prep(basis, name, 0)], format!("prep{basis}"));
        Component::prep(KGood::uniform(1), locations, Arc::new(Code::trivial())).unwrap()
    }

    #[test]
    fn test_bell_filter_clears_logical_pairs() {
        let filter = Component::bell_filter(Arc::new(Code::trivial())).unwrap();
        let p = filter.key_propagator();
        // Trivial keys: X error = 0b01, Z error = 0b10.
        assert_eq!(p.apply(&key(&[0b01, 0b01])), Some(key(&[0, 0])));
        assert_eq!(p.apply(&key(&[0b10, 0b10])), Some(key(&[0, 0])));
        assert_eq!(p.apply(&key(&[0b11, 0b11, 0b01])), Some(key(&[0, 0, 0b01])));
        assert_eq!(p.apply(&key(&[0b01, 0b10])), Some(key(&[0b01, 0b10])));
        assert_eq!(p.apply(&key(&[0b01, 0])), Some(key(&[0b01, 0])));
    }

    #[test]
    fn test_bell_filter_on_ed422_keys() {
        let code = Arc::new(Code::ed422(None));
        let generator = SyndromeKeyGenerator::for_code(&code);
        let logical = code.logical_operators().remove(0);
        let xx = generator.key(&logical.x);
        let filter = Component::bell_filter(code).unwrap();
        let key = Key::new(vec![xx.clone(), xx]);
        assert_eq!(filter.key_propagator().apply(&key), Some(Key::trivial(2)));
    }

    #[test]
    fn test_bell_pair_blocks_and_counts() {
        let pair = Component::bell_pair(
            KGood::uniform(1),
            prep(Basis::X, "A"),
            prep(Basis::Z, "B"),
            KGood::uniform(1),
        )
        .unwrap();
        assert_eq!(pair.label(), "bellPair");
        assert_eq!(pair.out_blocks().len(), 2);
        assert_eq!(pair.locations(ErrorType::Y).len(), 3);

        let ctx = RuntimeContext::sequential();
        let result = pair
            .count(&ctx, &NoiseModels::counting(), ErrorType::Y, None, None)
            .unwrap();
        assert!(result.is_valid(2));
        // XX and ZZ from the CNOT act trivially.
        assert!(result.counts[1].get(&key(&[0b01, 0b01])).is_none());
        assert!(result.counts[1].get(&key(&[0b10, 0b10])).is_none());
        assert!(result.counts[1].get(&key(&[0, 0])).copied().unwrap_or(0) > 1);
    }

    #[test]
    fn test_bell_pair_rejects_multi_block_preparation() {
        let code = Arc::new(Code::trivial());
        let both = Component::trans_cnot(KGood::uniform(1), code.clone(), code).unwrap();
        assert!(matches!(
            Component::bell_pair(KGood::uniform(1), both, prep(Basis::Z, "B"), KGood::uniform(1)),
            Err(CountError::InvalidResult { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_bell_meas_masks_each_block() {
        let meas = Component::bell_meas(KGood::uniform(1), Arc::new(Code::trivial()), None, None, None).unwrap();
        assert_eq!(meas.in_blocks().len(), 2);
        assert_eq!(meas.out_blocks().len(), 2);
        // X measurement of the control sees Z errors only; Z measurement of
        // the target sees X errors only. Z on the control and X on the target
        // pass the CNOT unchanged.
        let ctx = RuntimeContext::sequential();
        let input = crate::result::CountResult::<u64>::new(
            vec![[(key(&[0b10, 0b01]), 1)].into_iter().collect()],
            meas.in_blocks(),
        );
        let propagated = meas.propagate_counts(&input);
        assert_eq!(propagated.counts[0].get(&key(&[0b10, 0b01])), Some(&1));

        let result = meas
            .count(&ctx, &NoiseModels::counting(), ErrorType::Y, None, None)
            .unwrap();
        assert!(result.counts[1].keys().all(|k| {
            k.block(0).is_some_and(|b| !b.bit(0)) && k.block(1).is_some_and(|b| !b.bit(1))
        }));
    }
}
