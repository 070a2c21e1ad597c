//! Exhaustive fault counting over a fixed set of locations.
//!
//! Every single-location fault is first propagated forward through the rest
//! of the circuit once ([`propagate_location_errors`]). Counting order `k`
//! then only has to multiply pre-propagated block errors together for each
//! size-`k` subset of locations and each combination of outcomes.

use qfault_ir::noise::error_list_xz;
use qfault_ir::{Block, Bound, Location, LocationType, Locations, NoiseModel, Pauli, PauliError, Weight};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::error::{CountError, CountingResult};
use crate::iteration::Combinations;
use crate::key::{Key, MultiBlockKeyGenerator};
use crate::result::{Counts, add_count};
use crate::runtime::RuntimeContext;

// ---------------------------------------------------------------------------
// Block layout
// ---------------------------------------------------------------------------

/// Ordered block names and lengths that errors are laid out against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    names: Vec<String>,
    lengths: Vec<usize>,
    index: FxHashMap<String, usize>,
}

impl BlockLayout {
    /// Layout from explicit `(name, length)` pairs.
    pub fn new(entries: Vec<(String, usize)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        let (names, lengths) = entries.into_iter().unzip();
        Self {
            names,
            lengths,
            index,
        }
    }

    /// Layout of a list of blocks.
    pub fn from_blocks(blocks: &[Block]) -> Self {
        Self::new(
            blocks
                .iter()
                .map(|b| (b.name().to_string(), b.len()))
                .collect(),
        )
    }

    /// Layout implied by the locations, in order of first appearance.
    pub fn from_locations(locations: &Locations) -> Self {
        Self::new(locations.block_lengths())
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True for zero blocks.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Block names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Block lengths.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Position of the named block.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Identity error on every block.
    pub fn identity(&self) -> Vec<PauliError> {
        self.lengths.iter().map(|&n| PauliError::identity(n)).collect()
    }

    fn resolve_operand(&self, loc: &Location, block: &str, bit: usize) -> CountingResult<(usize, usize)> {
        match self.index_of(block) {
            Some(b) if bit < self.lengths[b] => Ok((b, bit)),
            _ => Err(CountError::InvalidLocation(format!(
                "{loc} does not fit blocks {:?} with lengths {:?}",
                self.names, self.lengths
            ))),
        }
    }

    /// Resolve every location against this layout.
    pub fn resolve(&self, locations: &Locations) -> CountingResult<Vec<ResolvedLocation>> {
        locations
            .iter()
            .map(|loc| {
                let first = self.resolve_operand(loc, loc.block1(), loc.bit1())?;
                let second = match loc.target() {
                    Some((block, bit)) => Some(self.resolve_operand(loc, block, bit)?),
                    None => None,
                };
                if second == Some(first) {
                    return Err(CountError::InvalidLocation(format!(
                        "{loc} uses the same qubit twice"
                    )));
                }
                Ok(ResolvedLocation {
                    kind: loc.kind(),
                    first,
                    second,
                })
            })
            .collect()
    }

    /// Error unless every location fits this layout.
    pub fn validate(&self, locations: &Locations) -> CountingResult<()> {
        self.resolve(locations).map(|_| ())
    }
}

/// A location with block names replaced by layout indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Location type.
    pub kind: LocationType,
    /// `(block index, bit)` of the first operand.
    pub first: (usize, usize),
    /// `(block index, bit)` of the CNOT target.
    pub second: Option<(usize, usize)>,
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

fn get(errors: &[PauliError], (block, bit): (usize, usize)) -> Pauli {
    errors[block].get(bit)
}

fn set(errors: &mut [PauliError], (block, bit): (usize, usize), pauli: Pauli) {
    errors[block].set(bit, pauli);
}

/// Propagate block errors through one location, in place.
///
/// Preparation resets the qubit, Z-basis measurement keeps only the X part
/// (X-basis: only the Z part), and a CNOT copies X from control to target
/// and then Z from target to control.
pub fn propagate_errors_through_loc(errors: &mut [PauliError], loc: &ResolvedLocation) {
    match loc.kind {
        LocationType::PrepX | LocationType::PrepZ => set(errors, loc.first, Pauli::I),
        LocationType::MeasZ => {
            let p = get(errors, loc.first);
            set(errors, loc.first, p.partial_x());
        }
        LocationType::MeasX => {
            let p = get(errors, loc.first);
            set(errors, loc.first, p.partial_z());
        }
        LocationType::Cnot => {
            if let Some(targ) = loc.second {
                let ctrl = loc.first;
                let t = get(errors, targ).compose(get(errors, ctrl).partial_x());
                set(errors, targ, t);
                let c = get(errors, ctrl).compose(t.partial_z());
                set(errors, ctrl, c);
            }
        }
        LocationType::Rest => {}
    }
}

trait PauliParts {
    fn partial_x(self) -> Pauli;
    fn partial_z(self) -> Pauli;
}

impl PauliParts for Pauli {
    fn partial_x(self) -> Pauli {
        Pauli::from_bits(self.x_bit(), false)
    }

    fn partial_z(self) -> Pauli {
        Pauli::from_bits(false, self.z_bit())
    }
}

/// Propagated block errors of every outcome at every location.
///
/// Entry `i` maps each outcome in the full X/Z error list of location `i`
/// to the block errors it causes after the remaining locations.
pub fn propagate_location_errors(
    locations: &[ResolvedLocation],
    layout: &BlockLayout,
) -> Vec<FxHashMap<PauliError, Vec<PauliError>>> {
    let propagate = |start: usize, operand: (usize, usize), pauli: Pauli| {
        let mut errors = layout.identity();
        set(&mut errors, operand, pauli);
        for loc in &locations[start..] {
            propagate_errors_through_loc(&mut errors, loc);
        }
        errors
    };

    locations
        .iter()
        .enumerate()
        .map(|(i, loc)| {
            let identity = layout.identity();
            let x1 = match loc.kind {
                LocationType::PrepX | LocationType::MeasX => identity.clone(),
                _ => propagate(i + 1, loc.first, Pauli::X),
            };
            let z1 = match loc.kind {
                LocationType::PrepZ | LocationType::MeasZ => identity.clone(),
                _ => propagate(i + 1, loc.first, Pauli::Z),
            };
            let (x2, z2) = match loc.second {
                Some(targ) => (
                    propagate(i + 1, targ, Pauli::X),
                    propagate(i + 1, targ, Pauli::Z),
                ),
                None => (identity.clone(), identity.clone()),
            };
            let parts = [[&x1, &z1], [&x2, &z2]];

            error_list_xz(loc.kind)
                .iter()
                .map(|outcome| {
                    let mut errors = identity.clone();
                    for (q, [x, z]) in parts.iter().enumerate().take(outcome.len()) {
                        let p = outcome.get(q);
                        if p.x_bit() {
                            multiply_into(&mut errors, x);
                        }
                        if p.z_bit() {
                            multiply_into(&mut errors, z);
                        }
                    }
                    (outcome.clone(), errors)
                })
                .collect()
        })
        .collect()
}

fn multiply_into(errors: &mut [PauliError], other: &[PauliError]) {
    for (e, o) in errors.iter_mut().zip(other) {
        *e *= o;
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// One possible fault at a location: its propagated block errors and weight.
#[derive(Debug, Clone)]
struct Outcome<W> {
    errors: Vec<PauliError>,
    weight: W,
}

fn location_outcomes<W: Weight>(
    locations: &Locations,
    resolved: &[ResolvedLocation],
    layout: &BlockLayout,
    noise: &dyn NoiseModel<Weight = W>,
) -> CountingResult<Vec<Vec<Outcome<W>>>> {
    let propagated = propagate_location_errors(resolved, layout);
    locations
        .iter()
        .zip(&propagated)
        .map(|(loc, table)| {
            noise
                .error_list(loc.kind())
                .iter()
                .map(|e| {
                    let errors = table.get(e).ok_or_else(|| CountError::UnknownOutcome {
                        location: loc.to_string(),
                        error: e.to_string(),
                    })?;
                    Ok(Outcome {
                        errors: errors.clone(),
                        weight: noise.weight(loc.kind(), e, Bound::Upper),
                    })
                })
                .collect::<CountingResult<Vec<_>>>()
        })
        .collect()
}

fn count_configurations<W: Weight>(
    subset: &[usize],
    outcomes: &[Vec<Outcome<W>>],
    errors: &[PauliError],
    weight: &W,
    keygen: &MultiBlockKeyGenerator,
    counts: &mut Counts<W>,
) {
    match subset.split_first() {
        None => add_count(counts, keygen.key(errors), weight),
        Some((&i, rest)) => {
            for outcome in &outcomes[i] {
                let next: Vec<PauliError> = errors
                    .iter()
                    .zip(&outcome.errors)
                    .map(|(a, b)| a * b)
                    .collect();
                count_configurations(rest, outcomes, &next, &weight.product(&outcome.weight), keygen, counts);
            }
        }
    }
}

/// Merge `other` into `counts` by key-wise addition.
pub fn merge_counts<W: Weight>(mut counts: Counts<W>, other: Counts<W>) -> Counts<W> {
    for (key, weight) in other {
        add_count(&mut counts, key, &weight);
    }
    counts
}

/// Weighted keys of every configuration of exactly `k` faults.
///
/// Subsets are distributed over the context by their smallest location.
#[instrument(skip(ctx, locations, noise, layout, keygen), fields(n_locations = locations.len()))]
pub fn count_errors_of_order_k<W: Weight>(
    ctx: &RuntimeContext,
    k: usize,
    locations: &Locations,
    noise: &dyn NoiseModel<Weight = W>,
    layout: &BlockLayout,
    keygen: &MultiBlockKeyGenerator,
) -> CountingResult<Counts<W>> {
    let resolved = layout.resolve(locations)?;
    if k == 0 {
        let mut counts = Counts::default();
        counts.insert(Key::trivial(keygen.len()), W::one());
        return Ok(counts);
    }
    let n = locations.len();
    if k > n {
        return Ok(Counts::default());
    }

    let outcomes = location_outcomes(locations, &resolved, layout, noise)?;
    let identity = layout.identity();
    let firsts: Vec<usize> = (0..=n - k).collect();
    let counts = ctx.map_reduce(
        &firsts,
        Counts::default(),
        |&first| {
            let mut counts = Counts::default();
            for subset in Combinations::with_first(n, k, first) {
                count_configurations(&subset, &outcomes, &identity, &W::one(), keygen, &mut counts);
            }
            Ok(counts)
        },
        merge_counts,
    )?;
    debug!(keys = counts.len(), "Counted order {k}");
    Ok(counts)
}

/// Counts for orders `0..=k_max` keyed by per-block syndrome keys.
pub fn count_blocks_by_syndrome<W: Weight>(
    ctx: &RuntimeContext,
    locations: &Locations,
    blocks: &[Block],
    noise: &dyn NoiseModel<Weight = W>,
    k_max: usize,
) -> CountingResult<Vec<Counts<W>>> {
    let layout = BlockLayout::from_blocks(blocks);
    let keygen = MultiBlockKeyGenerator::new(blocks)?;
    (0..=k_max)
        .map(|k| count_errors_of_order_k(ctx, k, locations, noise, &layout, &keygen))
        .collect()
}
