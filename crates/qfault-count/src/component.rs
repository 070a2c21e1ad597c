//! Component tree.
//!
//! A protocol fragment is counted as a tree of [`Component`]s. Leaves own
//! physical locations and count their faults directly; composites combine
//! their children sequentially (in time) or in parallel (side by side);
//! filters transform keys noiselessly, optionally rejecting some of them
//! (postselection).
//!
//! Every component declares the blocks it consumes and produces. Inputs may
//! carry more blocks than a component consumes; the extra blocks pass through
//! unchanged after the component's own output blocks.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qfault_count::component::{Component, KGood};
//! use qfault_count::runtime::RuntimeContext;
//! use qfault_ir::{Code, ErrorType, NoiseModels};
//!
//! let code = Arc::new(Code::trivial());
//! let rest = |name: &str| Component::trans_rest(KGood::uniform(1), code.clone(), name);
//! let twice = Component::sequential(KGood::uniform(1), vec![rest("q"), rest("q")]).unwrap();
//!
//! let ctx = RuntimeContext::sequential();
//! let result = twice.count(&ctx, &NoiseModels::depolarizing(), ErrorType::Y, None, None).unwrap();
//! assert_eq!(result.summed(), vec![1, 24]);
//! ```

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use qfault_ir::{
    Basis, Bits, Block, Code, ErrorType, Location, Locations, NoiseModel, NoiseModels,
    RationalFunction, Weight,
};
use rustc_hash::FxHasher;
use tracing::{debug, info, instrument};

use crate::cache::{CacheKey, CacheQuery};
use crate::convolve::convolve_keyed;
use crate::error::{CountError, CountingResult};
use crate::key::{MultiBlockKeyGenerator, SyndromeKeyGenerator};
use crate::leaf::{BlockLayout, count_blocks_by_syndrome, merge_counts};
use crate::manipulator::{KeyOp, KeyPropagator, map_counts};
use crate::probability::{lower_bound_poly, pr_bad_poly};
use crate::result::{CountResult, Counts};
use crate::runtime::RuntimeContext;

mod bell;
mod teleport;

pub use teleport::SyndromeAcceptor;

// ---------------------------------------------------------------------------
// Fault budgets
// ---------------------------------------------------------------------------

/// Fault budget per error type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KGood {
    /// Budget for X errors.
    pub x: usize,
    /// Budget for Z errors.
    pub z: usize,
    /// Budget for X and Z errors counted together.
    pub y: usize,
}

impl KGood {
    /// Separate budgets.
    pub fn new(x: usize, z: usize, y: usize) -> Self {
        Self { x, z, y }
    }

    /// The same budget for every error type.
    pub fn uniform(k: usize) -> Self {
        Self::new(k, k, k)
    }

    /// Budget for `error_type`.
    pub fn get(&self, error_type: ErrorType) -> usize {
        match error_type {
            ErrorType::X => self.x,
            ErrorType::Z => self.z,
            ErrorType::Y => self.y,
        }
    }
}

impl fmt::Display for KGood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{X: {}, Z: {}, Y: {}}}", self.x, self.z, self.y)
    }
}

// ---------------------------------------------------------------------------
// Node data
// ---------------------------------------------------------------------------

/// A component that owns physical locations.
#[derive(Debug, Clone)]
pub struct Leaf {
    locations: Locations,
    in_blocks: Vec<Block>,
    out_blocks: Vec<Block>,
    propagator: KeyPropagator,
}

impl Leaf {
    /// The component's locations.
    pub fn locations(&self) -> &Locations {
        &self.locations
    }
}

/// A noiseless key transformation.
#[derive(Debug, Clone)]
pub struct Filter {
    in_blocks: Vec<Block>,
    out_blocks: Vec<Block>,
    propagator: KeyPropagator,
    /// Error type whose model bounds the rejection probability, for
    /// postselection filters.
    postselect: Option<ErrorType>,
    /// Keep the largest weight per key over the input blocks instead of
    /// mapping keys one by one.
    combine: bool,
}

impl Filter {
    /// True if the filter drops rejected keys.
    pub fn is_postselection(&self) -> bool {
        self.postselect.is_some()
    }
}

/// The node kinds of the component tree.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    /// Own locations, counted directly.
    Leaf(Leaf),
    /// Children applied one after another.
    Sequential(Vec<Component>),
    /// Children acting on consecutive block ranges at the same time.
    Parallel(Vec<Component>),
    /// Noiseless key transformation.
    Filter(Filter),
}

/// A node of the component tree.
#[derive(Debug, Clone)]
pub struct Component {
    label: String,
    kind: ComponentKind,
    k_good: KGood,
    id: u64,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Component {
    fn build(label: impl Into<String>, kind: ComponentKind, k_good: KGood) -> Self {
        let mut component = Self {
            label: label.into(),
            kind,
            k_good,
            id: 0,
        };
        component.id = component.structural_hash();
        debug!(component = %component, "Component created");
        component
    }

    /// The same component under another label.
    fn with_label(self, label: &str) -> Self {
        Self::build(label, self.kind, self.k_good)
    }

    fn structural_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.label.hash(&mut hasher);
        self.k_good.hash(&mut hasher);
        match &self.kind {
            ComponentKind::Leaf(leaf) => {
                0u8.hash(&mut hasher);
                leaf.locations.hash(&mut hasher);
                hash_blocks(&leaf.in_blocks, &mut hasher);
                hash_blocks(&leaf.out_blocks, &mut hasher);
                leaf.propagator.descriptor().hash(&mut hasher);
            }
            ComponentKind::Sequential(children) | ComponentKind::Parallel(children) => {
                let tag: u8 = if matches!(self.kind, ComponentKind::Sequential(_)) { 1 } else { 2 };
                tag.hash(&mut hasher);
                for child in children {
                    child.id.hash(&mut hasher);
                }
            }
            ComponentKind::Filter(filter) => {
                3u8.hash(&mut hasher);
                hash_blocks(&filter.in_blocks, &mut hasher);
                hash_blocks(&filter.out_blocks, &mut hasher);
                filter.propagator.descriptor().hash(&mut hasher);
                filter.postselect.hash(&mut hasher);
                filter.combine.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// A leaf over `blocks` (input and output), propagating input keys with
    /// `propagator`.
    ///
    /// Every location must address a bit of one of the blocks, and all blocks
    /// must share their parity checks.
    pub fn leaf(
        k_good: KGood,
        locations: Locations,
        blocks: Vec<Block>,
        propagator: KeyPropagator,
    ) -> CountingResult<Self> {
        Self::leaf_with_output(
            format!("leaf.{}", locations.name()),
            k_good,
            locations,
            blocks.clone(),
            blocks,
            propagator,
        )
    }

    fn leaf_with_output(
        label: String,
        k_good: KGood,
        locations: Locations,
        in_blocks: Vec<Block>,
        out_blocks: Vec<Block>,
        propagator: KeyPropagator,
    ) -> CountingResult<Self> {
        BlockLayout::from_blocks(&out_blocks).validate(&locations)?;
        MultiBlockKeyGenerator::new(&out_blocks)?;
        let leaf = Leaf {
            locations,
            in_blocks,
            out_blocks,
            propagator,
        };
        Ok(Self::build(label, ComponentKind::Leaf(leaf), k_good))
    }

    /// Preparation of the blocks named by `locations`, each encoded in
    /// `code`.
    pub fn prep(k_good: KGood, locations: Locations, code: Arc<Code>) -> CountingResult<Self> {
        let blocks: Vec<Block> = locations
            .block_names()
            .into_iter()
            .map(|name| Block::new(name, code.clone()))
            .collect();
        Self::leaf_with_output(
            format!("prep.{}", locations.name()),
            k_good,
            locations,
            blocks.clone(),
            blocks,
            KeyPropagator::identity(),
        )
    }

    /// A single block with no locations.
    pub fn empty(code: Arc<Code>, block_name: impl Into<String>) -> Self {
        let block = Block::new(block_name, code);
        let leaf = Leaf {
            locations: Locations::empty("empty"),
            in_blocks: vec![block.clone()],
            out_blocks: vec![block],
            propagator: KeyPropagator::identity(),
        };
        Self::build("empty", ComponentKind::Leaf(leaf), KGood::default())
    }

    /// Transversal CNOT from block `ctrl` onto block `targ`.
    ///
    /// Input keys are propagated through the gate: X syndromes of the
    /// control are copied to the target and Z syndromes of the target to the
    /// control. Outputs are encoded in the underlying codes of the inputs.
    pub fn trans_cnot(k_good: KGood, ctrl: Arc<Code>, targ: Arc<Code>) -> CountingResult<Self> {
        let n = ctrl.n();
        if n != targ.n() {
            return Err(CountError::BlockLengthMismatch {
                ctrl: n,
                targ: targ.n(),
            });
        }
        let locations = Locations::new(
            (0..n).map(|i| Location::cnot("ctrl", i, "targ", i)).collect(),
            format!("transCNOT.{n}"),
        );
        let in_blocks = vec![Block::new("ctrl", ctrl.clone()), Block::new("targ", targ.clone())];
        let out_ctrl = Arc::new(ctrl.underlying().clone());
        let out_blocks = vec![
            Block::new("ctrl", out_ctrl.clone()),
            Block::new("targ", Arc::new(targ.underlying().clone())),
        ];

        let checks = SyndromeKeyGenerator::for_code(&out_ctrl).parity_checks();
        let from_ctrl = Bits::from_bools(checks.iter().map(|c| c.x_bits().is_zero()));
        let from_targ = Bits::from_bools(checks.iter().map(|c| c.z_bits().is_zero()));
        let propagator = KeyPropagator::from_op(KeyOp::Copy {
            from: 0,
            to: 1,
            mask: Some(from_ctrl),
        })
        .push(KeyOp::Copy {
            from: 1,
            to: 0,
            mask: Some(from_targ),
        });

        Self::leaf_with_output(
            format!("transCNOT.{n}"),
            k_good,
            locations,
            in_blocks,
            out_blocks,
            propagator,
        )
    }

    /// Transversal measurement of `block_name` in `basis`.
    ///
    /// Syndrome bits of checks with no `basis` part cannot be observed by
    /// the measurement and are cleared.
    pub fn trans_meas(
        k_good: KGood,
        code: Arc<Code>,
        basis: Basis,
        block_name: impl Into<String>,
    ) -> CountingResult<Self> {
        let name = block_name.into();
        let n = code.n();
        let locations = Locations::new(
            (0..n).map(|i| Location::meas(basis, name.clone(), i)).collect(),
            format!("transMeas{basis}{n}"),
        );
        let checks = SyndromeKeyGenerator::for_code(&code).parity_checks();
        let mask = Bits::from_bools(checks.iter().map(|c| match basis {
            Basis::X => !c.x_bits().is_zero(),
            Basis::Z => !c.z_bits().is_zero(),
        }));
        let blocks = vec![Block::new(name, code)];
        Self::leaf_with_output(
            format!("transMeas{basis}{n}"),
            k_good,
            locations,
            blocks.clone(),
            blocks,
            KeyPropagator::from_op(KeyOp::Mask {
                mask,
                blocks: Some(vec![0]),
            }),
        )
    }

    /// Transversal rest of `block_name`.
    pub fn trans_rest(k_good: KGood, code: Arc<Code>, block_name: impl Into<String>) -> Self {
        let name = block_name.into();
        let n = code.n();
        let locations = Locations::new(
            (0..n).map(|i| Location::rest(name.clone(), i)).collect(),
            format!("transRest{n}"),
        );
        let block = Block::new(name, code);
        let leaf = Leaf {
            locations,
            in_blocks: vec![block.clone()],
            out_blocks: vec![block],
            propagator: KeyPropagator::identity(),
        };
        Self::build(format!("transRest{n}"), ComponentKind::Leaf(leaf), k_good)
    }

    /// A noiseless transformation from `in_blocks` to `out_blocks`.
    pub fn filter(in_blocks: Vec<Block>, out_blocks: Vec<Block>, propagator: KeyPropagator) -> Self {
        Self::filter_node("filter", in_blocks, out_blocks, propagator, None)
    }

    /// A filter that rejects the keys `propagator` maps to `None`. The
    /// acceptance bound uses the noise model of `error_type`.
    pub fn postselection(
        in_blocks: Vec<Block>,
        out_blocks: Vec<Block>,
        propagator: KeyPropagator,
        error_type: ErrorType,
    ) -> Self {
        Self::filter_node("postselection", in_blocks, out_blocks, propagator, Some(error_type))
    }

    fn filter_node(
        label: &str,
        in_blocks: Vec<Block>,
        out_blocks: Vec<Block>,
        propagator: KeyPropagator,
        postselect: Option<ErrorType>,
    ) -> Self {
        let filter = Filter {
            in_blocks,
            out_blocks,
            propagator,
            postselect,
            combine: false,
        };
        Self::build(label, ComponentKind::Filter(filter), KGood::default())
    }

    /// Merge `top.n()` blocks encoded in `bottom` into one block encoded in
    /// `top` concatenated with `bottom`.
    pub fn concatenation(top: Arc<Code>, bottom: Arc<Code>) -> CountingResult<Self> {
        let n = top.n();
        let width = bottom.key_width();
        let cat = Arc::new(Code::concatenated(top, bottom.clone())?);
        let in_blocks = vec![Block::new("Subblock", bottom); n];
        let out_blocks = vec![Block::new("Cat", cat)];
        let propagator = KeyPropagator::from_op(KeyOp::Merge {
            lengths: vec![width; n],
        });
        Ok(Self::filter_node("concatenation", in_blocks, out_blocks, propagator, None))
    }

    /// Reorder blocks: output block `i` is input block `permutation[i]`.
    pub fn block_permutation(in_blocks: Vec<Block>, permutation: Vec<usize>) -> CountingResult<Self> {
        let mut sorted = permutation.clone();
        sorted.sort_unstable();
        if sorted != (0..in_blocks.len()).collect::<Vec<_>>() {
            return Err(CountError::Unsupported(format!(
                "{permutation:?} is not a permutation of {} blocks",
                in_blocks.len()
            )));
        }
        let out_blocks = permutation.iter().map(|&i| in_blocks[i].clone()).collect();
        let propagator = KeyPropagator::from_op(KeyOp::Permute { permutation });
        Ok(Self::filter_node("blockPermutation", in_blocks, out_blocks, propagator, None))
    }

    /// Trace out the blocks at `indices`.
    pub fn block_discard(in_blocks: Vec<Block>, indices: Vec<usize>) -> Self {
        let out_blocks = in_blocks
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, b)| b.clone())
            .collect();
        let propagator = KeyPropagator::from_op(KeyOp::Remove { indices });
        Self::filter_node("blockDiscard", in_blocks, out_blocks, propagator, None)
    }

    /// Insert error-free `blocks` before input block `index`.
    pub fn block_insert(in_blocks: Vec<Block>, index: usize, blocks: Vec<Block>) -> Self {
        let at = index.min(in_blocks.len());
        let mut out_blocks = in_blocks.clone();
        let num_blocks = blocks.len();
        out_blocks.splice(at..at, blocks);
        let propagator = KeyPropagator::from_op(KeyOp::Extend {
            num_blocks,
            index: at,
        });
        Self::filter_node("blockInsert", in_blocks, out_blocks, propagator, None)
    }

    /// Combine `in_blocks` into the first of them. For every order and key,
    /// the output weight dominates the weight of that key on each input
    /// block with the other input blocks traced out.
    ///
    /// All blocks must be encoded in the same code.
    pub fn block_combine(in_blocks: Vec<Block>) -> CountingResult<Self> {
        let Some(first) = in_blocks.first() else {
            return Err(CountError::Unsupported("block combination without blocks".to_string()));
        };
        if let Some(other) = in_blocks.iter().find(|b| *b != first) {
            return Err(CountError::CodeMismatch(format!("cannot combine {first} with {other}")));
        }
        let out_blocks = vec![first.clone()];
        let filter = Filter {
            propagator: KeyPropagator::from_op(KeyOp::Remove {
                indices: (1..in_blocks.len()).collect(),
            }),
            in_blocks,
            out_blocks,
            postselect: None,
            combine: true,
        };
        Ok(Self::build("blockCombine", ComponentKind::Filter(filter), KGood::default()))
    }

    /// Children applied in time order.
    ///
    /// The output blocks of each child must equal the input blocks of the
    /// next.
    pub fn sequential(k_good: KGood, children: Vec<Component>) -> CountingResult<Self> {
        if children.is_empty() {
            return Err(CountError::Unsupported("sequential component without children".to_string()));
        }
        for (index, pair) in children.windows(2).enumerate() {
            let out_blocks = pair[0].out_blocks();
            let in_blocks = pair[1].in_blocks();
            if out_blocks != in_blocks {
                return Err(CountError::BlockMismatch {
                    index,
                    next: index + 1,
                    out_blocks: signature(&out_blocks),
                    in_blocks: signature(&in_blocks),
                });
            }
        }
        Ok(Self::build("sequential", ComponentKind::Sequential(children), k_good))
    }

    /// Children side by side: child `i` acts on the blocks following those
    /// of child `i - 1`.
    pub fn parallel(k_good: KGood, children: Vec<Component>) -> CountingResult<Self> {
        if children.is_empty() {
            return Err(CountError::Unsupported("parallel component without children".to_string()));
        }
        Ok(Self::build("parallel", ComponentKind::Parallel(children), k_good))
    }
}

fn hash_blocks(blocks: &[Block], hasher: &mut FxHasher) {
    for block in blocks {
        block.name().hash(hasher);
        block.code().name().hash(hasher);
        let generator = SyndromeKeyGenerator::for_code(block.code());
        generator.parity_checks().hash(hasher);
        generator.mask().hash(hasher);
    }
}

/// Per order and key, the dominant weight over the input blocks of `filter`,
/// each taken with the other input blocks traced out.
fn combine_blocks<W: Weight>(filter: &Filter, input: &CountResult<W>) -> CountResult<W> {
    let n = filter.in_blocks.len();
    let mut orders: Vec<Counts<W>> = vec![Counts::default(); input.counts.len()];
    for i in 0..n {
        let others = KeyPropagator::from_op(KeyOp::Remove {
            indices: (0..n).filter(|&j| j != i).collect(),
        });
        let (marginal, _) = map_counts(&input.counts, &others);
        for (slot, table) in orders.iter_mut().zip(marginal) {
            for (key, weight) in table {
                match slot.get_mut(&key) {
                    Some(w) => *w = w.dominant(&weight),
                    None => {
                        slot.insert(key, weight);
                    }
                }
            }
        }
    }
    let mut blocks = filter.out_blocks.clone();
    blocks.extend(input.blocks.iter().skip(n).cloned());
    CountResult::new(orders, blocks)
}

fn signature(blocks: &[Block]) -> String {
    let names: Vec<String> = blocks.iter().map(ToString::to_string).collect();
    format!("({})", names.join(", "))
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

impl Component {
    /// Structural hash, fixed at construction.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The node kind.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Fault budgets.
    pub fn k_good(&self) -> KGood {
        self.k_good
    }

    /// Short name of the component.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Child components (empty for leaves and filters).
    pub fn children(&self) -> &[Component] {
        match &self.kind {
            ComponentKind::Sequential(children) | ComponentKind::Parallel(children) => children,
            ComponentKind::Leaf(_) | ComponentKind::Filter(_) => &[],
        }
    }

    /// Blocks consumed, in key order.
    pub fn in_blocks(&self) -> Vec<Block> {
        match &self.kind {
            ComponentKind::Leaf(leaf) => leaf.in_blocks.clone(),
            ComponentKind::Filter(filter) => filter.in_blocks.clone(),
            ComponentKind::Sequential(children) => {
                children.first().map(Component::in_blocks).unwrap_or_default()
            }
            ComponentKind::Parallel(children) => children.iter().flat_map(Component::in_blocks).collect(),
        }
    }

    /// Blocks produced, in key order.
    pub fn out_blocks(&self) -> Vec<Block> {
        match &self.kind {
            ComponentKind::Leaf(leaf) => leaf.out_blocks.clone(),
            ComponentKind::Filter(filter) => filter.out_blocks.clone(),
            ComponentKind::Sequential(children) => {
                children.last().map(Component::out_blocks).unwrap_or_default()
            }
            ComponentKind::Parallel(children) => children.iter().flat_map(Component::out_blocks).collect(),
        }
    }

    /// Every location of the subtree that can suffer `error_type` faults.
    pub fn locations(&self, error_type: ErrorType) -> Locations {
        match &self.kind {
            ComponentKind::Leaf(leaf) => leaf.locations.filter_against(error_type),
            ComponentKind::Filter(_) => Locations::empty(self.label.clone()),
            ComponentKind::Sequential(children) | ComponentKind::Parallel(children) => {
                let mut list = Vec::new();
                for child in children {
                    list.extend(child.locations(error_type).iter().cloned());
                }
                Locations::new(list, self.label.clone())
            }
        }
    }

    /// Maps keys over the input blocks to keys over the output blocks.
    ///
    /// A block combination maps each key to its first block; its counts are
    /// propagated by [`Component::propagate_counts`], which takes the
    /// dominant weight instead of the sum.
    pub fn key_propagator(&self) -> KeyPropagator {
        match &self.kind {
            ComponentKind::Leaf(leaf) => leaf.propagator.clone(),
            ComponentKind::Filter(filter) => filter.propagator.clone(),
            ComponentKind::Sequential(children) => children
                .iter()
                .fold(KeyPropagator::identity(), |p, child| p.then(child.key_propagator())),
            ComponentKind::Parallel(children) => {
                let chained = children.iter().fold(KeyPropagator::identity(), |p, child| {
                    p.then(child.key_propagator())
                        .push(KeyOp::Rotate(child.out_blocks().len() as isize))
                });
                chained.push(KeyOp::Rotate(-(self.out_blocks().len() as isize)))
            }
        }
    }

    /// Propagate `input` through the component without adding faults.
    pub fn propagate_counts<W: Weight>(&self, input: &CountResult<W>) -> CountResult<W> {
        self.propagate_with_rejected(input).0
    }

    /// Propagated result plus the rejected weight per order.
    fn propagate_with_rejected<W: Weight>(&self, input: &CountResult<W>) -> (CountResult<W>, Vec<W>) {
        match &self.kind {
            ComponentKind::Filter(filter) if filter.combine => {
                (combine_blocks(filter, input), vec![W::zero(); input.counts.len()])
            }
            ComponentKind::Sequential(children) | ComponentKind::Parallel(children) => {
                let rotate = matches!(self.kind, ComponentKind::Parallel(_));
                let mut rejected = vec![W::zero(); input.counts.len()];
                let mut result = input.clone();
                for child in children {
                    let (next, lost) = child.propagate_with_rejected(&result);
                    for (acc, w) in rejected.iter_mut().zip(&lost) {
                        acc.accumulate(w);
                    }
                    result = if rotate {
                        next.rotated(child.out_blocks().len() as isize)
                    } else {
                        next
                    };
                }
                if rotate {
                    result = result.rotated(-(self.out_blocks().len() as isize));
                }
                (result, rejected)
            }
            ComponentKind::Leaf(_) | ComponentKind::Filter(_) => {
                let (counts, rejected) = map_counts(&input.counts, &self.key_propagator());
                let mut blocks = self.out_blocks();
                blocks.extend(input.blocks.iter().skip(self.in_blocks().len()).cloned());
                (CountResult::new(counts, blocks), rejected)
            }
        }
    }

    /// Kind, label and budgets.
    pub fn descriptor(&self) -> String {
        format!("{}{}", self.label, self.k_good)
    }

    fn cache_key<W: Weight>(
        &self,
        error_type: ErrorType,
        noise: String,
        k_max: Option<usize>,
        query: CacheQuery,
    ) -> CacheKey {
        CacheKey {
            component: self.id,
            error_type,
            noise,
            weight: type_name::<W>(),
            k_max,
            query,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:016x}", self.descriptor(), self.id)
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

impl Component {
    /// Count `error_type` faults in the component, up to its budget.
    ///
    /// `input` holds the counts entering the component (the error-free
    /// input over [`Component::in_blocks`] if `None`); they are propagated
    /// through the component and convolved with its own faults. The result
    /// holds orders up to `k_max` at most.
    pub fn count<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<CountResult<W>> {
        if input.is_some() || !ctx.flags().memoize {
            return self.count_uncached(ctx, noise, error_type, input, k_max);
        }
        let key = self.cache_key::<W>(error_type, noise.descriptor(), k_max, CacheQuery::Count);
        if let Some(hit) = ctx.cache().get::<CountResult<W>>(&key)? {
            debug!(component = %self, "Count cache hit");
            return Ok(hit);
        }
        let result = self.count_uncached(ctx, noise, error_type, None, k_max)?;
        ctx.cache().insert(key, result.clone())?;
        Ok(result)
    }

    #[instrument(skip(self, ctx, noise, input), fields(component = %self))]
    fn count_uncached<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<CountResult<W>> {
        let result = match &self.kind {
            ComponentKind::Leaf(leaf) => self.count_leaf(leaf, ctx, noise, error_type, input, k_max)?,
            ComponentKind::Filter(_) => {
                let trivial;
                let input = match input {
                    Some(input) => input,
                    None => {
                        trivial = CountResult::trivial(self.in_blocks());
                        &trivial
                    }
                };
                self.propagate_counts(input)
            }
            ComponentKind::Sequential(children) => {
                self.count_sequential(children, ctx, noise, error_type, input, k_max)?
            }
            ComponentKind::Parallel(children) => {
                self.count_parallel(children, ctx, noise, error_type, input, k_max)?
            }
        };
        debug!(k_max = result.k_max(), blocks = result.blocks.len(), "Counted");
        Ok(result)
    }

    fn count_leaf<W: Weight>(
        &self,
        leaf: &Leaf,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<CountResult<W>> {
        let k = k_max.map_or(self.k_good.get(error_type), |k| k.min(self.k_good.get(error_type)));
        let Some(input) = input else {
            let counts = count_blocks_by_syndrome(
                ctx,
                &leaf.locations.filter_against(error_type),
                &leaf.out_blocks,
                &**noise.get(error_type),
                k,
            )?;
            return Ok(CountResult::new(counts, leaf.out_blocks.clone()));
        };

        let own = self.count(ctx, noise, error_type, None, Some(k))?;
        let propagated = self.propagate_counts(input);
        let counts = convolve_keyed(
            ctx,
            &propagated.counts,
            &propagated.key_widths(),
            &own.counts,
            &own.key_widths(),
            k_max,
        )?;
        Ok(CountResult::new(counts, propagated.blocks))
    }

    /// Highest order a composite produces for `input`.
    fn order_limit<W: Weight>(&self, error_type: ErrorType, input: &CountResult<W>, k_max: Option<usize>) -> usize {
        let k_lim = self.k_good.get(error_type) + input.k_max();
        k_max.map_or(k_lim, |k| k.min(k_lim))
    }

    /// Input order `k` is counted as if it were order zero, up to
    /// `k_lim - k` further faults, then shifted back up by `k`.
    fn count_sequential<W: Weight>(
        &self,
        children: &[Component],
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<CountResult<W>> {
        let input = match input {
            Some(input) => input.clone(),
            None => CountResult::trivial(self.in_blocks()),
        };
        input.validate(input.blocks.len())?;
        let k_in = input.k_max();
        let k_lim = self.order_limit(error_type, &input, k_max);

        let mut orders: Vec<Counts<W>> = vec![Counts::default(); k_lim + 1];
        let mut blocks = None;
        for k in 0..=k_lim.min(k_in) {
            let order_zero = CountResult::new(vec![input.counts[k].clone()], input.blocks.clone());
            let result = self.count_order_zero(children, ctx, noise, error_type, order_zero, k_lim - k)?;
            for (j, table) in result.counts.into_iter().enumerate() {
                if let Some(slot) = orders.get_mut(j + k) {
                    *slot = merge_counts(std::mem::take(slot), table);
                }
            }
            blocks.get_or_insert(result.blocks);
        }
        Ok(CountResult::new(orders, blocks.unwrap_or(input.blocks)))
    }

    fn count_order_zero<W: Weight>(
        &self,
        children: &[Component],
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: CountResult<W>,
        k_max: usize,
    ) -> CountingResult<CountResult<W>> {
        let k_sub = self.k_good.get(error_type).min(k_max);
        let mut result = input;
        for child in children {
            let expected = (result.blocks.len() + child.out_blocks().len())
                .saturating_sub(child.in_blocks().len());
            result = child.count(ctx, noise, error_type, Some(&result), Some(k_sub))?;
            result.validate(expected)?;
        }
        Ok(result)
    }

    fn count_parallel<W: Weight>(
        &self,
        children: &[Component],
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<CountResult<W>> {
        let mut result = match input {
            Some(input) => input.clone(),
            None => CountResult::trivial(self.in_blocks()),
        };
        result.validate(result.blocks.len())?;
        let k = self.order_limit(error_type, &result, k_max);
        for child in children {
            result = child
                .count(ctx, noise, error_type, Some(&result), Some(k))?
                .rotated(child.out_blocks().len() as isize);
        }
        Ok(result.rotated(-(self.out_blocks().len() as isize)))
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    /// Upper bound on the probability that more than the budgeted number of
    /// `error_type` faults occur anywhere in the component.
    ///
    /// The component's own tail (over all locations of the subtree) is
    /// added to the children's bounds, each evaluated up to this component's
    /// budget.
    pub fn pr_bad<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &dyn NoiseModel<Weight = W>,
        error_type: ErrorType,
        k_max: Option<usize>,
    ) -> CountingResult<RationalFunction> {
        let memoize = ctx.flags().memoize;
        let key = self.cache_key::<W>(error_type, noise.descriptor(), k_max, CacheQuery::PrBad);
        if memoize {
            if let Some(hit) = ctx.cache().get::<RationalFunction>(&key)? {
                return Ok(hit);
            }
        }

        let k_good = self.k_good.get(error_type);
        let totals = self.locations(error_type).totals();
        let mut pr = pr_bad_poly(ctx, k_good, &totals, noise, k_max)?;
        for child in self.children() {
            pr += &child.pr_bad(ctx, noise, error_type, Some(k_good))?;
        }
        debug!(component = %self, %error_type, n_locations = totals.total(), "Pr[bad] computed");

        if memoize {
            ctx.cache().insert(key, pr.clone())?;
        }
        Ok(pr)
    }

    /// Lower bound on the probability that every postselection in the
    /// component accepts.
    ///
    /// Children are evaluated in order, each on the counts produced by the
    /// children before it. Fault configurations beyond the budgets are
    /// never counted, so for composites the component's `Pr[bad]` is
    /// subtracted once from the product of the children's bounds.
    pub fn pr_accept<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        input: Option<&CountResult<W>>,
        k_max: Option<usize>,
    ) -> CountingResult<RationalFunction> {
        let input = match input {
            Some(input) => input.clone(),
            None => CountResult::trivial(self.in_blocks()),
        };
        let preceding = Locations::empty(self.label.clone());
        let pr = self.accept_bound(ctx, noise, input, k_max, &preceding)?;
        match &self.kind {
            ComponentKind::Sequential(_) | ComponentKind::Parallel(_) => {
                let model = &**noise.get(ErrorType::Y);
                let pr_bad = self.pr_bad(ctx, model, ErrorType::Y, k_max)?;
                Ok(&pr - &pr_bad)
            }
            ComponentKind::Leaf(_) | ComponentKind::Filter(_) => Ok(pr),
        }
    }

    /// Product of the postselection bounds of the subtree, without the
    /// `Pr[bad]` correction.
    ///
    /// `preceding` holds the locations whose faults produced `input`; their
    /// likelihood prefactor scales the rejected mass.
    fn accept_bound<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        input: CountResult<W>,
        k_max: Option<usize>,
        preceding: &Locations,
    ) -> CountingResult<RationalFunction> {
        match &self.kind {
            ComponentKind::Leaf(_) => Ok(RationalFunction::one()),
            ComponentKind::Filter(filter) => {
                let Some(error_type) = filter.postselect else {
                    return Ok(RationalFunction::one());
                };
                let (_, rejected) = self.propagate_with_rejected(&input);
                let model = &**noise.get(error_type);
                let totals = preceding.filter_against(error_type).totals();
                let pr = lower_bound_poly(&rejected, &RationalFunction::zero(), &totals, model);
                debug!(component = %self, n_preceding = totals.total(), "Pr[accept] computed");
                Ok(pr)
            }
            ComponentKind::Sequential(children) | ComponentKind::Parallel(children) => {
                let rotate = matches!(self.kind, ComponentKind::Parallel(_));
                let k_lim = self.order_limit(ErrorType::Y, &input, k_max);
                let mut seen: Vec<Location> = preceding.iter().cloned().collect();
                let mut pr = RationalFunction::one();
                let mut result = input;
                for child in children {
                    let before = Locations::new(seen.clone(), self.label.clone());
                    pr *= &child.accept_bound(ctx, noise, result.clone(), Some(k_lim), &before)?;
                    result = child.count(ctx, noise, ErrorType::Y, Some(&result), Some(k_lim))?;
                    if rotate {
                        result = result.rotated(child.out_blocks().len() as isize);
                    }
                    seen.extend(child.locations(ErrorType::Y).iter().cloned());
                }
                Ok(pr)
            }
        }
    }

    /// Counts with the acceptance and failure bounds attached.
    pub fn analyze<W: Weight>(
        &self,
        ctx: &RuntimeContext,
        noise: &NoiseModels<W>,
        error_type: ErrorType,
    ) -> CountingResult<CountResult<W>> {
        info!(component = %self, %error_type, "Analyzing");
        let result = self.count(ctx, noise, error_type, None, None)?;
        let pr_accept = self.pr_accept(ctx, noise, None, None)?;
        let pr_bad = self.pr_bad(ctx, &**noise.get(error_type), error_type, None)?;
        Ok(result.with_bounds(pr_accept, pr_bad))
    }
}
