//! Circuit locations.
//!
//! The primitive gate set is `{|0>, |+>, rest, CNOT, Z-measurement,
//! X-measurement}`. Pauli gates are tracked in the Pauli frame and never
//! appear as locations. Every location addresses `(block, bit)` pairs, so a
//! circuit is just an ordered, named list of locations over a set of blocks.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::noise::ErrorType;

/// Preparation / measurement basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Basis {
    /// The X basis (`|+>` preparation, X measurement).
    X,
    /// The Z basis (`|0>` preparation, Z measurement).
    Z,
}

impl Basis {
    /// The other basis.
    pub fn dual(self) -> Self {
        match self {
            Basis::X => Basis::Z,
            Basis::Z => Basis::X,
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::X => write!(f, "X"),
            Basis::Z => write!(f, "Z"),
        }
    }
}

/// The kind of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationType {
    /// Idle qubit.
    Rest,
    /// Preparation of `|+>`.
    PrepX,
    /// Preparation of `|0>`.
    PrepZ,
    /// Controlled-NOT.
    Cnot,
    /// X-basis measurement.
    MeasX,
    /// Z-basis measurement.
    MeasZ,
}

impl LocationType {
    /// Every location type, in canonical order.
    pub const ALL: [LocationType; 6] = [
        LocationType::Rest,
        LocationType::PrepX,
        LocationType::PrepZ,
        LocationType::Cnot,
        LocationType::MeasX,
        LocationType::MeasZ,
    ];

    /// Short name used in descriptors and log output.
    pub fn name(self) -> &'static str {
        match self {
            LocationType::Rest => "rest",
            LocationType::PrepX => "prepX",
            LocationType::PrepZ => "prepZ",
            LocationType::Cnot => "cnot",
            LocationType::MeasX => "measX",
            LocationType::MeasZ => "measZ",
        }
    }

    /// True for two-qubit gates.
    pub fn is_two_qubit(self) -> bool {
        self == LocationType::Cnot
    }

    /// Preparation in the given basis.
    pub fn prep(basis: Basis) -> Self {
        match basis {
            Basis::X => LocationType::PrepX,
            Basis::Z => LocationType::PrepZ,
        }
    }

    /// Measurement in the given basis.
    pub fn meas(basis: Basis) -> Self {
        match basis {
            Basis::X => LocationType::MeasX,
            Basis::Z => LocationType::MeasZ,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single circuit location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    kind: LocationType,
    block1: String,
    bit1: usize,
    target: Option<(String, usize)>,
}

impl Location {
    /// An idle location.
    pub fn rest(block: impl Into<String>, bit: usize) -> Self {
        Self::single(LocationType::Rest, block, bit)
    }

    /// A preparation in the given basis.
    pub fn prep(basis: Basis, block: impl Into<String>, bit: usize) -> Self {
        Self::single(LocationType::prep(basis), block, bit)
    }

    /// A measurement in the given basis.
    pub fn meas(basis: Basis, block: impl Into<String>, bit: usize) -> Self {
        Self::single(LocationType::meas(basis), block, bit)
    }

    /// A CNOT from `(ctrl_block, ctrl_bit)` onto `(targ_block, targ_bit)`.
    pub fn cnot(
        ctrl_block: impl Into<String>,
        ctrl_bit: usize,
        targ_block: impl Into<String>,
        targ_bit: usize,
    ) -> Self {
        Self {
            kind: LocationType::Cnot,
            block1: ctrl_block.into(),
            bit1: ctrl_bit,
            target: Some((targ_block.into(), targ_bit)),
        }
    }

    fn single(kind: LocationType, block: impl Into<String>, bit: usize) -> Self {
        Self {
            kind,
            block1: block.into(),
            bit1: bit,
            target: None,
        }
    }

    /// Location type.
    pub fn kind(&self) -> LocationType {
        self.kind
    }

    /// First (or only) block.
    pub fn block1(&self) -> &str {
        &self.block1
    }

    /// First (or only) bit.
    pub fn bit1(&self) -> usize {
        self.bit1
    }

    /// Second block and bit (CNOT target).
    pub fn target(&self) -> Option<(&str, usize)> {
        self.target.as_ref().map(|(b, i)| (b.as_str(), *i))
    }

    /// All `(block, bit)` pairs touched by this location.
    pub fn operands(&self) -> impl Iterator<Item = (&str, usize)> {
        std::iter::once((self.block1.as_str(), self.bit1)).chain(self.target())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}[{}]", self.kind, self.block1, self.bit1)?;
        if let Some((b, i)) = self.target() {
            write!(f, ", {b}[{i}]")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Location lists
// ---------------------------------------------------------------------------

/// An ordered, named list of locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locations {
    name: String,
    list: Vec<Location>,
}

impl Locations {
    /// Create a named list.
    pub fn new(list: Vec<Location>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list,
        }
    }

    /// An empty list.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(Vec::new(), name)
    }

    /// Name of the list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True if there are no locations.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Location at `index`.
    pub fn get(&self, index: usize) -> Option<&Location> {
        self.list.get(index)
    }

    /// Iterate in circuit order.
    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.list.iter()
    }

    /// The underlying slice.
    pub fn as_slice(&self) -> &[Location] {
        &self.list
    }

    /// Block names in order of first appearance.
    pub fn block_names(&self) -> Vec<String> {
        self.block_lengths().into_iter().map(|(name, _)| name).collect()
    }

    /// `(name, length)` for every block, in order of first appearance.
    ///
    /// The length of a block is its largest referenced bit plus one.
    pub fn block_lengths(&self) -> Vec<(String, usize)> {
        let mut order: Vec<(String, usize)> = Vec::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for loc in &self.list {
            for (block, bit) in loc.operands() {
                match index.get(block) {
                    Some(&i) => order[i].1 = order[i].1.max(bit + 1),
                    None => {
                        index.insert(block, order.len());
                        order.push((block.to_string(), bit + 1));
                    }
                }
            }
        }
        order
    }

    /// Drop the locations that cannot cause an error of the given type.
    ///
    /// X errors are neither caused nor detected by X-basis preparation and
    /// measurement; dually for Z. `Y` keeps everything.
    pub fn filter_against(&self, error_type: ErrorType) -> Locations {
        let skip: &[LocationType] = match error_type {
            ErrorType::X => &[LocationType::PrepX, LocationType::MeasX],
            ErrorType::Z => &[LocationType::PrepZ, LocationType::MeasZ],
            ErrorType::Y => &[],
        };
        let list = self
            .list
            .iter()
            .filter(|loc| !skip.contains(&loc.kind))
            .cloned()
            .collect();
        Locations::new(list, self.name.clone())
    }

    /// Per-type tallies.
    pub fn totals(&self) -> LocationTotals {
        let mut totals = LocationTotals::default();
        for loc in &self.list {
            totals.record(loc.kind, 1);
        }
        totals
    }
}

impl<'a> IntoIterator for &'a Locations {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

impl Add for Locations {
    type Output = Locations;

    fn add(mut self, rhs: Locations) -> Locations {
        self.name = format!("{}:{}", self.name, rhs.name);
        self.list.extend(rhs.list);
        self
    }
}

impl fmt::Display for Locations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Number of locations of each type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationTotals {
    counts: [usize; 6],
}

impl LocationTotals {
    /// Count for one type.
    pub fn get(&self, kind: LocationType) -> usize {
        self.counts[kind.index()]
    }

    /// Add `n` locations of the given type.
    pub fn record(&mut self, kind: LocationType, n: usize) {
        self.counts[kind.index()] += n;
    }

    /// Total number of locations.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(type, count)` for every type with a non-zero count.
    pub fn iter(&self) -> impl Iterator<Item = (LocationType, usize)> + '_ {
        LocationType::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|&(_, n)| n > 0)
    }
}

impl Add for LocationTotals {
    type Output = LocationTotals;

    fn add(mut self, rhs: LocationTotals) -> LocationTotals {
        self += rhs;
        self
    }
}

impl AddAssign for LocationTotals {
    fn add_assign(&mut self, rhs: LocationTotals) {
        for (a, b) in self.counts.iter_mut().zip(rhs.counts) {
            *a += b;
        }
    }
}

impl std::iter::Sum for LocationTotals {
    fn sum<I: Iterator<Item = LocationTotals>>(iter: I) -> Self {
        iter.fold(LocationTotals::default(), |acc, t| acc + t)
    }
}
