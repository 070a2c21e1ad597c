//! Combinatorial iterators used by counting and bounding.

/// All ways of splitting `whole` objects into an ordered list of parts.
///
/// Each item is a `Vec<usize>` of length `parts` whose entries sum to
/// `whole`, with `min[i] <= item[i] <= max[i]`. Items are produced in
/// descending order of the first part, then of the second part, and so on.
///
/// ```rust
/// use qfault_count::iteration::PartitionIterator;
///
/// let parts: Vec<_> = PartitionIterator::with_minimums(3, 3, &[3, 1, 2], &[1, 0, 0]).collect();
/// assert_eq!(
///     parts,
///     vec![vec![3, 0, 0], vec![2, 1, 0], vec![2, 0, 1], vec![1, 1, 1], vec![1, 0, 2]]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PartitionIterator {
    max: Vec<usize>,
    min: Vec<usize>,
    /// Sum of `max[i..]` for every `i` (one extra trailing zero).
    max_suffix: Vec<usize>,
    /// Sum of `min[i..]` for every `i` (one extra trailing zero).
    min_suffix: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl PartitionIterator {
    /// Partitions of `whole` into `parts` parts with per-part maximums.
    pub fn new(whole: usize, parts: usize, max_in_parts: &[usize]) -> Self {
        Self::with_minimums(whole, parts, max_in_parts, &vec![0; parts])
    }

    /// Partitions with per-part maximums and minimums.
    pub fn with_minimums(
        whole: usize,
        parts: usize,
        max_in_parts: &[usize],
        min_in_parts: &[usize],
    ) -> Self {
        let max: Vec<usize> = (0..parts)
            .map(|i| max_in_parts.get(i).copied().unwrap_or(whole))
            .collect();
        let min: Vec<usize> = (0..parts)
            .map(|i| min_in_parts.get(i).copied().unwrap_or(0))
            .collect();
        let mut max_suffix = vec![0; parts + 1];
        let mut min_suffix = vec![0; parts + 1];
        for i in (0..parts).rev() {
            max_suffix[i] = max_suffix[i + 1] + max[i];
            min_suffix[i] = min_suffix[i + 1] + min[i];
        }

        let mut it = Self {
            max,
            min,
            max_suffix,
            min_suffix,
            current: None,
        };
        if parts > 0 {
            let mut first = vec![0; parts];
            if it.fill(&mut first, 0, whole) {
                it.current = Some(first);
            }
        }
        it
    }

    /// Greedily fill `p[start..]` with `remaining`, largest values first.
    fn fill(&self, p: &mut [usize], start: usize, remaining: usize) -> bool {
        if remaining < self.min_suffix[start] || remaining > self.max_suffix[start] {
            return false;
        }
        let mut r = remaining;
        for i in start..p.len() {
            let v = self.max[i].min(r - self.min_suffix[i + 1]);
            p[i] = v;
            r -= v;
        }
        r == 0
    }

    fn advance(&self, p: &mut [usize]) -> bool {
        let n = p.len();
        if n < 2 {
            return false;
        }
        let mut tail: usize = p[n - 1];
        for i in (0..n - 1).rev() {
            if p[i] > self.min[i] && tail < self.max_suffix[i + 1] {
                p[i] -= 1;
                return self.fill(p, i + 1, tail + 1);
            }
            tail += p[i];
        }
        false
    }
}

impl Iterator for PartitionIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let item = self.current.take()?;
        let mut next = item.clone();
        if self.advance(&mut next) {
            self.current = Some(next);
        }
        Some(item)
    }
}

/// All `k`-element subsets of `0..n` in lexicographic order.
///
/// `k = 0` yields a single empty subset.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
    /// Fixed first element, if any.
    first: Option<usize>,
}

impl Combinations {
    /// All `k`-subsets of `0..n`.
    pub fn new(n: usize, k: usize) -> Self {
        let current = (k <= n).then(|| (0..k).collect());
        Self {
            n,
            current,
            first: None,
        }
    }

    /// The `k`-subsets of `0..n` whose smallest element is `first`.
    pub fn with_first(n: usize, k: usize, first: usize) -> Self {
        let current = (k > 0 && first + k <= n).then(|| (first..first + k).collect());
        Self {
            n,
            current,
            first: Some(first),
        }
    }

    /// Number of `k`-subsets of `n` elements, as a float.
    pub fn count(n: usize, k: usize) -> f64 {
        binomial(n, k)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let item = self.current.take()?;
        let k = item.len();
        let lowest = usize::from(self.first.is_some());
        let mut next = item.clone();
        // Rightmost index that can still be incremented.
        let mut i = k;
        while i > lowest {
            i -= 1;
            if next[i] < self.n - k + i {
                next[i] += 1;
                for j in i + 1..k {
                    next[j] = next[j - 1] + 1;
                }
                self.current = Some(next);
                break;
            }
        }
        Some(item)
    }
}

/// `C(n, k)` as a float.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}
