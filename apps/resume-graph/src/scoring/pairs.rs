use rayon::prelude::*;

/// Scores for every unordered pair `i < j` of a population of `n`, stored as
/// a flattened upper triangle in enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScores {
    n: usize,
    values: Vec<f64>,
}

impl PairScores {
    /// `(0,1), (0,2), …, (0,n-1), (1,2), …`: each unordered pair once.
    pub fn pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
        (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
    }

    pub fn pair_count(n: usize) -> usize {
        n * n.saturating_sub(1) / 2
    }

    pub fn from_fn<F>(n: usize, score: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        Self {
            n,
            values: Self::pairs(n).map(|(i, j)| score(i, j)).collect(),
        }
    }

    /// Same as `from_fn`, scored on the rayon pool. Results keep enumeration
    /// order.
    pub fn par_from_fn<F>(n: usize, score: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let pairs: Vec<(usize, usize)> = Self::pairs(n).collect();
        Self {
            n,
            values: pairs.into_par_iter().map(|(i, j)| score(i, j)).collect(),
        }
    }

    /// Wraps scores already produced in `pairs(n)` order. `None` when the
    /// count does not match.
    pub fn from_values(n: usize, values: Vec<f64>) -> Option<Self> {
        (values.len() == Self::pair_count(n)).then_some(Self { n, values })
    }

    /// Score of the unordered pair `{i, j}`. `None` for `i == j` or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        if i == j || j >= self.n {
            return None;
        }
        let index = i * self.n - i * (i + 1) / 2 + (j - i - 1);
        self.values.get(index).copied()
    }

    pub fn population(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_enumerate_each_unordered_pair_once() {
        let pairs: Vec<_> = PairScores::pairs(4).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(PairScores::pair_count(4), 6);
        assert_eq!(PairScores::pair_count(1), 0);
        assert_eq!(PairScores::pair_count(0), 0);
    }

    #[test]
    fn test_get_is_symmetric() {
        let scores = PairScores::from_fn(4, |i, j| (i * 10 + j) as f64);
        for (i, j) in PairScores::pairs(4) {
            assert_eq!(scores.get(i, j), Some((i * 10 + j) as f64));
            assert_eq!(scores.get(j, i), scores.get(i, j));
        }
        assert_eq!(scores.get(2, 2), None);
        assert_eq!(scores.get(0, 4), None);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let score = |i: usize, j: usize| ((i * 31 + j * 17) % 100) as f64 / 100.0;
        assert_eq!(PairScores::par_from_fn(40, score), PairScores::from_fn(40, score));
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(PairScores::from_values(3, vec![0.1, 0.2, 0.3]).is_some());
        assert!(PairScores::from_values(3, vec![0.1]).is_none());
        assert!(PairScores::from_values(0, Vec::new()).unwrap().is_empty());
    }
}
