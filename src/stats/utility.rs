use std::collections::BTreeMap;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear-interpolated quantile `q` (0.0–1.0) of already sorted values.
/// Returns 0.0 for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn median(sorted: &[f64]) -> f64 {
    quantile(sorted, 0.5)
}

/// `part` as a percentage of `total`; 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Occurrence counts keyed in natural key order.
///
/// Every "most/least frequent" query resolves ties to the smallest key, so
/// results do not depend on input order.
#[derive(Debug, Clone)]
pub struct Tally<K: Ord> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> Default for Tally<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> FromIterator<K> for Tally<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for key in iter {
            tally.add(key);
        }
        tally
    }
}

impl<K: Ord> Tally<K> {
    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_default() += 1;
    }
}

impl<K: Ord + Clone> Tally<K> {
    pub fn get(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Highest count, smallest key among ties.
    pub fn most_common(&self) -> Option<(K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (k, &n) in &self.counts {
            if best.is_none_or(|(_, b)| n > b) {
                best = Some((k, n));
            }
        }
        best.map(|(k, n)| (k.clone(), n))
    }

    /// Lowest count, smallest key among ties.
    pub fn least_common(&self) -> Option<(K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (k, &n) in &self.counts {
            if best.is_none_or(|(_, b)| n < b) {
                best = Some((k, n));
            }
        }
        best.map(|(k, n)| (k.clone(), n))
    }

    /// All keys by count descending, then key ascending.
    pub fn ranked(&self) -> Vec<(K, usize)> {
        let mut ranked: Vec<(K, usize)> = self.counts.iter().map(|(k, &n)| (k.clone(), n)).collect();
        // stable sort keeps key order within equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The first `n` of [`Tally::ranked`].
    pub fn top(&self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Counts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.counts.iter().map(|(k, &n)| (k, n))
    }

    /// Mean count per distinct key.
    pub fn mean_count(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.counts.len() as f64
    }
}
