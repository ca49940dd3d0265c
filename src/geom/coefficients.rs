//! Memoized factorial and binomial tables for Bernstein evaluation.
//!
//! Binomial coefficients recur for every sample of every surface, so they are
//! computed once and kept. The tables only ever grow: an entry, once stored,
//! stays valid for the lifetime of the cache.
//!
//! # Features
//! - Factorial table seeded with `[1, 1]`, extended on demand
//! - Binomial map keyed by `(n, k)`
//! - Hit/miss statistics for diagnostics
//! - A lazily initialized, mutex-guarded process-wide instance
//!
//! # Example
//! ```ignore
//! let mut cache = CoefficientCache::new();
//! assert_eq!(cache.binomial(5, 2)?, 10);
//! let basis = BernsteinBasis::new(&mut cache, 3)?;
//! let weights = basis.weights(0.5);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Largest degree whose factorial fits in the `u128` table (34! < 2^128 < 35!).
pub const MAX_DEGREE: u32 = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoefficientError {
    #[error("binomial({n}, {k}) requires k <= n")]
    BinomialOutOfRange { n: u32, k: u32 },
    #[error("factorial({n}) does not fit in 128 bits (max degree is {max})", max = MAX_DEGREE)]
    FactorialOverflow { n: u32 },
}

/// Cache key for binomial coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BinomialKey {
    n: u32,
    k: u32,
}

/// Factorial and binomial memo tables.
///
/// Pass one explicitly through a [`SurfaceContext`](super::SurfaceContext), or
/// use [`CoefficientCache::shared`] for the process-wide instance.
#[derive(Debug)]
pub struct CoefficientCache {
    factorials: Vec<u128>,
    binomials: HashMap<BinomialKey, u128>,
    binomial_hits: usize,
    binomial_misses: usize,
}

/// Cache statistics for diagnostics and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoefficientCacheStats {
    /// Number of memoized factorials, including the `[1, 1]` seed.
    pub factorial_entries: usize,
    /// Number of memoized binomial coefficients.
    pub binomial_entries: usize,
    /// Binomial lookups answered from the table.
    pub binomial_hits: usize,
    /// Binomial lookups that had to be computed.
    pub binomial_misses: usize,
}

impl CoefficientCacheStats {
    /// Returns the binomial hit rate as a value between 0.0 and 1.0.
    /// Returns 0.0 if no lookups have been made.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.binomial_hits + self.binomial_misses;
        if total == 0 {
            0.0
        } else {
            self.binomial_hits as f64 / total as f64
        }
    }
}

static SHARED: OnceLock<Mutex<CoefficientCache>> = OnceLock::new();

impl Default for CoefficientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientCache {
    /// Creates a cache holding only the factorial seed `[1, 1]`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factorials: vec![1, 1],
            binomials: HashMap::new(),
            binomial_hits: 0,
            binomial_misses: 0,
        }
    }

    /// The process-wide cache, created on first access.
    pub fn shared() -> &'static Mutex<Self> {
        SHARED.get_or_init(|| Mutex::new(Self::new()))
    }

    /// Locks the process-wide cache.
    ///
    /// Every table write is a single push or insert of a fully computed value,
    /// so a guard recovered from a poisoned lock still holds valid entries.
    pub fn lock_shared() -> MutexGuard<'static, Self> {
        Self::shared().lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn stats(&self) -> CoefficientCacheStats {
        CoefficientCacheStats {
            factorial_entries: self.factorials.len(),
            binomial_entries: self.binomials.len(),
            binomial_hits: self.binomial_hits,
            binomial_misses: self.binomial_misses,
        }
    }

    /// Returns `n!`, extending the table up to `n` if needed.
    ///
    /// On overflow the table keeps every entry computed so far.
    pub fn factorial(&mut self, n: u32) -> Result<u128, CoefficientError> {
        let index = n as usize;
        while self.factorials.len() <= index {
            let next = self.factorials.len();
            let previous = self.factorials[next - 1];
            let value = previous
                .checked_mul(next as u128)
                .ok_or(CoefficientError::FactorialOverflow { n: next as u32 })?;
            self.factorials.push(value);
        }
        Ok(self.factorials[index])
    }

    /// Returns `C(n, k) = n! / k! / (n - k)!`, memoized by `(n, k)`.
    pub fn binomial(&mut self, n: u32, k: u32) -> Result<u128, CoefficientError> {
        if k > n {
            return Err(CoefficientError::BinomialOutOfRange { n, k });
        }
        let key = BinomialKey { n, k };
        if let Some(&cached) = self.binomials.get(&key) {
            self.binomial_hits += 1;
            return Ok(cached);
        }
        self.binomial_misses += 1;
        let value = self.factorial(n)? / self.factorial(k)? / self.factorial(n - k)?;
        self.binomials.insert(key, value);
        Ok(value)
    }

    /// Returns the whole row `C(n, 0..=n)` as floating point weights.
    pub fn binomial_row(&mut self, n: u32) -> Result<Vec<f64>, CoefficientError> {
        (0..=n)
            .map(|k| self.binomial(n, k).map(|c| c as f64))
            .collect()
    }

    /// Bernstein basis polynomial `C(n, k) * t^k * (1 - t)^(n - k)`.
    ///
    /// Not cached: `t` varies continuously.
    pub fn bernstein(&mut self, n: u32, k: u32, t: f64) -> Result<f64, CoefficientError> {
        let c = self.binomial(n, k)? as f64;
        Ok(bernstein_term(c, n, k, t))
    }
}

fn bernstein_term(binomial: f64, n: u32, k: u32, t: f64) -> f64 {
    binomial * t.powi(k as i32) * (1.0 - t).powi((n - k) as i32)
}

/// `n!` from the process-wide cache.
pub fn factorial(n: u32) -> Result<u128, CoefficientError> {
    CoefficientCache::lock_shared().factorial(n)
}

/// `C(n, k)` from the process-wide cache.
pub fn binomial(n: u32, k: u32) -> Result<u128, CoefficientError> {
    CoefficientCache::lock_shared().binomial(n, k)
}

/// Bernstein polynomial `B(n, k, t)` using the process-wide cache.
pub fn bernstein(n: u32, k: u32, t: f64) -> Result<f64, CoefficientError> {
    CoefficientCache::lock_shared().bernstein(n, k, t)
}

/// The Bernstein basis of one degree with its binomial row resolved up front.
///
/// Evaluating weights through a basis needs no access to the cache, which lets
/// tessellation lock the cache once and then sample without synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct BernsteinBasis {
    degree: u32,
    binomials: Vec<f64>,
}

impl BernsteinBasis {
    pub fn new(cache: &mut CoefficientCache, degree: u32) -> Result<Self, CoefficientError> {
        Ok(Self {
            degree,
            binomials: cache.binomial_row(degree)?,
        })
    }

    #[must_use]
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// `B(degree, k, t)`; zero for `k > degree`.
    #[must_use]
    pub fn weight(&self, k: u32, t: f64) -> f64 {
        self.binomials
            .get(k as usize)
            .map_or(0.0, |&c| bernstein_term(c, self.degree, k, t))
    }

    /// All `degree + 1` weights at `t`, in index order.
    #[must_use]
    pub fn weights(&self, t: f64) -> Vec<f64> {
        (0..=self.degree).map(|k| self.weight(k, t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_table_starts_seeded() {
        let cache = CoefficientCache::new();
        assert_eq!(cache.stats().factorial_entries, 2);
    }

    #[test]
    fn factorial_grows_on_demand() {
        let mut cache = CoefficientCache::new();
        assert_eq!(cache.factorial(0), Ok(1));
        assert_eq!(cache.factorial(1), Ok(1));
        assert_eq!(cache.factorial(5), Ok(120));
        assert_eq!(cache.stats().factorial_entries, 6);

        // Smaller requests never shrink the table.
        assert_eq!(cache.factorial(3), Ok(6));
        assert_eq!(cache.stats().factorial_entries, 6);
    }

    #[test]
    fn factorial_overflow_is_reported() {
        let mut cache = CoefficientCache::new();
        assert_eq!(
            cache.factorial(MAX_DEGREE),
            Ok(295_232_799_039_604_140_847_618_609_643_520_000_000)
        );
        assert_eq!(
            cache.factorial(MAX_DEGREE + 1),
            Err(CoefficientError::FactorialOverflow { n: MAX_DEGREE + 1 })
        );
        assert_eq!(
            cache.factorial(100),
            Err(CoefficientError::FactorialOverflow { n: MAX_DEGREE + 1 })
        );
        // Entries computed before the overflow are kept.
        assert_eq!(cache.stats().factorial_entries, MAX_DEGREE as usize + 1);
    }

    #[test]
    fn binomial_known_values() {
        let mut cache = CoefficientCache::new();
        assert_eq!(cache.binomial(5, 2), Ok(10));
        assert_eq!(cache.binomial(6, 3), Ok(20));
        assert_eq!(cache.binomial(34, 17), Ok(2_333_606_220));
    }

    #[test]
    fn binomial_symmetry_and_edges() {
        let mut cache = CoefficientCache::new();
        for n in 0..=MAX_DEGREE {
            assert_eq!(cache.binomial(n, 0), Ok(1), "C({n}, 0)");
            assert_eq!(cache.binomial(n, n), Ok(1), "C({n}, {n})");
            for k in 0..=n {
                assert_eq!(
                    cache.binomial(n, k).unwrap(),
                    cache.binomial(n, n - k).unwrap(),
                    "C({n}, {k}) symmetry"
                );
            }
        }
    }

    #[test]
    fn binomial_rejects_k_greater_than_n() {
        let mut cache = CoefficientCache::new();
        assert_eq!(
            cache.binomial(2, 3),
            Err(CoefficientError::BinomialOutOfRange { n: 2, k: 3 })
        );
        assert_eq!(cache.stats().binomial_entries, 0);
    }

    #[test]
    fn binomial_hits_and_misses() {
        let mut cache = CoefficientCache::new();
        for _ in 0..4 {
            let _ = cache.binomial(4, 2);
        }
        let stats = cache.stats();
        assert_eq!(stats.binomial_entries, 1);
        assert_eq!(stats.binomial_misses, 1);
        assert_eq!(stats.binomial_hits, 3);
        assert!((stats.hit_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn bernstein_partition_of_unity() {
        let mut cache = CoefficientCache::new();
        for n in [0_u32, 1, 2, 3, 7, 20] {
            for step in 0..=20 {
                let t = f64::from(step) / 20.0;
                let mut sum = 0.0;
                for k in 0..=n {
                    let b = cache.bernstein(n, k, t).unwrap();
                    assert!(b >= 0.0, "B({n}, {k}, {t}) = {b}");
                    sum += b;
                }
                assert!((sum - 1.0).abs() < 1e-9, "sum for n={n}, t={t} was {sum}");
            }
        }
    }

    #[test]
    fn bernstein_endpoints() {
        let mut cache = CoefficientCache::new();
        assert_eq!(cache.bernstein(3, 0, 0.0), Ok(1.0));
        assert_eq!(cache.bernstein(3, 1, 0.0), Ok(0.0));
        assert_eq!(cache.bernstein(3, 3, 1.0), Ok(1.0));
        assert_eq!(cache.bernstein(3, 2, 1.0), Ok(0.0));
        assert_eq!(cache.bernstein(0, 0, 0.3), Ok(1.0));
    }

    #[test]
    fn basis_matches_direct_bernstein() {
        let mut cache = CoefficientCache::new();
        let basis = BernsteinBasis::new(&mut cache, 5).unwrap();
        assert_eq!(basis.degree(), 5);
        for t in [0.0, 0.2, 0.5, 0.75, 1.0] {
            let weights = basis.weights(t);
            assert_eq!(weights.len(), 6);
            for k in 0..=5 {
                assert_eq!(weights[k as usize], cache.bernstein(5, k, t).unwrap());
            }
        }
        assert_eq!(basis.weight(6, 0.5), 0.0);
    }

    #[test]
    fn shared_cache_is_extended_monotonically() {
        let before = CoefficientCache::lock_shared().stats();
        assert_eq!(binomial(9, 4), Ok(126));
        assert_eq!(factorial(9), Ok(362_880));
        assert!((bernstein(2, 1, 0.5).unwrap() - 0.5).abs() < 1e-12);
        let after = CoefficientCache::lock_shared().stats();
        assert!(after.factorial_entries >= before.factorial_entries.max(10));
        assert!(after.binomial_entries >= before.binomial_entries);
    }
}
