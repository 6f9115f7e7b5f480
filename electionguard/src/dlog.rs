use crate::*;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Default upper bound on the exponents `DiscreteLog` will search.
pub const DEFAULT_MAX_EXPONENT: u64 = 10_000_000;

struct DiscreteLogState {
    cache: HashMap<ElementModP, u64>,
    frontier: ElementModP,
    frontier_exponent: u64,
}

/// Discrete logs of small powers of `G`, computed incrementally and cached.
///
/// Lookups share one cache guarded by a mutex, so a single instance can be passed by reference
/// to any number of concurrent decryptions.
pub struct DiscreteLog {
    state: Mutex<DiscreteLogState>,
    max_exponent: u64,
}

impl Default for DiscreteLog {
    fn default() -> Self {
        DiscreteLog::new()
    }
}

impl DiscreteLog {
    pub fn new() -> Self {
        DiscreteLog::with_max_exponent(DEFAULT_MAX_EXPONENT)
    }

    /// A cache that gives up once the search passes `max_exponent`.
    pub fn with_max_exponent(max_exponent: u64) -> Self {
        let mut cache = HashMap::new();
        cache.insert(ElementModP::one(), 0);

        DiscreteLog {
            state: Mutex::new(DiscreteLogState {
                cache,
                frontier: ElementModP::one(),
                frontier_exponent: 0,
            }),
            max_exponent,
        }
    }

    /// Find `x` such that `G^x == e`.
    pub fn discrete_log(&self, e: &ElementModP) -> Result<u64, Error> {
        // Every insert keeps the state consistent, so a poisoned lock is safe to reuse
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(exponent) = state.cache.get(e) {
            return Ok(*exponent);
        }

        let g = ElementModP::generator();
        let start = state.frontier_exponent;
        while &state.frontier != e {
            if state.frontier_exponent >= self.max_exponent {
                return Err(Error::DiscreteLogOutOfRange(self.max_exponent));
            }
            let next = mult_p(&[&state.frontier, &g]);
            let exponent = state.frontier_exponent + 1;
            state.cache.insert(next.clone(), exponent);
            state.frontier = next;
            state.frontier_exponent = exponent;
        }

        debug!(
            "discrete log cache extended from {} to {}",
            start, state.frontier_exponent
        );
        Ok(state.frontier_exponent)
    }

    /// Largest exponent computed so far.
    pub fn frontier_exponent(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.frontier_exponent
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_small_logs() {
        let dlog = DiscreteLog::new();
        for k in 0..100u64 {
            assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(k))).unwrap(), k);
        }
        assert_eq!(dlog.frontier_exponent(), 99);
        assert_eq!(dlog.len(), 100);
    }

    #[test]
    fn test_cache_is_reused() {
        let dlog = DiscreteLog::new();
        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(50))).unwrap(), 50);
        assert_eq!(dlog.frontier_exponent(), 50);

        // Smaller values are answered from the cache without extending it
        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(20))).unwrap(), 20);
        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(50))).unwrap(), 50);
        assert_eq!(dlog.frontier_exponent(), 50);
        assert_eq!(dlog.len(), 51);

        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(60))).unwrap(), 60);
        assert_eq!(dlog.frontier_exponent(), 60);
    }

    #[test]
    fn test_out_of_range() {
        let dlog = DiscreteLog::with_max_exponent(10);
        assert!(matches!(
            dlog.discrete_log(&g_pow_p(&ElementModQ::from(11))),
            Err(Error::DiscreteLogOutOfRange(10))
        ));
        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(10))).unwrap(), 10);
    }

    #[test]
    fn test_concurrent_lookups() {
        let dlog = Arc::new(DiscreteLog::new());
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let dlog = Arc::clone(&dlog);
                thread::spawn(move || {
                    for k in (0..40u64).rev() {
                        let k = k + t;
                        assert_eq!(dlog.discrete_log(&g_pow_p(&ElementModQ::from(k))).unwrap(), k);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(dlog.frontier_exponent(), 42);
    }
}
