use crate::*;

/// A deterministic sequence of nonces derived from a seed.
///
/// `get(i)` is a pure function of the seed and `i`, so any nonce used during encryption
/// can be regenerated later for audit without having been stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonces {
    seed: ElementModQ,
}

impl Nonces {
    pub fn new(seed: &ElementModQ) -> Self {
        Nonces { seed: seed.clone() }
    }

    /// Derive the sequence seed by hashing `seed` together with `headers`.
    pub fn with_headers(seed: &ElementModQ, headers: &[Hashable]) -> Self {
        if headers.is_empty() {
            return Nonces::new(seed);
        }

        let mut elems: Vec<Hashable> = Vec::with_capacity(headers.len() + 1);
        elems.push(seed.into());
        elems.extend(headers.iter().cloned());

        Nonces {
            seed: hash_elems(&elems),
        }
    }

    pub fn seed(&self) -> &ElementModQ {
        &self.seed
    }

    pub fn get(&self, index: u64) -> ElementModQ {
        self.get_with_headers(index, &[])
    }

    pub fn get_with_headers(&self, index: u64, headers: &[&str]) -> ElementModQ {
        let mut elems: Vec<Hashable> = Vec::with_capacity(headers.len() + 2);
        elems.push((&self.seed).into());
        elems.push(index.into());
        elems.extend(headers.iter().map(|h| Hashable::from(*h)));

        hash_elems(&elems)
    }

    /// The nonce following `index` in the sequence.
    pub fn next_after(&self, index: u64) -> ElementModQ {
        self.get(index + 1)
    }

    /// Nonces for every index in `[start, end)`.
    pub fn slice(&self, start: u64, end: u64) -> Vec<ElementModQ> {
        (start..end).map(|i| self.get(i)).collect()
    }
}
