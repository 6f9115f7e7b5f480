use crate::*;
use digest::Digest;
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::Sha256;
use std::borrow::Cow;

/// A type with a canonical hash, used when it is nested inside another hash.
pub trait CryptoHashable {
    fn crypto_hash(&self) -> ElementModQ;
}

/// A type that can be hashed against an externally supplied seed and checked later.
pub trait CryptoHashCheckable {
    fn crypto_hash_with(&self, seed_hash: &ElementModQ) -> ElementModQ;
}

/// One value fed to `hash_elems`.
#[derive(Clone, Debug)]
pub enum Hashable<'a> {
    ModQ(Cow<'a, ElementModQ>),
    ModP(Cow<'a, ElementModP>),
    Str(Cow<'a, str>),
    Int(Cow<'a, BigUint>),
    List(Vec<Hashable<'a>>),
    Null,
}

impl Hashable<'_> {
    /// Canonical string form of this value inside a hash.
    fn token(&self) -> String {
        match self {
            Hashable::ModQ(e) => element_token(e.as_int()),
            Hashable::ModP(e) => element_token(e.as_int()),
            Hashable::Str(s) => s.to_string(),
            Hashable::Int(i) => i.to_str_radix(10),
            Hashable::List(items) if items.is_empty() => "null".to_string(),
            Hashable::List(items) => element_token(hash_elems(items).as_int()),
            Hashable::Null => "null".to_string(),
        }
    }
}

// Zero is rendered as "0" so it never collides with the null sentinel
fn element_token(value: &BigUint) -> String {
    if value.is_zero() {
        "0".to_string()
    } else {
        hex::encode_upper(value.to_bytes_be())
    }
}

/// Hash the items of a collection as a single nested value.
pub fn hash_list<T: CryptoHashable>(items: &[T]) -> Hashable<'static> {
    Hashable::List(items.iter().map(|i| i.crypto_hash().into()).collect())
}

/// Hash a sequence of values with SHA-256, reducing the digest into `[0, Q - 1)`.
///
/// Every value is rendered to a token and the tokens are hashed as `|t1|t2|...|`.
/// An empty sequence hashes the same as `[Null]`.
pub fn hash_elems(elems: &[Hashable]) -> ElementModQ {
    let mut hasher = Sha256::new();
    hasher.update(b"|");

    if elems.is_empty() {
        hasher.update(b"null|");
    }
    for elem in elems {
        hasher.update(elem.token().as_bytes());
        hasher.update(b"|");
    }

    let digest = hasher.finalize();
    int_to_q_unchecked(BigUint::from_bytes_be(&digest) % &*Q_MINUS_ONE)
}

impl<'a> From<&'a ElementModQ> for Hashable<'a> {
    fn from(e: &'a ElementModQ) -> Self {
        Hashable::ModQ(Cow::Borrowed(e))
    }
}

impl From<ElementModQ> for Hashable<'_> {
    fn from(e: ElementModQ) -> Self {
        Hashable::ModQ(Cow::Owned(e))
    }
}

impl<'a> From<&'a ElementModP> for Hashable<'a> {
    fn from(e: &'a ElementModP) -> Self {
        Hashable::ModP(Cow::Borrowed(e))
    }
}

impl From<ElementModP> for Hashable<'_> {
    fn from(e: ElementModP) -> Self {
        Hashable::ModP(Cow::Owned(e))
    }
}

impl<'a> From<&'a str> for Hashable<'a> {
    fn from(s: &'a str) -> Self {
        Hashable::Str(Cow::Borrowed(s))
    }
}

impl<'a> From<&'a String> for Hashable<'a> {
    fn from(s: &'a String) -> Self {
        Hashable::Str(Cow::Borrowed(s.as_str()))
    }
}

impl From<String> for Hashable<'_> {
    fn from(s: String) -> Self {
        Hashable::Str(Cow::Owned(s))
    }
}

impl From<u64> for Hashable<'_> {
    fn from(i: u64) -> Self {
        Hashable::Int(Cow::Owned(BigUint::from(i)))
    }
}

impl<'a> From<&'a BigUint> for Hashable<'a> {
    fn from(i: &'a BigUint) -> Self {
        Hashable::Int(Cow::Borrowed(i))
    }
}

impl<'a> From<Vec<Hashable<'a>>> for Hashable<'a> {
    fn from(items: Vec<Hashable<'a>>) -> Self {
        Hashable::List(items)
    }
}

impl<'a, T: Into<Hashable<'a>>> From<Option<T>> for Hashable<'a> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Hashable::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let seed = ElementModQ::from(1234);
        let a = hash_elems(&[(&seed).into(), "abc".into(), 3u64.into()]);
        let b = hash_elems(&[(&seed).into(), "abc".into(), 3u64.into()]);
        assert_eq!(a, b);
        assert!(a.is_in_bounds());

        let c = hash_elems(&[(&seed).into(), "abd".into(), 3u64.into()]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_null_sentinel() {
        let empty = hash_elems(&[]);
        assert_eq!(empty, hash_elems(&[Hashable::Null]));
        assert_eq!(empty, hash_elems(&[Hashable::List(vec![])]));
        assert_eq!(empty, hash_elems(&[Option::<&str>::None.into()]));
        assert_eq!(empty, hash_elems(&["null".into()]));
        assert_eq!(
            empty.to_string(),
            "4B9729549DA6FBF91219C4D2D4878F0D9F443F92D013C6C768F96BA81C7CCAEE"
        );
    }

    #[test]
    fn test_zero_is_not_null() {
        let zero_q = hash_elems(&[ElementModQ::zero().into()]);
        let zero_int = hash_elems(&[0u64.into()]);
        assert_eq!(zero_q, zero_int);
        assert_ne!(zero_q, hash_elems(&[Hashable::Null]));
    }

    #[test]
    fn test_canonical_tokens() {
        let h = hash_elems(&[
            "abc".into(),
            0u64.into(),
            ElementModQ::zero().into(),
            ElementModQ::from(0x1ff).into(),
            Hashable::Null,
            Hashable::List(vec![]),
        ]);
        assert_eq!(
            h.to_string(),
            "B82E6400D471204B37F1525CD6C8E917680AFF49E351FA518F35577864DF35E7"
        );
    }

    #[test]
    fn test_nested_lists_hash_recursively() {
        let nested = hash_elems(&["abc".into(), Hashable::List(vec!["x".into(), 1u64.into()])]);
        let inner = hash_elems(&["x".into(), 1u64.into()]);
        let flat = hash_elems(&["abc".into(), inner.into()]);

        assert_eq!(nested, flat);
        assert_ne!(nested, hash_elems(&["abc".into(), "x".into(), 1u64.into()]));
        assert_eq!(
            nested.to_string(),
            "44765CCCA6AF3F5A3A779284D43CDB51FBC31AB00E1E046D73ABBD51C580B0F4"
        );
    }

    #[test]
    fn test_p_and_q_elements_render_alike() {
        let q = hash_elems(&[ElementModQ::from(77).into()]);
        let p = hash_elems(&[ElementModP::from(77).into()]);
        assert_eq!(q, p);
        assert_ne!(q, hash_elems(&[77u64.into()]));
    }
}
