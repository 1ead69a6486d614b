//! Hash keys: value-equality keys for the Hash object.
//!
//! Only Integer, Boolean and String can be keys. Equal values always produce
//! equal keys; the kind is part of the key, so `1` and `true` never collide.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::object::{Object, ObjectType};

/// 64-bit FNV-1a offset basis.
pub const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
/// 64-bit FNV-1a prime.
pub const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

/// Hash a byte slice with FNV-1a 64-bit. Seedless, so stable across runs.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV1A_OFFSET_BASIS_64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
    }
    hash
}

/// Key of a Hash entry: the key's kind plus a 64-bit digest of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: ObjectType,
    pub value: u64,
}

/// A Hash entry. The original key object is kept because a `HashKey` cannot
/// be turned back into it.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

/// Entries of a Hash object, in insertion order.
pub type HashPairs = IndexMap<HashKey, HashPair>;

/// Values usable as hash keys.
pub trait Hashable {
    fn hash_key(&self) -> HashKey;
}

impl Hashable for i64 {
    fn hash_key(&self) -> HashKey {
        HashKey {
            kind: ObjectType::Integer,
            value: *self as u64,
        }
    }
}

impl Hashable for bool {
    fn hash_key(&self) -> HashKey {
        HashKey {
            kind: ObjectType::Boolean,
            value: u64::from(*self),
        }
    }
}

impl Hashable for str {
    fn hash_key(&self) -> HashKey {
        HashKey {
            kind: ObjectType::String,
            value: fnv1a64(self.as_bytes()),
        }
    }
}

impl Object {
    /// The object's hash key, or `None` if its kind cannot be a key.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(n.hash_key()),
            Object::Boolean(b) => Some(b.hash_key()),
            Object::String(s) => Some(s.hash_key()),
            _ => None,
        }
    }

    /// Build a Hash from key/value pairs. A later duplicate key replaces the
    /// earlier value but keeps its position.
    ///
    /// Fails with the kind of the first key that is not hashable.
    pub fn hash_from_pairs<I>(pairs: I) -> Result<Object, ObjectType>
    where
        I: IntoIterator<Item = (Object, Object)>,
    {
        let mut map = HashPairs::new();
        for (key, value) in pairs {
            let hash_key = key.hash_key().ok_or(key.kind())?;
            map.insert(hash_key, HashPair { key, value });
        }
        Ok(Object::Hash(Rc::new(map)))
    }
}
