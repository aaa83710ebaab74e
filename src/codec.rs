use std::fmt;
use std::hash::Hash;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// dense position assigned to an identifier, in `[0, N)`
pub type Index = usize;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Opaque user identifier from upstream storage (an email, a member key, ...)
    UserId
);
opaque_id!(
    /// Opaque catalog item identifier from upstream storage
    /// Ties in every ranking are broken by ascending `ItemId` (string order).
    ItemId
);

/// Bidirectional id <-> index table
///
/// Indices are handed out in first-seen order while the codec is being built.
/// Once built, `encode` only resolves ids it already knows; unseen ids are an error,
/// never silently assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Hash + Eq",
    deserialize = "K: Deserialize<'de> + Hash + Eq"
))]
pub struct IdCodec<K> {
    ids: IndexSet<K>,
}

/// index 割り当てまで含めて一致するときだけ等しい
/// (`IndexSet` 自体の `==` は順序を見ない)
impl<K> PartialEq for IdCodec<K>
where
    K: Hash + Eq,
{
    fn eq(&self, other: &Self) -> bool {
        self.ids.len() == other.ids.len() && self.ids.iter().eq(other.ids.iter())
    }
}

impl<K> Eq for IdCodec<K> where K: Hash + Eq {}

impl<K> Default for IdCodec<K> {
    fn default() -> Self {
        Self { ids: IndexSet::new() }
    }
}

impl<K> IdCodec<K>
where
    K: Hash + Eq + Clone + fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a codec from an id snapshot; duplicates keep their first index
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut codec = Self::new();
        for id in ids {
            codec.insert(id);
        }
        codec
    }

    /// construction pass: 初見の id に新しい index を割り当てる
    #[inline]
    pub fn insert(&mut self, id: K) -> Index {
        self.ids.insert_full(id).0
    }

    /// serve time lookup
    #[inline]
    pub fn encode(&self, id: &K) -> Result<Index> {
        self.ids
            .get_index_of(id)
            .ok_or_else(|| EngineError::UnknownIdentifier(id.to_string()))
    }

    #[inline]
    pub fn decode(&self, index: Index) -> Option<&K> {
        self.ids.get_index(index)
    }

    #[inline]
    pub fn contains(&self, id: &K) -> bool {
        self.ids.contains(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// ids in index order
    pub fn iter(&self) -> impl Iterator<Item = (Index, &K)> {
        self.ids.iter().enumerate()
    }
}
