use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Card names are strings used in YAML files and persisted state
/// (human-readable, stable across versions)
pub type CardName = String;

/// Runtime IDs are integers compiled at catalog-load (fast, deterministic)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId<T> {
    pub raw: u16,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> RuntimeId<T> {
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

// Type-safe runtime IDs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorpTag;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColonyTag;

pub type CardId = RuntimeId<CardTag>;
pub type CorpId = RuntimeId<CorpTag>;
pub type ColonyId = RuntimeId<ColonyTag>;

/// Player identity is a stable seat index (max 5 players)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerIndex(pub u8);

impl PlayerIndex {
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}
