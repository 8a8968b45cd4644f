//! Game persistence.
//!
//! A game is stored as one opaque document: the compact snapshot, the
//! forced-task queue, the seat roster, and a version counter. Writes go
//! through compare-and-swap on the version, so two service instances
//! sharing a store cannot silently overwrite each other.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use tharsis_protocol::{CompactState, QueuedTask};

/// One persisted game.
///
/// The roster is duplicated at the top level so membership checks and
/// censored views never need to hydrate the snapshot against the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredGame {
    /// Display name chosen at creation.
    pub name: String,
    /// Usernames in seat order.
    pub players: Vec<String>,
    pub state: CompactState,
    /// Forced follow-ups not yet promoted to a pending slot. Kept outside
    /// the snapshot because it is engine bookkeeping, not player-visible
    /// state.
    #[serde(default)]
    pub queue: Vec<QueuedTask>,
    /// Bumped by one on every committed action.
    pub version: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("game {0} does not exist")]
    Missing(String),

    #[error("game {0} already exists")]
    Exists(String),

    /// The document moved under the writer. The caller must reload before
    /// retrying.
    #[error("stale version: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },

    #[error("storage codec: {0}")]
    Codec(String),
}

/// Storage backend for games.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<StoredGame, StoreError>;

    /// Compare-and-swap write: commits `record` only while the stored
    /// version still equals `base_version`.
    async fn save(&self, id: &str, record: &StoredGame, base_version: u64)
        -> Result<(), StoreError>;

    /// Writes a brand-new document, refusing to clobber an existing id.
    async fn create(&self, id: &str, record: &StoredGame) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: GameStore + ?Sized> GameStore for std::sync::Arc<T> {
    async fn load(&self, id: &str) -> Result<StoredGame, StoreError> {
        (**self).load(id).await
    }

    async fn save(
        &self,
        id: &str,
        record: &StoredGame,
        base_version: u64,
    ) -> Result<(), StoreError> {
        (**self).save(id, record, base_version).await
    }

    async fn create(&self, id: &str, record: &StoredGame) -> Result<(), StoreError> {
        (**self).create(id, record).await
    }
}

/// In-memory backend holding each game as an rmp-encoded document, the
/// same byte shape a document database would hold.
#[derive(Default)]
pub struct MemoryStore {
    games: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

fn encode(record: &StoredGame) -> Result<Vec<u8>, StoreError> {
    rmp_serde::to_vec_named(record).map_err(|err| StoreError::Codec(err.to_string()))
}

fn decode(bytes: &[u8]) -> Result<StoredGame, StoreError> {
    rmp_serde::from_slice(bytes).map_err(|err| StoreError::Codec(err.to_string()))
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<StoredGame, StoreError> {
        let games = self.games.read().await;
        let bytes = games
            .get(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        decode(bytes)
    }

    async fn save(
        &self,
        id: &str,
        record: &StoredGame,
        base_version: u64,
    ) -> Result<(), StoreError> {
        let mut games = self.games.write().await;
        let bytes = games
            .get(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        let current = decode(bytes)?;
        if current.version != base_version {
            return Err(StoreError::VersionConflict {
                expected: base_version,
                found: current.version,
            });
        }
        let encoded = encode(record)?;
        games.insert(id.to_string(), encoded);
        Ok(())
    }

    async fn create(&self, id: &str, record: &StoredGame) -> Result<(), StoreError> {
        let mut games = self.games.write().await;
        if games.contains_key(id) {
            return Err(StoreError::Exists(id.to_string()));
        }
        let encoded = encode(record)?;
        games.insert(id.to_string(), encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tharsis_core::{load_catalog, to_compact, CatalogSource, GameState};
    use tharsis_protocol::GameOptions;

    fn sample() -> StoredGame {
        let catalog = load_catalog(CatalogSource::Embedded).expect("embedded catalog");
        let usernames = vec!["ada".to_string(), "brin".to_string()];
        let state = GameState::new(&catalog, &usernames, GameOptions::default(), 4);
        StoredGame {
            name: "test table".to_string(),
            players: usernames,
            state: to_compact(&state, &catalog),
            queue: Vec::new(),
            version: 0,
        }
    }

    #[test]
    fn create_then_load_round_trips() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let record = sample();
            store.create("g1", &record).await.expect("create");
            let loaded = store.load("g1").await.expect("load");
            assert_eq!(loaded.name, "test table");
            assert_eq!(loaded.players, record.players);
            assert_eq!(loaded.version, 0);
            assert_eq!(loaded.state, record.state);
        });
    }

    #[test]
    fn create_refuses_an_existing_id() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let record = sample();
            store.create("g1", &record).await.expect("create");
            assert!(matches!(
                store.create("g1", &record).await,
                Err(StoreError::Exists(_))
            ));
        });
    }

    #[test]
    fn stale_save_is_a_version_conflict() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let mut record = sample();
            store.create("g1", &record).await.expect("create");

            record.version = 1;
            store.save("g1", &record, 0).await.expect("first save");

            // A writer that still believes version 0 must be told to reload.
            record.version = 1;
            let err = store.save("g1", &record, 0).await.expect_err("stale save");
            assert!(matches!(
                err,
                StoreError::VersionConflict {
                    expected: 0,
                    found: 1
                }
            ));
        });
    }

    #[test]
    fn missing_ids_are_reported() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            assert!(matches!(
                store.load("nope").await,
                Err(StoreError::Missing(_))
            ));
            let record = sample();
            assert!(matches!(
                store.save("nope", &record, 0).await,
                Err(StoreError::Missing(_))
            ));
        });
    }
}
