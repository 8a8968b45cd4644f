//! Game orchestration.
//!
//! The service owns the authoritative write path: per-game mutex so one
//! submission at a time touches a game in this process, compare-and-swap
//! at the store so instances sharing a backend still serialize. Every
//! response is censored for the requesting player before it leaves.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use tharsis_core::{
    censor, from_compact, to_compact, ApplyError, CardCatalog, GameEngine, GameState,
};
use tharsis_protocol::{CompactState, GameOptions, PlayerAction, PlayerIndex};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::store::{GameStore, StoreError, StoredGame};

/// What one player is allowed to see of a game.
#[derive(Clone, Debug)]
pub struct GameView {
    pub name: String,
    /// Usernames in seat order.
    pub players: Vec<String>,
    /// The version a follow-up submission must be applied against.
    pub version: u64,
    pub state: CompactState,
}

/// Authoritative game service: one catalog, one store, one lock per game.
pub struct GameService<S> {
    catalog: CardCatalog,
    config: ServiceConfig,
    store: S,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: GameStore> GameService<S> {
    pub fn new(catalog: CardCatalog, store: S, config: ServiceConfig) -> Self {
        GameService {
            catalog,
            config,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Opens a new table and persists it at version zero.
    pub async fn create_game(
        &self,
        id: &str,
        name: &str,
        usernames: &[String],
        options: Option<GameOptions>,
        seed: Option<u64>,
    ) -> Result<(), ApiError> {
        self.config.check_player_count(usernames.len())?;
        let mut seen = HashSet::new();
        for username in usernames {
            if !seen.insert(username.as_str()) {
                return Err(ApiError::Forbidden(format!(
                    "username {username} appears twice"
                )));
            }
        }

        let options = options.unwrap_or(self.config.default_options);
        let seed = seed.unwrap_or_else(rand::random);
        let state = GameState::new(&self.catalog, usernames, options, seed);
        let record = StoredGame {
            name: name.to_string(),
            players: usernames.to_vec(),
            state: to_compact(&state, &self.catalog),
            queue: Vec::new(),
            version: 0,
        };
        self.store.create(id, &record).await?;

        tracing::info!(
            game_id = %id,
            name = %name,
            players = usernames.len(),
            "Game created"
        );
        Ok(())
    }

    /// Loads a game and censors it for the requesting player.
    pub async fn view(&self, id: &str, username: &str) -> Result<GameView, ApiError> {
        let record = self.store.load(id).await?;
        let seat = membership(&record.players, username)?;
        Ok(GameView {
            name: record.name,
            players: record.players,
            version: record.version,
            state: censor(&record.state, Some(seat)),
        })
    }

    /// Validates, applies and commits one action, returning the censored
    /// successor state.
    ///
    /// Holds the game's mutex for the whole load-apply-save span, so within
    /// this process submissions to one game are strictly serial. The store
    /// CAS catches writers in other processes.
    pub async fn submit(
        &self,
        id: &str,
        username: &str,
        action: &PlayerAction,
    ) -> Result<GameView, ApiError> {
        let lock = self.game_lock(id).await;
        let _held = lock.lock().await;

        let record = self.store.load(id).await?;
        let seat = membership(&record.players, username)?;

        let mut state = from_compact(&record.state, &self.catalog)?;
        state.queue = record.queue.iter().cloned().collect();

        let engine = GameEngine::new(&self.catalog);
        let next = match engine.apply(&state, seat, action) {
            Ok(next) => next,
            Err(ApplyError::Illegal(reason)) => {
                return Err(ApiError::IllegalAction(reason.to_string()));
            }
            Err(ApplyError::Invariant(violation)) => {
                tracing::error!(
                    game_id = %id,
                    player = %username,
                    detail = %violation,
                    "Engine invariant violation"
                );
                return Err(ApiError::Internal(violation.to_string()));
            }
        };

        let successor = StoredGame {
            name: record.name.clone(),
            players: record.players.clone(),
            state: to_compact(&next, &self.catalog),
            queue: next.queue.iter().cloned().collect(),
            version: record.version + 1,
        };
        if let Err(err) = self.store.save(id, &successor, record.version).await {
            if matches!(err, StoreError::VersionConflict { .. }) {
                tracing::warn!(
                    game_id = %id,
                    player = %username,
                    "Concurrent write lost the race"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            game_id = %id,
            player = %username,
            version = successor.version,
            action_count = next.action_count,
            "Action applied"
        );
        Ok(GameView {
            name: successor.name,
            players: successor.players,
            version: successor.version,
            state: censor(&successor.state, Some(seat)),
        })
    }

    async fn game_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn membership(players: &[String], username: &str) -> Result<PlayerIndex, ApiError> {
    players
        .iter()
        .position(|seated| seated == username)
        .map(|seat| PlayerIndex(seat as u8))
        .ok_or_else(|| ApiError::Forbidden(format!("{username} is not seated at this game")))
}
