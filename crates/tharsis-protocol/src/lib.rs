//! Shared wire vocabulary for the Tharsis game engine: identifiers, board
//! coordinates, resource and payment types, the action envelope, the audit
//! log, the compact persisted state form, and encode/decode helpers.

pub mod action;
pub mod hex;
pub mod ids;
pub mod log;
pub mod resources;
pub mod state;
pub mod types;
pub mod wire;

pub use action::{PlayerAction, StandardProjectKind};
pub use hex::Hex;
pub use ids::{CardId, CardName, ColonyId, CorpId, PlayerIndex, RuntimeId};
pub use log::{GameEvent, LogEntry};
pub use resources::{CardResource, Payment, ProductionSet, ResourceKind, ResourceSet, Tag};
pub use state::{
    AwardClaim, ColonyState, CompactState, DelegateCount, FinalScore, MilestoneClaim, PlacedTile,
    PlayedCard, PlayerCompact, TradeRecord, TurmoilState,
};
pub use types::{
    Award, CardOffer, Discounts, GameOptions, GamePhase, Milestone, Party, PendingResource,
    QueuedTask, ResourceTarget, TaskKind, TileKind,
};
pub use wire::WireError;
