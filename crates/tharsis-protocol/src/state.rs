use serde::{Deserialize, Serialize};

use crate::{
    CardName, CardOffer, Discounts, GameOptions, GamePhase, Hex, LogEntry, Milestone, Party,
    PendingResource, PlayerIndex, ProductionSet, ResourceSet, TileKind,
};

/// Full persisted game state. Cards are referenced by name only; the live
/// engine state re-hydrates them against the catalog. Optional sections use
/// defaults so older documents keep decoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompactState {
    pub generation: u32,
    pub turn: u32,
    pub phase: GamePhase,
    pub current_player: PlayerIndex,
    pub first_player: PlayerIndex,
    /// Permutation of all seats, recomputed each generation.
    pub turn_order: Vec<PlayerIndex>,
    /// Actions the current player has taken this turn (0..=2).
    #[serde(default)]
    pub actions_taken: u32,

    // Global parameters, monotonically increasing, fixed maxima
    pub temperature: i32,
    pub oxygen: u32,
    pub oceans: u32,

    pub tiles: Vec<PlacedTile>,
    pub deck: Vec<CardName>,
    #[serde(default)]
    pub deck_count: u32,
    pub discard: Vec<CardName>,

    pub milestones: Vec<MilestoneClaim>,
    /// Funding order fixes the cost tier (position in this list).
    pub awards: Vec<AwardClaim>,
    #[serde(default)]
    pub colonies: Vec<ColonyState>,
    #[serde(default)]
    pub turmoil: Option<TurmoilState>,

    pub players: Vec<PlayerCompact>,
    pub log: Vec<LogEntry>,
    /// Change-detection counter; bumped once per committed action.
    pub action_count: u32,
    pub options: GameOptions,
    #[serde(default)]
    pub final_scores: Vec<FinalScore>,
    pub rng_state: [u8; 32],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub cell: Hex,
    pub kind: TileKind,
    /// Oceans are unowned.
    #[serde(default)]
    pub owner: Option<PlayerIndex>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneClaim {
    pub milestone: Milestone,
    pub player: PlayerIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardClaim {
    pub award: crate::Award,
    pub player: PlayerIndex,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColonyState {
    pub name: String,
    /// Trade track position; -1 means the colony is not yet active.
    pub step: i8,
    /// Player indices settled here, unique, at most three.
    pub settlers: Vec<PlayerIndex>,
    #[serde(default)]
    pub last_trade: Option<TradeRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub player: PlayerIndex,
    pub generation: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurmoilState {
    pub ruling: Party,
    pub dominant: Party,
    #[serde(default)]
    pub chairman: Option<PlayerIndex>,
    pub delegates: Vec<DelegateCount>,
}

/// Delegate population of one party for one player (None = neutral block).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateCount {
    pub party: Party,
    #[serde(default)]
    pub player: Option<PlayerIndex>,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerCompact {
    pub username: String,
    #[serde(default)]
    pub corporation: Option<CardName>,
    pub resources: ResourceSet,
    pub production: ProductionSet,
    /// Terraform rating.
    pub rating: u32,
    #[serde(default)]
    pub fleets: u32,
    #[serde(default)]
    pub trades_this_generation: u32,
    #[serde(default)]
    pub discounts: Discounts,
    pub played: Vec<PlayedCard>,
    pub hand: Vec<CardName>,
    /// Mirrors `hand.len()`; survives censoring so viewers see counts.
    #[serde(default)]
    pub hand_count: u32,

    // Pending slots; occupancy gates the action guard
    #[serde(default)]
    pub pending_corporations: Option<Vec<CardName>>,
    #[serde(default)]
    pub pending_selection: Option<CardOffer>,
    #[serde(default)]
    pub pending_draft: Option<Vec<CardName>>,
    #[serde(default)]
    pub draft_picks: Vec<CardName>,
    #[serde(default)]
    pub pending_tile: Option<TileKind>,
    #[serde(default)]
    pub pending_resource: Option<PendingResource>,
    #[serde(default)]
    pub pending_discard: Option<u32>,
    #[serde(default)]
    pub pending_copy: Option<CardName>,

    #[serde(default)]
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub card: CardName,
    /// Card-resource stock (microbes, animals, ...).
    #[serde(default)]
    pub stock: u32,
    /// Whether the card's action was used this generation.
    #[serde(default)]
    pub activated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub player: PlayerIndex,
    pub total: i32,
    pub rating: u32,
    pub board: u32,
    pub cards: i32,
    pub milestones: u32,
    pub awards: u32,
}
