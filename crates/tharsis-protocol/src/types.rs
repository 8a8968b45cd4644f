use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CardName, CardResource, PlayerIndex, Tag};

/// Tile kinds placeable on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Ocean,
    Greenery,
    City,
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileKind::Ocean => "ocean",
            TileKind::Greenery => "greenery",
            TileKind::City => "city",
        };
        f.write_str(name)
    }
}

/// The five claimable milestones. Single-claim each, at most three claimed
/// per game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    Terraformer,
    Mayor,
    Gardener,
    Builder,
    Planner,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::Terraformer,
        Milestone::Mayor,
        Milestone::Gardener,
        Milestone::Builder,
        Milestone::Planner,
    ];
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Milestone::Terraformer => "Terraformer",
            Milestone::Mayor => "Mayor",
            Milestone::Gardener => "Gardener",
            Milestone::Builder => "Builder",
            Milestone::Planner => "Planner",
        };
        f.write_str(name)
    }
}

/// The five fundable awards. Funding order fixes the cost tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Award {
    Landlord,
    Banker,
    Scientist,
    Thermalist,
    Miner,
}

impl Award {
    pub const ALL: [Award; 5] = [
        Award::Landlord,
        Award::Banker,
        Award::Scientist,
        Award::Thermalist,
        Award::Miner,
    ];
}

impl fmt::Display for Award {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Award::Landlord => "Landlord",
            Award::Banker => "Banker",
            Award::Scientist => "Scientist",
            Award::Thermalist => "Thermalist",
            Award::Miner => "Miner",
        };
        f.write_str(name)
    }
}

/// The six political parties of the turmoil expansion, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Party {
    MarsFirst,
    Scientists,
    Unity,
    Greens,
    Reds,
    Kelvinists,
}

impl Party {
    pub const ALL: [Party; 6] = [
        Party::MarsFirst,
        Party::Scientists,
        Party::Unity,
        Party::Greens,
        Party::Reds,
        Party::Kelvinists,
    ];
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Party::MarsFirst => "Mars First",
            Party::Scientists => "Scientists",
            Party::Unity => "Unity",
            Party::Greens => "Greens",
            Party::Reds => "Reds",
            Party::Kelvinists => "Kelvinists",
        };
        f.write_str(name)
    }
}

/// Game lifecycle stages. Legality of every action kind is scoped to a set
/// of phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    CorporationSelection,
    Drafting,
    Research,
    ActionRound,
    FinalGreenery,
    Finished,
}

/// Immutable per-game configuration chosen at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    #[serde(default)]
    pub colonies: bool,
    #[serde(default)]
    pub turmoil: bool,
    #[serde(default)]
    pub draft: bool,
}

/// Cost reductions, global and per tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discounts {
    #[serde(default)]
    pub all: u32,
    #[serde(default)]
    pub by_tag: BTreeMap<Tag, u32>,
}

impl Discounts {
    /// Total reduction applying to a card with the given tags.
    pub fn for_tags(&self, tags: &[Tag]) -> u32 {
        let tagged: u32 = tags
            .iter()
            .filter_map(|tag| self.by_tag.get(tag))
            .copied()
            .sum();
        self.all + tagged
    }
}

/// Target of a resource-choice resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceTarget {
    /// One of the actor's own played cards that collects the resource.
    Card { card: CardName },
    /// Another player, as the victim of a removal effect.
    Player { player: PlayerIndex },
}

/// An unresolved resource decision held in a player's pending slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PendingResource {
    AddToCard { resource: CardResource, amount: u32 },
    RemovePlants { amount: u32 },
}

/// Cards offered for purchase (game start and each research phase).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardOffer {
    pub cards: Vec<CardName>,
    pub unit_cost: u32,
}

/// A forced follow-up not yet promoted to its owner's pending slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub player: PlayerIndex,
    pub task: TaskKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskKind {
    PlaceTile { kind: TileKind },
    AddResource { resource: CardResource, amount: u32 },
    RemovePlants { amount: u32 },
    Discard { count: u32 },
    CopyProduction { source: CardName },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discounts_sum_global_and_tagged() {
        let mut discounts = Discounts {
            all: 1,
            ..Discounts::default()
        };
        discounts.by_tag.insert(Tag::Space, 2);
        assert_eq!(discounts.for_tags(&[Tag::Space, Tag::Event]), 3);
        assert_eq!(discounts.for_tags(&[Tag::Building]), 1);
    }
}
