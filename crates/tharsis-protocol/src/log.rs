use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Award, CardResource, Hex, Milestone, Party, PlayerIndex, TileKind};

/// A permanent, append-only history entry. One entry per applied action
/// plus flow entries for generation boundaries. Entries are never reordered
/// once committed; `seq` is strictly increasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub generation: u32,
    /// None for entries produced by flow machinery rather than a player.
    #[serde(default)]
    pub player: Option<PlayerIndex>,
    pub event: GameEvent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    // Setup and research
    CorporationChosen { corporation: String },
    CardsBought { count: u32, cost: u32 },
    CardDrafted,

    // Main actions
    CardPlayed { card: String, cost: u32 },
    CardActionUsed { card: String },
    StandardProjectPlayed { project: String },
    PatentsSold { count: u32 },
    MilestoneClaimed { milestone: Milestone },
    AwardFunded { award: Award, cost: u32 },
    PlantsConverted,
    HeatConverted,
    ColonyBuilt { colony: String },
    TradeExecuted { colony: String },
    DelegateSent { party: Party },

    // Pending resolutions
    TilePlaced { kind: TileKind, cell: Hex },
    ResourceAdded { card: String, resource: CardResource, amount: u32 },
    PlantsRemoved { target: PlayerIndex, amount: u32 },
    CardsDiscarded { count: u32 },
    ProductionCopied { source: String, copied: String },

    // Turn flow
    TurnSkipped,
    Passed,
    GenerationStarted { generation: u32 },
    ProductionCompleted,
    RulingPartyChanged { party: Party, chairman: Option<PlayerIndex> },

    // Endgame
    FinalGreeneryPlaced { cell: Hex },
    FinalGreenerySkipped,
    GameEnded { winner: Option<PlayerIndex> },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::CorporationChosen { corporation } => {
                write!(f, "chose corporation {corporation}")
            }
            GameEvent::CardsBought { count, cost } => {
                write!(f, "bought {count} card(s) for {cost} credits")
            }
            GameEvent::CardDrafted => write!(f, "drafted a card"),
            GameEvent::CardPlayed { card, cost } => {
                write!(f, "played {card} for {cost} credits")
            }
            GameEvent::CardActionUsed { card } => write!(f, "used the action of {card}"),
            GameEvent::StandardProjectPlayed { project } => {
                write!(f, "played standard project {project}")
            }
            GameEvent::PatentsSold { count } => write!(f, "sold {count} patent(s)"),
            GameEvent::MilestoneClaimed { milestone } => {
                write!(f, "claimed milestone {milestone}")
            }
            GameEvent::AwardFunded { award, cost } => {
                write!(f, "funded award {award} for {cost} credits")
            }
            GameEvent::PlantsConverted => write!(f, "converted plants into a greenery"),
            GameEvent::HeatConverted => write!(f, "converted heat into a temperature step"),
            GameEvent::ColonyBuilt { colony } => write!(f, "built a colony on {colony}"),
            GameEvent::TradeExecuted { colony } => write!(f, "traded with {colony}"),
            GameEvent::DelegateSent { party } => write!(f, "sent a delegate to {party}"),
            GameEvent::TilePlaced { kind, cell } => {
                write!(f, "placed a {kind} tile at ({}, {})", cell.q, cell.r)
            }
            GameEvent::ResourceAdded {
                card,
                resource,
                amount,
            } => write!(f, "added {amount} {resource}(s) to {card}"),
            GameEvent::PlantsRemoved { target, amount } => {
                write!(f, "removed {amount} plants from player {}", target.0)
            }
            GameEvent::CardsDiscarded { count } => write!(f, "discarded {count} card(s)"),
            GameEvent::ProductionCopied { source, copied } => {
                write!(f, "copied the production of {copied} via {source}")
            }
            GameEvent::TurnSkipped => write!(f, "skipped the rest of the turn"),
            GameEvent::Passed => write!(f, "passed for the generation"),
            GameEvent::GenerationStarted { generation } => {
                write!(f, "generation {generation} started")
            }
            GameEvent::ProductionCompleted => write!(f, "production phase completed"),
            GameEvent::RulingPartyChanged { party, chairman } => match chairman {
                Some(player) => write!(
                    f,
                    "{party} became the ruling party, player {} is chairman",
                    player.0
                ),
                None => write!(f, "{party} became the ruling party"),
            },
            GameEvent::FinalGreeneryPlaced { cell } => {
                write!(f, "placed a final greenery at ({}, {})", cell.q, cell.r)
            }
            GameEvent::FinalGreenerySkipped => write!(f, "skipped final greenery placement"),
            GameEvent::GameEnded { winner } => match winner {
                Some(player) => write!(f, "game ended, player {} wins", player.0),
                None => write!(f, "game ended in a tie"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_render_readable_lines() {
        let event = GameEvent::MilestoneClaimed {
            milestone: Milestone::Mayor,
        };
        assert_eq!(event.to_string(), "claimed milestone Mayor");

        let event = GameEvent::AwardFunded {
            award: Award::Banker,
            cost: 8,
        };
        assert_eq!(event.to_string(), "funded award Banker for 8 credits");
    }

    #[test]
    fn entry_roundtrips_through_json() {
        let entry = LogEntry {
            seq: 7,
            generation: 2,
            player: Some(PlayerIndex(1)),
            event: GameEvent::TilePlaced {
                kind: TileKind::Ocean,
                cell: Hex { q: -1, r: 2 },
            },
        };
        let json = serde_json::to_string(&entry).expect("serialize");
        let back: LogEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, entry);
    }
}
