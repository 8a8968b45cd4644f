use serde::{Deserialize, Serialize};

use crate::{Award, CardName, Hex, Milestone, Party, Payment, ResourceTarget};

/// All player-submitted actions. Fully serializable; one variant per kind.
///
/// Every variant must have a guard predicate and a dispatcher arm. The
/// dispatcher matches exhaustively, so adding a variant without its handler
/// fails to compile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerAction {
    // Setup and research
    ChooseCorporation {
        corporation: CardName,
    },
    /// Buy a subset of an outstanding card offer (initial deal or research).
    SelectCards {
        cards: Vec<CardName>,
        #[serde(default)]
        payment: Option<Payment>,
    },
    /// Pick one card from the pack currently in front of you (draft variant).
    DraftCard {
        card: CardName,
    },

    // Main actions
    PlayCard {
        card: CardName,
        #[serde(default)]
        payment: Option<Payment>,
    },
    /// Use the action printed on an already-played blue card.
    UseCardAction {
        card: CardName,
        #[serde(default)]
        choice: Option<u8>,
    },
    StandardProject {
        project: StandardProjectKind,
        #[serde(default)]
        payment: Option<Payment>,
    },
    ClaimMilestone {
        milestone: Milestone,
        #[serde(default)]
        payment: Option<Payment>,
    },
    FundAward {
        award: Award,
        #[serde(default)]
        payment: Option<Payment>,
    },
    /// 8 plants into a greenery placement.
    ConvertPlants,
    /// 8 heat into a temperature step.
    ConvertHeat,
    BuildColony {
        colony: String,
        #[serde(default)]
        payment: Option<Payment>,
    },
    Trade {
        colony: String,
        #[serde(default)]
        payment: Option<Payment>,
    },
    SendDelegate {
        party: Party,
    },

    // Pending resolutions (valid only for the holder of the matching slot)
    PlaceTile {
        cell: Hex,
    },
    ChooseResource {
        target: ResourceTarget,
    },
    DiscardCards {
        cards: Vec<CardName>,
    },
    /// Choose whose production box to duplicate.
    CopyProduction {
        card: CardName,
    },

    // Turn flow
    /// Yield the rest of this turn (requires at least one action taken).
    Skip,
    /// Drop out for the remainder of the generation (requires none taken).
    Pass,

    // Endgame
    PlaceFinalGreenery {
        cell: Hex,
    },
    SkipFinalGreenery,
}

/// The six standard projects. Sell patents carries its own payload; the
/// rest are fixed-cost conversions and placements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StandardProjectKind {
    SellPatents { cards: Vec<CardName> },
    PowerPlant,
    Asteroid,
    Aquifer,
    Greenery,
    City,
}

impl StandardProjectKind {
    /// Base credit cost before discounts.
    pub fn cost(&self) -> u32 {
        match self {
            StandardProjectKind::SellPatents { .. } => 0,
            StandardProjectKind::PowerPlant => 11,
            StandardProjectKind::Asteroid => 14,
            StandardProjectKind::Aquifer => 18,
            StandardProjectKind::Greenery => 23,
            StandardProjectKind::City => 25,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StandardProjectKind::SellPatents { .. } => "sell patents",
            StandardProjectKind::PowerPlant => "power plant",
            StandardProjectKind::Asteroid => "asteroid",
            StandardProjectKind::Aquifer => "aquifer",
            StandardProjectKind::Greenery => "greenery",
            StandardProjectKind::City => "city",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_json_tag_is_variant_name() {
        let action = PlayerAction::FundAward {
            award: Award::Banker,
            payment: Some(Payment::credits(8)),
        };
        let json = serde_json::to_string(&action).expect("serialize");
        assert!(json.contains("\"type\":\"FundAward\""));
        assert!(json.contains("\"Banker\""));

        let back: PlayerAction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, action);
    }

    #[test]
    fn payment_field_may_be_omitted() {
        let json = r#"{"type":"PlayCard","card":"Sponsors"}"#;
        let action: PlayerAction = serde_json::from_str(json).expect("deserialize");
        match action {
            PlayerAction::PlayCard { card, payment } => {
                assert_eq!(card, "Sponsors");
                assert!(payment.is_none());
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn standard_project_costs_are_fixed() {
        assert_eq!(StandardProjectKind::PowerPlant.cost(), 11);
        assert_eq!(StandardProjectKind::Asteroid.cost(), 14);
        assert_eq!(StandardProjectKind::Aquifer.cost(), 18);
        assert_eq!(StandardProjectKind::Greenery.cost(), 23);
        assert_eq!(StandardProjectKind::City.cost(), 25);
    }
}
