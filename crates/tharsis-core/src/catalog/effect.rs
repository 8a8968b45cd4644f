//! Card effect vocabulary shared by project cards, corporations and
//! colonies. Effects are interpreted by the dispatcher; anything that needs
//! a player decision (tile placement, resource targets, discards) is queued
//! as a forced follow-up rather than resolved inline.

use std::collections::BTreeMap;

use serde::Deserialize;
use tharsis_protocol::{CardResource, ResourceKind, Tag};

/// One atomic consequence of playing a card (or of one card-action option).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardEffect {
    /// Gain stock of a standard resource.
    Gain { resource: ResourceKind, amount: u32 },
    /// Lose stock of a standard resource (clamped to what is held).
    Remove { resource: ResourceKind, amount: u32 },
    /// Adjust production. Negative amounts must pass the guard's floor
    /// check before the card is playable.
    Production { resource: ResourceKind, amount: i32 },
    RaiseTemperature { steps: u32 },
    RaiseOxygen { steps: u32 },
    PlaceOcean,
    PlaceGreenery,
    PlaceCity,
    /// Raise terraform rating without touching a global parameter.
    RaiseRating { amount: u32 },
    DrawCards { count: u32 },
    /// Forces a discard, queued for the acting player.
    DiscardCards { count: u32 },
    /// Add card resources. With `any_card` the target card is the player's
    /// choice (queued); otherwise the stock lands on the played card itself.
    AddResource {
        resource: CardResource,
        amount: u32,
        #[serde(default)]
        any_card: bool,
    },
    /// Attack: remove plants from a player of the actor's choice (queued).
    RemoveAnyPlants { amount: u32 },
    /// Permanent cost reduction; no tag means it applies to everything.
    Discount {
        #[serde(default)]
        tag: Option<Tag>,
        amount: u32,
    },
    /// One additional trade fleet.
    TradeFleet,
    /// Duplicate the production box of one of the actor's cards with the
    /// given tag (queued choice).
    CopyProduction { tag: Tag },
}

/// A repeatable blue-card action: one option per "or" clause. Options with
/// a spend debit that cost when used; a missing `resource` spends the
/// card's own collected stock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardAction {
    pub options: Vec<ActionOption>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionOption {
    #[serde(default)]
    pub spend: Option<ActionSpend>,
    pub effects: Vec<CardEffect>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionSpend {
    /// None means the spend comes from this card's collected resources.
    #[serde(default)]
    pub resource: Option<ResourceKind>,
    pub amount: u32,
}

/// Global prerequisites printed on a card. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub min_temperature: Option<i32>,
    #[serde(default)]
    pub max_temperature: Option<i32>,
    #[serde(default)]
    pub min_oxygen: Option<u32>,
    #[serde(default)]
    pub max_oxygen: Option<u32>,
    #[serde(default)]
    pub min_oceans: Option<u32>,
    #[serde(default)]
    pub max_oceans: Option<u32>,
    /// Minimum tag counts over the actor's played cards.
    #[serde(default)]
    pub tags: BTreeMap<Tag, u32>,
}

impl Requirement {
    pub fn is_empty(&self) -> bool {
        self.min_temperature.is_none()
            && self.max_temperature.is_none()
            && self.min_oxygen.is_none()
            && self.max_oxygen.is_none()
            && self.min_oceans.is_none()
            && self.max_oceans.is_none()
            && self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_parse_from_yaml_list() {
        let yaml = r#"
- production: { resource: steel, amount: 1 }
- place_ocean
- add_resource: { resource: microbe, amount: 2, any_card: true }
- discount: { tag: space, amount: 2 }
"#;
        let effects: Vec<CardEffect> = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(effects.len(), 4);
        assert_eq!(
            effects[0],
            CardEffect::Production {
                resource: ResourceKind::Steel,
                amount: 1
            }
        );
        assert_eq!(effects[1], CardEffect::PlaceOcean);
        assert!(matches!(
            effects[2],
            CardEffect::AddResource {
                resource: CardResource::Microbe,
                amount: 2,
                any_card: true
            }
        ));
    }

    #[test]
    fn action_spend_defaults_to_card_stock() {
        let yaml = r#"
options:
  - spend: { amount: 3 }
    effects: [ { raise_rating: { amount: 1 } } ]
  - effects: [ { add_resource: { resource: microbe, amount: 1 } } ]
"#;
        let action: CardAction = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(action.options.len(), 2);
        let spend = action.options[0].spend.as_ref().expect("spend");
        assert!(spend.resource.is_none());
        assert_eq!(spend.amount, 3);
        assert!(action.options[1].spend.is_none());
    }

    #[test]
    fn requirement_bounds_parse() {
        let yaml = "min_temperature: -16\nmax_oceans: 3\ntags: { science: 2 }";
        let req: Requirement = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(req.min_temperature, Some(-16));
        assert_eq!(req.max_oceans, Some(3));
        assert_eq!(req.tags.get(&Tag::Science), Some(&2));
        assert!(!req.is_empty());
    }
}
