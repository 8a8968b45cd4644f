use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use tharsis_protocol::{
    CardId, CardName, CardResource, ColonyId, CorpId, Discounts, ProductionSet, ResourceKind,
    ResourceSet, Tag,
};

use crate::catalog::{CardAction, CardEffect, Requirement};

/// The immutable, process-wide card catalog. Compiled once from YAML;
/// every live state borrows it and refers to entries by runtime id.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    pub cards: Vec<CardDef>,
    pub corporations: Vec<CorporationDef>,
    pub colonies: Vec<ColonyDef>,

    pub card_ids: HashMap<CardName, CardId>,
    pub corporation_ids: HashMap<CardName, CorpId>,
    pub colony_ids: HashMap<CardName, ColonyId>,
}

impl CardCatalog {
    pub fn card(&self, id: CardId) -> &CardDef {
        &self.cards[id.raw as usize]
    }

    pub fn corporation(&self, id: CorpId) -> &CorporationDef {
        &self.corporations[id.raw as usize]
    }

    pub fn colony(&self, id: ColonyId) -> &ColonyDef {
        &self.colonies[id.raw as usize]
    }

    pub fn card_id(&self, name: &str) -> Option<CardId> {
        self.card_ids.get(name).copied()
    }

    pub fn corporation_id(&self, name: &str) -> Option<CorpId> {
        self.corporation_ids.get(name).copied()
    }

    pub fn colony_id(&self, name: &str) -> Option<ColonyId> {
        self.colony_ids.get(name).copied()
    }

    /// Every project card id, in compiled order. The starting deck is this
    /// list shuffled.
    pub fn all_card_ids(&self) -> impl Iterator<Item = CardId> + '_ {
        (0..self.cards.len()).map(|i| CardId::new(i as u16))
    }

    pub fn all_corporation_ids(&self) -> impl Iterator<Item = CorpId> + '_ {
        (0..self.corporations.len()).map(|i| CorpId::new(i as u16))
    }
}

/// A compiled project card.
#[derive(Debug, Clone)]
pub struct CardDef {
    pub name: String,
    pub cost: u32,
    pub tags: Vec<Tag>,
    pub requirement: Requirement,
    pub effects: Vec<CardEffect>,
    pub action: Option<CardAction>,
    /// The card-resource kind this card accumulates, if any.
    pub collects: Option<CardResource>,
    pub vp: i32,
    /// Extra endgame points: one per `n` collected resources.
    pub vp_per_resource: Option<u32>,
}

impl CardDef {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Events resolve once and are turned face down: they keep their
    /// points but never count for tags and cannot host actions.
    pub fn is_event(&self) -> bool {
        self.has_tag(Tag::Event)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCardDef {
    pub cost: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default)]
    pub effects: Vec<CardEffect>,
    #[serde(default)]
    pub action: Option<CardAction>,
    #[serde(default)]
    pub collects: Option<CardResource>,
    #[serde(default)]
    pub vp: i32,
    #[serde(default)]
    pub vp_per_resource: Option<u32>,
}

impl RawCardDef {
    pub fn compile(self, name: String) -> CardDef {
        CardDef {
            name,
            cost: self.cost,
            tags: self.tags,
            requirement: self.requirement,
            effects: self.effects,
            action: self.action,
            collects: self.collects,
            vp: self.vp,
            vp_per_resource: self.vp_per_resource,
        }
    }
}

/// A compiled corporation.
#[derive(Debug, Clone)]
pub struct CorporationDef {
    pub name: String,
    pub credits: u32,
    pub resources: ResourceSet,
    pub production: ProductionSet,
    /// The alternate-currency variant: heat spends 1:1 as credits.
    pub heat_for_credits: bool,
    pub discounts: Discounts,
    pub tags: Vec<Tag>,
    /// Additional trade fleets beyond the base one.
    pub extra_fleets: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCorporationDef {
    pub credits: u32,
    #[serde(default)]
    pub resources: ResourceSet,
    #[serde(default)]
    pub production: ProductionSet,
    #[serde(default)]
    pub heat_for_credits: bool,
    #[serde(default)]
    pub discount_all: u32,
    #[serde(default)]
    pub discount_tags: BTreeMap<Tag, u32>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub extra_fleets: u32,
}

impl RawCorporationDef {
    pub fn compile(self, name: String) -> CorporationDef {
        CorporationDef {
            name,
            credits: self.credits,
            resources: self.resources,
            production: self.production,
            heat_for_credits: self.heat_for_credits,
            discounts: Discounts {
                all: self.discount_all,
                by_tag: self.discount_tags,
            },
            tags: self.tags,
            extra_fleets: self.extra_fleets,
        }
    }
}

/// What a colony pays out, either into player stock or onto a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColonyPayout {
    Resource { resource: ResourceKind, amount: u32 },
    Production { resource: ResourceKind, amount: i32 },
    Stock { resource: CardResource, amount: u32 },
}

/// A compiled colony tile.
#[derive(Debug, Clone)]
pub struct ColonyDef {
    pub name: String,
    /// Resource kind a trade yields; the amount comes from the track.
    pub trade: TradeYield,
    /// Paid to every settler's owner whenever anyone trades here.
    pub settler_bonus: Option<ColonyPayout>,
    /// Granted to the builder when a colony is placed.
    pub build_gain: ColonyPayout,
    /// Trade yield per track step 0..=6.
    pub track: [u32; 7],
    /// Colony starts inactive until some player collects this resource.
    pub requires_collector: Option<CardResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeYield {
    Resource { resource: ResourceKind },
    Stock { resource: CardResource },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawColonyDef {
    pub trade: TradeYield,
    #[serde(default)]
    pub settler_bonus: Option<ColonyPayout>,
    pub build_gain: ColonyPayout,
    pub track: [u32; 7],
    #[serde(default)]
    pub requires_collector: Option<CardResource>,
}

impl RawColonyDef {
    pub fn compile(self, name: String) -> ColonyDef {
        ColonyDef {
            name,
            trade: self.trade,
            settler_bonus: self.settler_bonus,
            build_gain: self.build_gain,
            track: self.track,
            requires_collector: self.requires_collector,
        }
    }
}

/// Compile raw name-keyed maps into id-indexed tables plus name lookups.
/// BTreeMap keys give a stable alphabetical id assignment.
pub fn compile_catalog(
    cards: BTreeMap<String, RawCardDef>,
    corporations: BTreeMap<String, RawCorporationDef>,
    colonies: BTreeMap<String, RawColonyDef>,
) -> CardCatalog {
    let card_ids = cards
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), CardId::new(i as u16)))
        .collect::<HashMap<_, _>>();
    let corporation_ids = corporations
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), CorpId::new(i as u16)))
        .collect::<HashMap<_, _>>();
    let colony_ids = colonies
        .keys()
        .enumerate()
        .map(|(i, k)| (k.clone(), ColonyId::new(i as u16)))
        .collect::<HashMap<_, _>>();

    let cards = cards
        .into_iter()
        .map(|(name, raw)| raw.compile(name))
        .collect::<Vec<_>>();
    let corporations = corporations
        .into_iter()
        .map(|(name, raw)| raw.compile(name))
        .collect::<Vec<_>>();
    let colonies = colonies
        .into_iter()
        .map(|(name, raw)| raw.compile(name))
        .collect::<Vec<_>>();

    CardCatalog {
        cards,
        corporations,
        colonies,
        card_ids,
        corporation_ids,
        colony_ids,
    }
}
