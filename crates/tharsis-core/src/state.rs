use std::collections::VecDeque;

use tharsis_protocol::{
    Award, AwardClaim, CardId, CardResource, ColonyId, CorpId, Discounts, FinalScore, GameOptions,
    GamePhase, LogEntry, Milestone, MilestoneClaim, Party, PendingResource, PlacedTile,
    PlayerIndex, ProductionSet, QueuedTask, ResourceSet, Tag, TileKind, TradeRecord, TurmoilState,
};

use crate::board;
use crate::catalog::CardCatalog;
use crate::rng::GameRng;

pub const MIN_TEMPERATURE: i32 = -30;
pub const MAX_TEMPERATURE: i32 = 8;
/// Temperature moves in 2-degree steps.
pub const TEMPERATURE_STEP: i32 = 2;
pub const MAX_OXYGEN: u32 = 14;
pub const MAX_OCEANS: u32 = 9;

pub const STARTING_RATING: u32 = 20;
pub const ACTIONS_PER_TURN: u32 = 2;
pub const PLANTS_PER_GREENERY: u32 = 8;
pub const HEAT_PER_TEMPERATURE: u32 = 8;
pub const MILESTONE_COST: u32 = 8;
pub const MAX_MILESTONES: usize = 3;
pub const AWARD_TIERS: [u32; 3] = [8, 14, 20];
pub const COLONY_BUILD_COST: u32 = 17;
pub const MAX_SETTLERS: usize = 3;
/// Highest trade-track position; the payout tables have seven steps.
pub const MAX_COLONY_STEP: i8 = 6;
pub const DELEGATE_COST: u32 = 5;
pub const INITIAL_OFFER: usize = 10;
pub const RESEARCH_OFFER: usize = 4;
pub const CARD_PRICE: u32 = 3;

/// Live game state. Card references are runtime ids into the catalog; the
/// compact, name-keyed form lives in the protocol crate and the two convert
/// through the serialize module.
#[derive(Clone, Debug)]
pub struct GameState {
    pub generation: u32,
    pub turn: u32,
    pub phase: GamePhase,
    pub current_player: PlayerIndex,
    pub first_player: PlayerIndex,
    pub turn_order: Vec<PlayerIndex>,
    pub actions_taken: u32,

    pub temperature: i32,
    pub oxygen: u32,
    pub oceans: u32,

    pub tiles: Vec<PlacedTile>,
    pub deck: Vec<CardId>,
    pub discard: Vec<CardId>,

    pub milestones: Vec<MilestoneClaim>,
    pub awards: Vec<AwardClaim>,
    pub colonies: Vec<Colony>,
    pub turmoil: Option<TurmoilState>,

    pub players: Vec<Player>,
    pub log: Vec<LogEntry>,
    pub action_count: u32,
    pub options: GameOptions,
    pub final_scores: Vec<FinalScore>,
    pub rng: GameRng,

    /// Forced follow-ups awaiting promotion to a pending slot, FIFO.
    pub queue: VecDeque<QueuedTask>,
}

#[derive(Clone, Debug)]
pub struct Colony {
    pub id: ColonyId,
    /// Trade track position; -1 until the colony activates.
    pub step: i8,
    pub settlers: Vec<PlayerIndex>,
    pub last_trade: Option<TradeRecord>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub username: String,
    pub corporation: Option<CorpId>,
    pub resources: ResourceSet,
    pub production: ProductionSet,
    pub rating: u32,
    pub fleets: u32,
    pub trades_this_generation: u32,
    pub discounts: Discounts,
    pub played: Vec<CardInPlay>,
    pub hand: Vec<CardId>,

    pub pending_corporations: Option<Vec<CorpId>>,
    pub pending_selection: Option<Offer>,
    pub pending_draft: Option<Vec<CardId>>,
    pub draft_picks: Vec<CardId>,
    pub pending_tile: Option<TileKind>,
    pub pending_resource: Option<PendingResource>,
    pub pending_discard: Option<u32>,
    /// Source card whose production box is being duplicated.
    pub pending_copy: Option<CardId>,

    pub passed: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct CardInPlay {
    pub card: CardId,
    pub stock: u32,
    pub activated: bool,
}

#[derive(Clone, Debug)]
pub struct Offer {
    pub cards: Vec<CardId>,
    pub unit_cost: u32,
}

impl GameState {
    /// Fresh game: shuffled deck, two corporation offers and a ten-card
    /// purchase offer per seat, corporation-selection phase.
    pub fn new(
        catalog: &CardCatalog,
        usernames: &[String],
        options: GameOptions,
        seed: u64,
    ) -> GameState {
        let mut rng = GameRng::seed_from_u64(seed);
        let mut deck: Vec<CardId> = catalog.all_card_ids().collect();
        rng.shuffle(&mut deck);
        let mut corporations: Vec<CorpId> = catalog.all_corporation_ids().collect();
        rng.shuffle(&mut corporations);

        let players = usernames
            .iter()
            .map(|username| {
                let offered_corps: Vec<CorpId> = (0..2).filter_map(|_| corporations.pop()).collect();
                let offer_len = INITIAL_OFFER.min(deck.len());
                let offered_cards: Vec<CardId> =
                    deck.split_off(deck.len() - offer_len);
                Player {
                    username: username.clone(),
                    corporation: None,
                    resources: ResourceSet::default(),
                    production: ProductionSet::default(),
                    rating: STARTING_RATING,
                    fleets: 1,
                    trades_this_generation: 0,
                    discounts: Discounts::default(),
                    played: Vec::new(),
                    hand: Vec::new(),
                    pending_corporations: Some(offered_corps),
                    pending_selection: Some(Offer {
                        cards: offered_cards,
                        unit_cost: CARD_PRICE,
                    }),
                    pending_draft: None,
                    draft_picks: Vec::new(),
                    pending_tile: None,
                    pending_resource: None,
                    pending_discard: None,
                    pending_copy: None,
                    passed: false,
                }
            })
            .collect::<Vec<_>>();

        let colonies = if options.colonies {
            catalog
                .colonies
                .iter()
                .enumerate()
                .map(|(i, def)| Colony {
                    id: ColonyId::new(i as u16),
                    step: if def.requires_collector.is_some() { -1 } else { 1 },
                    settlers: Vec::new(),
                    last_trade: None,
                })
                .collect()
        } else {
            Vec::new()
        };

        let turmoil = options.turmoil.then(|| TurmoilState {
            ruling: Party::Greens,
            dominant: Party::Greens,
            chairman: None,
            delegates: Vec::new(),
        });

        let turn_order: Vec<PlayerIndex> =
            (0..usernames.len() as u8).map(PlayerIndex).collect();

        GameState {
            generation: 1,
            turn: 0,
            phase: GamePhase::CorporationSelection,
            current_player: PlayerIndex(0),
            first_player: PlayerIndex(0),
            turn_order,
            actions_taken: 0,
            temperature: MIN_TEMPERATURE,
            oxygen: 0,
            oceans: 0,
            tiles: Vec::new(),
            deck,
            discard: Vec::new(),
            milestones: Vec::new(),
            awards: Vec::new(),
            colonies,
            turmoil,
            players,
            log: Vec::new(),
            action_count: 0,
            options,
            final_scores: Vec::new(),
            rng,
            queue: VecDeque::new(),
        }
    }

    pub fn seat_count(&self) -> usize {
        self.players.len()
    }

    pub fn seats(&self) -> impl Iterator<Item = PlayerIndex> {
        (0..self.players.len() as u8).map(PlayerIndex)
    }

    pub fn player(&self, seat: PlayerIndex) -> Option<&Player> {
        self.players.get(seat.as_usize())
    }

    pub fn player_mut(&mut self, seat: PlayerIndex) -> Option<&mut Player> {
        self.players.get_mut(seat.as_usize())
    }

    pub fn colony(&self, id: ColonyId) -> Option<&Colony> {
        self.colonies.iter().find(|c| c.id == id)
    }

    pub fn colony_mut(&mut self, id: ColonyId) -> Option<&mut Colony> {
        self.colonies.iter_mut().find(|c| c.id == id)
    }

    /// Draws one card, folding the discard pile back in when the deck runs
    /// dry. None only when both piles are empty.
    pub fn draw_card(&mut self) -> Option<CardId> {
        if self.deck.is_empty() && !self.discard.is_empty() {
            self.deck.append(&mut self.discard);
            let mut deck = std::mem::take(&mut self.deck);
            self.rng.shuffle(&mut deck);
            self.deck = deck;
        }
        self.deck.pop()
    }

    pub fn deal(&mut self, count: usize) -> Vec<CardId> {
        (0..count).filter_map(|_| self.draw_card()).collect()
    }

    pub fn all_parameters_maxed(&self) -> bool {
        self.temperature >= MAX_TEMPERATURE
            && self.oxygen >= MAX_OXYGEN
            && self.oceans >= MAX_OCEANS
    }

    pub fn all_passed(&self) -> bool {
        self.players.iter().all(|p| p.passed)
    }

    /// Next seat in turn order after `seat` that has not passed.
    pub fn next_unpassed_after(&self, seat: PlayerIndex) -> Option<PlayerIndex> {
        let start = self.turn_order.iter().position(|&s| s == seat)?;
        let n = self.turn_order.len();
        (1..=n)
            .map(|offset| self.turn_order[(start + offset) % n])
            .find(|&s| self.player(s).is_some_and(|p| !p.passed))
    }
}

impl Player {
    /// Whether a forced follow-up occupies one of the pending slots. While
    /// any is set, the only legal action for this player is the matching
    /// resolution, and everyone else's main actions wait.
    pub fn forced_pending(&self) -> bool {
        self.pending_tile.is_some()
            || self.pending_resource.is_some()
            || self.pending_discard.is_some()
            || self.pending_copy.is_some()
    }

    pub fn played_card(&self, card: CardId) -> Option<&CardInPlay> {
        self.played.iter().find(|p| p.card == card)
    }

    pub fn played_card_mut(&mut self, card: CardId) -> Option<&mut CardInPlay> {
        self.played.iter_mut().find(|p| p.card == card)
    }

    pub fn has_played(&self, card: CardId) -> bool {
        self.played_card(card).is_some()
    }

    /// Tag count over the corporation and played cards. Events are spent
    /// the moment they resolve, so their tags never count here.
    pub fn tag_count(&self, catalog: &CardCatalog, tag: Tag) -> u32 {
        let corp_tags = self
            .corporation
            .map(|id| {
                catalog
                    .corporation(id)
                    .tags
                    .iter()
                    .filter(|t| **t == tag)
                    .count() as u32
            })
            .unwrap_or(0);
        let card_tags: u32 = self
            .played
            .iter()
            .map(|p| {
                let def = catalog.card(p.card);
                if def.is_event() {
                    0
                } else {
                    def.tags.iter().filter(|t| **t == tag).count() as u32
                }
            })
            .sum();
        corp_tags + card_tags
    }

    /// Whether any played card accumulates the given card resource. Keys
    /// colony activation and add-resource targeting.
    pub fn collects(&self, catalog: &CardCatalog, resource: CardResource) -> bool {
        self.played
            .iter()
            .any(|p| catalog.card(p.card).collects == Some(resource))
    }
}

pub fn milestone_threshold(milestone: Milestone) -> u32 {
    match milestone {
        Milestone::Terraformer => 35,
        Milestone::Mayor => 3,
        Milestone::Gardener => 3,
        Milestone::Builder => 8,
        Milestone::Planner => 16,
    }
}

/// The quantity the milestone threshold is measured against.
pub fn milestone_quantity(
    state: &GameState,
    catalog: &CardCatalog,
    seat: PlayerIndex,
    milestone: Milestone,
) -> u32 {
    let Some(player) = state.player(seat) else {
        return 0;
    };
    match milestone {
        Milestone::Terraformer => player.rating,
        Milestone::Mayor => board::count_kind_owned(&state.tiles, TileKind::City, seat) as u32,
        Milestone::Gardener => {
            board::count_kind_owned(&state.tiles, TileKind::Greenery, seat) as u32
        }
        Milestone::Builder => player.tag_count(catalog, Tag::Building),
        Milestone::Planner => player.hand.len() as u32,
    }
}

/// The quantity an award ranks players by at game end.
pub fn award_quantity(
    state: &GameState,
    catalog: &CardCatalog,
    seat: PlayerIndex,
    award: Award,
) -> u32 {
    let Some(player) = state.player(seat) else {
        return 0;
    };
    match award {
        Award::Landlord => board::count_owned(&state.tiles, seat) as u32,
        Award::Banker => player.production.credits.max(0) as u32,
        Award::Scientist => player.tag_count(catalog, Tag::Science),
        Award::Thermalist => player.resources.heat,
        Award::Miner => player.resources.steel + player.resources.titanium,
    }
}
