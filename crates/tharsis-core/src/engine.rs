//! The dispatcher. `GameEngine::apply` is the single write path: guard the
//! action, clone the state, run the kind-specific transition, promote forced
//! follow-ups, settle ruling-party triggers, log, and advance the turn flow.
//! The caller's snapshot is never mutated; success returns the transitioned
//! clone.

use tharsis_protocol::{
    AwardClaim, CardId, FinalScore, GameEvent, GamePhase, Hex, LogEntry, MilestoneClaim, Payment,
    PendingResource, PlacedTile, PlayerAction, PlayerIndex, QueuedTask, ResourceKind, ResourceSet,
    ResourceTarget, StandardProjectKind, TaskKind, TileKind, TradeRecord,
};

use crate::board::{self, BoardLayout};
use crate::catalog::{CardCatalog, CardEffect, ColonyPayout, TradeYield};
use crate::error::{ApplyError, InvariantViolation};
use crate::guard;
use crate::payment;
use crate::state::{
    award_quantity, CardInPlay, GameState, Offer, Player, ACTIONS_PER_TURN, AWARD_TIERS,
    COLONY_BUILD_COST, DELEGATE_COST, HEAT_PER_TEMPERATURE, MAX_COLONY_STEP, MAX_OCEANS,
    MAX_OXYGEN, MAX_TEMPERATURE, MILESTONE_COST, PLANTS_PER_GREENERY, RESEARCH_OFFER,
    TEMPERATURE_STEP,
};
use crate::turmoil;

const MILESTONE_POINTS: i32 = 5;
const AWARD_FIRST_POINTS: i32 = 5;
const AWARD_SECOND_POINTS: i32 = 2;
const OCEAN_ADJACENCY_CREDITS: u32 = 2;
const PATENT_PRICE: u32 = 1;

/// Stateless dispatcher over one catalog. Holds no game data; every call
/// takes the state explicitly.
pub struct GameEngine<'c> {
    catalog: &'c CardCatalog,
    layout: BoardLayout,
}

impl<'c> GameEngine<'c> {
    pub fn new(catalog: &'c CardCatalog) -> Self {
        Self {
            catalog,
            layout: BoardLayout::standard(),
        }
    }

    pub fn catalog(&self) -> &'c CardCatalog {
        self.catalog
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Guard only: would this action be accepted right now?
    pub fn check(
        &self,
        state: &GameState,
        actor: PlayerIndex,
        action: &PlayerAction,
    ) -> Result<(), ApplyError> {
        guard::check_action(state, self.catalog, &self.layout, actor, action)?;
        Ok(())
    }

    /// Validates and applies one action, returning the successor state.
    pub fn apply(
        &self,
        state: &GameState,
        actor: PlayerIndex,
        action: &PlayerAction,
    ) -> Result<GameState, ApplyError> {
        guard::check_action(state, self.catalog, &self.layout, actor, action)?;
        let mut next = state.clone();
        let baseline = TurmoilBaseline::capture(&next, actor);
        let event = self.transition(&mut next, actor, action)?;
        self.refresh_colonies(&mut next);
        handle_forced_actions(&mut next, self.catalog)?;
        self.settle_turmoil(&mut next, actor, &baseline);
        push_log(&mut next, Some(actor), event);
        next.action_count += 1;
        self.advance_flow(&mut next, action)?;
        Ok(next)
    }

    /// Kind-specific state change. Exhaustive: adding an action variant
    /// without a transition arm fails compilation. Anything that goes wrong
    /// in here after a successful guard is a bookkeeping defect, surfaced as
    /// an `InvariantViolation` and never partially committed.
    fn transition(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        action: &PlayerAction,
    ) -> Result<GameEvent, InvariantViolation> {
        match action {
            PlayerAction::ChooseCorporation { corporation } => {
                self.choose_corporation(state, actor, corporation)
            }
            PlayerAction::SelectCards { cards, payment } => {
                self.select_cards(state, actor, cards, payment.as_ref())
            }
            PlayerAction::DraftCard { card } => self.draft_card(state, actor, card),
            PlayerAction::PlayCard { card, payment } => {
                self.play_card(state, actor, card, payment.as_ref())
            }
            PlayerAction::UseCardAction { card, choice } => {
                self.use_card_action(state, actor, card, *choice)
            }
            PlayerAction::StandardProject { project, payment } => {
                self.standard_project(state, actor, project, payment.as_ref())
            }
            PlayerAction::ClaimMilestone { milestone, payment } => {
                let ctx = self.credits_context(state, actor)?;
                let player = seat_mut(state, actor)?;
                settle(&mut player.resources, MILESTONE_COST, &ctx, payment.as_ref())?;
                state.milestones.push(MilestoneClaim {
                    milestone: *milestone,
                    player: actor,
                });
                Ok(GameEvent::MilestoneClaimed {
                    milestone: *milestone,
                })
            }
            PlayerAction::FundAward { award, payment } => {
                let tier = *AWARD_TIERS
                    .get(state.awards.len())
                    .ok_or(InvariantViolation::QueueCorrupt)?;
                let ctx = self.credits_context(state, actor)?;
                let player = seat_mut(state, actor)?;
                settle(&mut player.resources, tier, &ctx, payment.as_ref())?;
                state.awards.push(AwardClaim {
                    award: *award,
                    player: actor,
                });
                Ok(GameEvent::AwardFunded {
                    award: *award,
                    cost: tier,
                })
            }
            PlayerAction::ConvertPlants => {
                let player = seat_mut(state, actor)?;
                if !player
                    .resources
                    .debit(ResourceKind::Plants, PLANTS_PER_GREENERY)
                {
                    return Err(InvariantViolation::ResourceUnderflow);
                }
                state.queue.push_back(QueuedTask {
                    player: actor,
                    task: TaskKind::PlaceTile {
                        kind: TileKind::Greenery,
                    },
                });
                Ok(GameEvent::PlantsConverted)
            }
            PlayerAction::ConvertHeat => {
                let player = seat_mut(state, actor)?;
                if !player
                    .resources
                    .debit(ResourceKind::Heat, HEAT_PER_TEMPERATURE)
                {
                    return Err(InvariantViolation::ResourceUnderflow);
                }
                raise_temperature(state, actor, 1)?;
                Ok(GameEvent::HeatConverted)
            }
            PlayerAction::BuildColony { colony, payment } => {
                self.build_colony(state, actor, colony, payment.as_ref())
            }
            PlayerAction::Trade { colony, payment } => {
                self.trade(state, actor, colony, payment.as_ref())
            }
            PlayerAction::SendDelegate { party } => {
                let player = seat_mut(state, actor)?;
                if !player.resources.debit(ResourceKind::Credits, DELEGATE_COST) {
                    return Err(InvariantViolation::ResourceUnderflow);
                }
                turmoil::add_delegate(state, *party, Some(actor));
                Ok(GameEvent::DelegateSent { party: *party })
            }
            PlayerAction::PlaceTile { cell } => self.place_tile(state, actor, *cell),
            PlayerAction::ChooseResource { target } => self.choose_resource(state, actor, target),
            PlayerAction::DiscardCards { cards } => self.discard_cards(state, actor, cards),
            PlayerAction::CopyProduction { card } => self.copy_production(state, actor, card),
            PlayerAction::Skip => Ok(GameEvent::TurnSkipped),
            PlayerAction::Pass => {
                seat_mut(state, actor)?.passed = true;
                Ok(GameEvent::Passed)
            }
            PlayerAction::PlaceFinalGreenery { cell } => {
                let player = seat_mut(state, actor)?;
                if !player
                    .resources
                    .debit(ResourceKind::Plants, PLANTS_PER_GREENERY)
                {
                    return Err(InvariantViolation::ResourceUnderflow);
                }
                // After the last generation greeneries score board points
                // but no longer move oxygen or rating.
                self.put_tile(state, actor, TileKind::Greenery, *cell)?;
                Ok(GameEvent::FinalGreeneryPlaced { cell: *cell })
            }
            PlayerAction::SkipFinalGreenery => Ok(GameEvent::FinalGreenerySkipped),
        }
    }

    fn known_card(&self, name: &str) -> Result<CardId, InvariantViolation> {
        self.catalog
            .card_id(name)
            .ok_or_else(|| InvariantViolation::PendingCardMissing(name.to_string()))
    }

    fn credits_context(
        &self,
        state: &GameState,
        actor: PlayerIndex,
    ) -> Result<payment::PaymentContext, InvariantViolation> {
        let player = seat_ref(state, actor)?;
        Ok(payment::credits_context(state, self.catalog, player))
    }

    fn choose_corporation(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self
            .catalog
            .corporation_id(name)
            .ok_or_else(|| InvariantViolation::PendingCardMissing(name.to_string()))?;
        let def = self.catalog.corporation(id);
        let player = seat_mut(state, actor)?;
        player.corporation = Some(id);
        player.pending_corporations = None;
        player.resources.credits += def.credits;
        add_resources(&mut player.resources, &def.resources);
        if !ResourceKind::ALL
            .into_iter()
            .all(|kind| player.production.adjust(kind, def.production.get(kind)))
        {
            return Err(InvariantViolation::ProductionUnderflow);
        }
        player.discounts.all += def.discounts.all;
        for (tag, amount) in &def.discounts.by_tag {
            *player.discounts.by_tag.entry(*tag).or_default() += amount;
        }
        player.fleets += def.extra_fleets;
        Ok(GameEvent::CorporationChosen {
            corporation: def.name.clone(),
        })
    }

    fn select_cards(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        cards: &[String],
        explicit: Option<&Payment>,
    ) -> Result<GameEvent, InvariantViolation> {
        let ids: Vec<CardId> = cards
            .iter()
            .map(|name| self.known_card(name))
            .collect::<Result<_, _>>()?;
        let ctx = self.credits_context(state, actor)?;
        let (cost, leftovers) = {
            let player = seat_mut(state, actor)?;
            let mut offer = player
                .pending_selection
                .take()
                .ok_or(InvariantViolation::QueueCorrupt)?;
            for (name, id) in cards.iter().zip(&ids) {
                let slot = offer
                    .cards
                    .iter()
                    .position(|c| c == id)
                    .ok_or_else(|| InvariantViolation::PendingCardMissing(name.clone()))?;
                offer.cards.swap_remove(slot);
            }
            let cost = ids.len() as u32 * offer.unit_cost;
            settle(&mut player.resources, cost, &ctx, explicit)?;
            player.hand.extend(ids.iter().copied());
            (cost, offer.cards)
        };
        state.discard.extend(leftovers);
        Ok(GameEvent::CardsBought {
            count: cards.len() as u32,
            cost,
        })
    }

    fn draft_card(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self.known_card(name)?;
        let player = seat_mut(state, actor)?;
        let pack = player
            .pending_draft
            .as_mut()
            .ok_or(InvariantViolation::QueueCorrupt)?;
        let slot = pack
            .iter()
            .position(|&c| c == id)
            .ok_or_else(|| InvariantViolation::PendingCardMissing(name.to_string()))?;
        pack.swap_remove(slot);
        player.draft_picks.push(id);
        // The log never names the pick; drafted cards stay hidden.
        Ok(GameEvent::CardDrafted)
    }

    fn play_card(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
        explicit: Option<&Payment>,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self.known_card(name)?;
        let def = self.catalog.card(id);
        let (cost, ctx) = {
            let player = seat_ref(state, actor)?;
            let cost = def.cost.saturating_sub(player.discounts.for_tags(&def.tags));
            (cost, payment::card_context(state, self.catalog, player, def))
        };
        {
            let player = seat_mut(state, actor)?;
            let slot = player
                .hand
                .iter()
                .position(|&c| c == id)
                .ok_or_else(|| InvariantViolation::PendingCardMissing(def.name.clone()))?;
            player.hand.remove(slot);
            settle(&mut player.resources, cost, &ctx, explicit)?;
            // Events stay in the played list for endgame points; tag counts
            // and card actions already exclude them.
            player.played.push(CardInPlay {
                card: id,
                stock: 0,
                activated: false,
            });
        }
        self.apply_effects(state, actor, &def.effects, Some(id))?;
        Ok(GameEvent::CardPlayed {
            card: def.name.clone(),
            cost,
        })
    }

    fn use_card_action(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
        choice: Option<u8>,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self.known_card(name)?;
        let def = self.catalog.card(id);
        let action = def
            .action
            .as_ref()
            .ok_or(InvariantViolation::QueueCorrupt)?;
        let index = choice.map_or(0, usize::from);
        let option = action
            .options
            .get(index)
            .ok_or(InvariantViolation::QueueCorrupt)?;
        {
            let player = seat_mut(state, actor)?;
            if let Some(spend) = &option.spend {
                match spend.resource {
                    Some(kind) => {
                        if !player.resources.debit(kind, spend.amount) {
                            return Err(InvariantViolation::ResourceUnderflow);
                        }
                    }
                    None => {
                        let in_play = player.played_card_mut(id).ok_or_else(|| {
                            InvariantViolation::PendingCardMissing(def.name.clone())
                        })?;
                        if in_play.stock < spend.amount {
                            return Err(InvariantViolation::ResourceUnderflow);
                        }
                        in_play.stock -= spend.amount;
                    }
                }
            }
            let in_play = player
                .played_card_mut(id)
                .ok_or_else(|| InvariantViolation::PendingCardMissing(def.name.clone()))?;
            in_play.activated = true;
        }
        self.apply_effects(state, actor, &option.effects, Some(id))?;
        Ok(GameEvent::CardActionUsed {
            card: def.name.clone(),
        })
    }

    fn standard_project(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        project: &StandardProjectKind,
        explicit: Option<&Payment>,
    ) -> Result<GameEvent, InvariantViolation> {
        if let StandardProjectKind::SellPatents { cards } = project {
            let ids: Vec<CardId> = cards
                .iter()
                .map(|name| self.known_card(name))
                .collect::<Result<_, _>>()?;
            let player = seat_mut(state, actor)?;
            for (name, id) in cards.iter().zip(&ids) {
                let slot = player
                    .hand
                    .iter()
                    .position(|c| c == id)
                    .ok_or_else(|| InvariantViolation::PendingCardMissing(name.clone()))?;
                player.hand.remove(slot);
            }
            player.resources.credits += ids.len() as u32 * PATENT_PRICE;
            state.discard.extend(ids);
            return Ok(GameEvent::PatentsSold {
                count: cards.len() as u32,
            });
        }

        let ctx = self.credits_context(state, actor)?;
        let cost = {
            let player = seat_ref(state, actor)?;
            project.cost().saturating_sub(player.discounts.all)
        };
        {
            let player = seat_mut(state, actor)?;
            settle(&mut player.resources, cost, &ctx, explicit)?;
        }
        match project {
            StandardProjectKind::SellPatents { .. } => {
                return Err(InvariantViolation::QueueCorrupt)
            }
            StandardProjectKind::PowerPlant => {
                let player = seat_mut(state, actor)?;
                if !player.production.adjust(ResourceKind::Energy, 1) {
                    return Err(InvariantViolation::ProductionUnderflow);
                }
            }
            StandardProjectKind::Asteroid => raise_temperature(state, actor, 1)?,
            StandardProjectKind::Aquifer => state.queue.push_back(QueuedTask {
                player: actor,
                task: TaskKind::PlaceTile {
                    kind: TileKind::Ocean,
                },
            }),
            StandardProjectKind::Greenery => state.queue.push_back(QueuedTask {
                player: actor,
                task: TaskKind::PlaceTile {
                    kind: TileKind::Greenery,
                },
            }),
            StandardProjectKind::City => {
                let player = seat_mut(state, actor)?;
                if !player.production.adjust(ResourceKind::Credits, 1) {
                    return Err(InvariantViolation::ProductionUnderflow);
                }
                state.queue.push_back(QueuedTask {
                    player: actor,
                    task: TaskKind::PlaceTile {
                        kind: TileKind::City,
                    },
                });
            }
        }
        Ok(GameEvent::StandardProjectPlayed {
            project: project.label().to_string(),
        })
    }

    fn build_colony(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
        explicit: Option<&Payment>,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self
            .catalog
            .colony_id(name)
            .ok_or_else(|| InvariantViolation::PendingCardMissing(name.to_string()))?;
        let def = self.catalog.colony(id);
        let ctx = self.credits_context(state, actor)?;
        {
            let player = seat_mut(state, actor)?;
            settle(&mut player.resources, COLONY_BUILD_COST, &ctx, explicit)?;
        }
        {
            let colony = state
                .colony_mut(id)
                .ok_or(InvariantViolation::ColonyIdOutOfBounds(id.raw))?;
            colony.settlers.push(actor);
            // The marker never sits below the settler count.
            colony.step = colony.step.max(colony.settlers.len() as i8);
        }
        self.grant_colony_payout(state, actor, &def.build_gain)?;
        Ok(GameEvent::ColonyBuilt {
            colony: def.name.clone(),
        })
    }

    fn trade(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
        explicit: Option<&Payment>,
    ) -> Result<GameEvent, InvariantViolation> {
        let id = self
            .catalog
            .colony_id(name)
            .ok_or_else(|| InvariantViolation::PendingCardMissing(name.to_string()))?;
        let def = self.catalog.colony(id);
        let generation = state.generation;
        let heat_ok = {
            let player = seat_ref(state, actor)?;
            player
                .corporation
                .map(|c| self.catalog.corporation(c).heat_for_credits)
                .unwrap_or(false)
        };
        {
            let player = seat_mut(state, actor)?;
            settle_trade(&mut player.resources, heat_ok, explicit)?;
            player.trades_this_generation += 1;
        }
        let (yield_amount, settlers) = {
            let colony = state
                .colony_mut(id)
                .ok_or(InvariantViolation::ColonyIdOutOfBounds(id.raw))?;
            let step = colony.step.clamp(0, MAX_COLONY_STEP) as usize;
            let amount = def.track[step];
            colony.last_trade = Some(TradeRecord {
                player: actor,
                generation,
            });
            // Trading resets the marker to the settled colonies.
            colony.step = colony.settlers.len() as i8;
            (amount, colony.settlers.clone())
        };
        if yield_amount > 0 {
            match def.trade {
                TradeYield::Resource { resource } => {
                    seat_mut(state, actor)?.resources.add(resource, yield_amount);
                }
                TradeYield::Stock { resource } => {
                    if self.collector_exists(state, actor, resource) {
                        state.queue.push_back(QueuedTask {
                            player: actor,
                            task: TaskKind::AddResource {
                                resource,
                                amount: yield_amount,
                            },
                        });
                    }
                }
            }
        }
        if let Some(bonus) = &def.settler_bonus {
            for settler in settlers {
                self.grant_colony_payout(state, settler, bonus)?;
            }
        }
        Ok(GameEvent::TradeExecuted {
            colony: def.name.clone(),
        })
    }

    fn grant_colony_payout(
        &self,
        state: &mut GameState,
        to: PlayerIndex,
        payout: &ColonyPayout,
    ) -> Result<(), InvariantViolation> {
        match payout {
            ColonyPayout::Resource { resource, amount } => {
                seat_mut(state, to)?.resources.add(*resource, *amount);
            }
            ColonyPayout::Production { resource, amount } => {
                if !seat_mut(state, to)?.production.adjust(*resource, *amount) {
                    return Err(InvariantViolation::ProductionUnderflow);
                }
            }
            ColonyPayout::Stock { resource, amount } => {
                if self.collector_exists(state, to, *resource) {
                    state.queue.push_back(QueuedTask {
                        player: to,
                        task: TaskKind::AddResource {
                            resource: *resource,
                            amount: *amount,
                        },
                    });
                }
            }
        }
        Ok(())
    }

    fn collector_exists(
        &self,
        state: &GameState,
        seat: PlayerIndex,
        resource: tharsis_protocol::CardResource,
    ) -> bool {
        state
            .player(seat)
            .is_some_and(|p| p.collects(self.catalog, resource))
    }

    fn place_tile(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        cell: Hex,
    ) -> Result<GameEvent, InvariantViolation> {
        let kind = seat_mut(state, actor)?
            .pending_tile
            .take()
            .ok_or(InvariantViolation::QueueCorrupt)?;
        match kind {
            TileKind::Ocean => {
                if state.oceans >= MAX_OCEANS {
                    return Err(InvariantViolation::ParameterOverflow);
                }
                state.oceans += 1;
                seat_mut(state, actor)?.rating += 1;
            }
            TileKind::Greenery => {
                // A greenery placed at maximum oxygen still scores the tile,
                // it just cannot move the parameter.
                if state.oxygen < MAX_OXYGEN {
                    state.oxygen += 1;
                    seat_mut(state, actor)?.rating += 1;
                }
            }
            TileKind::City => {}
        }
        self.put_tile(state, actor, kind, cell)?;
        Ok(GameEvent::TilePlaced { kind, cell })
    }

    /// Pushes the tile and grants placement income: printed cell bonuses
    /// plus credits for bordering oceans. Parameter and rating changes are
    /// the caller's business.
    fn put_tile(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        kind: TileKind,
        cell: Hex,
    ) -> Result<(), InvariantViolation> {
        let bonus = self.layout.bonus(cell);
        let ocean_credits = OCEAN_ADJACENCY_CREDITS * board::adjacent_oceans(&state.tiles, cell);
        let owner = match kind {
            TileKind::Ocean => None,
            TileKind::Greenery | TileKind::City => Some(actor),
        };
        state.tiles.push(PlacedTile { cell, kind, owner });
        {
            let player = seat_mut(state, actor)?;
            player.resources.steel += bonus.steel;
            player.resources.titanium += bonus.titanium;
            player.resources.plants += bonus.plants;
            player.resources.credits += ocean_credits;
        }
        for _ in 0..bonus.cards {
            if let Some(card) = state.draw_card() {
                seat_mut(state, actor)?.hand.push(card);
            }
        }
        Ok(())
    }

    fn choose_resource(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        target: &ResourceTarget,
    ) -> Result<GameEvent, InvariantViolation> {
        let pending = seat_mut(state, actor)?
            .pending_resource
            .take()
            .ok_or(InvariantViolation::QueueCorrupt)?;
        match (pending, target) {
            (PendingResource::AddToCard { resource, amount }, ResourceTarget::Card { card }) => {
                let id = self.known_card(card)?;
                let player = seat_mut(state, actor)?;
                let in_play = player
                    .played_card_mut(id)
                    .ok_or_else(|| InvariantViolation::PendingCardMissing(card.clone()))?;
                in_play.stock += amount;
                Ok(GameEvent::ResourceAdded {
                    card: self.catalog.card(id).name.clone(),
                    resource,
                    amount,
                })
            }
            (PendingResource::RemovePlants { amount }, ResourceTarget::Player { player }) => {
                let victim = seat_mut(state, *player)?;
                let taken = victim.resources.plants.min(amount);
                victim.resources.plants -= taken;
                Ok(GameEvent::PlantsRemoved {
                    target: *player,
                    amount: taken,
                })
            }
            _ => Err(InvariantViolation::QueueCorrupt),
        }
    }

    fn discard_cards(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        cards: &[String],
    ) -> Result<GameEvent, InvariantViolation> {
        let ids: Vec<CardId> = cards
            .iter()
            .map(|name| self.known_card(name))
            .collect::<Result<_, _>>()?;
        {
            let player = seat_mut(state, actor)?;
            player.pending_discard = None;
            for (name, id) in cards.iter().zip(&ids) {
                let slot = player
                    .hand
                    .iter()
                    .position(|c| c == id)
                    .ok_or_else(|| InvariantViolation::PendingCardMissing(name.clone()))?;
                player.hand.remove(slot);
            }
        }
        state.discard.extend(ids);
        Ok(GameEvent::CardsDiscarded {
            count: cards.len() as u32,
        })
    }

    fn copy_production(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        name: &str,
    ) -> Result<GameEvent, InvariantViolation> {
        let source = seat_mut(state, actor)?
            .pending_copy
            .take()
            .ok_or(InvariantViolation::QueueCorrupt)?;
        let id = self.known_card(name)?;
        let def = self.catalog.card(id);
        let player = seat_mut(state, actor)?;
        for effect in &def.effects {
            if let CardEffect::Production { resource, amount } = effect {
                if !player.production.adjust(*resource, *amount) {
                    return Err(InvariantViolation::ProductionUnderflow);
                }
            }
        }
        Ok(GameEvent::ProductionCopied {
            source: self.catalog.card(source).name.clone(),
            copied: def.name.clone(),
        })
    }

    fn apply_effects(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        effects: &[CardEffect],
        host: Option<CardId>,
    ) -> Result<(), InvariantViolation> {
        for effect in effects {
            self.apply_effect(state, actor, effect, host)?;
        }
        Ok(())
    }

    /// One atomic effect. Effects that need a player decision (tile cells,
    /// resource targets, discards) are queued as forced follow-ups; effects
    /// whose decision has no possible target fizzle without a trace.
    fn apply_effect(
        &self,
        state: &mut GameState,
        actor: PlayerIndex,
        effect: &CardEffect,
        host: Option<CardId>,
    ) -> Result<(), InvariantViolation> {
        match effect {
            CardEffect::Gain { resource, amount } => {
                seat_mut(state, actor)?.resources.add(*resource, *amount);
            }
            CardEffect::Remove { resource, amount } => {
                let player = seat_mut(state, actor)?;
                let held = player.resources.get(*resource);
                player.resources.debit(*resource, held.min(*amount));
            }
            CardEffect::Production { resource, amount } => {
                if !seat_mut(state, actor)?.production.adjust(*resource, *amount) {
                    return Err(InvariantViolation::ProductionUnderflow);
                }
            }
            CardEffect::RaiseTemperature { steps } => raise_temperature(state, actor, *steps)?,
            CardEffect::RaiseOxygen { steps } => raise_oxygen(state, actor, *steps)?,
            CardEffect::PlaceOcean => state.queue.push_back(QueuedTask {
                player: actor,
                task: TaskKind::PlaceTile {
                    kind: TileKind::Ocean,
                },
            }),
            CardEffect::PlaceGreenery => state.queue.push_back(QueuedTask {
                player: actor,
                task: TaskKind::PlaceTile {
                    kind: TileKind::Greenery,
                },
            }),
            CardEffect::PlaceCity => state.queue.push_back(QueuedTask {
                player: actor,
                task: TaskKind::PlaceTile {
                    kind: TileKind::City,
                },
            }),
            CardEffect::RaiseRating { amount } => {
                seat_mut(state, actor)?.rating += amount;
            }
            CardEffect::DrawCards { count } => {
                for _ in 0..*count {
                    if let Some(card) = state.draw_card() {
                        seat_mut(state, actor)?.hand.push(card);
                    }
                }
            }
            CardEffect::DiscardCards { count } => {
                let hand = seat_ref(state, actor)?.hand.len() as u32;
                let count = (*count).min(hand);
                if count > 0 {
                    state.queue.push_back(QueuedTask {
                        player: actor,
                        task: TaskKind::Discard { count },
                    });
                }
            }
            CardEffect::AddResource {
                resource,
                amount,
                any_card,
            } => {
                if *any_card {
                    if self.collector_exists(state, actor, *resource) {
                        state.queue.push_back(QueuedTask {
                            player: actor,
                            task: TaskKind::AddResource {
                                resource: *resource,
                                amount: *amount,
                            },
                        });
                    }
                } else if let Some(host) = host {
                    let player = seat_mut(state, actor)?;
                    let in_play = player.played_card_mut(host).ok_or_else(|| {
                        InvariantViolation::PendingCardMissing(
                            self.catalog.card(host).name.clone(),
                        )
                    })?;
                    in_play.stock += amount;
                }
            }
            CardEffect::RemoveAnyPlants { amount } => {
                let victim_exists = state.seats().any(|s| {
                    s != actor
                        && state
                            .player(s)
                            .is_some_and(|p| p.resources.plants > 0)
                });
                if victim_exists {
                    state.queue.push_back(QueuedTask {
                        player: actor,
                        task: TaskKind::RemovePlants { amount: *amount },
                    });
                }
            }
            CardEffect::Discount { tag, amount } => {
                let player = seat_mut(state, actor)?;
                match tag {
                    Some(tag) => *player.discounts.by_tag.entry(*tag).or_default() += amount,
                    None => player.discounts.all += amount,
                }
            }
            CardEffect::TradeFleet => {
                seat_mut(state, actor)?.fleets += 1;
            }
            CardEffect::CopyProduction { tag } => {
                let has_target = seat_ref(state, actor)?.played.iter().any(|p| {
                    let def = self.catalog.card(p.card);
                    !def.is_event()
                        && def.has_tag(*tag)
                        && def
                            .effects
                            .iter()
                            .any(|e| matches!(e, CardEffect::Production { .. }))
                });
                if let (true, Some(host)) = (has_target, host) {
                    state.queue.push_back(QueuedTask {
                        player: actor,
                        task: TaskKind::CopyProduction {
                            source: self.catalog.card(host).name.clone(),
                        },
                    });
                }
            }
        }
        Ok(())
    }

    /// Inactive colonies wake up as soon as any seat plays a card that
    /// collects the keying resource.
    fn refresh_colonies(&self, state: &mut GameState) {
        for i in 0..state.colonies.len() {
            if state.colonies[i].step >= 0 {
                continue;
            }
            let def = self.catalog.colony(state.colonies[i].id);
            let Some(resource) = def.requires_collector else {
                continue;
            };
            if state
                .players
                .iter()
                .any(|p| p.collects(self.catalog, resource))
            {
                state.colonies[i].step = 1;
            }
        }
    }

    /// Ruling-party triggers for the action just applied, measured against
    /// the pre-transition baseline. The guard already priced the Reds
    /// surcharge, so the debit here cannot fail.
    fn settle_turmoil(&self, state: &mut GameState, actor: PlayerIndex, before: &TurmoilBaseline) {
        if state.turmoil.is_none() {
            return;
        }
        turmoil::recompute_dominant(state);
        let Some(player) = state.player(actor) else {
            return;
        };
        let rating_gained = player.rating.saturating_sub(before.rating);
        let warming = (state.temperature - before.temperature).max(0) / TEMPERATURE_STEP;
        let greeneries = board::count_kind_owned(&state.tiles, TileKind::Greenery, actor)
            .saturating_sub(before.greeneries) as u32;
        let bonus = turmoil::kelvinist_bonus(state, warming as u32)
            + turmoil::greens_bonus(state, greeneries);
        let tax = turmoil::reds_tax(state, rating_gained);
        if let Some(player) = state.player_mut(actor) {
            player.resources.credits += bonus;
            player.resources.credits = player.resources.credits.saturating_sub(tax);
        }
    }

    /// Turn and phase machinery, run after every committed action.
    fn advance_flow(
        &self,
        state: &mut GameState,
        action: &PlayerAction,
    ) -> Result<(), InvariantViolation> {
        match state.phase {
            GamePhase::CorporationSelection => {
                let ready = state
                    .players
                    .iter()
                    .all(|p| p.corporation.is_some() && p.pending_selection.is_none());
                if ready {
                    self.begin_action_round(state);
                }
            }
            GamePhase::Drafting => {
                if draft_round_complete(state) {
                    rotate_draft_packs(state);
                    let exhausted = state
                        .players
                        .iter()
                        .all(|p| p.pending_draft.as_ref().map_or(true, Vec::is_empty));
                    if exhausted {
                        self.open_research_offers(state);
                    }
                }
            }
            GamePhase::Research => {
                if state.players.iter().all(|p| p.pending_selection.is_none()) {
                    self.begin_action_round(state);
                }
            }
            GamePhase::ActionRound => self.advance_action_round(state, action)?,
            GamePhase::FinalGreenery => {
                if matches!(action, PlayerAction::SkipFinalGreenery) {
                    let seat = state.current_player;
                    if let Some(player) = state.player_mut(seat) {
                        player.passed = true;
                    }
                }
                self.settle_final_greenery(state)?;
            }
            GamePhase::Finished => {}
        }
        Ok(())
    }

    fn advance_action_round(
        &self,
        state: &mut GameState,
        action: &PlayerAction,
    ) -> Result<(), InvariantViolation> {
        match action {
            PlayerAction::PlayCard { .. }
            | PlayerAction::UseCardAction { .. }
            | PlayerAction::StandardProject { .. }
            | PlayerAction::ClaimMilestone { .. }
            | PlayerAction::FundAward { .. }
            | PlayerAction::ConvertPlants
            | PlayerAction::ConvertHeat
            | PlayerAction::BuildColony { .. }
            | PlayerAction::Trade { .. }
            | PlayerAction::SendDelegate { .. } => state.actions_taken += 1,
            PlayerAction::Skip => {
                self.next_turn(state);
                return Ok(());
            }
            PlayerAction::Pass => {
                if state.all_passed() {
                    return self.end_generation(state);
                }
                self.next_turn(state);
                return Ok(());
            }
            // Forced resolutions spend no action; the turn clock waits for
            // them below.
            PlayerAction::PlaceTile { .. }
            | PlayerAction::ChooseResource { .. }
            | PlayerAction::DiscardCards { .. }
            | PlayerAction::CopyProduction { .. } => {}
            PlayerAction::ChooseCorporation { .. }
            | PlayerAction::SelectCards { .. }
            | PlayerAction::DraftCard { .. }
            | PlayerAction::PlaceFinalGreenery { .. }
            | PlayerAction::SkipFinalGreenery => {}
        }
        if state.actions_taken >= ACTIONS_PER_TURN && forced_free(state) {
            self.next_turn(state);
        }
        Ok(())
    }

    fn begin_action_round(&self, state: &mut GameState) {
        state.phase = GamePhase::ActionRound;
        state.current_player = state.first_player;
        state.actions_taken = 0;
        state.turn = 0;
    }

    fn next_turn(&self, state: &mut GameState) {
        if let Some(next) = state.next_unpassed_after(state.current_player) {
            state.current_player = next;
            state.actions_taken = 0;
            state.turn += 1;
        }
    }

    fn end_generation(&self, state: &mut GameState) -> Result<(), InvariantViolation> {
        let terraformed = state.all_parameters_maxed();
        self.production_phase(state);
        push_log(state, None, GameEvent::ProductionCompleted);
        if state.options.turmoil {
            if let Some(chairman) = turmoil::rotate_ruling(state) {
                seat_mut(state, chairman)?.rating += 1;
            }
            if let Some(t) = state.turmoil.as_ref() {
                let entry = GameEvent::RulingPartyChanged {
                    party: t.ruling,
                    chairman: t.chairman,
                };
                push_log(state, None, entry);
            }
        }
        if terraformed {
            self.enter_final_greenery(state)
        } else {
            self.start_generation(state);
            Ok(())
        }
    }

    fn production_phase(&self, state: &mut GameState) {
        for player in &mut state.players {
            let resources = &mut player.resources;
            resources.heat += resources.energy;
            resources.energy = 0;
            // Credits production may be negative, but rating keeps the
            // total above water (floor -5, rating never below 20).
            let credits = resources.credits as i64
                + player.rating as i64
                + player.production.credits as i64;
            resources.credits = credits.max(0) as u32;
            resources.steel += player.production.steel.max(0) as u32;
            resources.titanium += player.production.titanium.max(0) as u32;
            resources.plants += player.production.plants.max(0) as u32;
            resources.energy += player.production.energy.max(0) as u32;
            resources.heat += player.production.heat.max(0) as u32;
            player.trades_this_generation = 0;
            player.passed = false;
            for card in &mut player.played {
                card.activated = false;
            }
        }
        for colony in &mut state.colonies {
            if colony.step >= 0 {
                colony.step = (colony.step + 1).min(MAX_COLONY_STEP);
            }
            colony.last_trade = None;
        }
    }

    fn start_generation(&self, state: &mut GameState) {
        state.generation += 1;
        let seats = state.players.len() as u8;
        state.first_player = PlayerIndex((state.first_player.0 + 1) % seats);
        state.turn_order = (0..seats)
            .map(|i| PlayerIndex((state.first_player.0 + i) % seats))
            .collect();
        push_log(
            state,
            None,
            GameEvent::GenerationStarted {
                generation: state.generation,
            },
        );
        if state.options.draft {
            for i in 0..state.players.len() {
                let pack = state.deal(RESEARCH_OFFER);
                state.players[i].pending_draft = Some(pack);
                state.players[i].draft_picks.clear();
            }
            state.phase = GamePhase::Drafting;
        } else {
            let price = turmoil::card_price(state);
            for i in 0..state.players.len() {
                let cards = state.deal(RESEARCH_OFFER);
                state.players[i].pending_selection = Some(Offer {
                    cards,
                    unit_cost: price,
                });
            }
            state.phase = GamePhase::Research;
        }
    }

    fn open_research_offers(&self, state: &mut GameState) {
        let price = turmoil::card_price(state);
        for player in &mut state.players {
            player.pending_draft = None;
            let cards = std::mem::take(&mut player.draft_picks);
            player.pending_selection = Some(Offer {
                cards,
                unit_cost: price,
            });
        }
        state.phase = GamePhase::Research;
    }

    fn enter_final_greenery(&self, state: &mut GameState) -> Result<(), InvariantViolation> {
        state.phase = GamePhase::FinalGreenery;
        state.current_player = state.first_player;
        state.actions_taken = 0;
        self.settle_final_greenery(state)
    }

    /// Walks the conversion turn forward: seats that cannot afford another
    /// greenery are passed over, and when nobody is left the game is scored.
    fn settle_final_greenery(&self, state: &mut GameState) -> Result<(), InvariantViolation> {
        loop {
            let seat = state.current_player;
            let player = state
                .player(seat)
                .ok_or(InvariantViolation::SeatOutOfRange(seat.0))?;
            if !player.passed && player.resources.plants >= PLANTS_PER_GREENERY {
                return Ok(());
            }
            if let Some(player) = state.player_mut(seat) {
                player.passed = true;
            }
            match state.next_unpassed_after(seat) {
                Some(next) => state.current_player = next,
                None => return self.finish_game(state),
            }
        }
    }

    fn finish_game(&self, state: &mut GameState) -> Result<(), InvariantViolation> {
        let scores = self.score(state);
        let winner = match scores.iter().map(|s| s.total).max() {
            Some(top) => {
                let mut leaders = scores.iter().filter(|s| s.total == top);
                match (leaders.next(), leaders.next()) {
                    (Some(only), None) => Some(only.player),
                    _ => None,
                }
            }
            None => None,
        };
        state.final_scores = scores;
        state.phase = GamePhase::Finished;
        push_log(state, None, GameEvent::GameEnded { winner });
        Ok(())
    }

    fn score(&self, state: &GameState) -> Vec<FinalScore> {
        let award_points = self.award_points(state);
        state
            .seats()
            .map(|seat| {
                let player = &state.players[seat.as_usize()];
                let board = board_points(state, seat);
                let cards = self.card_points(player);
                let milestones = MILESTONE_POINTS
                    * state.milestones.iter().filter(|c| c.player == seat).count() as i32;
                let awards = award_points[seat.as_usize()];
                FinalScore {
                    player: seat,
                    total: player.rating as i32 + board as i32 + cards + milestones + awards,
                    rating: player.rating,
                    board,
                    cards,
                    milestones: milestones as u32,
                    awards: awards as u32,
                }
            })
            .collect()
    }

    fn card_points(&self, player: &Player) -> i32 {
        player
            .played
            .iter()
            .map(|p| {
                let def = self.catalog.card(p.card);
                let per_resource = match def.vp_per_resource {
                    Some(per) if per > 0 => (p.stock / per) as i32,
                    _ => 0,
                };
                def.vp + per_resource
            })
            .sum()
    }

    /// First place takes five points, second takes two. Ties share the
    /// higher position and erase the lower one; two-player games never
    /// score a second place.
    fn award_points(&self, state: &GameState) -> Vec<i32> {
        let mut points = vec![0; state.players.len()];
        for claim in &state.awards {
            let quantities: Vec<u32> = state
                .seats()
                .map(|s| award_quantity(state, self.catalog, s, claim.award))
                .collect();
            let Some(&top) = quantities.iter().max() else {
                continue;
            };
            let leaders: Vec<usize> = quantities
                .iter()
                .enumerate()
                .filter(|(_, q)| **q == top)
                .map(|(i, _)| i)
                .collect();
            for &i in &leaders {
                points[i] += AWARD_FIRST_POINTS;
            }
            if state.players.len() > 2 && leaders.len() == 1 {
                let runner_up = quantities
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !leaders.contains(i))
                    .map(|(_, q)| *q)
                    .max();
                if let Some(second) = runner_up {
                    for (i, q) in quantities.iter().enumerate() {
                        if *q == second && !leaders.contains(&i) {
                            points[i] += AWARD_SECOND_POINTS;
                        }
                    }
                }
            }
        }
        points
    }
}

/// What the turmoil triggers compare against after the transition.
struct TurmoilBaseline {
    rating: u32,
    temperature: i32,
    greeneries: usize,
}

impl TurmoilBaseline {
    fn capture(state: &GameState, actor: PlayerIndex) -> Self {
        Self {
            rating: state.player(actor).map(|p| p.rating).unwrap_or(0),
            temperature: state.temperature,
            greeneries: board::count_kind_owned(&state.tiles, TileKind::Greenery, actor),
        }
    }
}

/// Promotes queued follow-ups into pending slots. A player takes one pending
/// decision at a time, in the order their tasks were queued; independent
/// players' tasks promote independently.
pub(crate) fn handle_forced_actions(
    state: &mut GameState,
    catalog: &CardCatalog,
) -> Result<(), InvariantViolation> {
    loop {
        let slot = state.queue.iter().position(|t| {
            state
                .player(t.player)
                .is_some_and(|p| !p.forced_pending())
        });
        let Some(slot) = slot else {
            return Ok(());
        };
        let task = state
            .queue
            .remove(slot)
            .ok_or(InvariantViolation::QueueCorrupt)?;
        promote(state, catalog, task)?;
    }
}

fn promote(
    state: &mut GameState,
    catalog: &CardCatalog,
    task: QueuedTask,
) -> Result<(), InvariantViolation> {
    let QueuedTask { player: owner, task } = task;
    match task {
        TaskKind::PlaceTile { kind } => {
            seat_mut(state, owner)?.pending_tile = Some(kind);
        }
        TaskKind::AddResource { resource, amount } => {
            seat_mut(state, owner)?.pending_resource =
                Some(PendingResource::AddToCard { resource, amount });
        }
        TaskKind::RemovePlants { amount } => {
            seat_mut(state, owner)?.pending_resource =
                Some(PendingResource::RemovePlants { amount });
        }
        TaskKind::Discard { count } => {
            seat_mut(state, owner)?.pending_discard = Some(count);
        }
        TaskKind::CopyProduction { source } => {
            // Source names are written by the engine itself, so a failed
            // lookup means the queue was corrupted in storage.
            let id = catalog
                .card_id(&source)
                .ok_or(InvariantViolation::PendingCardMissing(source))?;
            seat_mut(state, owner)?.pending_copy = Some(id);
        }
    }
    Ok(())
}

fn forced_free(state: &GameState) -> bool {
    state.queue.is_empty() && state.players.iter().all(|p| !p.forced_pending())
}

fn draft_round_complete(state: &GameState) -> bool {
    let top = state
        .players
        .iter()
        .map(|p| p.draft_picks.len())
        .max()
        .unwrap_or(0);
    !state.players.iter().any(|p| {
        p.pending_draft.as_ref().is_some_and(|d| !d.is_empty()) && p.draft_picks.len() < top
    })
}

/// Packs travel clockwise on even generations and counter-clockwise on odd
/// ones.
fn rotate_draft_packs(state: &mut GameState) {
    let n = state.players.len();
    if n == 0 {
        return;
    }
    let packs: Vec<Option<Vec<CardId>>> = state
        .players
        .iter_mut()
        .map(|p| p.pending_draft.take())
        .collect();
    for (i, pack) in packs.into_iter().enumerate() {
        let dest = if state.generation % 2 == 0 {
            (i + 1) % n
        } else {
            (i + n - 1) % n
        };
        state.players[dest].pending_draft = pack;
    }
}

fn board_points(state: &GameState, seat: PlayerIndex) -> u32 {
    let greeneries = board::count_kind_owned(&state.tiles, TileKind::Greenery, seat) as u32;
    let city_neighbors: u32 = state
        .tiles
        .iter()
        .filter(|t| t.kind == TileKind::City && t.owner == Some(seat))
        .map(|t| board::adjacent_greeneries(&state.tiles, t.cell))
        .sum();
    greeneries + city_neighbors
}

fn seat_ref(state: &GameState, seat: PlayerIndex) -> Result<&Player, InvariantViolation> {
    state
        .player(seat)
        .ok_or(InvariantViolation::SeatOutOfRange(seat.0))
}

fn seat_mut(state: &mut GameState, seat: PlayerIndex) -> Result<&mut Player, InvariantViolation> {
    state
        .player_mut(seat)
        .ok_or(InvariantViolation::SeatOutOfRange(seat.0))
}

/// Re-resolves and debits a payment the guard already accepted; failure at
/// this point is a defect, not user error.
fn settle(
    holdings: &mut ResourceSet,
    cost: u32,
    ctx: &payment::PaymentContext,
    explicit: Option<&Payment>,
) -> Result<Payment, InvariantViolation> {
    let resolved = payment::resolve(cost, holdings, ctx, explicit)
        .map_err(|_| InvariantViolation::ResourceUnderflow)?;
    if !payment::debit_payment(holdings, &resolved) {
        return Err(InvariantViolation::ResourceUnderflow);
    }
    Ok(resolved)
}

fn settle_trade(
    holdings: &mut ResourceSet,
    heat_ok: bool,
    explicit: Option<&Payment>,
) -> Result<Payment, InvariantViolation> {
    let resolved = payment::resolve_trade(holdings, heat_ok, explicit)
        .map_err(|_| InvariantViolation::ResourceUnderflow)?;
    if !payment::debit_payment(holdings, &resolved) {
        return Err(InvariantViolation::ResourceUnderflow);
    }
    Ok(resolved)
}

fn raise_temperature(
    state: &mut GameState,
    actor: PlayerIndex,
    steps: u32,
) -> Result<(), InvariantViolation> {
    for _ in 0..steps {
        if state.temperature + TEMPERATURE_STEP > MAX_TEMPERATURE {
            return Err(InvariantViolation::ParameterOverflow);
        }
        state.temperature += TEMPERATURE_STEP;
        seat_mut(state, actor)?.rating += 1;
    }
    Ok(())
}

fn raise_oxygen(
    state: &mut GameState,
    actor: PlayerIndex,
    steps: u32,
) -> Result<(), InvariantViolation> {
    for _ in 0..steps {
        if state.oxygen + 1 > MAX_OXYGEN {
            return Err(InvariantViolation::ParameterOverflow);
        }
        state.oxygen += 1;
        seat_mut(state, actor)?.rating += 1;
    }
    Ok(())
}

fn add_resources(into: &mut ResourceSet, from: &ResourceSet) {
    into.credits += from.credits;
    into.steel += from.steel;
    into.titanium += from.titanium;
    into.plants += from.plants;
    into.energy += from.energy;
    into.heat += from.heat;
}

fn push_log(state: &mut GameState, player: Option<PlayerIndex>, event: GameEvent) {
    let seq = state.log.len() as u64;
    state.log.push(LogEntry {
        seq,
        generation: state.generation,
        player,
        event,
    });
}
