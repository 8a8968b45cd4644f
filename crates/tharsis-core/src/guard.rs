//! The action guard: one pure predicate per action kind, fanned out by
//! `check_action`. Guards never mutate state and may be called repeatedly;
//! the error's display text is the reason shown to the player.

use tharsis_protocol::{
    Award, CardName, GamePhase, Hex, Milestone, Party, Payment, PendingResource, PlayerAction,
    PlayerIndex, ResourceKind, ResourceTarget, StandardProjectKind, Tag, TileKind,
};

use crate::board::BoardLayout;
use crate::catalog::{ActionOption, CardCatalog, CardDef, CardEffect, Requirement};
use crate::error::ActionError;
use crate::payment;
use crate::state::{
    milestone_quantity, milestone_threshold, Colony, GameState, Player, ACTIONS_PER_TURN,
    AWARD_TIERS, COLONY_BUILD_COST, DELEGATE_COST, HEAT_PER_TEMPERATURE, MAX_MILESTONES,
    MAX_OCEANS, MAX_OXYGEN, MAX_SETTLERS, MAX_TEMPERATURE, MILESTONE_COST, PLANTS_PER_GREENERY,
    TEMPERATURE_STEP,
};
use crate::turmoil;

/// Validates one action without touching the state. Exhaustive over every
/// action kind; a new variant will not compile without an arm here.
pub fn check_action(
    state: &GameState,
    catalog: &CardCatalog,
    layout: &BoardLayout,
    actor: PlayerIndex,
    action: &PlayerAction,
) -> Result<(), ActionError> {
    match action {
        PlayerAction::ChooseCorporation { corporation } => {
            can_choose_corporation(state, catalog, actor, corporation)
        }
        PlayerAction::SelectCards { cards, payment } => {
            can_select_cards(state, catalog, actor, cards, payment.as_ref())
        }
        PlayerAction::DraftCard { card } => can_draft_card(state, catalog, actor, card),
        PlayerAction::PlayCard { card, payment } => {
            can_play_card(state, catalog, actor, card, payment.as_ref())
        }
        PlayerAction::UseCardAction { card, choice } => {
            can_use_card_action(state, catalog, actor, card, *choice)
        }
        PlayerAction::StandardProject { project, payment } => {
            can_standard_project(state, catalog, actor, project, payment.as_ref())
        }
        PlayerAction::ClaimMilestone { milestone, payment } => {
            can_claim_milestone(state, catalog, actor, *milestone, payment.as_ref())
        }
        PlayerAction::FundAward { award, payment } => {
            can_fund_award(state, catalog, actor, *award, payment.as_ref())
        }
        PlayerAction::ConvertPlants => can_convert_plants(state, actor),
        PlayerAction::ConvertHeat => can_convert_heat(state, actor),
        PlayerAction::BuildColony { colony, payment } => {
            can_build_colony(state, catalog, actor, colony, payment.as_ref())
        }
        PlayerAction::Trade { colony, payment } => {
            can_trade(state, catalog, actor, colony, payment.as_ref())
        }
        PlayerAction::SendDelegate { party } => can_send_delegate(state, actor, *party),
        PlayerAction::PlaceTile { cell } => can_place_tile(state, layout, actor, *cell),
        PlayerAction::ChooseResource { target } => {
            can_choose_resource(state, catalog, actor, target)
        }
        PlayerAction::DiscardCards { cards } => can_discard_cards(state, catalog, actor, cards),
        PlayerAction::CopyProduction { card } => can_copy_production(state, catalog, actor, card),
        PlayerAction::Skip => can_skip(state, actor),
        PlayerAction::Pass => can_pass(state, actor),
        PlayerAction::PlaceFinalGreenery { cell } => {
            can_place_final_greenery(state, layout, actor, *cell)
        }
        PlayerAction::SkipFinalGreenery => can_skip_final_greenery(state, actor),
    }
}

fn seat(state: &GameState, actor: PlayerIndex) -> Result<&Player, ActionError> {
    state.player(actor).ok_or(ActionError::NotYourTurn)
}

/// The seat currently owing a forced resolution, if any. Queued tasks count
/// as owed even before promotion to a pending slot.
fn forced_holder(state: &GameState) -> Option<PlayerIndex> {
    state.seats().find(|&s| {
        state.player(s).is_some_and(Player::forced_pending)
            || state.queue.iter().any(|t| t.player == s)
    })
}

/// Shared gate for the main (action-consuming) kinds: action round, no
/// outstanding resolution anywhere, actor's turn, actions left.
fn require_main_action<'a>(
    state: &'a GameState,
    actor: PlayerIndex,
) -> Result<&'a Player, ActionError> {
    if state.phase != GamePhase::ActionRound {
        return Err(ActionError::WrongPhase);
    }
    let player = seat(state, actor)?;
    if let Some(holder) = forced_holder(state) {
        return Err(if holder == actor {
            ActionError::PendingDecision
        } else {
            ActionError::OpponentPending
        });
    }
    if state.current_player != actor {
        return Err(ActionError::NotYourTurn);
    }
    if player.passed {
        return Err(ActionError::AlreadyPassed);
    }
    if state.actions_taken >= ACTIONS_PER_TURN {
        return Err(ActionError::ActionsExhausted);
    }
    Ok(player)
}

fn tag_name(tag: Tag) -> &'static str {
    match tag {
        Tag::Building => "building",
        Tag::Space => "space",
        Tag::Science => "science",
        Tag::Plant => "plant",
        Tag::Microbe => "microbe",
        Tag::Animal => "animal",
        Tag::Power => "power",
        Tag::Earth => "earth",
        Tag::Jovian => "jovian",
        Tag::City => "city",
        Tag::Event => "event",
    }
}

fn check_requirement(
    state: &GameState,
    catalog: &CardCatalog,
    player: &Player,
    requirement: &Requirement,
) -> Result<(), ActionError> {
    if let Some(min) = requirement.min_temperature {
        if state.temperature < min {
            return Err(ActionError::RequirementNotMet(format!(
                "temperature must be at least {min}"
            )));
        }
    }
    if let Some(max) = requirement.max_temperature {
        if state.temperature > max {
            return Err(ActionError::RequirementNotMet(format!(
                "temperature must be at most {max}"
            )));
        }
    }
    if let Some(min) = requirement.min_oxygen {
        if state.oxygen < min {
            return Err(ActionError::RequirementNotMet(format!(
                "oxygen must be at least {min}"
            )));
        }
    }
    if let Some(max) = requirement.max_oxygen {
        if state.oxygen > max {
            return Err(ActionError::RequirementNotMet(format!(
                "oxygen must be at most {max}"
            )));
        }
    }
    if let Some(min) = requirement.min_oceans {
        if state.oceans < min {
            return Err(ActionError::RequirementNotMet(format!(
                "at least {min} ocean(s) must be placed"
            )));
        }
    }
    if let Some(max) = requirement.max_oceans {
        if state.oceans > max {
            return Err(ActionError::RequirementNotMet(format!(
                "at most {max} ocean(s) may be placed"
            )));
        }
    }
    for (tag, need) in &requirement.tags {
        if player.tag_count(catalog, *tag) < *need {
            return Err(ActionError::RequirementNotMet(format!(
                "requires {need} {} tag(s)",
                tag_name(*tag)
            )));
        }
    }
    Ok(())
}

/// Ceiling rule: raises past a fixed maximum are rejected, never clamped.
/// A multi-step raise must fit whole; steps beyond the ceiling are refused,
/// not truncated.
fn check_parameter_room(state: &GameState, effects: &[CardEffect]) -> Result<(), ActionError> {
    let mut temperature_steps = 0i32;
    let mut oxygen_steps = 0u32;
    let mut oceans = 0u32;
    for effect in effects {
        match effect {
            CardEffect::RaiseTemperature { steps } => temperature_steps += *steps as i32,
            CardEffect::RaiseOxygen { steps } => oxygen_steps += steps,
            CardEffect::PlaceOcean => oceans += 1,
            _ => {}
        }
    }
    if temperature_steps > 0
        && state.temperature + TEMPERATURE_STEP * temperature_steps > MAX_TEMPERATURE
    {
        return Err(ActionError::TemperatureAtMaximum);
    }
    if oxygen_steps > 0 && state.oxygen + oxygen_steps > MAX_OXYGEN {
        return Err(ActionError::OxygenAtMaximum);
    }
    if oceans > 0 && state.oceans + oceans > MAX_OCEANS {
        return Err(ActionError::OceansAtMaximum);
    }
    Ok(())
}

fn check_production_room(player: &Player, effects: &[CardEffect]) -> Result<(), ActionError> {
    let mut scratch = player.production.clone();
    for effect in effects {
        if let CardEffect::Production { resource, amount } = effect {
            if !scratch.adjust(*resource, *amount) {
                return Err(ActionError::NotEnoughProduction);
            }
        }
    }
    Ok(())
}

/// Rating steps the effects will grant the actor, counting queued tile
/// placements at their eventual value (an ocean always rates, a greenery
/// only while oxygen has room). The Reds surcharge prices these up front so
/// the later forced placement can never strand an unpayable debt.
fn rated_steps(state: &GameState, effects: &[CardEffect]) -> u32 {
    let mut steps = 0;
    for effect in effects {
        match effect {
            CardEffect::RaiseTemperature { steps: s } | CardEffect::RaiseOxygen { steps: s } => {
                steps += s
            }
            CardEffect::RaiseRating { amount } => steps += amount,
            CardEffect::PlaceOcean => steps += 1,
            CardEffect::PlaceGreenery => {
                if state.oxygen < MAX_OXYGEN {
                    steps += 1;
                }
            }
            _ => {}
        }
    }
    steps
}

/// The surcharge is payable in plain credits only; the check runs after the
/// base payment is resolved so metals cannot cover it.
fn check_rating_surcharge(
    state: &GameState,
    player: &Player,
    resolved: &Payment,
    base_cost: u32,
    steps: u32,
) -> Result<(), ActionError> {
    let tax = turmoil::reds_tax(state, steps);
    if tax > 0 && player.resources.credits - resolved.credits < tax {
        return Err(ActionError::CannotAfford {
            cost: base_cost + tax,
        });
    }
    Ok(())
}

fn can_choose_corporation(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    corporation: &CardName,
) -> Result<(), ActionError> {
    if state.phase != GamePhase::CorporationSelection {
        return Err(ActionError::WrongPhase);
    }
    let player = seat(state, actor)?;
    let offered = player
        .pending_corporations
        .as_ref()
        .ok_or(ActionError::CorporationAlreadyChosen)?;
    let id = catalog
        .corporation_id(corporation)
        .ok_or_else(|| ActionError::UnknownCorporation(corporation.clone()))?;
    if !offered.contains(&id) {
        return Err(ActionError::NotInOffer);
    }
    Ok(())
}

fn can_select_cards(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    cards: &[CardName],
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    if state.phase != GamePhase::CorporationSelection && state.phase != GamePhase::Research {
        return Err(ActionError::WrongPhase);
    }
    let player = seat(state, actor)?;
    // Starting credits pay for the initial buy, so the corporation comes
    // first.
    if state.phase == GamePhase::CorporationSelection && player.corporation.is_none() {
        return Err(ActionError::PendingDecision);
    }
    let offer = player
        .pending_selection
        .as_ref()
        .ok_or(ActionError::NoPendingDecision)?;
    let mut remaining = offer.cards.clone();
    for name in cards {
        let id = catalog
            .card_id(name)
            .ok_or_else(|| ActionError::UnknownCard(name.clone()))?;
        let slot = remaining
            .iter()
            .position(|&c| c == id)
            .ok_or(ActionError::NotInOffer)?;
        remaining.swap_remove(slot);
    }
    let cost = cards.len() as u32 * offer.unit_cost;
    let ctx = payment::credits_context(state, catalog, player);
    payment::resolve(cost, &player.resources, &ctx, explicit)?;
    Ok(())
}

fn can_draft_card(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    card: &CardName,
) -> Result<(), ActionError> {
    if state.phase != GamePhase::Drafting {
        return Err(ActionError::WrongPhase);
    }
    let player = seat(state, actor)?;
    let pack = player
        .pending_draft
        .as_ref()
        .filter(|p| !p.is_empty())
        .ok_or(ActionError::NoPendingDecision)?;
    // One pick per round; wait for the table once yours is made.
    let floor = state
        .players
        .iter()
        .filter(|p| p.pending_draft.as_ref().is_some_and(|d| !d.is_empty()))
        .map(|p| p.draft_picks.len())
        .min()
        .unwrap_or(0);
    if player.draft_picks.len() > floor {
        return Err(ActionError::NoPendingDecision);
    }
    let id = catalog
        .card_id(card)
        .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
    if !pack.contains(&id) {
        return Err(ActionError::NotInOffer);
    }
    Ok(())
}

fn can_play_card(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    card: &CardName,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    let id = catalog
        .card_id(card)
        .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
    if !player.hand.contains(&id) {
        return Err(ActionError::CardNotInHand(card.clone()));
    }
    let def = catalog.card(id);
    check_requirement(state, catalog, player, &def.requirement)?;
    check_parameter_room(state, &def.effects)?;
    check_production_room(player, &def.effects)?;

    let cost = def.cost.saturating_sub(player.discounts.for_tags(&def.tags));
    let ctx = payment::card_context(state, catalog, player, def);
    let resolved = payment::resolve(cost, &player.resources, &ctx, explicit)?;
    check_rating_surcharge(state, player, &resolved, cost, rated_steps(state, &def.effects))
}

fn card_action_option<'a>(
    def: &'a CardDef,
    choice: Option<u8>,
) -> Result<&'a ActionOption, ActionError> {
    let action = def.action.as_ref().ok_or(ActionError::NoCardAction)?;
    let index = match choice {
        Some(i) => i as usize,
        None if action.options.len() == 1 => 0,
        // Several options and no pick is as ambiguous as an unsplit payment.
        None => return Err(ActionError::InvalidChoice),
    };
    action.options.get(index).ok_or(ActionError::InvalidChoice)
}

fn can_use_card_action(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    card: &CardName,
    choice: Option<u8>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    let id = catalog
        .card_id(card)
        .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
    let def = catalog.card(id);
    let in_play = player
        .played_card(id)
        .filter(|_| !def.is_event())
        .ok_or_else(|| ActionError::CardNotPlayed(card.clone()))?;
    if in_play.activated {
        return Err(ActionError::CardAlreadyActivated);
    }
    let option = card_action_option(def, choice)?;
    check_parameter_room(state, &option.effects)?;
    check_production_room(player, &option.effects)?;

    let mut credits_needed = turmoil::reds_tax(state, rated_steps(state, &option.effects));
    if let Some(spend) = &option.spend {
        match spend.resource {
            Some(kind) => {
                if !player.resources.has(kind, spend.amount) {
                    return Err(ActionError::NotEnoughResources);
                }
                if kind == ResourceKind::Credits {
                    credits_needed += spend.amount;
                }
            }
            None => {
                if in_play.stock < spend.amount {
                    return Err(ActionError::NotEnoughResources);
                }
            }
        }
    }
    if player.resources.credits < credits_needed {
        return Err(ActionError::CannotAfford {
            cost: credits_needed,
        });
    }
    Ok(())
}

fn can_standard_project(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    project: &StandardProjectKind,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    let mut rated = 0;
    match project {
        StandardProjectKind::SellPatents { cards } => {
            if cards.is_empty() {
                return Err(ActionError::InvalidChoice);
            }
            let mut remaining = player.hand.clone();
            for name in cards {
                let id = catalog
                    .card_id(name)
                    .ok_or_else(|| ActionError::UnknownCard(name.clone()))?;
                let slot = remaining
                    .iter()
                    .position(|&c| c == id)
                    .ok_or_else(|| ActionError::CardNotInHand(name.clone()))?;
                remaining.swap_remove(slot);
            }
        }
        StandardProjectKind::PowerPlant => {}
        StandardProjectKind::Asteroid => {
            if state.temperature + TEMPERATURE_STEP > MAX_TEMPERATURE {
                return Err(ActionError::TemperatureAtMaximum);
            }
            rated = 1;
        }
        StandardProjectKind::Aquifer => {
            if state.oceans >= MAX_OCEANS {
                return Err(ActionError::OceansAtMaximum);
            }
            rated = 1;
        }
        StandardProjectKind::Greenery => {
            if state.oxygen < MAX_OXYGEN {
                rated = 1;
            }
        }
        StandardProjectKind::City => {}
    }
    let cost = project.cost().saturating_sub(player.discounts.all);
    let ctx = payment::credits_context(state, catalog, player);
    let resolved = payment::resolve(cost, &player.resources, &ctx, explicit)?;
    check_rating_surcharge(state, player, &resolved, cost, rated)
}

fn can_claim_milestone(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    milestone: Milestone,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if state.milestones.iter().any(|c| c.milestone == milestone) {
        return Err(ActionError::MilestoneAlreadyClaimed);
    }
    if state.milestones.len() >= MAX_MILESTONES {
        return Err(ActionError::MilestonesExhausted);
    }
    if milestone_quantity(state, catalog, actor, milestone) < milestone_threshold(milestone) {
        return Err(ActionError::MilestoneNotReached);
    }
    let ctx = payment::credits_context(state, catalog, player);
    payment::resolve(MILESTONE_COST, &player.resources, &ctx, explicit)?;
    Ok(())
}

fn can_fund_award(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    award: Award,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if state.awards.iter().any(|c| c.award == award) {
        return Err(ActionError::AwardAlreadyFunded);
    }
    let tier = match AWARD_TIERS.get(state.awards.len()) {
        Some(&tier) => tier,
        None => return Err(ActionError::AwardsExhausted),
    };
    let ctx = payment::credits_context(state, catalog, player);
    payment::resolve(tier, &player.resources, &ctx, explicit)?;
    Ok(())
}

fn can_convert_plants(state: &GameState, actor: PlayerIndex) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if player.resources.plants < PLANTS_PER_GREENERY {
        return Err(ActionError::NotEnoughResources);
    }
    let steps = if state.oxygen < MAX_OXYGEN { 1 } else { 0 };
    let tax = turmoil::reds_tax(state, steps);
    if player.resources.credits < tax {
        return Err(ActionError::CannotAfford { cost: tax });
    }
    Ok(())
}

fn can_convert_heat(state: &GameState, actor: PlayerIndex) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    // At maximum temperature the conversion would do nothing at all, so it
    // is refused outright.
    if state.temperature + TEMPERATURE_STEP > MAX_TEMPERATURE {
        return Err(ActionError::TemperatureAtMaximum);
    }
    if player.resources.heat < HEAT_PER_TEMPERATURE {
        return Err(ActionError::NotEnoughResources);
    }
    let tax = turmoil::reds_tax(state, 1);
    if player.resources.credits < tax {
        return Err(ActionError::CannotAfford { cost: tax });
    }
    Ok(())
}

fn colony_by_name<'a>(
    state: &'a GameState,
    catalog: &CardCatalog,
    name: &str,
) -> Result<&'a Colony, ActionError> {
    let id = catalog
        .colony_id(name)
        .ok_or_else(|| ActionError::UnknownColony(name.to_string()))?;
    state
        .colony(id)
        .ok_or_else(|| ActionError::UnknownColony(name.to_string()))
}

fn can_build_colony(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    colony: &str,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if !state.options.colonies {
        return Err(ActionError::ColoniesDisabled);
    }
    let colony = colony_by_name(state, catalog, colony)?;
    if colony.step < 0 {
        return Err(ActionError::ColonyInactive);
    }
    if colony.settlers.len() >= MAX_SETTLERS {
        return Err(ActionError::ColonyFull);
    }
    if colony.settlers.contains(&actor) {
        return Err(ActionError::AlreadySettled);
    }
    let ctx = payment::credits_context(state, catalog, player);
    payment::resolve(COLONY_BUILD_COST, &player.resources, &ctx, explicit)?;
    Ok(())
}

fn can_trade(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    colony: &str,
    explicit: Option<&Payment>,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if !state.options.colonies {
        return Err(ActionError::ColoniesDisabled);
    }
    let colony = colony_by_name(state, catalog, colony)?;
    if colony.step < 0 {
        return Err(ActionError::ColonyInactive);
    }
    if colony
        .last_trade
        .is_some_and(|t| t.generation == state.generation)
    {
        return Err(ActionError::ColonyAlreadyTraded);
    }
    if player.trades_this_generation >= player.fleets {
        return Err(ActionError::NoFleetAvailable);
    }
    let heat_ok = player
        .corporation
        .map(|id| catalog.corporation(id).heat_for_credits)
        .unwrap_or(false);
    payment::resolve_trade(&player.resources, heat_ok, explicit)?;
    Ok(())
}

fn can_send_delegate(
    state: &GameState,
    actor: PlayerIndex,
    _party: Party,
) -> Result<(), ActionError> {
    let player = require_main_action(state, actor)?;
    if !state.options.turmoil {
        return Err(ActionError::TurmoilDisabled);
    }
    // The lobbying fee is plain credits; the action carries no allocation,
    // so no substitute kind is accepted.
    if player.resources.credits < DELEGATE_COST {
        return Err(ActionError::CannotAfford {
            cost: DELEGATE_COST,
        });
    }
    Ok(())
}

fn can_place_tile(
    state: &GameState,
    layout: &BoardLayout,
    actor: PlayerIndex,
    cell: Hex,
) -> Result<(), ActionError> {
    let player = seat(state, actor)?;
    let kind = player.pending_tile.ok_or(ActionError::NoPendingDecision)?;
    if kind == TileKind::Ocean && state.oceans >= MAX_OCEANS {
        return Err(ActionError::OceansAtMaximum);
    }
    layout.check_placement(&state.tiles, kind, cell, actor)?;
    let steps = match kind {
        TileKind::Ocean => 1,
        TileKind::Greenery if state.oxygen < MAX_OXYGEN => 1,
        _ => 0,
    };
    let tax = turmoil::reds_tax(state, steps);
    if player.resources.credits < tax {
        return Err(ActionError::CannotAfford { cost: tax });
    }
    Ok(())
}

fn can_choose_resource(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    target: &ResourceTarget,
) -> Result<(), ActionError> {
    let player = seat(state, actor)?;
    let pending = player
        .pending_resource
        .as_ref()
        .ok_or(ActionError::NoPendingDecision)?;
    match (pending, target) {
        (PendingResource::AddToCard { resource, .. }, ResourceTarget::Card { card }) => {
            let id = catalog
                .card_id(card)
                .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
            if !player.has_played(id) {
                return Err(ActionError::CardNotPlayed(card.clone()));
            }
            if catalog.card(id).collects != Some(*resource) {
                return Err(ActionError::InvalidTarget);
            }
            Ok(())
        }
        (PendingResource::RemovePlants { .. }, ResourceTarget::Player { player: victim }) => {
            if *victim == actor {
                return Err(ActionError::InvalidTarget);
            }
            let target = state.player(*victim).ok_or(ActionError::InvalidTarget)?;
            if target.resources.plants == 0 {
                return Err(ActionError::InvalidTarget);
            }
            Ok(())
        }
        _ => Err(ActionError::InvalidTarget),
    }
}

fn can_discard_cards(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    cards: &[CardName],
) -> Result<(), ActionError> {
    let player = seat(state, actor)?;
    let count = player.pending_discard.ok_or(ActionError::NoPendingDecision)?;
    if cards.len() as u32 != count {
        return Err(ActionError::WrongDiscardCount);
    }
    let mut remaining = player.hand.clone();
    for name in cards {
        let id = catalog
            .card_id(name)
            .ok_or_else(|| ActionError::UnknownCard(name.clone()))?;
        let slot = remaining
            .iter()
            .position(|&c| c == id)
            .ok_or_else(|| ActionError::CardNotInHand(name.clone()))?;
        remaining.swap_remove(slot);
    }
    Ok(())
}

fn can_copy_production(
    state: &GameState,
    catalog: &CardCatalog,
    actor: PlayerIndex,
    card: &CardName,
) -> Result<(), ActionError> {
    let player = seat(state, actor)?;
    let source = player.pending_copy.ok_or(ActionError::NoPendingDecision)?;
    let id = catalog
        .card_id(card)
        .ok_or_else(|| ActionError::UnknownCard(card.clone()))?;
    let def = catalog.card(id);
    if !player.has_played(id) || def.is_event() {
        return Err(ActionError::CardNotPlayed(card.clone()));
    }
    let required_tag = catalog.card(source).effects.iter().find_map(|e| match e {
        CardEffect::CopyProduction { tag } => Some(*tag),
        _ => None,
    });
    if let Some(tag) = required_tag {
        if !def.has_tag(tag) {
            return Err(ActionError::InvalidTarget);
        }
    }
    let boxes: Vec<CardEffect> = def
        .effects
        .iter()
        .filter(|e| matches!(e, CardEffect::Production { .. }))
        .cloned()
        .collect();
    if boxes.is_empty() {
        return Err(ActionError::InvalidTarget);
    }
    check_production_room(player, &boxes)
}

fn can_skip(state: &GameState, actor: PlayerIndex) -> Result<(), ActionError> {
    let _ = require_turn_flow(state, actor)?;
    if state.actions_taken == 0 {
        return Err(ActionError::SkipWithoutAction);
    }
    Ok(())
}

fn can_pass(state: &GameState, actor: PlayerIndex) -> Result<(), ActionError> {
    let _ = require_turn_flow(state, actor)?;
    if state.actions_taken > 0 {
        return Err(ActionError::PassAfterAction);
    }
    Ok(())
}

/// Gate shared by Skip and Pass: same as the main gate minus the
/// actions-remaining requirement.
fn require_turn_flow<'a>(
    state: &'a GameState,
    actor: PlayerIndex,
) -> Result<&'a Player, ActionError> {
    if state.phase != GamePhase::ActionRound {
        return Err(ActionError::WrongPhase);
    }
    let player = seat(state, actor)?;
    if let Some(holder) = forced_holder(state) {
        return Err(if holder == actor {
            ActionError::PendingDecision
        } else {
            ActionError::OpponentPending
        });
    }
    if state.current_player != actor {
        return Err(ActionError::NotYourTurn);
    }
    if player.passed {
        return Err(ActionError::AlreadyPassed);
    }
    Ok(player)
}

fn can_place_final_greenery(
    state: &GameState,
    layout: &BoardLayout,
    actor: PlayerIndex,
    cell: Hex,
) -> Result<(), ActionError> {
    if state.phase != GamePhase::FinalGreenery {
        return Err(ActionError::WrongPhase);
    }
    if state.current_player != actor {
        return Err(ActionError::NotYourTurn);
    }
    let player = seat(state, actor)?;
    if player.resources.plants < PLANTS_PER_GREENERY {
        return Err(ActionError::NotEnoughResources);
    }
    layout.check_placement(&state.tiles, TileKind::Greenery, cell, actor)
}

fn can_skip_final_greenery(state: &GameState, actor: PlayerIndex) -> Result<(), ActionError> {
    if state.phase != GamePhase::FinalGreenery {
        return Err(ActionError::WrongPhase);
    }
    if state.current_player != actor {
        return Err(ActionError::NotYourTurn);
    }
    seat(state, actor).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use tharsis_protocol::{AwardClaim, CorpId, GameOptions, MilestoneClaim, TradeRecord};

    fn fixture(seats: usize, options: GameOptions) -> (CardCatalog, BoardLayout, GameState) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let usernames: Vec<String> = (0..seats).map(|i| format!("p{i}")).collect();
        let mut state = GameState::new(&catalog, &usernames, options, 9);
        for (i, player) in state.players.iter_mut().enumerate() {
            player.corporation = Some(CorpId::new(i as u16));
            player.pending_corporations = None;
            player.pending_selection = None;
            player.resources.credits = 40;
        }
        state.phase = GamePhase::ActionRound;
        (catalog, BoardLayout::standard(), state)
    }

    fn give_card(state: &mut GameState, catalog: &CardCatalog, seat: usize, name: &str) {
        let id = catalog.card_id(name).expect("known card");
        state.players[seat].hand.push(id);
    }

    fn check(
        state: &GameState,
        catalog: &CardCatalog,
        layout: &BoardLayout,
        actor: u8,
        action: PlayerAction,
    ) -> Result<(), ActionError> {
        check_action(state, catalog, layout, PlayerIndex(actor), &action)
    }

    #[test]
    fn turn_and_phase_gating() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        let fund = PlayerAction::FundAward {
            award: Award::Banker,
            payment: None,
        };
        assert_eq!(
            check(&state, &catalog, &layout, 1, fund.clone()),
            Err(ActionError::NotYourTurn)
        );
        assert_eq!(
            check(&state, &catalog, &layout, 7, fund.clone()),
            Err(ActionError::NotYourTurn)
        );
        state.phase = GamePhase::Research;
        assert_eq!(
            check(&state, &catalog, &layout, 0, fund),
            Err(ActionError::WrongPhase)
        );
    }

    #[test]
    fn pass_and_skip_discipline() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::Skip),
            Err(ActionError::SkipWithoutAction)
        );
        assert_eq!(check(&state, &catalog, &layout, 0, PlayerAction::Pass), Ok(()));
        state.actions_taken = 1;
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::Pass),
            Err(ActionError::PassAfterAction)
        );
        assert_eq!(check(&state, &catalog, &layout, 0, PlayerAction::Skip), Ok(()));
    }

    #[test]
    fn pending_blocks_everyone_but_allows_the_resolution() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        state.players[0].pending_tile = Some(TileKind::Greenery);
        let fund = PlayerAction::FundAward {
            award: Award::Banker,
            payment: None,
        };
        assert_eq!(
            check(&state, &catalog, &layout, 0, fund.clone()),
            Err(ActionError::PendingDecision)
        );
        assert_eq!(
            check(&state, &catalog, &layout, 1, fund),
            Err(ActionError::OpponentPending)
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::PlaceTile {
                    cell: Hex::ORIGIN
                }
            ),
            Ok(())
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                1,
                PlayerAction::PlaceTile {
                    cell: Hex::ORIGIN
                }
            ),
            Err(ActionError::NoPendingDecision)
        );
    }

    #[test]
    fn milestone_claims_check_threshold_and_caps() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        let claim = |m| PlayerAction::ClaimMilestone {
            milestone: m,
            payment: None,
        };
        assert_eq!(
            check(&state, &catalog, &layout, 0, claim(Milestone::Terraformer)),
            Err(ActionError::MilestoneNotReached)
        );
        state.players[0].rating = 35;
        assert_eq!(
            check(&state, &catalog, &layout, 0, claim(Milestone::Terraformer)),
            Ok(())
        );
        state.milestones.push(MilestoneClaim {
            milestone: Milestone::Terraformer,
            player: PlayerIndex(1),
        });
        assert_eq!(
            check(&state, &catalog, &layout, 0, claim(Milestone::Terraformer)),
            Err(ActionError::MilestoneAlreadyClaimed)
        );
        state.milestones.push(MilestoneClaim {
            milestone: Milestone::Mayor,
            player: PlayerIndex(1),
        });
        state.milestones.push(MilestoneClaim {
            milestone: Milestone::Gardener,
            player: PlayerIndex(1),
        });
        assert_eq!(
            check(&state, &catalog, &layout, 0, claim(Milestone::Planner)),
            Err(ActionError::MilestonesExhausted)
        );
    }

    #[test]
    fn award_tiers_escalate_and_cap_at_three() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        state.players[0].resources.credits = 13;
        let fund = |a| PlayerAction::FundAward {
            award: a,
            payment: None,
        };
        assert_eq!(check(&state, &catalog, &layout, 0, fund(Award::Banker)), Ok(()));
        state.awards.push(AwardClaim {
            award: Award::Banker,
            player: PlayerIndex(0),
        });
        // Second tier costs 14, one credit more than held.
        assert_eq!(
            check(&state, &catalog, &layout, 0, fund(Award::Landlord)),
            Err(ActionError::CannotAfford { cost: 14 })
        );
        assert_eq!(
            check(&state, &catalog, &layout, 0, fund(Award::Banker)),
            Err(ActionError::AwardAlreadyFunded)
        );
        state.awards.push(AwardClaim {
            award: Award::Landlord,
            player: PlayerIndex(1),
        });
        state.awards.push(AwardClaim {
            award: Award::Miner,
            player: PlayerIndex(1),
        });
        assert_eq!(
            check(&state, &catalog, &layout, 0, fund(Award::Scientist)),
            Err(ActionError::AwardsExhausted)
        );
    }

    #[test]
    fn parameter_ceilings_reject_rather_than_clamp() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        state.players[0].resources.heat = 8;
        state.temperature = MAX_TEMPERATURE;
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::ConvertHeat),
            Err(ActionError::TemperatureAtMaximum)
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::StandardProject {
                    project: StandardProjectKind::Asteroid,
                    payment: None,
                }
            ),
            Err(ActionError::TemperatureAtMaximum)
        );

        // A two-step raise one step below the ceiling is refused whole.
        state.temperature = MAX_TEMPERATURE - TEMPERATURE_STEP;
        give_card(&mut state, &catalog, 0, "Big Asteroid");
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::PlayCard {
                    card: "Big Asteroid".into(),
                    payment: None,
                }
            ),
            Err(ActionError::TemperatureAtMaximum)
        );

        state.oceans = MAX_OCEANS;
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::StandardProject {
                    project: StandardProjectKind::Aquifer,
                    payment: None,
                }
            ),
            Err(ActionError::OceansAtMaximum)
        );
    }

    #[test]
    fn card_requirements_are_enforced() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        give_card(&mut state, &catalog, 0, "Mangrove");
        let err = check(
            &state,
            &catalog,
            &layout,
            0,
            PlayerAction::PlayCard {
                card: "Mangrove".into(),
                payment: None,
            },
        )
        .expect_err("temperature far too low");
        assert!(matches!(err, ActionError::RequirementNotMet(_)));
    }

    #[test]
    fn metal_on_hand_demands_an_explicit_allocation() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        state.players[0].resources.steel = 2;
        give_card(&mut state, &catalog, 0, "Mine");
        let play = |payment| PlayerAction::PlayCard {
            card: "Mine".into(),
            payment,
        };
        assert_eq!(
            check(&state, &catalog, &layout, 0, play(None)),
            Err(ActionError::AmbiguousPayment)
        );
        assert_eq!(
            check(&state, &catalog, &layout, 0, play(Some(Payment::credits(4)))),
            Ok(())
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                play(Some(Payment {
                    steel: 2,
                    ..Payment::default()
                }))
            ),
            Ok(())
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                play(Some(Payment {
                    titanium: 2,
                    ..Payment::default()
                }))
            ),
            Err(ActionError::UnusableResource)
        );
    }

    #[test]
    fn reds_surcharge_is_priced_into_affordability() {
        let options = GameOptions {
            turmoil: true,
            ..GameOptions::default()
        };
        let (catalog, layout, mut state) = fixture(2, options);
        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Reds;
        }
        state.players[0].resources.heat = 8;
        state.players[0].resources.credits = 2;
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::ConvertHeat),
            Err(ActionError::CannotAfford { cost: 3 })
        );
        state.players[0].resources.credits = 3;
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::ConvertHeat),
            Ok(())
        );
    }

    #[test]
    fn trade_eligibility_is_checked_before_payment() {
        let options = GameOptions {
            colonies: true,
            ..GameOptions::default()
        };
        let (catalog, layout, mut state) = fixture(2, options);
        let trade = |colony: &str| PlayerAction::Trade {
            colony: colony.to_string(),
            payment: None,
        };
        assert_eq!(check(&state, &catalog, &layout, 0, trade("Luna")), Ok(()));

        let luna = catalog.colony_id("Luna").expect("luna");
        state.colony_mut(luna).expect("luna state").last_trade = Some(TradeRecord {
            player: PlayerIndex(1),
            generation: state.generation,
        });
        assert_eq!(
            check(&state, &catalog, &layout, 0, trade("Luna")),
            Err(ActionError::ColonyAlreadyTraded)
        );

        assert_eq!(
            check(&state, &catalog, &layout, 0, trade("Titan")),
            Err(ActionError::ColonyInactive)
        );

        state.players[0].trades_this_generation = state.players[0].fleets;
        assert_eq!(
            check(&state, &catalog, &layout, 0, trade("Ceres")),
            Err(ActionError::NoFleetAvailable)
        );

        state.players[0].trades_this_generation = 0;
        state.players[0].resources.energy = 3;
        assert_eq!(
            check(&state, &catalog, &layout, 0, trade("Ceres")),
            Err(ActionError::AmbiguousPayment)
        );
    }

    #[test]
    fn initial_buy_waits_for_the_corporation() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let usernames = vec!["a".to_string(), "b".to_string()];
        let layout = BoardLayout::standard();
        let mut state = GameState::new(&catalog, &usernames, GameOptions::default(), 4);
        state.players[0].resources.credits = 10;

        let offered = state.players[0].pending_selection.as_ref().expect("offer").cards[0];
        let name = catalog.card(offered).name.clone();
        let select = PlayerAction::SelectCards {
            cards: vec![name],
            payment: None,
        };
        assert_eq!(
            check(&state, &catalog, &layout, 0, select.clone()),
            Err(ActionError::PendingDecision)
        );

        state.players[0].corporation = catalog.corporation_id("CrediCor");
        state.players[0].pending_corporations = None;
        assert_eq!(check(&state, &catalog, &layout, 0, select), Ok(()));

        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::SelectCards {
                    cards: vec!["No Such Card".into()],
                    payment: None,
                }
            ),
            Err(ActionError::UnknownCard("No Such Card".into()))
        );
    }

    #[test]
    fn final_greenery_needs_plants_and_the_turn() {
        let (catalog, layout, mut state) = fixture(2, GameOptions::default());
        state.phase = GamePhase::FinalGreenery;
        state.players[0].resources.plants = 8;
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::PlaceFinalGreenery { cell: Hex::ORIGIN }
            ),
            Ok(())
        );
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                1,
                PlayerAction::PlaceFinalGreenery { cell: Hex::ORIGIN }
            ),
            Err(ActionError::NotYourTurn)
        );
        state.players[0].resources.plants = 7;
        assert_eq!(
            check(
                &state,
                &catalog,
                &layout,
                0,
                PlayerAction::PlaceFinalGreenery { cell: Hex::ORIGIN }
            ),
            Err(ActionError::NotEnoughResources)
        );
        assert_eq!(
            check(&state, &catalog, &layout, 0, PlayerAction::SkipFinalGreenery),
            Ok(())
        );
    }
}
