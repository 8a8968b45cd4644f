//! Snapshot conversion between the live, id-keyed `GameState` and the
//! card-name-keyed `CompactState` used on the wire and in storage. Name
//! keying keeps stored games valid across catalog reorderings; re-hydration
//! resolves every name against the catalog and rejects unknowns. `censor`
//! is the single redaction point, applied per viewer at the service
//! boundary only.

use std::collections::VecDeque;

use tharsis_protocol::{
    CardId, CardName, CardOffer, ColonyState, CompactState, PlayedCard, PlayerCompact, PlayerIndex,
};

use crate::catalog::CardCatalog;
use crate::error::StateError;
use crate::rng::GameRng;
use crate::state::{CardInPlay, Colony, GameState, Offer, Player};

pub fn to_compact(state: &GameState, catalog: &CardCatalog) -> CompactState {
    let name = |id: CardId| catalog.card(id).name.clone();
    CompactState {
        generation: state.generation,
        turn: state.turn,
        phase: state.phase,
        current_player: state.current_player,
        first_player: state.first_player,
        turn_order: state.turn_order.clone(),
        actions_taken: state.actions_taken,
        temperature: state.temperature,
        oxygen: state.oxygen,
        oceans: state.oceans,
        tiles: state.tiles.clone(),
        deck: state.deck.iter().map(|&id| name(id)).collect(),
        deck_count: state.deck.len() as u32,
        discard: state.discard.iter().map(|&id| name(id)).collect(),
        milestones: state.milestones.clone(),
        awards: state.awards.clone(),
        colonies: state
            .colonies
            .iter()
            .map(|c| colony_out(c, catalog))
            .collect(),
        turmoil: state.turmoil.clone(),
        players: state
            .players
            .iter()
            .map(|p| player_out(p, catalog))
            .collect(),
        log: state.log.clone(),
        action_count: state.action_count,
        options: state.options.clone(),
        final_scores: state.final_scores.clone(),
        rng_state: state.rng.state_bytes(),
    }
}

pub fn from_compact(
    compact: &CompactState,
    catalog: &CardCatalog,
) -> Result<GameState, StateError> {
    if compact.players.is_empty() {
        return Err(StateError::Malformed("no players".to_string()));
    }
    let seats = compact.players.len();
    if compact.turn_order.len() != seats
        || compact.turn_order.iter().any(|s| s.as_usize() >= seats)
    {
        return Err(StateError::Malformed(
            "turn order does not cover the seats".to_string(),
        ));
    }
    if compact.current_player.as_usize() >= seats || compact.first_player.as_usize() >= seats {
        return Err(StateError::Malformed("seat index out of range".to_string()));
    }

    Ok(GameState {
        generation: compact.generation,
        turn: compact.turn,
        phase: compact.phase,
        current_player: compact.current_player,
        first_player: compact.first_player,
        turn_order: compact.turn_order.clone(),
        actions_taken: compact.actions_taken,
        temperature: compact.temperature,
        oxygen: compact.oxygen,
        oceans: compact.oceans,
        tiles: compact.tiles.clone(),
        deck: card_ids(catalog, &compact.deck)?,
        discard: card_ids(catalog, &compact.discard)?,
        milestones: compact.milestones.clone(),
        awards: compact.awards.clone(),
        colonies: compact
            .colonies
            .iter()
            .map(|c| colony_in(c, catalog))
            .collect::<Result<_, _>>()?,
        turmoil: compact.turmoil.clone(),
        players: compact
            .players
            .iter()
            .map(|p| player_in(p, catalog))
            .collect::<Result<_, _>>()?,
        log: compact.log.clone(),
        action_count: compact.action_count,
        options: compact.options.clone(),
        final_scores: compact.final_scores.clone(),
        rng: GameRng::from_state_bytes(compact.rng_state),
        queue: VecDeque::new(),
    })
}

/// Per-viewer redaction: other players' hands, draft packs, card offers and
/// the deck order are hidden, counts and slot occupancy stay visible, and
/// the rng state is zeroed. `None` is a spectator and sees no hand at all.
pub fn censor(compact: &CompactState, viewer: Option<PlayerIndex>) -> CompactState {
    let mut out = compact.clone();
    out.deck.clear();
    out.rng_state = [0; 32];
    for (i, player) in out.players.iter_mut().enumerate() {
        if viewer == Some(PlayerIndex(i as u8)) {
            continue;
        }
        player.hand.clear();
        player.draft_picks.clear();
        if let Some(pack) = player.pending_draft.as_mut() {
            pack.clear();
        }
        if let Some(offer) = player.pending_selection.as_mut() {
            offer.cards.clear();
        }
        if let Some(corps) = player.pending_corporations.as_mut() {
            corps.clear();
        }
    }
    out
}

fn card_ids(catalog: &CardCatalog, names: &[CardName]) -> Result<Vec<CardId>, StateError> {
    names
        .iter()
        .map(|name| {
            catalog
                .card_id(name)
                .ok_or_else(|| StateError::UnknownCard(name.clone()))
        })
        .collect()
}

fn colony_out(colony: &Colony, catalog: &CardCatalog) -> ColonyState {
    ColonyState {
        name: catalog.colony(colony.id).name.clone(),
        step: colony.step,
        settlers: colony.settlers.clone(),
        last_trade: colony.last_trade,
    }
}

fn colony_in(colony: &ColonyState, catalog: &CardCatalog) -> Result<Colony, StateError> {
    let id = catalog
        .colony_id(&colony.name)
        .ok_or_else(|| StateError::UnknownColony(colony.name.clone()))?;
    Ok(Colony {
        id,
        step: colony.step,
        settlers: colony.settlers.clone(),
        last_trade: colony.last_trade,
    })
}

fn player_out(player: &Player, catalog: &CardCatalog) -> PlayerCompact {
    let name = |id: CardId| catalog.card(id).name.clone();
    PlayerCompact {
        username: player.username.clone(),
        corporation: player.corporation.map(|id| catalog.corporation(id).name.clone()),
        resources: player.resources.clone(),
        production: player.production.clone(),
        rating: player.rating,
        fleets: player.fleets,
        trades_this_generation: player.trades_this_generation,
        discounts: player.discounts.clone(),
        played: player
            .played
            .iter()
            .map(|p| PlayedCard {
                card: name(p.card),
                stock: p.stock,
                activated: p.activated,
            })
            .collect(),
        hand: player.hand.iter().map(|&id| name(id)).collect(),
        hand_count: player.hand.len() as u32,
        pending_corporations: player
            .pending_corporations
            .as_ref()
            .map(|corps| corps.iter().map(|&c| catalog.corporation(c).name.clone()).collect()),
        pending_selection: player.pending_selection.as_ref().map(|offer| CardOffer {
            cards: offer.cards.iter().map(|&id| name(id)).collect(),
            unit_cost: offer.unit_cost,
        }),
        pending_draft: player
            .pending_draft
            .as_ref()
            .map(|pack| pack.iter().map(|&id| name(id)).collect()),
        draft_picks: player.draft_picks.iter().map(|&id| name(id)).collect(),
        pending_tile: player.pending_tile,
        pending_resource: player.pending_resource.clone(),
        pending_discard: player.pending_discard,
        pending_copy: player.pending_copy.map(name),
        passed: player.passed,
    }
}

fn player_in(player: &PlayerCompact, catalog: &CardCatalog) -> Result<Player, StateError> {
    let corporation = player
        .corporation
        .as_ref()
        .map(|name| {
            catalog
                .corporation_id(name)
                .ok_or_else(|| StateError::UnknownCorporation(name.clone()))
        })
        .transpose()?;
    let played = player
        .played
        .iter()
        .map(|p| {
            let card = catalog
                .card_id(&p.card)
                .ok_or_else(|| StateError::UnknownCard(p.card.clone()))?;
            Ok(CardInPlay {
                card,
                stock: p.stock,
                activated: p.activated,
            })
        })
        .collect::<Result<_, StateError>>()?;
    let pending_corporations = player
        .pending_corporations
        .as_ref()
        .map(|corps| {
            corps
                .iter()
                .map(|name| {
                    catalog
                        .corporation_id(name)
                        .ok_or_else(|| StateError::UnknownCorporation(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let pending_selection = player
        .pending_selection
        .as_ref()
        .map(|offer| {
            Ok::<_, StateError>(Offer {
                cards: card_ids(catalog, &offer.cards)?,
                unit_cost: offer.unit_cost,
            })
        })
        .transpose()?;
    let pending_draft = player
        .pending_draft
        .as_ref()
        .map(|pack| card_ids(catalog, pack))
        .transpose()?;
    let pending_copy = player
        .pending_copy
        .as_ref()
        .map(|name| {
            catalog
                .card_id(name)
                .ok_or_else(|| StateError::UnknownCard(name.clone()))
        })
        .transpose()?;

    Ok(Player {
        username: player.username.clone(),
        corporation,
        resources: player.resources.clone(),
        production: player.production.clone(),
        rating: player.rating,
        fleets: player.fleets,
        trades_this_generation: player.trades_this_generation,
        discounts: player.discounts.clone(),
        played,
        hand: card_ids(catalog, &player.hand)?,
        pending_corporations,
        pending_selection,
        pending_draft,
        draft_picks: card_ids(catalog, &player.draft_picks)?,
        pending_tile: player.pending_tile,
        pending_resource: player.pending_resource.clone(),
        pending_discard: player.pending_discard,
        pending_copy,
        passed: player.passed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use tharsis_protocol::GameOptions;

    fn sample() -> (CardCatalog, GameState) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let options = GameOptions {
            colonies: true,
            turmoil: true,
            draft: false,
        };
        let names = vec!["amy".to_string(), "bo".to_string()];
        let mut state = GameState::new(&catalog, &names, options, 77);
        state.players[0].resources.plants = 5;
        state.players[1].pending_discard = Some(2);
        state.oxygen = 3;
        (catalog, state)
    }

    #[test]
    fn round_trip_preserves_the_mutable_state() {
        let (catalog, state) = sample();
        let compact = to_compact(&state, &catalog);
        let revived = from_compact(&compact, &catalog).expect("hydrates");
        assert_eq!(compact, to_compact(&revived, &catalog));
    }

    #[test]
    fn deck_count_mirrors_the_deck() {
        let (catalog, state) = sample();
        let compact = to_compact(&state, &catalog);
        assert_eq!(compact.deck_count as usize, compact.deck.len());
        let hands: Vec<u32> = compact.players.iter().map(|p| p.hand_count).collect();
        let lens: Vec<u32> = compact
            .players
            .iter()
            .map(|p| p.hand.len() as u32)
            .collect();
        assert_eq!(hands, lens);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let (catalog, state) = sample();
        let mut compact = to_compact(&state, &catalog);
        compact.players[0].hand.push("Orbital Llama Ranch".to_string());
        let err = from_compact(&compact, &catalog).expect_err("bogus card");
        assert!(matches!(err, StateError::UnknownCard(name) if name == "Orbital Llama Ranch"));

        let mut compact = to_compact(&state, &catalog);
        compact.colonies[0].name = "Atlantis".to_string();
        let err = from_compact(&compact, &catalog).expect_err("bogus colony");
        assert!(matches!(err, StateError::UnknownColony(name) if name == "Atlantis"));
    }

    #[test]
    fn broken_seating_is_malformed() {
        let (catalog, state) = sample();
        let mut compact = to_compact(&state, &catalog);
        compact.turn_order.pop();
        assert!(matches!(
            from_compact(&compact, &catalog),
            Err(StateError::Malformed(_))
        ));
    }

    #[test]
    fn censor_hides_everything_the_viewer_must_not_see() {
        let (catalog, state) = sample();
        let compact = to_compact(&state, &catalog);
        let view = censor(&compact, Some(PlayerIndex(0)));

        assert!(view.deck.is_empty());
        assert_eq!(view.deck_count, compact.deck_count);
        assert_eq!(view.rng_state, [0; 32]);

        let own = &view.players[0];
        assert_eq!(own.pending_selection, compact.players[0].pending_selection);
        assert_eq!(
            own.pending_corporations,
            compact.players[0].pending_corporations
        );

        let other = &view.players[1];
        assert!(other.hand.is_empty());
        assert_eq!(other.hand_count, compact.players[1].hand_count);
        let offer = other.pending_selection.as_ref().expect("slot survives");
        assert!(offer.cards.is_empty());
        assert_eq!(offer.unit_cost, 3);
        assert_eq!(
            other.pending_corporations.as_ref().map(Vec::len),
            Some(0),
            "offer slot stays occupied"
        );
        assert_eq!(other.pending_discard, Some(2), "public slots survive");
    }

    #[test]
    fn spectators_see_no_hand_at_all() {
        let (catalog, state) = sample();
        let compact = to_compact(&state, &catalog);
        let view = censor(&compact, None);
        assert!(view.players.iter().all(|p| p.hand.is_empty()));
        assert!(view
            .players
            .iter()
            .all(|p| p.pending_selection.as_ref().map_or(true, |o| o.cards.is_empty())));
    }
}
