//! Property tests that drive whole games through the public engine API.
//!
//! The driver collects candidate actions at every step, keeps the ones the
//! guard accepts, and picks among them by index. Anything the guard accepts
//! must then apply cleanly; the resulting states must hold the global
//! invariants, survive a snapshot round-trip, and replay identically.

use proptest::prelude::*;

use tharsis_core::{
    censor, from_compact, load_catalog, tile_at, to_compact, CardCatalog, CatalogSource,
    GameEngine, GameState, AWARD_TIERS, MAX_COLONY_STEP, MAX_MILESTONES, MAX_OCEANS, MAX_OXYGEN,
    MAX_SETTLERS, MAX_TEMPERATURE, MIN_TEMPERATURE, TEMPERATURE_STEP,
};
use tharsis_protocol::{
    Award, GameOptions, GamePhase, Hex, Milestone, Party, PendingResource, PlayerAction,
    PlayerIndex, ResourceTarget, StandardProjectKind,
};

fn open_cells(engine: &GameEngine<'_>, state: &GameState) -> Vec<Hex> {
    engine
        .layout()
        .cells()
        .iter()
        .map(|c| c.cell)
        .filter(|&cell| tile_at(&state.tiles, cell).is_none())
        .collect()
}

/// Everything this seat could plausibly try right now. Deliberately
/// over-generates; the guard decides what is actually legal.
fn candidates(engine: &GameEngine<'_>, state: &GameState, seat: PlayerIndex) -> Vec<PlayerAction> {
    let catalog = engine.catalog();
    let mut out = Vec::new();
    let Some(player) = state.player(seat) else {
        return out;
    };
    match state.phase {
        GamePhase::CorporationSelection | GamePhase::Research => {
            if let Some(corps) = &player.pending_corporations {
                for &corp in corps {
                    out.push(PlayerAction::ChooseCorporation {
                        corporation: catalog.corporation(corp).name.clone(),
                    });
                }
            }
            if let Some(offer) = &player.pending_selection {
                out.push(PlayerAction::SelectCards {
                    cards: Vec::new(),
                    payment: None,
                });
                if let Some(&first) = offer.cards.first() {
                    out.push(PlayerAction::SelectCards {
                        cards: vec![catalog.card(first).name.clone()],
                        payment: None,
                    });
                }
            }
        }
        GamePhase::Drafting => {
            if let Some(&top) = player.pending_draft.as_ref().and_then(|p| p.first()) {
                out.push(PlayerAction::DraftCard {
                    card: catalog.card(top).name.clone(),
                });
            }
        }
        GamePhase::ActionRound => {
            if player.pending_tile.is_some() {
                for cell in open_cells(engine, state) {
                    out.push(PlayerAction::PlaceTile { cell });
                }
            }
            match &player.pending_resource {
                Some(PendingResource::RemovePlants { .. }) => {
                    for victim in state.seats() {
                        if victim != seat {
                            out.push(PlayerAction::ChooseResource {
                                target: ResourceTarget::Player { player: victim },
                            });
                        }
                    }
                }
                Some(PendingResource::AddToCard { .. }) => {
                    for card in &player.played {
                        out.push(PlayerAction::ChooseResource {
                            target: ResourceTarget::Card {
                                card: catalog.card(card.card).name.clone(),
                            },
                        });
                    }
                }
                None => {}
            }
            if let Some(count) = player.pending_discard {
                let cards: Vec<String> = player
                    .hand
                    .iter()
                    .take(count as usize)
                    .map(|&id| catalog.card(id).name.clone())
                    .collect();
                out.push(PlayerAction::DiscardCards { cards });
            }
            if player.pending_copy.is_some() {
                for card in &player.played {
                    out.push(PlayerAction::CopyProduction {
                        card: catalog.card(card.card).name.clone(),
                    });
                }
            }

            out.push(PlayerAction::Pass);
            out.push(PlayerAction::Skip);
            out.push(PlayerAction::ConvertPlants);
            out.push(PlayerAction::ConvertHeat);
            for milestone in Milestone::ALL {
                out.push(PlayerAction::ClaimMilestone {
                    milestone,
                    payment: None,
                });
            }
            for award in Award::ALL {
                out.push(PlayerAction::FundAward {
                    award,
                    payment: None,
                });
            }
            for &card in player.hand.iter().take(2) {
                out.push(PlayerAction::PlayCard {
                    card: catalog.card(card).name.clone(),
                    payment: None,
                });
            }
            for card in &player.played {
                let name = catalog.card(card.card).name.clone();
                out.push(PlayerAction::UseCardAction {
                    card: name.clone(),
                    choice: None,
                });
                out.push(PlayerAction::UseCardAction {
                    card: name,
                    choice: Some(1),
                });
            }
            for project in [
                StandardProjectKind::PowerPlant,
                StandardProjectKind::Asteroid,
                StandardProjectKind::Aquifer,
                StandardProjectKind::Greenery,
                StandardProjectKind::City,
            ] {
                out.push(PlayerAction::StandardProject {
                    project,
                    payment: None,
                });
            }
            if let Some(&first) = player.hand.first() {
                out.push(PlayerAction::StandardProject {
                    project: StandardProjectKind::SellPatents {
                        cards: vec![catalog.card(first).name.clone()],
                    },
                    payment: None,
                });
            }
            for colony in &state.colonies {
                let name = catalog.colony(colony.id).name.clone();
                out.push(PlayerAction::BuildColony {
                    colony: name.clone(),
                    payment: None,
                });
                out.push(PlayerAction::Trade {
                    colony: name,
                    payment: None,
                });
            }
            for party in Party::ALL {
                out.push(PlayerAction::SendDelegate { party });
            }
        }
        GamePhase::FinalGreenery => {
            for cell in open_cells(engine, state) {
                out.push(PlayerAction::PlaceFinalGreenery { cell });
            }
            out.push(PlayerAction::SkipFinalGreenery);
        }
        GamePhase::Finished => {}
    }
    out
}

/// Runs up to `picks.len()` guard-approved actions. `None` means the table
/// got stuck with no legal action before the game finished, which is itself
/// a bug.
fn play_out(
    catalog: &CardCatalog,
    options: GameOptions,
    seed: u64,
    picks: &[u8],
) -> Option<GameState> {
    let engine = GameEngine::new(catalog);
    let usernames = vec!["prop-a".to_string(), "prop-b".to_string()];
    let mut state = GameState::new(catalog, &usernames, options, seed);
    for &pick in picks {
        if state.phase == GamePhase::Finished {
            break;
        }
        let seats: Vec<PlayerIndex> = state.seats().collect();
        let mut legal: Vec<(PlayerIndex, PlayerAction)> = Vec::new();
        for seat in seats {
            for action in candidates(&engine, &state, seat) {
                if engine.check(&state, seat, &action).is_ok() {
                    legal.push((seat, action));
                }
            }
        }
        if legal.is_empty() {
            return None;
        }
        let (seat, action) = &legal[pick as usize % legal.len()];
        state = engine
            .apply(&state, *seat, action)
            .expect("guard-approved action must apply");
    }
    Some(state)
}

fn options_strategy() -> impl Strategy<Value = GameOptions> {
    (any::<bool>(), any::<bool>()).prop_map(|(turmoil, draft)| GameOptions {
        colonies: true,
        turmoil,
        draft,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Driven games never violate the global bounds, no matter the order
    /// of play.
    #[test]
    fn prop_driven_games_hold_global_invariants(
        options in options_strategy(),
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<u8>(), 1..60),
    ) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let state = play_out(&catalog, options, seed, &picks);
        prop_assert!(state.is_some(), "table stuck with no legal action");
        let state = state.expect("checked");

        prop_assert!(state.temperature >= MIN_TEMPERATURE);
        prop_assert!(state.temperature <= MAX_TEMPERATURE);
        prop_assert_eq!((state.temperature - MIN_TEMPERATURE) % TEMPERATURE_STEP, 0);
        prop_assert!(state.oxygen <= MAX_OXYGEN);
        prop_assert!(state.oceans <= MAX_OCEANS);

        prop_assert!(state.milestones.len() <= MAX_MILESTONES);
        prop_assert!(state.awards.len() <= AWARD_TIERS.len());
        for player in &state.players {
            prop_assert!(player.rating >= 20, "rating never drops below start");
        }
        for colony in &state.colonies {
            prop_assert!(colony.settlers.len() <= MAX_SETTLERS);
            prop_assert!(colony.step >= -1 && colony.step <= MAX_COLONY_STEP);
        }

        let engine = GameEngine::new(&catalog);
        let mut seen = std::collections::HashSet::new();
        for tile in &state.tiles {
            prop_assert!(engine.layout().contains(tile.cell), "tile on the board");
            prop_assert!(seen.insert(tile.cell), "one tile per cell");
        }
        for (i, entry) in state.log.iter().enumerate() {
            prop_assert_eq!(entry.seq, i as u64, "log sequence is gapless");
        }
    }

    /// Snapshots are lossless: hydrate and re-snapshot yields the identical
    /// document.
    #[test]
    fn prop_snapshot_round_trip_is_lossless(
        options in options_strategy(),
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<u8>(), 1..40),
    ) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let Some(state) = play_out(&catalog, options, seed, &picks) else {
            return Err(TestCaseError::fail("table stuck"));
        };
        let compact = to_compact(&state, &catalog);
        let revived = from_compact(&compact, &catalog).expect("own snapshot hydrates");
        prop_assert_eq!(compact, to_compact(&revived, &catalog));
    }

    /// The same seed and the same picks tell the same story.
    #[test]
    fn prop_identical_picks_replay_identically(
        options in options_strategy(),
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<u8>(), 1..40),
    ) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let first = play_out(&catalog, options, seed, &picks);
        let second = play_out(&catalog, options, seed, &picks);
        match (first, second) {
            (Some(a), Some(b)) => {
                prop_assert_eq!(to_compact(&a, &catalog), to_compact(&b, &catalog));
            }
            (None, None) => {}
            _ => return Err(TestCaseError::fail("replay diverged")),
        }
    }

    /// No censored view ever carries another player's hand, the deck order,
    /// or the rng state.
    #[test]
    fn prop_censoring_never_leaks_hidden_cards(
        options in options_strategy(),
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<u8>(), 1..40),
    ) {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let Some(state) = play_out(&catalog, options, seed, &picks) else {
            return Err(TestCaseError::fail("table stuck"));
        };
        let compact = to_compact(&state, &catalog);
        for viewer in [None, Some(PlayerIndex(0)), Some(PlayerIndex(1))] {
            let view = censor(&compact, viewer);
            prop_assert!(view.deck.is_empty());
            prop_assert_eq!(view.rng_state, [0; 32]);
            for (i, player) in view.players.iter().enumerate() {
                if viewer == Some(PlayerIndex(i as u8)) {
                    prop_assert_eq!(&player.hand, &compact.players[i].hand);
                    continue;
                }
                prop_assert!(player.hand.is_empty());
                prop_assert_eq!(player.hand_count, compact.players[i].hand_count);
                prop_assert!(player
                    .pending_draft
                    .as_ref()
                    .map_or(true, |p| p.is_empty()));
                prop_assert!(player
                    .pending_selection
                    .as_ref()
                    .map_or(true, |o| o.cards.is_empty()));
            }
        }
    }
}
