//! Political state: delegates, dominance, and the ruling-party policies
//! read by the guard, payment resolution and the dispatcher.

use tharsis_protocol::{DelegateCount, Party, PlayerIndex};

use crate::state::GameState;

pub fn ruling(state: &GameState) -> Option<Party> {
    state.turmoil.as_ref().map(|t| t.ruling)
}

/// Credits owed per terraform-rating step while Reds rule.
pub fn reds_tax(state: &GameState, steps: u32) -> u32 {
    if ruling(state) == Some(Party::Reds) {
        3 * steps
    } else {
        0
    }
}

/// Credits granted per temperature step while Kelvinists rule.
pub fn kelvinist_bonus(state: &GameState, steps: u32) -> u32 {
    if ruling(state) == Some(Party::Kelvinists) {
        3 * steps
    } else {
        0
    }
}

/// Credits granted per greenery placed while Greens rule.
pub fn greens_bonus(state: &GameState, greeneries: u32) -> u32 {
    if ruling(state) == Some(Party::Greens) {
        4 * greeneries
    } else {
        0
    }
}

pub fn steel_value(state: &GameState) -> u32 {
    if ruling(state) == Some(Party::MarsFirst) {
        3
    } else {
        2
    }
}

pub fn titanium_value(state: &GameState) -> u32 {
    if ruling(state) == Some(Party::Unity) {
        4
    } else {
        3
    }
}

/// Unit price when buying researched cards. Scientists subsidize research.
pub fn card_price(state: &GameState) -> u32 {
    if ruling(state) == Some(Party::Scientists) {
        2
    } else {
        3
    }
}

pub fn party_total(delegates: &[DelegateCount], party: Party) -> u32 {
    delegates
        .iter()
        .filter(|d| d.party == party)
        .map(|d| d.count)
        .sum()
}

pub fn player_delegates(
    delegates: &[DelegateCount],
    party: Party,
    player: PlayerIndex,
) -> u32 {
    delegates
        .iter()
        .filter(|d| d.party == party && d.player == Some(player))
        .map(|d| d.count)
        .sum()
}

/// Adds one delegate for `player` (None = the neutral block).
pub fn add_delegate(state: &mut GameState, party: Party, player: Option<PlayerIndex>) {
    let Some(turmoil) = state.turmoil.as_mut() else {
        return;
    };
    match turmoil
        .delegates
        .iter_mut()
        .find(|d| d.party == party && d.player == player)
    {
        Some(entry) => entry.count += 1,
        None => turmoil.delegates.push(DelegateCount {
            party,
            player,
            count: 1,
        }),
    }
}

/// Recomputes the dominant party after a delegate change. The incumbent
/// keeps dominance on ties; otherwise the first party in canonical order
/// among the leaders takes it.
pub fn recompute_dominant(state: &mut GameState) {
    let Some(turmoil) = state.turmoil.as_mut() else {
        return;
    };
    let incumbent = turmoil.dominant;
    let incumbent_total = party_total(&turmoil.delegates, incumbent);
    let mut best = incumbent;
    let mut best_total = incumbent_total;
    for party in Party::ALL {
        let total = party_total(&turmoil.delegates, party);
        if total > best_total {
            best = party;
            best_total = total;
        }
    }
    turmoil.dominant = best;
}

/// Generation-end shift: the dominant party takes office and its strongest
/// member (most delegates, lowest seat on ties) becomes chairman. Returns
/// the new chairman so the caller can grant the rating point.
pub fn rotate_ruling(state: &mut GameState) -> Option<PlayerIndex> {
    let seats: Vec<PlayerIndex> = state.seats().collect();
    let turmoil = state.turmoil.as_mut()?;
    turmoil.ruling = turmoil.dominant;
    let chairman = seats
        .into_iter()
        .map(|seat| (seat, player_delegates(&turmoil.delegates, turmoil.ruling, seat)))
        .filter(|(_, count)| *count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0 .0.cmp(&a.0 .0)))
        .map(|(seat, _)| seat);
    turmoil.chairman = chairman;
    chairman
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_catalog, CatalogSource};
    use tharsis_protocol::GameOptions;

    fn turmoil_state(seats: usize) -> GameState {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog");
        let usernames: Vec<String> = (0..seats).map(|i| format!("p{i}")).collect();
        let options = GameOptions {
            turmoil: true,
            ..GameOptions::default()
        };
        GameState::new(&catalog, &usernames, options, 1)
    }

    #[test]
    fn dominance_prefers_incumbent_on_ties() {
        let mut state = turmoil_state(2);
        add_delegate(&mut state, Party::Reds, Some(PlayerIndex(0)));
        recompute_dominant(&mut state);
        assert_eq!(state.turmoil.as_ref().map(|t| t.dominant), Some(Party::Reds));

        // Tie at one delegate each keeps Reds dominant.
        add_delegate(&mut state, Party::Unity, Some(PlayerIndex(1)));
        recompute_dominant(&mut state);
        assert_eq!(state.turmoil.as_ref().map(|t| t.dominant), Some(Party::Reds));

        // A clear majority takes over.
        add_delegate(&mut state, Party::Unity, Some(PlayerIndex(1)));
        recompute_dominant(&mut state);
        assert_eq!(
            state.turmoil.as_ref().map(|t| t.dominant),
            Some(Party::Unity)
        );
    }

    #[test]
    fn rotation_installs_strongest_member_as_chairman() {
        let mut state = turmoil_state(3);
        add_delegate(&mut state, Party::Kelvinists, Some(PlayerIndex(2)));
        add_delegate(&mut state, Party::Kelvinists, Some(PlayerIndex(2)));
        add_delegate(&mut state, Party::Kelvinists, Some(PlayerIndex(1)));
        add_delegate(&mut state, Party::Kelvinists, None);
        recompute_dominant(&mut state);
        let chairman = rotate_ruling(&mut state);
        assert_eq!(chairman, Some(PlayerIndex(2)));
        let turmoil = state.turmoil.as_ref().expect("turmoil");
        assert_eq!(turmoil.ruling, Party::Kelvinists);
        assert_eq!(turmoil.chairman, Some(PlayerIndex(2)));
    }

    #[test]
    fn neutral_delegates_count_for_dominance_not_chair() {
        let mut state = turmoil_state(2);
        add_delegate(&mut state, Party::MarsFirst, None);
        add_delegate(&mut state, Party::MarsFirst, None);
        recompute_dominant(&mut state);
        let chairman = rotate_ruling(&mut state);
        assert_eq!(chairman, None);
        let turmoil = state.turmoil.as_ref().expect("turmoil");
        assert_eq!(turmoil.ruling, Party::MarsFirst);
        assert_eq!(turmoil.chairman, None);
    }

    #[test]
    fn ruling_policies_change_rates() {
        let mut state = turmoil_state(2);
        assert_eq!(steel_value(&state), 2);
        assert_eq!(titanium_value(&state), 3);
        assert_eq!(card_price(&state), 3);
        assert_eq!(reds_tax(&state, 2), 0);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::MarsFirst;
        }
        assert_eq!(steel_value(&state), 3);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Unity;
        }
        assert_eq!(titanium_value(&state), 4);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Scientists;
        }
        assert_eq!(card_price(&state), 2);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Reds;
        }
        assert_eq!(reds_tax(&state, 2), 6);
        assert_eq!(greens_bonus(&state, 1), 0);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Greens;
        }
        assert_eq!(greens_bonus(&state, 2), 8);

        if let Some(t) = state.turmoil.as_mut() {
            t.ruling = Party::Kelvinists;
        }
        assert_eq!(kelvinist_bonus(&state, 3), 9);
    }
}
