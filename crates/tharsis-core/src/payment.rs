//! Two-phase payment resolution. A context computed from the cost's nature
//! decides which resource kinds may pay at what value; resolution then
//! either auto-allocates (single usable kind), demands an explicit
//! allocation (ambiguous), or validates the explicit one.

use tharsis_protocol::{Payment, ResourceSet, Tag};

use crate::catalog::{CardCatalog, CardDef};
use crate::error::ActionError;
use crate::state::{GameState, Player};
use crate::turmoil;

pub const TRADE_COST_CREDITS: u32 = 9;
pub const TRADE_COST_ENERGY: u32 = 3;
pub const TRADE_COST_TITANIUM: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentContext {
    pub steel_usable: bool,
    pub titanium_usable: bool,
    pub heat_usable: bool,
    pub steel_value: u32,
    pub titanium_value: u32,
}

fn corp_spends_heat(catalog: &CardCatalog, player: &Player) -> bool {
    player
        .corporation
        .map(|id| catalog.corporation(id).heat_for_credits)
        .unwrap_or(false)
}

/// Context for playing a project card: steel pays on building tags,
/// titanium on space tags, at the current ruling-adjusted values.
pub fn card_context(
    state: &GameState,
    catalog: &CardCatalog,
    player: &Player,
    card: &CardDef,
) -> PaymentContext {
    PaymentContext {
        steel_usable: card.has_tag(Tag::Building),
        titanium_usable: card.has_tag(Tag::Space),
        heat_usable: corp_spends_heat(catalog, player),
        steel_value: turmoil::steel_value(state),
        titanium_value: turmoil::titanium_value(state),
    }
}

/// Context for credit-denominated costs (standard projects, milestones,
/// awards, colonies, delegates): metals stay in the warehouse.
pub fn credits_context(
    state: &GameState,
    catalog: &CardCatalog,
    player: &Player,
) -> PaymentContext {
    PaymentContext {
        steel_usable: false,
        titanium_usable: false,
        heat_usable: corp_spends_heat(catalog, player),
        steel_value: turmoil::steel_value(state),
        titanium_value: turmoil::titanium_value(state),
    }
}

/// Resolves a payment for `cost` against the player's holdings.
///
/// Without an explicit allocation the resolution only proceeds when a
/// single usable kind is held; holding two or more usable kinds makes the
/// allocation the player's call and yields `AmbiguousPayment`.
pub fn resolve(
    cost: u32,
    holdings: &ResourceSet,
    ctx: &PaymentContext,
    explicit: Option<&Payment>,
) -> Result<Payment, ActionError> {
    if cost == 0 {
        if explicit.is_some_and(|p| !p.is_empty()) {
            return Err(ActionError::ExcessivePayment);
        }
        return Ok(Payment::default());
    }

    if let Some(payment) = explicit {
        return validate(cost, holdings, ctx, payment);
    }

    let mut usable: Vec<(u32, u32)> = Vec::new(); // (held, unit value)
    if holdings.credits > 0 {
        usable.push((holdings.credits, 1));
    }
    if ctx.steel_usable && holdings.steel > 0 {
        usable.push((holdings.steel, ctx.steel_value));
    }
    if ctx.titanium_usable && holdings.titanium > 0 {
        usable.push((holdings.titanium, ctx.titanium_value));
    }
    if ctx.heat_usable && holdings.heat > 0 {
        usable.push((holdings.heat, 1));
    }

    match usable.len() {
        0 => Err(ActionError::CannotAfford { cost }),
        1 => {
            let (held, unit) = usable[0];
            let needed = cost.div_ceil(unit);
            if held < needed {
                return Err(ActionError::CannotAfford { cost });
            }
            let mut payment = Payment::default();
            if holdings.credits > 0 {
                payment.credits = needed;
            } else if ctx.steel_usable && holdings.steel > 0 {
                payment.steel = needed;
            } else if ctx.titanium_usable && holdings.titanium > 0 {
                payment.titanium = needed;
            } else {
                payment.heat = needed;
            }
            Ok(payment)
        }
        _ => Err(ActionError::AmbiguousPayment),
    }
}

fn validate(
    cost: u32,
    holdings: &ResourceSet,
    ctx: &PaymentContext,
    payment: &Payment,
) -> Result<Payment, ActionError> {
    if payment.energy > 0 {
        return Err(ActionError::UnusableResource);
    }
    if payment.steel > 0 && !ctx.steel_usable {
        return Err(ActionError::UnusableResource);
    }
    if payment.titanium > 0 && !ctx.titanium_usable {
        return Err(ActionError::UnusableResource);
    }
    if payment.heat > 0 && !ctx.heat_usable {
        return Err(ActionError::UnusableResource);
    }
    if payment.credits > holdings.credits
        || payment.steel > holdings.steel
        || payment.titanium > holdings.titanium
        || payment.heat > holdings.heat
    {
        return Err(ActionError::PaymentExceedsStock);
    }

    let value = payment.value(ctx.steel_value, ctx.titanium_value);
    if value < cost {
        return Err(ActionError::PaymentShort { cost });
    }

    // Overshoot is tolerated only up to the coarsest non-credit unit spent;
    // change is never returned.
    let overshoot = value - cost;
    let mut unit_floor = None;
    if payment.steel > 0 {
        unit_floor = Some(ctx.steel_value);
    }
    if payment.titanium > 0 {
        unit_floor = Some(unit_floor.map_or(ctx.titanium_value, |u: u32| u.min(ctx.titanium_value)));
    }
    if payment.heat > 0 {
        unit_floor = Some(unit_floor.map_or(1, |u: u32| u.min(1)));
    }
    let allowed = unit_floor.map_or(0, |u| u.saturating_sub(1));
    if overshoot > allowed {
        return Err(ActionError::ExcessivePayment);
    }

    Ok(payment.clone())
}

/// Trade is paid with one of three fixed allocations: 9 credits, 3 energy
/// or 3 titanium. Credits may mix with heat for the corporation that spends
/// heat as credits; the bundles never mix with each other.
pub fn resolve_trade(
    holdings: &ResourceSet,
    heat_ok: bool,
    explicit: Option<&Payment>,
) -> Result<Payment, ActionError> {
    if let Some(payment) = explicit {
        return validate_trade(holdings, heat_ok, payment);
    }

    let credit_pool = holdings.credits + if heat_ok { holdings.heat } else { 0 };
    let credits_ok = credit_pool >= TRADE_COST_CREDITS;
    let energy_ok = holdings.energy >= TRADE_COST_ENERGY;
    let titanium_ok = holdings.titanium >= TRADE_COST_TITANIUM;

    match (credits_ok, energy_ok, titanium_ok) {
        (false, false, false) => Err(ActionError::CannotAfford {
            cost: TRADE_COST_CREDITS,
        }),
        (true, false, false) => {
            let credits = holdings.credits.min(TRADE_COST_CREDITS);
            Ok(Payment {
                credits,
                heat: TRADE_COST_CREDITS - credits,
                ..Payment::default()
            })
        }
        (false, true, false) => Ok(Payment {
            energy: TRADE_COST_ENERGY,
            ..Payment::default()
        }),
        (false, false, true) => Ok(Payment {
            titanium: TRADE_COST_TITANIUM,
            ..Payment::default()
        }),
        _ => Err(ActionError::AmbiguousPayment),
    }
}

fn validate_trade(
    holdings: &ResourceSet,
    heat_ok: bool,
    payment: &Payment,
) -> Result<Payment, ActionError> {
    if payment.steel > 0 {
        return Err(ActionError::UnusableResource);
    }
    if payment.heat > 0 && !heat_ok {
        return Err(ActionError::UnusableResource);
    }
    let credits_group = payment.credits + payment.heat;
    let groups_used = [credits_group > 0, payment.energy > 0, payment.titanium > 0]
        .into_iter()
        .filter(|used| *used)
        .count();
    if groups_used != 1 {
        return Err(ActionError::UnusableResource);
    }
    if payment.credits > holdings.credits
        || payment.energy > holdings.energy
        || payment.titanium > holdings.titanium
        || payment.heat > holdings.heat
    {
        return Err(ActionError::PaymentExceedsStock);
    }

    let (paid, due) = if credits_group > 0 {
        (credits_group, TRADE_COST_CREDITS)
    } else if payment.energy > 0 {
        (payment.energy, TRADE_COST_ENERGY)
    } else {
        (payment.titanium, TRADE_COST_TITANIUM)
    };
    if paid < due {
        return Err(ActionError::PaymentShort { cost: due });
    }
    if paid > due {
        return Err(ActionError::ExcessivePayment);
    }
    Ok(payment.clone())
}

/// Removes a resolved payment from the holdings. False when any kind is
/// short, which after a guard approval indicates an engine defect.
pub fn debit_payment(holdings: &mut ResourceSet, payment: &Payment) -> bool {
    use tharsis_protocol::ResourceKind::*;
    holdings.debit(Credits, payment.credits)
        && holdings.debit(Steel, payment.steel)
        && holdings.debit(Titanium, payment.titanium)
        && holdings.debit(Energy, payment.energy)
        && holdings.debit(Heat, payment.heat)
}
