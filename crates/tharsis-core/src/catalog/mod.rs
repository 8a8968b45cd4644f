//! Card, corporation, and colony definitions compiled from yaml data.

mod effect;
mod loader;
mod types;

pub use effect::{ActionOption, ActionSpend, CardAction, CardEffect, Requirement};
pub use loader::{load_catalog, CatalogError, CatalogSource};
pub use types::{
    compile_catalog, CardCatalog, CardDef, ColonyDef, ColonyPayout, CorporationDef, RawCardDef,
    RawColonyDef, RawCorporationDef, TradeYield,
};
