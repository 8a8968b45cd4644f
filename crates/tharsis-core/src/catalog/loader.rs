use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{compile_catalog, CardCatalog, RawCardDef, RawColonyDef, RawCorporationDef};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub enum CatalogSource<'a> {
    Embedded,
    Path(String),
    Bytes {
        cards: &'a [u8],
        corporations: &'a [u8],
        colonies: &'a [u8],
    },
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    cards: BTreeMap<String, RawCardDef>,
    corporations: BTreeMap<String, RawCorporationDef>,
    colonies: BTreeMap<String, RawColonyDef>,
}

pub fn load_catalog(source: CatalogSource<'_>) -> Result<CardCatalog, CatalogError> {
    let raw = match source {
        CatalogSource::Embedded => {
            let cards_yaml = include_str!("../../data/base/cards.yaml");
            let corporations_yaml = include_str!("../../data/base/corporations.yaml");
            let colonies_yaml = include_str!("../../data/base/colonies.yaml");
            parse_raw_catalog(cards_yaml, corporations_yaml, colonies_yaml)?
        }
        CatalogSource::Path(path) => {
            let cards_yaml = std::fs::read_to_string(format!("{path}/cards.yaml"))?;
            let corporations_yaml = std::fs::read_to_string(format!("{path}/corporations.yaml"))?;
            let colonies_yaml = std::fs::read_to_string(format!("{path}/colonies.yaml"))?;
            parse_raw_catalog(&cards_yaml, &corporations_yaml, &colonies_yaml)?
        }
        CatalogSource::Bytes {
            cards,
            corporations,
            colonies,
        } => parse_raw_catalog(
            std::str::from_utf8(cards)?,
            std::str::from_utf8(corporations)?,
            std::str::from_utf8(colonies)?,
        )?,
    };

    Ok(compile_catalog(raw.cards, raw.corporations, raw.colonies))
}

fn parse_raw_catalog(
    cards_yaml: &str,
    corporations_yaml: &str,
    colonies_yaml: &str,
) -> Result<RawCatalog, CatalogError> {
    let cards = serde_yaml::from_str(cards_yaml)?;
    let corporations = serde_yaml::from_str(corporations_yaml)?;
    let colonies = serde_yaml::from_str(colonies_yaml)?;
    Ok(RawCatalog {
        cards,
        corporations,
        colonies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tharsis_protocol::{CardResource, Tag};

    #[test]
    fn embedded_catalog_loads() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        assert!(catalog.cards.len() >= 36);
        assert_eq!(catalog.corporations.len(), 10);
        assert_eq!(catalog.colonies.len(), 6);
    }

    #[test]
    fn name_lookups_agree_with_tables() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        for (name, id) in &catalog.card_ids {
            assert_eq!(&catalog.card(*id).name, name);
        }
        for (name, id) in &catalog.corporation_ids {
            assert_eq!(&catalog.corporation(*id).name, name);
        }
        for (name, id) in &catalog.colony_ids {
            assert_eq!(&catalog.colony(*id).name, name);
        }
    }

    #[test]
    fn heat_variant_corporation_present() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let heliacs: Vec<_> = catalog
            .corporations
            .iter()
            .filter(|c| c.heat_for_credits)
            .collect();
        assert_eq!(heliacs.len(), 1);
        assert_eq!(heliacs[0].name, "Helion");
    }

    #[test]
    fn floater_colony_requires_collector() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let id = catalog.colony_id("Titan").expect("Titan exists");
        assert_eq!(
            catalog.colony(id).requires_collector,
            Some(CardResource::Floater)
        );
    }

    #[test]
    fn catalog_covers_tagged_requirements() {
        let catalog = load_catalog(CatalogSource::Embedded).expect("catalog load");
        let with_tag_reqs = catalog
            .cards
            .iter()
            .filter(|c| !c.requirement.tags.is_empty())
            .count();
        assert!(with_tag_reqs >= 1);

        let building_discounters = catalog.cards.iter().any(|c| {
            c.effects.iter().any(|e| {
                matches!(
                    e,
                    crate::catalog::CardEffect::Discount {
                        tag: Some(Tag::Space),
                        ..
                    }
                )
            })
        });
        assert!(building_discounters);
    }
}
