use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink};
use crate::cache::{Caches, GrowthRateListing, SpeciesListing};
use crate::catalog::CatalogClient;
use crate::error::DexError;
use crate::fetcher::{BatchFetcher, fetch_cached};
use crate::model::{Ability, Form, ListQuery, NamedPage, Species, Variant, localized_name};

/// Growth-rate list page size; the catalog defines a handful of curves.
const GROWTH_RATE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbilityInfo {
    pub display_name: String,
    pub short_effect: String,
}

impl AbilityInfo {
    pub fn from_ability(ability: &Ability, language: &str) -> Self {
        let display_name = localized_name(&ability.names, language)
            .unwrap_or(&ability.name)
            .to_string();
        let short_effect = ability
            .effect_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| entry.short_effect.clone())
            .unwrap_or_default();
        Self {
            display_name,
            short_effect,
        }
    }
}

/// Normalized lookup tables for projection.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// In species-list order.
    pub species: Vec<Species>,
    /// Species name to its variants, in variety order.
    pub variants: HashMap<String, Vec<Variant>>,
    /// Variant name to its forms, in form-reference order.
    pub forms: HashMap<String, Vec<Form>>,
    pub abilities: HashMap<String, AbilityInfo>,
    /// Growth-rate name to experience at level 100.
    pub growth_rates: HashMap<String, u32>,
}

type SpeciesSide = (
    Vec<Species>,
    HashMap<String, Vec<Variant>>,
    HashMap<String, Vec<Form>>,
    HashMap<String, AbilityInfo>,
);

pub struct Resolver<'r, C> {
    client: &'r C,
    caches: &'r Caches,
    fetcher: &'r BatchFetcher,
    language: &'r str,
    species_limit: u32,
}

impl<'r, C: CatalogClient> Resolver<'r, C> {
    pub fn new(
        client: &'r C,
        caches: &'r Caches,
        fetcher: &'r BatchFetcher,
        language: &'r str,
        species_limit: u32,
    ) -> Self {
        Self {
            client,
            caches,
            fetcher,
            language,
            species_limit,
        }
    }

    pub async fn resolve(&self, sink: &dyn ProgressSink) -> Result<Catalog, DexError> {
        let ((species, variants, forms, abilities), growth_rates) =
            futures::try_join!(self.resolve_species_side(sink), self.resolve_growth_rates(sink))?;

        Ok(Catalog {
            species,
            variants,
            forms,
            abilities,
            growth_rates,
        })
    }

    async fn resolve_species_side(&self, sink: &dyn ProgressSink) -> Result<SpeciesSide, DexError> {
        let species = self.resolve_species(sink).await?;
        let variants = self.resolve_variants(&species, sink).await?;
        let forms = self.resolve_forms(&species, &variants, sink).await?;
        let abilities = self.resolve_abilities(&variants, sink).await?;
        Ok((species, variants, forms, abilities))
    }

    async fn resolve_species(&self, sink: &dyn ProgressSink) -> Result<Vec<Species>, DexError> {
        let start = Instant::now();
        let client = self.client;
        let first = [ListQuery {
            limit: self.species_limit,
            offset: 0,
        }];
        let mut pages = self
            .fetcher
            .run_cached(&self.caches.species_list, &first, move |query| async move {
                client.list_species(query).await.map(SpeciesListing)
            })
            .await?;

        let total = pages.first().map(|page| page.0.count).unwrap_or(0);
        let rest = remaining_pages(total, self.species_limit);
        pages.extend(
            self.fetcher
                .run_cached(&self.caches.species_list, &rest, move |query| async move {
                    client.list_species(query).await.map(SpeciesListing)
                })
                .await?,
        );

        let names = page_names(pages.iter().map(|page| &page.0));
        let species = self
            .fetcher
            .run_cached(&self.caches.species, &names, move |name| async move {
                client.species(name).await
            })
            .await?;

        info!(species = species.len(), "species resolved");
        sink.event(ProgressEvent {
            message: format!("phase=Species; resolved {} species", species.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(species)
    }

    async fn resolve_variants(
        &self,
        species: &[Species],
        sink: &dyn ProgressSink,
    ) -> Result<HashMap<String, Vec<Variant>>, DexError> {
        let start = Instant::now();
        let client = self.client;
        let names: Vec<String> = species
            .iter()
            .flat_map(|entry| {
                entry
                    .varieties
                    .iter()
                    .map(|variety| variety.pokemon.name.clone())
            })
            .collect();
        let fetched = self
            .fetcher
            .run_cached(&self.caches.variants, &names, move |name| async move {
                client.pokemon(name).await
            })
            .await?;

        let mut fetched = fetched.into_iter();
        let mut by_species = HashMap::with_capacity(species.len());
        for entry in species {
            let owned: Vec<Variant> = fetched.by_ref().take(entry.varieties.len()).collect();
            by_species.insert(entry.name.clone(), owned);
        }

        info!(variants = names.len(), "variants resolved");
        sink.event(ProgressEvent {
            message: format!("phase=Variants; resolved {} variants", names.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(by_species)
    }

    async fn resolve_forms(
        &self,
        species: &[Species],
        variants: &HashMap<String, Vec<Variant>>,
        sink: &dyn ProgressSink,
    ) -> Result<HashMap<String, Vec<Form>>, DexError> {
        let start = Instant::now();
        let client = self.client;
        let ordered = ordered_variants(species, variants);
        let names: Vec<String> = ordered
            .iter()
            .flat_map(|variant| variant.forms.iter().map(|form| form.name.clone()))
            .collect();
        let fetched = self
            .fetcher
            .run_cached(&self.caches.forms, &names, move |name| async move {
                client.pokemon_form(name).await
            })
            .await?;

        let mut fetched = fetched.into_iter();
        let mut by_variant = HashMap::with_capacity(ordered.len());
        for variant in ordered {
            let owned: Vec<Form> = fetched.by_ref().take(variant.forms.len()).collect();
            by_variant.insert(variant.name.clone(), owned);
        }

        info!(forms = names.len(), "forms resolved");
        sink.event(ProgressEvent {
            message: format!("phase=Forms; resolved {} forms", names.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(by_variant)
    }

    async fn resolve_abilities(
        &self,
        variants: &HashMap<String, Vec<Variant>>,
        sink: &dyn ProgressSink,
    ) -> Result<HashMap<String, AbilityInfo>, DexError> {
        let start = Instant::now();
        let client = self.client;
        let cache = &self.caches.abilities;
        let language = self.language;
        let unique: BTreeSet<&str> = variants
            .values()
            .flatten()
            .flat_map(|variant| variant.abilities.iter())
            .map(|slot| slot.ability.name.as_str())
            .collect();
        let names: Vec<String> = unique.into_iter().map(str::to_string).collect();

        let abilities = self
            .fetcher
            .run_map(&names, Some(cache.stats()), move |_, name| async move {
                let ability = fetch_cached(cache, name, || client.ability(name)).await?;
                Ok(Some(AbilityInfo::from_ability(&ability, language)))
            })
            .await?;

        info!(abilities = abilities.len(), "abilities resolved");
        sink.event(ProgressEvent {
            message: format!("phase=Abilities; resolved {} abilities", abilities.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(abilities)
    }

    async fn resolve_growth_rates(
        &self,
        sink: &dyn ProgressSink,
    ) -> Result<HashMap<String, u32>, DexError> {
        let start = Instant::now();
        let client = self.client;
        let query = [ListQuery {
            limit: GROWTH_RATE_LIMIT,
            offset: 0,
        }];
        let pages = self
            .fetcher
            .run_cached(&self.caches.growth_rate_list, &query, move |query| async move {
                client.list_growth_rates(query).await.map(GrowthRateListing)
            })
            .await?;

        let names = page_names(pages.iter().map(|page| &page.0));
        let rates = self
            .fetcher
            .run_cached(&self.caches.growth_rates, &names, move |name| async move {
                client.growth_rate(name).await
            })
            .await?;

        let table: HashMap<String, u32> = rates
            .iter()
            .map(|rate| (rate.name.clone(), rate.max_experience()))
            .collect();

        info!(growth_rates = table.len(), "growth rates resolved");
        sink.event(ProgressEvent {
            message: format!("phase=GrowthRates; resolved {} growth rates", table.len()),
            elapsed: Some(start.elapsed()),
        });
        Ok(table)
    }
}

/// Variants flattened in species order, then variety order.
fn ordered_variants<'a>(
    species: &'a [Species],
    variants: &'a HashMap<String, Vec<Variant>>,
) -> Vec<&'a Variant> {
    species
        .iter()
        .filter_map(|entry| variants.get(&entry.name))
        .flatten()
        .collect()
}

/// Queries for the pages after the first, given the reported total.
fn remaining_pages(total: u32, limit: u32) -> Vec<ListQuery> {
    (1..total.div_ceil(limit))
        .map(|page| ListQuery {
            limit,
            offset: page * limit,
        })
        .collect()
}

fn page_names<'a>(pages: impl Iterator<Item = &'a NamedPage>) -> Vec<String> {
    pages
        .flat_map(|page| page.results.iter().map(|entry| entry.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EffectEntry, LocalizedName, NamedResource};

    #[test]
    fn remaining_pages_cover_the_total() {
        assert!(remaining_pages(1025, 10_000).is_empty());
        assert!(remaining_pages(0, 10).is_empty());
        let pages = remaining_pages(25, 10);
        assert_eq!(
            pages,
            vec![
                ListQuery {
                    limit: 10,
                    offset: 10
                },
                ListQuery {
                    limit: 10,
                    offset: 20
                },
            ]
        );
    }

    #[test]
    fn ability_info_falls_back_to_identifier() {
        let ability = Ability {
            id: 65,
            name: "overgrow".to_string(),
            names: vec![LocalizedName {
                name: "Notdünger".to_string(),
                language: NamedResource::new("de"),
            }],
            effect_entries: vec![EffectEntry {
                effect: String::new(),
                short_effect: "Strengthens grass moves.".to_string(),
                language: NamedResource::new("en"),
            }],
        };
        let info = AbilityInfo::from_ability(&ability, "en");
        assert_eq!(info.display_name, "overgrow");
        assert_eq!(info.short_effect, "Strengthens grass moves.");

        let german = AbilityInfo::from_ability(&ability, "de");
        assert_eq!(german.display_name, "Notdünger");
        assert_eq!(german.short_effect, "");
    }
}
