use std::collections::HashMap;

use serde::Serialize;

use crate::labels::{self, COLORS, EGG_GROUPS, GENERATIONS, GROWTH_RATES, SHAPES, TYPES};
use crate::model::{AbilitySlot, Form, NamedResource, Species, Variant, localized_name};
use crate::resolver::{AbilityInfo, Catalog};

pub const STAT_KINDS: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

/// One exported row per (species, variant). Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Row {
    pub dex_id: u32,
    pub species: String,
    pub variant: String,
    pub variant_id: u32,
    pub name: Option<String>,
    pub is_default: bool,
    pub category: Category,
    pub generation: Option<String>,
    pub type1: Option<String>,
    pub type2: Option<String>,
    pub ability1: Option<String>,
    pub ability1_description: Option<String>,
    pub ability2: Option<String>,
    pub ability2_description: Option<String>,
    pub ability_hidden: Option<String>,
    pub ability_hidden_description: Option<String>,
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
    pub total: u32,
    pub ev_hp: u32,
    pub ev_attack: u32,
    pub ev_defense: u32,
    pub ev_special_attack: u32,
    pub ev_special_defense: u32,
    pub ev_speed: u32,
    /// Meters.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    pub base_experience: Option<u32>,
    pub capture_rate: u32,
    pub base_happiness: Option<u32>,
    pub hatch_counter: Option<u32>,
    pub gender_female: Option<f64>,
    pub gender_male: Option<f64>,
    pub genderless: bool,
    pub growth_rate: Option<String>,
    pub experience_max: Option<u32>,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub egg_group1: Option<String>,
    pub egg_group2: Option<String>,
    pub genus: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Baby,
    Legendary,
    Mythical,
    Ordinary,
}

impl Category {
    /// Baby, then legendary, then mythical.
    pub fn of(species: &Species) -> Self {
        if species.is_baby {
            Category::Baby
        } else if species.is_legendary {
            Category::Legendary
        } else if species.is_mythical {
            Category::Mythical
        } else {
            Category::Ordinary
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderSplit {
    pub female: Option<f64>,
    pub male: Option<f64>,
    pub genderless: bool,
}

/// `rate` is the female chance in eighths; -1 marks a genderless species.
pub fn gender_split(rate: i32) -> GenderSplit {
    if rate < 0 {
        return GenderSplit {
            female: None,
            male: None,
            genderless: rate == -1,
        };
    }
    let female = f64::from(rate) / 8.0 * 100.0;
    GenderSplit {
        female: Some(female),
        male: Some(100.0 - female),
        genderless: false,
    }
}

/// Decimeters or hectograms to meters or kilograms.
pub fn tenths(value: u32) -> f64 {
    f64::from(value) / 10.0
}

/// Table hit, else the raw identifier, else empty.
pub fn resolve_display<V>(
    table: &HashMap<String, V>,
    key: &str,
    raw: Option<&str>,
    field: impl Fn(&V) -> &str,
) -> String {
    table
        .get(key)
        .map(field)
        .or(raw)
        .unwrap_or_default()
        .to_string()
}

pub fn project(catalog: &Catalog, language: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    for species in &catalog.species {
        let Some(variants) = catalog.variants.get(&species.name) else {
            continue;
        };
        for variant in variants {
            let forms = catalog
                .forms
                .get(&variant.name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            rows.push(project_row(catalog, species, variant, forms, language));
        }
    }
    rows
}

fn project_row(
    catalog: &Catalog,
    species: &Species,
    variant: &Variant,
    forms: &[Form],
    language: &str,
) -> Row {
    // Slots are positional as returned; the hidden one may also be ability2.
    let slots = &variant.abilities;
    let (ability1, ability1_description) =
        project_ability(&catalog.abilities, slot_name(slots.first()));
    let (ability2, ability2_description) =
        project_ability(&catalog.abilities, slot_name(slots.get(1)));
    let (ability_hidden, ability_hidden_description) = project_ability(
        &catalog.abilities,
        slot_name(slots.iter().find(|slot| slot.is_hidden)),
    );

    let [hp, attack, defense, special_attack, special_defense, speed] =
        STAT_KINDS.map(|kind| stat(variant, kind).0);
    let [ev_hp, ev_attack, ev_defense, ev_special_attack, ev_special_defense, ev_speed] =
        STAT_KINDS.map(|kind| stat(variant, kind).1);

    let gender = gender_split(species.gender_rate);
    let growth_name = reference_name(&species.growth_rate);
    let type_label = |index: usize| {
        labels::label_of(TYPES, variant.types.get(index).map(|slot| slot.kind.name.as_str()))
    };
    let egg_group = |index: usize| {
        labels::label_of(
            EGG_GROUPS,
            species.egg_groups.get(index).map(|group| group.name.as_str()),
        )
    };

    Row {
        dex_id: species.id,
        species: species.name.clone(),
        variant: variant.name.clone(),
        variant_id: variant.id,
        name: display_name(species, variant, forms, language),
        is_default: variant.is_default,
        category: Category::of(species),
        generation: labels::label_of(GENERATIONS, reference_name(&species.generation)),
        type1: type_label(0),
        type2: type_label(1),
        ability1,
        ability1_description,
        ability2,
        ability2_description,
        ability_hidden,
        ability_hidden_description,
        hp,
        attack,
        defense,
        special_attack,
        special_defense,
        speed,
        total: hp + attack + defense + special_attack + special_defense + speed,
        ev_hp,
        ev_attack,
        ev_defense,
        ev_special_attack,
        ev_special_defense,
        ev_speed,
        height: tenths(variant.height),
        weight: tenths(variant.weight),
        base_experience: variant.base_experience,
        capture_rate: species.capture_rate,
        base_happiness: species.base_happiness,
        hatch_counter: species.hatch_counter,
        gender_female: gender.female,
        gender_male: gender.male,
        genderless: gender.genderless,
        growth_rate: labels::label_of(GROWTH_RATES, growth_name),
        experience_max: growth_name.and_then(|name| catalog.growth_rates.get(name).copied()),
        color: labels::label_of(COLORS, reference_name(&species.color)),
        shape: labels::label_of(SHAPES, reference_name(&species.shape)),
        egg_group1: egg_group(0),
        egg_group2: egg_group(1),
        genus: species
            .genera
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| entry.genus.clone()),
    }
}

/// The default variant takes the species name; any other variant takes its
/// default form's name.
fn display_name(
    species: &Species,
    variant: &Variant,
    forms: &[Form],
    language: &str,
) -> Option<String> {
    if variant.is_default || variant.name == species.name {
        return localized_name(&species.names, language).map(str::to_string);
    }
    forms
        .iter()
        .find(|form| form.is_default)
        .and_then(|form| localized_name(&form.names, language))
        .map(str::to_string)
}

fn project_ability(
    table: &HashMap<String, AbilityInfo>,
    name: Option<&str>,
) -> (Option<String>, Option<String>) {
    match name {
        Some(name) => (
            Some(resolve_display(table, name, Some(name), |info| info.display_name.as_str())),
            Some(resolve_display(table, name, None, |info| info.short_effect.as_str())),
        ),
        None => (None, None),
    }
}

fn slot_name(slot: Option<&AbilitySlot>) -> Option<&str> {
    slot.map(|slot| slot.ability.name.as_str())
}

fn reference_name(reference: &Option<NamedResource>) -> Option<&str> {
    reference.as_ref().map(|value| value.name.as_str())
}

/// Base value and effort yield, looked up by stat identifier.
fn stat(variant: &Variant, kind: &str) -> (u32, u32) {
    variant
        .stats
        .iter()
        .find(|entry| entry.stat.name == kind)
        .map(|entry| (entry.base_stat, entry.effort))
        .unwrap_or((0, 0))
}
