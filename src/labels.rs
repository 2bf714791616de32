//! Fixed identifier-to-label tables. An identifier missing from its table
//! has no label.

pub const TYPES: &[(&str, &str)] = &[
    ("normal", "Normal"),
    ("fighting", "Fighting"),
    ("flying", "Flying"),
    ("poison", "Poison"),
    ("ground", "Ground"),
    ("rock", "Rock"),
    ("bug", "Bug"),
    ("ghost", "Ghost"),
    ("steel", "Steel"),
    ("fire", "Fire"),
    ("water", "Water"),
    ("grass", "Grass"),
    ("electric", "Electric"),
    ("psychic", "Psychic"),
    ("ice", "Ice"),
    ("dragon", "Dragon"),
    ("dark", "Dark"),
    ("fairy", "Fairy"),
];

pub const GENERATIONS: &[(&str, &str)] = &[
    ("generation-i", "Generation I"),
    ("generation-ii", "Generation II"),
    ("generation-iii", "Generation III"),
    ("generation-iv", "Generation IV"),
    ("generation-v", "Generation V"),
    ("generation-vi", "Generation VI"),
    ("generation-vii", "Generation VII"),
    ("generation-viii", "Generation VIII"),
    ("generation-ix", "Generation IX"),
];

pub const GROWTH_RATES: &[(&str, &str)] = &[
    ("slow", "Slow"),
    ("medium", "Medium Fast"),
    ("fast", "Fast"),
    ("medium-slow", "Medium Slow"),
    ("slow-then-very-fast", "Erratic"),
    ("fast-then-very-slow", "Fluctuating"),
];

pub const COLORS: &[(&str, &str)] = &[
    ("black", "Black"),
    ("blue", "Blue"),
    ("brown", "Brown"),
    ("gray", "Gray"),
    ("green", "Green"),
    ("pink", "Pink"),
    ("purple", "Purple"),
    ("red", "Red"),
    ("white", "White"),
    ("yellow", "Yellow"),
];

pub const SHAPES: &[(&str, &str)] = &[
    ("ball", "Head"),
    ("squiggle", "Serpentine"),
    ("fish", "Fins"),
    ("arms", "Head and arms"),
    ("blob", "Head and base"),
    ("upright", "Bipedal, tailed"),
    ("legs", "Head and legs"),
    ("quadruped", "Quadruped"),
    ("wings", "Single pair of wings"),
    ("tentacles", "Tentacles"),
    ("heads", "Multiple bodies"),
    ("humanoid", "Bipedal, tailless"),
    ("bug-wings", "Two or more pairs of wings"),
    ("armor", "Insectoid"),
];

pub const EGG_GROUPS: &[(&str, &str)] = &[
    ("monster", "Monster"),
    ("water1", "Water 1"),
    ("bug", "Bug"),
    ("flying", "Flying"),
    ("ground", "Field"),
    ("fairy", "Fairy"),
    ("plant", "Grass"),
    ("humanshape", "Human-Like"),
    ("water3", "Water 3"),
    ("mineral", "Mineral"),
    ("indeterminate", "Amorphous"),
    ("water2", "Water 2"),
    ("ditto", "Ditto"),
    ("dragon", "Dragon"),
    ("no-eggs", "Undiscovered"),
];

pub fn label(table: &[(&str, &'static str)], id: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, label)| *label)
}

/// Looks up an optional identifier, owning the result for a row field.
pub fn label_of(table: &[(&str, &'static str)], id: Option<&str>) -> Option<String> {
    id.and_then(|id| label(table, id)).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_identifiers() {
        assert_eq!(label(TYPES, "grass"), Some("Grass"));
        assert_eq!(label(EGG_GROUPS, "plant"), Some("Grass"));
        assert_eq!(label(GROWTH_RATES, "medium-slow"), Some("Medium Slow"));
        assert_eq!(label(TYPES, "stellar"), None);
        assert_eq!(label_of(COLORS, None), None);
    }
}
