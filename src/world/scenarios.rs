use crate::game::population::Scenario;

fn scenario(id: &str, name: &str, description: &str, effect: i32) -> Scenario {
    Scenario {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        effect,
    }
}

/// The six population pressures offered on the species page.
pub fn catalog() -> Vec<Scenario> {
    vec![
        scenario("poaching", "Poaching", "Illegal hunting reduces population", -15),
        scenario("habitat-loss", "Habitat Loss", "Deforestation and land conversion", -20),
        scenario(
            "climate-change",
            "Climate Change",
            "Altered weather patterns affect food sources",
            -10,
        ),
        scenario(
            "conservation",
            "Conservation Efforts",
            "Protected areas and anti-poaching patrols",
            25,
        ),
        scenario(
            "breeding-program",
            "Breeding Program",
            "Captive breeding and reintroduction",
            15,
        ),
        scenario(
            "disease",
            "Disease Outbreak",
            "Infectious disease spreads through population",
            -25,
        ),
    ]
}

/// Look up a scenario by id or (case-insensitive) display name.
pub fn find(key: &str) -> Option<Scenario> {
    catalog()
        .into_iter()
        .find(|s| s.id == key || s.name.eq_ignore_ascii_case(key))
}
