//! Built-in quiz banks, fact cards and challenge scripts for the two immersive scenes.

use std::collections::HashMap;

use crate::game::challenge::{ChallengeOption, ChallengeScript, ChallengeStep};
use crate::game::quiz::{QuizBank, QuizQuestion};
use crate::world::species::SpeciesInfo;

/// Static content paired with a [`crate::config::biome::BiomeConfig`].
#[derive(Debug, Clone, Default)]
pub struct BiomeContent {
    pub info: HashMap<String, SpeciesInfo>,
    pub quiz: QuizBank,
    pub challenge: ChallengeScript,
}

impl BiomeContent {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "ocean" => Some(ocean()),
            "temperate" => Some(temperate()),
            _ => None,
        }
    }
}

fn question(q: &str, options: &[&str], correct: &str) -> QuizQuestion {
    QuizQuestion {
        question: q.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct: correct.to_string(),
    }
}

fn option(label: &str, impact: i32, explain: &str) -> ChallengeOption {
    ChallengeOption {
        label: label.to_string(),
        impact,
        explain: explain.to_string(),
    }
}

fn step(id: &str, title: &str, prompt: &str, options: [ChallengeOption; 2]) -> ChallengeStep {
    ChallengeStep {
        id: id.to_string(),
        title: title.to_string(),
        prompt: prompt.to_string(),
        options: options.to_vec(),
    }
}

pub fn ocean() -> BiomeContent {
    let info = HashMap::from([
        (
            "turtle".to_string(),
            SpeciesInfo::new(
                "Green Sea Turtle (Chelonia mydas)",
                "Endangered",
                "Grazes seagrass and helps keep meadows healthy. Threats: bycatch, habitat loss, debris.",
                "https://www.iucnredlist.org/species/4615/11037468",
            ),
        ),
        (
            "shark".to_string(),
            SpeciesInfo::new(
                "Blacktip Reef Shark (Carcharhinus melanopterus)",
                "Near Threatened",
                "Key mesopredator on coral reefs. Pressures include overfishing and habitat loss.",
                "https://www.iucnredlist.org/species/39375/16523699",
            ),
        ),
        (
            "clownfish".to_string(),
            SpeciesInfo::new(
                "Clownfish (Amphiprioninae)",
                "Least Concern",
                "Lives with anemones; reef degradation and warming threaten local populations.",
                "https://www.iucnredlist.org/search?query=Amphiprion&searchType=species",
            ),
        ),
        (
            "manta".to_string(),
            SpeciesInfo::new(
                "Manta Ray (Mobula spp.)",
                "Vulnerable",
                "Gentle plankton-feeders; impacted by bycatch, targeted fishing and microplastics.",
                "https://www.iucnredlist.org/",
            ),
        ),
    ]);

    let quiz = QuizBank::new([
        ("turtle", question("Diet?", &["Herbivore", "Omnivore", "Carnivore"], "Herbivore")),
        (
            "shark",
            question(
                "Conservation status?",
                &["Least Concern", "Near Threatened", "Endangered"],
                "Near Threatened",
            ),
        ),
        ("clownfish", question("Lives with…", &["Coral", "Anemones", "Kelp"], "Anemones")),
        (
            "manta",
            question("Feeding style?", &["Bites prey", "Filter feeds", "Ambush"], "Filter feeds"),
        ),
    ]);

    let challenge = ChallengeScript::new(vec![
        step(
            "plastic",
            "Floating Plastics Detected",
            "A gyre is funneling debris toward your reef. What's your first action?",
            [
                option("Deploy cleanup drones", -2, "Removes surface plastics quickly."),
                option("Wait for currents to shift", 1, "Debris accumulates while you wait."),
            ],
        ),
        step(
            "runoff",
            "Coastal Runoff Spike",
            "Heavy rainfall flushed nutrients into the bay. Choose a mitigation:",
            [
                option("Open spillway & aerate", -1, "Improves oxygen, disperses bloom risk."),
                option("Close access & monitor only", 1, "Hypoxia risk increases."),
            ],
        ),
        step(
            "oil",
            "Minor Oil Sheen Offshore",
            "A small slick approaches. Best response now?",
            [
                option("Deploy booms & skimmers", -2, "Contains and removes oil quickly."),
                option("Issue advisory only", 2, "Sheen reaches habitat, stressing wildlife."),
            ],
        ),
    ]);

    BiomeContent { info, quiz, challenge }
}

pub fn temperate() -> BiomeContent {
    let info = HashMap::from([
        (
            "deer".to_string(),
            SpeciesInfo::new(
                "White-tailed Deer (Odocoileus virginianus)",
                "Least Concern",
                "Key herbivore; shape understory. Overabundance can hinder tree regeneration.",
                "https://www.iucnredlist.org/species/42394/22162006",
            ),
        ),
        (
            "fox".to_string(),
            SpeciesInfo::new(
                "Red Fox (Vulpes vulpes)",
                "Least Concern",
                "Omnivorous mesopredator controlling rodents; adapts well to edges.",
                "https://www.iucnredlist.org/species/23062/46190249",
            ),
        ),
        (
            "owl".to_string(),
            SpeciesInfo::new(
                "Great Horned Owl (Bubo virginianus)",
                "Least Concern",
                "Nocturnal apex bird; keeps small mammal populations in check.",
                "https://www.iucnredlist.org/species/22689055/93335852",
            ),
        ),
        (
            "bear".to_string(),
            SpeciesInfo::new(
                "American Black Bear (Ursus americanus)",
                "Least Concern",
                "Omnivore; seed disperser via fruit consumption; human conflict risks.",
                "https://www.iucnredlist.org/species/41687/114251609",
            ),
        ),
    ]);

    let quiz = QuizBank::new([
        ("deer", question("Primary diet?", &["Herbivore", "Carnivore", "Insectivore"], "Herbivore")),
        (
            "fox",
            question("Trophic role?", &["Producer", "Mesopredator", "Detritivore"], "Mesopredator"),
        ),
        ("owl", question("Active mostly…", &["Day", "Night", "Dawn only"], "Night")),
        (
            "bear",
            question(
                "Eats mostly…",
                &["Only meat", "Only plants", "Both plants & meat"],
                "Both plants & meat",
            ),
        ),
    ]);

    let challenge = ChallengeScript::new(vec![
        step(
            "litter",
            "Trail Litter Found",
            "Visitors left trash near the creek. What's your first response?",
            [
                option("Organize a quick cleanup", -1, "Removes hazards for wildlife fast."),
                option("Log it for later", 1, "Animals may ingest plastics meanwhile."),
            ],
        ),
        step(
            "runoff",
            "Fertilizer Runoff",
            "Rain washed farm fertilizer into the stream. Mitigate now?",
            [
                option("Install silt fences & buffer plants", -2, "Reduces nutrients into water."),
                option("Post a warning sign only", 1, "Algae & low oxygen risk increase."),
            ],
        ),
        step(
            "invasive",
            "Invasive Plant Spread",
            "A patch of garlic mustard spreads under oaks.",
            [
                option("Pull & bag invasives this week", -2, "Protects native understory."),
                option("Monitor for a month", 2, "Spread accelerates and displaces natives."),
            ],
        ),
    ]);

    BiomeContent { info, quiz, challenge }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::biome::BiomeConfig;

    #[test]
    fn every_preset_species_has_info_and_question() {
        for name in BiomeConfig::preset_names() {
            let biome = BiomeConfig::preset(name).unwrap();
            let content = BiomeContent::preset(name).unwrap();
            for s in &biome.species {
                assert!(content.info.contains_key(&s.id), "{} missing info", s.id);
                assert!(content.quiz.get(&s.id).is_some(), "{} missing quiz", s.id);
            }
            assert_eq!(content.challenge.len(), 3);
        }
    }

    #[test]
    fn quiz_answers_are_among_options() {
        for name in ["ocean", "temperate"] {
            let content = BiomeContent::preset(name).unwrap();
            for (id, q) in content.quiz.iter() {
                assert!(q.options.contains(&q.correct), "{}: answer not offered", id);
            }
        }
    }
}
