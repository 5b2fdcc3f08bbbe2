use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::steering::motion::MotionClass;
use crate::steering::spawn::EntryDirection;

/// Half-extents of the playable volume, centred on the origin horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub x: f32,
    pub z: f32,
    pub y_top: f32,
    pub y_bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryWeight {
    pub direction: EntryDirection,
    pub weight: f32,
}

/// Motion table for one species in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub id: String,
    pub label: String,
    pub motion: MotionClass,
    pub base_y: f32,
    pub turn_jitter: f32,
    pub bob_amp: f32,
    pub bob_freq: f32,
    /// Maximum bank angle in radians. Only gliders bank.
    #[serde(default)]
    pub bank_amount: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub entry_weights: Vec<EntryWeight>,
    /// Seconds after scene start before the agent first appears.
    /// Absent means a uniform draw from 0..5.
    #[serde(default)]
    pub spawn_delay: Option<f32>,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

/// Everything the steering engine needs to populate one immersive scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeConfig {
    pub name: String,
    pub bounds: WorldBounds,
    pub despawn_margin: f32,
    pub species: Vec<SpeciesConfig>,
}

impl BiomeConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: BiomeConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in scene tables by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "ocean" => Some(ocean()),
            "temperate" => Some(temperate()),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["ocean", "temperate"]
    }

    pub fn species(&self, id: &str) -> Option<&SpeciesConfig> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        let b = &self.bounds;
        if ![b.x, b.z, b.y_top, b.y_bottom].iter().all(|v| v.is_finite()) {
            errors.push(format!(
                "bounds must be finite, got x={} z={} y_top={} y_bottom={}",
                b.x, b.z, b.y_top, b.y_bottom
            ));
        } else if b.x <= 0.0 || b.z <= 0.0 {
            errors.push(format!(
                "bounds.x and bounds.z must be > 0.0, got x={} z={}",
                b.x, b.z
            ));
        }
        if b.y_bottom >= b.y_top {
            errors.push(format!(
                "bounds.y_bottom must be below bounds.y_top, got {} >= {}",
                b.y_bottom, b.y_top
            ));
        }
        if !(self.despawn_margin >= 0.0 && self.despawn_margin.is_finite()) {
            errors.push(format!(
                "despawn_margin must be finite and >= 0.0, got {}",
                self.despawn_margin
            ));
        }
        if self.species.is_empty() {
            errors.push("species must list at least one entry".to_string());
        }

        let mut seen = HashSet::new();
        for s in &self.species {
            if !seen.insert(s.id.as_str()) {
                errors.push(format!("species id '{}' appears more than once", s.id));
            }
            for (field, value) in [
                ("base_y", s.base_y),
                ("turn_jitter", s.turn_jitter),
                ("bob_amp", s.bob_amp),
                ("bob_freq", s.bob_freq),
                ("bank_amount", s.bank_amount),
            ] {
                if !value.is_finite() {
                    errors.push(format!("{}: {} must be finite, got {}", s.id, field, value));
                }
            }
            if !(s.min_speed > 0.0 && s.min_speed <= s.max_speed && s.max_speed.is_finite()) {
                errors.push(format!(
                    "{}: speed range must be finite with 0 < min_speed <= max_speed, got {}..{}",
                    s.id, s.min_speed, s.max_speed
                ));
            }
            if s.entry_weights.is_empty() {
                errors.push(format!("{}: entry_weights must not be empty", s.id));
            }
            if s.entry_weights.iter().any(|w| w.weight < 0.0 || !w.weight.is_finite()) {
                errors.push(format!("{}: entry weights must be finite and >= 0.0", s.id));
            } else if !s.entry_weights.is_empty()
                && s.entry_weights.iter().map(|w| w.weight).sum::<f32>() <= 0.0
            {
                errors.push(format!("{}: entry weights must sum to > 0.0", s.id));
            }
            if let Some(delay) = s.spawn_delay {
                if !(delay >= 0.0 && delay.is_finite()) {
                    errors.push(format!(
                        "{}: spawn_delay must be finite and >= 0.0, got {}",
                        s.id, delay
                    ));
                }
            }
            if s.bank_amount < 0.0 {
                errors.push(format!("{}: bank_amount must be >= 0.0", s.id));
            }
            if !(s.scale > 0.0 && s.scale.is_finite()) {
                errors.push(format!("{}: scale must be finite and > 0.0, got {}", s.id, s.scale));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

fn weights(table: &[(EntryDirection, f32)]) -> Vec<EntryWeight> {
    table
        .iter()
        .map(|&(direction, weight)| EntryWeight { direction, weight })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn species(
    id: &str,
    label: &str,
    motion: MotionClass,
    base_y: f32,
    turn_jitter: f32,
    (bob_amp, bob_freq): (f32, f32),
    (min_speed, max_speed): (f32, f32),
    entries: &[(EntryDirection, f32)],
    spawn_delay: f32,
    scale: f32,
) -> SpeciesConfig {
    SpeciesConfig {
        id: id.to_string(),
        label: label.to_string(),
        motion,
        base_y,
        turn_jitter,
        bob_amp,
        bob_freq,
        bank_amount: 0.0,
        min_speed,
        max_speed,
        entry_weights: weights(entries),
        spawn_delay: Some(spawn_delay),
        scale,
    }
}

/// Reef scene: four free swimmers.
pub fn ocean() -> BiomeConfig {
    use EntryDirection::*;
    use MotionClass::Swim;

    BiomeConfig {
        name: "ocean".to_string(),
        bounds: WorldBounds {
            x: 42.0,
            z: 42.0,
            y_top: 12.0,
            y_bottom: -18.0,
        },
        despawn_margin: 12.0,
        species: vec![
            species(
                "turtle",
                "Green Turtle",
                Swim,
                -3.6,
                0.25,
                (0.12, 0.7),
                (0.55, 1.0),
                &[(DeepToSurface, 6.0), (LeftToRight, 2.0), (RightToLeft, 2.0), (DiagonalUp, 1.0)],
                0.0,
                0.25,
            ),
            species(
                "shark",
                "Reef Shark",
                Swim,
                -3.8,
                0.45,
                (0.08, 1.1),
                (1.0, 1.6),
                &[(LeftToRight, 5.0), (RightToLeft, 5.0), (DiagonalUp, 1.0), (DiagonalDown, 1.0)],
                4.0,
                0.35,
            ),
            species(
                "clownfish",
                "Clownfish",
                Swim,
                -3.2,
                0.7,
                (0.1, 1.5),
                (0.9, 1.4),
                &[(LeftToRight, 4.0), (RightToLeft, 4.0), (DiagonalUp, 2.0)],
                7.5,
                0.16,
            ),
            species(
                "manta",
                "Manta Ray",
                Swim,
                -3.0,
                0.2,
                (0.15, 0.8),
                (0.6, 1.0),
                &[(DiagonalUp, 4.0), (DeepToSurface, 3.0), (LeftToRight, 2.0), (RightToLeft, 2.0)],
                11.0,
                0.75,
            ),
        ],
    }
}

/// Forest scene: three ground walkers and one glider.
pub fn temperate() -> BiomeConfig {
    use EntryDirection::*;
    use MotionClass::{Glide, Walk};

    let mut owl = species(
        "owl",
        "Owl",
        Glide,
        1.2,
        0.15,
        (0.5, 0.7),
        (0.8, 1.4),
        &[(Diagonal, 3.0), (LeftToRight, 2.0), (RightToLeft, 2.0)],
        7.0,
        0.08,
    );
    owl.bank_amount = 0.1;

    BiomeConfig {
        name: "temperate".to_string(),
        bounds: WorldBounds {
            x: 45.0,
            z: 45.0,
            y_top: 10.0,
            y_bottom: -4.0,
        },
        despawn_margin: 10.0,
        species: vec![
            species(
                "deer",
                "Deer",
                Walk,
                -5.2,
                0.06,
                (0.008, 2.4),
                (0.6, 1.1),
                &[(LeftToRight, 5.0), (RightToLeft, 5.0), (Diagonal, 1.0)],
                0.0,
                0.12,
            ),
            species(
                "fox",
                "Fox",
                Walk,
                -5.25,
                0.12,
                (0.010, 3.2),
                (0.9, 1.6),
                &[(LeftToRight, 6.0), (RightToLeft, 6.0), (Diagonal, 2.0)],
                3.5,
                0.12,
            ),
            owl,
            species(
                "bear",
                "Black Bear",
                Walk,
                -5.30,
                0.05,
                (0.006, 2.0),
                (0.4, 0.8),
                &[(LeftToRight, 3.0), (RightToLeft, 3.0)],
                10.5,
                0.16,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-biome.toml")
    }

    const MINIMAL: &str = r#"
        name = "pond"
        despawn_margin = 5.0

        [bounds]
        x = 20.0
        z = 20.0
        y_top = 4.0
        y_bottom = -6.0

        [[species]]
        id = "frog"
        label = "Frog"
        motion = "swim"
        base_y = -1.0
        turn_jitter = 0.3
        bob_amp = 0.1
        bob_freq = 1.0
        min_speed = 0.5
        max_speed = 0.9
        entry_weights = [
            { direction = "left_to_right", weight = 1.0 },
            { direction = "random_edge", weight = 2.0 },
        ]
    "#;

    #[test]
    fn presets_are_valid() {
        for name in BiomeConfig::preset_names() {
            let config = BiomeConfig::preset(name).unwrap();
            config.validate().unwrap();
            assert_eq!(config.species.len(), 4);
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(BiomeConfig::preset("tundra").is_none());
    }

    #[test]
    fn toml_biome_loads_with_defaults() {
        let config = BiomeConfig::from_toml_str(MINIMAL, &test_path()).unwrap();
        assert_eq!(config.name, "pond");
        let frog = config.species("frog").unwrap();
        assert_eq!(frog.motion, MotionClass::Swim);
        assert_eq!(frog.spawn_delay, None);
        assert_eq!(frog.scale, 1.0);
        assert_eq!(frog.bank_amount, 0.0);
        assert_eq!(frog.entry_weights[1].direction, EntryDirection::RandomEdge);
    }

    #[test]
    fn inverted_speed_range_rejected() {
        let mut config = ocean();
        config.species[0].min_speed = 2.0;
        config.species[0].max_speed = 1.0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("turtle"));
        assert!(err.contains("min_speed"));
    }

    #[test]
    fn zero_weight_sum_rejected() {
        let mut config = temperate();
        for w in &mut config.species[0].entry_weights {
            w.weight = 0.0;
        }
        let err = config.validate().unwrap_err();
        assert!(err.contains("sum to > 0.0"));
    }

    #[test]
    fn duplicate_ids_and_bad_bounds_reported_together() {
        let mut config = ocean();
        config.species[1].id = "turtle".to_string();
        config.bounds.y_bottom = 20.0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("more than once"));
        assert!(err.contains("y_bottom"));
    }

    #[test]
    fn non_finite_speeds_rejected() {
        for (min, max) in [(0.5, f32::INFINITY), (f32::NAN, 1.0), (0.5, f32::NAN)] {
            let mut config = ocean();
            config.species[1].min_speed = min;
            config.species[1].max_speed = max;
            let err = config.validate().unwrap_err();
            assert!(err.contains("shark: speed range"), "{}..{}: {}", min, max, err);
        }
    }

    #[test]
    fn non_finite_bounds_and_margin_rejected() {
        let mut config = ocean();
        config.bounds.x = f32::INFINITY;
        assert!(config.validate().unwrap_err().contains("bounds must be finite"));

        let mut config = ocean();
        config.bounds.y_bottom = f32::NAN;
        assert!(config.validate().unwrap_err().contains("bounds must be finite"));

        let mut config = ocean();
        config.despawn_margin = f32::INFINITY;
        assert!(config.validate().unwrap_err().contains("despawn_margin"));

        let mut config = ocean();
        config.despawn_margin = f32::NAN;
        assert!(config.validate().unwrap_err().contains("despawn_margin"));
    }

    #[test]
    fn non_finite_species_fields_rejected() {
        let cases: [(&str, fn(&mut SpeciesConfig)); 8] = [
            ("base_y", |s| s.base_y = f32::NAN),
            ("turn_jitter", |s| s.turn_jitter = f32::INFINITY),
            ("bob_amp", |s| s.bob_amp = f32::NEG_INFINITY),
            ("bob_freq", |s| s.bob_freq = f32::NAN),
            ("bank_amount", |s| s.bank_amount = f32::INFINITY),
            ("scale", |s| s.scale = f32::INFINITY),
            ("scale", |s| s.scale = f32::NAN),
            ("spawn_delay", |s| s.spawn_delay = Some(f32::INFINITY)),
        ];
        for (field, corrupt) in cases {
            let mut config = temperate();
            corrupt(&mut config.species[2]);
            let err = config.validate().unwrap_err();
            assert!(err.contains(&format!("owl: {}", field)), "{}: {}", field, err);
        }
    }

    #[test]
    fn infinite_speed_in_toml_rejected() {
        let text = MINIMAL.replace("max_speed = 0.9", "max_speed = inf");
        let err = BiomeConfig::from_toml_str(&text, &test_path()).unwrap_err();
        assert!(err.contains("frog: speed range"));
    }

    #[test]
    fn from_file_loads_valid_biome() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        write!(tmp, "{}", MINIMAL).unwrap();
        let config = BiomeConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.species.len(), 1);
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err = BiomeConfig::from_toml_str("name = [", &test_path()).unwrap_err();
        assert!(err.contains("test-biome.toml"));
    }
}
