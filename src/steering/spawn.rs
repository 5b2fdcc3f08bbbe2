use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::biome::{EntryWeight, WorldBounds};

/// Named entry trajectory used when an agent appears or returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    /// Rise from the interior toward the surface (horizontal drift for planar movers).
    DeepToSurface,
    LeftToRight,
    RightToLeft,
    DiagonalUp,
    DiagonalDown,
    /// Flat corner-to-corner crossing.
    Diagonal,
    /// Any of the four vertical faces, heading inward.
    RandomEdge,
}

/// Distance kept between an edge spawn and the despawn envelope, so a freshly
/// placed agent always starts strictly inside it.
pub const EDGE_INSET: f32 = 0.5;

/// Where and which way an agent enters the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub position: Vec3,
    /// Unit heading.
    pub direction: Vec3,
}

/// Weighted pick over an entry table. Zero-weight rows are never chosen.
pub fn choose_direction<R: Rng>(weights: &[EntryWeight], rng: &mut R) -> EntryDirection {
    let fallback = weights
        .iter()
        .rev()
        .find(|w| w.weight > 0.0)
        .map(|w| w.direction)
        .unwrap_or(EntryDirection::RandomEdge);

    let total: f32 = weights.iter().filter(|w| w.weight > 0.0).map(|w| w.weight).sum();
    if total <= 0.0 {
        return fallback;
    }

    let mut r = rng.gen_range(0.0..total);
    for w in weights.iter().filter(|w| w.weight > 0.0) {
        r -= w.weight;
        if r <= 0.0 {
            return w.direction;
        }
    }
    fallback
}

fn uniform<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if min < max { rng.gen_range(min..max) } else { min }
}

/// Build a spawn point and heading for `direction`.
///
/// Planar movers (walkers, gliders) enter exactly at `base_y` with no vertical
/// heading; swimmers get up to 2 units of height jitter and may climb or dive.
pub fn spawn_from_direction<R: Rng>(
    direction: EntryDirection,
    base_y: f32,
    bounds: &WorldBounds,
    despawn_margin: f32,
    planar: bool,
    rng: &mut R,
) -> Spawn {
    let rx = bounds.x + despawn_margin - EDGE_INSET;
    let rz = bounds.z + despawn_margin - EDGE_INSET;
    let (spread, lateral) = if planar { (0.6, 0.2) } else { (0.7, 0.15) };

    let y = if planar {
        base_y
    } else {
        base_y + uniform(rng, -2.0, 2.0)
    };

    let (x, z, heading) = match direction {
        EntryDirection::DeepToSurface => (
            uniform(rng, -bounds.x * spread, bounds.x * spread),
            uniform(rng, -bounds.z * spread, bounds.z * spread),
            Vec3::new(uniform(rng, -0.2, 0.2), 1.0, uniform(rng, -0.2, 0.2)),
        ),
        EntryDirection::LeftToRight => (
            -rx,
            uniform(rng, -bounds.z, bounds.z),
            Vec3::new(1.0, uniform(rng, -0.08, 0.08), uniform(rng, -lateral, lateral)),
        ),
        EntryDirection::RightToLeft => (
            rx,
            uniform(rng, -bounds.z, bounds.z),
            Vec3::new(-1.0, uniform(rng, -0.08, 0.08), uniform(rng, -lateral, lateral)),
        ),
        EntryDirection::DiagonalUp => (-rx, -rz, Vec3::new(1.0, uniform(rng, 0.05, 0.25), 1.0)),
        EntryDirection::DiagonalDown => (-rx, rz, Vec3::new(1.0, uniform(rng, -0.25, -0.05), -1.0)),
        EntryDirection::Diagonal => (-rx, -rz, Vec3::new(1.0, 0.0, 1.0)),
        EntryDirection::RandomEdge => match rng.gen_range(0..4) {
            0 => (
                rx,
                uniform(rng, -bounds.z, bounds.z),
                Vec3::new(-1.0, 0.0, uniform(rng, -0.3, 0.3)),
            ),
            1 => (
                -rx,
                uniform(rng, -bounds.z, bounds.z),
                Vec3::new(1.0, 0.0, uniform(rng, -0.3, 0.3)),
            ),
            2 => (
                uniform(rng, -bounds.x, bounds.x),
                rz,
                Vec3::new(uniform(rng, -0.3, 0.3), 0.0, -1.0),
            ),
            _ => (
                uniform(rng, -bounds.x, bounds.x),
                -rz,
                Vec3::new(uniform(rng, -0.3, 0.3), 0.0, 1.0),
            ),
        },
    };

    let heading = if planar {
        Vec3::new(heading.x, 0.0, heading.z)
    } else {
        heading
    };

    Spawn {
        position: Vec3::new(x, y, z),
        // A planar deep-to-surface draw can come out (0, 0, 0); head along +X then.
        direction: heading.try_normalize().unwrap_or(Vec3::X),
    }
}
