use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::biome::{SpeciesConfig, WorldBounds};

/// Fraction of the way a swimmer turns toward its heading each frame.
pub const FACING_SLERP: f32 = 0.18;

/// Bank angle gained per radian of yaw change for gliders.
const BANK_GAIN: f32 = 12.0;

/// How an agent moves and how it is oriented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionClass {
    /// Free-swimming: full 3D heading, bobbing height, 3-axis facing.
    Swim,
    /// Ground walker: pinned to its base height with a step bob, yaw-only facing.
    Walk,
    /// Air glider: height band around its base, yaw plus a small bank.
    Glide,
}

impl MotionClass {
    /// (frequency a, frequency b, phase b) of the two heading-noise waves.
    fn heading_waves(self) -> (f32, f32, f32) {
        match self {
            MotionClass::Swim => (0.8, 1.1, 1.7),
            MotionClass::Walk => (0.8, 1.3, 1.2),
            MotionClass::Glide => (0.6, 1.1, 0.7),
        }
    }

    /// Range of the randomized wait, in seconds, before a departed agent returns.
    pub fn resume_delay(self) -> (f32, f32) {
        match self {
            MotionClass::Swim => (1.0, 3.0),
            MotionClass::Walk => (1.2, 3.0),
            MotionClass::Glide => (1.2, 3.2),
        }
    }

    /// Extra room above and below the world before an agent counts as gone.
    /// Walkers never leave vertically.
    pub fn vertical_slack(self) -> Option<f32> {
        match self {
            MotionClass::Swim => Some(2.0),
            MotionClass::Walk => None,
            MotionClass::Glide => Some(1.0),
        }
    }

    pub fn is_planar(self) -> bool {
        !matches!(self, MotionClass::Swim)
    }
}

/// Pseudo-periodic yaw rate: two offset sines scaled by the agent's jitter.
pub fn heading_noise(class: MotionClass, t: f32, turn_jitter: f32) -> f32 {
    let (a, b, phase) = class.heading_waves();
    ((t * a).sin() + (t * b + phase).sin()) * 0.5 * turn_jitter
}

/// Mutable kinematic state advanced by [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
}

/// Advance one frame of motion for an active agent.
pub fn integrate(
    body: &mut Kinematics,
    species: &SpeciesConfig,
    bounds: &WorldBounds,
    t: f32,
    dt: f32,
) {
    let yaw_delta = heading_noise(species.motion, t, species.turn_jitter) * dt;
    body.velocity = (Quat::from_rotation_y(yaw_delta) * body.velocity)
        .clamp_length(species.min_speed, species.max_speed);

    match species.motion {
        MotionClass::Swim => {
            let bob = (t * species.bob_freq).sin() * species.bob_amp * dt;
            body.position.y = (body.position.y + bob).clamp(bounds.y_bottom, bounds.y_top);
            body.position += body.velocity * dt;

            if let Some(dir) = body.velocity.try_normalize() {
                let target = Quat::from_rotation_arc(Vec3::Z, dir);
                body.orientation = body.orientation.slerp(target, FACING_SLERP);
            }
        }
        MotionClass::Walk => {
            body.position += body.velocity * dt;
            body.position.y = species.base_y + (t * species.bob_freq).sin() * species.bob_amp;
            body.orientation = Quat::from_euler(EulerRot::XYZ, 0.0, yaw_of(body.velocity), 0.0);
        }
        MotionClass::Glide => {
            body.position.y = (species.base_y + (t * species.bob_freq).sin() * species.bob_amp)
                .clamp(bounds.y_bottom, bounds.y_top);
            body.position += body.velocity * dt;

            let bank =
                (-yaw_delta * BANK_GAIN).clamp(-species.bank_amount, species.bank_amount);
            body.orientation = Quat::from_euler(EulerRot::XYZ, bank, yaw_of(body.velocity), 0.0);
        }
    }
}

/// Heading angle around +Y, measured from +Z toward +X.
fn yaw_of(velocity: Vec3) -> f32 {
    velocity.x.atan2(velocity.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::biome::{ocean, temperate};

    fn body(velocity: Vec3, y: f32) -> Kinematics {
        Kinematics {
            position: Vec3::new(0.0, y, 0.0),
            velocity,
            orientation: Quat::IDENTITY,
        }
    }

    #[test]
    fn heading_noise_bounded_by_jitter() {
        for class in [MotionClass::Swim, MotionClass::Walk, MotionClass::Glide] {
            for i in 0..1000 {
                let n = heading_noise(class, i as f32 * 0.05, 0.4);
                assert!(n.abs() <= 0.4 + 1e-6);
            }
        }
    }

    #[test]
    fn speed_clamped_into_species_range() {
        let biome = ocean();
        let shark = biome.species("shark").unwrap();
        let mut fast = body(Vec3::new(10.0, 0.0, 0.0), -3.8);
        integrate(&mut fast, shark, &biome.bounds, 1.0, 1.0 / 60.0);
        assert!((fast.velocity.length() - shark.max_speed).abs() < 1e-4);

        let mut slow = body(Vec3::new(0.1, 0.0, 0.0), -3.8);
        integrate(&mut slow, shark, &biome.bounds, 1.0, 1.0 / 60.0);
        assert!((slow.velocity.length() - shark.min_speed).abs() < 1e-4);
    }

    #[test]
    fn walker_height_pinned_to_base_with_step_bob() {
        let biome = temperate();
        let deer = biome.species("deer").unwrap();
        let mut b = body(Vec3::new(0.0, 0.0, 0.8), 3.0);
        for frame in 0..600 {
            integrate(&mut b, deer, &biome.bounds, frame as f32 / 60.0, 1.0 / 60.0);
            assert!((b.position.y - deer.base_y).abs() <= deer.bob_amp + 1e-6);
        }
    }

    #[test]
    fn walker_faces_yaw_only() {
        let biome = temperate();
        let fox = biome.species("fox").unwrap();
        let mut b = body(Vec3::new(1.0, 0.0, 0.0), fox.base_y);
        integrate(&mut b, fox, &biome.bounds, 0.0, 1.0 / 60.0);
        let forward = b.orientation * Vec3::Z;
        assert!(forward.y.abs() < 1e-4);
        assert!(forward.x > 0.99);
    }

    #[test]
    fn glider_bank_limited() {
        let biome = temperate();
        let owl = biome.species("owl").unwrap();
        let mut b = body(Vec3::new(1.0, 0.0, 0.0), owl.base_y);
        for frame in 0..600 {
            // Large steps exaggerate the yaw delta so the clamp is exercised.
            integrate(&mut b, owl, &biome.bounds, frame as f32 * 0.1, 0.5);
            let up = b.orientation * Vec3::Y;
            assert!(up.angle_between(Vec3::Y) <= owl.bank_amount + 1e-3);
            assert!(b.position.y >= biome.bounds.y_bottom && b.position.y <= biome.bounds.y_top + 1.0);
        }
    }

    #[test]
    fn swimmer_turns_toward_velocity() {
        let biome = ocean();
        let turtle = biome.species("turtle").unwrap();
        let mut b = body(Vec3::new(0.8, 0.0, 0.0), turtle.base_y);
        for frame in 0..120 {
            integrate(&mut b, turtle, &biome.bounds, frame as f32 / 60.0, 1.0 / 60.0);
        }
        let forward = b.orientation * Vec3::Z;
        let heading = b.velocity.normalize();
        assert!(forward.dot(heading) > 0.99);
    }

    #[test]
    fn swimmer_bob_respects_vertical_bounds() {
        let biome = ocean();
        let turtle = biome.species("turtle").unwrap();
        let mut b = body(Vec3::new(0.8, 0.0, 0.0), biome.bounds.y_bottom);
        integrate(&mut b, turtle, &biome.bounds, 4.0, 1.0 / 60.0);
        assert!(b.position.y >= biome.bounds.y_bottom);
    }
}
