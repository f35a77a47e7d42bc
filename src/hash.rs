/*
 * Hash Module
 *
 * Deterministic pseudo-randomness keyed by a particle's fixed grid
 * coordinate. Every per-particle "random" value in the simulation (morph
 * stagger, respawn delay, explosion direction, initial life) comes from a
 * pure hash of (coordinate, salt), never from a stateful generator, so the
 * same particle always gets the same value across runs.
 *
 * Also provides a small lattice value noise and its curl, used to add
 * organic drift while flocking.
 */

use nannou::prelude::*;
use std::f32::consts::TAU;

use crate::math::smoothstep;

/// Salts separating the independent per-particle streams.
pub const SALT_STAGGER: u32 = 0x5354_4147;
pub const SALT_RESPAWN: u32 = 0x5245_5350;
pub const SALT_INITIAL_LIFE: u32 = 0x4c49_4645;
pub const SALT_AGE: u32 = 0x4147_4531;
pub const SALT_EXPLOSION: u32 = 0x4558_504c;

/// Position of a particle in the square particle texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
}

impl GridCoord {
    #[inline]
    pub fn from_index(index: usize, texture_size: u32) -> Self {
        let size = texture_size.max(1) as usize;
        Self {
            x: (index % size) as u32,
            y: (index / size) as u32,
        }
    }

    #[inline]
    pub fn to_index(self, texture_size: u32) -> usize {
        self.y as usize * texture_size as usize + self.x as usize
    }
}

/// 32-bit integer mix with good avalanche behaviour.
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

#[inline]
fn unit_float(h: u32) -> f32 {
    // Top 24 bits give an exactly representable value in [0, 1).
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Uniform value in [0, 1) for a grid coordinate and salt.
#[inline]
pub fn grid_random(coord: GridCoord, salt: u32) -> f32 {
    let h = hash_u32(coord.x ^ hash_u32(coord.y.wrapping_add(salt.wrapping_mul(0x9e37_79b9))));
    unit_float(hash_u32(h ^ salt))
}

/// Uniformly distributed unit vector for a grid coordinate and salt.
pub fn grid_direction(coord: GridCoord, salt: u32) -> Vec3 {
    let z = grid_random(coord, salt) * 2.0 - 1.0;
    let phi = grid_random(coord, salt.wrapping_add(1)) * TAU;
    let ring = (1.0 - z * z).max(0.0).sqrt();
    vec3(ring * phi.cos(), ring * phi.sin(), z)
}

#[inline]
fn lattice(x: i32, y: i32, z: i32, seed: u32) -> f32 {
    let h = hash_u32(x as u32 ^ hash_u32(y as u32 ^ hash_u32(z as u32 ^ seed)));
    unit_float(h) * 2.0 - 1.0
}

/// Smooth value noise in [-1, 1].
pub fn value_noise(p: Vec3, seed: u32) -> f32 {
    let (fx, fy, fz) = (p.x.floor(), p.y.floor(), p.z.floor());
    let (ix, iy, iz) = (fx as i32, fy as i32, fz as i32);
    let u = smoothstep(0.0, 1.0, p.x - fx);
    let v = smoothstep(0.0, 1.0, p.y - fy);
    let w = smoothstep(0.0, 1.0, p.z - fz);

    let mix = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let c00 = mix(lattice(ix, iy, iz, seed), lattice(ix + 1, iy, iz, seed), u);
    let c10 = mix(lattice(ix, iy + 1, iz, seed), lattice(ix + 1, iy + 1, iz, seed), u);
    let c01 = mix(lattice(ix, iy, iz + 1, seed), lattice(ix + 1, iy, iz + 1, seed), u);
    let c11 = mix(lattice(ix, iy + 1, iz + 1, seed), lattice(ix + 1, iy + 1, iz + 1, seed), u);
    mix(mix(c00, c10, v), mix(c01, c11, v), w)
}

/// Divergence-free noise field: the curl of three decorrelated noise potentials.
pub fn curl_noise(p: Vec3) -> Vec3 {
    const E: f32 = 0.1;
    let potential = |q: Vec3| vec3(value_noise(q, 11), value_noise(q, 23), value_noise(q, 37));
    let dx = vec3(E, 0.0, 0.0);
    let dy = vec3(0.0, E, 0.0);
    let dz = vec3(0.0, 0.0, E);

    let px0 = potential(p - dx);
    let px1 = potential(p + dx);
    let py0 = potential(p - dy);
    let py1 = potential(p + dy);
    let pz0 = potential(p - dz);
    let pz1 = potential(p + dz);

    let inv = 1.0 / (2.0 * E);
    vec3(
        ((py1.z - py0.z) - (pz1.y - pz0.y)) * inv,
        ((pz1.x - pz0.x) - (px1.z - px0.z)) * inv,
        ((px1.y - px0.y) - (py1.x - py0.x)) * inv,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_round_trips_through_index() {
        let size = 7;
        for index in 0..49 {
            let coord = GridCoord::from_index(index, size);
            assert_eq!(coord.to_index(size), index);
        }
        assert_eq!(GridCoord::from_index(10, 7), GridCoord { x: 3, y: 1 });
    }

    #[test]
    fn grid_random_is_pure() {
        let coord = GridCoord { x: 12, y: 40 };
        assert_eq!(grid_random(coord, SALT_STAGGER), grid_random(coord, SALT_STAGGER));
        assert_ne!(grid_random(coord, SALT_STAGGER), grid_random(coord, SALT_RESPAWN));
    }

    #[test]
    fn grid_random_stays_in_unit_interval() {
        for y in 0..64 {
            for x in 0..64 {
                let r = grid_random(GridCoord { x, y }, SALT_STAGGER);
                assert!((0.0..1.0).contains(&r));
            }
        }
    }

    #[test]
    fn grid_random_spreads_values() {
        let mut sum = 0.0;
        let count = 64 * 64;
        for y in 0..64 {
            for x in 0..64 {
                sum += grid_random(GridCoord { x, y }, SALT_RESPAWN);
            }
        }
        let mean = sum / count as f32;
        assert!((mean - 0.5).abs() < 0.05, "mean was {}", mean);
    }

    #[test]
    fn grid_direction_is_unit_length() {
        for x in 0..32 {
            let dir = grid_direction(GridCoord { x, y: 3 }, SALT_EXPLOSION);
            assert!((dir.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn curl_noise_is_finite_and_continuous() {
        let a = curl_noise(vec3(1.3, -2.7, 0.4));
        let b = curl_noise(vec3(1.3001, -2.7, 0.4));
        assert!(a.x.is_finite() && a.y.is_finite() && a.z.is_finite());
        assert!((a - b).length() < 0.05);
    }
}
