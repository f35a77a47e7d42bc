/*
 * Flocking Module
 *
 * Neighbor sampling and the separation / alignment / cohesion zone rules,
 * plus the soft boundary, curl-noise drift and speed limit that keep a
 * flock coherent.
 *
 * Zones are nested shells of one combined radius R. For a neighbor at
 * distance d the squared ratio d²/R² decides the zone: separation below
 * sep/R, alignment below (sep + align)/R, cohesion beyond that.
 */

use nannou::prelude::*;

use crate::hash::{curl_noise, GridCoord};
use crate::math::{lerp, safe_normalize, smoothstep, EPSILON};
use crate::params::{FlockingParams, NeighborSampling, SimulationParams};
use crate::particle::{PositionSample, VelocitySample};
use crate::spatial_grid::SpatialGrid;

/// Picks the neighbors a particle sees during the force pass.
#[derive(Debug, Clone)]
pub enum NeighborSampler {
    /// Texture-space block of (2r+1)² cells around the particle.
    Ring { radius: u32, texture_size: u32 },
    /// Sparse grid over the whole texture, offset by the particle's own cell.
    Strided { samples_per_axis: u32, texture_size: u32 },
    /// World-space buckets rebuilt from the current positions each frame.
    Spatial { grid: SpatialGrid, max_neighbors: usize },
}

impl NeighborSampler {
    pub fn new(params: &SimulationParams) -> Self {
        let texture_size = params.texture_size;
        match params.flocking.sampling {
            NeighborSampling::Ring { radius } => NeighborSampler::Ring { radius, texture_size },
            NeighborSampling::Strided { samples_per_axis } => NeighborSampler::Strided {
                samples_per_axis: samples_per_axis.min(texture_size).max(1),
                texture_size,
            },
            NeighborSampling::Spatial { max_neighbors } => NeighborSampler::Spatial {
                grid: SpatialGrid::new(params.zone_radius(), params.flocking.bounds),
                max_neighbors,
            },
        }
    }

    /// Refresh any per-frame acceleration structure from the current positions.
    pub fn prepare(&mut self, positions: &[PositionSample]) {
        if let NeighborSampler::Spatial { grid, .. } = self {
            grid.rebuild(positions.iter().map(|sample| sample.position));
        }
    }

    /// Call `visit` once per sampled neighbor of `index`, never with `index` itself.
    pub fn visit<F>(&self, index: usize, position: Vec3, mut visit: F)
    where
        F: FnMut(usize),
    {
        match self {
            NeighborSampler::Ring { radius, texture_size } => {
                let size = *texture_size as i64;
                let coord = GridCoord::from_index(index, *texture_size);
                let r = *radius as i64;
                let (cx, cy) = (coord.x as i64, coord.y as i64);
                // Clamped to the texture.
                for y in (cy - r).max(0)..=(cy + r).min(size - 1) {
                    for x in (cx - r).max(0)..=(cx + r).min(size - 1) {
                        if x == cx && y == cy {
                            continue;
                        }
                        visit((y * size + x) as usize);
                    }
                }
            }
            NeighborSampler::Strided { samples_per_axis, texture_size } => {
                let size = *texture_size;
                let step = (size / samples_per_axis).max(1);
                let coord = GridCoord::from_index(index, size);
                for sy in 0..*samples_per_axis {
                    let y = (coord.y + sy * step) % size;
                    for sx in 0..*samples_per_axis {
                        let x = (coord.x + sx * step) % size;
                        let neighbor = GridCoord { x, y }.to_index(size);
                        if neighbor != index {
                            visit(neighbor);
                        }
                    }
                }
            }
            NeighborSampler::Spatial { grid, max_neighbors } => {
                let mut seen = 0;
                grid.visit_nearby(position, |neighbor| {
                    if neighbor == index {
                        return true;
                    }
                    visit(neighbor);
                    seen += 1;
                    seen < *max_neighbors
                });
            }
        }
    }
}

/// Raw per-zone steering accumulated over one particle's neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
}

impl ZoneForces {
    /// Weighted sum of the three rules, scaled by `scale` (dt times intensity).
    pub fn steer(&self, params: &FlockingParams, scale: f32) -> Vec3 {
        (self.separation * params.separation_weight
            + self.alignment * params.alignment_weight
            + self.cohesion * params.cohesion_weight)
            * scale
    }
}

/// Accumulate the zone rules for particle `index` from the previous frame's state.
pub fn accumulate_zones(
    index: usize,
    positions: &[PositionSample],
    velocities: &[VelocitySample],
    sampler: &NeighborSampler,
    params: &FlockingParams,
) -> ZoneForces {
    let zone_radius = params.separation_distance + params.alignment_distance + params.cohesion_distance;
    let zone_radius_sq = zone_radius * zone_radius;
    if zone_radius_sq < EPSILON {
        return ZoneForces::default();
    }
    let separation_threshold = params.separation_distance / zone_radius;
    let alignment_threshold = (params.separation_distance + params.alignment_distance) / zone_radius;

    let position = positions[index].position;
    let mut forces = ZoneForces::default();
    let mut alignment_count = 0u32;
    let mut cohesion_count = 0u32;

    sampler.visit(index, position, |neighbor| {
        let offset = positions[neighbor].position - position;
        let distance_sq = offset.length_squared();
        if !(distance_sq < zone_radius_sq) {
            return;
        }
        let Some(direction) = safe_normalize(offset) else {
            return;
        };
        let percent = distance_sq / zone_radius_sq;

        if percent < separation_threshold {
            let push = 1.0 - percent / separation_threshold;
            forces.separation -= direction * push;
        } else if percent < alignment_threshold {
            if let Some(heading) = safe_normalize(velocities[neighbor].velocity) {
                forces.alignment += heading;
                alignment_count += 1;
            }
        } else {
            forces.cohesion += direction;
            cohesion_count += 1;
        }
    });

    if alignment_count > 0 {
        forces.alignment /= alignment_count as f32;
    }
    if cohesion_count > 0 {
        forces.cohesion /= cohesion_count as f32;
    }
    forces
}

/// Organic drift from the curl of a slowly scrolling noise field.
pub fn curl_drift(position: Vec3, time: f32, params: &FlockingParams, dt: f32) -> Vec3 {
    if params.curl_noise_intensity == 0.0 {
        return Vec3::ZERO;
    }
    let drift = curl_noise(position * params.curl_noise_scale + Vec3::splat(time));
    if drift.is_finite() {
        drift * params.curl_noise_intensity * dt
    } else {
        Vec3::ZERO
    }
}

/// Inward push that grows smoothly between the threshold and the bounds.
pub fn boundary_push(position: Vec3, params: &FlockingParams, dt: f32) -> Vec3 {
    let distance = position.length();
    let threshold = params.bounds_threshold * params.bounds;
    if distance <= threshold {
        return Vec3::ZERO;
    }
    match safe_normalize(position) {
        Some(outward) => -outward * smoothstep(threshold, params.bounds, distance) * params.bounds_strength * dt,
        None => Vec3::ZERO,
    }
}

/// Ease an over-speed velocity toward the limit instead of clamping hard.
pub fn limit_speed(velocity: Vec3, params: &FlockingParams) -> Vec3 {
    let speed = velocity.length();
    if speed <= params.speed_limit || speed < EPSILON {
        return velocity;
    }
    velocity / speed * lerp(speed, params.speed_limit, params.speed_limit_blend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(texture_size: u32, sampling: NeighborSampling) -> SimulationParams {
        let mut params = SimulationParams::default();
        params.texture_size = texture_size;
        params.flocking.sampling = sampling;
        params
    }

    fn visited(sampler: &NeighborSampler, index: usize, position: Vec3) -> Vec<usize> {
        let mut out = Vec::new();
        sampler.visit(index, position, |n| out.push(n));
        out
    }

    fn at(position: Vec3) -> PositionSample {
        PositionSample { position, life: 1.0 }
    }

    fn still() -> VelocitySample {
        VelocitySample { velocity: Vec3::ZERO, life: 1.0 }
    }

    #[test]
    fn ring_visits_three_by_three_without_self() {
        let sampler = NeighborSampler::new(&params(4, NeighborSampling::Ring { radius: 1 }));
        // Index 5 is (1, 1): a full interior ring.
        let mut seen = visited(&sampler, 5, Vec3::ZERO);
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 4, 6, 8, 9, 10]);
        // Index 0 is a corner: only three neighbors exist.
        assert_eq!(visited(&sampler, 0, Vec3::ZERO), vec![1, 4, 5]);
    }

    #[test]
    fn oversized_ring_stops_at_texture_edges() {
        let sampler = NeighborSampler::new(&params(4, NeighborSampling::Ring { radius: 100_000 }));
        let mut seen = visited(&sampler, 5, Vec3::ZERO);
        seen.sort_unstable();
        let expected: Vec<usize> = (0..16).filter(|&i| i != 5).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn strided_covers_texture_without_duplicates() {
        let sampler = NeighborSampler::new(&params(8, NeighborSampling::Strided { samples_per_axis: 4 }));
        let mut seen = visited(&sampler, 9, Vec3::ZERO);
        assert_eq!(seen.len(), 15);
        assert!(!seen.contains(&9));
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn spatial_respects_neighbor_cap() {
        let mut sampler = NeighborSampler::new(&params(4, NeighborSampling::Spatial { max_neighbors: 3 }));
        let positions: Vec<PositionSample> = (0..16).map(|_| at(Vec3::ZERO)).collect();
        sampler.prepare(&positions);
        let seen = visited(&sampler, 0, Vec3::ZERO);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn close_pair_separates() {
        let sampler = NeighborSampler::new(&params(2, NeighborSampling::Ring { radius: 1 }));
        let flocking = FlockingParams::default();
        let far = vec3(500.0, 500.0, 0.0);
        let positions = vec![at(vec3(-1.0, 0.0, 0.0)), at(vec3(1.0, 0.0, 0.0)), at(far), at(-far)];
        let velocities = vec![still(); 4];

        let left = accumulate_zones(0, &positions, &velocities, &sampler, &flocking);
        let right = accumulate_zones(1, &positions, &velocities, &sampler, &flocking);
        assert!(left.separation.x < 0.0);
        assert!(right.separation.x > 0.0);
        assert_eq!(left.cohesion, Vec3::ZERO);
    }

    #[test]
    fn coincident_neighbors_are_skipped() {
        let sampler = NeighborSampler::new(&params(2, NeighborSampling::Ring { radius: 1 }));
        let positions = vec![at(Vec3::ZERO); 4];
        let velocities = vec![still(); 4];
        let forces = accumulate_zones(0, &positions, &velocities, &sampler, &FlockingParams::default());
        assert_eq!(forces, ZoneForces::default());
    }

    #[test]
    fn distant_neighbors_cohere() {
        let sampler = NeighborSampler::new(&params(2, NeighborSampling::Ring { radius: 1 }));
        let flocking = FlockingParams::default();
        // 65 of a 70 radius is well inside the cohesion shell.
        let positions = vec![at(Vec3::ZERO), at(vec3(0.0, 65.0, 0.0)), at(vec3(900.0, 0.0, 0.0)), at(vec3(-900.0, 0.0, 0.0))];
        let forces = accumulate_zones(0, &positions, &vec![still(); 4], &sampler, &flocking);
        assert!((forces.cohesion - vec3(0.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn boundary_pushes_inward_only_past_threshold() {
        let flocking = FlockingParams::default();
        assert_eq!(boundary_push(vec3(10.0, 0.0, 0.0), &flocking, 0.1), Vec3::ZERO);
        let push = boundary_push(vec3(flocking.bounds, 0.0, 0.0), &flocking, 0.1);
        assert!(push.x < 0.0);
        assert!((push.x + flocking.bounds_strength * 0.1).abs() < 1e-5);
    }

    #[test]
    fn speed_limit_eases_toward_limit() {
        let flocking = FlockingParams::default();
        let slow = vec3(1.0, 0.0, 0.0);
        assert_eq!(limit_speed(slow, &flocking), slow);
        let fast = limit_speed(vec3(0.0, 18.0, 0.0), &flocking);
        let expected = lerp(18.0, flocking.speed_limit, flocking.speed_limit_blend);
        assert!((fast.length() - expected).abs() < 1e-4);
        assert!(fast.length() > flocking.speed_limit);
    }
}
