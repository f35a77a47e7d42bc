/*
 * Physics Module
 *
 * The two per-frame integration passes.
 *
 * The force pass reads the current position and velocity buffers (plus the
 * home and target point clouds) and writes the next velocity buffer. The
 * position pass reads that freshly written velocity buffer and the current
 * position buffer and writes the next position buffer. Each pass only ever
 * holds one mutable slice, the "next" half of a ping-pong pair, so every
 * particle sees the previous frame's state of its neighbors.
 *
 * Both passes run either sequentially or in parallel chunks with rayon.
 */

use nannou::prelude::*;
use rayon::prelude::*;

use crate::controller::{FrameParams, InteractionMode};
use crate::flocking::{accumulate_zones, boundary_push, curl_drift, limit_speed, NeighborSampler};
use crate::hash::{grid_direction, grid_random, GridCoord, SALT_AGE, SALT_EXPLOSION, SALT_RESPAWN, SALT_STAGGER};
use crate::math::{lerp, safe_normalize, smoothstep};
use crate::params::SimulationParams;
use crate::particle::{respawn_life, ParticleBuffers, PositionSample, VelocitySample};

/// Read-only view of everything the force pass samples.
#[derive(Clone, Copy)]
pub struct ForceInputs<'a> {
    pub positions: &'a [PositionSample],
    pub velocities: &'a [VelocitySample],
    pub home: &'a [Vec3],
    /// Present only while morphing.
    pub target: Option<&'a [Vec3]>,
    pub sampler: &'a NeighborSampler,
}

/// Start delay of a particle as a fraction of the morph.
#[inline]
pub fn stagger_delay(coord: GridCoord, max_stagger: f32) -> f32 {
    grid_random(coord, SALT_STAGGER) * max_stagger
}

/// Per-particle morph progress after its stagger delay, in [0, 1].
#[inline]
pub fn particle_progress(morph_progress: f32, delay: f32, max_stagger: f32) -> f32 {
    ((morph_progress - delay) / (1.0 - max_stagger)).clamp(0.0, 1.0)
}

/// Eased morph progress of one particle.
#[inline]
pub fn particle_ease(coord: GridCoord, morph_progress: f32, max_stagger: f32) -> f32 {
    let t = particle_progress(morph_progress, stagger_delay(coord, max_stagger), max_stagger);
    smoothstep(0.0, 1.0, t)
}

/// Compute the next velocity sample of particle `index`.
pub fn compute_velocity(
    index: usize,
    inputs: &ForceInputs,
    frame: &FrameParams,
    params: &SimulationParams,
) -> VelocitySample {
    let coord = GridCoord::from_index(index, params.texture_size);
    let position = inputs.positions[index].position;
    let current = inputs.velocities[index];
    let dt = frame.delta_time;
    let mut velocity = current.velocity;

    // Lifecycle
    let lifecycle_active = params.lifecycle.enabled && frame.pure_idle();
    let mut life = 1.0;
    if lifecycle_active {
        if frame.reseed_life {
            life = grid_random(coord, SALT_AGE);
        } else if current.life < 0.0 {
            life = current.life + dt;
            if life < 0.0 {
                return VelocitySample { velocity, life };
            }
        } else {
            life = current.life + dt / params.lifecycle.lifespan;
        }
    }

    // Morph easing
    let ease = if frame.morphing {
        particle_ease(coord, frame.morph_progress, params.morph.max_stagger)
    } else {
        0.0
    };

    // Attraction toward the target while morphing, toward home otherwise
    let attraction = &params.attraction;
    let (goal, strength) = match (frame.morphing, inputs.target) {
        (true, Some(target)) => {
            let mut strength = lerp(attraction.morph_strength_min, attraction.morph_strength_max, ease);
            if frame.flocking {
                strength *= attraction.flocking_boost;
                if params.morph.enable_return_force {
                    strength *= lerp(attraction.free_flocking_scale, 1.0, frame.return_ramp);
                }
            }
            (target[index], strength)
        }
        _ => (inputs.home[index], attraction.idle_strength),
    };
    velocity += (goal - position) * strength * dt;

    // Pointer
    let interaction = &frame.interaction;
    let mut pushed = false;
    if interaction.radius > 0.0 {
        let away = position - interaction.point;
        let distance = away.length();
        if distance < interaction.radius {
            pushed = true;
            if let Some(direction) = safe_normalize(away) {
                let falloff = (interaction.radius - distance) / interaction.radius;
                velocity += direction * falloff * interaction.strength * dt;
            }
        }
    }

    // Explosion
    if frame.explosion_strength > 0.0 {
        let random = grid_direction(coord, SALT_EXPLOSION);
        let outward = safe_normalize(position).unwrap_or(random);
        let blend = params.explosion.outward_blend;
        let direction = safe_normalize(random + (outward - random) * blend).unwrap_or(random);
        velocity += direction * frame.explosion_strength * dt;
    }

    // Flocking
    if frame.flocking {
        let flocking = &params.flocking;
        let in_window = !frame.morphing
            || (ease > params.morph.flocking_window_start && ease < params.morph.flocking_window_end);
        if in_window && frame.flocking_intensity > 0.0 {
            let zones = accumulate_zones(index, inputs.positions, inputs.velocities, inputs.sampler, flocking);
            velocity += zones.steer(flocking, dt * frame.flocking_intensity);
        }
        velocity += curl_drift(position, frame.time, flocking, dt);
        velocity += boundary_push(position, flocking, dt);
        velocity = limit_speed(velocity, flocking);
    }

    // Damping
    velocity *= if frame.flocking {
        params.damping.flocking
    } else {
        params.damping.idle
    };

    // Respawn
    if lifecycle_active {
        // Only a particle the repel pointer reached this frame counts as swept.
        let swept = pushed
            && interaction.mode == InteractionMode::Repel
            && (position - inputs.home[index]).length()
                > params.interaction.sweep_respawn_factor * params.interaction.repel_radius;
        if life >= 1.0 || swept {
            velocity = Vec3::ZERO;
            life = respawn_life(coord, SALT_RESPAWN, &params.lifecycle);
        }
    }

    VelocitySample { velocity, life }
}

/// Compute the next position sample of particle `index` from its new velocity.
pub fn integrate_position(
    index: usize,
    current: &PositionSample,
    velocity: &VelocitySample,
    home: &[Vec3],
    frame: &FrameParams,
    params: &SimulationParams,
) -> PositionSample {
    let lifecycle_active = params.lifecycle.enabled && frame.pure_idle();
    if lifecycle_active && velocity.life < 0.0 {
        return PositionSample {
            position: home[index],
            life: 1.0,
        };
    }

    PositionSample {
        position: current.position + velocity.velocity * frame.delta_time,
        life: if lifecycle_active { velocity.life } else { 1.0 },
    }
}

#[inline]
fn chunk_size(len: usize) -> usize {
    std::cmp::max(len / rayon::current_num_threads(), 1)
}

/// Write the next velocity buffer from the current buffers.
pub fn force_pass(
    buffers: &mut ParticleBuffers,
    home: &[Vec3],
    target: Option<&[Vec3]>,
    sampler: &NeighborSampler,
    frame: &FrameParams,
    params: &SimulationParams,
) {
    let ParticleBuffers { positions, velocities } = buffers;
    let (current_velocities, next_velocities) = velocities.split_mut();
    let inputs = ForceInputs {
        positions: positions.current(),
        velocities: current_velocities,
        home,
        target,
        sampler,
    };

    if params.enable_parallel {
        // Process particles in chunks to keep the number of parallel tasks low
        let chunk_size = chunk_size(next_velocities.len());
        next_velocities
            .par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(chunk_index, chunk)| {
                for (offset, out) in chunk.iter_mut().enumerate() {
                    *out = compute_velocity(chunk_index * chunk_size + offset, &inputs, frame, params);
                }
            });
    } else {
        for (index, out) in next_velocities.iter_mut().enumerate() {
            *out = compute_velocity(index, &inputs, frame, params);
        }
    }
}

/// Write the next position buffer from the current positions and the next velocities.
pub fn position_pass(
    buffers: &mut ParticleBuffers,
    home: &[Vec3],
    frame: &FrameParams,
    params: &SimulationParams,
) {
    let ParticleBuffers { positions, velocities } = buffers;
    let new_velocities = velocities.next();
    let (current_positions, next_positions) = positions.split_mut();

    if params.enable_parallel {
        let chunk_size = chunk_size(next_positions.len());
        next_positions
            .par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(chunk_index, chunk)| {
                for (offset, out) in chunk.iter_mut().enumerate() {
                    let index = chunk_index * chunk_size + offset;
                    *out = integrate_position(
                        index,
                        &current_positions[index],
                        &new_velocities[index],
                        home,
                        frame,
                        params,
                    );
                }
            });
    } else {
        for (index, out) in next_positions.iter_mut().enumerate() {
            *out = integrate_position(
                index,
                &current_positions[index],
                &new_velocities[index],
                home,
                frame,
                params,
            );
        }
    }
}
