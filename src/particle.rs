/*
 * Particle Module
 *
 * This module defines the per-particle records and the double-buffered
 * (ping-pong) storage the integrators work on. Each logical buffer has two
 * full copies: during a pass one copy is read-only ("current") and the other
 * is write-only ("next"). Swapping exchanges their roles by index, so no
 * particle data is ever copied and no reader sees a half-written frame.
 */

use nannou::prelude::*;

use crate::hash::{grid_random, GridCoord, SALT_INITIAL_LIFE};
use crate::params::{LifecycleParams, SimulationParams};

// A particle's position lane: world position plus pass-through life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub position: Vec3,
    pub life: f32,
}

// A particle's velocity lane: velocity plus the authoritative life counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySample {
    pub velocity: Vec3,
    pub life: f32,
}

impl PositionSample {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.life.is_finite()
    }
}

impl VelocitySample {
    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.life.is_finite()
    }
}

/// Negative life for a particle waiting to respawn: a hashed delay in
/// `[min_respawn_delay, max_respawn_delay]`, never zero.
pub fn respawn_life(coord: GridCoord, salt: u32, lifecycle: &LifecycleParams) -> f32 {
    let span = lifecycle.max_respawn_delay - lifecycle.min_respawn_delay;
    -(lifecycle.min_respawn_delay + grid_random(coord, salt) * span).max(f32::EPSILON)
}

// Two equally sized copies of one buffer with swappable roles.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    buffers: [Vec<T>; 2],
    current: usize,
}

impl<T: Clone> PingPong<T> {
    // Both copies start with the same contents.
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            buffers: [initial.clone(), initial],
            current: 0,
        }
    }
}

impl<T> PingPong<T> {
    pub fn len(&self) -> usize {
        self.buffers[self.current].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current(&self) -> &[T] {
        &self.buffers[self.current]
    }

    pub fn next(&self) -> &[T] {
        &self.buffers[self.current ^ 1]
    }

    // Mutable access to the current copy, for seeding between frames.
    pub fn current_mut(&mut self) -> &mut [T] {
        &mut self.buffers[self.current]
    }

    /// Read the current copy while writing the next one.
    pub fn split_mut(&mut self) -> (&[T], &mut [T]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

// The position and velocity ping-pong pairs for all N particles.
#[derive(Debug, Clone)]
pub struct ParticleBuffers {
    pub positions: PingPong<PositionSample>,
    pub velocities: PingPong<VelocitySample>,
}

impl ParticleBuffers {
    /// Particles start at rest on their home points.
    ///
    /// With the lifecycle enabled every particle starts dormant for a short,
    /// coordinate-derived delay so respawns are desynchronized from frame one.
    pub fn new(home: &[Vec3], params: &SimulationParams) -> Self {
        let lifecycle = &params.lifecycle;
        let initial_life = |index: usize| {
            if lifecycle.enabled {
                respawn_life(GridCoord::from_index(index, params.texture_size), SALT_INITIAL_LIFE, lifecycle)
            } else {
                1.0
            }
        };

        let positions = home
            .iter()
            .enumerate()
            .map(|(index, &position)| PositionSample {
                position,
                life: initial_life(index),
            })
            .collect();
        let velocities = (0..home.len())
            .map(|index| VelocitySample {
                velocity: Vec3::ZERO,
                life: initial_life(index),
            })
            .collect();

        Self {
            positions: PingPong::new(positions),
            velocities: PingPong::new(velocities),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    // Exchange current and next for both buffers at the frame boundary.
    pub fn swap(&mut self) {
        self.positions.swap();
        self.velocities.swap();
    }

    // True when every lane of every current sample is finite.
    pub fn all_finite(&self) -> bool {
        self.positions.current().iter().all(PositionSample::is_finite)
            && self.velocities.current().iter().all(VelocitySample::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_reads_current_and_writes_next() {
        let mut buffer = PingPong::new(vec![1, 2, 3]);
        {
            let (current, next) = buffer.split_mut();
            for (out, value) in next.iter_mut().zip(current) {
                *out = value * 10;
            }
        }
        assert_eq!(buffer.current(), &[1, 2, 3]);
        assert_eq!(buffer.next(), &[10, 20, 30]);

        buffer.swap();
        assert_eq!(buffer.current(), &[10, 20, 30]);

        let (current, next) = buffer.split_mut();
        assert_eq!(current, &[10, 20, 30]);
        assert_eq!(next, &[1, 2, 3]);
    }

    #[test]
    fn buffers_start_at_home_and_at_rest() {
        let home = vec![vec3(1.0, 2.0, 3.0), vec3(-1.0, 0.0, 0.5)];
        let mut params = SimulationParams::default();
        params.texture_size = 1;
        let buffers = ParticleBuffers::new(&home, &params);

        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers.positions.current()[0].position, home[0]);
        assert_eq!(buffers.positions.next()[1].position, home[1]);
        assert!(buffers.velocities.current().iter().all(|v| v.velocity == Vec3::ZERO));
        assert!(buffers.velocities.current().iter().all(|v| v.life == 1.0));
    }

    #[test]
    fn lifecycle_starts_dormant_and_staggered() {
        let mut params = SimulationParams::default();
        params.texture_size = 4;
        params.lifecycle.enabled = true;
        let home = vec![Vec3::ZERO; 16];
        let buffers = ParticleBuffers::new(&home, &params);

        let lives: Vec<f32> = buffers.velocities.current().iter().map(|v| v.life).collect();
        assert!(lives.iter().all(|&life| life < 0.0));
        assert!(lives.iter().all(|&life| life >= -params.lifecycle.max_respawn_delay));
        assert!(lives.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn respawn_life_is_strictly_negative() {
        let lifecycle = LifecycleParams {
            min_respawn_delay: 0.0,
            max_respawn_delay: 0.0,
            ..LifecycleParams::default()
        };
        let life = respawn_life(GridCoord { x: 0, y: 0 }, 1, &lifecycle);
        assert!(life < 0.0);
    }

    #[test]
    fn swap_moves_both_buffers_together() {
        let params = SimulationParams::default();
        let mut buffers = ParticleBuffers::new(&[Vec3::ZERO], &params);
        buffers.velocities.split_mut().1[0].velocity = vec3(1.0, 0.0, 0.0);
        buffers.positions.split_mut().1[0].position = vec3(0.5, 0.0, 0.0);
        buffers.swap();
        assert_eq!(buffers.velocities.current()[0].velocity.x, 1.0);
        assert_eq!(buffers.positions.current()[0].position.x, 0.5);
    }
}
