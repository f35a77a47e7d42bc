/*
 * Simulation Module
 *
 * Owns the whole simulation: parameters, both logo point clouds, the
 * particle buffers, the controller and the neighbor sampler. One call to
 * `step` runs a frame in fixed order:
 *
 *   controller.begin_frame -> force pass -> position pass -> swap -> controller.end_frame
 *
 * Home and target positions are never copied into per-particle storage;
 * the passes receive slices of the logo clouds selected by the controller's
 * home and target logo ids.
 */

use nannou::prelude::*;

use crate::controller::{Controller, FrameParams, LogoId, SimulationState};
use crate::error::{MorphError, Result};
use crate::flocking::NeighborSampler;
use crate::logo::LogoPointCloud;
use crate::params::SimulationParams;
use crate::particle::{ParticleBuffers, PositionSample, VelocitySample};
use crate::physics;
use crate::presentation::FrameOutput;

pub struct Simulation {
    params: SimulationParams,
    logos: [LogoPointCloud; 2],
    buffers: ParticleBuffers,
    controller: Controller,
    sampler: NeighborSampler,
}

impl Simulation {
    /// Build a simulation from two already generated point clouds.
    pub fn new(params: SimulationParams, logo_a: LogoPointCloud, logo_b: LogoPointCloud) -> Result<Self> {
        params.validate()?;
        let expected = params.particle_count();
        for logo in [&logo_a, &logo_b] {
            if logo.len() != expected {
                return Err(MorphError::PointCountMismatch {
                    logo: logo.name.clone(),
                    expected,
                    got: logo.len(),
                });
            }
        }

        let buffers = ParticleBuffers::new(logo_a.positions(), &params);
        let controller = Controller::new(&params);
        let sampler = NeighborSampler::new(&params);

        tracing::info!(
            particles = expected,
            texture_size = params.texture_size,
            parallel = params.enable_parallel,
            lifecycle = params.lifecycle.enabled,
            explosion = params.explosion.enabled,
            "simulation ready"
        );

        Ok(Self {
            params,
            logos: [logo_a, logo_b],
            buffers,
            controller,
            sampler,
        })
    }

    /// Decode both configured logo images and build the simulation.
    pub fn load(params: SimulationParams) -> Result<Self> {
        params.validate()?;
        let count = params.particle_count();
        let logo_a = LogoPointCloud::load(&params.logos.a, count)?;
        let logo_b = LogoPointCloud::load(&params.logos.b, count)?;
        Self::new(params, logo_a, logo_b)
    }

    /// Advance the simulation by one frame of (unclamped) `delta_time` seconds.
    pub fn step(&mut self, delta_time: f32) -> FrameParams {
        let frame = self.controller.begin_frame(delta_time);
        let state = self.controller.state();
        let home = self.logos[state.home_logo.index()].positions();
        let target = state.target_logo.map(|id| self.logos[id.index()].positions());

        if frame.flocking {
            self.sampler.prepare(self.buffers.positions.current());
        }

        physics::force_pass(&mut self.buffers, home, target, &self.sampler, &frame, &self.params);
        physics::position_pass(&mut self.buffers, home, &frame, &self.params);
        self.buffers.swap();

        if let Some(home_logo) = self.controller.end_frame() {
            tracing::debug!(logo = %self.logos[home_logo.index()].name, "home positions reassigned");
        }
        frame
    }

    pub fn toggle_morph(&mut self) -> bool {
        self.controller.toggle_morph()
    }

    pub fn toggle_flocking(&mut self) -> bool {
        self.controller.toggle_flocking()
    }

    /// Set or clear the world-space pointer point.
    pub fn set_pointer(&mut self, point: Option<Vec3>) {
        self.controller.set_pointer(point);
    }

    pub fn state(&self) -> &SimulationState {
        self.controller.state()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn particle_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn logo(&self, id: LogoId) -> &LogoPointCloud {
        &self.logos[id.index()]
    }

    pub fn positions(&self) -> &[PositionSample] {
        self.buffers.positions.current()
    }

    pub fn velocities(&self) -> &[VelocitySample] {
        self.buffers.velocities.current()
    }

    pub fn home_positions(&self) -> &[Vec3] {
        self.logo(self.state().home_logo).positions()
    }

    /// Destination of each particle; `None` unless a morph is running.
    pub fn target_positions(&self) -> Option<&[Vec3]> {
        self.state().target_logo.map(|id| self.logo(id).positions())
    }

    /// Overwrite one particle between frames.
    pub fn place_particle(&mut self, index: usize, position: Vec3, velocity: Vec3, life: f32) {
        if index >= self.buffers.len() {
            tracing::warn!(index, count = self.buffers.len(), "place_particle index out of range");
            return;
        }
        self.buffers.positions.current_mut()[index] = PositionSample { position, life };
        self.buffers.velocities.current_mut()[index] = VelocitySample { velocity, life };
    }

    pub fn is_finite(&self) -> bool {
        self.buffers.all_finite()
    }

    /// Everything the renderer needs for the current frame.
    pub fn frame_output(&self) -> FrameOutput<'_> {
        let state = self.state();
        let source = self.logo(state.source_logo);
        let target = self.logo(state.target_logo.unwrap_or(state.active_logo));
        FrameOutput::new(
            self.positions(),
            self.velocities(),
            source,
            target,
            state,
            &self.params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo::LogoPoint;

    fn cloud(name: &str, points: &[Vec3]) -> LogoPointCloud {
        let raw: Vec<LogoPoint> = points
            .iter()
            .map(|&position| LogoPoint {
                position,
                color: vec4(1.0, 1.0, 1.0, 1.0),
                size: 1.0,
            })
            .collect();
        LogoPointCloud::from_points(name, &raw, points.len()).unwrap()
    }

    fn params() -> SimulationParams {
        let mut params = SimulationParams::default();
        params.texture_size = 2;
        params.morph.auto_morph_interval = 0.0;
        params
    }

    #[test]
    fn rejects_mismatched_point_counts() {
        let a = cloud("a", &[Vec3::ZERO; 4]);
        let b = cloud("b", &[Vec3::ZERO; 3]);
        let err = Simulation::new(params(), a, b).err().unwrap();
        assert!(matches!(err, MorphError::PointCountMismatch { expected: 4, got: 3, .. }));
    }

    #[test]
    fn target_exists_only_while_morphing() {
        let a = cloud("a", &[Vec3::ZERO; 4]);
        let b = cloud("b", &[vec3(1.0, 0.0, 0.0); 4]);
        let mut sim = Simulation::new(params(), a, b).unwrap();
        assert!(sim.target_positions().is_none());
        sim.toggle_morph();
        assert_eq!(sim.target_positions().unwrap()[0], vec3(1.0, 0.0, 0.0));
        assert_eq!(sim.home_positions()[0], Vec3::ZERO);
    }

    #[test]
    fn step_keeps_particle_count() {
        let a = cloud("a", &[Vec3::ZERO, vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), vec3(1.0, 1.0, 0.0)]);
        let b = cloud("b", &[vec3(5.0, 5.0, 5.0); 4]);
        let mut sim = Simulation::new(params(), a, b).unwrap();
        sim.toggle_flocking();
        sim.toggle_morph();
        for _ in 0..200 {
            sim.step(1.0 / 60.0);
            assert_eq!(sim.particle_count(), 4);
            assert_eq!(sim.positions().len(), 4);
            assert_eq!(sim.velocities().len(), 4);
        }
        assert!(sim.is_finite());
    }

    #[test]
    fn place_particle_ignores_out_of_range() {
        let a = cloud("a", &[Vec3::ZERO; 4]);
        let b = cloud("b", &[Vec3::ZERO; 4]);
        let mut sim = Simulation::new(params(), a, b).unwrap();
        sim.place_particle(9, Vec3::splat(1.0), Vec3::splat(1.0), 1.0);
        sim.place_particle(2, Vec3::splat(1.0), Vec3::ZERO, 1.0);
        assert_eq!(sim.positions()[2].position, Vec3::splat(1.0));
    }
}
