/*
 * Presentation Module
 *
 * Per-frame view of the simulation for the renderer.
 *
 * Colors and sizes live in the logo point clouds and are never touched by
 * the integrators; they are blended here from the color source logo to the
 * destination logo by the controller's color blend.
 */

use nannou::prelude::*;

use crate::controller::SimulationState;
use crate::logo::LogoPointCloud;
use crate::params::{LifecycleParams, SimulationParams};
use crate::particle::{PositionSample, VelocitySample};

pub struct FrameOutput<'a> {
    positions: &'a [PositionSample],
    velocities: &'a [VelocitySample],
    source: &'a LogoPointCloud,
    target: &'a LogoPointCloud,
    lifecycle: &'a LifecycleParams,
    lifecycle_visible: bool,
    pub color_blend: f32,
    pub morphing: bool,
    pub flocking: bool,
    pub exploding: bool,
    pub perturbation: f32,
}

impl<'a> FrameOutput<'a> {
    pub fn new(
        positions: &'a [PositionSample],
        velocities: &'a [VelocitySample],
        source: &'a LogoPointCloud,
        target: &'a LogoPointCloud,
        state: &SimulationState,
        params: &'a SimulationParams,
    ) -> Self {
        Self {
            positions,
            velocities,
            source,
            target,
            lifecycle: &params.lifecycle,
            lifecycle_visible: params.lifecycle.enabled && state.is_pure_idle(),
            color_blend: state.color_blend,
            morphing: state.is_morphing(),
            flocking: state.flocking,
            exploding: state.exploding,
            perturbation: state.perturbation,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index].position
    }

    pub fn positions(&self) -> &'a [PositionSample] {
        self.positions
    }

    pub fn color(&self, index: usize) -> Vec4 {
        let from = self.source.colors()[index];
        let to = self.target.colors()[index];
        from + (to - from) * self.color_blend
    }

    pub fn size(&self, index: usize) -> f32 {
        let from = self.source.sizes()[index];
        let to = self.target.sizes()[index];
        from + (to - from) * self.color_blend
    }

    /// Opacity from the lifecycle fade; 1 whenever the lifecycle is not running.
    pub fn alpha(&self, index: usize) -> f32 {
        if !self.lifecycle_visible {
            return 1.0;
        }
        lifecycle_alpha(self.velocities[index].life, self.lifecycle)
    }
}

/// Fade in at birth and out before death; zero while dormant.
pub fn lifecycle_alpha(life: f32, lifecycle: &LifecycleParams) -> f32 {
    if life < 0.0 {
        return 0.0;
    }
    let mut alpha = 1.0f32;
    if lifecycle.fade_in > 0.0 {
        alpha = alpha.min(life / lifecycle.fade_in);
    }
    if lifecycle.fade_out > 0.0 {
        alpha = alpha.min((1.0 - life) / lifecycle.fade_out);
    }
    alpha.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dormant_particles_are_invisible() {
        let lifecycle = LifecycleParams::default();
        assert_eq!(lifecycle_alpha(-0.2, &lifecycle), 0.0);
        assert_eq!(lifecycle_alpha(0.0, &lifecycle), 0.0);
        assert_eq!(lifecycle_alpha(0.5, &lifecycle), 1.0);
        assert!((lifecycle_alpha(0.05, &lifecycle) - 0.5).abs() < 1e-5);
        assert!((lifecycle_alpha(0.9, &lifecycle) - 0.5).abs() < 1e-5);
        assert_eq!(lifecycle_alpha(1.0, &lifecycle), 0.0);
    }
}
