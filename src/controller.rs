/*
 * Controller Module
 *
 * The simulation state machine. The Controller is the only writer of
 * SimulationState: it applies user events (toggle morph, toggle flocking,
 * pointer moves), advances the frame timers and produces one immutable
 * FrameParams snapshot per frame for the integrators to read.
 *
 * Frame protocol:
 *   begin_frame(dt) -> FrameParams   (timers, auto-morph, explosion expiry)
 *   ... integrators run ...
 *   end_frame() -> Option<LogoId>    (morph completion)
 */

use nannou::prelude::*;

use crate::math::smoothstep;
use crate::params::SimulationParams;

/// Far outside any flocking bounds; used with a zero radius when the pointer is off.
pub const INTERACTION_SENTINEL: f32 = -1.0e4;

/// Frames longer than this are reported before being clamped.
const FRAME_SPIKE_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoId {
    A,
    B,
}

impl LogoId {
    pub fn other(self) -> Self {
        match self {
            LogoId::A => LogoId::B,
            LogoId::B => LogoId::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            LogoId::A => 0,
            LogoId::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Morphing,
}

/// How far a flocking morph has settled back onto its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlockingPhase {
    Free,
    Settling,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    None,
    Repel,
    Predator,
}

/// The pointer as the integrators see it this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub mode: InteractionMode,
    pub point: Vec3,
    pub radius: f32,
    pub strength: f32,
}

impl Interaction {
    pub fn inactive() -> Self {
        Self {
            mode: InteractionMode::None,
            point: Vec3::splat(INTERACTION_SENTINEL),
            radius: 0.0,
            strength: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub mode: Mode,
    pub flocking: bool,
    pub exploding: bool,
    pub morph_progress: f32,
    pub active_logo: LogoId,
    pub home_logo: LogoId,
    /// Logo whose colors the blend starts from.
    pub source_logo: LogoId,
    pub target_logo: Option<LogoId>,
    pub interaction_point: Option<Vec3>,
    pub color_blend: f32,
    pub flocking_phase: Option<FlockingPhase>,
    pub perturbation: f32,
    pub time: f32,
    pub frame: u64,
}

impl SimulationState {
    pub fn is_morphing(&self) -> bool {
        self.mode == Mode::Morphing
    }

    /// Neither morphing nor flocking.
    pub fn is_pure_idle(&self) -> bool {
        self.mode == Mode::Idle && !self.flocking
    }
}

/// Everything the integrators need to know about the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub delta_time: f32,
    pub time: f32,
    pub morphing: bool,
    pub flocking: bool,
    pub morph_progress: f32,
    /// Impulse magnitude this frame; zero outside an explosion.
    pub explosion_strength: f32,
    /// 0 while flocking is free, 1 once the settling window has passed.
    pub return_ramp: f32,
    pub flocking_intensity: f32,
    pub interaction: Interaction,
    /// First pure-idle frame after a non-idle stretch.
    pub reseed_life: bool,
}

impl FrameParams {
    pub fn pure_idle(&self) -> bool {
        !self.morphing && !self.flocking
    }
}

pub struct Controller {
    params: SimulationParams,
    state: SimulationState,
    morph_elapsed: f32,
    idle_elapsed: f32,
    explosion_elapsed: Option<f32>,
    was_pure_idle: bool,
}

impl Controller {
    pub fn new(params: &SimulationParams) -> Self {
        let flocking = params.flocking.start_enabled;
        Self {
            params: params.clone(),
            state: SimulationState {
                mode: Mode::Idle,
                flocking,
                exploding: false,
                morph_progress: 0.0,
                active_logo: LogoId::A,
                home_logo: LogoId::A,
                source_logo: LogoId::A,
                target_logo: None,
                interaction_point: None,
                color_blend: 1.0,
                flocking_phase: flocking.then_some(FlockingPhase::Free),
                perturbation: 0.0,
                time: 0.0,
                frame: 0,
            },
            morph_elapsed: 0.0,
            idle_elapsed: 0.0,
            explosion_elapsed: None,
            was_pure_idle: !flocking,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Start a morph toward the other logo. Ignored while a morph is running.
    pub fn toggle_morph(&mut self) -> bool {
        if self.state.is_morphing() {
            tracing::debug!(progress = self.state.morph_progress, "toggle_morph ignored while morphing");
            return false;
        }

        let state = &mut self.state;
        state.active_logo = state.active_logo.other();
        state.target_logo = Some(state.active_logo);
        state.source_logo = state.home_logo;
        state.mode = Mode::Morphing;
        state.morph_progress = 0.0;
        state.color_blend = 0.0;
        self.morph_elapsed = 0.0;
        self.idle_elapsed = 0.0;

        if state.flocking && self.params.explosion.enabled {
            self.explosion_elapsed = Some(0.0);
            state.exploding = true;
            state.perturbation = 1.0;
        }

        tracing::info!(
            from = ?state.source_logo,
            to = ?state.active_logo,
            flocking = state.flocking,
            exploding = state.exploding,
            "morph started"
        );
        true
    }

    /// Flip flocking on or off. Allowed in any state; returns the new flag.
    pub fn toggle_flocking(&mut self) -> bool {
        self.state.flocking = !self.state.flocking;
        tracing::debug!(enabled = self.state.flocking, "flocking toggled");
        self.state.flocking
    }

    pub fn set_pointer(&mut self, point: Option<Vec3>) {
        self.state.interaction_point = point.filter(|p| p.is_finite());
    }

    /// Advance timers by one frame and snapshot the parameters for the integrators.
    pub fn begin_frame(&mut self, raw_delta_time: f32) -> FrameParams {
        let max_delta_time = self.params.max_delta_time;
        if raw_delta_time > FRAME_SPIKE_SECONDS {
            tracing::warn!(raw_delta_time, max_delta_time, "frame spike clamped");
        }
        let dt = if raw_delta_time.is_finite() {
            raw_delta_time.clamp(0.0, max_delta_time)
        } else {
            0.0
        };

        self.state.time += dt;
        self.state.frame += 1;

        let auto_interval = self.params.morph.auto_morph_interval;
        if self.state.mode == Mode::Idle && auto_interval > 0.0 {
            self.idle_elapsed += dt;
            if self.idle_elapsed >= auto_interval {
                tracing::debug!(idle_seconds = self.idle_elapsed, "auto morph");
                self.toggle_morph();
            }
        }

        if self.state.is_morphing() {
            self.morph_elapsed += dt;
            self.state.morph_progress = (self.morph_elapsed / self.params.morph.duration).min(1.0);
        }

        let explosion_strength = self.advance_explosion(dt);

        let morph = &self.params.morph;
        let morphing = self.state.is_morphing();
        let progress = self.state.morph_progress;
        self.state.color_blend = if morphing {
            smoothstep(morph.color_transition_start, morph.color_transition_end, progress)
        } else {
            1.0
        };

        let return_ramp = if morphing && self.state.flocking && morph.enable_return_force {
            smoothstep(morph.settle_start, morph.settle_end, progress)
        } else {
            0.0
        };
        self.state.flocking_phase = match (self.state.flocking, morphing && morph.enable_return_force) {
            (false, _) => None,
            (true, false) => Some(FlockingPhase::Free),
            (true, true) if progress < morph.settle_start => Some(FlockingPhase::Free),
            (true, true) if progress < morph.settle_end => Some(FlockingPhase::Settling),
            (true, true) => Some(FlockingPhase::Settled),
        };

        let pure_idle = self.state.is_pure_idle();
        let reseed_life = pure_idle && !self.was_pure_idle;
        self.was_pure_idle = pure_idle;

        FrameParams {
            delta_time: dt,
            time: self.state.time,
            morphing,
            flocking: self.state.flocking,
            morph_progress: progress,
            explosion_strength,
            return_ramp,
            flocking_intensity: self.params.flocking.intensity * (1.0 - return_ramp),
            interaction: self.interaction(),
            reseed_life,
        }
    }

    /// Finish the morph once progress reaches 1. Returns the new home logo.
    pub fn end_frame(&mut self) -> Option<LogoId> {
        if !self.state.is_morphing() || self.state.morph_progress < 1.0 {
            return None;
        }

        let state = &mut self.state;
        state.mode = Mode::Idle;
        state.home_logo = state.active_logo;
        state.source_logo = state.active_logo;
        state.target_logo = None;
        state.color_blend = 1.0;
        state.exploding = false;
        state.perturbation = 0.0;
        state.flocking_phase = state.flocking.then_some(FlockingPhase::Free);
        self.explosion_elapsed = None;
        self.idle_elapsed = 0.0;

        tracing::info!(home = ?state.home_logo, frame = state.frame, "morph complete");
        Some(state.home_logo)
    }

    fn advance_explosion(&mut self, dt: f32) -> f32 {
        let Some(elapsed) = self.explosion_elapsed else {
            return 0.0;
        };
        let explosion = &self.params.explosion;
        let elapsed = elapsed + dt;
        if elapsed >= explosion.duration {
            tracing::debug!(elapsed, "explosion finished");
            self.explosion_elapsed = None;
            self.state.exploding = false;
            self.state.perturbation = 0.0;
            return 0.0;
        }

        self.explosion_elapsed = Some(elapsed);
        let remaining = 1.0 - elapsed / explosion.duration;
        self.state.perturbation = remaining;
        explosion.strength * remaining
    }

    fn interaction(&self) -> Interaction {
        let Some(point) = self.state.interaction_point else {
            return Interaction::inactive();
        };
        let params = &self.params.interaction;
        match (self.state.is_morphing(), self.state.flocking) {
            (_, true) => Interaction {
                mode: InteractionMode::Predator,
                point,
                radius: params.predator_radius,
                strength: params.predator_strength,
            },
            (false, false) => Interaction {
                mode: InteractionMode::Repel,
                point,
                radius: params.repel_radius,
                strength: params.repel_strength,
            },
            (true, false) => Interaction::inactive(),
        }
    }
}
