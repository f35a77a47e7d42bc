/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct holding every tunable
 * constant of the simulation: particle count, morph timing, force
 * coefficients, capability flags and presentation settings.
 *
 * Parameters are loaded once at startup with layered precedence
 * (highest wins):
 * 1. The file named by the LOGOMORPH_CONFIG environment variable
 * 2. logomorph.toml in the working directory
 * 3. Built-in defaults
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MorphError, Result};

// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LOGOMORPH_CONFIG";

// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "logomorph.toml";

// Largest texture side accepted (N = size²).
pub const MAX_TEXTURE_SIZE: u32 = 2048;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    // Side of the particle grid; the particle count is its square.
    pub texture_size: u32,
    // Upper bound for a single frame's delta time, in seconds.
    pub max_delta_time: f32,
    pub enable_parallel: bool,
    pub morph: MorphParams,
    pub attraction: AttractionParams,
    pub interaction: InteractionParams,
    pub flocking: FlockingParams,
    pub damping: DampingParams,
    pub lifecycle: LifecycleParams,
    pub explosion: ExplosionParams,
    pub presentation: PresentationParams,
    pub logos: LogoParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphParams {
    // Seconds from morph start to completion.
    pub duration: f32,
    // Largest per-particle start delay, as a fraction of the morph.
    pub max_stagger: f32,
    pub color_transition_start: f32,
    pub color_transition_end: f32,
    // Idle seconds before a morph starts on its own. Zero disables it.
    pub auto_morph_interval: f32,
    // Eased progress window in which flocking forces act during a morph.
    pub flocking_window_start: f32,
    pub flocking_window_end: f32,
    // Ramp attraction back up while flocking before the morph ends.
    pub enable_return_force: bool,
    pub settle_start: f32,
    pub settle_end: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionParams {
    // Pull toward home while idle, per second.
    pub idle_strength: f32,
    pub morph_strength_min: f32,
    pub morph_strength_max: f32,
    // Extra multiplier while flocking during a morph.
    pub flocking_boost: f32,
    // Attraction scale during free flocking when the return force is on.
    pub free_flocking_scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionParams {
    // Idle pointer repulsion.
    pub repel_radius: f32,
    pub repel_strength: f32,
    // Flocking predator avoidance.
    pub predator_radius: f32,
    pub predator_strength: f32,
    // Respawn a lifecycle particle pushed further than this many repel radii from home.
    pub sweep_respawn_factor: f32,
}

// How the force integrator picks the neighbors of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NeighborSampling {
    // (2r+1)² block around the particle in texture space.
    Ring { radius: u32 },
    // A samples_per_axis² grid spread over the whole texture.
    Strided { samples_per_axis: u32 },
    // World-space bucket grid with cells of one zone radius.
    Spatial { max_neighbors: usize },
}

impl Default for NeighborSampling {
    fn default() -> Self {
        NeighborSampling::Ring { radius: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    pub start_enabled: bool,
    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub intensity: f32,
    pub bounds: f32,
    // Fraction of `bounds` where the inward push begins.
    pub bounds_threshold: f32,
    pub bounds_strength: f32,
    pub speed_limit: f32,
    // How far an over-speed velocity moves toward the limit each frame.
    pub speed_limit_blend: f32,
    pub curl_noise_intensity: f32,
    pub curl_noise_scale: f32,
    pub sampling: NeighborSampling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingParams {
    pub idle: f32,
    pub flocking: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleParams {
    pub enabled: bool,
    // Seconds a particle lives in idle mode.
    pub lifespan: f32,
    pub min_respawn_delay: f32,
    pub max_respawn_delay: f32,
    // Fractions of life used to fade in and out.
    pub fade_in: f32,
    pub fade_out: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionParams {
    pub enabled: bool,
    pub strength: f32,
    pub duration: f32,
    // Blend of the random direction toward straight outward.
    pub outward_blend: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationParams {
    pub particle_size: f32,
    pub camera_distance: f32,
    pub field_of_view: f32,
    // Extra camera distance at full perturbation.
    pub perturbation_pullback: f32,
    pub fog: bool,
    pub fog_near: f32,
    pub fog_far: f32,
}

// Where a logo comes from and how its pixels become points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoSource {
    pub name: String,
    pub path: PathBuf,
    pub scale: f32,
    pub y_offset: f32,
    pub z_spread: f32,
    pub base_size: f32,
    // Size added for fully dark pixels.
    pub darkness_size_boost: f32,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoParams {
    pub a: LogoSource,
    pub b: LogoSource,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            texture_size: 128,
            max_delta_time: 1.0 / 30.0,
            enable_parallel: true,
            morph: MorphParams::default(),
            attraction: AttractionParams::default(),
            interaction: InteractionParams::default(),
            flocking: FlockingParams::default(),
            damping: DampingParams::default(),
            lifecycle: LifecycleParams::default(),
            explosion: ExplosionParams::default(),
            presentation: PresentationParams::default(),
            logos: LogoParams::default(),
        }
    }
}

impl Default for MorphParams {
    fn default() -> Self {
        Self {
            duration: 6.0,
            max_stagger: 0.3,
            color_transition_start: 0.2,
            color_transition_end: 0.8,
            auto_morph_interval: 15.0,
            flocking_window_start: 0.1,
            flocking_window_end: 0.9,
            enable_return_force: true,
            settle_start: 0.6,
            settle_end: 0.85,
        }
    }
}

impl Default for AttractionParams {
    fn default() -> Self {
        Self {
            idle_strength: 0.5,
            morph_strength_min: 1.0,
            morph_strength_max: 8.0,
            flocking_boost: 1.5,
            free_flocking_scale: 0.2,
        }
    }
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            repel_radius: 15.0,
            repel_strength: 300.0,
            predator_radius: 25.0,
            predator_strength: 80.0,
            sweep_respawn_factor: 3.0,
        }
    }
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            start_enabled: false,
            separation_distance: 15.0,
            alignment_distance: 25.0,
            cohesion_distance: 30.0,
            separation_weight: 6.0,
            alignment_weight: 4.0,
            cohesion_weight: 3.0,
            intensity: 0.7,
            bounds: 120.0,
            bounds_threshold: 0.8,
            bounds_strength: 8.0,
            speed_limit: 8.0,
            speed_limit_blend: 0.2,
            curl_noise_intensity: 0.5,
            curl_noise_scale: 0.1,
            sampling: NeighborSampling::default(),
        }
    }
}

impl Default for DampingParams {
    fn default() -> Self {
        Self {
            idle: 0.94,
            flocking: 0.9,
        }
    }
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            enabled: false,
            lifespan: 6.0,
            min_respawn_delay: 0.05,
            max_respawn_delay: 1.5,
            fade_in: 0.1,
            fade_out: 0.2,
        }
    }
}

impl Default for ExplosionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 60.0,
            duration: 1.2,
            outward_blend: 0.3,
        }
    }
}

impl Default for PresentationParams {
    fn default() -> Self {
        Self {
            particle_size: 1.5,
            camera_distance: 80.0,
            field_of_view: 75.0,
            perturbation_pullback: 12.0,
            fog: false,
            fog_near: 60.0,
            fog_far: 160.0,
        }
    }
}

impl Default for LogoSource {
    fn default() -> Self {
        Self {
            name: "logo".to_string(),
            path: PathBuf::from("assets/logo.png"),
            scale: 0.18,
            y_offset: 0.0,
            z_spread: 0.1,
            base_size: 0.9,
            darkness_size_boost: 0.3,
            seed: 1,
        }
    }
}

impl Default for LogoParams {
    fn default() -> Self {
        Self {
            a: LogoSource {
                name: "primary".to_string(),
                path: PathBuf::from("assets/logo_a.png"),
                ..LogoSource::default()
            },
            b: LogoSource {
                name: "secondary".to_string(),
                path: PathBuf::from("assets/logo_b.png"),
                scale: 0.06,
                y_offset: 1.8,
                z_spread: 0.3,
                base_size: 1.1,
                darkness_size_boost: 0.0,
                seed: 2,
            },
        }
    }
}

impl SimulationParams {
    /// Load parameters with layered precedence: defaults < local file < env var.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            tracing::info!(path = %path, "loading config from {}", CONFIG_ENV_VAR);
            return Self::load_from_file(Path::new(&path));
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            tracing::info!(path = %local_path.display(), "loading local config");
            return Self::load_from_file(&local_path);
        }

        tracing::info!("no config file found, using defaults");
        let params = Self::default();
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a single TOML file. Missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let params: SimulationParams = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Number of simulated particles.
    pub fn particle_count(&self) -> usize {
        let size = self.texture_size as usize;
        size * size
    }

    /// Radius of the combined separation, alignment and cohesion zones.
    pub fn zone_radius(&self) -> f32 {
        self.flocking.separation_distance
            + self.flocking.alignment_distance
            + self.flocking.cohesion_distance
    }

    /// Reject parameter sets the integrators cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.texture_size == 0 || self.texture_size > MAX_TEXTURE_SIZE {
            return Err(invalid(format!(
                "texture_size must be between 1 and {}, got {}",
                MAX_TEXTURE_SIZE, self.texture_size
            )));
        }
        if !(self.max_delta_time > 0.0) {
            return Err(invalid("max_delta_time must be positive"));
        }

        let morph = &self.morph;
        if !(morph.duration > 0.0) {
            return Err(invalid("morph.duration must be positive"));
        }
        if !(0.0..1.0).contains(&morph.max_stagger) {
            return Err(invalid("morph.max_stagger must be in [0, 1)"));
        }
        if morph.color_transition_start >= morph.color_transition_end {
            return Err(invalid("morph.color_transition_start must be below color_transition_end"));
        }
        if morph.flocking_window_start >= morph.flocking_window_end {
            return Err(invalid("morph.flocking_window_start must be below flocking_window_end"));
        }
        if morph.settle_start >= morph.settle_end {
            return Err(invalid("morph.settle_start must be below settle_end"));
        }
        if !(morph.auto_morph_interval >= 0.0) {
            return Err(invalid("morph.auto_morph_interval must not be negative"));
        }

        let interaction = &self.interaction;
        if interaction.repel_radius < 0.0 || interaction.predator_radius < 0.0 {
            return Err(invalid("interaction radii must not be negative"));
        }

        let flocking = &self.flocking;
        if flocking.separation_distance < 0.0
            || flocking.alignment_distance < 0.0
            || flocking.cohesion_distance < 0.0
        {
            return Err(invalid("flocking distances must not be negative"));
        }
        if !(self.zone_radius() > 0.0) {
            return Err(invalid("flocking zone radius must be positive"));
        }
        if !(flocking.bounds > 0.0) {
            return Err(invalid("flocking.bounds must be positive"));
        }
        if !(flocking.bounds_threshold > 0.0 && flocking.bounds_threshold < 1.0) {
            return Err(invalid("flocking.bounds_threshold must be in (0, 1)"));
        }
        if !(flocking.speed_limit > 0.0) {
            return Err(invalid("flocking.speed_limit must be positive"));
        }
        match flocking.sampling {
            NeighborSampling::Ring { radius: 0 } => {
                return Err(invalid("flocking.sampling.radius must be positive"));
            }
            NeighborSampling::Strided { samples_per_axis: 0 } => {
                return Err(invalid("flocking.sampling.samples_per_axis must be positive"));
            }
            NeighborSampling::Spatial { max_neighbors: 0 } => {
                return Err(invalid("flocking.sampling.max_neighbors must be positive"));
            }
            _ => {}
        }

        for (name, factor) in [("idle", self.damping.idle), ("flocking", self.damping.flocking)] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(invalid(format!("damping.{} must be in (0, 1]", name)));
            }
        }

        let lifecycle = &self.lifecycle;
        if lifecycle.enabled {
            if !(lifecycle.lifespan > 0.0) {
                return Err(invalid("lifecycle.lifespan must be positive"));
            }
            if lifecycle.min_respawn_delay < 0.0 || lifecycle.max_respawn_delay < lifecycle.min_respawn_delay {
                return Err(invalid("lifecycle respawn delays must satisfy 0 <= min <= max"));
            }
        }

        if self.explosion.enabled && !(self.explosion.duration > 0.0) {
            return Err(invalid("explosion.duration must be positive"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> MorphError {
    MorphError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = SimulationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.particle_count(), 128 * 128);
        assert_eq!(params.zone_radius(), 70.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let params = SimulationParams::from_toml_str(
            r#"
            texture_size = 64

            [morph]
            duration = 3.0

            [flocking]
            sampling = { kind = "strided", samples_per_axis = 8 }

            [lifecycle]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(params.texture_size, 64);
        assert_eq!(params.morph.duration, 3.0);
        assert_eq!(params.morph.max_stagger, 0.3);
        assert_eq!(
            params.flocking.sampling,
            NeighborSampling::Strided { samples_per_axis: 8 }
        );
        assert!(params.lifecycle.enabled);
        assert_eq!(params.damping.idle, 0.94);
    }

    #[test]
    fn rejects_zero_texture_size() {
        let err = SimulationParams::from_toml_str("texture_size = 0").unwrap_err();
        assert!(matches!(err, MorphError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_damping_above_one() {
        let mut params = SimulationParams::default();
        params.damping.flocking = 1.2;
        assert!(matches!(params.validate(), Err(MorphError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_full_stagger() {
        let mut params = SimulationParams::default();
        params.morph.max_stagger = 1.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_empty_ring() {
        let mut params = SimulationParams::default();
        params.flocking.sampling = NeighborSampling::Ring { radius: 0 };
        assert!(matches!(params.validate(), Err(MorphError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SimulationParams::from_toml_str("texture_size = \"big\"").unwrap_err();
        assert!(matches!(err, MorphError::ConfigParse(_)));
    }
}
