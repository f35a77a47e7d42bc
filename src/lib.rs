/*
 * Logo Morph - Module Definitions
 *
 * This file defines the module structure of the logo morphing particle
 * simulation. The simulation core (particle, physics, flocking, controller,
 * simulation) has no dependency on the window; the app, input, ui and
 * renderer modules wrap it in a nannou application.
 */

// Re-export key components for easier access
pub use camera::Camera;
pub use controller::{Controller, FrameParams, LogoId, Mode, SimulationState};
pub use error::{MorphError, Result};
pub use logo::{LogoPoint, LogoPointCloud};
pub use params::SimulationParams;
pub use presentation::FrameOutput;
pub use simulation::Simulation;
pub use spatial_grid::SpatialGrid;
pub use debug::DebugInfo;
pub use app::Model;

// Define modules
pub mod app;
pub mod camera;
pub mod controller;
pub mod culling;
pub mod debug;
pub mod error;
pub mod flocking;
pub mod hash;
pub mod input;
pub mod logo;
pub mod math;
pub mod params;
pub mod particle;
pub mod physics;
pub mod presentation;
pub mod renderer;
pub mod simulation;
pub mod spatial_grid;
pub mod ui;
