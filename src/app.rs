/*
 * Application Module
 *
 * This module defines the nannou application model and the per-frame
 * update. The simulation itself (including logo decoding) is built before
 * the event loop starts, so asset failures are reported and the process
 * exits before any window opens; `preload` hands the finished simulation to
 * `model`.
 */

use nannou::prelude::*;
use nannou_egui::Egui;
use std::sync::Mutex;
use std::time::Instant;

use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::input::{mouse_exited, mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event, resized};
use crate::renderer::view;
use crate::simulation::Simulation;
use crate::ui::{self, UiState};

static PRELOADED: Mutex<Option<Simulation>> = Mutex::new(None);

/// Hand a ready simulation to the next call of `model`.
pub fn preload(simulation: Simulation) {
    match PRELOADED.lock() {
        Ok(mut slot) => *slot = Some(simulation),
        Err(poisoned) => *poisoned.into_inner() = Some(simulation),
    }
}

// Main model for the application
pub struct Model {
    pub simulation: Simulation,
    pub egui: Egui,
    pub camera: Camera,
    pub debug_info: DebugInfo,
    pub ui_state: UiState,
    pub mouse_position: Vec2,
}

pub fn model(app: &App) -> Model {
    let simulation = PRELOADED
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .expect("simulation must be preloaded before the app starts");

    // Get the primary monitor's dimensions
    let monitor = app.primary_monitor().expect("Failed to get primary monitor");
    let monitor_size = monitor.size();

    // Calculate window size based on monitor size (80% of monitor size)
    let window_width = monitor_size.width as f32 * 0.8;
    let window_height = monitor_size.height as f32 * 0.8;

    let window_id = app
        .new_window()
        .title("Logo Morph")
        .size(window_width as u32, window_height as u32)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_exited(mouse_exited)
        .mouse_wheel(mouse_wheel)
        .resized(resized)
        .raw_event(raw_window_event)
        .build()
        .unwrap();

    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    let presentation = &simulation.params().presentation;
    let camera = Camera::new(
        presentation.camera_distance,
        presentation.field_of_view,
        presentation.perturbation_pullback,
    );

    tracing::info!(
        width = window_width,
        height = window_height,
        particles = simulation.particle_count(),
        "window created"
    );

    Model {
        simulation,
        egui,
        camera,
        debug_info: DebugInfo::default(),
        ui_state: UiState::default(),
        mouse_position: Vec2::ZERO,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;

    ui::update_ui(&mut model.egui, &mut model.simulation, &mut model.ui_state, &model.debug_info);

    if !model.ui_state.pause_simulation {
        let start = Instant::now();
        model.simulation.step(update.since_last.as_secs_f32());
        model.debug_info.step_time = start.elapsed();
    }

    model.camera.set_perturbation(model.simulation.state().perturbation);
}
