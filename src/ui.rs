/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui: the morph and flocking buttons, simulation stats and
 * the on-screen debug panel.
 */

use nannou_egui::{egui, Egui};

use crate::controller::{LogoId, Mode};
use crate::debug::DebugInfo;
use crate::simulation::Simulation;

/// Host-side toggles that never reach the simulation.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub show_debug: bool,
    pub pause_simulation: bool,
}

// Build the control window and apply any button presses
pub fn update_ui(egui: &mut Egui, simulation: &mut Simulation, ui_state: &mut UiState, debug_info: &DebugInfo) {
    let mut morph_clicked = false;
    let mut flocking_clicked = false;
    let state = simulation.state().clone();
    let other_logo = simulation.logo(state.active_logo.other()).name.clone();
    let particle_count = simulation.particle_count();

    let ctx = egui.begin_frame();

    egui::Window::new("Logo Morph")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            let morph_label = match state.mode {
                Mode::Idle => format!("Switch to {} logo", other_logo),
                Mode::Morphing => format!("Morphing... {:.0}%", state.morph_progress * 100.0),
            };
            if ui.button(morph_label).clicked() {
                morph_clicked = true;
            }

            let flocking_label = if state.flocking { "Disable Flocking" } else { "Enable Flocking" };
            if ui.button(flocking_label).clicked() {
                flocking_clicked = true;
            }

            ui.collapsing("Stats", |ui| {
                ui.label(format!("Particles: {}", particle_count));
                ui.label(format!("Active logo: {}", logo_label(state.active_logo)));
                if let Some(phase) = state.flocking_phase {
                    ui.label(format!("Flocking: {:?}", phase));
                }
                if state.exploding {
                    ui.label("Exploding");
                }
                ui.separator();
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Step time: {:.2} ms", debug_info.step_time.as_secs_f64() * 1000.0));
                ui.label(format!("Visible particles: {}", debug_info.visible_particles()));
            });

            ui.checkbox(&mut ui_state.show_debug, "Show Debug Info");
            ui.checkbox(&mut ui_state.pause_simulation, "Pause Simulation");
        });

    if morph_clicked {
        simulation.toggle_morph();
    }
    if flocking_clicked {
        simulation.toggle_flocking();
    }
}

fn logo_label(id: LogoId) -> &'static str {
    match id {
        LogoId::A => "A",
        LogoId::B => "B",
    }
}

// Draw debug information on the screen
pub fn draw_debug_info(
    draw: &nannou::Draw,
    debug_info: &DebugInfo,
    window_rect: nannou::geom::Rect,
    particle_count: usize,
    camera_distance: f32,
) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 220.0;
    let panel_height = line_height * 5.0 + margin;
    let panel_x = window_rect.right() - panel_width / 2.0;
    let panel_y = window_rect.top() - panel_height / 2.0;

    draw.rect()
        .x_y(panel_x, panel_y)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width + margin;
    let text_y = window_rect.top() - margin;

    let debug_texts = [
        format!("FPS: {:.1}", debug_info.fps),
        format!("Step time: {:.2} ms", debug_info.step_time.as_secs_f64() * 1000.0),
        format!("Particles: {}", particle_count),
        format!("Visible: {}", debug_info.visible_particles()),
        format!("Camera distance: {:.1} ({} threads)", camera_distance, debug_info.worker_threads),
    ];

    for (i, text) in debug_texts.iter().enumerate() {
        let y = text_y - (i as f32 * line_height);
        draw.text(text)
            .x_y(text_x + 80.0, y)
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
