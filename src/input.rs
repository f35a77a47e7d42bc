/*
 * Input Module
 *
 * This module handles user input events for the simulation.
 *
 * Features:
 * - Left click outside the UI starts a morph
 * - Pointer position is cast onto the z = 0 plane for particle interaction
 * - Right drag pans the camera, the mouse wheel zooms it
 * - Raw events are forwarded to egui
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;

// Mouse moved event handler
pub fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    let window_rect = app.window_rect();
    model.mouse_position = pos;

    if model.camera.is_dragging {
        model.camera.drag(pos, window_rect);
    }

    // The UI panel swallows the pointer so hovering it does not push particles
    let pointer = if model.egui.ctx().is_pointer_over_area() {
        None
    } else {
        Some(model.camera.screen_to_world(pos, window_rect))
    };
    model.simulation.set_pointer(pointer);
}

pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }
    match button {
        MouseButton::Left => {
            model.simulation.toggle_morph();
        }
        MouseButton::Right => model.camera.start_drag(model.mouse_position),
        _ => {}
    }
}

pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Right {
        model.camera.end_drag();
    }
}

pub fn mouse_exited(_app: &App, model: &mut Model) {
    model.simulation.set_pointer(None);
    model.camera.end_drag();
}

pub fn mouse_wheel(_app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => model.camera.zoom(vec2(x, y)),
        MouseScrollDelta::PixelDelta(pos) => model.camera.zoom(vec2(pos.x as f32, pos.y as f32) * 0.01),
    }
}

pub fn resized(_app: &App, _model: &mut Model, size: Vec2) {
    // Projection reads the window rect every frame; nothing to rebuild
    tracing::debug!(width = size.x, height = size.y, "window resized");
}

pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
