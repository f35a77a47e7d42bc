/*
 * Renderer Module
 *
 * This module handles the rendering of the particle cloud. Each visible
 * particle is drawn as a small square whose color and size are blended
 * between logos and whose opacity comes from the lifecycle fade and the
 * optional depth fog.
 */

use nannou::prelude::*;

use crate::app::Model;
use crate::culling;
use crate::math::smoothstep;
use crate::ui;

/// World-space edge length of a size-1 particle at particle_size 1.
const WORLD_POINT_SIZE: f32 = 0.25;
/// Screen margin kept around the window so edge particles do not pop.
const CULL_MARGIN: f32 = 8.0;

pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let output = model.simulation.frame_output();
    let presentation = &model.simulation.params().presentation;

    let visible = culling::visible_particles(&output, &model.camera, window_rect, CULL_MARGIN);
    model.debug_info.set_visible_particles(visible.len());

    for particle in &visible {
        let color = output.color(particle.index);
        let fog = if presentation.fog {
            1.0 - smoothstep(presentation.fog_near, presentation.fog_far, particle.depth)
        } else {
            1.0
        };
        let alpha = output.alpha(particle.index) * color.w * fog;
        if alpha <= 0.0 {
            continue;
        }

        let size = (output.size(particle.index) * presentation.particle_size * WORLD_POINT_SIZE * particle.scale).max(1.0);
        draw.rect()
            .xy(particle.screen)
            .w_h(size, size)
            .color(rgba(color.x, color.y, color.z, alpha));
    }

    if model.ui_state.show_debug {
        ui::draw_debug_info(
            &draw,
            &model.debug_info,
            window_rect,
            output.len(),
            model.camera.distance,
        );
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        tracing::warn!(error = ?err, "failed to render particles");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        tracing::warn!(error = ?err, "failed to render ui");
    }
}
