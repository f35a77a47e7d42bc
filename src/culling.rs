/*
 * Culling Module
 *
 * Determines which particles are worth drawing this frame: the particle
 * must be visible (non-zero lifecycle alpha) and project inside the window
 * rect, expanded by a margin so points straddling the edge are kept.
 */

use nannou::prelude::*;

use crate::camera::Camera;
use crate::presentation::FrameOutput;

/// A particle that survived culling, already projected.
#[derive(Debug, Clone, Copy)]
pub struct VisibleParticle {
    pub index: usize,
    pub screen: Vec2,
    /// Pixels per world unit at the particle's depth.
    pub scale: f32,
    pub depth: f32,
}

pub fn visible_particles(output: &FrameOutput, camera: &Camera, window_rect: Rect, margin: f32) -> Vec<VisibleParticle> {
    let bounds = window_rect.pad(-margin);
    let mut visible = Vec::with_capacity(output.len());

    for index in 0..output.len() {
        if output.alpha(index) <= 0.0 {
            continue;
        }
        let position = output.position(index);
        let Some((screen, scale)) = camera.world_to_screen(position, window_rect) else {
            continue;
        };
        if bounds.contains(screen) {
            visible.push(VisibleParticle {
                index,
                screen,
                scale,
                depth: camera.depth_of(position),
            });
        }
    }

    visible
}
