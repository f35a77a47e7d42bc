/*
 * Camera Module
 *
 * This module defines the Camera struct: a perspective camera on the +Z
 * axis looking at the origin. It handles zooming (camera distance) and
 * panning (target offset in the z = 0 plane), and provides coordinate
 * transformations between world space and screen space.
 *
 * During an explosion the camera is pulled back by the simulation's
 * perturbation amount.
 */

use nannou::prelude::*;

pub struct Camera {
    /// Point in the z = 0 plane the camera looks at.
    pub target: Vec2,
    pub distance: f32,
    pub field_of_view: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub perturbation_pullback: f32,
    pub drag_start: Option<Vec2>,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
    perturbation: f32,
}

impl Camera {
    pub fn new(distance: f32, field_of_view: f32, perturbation_pullback: f32) -> Self {
        Self {
            target: Vec2::ZERO,
            distance,
            field_of_view,
            min_distance: distance * 0.2,
            max_distance: distance * 5.0,
            perturbation_pullback,
            drag_start: None,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
            perturbation: 0.0,
        }
    }

    /// Current perturbation in [0, 1]; pulls the eye back along +Z.
    pub fn set_perturbation(&mut self, perturbation: f32) {
        self.perturbation = perturbation.clamp(0.0, 1.0);
    }

    fn eye_distance(&self) -> f32 {
        self.distance + self.perturbation * self.perturbation_pullback
    }

    // Pixels per world unit at depth zero for the given window height
    fn focal_length(&self, window_rect: Rect) -> f32 {
        let half_fov = (self.field_of_view.to_radians() / 2.0).max(1e-3);
        window_rect.h() / 2.0 / half_fov.tan()
    }

    /// Project a world point to screen space. Returns the screen point and
    /// the perspective scale at that depth, or `None` behind the camera.
    pub fn world_to_screen(&self, point: Vec3, window_rect: Rect) -> Option<(Vec2, f32)> {
        let depth = self.eye_distance() - point.z;
        if depth <= 1e-3 {
            return None;
        }
        let scale = self.focal_length(window_rect) / depth;
        let relative = vec2(point.x - self.target.x, point.y - self.target.y);
        Some((relative * scale + window_rect.xy(), scale))
    }

    /// Cast a ray through a screen point and intersect it with the z = 0 plane.
    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec3 {
        let scale = self.focal_length(window_rect) / self.eye_distance();
        let world = (point - window_rect.xy()) / scale + self.target;
        vec3(world.x, world.y, 0.0)
    }

    /// Distance from the eye to a world point, for depth fog.
    pub fn depth_of(&self, point: Vec3) -> f32 {
        let eye = vec3(self.target.x, self.target.y, self.eye_distance());
        (point - eye).length()
    }

    // Handle mouse wheel events for zooming
    pub fn zoom(&mut self, scroll_delta: Vec2) {
        let zoom_factor = 1.0 - scroll_delta.y * 0.1;
        self.distance = (self.distance * zoom_factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.drag_start = Some(position);
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    // Pan so the world point under the cursor follows it
    pub fn drag(&mut self, position: Vec2, window_rect: Rect) {
        if self.is_dragging {
            let delta = position - self.last_cursor_pos;
            if delta.length_squared() > 0.0 {
                let scale = self.focal_length(window_rect) / self.eye_distance();
                self.target -= delta / scale;
                self.last_cursor_pos = position;
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_start = None;
        self.is_dragging = false;
    }
}
