/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that contains performance metrics
 * displayed in the UI and the on-screen debug panel.
 *
 * Includes metrics for:
 * - FPS (frames per second) and frame time
 * - Time spent in the simulation step
 * - Number of particles drawn after culling
 * - Rayon worker threads available to the integrators
 */

use std::sync::Mutex;
use std::time::Duration;

pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub step_time: Duration,
    /// Written by the view, which only gets a shared reference to the model.
    pub visible_particles: Mutex<usize>,
    pub worker_threads: usize,
}

impl DebugInfo {
    pub fn visible_particles(&self) -> usize {
        self.visible_particles.lock().map(|count| *count).unwrap_or(0)
    }

    pub fn set_visible_particles(&self, count: usize) {
        if let Ok(mut visible) = self.visible_particles.lock() {
            *visible = count;
        }
    }
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time: Duration::ZERO,
            step_time: Duration::ZERO,
            visible_particles: Mutex::new(0),
            worker_threads: rayon::current_num_threads(),
        }
    }
}
