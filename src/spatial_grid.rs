/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for world-space neighbor
 * lookups while flocking. It divides a cube around the origin into cells one
 * zone radius wide, so every neighbor inside the zone radius of a particle
 * lives in the 3x3x3 block of cells around it.
 *
 * The grid is rebuilt from the current position buffer once per frame and
 * is only read during the force pass, so queries take &self and are safe to
 * run from many threads at once.
 */

use nannou::prelude::*;

/// The grid covers this multiple of the flocking bounds on each side.
const EXTENT_FACTOR: f32 = 1.25;
/// Hard cap on cells per axis so a tiny zone radius cannot explode memory.
const MAX_CELLS_PER_AXIS: usize = 64;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    pub cell_size: f32,
    pub cells_per_axis: usize,
    half_extent: f32,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, bounds: f32) -> Self {
        let half_extent = (bounds * EXTENT_FACTOR).max(cell_size);
        let cells_per_axis = ((2.0 * half_extent / cell_size).ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        // Cells may grow past the requested size when the axis count was capped.
        let cell_size = cell_size.max(2.0 * half_extent / cells_per_axis as f32);

        Self {
            cell_size,
            cells_per_axis,
            half_extent,
            cells: vec![Vec::new(); cells_per_axis * cells_per_axis * cells_per_axis],
        }
    }

    // Convert a world coordinate to a clamped cell coordinate
    #[inline]
    fn axis_cell(&self, value: f32) -> usize {
        let cell = ((value + self.half_extent) / self.cell_size).floor();
        if cell.is_nan() {
            return 0;
        }
        cell.clamp(0.0, (self.cells_per_axis - 1) as f32) as usize
    }

    #[inline]
    fn cell_coords(&self, position: Vec3) -> [usize; 3] {
        [
            self.axis_cell(position.x),
            self.axis_cell(position.y),
            self.axis_cell(position.z),
        ]
    }

    #[inline]
    fn flat_index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.cells_per_axis + y) * self.cells_per_axis + x
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Vec3) {
        let cell = self.flat_index(self.cell_coords(position));
        self.cells[cell].push(index);
    }

    /// Clear and insert every position in index order.
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        self.clear();
        for (index, position) in positions.into_iter().enumerate() {
            self.insert(index, position);
        }
    }

    /// Visit the indices stored in the 3x3x3 block around `position`.
    ///
    /// Cells are walked in a fixed order and each cell keeps insertion order,
    /// so the visit sequence is deterministic for a given build. The callback
    /// returns `false` to stop early.
    pub fn visit_nearby<F>(&self, position: Vec3, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        let [cx, cy, cz] = self.cell_coords(position);
        let last = self.cells_per_axis - 1;

        for z in cz.saturating_sub(1)..=(cz + 1).min(last) {
            for y in cy.saturating_sub(1)..=(cy + 1).min(last) {
                for x in cx.saturating_sub(1)..=(cx + 1).min(last) {
                    for &index in &self.cells[self.flat_index([x, y, z])] {
                        if !visit(index) {
                            return;
                        }
                    }
                }
            }
        }
    }

    pub fn get_nearby_indices(&self, position: Vec3) -> Vec<usize> {
        let mut result = Vec::new();
        self.visit_nearby(position, |index| {
            result.push(index);
            true
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_points_in_adjacent_cells() {
        let mut grid = SpatialGrid::new(10.0, 40.0);
        grid.rebuild(vec![
            vec3(0.0, 0.0, 0.0),
            vec3(9.0, 0.0, 0.0),
            vec3(-8.0, 5.0, 3.0),
            vec3(45.0, 45.0, 45.0),
        ]);

        let nearby = grid.get_nearby_indices(vec3(1.0, 1.0, 1.0));
        assert!(nearby.contains(&0));
        assert!(nearby.contains(&1));
        assert!(nearby.contains(&2));
        assert!(!nearby.contains(&3));
    }

    #[test]
    fn out_of_range_positions_clamp_to_edge_cells() {
        let mut grid = SpatialGrid::new(10.0, 20.0);
        grid.insert(7, vec3(1.0e6, -1.0e6, f32::NAN));
        let nearby = grid.get_nearby_indices(vec3(1.0e6, -1.0e6, -1.0e6));
        assert_eq!(nearby, vec![7]);
    }

    #[test]
    fn visit_stops_when_asked() {
        let mut grid = SpatialGrid::new(10.0, 20.0);
        grid.rebuild(vec![Vec3::ZERO; 5]);
        let mut seen = 0;
        grid.visit_nearby(Vec3::ZERO, |_| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn axis_count_is_capped() {
        let grid = SpatialGrid::new(0.01, 1000.0);
        assert_eq!(grid.cells_per_axis, MAX_CELLS_PER_AXIS);
        assert!(grid.cell_size * MAX_CELLS_PER_AXIS as f32 >= 2.0 * 1000.0 * EXTENT_FACTOR - 1e-2);
    }
}
