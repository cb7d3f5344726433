//! Terrain Height
//!
//! Ground height and normal at a world X/Z, used by stroke paths that follow
//! the ground.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub height: f32,
    pub normal: Vec3,
}

pub trait TerrainProvider {
    /// `None` outside the terrain.
    fn sample(&self, x: f32, z: f32) -> Option<TerrainSample>;
}

/// Infinite flat ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub height: f32,
}

impl FlatTerrain {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl TerrainProvider for FlatTerrain {
    fn sample(&self, _x: f32, _z: f32) -> Option<TerrainSample> {
        Some(TerrainSample {
            height: self.height,
            normal: Vec3::Y,
        })
    }
}

/// Regular grid of heights starting at `origin` (X/Z), bilinearly
/// interpolated between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightFieldTerrain {
    origin: Vec3,
    cell: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
}

impl HeightFieldTerrain {
    /// `heights` is row-major with `width` samples per row along X.
    pub fn new(origin: Vec3, cell: f32, width: usize, heights: Vec<f32>) -> Self {
        let width = width.max(1);
        let depth = heights.len() / width;
        Self {
            origin,
            cell: cell.max(f32::EPSILON),
            width,
            depth,
            heights,
        }
    }

    /// Heights from a function sampled on the grid.
    pub fn from_fn(origin: Vec3, cell: f32, width: usize, depth: usize, f: impl Fn(f32, f32) -> f32) -> Self {
        let heights = (0..depth)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| f(origin.x + col as f32 * cell, origin.z + row as f32 * cell))
            .collect();
        Self::new(origin, cell, width, heights)
    }

    fn at(&self, col: usize, row: usize) -> f32 {
        self.heights[row.min(self.depth - 1) * self.width + col.min(self.width - 1)]
    }

    fn height(&self, x: f32, z: f32) -> Option<f32> {
        if self.depth == 0 {
            return None;
        }
        let gx = (x - self.origin.x) / self.cell;
        let gz = (z - self.origin.z) / self.cell;
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        if gx < 0.0 || gz < 0.0 || gx > max_x || gz > max_z {
            return None;
        }
        let (col, row) = (gx.floor() as usize, gz.floor() as usize);
        let (tx, tz) = (gx.fract(), gz.fract());
        let near = self.at(col, row) * (1.0 - tx) + self.at(col + 1, row) * tx;
        let far = self.at(col, row + 1) * (1.0 - tx) + self.at(col + 1, row + 1) * tx;
        Some(self.origin.y + near * (1.0 - tz) + far * tz)
    }
}

impl TerrainProvider for HeightFieldTerrain {
    fn sample(&self, x: f32, z: f32) -> Option<TerrainSample> {
        let height = self.height(x, z)?;
        // Normal from the height gradient; edges fall back to the center sample
        let epsilon = self.cell * 0.5;
        let h_dx = self.height(x + epsilon, z).unwrap_or(height);
        let h_dz = self.height(x, z + epsilon).unwrap_or(height);
        let tangent_x = Vec3::new(epsilon, h_dx - height, 0.0);
        let tangent_z = Vec3::new(0.0, h_dz - height, epsilon);
        Some(TerrainSample {
            height,
            normal: tangent_z.cross(tangent_x).normalize_or(Vec3::Y),
        })
    }
}
