// src/geometry.rs
// Static grid geometry for the terrain surface.
// The grid is built once; relief comes from the displacement map in the
// vertex shader, so vertex data is never rewritten after construction.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::Result;

/// Vertex format (matches the WGSL shader: position, normal, uv)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2, // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list forming a regular grid.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub segments_x: u32,
    pub segments_y: u32,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recompute per-vertex normals from the triangles (area weighted).
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let a = Vec3::from(self.vertices[ia].position);
            let b = Vec3::from(self.vertices[ib].position);
            let c = Vec3::from(self.vertices[ic].position);
            // Unnormalized: length is twice the triangle area.
            let face = (c - b).cross(a - b);
            normals[ia] += face;
            normals[ib] += face;
            normals[ic] += face;
        }

        for (vertex, n) in self.vertices.iter_mut().zip(normals) {
            // Unreferenced vertices keep a sane default instead of NaN.
            vertex.normal = n.try_normalize().unwrap_or(Vec3::Z).to_array();
        }
    }
}

/// Plane of `width` x `height` in the XY plane, centred on the origin and
/// facing +Z, subdivided into `segments_x` x `segments_y` cells. UV (0, 0) is
/// the top-left corner so rows line up with image rows.
///
/// Normals are computed once before returning.
pub fn build_surface(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Result<Geometry> {
    crate::ensure!(
        width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0,
        "surface size must be positive and finite, got {}x{}",
        width,
        height
    );
    crate::ensure!(
        segments_x > 0 && segments_y > 0,
        "surface needs at least one segment per axis, got {}x{}",
        segments_x,
        segments_y
    );

    let grid_x1 = segments_x + 1;
    let grid_y1 = segments_y + 1;
    let segment_w = width / segments_x as f32;
    let segment_h = height / segments_y as f32;
    let half_w = width * 0.5;
    let half_h = height * 0.5;

    let mut vertices = Vec::with_capacity((grid_x1 * grid_y1) as usize);
    for iy in 0..grid_y1 {
        let y = iy as f32 * segment_h - half_h;
        for ix in 0..grid_x1 {
            let x = ix as f32 * segment_w - half_w;
            vertices.push(Vertex {
                position: [x, -y, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [
                    ix as f32 / segments_x as f32,
                    iy as f32 / segments_y as f32,
                ],
            });
        }
    }

    let mut indices = Vec::with_capacity((segments_x * segments_y * 6) as usize);
    for iy in 0..segments_y {
        for ix in 0..segments_x {
            let a = ix + grid_x1 * iy;
            let b = ix + grid_x1 * (iy + 1);
            let c = (ix + 1) + grid_x1 * (iy + 1);
            let d = (ix + 1) + grid_x1 * iy;
            // Counter-clockwise seen from +Z.
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut geometry = Geometry {
        vertices,
        indices,
        segments_x,
        segments_y,
    };
    geometry.compute_vertex_normals();

    log::debug!(
        "Built surface {}x{} with {} vertices / {} triangles",
        width,
        height,
        geometry.vertex_count(),
        geometry.triangle_count()
    );
    Ok(geometry)
}
