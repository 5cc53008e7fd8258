//! Procedural mesh and texture generation.
//!
//! The demos use generated geometry rather than loaded assets: a UV sphere
//! for the textured demo and a checkerboard pixel pattern for its texture.

use glam::{Vec2, Vec3};

use prism_rhi::vertex::MeshVertex;

/// CPU-side mesh data.
pub struct Mesh {
    /// Vertex list.
    pub vertices: Vec<MeshVertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Generates a unit-radius UV sphere.
///
/// `rings` horizontal bands (latitude) and `segments` slices (longitude).
/// Vertices are duplicated along the seam so texture coordinates wrap
/// cleanly; normals equal the positions on a unit sphere.
///
/// Winding is counter-clockwise viewed from outside.
pub fn unit_sphere(rings: u32, segments: u32) -> Mesh {
    assert!(rings >= 2 && segments >= 3, "sphere too coarse to triangulate");

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let position = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            vertices.push(MeshVertex::new(position, position, Vec2::new(u, v)));
        }
    }

    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    let stride = segments + 1;

    for ring in 0..rings {
        for segment in 0..segments {
            let i0 = ring * stride + segment;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;

            indices.extend_from_slice(&[i0, i2, i1]);
            indices.extend_from_slice(&[i1, i2, i3]);
        }
    }

    Mesh { vertices, indices }
}

/// Generates a two-tone RGBA8 checkerboard, `tile` pixels per square.
pub fn checkerboard(width: u32, height: u32, tile: u32) -> Vec<u8> {
    assert!(tile > 0, "tile size must be non-zero");

    const LIGHT: [u8; 4] = [235, 235, 235, 255];
    const DARK: [u8; 4] = [40, 40, 60, 255];

    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let checker = ((x / tile) + (y / tile)) % 2 == 0;
            pixels.extend_from_slice(if checker { &LIGHT } else { &DARK });
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertex_and_index_counts() {
        let mesh = unit_sphere(8, 16);
        assert_eq!(mesh.vertices.len(), (8 + 1) * (16 + 1));
        assert_eq!(mesh.indices.len(), 8 * 16 * 6);
        assert_eq!(mesh.triangle_count(), 8 * 16 * 2);
    }

    #[test]
    fn sphere_indices_are_in_bounds() {
        let mesh = unit_sphere(4, 6);
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let mesh = unit_sphere(6, 12);
        for vertex in &mesh.vertices {
            let r = vertex.position.length();
            assert!((r - 1.0).abs() < 1e-5, "radius {} off unit sphere", r);
            // Normals are the positions themselves.
            assert!((vertex.normal - vertex.position).length() < 1e-6);
        }
    }

    #[test]
    fn sphere_uvs_cover_unit_square() {
        let mesh = unit_sphere(4, 8);
        for vertex in &mesh.vertices {
            assert!((0.0..=1.0).contains(&vertex.tex_coord.x));
            assert!((0.0..=1.0).contains(&vertex.tex_coord.y));
        }
        // Poles sit at v = 0 and v = 1.
        assert_eq!(mesh.vertices.first().unwrap().tex_coord.y, 0.0);
        assert_eq!(mesh.vertices.last().unwrap().tex_coord.y, 1.0);
    }

    #[test]
    fn checkerboard_size_and_alternation() {
        let pixels = checkerboard(8, 8, 2);
        assert_eq!(pixels.len(), 8 * 8 * 4);

        let pixel = |x: usize, y: usize| {
            let i = (y * 8 + x) * 4;
            [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
        };

        assert_eq!(pixel(0, 0), pixel(1, 1));
        assert_ne!(pixel(0, 0), pixel(2, 0));
        assert_eq!(pixel(0, 0), pixel(4, 0));
        // Fully opaque everywhere.
        assert!(pixels.chunks_exact(4).all(|p| p[3] == 255));
    }
}
