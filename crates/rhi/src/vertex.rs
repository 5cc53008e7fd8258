//! Vertex data structures and input descriptions.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Standard mesh vertex: position, normal, and texture coordinates.
///
/// `#[repr(C)]` layout, 32 bytes total:
/// - offset 0: position (12 bytes), shader location 0
/// - offset 12: normal (12 bytes), shader location 1
/// - offset 24: tex_coord (8 bytes), shader location 2
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in object space.
    pub position: Vec3,
    /// Surface normal, expected normalized.
    pub normal: Vec3,
    /// Texture coordinates.
    pub tex_coord: Vec2,
}

impl MeshVertex {
    /// Creates a new vertex.
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Vertex input binding description for binding 0, per-vertex rate.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Vertex attribute descriptions matching the field layout.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn vertex_layout() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(offset_of!(MeshVertex, position), 0);
        assert_eq!(offset_of!(MeshVertex, normal), 12);
        assert_eq!(offset_of!(MeshVertex, tex_coord), 24);
    }

    #[test]
    fn binding_matches_struct_size() {
        let binding = MeshVertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 32);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn attributes_match_offsets() {
        let attrs = MeshVertex::attribute_descriptions();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
        assert_eq!(attrs[2].format, vk::Format::R32G32_SFLOAT);
    }

    #[test]
    fn vertex_casts_through_bytemuck() {
        let vertex = MeshVertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::Y,
            Vec2::new(0.5, 0.25),
        );
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 32);

        let back: &MeshVertex = bytemuck::from_bytes(bytes);
        assert_eq!(back.position, vertex.position);
        assert_eq!(back.tex_coord, vertex.tex_coord);
    }
}
