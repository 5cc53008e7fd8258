//! Textured sphere demo renderer.
//!
//! A procedurally generated UV sphere with a checkerboard texture,
//! depth-tested and lit by a fixed directional term in the fragment
//! shader. Camera and object uniforms are per frame slot so a slot's
//! buffers are only rewritten once its previous frame has retired.

use std::path::Path;

use ash::vk;
use glam::Mat4;

use prism_rhi::RhiResult;
use prism_rhi::buffer::{Buffer, BufferUsage};
use prism_rhi::descriptor::{
    self, DescriptorBinding, DescriptorPool, DescriptorSetLayout,
};
use prism_rhi::pipeline::{CullMode, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use prism_rhi::shader::{Shader, ShaderStage};
use prism_rhi::texture::Texture;
use prism_rhi::vertex::MeshVertex;

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::backend::RecordContext;
use crate::mesh;
use crate::renderer::Renderer;
use crate::ubo::{CameraUbo, ObjectUbo};

use prism_scene::Camera;

/// Sphere tessellation: latitude bands and longitude slices.
const SPHERE_RINGS: u32 = 32;
const SPHERE_SEGMENTS: u32 = 48;

/// Checkerboard texture dimensions and tile size in pixels.
const TEXTURE_SIZE: u32 = 256;
const TEXTURE_TILE: u32 = 16;

/// Spin rate around the Y axis, radians per second.
const SPIN_RATE: f32 = 0.4;

/// Per-slot uniform resources.
struct SlotUniforms {
    camera_ubo: Buffer,
    object_ubo: Buffer,
    descriptor_set: vk::DescriptorSet,
}

/// Renders a spinning, textured, depth-tested sphere.
pub struct SphereRenderer {
    pipeline: Pipeline,
    layout: PipelineLayout,
    _descriptor_layout: DescriptorSetLayout,
    _descriptor_pool: DescriptorPool,
    _texture: Texture,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    uniforms: Vec<SlotUniforms>,
    rotation: f32,
}

impl SphereRenderer {
    /// Builds the sphere's GPU resources against the renderer's render
    /// pass: mesh buffers, texture, per-slot UBOs and descriptor sets, and
    /// the pipeline.
    pub fn new(renderer: &Renderer) -> RhiResult<Self> {
        let device = renderer.device().clone();

        // Geometry.
        let sphere = mesh::unit_sphere(SPHERE_RINGS, SPHERE_SEGMENTS);
        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&sphere.vertices),
        )?;
        let index_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Index,
            bytemuck::cast_slice(&sphere.indices),
        )?;

        // Texture.
        let pixels = mesh::checkerboard(TEXTURE_SIZE, TEXTURE_SIZE, TEXTURE_TILE);
        let texture = Texture::from_rgba8(
            device.clone(),
            renderer.upload_pool(),
            TEXTURE_SIZE,
            TEXTURE_SIZE,
            &pixels,
        )?;

        // Descriptors: camera UBO, object UBO, sampled texture.
        let bindings = [
            DescriptorBinding::uniform_buffer(
                0,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            ),
            DescriptorBinding::uniform_buffer(1, vk::ShaderStageFlags::VERTEX),
            DescriptorBinding::combined_image_sampler(2, vk::ShaderStageFlags::FRAGMENT),
        ];
        let descriptor_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;

        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count((MAX_FRAMES_IN_FLIGHT * 2) as u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32),
        ];
        let descriptor_pool =
            DescriptorPool::new(device.clone(), MAX_FRAMES_IN_FLIGHT as u32, &pool_sizes)?;

        let layouts = vec![descriptor_layout.handle(); MAX_FRAMES_IN_FLIGHT];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        let mut uniforms = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for &descriptor_set in &descriptor_sets {
            let camera_ubo =
                Buffer::new(device.clone(), BufferUsage::Uniform, CameraUbo::SIZE as u64)?;
            let object_ubo =
                Buffer::new(device.clone(), BufferUsage::Uniform, ObjectUbo::SIZE as u64)?;

            descriptor::write_uniform_buffer(
                &device,
                descriptor_set,
                0,
                camera_ubo.handle(),
                CameraUbo::SIZE as u64,
            );
            descriptor::write_uniform_buffer(
                &device,
                descriptor_set,
                1,
                object_ubo.handle(),
                ObjectUbo::SIZE as u64,
            );
            descriptor::write_combined_image_sampler(
                &device,
                descriptor_set,
                2,
                texture.view(),
                texture.sampler(),
            );

            uniforms.push(SlotUniforms {
                camera_ubo,
                object_ubo,
                descriptor_set,
            });
        }

        // Pipeline.
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/sphere.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/sphere.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        let layout = PipelineLayout::new(device.clone(), &[descriptor_layout.handle()], &[])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(MeshVertex::binding_description())
            .vertex_attributes(&MeshVertex::attribute_descriptions())
            .cull_mode(CullMode::None)
            .build(device, &layout, renderer.render_pass())?;

        Ok(Self {
            pipeline,
            layout,
            _descriptor_layout: descriptor_layout,
            _descriptor_pool: descriptor_pool,
            _texture: texture,
            vertex_buffer,
            index_buffer,
            index_count: sphere.indices.len() as u32,
            uniforms,
            rotation: 0.0,
        })
    }

    /// Advances the spin animation.
    pub fn update(&mut self, delta_secs: f32) {
        self.rotation = (self.rotation + SPIN_RATE * delta_secs) % std::f32::consts::TAU;
    }

    /// Records the sphere draw, refreshing the active slot's uniforms.
    ///
    /// # Errors
    ///
    /// Returns an error if a uniform upload fails.
    pub fn record(&self, ctx: &mut RecordContext, camera: &Camera) -> RhiResult<()> {
        let slot = &self.uniforms[ctx.slot()];

        let camera_data = CameraUbo::new(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.position,
        );
        slot.camera_ubo.upload(bytemuck::bytes_of(&camera_data))?;

        let object_data = ObjectUbo::new(Mat4::from_rotation_y(self.rotation));
        slot.object_ubo.upload(bytemuck::bytes_of(&object_data))?;

        let cmd = ctx.cmd();
        cmd.bind_pipeline(self.pipeline.handle());
        cmd.bind_descriptor_sets(self.layout.handle(), 0, &[slot.descriptor_set]);
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.draw_indexed(self.index_count, 1);

        Ok(())
    }
}
