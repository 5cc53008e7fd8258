//! Flat triangle demo renderer.
//!
//! No vertex buffers: positions and colors live in the vertex shader,
//! indexed by `gl_VertexIndex`. Records into the command buffer handed to
//! it and touches no synchronization state.

use std::path::Path;

use prism_rhi::RhiResult;
use prism_rhi::pipeline::{CullMode, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use prism_rhi::shader::{Shader, ShaderStage};

use crate::backend::RecordContext;
use crate::renderer::Renderer;

/// Renders a single shaded triangle.
pub struct TriangleRenderer {
    pipeline: Pipeline,
    _layout: PipelineLayout,
}

impl TriangleRenderer {
    /// Builds the triangle pipeline against the renderer's render pass.
    pub fn new(renderer: &Renderer) -> RhiResult<Self> {
        let device = renderer.device().clone();

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/triangle.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/triangle.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        let layout = PipelineLayout::new(device.clone(), &[], &[])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .cull_mode(CullMode::None)
            .depth_test(false)
            .depth_write(false)
            .build(device, &layout, renderer.render_pass())?;

        Ok(Self {
            pipeline,
            _layout: layout,
        })
    }

    /// Records the triangle draw.
    pub fn record(&self, ctx: &mut RecordContext) {
        ctx.cmd().bind_pipeline(self.pipeline.handle());
        ctx.cmd().draw(3, 1);
    }
}
