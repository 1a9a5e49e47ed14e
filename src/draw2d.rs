use glam::Vec2;
use image::RgbaImage;

use crate::gpu::GpuContext;
use crate::texture::{Sprite, Texture};

/// An axis-aligned rectangle in logical screen pixels (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size whose top-left corner is `top_left`.
    pub fn from_top_left(top_left: Vec2, size: Vec2) -> Self {
        Self::new(top_left.x, top_left.y, size.x, size.y)
    }

    /// Rectangle of the given size centred on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::from_top_left(center - size * 0.5, size)
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.top_left() + self.size() * 0.5
    }
}

/// RGBA color in linear space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from 8-bit sRGB components, as found in image editors.
    pub fn from_srgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub(crate) fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

fn srgb_to_linear(component: u8) -> f32 {
    let c = component as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Handle to a sprite registered with [`Draw2d::add_sprite`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId(pub(crate) usize);

/// Vertex for 2D sprite rendering.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2d {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2d {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Uniforms for 2D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// What a draw call samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Source {
    Sprite(usize),
    /// Index into the per-frame texture list.
    Transient(usize),
}

/// A contiguous vertex range drawn with one bind group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DrawCall {
    pub source: Source,
    pub start: u32,
    pub count: u32,
}

/// One frame's quads and the draw calls that cover them, in submission order.
#[derive(Debug, Default)]
pub(crate) struct DrawBatch {
    vertices: Vec<Vertex2d>,
    calls: Vec<DrawCall>,
}

impl DrawBatch {
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            calls: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.calls.clear();
    }

    pub fn vertices(&self) -> &[Vertex2d] {
        &self.vertices
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Append a sprite quad at the sprite's natural `size`, or log and skip
    /// it when `size` is `None` because the id was never registered.
    pub fn sprite(&mut self, id: SpriteId, size: Option<Vec2>, top_left: Vec2) {
        let Some(size) = size else {
            log::warn!("ignoring draw of unknown sprite {:?}", id);
            return;
        };
        let dest = Rect::from_top_left(top_left, size);
        self.push_quad(Source::Sprite(id.0), dest, Color::WHITE);
    }

    /// Append a quad covering `dest`. Extends the last call when it samples
    /// the same source, otherwise starts a new one.
    pub fn push_quad(&mut self, source: Source, dest: Rect, color: Color) {
        if self.vertices.len() + 6 > MAX_VERTICES {
            log::warn!("Draw2d vertex budget exhausted, dropping quad");
            return;
        }

        let c = color.to_array();
        let (x0, y0) = (dest.x, dest.y);
        let (x1, y1) = (dest.x + dest.width, dest.y + dest.height);

        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            Vertex2d {
                position: [x0, y0],
                uv: [0.0, 0.0],
                color: c,
            },
            Vertex2d {
                position: [x1, y0],
                uv: [1.0, 0.0],
                color: c,
            },
            Vertex2d {
                position: [x0, y1],
                uv: [0.0, 1.0],
                color: c,
            },
            Vertex2d {
                position: [x1, y0],
                uv: [1.0, 0.0],
                color: c,
            },
            Vertex2d {
                position: [x1, y1],
                uv: [1.0, 1.0],
                color: c,
            },
            Vertex2d {
                position: [x0, y1],
                uv: [0.0, 1.0],
                color: c,
            },
        ]);

        match self.calls.last_mut() {
            Some(last) if last.source == source => last.count += 6,
            _ => self.calls.push(DrawCall {
                source,
                start,
                count: 6,
            }),
        }
    }
}

/// Immediate-mode 2D drawing API for sprites.
///
/// Draw calls are recorded during the frame and replayed in submission order,
/// so later calls are composited on top of earlier ones. Adjacent calls that
/// share a source are merged into one GPU draw.
pub struct Draw2d {
    pipeline: wgpu::RenderPipeline,

    // Shared resources
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,

    // Sprites that live for the whole app, and ones uploaded for this frame only
    sprites: Vec<Sprite>,
    transient: Vec<Sprite>,

    batch: DrawBatch,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/draw2d.wgsl").into()),
        });

        // Uniform buffer
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Uniform bind group layout (group 0)
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Texture bind group layout (group 1)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_pipeline(gpu, &shader, &pipeline_layout);

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            sprites: Vec::new(),
            transient: Vec::new(),
            batch: DrawBatch::with_capacity(1024),
        }
    }

    /// Clear all draw calls and release last frame's transient textures.
    pub fn clear(&mut self) {
        self.batch.clear();
        self.transient.clear();
    }

    /// Register a texture that stays available for the lifetime of the app.
    pub fn add_sprite(&mut self, gpu: &GpuContext, texture: Texture) -> SpriteId {
        let sprite = Sprite::new(gpu, texture, &self.texture_bind_group_layout);
        self.sprites.push(sprite);
        SpriteId(self.sprites.len() - 1)
    }

    /// Draw a registered sprite at its natural size with its top-left
    /// corner at `top_left`. Unknown ids are logged and skipped.
    pub fn sprite(&mut self, id: SpriteId, top_left: Vec2) {
        let size = self.sprites.get(id.0).map(Sprite::size);
        self.batch.sprite(id, size, top_left);
    }

    /// Upload `image` for this frame only and draw it over `dest`.
    ///
    /// The texture is dropped on the next [`Draw2d::clear`].
    pub fn image(&mut self, gpu: &GpuContext, image: &RgbaImage, dest: Rect, label: &str) {
        let texture = Texture::from_image(gpu, image, label);
        let sprite = Sprite::new(gpu, texture, &self.texture_bind_group_layout);
        self.transient.push(sprite);
        self.batch.push_quad(
            Source::Transient(self.transient.len() - 1),
            dest,
            Color::WHITE,
        );
    }

    /// Render all recorded draw calls in submission order.
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        let resolution = gpu.logical_size();
        let uniforms = Draw2dUniforms {
            resolution: [resolution.x, resolution.y],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        if self.batch.vertices().is_empty() {
            return;
        }
        gpu.queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(self.batch.vertices()),
        );

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        for call in self.batch.calls() {
            let sprite = match call.source {
                Source::Sprite(index) => &self.sprites[index],
                Source::Transient(index) => &self.transient[index],
            };
            render_pass.set_bind_group(1, &sprite.bind_group, &[]);
            render_pass.draw(call.start..call.start + call.count, 0..1);
        }
    }
}

fn create_pipeline(
    gpu: &GpuContext,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
) -> wgpu::RenderPipeline {
    // Straight alpha in, straight alpha over the framebuffer
    let blend_state = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    };

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Draw2d Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex2d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_textured"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}
