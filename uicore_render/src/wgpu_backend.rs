// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`RenderBackend`] on top of `wgpu`.
//!
//! [`WgpuBackend`] owns the resources and the path pipeline. It lives as long as the device;
//! each frame borrows it together with the device, the queue and the target view through
//! [`WgpuBackend::frame`]. Staging textures are `COPY_SRC` buffers copied into the sampled
//! textures with `copy_buffer_to_texture`, so their rows must meet
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::warn;
use uicore_raster::paint::ImageId;
use wgpu::{
    Buffer, BufferUsages, CommandEncoderDescriptor, Device, Extent3d, ImageCopyBuffer,
    ImageCopyTexture, ImageDataLayout, Origin3d, Queue, Texture, TextureAspect, TextureUsages,
    TextureView,
};

use crate::backend::{
    BufferId, DeviceId, DrawCall, RenderBackend, StagingId, TextureFormat, TextureId,
};
use crate::error::BackendError;
use crate::pixmap::Pixmap;
use crate::vertex::PathVertex;

const PATH_SHADER: &str = include_str!("../shaders/path.wgsl");

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Sint32x2, 1 => Sint32, 2 => Sint32];

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

impl TextureFormat {
    fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::R8 => wgpu::TextureFormat::R8Unorm,
            Self::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

#[derive(Debug)]
struct GpuTexture {
    texture: Texture,
    view: TextureView,
    width: u32,
    height: u32,
    format: TextureFormat,
}

#[derive(Debug)]
struct GpuImage {
    _texture: Texture,
    view: TextureView,
}

#[derive(Debug)]
struct Staging {
    buffer: Buffer,
    width: u32,
    height: u32,
    format: TextureFormat,
}

impl Staging {
    fn pitch(&self) -> u32 {
        self.width * self.format.bytes_per_pixel() as u32
    }
}

/// Resources and pipeline for drawing path batches with `wgpu`.
#[derive(Debug)]
pub struct WgpuBackend {
    device_id: DeviceId,
    device_lost: Arc<AtomicBool>,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    config_buffer: Buffer,
    vertex_buffers: Vec<Buffer>,
    textures: Vec<GpuTexture>,
    staging: Vec<Staging>,
    images: Vec<GpuImage>,
    empty_image: GpuImage,
}

impl WgpuBackend {
    /// Create the path pipeline for render targets of `target_format`.
    ///
    /// Targets are expected to hold premultiplied colors.
    pub fn new(device: &Device, target_format: wgpu::TextureFormat) -> Self {
        let device_lost = Arc::new(AtomicBool::new(false));
        {
            let device_lost = Arc::clone(&device_lost);
            device.set_device_lost_callback(move |reason, message| {
                warn!("Device lost ({reason:?}): {message}");
                device_lost.store(true, Ordering::Relaxed);
            });
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("path_shader"),
            source: wgpu::ShaderSource::Wgsl(PATH_SHADER.into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("path_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("path_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("path_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<PathVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let config_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("path_config"),
            size: size_of::<[f32; 4]>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (texture, view) = create_texture(
            device,
            "path_empty_image",
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let empty_image = GpuImage {
            _texture: texture,
            view,
        };

        Self {
            device_id: DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed)),
            device_lost,
            pipeline,
            bind_group_layout,
            config_buffer,
            vertex_buffers: Vec::new(),
            textures: Vec::new(),
            staging: Vec::new(),
            images: Vec::new(),
            empty_image,
        }
    }

    /// Upload an image for image brushes.
    pub fn register_image(&mut self, device: &Device, queue: &Queue, image: &Pixmap) -> ImageId {
        let (texture, view) = create_texture(
            device,
            "path_image",
            image.width(),
            image.height(),
            wgpu::TextureFormat::Rgba8Unorm,
        );
        queue.write_texture(
            ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            image.data_as_u8_slice(),
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.width() * 4),
                rows_per_image: None,
            },
            Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
        );
        self.images.push(GpuImage {
            _texture: texture,
            view,
        });
        ImageId(self.images.len() as u32 - 1)
    }

    /// Borrow the backend for drawing into `target`.
    pub fn frame<'a>(
        &'a mut self,
        device: &'a Device,
        queue: &'a Queue,
        target: &'a TextureView,
    ) -> WgpuFrame<'a> {
        WgpuFrame {
            backend: self,
            device,
            queue,
            target,
        }
    }
}

fn create_texture(
    device: &Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (Texture, TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// A [`WgpuBackend`] bound to a device, a queue and a render target for one frame.
///
/// Every copy and draw is submitted to the queue right away, in call order.
#[derive(Debug)]
pub struct WgpuFrame<'a> {
    backend: &'a mut WgpuBackend,
    device: &'a Device,
    queue: &'a Queue,
    target: &'a TextureView,
}

impl WgpuFrame<'_> {
    fn check(&self) -> Result<(), BackendError> {
        if self.backend.device_lost.load(Ordering::Relaxed) {
            Err(BackendError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn texture(&self, id: TextureId) -> Result<&GpuTexture, BackendError> {
        self.backend
            .textures
            .get(id.0 as usize)
            .ok_or(BackendError::InvalidResource)
    }
}

impl RenderBackend for WgpuFrame<'_> {
    fn device_id(&self) -> DeviceId {
        self.backend.device_id
    }

    fn create_vertex_buffer(&mut self, size: usize) -> Result<BufferId, BackendError> {
        self.check()?;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("path_vertices"),
            size: size as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.backend.vertex_buffers.push(buffer);
        Ok(BufferId(self.backend.vertex_buffers.len() as u32 - 1))
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, BackendError> {
        self.check()?;
        let (texture, view) = create_texture(
            self.device,
            "path_batch_texture",
            width,
            height,
            format.to_wgpu(),
        );
        self.backend.textures.push(GpuTexture {
            texture,
            view,
            width,
            height,
            format,
        });
        Ok(TextureId(self.backend.textures.len() as u32 - 1))
    }

    fn create_staging_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<StagingId, BackendError> {
        self.check()?;
        let pitch = width as usize * format.bytes_per_pixel();
        if pitch % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize != 0 {
            return Err(BackendError::UnsupportedFormat(format));
        }

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("path_staging"),
            size: (pitch * height as usize) as u64,
            usage: BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.backend.staging.push(Staging {
            buffer,
            width,
            height,
            format,
        });
        Ok(StagingId(self.backend.staging.len() as u32 - 1))
    }

    fn upload_vertices(&mut self, buffer: BufferId, data: &[u8]) -> Result<(), BackendError> {
        self.check()?;
        let buffer = self
            .backend
            .vertex_buffers
            .get(buffer.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        if data.len() as u64 > buffer.size() {
            return Err(BackendError::InvalidResource);
        }
        self.queue.write_buffer(buffer, 0, data);
        Ok(())
    }

    fn write_staging(&mut self, staging: StagingId, data: &[u8]) -> Result<(), BackendError> {
        self.check()?;
        let staging = self
            .backend
            .staging
            .get(staging.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        if data.len() as u64 > staging.buffer.size() {
            return Err(BackendError::InvalidResource);
        }
        if data.is_empty() {
            return Ok(());
        }

        // Buffer writes must be a multiple of four bytes.
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if data.len() % align == 0 {
            self.queue.write_buffer(&staging.buffer, 0, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(data.len().next_multiple_of(align), 0);
            self.queue.write_buffer(&staging.buffer, 0, &padded);
        }
        Ok(())
    }

    fn copy_staging_to_texture(
        &mut self,
        staging: StagingId,
        texture: TextureId,
        rows: u32,
    ) -> Result<(), BackendError> {
        self.check()?;
        let source = self
            .backend
            .staging
            .get(staging.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        let destination = self.texture(texture)?;
        if source.format != destination.format
            || source.width != destination.width
            || rows > source.height.min(destination.height)
        {
            return Err(BackendError::InvalidResource);
        }
        if rows == 0 {
            return Ok(());
        }

        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("path_staging_copy"),
        });
        encoder.copy_buffer_to_texture(
            ImageCopyBuffer {
                buffer: &source.buffer,
                layout: ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(source.pitch()),
                    rows_per_image: None,
                },
            },
            ImageCopyTexture {
                texture: &destination.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            Extent3d {
                width: source.width,
                height: rows,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit([encoder.finish()]);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.check()?;
        let vertex_buffer = self
            .backend
            .vertex_buffers
            .get(call.vertex_buffer.0 as usize)
            .ok_or(BackendError::InvalidResource)?;
        let mask = self.texture(call.mask_texture)?;
        let instances = self.texture(call.instance_texture)?;
        if mask.format != TextureFormat::R8 || instances.format != TextureFormat::Rgba32Float {
            return Err(BackendError::InvalidResource);
        }
        let image = match call.image {
            Some(id) => self
                .backend
                .images
                .get(id.0 as usize)
                .ok_or(BackendError::InvalidResource)?,
            None => &self.backend.empty_image,
        };

        let config = [call.target_width as f32, call.target_height as f32, 0.0, 0.0];
        self.queue.write_buffer(
            &self.backend.config_buffer,
            0,
            bytemuck::cast_slice(&config),
        );

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("path_bind_group"),
            layout: &self.backend.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.backend.config_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&mask.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&instances.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&image.view),
                },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("path_draw"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("path_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let vertex_bytes = u64::from(call.vertex_count) * size_of::<PathVertex>() as u64;
            pass.set_pipeline(&self.backend.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..vertex_bytes));
            pass.draw(0..call.vertex_count, 0..1);
        }
        self.queue.submit([encoder.finish()]);
        Ok(())
    }
}
