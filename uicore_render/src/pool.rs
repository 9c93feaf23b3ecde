// Copyright 2025 the UICore Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A rotating pool of batch resources.
//!
//! The device may still be reading the resources of the previous batches while the next batch
//! is being written. Instead of waiting on fences, every resource kind is kept in a ring that is
//! at least two entries deep, and each request hands out the next entry of the ring.

use std::collections::HashMap;

use log::debug;

use crate::backend::{BufferId, DeviceId, RenderBackend, StagingId, TextureFormat, TextureId};
use crate::config::BatchConfig;
use crate::error::{BackendError, Result};

/// Lazily created resources, handed out round-robin.
#[derive(Debug)]
struct Ring<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
}

impl<T: Copy> Ring<T> {
    fn new(depth: usize) -> Self {
        Self {
            slots: vec![None; depth],
            cursor: 0,
        }
    }

    /// The resource under the cursor, created on first use. The cursor only advances if a
    /// resource is handed out.
    fn next(
        &mut self,
        create: impl FnOnce() -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let resource = match self.slots[self.cursor] {
            Some(resource) => resource,
            None => {
                let resource = create()?;
                self.slots[self.cursor] = Some(resource);
                resource
            }
        };
        self.cursor = (self.cursor + 1) % self.slots.len();
        Ok(resource)
    }

    fn created(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

/// The rings of one device.
#[derive(Debug)]
struct DeviceSlots {
    vertex_buffers: Ring<BufferId>,
    rgba32f: Ring<TextureId>,
    r8: Ring<TextureId>,
    transfer_rgba32f: Ring<StagingId>,
    transfer_r8: Ring<StagingId>,
}

impl DeviceSlots {
    fn new(config: &BatchConfig) -> Self {
        Self {
            vertex_buffers: Ring::new(config.num_vertex_buffers),
            rgba32f: Ring::new(config.num_texture_buffers),
            r8: Ring::new(config.num_texture_buffers),
            transfer_rgba32f: Ring::new(config.num_texture_buffers),
            transfer_r8: Ring::new(config.num_texture_buffers),
        }
    }
}

/// Hands out vertex buffers, mask and instance textures and their staging textures.
#[derive(Debug)]
pub struct RenderBatchBuffer {
    config: BatchConfig,
    devices: HashMap<DeviceId, DeviceSlots>,
}

impl RenderBatchBuffer {
    /// Create an empty pool. Nothing is allocated until a resource is requested.
    pub fn new(config: &BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            devices: HashMap::new(),
        })
    }

    /// The configuration the pool was created with.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn slots(&mut self, device: DeviceId) -> &mut DeviceSlots {
        let config = &self.config;
        self.devices
            .entry(device)
            .or_insert_with(|| DeviceSlots::new(config))
    }

    /// The next vertex buffer.
    pub fn get_vertex_buffer(&mut self, backend: &mut dyn RenderBackend) -> Result<BufferId> {
        let size = self.config.vertex_buffer_size;
        let device = backend.device_id();
        let buffer = self.slots(device).vertex_buffers.next(|| {
            debug!("Creating vertex buffer of {size} bytes for {device:?}");
            backend.create_vertex_buffer(size)
        })?;
        Ok(buffer)
    }

    /// The next instance texture.
    pub fn get_texture_rgba32f(&mut self, backend: &mut dyn RenderBackend) -> Result<TextureId> {
        let (width, height) = self.instance_size();
        let device = backend.device_id();
        let texture = self.slots(device).rgba32f.next(|| {
            debug!("Creating {width}x{height} instance texture for {device:?}");
            backend.create_texture(width, height, TextureFormat::Rgba32Float)
        })?;
        Ok(texture)
    }

    /// The next mask texture.
    pub fn get_texture_r8(&mut self, backend: &mut dyn RenderBackend) -> Result<TextureId> {
        let size = self.config.mask_texture_size;
        let device = backend.device_id();
        let texture = self.slots(device).r8.next(|| {
            debug!("Creating {size}x{size} mask texture for {device:?}");
            backend.create_texture(size, size, TextureFormat::R8)
        })?;
        Ok(texture)
    }

    /// The next staging texture for instance data.
    pub fn get_transfer_rgba32f(&mut self, backend: &mut dyn RenderBackend) -> Result<StagingId> {
        let (width, height) = self.instance_size();
        let device = backend.device_id();
        let staging = self.slots(device).transfer_rgba32f.next(|| {
            debug!("Creating {width}x{height} instance staging texture for {device:?}");
            backend.create_staging_texture(width, height, TextureFormat::Rgba32Float)
        })?;
        Ok(staging)
    }

    /// The next staging texture for mask data.
    pub fn get_transfer_r8(&mut self, backend: &mut dyn RenderBackend) -> Result<StagingId> {
        let size = self.config.mask_texture_size;
        let device = backend.device_id();
        let staging = self.slots(device).transfer_r8.next(|| {
            debug!("Creating {size}x{size} mask staging texture for {device:?}");
            backend.create_staging_texture(size, size, TextureFormat::R8)
        })?;
        Ok(staging)
    }

    /// Forget every resource of `device`, for example after it was lost.
    ///
    /// Returns whether the pool held resources for it.
    pub fn evict_device(&mut self, device: DeviceId) -> bool {
        let evicted = self.devices.remove(&device).is_some();
        if evicted {
            debug!("Evicted pooled resources of {device:?}");
        }
        evicted
    }

    /// The number of resources created for `device` so far.
    pub fn resource_count(&self, device: DeviceId) -> usize {
        self.devices.get(&device).map_or(0, |slots| {
            slots.vertex_buffers.created()
                + slots.rgba32f.created()
                + slots.r8.created()
                + slots.transfer_rgba32f.created()
                + slots.transfer_r8.created()
        })
    }

    fn instance_size(&self) -> (u32, u32) {
        (
            self.config.instance_texture_width,
            self.config.instance_texture_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DrawCall;

    /// Counts creations and fails once `budget` resources exist.
    struct CountingBackend {
        device: DeviceId,
        created: u32,
        budget: u32,
    }

    impl CountingBackend {
        fn new(device: u64) -> Self {
            Self {
                device: DeviceId(device),
                created: 0,
                budget: u32::MAX,
            }
        }

        fn create(&mut self) -> Result<u32, BackendError> {
            if self.created == self.budget {
                return Err(BackendError::OutOfMemory);
            }
            self.created += 1;
            Ok(self.created)
        }
    }

    impl RenderBackend for CountingBackend {
        fn device_id(&self) -> DeviceId {
            self.device
        }

        fn create_vertex_buffer(&mut self, _size: usize) -> Result<BufferId, BackendError> {
            self.create().map(BufferId)
        }

        fn create_texture(
            &mut self,
            _width: u32,
            _height: u32,
            _format: TextureFormat,
        ) -> Result<TextureId, BackendError> {
            self.create().map(TextureId)
        }

        fn create_staging_texture(
            &mut self,
            _width: u32,
            _height: u32,
            _format: TextureFormat,
        ) -> Result<StagingId, BackendError> {
            self.create().map(StagingId)
        }

        fn upload_vertices(&mut self, _buffer: BufferId, _data: &[u8]) -> Result<(), BackendError> {
            Ok(())
        }

        fn write_staging(&mut self, _staging: StagingId, _data: &[u8]) -> Result<(), BackendError> {
            Ok(())
        }

        fn copy_staging_to_texture(
            &mut self,
            _staging: StagingId,
            _texture: TextureId,
            _rows: u32,
        ) -> Result<(), BackendError> {
            Ok(())
        }

        fn draw(&mut self, _call: &DrawCall) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn config(depth: usize) -> BatchConfig {
        BatchConfig {
            num_vertex_buffers: depth,
            num_texture_buffers: depth,
            ..Default::default()
        }
    }

    #[test]
    fn resources_rotate_and_are_created_once() {
        let mut pool = RenderBatchBuffer::new(&config(3)).unwrap();
        let mut backend = CountingBackend::new(1);

        let handed_out: Vec<_> = (0..7)
            .map(|_| pool.get_vertex_buffer(&mut backend).unwrap())
            .collect();
        assert_eq!(
            handed_out,
            [1, 2, 3, 1, 2, 3, 1].map(BufferId).to_vec()
        );
        assert_eq!(backend.created, 3);
    }

    #[test]
    fn every_kind_has_its_own_cursor() {
        let mut pool = RenderBatchBuffer::new(&config(2)).unwrap();
        let mut backend = CountingBackend::new(1);

        let mask = pool.get_texture_r8(&mut backend).unwrap();
        let instances = pool.get_texture_rgba32f(&mut backend).unwrap();
        let mask_staging = pool.get_transfer_r8(&mut backend).unwrap();
        let instance_staging = pool.get_transfer_rgba32f(&mut backend).unwrap();
        assert_eq!(
            (mask, instances, mask_staging, instance_staging),
            (TextureId(1), TextureId(2), StagingId(3), StagingId(4))
        );

        assert_eq!(pool.get_texture_r8(&mut backend).unwrap(), TextureId(5));
        assert_eq!(pool.get_texture_r8(&mut backend).unwrap(), mask);
        assert_eq!(pool.resource_count(DeviceId(1)), 5);
    }

    #[test]
    fn devices_are_kept_apart_and_evicted() {
        let mut pool = RenderBatchBuffer::new(&config(2)).unwrap();
        let mut first = CountingBackend::new(1);
        let mut second = CountingBackend::new(2);

        pool.get_vertex_buffer(&mut first).unwrap();
        pool.get_vertex_buffer(&mut second).unwrap();
        assert_eq!(pool.resource_count(DeviceId(1)), 1);
        assert_eq!(pool.resource_count(DeviceId(2)), 1);

        assert!(pool.evict_device(DeviceId(1)));
        assert!(!pool.evict_device(DeviceId(1)));
        assert_eq!(pool.resource_count(DeviceId(1)), 0);
        assert_eq!(pool.resource_count(DeviceId(2)), 1);
    }

    #[test]
    fn creation_failure_does_not_advance() {
        let mut pool = RenderBatchBuffer::new(&config(2)).unwrap();
        let mut backend = CountingBackend::new(1);
        backend.budget = 0;

        let err = pool.get_vertex_buffer(&mut backend).unwrap_err();
        assert!(matches!(
            err,
            crate::RenderError::Backend(BackendError::OutOfMemory)
        ));

        backend.budget = u32::MAX;
        assert_eq!(pool.get_vertex_buffer(&mut backend).unwrap(), BufferId(1));
        assert_eq!(pool.get_vertex_buffer(&mut backend).unwrap(), BufferId(2));
    }

    #[test]
    fn shallow_rotation_is_rejected() {
        assert!(RenderBatchBuffer::new(&config(1)).is_err());
    }
}
