//! # Buffer State Module
//!
//! A registry of the engine-wide GPU buffers, referenced by name.
//!
//! ## Key Features
//!
//! * Named buffers shared by the bind groups and the frame loop
//! * Per-buffer allocation sizes, logged as buffers are registered
//! * Bounds-checked writes that refuse, and log, instead of corrupting memory
//!
//! Per-chunk buffers are not registered here. They belong to the chunk's
//! `ChunkGpuMesh` and are released when the chunk is evicted.

use std::collections::HashMap;

use wgpu::{util::DeviceExt, Buffer, Device, Queue};

use crate::core::{StResource, StSystem};

/// Analytics data for a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    allocated_memory: u64,
}

/// Returns `true` when `len` bytes written at `offset` stay inside `allocated` bytes.
pub fn write_fits(offset: u64, len: u64, allocated: u64) -> bool {
    offset
        .checked_add(len)
        .is_some_and(|end| end <= allocated)
}

/// Central registry for named GPU buffers.
///
/// Buffers are created once during startup and looked up by name afterwards.
/// Lookups of unknown names return `None` and writes that would overflow a
/// buffer are dropped with an error log, so a bad name or size never takes the
/// frame loop down.
pub struct BufferState {
    /// Reference to the GPU device
    pub device: StSystem<Device>,
    /// Reference to the GPU command queue
    pub queue: StSystem<Queue>,
    buffers: HashMap<&'static str, Buffer>,
    buffer_analytics: StResource<HashMap<&'static str, BufferAnalytics>>,
}

impl BufferState {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `device` - The GPU device used to allocate buffers
    /// * `queue` - The queue used for buffer writes
    pub fn new(device: StSystem<Device>, queue: StSystem<Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            buffer_analytics: StResource::new(HashMap::new()),
        }
    }

    /// Allocates an uninitialised buffer under `buffer_name`, replacing any previous one.
    pub fn create_buffer(&mut self, buffer_name: &'static str, descriptor: &wgpu::BufferDescriptor) {
        let buffer = self.device.get().create_buffer(descriptor);
        self.register(buffer_name, buffer);
    }

    /// Allocates a buffer initialised with `descriptor.contents`.
    pub fn create_buffer_init(
        &mut self,
        buffer_name: &'static str,
        descriptor: &wgpu::util::BufferInitDescriptor,
    ) {
        let buffer = self.device.get().create_buffer_init(descriptor);
        self.register(buffer_name, buffer);
    }

    fn register(&mut self, buffer_name: &'static str, buffer: Buffer) {
        let analytics = BufferAnalytics {
            allocated_memory: buffer.size(),
        };
        self.buffer_analytics.get_mut().insert(buffer_name, analytics);
        self.buffers.insert(buffer_name, buffer);
        log::debug!(
            "Registered buffer {} ({} bytes, {} bytes in total)",
            buffer_name,
            analytics.allocated_memory,
            self.get_total_allocated_memory()
        );
    }

    /// Queues a write of `data` at `offset` into the named buffer.
    ///
    /// # Returns
    /// `false` if the buffer does not exist or the write would overflow it
    pub fn write_buffer(&self, buffer_name: &'static str, offset: u64, data: &[u8]) -> bool {
        let Some(buffer) = self.buffers.get(buffer_name) else {
            log::error!("Write to unknown buffer {buffer_name}");
            return false;
        };

        let analytics = self.buffer_analytics.get();
        let Some(analytics) = analytics.get(buffer_name) else {
            log::error!("Buffer {buffer_name} has no analytics entry");
            return false;
        };

        let data_size = data.len() as u64;
        if !write_fits(offset, data_size, analytics.allocated_memory) {
            log::error!(
                "Write of {} bytes at offset {} overflows buffer {} ({} bytes)",
                data_size,
                offset,
                buffer_name,
                analytics.allocated_memory
            );
            return false;
        }

        self.queue.get().write_buffer(buffer, offset, data);
        true
    }

    /// Looks up a buffer by name.
    pub fn get_buffer(&self, buffer_name: &'static str) -> Option<&Buffer> {
        self.buffers.get(buffer_name)
    }

    /// Binding resource covering the whole named buffer.
    pub fn get_entire_binding(&self, buffer_name: &'static str) -> Option<wgpu::BindingResource<'_>> {
        self.buffers
            .get(buffer_name)
            .map(|buffer| buffer.as_entire_binding())
    }

    /// Sum of the allocated sizes of all registered buffers, in bytes.
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .get()
            .values()
            .map(|analytics| analytics.allocated_memory)
            .sum()
    }
}

impl std::fmt::Debug for BufferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferState")
            .field("buffers", &self.buffers.keys().collect::<Vec<_>>())
            .field("allocated", &self.get_total_allocated_memory())
            .finish()
    }
}
