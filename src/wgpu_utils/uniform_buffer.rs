// src/wgpu_utils/uniform_buffer.rs - Typed uniform and storage array buffers
use std::borrow::Cow;
use std::marker::PhantomData;

/// Short type name used in buffer labels.
fn label_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    match type_name.rfind(':') {
        Some(pos) => &type_name[(pos + 1)..],
        None => type_name,
    }
}

/// Uniform buffer holding exactly one `Content` value
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create buffer with initial data
    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let bytes = bytemuck::bytes_of(initial_content);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", label_name::<Content>())),
            size: bytes.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer.slice(..).get_mapped_range_mut().copy_from_slice(bytes);
        buffer.unmap();

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: bytes.to_vec(),
        }
    }

    /// Update buffer content, skipping the write when nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Read-only storage buffer holding a contiguous `[Content]` array.
///
/// wgpu rejects zero-sized storage bindings, so an empty array is backed by
/// one zeroed element. [`len`](Self::len) still reports the logical length.
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
    current_size: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    /// Create array buffer with initial data
    pub fn new_with_data(device: &wgpu::Device, data: &[Content]) -> Self {
        let contents = padded_contents(data);
        let contents: &[Content] = &contents;
        let bytes: &[u8] = bytemuck::cast_slice(contents);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("ArrayBuffer<{}>", label_name::<Content>())),
            size: bytes.len() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer.slice(..).get_mapped_range_mut().copy_from_slice(bytes);
        buffer.unmap();

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity: contents.len(),
            current_size: data.len(),
        }
    }

    /// Overwrite the array in place.
    ///
    /// Returns `false` without writing anything when `data` does not fit; the
    /// caller has to recreate the buffer in that case.
    pub fn update_data(&mut self, queue: &wgpu::Queue, data: &[Content]) -> bool {
        if data.len() > self.capacity {
            return false;
        }
        let contents = padded_contents(data);
        let contents: &[Content] = &contents;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(contents));
        self.current_size = data.len();
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Get current number of elements
    pub fn len(&self) -> usize {
        self.current_size
    }

    pub fn is_empty(&self) -> bool {
        self.current_size == 0
    }

    /// Number of elements the buffer can hold without being recreated
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// `data` itself, or a single zeroed element when `data` is empty.
pub(crate) fn padded_contents<T: bytemuck::Pod>(data: &[T]) -> Cow<'_, [T]> {
    if data.is_empty() {
        Cow::Owned(vec![<T as bytemuck::Zeroable>::zeroed()])
    } else {
        Cow::Borrowed(data)
    }
}
