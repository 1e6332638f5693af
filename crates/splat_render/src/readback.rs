use std::sync::mpsc;

use bytemuck::Pod;

use crate::error::RenderError;

/// Copy the first `count` elements of `buffer` back to the CPU
///
/// Blocks until the GPU has finished all submitted work. The source buffer
/// needs `COPY_SRC`.
pub fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    count: usize,
) -> Result<Vec<T>, RenderError> {
    let bytes = (count * std::mem::size_of::<T>()) as u64;
    if bytes == 0 {
        return Ok(Vec::new());
    }
    if bytes > buffer.size() {
        return Err(RenderError::Readback(format!(
            "requested {bytes} bytes from a {} byte buffer",
            buffer.size()
        )));
    }

    // Copies must be 4-byte aligned
    let aligned = bytes.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging Buffer"),
        size: aligned,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, aligned.min(buffer.size()));
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = mpsc::channel();
    let slice = staging.slice(..);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|_| RenderError::Readback("map callback dropped".into()))?
        .map_err(|e| RenderError::Readback(e.to_string()))?;

    let data = slice.get_mapped_range();
    let values = bytemuck::cast_slice::<u8, T>(&data[..bytes as usize]).to_vec();
    drop(data);
    staging.unmap();
    Ok(values)
}
