// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Buffers and textures.

use super::heap::{self, Allocation};
use super::{code_arg, debug_message, lock, native_arg, release, to_index, MAX_ALLOCATION};
use prism_core::api::{align_up, HeapKind, PixelFormat};
use prism_core::backend::{BackendModule, EntityKind};
use prism_core::error::{ErrorCategoryKind, HostError};
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, OperationDef, TypeSpec};
use std::ops::Range;
use std::sync::Arc;

/// Row alignment of linear textures.
pub const ROW_PITCH_ALIGNMENT: u64 = 256;

/// The shape of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// A linear buffer.
    Buffer,
    /// A one dimensional texture.
    Texture1D,
    /// A two dimensional texture.
    Texture2D,
    /// A three dimensional texture.
    Texture3D,
}

impl Dimension {
    /// The error category failures on this kind of resource are raised under.
    pub const fn category(self) -> ErrorCategoryKind {
        match self {
            Dimension::Buffer => ErrorCategoryKind::Buffer,
            Dimension::Texture1D => ErrorCategoryKind::Texture1D,
            Dimension::Texture2D => ErrorCategoryKind::Texture2D,
            Dimension::Texture3D => ErrorCategoryKind::Texture3D,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Dimension::Buffer => "buffer",
            Dimension::Texture1D => "1D texture",
            Dimension::Texture2D => "2D texture",
            Dimension::Texture3D => "3D texture",
        }
    }
}

/// A buffer or linear texture living in emulated device memory.
#[derive(Debug)]
pub struct SoftwareResource {
    dimension: Dimension,
    heap_type: HeapKind,
    size: u64,
    width: u64,
    height: u64,
    depth: u64,
    row_pitch: u64,
    stride: u64,
    format: Option<PixelFormat>,
    allocation: Allocation,
}

impl SoftwareResource {
    /// The shape of the resource.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// The size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Width in pixels (bytes for buffers).
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Bytes between two rows.
    pub fn row_pitch(&self) -> u64 {
        self.row_pitch
    }

    /// The pixel format, if any.
    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }

    /// Returns `true` if both resources share backing memory.
    pub(crate) fn shares_memory_with(&self, other: &SoftwareResource) -> bool {
        Arc::ptr_eq(&self.allocation.memory, &other.allocation.memory)
    }

    fn raise(&self, module: &BackendModule, message: impl Into<String>) -> HostError {
        module.raise(self.dimension.category(), message)
    }

    /// Maps `len` bytes at `offset` inside the resource to a range of the
    /// backing memory.
    fn span(&self, module: &BackendModule, offset: u64, len: u64) -> Result<Range<usize>, HostError> {
        let end = offset.checked_add(len).filter(|end| *end <= self.size);
        let Some(end) = end else {
            return Err(self.raise(
                module,
                format!(
                    "{len} bytes at offset {offset} are out of bounds for a {} of {} bytes",
                    self.dimension.label(),
                    self.size
                ),
            ));
        };
        let start = to_index(module, self.dimension.category(), self.allocation.offset + offset)?;
        let end = to_index(module, self.dimension.category(), self.allocation.offset + end)?;
        Ok(start..end)
    }

    fn require_mappable(&self, module: &BackendModule, operation: &str) -> Result<(), HostError> {
        if self.dimension != Dimension::Buffer || !self.heap_type.is_host_visible() {
            return Err(self.raise(
                module,
                format!(
                    "{operation} requires a buffer in a host-visible heap, not a {} in {}",
                    self.dimension.label(),
                    self.heap_type
                ),
            ));
        }
        Ok(())
    }

    /// Writes `rows` of `data` into the resource. Each row is `(source range,
    /// destination offset)`.
    fn write_rows(
        &self,
        module: &BackendModule,
        data: &[u8],
        rows: impl IntoIterator<Item = (Range<usize>, u64)>,
    ) -> Result<(), HostError> {
        let spans = rows
            .into_iter()
            .map(|(source, offset)| Ok((self.span(module, offset, source.len() as u64)?, source)))
            .collect::<Result<Vec<_>, HostError>>()?;
        let mut memory = lock(&self.allocation.memory);
        for (destination, source) in spans {
            memory[destination].copy_from_slice(&data[source]);
        }
        Ok(())
    }

    /// Reads rows out of the resource, each given as `(offset, len)`.
    fn read_rows(
        &self,
        module: &BackendModule,
        rows: impl IntoIterator<Item = (u64, u64)>,
    ) -> Result<Vec<u8>, HostError> {
        let spans = rows
            .into_iter()
            .map(|(offset, len)| self.span(module, offset, len))
            .collect::<Result<Vec<_>, HostError>>()?;
        let memory = lock(&self.allocation.memory);
        let mut out = Vec::with_capacity(spans.iter().map(|span| span.len()).sum());
        for span in spans {
            out.extend_from_slice(&memory[span]);
        }
        Ok(out)
    }
}

fn resource(object: &HostObject) -> Result<&SoftwareResource, HostError> {
    object.downcast::<SoftwareResource>()
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareResource>("A buffer or texture in emulated device memory.")
        .destructor(release::<SoftwareResource>)
        .attribute(AttributeDef::new("size", "Size in bytes.", |object| {
            HostValue::checked_int(resource(object)?.size, "size")
        }))
        .attribute(AttributeDef::new("width", "Width in pixels.", |object| {
            HostValue::checked_int(resource(object)?.width, "width")
        }))
        .attribute(AttributeDef::new("height", "Height in rows.", |object| {
            HostValue::checked_int(resource(object)?.height, "height")
        }))
        .attribute(AttributeDef::new("depth", "Depth in slices.", |object| {
            HostValue::checked_int(resource(object)?.depth, "depth")
        }))
        .attribute(AttributeDef::new("row_pitch", "Bytes between two rows.", |object| {
            HostValue::checked_int(resource(object)?.row_pitch, "row_pitch")
        }))
        .attribute(AttributeDef::new("heap_type", "The heap kind code.", |object| {
            Ok(resource(object)?.heap_type.code().into())
        }))
        .attribute(AttributeDef::new("stride", "Structure stride in bytes.", |object| {
            HostValue::checked_int(resource(object)?.stride, "stride")
        }))
        .attribute(AttributeDef::new("format", "Pixel format code, 0 if none.", |object| {
            Ok(resource(object)?.format.map_or(0, PixelFormat::code).into())
        }))
        .operation(
            OperationDef::new("upload", "upload(data, offset=0)", upload).uses(&["size", "heap_type"]),
        )
        .operation(
            OperationDef::new(
                "upload2d",
                "upload2d(data, pitch, width, height, bytes_per_pixel)",
                upload2d,
            )
            .uses(&["size", "heap_type"]),
        )
        .operation(
            OperationDef::new("upload_chunked", "upload_chunked(data, stride, filler)", upload_chunked)
                .uses(&["size", "heap_type"]),
        )
        .operation(
            OperationDef::new("readback", "readback(size_or_buffer=0, offset=0)", readback)
                .uses(&["size", "heap_type"]),
        )
        .operation(
            OperationDef::new(
                "readback_to_buffer",
                "readback_to_buffer(destination, offset=0)",
                readback_to_buffer,
            )
            .uses(&["size", "heap_type"]),
        )
        .operation(
            OperationDef::new(
                "readback2d",
                "readback2d(pitch, width, height, bytes_per_pixel)",
                readback2d,
            )
            .uses(&["size", "heap_type"]),
        )
        .operation(OperationDef::new("copy_to", "copy_to(destination)", copy_to).uses(&["size"]))
}

fn upload(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "upload")?;
    let data: Vec<u8> = args.required(0, "data")?;
    let offset: u64 = args.or(1, "offset", 0)?;
    this.write_rows(module, &data, [(0..data.len(), offset)])?;
    Ok(HostValue::None)
}

fn upload2d(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "upload2d")?;
    let data: Vec<u8> = args.required(0, "data")?;
    let pitch: u64 = args.required(1, "pitch")?;
    let width: usize = args.required(2, "width")?;
    let height: u64 = args.required(3, "height")?;
    let bytes_per_pixel: usize = args.required(4, "bytes_per_pixel")?;

    let row_len = width.saturating_mul(bytes_per_pixel);
    if row_len == 0 {
        return Ok(HostValue::None);
    }
    let fits = u64::try_from(row_len)
        .ok()
        .and_then(|row| row.checked_mul(height))
        .is_some_and(|total| total <= MAX_ALLOCATION);
    if !fits {
        return Err(this.raise(
            module,
            format!("{height} rows of {row_len} bytes exceed the allocation limit"),
        ));
    }
    // Short data fills as many rows as it covers.
    let rows = (0..height).map_while(|y| {
        let start = usize::try_from(y).ok()?.checked_mul(row_len)?;
        (start < data.len()).then(|| (start..data.len().min(start + row_len), y.saturating_mul(pitch)))
    });
    this.write_rows(module, &data, rows)?;
    Ok(HostValue::None)
}

fn upload_chunked(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "upload_chunked")?;
    let data: Vec<u8> = args.required(0, "data")?;
    let stride: usize = args.required(1, "stride")?;
    let filler: Vec<u8> = args.required(2, "filler")?;

    if stride == 0 || data.len() % stride != 0 {
        return Err(this.raise(
            module,
            format!("data of {} bytes cannot be split in chunks of {stride}", data.len()),
        ));
    }
    let mut expanded = Vec::with_capacity(data.len() / stride * (stride + filler.len()));
    for chunk in data.chunks_exact(stride) {
        expanded.extend_from_slice(chunk);
        expanded.extend_from_slice(&filler);
    }
    this.write_rows(module, &expanded, [(0..expanded.len(), 0)])?;
    Ok(HostValue::None)
}

fn readback(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "readback")?;
    // A buffer in place of a size reads into that buffer.
    if let Some(destination @ HostValue::Object(_)) = args.present(0, "size") {
        let offset: u64 = args.or(1, "offset", 0)?;
        return read_into(module, this, destination, offset);
    }
    let size: u64 = args.or(0, "size", 0)?;
    let offset: u64 = args.or(1, "offset", 0)?;
    let len = if size == 0 {
        this.size.saturating_sub(offset)
    } else {
        size
    };
    Ok(this.read_rows(module, [(offset, len)])?.into())
}

fn readback_to_buffer(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "readback_to_buffer")?;
    let destination = args
        .present(0, "destination")
        .ok_or_else(|| HostError::MissingArgument("destination".to_string()))?;
    let offset: u64 = args.or(1, "offset", 0)?;
    read_into(module, this, destination, offset)
}

/// Copies the bytes from `offset` to the end of `source` into the start of
/// a mappable `destination` buffer, as many as it can hold.
fn read_into(
    module: &BackendModule,
    source: &SoftwareResource,
    destination: &HostValue,
    offset: u64,
) -> Result<HostValue, HostError> {
    let destination = native_arg::<SoftwareResource>(module, EntityKind::Resource, destination)?;
    destination.require_mappable(module, "readback_to_buffer")?;
    if offset > source.size {
        return Err(source.raise(
            module,
            format!(
                "offset {offset} is out of bounds for a {} of {} bytes",
                source.dimension.label(),
                source.size
            ),
        ));
    }
    let len = destination.size.min(source.size - offset);
    let from = source.span(module, offset, len)?;
    let to = destination.span(module, 0, len)?;
    copy_memory(source, from, &destination, to);
    Ok(HostValue::None)
}

fn readback2d(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = resource(object)?;
    this.require_mappable(module, "readback2d")?;
    let pitch: u64 = args.required(0, "pitch")?;
    let width: u64 = args.required(1, "width")?;
    let height: u64 = args.required(2, "height")?;
    let bytes_per_pixel: u64 = args.required(3, "bytes_per_pixel")?;

    let row_len = width.saturating_mul(bytes_per_pixel);
    let total = height.checked_mul(row_len).filter(|total| *total <= this.size);
    if total.is_none() {
        return Err(this.raise(
            module,
            format!(
                "{height} rows of {row_len} bytes do not fit in a {} of {} bytes",
                this.dimension.label(),
                this.size
            ),
        ));
    }
    let rows = (0..height).map(|y| (y.saturating_mul(pitch), row_len));
    Ok(this.read_rows(module, rows)?.into())
}

fn copy_to(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let source = resource(object)?;
    let value = args
        .present(0, "destination")
        .ok_or_else(|| HostError::MissingArgument("destination".to_string()))?;
    let destination = native_arg::<SoftwareResource>(module, EntityKind::Resource, value)?;
    if destination.size < source.size {
        return Err(source.raise(
            module,
            format!(
                "cannot copy {} bytes into a {} of {} bytes",
                source.size,
                destination.dimension.label(),
                destination.size
            ),
        ));
    }

    let from = source.span(module, 0, source.size)?;
    let to = destination.span(module, 0, source.size)?;
    copy_memory(source, from, &destination, to);
    debug_message(module, || {
        format!(
            "Copied {} bytes from a {} to a {}",
            source.size,
            source.dimension.label(),
            destination.dimension.label()
        )
    });
    Ok(HostValue::None)
}

/// Copies `from` in the source's backing memory to `to` in the destination's.
fn copy_memory(
    source: &SoftwareResource,
    from: Range<usize>,
    destination: &SoftwareResource,
    to: Range<usize>,
) {
    if source.shares_memory_with(destination) {
        lock(&source.allocation.memory).copy_within(from, to.start);
        return;
    }
    // Lock in address order so concurrent opposite copies cannot deadlock.
    let source_first =
        Arc::as_ptr(&source.allocation.memory) < Arc::as_ptr(&destination.allocation.memory);
    let (src, mut dst) = if source_first {
        let src = lock(&source.allocation.memory);
        (src, lock(&destination.allocation.memory))
    } else {
        let dst = lock(&destination.allocation.memory);
        (lock(&source.allocation.memory), dst)
    };
    dst[to].copy_from_slice(&src[from]);
}

/// `Device.create_buffer(heap_type, size, stride=0, format=0, heap=None, heap_offset=0)`
pub(super) fn create_buffer(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let category = ErrorCategoryKind::Buffer;
    let heap_type: HeapKind = code_arg(module, category, args, 0, "heap_type", Some(HeapKind::Default))?;
    let size: u64 = args.required(1, "size")?;
    let stride: u64 = args.or(2, "stride", 0)?;
    let format = match args.or::<u32>(3, "format", 0)? {
        0 => None,
        code => Some(
            PixelFormat::try_from(code)
                .map_err(|err| module.raise(category, format!("invalid format: {err}")))?,
        ),
    };
    if size == 0 {
        return Err(module.raise(category, "buffer size must be non-zero"));
    }
    let placement = heap::placement_args(module, args, 4)?;
    let allocation = heap::allocate(module, category, heap_type, size, placement)?;

    let buffer = SoftwareResource {
        dimension: Dimension::Buffer,
        heap_type,
        size,
        width: size,
        height: 1,
        depth: 1,
        row_pitch: size,
        stride,
        format,
        allocation,
    };
    debug_message(module, || format!("Created {heap_type} buffer of {size} bytes"));
    Ok(module.instantiate(EntityKind::Resource, buffer)?.into())
}

struct Extent {
    width: u64,
    height: u64,
    depth: u64,
}

fn create_texture(
    object: &HostObject,
    args: &Args,
    dimension: Dimension,
    extent: Extent,
    next: usize,
) -> Result<HostValue, HostError> {
    let module = object.module();
    let category = dimension.category();
    let format: PixelFormat = code_arg(module, category, args, next, "format", None)?;
    if extent.width == 0 || extent.height == 0 || extent.depth == 0 {
        return Err(module.raise(
            category,
            format!(
                "invalid {} extent {}x{}x{}",
                dimension.label(),
                extent.width,
                extent.height,
                extent.depth
            ),
        ));
    }

    let row_pitch = extent
        .width
        .checked_mul(u64::from(format.bytes_per_pixel()))
        .and_then(|row| align_up(row, ROW_PITCH_ALIGNMENT));
    let size = row_pitch
        .and_then(|pitch| pitch.checked_mul(extent.height))
        .and_then(|bytes| bytes.checked_mul(extent.depth));
    let (Some(row_pitch), Some(size)) = (row_pitch, size) else {
        return Err(module.raise(category, format!("{} is too large", dimension.label())));
    };

    let placement = heap::placement_args(module, args, next + 1)?;
    let allocation = heap::allocate(module, category, HeapKind::Default, size, placement)?;
    let texture = SoftwareResource {
        dimension,
        heap_type: HeapKind::Default,
        size,
        width: extent.width,
        height: extent.height,
        depth: extent.depth,
        row_pitch,
        stride: 0,
        format: Some(format),
        allocation,
    };
    debug_message(module, || {
        format!(
            "Created {}x{}x{} {format} {}",
            extent.width,
            extent.height,
            extent.depth,
            dimension.label()
        )
    });
    Ok(module.instantiate(EntityKind::Resource, texture)?.into())
}

/// `Device.create_texture1d(width, format, heap=None, heap_offset=0)`
pub(super) fn create_texture1d(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let extent = Extent {
        width: args.required(0, "width")?,
        height: 1,
        depth: 1,
    };
    create_texture(object, args, Dimension::Texture1D, extent, 1)
}

/// `Device.create_texture2d(width, height, format, heap=None, heap_offset=0)`
pub(super) fn create_texture2d(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let extent = Extent {
        width: args.required(0, "width")?,
        height: args.required(1, "height")?,
        depth: 1,
    };
    create_texture(object, args, Dimension::Texture2D, extent, 2)
}

/// `Device.create_texture3d(width, height, depth, format, heap=None, heap_offset=0)`
pub(super) fn create_texture3d(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let extent = Extent {
        width: args.required(0, "width")?,
        height: args.required(1, "height")?,
        depth: args.required(2, "depth")?,
    };
    create_texture(object, args, Dimension::Texture3D, extent, 3)
}

/// Reads a 2D texture row by row as tightly packed pixels, for presentation.
pub(crate) fn read_pixels(
    module: &BackendModule,
    texture: &SoftwareResource,
) -> Result<Vec<u8>, HostError> {
    let bytes_per_pixel = texture.format.map_or(0, PixelFormat::bytes_per_pixel);
    let row_len = texture.width * u64::from(bytes_per_pixel);
    let rows = (0..texture.height).map(|y| (y * texture.row_pitch, row_len));
    texture.read_rows(module, rows)
}
