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

//! Offscreen swapchains.

use super::resource::{self, Dimension, SoftwareResource};
use super::{code_arg, debug_message, lock, native_arg, release, to_index, MAX_ALLOCATION};
use prism_core::api::PixelFormat;
use prism_core::backend::EntityKind;
use prism_core::error::{ErrorCategoryKind, HostError};
use prism_core::host::{Args, AttributeDef, HostObject, HostValue, OperationDef, TypeSpec};
use std::sync::Mutex;

const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug)]
struct Images {
    buffers: Vec<Vec<u8>>,
    current: usize,
    last_presented: Option<usize>,
    presented: u64,
}

/// A ring of back buffers presented to nowhere.
///
/// The window handle is accepted but never touched; presented images can be
/// read back instead.
#[derive(Debug)]
pub struct SoftwareSwapchain {
    width: u32,
    height: u32,
    format: PixelFormat,
    images: Mutex<Images>,
}

fn swapchain(object: &HostObject) -> Result<&SoftwareSwapchain, HostError> {
    object.downcast::<SoftwareSwapchain>()
}

pub(super) fn spec() -> TypeSpec {
    TypeSpec::of::<SoftwareSwapchain>("An offscreen presentation target.")
        .destructor(release::<SoftwareSwapchain>)
        .attribute(AttributeDef::new("width", "Width in pixels.", |object| {
            Ok(swapchain(object)?.width.into())
        }))
        .attribute(AttributeDef::new("height", "Height in pixels.", |object| {
            Ok(swapchain(object)?.height.into())
        }))
        .attribute(AttributeDef::new("format", "Pixel format code.", |object| {
            Ok(swapchain(object)?.format.code().into())
        }))
        .attribute(AttributeDef::new("num_buffers", "Back buffer count.", |object| {
            Ok(lock(&swapchain(object)?.images).buffers.len().into())
        }))
        .attribute(AttributeDef::new("presented", "Frames presented so far.", |object| {
            HostValue::checked_int(lock(&swapchain(object)?.images).presented, "presented")
        }))
        .operation(
            OperationDef::new("present", "present(resource, x=0, y=0)", present)
                .uses(&["width", "height", "format"]),
        )
        .operation(OperationDef::new(
            "readback",
            "Returns the last presented image, tightly packed.",
            readback,
        ))
}

/// `Device.create_swapchain(window_handle, format, num_buffers=3, width=0, height=0)`
pub(super) fn create(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let category = ErrorCategoryKind::Device;
    let window_handle = args
        .present(0, "window_handle")
        .ok_or_else(|| HostError::MissingArgument("window_handle".to_string()))?;
    let format: PixelFormat = code_arg(module, category, args, 1, "format", None)?;
    let num_buffers: u32 = args.or(2, "num_buffers", 3)?;
    let width: u32 = args.or(3, "width", 0)?;
    let height: u32 = args.or(4, "height", 0)?;

    if !matches!(
        format,
        PixelFormat::R8G8B8A8Unorm
            | PixelFormat::R8G8B8A8UnormSrgb
            | PixelFormat::B8G8R8A8Unorm
            | PixelFormat::B8G8R8A8UnormSrgb
    ) {
        return Err(module.raise(category, format!("unsupported swapchain format {format}")));
    }
    if width == 0 || height == 0 {
        return Err(module.raise(
            category,
            "offscreen swapchains need an explicit width and height",
        ));
    }
    if num_buffers == 0 {
        return Err(module.raise(category, "a swapchain needs at least one buffer"));
    }
    let image_size = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL as u64));
    let total = image_size.and_then(|size| size.checked_mul(u64::from(num_buffers)));
    let (Some(image_size), Some(total)) = (image_size, total) else {
        return Err(module.raise(
            category,
            format!("{num_buffers} images of {width}x{height} overflow the address space"),
        ));
    };
    if total > MAX_ALLOCATION {
        return Err(module.raise(
            category,
            format!("cannot allocate {num_buffers} images of {width}x{height}"),
        ));
    }
    let image_len = to_index(module, category, image_size)?;

    log::debug!(
        "Creating {width}x{height} {format} swapchain for '{}'",
        window_handle.type_name()
    );
    let native = SoftwareSwapchain {
        width,
        height,
        format,
        images: Mutex::new(Images {
            buffers: vec![vec![0; image_len]; num_buffers as usize],
            current: 0,
            last_presented: None,
            presented: 0,
        }),
    };
    debug_message(module, || {
        format!("Created {width}x{height} {format} swapchain with {num_buffers} buffers")
    });
    Ok(module.instantiate(EntityKind::Swapchain, native)?.into())
}

fn present(object: &HostObject, args: &Args) -> Result<HostValue, HostError> {
    let module = object.module();
    let this = swapchain(object)?;
    let value = args
        .present(0, "resource")
        .ok_or_else(|| HostError::MissingArgument("resource".to_string()))?;
    let texture = native_arg::<SoftwareResource>(module, EntityKind::Resource, value)?;
    let x: u32 = args.or(1, "x", 0)?;
    let y: u32 = args.or(2, "y", 0)?;

    let format = match texture.format() {
        Some(format) if texture.dimension() == Dimension::Texture2D => format,
        _ => {
            return Err(module.raise(
                ErrorCategoryKind::Texture2D,
                "only 2D textures can be presented",
            ))
        }
    };
    if format.bytes_per_pixel() as usize != BYTES_PER_PIXEL {
        return Err(module.raise(
            ErrorCategoryKind::Texture2D,
            format!("cannot present a {format} texture to a {} swapchain", this.format),
        ));
    }
    let pixels = resource::read_pixels(module, &texture)?;
    let swizzle = format.is_bgra() != this.format.is_bgra();

    let mut images = lock(&this.images);
    let current = images.current;
    blit(
        &mut images.buffers[current],
        (this.width as usize, this.height as usize),
        &pixels,
        (texture.width() as usize, texture.height() as usize),
        (x as usize, y as usize),
        swizzle,
    );
    images.last_presented = Some(current);
    images.current = (current + 1) % images.buffers.len();
    images.presented += 1;
    Ok(HostValue::None)
}

/// Copies `source` into `target` at `origin`, clipping to the target.
fn blit(
    target: &mut [u8],
    (target_width, target_height): (usize, usize),
    source: &[u8],
    (source_width, source_height): (usize, usize),
    (x, y): (usize, usize),
    swizzle: bool,
) {
    if x >= target_width || y >= target_height {
        return;
    }
    let columns = source_width.min(target_width - x);
    let rows = source_height.min(target_height - y);
    for row in 0..rows {
        let from = row * source_width * BYTES_PER_PIXEL;
        let to = ((y + row) * target_width + x) * BYTES_PER_PIXEL;
        let len = columns * BYTES_PER_PIXEL;
        let destination = &mut target[to..to + len];
        destination.copy_from_slice(&source[from..from + len]);
        if swizzle {
            for pixel in destination.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.swap(0, 2);
            }
        }
    }
}

fn readback(object: &HostObject, _args: &Args) -> Result<HostValue, HostError> {
    let this = swapchain(object)?;
    let images = lock(&this.images);
    let image = match images.last_presented {
        Some(index) => images.buffers[index].clone(),
        None => vec![0; images.buffers.first().map_or(0, Vec::len)],
    };
    Ok(image.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_clips_to_the_target() {
        let mut target = vec![0u8; 2 * 2 * BYTES_PER_PIXEL];
        let source: Vec<u8> = (1..=3 * 3 * BYTES_PER_PIXEL as u8).collect();
        blit(&mut target, (2, 2), &source, (3, 3), (1, 1), false);
        assert_eq!(&target[..3 * BYTES_PER_PIXEL], &[0; 12]);
        assert_eq!(&target[3 * BYTES_PER_PIXEL..], &source[..BYTES_PER_PIXEL]);
    }

    #[test]
    fn blit_swizzles_red_and_blue() {
        let mut target = vec![0u8; BYTES_PER_PIXEL];
        blit(&mut target, (1, 1), &[1, 2, 3, 4], (1, 1), (0, 0), true);
        assert_eq!(target, [3, 2, 1, 4]);
    }

    #[test]
    fn blit_outside_the_target_is_a_no_op() {
        let mut target = vec![7u8; BYTES_PER_PIXEL];
        blit(&mut target, (1, 1), &[1, 2, 3, 4], (1, 1), (1, 0), false);
        assert_eq!(target, [7; 4]);
    }
}
