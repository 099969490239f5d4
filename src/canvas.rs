use crate::error::{BrandError, Result};
use crate::models::Rgb;
use image::{imageops, Rgba, RgbaImage};

/// Corner radius as a fraction of the icon width.
const CORNER_RADIUS_RATIO: f32 = 0.15;
/// How far the drop shadow sits below and to the right of the icon.
const SHADOW_OFFSET: u32 = 5;
const SHADOW_SIGMA: f32 = 5.0;
const SHADOW_OPACITY: u8 = 96;

fn check_geometry(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BrandError::InvalidGeometry { width, height });
    }
    Ok(())
}

/// Blends two channel values with an 8-bit weight, rounding to nearest.
fn mix(from: u8, to: u8, weight: u32) -> u8 {
    ((from as u32 * (255 - weight) + to as u32 * weight + 127) / 255) as u8
}

/// Paints an opaque diagonal gradient running from `start` at the top-left
/// corner towards `end` at the bottom-right.
pub fn diagonal_gradient(width: u32, height: u32, start: Rgb, end: Rgb) -> Result<RgbaImage> {
    check_geometry(width, height)?;
    let span = width as u64 + height as u64;
    let (from, to) = (start.channels(), end.channels());

    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let weight = (255 * (x as u64 + y as u64) / span) as u32;
        *pixel = Rgba([
            mix(from[0], to[0], weight),
            mix(from[1], to[1], weight),
            mix(from[2], to[2], weight),
            255,
        ]);
    }
    Ok(image)
}

pub fn corner_radius(width: u32) -> u32 {
    (width as f32 * CORNER_RADIUS_RATIO) as u32
}

/// Whether the center of pixel (x, y) falls inside the rounded rectangle
/// spanning the whole `width` x `height` area.
fn inside_rounded_rect(x: u32, y: u32, width: u32, height: u32, radius: f32) -> bool {
    let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
    let cx = px.clamp(radius, width as f32 - radius);
    let cy = py.clamp(radius, height as f32 - radius);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= radius * radius
}

/// Clears alpha outside a rounded rectangle with the given corner radius.
pub fn round_corners(image: &mut RgbaImage, radius: u32) {
    let (width, height) = image.dimensions();
    let radius = radius.min(width / 2).min(height / 2) as f32;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if !inside_rounded_rect(x, y, width, height, radius) {
            pixel[3] = 0;
        }
    }
}

/// Composites `image` over a blurred, offset black silhouette of itself.
/// The output has the same dimensions as the input.
pub fn with_drop_shadow(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();

    let mut silhouette = RgbaImage::new(width, height);
    for (x, y, pixel) in silhouette.enumerate_pixels_mut() {
        if x < SHADOW_OFFSET || y < SHADOW_OFFSET {
            continue;
        }
        let coverage = image.get_pixel(x - SHADOW_OFFSET, y - SHADOW_OFFSET)[3] as u32;
        *pixel = Rgba([0, 0, 0, (coverage * SHADOW_OPACITY as u32 / 255) as u8]);
    }

    let mut composed = imageops::blur(&silhouette, SHADOW_SIGMA);
    imageops::overlay(&mut composed, image, 0, 0);
    composed
}
