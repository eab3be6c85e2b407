//! Pixel operations on 16×16 block fragments and tile output.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::RenderError;

/// Edge length of one block fragment in pixels.
pub const FRAGMENT_SIZE: u32 = 16;

/// Biome tint applied to monochrome textures.
pub const DEFAULT_TINT: [u8; 3] = [0x79, 0xc0, 0x5a];

/// Elevation at which shading is neutral.
pub const SEA_LEVEL: i32 = 64;

/// Fully transparent fragment used when a texture cannot be found.
pub fn placeholder() -> RgbaImage {
    RgbaImage::from_pixel(FRAGMENT_SIZE, FRAGMENT_SIZE, Rgba([0, 0, 0, 0]))
}

/// Decode PNG or TGA bytes.
pub fn decode(bytes: &[u8], format: ImageFormat) -> image::ImageResult<RgbaImage> {
    Ok(image::load_from_memory_with_format(bytes, format)?.to_rgba8())
}

/// Crop to the top square (animated strips) and scale to 16×16.
pub fn normalize(img: RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == FRAGMENT_SIZE && h == FRAGMENT_SIZE {
        return img;
    }
    if w == 0 || h == 0 {
        return placeholder();
    }
    let side = w.min(h);
    let square = if w == h {
        img
    } else {
        imageops::crop_imm(&img, 0, 0, side, side).to_image()
    };
    imageops::resize(&square, FRAGMENT_SIZE, FRAGMENT_SIZE, FilterType::Nearest)
}

/// Multiply every colour channel by `tint`. Alpha is kept.
pub fn multiply_tint(img: &mut RgbaImage, tint: [u8; 3]) {
    for p in img.pixels_mut() {
        for c in 0..3 {
            p.0[c] = ((p.0[c] as u16 * tint[c] as u16 + 127) / 255) as u8;
        }
    }
}

/// Blend target and opacity for a block whose column floor sits at `y`.
///
/// Below sea level the fragment darkens with opacity `(64 - y) / (y * 64)`,
/// at or above it lightens with `(y - 64) / y`, clamped to `[0, 1]`.
pub fn shade_params(y: i32) -> (Rgba<u8>, f32) {
    let yf = y as f32;
    let (target, opacity) = if y < SEA_LEVEL {
        (Rgba([0, 0, 0, 255]), (64.0 - yf) / (yf * 64.0))
    } else {
        (Rgba([255, 255, 255, 255]), (yf - 64.0) / yf)
    };
    let opacity = if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    };
    (target, opacity)
}

/// Overlay-blend a solid colour onto the fragment by the elevation opacity.
pub fn shade(img: &mut RgbaImage, y: i32) {
    let (target, opacity) = shade_params(y);
    if opacity == 0.0 {
        return;
    }
    for p in img.pixels_mut() {
        for c in 0..3 {
            let d = p.0[c] as f32 / 255.0;
            let s = target.0[c] as f32 / 255.0;
            let ov = overlay(d, s);
            let mixed = d + (ov - d) * opacity;
            p.0[c] = (mixed * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn overlay(d: f32, s: f32) -> f32 {
    if d <= 0.5 {
        2.0 * d * s
    } else {
        1.0 - 2.0 * (1.0 - d) * (1.0 - s)
    }
}

/// Draw `top` over `canvas` with its top-left corner at (`x`, `y`),
/// source-over. Pixels outside the canvas are dropped.
pub fn draw_over(canvas: &mut RgbaImage, top: &RgbaImage, x: u32, y: u32) {
    let (cw, ch) = canvas.dimensions();
    for (tx, ty, src) in top.enumerate_pixels() {
        let (px, py) = (x + tx, y + ty);
        if px >= cw || py >= ch {
            continue;
        }
        let dst = canvas.get_pixel_mut(px, py);
        *dst = blend_over(*dst, *src);
    }
}

fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    match src.0[3] {
        0 => dst,
        255 => src,
        sa => {
            let sa = sa as f32 / 255.0;
            let da = dst.0[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            let mut out = [0u8; 4];
            for c in 0..3 {
                let s = src.0[c] as f32 / 255.0;
                let d = dst.0[c] as f32 / 255.0;
                let v = (s * sa + d * da * (1.0 - sa)) / out_a;
                out[c] = (v * 255.0).round() as u8;
            }
            out[3] = (out_a * 255.0).round() as u8;
            Rgba(out)
        }
    }
}

/// Write a PNG next to `path` and rename it into place.
pub fn save_png_atomic(img: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let tmp = path.with_extension("png.tmp");
    img.save_with_format(&tmp, ImageFormat::Png)
        .map_err(|source| RenderError::Image {
            path: tmp.clone(),
            source,
        })?;
    std::fs::rename(&tmp, path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
