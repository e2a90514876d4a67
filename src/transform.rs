use image::imageops;
use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::morphology::{grayscale_erode, Mask};

use crate::geometry::{expanded_canvas, rotation_about, transform_point};

/// Grayscale intensities in `[0, 1]`
pub type GrayF32 = Image<Luma<f32>>;

// Masks are limited to 511 pixels on a side
const MAX_MASK_REACH: u32 = 255;

/// Scale an 8-bit scan into `[0, 1]`
pub fn to_unit_gray(img: &GrayImage) -> GrayF32 {
    let (width, height) = img.dimensions();
    GrayF32::from_fn(width, height, |x, y| {
        Luma([img.get_pixel(x, y)[0] as f32 / 255.0])
    })
}

/// Quantize a `[0, 1]` image back to 8 bits
pub fn to_gray8(img: &GrayF32) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let v = img.get_pixel(x, y)[0].clamp(0.0, 1.0);
        Luma([(v * 255.0).round() as u8])
    })
}

/// Bilinear sample with coordinates clamped to the image, so anything
/// outside replicates the nearest edge pixel
fn bilinear_sample(img: &GrayF32, x: f64, y: f64) -> f32 {
    let (width, height) = img.dimensions();
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let x_frac = (x - x0 as f64) as f32;
    let y_frac = (y - y0 as f64) as f32;

    let p00 = img.get_pixel(x0, y0)[0];
    let p10 = img.get_pixel(x1, y0)[0];
    let p01 = img.get_pixel(x0, y1)[0];
    let p11 = img.get_pixel(x1, y1)[0];

    let top = p00 * (1.0 - x_frac) + p10 * x_frac;
    let bottom = p01 * (1.0 - x_frac) + p11 * x_frac;
    top * (1.0 - y_frac) + bottom * y_frac
}

/// Rotate about the image centre onto a canvas large enough to keep every
/// source pixel.
///
/// Positive angles turn counter-clockwise. Canvas regions with no source
/// pixel take the value of the nearest source edge pixel, so the new
/// corners never read as edges.
pub fn rotate_expanded(img: &GrayF32, degrees: f64) -> GrayF32 {
    let (src_width, src_height) = img.dimensions();
    if src_width == 0 || src_height == 0 {
        return img.clone();
    }

    let center = (src_width as f64 / 2.0, src_height as f64 / 2.0);
    let forward = rotation_about(center, degrees);
    let canvas = expanded_canvas(&forward, src_width, src_height);

    // The inverse of a rotation is the opposite rotation
    let inverse = rotation_about(center, -degrees);

    let (origin_x, origin_y) = canvas.origin;
    GrayF32::from_fn(canvas.width, canvas.height, |out_x, out_y| {
        let (src_x, src_y) =
            transform_point(&inverse, out_x as f64 + origin_x, out_y as f64 + origin_y);
        Luma([bilinear_sample(img, src_x, src_y)])
    })
}

/// [`rotate_expanded`] for 8-bit scans
pub fn rotate_scan(scan: &GrayImage, degrees: f64) -> GrayImage {
    to_gray8(&rotate_expanded(&to_unit_gray(scan), degrees))
}

/// Rotate by `turns` quarter turns counter-clockwise
pub fn rotate_quarter_turns(img: &GrayImage, turns: u8) -> GrayImage {
    match turns % 4 {
        0 => img.clone(),
        1 => imageops::rotate270(img),
        2 => imageops::rotate180(img),
        _ => imageops::rotate90(img),
    }
}

/// Darkest and brightest intensity, `None` for a uniform image
pub fn intensity_range(img: &GrayImage) -> Option<(u8, u8)> {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    (lo < hi).then_some((lo, hi))
}

/// Map `lo` to 0 and `hi` to 1
pub fn stretch(img: &GrayImage, (lo, hi): (u8, u8)) -> GrayF32 {
    let range = (hi - lo) as f32;
    let (width, height) = img.dimensions();
    GrayF32::from_fn(width, height, |x, y| {
        Luma([(img.get_pixel(x, y)[0] as f32 - lo as f32) / range])
    })
}

/// Stretch to the full `[0, 1]` range.
///
/// Returns `None` for a uniform image, which has no range to stretch.
pub fn normalize(img: &GrayImage) -> Option<GrayF32> {
    intensity_range(img).map(|range| stretch(img, range))
}

/// Disk structuring element of the given radius, centre included
pub fn disk_mask(radius: f32) -> Mask {
    let radius = radius.max(0.0);
    let reach = (radius.floor() as u32).min(MAX_MASK_REACH);
    let side = 2 * reach + 1;
    let limit = radius * radius;
    let footprint = GrayImage::from_fn(side, side, |x, y| {
        let dx = x as f32 - reach as f32;
        let dy = y as f32 - reach as f32;
        Luma([if dx * dx + dy * dy <= limit { 255 } else { 0 }])
    });
    Mask::from_image(&footprint, reach as u8, reach as u8)
}

/// Thicken dark strokes on a light background.
///
/// Grayscale dilation of the inverted image with a disk, inverted back,
/// which is a grayscale erosion of the image itself.
pub fn dilate_dark_strokes(img: &GrayImage, radius: f32) -> GrayImage {
    grayscale_erode(img, &disk_mask(radius))
}
