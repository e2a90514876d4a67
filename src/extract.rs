use image::imageops;
use image::GrayImage;
use log::{debug, warn};
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

use crate::catalog::CellDescriptor;
use crate::error::{Result, ScanError};
use crate::grid::GridGeometry;
use crate::transform::{
    dilate_dark_strokes, intensity_range, rotate_quarter_turns, stretch, to_unit_gray, GrayF32,
};

/// Per-call extraction settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Extra pixels kept below and right of the nominal box, so a slightly
    /// misregistered border is not cut off
    pub offset: u32,
    pub use_dilation: bool,
    /// Disk radius for [`dilate_dark_strokes`]
    pub selem_radius: f32,
    /// Turn the cell three quarter turns, for sub-tables printed sideways
    pub rotate: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            offset: 5,
            use_dilation: false,
            selem_radius: 1.5,
            rotate: false,
        }
    }
}

/// Pixels of one cell in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCell {
    pixels: GrayF32,
    blank: bool,
}

impl ExtractedCell {
    pub fn pixels(&self) -> &GrayF32 {
        &self.pixels
    }

    pub fn into_pixels(self) -> GrayF32 {
        self.pixels
    }

    /// The crop was uniform: nothing written in it and nothing normalized
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Cut one cell out of a scan.
///
/// The crop spans the descriptor's boundaries plus `offset` pixels on the
/// lower and right edges. It is optionally turned, then stretched to
/// `[0, 1]`, then optionally dilated. A uniform crop is returned as a blank
/// cell holding its intensities scaled by 1/255.
pub fn extract_cell(
    scan: &GrayImage,
    geometry: &GridGeometry,
    descriptor: &CellDescriptor,
    options: &ExtractOptions,
) -> Result<ExtractedCell> {
    let cell = geometry.cell_box(descriptor)?;
    let height = cell.height() + options.offset;
    let width = cell.width() + options.offset;

    let (image_width, image_height) = scan.dimensions();
    if cell.top + height > image_height || cell.left + width > image_width {
        return Err(ScanError::CropOutOfImage {
            top: cell.top,
            left: cell.left,
            height,
            width,
            image_height,
            image_width,
        });
    }

    let mut crop = imageops::crop_imm(scan, cell.left, cell.top, width, height).to_image();
    if options.rotate {
        crop = rotate_quarter_turns(&crop, 3);
    }

    let range = match intensity_range(&crop) {
        Some(range) => range,
        None => {
            debug!("Cell {} is blank", descriptor.key);
            return Ok(ExtractedCell {
                pixels: to_unit_gray(&crop),
                blank: true,
            });
        }
    };

    // Erosion commutes with the stretch, so the range is taken beforehand
    if options.use_dilation {
        crop = dilate_dark_strokes(&crop, options.selem_radius);
    }
    let pixels = stretch(&crop, range);

    Ok(ExtractedCell {
        pixels,
        blank: false,
    })
}

/// Extract the same cell from every scan, in input order. A failure on one
/// scan does not affect the others.
pub fn extract_batch(
    scans: &[GrayImage],
    geometry: &GridGeometry,
    descriptor: &CellDescriptor,
    options: &ExtractOptions,
) -> Vec<Result<ExtractedCell>> {
    let cells: Vec<_> = scans
        .par_iter()
        .map(|scan| extract_cell(scan, geometry, descriptor, options))
        .collect();

    let failed = cells.iter().filter(|c| c.is_err()).count();
    if failed > 0 {
        warn!(
            "{} of {} scans failed for cell {}",
            failed,
            scans.len(),
            descriptor.key
        );
    }
    cells
}

/// Extract a cell from `size` scans drawn uniformly without replacement,
/// for visual spot checks. Each entry carries the index of its scan.
pub fn sample_preview<R: Rng + ?Sized>(
    scans: &[GrayImage],
    geometry: &GridGeometry,
    descriptor: &CellDescriptor,
    options: &ExtractOptions,
    size: usize,
    rng: &mut R,
) -> Result<Vec<(usize, Result<ExtractedCell>)>> {
    if size > scans.len() {
        return Err(ScanError::SampleTooLarge {
            requested: size,
            available: scans.len(),
        });
    }

    let picked = index::sample(rng, scans.len(), size).into_vec();
    Ok(picked
        .into_par_iter()
        .map(|i| (i, extract_cell(&scans[i], geometry, descriptor, options)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::normalize;
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_grid() -> GridGeometry {
        GridGeometry::new(vec![0, 10, 20], vec![0, 10, 20]).unwrap()
    }

    fn first_cell() -> CellDescriptor {
        CellDescriptor::at("Test", 0, 1, 0, 1)
    }

    fn no_offset() -> ExtractOptions {
        ExtractOptions {
            offset: 0,
            ..ExtractOptions::default()
        }
    }

    fn gradient_scan(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 3) % 200) as u8 + 20]))
    }

    #[test]
    fn test_uniform_cell_is_blank() {
        let scan = GrayImage::from_pixel(20, 20, Luma([128]));
        let cell = extract_cell(&scan, &small_grid(), &first_cell(), &no_offset()).unwrap();

        assert!(cell.is_blank());
        assert_eq!(cell.dimensions(), (10, 10));
        assert!(cell
            .pixels()
            .pixels()
            .all(|p| (p[0] - 128.0 / 255.0).abs() < 1e-6));
    }

    #[test]
    fn test_normalized_cell_spans_unit_range() {
        let scan = gradient_scan(20, 20);
        let cell = extract_cell(&scan, &small_grid(), &first_cell(), &no_offset()).unwrap();

        assert!(!cell.is_blank());
        let values = cell.pixels().as_raw();
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(values.contains(&0.0));
        assert!(values.contains(&1.0));
    }

    #[test]
    fn test_offset_pads_lower_right() {
        let scan = gradient_scan(30, 30);
        let options = ExtractOptions::default();
        let cell = extract_cell(&scan, &small_grid(), &first_cell(), &options).unwrap();
        assert_eq!(cell.dimensions(), (15, 15));

        let wide = CellDescriptor::at("Wide", 0, 1, 0, 2);
        let cell = extract_cell(&scan, &small_grid(), &wide, &options).unwrap();
        // (width, height)
        assert_eq!(cell.dimensions(), (25, 15));
    }

    #[test]
    fn test_crop_past_image_fails() {
        let scan = gradient_scan(20, 20);
        let last = CellDescriptor::at("Last", 1, 2, 1, 2);
        let err = extract_cell(&scan, &small_grid(), &last, &ExtractOptions::default())
            .unwrap_err();
        assert!(matches!(err, ScanError::CropOutOfImage { .. }));
    }

    #[test]
    fn test_bad_descriptor_fails_fast() {
        let scan = gradient_scan(40, 40);
        let bad = CellDescriptor::at("Bad", 1, 1, 0, 1);
        let err = extract_cell(&scan, &small_grid(), &bad, &no_offset()).unwrap_err();
        assert!(matches!(err, ScanError::EmptyRange { axis: "row", .. }));
    }

    #[test]
    fn test_dilation_off_matches_plain_normalization() {
        let scan = gradient_scan(30, 30);
        let options = ExtractOptions {
            rotate: true,
            ..ExtractOptions::default()
        };
        let cell = extract_cell(&scan, &small_grid(), &first_cell(), &options).unwrap();

        let crop = imageops::crop_imm(&scan, 0, 0, 15, 15).to_image();
        let expected = normalize(&rotate_quarter_turns(&crop, 3)).unwrap();
        assert_eq!(cell.pixels(), &expected);
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let scan = gradient_scan(30, 30);
        let tall = CellDescriptor::at("Tall", 0, 2, 0, 1);
        let options = ExtractOptions {
            offset: 0,
            rotate: true,
            ..ExtractOptions::default()
        };
        let cell = extract_cell(&scan, &small_grid(), &tall, &options).unwrap();
        assert_eq!(cell.dimensions(), (20, 10));
    }

    #[test]
    fn test_dilation_darkens_neighbourhood() {
        let mut scan = GrayImage::from_pixel(20, 20, Luma([240]));
        scan.put_pixel(5, 5, Luma([10]));
        let options = ExtractOptions {
            offset: 0,
            use_dilation: true,
            ..ExtractOptions::default()
        };
        let cell = extract_cell(&scan, &small_grid(), &first_cell(), &options).unwrap();
        let dark = cell.pixels().pixels().filter(|p| p[0] == 0.0).count();
        // 3x3 disk of radius 1.5
        assert_eq!(dark, 9);
    }

    #[test]
    fn test_dilation_is_minimum_of_plain_cell() {
        let scan = gradient_scan(20, 20);
        let plain = extract_cell(&scan, &small_grid(), &first_cell(), &no_offset()).unwrap();
        let options = ExtractOptions {
            use_dilation: true,
            ..no_offset()
        };
        let thick = extract_cell(&scan, &small_grid(), &first_cell(), &options).unwrap();

        for (x, y, p) in thick.pixels().enumerate_pixels() {
            let mut darkest = f32::INFINITY;
            for ny in y.saturating_sub(1)..=(y + 1).min(9) {
                for nx in x.saturating_sub(1)..=(x + 1).min(9) {
                    darkest = darkest.min(plain.pixels().get_pixel(nx, ny)[0]);
                }
            }
            assert_eq!(p[0], darkest);
        }
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let scans = vec![
            gradient_scan(20, 20),
            GrayImage::from_pixel(20, 20, Luma([90])),
            gradient_scan(5, 5),
        ];
        let cells = extract_batch(&scans, &small_grid(), &first_cell(), &no_offset());
        assert_eq!(cells.len(), 3);
        assert!(!cells[0].as_ref().unwrap().is_blank());
        assert!(cells[1].as_ref().unwrap().is_blank());
        assert!(cells[2].is_err());
    }

    #[test]
    fn test_preview_is_reproducible_and_distinct() {
        let scans: Vec<_> = (0..12).map(|i| gradient_scan(20 + i, 20)).collect();
        let grid = small_grid();
        let cell = first_cell();
        let options = no_offset();

        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            sample_preview(&scans, &grid, &cell, &options, 5, &mut rng).unwrap()
        };
        let first = pick(7);
        let again = pick(7);
        assert_eq!(first, again);

        let mut indices: Vec<_> = first.iter().map(|(i, _)| *i).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 5);

        for (i, preview) in &first {
            let direct = extract_cell(&scans[*i], &grid, &cell, &options);
            assert_eq!(preview, &direct);
        }
    }

    #[test]
    fn test_preview_larger_than_batch_fails() {
        let scans = vec![gradient_scan(20, 20)];
        let mut rng = StdRng::seed_from_u64(1);
        let err = sample_preview(
            &scans,
            &small_grid(),
            &first_cell(),
            &no_offset(),
            2,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScanError::SampleTooLarge {
                requested: 2,
                available: 1
            }
        );
    }
}
