use image::imageops;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use log::debug;

use crate::error::{Result, ScanError};
use crate::grid::GridGeometry;

/// Which extreme of the table to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Closest to the image origin
    UpperLeft,
    /// Closest to `(height, width)`
    LowerRight,
}

impl Corner {
    fn reference(self, height: u32, width: u32) -> (f64, f64) {
        match self {
            Corner::UpperLeft => (0.0, 0.0),
            Corner::LowerRight => (height as f64, width as f64),
        }
    }
}

/// Nonzero pixel of `mask` nearest to the chosen image corner, as
/// `(row, col)`. Ties keep the first pixel in row-major order.
pub fn find_corner(mask: &GrayImage, corner: Corner) -> Result<(u32, u32)> {
    let (width, height) = mask.dimensions();
    let (ref_row, ref_col) = corner.reference(height, width);

    let mut best: Option<((u32, u32), f64)> = None;
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        let d_row = y as f64 - ref_row;
        let d_col = x as f64 - ref_col;
        let distance = d_row * d_row + d_col * d_col;
        match best {
            Some((_, nearest)) if distance >= nearest => {}
            _ => best = Some(((y, x), distance)),
        }
    }

    best.map(|(position, _)| position).ok_or(ScanError::EmptyMask)
}

/// Candidate table-border pixels: everything at or below the Otsu level
pub fn border_mask(scan: &GrayImage) -> GrayImage {
    let level = otsu_level(scan);
    debug!("Border mask at Otsu level {}", level);
    GrayImage::from_fn(scan.width(), scan.height(), |x, y| {
        if scan.get_pixel(x, y)[0] <= level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Located table corners compared with the ones a geometry implies.
///
/// Offsets are `(rows, cols)`, located minus expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub upper_left: (u32, u32),
    pub lower_right: (u32, u32),
    pub upper_left_offset: (i64, i64),
    pub lower_right_offset: (i64, i64),
}

impl Registration {
    /// Both corners lie within `tolerance` pixels on each axis
    pub fn is_consistent(&self, tolerance: u32) -> bool {
        let tolerance = tolerance as i64;
        [self.upper_left_offset, self.lower_right_offset]
            .iter()
            .all(|(dr, dc)| dr.abs() <= tolerance && dc.abs() <= tolerance)
    }

    /// Geometry re-anchored on the located upper-left corner
    pub fn anchor(&self, geometry: &GridGeometry) -> GridGeometry {
        let ((row, col), _) = geometry.implied_corners();
        let dy = self.upper_left.0.saturating_sub(row);
        let dx = self.upper_left.1.saturating_sub(col);
        geometry.translated(dy, dx)
    }

    /// Crop the scan so the located upper-left corner lands where the
    /// geometry expects it. Offsets toward the origin are left alone.
    pub fn align(&self, scan: &GrayImage) -> GrayImage {
        let dy = self.upper_left_offset.0.clamp(0, scan.height() as i64) as u32;
        let dx = self.upper_left_offset.1.clamp(0, scan.width() as i64) as u32;
        imageops::crop_imm(scan, dx, dy, scan.width() - dx, scan.height() - dy).to_image()
    }
}

fn offset(found: (u32, u32), expected: (u32, u32)) -> (i64, i64) {
    (
        found.0 as i64 - expected.0 as i64,
        found.1 as i64 - expected.1 as i64,
    )
}

/// Locate both table corners in `mask` and compare them with `geometry`
pub fn register(mask: &GrayImage, geometry: &GridGeometry) -> Result<Registration> {
    let upper_left = find_corner(mask, Corner::UpperLeft)?;
    let lower_right = find_corner(mask, Corner::LowerRight)?;
    let (expected_ul, expected_lr) = geometry.implied_corners();

    let registration = Registration {
        upper_left,
        lower_right,
        upper_left_offset: offset(upper_left, expected_ul),
        lower_right_offset: offset(lower_right, expected_lr),
    };
    debug!(
        "Registration: upper-left {:?} (offset {:?}), lower-right {:?} (offset {:?})",
        registration.upper_left,
        registration.upper_left_offset,
        registration.lower_right,
        registration.lower_right_offset
    );
    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: u32, height: u32, points: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(row, col) in points {
            mask.put_pixel(col, row, Luma([255]));
        }
        mask
    }

    #[test]
    fn test_single_pixel_for_both_corners() {
        let mask = mask_with(20, 10, &[(4, 13)]);
        assert_eq!(find_corner(&mask, Corner::UpperLeft).unwrap(), (4, 13));
        assert_eq!(find_corner(&mask, Corner::LowerRight).unwrap(), (4, 13));
    }

    #[test]
    fn test_extremal_pixels() {
        let mask = mask_with(20, 10, &[(2, 3), (5, 5), (8, 17)]);
        assert_eq!(find_corner(&mask, Corner::UpperLeft).unwrap(), (2, 3));
        assert_eq!(find_corner(&mask, Corner::LowerRight).unwrap(), (8, 17));
    }

    #[test]
    fn test_ties_keep_row_major_first() {
        // (0, 3) and (3, 0) are equally far from the origin
        let mask = mask_with(10, 10, &[(3, 0), (0, 3)]);
        assert_eq!(find_corner(&mask, Corner::UpperLeft).unwrap(), (0, 3));
    }

    #[test]
    fn test_empty_mask_is_an_error() {
        let mask = GrayImage::new(8, 8);
        assert_eq!(
            find_corner(&mask, Corner::UpperLeft).unwrap_err(),
            ScanError::EmptyMask
        );
    }

    #[test]
    fn test_border_mask_picks_dark_pixels() {
        let mut scan = GrayImage::from_pixel(6, 6, Luma([230]));
        scan.put_pixel(1, 2, Luma([20]));
        scan.put_pixel(4, 4, Luma([20]));
        let mask = border_mask(&scan);
        let marked: Vec<_> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(x, y, _)| (y, x))
            .collect();
        assert_eq!(marked, vec![(2, 1), (4, 4)]);
    }

    #[test]
    fn test_registration_offsets_and_anchor() {
        let geometry = GridGeometry::new(vec![0, 10, 20], vec![0, 15, 30]).unwrap();
        // Table drawn 3 rows down and 2 columns right
        let mask = mask_with(40, 30, &[(3, 2), (23, 32), (12, 18)]);
        let registration = register(&mask, &geometry).unwrap();

        assert_eq!(registration.upper_left_offset, (3, 2));
        assert_eq!(registration.lower_right_offset, (3, 2));
        assert!(registration.is_consistent(3));
        assert!(!registration.is_consistent(2));

        let anchored = registration.anchor(&geometry);
        assert_eq!(anchored.implied_corners(), ((3, 2), (23, 32)));
    }

    #[test]
    fn test_align_crops_leading_margin() {
        let geometry = GridGeometry::new(vec![0, 10], vec![0, 10]).unwrap();
        let mask = mask_with(30, 20, &[(4, 6), (14, 16)]);
        let registration = register(&mask, &geometry).unwrap();

        let aligned = registration.align(&mask);
        assert_eq!(aligned.dimensions(), (24, 16));
        assert_eq!(find_corner(&aligned, Corner::UpperLeft).unwrap(), (0, 0));
    }
}
