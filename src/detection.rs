use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};
use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Result, ScanError};
use crate::transform::{rotate_expanded, to_unit_gray, GrayF32};

/// Angle window searched by [`estimate_rotation`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSearch {
    /// Lower bound, included
    pub min_degrees: f64,
    /// Upper bound, excluded
    pub max_degrees: f64,
    pub step_degrees: f64,
}

impl Default for RotationSearch {
    fn default() -> Self {
        Self {
            min_degrees: -1.0,
            max_degrees: 1.0,
            step_degrees: 0.1,
        }
    }
}

impl RotationSearch {
    /// Sampled angles in ascending order, `min + i * step` below `max`
    pub fn angles(&self) -> Result<Vec<f64>> {
        if !self.min_degrees.is_finite()
            || !self.max_degrees.is_finite()
            || self.min_degrees >= self.max_degrees
        {
            return Err(ScanError::InvalidAngleRange {
                min: self.min_degrees,
                max: self.max_degrees,
            });
        }
        if !self.step_degrees.is_finite() || self.step_degrees <= 0.0 {
            return Err(ScanError::InvalidStep(self.step_degrees));
        }

        let span = (self.max_degrees - self.min_degrees) / self.step_degrees;
        if !span.is_finite() {
            return Err(ScanError::InvalidStep(self.step_degrees));
        }
        let count = (span - 1e-9).ceil().max(1.0) as usize;
        Ok((0..count)
            .map(|i| self.min_degrees + i as f64 * self.step_degrees)
            .collect())
    }
}

/// Result of the rotation search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationEstimate {
    /// Corrective rotation, counter-clockwise positive
    pub angle_degrees: f64,
    /// Tallest vertical-projection peak at that angle
    pub peak: f32,
    /// Edge pixels found before rotating
    pub edge_count: usize,
}

impl RotationEstimate {
    /// An image without edges gives an arbitrary angle
    pub fn is_reliable(&self) -> bool {
        self.edge_count > 0
    }
}

/// Binarized edge map, 1.0 on edges and 0.0 elsewhere
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub pixels: GrayF32,
    pub edge_count: usize,
}

/// Row and column sums of inverted intensity (`max - value`)
#[derive(Debug, Clone, PartialEq)]
pub struct Projections {
    /// One sum per row
    pub horizontal: Vec<f32>,
    /// One sum per column
    pub vertical: Vec<f32>,
}

/// Beucher gradient: 3x3 dilation minus 3x3 erosion, scaled to `[0, 1]`
fn morphological_gradient(scan: &GrayImage) -> GrayF32 {
    let square = Mask::square(1);
    let dilated = grayscale_dilate(scan, &square);
    let eroded = grayscale_erode(scan, &square);
    GrayF32::from_fn(scan.width(), scan.height(), |x, y| {
        let spread = dilated.get_pixel(x, y)[0].saturating_sub(eroded.get_pixel(x, y)[0]);
        Luma([spread as f32 / 255.0])
    })
}

fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt() as f32
}

/// Edge map thresholded at one standard deviation of the gradient
/// magnitude, so the threshold follows each scan's contrast
pub fn edge_map(scan: &GrayImage) -> EdgeMap {
    let gradient = morphological_gradient(scan);
    let threshold = std_dev(gradient.as_raw());

    let mut edge_count = 0;
    let mut pixels = gradient;
    for p in pixels.pixels_mut() {
        if p[0] > threshold {
            p[0] = 1.0;
            edge_count += 1;
        } else {
            p[0] = 0.0;
        }
    }

    debug!(
        "Edge map: {} of {} pixels above threshold {:.4}",
        edge_count,
        pixels.len(),
        threshold
    );
    EdgeMap { pixels, edge_count }
}

fn column_sums(img: &GrayF32) -> Vec<f32> {
    let mut sums = vec![0.0f32; img.width() as usize];
    for (x, _, p) in img.enumerate_pixels() {
        sums[x as usize] += p[0];
    }
    sums
}

/// Projection profiles of a scan, dark ink counting high
pub fn projections(scan: &GrayImage) -> Projections {
    let img = to_unit_gray(scan);
    let max = img.pixels().map(|p| p[0]).fold(0.0f32, f32::max);

    let mut horizontal = vec![0.0f32; img.height() as usize];
    let mut vertical = vec![0.0f32; img.width() as usize];
    for (x, y, p) in img.enumerate_pixels() {
        let ink = max - p[0];
        horizontal[y as usize] += ink;
        vertical[x as usize] += ink;
    }

    Projections {
        horizontal,
        vertical,
    }
}

/// Find the rotation that best aligns the table's vertical rulings with
/// the pixel columns.
///
/// Every sampled angle rotates the edge map and scores it by the tallest
/// column sum; rulings that are exactly vertical stack their edge pixels
/// into a few columns. The highest score wins, the lowest angle on ties.
///
/// A scan without edges still yields an angle. Check
/// [`RotationEstimate::is_reliable`] before using it.
pub fn estimate_rotation(scan: &GrayImage, search: &RotationSearch) -> Result<RotationEstimate> {
    let angles = search.angles()?;
    let edges = edge_map(scan);

    let peaks: Vec<f32> = angles
        .par_iter()
        .map(|&angle| {
            let rotated = rotate_expanded(&edges.pixels, angle);
            column_sums(&rotated).into_iter().fold(0.0f32, f32::max)
        })
        .collect();

    let mut best = 0;
    for (i, &peak) in peaks.iter().enumerate() {
        debug!("angle {:+.3}°: peak {:.1}", angles[i], peak);
        if peak > peaks[best] {
            best = i;
        }
    }

    let estimate = RotationEstimate {
        angle_degrees: angles[best],
        peak: peaks[best],
        edge_count: edges.edge_count,
    };
    info!(
        "Estimated rotation {:+.3}° over {} angles (peak {:.1}, {} edge pixels)",
        estimate.angle_degrees,
        angles.len(),
        estimate.peak,
        estimate.edge_count
    );
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_search_samples() {
        let angles = RotationSearch::default().angles().unwrap();
        assert_eq!(angles.len(), 20);
        assert_relative_eq!(angles[0], -1.0);
        assert_relative_eq!(angles[19], 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_search_rejected() {
        let search = RotationSearch {
            min_degrees: 1.0,
            max_degrees: -1.0,
            step_degrees: 0.1,
        };
        assert!(matches!(
            search.angles(),
            Err(ScanError::InvalidAngleRange { .. })
        ));

        let search = RotationSearch {
            step_degrees: 0.0,
            ..RotationSearch::default()
        };
        assert_eq!(search.angles().unwrap_err(), ScanError::InvalidStep(0.0));
    }

    #[test]
    fn test_unbounded_search_rejected() {
        for (min, max) in [
            (-1.0, f64::INFINITY),
            (f64::NEG_INFINITY, 1.0),
            (f64::NAN, 1.0),
        ] {
            let search = RotationSearch {
                min_degrees: min,
                max_degrees: max,
                ..RotationSearch::default()
            };
            assert!(matches!(
                search.angles(),
                Err(ScanError::InvalidAngleRange { .. })
            ));
        }

        let search = RotationSearch {
            min_degrees: -1e308,
            max_degrees: 1e308,
            step_degrees: 0.1,
        };
        assert!(matches!(search.angles(), Err(ScanError::InvalidStep(_))));
    }

    #[test]
    fn test_edge_map_marks_step_edge() {
        let scan = GrayImage::from_fn(10, 6, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let edges = edge_map(&scan);
        // Columns on both sides of the step
        assert_eq!(edges.edge_count, 12);
        for y in 0..6 {
            assert_eq!(edges.pixels.get_pixel(4, y)[0], 1.0);
            assert_eq!(edges.pixels.get_pixel(5, y)[0], 1.0);
            assert_eq!(edges.pixels.get_pixel(0, y)[0], 0.0);
        }
    }

    #[test]
    fn test_gradient_spans_step_edge() {
        let scan = GrayImage::from_fn(6, 3, |x, _| Luma([if x < 3 { 40 } else { 240 }]));
        let gradient = morphological_gradient(&scan);
        let row: Vec<f32> = (0..6).map(|x| gradient.get_pixel(x, 1)[0]).collect();
        let step = 200.0 / 255.0;
        assert_eq!(row, vec![0.0, 0.0, step, step, 0.0, 0.0]);
    }

    #[test]
    fn test_uniform_scan_has_no_edges() {
        let scan = GrayImage::from_pixel(30, 30, Luma([128]));
        let estimate = estimate_rotation(&scan, &RotationSearch::default()).unwrap();
        assert_eq!(estimate.edge_count, 0);
        assert!(!estimate.is_reliable());
        // Stable argmax on an all-zero profile picks the first angle
        assert_relative_eq!(estimate.angle_degrees, -1.0);
    }

    #[test]
    fn test_projections_count_ink() {
        let mut scan = GrayImage::from_pixel(4, 3, Luma([255]));
        scan.put_pixel(1, 2, Luma([0]));
        let proj = projections(&scan);
        assert_eq!(proj.horizontal, vec![0.0, 0.0, 1.0]);
        assert_eq!(proj.vertical, vec![0.0, 1.0, 0.0, 0.0]);
    }
}
