use nalgebra::{Matrix3, Point2, Vector2};

/// Homogeneous matrix rotating image coordinates about `center`.
///
/// Image coordinates have x to the right and y down, so the angle is
/// negated before it reaches nalgebra: positive degrees turn the picture
/// counter-clockwise as displayed.
pub fn rotation_about(center: (f64, f64), degrees: f64) -> Matrix3<f64> {
    let pivot = Vector2::new(center.0, center.1);
    Matrix3::new_translation(&pivot)
        * Matrix3::new_rotation(-degrees.to_radians())
        * Matrix3::new_translation(&-pivot)
}

pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = matrix.transform_point(&Point2::new(x, y));
    (p.x, p.y)
}

/// Pixel canvas holding a whole transformed image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Transformed coordinates of the canvas origin
    pub origin: (f64, f64),
}

/// Canvas that fits a `width` x `height` image after `matrix`
pub fn expanded_canvas(matrix: &Matrix3<f64>, width: u32, height: u32) -> Canvas {
    let (w, h) = (width as f64, height as f64);
    let mut lo = (f64::INFINITY, f64::INFINITY);
    let mut hi = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
        let (tx, ty) = transform_point(matrix, x, y);
        lo = (lo.0.min(tx), lo.1.min(ty));
        hi = (hi.0.max(tx), hi.1.max(ty));
    }

    // Trig round-off must not add a spurious row or column
    let extent = |span: f64| (span - 1e-9).ceil().max(1.0) as u32;
    Canvas {
        width: extent(hi.0 - lo.0),
        height: extent(hi.1 - lo.1),
        origin: lo,
    }
}
