use crate::catalog::CellDescriptor;
use crate::error::{Result, ScanError};

/// Column boundaries shared by both tables of the phenology form.
const FORM_COLUMNS: [u32; 21] = [
    0, 95, 173, 257, 340, 420, 504, 581, 662, 747, 825, 905, 988, 1070, 1150, 1232, 1312, 1398,
    1475, 1549, 1630,
];

const UPPER_TABLE_ROWS: [u32; 24] = [
    0, 85, 130, 180, 228, 270, 320, 365, 413, 455, 503, 550, 595, 640, 690, 735, 784, 830, 871,
    924, 972, 1017, 1064, 1110,
];

const LOWER_TABLE_ROWS: [u32; 24] = [
    1187, 1281, 1329, 1377, 1423, 1467, 1516, 1560, 1609, 1655, 1701, 1750, 1797, 1843, 1889,
    1937, 1987, 2032, 2072, 2125, 2169, 2219, 2269, 2315,
];

/// Which of the two stacked tables on a form page to address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableHalf {
    #[default]
    Upper,
    Lower,
}

impl TableHalf {
    pub fn geometry(self) -> GridGeometry {
        match self {
            TableHalf::Upper => GridGeometry::upper_table(),
            TableHalf::Lower => GridGeometry::lower_table(),
        }
    }
}

/// Nominal pixel box of a cell, half-open on the bottom/right edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBox {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl CellBox {
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }
}

/// Pixel scaffold of a table layout, measured once on a reference scan.
///
/// Boundaries are strictly increasing and there are at least two of each,
/// so every pair of adjacent boundaries encloses at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridGeometry {
    row_boundaries: Vec<u32>,
    col_boundaries: Vec<u32>,
}

impl GridGeometry {
    pub fn new(row_boundaries: Vec<u32>, col_boundaries: Vec<u32>) -> Result<Self> {
        check_boundaries("row", &row_boundaries)?;
        check_boundaries("column", &col_boundaries)?;
        Ok(Self {
            row_boundaries,
            col_boundaries,
        })
    }

    /// Upper table of the phenology form
    pub fn upper_table() -> Self {
        Self {
            row_boundaries: UPPER_TABLE_ROWS.to_vec(),
            col_boundaries: FORM_COLUMNS.to_vec(),
        }
    }

    /// Lower table of the phenology form, in page coordinates
    pub fn lower_table() -> Self {
        Self {
            row_boundaries: LOWER_TABLE_ROWS.to_vec(),
            col_boundaries: FORM_COLUMNS.to_vec(),
        }
    }

    /// Outer frame of the whole form page, both tables included
    pub fn form_frame() -> Self {
        let last_row = LOWER_TABLE_ROWS[LOWER_TABLE_ROWS.len() - 1];
        let last_col = FORM_COLUMNS[FORM_COLUMNS.len() - 1];
        Self {
            row_boundaries: vec![UPPER_TABLE_ROWS[0], last_row],
            col_boundaries: vec![FORM_COLUMNS[0], last_col],
        }
    }

    pub fn row_boundaries(&self) -> &[u32] {
        &self.row_boundaries
    }

    pub fn col_boundaries(&self) -> &[u32] {
        &self.col_boundaries
    }

    /// Resolve a descriptor into its nominal pixel box.
    ///
    /// Fails on indices outside the boundary lists and on empty ranges;
    /// nothing is clamped.
    pub fn cell_box(&self, descriptor: &CellDescriptor) -> Result<CellBox> {
        let (top, bottom) = resolve_range(
            "row",
            &self.row_boundaries,
            descriptor.row_start_idx,
            descriptor.row_end_idx,
        )?;
        let (left, right) = resolve_range(
            "column",
            &self.col_boundaries,
            descriptor.col_start_idx,
            descriptor.col_end_idx,
        )?;
        Ok(CellBox {
            top,
            left,
            bottom,
            right,
        })
    }

    /// Upper-left and lower-right boundary intersections as (row, col)
    pub fn implied_corners(&self) -> ((u32, u32), (u32, u32)) {
        let first = (self.row_boundaries[0], self.col_boundaries[0]);
        let last = (
            self.row_boundaries[self.row_boundaries.len() - 1],
            self.col_boundaries[self.col_boundaries.len() - 1],
        );
        (first, last)
    }

    /// Shift the whole scaffold down by `dy` and right by `dx` pixels
    pub fn translated(&self, dy: u32, dx: u32) -> Self {
        Self {
            row_boundaries: self.row_boundaries.iter().map(|r| r + dy).collect(),
            col_boundaries: self.col_boundaries.iter().map(|c| c + dx).collect(),
        }
    }
}

fn check_boundaries(axis: &str, boundaries: &[u32]) -> Result<()> {
    if boundaries.len() < 2 {
        return Err(ScanError::InvalidGeometry(format!(
            "need at least 2 {} boundaries, got {}",
            axis,
            boundaries.len()
        )));
    }
    if let Some(pos) = boundaries.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ScanError::InvalidGeometry(format!(
            "{} boundaries must be strictly increasing ({} at index {} follows {})",
            axis,
            boundaries[pos + 1],
            pos + 1,
            boundaries[pos]
        )));
    }
    Ok(())
}

fn resolve_range(
    axis: &'static str,
    boundaries: &[u32],
    start: usize,
    end: usize,
) -> Result<(u32, u32)> {
    for index in [start, end] {
        if index >= boundaries.len() {
            return Err(ScanError::DescriptorOutOfBounds {
                axis,
                index,
                len: boundaries.len(),
            });
        }
    }
    if end <= start {
        return Err(ScanError::EmptyRange { axis, start, end });
    }
    Ok((boundaries[start], boundaries[end]))
}
