pub mod catalog;
pub mod cli;
pub mod corner;
pub mod detection;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod grid;
mod species;
pub mod transform;

pub use catalog::{CatalogEntry, CellCatalog, CellDescriptor, CellKey, Phase, FORM_CATALOG};
pub use cli::Cli;
pub use corner::{border_mask, find_corner, register, Corner, Registration};
pub use detection::{estimate_rotation, RotationEstimate, RotationSearch};
pub use error::{Result, ScanError};
pub use extract::{extract_batch, extract_cell, sample_preview, ExtractOptions, ExtractedCell};
pub use grid::{CellBox, GridGeometry, TableHalf};
pub use transform::{rotate_scan, to_gray8, GrayF32};
