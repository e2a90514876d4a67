use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::catalog::CellKey;
use crate::detection::RotationSearch;
use crate::extract::ExtractOptions;
use crate::grid::TableHalf;

#[derive(Parser, Debug)]
#[command(name = "phenoscan")]
#[command(version, about = "Deskew scanned phenology forms and cut them into cell images")]
pub struct Cli {
    /// Show per-angle and per-cell details
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate the skew of a scan and save a corrected copy
    Deskew(DeskewArgs),
    /// Cut catalog cells out of one or more scans
    Extract(ExtractArgs),
    /// List catalog cells with their grid ranges
    Cells,
}

/// Rotation search window
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Smallest angle tried, in degrees
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub min_angle: f64,

    /// Upper bound of the angles tried (not included)
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub max_angle: f64,

    /// Angle step in degrees
    #[arg(long, default_value_t = 0.1)]
    pub angle_step: f64,
}

impl SearchArgs {
    pub fn search(&self) -> RotationSearch {
        RotationSearch {
            min_degrees: self.min_angle,
            max_degrees: self.max_angle,
            step_degrees: self.angle_step,
        }
    }
}

#[derive(Args, Debug)]
pub struct DeskewArgs {
    /// Scanned page
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output path [default: input_deskewed.png]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub search: SearchArgs,
}

impl DeskewArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self.input.file_stem().unwrap_or_default().to_string_lossy();
            let parent = self.input.parent().unwrap_or(Path::new("."));
            parent.join(format!("{}_deskewed.png", stem))
        })
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Scanned pages
    #[arg(required = true)]
    pub scans: Vec<PathBuf>,

    /// Directory receiving the cell images
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Cell slug, e.g. "blueberry_flowering" (repeatable) [default: all cells]
    #[arg(short, long = "cell")]
    pub cells: Vec<String>,

    /// Table on the page: "upper" or "lower"
    #[arg(long, default_value = "upper", value_parser = parse_table)]
    pub table: TableHalf,

    /// Estimate and correct the skew of each scan first
    #[arg(long)]
    pub deskew: bool,

    /// Locate the form's upper-left corner and crop the margin before it
    #[arg(long)]
    pub register: bool,

    /// Largest corner offset, in pixels, accepted without a warning
    #[arg(long, default_value_t = 25)]
    pub tolerance: u32,

    /// Padding added below and right of each cell
    #[arg(long, default_value_t = 5)]
    pub offset: u32,

    /// Thicken pen strokes
    #[arg(long)]
    pub dilate: bool,

    /// Disk radius used by --dilate
    #[arg(long, default_value_t = 1.5)]
    pub selem_radius: f32,

    /// Turn cells three quarter turns
    #[arg(long)]
    pub rotate: bool,

    /// Only extract from this many randomly chosen scans
    #[arg(long)]
    pub preview: Option<usize>,

    /// Seed for --preview
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub search: SearchArgs,
}

impl ExtractArgs {
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            offset: self.offset,
            use_dilation: self.dilate,
            selem_radius: self.selem_radius,
            rotate: self.rotate,
        }
    }

    pub fn cell_path(&self, scan: &Path, key: &CellKey) -> PathBuf {
        let stem = scan.file_stem().unwrap_or_default().to_string_lossy();
        self.out_dir.join(format!("{}_{}.png", stem, key))
    }
}

fn parse_table(s: &str) -> Result<TableHalf, String> {
    match s.trim().to_lowercase().as_str() {
        "upper" => Ok(TableHalf::Upper),
        "lower" => Ok(TableHalf::Lower),
        _ => Err(format!("Invalid table '{}', expected upper or lower", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Phase;

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["phenoscan", "extract", "page.png", "-o", "cells"]);
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.table, TableHalf::Upper);
        assert_eq!(args.options(), ExtractOptions::default());
        assert_eq!(args.search.search(), RotationSearch::default());
        assert_eq!(
            args.cell_path(
                Path::new("scans/1951_017.tif"),
                &CellKey::new("Blueberry", Some(Phase::Flowering))
            ),
            PathBuf::from("cells/1951_017_blueberry_flowering.png")
        );
    }

    #[test]
    fn test_negative_angles_and_table() {
        let cli = Cli::parse_from([
            "phenoscan",
            "--verbose",
            "extract",
            "a.png",
            "b.png",
            "-o",
            "out",
            "--table",
            "lower",
            "--min-angle",
            "-2.5",
            "--cell",
            "hazel_greenup",
            "--cell",
            "location",
        ]);
        assert!(cli.verbose);
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.scans.len(), 2);
        assert_eq!(args.table, TableHalf::Lower);
        assert_eq!(args.search.min_angle, -2.5);
        assert_eq!(args.cells, vec!["hazel_greenup", "location"]);
    }

    #[test]
    fn test_deskew_output_path() {
        let cli = Cli::parse_from(["phenoscan", "deskew", "scans/page.png"]);
        let Command::Deskew(args) = cli.command else {
            panic!("expected deskew");
        };
        assert_eq!(args.output_path(), PathBuf::from("scans/page_deskewed.png"));
    }

    #[test]
    fn test_bad_table_rejected() {
        assert!(parse_table("middle").is_err());
    }
}
