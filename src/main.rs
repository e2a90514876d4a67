use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::{GrayImage, ImageReader};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use phenoscan::cli::{Command, DeskewArgs, ExtractArgs};
use phenoscan::{
    border_mask, estimate_rotation, extract_batch, register, rotate_scan, sample_preview,
    to_gray8, CellCatalog, CellDescriptor, Cli, ExtractedCell, GridGeometry,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Command::Deskew(args) => deskew(args),
        Command::Extract(args) => extract(args),
        Command::Cells => list_cells(),
    }
}

fn load_scan(path: &Path) -> Result<GrayImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open scan: {:?}", path))?
        .decode()
        .with_context(|| format!("Failed to decode scan: {:?}", path))?;
    debug!("Loaded {:?} ({}x{})", path, img.width(), img.height());
    Ok(img.to_luma8())
}

fn deskew(args: &DeskewArgs) -> Result<()> {
    let scan = load_scan(&args.input)?;
    let estimate = estimate_rotation(&scan, &args.search.search())
        .context("Failed to estimate rotation")?;

    if !estimate.is_reliable() {
        bail!("No edges found in {:?}, cannot estimate its rotation", args.input);
    }

    let corrected = rotate_scan(&scan, estimate.angle_degrees);
    let output_path = args.output_path();
    corrected
        .save(&output_path)
        .with_context(|| format!("Failed to save output: {:?}", output_path))?;

    eprintln!(
        "Rotated {:?} by {:+.2}° -> {:?}",
        args.input, estimate.angle_degrees, output_path
    );
    eprintln!(
        "Dimensions: {}x{} -> {}x{}",
        scan.width(),
        scan.height(),
        corrected.width(),
        corrected.height()
    );
    Ok(())
}

/// Load a scan and bring it into form coordinates
fn prepare_scan(path: &Path, args: &ExtractArgs) -> Result<GrayImage> {
    let mut scan = load_scan(path)?;

    if args.deskew {
        let estimate = estimate_rotation(&scan, &args.search.search())
            .context("Failed to estimate rotation")?;
        if estimate.is_reliable() {
            scan = rotate_scan(&scan, estimate.angle_degrees);
        } else {
            warn!("{:?}: no edges found, skipping deskew", path);
        }
    }

    if args.register {
        let registration = register(&border_mask(&scan), &GridGeometry::form_frame())
            .with_context(|| format!("Failed to locate form corners in {:?}", path))?;
        if !registration.is_consistent(args.tolerance) {
            warn!(
                "{:?}: corners off by {:?} and {:?}, beyond {} px",
                path,
                registration.upper_left_offset,
                registration.lower_right_offset,
                args.tolerance
            );
        }
        scan = registration.align(&scan);
    }

    Ok(scan)
}

fn select_cells<'a>(
    catalog: &'a CellCatalog,
    slugs: &[String],
) -> Result<Vec<&'a CellDescriptor>> {
    if slugs.is_empty() {
        return Ok(catalog.iter().collect());
    }
    slugs
        .iter()
        .map(|slug| catalog.find_slug(slug).map_err(Into::into))
        .collect()
}

#[derive(Default)]
struct Tally {
    written: usize,
    blank: usize,
    failed: usize,
}

impl Tally {
    /// Write one extracted cell; failures are logged and counted
    fn save(&mut self, path: PathBuf, cell: phenoscan::Result<ExtractedCell>) {
        let cell = match cell {
            Ok(cell) => cell,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                self.failed += 1;
                return;
            }
        };

        match to_gray8(cell.pixels()).save(&path) {
            Ok(()) => {
                debug!("Wrote {:?}", path);
                self.written += 1;
                if cell.is_blank() {
                    self.blank += 1;
                }
            }
            Err(e) => {
                warn!("Failed to save cell {:?}: {}", path, e);
                self.failed += 1;
            }
        }
    }
}

fn extract(args: &ExtractArgs) -> Result<()> {
    let catalog = CellCatalog::form().context("Failed to build cell catalog")?;
    let geometry = args.table.geometry();
    let cells = select_cells(&catalog, &args.cells)?;
    for cell in &cells {
        geometry.cell_box(cell).with_context(|| {
            format!("Cell {} does not fit the {:?} table", cell.key, args.table)
        })?;
    }

    if args.deskew {
        args.search
            .search()
            .angles()
            .context("Invalid rotation search")?;
    }

    let mut paths = Vec::new();
    let mut scans = Vec::new();
    for path in &args.scans {
        match prepare_scan(path, args) {
            Ok(scan) => {
                paths.push(path.clone());
                scans.push(scan);
            }
            Err(e) => warn!("Skipping {:?}: {:#}", path, e),
        }
    }
    if scans.is_empty() {
        bail!("No usable scans");
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", args.out_dir))?;

    let options = args.options();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut tally = Tally::default();

    for cell in cells {
        match args.preview {
            Some(size) => {
                let size = size.min(scans.len());
                for (i, extracted) in
                    sample_preview(&scans, &geometry, cell, &options, size, &mut rng)?
                {
                    tally.save(args.cell_path(&paths[i], &cell.key), extracted);
                }
            }
            None => {
                let extracted = extract_batch(&scans, &geometry, cell, &options);
                for (path, extracted) in paths.iter().zip(extracted) {
                    tally.save(args.cell_path(path, &cell.key), extracted);
                }
            }
        }
    }

    info!(
        "{} cell images written to {:?} ({} blank), {} failed",
        tally.written, args.out_dir, tally.blank, tally.failed
    );
    Ok(())
}

fn list_cells() -> Result<()> {
    let catalog = CellCatalog::form().context("Failed to build cell catalog")?;
    for cell in catalog.iter() {
        println!(
            "{:<40} rows {:>2}..{:<2} cols {:>2}..{:<2} {}",
            cell.key.to_string(),
            cell.row_start_idx,
            cell.row_end_idx,
            cell.col_start_idx,
            cell.col_end_idx,
            cell.norwegian_name
        );
    }
    eprintln!("{} cells", catalog.len());
    Ok(())
}
