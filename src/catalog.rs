use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{Result, ScanError};
use crate::grid::GridGeometry;

pub use crate::species::FORM_CATALOG;

/// Phenological stage recorded in its own table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Flowering,
    Fruit,
    Timespan,
    Greenup,
    GreenupTimespan,
    StartRipening,
    FloweringTimespan,
    StartSenescence,
    StartLeaffall,
    EndLeaffall,
}

impl Phase {
    pub const ALL: [Phase; 10] = [
        Phase::Flowering,
        Phase::Fruit,
        Phase::Timespan,
        Phase::Greenup,
        Phase::GreenupTimespan,
        Phase::StartRipening,
        Phase::FloweringTimespan,
        Phase::StartSenescence,
        Phase::StartLeaffall,
        Phase::EndLeaffall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Flowering => "flowering",
            Phase::Fruit => "fruit",
            Phase::Timespan => "timespan",
            Phase::Greenup => "greenup",
            Phase::GreenupTimespan => "greenup_timespan",
            Phase::StartRipening => "start_ripening",
            Phase::FloweringTimespan => "flowering_timespan",
            Phase::StartSenescence => "start_senescence",
            Phase::StartLeaffall => "start_leaffall",
            Phase::EndLeaffall => "end_leaffall",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ScanError::UnknownPhase(s.to_string()))
    }
}

/// One row of the static species/field catalog.
///
/// For entries with phases only `row_start_idx` matters: each phase gets
/// its own row below it (see [`expand_entry`]).
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub norwegian_name: &'static str,
    pub english_name: &'static str,
    pub latin_name: &'static str,
    pub row_start_idx: usize,
    pub row_end_idx: usize,
    pub col_start_idx: usize,
    pub col_end_idx: usize,
    pub phases: Option<&'static [Phase]>,
}

/// Stable identifier of a cell: slugged English name plus optional phase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub name: String,
    pub phase: Option<Phase>,
}

impl CellKey {
    pub fn new(name: &str, phase: Option<Phase>) -> Self {
        Self {
            name: slug(name),
            phase,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{}_{}", self.name, phase),
            None => f.write_str(&self.name),
        }
    }
}

/// Lowercase a name and join its words with underscores
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Logical address of one table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDescriptor {
    pub key: CellKey,
    pub norwegian_name: &'static str,
    pub english_name: &'static str,
    pub latin_name: &'static str,
    pub phase: Option<Phase>,
    pub row_start_idx: usize,
    pub row_end_idx: usize,
    pub col_start_idx: usize,
    pub col_end_idx: usize,
}

impl CellDescriptor {
    /// Descriptor for an ad-hoc cell that is not part of any catalog
    pub fn at(
        english_name: &'static str,
        row_start_idx: usize,
        row_end_idx: usize,
        col_start_idx: usize,
        col_end_idx: usize,
    ) -> Self {
        Self {
            key: CellKey::new(english_name, None),
            norwegian_name: "",
            english_name,
            latin_name: "",
            phase: None,
            row_start_idx,
            row_end_idx,
            col_start_idx,
            col_end_idx,
        }
    }
}

/// Turn a catalog entry into its cell descriptors.
///
/// Entries without phases yield a single descriptor over their declared
/// range. Entries with K phases yield K single-row descriptors at
/// `row_start_idx`, `row_start_idx + 1`, ... in phase-list order, all
/// sharing the entry's column range.
pub fn expand_entry(entry: &CatalogEntry) -> Vec<CellDescriptor> {
    let make = |phase: Option<Phase>, row_start: usize, row_end: usize| CellDescriptor {
        key: CellKey::new(entry.english_name, phase),
        norwegian_name: entry.norwegian_name,
        english_name: entry.english_name,
        latin_name: entry.latin_name,
        phase,
        row_start_idx: row_start,
        row_end_idx: row_end,
        col_start_idx: entry.col_start_idx,
        col_end_idx: entry.col_end_idx,
    };

    match entry.phases {
        None => vec![make(None, entry.row_start_idx, entry.row_end_idx)],
        Some(phases) => phases
            .iter()
            .enumerate()
            .map(|(i, &phase)| {
                let row = entry.row_start_idx + i;
                make(Some(phase), row, row + 1)
            })
            .collect(),
    }
}

/// Immutable mapping from [`CellKey`] to [`CellDescriptor`], built once at
/// startup and handed to whoever extracts cells.
#[derive(Debug, Clone)]
pub struct CellCatalog {
    cells: Vec<CellDescriptor>,
    index: HashMap<CellKey, usize>,
}

impl CellCatalog {
    pub fn build(entries: &[CatalogEntry]) -> Result<Self> {
        let mut cells = Vec::new();
        let mut index = HashMap::new();

        for descriptor in entries.iter().flat_map(expand_entry) {
            if index.contains_key(&descriptor.key) {
                return Err(ScanError::DuplicateCell(descriptor.key.to_string()));
            }
            index.insert(descriptor.key.clone(), cells.len());
            cells.push(descriptor);
        }

        debug!(
            "Built cell catalog: {} entries -> {} cells",
            entries.len(),
            cells.len()
        );
        Ok(Self { cells, index })
    }

    /// Catalog of the phenology observation form
    pub fn form() -> Result<Self> {
        Self::build(FORM_CATALOG)
    }

    /// Look up a cell by English name (case and spacing insensitive)
    pub fn get(&self, name: &str, phase: Option<Phase>) -> Result<&CellDescriptor> {
        self.index
            .get(&CellKey::new(name, phase))
            .map(|&i| &self.cells[i])
            .ok_or_else(|| ScanError::UnknownCell {
                name: name.to_string(),
                phase,
            })
    }

    /// Look up a cell by its slug, e.g. `wild_strawberry_flowering`
    pub fn find_slug(&self, slug_text: &str) -> Result<&CellDescriptor> {
        let wanted = slug(slug_text);
        self.cells
            .iter()
            .find(|cell| cell.key.to_string() == wanted)
            .ok_or_else(|| ScanError::UnknownCell {
                name: slug_text.to_string(),
                phase: None,
            })
    }

    /// Check that every cell resolves against `geometry`
    pub fn validate(&self, geometry: &GridGeometry) -> Result<()> {
        for cell in &self.cells {
            geometry.cell_box(cell)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellDescriptor> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
