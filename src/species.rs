//! Cell layout of the phenology observation form.
//!
//! Row and column values are indices into [`GridGeometry`](crate::grid::GridGeometry)
//! boundaries. Both stacked tables on a page share these indices.

use crate::catalog::{CatalogEntry, Phase};

const SPRING_FLOWER: &[Phase] = &[Phase::Flowering, Phase::Fruit, Phase::Timespan];

const TREE: &[Phase] = &[
    Phase::Greenup,
    Phase::GreenupTimespan,
    Phase::Flowering,
    Phase::StartRipening,
    Phase::FloweringTimespan,
    Phase::StartSenescence,
    Phase::StartLeaffall,
    Phase::EndLeaffall,
];

// Some species are split over two column blocks: early phases on the left,
// late phases on the right.
const TREE_EARLY: &[Phase] = &[
    Phase::Greenup,
    Phase::GreenupTimespan,
    Phase::Flowering,
    Phase::StartRipening,
];

const TREE_LATE: &[Phase] = &[
    Phase::FloweringTimespan,
    Phase::StartSenescence,
    Phase::StartLeaffall,
    Phase::EndLeaffall,
];

const fn field(
    norwegian_name: &'static str,
    english_name: &'static str,
    rows: (usize, usize),
    cols: (usize, usize),
) -> CatalogEntry {
    CatalogEntry {
        norwegian_name,
        english_name,
        latin_name: "",
        row_start_idx: rows.0,
        row_end_idx: rows.1,
        col_start_idx: cols.0,
        col_end_idx: cols.1,
        phases: None,
    }
}

const fn species(
    names: (&'static str, &'static str, &'static str),
    row_start_idx: usize,
    col_start_idx: usize,
    phases: &'static [Phase],
) -> CatalogEntry {
    CatalogEntry {
        norwegian_name: names.0,
        english_name: names.1,
        latin_name: names.2,
        row_start_idx,
        row_end_idx: row_start_idx + 1,
        col_start_idx,
        col_end_idx: col_start_idx + 1,
        phases: Some(phases),
    }
}

pub const FORM_CATALOG: &[CatalogEntry] = &[
    // Header and position fields
    field("Nummer", "Number", (0, 1), (0, 2)),
    field("Lokasjon", "Location", (0, 1), (2, 15)),
    field("Fylke", "County", (0, 1), (15, 20)),
    field("Posisjon", "Position", (5, 19), (0, 1)),
    field("HOH", "HASL", (5, 19), (0, 1)),
    field("DH", "DS", (5, 19), (0, 1)),
    // Spring flowers and berries
    species(("Hestehov", "Coltsfoot", "Tussilago farfara"), 2, 2, SPRING_FLOWER),
    species(("Blåveis", "Liverleaf", "Hepatica nobilis"), 2, 3, SPRING_FLOWER),
    species(("Hvitveis", "Wood anemone", "Anemone nemorosa"), 2, 4, SPRING_FLOWER),
    species(("Rødsildre", "Purple saxifrage", "Saxifraga oppositifolia"), 2, 5, SPRING_FLOWER),
    species(("Nyresildre", "Meadow saxifrage", "Saxifraga nemorosa"), 2, 6, SPRING_FLOWER),
    species(("Maria nøklebånd", "Cowslip", "Primula veris"), 2, 7, SPRING_FLOWER),
    species(("Soleihov", "Marsh marigold", "Caltha palustris"), 2, 8, SPRING_FLOWER),
    species(("Ballblom", "Globeflower", "Trollius europaeus"), 2, 9, SPRING_FLOWER),
    species(("Liljekonvall", "Lily of the valley", "Convallaria majalis"), 2, 10, SPRING_FLOWER),
    species(("Markjordbær", "Wild strawberry", "Fragaria vesca"), 2, 11, SPRING_FLOWER),
    species(("Gjøksyre", "Wood sorrel", "Oxalis acetosella"), 2, 12, SPRING_FLOWER),
    species(("Skogstjerne", "Arctic starflower", "Trientalis europaea"), 2, 13, SPRING_FLOWER),
    species(("Linnea", "Linnaea", "Linnaea borealis"), 2, 14, SPRING_FLOWER),
    species(("Blåbær", "Blueberry", "Vaccinium myrtillus"), 2, 15, SPRING_FLOWER),
    species(("Multer", "Cloudberry", "Rubus chamaemorus"), 2, 16, SPRING_FLOWER),
    species(("Geitrams", "Fireweed", "Epilobium angustifolium"), 2, 17, SPRING_FLOWER),
    species(("Mjødurt", "Meadowsweet", "Spirea ulmaria"), 2, 18, SPRING_FLOWER),
    species(("Røsslyng", "Heather", "Calluna vulgaris"), 2, 19, SPRING_FLOWER),
    // Trees and shrubs
    species(("Hassel", "Hazel", "Corylus avellana"), 10, 3, TREE),
    species(("Gråor", "Grey Alder", "Alnus incana"), 10, 4, TREE),
    species(("Selje", "Goat Willow", "Salix caprea"), 10, 5, TREE),
    species(("Osp", "Aspen", "Populus tremula"), 10, 6, TREE),
    species(("Lavlandsbjerk", "Silver Birch", "Betula verrucosa"), 10, 7, TREE),
    species(("Fjellbjerk", "Downy Birch", "Betula odorata"), 10, 8, TREE),
    species(("Alm", "Wych Elm", "Ulmus montana"), 10, 9, TREE),
    species(("Sommerek", "Pedunculate Oak", "Quercus pedunculata"), 10, 10, TREE),
    species(("Bøk", "European Beech", "Fagus silvatica"), 10, 11, TREE),
    species(("Hegg", "Bird Cherry", "Prunus padus"), 10, 12, TREE),
    species(("Slåpetorn", "Blackthorn", "Prunus spinosa"), 10, 13, TREE),
    species(("Kirsebær", "Cherry", "Pyrus malus"), 10, 14, TREE),
    species(("Eple", "Apple", "Pyrus malus"), 10, 15, TREE),
    species(("Rips", "Redcurrant", "Ribes rubrum"), 10, 16, TREE),
    species(("Stikkelsbær", "Gooseberry", "Ribes grossularia"), 10, 17, TREE),
    species(("Bringebær", "Raspberry", "Rubus idaeus"), 10, 18, TREE),
    species(("Rogn", "Rowan", "Sorbus aucuparia"), 10, 19, TREE),
    // Trees split over two column blocks
    species(("Lønn", "Norway Maple", "Acer platanoides"), 19, 2, TREE_EARLY),
    species(("Lind", "Small leaved Lime", "Tilia cordata"), 19, 3, TREE_EARLY),
    species(("Syren", "Common Lilac", "Syringa vulgaris"), 19, 4, TREE_EARLY),
    species(("Ask", "European Ash", "Fraxinus excelsior"), 19, 5, TREE_EARLY),
    species(("Nyperose", "Dog Rose", "Rosa sp."), 19, 6, TREE_EARLY),
    species(("Jasmin", "Mock Orange", "Philadelphus coronarius"), 19, 7, TREE_EARLY),
    species(("Gran", "Norway Spruce", "Picea excelsa"), 19, 8, TREE_EARLY),
    species(("Furu", "Pine", "Pinus sylvestris"), 19, 9, TREE_EARLY),
    species(("Lønn", "Norway Maple", "Acer platanoides"), 19, 12, TREE_LATE),
    species(("Lind", "Small leaved Lime", "Tilia cordata"), 19, 13, TREE_LATE),
    species(("Syren", "Common Lilac", "Syringa vulgaris"), 19, 14, TREE_LATE),
    species(("Ask", "European Ash", "Fraxinus excelsior"), 19, 15, TREE_LATE),
    species(("Nyperose", "Dog Rose", "Rosa sp."), 19, 16, TREE_LATE),
    species(("Jasmin", "Mock Orange", "Philadelphus coronarius"), 19, 17, TREE_LATE),
    species(("Gran", "Norway Spruce", "Picea excelsa"), 19, 18, TREE_LATE),
    species(("Furu", "Pine", "Pinus sylvestris"), 19, 19, TREE_LATE),
    // Ice, frost and farming dates
    field("Antall observasjonsår", "Number of observation years", (6, 7), (1, 2)),
    field("Løvsprett ved tregrensen", "Leafout at the treeline", (6, 7), (2, 3)),
    field(
        "Gjennomsnittelig høyde hvor løvsprett ved tregrensen måles",
        "Average height where leafout at the treeline is measured",
        (6, 7),
        (3, 4),
    ),
    field(
        "Type tre som definerer tregrensen",
        "Type of tree that defines the treeline",
        (6, 7),
        (4, 5),
    ),
    field("Isløsning", "Ice break", (6, 7), (5, 6)),
    field(
        "Elver eller innsjøer definerer isløsning",
        "Rivers or lakes define the ice break",
        (6, 7),
        (6, 7),
    ),
    field(
        "Tid mellom isløsning elver og vann",
        "Time between ice break rivers and lakes",
        (6, 7),
        (7, 8),
    ),
    field(
        "Ingen is prosent åpent vann hele året",
        "No ice percentage open water all year",
        (6, 7),
        (8, 9),
    ),
    field("Teleløsning", "No permafrost", (6, 7), (9, 10)),
    field(
        "Prosent telefritt hele året",
        "Percentage without permafrost all year",
        (6, 7),
        (10, 11),
    ),
    field("Første pløyedag", "First ploughing day", (6, 7), (11, 12)),
    field("Første spiring åker", "First greenup fields", (6, 7), (12, 13)),
    field("Feslepp", "Release of cattle", (6, 7), (13, 14)),
    field(
        "Sau eller ku definerer feslepp",
        "Sheep or cattle define release of cattle",
        (6, 7),
        (14, 15),
    ),
    field(
        "Tid mellom feslepp sau og ku",
        "Time between sheep and cattle release",
        (6, 7),
        (15, 16),
    ),
    field("Såtid bygg", "Sowtime barley", (6, 7), (16, 17)),
    field("Såtid havre", "Sowtime oats", (6, 7), (17, 18)),
    field("Såtid hvete", "Sowtime wheat", (6, 7), (18, 19)),
    field("Settetid poteter", "Potato planting", (6, 7), (18, 19)),
    // Bird arrivals and harvest
    field("Første observasjon stær", "First observation of starling", (8, 9), (1, 2)),
    field("Prosent stær overvintret", "Percentage of starling overwintering", (8, 9), (2, 3)),
    field("Første observasjon lerke", "First observation of lark", (8, 9), (3, 4)),
    field("Første observasjon måltrost", "First observation of song thrush", (8, 9), (4, 5)),
    field("Første observasjon linerle", "First observation of wagtail", (8, 9), (5, 6)),
    field("Første observasjon svale", "First observation of swallow", (8, 9), (6, 7)),
    field("Første observasjon gjøk", "First observation of cuckoo", (8, 9), (7, 8)),
    field("Åker moden for slått", "Field ripe for harvesting", (8, 9), (8, 9)),
    field("Vinterrug moden for slått", "Winter rye ripe for harvesting", (8, 9), (9, 10)),
    field("Prosent umodnet vinterrug", "Percentage of unripe winter rye", (8, 9), (10, 11)),
    field("Havre moden for slått", "Oats ripe for harvesting", (8, 9), (11, 12)),
    field("Havre modningstid", "Oats maturing time", (8, 9), (12, 13)),
    field("Prosent umodnet havre", "Percentage of unripe oats", (8, 9), (13, 14)),
    field("Bygg moden for slått", "Barley ripe for harvesting", (8, 9), (14, 15)),
    field("Bygg modningstid", "Barley maturing time", (8, 9), (15, 16)),
    field("Prosent umodnet bygg", "Percentage of unripe barley", (8, 9), (16, 17)),
    field("Hvete moden for slått", "Wheat ripe for harvesting", (8, 9), (17, 18)),
    field("Hvete modningstid", "Wheat maturing time", (8, 9), (18, 19)),
    field("Prosent umodnet hvete", "Percentage of unripe wheat", (8, 9), (19, 20)),
];
