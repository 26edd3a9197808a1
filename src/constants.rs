pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9292";
pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FRANCHISE_INPUT: &str = "input/franquias.csv";
pub const DEFAULT_PLANT_INPUT: &str = "input/dados_com_geolocalizacao.csv";

pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF_START_SECONDS: u64 = 2;
pub const RETRY_BACKOFF_CAP_SECONDS: u64 = 10;

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"SMSN";
pub const SNAPSHOT_VERSION: u16 = 1;
pub const SNAPSHOT_ZSTD_LEVEL: i32 = 6;

pub const DEFAULT_REGISTRY_URL: &str =
    "https://dadosabertos.aneel.gov.br/api/3/action/datastore_search_sql";

/// Fixed datastore query: generation facilities for the target state with
/// non-null coordinates, aliased to the raw coordinate field names.
pub const REGISTRY_SQL: &str = r#"
SELECT "NomMunicipio", "SigUF", "NomRegiao",
       "NumCoordNEmpreendimento" AS lat_str,
       "NumCoordEEmpreendimento" AS lng_str
FROM "b1bd71e7-d0ad-4214-9053-cbd58e9564a7"
WHERE
  "SigUF" = 'PA'
  AND "NumCoordNEmpreendimento" IS NOT NULL
LIMIT 80000
"#;

pub const REGISTRY_FIELDS: [&str; 5] =
    ["NomMunicipio", "SigUF", "NomRegiao", "lat_str", "lng_str"];

pub const RAW_LAT_FIELD: &str = "lat_str";
pub const RAW_LNG_FIELD: &str = "lng_str";
pub const LAT_FIELD: &str = "latitude";
pub const LNG_FIELD: &str = "longitude";
pub const FRANCHISE_LABEL_FIELD: &str = "Franquia";

pub const PAGE_TITLE: &str = "Solar Plant Map";
pub const MAP_CENTER: [f64; 2] = [-14.235, -51.9253];
pub const MAP_ZOOM: u8 = 4;
pub const MAP_TILES: &str = "CartoDB positron";
pub const MAP_WIDTH_PX: u32 = 800;
pub const MAP_HEIGHT_PX: u32 = 600;

pub const REGISTRY_HEATMAP_RADIUS: u32 = 8;
pub const PLANT_HEATMAP_RADIUS: u32 = 10;
pub const REGISTRY_GRADIENT: [(f64, &str); 3] =
    [(0.0, "blue"), (0.5, "lightblue"), (1.0, "cyan")];
pub const PLANT_GRADIENT: [(f64, &str); 3] = [(0.0, "yellow"), (0.5, "orange"), (1.0, "red")];

pub const FRANCHISE_ICON_COLOR: &str = "orange";
pub const MARKER_FALLBACK_LABEL: &str = "N/A";
