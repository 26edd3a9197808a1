use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use reqwest::Client;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::{LAT_FIELD, LNG_FIELD, RAW_LAT_FIELD, RAW_LNG_FIELD};
use crate::fetch::{fetch_registry_records, fetch_with_retry, RetryPolicy};
use crate::filter::filter_by_region;
use crate::normalize::normalize_coordinates;
use crate::storage::SnapshotStore;
use crate::types::{
    DatasetKind, LoadOrigin, LoadOutcome, LoadedDatasets, QueryDescriptor, RecordSet, Value,
};

/// Loads all three datasets in order. Each load fails soft: the worst case
/// for any dataset is an empty record set plus warnings, never an error.
pub async fn load_all(cfg: &Config, http: &Client) -> LoadedDatasets {
    let registry_store = SnapshotStore::new(&cfg.cache_dir);
    let franchise_store = SnapshotStore::new(&cfg.data_dir);

    let registry = load_registry(http, &cfg.registry_query(), &registry_store).await;
    let franchise = load_franchise(&cfg.franchise_input, &franchise_store).await;
    let plants = load_plants(&cfg.plant_input).await;

    info!(
        "Datasets loaded: registry={} franchise={} plants={}",
        registry.records.len(),
        franchise.records.len(),
        plants.records.len()
    );

    LoadedDatasets {
        registry,
        franchise,
        plants,
    }
}

/// Registry dataset: snapshot if readable, otherwise fetch-with-retry from
/// the datastore API, normalize coordinates, and persist the result.
pub async fn load_registry(
    http: &Client,
    query: &QueryDescriptor,
    store: &SnapshotStore,
) -> LoadOutcome {
    if let Some(records) = store.load(DatasetKind::Registry).await {
        return LoadOutcome {
            records,
            origin: LoadOrigin::Cache,
            warnings: Vec::new(),
        };
    }

    let fetched = fetch_with_retry(RetryPolicy::standard(), || {
        fetch_registry_records(http, query)
    })
    .await;

    match fetched {
        Ok(raw) if !raw.is_empty() => {
            let records = normalize_coordinates(&raw, RAW_LAT_FIELD, RAW_LNG_FIELD);
            let mut warnings = Vec::new();
            if let Err(error) = store.save(DatasetKind::Registry, &records).await {
                warn!("Failed to persist registry snapshot: {error:#}");
                warnings.push(format!("Registry snapshot not persisted: {error:#}"));
            }
            LoadOutcome {
                records,
                origin: LoadOrigin::Fetched,
                warnings,
            }
        }
        Ok(_) => {
            warn!("Registry API returned no rows");
            LoadOutcome::empty("Registry API returned no rows.")
        }
        Err(error) => {
            warn!("Registry API unavailable: {error:#}");
            LoadOutcome::empty(format!("Registry API unavailable: {error:#}"))
        }
    }
}

/// Franchise dataset: snapshot if readable, otherwise the local CSV with
/// incomplete-coordinate rows dropped, persisted for the next load.
pub async fn load_franchise(input: &Path, store: &SnapshotStore) -> LoadOutcome {
    if let Some(records) = store.load(DatasetKind::Franchise).await {
        return LoadOutcome {
            records,
            origin: LoadOrigin::Cache,
            warnings: Vec::new(),
        };
    }

    match read_csv_records(input).await {
        Ok(raw) => {
            let records = normalize_coordinates(&raw, LAT_FIELD, LNG_FIELD);
            let mut warnings = Vec::new();
            if let Err(error) = store.save(DatasetKind::Franchise, &records).await {
                warn!("Failed to persist franchise snapshot: {error:#}");
                warnings.push(format!("Franchise snapshot not persisted: {error:#}"));
            }
            LoadOutcome {
                records,
                origin: LoadOrigin::SourceFile,
                warnings,
            }
        }
        Err(error) => {
            warn!("Failed to load franchise CSV: {error:#}");
            LoadOutcome::empty(format!("Franchise source unavailable: {error:#}"))
        }
    }
}

/// Plant dataset: always read from the local CSV, then regionally filtered.
/// Not persisted to disk; the session window bounds how often this re-reads.
pub async fn load_plants(input: &Path) -> LoadOutcome {
    match read_csv_records(input).await {
        Ok(raw) => {
            let normalized = normalize_coordinates(&raw, LAT_FIELD, LNG_FIELD);
            let records = filter_by_region(&normalized);
            LoadOutcome {
                records,
                origin: LoadOrigin::SourceFile,
                warnings: Vec::new(),
            }
        }
        Err(error) => {
            warn!("Failed to load plant CSV: {error:#}");
            LoadOutcome::empty(format!("Plant source unavailable: {error:#}"))
        }
    }
}

/// Reads a headered delimited file into a record set of text cells; empty
/// cells become null.
async fn read_csv_records(path: &Path) -> Result<RecordSet> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read headers from {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = RecordSet::new(headers);
    for row in reader.records() {
        let row = row.with_context(|| format!("Malformed row in {}", path.display()))?;
        let cells: Vec<Value> = row
            .iter()
            .map(|cell| {
                let cell = cell.trim();
                if cell.is_empty() {
                    Value::Null
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect();
        records.push_row(cells);
    }

    Ok(records)
}
