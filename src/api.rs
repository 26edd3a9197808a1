use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::layers::{build_map, LayerToggles, MapDocument};
use crate::loaders::load_all;
use crate::types::{AppState, LoadOrigin, LoadOutcome, LoadedDatasets};

#[derive(Debug, Serialize)]
pub(crate) struct DatasetMeta {
    id: &'static str,
    rows: usize,
    origin: Option<LoadOrigin>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MetaResponse {
    ready: bool,
    #[serde(rename = "updatedAt")]
    updated_at: Option<String>,
    #[serde(rename = "expiresAt")]
    expires_at: Option<String>,
    datasets: Vec<DatasetMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapQuery {
    #[serde(default)]
    registry: Option<bool>,
    #[serde(default)]
    franchise: Option<bool>,
    #[serde(default)]
    plants: Option<bool>,
}

impl MapQuery {
    fn toggles(&self) -> LayerToggles {
        let defaults = LayerToggles::default();
        LayerToggles {
            registry: self.registry.unwrap_or(defaults.registry),
            franchise: self.franchise.unwrap_or(defaults.franchise),
            plants: self.plants.unwrap_or(defaults.plants),
        }
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Sidebar statistics: per-dataset row counts, load origins, and the
/// warnings each loader surfaced. Read-only; never triggers a reload.
pub async fn meta(State(state): State<AppState>) -> Json<MetaResponse> {
    let session = state.session.read().await;
    let datasets = session.current();

    let dataset_meta = match datasets.as_deref() {
        Some(loaded) => vec![
            dataset_meta("registry", Some(&loaded.registry)),
            dataset_meta("franchise", Some(&loaded.franchise)),
            dataset_meta("plants", Some(&loaded.plants)),
        ],
        None => vec![
            dataset_meta("registry", None),
            dataset_meta("franchise", None),
            dataset_meta("plants", None),
        ],
    };

    Json(MetaResponse {
        ready: datasets.is_some(),
        updated_at: session.loaded_at().map(|ts| ts.to_rfc3339()),
        expires_at: session.expires_at().map(|ts| ts.to_rfc3339()),
        datasets: dataset_meta,
    })
}

fn dataset_meta(id: &'static str, outcome: Option<&LoadOutcome>) -> DatasetMeta {
    match outcome {
        Some(outcome) => DatasetMeta {
            id,
            rows: outcome.records.len(),
            origin: Some(outcome.origin),
            warnings: outcome.warnings.clone(),
        },
        None => DatasetMeta {
            id,
            rows: 0,
            origin: None,
            warnings: Vec::new(),
        },
    }
}

/// Builds the map document for the requested toggles, reloading the
/// session's datasets first when the 24 h window has lapsed.
pub async fn map(State(state): State<AppState>, Query(query): Query<MapQuery>) -> Json<MapDocument> {
    let datasets = current_datasets(&state).await;
    Json(build_map(&query.toggles(), &datasets))
}

async fn current_datasets(state: &AppState) -> Arc<LoadedDatasets> {
    {
        let session = state.session.read().await;
        if let Some(datasets) = session.fresh() {
            return datasets;
        }
    }

    let mut session = state.session.write().await;
    // Another request may have refreshed while we waited for the lock.
    if let Some(datasets) = session.fresh() {
        return datasets;
    }

    info!("Session expired, reloading datasets");
    let loaded = load_all(&state.cfg, &state.http).await;
    session.store(loaded)
}
