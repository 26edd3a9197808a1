use serde::Serialize;

use crate::constants::{
    FRANCHISE_ICON_COLOR, FRANCHISE_LABEL_FIELD, LAT_FIELD, LNG_FIELD, MAP_CENTER,
    MAP_HEIGHT_PX, MAP_TILES, MAP_WIDTH_PX, MAP_ZOOM, MARKER_FALLBACK_LABEL, PAGE_TITLE,
    PLANT_GRADIENT, PLANT_HEATMAP_RADIUS, REGISTRY_GRADIENT, REGISTRY_HEATMAP_RADIUS,
};
use crate::types::{LoadedDatasets, RecordSet};

/// Which layers the UI currently wants drawn. Toggling only changes what
/// ends up in the document; data is neither re-fetched nor re-filtered.
#[derive(Clone, Copy, Debug)]
pub struct LayerToggles {
    pub registry: bool,
    pub franchise: bool,
    pub plants: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            registry: true,
            franchise: true,
            plants: true,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GradientStop {
    pub stop: f64,
    pub color: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapLayer {
    Heatmap {
        name: String,
        radius: u32,
        gradient: Vec<GradientStop>,
        points: Vec<[f64; 2]>,
    },
    MarkerCluster {
        name: String,
        #[serde(rename = "iconColor")]
        icon_color: String,
        markers: Vec<Marker>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

/// Everything the front-end needs to draw the map: base map parameters,
/// the enabled non-empty layers, and the static legend.
#[derive(Clone, Debug, Serialize)]
pub struct MapDocument {
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: String,
    pub width: u32,
    pub height: u32,
    pub layers: Vec<MapLayer>,
    pub legend: Vec<LegendEntry>,
}

pub fn build_map(toggles: &LayerToggles, datasets: &LoadedDatasets) -> MapDocument {
    let mut layers = Vec::new();

    if toggles.registry {
        if let Some(layer) = heatmap_layer(
            "ANEEL",
            &datasets.registry.records,
            REGISTRY_HEATMAP_RADIUS,
            &REGISTRY_GRADIENT,
        ) {
            layers.push(layer);
        }
    }

    if toggles.franchise {
        if let Some(layer) = marker_cluster_layer("Franchises", &datasets.franchise.records) {
            layers.push(layer);
        }
    }

    if toggles.plants {
        if let Some(layer) = heatmap_layer(
            "Solar plants",
            &datasets.plants.records,
            PLANT_HEATMAP_RADIUS,
            &PLANT_GRADIENT,
        ) {
            layers.push(layer);
        }
    }

    MapDocument {
        title: PAGE_TITLE.to_string(),
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        tiles: MAP_TILES.to_string(),
        width: MAP_WIDTH_PX,
        height: MAP_HEIGHT_PX,
        layers,
        legend: legend(),
    }
}

fn heatmap_layer(
    name: &str,
    records: &RecordSet,
    radius: u32,
    gradient: &[(f64, &str); 3],
) -> Option<MapLayer> {
    let points = coordinate_pairs(records);
    if points.is_empty() {
        return None;
    }
    Some(MapLayer::Heatmap {
        name: name.to_string(),
        radius,
        gradient: gradient
            .iter()
            .map(|(stop, color)| GradientStop {
                stop: *stop,
                color: (*color).to_string(),
            })
            .collect(),
        points,
    })
}

fn marker_cluster_layer(name: &str, records: &RecordSet) -> Option<MapLayer> {
    if records.is_empty() {
        return None;
    }
    let mut markers = Vec::with_capacity(records.len());
    for idx in 0..records.len() {
        let (Some(lat), Some(lon)) = (
            records.number_at(idx, LAT_FIELD),
            records.number_at(idx, LNG_FIELD),
        ) else {
            continue;
        };
        let label = records
            .text_at(idx, FRANCHISE_LABEL_FIELD)
            .unwrap_or(MARKER_FALLBACK_LABEL)
            .to_string();
        markers.push(Marker { lat, lon, label });
    }
    if markers.is_empty() {
        return None;
    }
    Some(MapLayer::MarkerCluster {
        name: name.to_string(),
        icon_color: FRANCHISE_ICON_COLOR.to_string(),
        markers,
    })
}

fn coordinate_pairs(records: &RecordSet) -> Vec<[f64; 2]> {
    (0..records.len())
        .filter_map(|idx| {
            let lat = records.number_at(idx, LAT_FIELD)?;
            let lon = records.number_at(idx, LNG_FIELD)?;
            Some([lat, lon])
        })
        .collect()
}

fn legend() -> Vec<LegendEntry> {
    vec![
        LegendEntry {
            color: "blue".to_string(),
            label: "ANEEL: registered facilities".to_string(),
        },
        LegendEntry {
            color: "green".to_string(),
            label: "Solar plants: active projects".to_string(),
        },
        LegendEntry {
            color: "orange".to_string(),
            label: "Franchises: commercial partners".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LoadOrigin, LoadOutcome, Value};

    fn outcome(records: RecordSet) -> LoadOutcome {
        LoadOutcome {
            records,
            origin: LoadOrigin::SourceFile,
            warnings: Vec::new(),
        }
    }

    fn coord_records(points: &[(f64, f64)]) -> RecordSet {
        let mut records = RecordSet::new(["latitude", "longitude"]);
        for (lat, lon) in points {
            records.push_row(vec![Value::Number(*lat), Value::Number(*lon)]);
        }
        records
    }

    fn sample_datasets() -> LoadedDatasets {
        let mut franchise = RecordSet::new(["Franquia", "latitude", "longitude"]);
        franchise.push_row(vec![
            Value::Text("Belém".to_string()),
            Value::Number(-1.45),
            Value::Number(-48.49),
        ]);
        franchise.push_row(vec![Value::Null, Value::Number(-3.1), Value::Number(-60.0)]);

        LoadedDatasets {
            registry: outcome(coord_records(&[(-1.0, -62.0), (-2.0, -63.0)])),
            franchise: outcome(franchise),
            plants: outcome(coord_records(&[(-2.0, -65.0)])),
        }
    }

    #[test]
    fn builds_all_three_layers_when_toggled_on() {
        let doc = build_map(&LayerToggles::default(), &sample_datasets());
        assert_eq!(doc.layers.len(), 3);
        assert_eq!(doc.center, MAP_CENTER);
        assert_eq!(doc.legend.len(), 3);
    }

    #[test]
    fn toggled_off_layers_are_omitted() {
        let toggles = LayerToggles {
            registry: false,
            franchise: true,
            plants: false,
        };
        let doc = build_map(&toggles, &sample_datasets());
        assert_eq!(doc.layers.len(), 1);
        assert!(matches!(doc.layers[0], MapLayer::MarkerCluster { .. }));
    }

    #[test]
    fn empty_datasets_produce_no_layers() {
        let datasets = LoadedDatasets {
            registry: outcome(RecordSet::empty()),
            franchise: outcome(RecordSet::empty()),
            plants: outcome(RecordSet::empty()),
        };
        let doc = build_map(&LayerToggles::default(), &datasets);
        assert!(doc.layers.is_empty());
    }

    #[test]
    fn marker_labels_fall_back_to_placeholder() {
        let doc = build_map(&LayerToggles::default(), &sample_datasets());
        let Some(MapLayer::MarkerCluster { markers, .. }) = doc
            .layers
            .iter()
            .find(|layer| matches!(layer, MapLayer::MarkerCluster { .. }))
        else {
            panic!("expected a marker cluster layer");
        };
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].label, "Belém");
        assert_eq!(markers[1].label, "N/A");
    }

    #[test]
    fn heatmap_points_mirror_record_coordinates() {
        let doc = build_map(&LayerToggles::default(), &sample_datasets());
        let Some(MapLayer::Heatmap { points, radius, .. }) =
            doc.layers.iter().find(
                |layer| matches!(layer, MapLayer::Heatmap { name, .. } if name == "ANEEL"),
            )
        else {
            panic!("expected the registry heatmap layer");
        };
        assert_eq!(*radius, REGISTRY_HEATMAP_RADIUS);
        assert_eq!(points.as_slice(), &[[-1.0, -62.0], [-2.0, -63.0]]);
    }
}
