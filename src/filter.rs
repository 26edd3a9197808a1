use crate::constants::{LAT_FIELD, LNG_FIELD};
use crate::types::RecordSet;

/// Inclusive latitude/longitude rectangle.
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

pub const NORTH_BOX: BoundingBox = BoundingBox {
    lat_min: -5.0,
    lat_max: 5.0,
    lon_min: -75.0,
    lon_max: -60.0,
};

pub const NORTHEAST_BOX: BoundingBox = BoundingBox {
    lat_min: -18.0,
    lat_max: -5.0,
    lon_min: -75.0,
    lon_max: -34.0,
};

/// Keeps rows whose coordinates fall inside the North or Northeast box.
/// Rows without numeric coordinates are dropped along with out-of-region
/// rows, so the filter is idempotent.
pub fn filter_by_region(records: &RecordSet) -> RecordSet {
    let lat_idx = records.field_index(LAT_FIELD);
    let lng_idx = records.field_index(LNG_FIELD);

    let mut out = RecordSet::new(records.fields().iter().cloned());
    let (Some(lat_idx), Some(lng_idx)) = (lat_idx, lng_idx) else {
        return out;
    };

    for row in records.rows() {
        let lat = row.get(lat_idx).and_then(|value| value.as_number());
        let lon = row.get(lng_idx).and_then(|value| value.as_number());
        let (Some(lat), Some(lon)) = (lat, lon) else {
            continue;
        };
        if NORTH_BOX.contains(lat, lon) || NORTHEAST_BOX.contains(lat, lon) {
            out.push_row(row.clone());
        }
    }

    out
}
