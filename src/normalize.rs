use crate::constants::{LAT_FIELD, LNG_FIELD};
use crate::types::{RecordSet, Value};

/// Parses a locale-formatted coordinate cell. Source data uses a decimal
/// comma; numeric cells pass through. Anything unparsable becomes `None`.
pub fn parse_coordinate(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(value) if value.is_finite() => Some(*value),
        Value::Text(text) => text
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite()),
        _ => None,
    }
}

/// Derives numeric `latitude`/`longitude` fields from the named source
/// fields and drops every row where either coordinate fails to parse.
///
/// Pure and order-preserving: rows come out in input order, and the worst
/// case is an empty set (e.g. when a source field is missing entirely).
pub fn normalize_coordinates(records: &RecordSet, lat_field: &str, lng_field: &str) -> RecordSet {
    let mut fields: Vec<String> = records.fields().to_vec();
    let lat_out = match fields.iter().position(|field| field == LAT_FIELD) {
        Some(idx) => idx,
        None => {
            fields.push(LAT_FIELD.to_string());
            fields.len() - 1
        }
    };
    let lng_out = match fields.iter().position(|field| field == LNG_FIELD) {
        Some(idx) => idx,
        None => {
            fields.push(LNG_FIELD.to_string());
            fields.len() - 1
        }
    };

    let lat_src = records.field_index(lat_field);
    let lng_src = records.field_index(lng_field);

    let mut out = RecordSet::new(fields.clone());
    let (Some(lat_src), Some(lng_src)) = (lat_src, lng_src) else {
        return out;
    };

    for row in records.rows() {
        let lat = row.get(lat_src).and_then(parse_coordinate);
        let lng = row.get(lng_src).and_then(parse_coordinate);
        let (Some(lat), Some(lng)) = (lat, lng) else {
            continue;
        };

        let mut cells: Vec<Value> = Vec::with_capacity(fields.len());
        cells.extend_from_slice(row);
        cells.resize(fields.len(), Value::Null);
        cells[lat_out] = Value::Number(lat);
        cells[lng_out] = Value::Number(lng);
        out.push_row(cells);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_set(rows: Vec<(Value, Value)>) -> RecordSet {
        let mut records = RecordSet::new(["name", "lat_str", "lng_str"]);
        for (idx, (lat, lng)) in rows.into_iter().enumerate() {
            records.push_row(vec![Value::Text(format!("row{idx}")), lat, lng]);
        }
        records
    }

    #[test]
    fn parses_decimal_comma_coordinates() {
        let records = raw_set(vec![(
            Value::Text("-3,1415".to_string()),
            Value::Text("-61,5".to_string()),
        )]);
        let out = normalize_coordinates(&records, "lat_str", "lng_str");
        assert_eq!(out.len(), 1);
        assert_eq!(out.number_at(0, "latitude"), Some(-3.1415));
        assert_eq!(out.number_at(0, "longitude"), Some(-61.5));
    }

    #[test]
    fn drops_rows_with_one_sided_coordinates() {
        let records = raw_set(vec![
            (Value::Text("-2,0".to_string()), Value::Null),
            (Value::Null, Value::Text("-65,0".to_string())),
            (Value::Text("garbage".to_string()), Value::Text("-65".to_string())),
        ]);
        let out = normalize_coordinates(&records, "lat_str", "lng_str");
        assert!(out.is_empty());
    }

    #[test]
    fn output_rows_always_carry_both_numeric_coordinates() {
        let records = raw_set(vec![
            (Value::Text("-2".to_string()), Value::Text("-65".to_string())),
            (Value::Text("bad".to_string()), Value::Text("-65".to_string())),
            (Value::Number(1.5), Value::Number(-70.25)),
        ]);
        let out = normalize_coordinates(&records, "lat_str", "lng_str");
        assert_eq!(out.len(), 2);
        for idx in 0..out.len() {
            assert!(out.number_at(idx, "latitude").is_some());
            assert!(out.number_at(idx, "longitude").is_some());
        }
    }

    #[test]
    fn preserves_input_order() {
        let records = raw_set(vec![
            (Value::Text("1".to_string()), Value::Text("-61".to_string())),
            (Value::Text("2".to_string()), Value::Text("-62".to_string())),
            (Value::Text("3".to_string()), Value::Text("-63".to_string())),
        ]);
        let out = normalize_coordinates(&records, "lat_str", "lng_str");
        let lats: Vec<f64> = (0..out.len())
            .filter_map(|idx| out.number_at(idx, "latitude"))
            .collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_source_field_drops_everything() {
        let records = raw_set(vec![(
            Value::Text("-2".to_string()),
            Value::Text("-65".to_string()),
        )]);
        let out = normalize_coordinates(&records, "no_such_field", "lng_str");
        assert!(out.is_empty());
    }

    #[test]
    fn coerces_existing_latitude_longitude_columns_in_place() {
        let mut records = RecordSet::new(["latitude", "longitude"]);
        records.push_row(vec![
            Value::Text("-2.5".to_string()),
            Value::Text("-64.0".to_string()),
        ]);
        records.push_row(vec![Value::Text("-3".to_string()), Value::Null]);

        let out = normalize_coordinates(&records, "latitude", "longitude");
        assert_eq!(out.fields(), records.fields());
        assert_eq!(out.len(), 1);
        assert_eq!(out.number_at(0, "latitude"), Some(-2.5));
        assert_eq!(out.number_at(0, "longitude"), Some(-64.0));
    }
}
