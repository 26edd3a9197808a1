use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::session::SessionCache;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub http: Client,
    pub session: Arc<RwLock<SessionCache>>,
}

/// A single cell of a tabular dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// An immutable-after-load tabular dataset: ordered field names and ordered
/// rows of values, one value per field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    fields: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.fields.len());
        self.rows.push(row);
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    pub fn value_at(&self, row: usize, field: &str) -> Option<&Value> {
        let idx = self.field_index(field)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn number_at(&self, row: usize, field: &str) -> Option<f64> {
        self.value_at(row, field)?.as_number()
    }

    pub fn text_at(&self, row: usize, field: &str) -> Option<&str> {
        self.value_at(row, field)?.as_text()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Registry,
    Franchise,
    Plants,
}

impl DatasetKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            DatasetKind::Registry => "registry",
            DatasetKind::Franchise => "franchise",
            DatasetKind::Plants => "plants",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Registry => "ANEEL registry",
            DatasetKind::Franchise => "franchises",
            DatasetKind::Plants => "solar plants",
        }
    }
}

/// Where a loaded dataset actually came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOrigin {
    Cache,
    Fetched,
    SourceFile,
    Empty,
}

#[derive(Clone, Debug)]
pub struct LoadOutcome {
    pub records: RecordSet,
    pub origin: LoadOrigin,
    pub warnings: Vec<String>,
}

impl LoadOutcome {
    pub fn empty(warning: impl Into<String>) -> Self {
        Self {
            records: RecordSet::empty(),
            origin: LoadOrigin::Empty,
            warnings: vec![warning.into()],
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadedDatasets {
    pub registry: LoadOutcome,
    pub franchise: LoadOutcome,
    pub plants: LoadOutcome,
}

/// The fixed remote query: endpoint plus the SQL carried in the `sql`
/// query parameter. Static configuration, never mutated at runtime.
#[derive(Clone, Debug)]
pub struct QueryDescriptor {
    pub url: String,
    pub sql: String,
}
