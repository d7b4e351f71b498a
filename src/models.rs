use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// One row of the product-data table. `fields` holds every column except
/// `sku` and `channel` (the latter is dropped after the join), so arbitrary
/// descriptive columns flow through to the generation prompt untouched.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub sku: String,
    pub fields: BTreeMap<String, String>,
}

/// One row of the product-images table.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub sku: String,
    pub url: String,
    pub is_main_image: bool,
}

/// Outcome of a single enrichment call: either the enriched text or the
/// reason it failed. Keeping the two apart avoids mistaking an error
/// message for a real description; `RowReport` records the failure side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Enrichment {
    Value(String),
    Failed(String),
}

impl Enrichment {
    pub fn value(&self) -> Option<&str> {
        match self {
            Enrichment::Value(text) => Some(text),
            Enrichment::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Enrichment::Value(_) => None,
            Enrichment::Failed(reason) => Some(reason),
        }
    }
}

/// A product joined with its main image, before enrichment.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub sku: String,
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

impl JoinedRow {
    pub fn into_enriched(self, top_title: Enrichment, image_description: Enrichment) -> EnrichedRow {
        EnrichedRow {
            sku: self.sku,
            url: self.url,
            fields: self.fields,
            top_title,
            image_description,
        }
    }
}

/// A product joined with its main image plus the two derived text fields.
#[derive(Debug, Clone)]
pub struct EnrichedRow {
    pub sku: String,
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub top_title: Enrichment,
    pub image_description: Enrichment,
}

impl EnrichedRow {
    /// The JSON document substituted into the generation template. A failed
    /// competitor lookup renders as an empty summary; a failed image fetch
    /// keeps its descriptive error string, matching the documented
    /// fail-soft behavior of the enrichment stages.
    pub fn product_data_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("sku".into(), json!(self.sku));
        for (key, value) in &self.fields {
            map.insert(key.clone(), json!(value));
        }
        map.insert("url".into(), json!(self.url));
        map.insert(
            "top_title".into(),
            json!(self.top_title.value().unwrap_or("")),
        );
        let description = match &self.image_description {
            Enrichment::Value(text) => text.as_str(),
            Enrichment::Failed(reason) => reason.as_str(),
        };
        map.insert("image_description".into(), json!(description));
        Value::Object(map)
    }
}

/// A generated spec sheet flattened to tabular form: dotted column names
/// plus the structured-data marker re-serialized to a single string.
#[derive(Debug, Clone, Default)]
pub struct FlatRow {
    pub columns: Vec<(String, String)>,
    pub marker: String,
}

impl FlatRow {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            marker: "{}".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One output row: identifying columns plus the flattened sheet.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub sku: String,
    pub url: String,
    pub flat: FlatRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

/// Per-row transcript of the enrichment and generation stages.
#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    pub sku: String,
    pub stages: Vec<StageReport>,
}

impl RowReport {
    pub fn new(sku: &str) -> Self {
        Self {
            sku: sku.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn failures(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter_map(|stage| stage.output.get("failure").and_then(Value::as_str))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started: DateTime<Utc>,
    pub rows: Vec<RowReport>,
    pub dropped_without_main_image: usize,
    #[serde(skip)]
    pub output_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> EnrichedRow {
        let mut fields = BTreeMap::new();
        fields.insert("name".into(), "Zapatillas Trail".into());
        fields.insert("price".into(), "59.95".into());
        EnrichedRow {
            sku: "123".into(),
            url: "https://example.com/main.jpg".into(),
            fields,
            top_title: Enrichment::Value("1 - A, 2 - B".into()),
            image_description: Enrichment::Value("Blue trail shoe".into()),
        }
    }

    #[test]
    fn product_data_json_carries_all_fields() {
        let row = sample_row();
        let value = row.product_data_json();
        assert_eq!(value["sku"], "123");
        assert_eq!(value["name"], "Zapatillas Trail");
        assert_eq!(value["price"], "59.95");
        assert_eq!(value["top_title"], "1 - A, 2 - B");
        assert_eq!(value["image_description"], "Blue trail shoe");
    }

    #[test]
    fn failed_lookup_renders_empty_summary() {
        let mut row = sample_row();
        row.top_title = Enrichment::Failed("missing shopping_results".into());
        let value = row.product_data_json();
        assert_eq!(value["top_title"], "");
    }

    #[test]
    fn failed_description_keeps_error_text() {
        let mut row = sample_row();
        row.image_description =
            Enrichment::Failed("Error 404: unable to download the image".into());
        let value = row.product_data_json();
        assert_eq!(
            value["image_description"],
            "Error 404: unable to download the image"
        );
    }

    #[test]
    fn empty_flat_row_still_has_marker() {
        let flat = FlatRow::empty();
        assert!(flat.is_empty());
        assert_eq!(flat.marker, "{}");
    }
}
