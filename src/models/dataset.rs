//! Tabular dataset model shared by the loader and the publisher.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{DatasetConfig, EnrichedRow};

/// Column declaration of a tabular dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SchemaField {
    fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

/// Published tabular document: metadata, schema and positional rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularDataset {
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    #[serde(default)]
    pub sources: String,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub data: Vec<Value>,
}

impl TabularDataset {
    /// Fixed column order of the published dataset.
    pub fn schema_fields() -> Vec<SchemaField> {
        vec![
            SchemaField::new("page_title", "string"),
            SchemaField::new("created", "string"),
            SchemaField::new("size", "number"),
            SchemaField::new("prose_size", "number"),
            SchemaField::new("redlinks", "number"),
            SchemaField::new("is_disambiguation", "number"),
            SchemaField::new("comment", "string"),
            SchemaField::new("quality", "string"),
        ]
    }

    /// Build the upload payload from enriched rows.
    pub fn from_rows(rows: &[EnrichedRow], config: &DatasetConfig) -> Self {
        let data = rows
            .iter()
            .map(|row| {
                Value::Array(vec![
                    Value::from(row.page_title.clone()),
                    Value::from(row.created.clone()),
                    Value::from(row.size),
                    Value::from(row.prose_size),
                    Value::from(row.redlinks),
                    Value::from(row.is_disambiguation),
                    Value::from(row.comment.clone()),
                    Value::from(row.quality.as_str()),
                ])
            })
            .collect();

        Self {
            license: config.license.clone(),
            description: config.description.clone(),
            sources: config.sources.clone(),
            schema: Schema {
                fields: Self::schema_fields(),
            },
            data,
        }
    }

    /// Parse a published document's JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize for upload, keeping non-ASCII characters as-is.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Index rows by `page_title`, skipping rows whose arity does not
    /// match the schema.
    pub fn records(&self) -> ExistingRecords {
        let names: Vec<&str> = self.schema.fields.iter().map(|f| f.name.as_str()).collect();
        let mut records = HashMap::new();

        for row in &self.data {
            let Some(values) = row.as_array() else {
                continue;
            };
            if values.len() != names.len() {
                continue;
            }
            let record: HashMap<String, Value> = names
                .iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();
            if let Some(title) = record.get("page_title").and_then(Value::as_str) {
                records.insert(title.to_string(), record);
            }
        }

        ExistingRecords { records }
    }
}

/// Rows of the previously published dataset, keyed by title.
#[derive(Debug, Clone, Default)]
pub struct ExistingRecords {
    records: HashMap<String, HashMap<String, Value>>,
}

impl ExistingRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Comment carried over for a title, empty for new titles.
    pub fn comment(&self, title: &str) -> String {
        self.records
            .get(title)
            .and_then(|record| record.get("comment"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

impl FromIterator<(String, HashMap<String, Value>)> for ExistingRecords {
    fn from_iter<I: IntoIterator<Item = (String, HashMap<String, Value>)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
