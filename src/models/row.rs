//! Input and output rows of the enrichment pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::QualityLabel;

/// One record from the bulk source, fields kept as delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub page_title: String,
    #[serde(default)]
    pub created: String,
    #[serde(default = "zero")]
    pub size: String,
    #[serde(default = "zero")]
    pub redlinks: String,
    #[serde(default = "zero")]
    pub is_disambiguation: String,
}

fn zero() -> String {
    "0".to_string()
}

impl RawRow {
    pub fn new(page_title: impl Into<String>) -> Self {
        Self {
            page_title: page_title.into(),
            created: String::new(),
            size: zero(),
            redlinks: zero(),
            is_disambiguation: zero(),
        }
    }

    /// Parse a tab-separated result set with a header row.
    ///
    /// Quoted fields follow CSV rules. Unknown columns are ignored, missing
    /// ones take their defaults, rows without a title or that cannot be
    /// decoded are skipped.
    pub fn parse_tsv(text: &str) -> Vec<RawRow> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(text.as_bytes());

        reader
            .deserialize::<RawRow>()
            .enumerate()
            .filter_map(|(index, record)| match record {
                Ok(row) if !row.page_title.trim().is_empty() => Some(row),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("Skipping result row {}: {}", index + 1, e);
                    None
                }
            })
            .collect()
    }
}

/// A raw row plus computed metrics and the carried-over comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub page_title: String,
    pub created: String,
    pub size: u64,
    pub prose_size: u64,
    pub redlinks: u64,
    pub is_disambiguation: u64,
    pub comment: String,
    pub quality: QualityLabel,
}

impl EnrichedRow {
    /// Combine a raw row with its metrics, coercing numeric fields.
    pub fn from_raw(
        raw: &RawRow,
        prose_size: u64,
        quality: QualityLabel,
        comment: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            page_title: raw.page_title.clone(),
            created: raw.created.clone(),
            size: parse_count("size", &raw.size)?,
            prose_size,
            redlinks: parse_count("redlinks", &raw.redlinks)?,
            is_disambiguation: parse_count("is_disambiguation", &raw.is_disambiguation)?,
            comment: comment.into(),
            quality,
        })
    }
}

/// Parse a non-negative count, accepting float notation like `"1000.0"`.
pub fn parse_count(field: &str, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
        _ => Err(AppError::validation(format!(
            "{field} is not a count: {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsv() {
        let text = "page_title\tcreated\tsize\tredlinks\tis_disambiguation\n\
                    Example\t2020-01-01\t1000\t2\t0\n\
                    Other_Page\t2021-05-06\t250\t0\t1\n";
        let rows = RawRow::parse_tsv(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].page_title, "Example");
        assert_eq!(rows[0].created, "2020-01-01");
        assert_eq!(rows[1].page_title, "Other_Page");
        assert_eq!(rows[1].is_disambiguation, "1");
    }

    #[test]
    fn test_parse_tsv_missing_columns_default_to_zero() {
        let rows = RawRow::parse_tsv("page_title\textra\nA\tx\n\tskipped\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, "0");
        assert_eq!(rows[0].redlinks, "0");
        assert!(rows[0].created.is_empty());
    }

    #[test]
    fn test_parse_tsv_unquotes_fields() {
        let text = "page_title\tcreated\tsize\tredlinks\tis_disambiguation\r\n\
                    \"\"\"Quoted\"\"_Title\"\t2020-01-01\t1000\t2\t0\r\n\
                    \"Tab\tInside\"\t2020-01-02\t10\t0\t0\r\n";
        let rows = RawRow::parse_tsv(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].page_title, "\"Quoted\"_Title");
        assert_eq!(rows[0].size, "1000");
        assert_eq!(rows[1].page_title, "Tab\tInside");
        assert_eq!(rows[1].created, "2020-01-02");
    }

    #[test]
    fn test_parse_tsv_empty() {
        assert!(RawRow::parse_tsv("").is_empty());
        assert!(RawRow::parse_tsv("page_title\n").is_empty());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("size", "1000").unwrap(), 1000);
        assert_eq!(parse_count("size", "1000.0").unwrap(), 1000);
        assert_eq!(parse_count("size", " 7 ").unwrap(), 7);
        assert_eq!(parse_count("size", "").unwrap(), 0);
        assert!(parse_count("size", "abc").is_err());
        assert!(parse_count("size", "-3").is_err());
    }

    #[test]
    fn test_enriched_from_raw() {
        let raw = RawRow {
            page_title: "Example".into(),
            created: "2020-01-01".into(),
            size: "1000".into(),
            redlinks: "2".into(),
            is_disambiguation: "0".into(),
        };
        let row = EnrichedRow::from_raw(&raw, 37, QualityLabel::Unassessed, "").unwrap();
        assert_eq!(row.size, 1000);
        assert_eq!(row.redlinks, 2);
        assert_eq!(row.prose_size, 37);
        assert_eq!(row.quality.as_str(), "");
    }

    #[test]
    fn test_enriched_from_raw_rejects_malformed_size() {
        let mut raw = RawRow::new("Broken");
        raw.size = "n/a".into();
        assert!(EnrichedRow::from_raw(&raw, 0, QualityLabel::Unassessed, "").is_err());
    }
}
