//! Metric kinds, cache keys and cache values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Derived metric computed per title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    ProseSize,
    Quality,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::ProseSize => "prose_size",
            MetricKind::Quality => "quality",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key: metric kind plus article title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub metric: MetricKind,
    pub title: String,
}

impl CacheKey {
    pub fn new(metric: MetricKind, title: impl Into<String>) -> Self {
        Self {
            metric,
            title: title.into(),
        }
    }

    pub fn prose_size(title: impl Into<String>) -> Self {
        Self::new(MetricKind::ProseSize, title)
    }

    pub fn quality(title: impl Into<String>) -> Self {
        Self::new(MetricKind::Quality, title)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.metric, self.title)
    }
}

/// Editorial status label derived from markup templates.
///
/// `Unassessed` serializes as the empty string, which is also what the
/// published dataset carries for articles without a recognized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityLabel {
    #[serde(rename = "featured_article")]
    FeaturedArticle,
    #[serde(rename = "featured_list")]
    FeaturedList,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "b")]
    B,
    #[default]
    #[serde(rename = "")]
    Unassessed,
}

impl QualityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::FeaturedArticle => "featured_article",
            QualityLabel::FeaturedList => "featured_list",
            QualityLabel::Good => "good",
            QualityLabel::B => "b",
            QualityLabel::Unassessed => "",
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value stored under a [`CacheKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheValue {
    ProseSize(u64),
    Quality(QualityLabel),
}

impl CacheValue {
    pub fn as_prose_size(&self) -> Option<u64> {
        match self {
            CacheValue::ProseSize(size) => Some(*size),
            CacheValue::Quality(_) => None,
        }
    }

    pub fn as_quality(&self) -> Option<QualityLabel> {
        match self {
            CacheValue::Quality(label) => Some(*label),
            CacheValue::ProseSize(_) => None,
        }
    }
}
