// src/services/quality.rs

//! Article quality classification from markup templates.
//!
//! Rules are checked top to bottom and the first template found decides the
//! label. A rule may carry an extra condition; when its template is present
//! but the condition fails, the article stays unassessed and later rules are
//! not consulted.

use std::sync::Arc;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{CacheKey, CacheValue, QualityLabel};
use crate::services::{ContentSource, Extraction};
use crate::storage::{MarkupCache, MetricCache};

/// Template names on the Russian-language wiki, in priority order.
const STANDARD_RULES: &[(&str, QualityLabel, Option<&str>)] = &[
    ("избранная статья", QualityLabel::FeaturedArticle, None),
    ("избранный список", QualityLabel::FeaturedList, None),
    (
        "избранный список или портал",
        QualityLabel::FeaturedList,
        Some(r"тип\s*=\s*список"),
    ),
    ("хорошая статья", QualityLabel::Good, None),
    ("добротная статья", QualityLabel::B, None),
];

/// One template rule.
#[derive(Debug, Clone)]
pub struct QualityRule {
    pattern: Regex,
    label: QualityLabel,
    requires: Option<Regex>,
}

impl QualityRule {
    /// Build a rule matching `{{name}}`, tolerating case, a `subst:` prefix
    /// and trailing parameters. Words of `name` match any whitespace run.
    pub fn template(name: &str, label: QualityLabel, requires: Option<&str>) -> Result<Self> {
        let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
        let pattern = format!(
            r"(?i)\{{\{{\s*(?:subst:\s*)?{}(?:\|[^}}]*)?\}}\}}",
            words.join(r"\s+")
        );
        let pattern = compile(&pattern)?;
        let requires = requires
            .map(|extra| compile(&format!("(?i){extra}")))
            .transpose()?;
        Ok(Self {
            pattern,
            label,
            requires,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::config(format!("bad pattern {pattern:?}: {e}")))
}

/// Ordered, first-match-wins rule set.
#[derive(Debug, Clone)]
pub struct QualityRules {
    rules: Vec<QualityRule>,
}

impl QualityRules {
    pub fn new(rules: Vec<QualityRule>) -> Self {
        Self { rules }
    }

    /// Rules for the Russian-language wiki templates.
    pub fn standard() -> Result<Self> {
        let rules = STANDARD_RULES
            .iter()
            .map(|(name, label, requires)| QualityRule::template(name, *label, *requires))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn classify(&self, markup: &str) -> QualityLabel {
        for rule in &self.rules {
            if !rule.pattern.is_match(markup) {
                continue;
            }
            return match &rule.requires {
                Some(extra) if !extra.is_match(markup) => QualityLabel::Unassessed,
                _ => rule.label,
            };
        }
        QualityLabel::Unassessed
    }
}

/// Computes `quality` per title.
///
/// Markup warmed by the batch preloader is used when present; otherwise the
/// markup is fetched for the single title.
#[derive(Clone)]
pub struct QualityExtractor {
    source: Arc<dyn ContentSource>,
    cache: Arc<MetricCache>,
    markup: Arc<MarkupCache>,
    rules: Arc<QualityRules>,
}

impl QualityExtractor {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cache: Arc<MetricCache>,
        markup: Arc<MarkupCache>,
        rules: Arc<QualityRules>,
    ) -> Self {
        Self {
            source,
            cache,
            markup,
            rules,
        }
    }

    pub async fn extract(&self, title: &str) -> Extraction<QualityLabel> {
        let key = CacheKey::quality(title);
        if let Some(label) = self.cache.get(&key).and_then(|v| v.as_quality()) {
            return Extraction::Cached(label);
        }

        let markup = match self.markup.take(title) {
            Some(markup) => {
                log::debug!("Using preloaded markup for '{}'", title);
                markup
            }
            None => match self.source.markup(title).await {
                Ok(markup) => markup,
                Err(e) => {
                    log::warn!("quality failed for '{}': {}", title, e);
                    return Extraction::Failed(e.to_string());
                }
            },
        };

        let label = self.rules.classify(&markup);
        self.cache.set(key, CacheValue::Quality(label));
        Extraction::Computed(label)
    }
}
