use crate::classify::Classification;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One news story to be classified. Loaded once per run from the input CSV;
/// identity is the `id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Body text. The legacy export column name `clean_content` is accepted.
    #[serde(default, alias = "clean_content")]
    pub content: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub categories: String,
}

impl Article {
    /// An article with neither a usable title nor usable body is skipped
    /// without ever reaching the classifier.
    pub fn has_usable_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.content.trim().is_empty()
    }
}

/// One persisted result row: the article's fields plus the classification
/// fields. This is the schema of both the checkpoint and the final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub categories: String,
    pub neighborhood: String,
    pub confidence: f64,
    pub rationale: String,
}

impl OutputRow {
    pub fn new(article: Article, classification: Classification) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            tags: article.tags,
            categories: article.categories,
            neighborhood: classification.neighborhood,
            confidence: classification.confidence,
            rationale: classification.rationale,
        }
    }
}

/// Load the full article set from a CSV export. A missing or unreadable input
/// file is a fatal pre-flight error; no processing starts without a source.
pub fn read_articles(path: &Path) -> crate::Result<Vec<Article>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let mut articles = Vec::new();
    for record in reader.deserialize() {
        let article: Article = record
            .with_context(|| format!("failed to parse input row in {}", path.display()))?;
        articles.push(article);
    }
    Ok(articles)
}
