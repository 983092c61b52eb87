use crate::api::AnthropicBackend;
use crate::articles::Article;
use crate::extract::extract_classification;
use crate::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_LABEL: &str = "unknown";

/// The three-field outcome of one classification attempt. Created once per
/// article and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// A neighborhood name or scope label ("citywide", "unknown", ...). The
    /// vocabulary is enforced by the prompt, not by this type.
    pub neighborhood: String,
    /// Always within [0.0, 1.0].
    pub confidence: f64,
    /// Short free-text explanation; on failure, a synthetic description of
    /// what went wrong.
    pub rationale: String,
}

impl Classification {
    pub fn new(neighborhood: String, confidence: f64, rationale: String) -> Self {
        Self {
            neighborhood,
            confidence: confidence.clamp(0.0, 1.0),
            rationale,
        }
    }

    /// The failure shape: every per-article failure mode degrades to this
    /// rather than surfacing an error to the batch driver.
    pub fn degraded<S: Into<String>>(rationale: S) -> Self {
        Self {
            neighborhood: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            rationale: rationale.into(),
        }
    }
}

/// The seam between the batch driver and the remote model. Implementations
/// must be total: all failure modes are represented as a degraded
/// [`Classification`], never as an error.
#[async_trait::async_trait]
pub trait ItemClassifier: Send + Sync {
    async fn classify(&self, article: &Article) -> Classification;
}

/// Production classifier: one Messages API completion per article, response
/// text recovered by the extractor.
pub struct AnthropicClassifier {
    backend: AnthropicBackend,
    prompt: PromptTemplate,
}

impl AnthropicClassifier {
    pub fn new(backend: AnthropicBackend, prompt: PromptTemplate) -> Self {
        Self { backend, prompt }
    }

    /// Fold the auxiliary fields into the body text under labeled sections so
    /// the model sees everything the export knows about the story.
    fn full_content(article: &Article) -> String {
        let mut full_content = article.content.clone();
        if !article.tags.trim().is_empty() {
            full_content.push_str(&format!("\n\nTags: {}", article.tags));
        }
        if !article.categories.trim().is_empty() {
            full_content.push_str(&format!("\n\nCategories: {}", article.categories));
        }
        full_content
    }
}

#[async_trait::async_trait]
impl ItemClassifier for AnthropicClassifier {
    async fn classify(&self, article: &Article) -> Classification {
        let prompt = self
            .prompt
            .render(&article.title, &Self::full_content(article));

        match self.backend.completion(&prompt).await {
            Ok(text) => extract_classification(&text),
            Err(e) => {
                crate::warn!(article_id = %article.id, "API call failed: {e}");
                Classification::degraded(format!("API error: {e}"))
            }
        }
    }
}
