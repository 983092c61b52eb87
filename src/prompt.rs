use crate::taxonomy::Taxonomy;

/// Classification instructions with the allowed-neighborhood list baked in.
/// `{title}` and `{content}` are substituted per article.
const BASE_CLASSIFICATION_PROMPT: &str = r#"You are helping classify San Francisco news stories by neighborhood.

ALLOWED NEIGHBORHOODS: {neighborhoods}

SCOPE LABELS: citywide, regional, statewide, national, international, unknown

RULES:
1. Ignore "Mission Local" as a neighborhood reference (it's the publication name)
2. Use EXACT neighborhood names from the allowed list above
3. If article covers the whole city, use "citywide"
4. If unclear or no specific neighborhood, use "unknown" with low confidence
5. Prefer a single neighborhood unless clearly spanning multiple
6. Multiple neighborhoods should be separated by commas

CRITICAL: You MUST respond with ONLY a valid JSON object. No other text, no explanations, no markdown formatting.

JSON format:
{"neighborhood": "neighborhood_name_or_scope", "confidence": 0.85, "rationale": "Brief explanation"}

ARTICLE TITLE: {title}

ARTICLE CONTENT: {content}"#;

/// Opaque prompt template with `{title}`/`{content}` substitution points. The
/// core treats the wording as a black box; only the substitution contract
/// matters.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn for_taxonomy(taxonomy: &Taxonomy) -> Self {
        Self {
            template: BASE_CLASSIFICATION_PROMPT
                .replace("{neighborhoods}", &taxonomy.neighborhoods.join(", ")),
        }
    }

    pub fn render(&self, title: &str, content: &str) -> String {
        self.template
            .replace("{title}", title)
            .replace("{content}", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_title_and_content_into_template() {
        let taxonomy = Taxonomy::default_neighborhoods();
        let template = PromptTemplate::for_taxonomy(&taxonomy);
        let prompt = template.render("Fire on 24th", "A two alarm fire broke out.");

        assert!(prompt.contains("ARTICLE TITLE: Fire on 24th"));
        assert!(prompt.contains("ARTICLE CONTENT: A two alarm fire broke out."));
        assert!(prompt.contains("Mission, Mission Bay"));
        assert!(!prompt.contains("{title}"));
        assert!(!prompt.contains("{content}"));
    }
}
