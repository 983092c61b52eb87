use crate::classify::Classification;
use serde_json::Value;

const EXCERPT_MAX_CHARS: usize = 160;

/// Recover a [`Classification`] from raw model output.
///
/// The model is instructed to answer with a bare JSON object, but responses
/// routinely arrive wrapped in markdown fences or surrounded by prose. This
/// function is total: every input produces some `Classification`, with all
/// recoverable failures mapped to the degraded "unknown" shape whose
/// rationale names the failure and echoes a bounded excerpt of the raw text.
pub fn extract_classification(raw: &str) -> Classification {
    let unfenced = strip_code_fences(raw);

    let trimmed = unfenced.trim();
    let json_text = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    let value: Value = match serde_json::from_str(json_text) {
        Ok(value) => value,
        Err(e) => {
            return Classification::degraded(format!(
                "API parsing error: response was not valid JSON ({e}); raw response: {}",
                excerpt(raw)
            ))
        }
    };

    match validate(&value) {
        Ok(classification) => classification,
        Err(reason) => Classification::degraded(format!(
            "API parsing error: {reason}; raw response: {}",
            excerpt(raw)
        )),
    }
}

/// Pull the contents of the first fenced code block, preferring a fence
/// explicitly tagged as JSON. Text without fences passes through unchanged.
fn strip_code_fences(text: &str) -> &str {
    if let Some(inner) = fenced_block(text, "```json") {
        return inner;
    }
    if let Some(inner) = fenced_block(text, "```") {
        return inner;
    }
    text
}

fn fenced_block<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

fn validate(value: &Value) -> Result<Classification, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "response JSON is not an object".to_string())?;

    let neighborhood = object
        .get("neighborhood")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing or non-string `neighborhood` field".to_string())?;

    let rationale = object
        .get("rationale")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing or non-string `rationale` field".to_string())?;

    let confidence = coerce_confidence(
        object
            .get("confidence")
            .ok_or_else(|| "missing `confidence` field".to_string())?,
    )?;

    Ok(Classification::new(
        neighborhood.to_string(),
        confidence,
        rationale.to_string(),
    ))
}

/// Accept a JSON number or a numeric string; anything else is a validation
/// failure. Out-of-range values are clamped by `Classification::new`.
fn coerce_confidence(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("`confidence` is not representable as a float: {n}")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("`confidence` is not a number: {s:?}")),
        other => Err(format!("`confidence` is not a number: {other}")),
    }
}

fn excerpt(raw: &str) -> String {
    let raw = raw.trim();
    let mut out: String = raw.chars().take(EXCERPT_MAX_CHARS).collect();
    if out.len() < raw.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::UNKNOWN_LABEL;

    const BARE: &str =
        r#"{"neighborhood": "Mission", "confidence": 0.85, "rationale": "24th St BART"}"#;

    fn expected() -> Classification {
        Classification::new("Mission".into(), 0.85, "24th St BART".into())
    }

    #[test]
    fn extracts_bare_json_object() {
        assert_eq!(extract_classification(BARE), expected());
    }

    #[test]
    fn extracts_json_inside_tagged_fence() {
        let raw = format!("```json\n{BARE}\n```");
        assert_eq!(extract_classification(&raw), expected());
    }

    #[test]
    fn extracts_json_inside_untagged_fence() {
        let raw = format!("Here you go:\n```\n{BARE}\n```\nHope that helps!");
        assert_eq!(extract_classification(&raw), expected());
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let raw = format!("Sure! The classification is {BARE} based on the article.");
        assert_eq!(extract_classification(&raw), expected());
    }

    #[test]
    fn degrades_on_text_with_no_braces() {
        let result = extract_classification("I could not determine the neighborhood.");
        assert_eq!(result.neighborhood, UNKNOWN_LABEL);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.rationale.is_empty());
        assert!(result.rationale.contains("could not determine"));
    }

    #[test]
    fn degrades_on_missing_field() {
        let result = extract_classification(r#"{"neighborhood": "Mission", "confidence": 0.9}"#);
        assert_eq!(result.neighborhood, UNKNOWN_LABEL);
        assert_eq!(result.confidence, 0.0);
        assert!(result.rationale.contains("rationale"));
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        let result = extract_classification(
            r#"{"neighborhood": "Mission", "confidence": 42.0, "rationale": "r"}"#,
        );
        assert_eq!(result.neighborhood, "Mission");
        assert_eq!(result.confidence, 1.0);

        let result = extract_classification(
            r#"{"neighborhood": "Mission", "confidence": -3, "rationale": "r"}"#,
        );
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn coerces_confidence_from_numeric_string() {
        let result = extract_classification(
            r#"{"neighborhood": "Mission", "confidence": "0.7", "rationale": "r"}"#,
        );
        assert_eq!(result.confidence, 0.7);

        let result = extract_classification(
            r#"{"neighborhood": "Mission", "confidence": "high", "rationale": "r"}"#,
        );
        assert_eq!(result.neighborhood, UNKNOWN_LABEL);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn degraded_rationale_carries_bounded_excerpt() {
        let raw = "x".repeat(5000);
        let result = extract_classification(&raw);
        assert_eq!(result.neighborhood, UNKNOWN_LABEL);
        assert!(result.rationale.len() < 400);
    }
}
