//! Prompt construction and response parsing for concept extraction.
//!
//! The service is asked for a JSON array of concepts. Models wrap output in
//! an object or a Markdown code fence often enough that both are accepted:
//!
//! ```text
//! [{"name": "Preload", "description": "..."}]
//! {"concepts": [{"name": "Preload"}]}
//! ["Preload", "Afterload"]
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::generator::GenerateError;
use crate::types::{ContentChunk, ExtractedConcept};

const CONCEPT_INSTRUCTIONS: &str = "\
You are extracting key medical concepts from lecture content for a study tool.
Return ONLY a JSON array. Each element is an object with:
  \"name\": the concept name (required)
  \"description\": one sentence explaining it (optional)
  \"category\": anatomy, physiology, pathology, pharmacology, or clinical (optional)
Do not include any text outside the JSON array.";

/// Build the extraction prompt for a chunk.
pub fn concept_prompt(chunk: &ContentChunk) -> String {
    let source = chunk
        .source
        .as_deref()
        .map(|s| format!("Source: {s}\n"))
        .unwrap_or_default();
    format!(
        "{CONCEPT_INSTRUCTIONS}\n\n{source}Lecture content:\n\"\"\"\n{}\n\"\"\"",
        chunk.text.trim()
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawConcept {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
}

/// Parse concepts from the service's raw text.
///
/// Concepts with names shorter than `min_name_len` (after trimming) are
/// dropped. Anything that is not a concept array is a `MalformedResponse`.
pub fn parse_concepts(raw: &str, min_name_len: usize) -> Result<Vec<ExtractedConcept>, GenerateError> {
    let body = strip_code_fence(raw.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GenerateError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("concepts") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GenerateError::MalformedResponse(
                    "object without a \"concepts\" array".to_string(),
                ));
            }
        },
        other => {
            return Err(GenerateError::MalformedResponse(format!(
                "expected array, got {}",
                json_type(&other)
            )));
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<RawConcept>(item)
                .map_err(|e| GenerateError::MalformedResponse(format!("invalid concept: {e}")))
        })
        .filter_map(|raw| match raw {
            Ok(raw) => to_concept(raw, min_name_len).map(Ok),
            Err(e) => Some(Err(e)),
        })
        .collect()
}

fn to_concept(raw: RawConcept, min_name_len: usize) -> Option<ExtractedConcept> {
    let (name, description, category) = match raw {
        RawConcept::Name(name) => (name, None, None),
        RawConcept::Full {
            name,
            description,
            category,
        } => (name, description, category),
    };
    let name = name.trim();
    if name.chars().count() < min_name_len.max(1) {
        return None;
    }
    Some(ExtractedConcept {
        name: name.to_string(),
        description: description.filter(|d| !d.trim().is_empty()),
        category: category.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty()),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_chunk_text_and_source() {
        let chunk = ContentChunk::new("c1", "  The Frank-Starling law...  ").with_source("Cardio L3");
        let prompt = concept_prompt(&chunk);
        assert!(prompt.contains("Source: Cardio L3"));
        assert!(prompt.contains("\"\"\"\nThe Frank-Starling law...\n\"\"\""));
        assert!(prompt.starts_with("You are extracting"));
    }

    #[test]
    fn test_parse_plain_array() {
        let concepts = parse_concepts(
            r#"[{"name": "Preload", "description": "End-diastolic stretch", "category": "Physiology"}, "Afterload"]"#,
            2,
        )
        .unwrap();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].category.as_deref(), Some("physiology"));
        assert_eq!(concepts[1].name, "Afterload");
    }

    #[test]
    fn test_parse_wrapped_object() {
        let concepts = parse_concepts(r#"{"concepts": [{"name": "Stroke volume"}]}"#, 2).unwrap();
        assert_eq!(concepts[0].name, "Stroke volume");
    }

    #[test]
    fn test_parse_fenced_block() {
        let raw = "```json\n[\"Cardiac output\", \"Ejection fraction\"]\n```\n";
        let concepts = parse_concepts(raw, 2).unwrap();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[1].name, "Ejection fraction");
    }

    #[test]
    fn test_short_names_dropped() {
        let concepts = parse_concepts(r#"["A", "  ", "SA node"]"#, 2).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].name, "SA node");
    }

    #[test]
    fn test_malformed_responses() {
        for raw in [
            "Here are the concepts: preload, afterload",
            r#"{"items": []}"#,
            "42",
            r#"[{"description": "no name"}]"#,
            "",
        ] {
            let err = parse_concepts(raw, 2).unwrap_err();
            assert!(
                matches!(err, GenerateError::MalformedResponse(_)),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_concepts("[]", 2).unwrap().is_empty());
    }
}
