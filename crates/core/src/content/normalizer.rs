//! # Content Normalizer
//!
//! Recovers article content and metadata from a terminal payload that may
//! have been serialized any number of times: a plain record, a JSON string,
//! a fenced JSON block, or nestings of those.
//!
//! ## Guarantees
//!
//! - At most [`MAX_DEPTH`] levels of unwrapping; past that the content is empty.
//! - `content` is never a syntactically complete JSON object or array.
//! - Text that opens like broken JSON is discarded rather than displayed.
//!   Prose that merely starts with a brace followed by a quoted key is lost
//!   too; that trade-off is deliberate.
//! - Metadata is merged additively, outer values winning.

use crate::models::{ArticleImage, FinalArticle, QualityReview, SeoMeta};
use crate::stream::TerminalPayload;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Maximum unwrapping depth
pub const MAX_DEPTH: usize = 5;

/// Record fields that may carry the article body, in order of preference
const BODY_FIELDS: &[&str] = &["article_body", "articleBody", "body", "content", "markdown"];

const FENCE: &str = "```";

/// Metadata that travels alongside the body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_meta: Option<SeoMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_review: Option<QualityReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic_check: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ArticleImage>,
}

impl ArticleMetadata {
    /// Read whatever metadata a record carries, in either key casing
    fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            title: field::<String>(record, &["title"]).filter(|t| !t.trim().is_empty()),
            seo_meta: field::<SeoMeta>(record, &["seoMeta", "seo_meta"])
                .filter(|meta| *meta != SeoMeta::default()),
            quality_review: field::<QualityReview>(record, &["qualityReview", "quality_review"])
                .filter(|review| !review.is_empty()),
            geo_score: field(record, &["geoScore", "geo_score"]),
            logic_check: field(record, &["logicCheck", "logic_check"]),
            images: field(record, &["images"]).unwrap_or_default(),
        }
    }

    /// Fill gaps from `fallback`; values already present win
    pub fn or(self, fallback: Self) -> Self {
        Self {
            title: self.title.or(fallback.title),
            seo_meta: self.seo_meta.or(fallback.seo_meta),
            quality_review: self.quality_review.or(fallback.quality_review),
            geo_score: self.geo_score.or(fallback.geo_score),
            logic_check: self.logic_check.or(fallback.logic_check),
            images: if self.images.is_empty() {
                fallback.images
            } else {
                self.images
            },
        }
    }
}

/// Output of the normalizer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedContent {
    pub content: String,
    #[serde(flatten)]
    pub metadata: ArticleMetadata,
}

impl NormalizedContent {
    fn markdown(text: &str) -> Self {
        Self {
            content: text.to_string(),
            metadata: ArticleMetadata::default(),
        }
    }

    fn empty() -> Self {
        Self::default()
    }

    /// Assemble the final article
    ///
    /// A loose `geoScore`/`logicCheck` pair becomes the quality review when
    /// the payload carried no review of its own.
    pub fn into_article(self) -> FinalArticle {
        let ArticleMetadata {
            title,
            seo_meta,
            quality_review,
            geo_score,
            logic_check,
            images,
        } = self.metadata;

        let quality_review = quality_review.or_else(|| {
            (geo_score.is_some() || logic_check.is_some()).then(|| QualityReview {
                geo_score,
                logic_check,
                ..QualityReview::default()
            })
        });

        FinalArticle {
            title: title.unwrap_or_default(),
            content: self.content,
            images,
            seo_meta,
            quality_review,
        }
    }
}

/// Normalize a terminal payload
pub fn normalize(payload: TerminalPayload) -> NormalizedContent {
    normalize_payload(payload, 0)
}

/// Normalize an arbitrary JSON value
pub fn normalize_value(value: Value) -> NormalizedContent {
    normalize_payload(value.into(), 0)
}

fn normalize_payload(payload: TerminalPayload, depth: usize) -> NormalizedContent {
    if depth > MAX_DEPTH {
        tracing::warn!(depth, "Payload nested beyond the unwrap limit, dropping it");
        return NormalizedContent::empty();
    }

    match payload {
        TerminalPayload::Text(text) => normalize_text(&text, depth),
        TerminalPayload::Record(record) => normalize_record(&record, depth),
        TerminalPayload::Unrecognized(value) => {
            tracing::debug!(kind = value_kind(&value), "Unrecognized payload shape, dropping it");
            NormalizedContent::empty()
        }
    }
}

/// Step 1: text, possibly fenced, possibly serialized
fn normalize_text(raw: &str, depth: usize) -> NormalizedContent {
    let text = strip_code_fence(raw);

    if opens_like_json(text) {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => return normalize_payload(value.into(), depth + 1),
            Err(e) if looks_serialized(text) => {
                tracing::debug!(error = %e, "Discarding text that looks like broken JSON");
                return NormalizedContent::empty();
            }
            Err(_) => {}
        }
    }

    NormalizedContent::markdown(text)
}

/// Step 2: a record with a body field and metadata
fn normalize_record(record: &Map<String, Value>, depth: usize) -> NormalizedContent {
    let outer = ArticleMetadata::from_record(record);

    let mut normalized = match body_field(record) {
        Some(Value::String(body)) if is_wrapped_payload(body) => {
            let inner = normalize_text(body, depth + 1);
            NormalizedContent {
                content: inner.content,
                metadata: outer.or(inner.metadata),
            }
        }
        Some(Value::String(body)) => NormalizedContent {
            content: body.clone(),
            metadata: outer,
        },
        Some(nested @ Value::Object(_)) => {
            let inner = normalize_payload(nested.clone().into(), depth + 1);
            NormalizedContent {
                content: inner.content,
                metadata: outer.or(inner.metadata),
            }
        }
        _ => NormalizedContent {
            content: String::new(),
            metadata: outer,
        },
    };

    // Final safety pass: never hand back a bare JSON blob as content
    if has_bare_json_shape(&normalized.content) {
        match serde_json::from_str::<Value>(normalized.content.trim()) {
            Ok(value) => {
                let inner = normalize_payload(value.into(), depth + 1);
                normalized.content = inner.content;
                normalized.metadata = normalized.metadata.or(inner.metadata);
            }
            Err(_) => normalized.content.clear(),
        }
    }

    normalized
}

/// First populated body field
fn body_field(record: &Map<String, Value>) -> Option<&Value> {
    BODY_FIELDS
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| match value {
            Value::String(text) => !text.trim().is_empty(),
            Value::Object(nested) => !nested.is_empty(),
            _ => false,
        })
}

/// Decode a metadata field, tolerating JSON-encoded strings
fn field<T: DeserializeOwned>(record: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    keys.iter()
        .filter_map(|key| record.get(*key).map(|value| (*key, value)))
        .filter(|(_, value)| !value.is_null())
        .find_map(|(key, value)| {
            let decoded = match value {
                Value::String(text) if has_bare_json_shape(text) => {
                    serde_json::from_str::<T>(text.trim())
                        .or_else(|_| serde_json::from_value::<T>(value.clone()))
                }
                _ => serde_json::from_value::<T>(value.clone()),
            };
            match decoded {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(field = key, error = %e, "Dropping undecodable metadata");
                    None
                }
            }
        })
}

/// Strip one markdown fence wrapping the whole text
///
/// Only a single block spanning the entire text counts. An opening fence
/// without its closing half is stripped only when JSON follows it.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    let Some(newline) = rest.find('\n') else {
        return text;
    };
    let tag = rest[..newline].trim();
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || "_+-.".contains(c)) {
        return text;
    }

    let body = rest[newline + 1..].trim_end();
    let closed = body.ends_with(FENCE);
    let inner = body.strip_suffix(FENCE).unwrap_or(body);
    if inner.contains(FENCE) {
        return text;
    }

    let inner = inner.trim();
    if closed || opens_like_json(inner) {
        inner
    } else {
        text
    }
}

/// Outer delimiters suggest a serialized object, array or string
fn opens_like_json(text: &str) -> bool {
    text.starts_with('{')
        || text.starts_with('[')
        || (text.len() >= 2 && text.starts_with('"') && text.ends_with('"'))
}

/// Brace-quote-colon openings that only serialized data has
fn looks_serialized(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r#"^(?:\{\s*"[^"]*(?:"\s*:|$)|\[\s*[\{\["]|"\s*[\{\[])"#)
                .expect("serialized-data pattern is valid")
        })
        .is_match(text)
}

/// Strings the record pass must unwrap before use
fn is_wrapped_payload(text: &str) -> bool {
    let text = text.trim();
    text.starts_with(FENCE) || opens_like_json(text)
}

/// Enclosed in matching object or array delimiters
pub fn has_bare_json_shape(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> NormalizedContent {
        normalize(TerminalPayload::Text(s.to_string()))
    }

    #[test]
    fn test_plain_markdown_record_unchanged() {
        let out = normalize_value(json!({"content": "# Title\n\nBody"}));
        assert_eq!(out.content, "# Title\n\nBody");
        assert_eq!(out.metadata, ArticleMetadata::default());
    }

    #[test]
    fn test_markdown_is_idempotent() {
        let first = text("  # Title\n\nSome *body* text.\n");
        let second = text(&first.content);
        assert_eq!(first.content, "# Title\n\nSome *body* text.");
        assert_eq!(second, first);
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let out = text("```json\n{\"content\":\"Hello\"}\n```");
        assert_eq!(out.content, "Hello");
    }

    #[test]
    fn test_truncated_json_is_rejected() {
        let out = text("{\"content\": \"Hello");
        assert_eq!(out.content, "");
    }

    #[test]
    fn test_brace_prose_is_kept() {
        let out = text("{Note} this guide assumes Rust 1.75.");
        assert_eq!(out.content, "{Note} this guide assumes Rust 1.75.");
    }

    #[test]
    fn test_self_quoted_payload_terminates_empty() {
        let mut payload = json!({"content": "Hello"}).to_string();
        for _ in 0..9 {
            payload = serde_json::to_string(&payload).unwrap();
        }
        let out = text(&payload);
        assert_eq!(out.content, "");
    }

    #[test]
    fn test_shallow_quoting_is_unwrapped() {
        let mut payload = json!({"content": "Hello"}).to_string();
        for _ in 0..2 {
            payload = serde_json::to_string(&payload).unwrap();
        }
        assert_eq!(text(&payload).content, "Hello");
    }

    #[test]
    fn test_body_field_preference() {
        let out = normalize_value(json!({
            "markdown": "third",
            "content": "second",
            "article_body": "first"
        }));
        assert_eq!(out.content, "first");

        let out = normalize_value(json!({"article_body": "  ", "markdown": "fallback"}));
        assert_eq!(out.content, "fallback");
    }

    #[test]
    fn test_outer_metadata_wins_over_inner() {
        let inner = json!({
            "content": "Body",
            "seo_meta": {"title": "Inner", "description": "D"},
            "geo_score": 70
        });
        let out = normalize_value(json!({
            "title": "Outer article",
            "seoMeta": {"title": "Outer"},
            "article_body": inner.to_string()
        }));

        assert_eq!(out.content, "Body");
        assert_eq!(out.metadata.title.as_deref(), Some("Outer article"));
        assert_eq!(out.metadata.seo_meta.unwrap().title.as_deref(), Some("Outer"));
        assert_eq!(out.metadata.geo_score, Some(70.0));
    }

    #[test]
    fn test_nested_object_body() {
        let out = normalize_value(json!({
            "content": {"markdown": "Nested", "quality_review": {"fix_list": ["a"]}}
        }));
        assert_eq!(out.content, "Nested");
        assert_eq!(out.metadata.quality_review.unwrap().fix_list, vec!["a"]);
    }

    #[test]
    fn test_safety_pass_discards_broken_blob() {
        let out = normalize_value(json!({"content": "{\"content\": \"oops\" ,}"}));
        assert_eq!(out.content, "");
    }

    #[test]
    fn test_metadata_encoded_as_string() {
        let out = normalize_value(json!({
            "content": "Body",
            "seo_meta": "{\"description\": \"From a string\"}"
        }));
        assert_eq!(
            out.metadata.seo_meta.unwrap().description.as_deref(),
            Some("From a string")
        );
    }

    #[test]
    fn test_undecodable_metadata_is_dropped() {
        let out = normalize_value(json!({"content": "Body", "geoScore": "high"}));
        assert_eq!(out.content, "Body");
        assert!(out.metadata.geo_score.is_none());
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        assert_eq!(normalize_value(json!([1, 2, 3])).content, "");
        assert_eq!(normalize_value(json!(42)).content, "");
        assert_eq!(text("[{\"content\": \"x\"}]").content, "");
    }

    #[test]
    fn test_multi_block_markdown_keeps_fences() {
        let md = "```rust\nfn main() {}\n```\n\nExplanation.\n\n```sh\ncargo run\n```";
        assert_eq!(text(md).content, md);
    }

    #[test]
    fn test_unclosed_fence_before_json() {
        let out = text("```json\n{\"body\": \"Unclosed\"}");
        assert_eq!(out.content, "Unclosed");
    }

    #[test]
    fn test_into_article_assembles_quality_review() {
        let article = normalize_value(json!({
            "title": "T",
            "content": "Body",
            "geoScore": 91.5,
            "logicCheck": "passed",
            "images": ["https://cdn/x.png"]
        }))
        .into_article();

        let review = article.quality_review.unwrap();
        assert_eq!(review.geo_score, Some(91.5));
        assert_eq!(review.logic_check, Some(json!("passed")));
        assert_eq!(article.images.len(), 1);
        assert_eq!(article.title, "T");
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let out = normalize_value(json!({"content": "x", "geo_score": 3}));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json, json!({"content": "x", "geoScore": 3.0}));
    }
}
