//! # Validity Gate
//!
//! Decides whether an article is presentable.

use crate::models::FinalArticle;
use serde_json::Value;

/// True if `text` parses as a complete JSON object or array
pub fn is_bare_json(text: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(text.trim()),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

/// Presentable content: non-blank and not a raw serialized blob
pub fn has_displayable_content(content: &str) -> bool {
    !content.trim().is_empty() && !is_bare_json(content)
}

/// A title alone is enough; otherwise the body must be displayable
pub fn is_valid_article(article: &FinalArticle) -> bool {
    !article.title.trim().is_empty() || has_displayable_content(&article.content)
}

impl FinalArticle {
    pub fn is_presentable(&self) -> bool {
        is_valid_article(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str) -> FinalArticle {
        FinalArticle {
            title: title.to_string(),
            content: content.to_string(),
            ..FinalArticle::default()
        }
    }

    #[test]
    fn test_blank_article_is_invalid() {
        assert!(!is_valid_article(&article("", "   ")));
    }

    #[test]
    fn test_title_alone_is_valid() {
        assert!(is_valid_article(&article("x", "")));
    }

    #[test]
    fn test_content_alone_is_valid() {
        assert!(is_valid_article(&article("", "Hello world")));
    }

    #[test]
    fn test_json_content_is_invalid() {
        assert!(!is_valid_article(&article("", "{\"content\": \"Hello\"}")));
        assert!(!is_valid_article(&article("  ", " [1, 2] ")));
        assert!(is_valid_article(&article("", "{not json}")));
    }

    #[test]
    fn test_scalar_json_is_displayable() {
        assert!(has_displayable_content("42"));
        assert!(!is_bare_json("\"quoted\""));
    }
}
