//! # Scribe Models
//!
//! Shared types for the generation request and the article it produces.
//! These are the only shapes the rest of the host (dashboards, article CRUD)
//! exchanges with this crate.

use serde::{Deserialize, Serialize};

/// Language of the surface hosting the session
///
/// Only affects cosmetic text (hand-off narration). Never changes parsing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    #[default]
    En,
    Zh,
}

impl UiLanguage {
    /// Get all supported languages
    pub fn all() -> Vec<UiLanguage> {
        vec![UiLanguage::En, UiLanguage::Zh]
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            UiLanguage::En => "English",
            UiLanguage::Zh => "简体中文",
        }
    }

    /// Parse a language tag such as `en`, `en-US` or `zh-CN`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(UiLanguage::En),
            "zh" => Some(UiLanguage::Zh),
            _ => None,
        }
    }
}

/// How aggressively promoted websites are woven into the article
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromotionIntensity {
    Low,
    #[default]
    Medium,
    High,
}

/// Optional reference material the researcher should start from
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Reference {
    /// Inline document text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// URL to fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Reference {
    pub fn document(text: impl Into<String>) -> Self {
        Self {
            document: Some(text.into()),
            url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            document: None,
            url: Some(url.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document.as_deref().map_or(true, |d| d.trim().is_empty())
            && self.url.as_deref().map_or(true, |u| u.trim().is_empty())
    }
}

/// Body of the single POST that starts a generation
///
/// ## Example
/// ```rust,ignore
/// use scribe_core::models::GenerationRequest;
///
/// let request = GenerationRequest::new("rust async runtimes")
///     .with_target_language("English");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub keyword: String,
    pub tone: String,
    pub target_audience: String,
    pub visual_style: String,
    pub target_market: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default)]
    pub promoted_websites: Vec<String>,
    #[serde(default)]
    pub promotion_intensity: PromotionIntensity,
    pub target_language: String,
    #[serde(default)]
    pub ui_language: UiLanguage,
}

impl GenerationRequest {
    /// Create a request with the default tone, audience and style
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            tone: "professional".to_string(),
            target_audience: "general".to_string(),
            visual_style: "modern".to_string(),
            target_market: "global".to_string(),
            reference: None,
            promoted_websites: Vec::new(),
            promotion_intensity: PromotionIntensity::default(),
            target_language: "English".to_string(),
            ui_language: UiLanguage::default(),
        }
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    pub fn with_ui_language(mut self, language: UiLanguage) -> Self {
        self.ui_language = language;
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = (!reference.is_empty()).then_some(reference);
        self
    }
}

/// SEO metadata attached to an article
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SeoMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// Reviewer verdict on the generated article
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityReview {
    #[serde(default, alias = "geo_score", skip_serializing_if = "Option::is_none")]
    pub geo_score: Option<f64>,
    #[serde(default, alias = "logic_check", skip_serializing_if = "Option::is_none")]
    pub logic_check: Option<serde_json::Value>,
    #[serde(default, alias = "other_checks", skip_serializing_if = "Option::is_none")]
    pub other_checks: Option<serde_json::Value>,
    #[serde(default, alias = "fix_list", skip_serializing_if = "Vec::is_empty")]
    pub fix_list: Vec<String>,
}

impl QualityReview {
    pub fn is_empty(&self) -> bool {
        self.geo_score.is_none()
            && self.logic_check.is_none()
            && self.other_checks.is_none()
            && self.fix_list.is_empty()
    }
}

/// An illustration produced by the artist agent
///
/// The backend sends either a bare URL or an object; both decode here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "ImageWire")]
pub struct ArticleImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageWire {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl From<ImageWire> for ArticleImage {
    fn from(wire: ImageWire) -> Self {
        match wire {
            ImageWire::Url(url) => ArticleImage {
                url,
                alt: None,
                caption: None,
            },
            ImageWire::Detailed { url, alt, caption } => ArticleImage { url, alt, caption },
        }
    }
}

/// The terminal, displayable result of a session
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalArticle {
    #[serde(default)]
    pub title: String,
    /// Markdown body. Never a bare JSON object or array.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<ArticleImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_meta: Option<SeoMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_review: Option<QualityReview>,
}
