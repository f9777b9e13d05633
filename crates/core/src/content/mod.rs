//! # Article Content
//!
//! Turns the terminal `done` payload into a [`FinalArticle`](crate::models::FinalArticle)
//! and decides whether it can be shown.

pub mod normalizer;
pub mod validity;

pub use normalizer::{
    normalize, normalize_value, strip_code_fence, ArticleMetadata, NormalizedContent, MAX_DEPTH,
};
pub use validity::{has_displayable_content, is_bare_json, is_valid_article};
