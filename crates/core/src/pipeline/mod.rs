//! # Generation Pipeline
//!
//! Client-side view of the backend agent pipeline.
//!
//! ```text
//! input → research → strategy → writing → visualizing → complete
//! ```

pub mod narrator;
pub mod stage;

pub use narrator::Narrator;
pub use stage::{Stage, StageTracker, MAX_PROGRESS};
