//! # Scribe Core
//!
//! The "Brain" of Scribe - reads the streamed output of a multi-agent
//! article backend and reconstructs one coherent article from it.
//!
//! ## Architecture
//!
//! - `stream/` - Line framing and envelope decoding
//! - `pipeline/` - Stage tracking and hand-off narration
//! - `content/` - Payload normalization and the validity gate
//! - `session/` - Session reducer and frame router
//! - `client` - HTTP driver with cancellation
//! - `config` - Client configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_core::{ClientConfig, GenerationClient, GenerationRequest};
//!
//! let client = GenerationClient::new(ClientConfig::from_env()?)?;
//! let mut handle = client.start_generation(GenerationRequest::new("green tea"))?;
//! while let Some(session) = handle.updates.recv().await {
//!     println!("{}% {}", session.progress(), session.stage());
//! }
//! let session = handle.finish().await?;
//! ```

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod stream;

pub use client::{consume_stream, GenerationClient, GenerationHandle};
pub use config::ClientConfig;
pub use error::{GenerationError, ProtocolError};
pub use models::{FinalArticle, GenerationRequest, UiLanguage};
pub use session::{EventRouter, SessionView, StreamSession};
