//! # Session
//!
//! Per-request state, the reducer that mutates it, and the router that feeds it.
//!
//! ```text
//! frame ─▶ route_frame ─▶ SessionUpdate ─▶ StreamSession::reduce ─▶ Narrator
//! ```

pub mod router;
pub mod state;

pub use router::{route_frame, EventRouter};
pub use state::{SessionPhase, SessionSnapshot, SessionUpdate, SessionView, StreamSession};
