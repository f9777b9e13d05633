//! # Stream Protocol
//!
//! Wire-level pieces of the generation stream.
//!
//! ```text
//! bytes ─▶ LineFramer ─▶ "data: {...}" frames ─▶ Envelope { Event | Done | Error }
//! ```

pub mod envelope;
pub mod events;
pub mod framer;

pub use envelope::{Envelope, EnvelopeType, RawEnvelope, TerminalPayload};
pub use events::{AgentId, EventKind, StreamEvent, Timestamp};
pub use framer::{frames, LineFramer, EVENT_PREFIX, MAX_LINE_BYTES};
