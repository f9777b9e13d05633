//! # Event Router
//!
//! Decodes frames and dispatches them into the session: `event` frames feed
//! the tracker (and, through stage changes, the narrator), `done` frames go
//! through the normalizer and validity gate, `error` frames end the session.

use super::state::{SessionUpdate, StreamSession};
use crate::content::normalize;
use crate::models::UiLanguage;
use crate::pipeline::Narrator;
use crate::stream::Envelope;

/// Turn one frame into a session update
///
/// Malformed frames are skipped with a warning and yield `None`.
pub fn route_frame(frame: &str) -> Option<SessionUpdate> {
    match Envelope::decode(frame) {
        Ok(Envelope::Event(event)) => Some(SessionUpdate::Event(event)),
        Ok(Envelope::Done(payload)) => {
            let article = normalize(payload).into_article();
            if !article.is_presentable() {
                tracing::warn!("Terminal payload held no presentable article");
            }
            Some(SessionUpdate::Done(article))
        }
        Ok(Envelope::Error { message }) => {
            tracing::warn!(%message, "Backend reported an error");
            Some(SessionUpdate::Failed(message))
        }
        Err(e) => {
            tracing::warn!(error = %e, frame = %preview(frame), "Skipping malformed frame");
            None
        }
    }
}

fn preview(frame: &str) -> String {
    const LIMIT: usize = 120;
    if frame.chars().count() <= LIMIT {
        frame.to_string()
    } else {
        let head: String = frame.chars().take(LIMIT).collect();
        format!("{}…", head)
    }
}

/// Owns the session and narrator for one surface
#[derive(Debug, Clone)]
pub struct EventRouter {
    session: StreamSession,
    narrator: Narrator,
}

impl EventRouter {
    pub fn new(language: UiLanguage) -> Self {
        Self {
            session: StreamSession::new(),
            narrator: Narrator::new(language),
        }
    }

    /// Begin a fresh generation
    pub fn start(&mut self) {
        self.narrator.reset();
        self.apply(SessionUpdate::Start);
    }

    /// Apply an update, then let the narrator react to any stage change
    pub fn apply(&mut self, update: SessionUpdate) {
        self.session = std::mem::take(&mut self.session).reduce(update);
        if let Some(handoff) = self.narrator.observe(self.session.stage()) {
            self.session = std::mem::take(&mut self.session).reduce(SessionUpdate::Narration(handoff));
        }
    }

    /// Decode and apply one frame; returns whether the session was touched
    pub fn dispatch(&mut self, frame: &str) -> bool {
        match route_frame(frame) {
            Some(update) => {
                self.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn into_session(self) -> StreamSession {
        self.session
    }
}
