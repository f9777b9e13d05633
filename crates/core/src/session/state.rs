//! # Session State
//!
//! One generation request's state and the reducer that is its only mutator.
//! Stage, progress and the generating flag are derived from the lifecycle
//! phase and the final article's validity, so they cannot disagree.

use crate::content::is_valid_article;
use crate::models::FinalArticle;
use crate::pipeline::{Stage, StageTracker, MAX_PROGRESS};
use crate::stream::StreamEvent;
use serde::{Deserialize, Serialize};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Reading the stream
    Streaming,
    /// `done` received
    Finished,
    /// Backend or transport failure
    Failed,
    /// Abandoned by the caller
    Cancelled,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

/// What the hosting surface should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionView {
    Idle,
    Generating,
    Preview,
    /// Finished, but the payload held nothing presentable
    NoArticle,
    Failed,
    Cancelled,
}

/// A single state transition
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// Generation requested: clears the log, stage back to research
    Start,
    /// Agent event from the stream
    Event(StreamEvent),
    /// Synthetic hand-off line; appended without touching the tracker
    Narration(StreamEvent),
    /// Terminal article
    Done(FinalArticle),
    /// Backend-reported or transport failure, surfaced verbatim
    Failed(String),
    Cancelled,
    /// A saved article handed in by the host
    Loaded(FinalArticle),
    /// User restart: back to idle
    Reset,
}

/// State of one generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSession {
    events: Vec<StreamEvent>,
    tracker: StageTracker,
    phase: SessionPhase,
    final_article: Option<FinalArticle>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update
    pub fn reduce(mut self, update: SessionUpdate) -> Self {
        match update {
            SessionUpdate::Start => {
                return Self {
                    tracker: StageTracker::started(),
                    phase: SessionPhase::Streaming,
                    ..Self::default()
                }
            }
            SessionUpdate::Reset => return Self::default(),
            SessionUpdate::Loaded(article) => {
                self.final_article = Some(article);
                return self;
            }
            _ => {}
        }

        if self.phase != SessionPhase::Streaming {
            tracing::debug!(phase = ?self.phase, "Ignoring update outside an active stream");
            return self;
        }

        match update {
            SessionUpdate::Event(event) => {
                self.tracker = self.tracker.advance(&event.agent_id);
                self.events.push(event);
            }
            SessionUpdate::Narration(event) => self.events.push(event),
            SessionUpdate::Done(article) => {
                self.tracker = self.tracker.complete();
                self.final_article = Some(article);
                self.phase = SessionPhase::Finished;
            }
            SessionUpdate::Failed(message) => {
                self.events.push(StreamEvent::error(message));
                self.phase = SessionPhase::Failed;
            }
            SessionUpdate::Cancelled => self.phase = SessionPhase::Cancelled,
            SessionUpdate::Start | SessionUpdate::Reset | SessionUpdate::Loaded(_) => {}
        }
        self
    }

    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn final_article(&self) -> Option<&FinalArticle> {
        self.final_article.as_ref()
    }

    /// The final article, only if it passes the validity gate
    pub fn presentable_article(&self) -> Option<&FinalArticle> {
        self.final_article.as_ref().filter(|a| is_valid_article(a))
    }

    pub fn has_valid_article(&self) -> bool {
        self.presentable_article().is_some()
    }

    pub fn stage(&self) -> Stage {
        if self.has_valid_article() {
            Stage::Complete
        } else {
            self.tracker.stage
        }
    }

    pub fn progress(&self) -> u8 {
        if self.has_valid_article() {
            MAX_PROGRESS
        } else {
            self.tracker.progress
        }
    }

    pub fn is_generating(&self) -> bool {
        self.phase == SessionPhase::Streaming && !self.has_valid_article()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn view(&self) -> SessionView {
        if self.has_valid_article() {
            return SessionView::Preview;
        }
        match self.phase {
            SessionPhase::Idle => SessionView::Idle,
            SessionPhase::Streaming => SessionView::Generating,
            SessionPhase::Finished => SessionView::NoArticle,
            SessionPhase::Failed => SessionView::Failed,
            SessionPhase::Cancelled => SessionView::Cancelled,
        }
    }

    /// Last error surfaced in the log, if any
    pub fn last_error(&self) -> Option<&str> {
        self.events
            .iter()
            .rev()
            .find(|e| e.is_error())
            .and_then(|e| e.message.as_deref())
    }

    /// Observable fields, as delivered to hosts
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            stage: self.stage(),
            progress: self.progress(),
            events: self.events.clone(),
            final_article: self.final_article.clone(),
            is_generating: self.is_generating(),
            view: self.view(),
        }
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub stage: Stage,
    pub progress: u8,
    pub events: Vec<StreamEvent>,
    pub final_article: Option<FinalArticle>,
    pub is_generating: bool,
    pub view: SessionView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::AgentId;

    fn agent_event(agent: AgentId) -> SessionUpdate {
        SessionUpdate::Event(StreamEvent::log(agent, "working"))
    }

    fn article(content: &str) -> FinalArticle {
        FinalArticle {
            content: content.to_string(),
            ..FinalArticle::default()
        }
    }

    #[test]
    fn test_start_resets_session() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(agent_event(AgentId::Writer))
            .reduce(SessionUpdate::Start);

        assert!(session.events().is_empty());
        assert_eq!(session.stage(), Stage::Research);
        assert_eq!(session.progress(), 0);
        assert!(session.is_generating());
        assert_eq!(session.view(), SessionView::Generating);
    }

    #[test]
    fn test_events_drive_tracker() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(agent_event(AgentId::Researcher))
            .reduce(agent_event(AgentId::Artist))
            .reduce(agent_event(AgentId::Writer));

        assert_eq!(session.events().len(), 3);
        assert_eq!(session.stage(), Stage::Visualizing);
        assert_eq!(session.progress(), 80);
    }

    #[test]
    fn test_done_forces_complete_even_without_article() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(SessionUpdate::Done(article("  ")));

        assert_eq!(session.stage(), Stage::Complete);
        assert_eq!(session.progress(), 100);
        assert!(!session.is_generating());
        assert!(session.presentable_article().is_none());
        assert_eq!(session.view(), SessionView::NoArticle);
    }

    #[test]
    fn test_error_is_terminal() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(SessionUpdate::Failed("quota exceeded".to_string()))
            .reduce(agent_event(AgentId::Writer))
            .reduce(SessionUpdate::Done(article("late")));

        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.last_error(), Some("quota exceeded"));
        assert!(session.final_article().is_none());
        assert_eq!(session.view(), SessionView::Failed);
    }

    #[test]
    fn test_updates_before_start_are_ignored() {
        let session = StreamSession::new().reduce(agent_event(AgentId::Writer));
        assert!(session.events().is_empty());
        assert_eq!(session.stage(), Stage::Input);
    }

    #[test]
    fn test_valid_article_means_not_generating() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(SessionUpdate::Loaded(article("Saved body")));

        assert!(!session.is_generating());
        assert_eq!(session.stage(), Stage::Complete);
        assert_eq!(session.progress(), 100);
        assert_eq!(session.view(), SessionView::Preview);
    }

    #[test]
    fn test_cancel_and_reset() {
        let session = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(SessionUpdate::Cancelled);
        assert_eq!(session.view(), SessionView::Cancelled);
        assert!(!session.is_generating());

        let session = session.reduce(SessionUpdate::Reset);
        assert_eq!(session, StreamSession::default());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = StreamSession::new()
            .reduce(SessionUpdate::Start)
            .reduce(agent_event(AgentId::Strategist))
            .snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["stage"], "strategy");
        assert_eq!(json["progress"], 40);
        assert_eq!(json["isGenerating"], true);
        assert_eq!(json["view"], "generating");
        assert!(json["finalArticle"].is_null());
    }
}
