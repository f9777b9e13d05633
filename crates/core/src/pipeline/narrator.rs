//! # Transition Narrator
//!
//! Synthesizes a hand-off log line each time the session moves between
//! agent stages. Cosmetic only: the session treats narration like any other
//! log entry and nothing downstream reads it.

use super::stage::Stage;
use crate::models::UiLanguage;
use crate::stream::{AgentId, StreamEvent};

/// Remembers the last stage it saw and narrates changes
#[derive(Debug, Clone)]
pub struct Narrator {
    language: UiLanguage,
    last_seen: Stage,
}

impl Narrator {
    pub fn new(language: UiLanguage) -> Self {
        Self {
            language,
            last_seen: Stage::Input,
        }
    }

    pub fn language(&self) -> UiLanguage {
        self.language
    }

    /// Forget the last-seen stage, e.g. when the session restarts
    pub fn reset(&mut self) {
        self.last_seen = Stage::Input;
    }

    /// Observe the session's current stage
    ///
    /// Returns a hand-off event at most once per change. Leaving `input`
    /// and arriving at `complete` are silent.
    pub fn observe(&mut self, stage: Stage) -> Option<StreamEvent> {
        let previous = std::mem::replace(&mut self.last_seen, stage);
        if previous == stage || previous == Stage::Input || stage == Stage::Complete {
            return None;
        }

        let agent = stage.agent().unwrap_or(AgentId::Tracker);
        Some(StreamEvent::log(agent, handoff_message(self.language, previous, stage)))
    }
}

fn role_name(language: UiLanguage, stage: Stage) -> &'static str {
    match (language, stage) {
        (UiLanguage::En, Stage::Research) => "Researcher",
        (UiLanguage::En, Stage::Strategy) => "Strategist",
        (UiLanguage::En, Stage::Writing) => "Writer",
        (UiLanguage::En, Stage::Visualizing) => "Artist",
        (UiLanguage::En, _) => "Coordinator",
        (UiLanguage::Zh, Stage::Research) => "研究员",
        (UiLanguage::Zh, Stage::Strategy) => "策略师",
        (UiLanguage::Zh, Stage::Writing) => "撰稿人",
        (UiLanguage::Zh, Stage::Visualizing) => "插画师",
        (UiLanguage::Zh, _) => "协调员",
    }
}

fn deliverable(language: UiLanguage, stage: Stage) -> &'static str {
    match (language, stage) {
        (UiLanguage::En, Stage::Research) => "research findings",
        (UiLanguage::En, Stage::Strategy) => "the content strategy",
        (UiLanguage::En, Stage::Writing) => "the draft",
        (UiLanguage::En, _) => "the work so far",
        (UiLanguage::Zh, Stage::Research) => "调研结果",
        (UiLanguage::Zh, Stage::Strategy) => "内容策略",
        (UiLanguage::Zh, Stage::Writing) => "文章初稿",
        (UiLanguage::Zh, _) => "当前成果",
    }
}

fn handoff_message(language: UiLanguage, from: Stage, to: Stage) -> String {
    let sender = role_name(language, from);
    let receiver = role_name(language, to);
    let work = deliverable(language, from);
    match language {
        UiLanguage::En => format!("{} hands {} over to {}.", sender, work, receiver),
        UiLanguage::Zh => format!("{}已将{}交给{}。", sender, work, receiver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::EventKind;

    #[test]
    fn test_leaving_input_is_silent() {
        let mut narrator = Narrator::new(UiLanguage::En);
        assert!(narrator.observe(Stage::Research).is_none());
    }

    #[test]
    fn test_handoff_fires_once_per_change() {
        let mut narrator = Narrator::new(UiLanguage::En);
        narrator.observe(Stage::Research);

        let event = narrator.observe(Stage::Strategy).unwrap();
        assert_eq!(event.kind, EventKind::Log);
        assert_eq!(event.agent_id, AgentId::Strategist);
        assert_eq!(
            event.message.as_deref(),
            Some("Researcher hands research findings over to Strategist.")
        );

        assert!(narrator.observe(Stage::Strategy).is_none());
    }

    #[test]
    fn test_arriving_at_complete_is_silent() {
        let mut narrator = Narrator::new(UiLanguage::En);
        narrator.observe(Stage::Research);
        narrator.observe(Stage::Writing);
        assert!(narrator.observe(Stage::Complete).is_none());
    }

    #[test]
    fn test_localized_handoff() {
        let mut narrator = Narrator::new(UiLanguage::Zh);
        narrator.observe(Stage::Writing);
        let event = narrator.observe(Stage::Visualizing).unwrap();
        assert_eq!(event.message.as_deref(), Some("撰稿人已将文章初稿交给插画师。"));
    }

    #[test]
    fn test_reset_forgets_last_stage() {
        let mut narrator = Narrator::new(UiLanguage::En);
        narrator.observe(Stage::Writing);
        narrator.reset();
        assert!(narrator.observe(Stage::Research).is_none());
    }
}
