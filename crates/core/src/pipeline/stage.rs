//! # Pipeline Stages
//!
//! Coarse phases of a generation and the agent → (stage, progress) table.

use crate::stream::AgentId;
use serde::{Deserialize, Serialize};

/// Stage of the pipeline
///
/// Declaration order is the only legal direction of travel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for the user to submit a request
    #[default]
    Input,
    /// Researcher gathering sources
    Research,
    /// Strategist shaping the outline
    Strategy,
    /// Writer drafting the body
    Writing,
    /// Artist producing images
    Visualizing,
    /// Article delivered
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Research => "research",
            Self::Strategy => "strategy",
            Self::Writing => "writing",
            Self::Visualizing => "visualizing",
            Self::Complete => "complete",
        }
    }

    /// Agent that owns this stage, if any
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            Self::Research => Some(AgentId::Researcher),
            Self::Strategy => Some(AgentId::Strategist),
            Self::Writing => Some(AgentId::Writer),
            Self::Visualizing => Some(AgentId::Artist),
            Self::Input | Self::Complete => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MAX_PROGRESS: u8 = 100;

/// Stage and minimum progress an agent's activity implies
fn milestone(agent: &AgentId) -> Option<(Stage, u8)> {
    match agent {
        AgentId::Researcher => Some((Stage::Research, 20)),
        AgentId::Strategist => Some((Stage::Strategy, 40)),
        AgentId::Writer => Some((Stage::Writing, 60)),
        AgentId::Artist => Some((Stage::Visualizing, 80)),
        AgentId::Tracker | AgentId::Unknown(_) => None,
    }
}

/// Monotonic stage/progress state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageTracker {
    pub stage: Stage,
    pub progress: u8,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// State at the moment a generation starts
    pub fn started() -> Self {
        Self {
            stage: Stage::Research,
            progress: 0,
        }
    }

    /// Fold one agent event into the state
    ///
    /// Only ever raises stage and progress; unknown agents are a no-op.
    pub fn advance(self, agent: &AgentId) -> Self {
        match milestone(agent) {
            Some((stage, floor)) => Self {
                stage: self.stage.max(stage),
                progress: self.progress.max(floor),
            },
            None => self,
        }
    }

    /// Terminal `done`: bypasses the table entirely
    pub fn complete(self) -> Self {
        Self {
            stage: Stage::Complete,
            progress: MAX_PROGRESS,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }
}
