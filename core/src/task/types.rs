use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transitions::{StateTransition, TransitionError};
use crate::generation::{GenerationMode, ProviderKind};
use crate::provider::ResultLocator;
use crate::store::StoredArtifact;

/// Lifecycle of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Accepted upstream, not polled yet
    Submitted,
    /// Polling in progress
    Processing,
    Success,
    Failure,
    /// Attempt budget exhausted
    Timeout,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Timeout => "TIMEOUT",
        }
    }

    pub fn is_terminal(self) -> bool {
        StateTransition::is_terminal(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub provider: ProviderKind,
    pub mode: GenerationMode,
    pub created_at: DateTime<Utc>,
    pub state: TaskState,
    pub attempts: u32,
    pub result_locators: Vec<ResultLocator>,
    pub artifacts: Vec<StoredArtifact>,
    #[serde(skip)]
    retrieved: BTreeSet<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, provider: ProviderKind, mode: GenerationMode) -> Self {
        Self {
            id: id.into(),
            provider,
            mode,
            created_at: Utc::now(),
            state: TaskState::Submitted,
            attempts: 0,
            result_locators: Vec::new(),
            artifacts: Vec::new(),
            retrieved: BTreeSet::new(),
            error: None,
            finished_at: None,
        }
    }

    /// Move to `to`, refusing anything out of a terminal state.
    pub fn transition(&mut self, to: TaskState) -> Result<(), TransitionError> {
        StateTransition::validate(self.state, to)?;
        self.state = to;
        if to.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Record poll `attempt`. A terminal task is left untouched.
    pub fn begin_attempt(&mut self, attempt: u32) -> Result<(), TransitionError> {
        self.transition(TaskState::Processing)?;
        self.attempts = attempt;
        Ok(())
    }

    /// Claim output `index` for retrieval. Returns false if it was claimed before.
    pub fn claim_output(&mut self, index: usize) -> bool {
        self.retrieved.insert(index)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
