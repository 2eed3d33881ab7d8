use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The three stages of the pipeline, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Extract,
    Load,
    Transform,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Extract, StageKind::Load, StageKind::Transform];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Extract => "extract",
            StageKind::Load => "load",
            StageKind::Transform => "transform",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            StageKind::Extract => 0,
            StageKind::Load => 1,
            StageKind::Transform => 2,
        }
    }

    /// Stages that must finish before this one may start.
    pub fn upstream(&self) -> &'static [StageKind] {
        match self {
            StageKind::Extract => &[],
            StageKind::Load => &[StageKind::Extract],
            StageKind::Transform => &[StageKind::Extract, StageKind::Load],
        }
    }

    pub fn trigger_rule(&self) -> TriggerRule {
        TriggerRule::AllSuccess
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage state machine: `Pending -> Running -> Succeeded | Failed`.
///
/// A `Failed` stage goes back to `Running` while its retry budget lasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Running { attempt: u32 },
    Succeeded { attempts: u32 },
    Failed { attempts: u32, error: String },
}

impl StageState {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, StageState::Succeeded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageState::Failed { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, StageState::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        }
    }
}

/// Predicate over upstream outcomes deciding whether a stage may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRule {
    AllSuccess,
}

impl TriggerRule {
    pub fn is_satisfied<'a, I>(&self, upstream: I) -> bool
    where
        I: IntoIterator<Item = &'a StageState>,
    {
        match self {
            TriggerRule::AllSuccess => upstream.into_iter().all(StageState::is_succeeded),
        }
    }
}

/// Fixed-delay retry budget applied to every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
        }
    }

    /// First try plus every retry.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts()
    }
}
