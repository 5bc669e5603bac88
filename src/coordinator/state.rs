//! Coordinator lifecycle states

use serde::Serialize;
use std::fmt;

/// Where a coordinator is in its single run
///
/// `Idle → Loaded → Partitioned → Dispatched → AwaitingBarrier →
/// Aggregating → Done`, or `Failed` from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinatorState {
    Idle,
    Loaded,
    Partitioned,
    Dispatched,
    AwaitingBarrier,
    Aggregating,
    Done,
    Failed,
}

impl CoordinatorState {
    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, CoordinatorState::Done | CoordinatorState::Failed)
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Loaded => "loaded",
            CoordinatorState::Partitioned => "partitioned",
            CoordinatorState::Dispatched => "dispatched",
            CoordinatorState::AwaitingBarrier => "awaiting barrier",
            CoordinatorState::Aggregating => "aggregating",
            CoordinatorState::Done => "done",
            CoordinatorState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
