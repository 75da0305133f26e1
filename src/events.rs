//! Completion events
//!
//! Services emit an event after a committed change flips a plan or goal to
//! completed. Delivery (notifications, UI refresh) is up to the sink; the
//! ledger only guarantees each completion is emitted once.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GoalId, Money, PlanId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    PlanCompleted {
        plan_id: PlanId,
        name: String,
        amount: Money,
        completed_at: DateTime<Utc>,
    },
    GoalCompleted {
        goal_id: GoalId,
        name: String,
        amount: Money,
        completed_at: DateTime<Utc>,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::PlanCompleted { name, .. } | Self::GoalCompleted { name, .. } => name,
        }
    }
}

/// Receiver of ledger events.
///
/// `emit` runs after the change is durable and must not fail the request.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LedgerEvent);
}

/// Discards every event
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: LedgerEvent) {}
}

/// Writes events to the tracing log
#[derive(Debug, Clone, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: LedgerEvent) {
        match &event {
            LedgerEvent::PlanCompleted { plan_id, name, amount, .. } => {
                tracing::info!(plan = %plan_id, %name, %amount, "plan completed")
            }
            LedgerEvent::GoalCompleted { goal_id, name, amount, .. } => {
                tracing::info!(goal = %goal_id, %name, %amount, "goal completed")
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
