//! Problem tracking
//!
//! A problem is a check-in with `has_problem` set. Its status is never stored
//! on the check-in: it is derived on every read from the append-only status
//! event log. The current status is the one carried by the last event
//! appended for that problem, whatever its `updated_at` says. No event at all
//! means pending.

use crate::error::{Error, Result};
use crate::forms::ValidationError;
use crate::model::{CheckIn, ProblemStatus, ProblemStatusEvent};
use crate::store::Store;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current status of one problem
pub fn resolve_status(problem_id: &str, events: &[ProblemStatusEvent]) -> ProblemStatus {
    latest_event(problem_id, events)
        .map(|e| e.status)
        .unwrap_or(ProblemStatus::Pending)
}

/// Last event appended for a problem, if any
pub fn latest_event<'a>(
    problem_id: &str,
    events: &'a [ProblemStatusEvent],
) -> Option<&'a ProblemStatusEvent> {
    events.iter().rfind(|e| e.problem_id == problem_id)
}

/// Every event recorded for a problem, in log order
pub fn history<'a>(problem_id: &str, events: &'a [ProblemStatusEvent]) -> Vec<&'a ProblemStatusEvent> {
    events.iter().filter(|e| e.problem_id == problem_id).collect()
}

/// Current status of every problem that has at least one event, in one pass
pub fn current_statuses(events: &[ProblemStatusEvent]) -> HashMap<&str, &ProblemStatusEvent> {
    let mut latest: HashMap<&str, &ProblemStatusEvent> = HashMap::new();
    for event in events {
        latest.insert(event.problem_id.as_str(), event);
    }
    latest
}

/// A reported problem together with its derived status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedProblem {
    pub checkin: CheckIn,
    pub status: ProblemStatus,
    /// Note of the deciding event, when it has one
    pub resolution_note: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

/// Problems reported in check-ins whose current status is in `filter`.
/// An empty filter keeps every problem. Check-in order is preserved.
pub fn list_problems(
    checkins: &[CheckIn],
    events: &[ProblemStatusEvent],
    filter: &[ProblemStatus],
) -> Vec<TrackedProblem> {
    let latest = current_statuses(events);

    checkins
        .iter()
        .filter(|c| c.has_problem)
        .map(|c| {
            let deciding = latest.get(c.id.as_str());
            TrackedProblem {
                checkin: c.clone(),
                status: deciding.map(|e| e.status).unwrap_or(ProblemStatus::Pending),
                resolution_note: deciding
                    .map(|e| e.resolution_note.clone())
                    .filter(|n| !n.is_empty()),
                last_updated: deciding.map(|e| e.updated_at),
            }
        })
        .filter(|p| filter.is_empty() || filter.contains(&p.status))
        .collect()
}

/// Status change as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateForm {
    pub problem_id: String,
    pub status: ProblemStatus,
    #[serde(default)]
    pub resolution_note: Option<String>,
}

impl StatusUpdateForm {
    /// Build the event to append. The id must name a check-in that reported a
    /// problem; a resolution note is only kept on `resolved`.
    pub fn validate(self, checkins: &[CheckIn], now: DateTime<Local>) -> Result<ProblemStatusEvent> {
        let problem_id = self.problem_id.trim();
        let checkin = checkins
            .iter()
            .find(|c| c.id == problem_id)
            .ok_or_else(|| Error::NotFound {
                entity: "problem",
                id: problem_id.to_string(),
            })?;

        if !checkin.has_problem {
            return Err(ValidationError::NotAProblem(checkin.id.clone()).into());
        }

        let resolution_note = match self.status {
            ProblemStatus::Resolved => self
                .resolution_note
                .map(|n| n.trim().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };

        Ok(ProblemStatusEvent {
            problem_id: checkin.id.clone(),
            status: self.status,
            resolution_note,
            updated_at: now,
        })
    }
}

/// Append a status event for a reported problem
pub fn update_status(store: &Store, form: StatusUpdateForm) -> Result<ProblemStatusEvent> {
    let checkins = store.checkins()?;
    let event = form.validate(&checkins, Local::now()).inspect_err(|e| {
        tracing::warn!(error = %e, "status update rejected");
    })?;
    store.append(&event)?;
    tracing::info!(problem = %event.problem_id, status = %event.status, "problem status updated");
    Ok(event)
}
