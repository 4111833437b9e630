//! Submission forms
//!
//! A form is what a person fills in (CLI flags, JSON body from the dashboard).
//! Validating a form either yields the immutable record to persist, stamped
//! with its id and creation time, or a [`ValidationError`] to show inline.
//! Nothing is written when validation fails.

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    CheckIn, Idea, IdeaCategory, IdeaStatus, Kudos, KudosCategory, Mood, ProblemKind, Urgency,
    Workload,
};
use crate::store::Store;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Why a submission was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identify yourself first")]
    MissingAuthor,

    #[error("'{0}' is not on the team roster")]
    NotOnRoster(String),

    #[error("'{0}' is not on the team roster and cannot receive kudos")]
    RecipientNotOnRoster(String),

    #[error("'{0}' is not one of the team's sites")]
    UnknownSite(String),

    #[error("'{0}' is not one of the team's roles")]
    UnknownRole(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("energy must be between 1 and 5, got {0}")]
    EnergyOutOfRange(u8),

    #[error("describe the problem please")]
    MissingProblemDescription,

    #[error("kudos must go to someone else")]
    SelfKudos,

    #[error("check-in {0} did not report a problem")]
    NotAProblem(String),
}

type Validated<T> = std::result::Result<T, ValidationError>;

/// Timestamp component of record ids
pub fn id_stamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Trimmed text, or None when blank
fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn required(text: &str, field: &'static str) -> Validated<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn identified(name: &str, config: &Config) -> Validated<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingAuthor);
    }
    if !config.is_member(name) {
        return Err(ValidationError::NotOnRoster(name.to_string()));
    }
    Ok(name.to_string())
}

/// Daily check-in as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInForm {
    pub author: String,
    pub site: String,
    pub role: String,
    /// Defaults to the submission day
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub mood: Mood,
    pub energy: u8,
    pub workload: Workload,
    #[serde(default)]
    pub has_problem: bool,
    #[serde(default)]
    pub problem_type: Option<ProblemKind>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub patient_impact: bool,
    #[serde(default)]
    pub win: Option<String>,
    #[serde(default)]
    pub help_needed: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CheckInForm {
    /// Validate and build the record to persist.
    ///
    /// Problem details are only kept when a problem is flagged; a flagged
    /// problem without type or urgency is filed as `other` / `low`.
    pub fn validate(self, config: &Config, now: DateTime<Local>) -> Validated<CheckIn> {
        let author = identified(&self.author, config)?;
        let site = required(&self.site, "site")?;
        if !config.is_site(&site) {
            return Err(ValidationError::UnknownSite(site));
        }
        let role = required(&self.role, "role")?;
        if !config.is_role(&role) {
            return Err(ValidationError::UnknownRole(role));
        }

        if !(1..=5).contains(&self.energy) {
            return Err(ValidationError::EnergyOutOfRange(self.energy));
        }

        let (problem_type, problem_description, urgency, patient_impact) = if self.has_problem {
            let description = non_blank(self.problem_description)
                .ok_or(ValidationError::MissingProblemDescription)?;
            (
                Some(self.problem_type.unwrap_or(ProblemKind::Other)),
                Some(description),
                Some(self.urgency.unwrap_or(Urgency::Low)),
                self.patient_impact,
            )
        } else {
            (None, None, None, false)
        };

        Ok(CheckIn {
            id: format!("{}_{}", author, id_stamp(&now)),
            author,
            site,
            role,
            date: self.date.unwrap_or_else(|| now.date_naive()),
            mood: self.mood,
            energy: self.energy,
            workload: self.workload,
            has_problem: self.has_problem,
            problem_type,
            problem_description,
            urgency,
            patient_impact,
            win: non_blank(self.win),
            help_needed: non_blank(self.help_needed),
            comment: non_blank(self.comment),
            created_at: now,
        })
    }
}

/// Kudos as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KudosForm {
    pub from: String,
    pub to: String,
    pub category: KudosCategory,
    pub message: String,
}

impl KudosForm {
    pub fn validate(self, config: &Config, now: DateTime<Local>) -> Validated<Kudos> {
        let from = identified(&self.from, config)?;
        let to = required(&self.to, "recipient")?;
        if to == from {
            return Err(ValidationError::SelfKudos);
        }
        if !config.is_member(&to) {
            return Err(ValidationError::RecipientNotOnRoster(to));
        }
        let message = required(&self.message, "message")?;

        Ok(Kudos {
            id: format!("kudos_{}", id_stamp(&now)),
            from,
            to,
            category: self.category,
            message,
            created_at: now,
        })
    }
}

/// Idea as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaForm {
    pub author: String,
    pub category: IdeaCategory,
    pub title: String,
    pub description: String,
}

impl IdeaForm {
    pub fn validate(self, config: &Config, now: DateTime<Local>) -> Validated<Idea> {
        let author = identified(&self.author, config)?;
        let title = required(&self.title, "title")?;
        let description = required(&self.description, "description")?;

        Ok(Idea {
            id: format!("idea_{}", id_stamp(&now)),
            author,
            category: self.category,
            title,
            description,
            created_at: now,
            status: IdeaStatus::New,
        })
    }
}

/// Validate a check-in and append it
pub fn submit_checkin(store: &Store, config: &Config, form: CheckInForm) -> Result<CheckIn> {
    let record = form.validate(config, Local::now()).inspect_err(|e| {
        tracing::warn!(error = %e, "check-in rejected");
    })?;
    store.append(&record)?;
    tracing::info!(id = %record.id, has_problem = record.has_problem, "check-in saved");
    Ok(record)
}

/// Validate kudos and append them
pub fn submit_kudos(store: &Store, config: &Config, form: KudosForm) -> Result<Kudos> {
    let record = form.validate(config, Local::now()).inspect_err(|e| {
        tracing::warn!(error = %e, "kudos rejected");
    })?;
    store.append(&record)?;
    tracing::info!(id = %record.id, to = %record.to, "kudos saved");
    Ok(record)
}

/// Validate an idea and append it
pub fn submit_idea(store: &Store, config: &Config, form: IdeaForm) -> Result<Idea> {
    let record = form.validate(config, Local::now()).inspect_err(|e| {
        tracing::warn!(error = %e, "idea rejected");
    })?;
    store.append(&record)?;
    tracing::info!(id = %record.id, "idea saved");
    Ok(record)
}
