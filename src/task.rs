//! Task entity and its lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Delivery,
    Cleaning,
    Handyman,
    Moving,
    Beauty,
    TechSupport,
    Tutoring,
    PetCare,
    Transportation,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 10] = [
        TaskCategory::Delivery,
        TaskCategory::Cleaning,
        TaskCategory::Handyman,
        TaskCategory::Moving,
        TaskCategory::Beauty,
        TaskCategory::TechSupport,
        TaskCategory::Tutoring,
        TaskCategory::PetCare,
        TaskCategory::Transportation,
        TaskCategory::Other,
    ];

    /// Wire name, as used in query strings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Cleaning => "cleaning",
            Self::Handyman => "handyman",
            Self::Moving => "moving",
            Self::Beauty => "beauty",
            Self::TechSupport => "tech_support",
            Self::Tutoring => "tutoring",
            Self::PetCare => "pet_care",
            Self::Transportation => "transportation",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Delivery => "Delivery & Courier",
            Self::Cleaning => "Cleaning Services",
            Self::Handyman => "Handyman & Repairs",
            Self::Moving => "Moving & Lifting",
            Self::Beauty => "Beauty & Wellness",
            Self::TechSupport => "Tech Support",
            Self::Tutoring => "Tutoring & Teaching",
            Self::PetCare => "Pet Care",
            Self::Transportation => "Transportation",
            Self::Other => "Other Services",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Delivery => "🚚",
            Self::Cleaning => "🧽",
            Self::Handyman => "🔧",
            Self::Moving => "📦",
            Self::Beauty => "💄",
            Self::TechSupport => "💻",
            Self::Tutoring => "📚",
            Self::PetCare => "🐕",
            Self::Transportation => "🚗",
            Self::Other => "⚡",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    Scheduled,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Normal, Priority::Urgent, Priority::Scheduled];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Urgent => "Urgent",
            Self::Scheduled => "Scheduled",
        }
    }
}

/// Task lifecycle state.
///
/// `posted → accepted → in_progress → completed`, with `cancelled` reachable
/// from every non-terminal state. `disputed` branches off `in_progress` and
/// resolves to `completed` or `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Posted,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        }
    }

    /// Upper-case badge text, e.g. `IN PROGRESS`.
    pub fn label(self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub const fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Posted, Self::Accepted)
            | (Self::Accepted, Self::InProgress)
            | (Self::InProgress, Self::Completed)
            | (Self::InProgress, Self::Disputed)
            | (Self::Disputed, Self::Completed) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
}

/// A rejected lifecycle transition.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("task cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub client_id: UserId,
    #[serde(default)]
    pub tasker_id: Option<UserId>,
    pub location: Location,
    pub budget_min: f64,
    pub budget_max: f64,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, with = "timestamp::option")]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds the stored form of a freshly created task.
    pub fn posted(id: TaskId, new: NewTask, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            client_id: new.client_id,
            tasker_id: None,
            location: new.location,
            budget_min: new.budget_min,
            budget_max: new.budget_max,
            status: TaskStatus::Posted,
            priority: new.priority,
            estimated_duration: new.estimated_duration,
            required_skills: new.required_skills,
            images: Vec::new(),
            scheduled_time: None,
            accepted_at: None,
            started_at: None,
            completed_at: None,
            created_at,
        }
    }

    fn transition(&mut self, to: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn accept(&mut self, tasker: UserId, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Accepted)?;
        self.tasker_id = Some(tasker);
        self.accepted_at = Some(at);
        Ok(())
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::InProgress)?;
        self.started_at = Some(at);
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Completed)?;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Cancelled)
    }

    pub fn budget_range(&self) -> String {
        format!("${} - ${}", self.budget_min, self.budget_max)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("description must not be empty")]
    EmptyDescription,

    #[error("{field} must be a number, got '{value}'")]
    InvalidBudget { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NonPositiveBudget { field: &'static str },

    #[error("minimum budget {min} exceeds maximum budget {max}")]
    InvertedBudget { min: f64, max: f64 },

    #[error("estimated duration must be a positive number of minutes, got '{0}'")]
    InvalidDuration(String),
}

/// What a client fills in before a task exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub budget_min: f64,
    pub budget_max: f64,
    pub priority: Priority,
    pub estimated_duration: Option<u32>,
    pub location: Location,
}

impl TaskDraft {
    /// Checks the draft and tags it with the posting client.
    pub fn submit(self, client_id: UserId) -> Result<NewTask, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(DraftError::EmptyDescription);
        }
        for (field, value) in [("budget_min", self.budget_min), ("budget_max", self.budget_max)] {
            if !value.is_finite() {
                return Err(DraftError::InvalidBudget {
                    field,
                    value: value.to_string(),
                });
            }
            if value <= 0.0 {
                return Err(DraftError::NonPositiveBudget { field });
            }
        }
        if self.budget_min > self.budget_max {
            return Err(DraftError::InvertedBudget {
                min: self.budget_min,
                max: self.budget_max,
            });
        }
        if self.estimated_duration == Some(0) {
            return Err(DraftError::InvalidDuration("0".to_string()));
        }

        Ok(NewTask {
            title: title.to_string(),
            description: description.to_string(),
            category: self.category,
            client_id,
            location: self.location,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            priority: self.priority,
            estimated_duration: self.estimated_duration,
            required_skills: Vec::new(),
        })
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub client_id: UserId,
    pub location: Location,
    pub budget_min: f64,
    pub budget_max: f64,
    pub priority: Priority,
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 in UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
                None => Ok(None),
            }
        }
    }
}
