use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Triage state of an incident.
///
/// The wire form is `pending` / `in-progress` / `resolved`. The legacy spellings
/// `open` and `in_progress` are accepted on input and never produced on output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IncidentStatus {
    #[default]
    #[serde(rename = "pending", alias = "open")]
    Pending,
    #[serde(rename = "in-progress", alias = "in_progress")]
    InProgress,
    #[serde(rename = "resolved")]
    Resolved,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" | "open" => Ok(Self::Pending),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(AppError::validation(
                "Status must be one of: pending, in-progress, resolved",
            )
            .with_details(format!("status={other}"))),
        }
    }
}

/// A reported incident as stored by the backend and shown in the panel.
///
/// `date` is the RFC3339 UTC report time and never changes after creation.
/// `resolved_at` is stamped by storage the first time the status becomes resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    pub project: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub status: IncidentStatus,
    pub date: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

/// Fields supplied by a reporting application when it creates an incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    pub project: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub status: IncidentStatus,
    /// Canonical RFC3339 UTC; `None` means "now".
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
}

/// Partial update applied by the operator. Absent fields are left untouched and are
/// omitted from the serialized body.
///
/// `comments` replaces the stored note; it is never appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(
        default,
        alias = "internalComment",
        skip_serializing_if = "Option::is_none"
    )]
    pub comments: Option<String>,
}

impl IncidentPatch {
    pub fn status(status: IncidentStatus) -> Self {
        Self {
            status: Some(status),
            comments: None,
        }
    }

    pub fn comments(comments: impl Into<String>) -> Self {
        Self {
            status: None,
            comments: Some(comments.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.comments.is_none()
    }
}
