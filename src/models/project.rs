use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked improvement/automation request as returned by the API.
///
/// Identity, priority, the gain estimates and the timestamps are owned by
/// the server and are never sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub department: String,
    pub requester: String,
    pub description: String,
    pub status: ProjectStatus,
    pub goal: String,
    pub impact_stakeholders: bool,
    pub complexity: Complexity,
    pub monthly_requests: u32,
    pub average_time_spent: f64,
    pub monthly_minutes_saved: f64,
    pub financial_gain: String,
    pub range_of_gain: String,
    pub priority_level: f64,
    pub request_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Backlog,
    Declined,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Backlog,
        ProjectStatus::InProgress,
        ProjectStatus::Declined,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Backlog => "Backlog",
            ProjectStatus::Declined => "Declined",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::OnHold => "On Hold",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    High,
    Medium,
    Low,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::High, Complexity::Medium, Complexity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::High => "High",
            Complexity::Medium => "Medium",
            Complexity::Low => "Low",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
