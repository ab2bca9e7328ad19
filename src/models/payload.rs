use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::models::{Complexity, ProjectStatus};

/// Body of `POST /project`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectData {
    pub name: String,
    pub department: String,
    pub requester: String,
    pub description: String,
    pub goal: String,
    pub impact_stakeholders: bool,
    pub complexity: Complexity,
    pub monthly_requests: u32,
    pub average_time_spent: f64,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub request_date: DateTime<Utc>,
}

/// Body of `PUT /project/{id}`. Same fields as creation plus the status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectData {
    #[serde(flatten)]
    pub fields: CreateProjectData,
    pub status: ProjectStatus,
}

// The API expects `2024-05-01T00:00:00.000Z`.
fn serialize_iso_millis<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> CreateProjectData {
        CreateProjectData {
            name: "Invoice OCR".into(),
            department: "Finance".into(),
            requester: "Dana".into(),
            description: "Read supplier invoices".into(),
            goal: "Reduce repetitive work".into(),
            impact_stakeholders: false,
            complexity: Complexity::Low,
            monthly_requests: 40,
            average_time_spent: 2.5,
            request_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn create_payload_matches_api_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Invoice OCR",
                "department": "Finance",
                "requester": "Dana",
                "description": "Read supplier invoices",
                "goal": "Reduce repetitive work",
                "impactStakeholders": false,
                "complexity": "Low",
                "monthlyRequests": 40,
                "averageTimeSpent": 2.5,
                "requestDate": "2024-05-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn update_payload_is_flat_and_carries_status() {
        let data = UpdateProjectData {
            fields: sample(),
            status: ProjectStatus::OnHold,
        };
        let value = serde_json::to_value(data).unwrap();

        assert_eq!(value["status"], "On Hold");
        assert_eq!(value["name"], "Invoice OCR");
        assert!(value.get("fields").is_none());
        assert!(value.get("priorityLevel").is_none());
        assert!(value.get("externalId").is_none());
    }
}
