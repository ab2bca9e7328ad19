use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::{Complexity, CreateProjectData, Project, ProjectStatus, UpdateProjectData};

/// Editable inputs of the project forms, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Department,
    Requester,
    Description,
    Goal,
    Status,
    ImpactStakeholders,
    Complexity,
    MonthlyRequests,
    AverageTimeSpent,
    RequestDate,
}

impl FormField {
    pub const CREATE: [FormField; 10] = [
        FormField::Name,
        FormField::Department,
        FormField::Requester,
        FormField::Description,
        FormField::Goal,
        FormField::ImpactStakeholders,
        FormField::Complexity,
        FormField::MonthlyRequests,
        FormField::AverageTimeSpent,
        FormField::RequestDate,
    ];

    pub const UPDATE: [FormField; 11] = [
        FormField::Name,
        FormField::Department,
        FormField::Requester,
        FormField::Description,
        FormField::Status,
        FormField::Goal,
        FormField::ImpactStakeholders,
        FormField::Complexity,
        FormField::MonthlyRequests,
        FormField::AverageTimeSpent,
        FormField::RequestDate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Project",
            FormField::Department => "Department",
            FormField::Requester => "Requester",
            FormField::Description => "Description",
            FormField::Goal => "Goal",
            FormField::Status => "Status",
            FormField::ImpactStakeholders => "Impacts Stakeholders",
            FormField::Complexity => "Complexity",
            FormField::MonthlyRequests => "Monthly Requests",
            FormField::AverageTimeSpent => "Average Time Spent (min)",
            FormField::RequestDate => "Request Date",
        }
    }
}

/// One message per failing field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_field(&self) -> Option<FormField> {
        self.0.keys().next().copied()
    }

    pub fn clear(&mut self, field: FormField) {
        self.0.remove(&field);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Raw form values before validation.
///
/// Numbers are kept as typed so a bad entry can be reported instead of
/// silently becoming zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub department: String,
    pub requester: String,
    pub description: String,
    pub goal: String,
    pub status: Option<ProjectStatus>,
    pub impact_stakeholders: Option<bool>,
    pub complexity: Option<Complexity>,
    pub monthly_requests: String,
    pub average_time_spent: String,
    pub request_date: Option<NaiveDate>,
    /// Timestamp of the record being edited. Sent back as is while the
    /// chosen day is unchanged.
    pub stored_request_date: Option<DateTime<Utc>>,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            department: String::new(),
            requester: String::new(),
            description: String::new(),
            goal: String::new(),
            status: None,
            impact_stakeholders: None,
            complexity: None,
            monthly_requests: "0".to_string(),
            average_time_spent: "0".to_string(),
            request_date: None,
            stored_request_date: None,
        }
    }
}

impl ProjectDraft {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            department: project.department.clone(),
            requester: project.requester.clone(),
            description: project.description.clone(),
            goal: project.goal.clone(),
            status: Some(project.status),
            impact_stakeholders: Some(project.impact_stakeholders),
            complexity: Some(project.complexity),
            monthly_requests: project.monthly_requests.to_string(),
            average_time_spent: project.average_time_spent.to_string(),
            request_date: Some(project.request_date.date_naive()),
            stored_request_date: Some(project.request_date),
        }
    }

    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Name => Some(&mut self.name),
            FormField::Department => Some(&mut self.department),
            FormField::Requester => Some(&mut self.requester),
            FormField::Description => Some(&mut self.description),
            FormField::Goal => Some(&mut self.goal),
            FormField::MonthlyRequests => Some(&mut self.monthly_requests),
            FormField::AverageTimeSpent => Some(&mut self.average_time_spent),
            _ => None,
        }
    }

    pub fn validate_create(&self) -> Result<CreateProjectData, FieldErrors> {
        let mut errors = FieldErrors::default();
        let data = self.common_fields(&mut errors);

        match data {
            Some(data) if errors.is_empty() => Ok(data),
            _ => Err(errors),
        }
    }

    pub fn validate_update(&self) -> Result<UpdateProjectData, FieldErrors> {
        let mut errors = FieldErrors::default();
        let data = self.common_fields(&mut errors);
        if self.status.is_none() {
            errors.insert(FormField::Status, "Status is required");
        }

        match (data, self.status) {
            (Some(fields), Some(status)) if errors.is_empty() => {
                Ok(UpdateProjectData { fields, status })
            }
            _ => Err(errors),
        }
    }

    fn common_fields(&self, errors: &mut FieldErrors) -> Option<CreateProjectData> {
        let name = required_text(&self.name, FormField::Name, "Name is required", errors);
        let department = required_text(
            &self.department,
            FormField::Department,
            "Department is required",
            errors,
        );
        let requester = required_text(
            &self.requester,
            FormField::Requester,
            "Requester is required",
            errors,
        );
        let description = required_text(
            &self.description,
            FormField::Description,
            "Description is required",
            errors,
        );
        let goal = required_text(&self.goal, FormField::Goal, "Goal is required", errors);

        if self.impact_stakeholders.is_none() {
            errors.insert(FormField::ImpactStakeholders, "This field is required");
        }
        if self.complexity.is_none() {
            errors.insert(FormField::Complexity, "Complexity is required");
        }

        let monthly_requests = parse_monthly_requests(&self.monthly_requests)
            .map_err(|message| errors.insert(FormField::MonthlyRequests, message))
            .ok();
        let average_time_spent = parse_average_time(&self.average_time_spent)
            .map_err(|message| errors.insert(FormField::AverageTimeSpent, message))
            .ok();

        if self.request_date.is_none() {
            errors.insert(FormField::RequestDate, "Request date is required");
        }

        Some(CreateProjectData {
            name: name?,
            department: department?,
            requester: requester?,
            description: description?,
            goal: goal?,
            impact_stakeholders: self.impact_stakeholders?,
            complexity: self.complexity?,
            monthly_requests: monthly_requests?,
            average_time_spent: average_time_spent?,
            request_date: self.request_timestamp()?,
        })
    }

    fn request_timestamp(&self) -> Option<DateTime<Utc>> {
        let day = self.request_date?;
        match self.stored_request_date {
            Some(stored) if stored.date_naive() == day => Some(stored),
            _ => Some(day.and_time(NaiveTime::MIN).and_utc()),
        }
    }
}

fn required_text(
    value: &str,
    field: FormField,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.insert(field, message);
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(raw: &str, label: &str) -> Result<f64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(format!("{label} is required"));
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("{label} must be a numeric value")),
    }
}

fn parse_monthly_requests(raw: &str) -> Result<u32, String> {
    let value = parse_number(raw, "Monthly requests")?;
    if value.fract() != 0.0 {
        return Err("Monthly requests must be a whole number".to_string());
    }
    if value <= 0.0 {
        return Err("Monthly requests must be greater than 0".to_string());
    }
    if value > f64::from(u32::MAX) {
        return Err("Monthly requests is too large".to_string());
    }
    Ok(value as u32)
}

fn parse_average_time(raw: &str) -> Result<f64, String> {
    let value = parse_number(raw, "Average time spent")?;
    if value <= 0.0 {
        return Err("Average time spent must be greater than 0".to_string());
    }
    Ok(value)
}
