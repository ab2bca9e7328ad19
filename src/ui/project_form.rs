use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{Complexity, CreateProjectData, Project, ProjectStatus, UpdateProjectData};
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::popup::{render_error, render_pending};
use crate::ui::components::select;
use crate::validation::{FieldErrors, FormField, ProjectDraft};

pub const GOAL_PRESETS: [&str; 3] = [
    "Reduce customer service volume",
    "Reduce repetitive work volume",
    "Improve customer satisfaction",
];

pub enum ProjectFormAction {
    Cancel,
    Create(CreateProjectData),
    Update(String, UpdateProjectData),
}

/// Create starts blank; update carries the record's identity and the
/// server-computed values shown read-only.
pub enum FormMode {
    Create,
    Update {
        id: String,
        external_id: String,
        priority_level: f64,
        name: String,
    },
}

pub struct ProjectFormState {
    mode: FormMode,
    draft: ProjectDraft,
    fields: &'static [FormField],
    list_state: ListState,
    editing: bool,
    date_state: DateInputState,
    errors: FieldErrors,
    saving: bool,
    show_error: Option<String>,
}

impl ProjectFormState {
    pub fn create() -> Self {
        Self::with(FormMode::Create, ProjectDraft::default(), &FormField::CREATE)
    }

    pub fn update(project: &Project) -> Self {
        let mode = FormMode::Update {
            id: project.id.clone(),
            external_id: project.external_id.clone(),
            priority_level: project.priority_level,
            name: project.name.clone(),
        };
        Self::with(mode, ProjectDraft::from_project(project), &FormField::UPDATE)
    }

    fn with(mode: FormMode, draft: ProjectDraft, fields: &'static [FormField]) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let date_state = DateInputState::new(draft.request_date);

        Self {
            mode,
            draft,
            fields,
            list_state,
            editing: false,
            date_state,
            errors: FieldErrors::default(),
            saving: false,
            show_error: None,
        }
    }

    #[cfg(test)]
    pub fn draft(&self) -> &ProjectDraft {
        &self.draft
    }

    #[cfg(test)]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[cfg(test)]
    pub fn is_update(&self) -> bool {
        matches!(self.mode, FormMode::Update { .. })
    }

    #[cfg(test)]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.show_error.as_deref()
    }

    pub fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    pub fn current_field(&self) -> FormField {
        let index = self.list_state.selected().unwrap_or(0);
        self.fields[index.min(self.fields.len() - 1)]
    }

    fn focus(&mut self, field: FormField) {
        if let Some(index) = self.fields.iter().position(|f| *f == field) {
            self.list_state.select(Some(index));
        }
    }

    pub fn next_field(&mut self) {
        let index = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some((index + 1) % self.fields.len()));
    }

    pub fn previous_field(&mut self) {
        let index = self.list_state.selected().unwrap_or(0);
        self.list_state
            .select(Some((index + self.fields.len() - 1) % self.fields.len()));
    }

    fn is_select(field: FormField) -> bool {
        matches!(
            field,
            FormField::Status | FormField::ImpactStakeholders | FormField::Complexity
        )
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    pub fn toggle_editing(&mut self) {
        let field = self.current_field();
        if Self::is_select(field) {
            self.cycle_current(true);
            return;
        }

        self.editing = !self.editing;
        if field == FormField::RequestDate {
            self.date_state.set_editing(self.editing, Self::today());
            self.draft.request_date = self.date_state.date;
        }
        if !self.editing {
            self.errors.clear(field);
        }
    }

    /// Step a select field, or the goal through its presets.
    pub fn cycle_current(&mut self, forward: bool) {
        let field = self.current_field();
        match field {
            FormField::Status => {
                self.draft.status = select::cycle(&ProjectStatus::ALL, self.draft.status, forward);
            }
            FormField::ImpactStakeholders => {
                self.draft.impact_stakeholders =
                    select::cycle(&[true, false], self.draft.impact_stakeholders, forward);
            }
            FormField::Complexity => {
                self.draft.complexity =
                    select::cycle(&Complexity::ALL, self.draft.complexity, forward);
            }
            FormField::Goal => {
                let current = GOAL_PRESETS.iter().copied().find(|g| *g == self.draft.goal);
                if let Some(goal) = select::cycle(&GOAL_PRESETS, current, forward) {
                    self.draft.goal = goal.to_string();
                }
            }
            _ => return,
        }
        self.errors.clear(field);
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field = self.current_field();
        if field == FormField::RequestDate {
            self.date_state.handle_input(key);
            self.draft.request_date = self.date_state.date;
            return;
        }

        let numeric = matches!(field, FormField::MonthlyRequests | FormField::AverageTimeSpent);
        if let Some(text) = self.draft.text_mut(field) {
            match key {
                KeyCode::Char(c) if !numeric || c.is_ascii_digit() || c == '.' || c == ',' || c == '-' => {
                    text.push(c);
                }
                KeyCode::Backspace => {
                    text.pop();
                }
                _ => {}
            }
        }
    }

    /// Validate the draft. On failure the messages are kept for display
    /// and focus jumps to the first bad field.
    pub fn submit(&mut self) -> Option<ProjectFormAction> {
        let result = match &self.mode {
            FormMode::Create => self.draft.validate_create().map(ProjectFormAction::Create),
            FormMode::Update { id, .. } => {
                let id = id.clone();
                self.draft
                    .validate_update()
                    .map(|data| ProjectFormAction::Update(id, data))
            }
        };

        match result {
            Ok(action) => {
                self.errors = FieldErrors::default();
                Some(action)
            }
            Err(errors) => {
                if let Some(field) = errors.first_field() {
                    self.focus(field);
                }
                self.errors = errors;
                None
            }
        }
    }

    fn display_value(&self, field: FormField) -> String {
        let draft = &self.draft;
        let unset = || "Select...".to_string();
        match field {
            FormField::Name => draft.name.clone(),
            FormField::Department => draft.department.clone(),
            FormField::Requester => draft.requester.clone(),
            FormField::Description => draft.description.clone(),
            FormField::Goal => draft.goal.clone(),
            FormField::Status => draft.status.map(|s| s.to_string()).unwrap_or_else(unset),
            FormField::ImpactStakeholders => match draft.impact_stakeholders {
                Some(true) => "Yes".to_string(),
                Some(false) => "No".to_string(),
                None => unset(),
            },
            FormField::Complexity => draft.complexity.map(|c| c.to_string()).unwrap_or_else(unset),
            FormField::MonthlyRequests => draft.monthly_requests.clone(),
            FormField::AverageTimeSpent => draft.average_time_spent.clone(),
            FormField::RequestDate => self.date_state.get_display_string(),
        }
    }
}

pub fn render_project_form<B: Backend>(f: &mut Frame<B>, state: &mut ProjectFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = match &state.mode {
        FormMode::Create => "New Project - create a new project in the system".to_string(),
        FormMode::Update { name, .. } => format!("Edit Project - update the information of {name}"),
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        match state.current_field() {
            FormField::RequestDate => {
                "Digits - Type day/month/year | Left/Right - Switch part | +/- Day | Enter - Done"
            }
            _ => "Type to edit | Enter/Esc - Done",
        }
    } else {
        "Up/Down - Navigate | Enter - Edit | Left/Right - Choose option | S - Save | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    let size = f.size();
    if state.saving {
        render_pending(f, size, "Saving...");
    }
    if let Some(error) = &state.show_error {
        render_error(f, size, error);
    }
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ProjectFormState, area: Rect) {
    let mut area = area;

    if let FormMode::Update {
        external_id,
        priority_level,
        ..
    } = &state.mode
    {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(6)].as_ref())
            .split(area);

        let locked = Paragraph::new(vec![
            Spans::from(vec![
                Span::styled("External ID: ", Style::default().fg(Color::DarkGray)),
                Span::raw(external_id.clone()),
            ]),
            Spans::from(vec![
                Span::styled("Priority Level: ", Style::default().fg(Color::DarkGray)),
                Span::raw(priority_level.to_string()),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).title("Read only"));
        f.render_widget(locked, split[0]);
        area = split[1];
    }

    let current = state.current_field();
    let items: Vec<ListItem> = state
        .fields
        .iter()
        .map(|field| {
            let focused = *field == current;
            let mut value = state.display_value(*field);
            if focused && state.editing && *field != FormField::RequestDate {
                value.push('|');
            }

            let label_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value_style = if focused && state.editing {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut lines = vec![Spans::from(vec![
                Span::styled(format!("{}: ", field.label()), label_style),
                Span::styled(value, value_style),
            ])];
            if let Some(message) = state.errors.get(*field) {
                lines.push(Spans::from(Span::styled(
                    format!("  {message}"),
                    Style::default().fg(Color::Red),
                )));
            }

            ListItem::new(lines)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Project Details"))
        .highlight_symbol("> ");

    f.render_stateful_widget(form_list, area, &mut state.list_state);
}

pub fn handle_input(state: &mut ProjectFormState) -> Result<Option<ProjectFormAction>> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Release {
            return Ok(None);
        }
        return Ok(handle_key(state, key.code));
    }

    Ok(None)
}

pub fn handle_key(state: &mut ProjectFormState, key: KeyCode) -> Option<ProjectFormAction> {
    if state.show_error.is_some() {
        state.show_error = None;
        return None;
    }
    if state.saving {
        return None;
    }

    if state.editing {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.toggle_editing(),
            KeyCode::Up | KeyCode::Down | KeyCode::Tab => {}
            other => state.edit_current_field(other),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(ProjectFormAction::Cancel),
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up | KeyCode::BackTab => state.previous_field(),
        KeyCode::Down | KeyCode::Tab => state.next_field(),
        KeyCode::Left => state.cycle_current(false),
        KeyCode::Right => state.cycle_current(true),
        KeyCode::Char('s') => return state.submit(),
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::tests::sample_project;

    fn type_text(state: &mut ProjectFormState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    fn fill_create_form(state: &mut ProjectFormState) {
        type_text(state, "Expense bot");
        handle_key(state, KeyCode::Down);
        type_text(state, "Finance");
        handle_key(state, KeyCode::Down);
        type_text(state, "Ravi");
        handle_key(state, KeyCode::Down);
        type_text(state, "Classify receipts");
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Right);
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Left);
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Backspace);
        for c in "40".chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Backspace);
        for c in "1.5".chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
        handle_key(state, KeyCode::Down);
        handle_key(state, KeyCode::Enter);
        for c in "01022024".chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn blank_create_form_refuses_to_save() {
        let mut state = ProjectFormState::create();
        handle_key(&mut state, KeyCode::Down);

        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.errors().len(), FormField::CREATE.len());
        assert_eq!(state.current_field(), FormField::Name);
    }

    #[test]
    fn filled_create_form_produces_payload() {
        let mut state = ProjectFormState::create();
        fill_create_form(&mut state);

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectFormAction::Create(data)) => {
                assert_eq!(data.name, "Expense bot");
                assert_eq!(data.goal, GOAL_PRESETS[0]);
                assert!(data.impact_stakeholders);
                assert_eq!(data.complexity, Complexity::Low);
                assert_eq!(data.monthly_requests, 40);
                assert_eq!(data.average_time_spent, 1.5);
                assert_eq!(
                    data.request_date.date_naive(),
                    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
                );
            }
            _ => panic!("expected create action"),
        }
        assert!(state.errors().is_empty());
    }

    #[test]
    fn numeric_fields_ignore_letters() {
        let mut state = ProjectFormState::create();
        for _ in 0..7 {
            handle_key(&mut state, KeyCode::Down);
        }
        assert_eq!(state.current_field(), FormField::MonthlyRequests);
        type_text(&mut state, "x9");

        assert_eq!(state.draft().monthly_requests, "09");
    }

    #[test]
    fn update_form_starts_from_record_and_changes_status() {
        let project = sample_project("42", "Report bot");
        let mut state = ProjectFormState::update(&project);
        assert!(state.is_update());

        for _ in 0..4 {
            handle_key(&mut state, KeyCode::Down);
        }
        assert_eq!(state.current_field(), FormField::Status);
        handle_key(&mut state, KeyCode::Right);

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectFormAction::Update(id, data)) => {
                assert_eq!(id, "42");
                assert_eq!(data.status, ProjectStatus::InProgress);
                assert_eq!(data.fields.name, "Report bot");
            }
            _ => panic!("expected update action"),
        }
    }

    #[test]
    fn reopening_untouched_date_keeps_stored_timestamp() {
        let mut project = sample_project("42", "Report bot");
        project.request_date = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();
        let mut state = ProjectFormState::update(&project);

        while state.current_field() != FormField::RequestDate {
            handle_key(&mut state, KeyCode::Down);
        }
        handle_key(&mut state, KeyCode::Enter);
        handle_key(&mut state, KeyCode::Enter);

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectFormAction::Update(_, data)) => {
                assert_eq!(data.fields.request_date, project.request_date);
            }
            _ => panic!("expected update action"),
        }
    }

    #[test]
    fn escape_cancels_only_when_not_editing() {
        let mut state = ProjectFormState::create();
        handle_key(&mut state, KeyCode::Enter);
        assert!(handle_key(&mut state, KeyCode::Esc).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Esc),
            Some(ProjectFormAction::Cancel)
        ));
    }

    #[test]
    fn saving_blocks_input_and_errors_are_dismissed() {
        let mut state = ProjectFormState::create();
        state.set_saving(true);
        assert!(handle_key(&mut state, KeyCode::Esc).is_none());

        state.set_saving(false);
        state.show_error("Error saving project: boom");
        assert!(handle_key(&mut state, KeyCode::Esc).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Esc),
            Some(ProjectFormAction::Cancel)
        ));
    }
}
