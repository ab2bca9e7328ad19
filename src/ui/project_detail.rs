use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::Project;
use crate::ui::components::popup::{render_delete_confirmation, render_error, render_pending};

pub struct ProjectDetailState {
    project: Project,
    show_delete_confirmation: bool,
    pending: Option<&'static str>,
    show_error: Option<String>,
}

pub enum ProjectDetailAction {
    Back,
    Edit(Project),
    Delete(String), // Contains project id
}

impl ProjectDetailState {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            show_delete_confirmation: false,
            pending: None,
            show_error: None,
        }
    }

    pub fn set_pending(&mut self, pending: Option<&'static str>) {
        self.pending = pending;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.show_error.as_deref()
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let p = &self.project;
        let yes_no = if p.impact_stakeholders { "Yes" } else { "No" };
        vec![
            ("External ID", p.external_id.clone()),
            ("Project", p.name.clone()),
            ("Department", p.department.clone()),
            ("Requester", p.requester.clone()),
            ("Description", p.description.clone()),
            ("Status", p.status.to_string()),
            ("Goal", p.goal.clone()),
            ("Impacts Stakeholders", yes_no.to_string()),
            ("Complexity", p.complexity.to_string()),
            ("Monthly Requests", p.monthly_requests.to_string()),
            ("Average Time Spent (min)", p.average_time_spent.to_string()),
            ("Monthly Minutes Saved", p.monthly_minutes_saved.to_string()),
            ("Financial Gain", p.financial_gain.clone()),
            ("Range of Gain", p.range_of_gain.clone()),
            ("Priority Level", p.priority_level.to_string()),
            ("Request Date", p.request_date.format("%d/%m/%Y").to_string()),
            ("Created At", p.created_at.format("%d/%m/%Y %H:%M").to_string()),
            ("Updated At", p.updated_at.format("%d/%m/%Y %H:%M").to_string()),
        ]
    }
}

pub fn render_project_detail<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectDetailState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)].as_ref())
        .split(size);

    let lines: Vec<Spans> = state
        .rows()
        .into_iter()
        .map(|(label, value)| {
            Spans::from(vec![
                Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
                Span::raw(value),
            ])
        })
        .collect();

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!("Project {}", state.project.external_id))
                .borders(Borders::ALL),
        );
    frame.render_widget(details, chunks[0]);

    let buttons = Paragraph::new("<E> Edit Project | <D> Delete Project | <Esc> Back")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[1]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size, &state.project.name);
    }
    if let Some(pending) = state.pending {
        render_pending(frame, size, pending);
    }
    if let Some(error) = &state.show_error {
        render_error(frame, size, error);
    }
}

pub fn handle_input(state: &mut ProjectDetailState) -> Result<Option<ProjectDetailAction>> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Release {
            return Ok(None);
        }
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

pub fn handle_key(state: &mut ProjectDetailState, key: KeyCode) -> Option<ProjectDetailAction> {
    if state.show_error.is_some() {
        state.show_error = None;
        return None;
    }

    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.show_delete_confirmation = false;
                return Some(ProjectDetailAction::Delete(state.project.id.clone()));
            }
            KeyCode::Char('n') | KeyCode::Esc => state.show_delete_confirmation = false,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Esc | KeyCode::Char('q') => Some(ProjectDetailAction::Back),
        KeyCode::Char('e') => Some(ProjectDetailAction::Edit(state.project.clone())),
        KeyCode::Char('d') => {
            state.show_delete_confirmation = true;
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_project;

    #[test]
    fn shows_derived_fields() {
        let state = ProjectDetailState::new(sample_project("7", "Report bot"));
        let rows = state.rows();

        assert!(rows.contains(&("Monthly Minutes Saved", "150".to_string())));
        assert!(rows.contains(&("Financial Gain", "300".to_string())));
        assert!(rows.contains(&("Request Date", "01/03/2024".to_string())));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut state = ProjectDetailState::new(sample_project("7", "Report bot"));

        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());
        assert!(handle_key(&mut state, KeyCode::Esc).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Esc),
            Some(ProjectDetailAction::Back)
        ));

        handle_key(&mut state, KeyCode::Char('d'));
        match handle_key(&mut state, KeyCode::Char('y')) {
            Some(ProjectDetailAction::Delete(id)) => assert_eq!(id, "7"),
            _ => panic!("expected delete action"),
        }
    }

    #[test]
    fn edit_hands_over_the_record() {
        let mut state = ProjectDetailState::new(sample_project("7", "Report bot"));
        match handle_key(&mut state, KeyCode::Char('e')) {
            Some(ProjectDetailAction::Edit(project)) => assert_eq!(project.id, "7"),
            _ => panic!("expected edit action"),
        }
    }
}
