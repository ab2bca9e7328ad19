use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::Project;
use crate::store::QueryStatus;
use crate::ui::components::popup::{centered_rect, render_delete_confirmation, render_error, render_pending};
use crate::ui::table::{ColumnId, SortDirection, TableModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
    Columns,
    ConfirmDelete,
}

// Represents the state of the projects table screen
pub struct ProjectsState {
    table: TableModel,
    table_state: TableState,
    column_cursor: usize,
    mode: Mode,
    loading: bool,
    pending: Option<&'static str>,
    show_error: Option<String>,
}

pub enum ProjectAction {
    Exit,
    Refresh,
    NewProject,
    ViewProject(String),  // Contains project id
    EditProject(String),  // Contains project id
    DeleteProject(String), // Contains project id
}

impl ProjectsState {
    pub fn new(page_size: usize) -> Self {
        Self {
            table: TableModel::new(page_size),
            table_state: TableState::default(),
            column_cursor: 0,
            mode: Mode::Browse,
            loading: false,
            pending: None,
            show_error: None,
        }
    }

    pub fn set_rows(&mut self, rows: Vec<Project>) {
        self.table.set_rows(rows);
        self.clamp_selection();
    }

    /// Mirror the list query: cached rows stay on screen while a refetch
    /// is in flight, and a failed fetch raises the error popup.
    pub fn apply_query(&mut self, status: &QueryStatus, cached: Option<&[Project]>) {
        if let Some(rows) = cached {
            self.set_rows(rows.to_vec());
        }
        self.loading = *status == QueryStatus::Loading;
        if let QueryStatus::Error(message) = status {
            self.show_error(format!("Error loading projects: {message}"));
        }
    }

    pub fn set_pending(&mut self, pending: Option<&'static str>) {
        self.pending = pending;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.show_error.as_deref()
    }

    pub fn table(&self) -> &TableModel {
        &self.table
    }

    pub fn find(&self, id: &str) -> Option<&Project> {
        self.table.rows().iter().find(|p| p.id == id)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let index = self.table_state.selected()?;
        self.table.page_rows().get(index).copied()
    }

    pub fn selected_project_id(&self) -> Option<String> {
        self.selected_project().map(|p| p.id.clone())
    }

    fn page_len(&self) -> usize {
        self.table.page_rows().len()
    }

    fn clamp_selection(&mut self) {
        let len = self.page_len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.page_len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.page_len();
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn change_page(&mut self, forward: bool) {
        let moved = if forward {
            self.table.next_page()
        } else {
            self.table.previous_page()
        };
        if moved {
            self.table_state.select(Some(0));
            self.clamp_selection();
        }
    }

    fn edit_filter(&mut self, key: KeyCode) {
        let mut filter = self.table.filter().to_string();
        match key {
            KeyCode::Char(c) => filter.push(c),
            KeyCode::Backspace => {
                filter.pop();
            }
            _ => return,
        }
        self.table.set_filter(filter);
        self.table_state.select(Some(0));
        self.clamp_selection();
    }
}

fn sort_marker(table: &TableModel, column: ColumnId) -> &'static str {
    match table.sorting() {
        Some(sort) if sort.column == column => match sort.direction {
            SortDirection::Ascending => " ▲",
            SortDirection::Descending => " ▼",
        },
        _ => "",
    }
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    render_filter_bar(frame, state, chunks[0]);
    render_table(frame, state, chunks[1]);
    render_footer(frame, state, chunks[2]);

    match state.mode {
        Mode::Columns => render_column_picker(frame, state, size),
        Mode::ConfirmDelete => {
            if let Some(project) = state.selected_project() {
                render_delete_confirmation(frame, size, &project.name);
            }
        }
        _ => {}
    }

    if let Some(pending) = state.pending {
        render_pending(frame, size, pending);
    } else if state.loading {
        render_pending(frame, size, "Loading projects...");
    }

    if let Some(error) = &state.show_error {
        render_error(frame, size, error);
    }
}

fn render_filter_bar<B: Backend>(frame: &mut Frame<B>, state: &ProjectsState, area: Rect) {
    let filter = state.table.filter();
    let (text, style) = match (state.mode, filter.is_empty()) {
        (Mode::Filter, _) => (format!("{filter}|"), Style::default().fg(Color::Yellow)),
        (_, true) => ("Filter projects...".to_string(), Style::default().fg(Color::DarkGray)),
        (_, false) => (filter.to_string(), Style::default()),
    };

    let bar = Paragraph::new(text)
        .style(style)
        .block(Block::default().title("Projects").borders(Borders::ALL));
    frame.render_widget(bar, area);
}

fn render_table<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState, area: Rect) {
    let columns = state.table.visible_columns();
    if columns.is_empty() {
        let empty = Paragraph::new("All columns are hidden. Press <C> to choose columns.")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let header_cells = columns.iter().map(|c| {
        Cell::from(format!("{}{}", c.header(), sort_marker(&state.table, *c)))
            .style(Style::default().fg(Color::Yellow))
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let page = state.table.page_rows();
    let rows: Vec<Row> = if page.is_empty() {
        let message = if state.table.filter().is_empty() {
            "No projects registered"
        } else {
            "No projects match the filter"
        };
        vec![Row::new(vec![Cell::from(message)])]
    } else {
        page.iter()
            .map(|project| {
                Row::new(columns.iter().map(|c| Cell::from(c.cell(project)))).height(1)
            })
            .collect()
    };

    let total: u16 = columns.iter().map(ColumnId::weight).sum();
    let widths: Vec<Constraint> = columns
        .iter()
        .map(|c| Constraint::Ratio(u32::from(c.weight()), u32::from(total)))
        .collect();

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&widths);

    frame.render_stateful_widget(table, area, &mut state.table_state);
}

fn render_footer<B: Backend>(frame: &mut Frame<B>, state: &ProjectsState, area: Rect) {
    let table = state.table();
    let page_info = format!(
        "Projects: {} | Page {} of {}",
        table.filtered_count(),
        table.page_index() + 1,
        table.page_count().max(1),
    );

    let help = match state.mode {
        Mode::Filter => "Type to filter | <Enter>/<Esc> Done",
        _ if state.selected_project().is_some() => {
            "<N> New | <Enter> View | <E> Edit | <D> Delete | </> Filter | <1-6> Sort | <C> Columns | <←/→> Page | <R> Refresh | <Q> Quit"
        }
        _ => "<N> New | </> Filter | <C> Columns | <R> Refresh | <Q> Quit",
    };

    let footer = Paragraph::new(Spans::from(vec![
        Span::styled(page_info, Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::raw(help),
    ]))
    .block(Block::default().borders(Borders::TOP))
    .style(Style::default().fg(Color::White));

    frame.render_widget(footer, area);
}

fn render_column_picker<B: Backend>(frame: &mut Frame<B>, state: &ProjectsState, size: Rect) {
    let area = centered_rect(40, 50, size);

    let items: Vec<ListItem> = ColumnId::ALL
        .iter()
        .map(|c| {
            let mark = if state.table.is_visible(*c) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {}", c.header()))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.column_cursor));

    let list = List::new(items)
        .block(
            Block::default()
                .title("Columns (<Space> toggle, <Esc> close)")
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn handle_input(state: &mut ProjectsState) -> Result<Option<ProjectAction>> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Release {
            return Ok(None);
        }
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

pub fn handle_key(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if state.show_error.is_some() {
        state.show_error = None;
        return None;
    }

    match state.mode {
        Mode::Filter => {
            match key {
                KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Browse,
                other => state.edit_filter(other),
            }
            None
        }
        Mode::Columns => {
            match key {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('c') => state.mode = Mode::Browse,
                KeyCode::Up => {
                    state.column_cursor =
                        (state.column_cursor + ColumnId::ALL.len() - 1) % ColumnId::ALL.len();
                }
                KeyCode::Down => {
                    state.column_cursor = (state.column_cursor + 1) % ColumnId::ALL.len();
                }
                KeyCode::Char(' ') => {
                    state.table.toggle_visibility(ColumnId::ALL[state.column_cursor]);
                }
                _ => {}
            }
            None
        }
        Mode::ConfirmDelete => match key {
            KeyCode::Char('y') => {
                state.mode = Mode::Browse;
                state.selected_project_id().map(ProjectAction::DeleteProject)
            }
            KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
                state.mode = Mode::Browse;
                None
            }
            _ => None,
        },
        Mode::Browse => match key {
            KeyCode::Char('q') | KeyCode::Esc => Some(ProjectAction::Exit),
            KeyCode::Char('n') => Some(ProjectAction::NewProject),
            KeyCode::Char('r') => Some(ProjectAction::Refresh),
            KeyCode::Enter => state.selected_project_id().map(ProjectAction::ViewProject),
            KeyCode::Char('e') => state.selected_project_id().map(ProjectAction::EditProject),
            KeyCode::Char('d') => {
                if state.selected_project().is_some() {
                    state.mode = Mode::ConfirmDelete;
                }
                None
            }
            KeyCode::Char('/') => {
                state.mode = Mode::Filter;
                None
            }
            KeyCode::Char('c') => {
                state.mode = Mode::Columns;
                None
            }
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                state.table.toggle_sort(ColumnId::ALL[index]);
                state.clamp_selection();
                None
            }
            KeyCode::Down => {
                state.next();
                None
            }
            KeyCode::Up => {
                state.previous();
                None
            }
            KeyCode::Right | KeyCode::PageDown => {
                state.change_page(true);
                None
            }
            KeyCode::Left | KeyCode::PageUp => {
                state.change_page(false);
                None
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_project;

    fn state_with(count: usize) -> ProjectsState {
        let mut state = ProjectsState::new(10);
        state.set_rows(
            (1..=count)
                .map(|i| sample_project(&i.to_string(), &format!("Project {i}")))
                .collect(),
        );
        state
    }

    #[test]
    fn query_state_drives_loading_and_errors() {
        let mut state = state_with(2);
        let cached = vec![sample_project("1", "Project 1")];

        state.apply_query(&QueryStatus::Loading, Some(&cached));
        assert!(state.is_loading());
        assert_eq!(state.table().rows().len(), 1);

        state.apply_query(&QueryStatus::Error("timed out".into()), Some(&cached));
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("Error loading projects: timed out"));
        assert_eq!(state.table().rows().len(), 1);

        // any key dismisses the popup
        assert!(handle_key(&mut state, KeyCode::Char('q')).is_none());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn selection_wraps_within_page() {
        let mut state = state_with(3);
        assert_eq!(state.selected_project_id().as_deref(), Some("1"));

        state.previous();
        assert_eq!(state.selected_project_id().as_deref(), Some("3"));
        state.next();
        assert_eq!(state.selected_project_id().as_deref(), Some("1"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut state = state_with(2);
        handle_key(&mut state, KeyCode::Down);

        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());
        assert!(handle_key(&mut state, KeyCode::Char('n')).is_none());
        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());

        match handle_key(&mut state, KeyCode::Char('y')) {
            Some(ProjectAction::DeleteProject(id)) => assert_eq!(id, "2"),
            _ => panic!("expected delete action"),
        }
    }

    #[test]
    fn filter_mode_captures_typing() {
        let mut state = state_with(12);
        handle_key(&mut state, KeyCode::Char('/'));
        for c in "ject 1".chars() {
            handle_key(&mut state, KeyCode::Char(c));
        }
        // 'n' is text here, not "new project"
        assert!(handle_key(&mut state, KeyCode::Char('n')).is_none());
        handle_key(&mut state, KeyCode::Backspace);
        handle_key(&mut state, KeyCode::Enter);

        assert_eq!(state.table().filter(), "ject 1");
        // Project 1, 10, 11, 12
        assert_eq!(state.table().filtered_count(), 4);
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('n')),
            Some(ProjectAction::NewProject)
        ));
    }

    #[test]
    fn paging_moves_selection_to_new_page() {
        let mut state = state_with(15);
        handle_key(&mut state, KeyCode::Right);
        assert_eq!(state.table().page_index(), 1);
        assert_eq!(state.selected_project_id().as_deref(), Some("11"));

        handle_key(&mut state, KeyCode::Right);
        assert_eq!(state.table().page_index(), 1);
        handle_key(&mut state, KeyCode::Left);
        assert_eq!(state.selected_project_id().as_deref(), Some("1"));
    }

    #[test]
    fn column_picker_toggles_visibility() {
        let mut state = state_with(1);
        handle_key(&mut state, KeyCode::Char('c'));
        handle_key(&mut state, KeyCode::Down);
        handle_key(&mut state, KeyCode::Char(' '));
        handle_key(&mut state, KeyCode::Esc);

        assert!(!state.table().is_visible(ColumnId::RequestDate));
        assert_eq!(state.table().visible_columns().len(), 5);
    }

    #[test]
    fn sort_keys_follow_column_order() {
        let mut state = state_with(3);
        handle_key(&mut state, KeyCode::Char('3'));
        handle_key(&mut state, KeyCode::Char('3'));

        assert_eq!(state.selected_project_id().as_deref(), Some("3"));
    }

    #[test]
    fn error_popup_swallows_next_key() {
        let mut state = state_with(1);
        state.show_error("Error deleting project.");

        assert!(handle_key(&mut state, KeyCode::Char('q')).is_none());
        assert!(matches!(
            handle_key(&mut state, KeyCode::Char('q')),
            Some(ProjectAction::Exit)
        ));
    }

    #[test]
    fn empty_table_offers_no_row_actions() {
        let mut state = state_with(0);
        assert!(state.selected_project().is_none());
        assert!(handle_key(&mut state, KeyCode::Enter).is_none());
        assert!(handle_key(&mut state, KeyCode::Char('e')).is_none());
    }
}
