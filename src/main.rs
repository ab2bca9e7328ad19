mod api;
mod config;
mod logging;
mod models;
mod store;
mod ui;
mod validation;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, error, info};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::api::{ApiClient, ListQuery, ProjectBackend};
use crate::models::Project;
use crate::store::{ProjectStore, QueryKey};
use crate::ui::{
    project_detail::{
        handle_input as handle_detail_input, render_project_detail, ProjectDetailAction,
        ProjectDetailState,
    },
    project_form::{
        handle_input as handle_form_input, render_project_form, ProjectFormAction,
        ProjectFormState,
    },
    projects::{handle_input as handle_projects_input, render_projects, ProjectAction, ProjectsState},
};

// Represents the current screen in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppScreen {
    Projects,
    ProjectDetail,
    ProjectForm,
}

// Main application state
struct AppState<P> {
    store: ProjectStore<P>,
    screen: AppScreen,
    projects_state: ProjectsState,
    detail_state: Option<ProjectDetailState>,
    form_state: Option<ProjectFormState>,
}

impl<P: ProjectBackend> AppState<P> {
    fn new(store: ProjectStore<P>, page_size: usize) -> Self {
        Self {
            store,
            screen: AppScreen::Projects,
            projects_state: ProjectsState::new(page_size),
            detail_state: None,
            form_state: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init()?;
    logging::init(&config.log_file)?;
    info!(api_url = %config.api_url, "starting project tracker");

    let client = ApiClient::new(&config)?;
    let store = ProjectStore::new(client, ListQuery::first(config.fetch_limit));

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(store, config.page_size);

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "project tracker stopped with an error");
        println!("Error: {}", err);
    }

    info!("project tracker closed");
    Ok(())
}

fn draw<B: Backend, P>(terminal: &mut Terminal<B>, app_state: &mut AppState<P>) -> Result<()> {
    terminal.draw(|f| match app_state.screen {
        AppScreen::Projects => render_projects(f, &mut app_state.projects_state),
        AppScreen::ProjectDetail => {
            if let Some(state) = &mut app_state.detail_state {
                render_project_detail(f, state);
            }
        }
        AppScreen::ProjectForm => {
            if let Some(state) = &mut app_state.form_state {
                render_project_form(f, state);
            }
        }
    })?;

    Ok(())
}

async fn run_app<B: Backend, P: ProjectBackend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<P>,
) -> Result<()> {
    reload_projects(terminal, app_state).await?;

    loop {
        draw(terminal, app_state)?;

        let should_quit = match app_state.screen {
            AppScreen::Projects => match handle_projects_input(&mut app_state.projects_state)? {
                Some(action) => on_projects_action(terminal, app_state, action).await?,
                None => false,
            },
            AppScreen::ProjectDetail => {
                let action = match &mut app_state.detail_state {
                    Some(state) => handle_detail_input(state)?,
                    None => {
                        app_state.screen = AppScreen::Projects;
                        None
                    }
                };
                if let Some(action) = action {
                    on_detail_action(terminal, app_state, action).await?;
                }
                false
            }
            AppScreen::ProjectForm => {
                let action = match &mut app_state.form_state {
                    Some(state) => handle_form_input(state)?,
                    None => {
                        app_state.screen = AppScreen::Projects;
                        None
                    }
                };
                if let Some(action) = action {
                    on_form_action(terminal, app_state, action).await?;
                }
                false
            }
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// Copy the list query's state onto the table screen.
fn sync_projects<P: ProjectBackend>(app_state: &mut AppState<P>) {
    let status = app_state.store.status(&QueryKey::Projects);
    app_state
        .projects_state
        .apply_query(&status, app_state.store.cached_projects());
}

/// Read the project list through the cache and show the table.
/// A stale or missing list is refetched; a failure is shown, not fatal.
async fn reload_projects<B: Backend, P: ProjectBackend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<P>,
) -> Result<()> {
    app_state.screen = AppScreen::Projects;
    if app_state.store.begin(&QueryKey::Projects) {
        sync_projects(app_state);
        draw(terminal, app_state)?;
    }

    // The error stays on the query and reaches the screen through it
    if let Err(err) = app_state.store.projects().await {
        debug!(error = %err, "project list unavailable");
    }
    sync_projects(app_state);

    Ok(())
}

fn open_form<P>(app_state: &mut AppState<P>, project: Option<&Project>) {
    let form = match project {
        Some(project) => ProjectFormState::update(project),
        None => ProjectFormState::create(),
    };
    app_state.form_state = Some(form);
    app_state.screen = AppScreen::ProjectForm;
}

/// Returns true when the app should exit.
async fn on_projects_action<B: Backend, P: ProjectBackend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<P>,
    action: ProjectAction,
) -> Result<bool> {
    match action {
        ProjectAction::Exit => return Ok(true),
        ProjectAction::Refresh => {
            app_state.store.invalidate(&QueryKey::Projects);
            reload_projects(terminal, app_state).await?;
        }
        ProjectAction::NewProject => open_form(app_state, None),
        ProjectAction::EditProject(id) => {
            if let Some(project) = app_state.projects_state.find(&id).cloned() {
                open_form(app_state, Some(&project));
            }
        }
        ProjectAction::ViewProject(id) => {
            if app_state.store.begin(&QueryKey::Project(id.clone())) {
                app_state.projects_state.set_pending(Some("Loading project..."));
                draw(terminal, app_state)?;
            }
            let fetched = app_state.store.project(&id).await;
            app_state.projects_state.set_pending(None);

            match fetched {
                Ok(project) => {
                    app_state.detail_state = Some(ProjectDetailState::new(project));
                    app_state.screen = AppScreen::ProjectDetail;
                }
                Err(err) => {
                    if err.is_not_found() {
                        reload_projects(terminal, app_state).await?;
                    }
                    app_state
                        .projects_state
                        .show_error(format!("Error loading project: {}", err.user_message()));
                }
            }
        }
        ProjectAction::DeleteProject(id) => {
            app_state.projects_state.set_pending(Some("Deleting..."));
            draw(terminal, app_state)?;
            let deleted = app_state.store.delete(&id).await;
            app_state.projects_state.set_pending(None);

            match deleted {
                Ok(()) => reload_projects(terminal, app_state).await?,
                Err(err) => {
                    error!(%id, error = %err, "delete failed");
                    app_state.projects_state.show_error("Error deleting project.");
                }
            }
        }
    }

    Ok(false)
}

async fn on_detail_action<B: Backend, P: ProjectBackend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<P>,
    action: ProjectDetailAction,
) -> Result<()> {
    match action {
        ProjectDetailAction::Back => {
            app_state.detail_state = None;
            reload_projects(terminal, app_state).await?;
        }
        ProjectDetailAction::Edit(project) => open_form(app_state, Some(&project)),
        ProjectDetailAction::Delete(id) => {
            if let Some(state) = &mut app_state.detail_state {
                state.set_pending(Some("Deleting..."));
            }
            draw(terminal, app_state)?;
            let deleted = app_state.store.delete(&id).await;

            match deleted {
                Ok(()) => {
                    app_state.detail_state = None;
                    reload_projects(terminal, app_state).await?;
                }
                Err(err) => {
                    error!(%id, error = %err, "delete failed");
                    if let Some(state) = &mut app_state.detail_state {
                        state.set_pending(None);
                        state.show_error("Error deleting project.");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn on_form_action<B: Backend, P: ProjectBackend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<P>,
    action: ProjectFormAction,
) -> Result<()> {
    if let ProjectFormAction::Cancel = action {
        app_state.form_state = None;
        // Editing from the detail screen returns there
        if app_state.detail_state.is_some() {
            app_state.screen = AppScreen::ProjectDetail;
        } else {
            app_state.screen = AppScreen::Projects;
        }
        return Ok(());
    }

    if let Some(state) = &mut app_state.form_state {
        state.set_saving(true);
    }
    draw(terminal, app_state)?;

    let saved = match &action {
        ProjectFormAction::Create(data) => app_state.store.create(data).await,
        ProjectFormAction::Update(id, data) => app_state.store.update(id, data).await,
        ProjectFormAction::Cancel => Ok(()),
    };

    match saved {
        Ok(()) => {
            app_state.form_state = None;
            app_state.detail_state = None;
            reload_projects(terminal, app_state).await?;
        }
        Err(err) => {
            error!(error = %err, "saving project failed");
            if let Some(state) = &mut app_state.form_state {
                state.set_saving(false);
                state.show_error(format!("Error saving project: {}", err.user_message()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tui::backend::TestBackend;

    use super::*;
    use crate::models::ProjectStatus;
    use crate::store::tests::{sample_project, FakeBackend};
    use crate::validation::ProjectDraft;

    fn app_with(projects: Vec<Project>) -> (Terminal<TestBackend>, AppState<FakeBackend>, FakeBackend) {
        let backend = FakeBackend::with(projects);
        let store = ProjectStore::new(backend.clone(), ListQuery::first(100));
        let terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        (terminal, AppState::new(store, 10), backend)
    }

    fn row_ids<P>(app_state: &AppState<P>) -> Vec<String> {
        app_state
            .projects_state
            .table()
            .rows()
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }

    fn create_action(name: &str) -> ProjectFormAction {
        let draft = ProjectDraft::from_project(&sample_project("draft", name));
        ProjectFormAction::Create(draft.validate_create().unwrap())
    }

    #[tokio::test]
    async fn startup_fills_the_table() {
        let (mut terminal, mut app, _) =
            app_with(vec![sample_project("1", "Report bot"), sample_project("2", "Intake bot")]);

        reload_projects(&mut terminal, &mut app).await.unwrap();

        assert_eq!(app.screen, AppScreen::Projects);
        assert_eq!(row_ids(&app), vec!["1", "2"]);
        assert!(!app.projects_state.is_loading());
        assert_eq!(app.projects_state.error(), None);
    }

    #[tokio::test]
    async fn failed_list_fetch_shows_error_popup() {
        let (mut terminal, mut app, backend) = app_with(vec![sample_project("1", "Report bot")]);
        *backend.fail_list.lock().unwrap() = Some("maintenance".into());

        reload_projects(&mut terminal, &mut app).await.unwrap();

        assert_eq!(
            app.projects_state.error(),
            Some("Error loading projects: maintenance")
        );
        assert!(!app.projects_state.is_loading());
        assert!(row_ids(&app).is_empty());
    }

    #[tokio::test]
    async fn successful_create_closes_form_and_reloads() {
        let (mut terminal, mut app, backend) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();
        on_projects_action(&mut terminal, &mut app, ProjectAction::NewProject)
            .await
            .unwrap();
        assert_eq!(app.screen, AppScreen::ProjectForm);

        on_form_action(&mut terminal, &mut app, create_action("Intake bot"))
            .await
            .unwrap();

        assert_eq!(app.screen, AppScreen::Projects);
        assert!(app.form_state.is_none());
        assert_eq!(row_ids(&app).len(), 2);
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_save_keeps_form_open_with_server_message() {
        let (mut terminal, mut app, backend) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();
        on_projects_action(&mut terminal, &mut app, ProjectAction::EditProject("1".into()))
            .await
            .unwrap();
        *backend.fail_mutations.lock().unwrap() = Some("name already taken".into());

        let draft = ProjectDraft::from_project(&sample_project("1", "Report bot"));
        let action = ProjectFormAction::Update("1".into(), draft.validate_update().unwrap());
        on_form_action(&mut terminal, &mut app, action).await.unwrap();

        assert_eq!(app.screen, AppScreen::ProjectForm);
        let form = app.form_state.as_ref().unwrap();
        assert_eq!(form.error(), Some("Error saving project: name already taken"));
        assert!(!form.is_saving());
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_from_table_reloads_or_reports_failure() {
        let (mut terminal, mut app, backend) =
            app_with(vec![sample_project("1", "Report bot"), sample_project("2", "Intake bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();

        on_projects_action(&mut terminal, &mut app, ProjectAction::DeleteProject("1".into()))
            .await
            .unwrap();
        assert_eq!(row_ids(&app), vec!["2"]);

        *backend.fail_mutations.lock().unwrap() = Some("locked".into());
        on_projects_action(&mut terminal, &mut app, ProjectAction::DeleteProject("2".into()))
            .await
            .unwrap();
        assert_eq!(app.projects_state.error(), Some("Error deleting project."));
        assert_eq!(row_ids(&app), vec!["2"]);
    }

    #[tokio::test]
    async fn detail_delete_failure_stays_on_detail() {
        let (mut terminal, mut app, backend) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();
        on_projects_action(&mut terminal, &mut app, ProjectAction::ViewProject("1".into()))
            .await
            .unwrap();
        assert_eq!(app.screen, AppScreen::ProjectDetail);
        *backend.fail_mutations.lock().unwrap() = Some("locked".into());

        on_detail_action(&mut terminal, &mut app, ProjectDetailAction::Delete("1".into()))
            .await
            .unwrap();

        assert_eq!(app.screen, AppScreen::ProjectDetail);
        let detail = app.detail_state.as_ref().unwrap();
        assert_eq!(detail.error(), Some("Error deleting project."));
    }

    #[tokio::test]
    async fn cancelled_edit_returns_to_where_it_started() {
        let (mut terminal, mut app, _) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();

        on_projects_action(&mut terminal, &mut app, ProjectAction::ViewProject("1".into()))
            .await
            .unwrap();
        let project = sample_project("1", "Report bot");
        on_detail_action(&mut terminal, &mut app, ProjectDetailAction::Edit(project))
            .await
            .unwrap();
        assert_eq!(app.screen, AppScreen::ProjectForm);
        on_form_action(&mut terminal, &mut app, ProjectFormAction::Cancel)
            .await
            .unwrap();
        assert_eq!(app.screen, AppScreen::ProjectDetail);

        on_detail_action(&mut terminal, &mut app, ProjectDetailAction::Back)
            .await
            .unwrap();
        on_projects_action(&mut terminal, &mut app, ProjectAction::EditProject("1".into()))
            .await
            .unwrap();
        on_form_action(&mut terminal, &mut app, ProjectFormAction::Cancel)
            .await
            .unwrap();
        assert_eq!(app.screen, AppScreen::Projects);
    }

    #[tokio::test]
    async fn update_from_detail_returns_to_refreshed_table() {
        let (mut terminal, mut app, _) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();
        on_projects_action(&mut terminal, &mut app, ProjectAction::ViewProject("1".into()))
            .await
            .unwrap();

        let mut draft = ProjectDraft::from_project(&sample_project("1", "Report bot"));
        draft.name = "Report bot v2".into();
        draft.status = Some(ProjectStatus::Completed);
        let action = ProjectFormAction::Update("1".into(), draft.validate_update().unwrap());
        on_form_action(&mut terminal, &mut app, action).await.unwrap();

        assert_eq!(app.screen, AppScreen::Projects);
        assert!(app.detail_state.is_none());
        let project = app.projects_state.find("1").unwrap();
        assert_eq!(project.name, "Report bot v2");
        assert_eq!(project.status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn viewing_a_removed_project_reloads_the_list() {
        let (mut terminal, mut app, backend) = app_with(vec![sample_project("1", "Report bot")]);
        reload_projects(&mut terminal, &mut app).await.unwrap();
        backend.projects.lock().unwrap().clear();

        on_projects_action(&mut terminal, &mut app, ProjectAction::ViewProject("1".into()))
            .await
            .unwrap();

        assert_eq!(app.screen, AppScreen::Projects);
        assert_eq!(
            app.projects_state.error(),
            Some("Error loading project: Project not found")
        );
        assert!(row_ids(&app).is_empty());
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
    }
}
