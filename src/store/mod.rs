use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::api::{ApiError, ListQuery, ProjectBackend};
use crate::models::{CreateProjectData, Project, UpdateProjectData};

/// Identifies a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Projects,
    Project(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Projects => f.write_str("projects"),
            QueryKey::Project(id) => write!(f, "project/{id}"),
        }
    }
}

/// Lifecycle of a query as seen by the screens.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error(String),
}

struct Entry<T> {
    value: Option<T>,
    status: QueryStatus,
    stale: bool,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            value: None,
            status: QueryStatus::Idle,
            stale: true,
        }
    }
}

impl<T> Entry<T> {
    fn is_fresh(&self) -> bool {
        self.value.is_some() && !self.stale
    }
}

/// Local cache of server state.
///
/// Nothing here is authoritative: every successful mutation invalidates the
/// affected keys and the next read goes back to the server.
pub struct ProjectStore<B> {
    backend: B,
    list_query: ListQuery,
    list: Entry<Vec<Project>>,
    details: HashMap<String, Entry<Project>>,
}

impl<B: ProjectBackend> ProjectStore<B> {
    pub fn new(backend: B, list_query: ListQuery) -> Self {
        Self {
            backend,
            list_query,
            list: Entry::default(),
            details: HashMap::new(),
        }
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        match key {
            QueryKey::Projects => self.list.status.clone(),
            QueryKey::Project(id) => self
                .details
                .get(id)
                .map(|entry| entry.status.clone())
                .unwrap_or(QueryStatus::Idle),
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::Projects => !self.list.is_fresh(),
            QueryKey::Project(id) => self.details.get(id).is_none_or(|entry| !entry.is_fresh()),
        }
    }

    /// Mark a key so the next read refetches it. The old value stays
    /// readable through [`ProjectStore::cached_projects`] until then.
    pub fn invalidate(&mut self, key: &QueryKey) {
        debug!(%key, "invalidating query");
        match key {
            QueryKey::Projects => self.list.stale = true,
            QueryKey::Project(id) => {
                if let Some(entry) = self.details.get_mut(id) {
                    entry.stale = true;
                }
            }
        }
    }

    /// Flag a query as loading ahead of its fetch so a screen can show
    /// that before the request goes out. Returns false when the cached
    /// value is still fresh and no request will be made.
    pub fn begin(&mut self, key: &QueryKey) -> bool {
        let (fresh, status) = match key {
            QueryKey::Projects => (self.list.is_fresh(), &mut self.list.status),
            QueryKey::Project(id) => {
                let entry = self.details.entry(id.clone()).or_default();
                (entry.is_fresh(), &mut entry.status)
            }
        };
        if !fresh {
            *status = QueryStatus::Loading;
        }
        !fresh
    }

    pub fn cached_projects(&self) -> Option<&[Project]> {
        self.list.value.as_deref()
    }

    /// The project list, fetched when missing or invalidated.
    ///
    /// Failed fetches are not retried; the error is kept on the query and
    /// returned to the caller.
    pub async fn projects(&mut self) -> Result<&[Project], ApiError> {
        if !self.list.is_fresh() {
            self.list.status = QueryStatus::Loading;
            match self.backend.list_projects(self.list_query).await {
                Ok(projects) => {
                    info!(count = projects.len(), "project list loaded");
                    self.list.value = Some(projects);
                    self.list.stale = false;
                    self.list.status = QueryStatus::Success;
                }
                Err(err) => {
                    warn!(error = %err, "failed to load project list");
                    self.list.status = QueryStatus::Error(err.user_message());
                    return Err(err);
                }
            }
        }

        Ok(self.list.value.as_deref().unwrap_or_default())
    }

    /// A single project, fetched when missing or invalidated.
    pub async fn project(&mut self, id: &str) -> Result<Project, ApiError> {
        let entry = self.details.entry(id.to_string()).or_default();
        if let (true, Some(project)) = (entry.is_fresh(), &entry.value) {
            return Ok(project.clone());
        }

        entry.status = QueryStatus::Loading;
        match self.backend.get_project(id).await {
            Ok(project) => {
                entry.value = Some(project.clone());
                entry.stale = false;
                entry.status = QueryStatus::Success;
                Ok(project)
            }
            Err(err) if err.is_not_found() => {
                // Removed on the server; the list no longer matches either.
                warn!(%id, "project no longer exists");
                self.details.remove(id);
                self.invalidate(&QueryKey::Projects);
                Err(err)
            }
            Err(err) => {
                warn!(%id, error = %err, "failed to load project");
                entry.status = QueryStatus::Error(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn create(&mut self, data: &CreateProjectData) -> Result<(), ApiError> {
        self.backend.create_project(data).await?;
        info!(name = %data.name, "project created");
        self.invalidate(&QueryKey::Projects);
        Ok(())
    }

    pub async fn update(&mut self, id: &str, data: &UpdateProjectData) -> Result<(), ApiError> {
        self.backend.update_project(id, data).await?;
        info!(%id, "project updated");
        self.invalidate(&QueryKey::Projects);
        self.invalidate(&QueryKey::Project(id.to_string()));
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        self.backend.delete_project(id).await?;
        info!(%id, "project deleted");
        self.invalidate(&QueryKey::Projects);
        self.details.remove(id);
        Ok(())
    }
}
