mod error;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::models::{CreateProjectData, Project, UpdateProjectData};

pub use error::ApiError;

const PREFIX: &str = "project";

/// Paging parameters understood by `GET /project`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: u32,
    pub items_page: u32,
}

impl ListQuery {
    /// First page holding up to `limit` projects.
    pub fn first(limit: u32) -> Self {
        Self {
            page: 1,
            items_page: limit,
        }
    }
}

#[derive(Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

/// Remote operations on projects.
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    async fn list_projects(&self, query: ListQuery) -> Result<Vec<Project>, ApiError>;
    async fn get_project(&self, id: &str) -> Result<Project, ApiError>;
    async fn create_project(&self, data: &CreateProjectData) -> Result<(), ApiError>;
    async fn update_project(&self, id: &str, data: &UpdateProjectData) -> Result<(), ApiError>;
    async fn delete_project(&self, id: &str) -> Result<(), ApiError>;
}

/// HTTP client for the project API
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(http, config.api_url.clone()))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(PREFIX);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = error::server_message(status, &body);
    warn!(%url, %status, %message, "api request rejected");

    Err(ApiError::Status { status, message })
}

#[async_trait]
impl ProjectBackend for ApiClient {
    async fn list_projects(&self, query: ListQuery) -> Result<Vec<Project>, ApiError> {
        let url = self.endpoint(None)?;
        debug!(%url, page = query.page, items_page = query.items_page, "listing projects");

        let response = check(self.http.get(url).query(&query).send().await?).await?;
        let body = response.text().await?;
        let list: ProjectList = serde_json::from_str(&body)?;

        Ok(list.projects)
    }

    async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, "fetching project");

        let response = check(self.http.get(url).send().await?).await?;
        let body = response.text().await?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn create_project(&self, data: &CreateProjectData) -> Result<(), ApiError> {
        let url = self.endpoint(None)?;
        debug!(%url, name = %data.name, "creating project");

        check(self.http.post(url).json(data).send().await?).await?;
        Ok(())
    }

    async fn update_project(&self, id: &str, data: &UpdateProjectData) -> Result<(), ApiError> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, "updating project");

        check(self.http.put(url).json(data).send().await?).await?;
        Ok(())
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, "deleting project");

        check(self.http.delete(url).send().await?).await?;
        Ok(())
    }
}
