use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::core::{
    ChartId, DataRequest, DataRequestId, DataRequestResult, GenerationRequest, NewSavedQuery,
    ProjectId, SavedQuery, SavedQueryId, TeamId, TemplateId,
};
use crate::services::backend::{BackendError, DashboardBackend};

/// HTTP client for the dashboard backend API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    api_host: String,
    api_token: Option<String>,
    team_id: Option<TeamId>,
    project_name: String,
}

impl ApiClient {
    pub fn new<S: Into<String>>(api_host: S) -> Result<Self, BackendError> {
        let http = HttpClient::builder()
            .user_agent(concat!("chartmold/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_host: api_host.into().trim_end_matches('/').to_string(),
            api_token: None,
            team_id: None,
            project_name: "New dashboard".to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let mut client = Self::new(config.api.api_host.clone())?;
        client.api_token = config.api.api_token.clone().filter(|t| !t.trim().is_empty());
        client.team_id = config.api.team_id.clone();
        client.project_name = config.api.project_name.clone();
        Ok(client)
    }

    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_host, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{method} {url}");
        let builder = self.http.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn checked(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<(), BackendError> {
        Self::checked(builder.send().await?).await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        Ok(Self::checked(builder.send().await?).await?.json().await?)
    }
}

#[derive(Deserialize)]
struct CreatedProject {
    #[serde(default)]
    id: Option<ProjectId>,
}

impl DashboardBackend for ApiClient {
    async fn create_project(&self) -> Result<ProjectId, BackendError> {
        let body = json!({ "name": self.project_name, "team_id": self.team_id });
        let created: CreatedProject =
            Self::send_json(self.request(Method::POST, "project").json(&body)).await?;
        created.id.ok_or(BackendError::MissingProjectId)
    }

    async fn generate_dashboard(
        &self,
        project_id: &ProjectId,
        request: &GenerationRequest,
        mode: &str,
    ) -> Result<(), BackendError> {
        let path = format!("project/{project_id}/template/{mode}");
        Self::send(self.request(Method::POST, &path).json(request)).await
    }

    async fn delete_template(
        &self,
        team_id: &TeamId,
        template_id: &TemplateId,
    ) -> Result<(), BackendError> {
        let path = format!("team/{team_id}/template/{template_id}");
        Self::send(self.request(Method::DELETE, &path)).await
    }

    async fn create_saved_query(
        &self,
        project_id: &ProjectId,
        query: &NewSavedQuery,
    ) -> Result<SavedQuery, BackendError> {
        let path = format!("project/{project_id}/savedQuery");
        Self::send_json(self.request(Method::POST, &path).json(query)).await
    }

    async fn update_saved_query(
        &self,
        project_id: &ProjectId,
        saved_query_id: &SavedQueryId,
        query: &str,
    ) -> Result<(), BackendError> {
        let path = format!("project/{project_id}/savedQuery/{saved_query_id}");
        Self::send(self.request(Method::PUT, &path).json(&json!({ "query": query }))).await
    }

    async fn save_data_request(
        &self,
        project_id: &ProjectId,
        chart_id: &ChartId,
        data_request: &DataRequest,
    ) -> Result<(), BackendError> {
        let path = format!(
            "project/{project_id}/chart/{chart_id}/dataRequest/{}",
            data_request.id
        );
        Self::send(self.request(Method::PUT, &path).json(data_request)).await
    }

    async fn run_data_request(
        &self,
        project_id: &ProjectId,
        chart_id: &ChartId,
        data_request_id: &DataRequestId,
        use_cache: bool,
    ) -> Result<DataRequestResult, BackendError> {
        let path =
            format!("project/{project_id}/chart/{chart_id}/dataRequest/{data_request_id}/request");
        Self::send_json(
            self.request(Method::POST, &path)
                .json(&json!({ "getCache": use_cache })),
        )
        .await
    }
}
