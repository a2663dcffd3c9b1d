use crate::core::{
    ChartId, DataRequest, DataRequestId, DataRequestResult, GenerationRequest, NewSavedQuery,
    ProjectId, SavedQuery, SavedQueryId, TeamId, TemplateId,
};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to the backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend did not return a project id")]
    MissingProjectId,
}

/// Operations the dashboard backend performs on behalf of the client.
///
/// Every call is a single attempt; callers surface failures to the user and
/// never retry on their own.
pub trait DashboardBackend {
    fn create_project(&self) -> impl Future<Output = Result<ProjectId, BackendError>> + Send;

    fn generate_dashboard(
        &self,
        project_id: &ProjectId,
        request: &GenerationRequest,
        mode: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete_template(
        &self,
        team_id: &TeamId,
        template_id: &TemplateId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn create_saved_query(
        &self,
        project_id: &ProjectId,
        query: &NewSavedQuery,
    ) -> impl Future<Output = Result<SavedQuery, BackendError>> + Send;

    fn update_saved_query(
        &self,
        project_id: &ProjectId,
        saved_query_id: &SavedQueryId,
        query: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn save_data_request(
        &self,
        project_id: &ProjectId,
        chart_id: &ChartId,
        data_request: &DataRequest,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn run_data_request(
        &self,
        project_id: &ProjectId,
        chart_id: &ChartId,
        data_request_id: &DataRequestId,
        use_cache: bool,
    ) -> impl Future<Output = Result<DataRequestResult, BackendError>> + Send;
}
