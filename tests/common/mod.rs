//! Shared fixtures and an in-memory backend for the integration tests

#![allow(dead_code)]

use chartmold::core::{
    ChartId, Connection, DataRequest, DataRequestId, DataRequestResult, GenerationRequest,
    NewSavedQuery, ProjectId, SavedQuery, SavedQueryId, TeamId, Template, TemplateId,
};
use chartmold::services::{BackendError, DashboardBackend};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Mutex;

pub fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sample-data").join(name)
}

pub fn load_template() -> Template {
    let text = std::fs::read_to_string(sample_path("template.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

pub fn load_connections() -> Vec<Connection> {
    let text = std::fs::read_to_string(sample_path("connections.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// A backend call as the recording backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProject,
    Generate {
        project_id: ProjectId,
        request: GenerationRequest,
        mode: String,
    },
    DeleteTemplate {
        team_id: TeamId,
        template_id: TemplateId,
    },
    CreateSavedQuery(NewSavedQuery),
    UpdateSavedQuery(SavedQueryId, String),
    SaveDataRequest(DataRequest),
    RunDataRequest {
        data_request_id: DataRequestId,
        use_cache: bool,
    },
}

/// Records every call and answers from canned values.
pub struct RecordingBackend {
    pub calls: Mutex<Vec<Call>>,
    pub project_id: ProjectId,
    pub fail_project: bool,
    pub fail_generate: bool,
    pub fail_run: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            project_id: ProjectId::from(99),
            fail_project: false,
            fail_generate: false,
            fail_run: false,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn status(body: &str) -> BackendError {
        BackendError::Status {
            status: 500,
            body: body.to_string(),
        }
    }
}

impl DashboardBackend for RecordingBackend {
    async fn create_project(&self) -> Result<ProjectId, BackendError> {
        self.record(Call::CreateProject);
        if self.fail_project {
            return Err(Self::status("project limit reached"));
        }
        Ok(self.project_id.clone())
    }

    async fn generate_dashboard(
        &self,
        project_id: &ProjectId,
        request: &GenerationRequest,
        mode: &str,
    ) -> Result<(), BackendError> {
        self.record(Call::Generate {
            project_id: project_id.clone(),
            request: request.clone(),
            mode: mode.to_string(),
        });
        if self.fail_generate {
            return Err(Self::status("template is broken"));
        }
        Ok(())
    }

    async fn delete_template(
        &self,
        team_id: &TeamId,
        template_id: &TemplateId,
    ) -> Result<(), BackendError> {
        self.record(Call::DeleteTemplate {
            team_id: team_id.clone(),
            template_id: template_id.clone(),
        });
        Ok(())
    }

    async fn create_saved_query(
        &self,
        _project_id: &ProjectId,
        query: &NewSavedQuery,
    ) -> Result<SavedQuery, BackendError> {
        self.record(Call::CreateSavedQuery(query.clone()));
        Ok(SavedQuery {
            id: SavedQueryId::from(501),
            query: query.query.clone(),
            summary: query.summary.clone(),
            kind: query.kind.clone(),
        })
    }

    async fn update_saved_query(
        &self,
        _project_id: &ProjectId,
        saved_query_id: &SavedQueryId,
        query: &str,
    ) -> Result<(), BackendError> {
        self.record(Call::UpdateSavedQuery(saved_query_id.clone(), query.to_string()));
        Ok(())
    }

    async fn save_data_request(
        &self,
        _project_id: &ProjectId,
        _chart_id: &ChartId,
        data_request: &DataRequest,
    ) -> Result<(), BackendError> {
        self.record(Call::SaveDataRequest(data_request.clone()));
        Ok(())
    }

    async fn run_data_request(
        &self,
        _project_id: &ProjectId,
        _chart_id: &ChartId,
        data_request_id: &DataRequestId,
        use_cache: bool,
    ) -> Result<DataRequestResult, BackendError> {
        self.record(Call::RunDataRequest {
            data_request_id: data_request_id.clone(),
            use_cache,
        });
        if self.fail_run {
            return Err(Self::status(r#"{"error":"collection not found"}"#));
        }
        Ok(DataRequestResult {
            status: Some(json!(200)),
            data: Some(json!([{ "email": "ada@example.com" }])),
        })
    }
}
