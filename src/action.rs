use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use crate::core::{
    ChartId, ChartTid, ConnectionId, DataRequest, DataRequestId, DataRequestResponse,
    DataRequestResult, GenerationRequest, NewSavedQuery, ProjectId, SavedQuery, SavedQueryId,
    TeamId, TemplateId,
};

/// High-level actions flowing between the user, components and the backend.
///
/// User intents and backend outcomes are fed into components; components
/// answer with at most one follow-up action. Follow-ups for which
/// [`Action::is_effect`] is true are requests for the backend and are executed
/// by a [`crate::services::Session`]; anything else is surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
pub enum Action {
    /// Close the active form
    DialogClose,
    /// Transient error notification for the user
    Error(String),
    /// Transient success notification for the user
    Notify(String),

    /// User flipped a template connection on or off
    ToggleConnectionActive(ConnectionId),
    /// User flipped "new connection" for a template connection
    ToggleCreateNew(ConnectionId),
    /// User checked or unchecked a template chart
    ToggleChartSelected(ChartTid),
    SelectAllCharts,
    DeselectAllCharts,
    /// Charts dropped because a connection they need was deactivated
    ChartsDeselected(Vec<ChartTid>),
    /// Chart could not be selected because it depends on an inactive connection
    ChartBlocked { tid: ChartTid, dependency: String },
    /// User pressed "Generate from template"
    GenerateFromTemplate,
    /// Admin requested deletion of the current template
    DeleteTemplate,

    /// Backend: create a project to generate into
    CreateProject,
    /// Backend: generate a dashboard from a template
    GenerateDashboard {
        project_id: ProjectId,
        request: GenerationRequest,
        mode: String,
    },
    /// Backend: delete a template
    RemoveTemplate {
        team_id: TeamId,
        template_id: TemplateId,
    },
    ProjectCreated(ProjectId),
    ProjectCreationFailed(String),
    GenerationSucceeded,
    GenerationFailed(String),
    /// Generation finished and the completion delay elapsed
    GenerationComplete,
    TemplateDeleted(TemplateId),
    TemplateDeleteFailed(String),

    /// User edited the query text
    ChangeQuery(String),
    /// User flipped "Use cache"
    ToggleUseCache,
    /// User confirmed saving the query with a summary
    SaveQuery { summary: String },
    /// User asked to overwrite the selected saved query
    UpdateSavedQuery,
    /// User picked a saved query from the list
    SelectSavedQuery(SavedQuery),
    /// User pressed "Run query"
    RunQuery,
    /// User pressed "Save"
    SaveRequest,
    /// Latest cached responses for the project's data requests
    ResponsesUpdated(Vec<DataRequestResponse>),

    /// Backend: create a saved query
    CreateSavedQuery {
        project_id: ProjectId,
        query: NewSavedQuery,
    },
    /// Backend: overwrite a saved query's text
    PutSavedQuery {
        project_id: ProjectId,
        saved_query_id: SavedQueryId,
        query: String,
    },
    /// Backend: persist a data request, optionally running it afterwards
    SaveDataRequest {
        project_id: ProjectId,
        chart_id: ChartId,
        data_request: DataRequest,
        then_run: bool,
    },
    /// Backend: run a data request
    RunDataRequest {
        project_id: ProjectId,
        chart_id: ChartId,
        data_request_id: DataRequestId,
        use_cache: bool,
    },
    SavedQueryCreated(SavedQuery),
    SavedQueryCreateFailed(String),
    SavedQueryUpdated,
    SavedQueryUpdateFailed(String),
    DataRequestSaved { then_run: bool },
    DataRequestSaveFailed { then_run: bool, message: String },
    DataRequestRan(DataRequestResult),
    DataRequestFailed(Value),
}

impl Action {
    /// Whether this action asks the backend to do something.
    pub fn is_effect(&self) -> bool {
        matches!(
            self,
            Self::CreateProject
                | Self::GenerateDashboard { .. }
                | Self::RemoveTemplate { .. }
                | Self::CreateSavedQuery { .. }
                | Self::PutSavedQuery { .. }
                | Self::SaveDataRequest { .. }
                | Self::RunDataRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display() {
        let toggle = Action::ToggleConnectionActive(ConnectionId::from(3));
        let create = Action::CreateProject;
        assert_eq!(format!("{toggle}"), "ToggleConnectionActive");
        assert_eq!(format!("{create}"), "CreateProject");
    }

    #[test]
    fn test_effects_are_backend_requests() {
        assert!(Action::CreateProject.is_effect());
        assert!(
            Action::RemoveTemplate {
                team_id: TeamId::from(1),
                template_id: TemplateId::from(2),
            }
            .is_effect()
        );
        assert!(!Action::GenerateFromTemplate.is_effect());
        assert!(!Action::ProjectCreated(ProjectId::from(1)).is_effect());
        assert!(!Action::Error("boom".to_string()).is_effect());
    }
}
