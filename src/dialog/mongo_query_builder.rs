//! MongoQueryBuilder: edit, save and test-run the MongoDB query of a data request
use crate::action::Action;
use crate::component::Component;
use crate::core::{
    ChartId, DataRequest, DataRequestResponse, NewSavedQuery, ProjectId, SavedQuery, SavedQueryId,
};
use color_eyre::Result;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_MONGO_QUERY: &str = "collection('users').find()";
pub const SAVED_QUERY_TYPE: &str = "mongodb";

#[derive(Debug, Clone)]
pub struct MongoQueryBuilder {
    pub project_id: ProjectId,
    pub chart_id: ChartId,
    pub request: DataRequest,
    pub saved_query: Option<SavedQueryId>,
    pub invalidate_cache: bool,
    pub saving_query: bool,
    pub updating_saved_query: bool,
    pub testing_query: bool,
    pub save_loading: bool,
    pub test_success: bool,
    pub test_error: bool,
    /// Pretty-printed JSON of the latest response or error
    pub result: String,
}

impl MongoQueryBuilder {
    /// Open the builder on an existing data request. A request without a
    /// query starts from [`DEFAULT_MONGO_QUERY`].
    pub fn new(project_id: ProjectId, chart_id: ChartId, mut request: DataRequest) -> Self {
        if request.query.as_deref().is_none_or(str::is_empty) {
            request.query = Some(DEFAULT_MONGO_QUERY.to_string());
        }
        Self {
            project_id,
            chart_id,
            request,
            saved_query: None,
            invalidate_cache: false,
            saving_query: false,
            updating_saved_query: false,
            testing_query: false,
            save_loading: false,
            test_success: false,
            test_error: false,
            result: String::new(),
        }
    }

    pub fn query(&self) -> &str {
        self.request.query.as_deref().unwrap_or_default()
    }

    pub fn use_cache(&self) -> bool {
        !self.invalidate_cache
    }

    fn save_request(&self, then_run: bool) -> Action {
        Action::SaveDataRequest {
            project_id: self.project_id.clone(),
            chart_id: self.chart_id.clone(),
            data_request: self.request.clone(),
            then_run,
        }
    }

    fn pretty(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

/// A run succeeds when its status is missing or set to anything but
/// null, false, zero or an empty string.
fn status_succeeded(status: Option<&Value>) -> bool {
    match status {
        None => true,
        Some(Value::Null) => false,
        Some(Value::Bool(ok)) => *ok,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

impl Component for MongoQueryBuilder {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ChangeQuery(query) => self.request.query = Some(query),
            Action::ToggleUseCache => self.invalidate_cache = !self.invalidate_cache,
            Action::SaveQuery { summary } => {
                if summary.trim().is_empty() {
                    debug!("Saved query needs a summary");
                    return Ok(None);
                }
                self.saving_query = true;
                return Ok(Some(Action::CreateSavedQuery {
                    project_id: self.project_id.clone(),
                    query: NewSavedQuery {
                        query: self.query().to_string(),
                        summary,
                        kind: SAVED_QUERY_TYPE.to_string(),
                    },
                }));
            }
            Action::SavedQueryCreated(saved) => {
                self.saving_query = false;
                self.saved_query = Some(saved.id);
                return Ok(Some(Action::Notify("The query was saved".to_string())));
            }
            Action::SavedQueryCreateFailed(_) => {
                self.saving_query = false;
                return Ok(Some(Action::Error(
                    "We couldn't save the query. Please try again".to_string(),
                )));
            }
            Action::UpdateSavedQuery => {
                let Some(saved_query_id) = self.saved_query.clone() else {
                    debug!("No saved query selected to update");
                    return Ok(None);
                };
                self.updating_saved_query = true;
                return Ok(Some(Action::PutSavedQuery {
                    project_id: self.project_id.clone(),
                    saved_query_id,
                    query: self.query().to_string(),
                }));
            }
            Action::SavedQueryUpdated => {
                self.updating_saved_query = false;
                return Ok(Some(Action::Notify("The query was updated".to_string())));
            }
            Action::SavedQueryUpdateFailed(_) => {
                self.updating_saved_query = false;
                return Ok(Some(Action::Error(
                    "We couldn't update your query. Please try again".to_string(),
                )));
            }
            Action::SelectSavedQuery(SavedQuery { id, query, .. }) => {
                self.saved_query = Some(id);
                self.request.query = Some(query);
            }
            Action::RunQuery => {
                self.testing_query = true;
                self.test_success = false;
                self.test_error = false;
                return Ok(Some(self.save_request(true)));
            }
            Action::SaveRequest => {
                self.save_loading = true;
                return Ok(Some(self.save_request(false)));
            }
            Action::DataRequestSaved { then_run } => {
                if then_run {
                    return Ok(Some(Action::RunDataRequest {
                        project_id: self.project_id.clone(),
                        chart_id: self.chart_id.clone(),
                        data_request_id: self.request.id.clone(),
                        use_cache: self.use_cache(),
                    }));
                }
                self.save_loading = false;
            }
            Action::DataRequestSaveFailed { then_run, message } => {
                self.save_loading = false;
                if then_run {
                    self.testing_query = false;
                    self.test_error = true;
                }
                return Ok(Some(Action::Error(format!("Could not save the request: {message}"))));
            }
            Action::DataRequestRan(result) => {
                self.testing_query = false;
                self.test_success = status_succeeded(result.status.as_ref());
                if let Some(data) = &result.data {
                    self.result = Self::pretty(data);
                }
            }
            Action::DataRequestFailed(error) => {
                self.testing_query = false;
                self.test_error = true;
                self.result = Self::pretty(&error);
                return Ok(Some(Action::Error(
                    "The request failed. Please check your query".to_string(),
                )));
            }
            Action::ResponsesUpdated(responses) => {
                let latest = responses
                    .iter()
                    .find(|r: &&DataRequestResponse| r.id == self.request.id)
                    .and_then(|r| r.data.as_ref());
                if let Some(data) = latest {
                    self.result = Self::pretty(data);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "MongoQueryBuilder"
    }
}
