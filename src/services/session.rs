use crate::action::Action;
use crate::component::Component;
use crate::services::backend::{BackendError, DashboardBackend};
use color_eyre::Result;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info};

/// Delay between a successful generation and reporting completion.
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(2000);

/// Drives one component against one backend.
///
/// Actions are applied one at a time. Backend requests produced by the
/// component are awaited before the next action is applied, and their
/// outcomes are fed back into the component.
pub struct Session<C, B> {
    component: C,
    backend: B,
    completion_delay: Duration,
}

impl<C: Component, B: DashboardBackend> Session<C, B> {
    pub fn new(component: C, backend: B) -> Self {
        Self {
            component,
            backend,
            completion_delay: DEFAULT_COMPLETION_DELAY,
        }
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply `action` and everything it sets off. Returns the actions meant
    /// for the user (notifications, completion, close requests) in order.
    pub async fn dispatch(&mut self, action: Action) -> Result<Vec<Action>> {
        let mut pending = VecDeque::from([action]);
        let mut surfaced = Vec::new();

        while let Some(next) = pending.pop_front() {
            debug!("{} <- {next}", self.component.name());
            match self.component.update(next)? {
                Some(effect) if effect.is_effect() => {
                    info!("Executing backend request {effect}");
                    pending.push_back(self.execute(effect).await);
                }
                Some(event) => surfaced.push(event),
                None => {}
            }
        }
        Ok(surfaced)
    }

    async fn execute(&self, effect: Action) -> Action {
        match effect {
            Action::CreateProject => match self.backend.create_project().await {
                Ok(project_id) => Action::ProjectCreated(project_id),
                Err(e) => Action::ProjectCreationFailed(report(e)),
            },
            Action::GenerateDashboard {
                project_id,
                request,
                mode,
            } => match self.backend.generate_dashboard(&project_id, &request, &mode).await {
                Ok(()) => {
                    tokio::time::sleep(self.completion_delay).await;
                    Action::GenerationSucceeded
                }
                Err(e) => Action::GenerationFailed(report(e)),
            },
            Action::RemoveTemplate {
                team_id,
                template_id,
            } => match self.backend.delete_template(&team_id, &template_id).await {
                Ok(()) => Action::TemplateDeleted(template_id),
                Err(e) => Action::TemplateDeleteFailed(report(e)),
            },
            Action::CreateSavedQuery { project_id, query } => {
                match self.backend.create_saved_query(&project_id, &query).await {
                    Ok(saved) => Action::SavedQueryCreated(saved),
                    Err(e) => Action::SavedQueryCreateFailed(report(e)),
                }
            }
            Action::PutSavedQuery {
                project_id,
                saved_query_id,
                query,
            } => match self
                .backend
                .update_saved_query(&project_id, &saved_query_id, &query)
                .await
            {
                Ok(()) => Action::SavedQueryUpdated,
                Err(e) => Action::SavedQueryUpdateFailed(report(e)),
            },
            Action::SaveDataRequest {
                project_id,
                chart_id,
                data_request,
                then_run,
            } => match self
                .backend
                .save_data_request(&project_id, &chart_id, &data_request)
                .await
            {
                Ok(()) => Action::DataRequestSaved { then_run },
                Err(e) => Action::DataRequestSaveFailed {
                    then_run,
                    message: report(e),
                },
            },
            Action::RunDataRequest {
                project_id,
                chart_id,
                data_request_id,
                use_cache,
            } => match self
                .backend
                .run_data_request(&project_id, &chart_id, &data_request_id, use_cache)
                .await
            {
                Ok(result) => Action::DataRequestRan(result),
                Err(e) => {
                    error!("Data request {data_request_id} failed: {e}");
                    Action::DataRequestFailed(error_payload(&e))
                }
            },
            other => Action::Error(format!("{other} is not a backend request")),
        }
    }
}

fn report(e: BackendError) -> String {
    error!("Backend request failed: {e}");
    e.to_string()
}

/// Error body as JSON when the backend sent JSON, otherwise the message.
fn error_payload(e: &BackendError) -> Value {
    match e {
        BackendError::Status { body, .. } => {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
        }
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_payload_prefers_json_body() {
        let json_body = BackendError::Status {
            status: 400,
            body: r#"{"error":"bad"}"#.to_string(),
        };
        let text_body = BackendError::Status {
            status: 500,
            body: "oops".to_string(),
        };

        assert_eq!(error_payload(&json_body), json!({ "error": "bad" }));
        assert_eq!(error_payload(&text_body), json!("oops"));
        assert_eq!(
            error_payload(&BackendError::MissingProjectId),
            json!("backend did not return a project id")
        );
    }
}
