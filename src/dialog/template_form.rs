//! TemplateForm: generate a dashboard from a custom template
use crate::action::Action;
use crate::component::Component;
use crate::core::{Connection, ConnectionId, GenerationRequest, ProjectId, Template};
use crate::dialog::template_selection::{ChartToggle, TemplateSelection};
use crate::services::connection_matcher::CompatibilityReport;
use color_eyre::Result;
use strum::Display;
use tracing::{debug, info, warn};

/// Generation mode for dashboards built from user templates.
pub const CUSTOM_TEMPLATE_MODE: &str = "custom";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum FormStatus {
    #[default]
    Idle,
    /// Generation was requested before a project existed
    WaitingForProject,
}

#[derive(Debug, Clone)]
pub struct TemplateForm {
    pub template: Template,
    pub selection: TemplateSelection,
    pub compatibility: CompatibilityReport,
    pub project_id: Option<ProjectId>,
    pub is_admin: bool,
    pub is_creating: bool,
    pub delete_loading: bool,
    pub status: FormStatus,
}

impl TemplateForm {
    pub fn new(
        template: Template,
        connections: &[Connection],
        project_id: Option<ProjectId>,
    ) -> Self {
        let selection = TemplateSelection::new(&template);
        let compatibility = CompatibilityReport::build(&template, connections);
        Self {
            template,
            selection,
            compatibility,
            project_id,
            is_admin: false,
            is_creating: false,
            delete_loading: false,
            status: FormStatus::Idle,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Replace the template. Selections from the previous template are dropped.
    pub fn load_template(&mut self, template: Template, connections: &[Connection]) {
        info!("Loading template {} ({})", template.id, template.name);
        self.selection = TemplateSelection::new(&template);
        self.compatibility = CompatibilityReport::build(&template, connections);
        self.template = template;
    }

    /// Whether "new connection" is in effect for a template connection: either
    /// the user asked for it or nothing existing can be reused.
    pub fn effective_create_new(&self, cid: &ConnectionId) -> bool {
        let requested = self.selection.connection(cid).is_some_and(|c| c.create_new);
        let forced = self.compatibility.get(cid).is_none_or(|c| c.must_create_new());
        requested || forced
    }

    pub fn can_generate(&self) -> bool {
        !self.is_creating && !self.selection.selected_charts().is_empty()
    }

    pub fn generation_request(&self) -> GenerationRequest {
        self.selection.to_request()
    }

    fn generate_into(&self, project_id: ProjectId) -> Action {
        Action::GenerateDashboard {
            project_id,
            request: self.generation_request(),
            mode: CUSTOM_TEMPLATE_MODE.to_string(),
        }
    }

    fn begin_generation(&mut self) -> Option<Action> {
        if self.is_creating {
            debug!("Generation already in progress");
            return None;
        }
        if self.selection.selected_charts().is_empty() {
            debug!("No charts selected, nothing to generate");
            return None;
        }

        self.is_creating = true;
        match self.project_id.clone() {
            Some(project_id) => Some(self.generate_into(project_id)),
            None => {
                info!("No project yet, requesting one before generating");
                self.status = FormStatus::WaitingForProject;
                Some(Action::CreateProject)
            }
        }
    }

    fn begin_delete(&mut self) -> Option<Action> {
        if !self.is_admin {
            warn!("Template deletion requested without admin rights");
            return None;
        }
        match self.template.team_id.clone() {
            Some(team_id) => {
                self.delete_loading = true;
                Some(Action::RemoveTemplate {
                    team_id,
                    template_id: self.template.id.clone(),
                })
            }
            None => Some(Action::Error(format!(
                "Template {} does not belong to a team and cannot be deleted",
                self.template.id
            ))),
        }
    }
}

impl Component for TemplateForm {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ToggleConnectionActive(cid) => {
                let dropped = self.selection.toggle_connection_active(&cid);
                if !dropped.is_empty() {
                    return Ok(Some(Action::ChartsDeselected(dropped)));
                }
            }
            Action::ToggleCreateNew(cid) => {
                if self.compatibility.get(&cid).is_some_and(|c| c.must_create_new()) {
                    debug!("Connection {cid} has no existing match, new connection is required");
                } else {
                    self.selection.toggle_create_new(&cid);
                }
            }
            Action::ToggleChartSelected(tid) => {
                if let ChartToggle::Blocked { dependency } =
                    self.selection.toggle_chart_selected(&tid)
                {
                    return Ok(Some(Action::ChartBlocked { tid, dependency }));
                }
            }
            Action::SelectAllCharts => self.selection.select_all(),
            Action::DeselectAllCharts => self.selection.deselect_all(),
            Action::GenerateFromTemplate => return Ok(self.begin_generation()),
            Action::ProjectCreated(project_id) => {
                self.project_id = Some(project_id.clone());
                if self.status == FormStatus::WaitingForProject {
                    self.status = FormStatus::Idle;
                    return Ok(Some(self.generate_into(project_id)));
                }
            }
            Action::ProjectCreationFailed(message) => {
                self.is_creating = false;
                self.status = FormStatus::Idle;
                return Ok(Some(Action::Error(format!("Could not create a project: {message}"))));
            }
            Action::GenerationSucceeded => {
                self.is_creating = false;
                return Ok(Some(Action::GenerationComplete));
            }
            Action::GenerationFailed(message) => {
                self.is_creating = false;
                return Ok(Some(Action::Error(format!(
                    "Could not generate the dashboard: {message}"
                ))));
            }
            Action::DeleteTemplate => return Ok(self.begin_delete()),
            Action::TemplateDeleted(_) => {
                self.delete_loading = false;
                return Ok(Some(Action::DialogClose));
            }
            Action::TemplateDeleteFailed(message) => {
                self.delete_loading = false;
                return Ok(Some(Action::Error(format!("Could not delete the template: {message}"))));
            }
            _ => {}
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "TemplateForm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ChartDeclaration, ChartTid, ConnectionKind, DatasetDeclaration, TeamId, TemplateId,
        TemplateModel,
    };
    use pretty_assertions::assert_eq;

    fn template() -> Template {
        let chart = |tid: i64, cid: i64| ChartDeclaration {
            tid: ChartTid::from(tid),
            name: format!("Chart {tid}"),
            datasets: vec![DatasetDeclaration {
                connection: Some(ConnectionId::from(cid)),
                legend: None,
                query: None,
            }],
        };
        Template {
            id: TemplateId::from(7),
            name: "Growth".to_string(),
            team_id: Some(TeamId::from(3)),
            model: TemplateModel {
                connections: vec![
                    Connection::new(1, "Mongo", ConnectionKind::MongoDb).with_db_name("app"),
                    Connection::new(2, "Stripe", ConnectionKind::Api)
                        .with_host("https://api.stripe.com"),
                ],
                charts: vec![chart(10, 1), chart(20, 2)],
            },
        }
    }

    fn existing() -> Vec<Connection> {
        vec![Connection::new(5, "Prod", ConnectionKind::MongoDb).with_db_name("app")]
    }

    #[test]
    fn test_submit_without_project_waits_for_one() {
        let mut form = TemplateForm::new(template(), &existing(), None);

        let first = form.update(Action::GenerateFromTemplate).unwrap();
        assert_eq!(first, Some(Action::CreateProject));
        assert!(form.is_creating);
        assert_eq!(form.status, FormStatus::WaitingForProject);

        assert_eq!(form.update(Action::GenerateFromTemplate).unwrap(), None);

        let resumed = form.update(Action::ProjectCreated(ProjectId::from(44))).unwrap();
        assert_eq!(
            resumed,
            Some(Action::GenerateDashboard {
                project_id: ProjectId::from(44),
                request: form.generation_request(),
                mode: "custom".to_string(),
            })
        );
        assert_eq!(form.status, FormStatus::Idle);

        assert_eq!(form.update(Action::ProjectCreated(ProjectId::from(44))).unwrap(), None);
    }

    #[test]
    fn test_submit_with_project_generates_immediately() {
        let mut form = TemplateForm::new(template(), &existing(), Some(ProjectId::from(9)));

        match form.update(Action::GenerateFromTemplate).unwrap() {
            Some(Action::GenerateDashboard { project_id, request, mode }) => {
                assert_eq!(project_id, ProjectId::from(9));
                assert_eq!(request.charts, vec![ChartTid::from(10), ChartTid::from(20)]);
                assert_eq!(mode, CUSTOM_TEMPLATE_MODE);
            }
            other => panic!("expected generation request, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_ignored_without_charts() {
        let mut form = TemplateForm::new(template(), &existing(), Some(ProjectId::from(9)));
        form.update(Action::DeselectAllCharts).unwrap();

        assert!(!form.can_generate());
        assert_eq!(form.update(Action::GenerateFromTemplate).unwrap(), None);
        assert!(!form.is_creating);
    }

    #[test]
    fn test_failure_clears_flag_and_keeps_selection() {
        let mut form = TemplateForm::new(template(), &existing(), Some(ProjectId::from(9)));
        form.update(Action::ToggleChartSelected(ChartTid::from(20))).unwrap();
        form.update(Action::GenerateFromTemplate).unwrap();

        let outcome = form.update(Action::GenerationFailed("502".to_string())).unwrap();
        assert!(matches!(outcome, Some(Action::Error(_))));
        assert!(!form.is_creating);
        assert_eq!(form.generation_request().charts, vec![ChartTid::from(10)]);
        assert!(form.can_generate(), "the user may resubmit");
    }

    #[test]
    fn test_success_completes() {
        let mut form = TemplateForm::new(template(), &existing(), Some(ProjectId::from(9)));
        form.update(Action::GenerateFromTemplate).unwrap();

        assert_eq!(
            form.update(Action::GenerationSucceeded).unwrap(),
            Some(Action::GenerationComplete)
        );
        assert!(!form.is_creating);
    }

    #[test]
    fn test_deactivation_reports_dropped_charts() {
        let mut form = TemplateForm::new(template(), &existing(), None);

        let outcome = form.update(Action::ToggleConnectionActive(ConnectionId::from(2))).unwrap();
        assert_eq!(outcome, Some(Action::ChartsDeselected(vec![ChartTid::from(20)])));

        let blocked = form.update(Action::ToggleChartSelected(ChartTid::from(20))).unwrap();
        assert_eq!(
            blocked,
            Some(Action::ChartBlocked {
                tid: ChartTid::from(20),
                dependency: "Stripe".to_string(),
            })
        );
    }

    #[test]
    fn test_create_new_is_forced_without_matches() {
        let mut form = TemplateForm::new(template(), &existing(), None);
        let mongo = ConnectionId::from(1);
        let stripe = ConnectionId::from(2);

        assert!(!form.effective_create_new(&mongo));
        assert!(form.effective_create_new(&stripe));

        form.update(Action::ToggleCreateNew(stripe.clone())).unwrap();
        assert!(!form.selection.connection(&stripe).unwrap().create_new);

        form.update(Action::ToggleCreateNew(mongo.clone())).unwrap();
        assert!(form.effective_create_new(&mongo));
    }

    #[test]
    fn test_load_template_replaces_state() {
        let mut form = TemplateForm::new(template(), &existing(), None);
        form.update(Action::DeselectAllCharts).unwrap();

        let mut other = template();
        other.id = TemplateId::from(8);
        other.model.charts.truncate(1);
        form.load_template(other, &existing());

        assert_eq!(form.selection.template_id(), &TemplateId::from(8));
        assert_eq!(form.generation_request().charts, vec![ChartTid::from(10)]);
    }

    #[test]
    fn test_delete_requires_admin() {
        let mut form = TemplateForm::new(template(), &existing(), None);
        assert_eq!(form.update(Action::DeleteTemplate).unwrap(), None);

        let mut admin = TemplateForm::new(template(), &existing(), None).with_admin(true);
        assert_eq!(
            admin.update(Action::DeleteTemplate).unwrap(),
            Some(Action::RemoveTemplate {
                team_id: TeamId::from(3),
                template_id: TemplateId::from(7),
            })
        );
        assert!(admin.delete_loading);
        assert_eq!(
            admin.update(Action::TemplateDeleted(TemplateId::from(7))).unwrap(),
            Some(Action::DialogClose)
        );
        assert!(!admin.delete_loading);
    }
}
