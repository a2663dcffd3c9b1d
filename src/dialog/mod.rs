pub mod mongo_query_builder;
pub mod template_form;
pub mod template_selection;

pub use mongo_query_builder::{MongoQueryBuilder, DEFAULT_MONGO_QUERY};
pub use template_form::{FormStatus, TemplateForm, CUSTOM_TEMPLATE_MODE};
pub use template_selection::{ChartToggle, DependencyWarning, SelectedCharts, TemplateSelection};
