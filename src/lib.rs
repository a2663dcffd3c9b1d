#![allow(clippy::collapsible_if)]

pub mod action;
pub mod component;
pub mod config;
pub mod core;
pub mod dialog;
pub mod logging;
pub mod providers;
pub mod services;

// Re-export commonly used types
pub use action::Action;
pub use component::Component;
pub use core::{Connection, ConnectionId, ConnectionKind, GenerationRequest, Template};
pub use dialog::{MongoQueryBuilder, TemplateForm, TemplateSelection};
pub use providers::ApiClient;
pub use services::{CompatibilityReport, DashboardBackend, Session};
