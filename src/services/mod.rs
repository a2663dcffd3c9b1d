pub mod backend;
pub mod connection_matcher;
pub mod session;

pub use backend::{BackendError, DashboardBackend};
pub use connection_matcher::{CompatibilityReport, ConnectionCompatibility, find_compatible};
pub use session::Session;
