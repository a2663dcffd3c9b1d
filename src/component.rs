use crate::action::Action;
use color_eyre::Result;

/// Base trait for stateful forms
///
/// A component owns the state of one flow and changes it only in response to
/// actions. Each action may produce a single follow-up: a backend request, a
/// notification, or nothing.
pub trait Component {
    /// Apply an action and return the follow-up, if any.
    fn update(&mut self, action: Action) -> Result<Option<Action>>;

    /// Component name for logging
    fn name(&self) -> &str;
}
