//! Bulk actions run against a changelist selection.

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::RepositoryError;

/// Handler for a bulk action: receives the selected ids.
pub type ActionHandler = for<'a> fn(
    &'a SqlitePool,
    &'a [i32],
) -> BoxFuture<'a, Result<ActionOutcome, RepositoryError>>;

/// Result of running a bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Action name.
    pub action: String,
    /// Rows changed.
    pub affected: u64,
    /// Message shown to the operator.
    pub message: String,
}

impl ActionOutcome {
    /// Create an outcome.
    #[must_use]
    pub fn new(action: &str, affected: u64, message: String) -> Self {
        Self {
            action: action.to_string(),
            affected,
            message,
        }
    }
}

/// A named action with its handler.
#[derive(Clone)]
pub struct RegisteredAction {
    /// Action name, as passed to `run_action`.
    pub name: &'static str,
    /// Label shown in the action dropdown.
    pub description: &'static str,
    handler: ActionHandler,
}

impl RegisteredAction {
    /// Run the handler on a selection.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler's repository call returns.
    pub async fn run(
        &self,
        pool: &SqlitePool,
        ids: &[i32],
    ) -> Result<ActionOutcome, RepositoryError> {
        (self.handler)(pool, ids).await
    }
}

impl fmt::Debug for RegisteredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAction")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered set of actions available on a changelist.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: Vec<RegisteredAction>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { actions: vec![] }
    }

    /// Register an action; a later registration replaces one of the same name.
    #[must_use]
    pub fn register(
        mut self,
        name: &'static str,
        description: &'static str,
        handler: ActionHandler,
    ) -> Self {
        self.actions.retain(|a| a.name != name);
        self.actions.push(RegisteredAction {
            name,
            description,
            handler,
        });
        self
    }

    /// Look up an action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Registered actions, in registration order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAction> {
        self.actions.iter()
    }

    /// Registered action names.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name).collect()
    }
}
