// File: src/error.rs
// Purpose: Render and dispatch errors

use crate::templating::TemplateError;
use thiserror::Error;

/// Failures of an explicit render or redirect inside an action
#[derive(Debug, Error)]
pub enum RenderError {
    /// `render` or `redirect_to` was called twice for one request
    #[error("render or redirect called more than once for this request")]
    DoubleRender,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("no route generates a URL for {0}")]
    NoRoute(String),
}

/// Failures surfaced by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch)
///
/// Unresolved requests are not errors; they come back as
/// [`Outcome::NotFound`](crate::Outcome::NotFound).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{controller}#{action} rendered more than once")]
    DoubleRender { controller: String, action: String },

    #[error("{controller}#{action} failed")]
    Action {
        controller: String,
        action: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}
