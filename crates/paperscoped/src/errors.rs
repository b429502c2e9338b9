//! Error types for the paperscoped CLI and web front-end.
//!
//! Everything that can go wrong outside of a search itself (prompts, files, templates, JSON
//! output) funnels into [`PaperscopedErrors`]. Search failures are rendered to the user rather
//! than surfaced here; see [`crate::form::Outcome`].

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors that can occur while running a command or serving a page.
///
/// The variants are transparent so the user sees the underlying message unchanged.
#[derive(Error, Debug)]
pub enum PaperscopedErrors {
  /// Errors from user interaction dialogs
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Errors from the underlying paperscope library
  #[error(transparent)]
  Paperscope(#[from] paperscope::PaperscopeError),

  /// File system, socket and other IO errors
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// Template loading or rendering errors
  #[error(transparent)]
  Template(#[from] minijinja::Error),

  /// JSON output errors
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl IntoResponse for PaperscopedErrors {
  fn into_response(self) -> Response {
    tracing::error!("Request failed: {self}");
    (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
  }
}
