//! Error types for the paperscope library.
//!
//! Every fallible operation returns a [`PaperscopeError`]. Callers that only need to decide what
//! to show a user can collapse it with [`PaperscopeError::kind`]:
//!
//! ```
//! use paperscope::{ArxivClient, ClientConfig, ErrorKind};
//!
//! # async fn example() -> Result<(), paperscope::PaperscopeError> {
//! let client = ArxivClient::new(ClientConfig::default())?;
//! match client.try_fetch_by_id("2103.13916").await {
//!   Ok(paper) => println!("{}", paper.title),
//!   Err(e) if e.kind() == ErrorKind::NotFound => println!("No such paper"),
//!   Err(e) if e.kind() == ErrorKind::Network => println!("arXiv is unreachable: {e}"),
//!   Err(e) => println!("Other error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Errors that can occur while searching for, fetching or downloading papers.
#[derive(Error, Debug)]
pub enum PaperscopeError {
  /// The provided paper identifier or URL doesn't match any known format.
  #[error("Invalid identifier format")]
  InvalidIdentifier,

  /// The provided sort criterion couldn't be parsed.
  ///
  /// The string parameter contains the rejected value.
  #[error("Invalid sort criterion `{0}`, expected one of: relevance, date, authors, title")]
  InvalidSortBy(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  /// - TLS/SSL errors occur
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The upstream service answered with a non-success status that isn't a query rejection.
  #[error("Upstream returned HTTP status {0}")]
  UpstreamStatus(reqwest::StatusCode),

  /// The upstream service refused the query, e.g. because of malformed search syntax.
  ///
  /// The string parameter carries the upstream explanation when one was given.
  #[error("Query rejected by upstream: {0}")]
  RejectedQuery(String),

  /// The requested paper couldn't be found.
  #[error("Paper not found")]
  NotFound,

  /// The upstream payload couldn't be decoded.
  #[error("Malformed upstream response: {0}")]
  Parse(String),

  /// A result was missing one of the required fields of a [`Paper`](crate::Paper).
  #[error("Incomplete record: missing {0}")]
  IncompleteRecord(&'static str),

  /// Failed to parse a URL.
  #[error(transparent)]
  InvalidUrl(#[from] url::ParseError),

  /// Failed to parse a calendar date.
  #[error(transparent)]
  InvalidDate(#[from] chrono::ParseError),

  /// A file system operation failed, e.g. while writing a downloaded PDF.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// The paper has no PDF link to download.
  #[error("No PDF URL available")]
  NoPdf,
}

/// Coarse classification of a [`PaperscopeError`], suited for picking a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The upstream service couldn't be reached or answered with an error status.
  Network,
  /// The upstream service answered, but its response couldn't be read.
  Malformed,
  /// The request itself was refused, either by upstream or by local parsing.
  RejectedQuery,
  /// The identifier didn't resolve to a complete paper.
  NotFound,
  /// A local file system operation failed.
  Io,
}

impl std::fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::Network => write!(f, "network"),
      ErrorKind::Malformed => write!(f, "malformed-response"),
      ErrorKind::RejectedQuery => write!(f, "rejected-query"),
      ErrorKind::NotFound => write!(f, "not-found"),
      ErrorKind::Io => write!(f, "io"),
    }
  }
}

impl PaperscopeError {
  /// Classifies this error into one of the [`ErrorKind`] buckets.
  pub fn kind(&self) -> ErrorKind {
    match self {
      PaperscopeError::Network(_) | PaperscopeError::UpstreamStatus(_) => ErrorKind::Network,
      PaperscopeError::Parse(_) => ErrorKind::Malformed,
      PaperscopeError::InvalidIdentifier
      | PaperscopeError::InvalidSortBy(_)
      | PaperscopeError::RejectedQuery(_)
      | PaperscopeError::InvalidUrl(_)
      | PaperscopeError::InvalidDate(_) => ErrorKind::RejectedQuery,
      PaperscopeError::NotFound | PaperscopeError::IncompleteRecord(_) | PaperscopeError::NoPdf =>
        ErrorKind::NotFound,
      PaperscopeError::Path(_) => ErrorKind::Io,
    }
  }

  /// Whether retrying the same request might succeed.
  ///
  /// Timeouts, connection failures, rate limiting (429) and server errors (5xx) are transient.
  pub fn is_transient(&self) -> bool {
    match self {
      PaperscopeError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
      PaperscopeError::UpstreamStatus(status) =>
        status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS,
      _ => false,
    }
  }
}
