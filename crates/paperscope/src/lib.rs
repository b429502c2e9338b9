//! A library for searching arXiv by keyword, date range and sort order, and for turning the
//! results into plain [`Paper`] records.
//!
//! The [`ArxivClient`] builds the upstream query, pages through the Atom feed, normalizes every
//! entry and applies the orderings arXiv cannot compute itself. Generic landing pages can be read
//! through the [`WebpageClient`], and [`Fetcher`] picks the right one for a [`Locator`].
//!
//! # Example
//! ```rust,no_run
//! use paperscope::{ArxivClient, ClientConfig, SearchRequest, SortBy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let client = ArxivClient::new(ClientConfig::default())?;
//!   let request = SearchRequest::new("quantum computing")
//!     .with_max_results(5)
//!     .with_sort(SortBy::Title, true);
//!
//!   for paper in client.try_search(&request).await? {
//!     println!("{} ({})", paper.title, paper.publication_date);
//!   }
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod clients;
pub mod errors;
pub mod format;
pub mod paper;
pub mod query;

pub use clients::{ArxivClient, ClientConfig, Fetcher, WebpageClient};
pub use errors::{ErrorKind, PaperscopeError};
pub use paper::{Locator, Paper};
pub use query::{DateRange, SearchRequest, SortBy};

/// The textual shape of every publication date this crate hands out.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
