//! Clients for the sources papers can come from.
//!
//! - [`arxiv`] - the arXiv search API, used for keyword search and identifier lookup
//! - [`webpage`] - any landing page that exposes bibliographic `<meta>` tags
//!
//! Both clients are built from one [`ClientConfig`], which carries the pacing and retry policy.
//! A [`Fetcher`] owns one of each and routes a [`Locator`] to the right one.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use paperscope::{ArxivClient, ClientConfig, SearchRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().with_delay(Duration::from_secs(5)).with_num_retries(5);
//! let client = ArxivClient::new(config)?;
//!
//! let papers = client.search(&SearchRequest::new("all:electron").with_max_results(250)).await;
//! println!("Got {} papers", papers.len());
//! # Ok(())
//! # }
//! ```

use quick_xml::de::from_str;

pub mod arxiv;
pub mod webpage;

pub use arxiv::ArxivClient;
pub use webpage::WebpageClient;

use super::*;

/// The public arXiv query endpoint.
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Connection and pacing policy shared by every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  /// Query endpoint of the arXiv API
  pub base_url:    String,
  /// Number of records requested per upstream page
  pub page_size:   usize,
  /// Minimum spacing between two successive upstream requests
  pub delay:       Duration,
  /// How many times a transient failure is retried before giving up
  pub num_retries: u32,
  /// Per-request timeout
  pub timeout:     Duration,
  /// `User-Agent` header sent with every request
  pub user_agent:  String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:    ARXIV_API_URL.to_string(),
      page_size:   100,
      delay:       Duration::from_secs(3),
      num_retries: 3,
      timeout:     Duration::from_secs(30),
      user_agent:  concat!("paperscope/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

impl ClientConfig {
  /// A config pointed at a local mock server, with no pacing delay.
  pub fn for_testing(base_url: &str) -> Self {
    Self { base_url: base_url.to_string(), delay: Duration::ZERO, ..Self::default() }
  }

  /// Overrides the query endpoint.
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  /// Overrides the upstream page size. Zero is bumped to one.
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  /// Overrides the minimum spacing between upstream requests.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// Overrides the retry bound for transient failures.
  pub fn with_num_retries(mut self, num_retries: u32) -> Self {
    self.num_retries = num_retries;
    self
  }

  /// Builds the HTTP client every source shares.
  fn build_http(&self) -> Result<reqwest::Client, PaperscopeError> {
    Ok(reqwest::Client::builder().user_agent(&self.user_agent).timeout(self.timeout).build()?)
  }
}

/// Routes a [`Locator`] to the source that can resolve it.
#[derive(Debug, Clone)]
pub struct Fetcher {
  /// Client for arXiv identifiers
  arxiv:   ArxivClient,
  /// Client for everything else
  webpage: WebpageClient,
}

impl Fetcher {
  /// Creates both clients from one config.
  pub fn new(config: ClientConfig) -> Result<Self, PaperscopeError> {
    let http = config.build_http()?;
    Ok(Self {
      webpage: WebpageClient::with_http(http.clone()),
      arxiv:   ArxivClient::with_http(config, http),
    })
  }

  /// The arXiv client, for keyword searches.
  pub fn arxiv(&self) -> &ArxivClient { &self.arxiv }

  /// The underlying HTTP client, e.g. for [`Paper::download_pdf`].
  pub fn http(&self) -> &reqwest::Client { self.arxiv.http() }

  /// Resolves `locator` into a complete paper record.
  ///
  /// # Errors
  ///
  /// Whatever the chosen source reports; an unknown identifier surfaces as
  /// [`PaperscopeError::NotFound`].
  pub async fn fetch(&self, locator: &Locator) -> Result<Paper, PaperscopeError> {
    debug!("Resolving {locator}");
    match locator {
      Locator::Arxiv(id) => self.arxiv.try_fetch_by_id(id).await,
      Locator::Webpage(url) => self.webpage.fetch_paper(url).await,
    }
  }
}
