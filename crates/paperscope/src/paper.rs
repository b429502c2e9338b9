//! The normalized paper record and the locators used to look one up.
//!
//! A [`Paper`] is built once per upstream result and never changes afterwards. Either every
//! required field could be filled from a valid result, or no record is produced at all.
//!
//! # Examples
//!
//! ```no_run
//! use paperscope::{ClientConfig, Fetcher, Locator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(ClientConfig::default())?;
//!
//! // Anything from a bare arXiv id to a publisher landing page
//! let locator: Locator = "https://arxiv.org/abs/2103.13916".parse()?;
//! let paper = fetcher.fetch(&locator).await?;
//! println!("{} by {}", paper.title, paper.authors_joined());
//!
//! // Grab the PDF
//! let path = paper.download_pdf(fetcher.http(), std::path::Path::new(".")).await?;
//! println!("Saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::*;

/// A complete academic paper record.
///
/// Records from arXiv never carry a DOI or a citation count; the fields exist for sources that
/// do provide them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
  /// The paper's title
  pub title:            String,
  /// Author names in upstream order, possibly empty
  pub authors:          Vec<String>,
  /// The paper's abstract text
  #[serde(rename = "abstract")]
  pub abstract_text:    String,
  /// Day of first publication, rendered as `YYYY-MM-DD`
  pub publication_date: NaiveDate,
  /// The paper's DOI, if the source provides one
  pub doi:              Option<String>,
  /// Canonical landing page
  pub url:              Option<String>,
  /// Citation count, if the source provides one
  pub citations:        Option<u64>,
  /// Direct link to the PDF
  pub pdf_url:          Option<String>,
}

impl Paper {
  /// The author names joined with `", "`.
  pub fn authors_joined(&self) -> String { self.authors.join(", ") }

  /// Where [`Paper::download_pdf`] saves this paper inside `dir`.
  pub fn pdf_path(&self, dir: &Path) -> PathBuf {
    dir.join(format!("{}.pdf", format::pdf_filename(&self.title, None)))
  }

  /// Downloads the paper's PDF into `dir` and returns the written path.
  ///
  /// The file name is derived from the title with [`format::pdf_filename`].
  ///
  /// # Errors
  ///
  /// Returns a [`PaperscopeError`] if:
  /// - The paper has no PDF URL available
  /// - The download fails or answers with a non-success status
  /// - Writing to `dir` fails
  pub async fn download_pdf(
    &self,
    http: &reqwest::Client,
    dir: &Path,
  ) -> Result<PathBuf, PaperscopeError> {
    let Some(pdf_url) = &self.pdf_url else {
      return Err(PaperscopeError::NoPdf);
    };

    debug!("Downloading PDF from: {pdf_url}");
    let response = http.get(pdf_url).send().await?;
    trace!("PDF response: {response:?}");
    if !response.status().is_success() {
      return Err(PaperscopeError::UpstreamStatus(response.status()));
    }
    let bytes = response.bytes().await?;

    let path = self.pdf_path(dir);
    debug!("Writing PDF to path: {path:?}");
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
  }
}

/// Where a paper can be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
  /// An arXiv identifier, new-style (`2103.13916`) or old-style (`math.AG/0601001`)
  Arxiv(String),
  /// Any other landing page that carries bibliographic meta tags
  Webpage(Url),
}

lazy_static! {
  /// New-style arXiv identifiers, optionally versioned.
  static ref ARXIV_NEW: Regex = Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").unwrap();
  /// Old-style arXiv identifiers, optionally versioned.
  static ref ARXIV_OLD: Regex = Regex::new(r"^[a-zA-Z-]+(\.[A-Z]{2})?/\d{7}(v\d+)?$").unwrap();
  /// The identifier part of an arXiv `/abs/` or `/pdf/` path.
  static ref ARXIV_PATH: Regex = Regex::new(r"^/(?:abs|pdf)/(.+?)(?:\.pdf)?/?$").unwrap();
}

impl FromStr for Locator {
  type Err = PaperscopeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let input = s.trim();

    let id = input.strip_prefix("arXiv:").or_else(|| input.strip_prefix("arxiv:")).unwrap_or(input);
    if ARXIV_NEW.is_match(id) || ARXIV_OLD.is_match(id) {
      return Ok(Locator::Arxiv(id.to_string()));
    }

    let url = Url::parse(input).map_err(|_| PaperscopeError::InvalidIdentifier)?;
    match url.host_str() {
      Some("arxiv.org" | "www.arxiv.org" | "export.arxiv.org") =>
        extract_arxiv_id(&url).map(Locator::Arxiv),
      Some(_) if matches!(url.scheme(), "http" | "https") => Ok(Locator::Webpage(url)),
      _ => Err(PaperscopeError::InvalidIdentifier),
    }
  }
}

impl std::fmt::Display for Locator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Locator::Arxiv(id) => write!(f, "arXiv {id}"),
      Locator::Webpage(url) => write!(f, "{url}"),
    }
  }
}

/// Extracts the arXiv identifier from a landing page or PDF URL.
///
/// Parses URLs like "https://arxiv.org/abs/2103.13916" or "https://arxiv.org/pdf/2103.13916v1.pdf".
fn extract_arxiv_id(url: &Url) -> Result<String, PaperscopeError> {
  ARXIV_PATH
    .captures(url.path())
    .and_then(|cap| cap.get(1))
    .map(|m| m.as_str().to_string())
    .filter(|id| ARXIV_NEW.is_match(id) || ARXIV_OLD.is_match(id))
    .ok_or(PaperscopeError::InvalidIdentifier)
}
