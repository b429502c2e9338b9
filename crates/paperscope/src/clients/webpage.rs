//! Client for reading paper metadata off an arbitrary landing page.
//!
//! Most publishers embed bibliographic data in `<meta>` tags for the benefit of indexers. This
//! client reads, in order of preference:
//!
//! | Field | Tags |
//! |---|---|
//! | title | `citation_title`, `dc.title`, `og:title`, `<title>` |
//! | authors | `citation_author`, `dc.creator` |
//! | abstract | `citation_abstract`, `dc.description`, `description`, `og:description` |
//! | date | `citation_publication_date`, `citation_date`, `citation_online_date`, `dc.date`, `article:published_time` |
//! | doi | `citation_doi`, `dc.identifier`, `prism.doi` |
//! | pdf | `citation_pdf_url` |
//!
//! Pages missing a title, an abstract or a full publication date don't produce a record.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

use super::*;

lazy_static! {
  /// Every `<meta>` element of a document.
  static ref META: Selector = Selector::parse("meta").unwrap();
  /// The document `<title>`.
  static ref TITLE: Selector = Selector::parse("title").unwrap();
}

/// Date layouts accepted from meta tags, most common first.
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Client for extracting a [`Paper`] from a generic web page.
#[derive(Debug, Clone)]
pub struct WebpageClient {
  /// Internal web client used to load pages.
  client: reqwest::Client,
}

impl WebpageClient {
  /// Creates a new client with its own HTTP client.
  pub fn new(config: &ClientConfig) -> Result<Self, PaperscopeError> {
    Ok(Self::with_http(config.build_http()?))
  }

  /// Creates a new client on top of an existing HTTP client.
  pub fn with_http(client: reqwest::Client) -> Self { Self { client } }

  /// Loads `url` and extracts a paper record from its meta tags.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - The network request fails
  /// - The page doesn't exist ([`PaperscopeError::NotFound`])
  /// - A required field can't be found on the page
  pub async fn fetch_paper(&self, url: &Url) -> Result<Paper, PaperscopeError> {
    debug!("Fetching webpage: {url}");
    let response = self.client.get(url.clone()).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
      return Err(PaperscopeError::NotFound);
    }
    if !status.is_success() {
      return Err(PaperscopeError::UpstreamStatus(status));
    }
    let html = response.text().await?;
    trace!("Webpage response: {} bytes", html.len());

    extract_paper(&html, url)
  }
}

/// Builds a paper record out of an HTML document.
pub fn extract_paper(html: &str, url: &Url) -> Result<Paper, PaperscopeError> {
  let document = Html::parse_document(html);
  let meta = MetaTags::collect(&document);

  let title = meta
    .first(&["citation_title", "dc.title", "og:title"])
    .or_else(|| {
      document.select(&TITLE).next().map(|t| t.text().collect::<String>())
    })
    .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
    .filter(|t| !t.is_empty())
    .ok_or(PaperscopeError::IncompleteRecord("title"))?;

  let mut authors = meta.all("citation_author");
  if authors.is_empty() {
    authors = meta.all("dc.creator");
  }

  let abstract_text = meta
    .first(&["citation_abstract", "dc.description", "description", "og:description"])
    .ok_or(PaperscopeError::IncompleteRecord("abstract"))?;

  let publication_date = meta
    .all_of(&[
      "citation_publication_date",
      "citation_date",
      "citation_online_date",
      "dc.date",
      "article:published_time",
    ])
    .iter()
    .find_map(|raw| parse_date(raw))
    .ok_or(PaperscopeError::IncompleteRecord("publication_date"))?;

  let doi = meta
    .all_of(&["citation_doi", "dc.identifier", "prism.doi"])
    .into_iter()
    .find_map(|raw| normalize_doi(&raw));

  let pdf_url = meta.first(&["citation_pdf_url"]).and_then(|href| url.join(&href).ok()).map(String::from);

  Ok(Paper {
    title,
    authors,
    abstract_text,
    publication_date,
    doi,
    url: Some(url.to_string()),
    citations: None,
    pdf_url,
  })
}

/// The `name`/`property` → `content` pairs of a document, names lowercased.
struct MetaTags(Vec<(String, String)>);

impl MetaTags {
  /// Reads every non-empty meta tag of `document`.
  fn collect(document: &Html) -> Self {
    let tags = document
      .select(&META)
      .filter_map(|element| {
        let el = element.value();
        let name = el.attr("name").or_else(|| el.attr("property"))?;
        let content = el.attr("content")?.trim();
        (!content.is_empty()).then(|| (name.trim().to_lowercase(), content.to_string()))
      })
      .collect();
    Self(tags)
  }

  /// Every value stored under `name`, in document order.
  fn all(&self, name: &str) -> Vec<String> {
    self.0.iter().filter(|(n, _)| n == name).map(|(_, content)| content.clone()).collect()
  }

  /// Every value stored under any of `names`, grouped by name in the given order.
  fn all_of(&self, names: &[&str]) -> Vec<String> {
    names.iter().flat_map(|name| self.all(name)).collect()
  }

  /// The first value found for the earliest name in `names`.
  fn first(&self, names: &[&str]) -> Option<String> { self.all_of(names).into_iter().next() }
}

/// Parses a full calendar date; bare years and months are refused.
fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
    return Some(timestamp.date_naive());
  }
  DATE_LAYOUTS.iter().find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
}

/// Keeps DOI-shaped values, dropping `doi:` and resolver prefixes.
fn normalize_doi(raw: &str) -> Option<String> {
  let raw = raw.trim();
  let doi = raw
    .strip_prefix("https://doi.org/")
    .or_else(|| raw.strip_prefix("http://dx.doi.org/"))
    .or_else(|| raw.strip_prefix("doi:"))
    .unwrap_or(raw);
  doi.starts_with("10.").then(|| doi.to_string())
}
