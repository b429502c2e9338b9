//! Client implementation for searching and fetching papers from arXiv.org.
//!
//! The client talks to arXiv's Atom feed API (http://export.arxiv.org/api/query). A search is
//! split into pages of [`ClientConfig::page_size`] records, successive requests are spaced by
//! [`ClientConfig::delay`], and transient failures are retried up to
//! [`ClientConfig::num_retries`] times. Each feed entry is turned into a [`Paper`]; entries that
//! lack a required field are skipped rather than surfaced half-filled.
//!
//! Two flavours of every operation exist:
//! - [`ArxivClient::try_search`] / [`ArxivClient::try_fetch_by_id`] report failures as a
//!   [`PaperscopeError`]
//! - [`ArxivClient::search`] / [`ArxivClient::fetch_by_id`] log failures and hand back an empty
//!   list or `None`, so "nothing matched" and "arXiv was down" look the same
//!
//! # Examples
//!
//! ```no_run
//! use paperscope::{ArxivClient, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArxivClient::new(ClientConfig::default())?;
//! let paper = client.try_fetch_by_id("2103.13916").await?;
//!
//! println!("Title: {}", paper.title);
//! println!("Published: {}", paper.publication_date);
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Instant};

use tokio::sync::Mutex;

use super::*;

/// Marker arXiv puts in the `<id>` of the entry it returns instead of results on a bad query.
const ERROR_ENTRY_MARKER: &str = "/api/errors";

/// Internal representation of the arXiv API's Atom feed response.
#[derive(Debug, Deserialize)]
struct Feed {
  /// A `Feed` from arXiv may contain any number of `Entry`s, including none
  #[serde(rename = "entry", default)]
  entries: Vec<Entry>,
}

/// Internal representation of a paper entry from arXiv's API response.
///
/// Everything is optional here so that a partial entry can be reported and skipped instead of
/// failing the whole page.
#[derive(Debug, Deserialize)]
struct Entry {
  /// arXiv URL (e.g., "http://arxiv.org/abs/2103.13916v1")
  #[serde(default)]
  id:        String,
  /// Paper title, wrapped over several lines by arXiv
  title:     Option<String>,
  /// List of paper authors
  #[serde(rename = "author", default)]
  authors:   Vec<Author>,
  /// Paper abstract
  summary:   Option<String>,
  /// Timestamp of the first version
  published: Option<DateTime<Utc>>,
  /// Related links: landing page, PDF, sometimes DOI
  #[serde(rename = "link", default)]
  links:     Vec<Link>,
}

/// Internal representation of an author from arXiv's API response.
///
/// Affiliations are dropped.
#[derive(Debug, Deserialize)]
struct Author {
  /// Author's full name
  name: String,
}

/// An Atom `<link>` element.
#[derive(Debug, Deserialize)]
struct Link {
  /// Link target
  #[serde(rename = "@href")]
  href:  String,
  /// `pdf` for the PDF link, `doi` for the DOI link
  #[serde(rename = "@title", default)]
  title: Option<String>,
}

impl Entry {
  /// Whether this is arXiv's error report rather than a search result.
  fn is_error(&self) -> bool { self.id.contains(ERROR_ENTRY_MARKER) }

  /// The upstream explanation attached to an error entry.
  fn error_message(&self) -> String {
    self.summary.as_deref().map(str::trim).unwrap_or("unknown error").to_string()
  }
}

impl TryFrom<Entry> for Paper {
  type Error = PaperscopeError;

  fn try_from(entry: Entry) -> Result<Self, Self::Error> {
    let title = entry
      .title
      .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
      .filter(|t| !t.is_empty())
      .ok_or(PaperscopeError::IncompleteRecord("title"))?;
    let abstract_text = entry
      .summary
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .ok_or(PaperscopeError::IncompleteRecord("abstract"))?;
    let published = entry.published.ok_or(PaperscopeError::IncompleteRecord("publication_date"))?;
    if entry.id.is_empty() {
      return Err(PaperscopeError::IncompleteRecord("url"));
    }

    // Prefer the advertised PDF link, otherwise derive it from the landing page
    let pdf_url = entry
      .links
      .iter()
      .find(|link| link.title.as_deref() == Some("pdf"))
      .map(|link| link.href.clone())
      .unwrap_or_else(|| entry.id.replace("/abs/", "/pdf/"));

    Ok(Paper {
      title,
      authors: entry.authors.into_iter().map(|author| author.name.trim().to_string()).collect(),
      abstract_text,
      publication_date: published.date_naive(),
      doi: None,
      url: Some(entry.id),
      citations: None,
      pdf_url: Some(pdf_url),
    })
  }
}

/// Client for interacting with the arXiv API.
///
/// Cloning is cheap and clones share the request pacing, so one logical client can be handed to
/// several tasks without exceeding the configured request rate.
#[derive(Debug, Clone)]
pub struct ArxivClient {
  /// Internal web client used to connect to the API.
  client:       reqwest::Client,
  /// Endpoint, paging and retry policy.
  config:       ClientConfig,
  /// When the last upstream request went out.
  last_request: Arc<Mutex<Option<Instant>>>,
}

impl ArxivClient {
  /// Creates a new arXiv client with its own HTTP client.
  ///
  /// # Errors
  ///
  /// Fails only if the underlying HTTP client can't be initialized (e.g. no TLS backend).
  pub fn new(config: ClientConfig) -> Result<Self, PaperscopeError> {
    let http = config.build_http()?;
    Ok(Self::with_http(config, http))
  }

  /// Creates a new arXiv client on top of an existing HTTP client.
  pub fn with_http(config: ClientConfig, client: reqwest::Client) -> Self {
    Self { client, config, last_request: Arc::new(Mutex::new(None)) }
  }

  /// The configuration this client was built with.
  pub fn config(&self) -> &ClientConfig { &self.config }

  /// The underlying HTTP client.
  pub fn http(&self) -> &reqwest::Client { &self.client }

  /// Runs a search and returns at most `request.max_results` records in the requested order.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - arXiv can't be reached, even after retrying ([`ErrorKind::Network`])
  /// - arXiv rejects the query ([`ErrorKind::RejectedQuery`])
  /// - The feed can't be parsed ([`ErrorKind::Malformed`])
  ///
  /// # Examples
  ///
  /// ```no_run
  /// # use paperscope::{ArxivClient, ClientConfig, SearchRequest, SortBy};
  /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
  /// let client = ArxivClient::new(ClientConfig::default())?;
  /// let request = SearchRequest::new("au:hinton").with_sort(SortBy::Date, false);
  ///
  /// for paper in client.try_search(&request).await? {
  ///   println!("{}  {}", paper.publication_date, paper.title);
  /// }
  /// # Ok(())
  /// # }
  /// ```
  pub async fn try_search(&self, request: &SearchRequest) -> Result<Vec<Paper>, PaperscopeError> {
    if request.max_results == 0 {
      return Ok(Vec::new());
    }

    let search_query = request.search_query();
    let (sort_by, sort_order) = request.sort_by.upstream_order();
    debug!("Searching arXiv for `{search_query}` ({} order)", request.sort_by);

    let page_size = self.config.page_size.max(1);
    let mut papers = Vec::with_capacity(request.max_results.min(page_size));
    let mut start = 0;
    loop {
      let page_len = (request.max_results - papers.len()).min(page_size);
      let params = [
        ("search_query", search_query.clone()),
        ("start", start.to_string()),
        ("max_results", page_len.to_string()),
        ("sortBy", sort_by.to_string()),
        ("sortOrder", sort_order.to_string()),
      ];

      let entries = self.fetch_feed(&params).await?.entries;
      if let Some(error) = entries.iter().find(|entry| entry.is_error()) {
        return Err(PaperscopeError::RejectedQuery(error.error_message()));
      }

      let fetched = entries.len();
      start += fetched;
      papers.extend(Self::into_papers(entries));
      trace!("Page at offset {start} held {fetched} entries, {} records so far", papers.len());

      if fetched < page_len || papers.len() >= request.max_results {
        break;
      }
    }

    Ok(request.arrange(papers))
  }

  /// Fetches a single paper by its arXiv identifier.
  ///
  /// # Errors
  ///
  /// An identifier that arXiv doesn't know, refuses as malformed, or only answers with a partial
  /// entry for yields [`PaperscopeError::NotFound`]. Network failures are reported as such.
  pub async fn try_fetch_by_id(&self, id: &str) -> Result<Paper, PaperscopeError> {
    debug!("Fetching arXiv paper {id}");
    let params = [("id_list", id.to_string()), ("max_results", "1".to_string())];

    let feed = match self.fetch_feed(&params).await {
      Ok(feed) => feed,
      Err(PaperscopeError::RejectedQuery(reason)) => {
        debug!("arXiv rejected id {id}: {reason}");
        return Err(PaperscopeError::NotFound);
      },
      Err(e) => return Err(e),
    };

    if feed.entries.iter().any(Entry::is_error) {
      return Err(PaperscopeError::NotFound);
    }
    Self::into_papers(feed.entries).into_iter().next().ok_or(PaperscopeError::NotFound)
  }

  /// Runs a search, logging any failure and returning an empty list in its place.
  pub async fn search(&self, request: &SearchRequest) -> Vec<Paper> {
    match self.try_search(request).await {
      Ok(papers) => papers,
      Err(e) => {
        error!("Error searching arXiv papers: {e}");
        Vec::new()
      },
    }
  }

  /// Fetches a single paper, logging any failure and returning `None` in its place.
  pub async fn fetch_by_id(&self, id: &str) -> Option<Paper> {
    match self.try_fetch_by_id(id).await {
      Ok(paper) => Some(paper),
      Err(PaperscopeError::NotFound) => None,
      Err(e) => {
        error!("Error fetching arXiv paper {id}: {e}");
        None
      },
    }
  }

  /// Converts feed entries into records, dropping the partial ones.
  fn into_papers(entries: Vec<Entry>) -> Vec<Paper> {
    entries
      .into_iter()
      .filter_map(|entry| {
        let id = entry.id.clone();
        Paper::try_from(entry).map_err(|e| warn!("Skipping partial arXiv entry `{id}`: {e}")).ok()
      })
      .collect()
  }

  /// Issues one query, retrying transient failures, and parses the feed.
  async fn fetch_feed(&self, params: &[(&str, String)]) -> Result<Feed, PaperscopeError> {
    let mut attempt = 0;
    loop {
      match self.request_feed(params).await {
        Ok(feed) => return Ok(feed),
        Err(e) if e.is_transient() && attempt < self.config.num_retries => {
          attempt += 1;
          warn!("arXiv request failed ({e}), retry {attempt} of {}", self.config.num_retries);
        },
        Err(e) => return Err(e),
      }
    }
  }

  /// Issues one query without retrying.
  async fn request_feed(&self, params: &[(&str, String)]) -> Result<Feed, PaperscopeError> {
    self.wait_for_turn().await;

    let request = self.client.get(&self.config.base_url).query(params).build()?;
    debug!("Fetching from arXiv via: {}", request.url());

    let response = self.client.execute(request).await?;
    let status = response.status();
    let text = response.text().await?;
    trace!("arXiv response ({status}): {text}");

    if status == reqwest::StatusCode::BAD_REQUEST {
      return Err(PaperscopeError::RejectedQuery(Self::rejection_reason(&text)));
    }
    if !status.is_success() {
      return Err(PaperscopeError::UpstreamStatus(status));
    }

    from_str(&text).map_err(|e| PaperscopeError::Parse(format!("Failed to parse XML: {}", e)))
  }

  /// Pulls the explanation out of a 400 response, which arXiv sends as an error feed.
  fn rejection_reason(body: &str) -> String {
    from_str::<Feed>(body)
      .ok()
      .and_then(|feed| feed.entries.into_iter().find(Entry::is_error))
      .map(|entry| entry.error_message())
      .unwrap_or_else(|| "bad request".to_string())
  }

  /// Sleeps until at least `delay` has passed since the previous request, then claims the slot.
  async fn wait_for_turn(&self) {
    let mut last = self.last_request.lock().await;
    if let Some(previous) = *last {
      let elapsed = previous.elapsed();
      if elapsed < self.config.delay {
        tokio::time::sleep(self.config.delay - elapsed).await;
      }
    }
    *last = Some(Instant::now());
  }
}

#[cfg(test)]
mod tests {
  use wiremock::{
    matchers::{method, query_param},
    Mock, MockServer, ResponseTemplate,
  };

  use super::*;
  use crate::tests::{atom_entry, atom_feed, error_feed};

  async fn client_for(server: &MockServer) -> ArxivClient {
    ArxivClient::new(ClientConfig::for_testing(&server.uri())).unwrap()
  }

  fn feed_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/atom+xml")
  }

  #[test]
  fn test_entry_mapping() {
    let feed: Feed = from_str(&atom_feed(&[atom_entry(
      "2103.13916v1",
      "A Survey on\n  Quantum Computing",
      &["Alice Smith", "Bob Jones"],
      "2021-03-25T14:28:44Z",
    )]))
    .unwrap();
    let paper = Paper::try_from(feed.entries.into_iter().next().unwrap()).unwrap();

    assert_eq!(paper.title, "A Survey on Quantum Computing");
    assert_eq!(paper.authors, ["Alice Smith", "Bob Jones"]);
    assert_eq!(paper.abstract_text, "Abstract of A Survey on\n  Quantum Computing.");
    assert_eq!(paper.publication_date.format(DATE_FORMAT).to_string(), "2021-03-25");
    assert_eq!(paper.url.as_deref(), Some("http://arxiv.org/abs/2103.13916v1"));
    assert_eq!(paper.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2103.13916v1"));
    assert_eq!(paper.doi, None);
    assert_eq!(paper.citations, None);
  }

  #[test]
  fn test_partial_entry_is_refused() {
    let xml = atom_feed(&["<entry><id>http://arxiv.org/abs/2101.00001v1</id></entry>".to_string()]);
    let feed: Feed = from_str(&xml).unwrap();
    let result = Paper::try_from(feed.entries.into_iter().next().unwrap());
    assert!(matches!(result, Err(PaperscopeError::IncompleteRecord("title"))));
  }

  /// An entry copied from a live export API response: the DOI link sits between the extension
  /// elements, apart from the other two links.
  const PUBLISHED_ENTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query?search_query%3Dall%3Aelectron" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=all:electron&amp;id_list=&amp;start=0&amp;max_results=1</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <updated>2024-01-10T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1000</opensearch:totalResults>
  <opensearch:startIndex xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:startIndex>
  <opensearch:itemsPerPage xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:itemsPerPage>
  <entry>
    <id>http://arxiv.org/abs/hep-ex/0307015v1</id>
    <updated>2003-07-07T13:46:39-04:00</updated>
    <published>2003-07-07T13:46:39-04:00</published>
    <title>Multi-Electron Production at High Transverse Momenta in ep Collisions at
  HERA</title>
    <summary>  Multi-electron production is studied at high electron transverse momentum
in positron- and electron-proton collisions using the H1 detector at HERA.
</summary>
    <author>
      <name>H1 Collaboration</name>
    </author>
    <author>
      <name>F. D. Aaron</name>
      <arxiv:affiliation xmlns:arxiv="http://arxiv.org/schemas/atom">DESY</arxiv:affiliation>
    </author>
    <arxiv:doi xmlns:arxiv="http://arxiv.org/schemas/atom">10.1140/epjc/s2003-01326-x</arxiv:doi>
    <link title="doi" href="http://dx.doi.org/10.1140/epjc/s2003-01326-x" rel="related"/>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">23 pages, 8 figures and 4 tables</arxiv:comment>
    <arxiv:journal_ref xmlns:arxiv="http://arxiv.org/schemas/atom">Eur.Phys.J. C31 (2003) 17-29</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/hep-ex/0307015v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/hep-ex/0307015v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="hep-ex" scheme="http://arxiv.org/schemas/atom"/>
    <category term="hep-ex" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

  #[test]
  fn test_entry_with_journal_metadata() {
    let feed: Feed = from_str(PUBLISHED_ENTRY).unwrap();
    assert_eq!(feed.entries.len(), 1);
    let entry = feed.entries.into_iter().next().unwrap();
    assert_eq!(entry.links.len(), 3);

    let paper = Paper::try_from(entry).unwrap();
    assert_eq!(paper, Paper {
      title:            "Multi-Electron Production at High Transverse Momenta in ep Collisions at HERA"
        .to_string(),
      authors:          vec!["H1 Collaboration".to_string(), "F. D. Aaron".to_string()],
      abstract_text:    "Multi-electron production is studied at high electron transverse momentum\nin \
                         positron- and electron-proton collisions using the H1 detector at HERA."
        .to_string(),
      publication_date: NaiveDate::from_ymd_opt(2003, 7, 7).unwrap(),
      doi:              None,
      url:              Some("http://arxiv.org/abs/hep-ex/0307015v1".to_string()),
      citations:        None,
      pdf_url:          Some("http://arxiv.org/pdf/hep-ex/0307015v1".to_string()),
    });
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_reads_entries_with_journal_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "all:electron"))
      .respond_with(feed_response(PUBLISHED_ENTRY.to_string()))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("id_list", "hep-ex/0307015"))
      .respond_with(feed_response(PUBLISHED_ENTRY.to_string()))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let papers = client.try_search(&SearchRequest::new("all:electron").with_max_results(5)).await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].authors, ["H1 Collaboration", "F. D. Aaron"]);
    assert_eq!(papers[0].pdf_url.as_deref(), Some("http://arxiv.org/pdf/hep-ex/0307015v1"));

    let paper = client.fetch_by_id("hep-ex/0307015").await;
    assert_eq!(paper.map(|p| p.publication_date), NaiveDate::from_ymd_opt(2003, 7, 7));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_respects_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "quantum computing"))
      .and(query_param("max_results", "2"))
      .and(query_param("sortBy", "relevance"))
      .respond_with(feed_response(atom_feed(&[
        atom_entry("2401.00001v1", "First", &["A"], "2024-01-01T00:00:00Z"),
        atom_entry("2401.00002v1", "Second", &["B"], "2024-01-02T00:00:00Z"),
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let papers = client.search(&SearchRequest::new("quantum computing").with_max_results(2)).await;

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].title, "First");
    assert!(papers.iter().all(|p| p.doi.is_none() && p.citations.is_none()));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_paginates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("start", "0"))
      .and(query_param("max_results", "2"))
      .respond_with(feed_response(atom_feed(&[
        atom_entry("2401.00001v1", "One", &["A"], "2024-01-01T00:00:00Z"),
        atom_entry("2401.00002v1", "Two", &["B"], "2024-01-02T00:00:00Z"),
      ])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("start", "2"))
      .and(query_param("max_results", "1"))
      .respond_with(feed_response(atom_feed(&[atom_entry(
        "2401.00003v1",
        "Three",
        &["C"],
        "2024-01-03T00:00:00Z",
      )])))
      .expect(1)
      .mount(&server)
      .await;

    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_page_size(2)).unwrap();
    let papers = client.try_search(&SearchRequest::new("electron").with_max_results(3)).await.unwrap();

    let titles: Vec<_> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["One", "Two", "Three"]);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_stops_on_short_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(feed_response(atom_feed(&[atom_entry(
        "2401.00001v1",
        "Only",
        &["A"],
        "2024-01-01T00:00:00Z",
      )])))
      .expect(1)
      .mount(&server)
      .await;

    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_page_size(2)).unwrap();
    let papers = client.try_search(&SearchRequest::new("rare").with_max_results(10)).await.unwrap();
    assert_eq!(papers.len(), 1);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_sends_date_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "quantum AND submittedDate:[2024-05-01 TO 2024-01-01]"))
      .respond_with(feed_response(atom_feed(&[])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let request = SearchRequest::new("quantum")
      .with_date_range(DateRange::parse("2024-05-01", "2024-01-01").unwrap());
    assert!(client.search(&request).await.is_empty());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_sorts_titles_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("sortBy", "relevance"))
      .respond_with(feed_response(atom_feed(&[
        atom_entry("2401.00001v1", "banana", &["A"], "2024-01-01T00:00:00Z"),
        atom_entry("2401.00002v1", "Apple", &["B"], "2024-01-02T00:00:00Z"),
        atom_entry("2401.00003v1", "cherry", &["C"], "2024-01-03T00:00:00Z"),
      ])))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    for ascending in [true, false] {
      let request = SearchRequest::new("fruit").with_sort(SortBy::Title, ascending);
      let titles: Vec<_> =
        client.try_search(&request).await.unwrap().into_iter().map(|p| p.title.to_lowercase()).collect();
      if ascending {
        assert!(titles.windows(2).all(|w| w[0] <= w[1]), "{titles:?}");
      } else {
        assert!(titles.windows(2).all(|w| w[0] >= w[1]), "{titles:?}");
      }
    }
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_date_sort_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("sortBy", "lastUpdatedDate"))
      .and(query_param("sortOrder", "ascending"))
      .respond_with(feed_response(atom_feed(&[
        atom_entry("2001.00001v1", "Old", &["A"], "2020-01-01T00:00:00Z"),
        atom_entry("2401.00002v1", "New", &["B"], "2024-01-02T00:00:00Z"),
      ])))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let papers =
      client.try_search(&SearchRequest::new("q").with_sort(SortBy::Date, false)).await.unwrap();
    assert_eq!(papers[0].title, "New");
    assert_eq!(papers[1].title, "Old");
  }

  #[traced_test]
  #[tokio::test]
  async fn test_search_skips_partial_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(feed_response(atom_feed(&[
        atom_entry("2401.00001v1", "Complete", &["A"], "2024-01-01T00:00:00Z"),
        "<entry><id>http://arxiv.org/abs/2401.00002v1</id><title>No abstract</title></entry>".to_string(),
      ])))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let papers = client.try_search(&SearchRequest::new("q")).await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Complete");
  }

  #[traced_test]
  #[tokio::test]
  async fn test_rejected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(400)
          .set_body_raw(error_feed("malformed query"), "application/atom+xml"),
      )
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let err = client.try_search(&SearchRequest::new("((")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RejectedQuery);
    assert!(err.to_string().contains("malformed query"));

    assert!(client.search(&SearchRequest::new("((")).await.is_empty());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_error_entry_in_successful_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(feed_response(error_feed("unknown field prefix")))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let err = client.try_search(&SearchRequest::new("zz:top")).await.unwrap_err();
    assert!(matches!(err, PaperscopeError::RejectedQuery(reason) if reason == "unknown field prefix"));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(503))
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .respond_with(feed_response(atom_feed(&[atom_entry(
        "2401.00001v1",
        "Eventually",
        &["A"],
        "2024-01-01T00:00:00Z",
      )])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let papers = client.try_search(&SearchRequest::new("q")).await.unwrap();
    assert_eq!(papers[0].title, "Eventually");
  }

  #[traced_test]
  #[tokio::test]
  async fn test_gives_up_after_retry_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(503))
      .expect(6)
      .mount(&server)
      .await;

    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_num_retries(2)).unwrap();
    let err = client.try_search(&SearchRequest::new("q")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(client.search(&SearchRequest::new("q")).await.is_empty());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_fetch_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("id_list", "2103.13916"))
      .and(query_param("max_results", "1"))
      .respond_with(feed_response(atom_feed(&[atom_entry(
        "2103.13916v1",
        "Quantum Survey",
        &["Alice Smith"],
        "2021-03-25T14:28:44Z",
      )])))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    let first = client.fetch_by_id("2103.13916").await.unwrap();
    let second = client.fetch_by_id("2103.13916").await.unwrap();

    assert!(!first.title.is_empty());
    assert!(!first.authors.is_empty());
    assert!(!first.abstract_text.is_empty());
    assert_eq!(first.publication_date.format(DATE_FORMAT).to_string(), "2021-03-25");
    assert_eq!(first, second);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_fetch_unknown_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("id_list", "0000.00000"))
      .respond_with(feed_response(error_feed("incorrect id format for 0000.00000")))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("id_list", "9999.99999"))
      .respond_with(feed_response(atom_feed(&[])))
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    assert!(client.fetch_by_id("0000.00000").await.is_none());
    assert!(matches!(client.try_fetch_by_id("0000.00000").await, Err(PaperscopeError::NotFound)));
    assert!(matches!(client.try_fetch_by_id("9999.99999").await, Err(PaperscopeError::NotFound)));
  }

  #[tokio::test]
  async fn test_requests_are_spaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(feed_response(atom_feed(&[]))).mount(&server).await;

    let delay = Duration::from_millis(200);
    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_delay(delay)).unwrap();

    let started = Instant::now();
    client.try_search(&SearchRequest::new("a")).await.unwrap();
    client.try_search(&SearchRequest::new("b")).await.unwrap();
    assert!(started.elapsed() >= delay);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_empty_query_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("search_query", ""))
      .respond_with(feed_response(atom_feed(&[])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server).await;
    assert!(client.search(&SearchRequest::new("")).await.is_empty());
  }

  #[tokio::test]
  async fn test_zero_max_results_skips_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(feed_response(atom_feed(&[]))).expect(0).mount(&server).await;

    let client = client_for(&server).await;
    assert!(client.try_search(&SearchRequest::new("q").with_max_results(0)).await.unwrap().is_empty());
  }
}
