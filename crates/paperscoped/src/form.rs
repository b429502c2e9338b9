//! The search form shared by the terminal and web front-ends.
//!
//! User input is checked here, before anything is sent to arXiv: an empty query or an inverted
//! date window never reaches the [`ArxivClient`]. Once a search has run, its result is folded
//! into an [`Outcome`] so that "nothing matched" and "the search failed" get different notices.

use chrono::{Duration, Local, NaiveDate};
use paperscope::{ArxivClient, DateRange, ErrorKind, Paper, SearchRequest, SortBy, DATE_FORMAT};
use thiserror::Error;
use tracing::{debug, error};

/// Smallest number of results a user may ask for.
pub const MIN_RESULTS: usize = 1;
/// Largest number of results a user may ask for.
pub const MAX_RESULTS: usize = 50;

/// The day arXiv went online; nothing can have been submitted before it.
pub fn arxiv_launch() -> NaiveDate { NaiveDate::from_ymd_opt(1991, 8, 14).unwrap_or(NaiveDate::MIN) }

/// Today's date in the local timezone.
pub fn today() -> NaiveDate { Local::now().date_naive() }

/// The window the web form starts out with: the last year.
pub fn default_window() -> (NaiveDate, NaiveDate) {
  let today = today();
  (today - Duration::days(365), today)
}

/// Input rejected before any search is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
  /// The query text is blank.
  #[error("Please enter a search query.")]
  EmptyQuery,

  /// The earliest date falls after the latest date.
  #[error("Earliest date must be before latest date")]
  InvertedDates,

  /// The requested number of results is outside [`MIN_RESULTS`]..=[`MAX_RESULTS`].
  #[error("Max results must be between 1 and 50, got {0}")]
  MaxResultsOutOfRange(usize),

  /// The requested number of results isn't a whole number.
  #[error("Max results must be a whole number between 1 and 50, got `{0}`")]
  InvalidMaxResults(String),

  /// A date bound isn't a `YYYY-MM-DD` date.
  #[error("Invalid date `{0}`, expected YYYY-MM-DD")]
  InvalidDate(String),

  /// The sort criterion isn't one of relevance, date, authors or title.
  #[error("Invalid sort criterion `{0}`, expected relevance, date, authors or title")]
  InvalidSortBy(String),
}

/// What the user asked for, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
  /// Free-text query, passed to arXiv as is
  pub query:       String,
  /// How many records to show
  pub max_results: usize,
  /// Earliest submission date, `YYYY-MM-DD`
  pub from:        Option<String>,
  /// Latest submission date, `YYYY-MM-DD`
  pub to:          Option<String>,
  /// Sort criterion
  pub sort_by:     SortBy,
  /// Sort direction
  pub ascending:   bool,
}

impl Default for SearchForm {
  fn default() -> Self {
    Self {
      query:       String::new(),
      max_results: SearchRequest::DEFAULT_MAX_RESULTS,
      from:        None,
      to:          None,
      sort_by:     SortBy::default(),
      ascending:   false,
    }
  }
}

impl SearchForm {
  /// Whether at least one date bound was filled in.
  pub fn has_date_window(&self) -> bool {
    [&self.from, &self.to].into_iter().flatten().any(|bound| !bound.trim().is_empty())
  }

  /// Checks the input and turns it into a search request.
  ///
  /// When only one date bound is filled in, the other one opens the window as wide as possible:
  /// back to [`arxiv_launch`] or up to [`today`].
  pub fn validate(&self) -> Result<SearchRequest, FormError> {
    let query = self.query.trim();
    if query.is_empty() {
      return Err(FormError::EmptyQuery);
    }
    if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.max_results) {
      return Err(FormError::MaxResultsOutOfRange(self.max_results));
    }

    let from = parse_bound(self.from.as_deref())?;
    let to = parse_bound(self.to.as_deref())?;
    let date_range = match (from, to) {
      (None, None) => None,
      (start, end) => {
        let range = DateRange::new(start.unwrap_or_else(arxiv_launch), end.unwrap_or_else(today));
        if range.is_inverted() {
          return Err(FormError::InvertedDates);
        }
        Some(range)
      },
    };

    let mut request = SearchRequest::new(query)
      .with_max_results(self.max_results)
      .with_sort(self.sort_by, self.ascending);
    if let Some(range) = date_range {
      request = request.with_date_range(range);
    }
    Ok(request)
  }
}

/// Parses an optional date bound; blank text counts as absent.
fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, FormError> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
      .map(Some)
      .map_err(|_| FormError::InvalidDate(s.to_string())),
  }
}

/// Result of a search that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// At least one record matched.
  Found(Vec<Paper>),
  /// The search ran fine but nothing matched.
  NoMatches,
  /// The search itself failed.
  Failed(ErrorKind),
}

impl Outcome {
  /// The notice shown in place of results, if any.
  pub fn notice(&self) -> Option<&'static str> {
    match self {
      Outcome::Found(_) => None,
      Outcome::NoMatches => Some("No papers found matching your search terms and date range."),
      Outcome::Failed(ErrorKind::Network) =>
        Some("Could not reach arXiv. Please try again in a moment."),
      Outcome::Failed(ErrorKind::Malformed) =>
        Some("arXiv sent a response that could not be read. Please try again later."),
      Outcome::Failed(ErrorKind::RejectedQuery) =>
        Some("arXiv rejected the search query. Check its syntax and try again."),
      Outcome::Failed(ErrorKind::NotFound) => Some("arXiv returned no usable records."),
      Outcome::Failed(ErrorKind::Io) => Some("The search failed unexpectedly."),
    }
  }
}

/// Headline above a list of `count` results.
pub fn found_message(count: usize, windowed: bool) -> String {
  if windowed {
    format!("Found {count} papers within the specified date range")
  } else {
    format!("Found {count} papers")
  }
}

/// Validates `form`, runs the search and classifies the result.
///
/// Records are filtered to the requested date window once more after the search. arXiv already
/// applies the same window on its side; the second pass keeps stray records out regardless.
pub async fn run_search(client: &ArxivClient, form: &SearchForm) -> Result<Outcome, FormError> {
  let request = form.validate()?;
  debug!("Running search: {request:?}");

  let outcome = match client.try_search(&request).await {
    Ok(mut papers) => {
      if let Some(range) = request.date_range {
        papers.retain(|paper| range.contains(paper.publication_date));
      }
      if papers.is_empty() {
        Outcome::NoMatches
      } else {
        Outcome::Found(papers)
      }
    },
    Err(e) => {
      error!("Search for `{}` failed: {e}", request.query);
      Outcome::Failed(e.kind())
    },
  };
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use paperscope::ClientConfig;
  use wiremock::{
    matchers::{method, query_param},
    Mock, MockServer, ResponseTemplate,
  };

  use super::*;

  fn form(query: &str) -> SearchForm { SearchForm { query: query.to_string(), ..Default::default() } }

  fn feed(entries: &[(&str, &str)]) -> String {
    let entries: String = entries
      .iter()
      .map(|(id, published)| {
        format!(
          "<entry><id>http://arxiv.org/abs/{id}</id><published>{published}</published>\
           <title>Paper {id}</title><summary>About {id}.</summary>\
           <author><name>Ada Lovelace</name></author></entry>"
        )
      })
      .collect();
    format!(r#"<feed xmlns="http://www.w3.org/2005/Atom">{entries}</feed>"#)
  }

  fn date(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap() }

  #[test]
  fn test_empty_query_is_rejected() {
    assert_eq!(form("").validate(), Err(FormError::EmptyQuery));
    assert_eq!(form("   ").validate(), Err(FormError::EmptyQuery));
    assert_eq!(FormError::EmptyQuery.to_string(), "Please enter a search query.");
  }

  #[test]
  fn test_inverted_dates_are_rejected() {
    let form = SearchForm {
      from: Some("2024-01-01".into()),
      to: Some("2023-01-01".into()),
      ..form("quantum")
    };
    assert_eq!(form.validate(), Err(FormError::InvertedDates));
    assert_eq!(FormError::InvertedDates.to_string(), "Earliest date must be before latest date");
  }

  #[test]
  fn test_same_day_window_is_accepted() {
    let form =
      SearchForm { from: Some("2024-01-01".into()), to: Some("2024-01-01".into()), ..form("q") };
    let request = form.validate().unwrap();
    assert_eq!(request.date_range, Some(DateRange::new(date("2024-01-01"), date("2024-01-01"))));
  }

  #[test]
  fn test_max_results_bounds() {
    for n in [0, 51] {
      let form = SearchForm { max_results: n, ..form("q") };
      assert_eq!(form.validate(), Err(FormError::MaxResultsOutOfRange(n)));
    }
    for n in [1, 50] {
      assert_eq!(SearchForm { max_results: n, ..form("q") }.validate().unwrap().max_results, n);
    }
  }

  #[test]
  fn test_single_bound_gets_default_partner() {
    let only_from = SearchForm { from: Some("2020-05-01".into()), ..form("q") };
    let range = only_from.validate().unwrap().date_range.unwrap();
    assert_eq!(range.start, date("2020-05-01"));
    assert_eq!(range.end, today());

    let only_to = SearchForm { to: Some(" 2000-01-01 ".into()), from: Some("".into()), ..form("q") };
    let range = only_to.validate().unwrap().date_range.unwrap();
    assert_eq!(range.start, arxiv_launch());
    assert_eq!(range.end, date("2000-01-01"));
  }

  #[test]
  fn test_invalid_date() {
    let form = SearchForm { from: Some("01/02/2020".into()), ..form("q") };
    assert_eq!(form.validate(), Err(FormError::InvalidDate("01/02/2020".into())));
  }

  #[test]
  fn test_request_carries_query_and_sort() {
    let form = SearchForm { sort_by: SortBy::Title, ascending: true, ..form("  au:hinton ") };
    let request = form.validate().unwrap();
    assert_eq!(request.query, "au:hinton");
    assert_eq!(request.sort_by, SortBy::Title);
    assert!(request.ascending);
    assert_eq!(request.date_range, None);
  }

  #[test]
  fn test_found_message_mentions_window_only_when_set() {
    assert_eq!(found_message(3, false), "Found 3 papers");
    assert_eq!(found_message(1, true), "Found 1 papers within the specified date range");

    assert!(!form("q").has_date_window());
    assert!(!SearchForm { from: Some(" ".into()), to: None, ..form("q") }.has_date_window());
    assert!(SearchForm { to: Some("2024-01-01".into()), ..form("q") }.has_date_window());
  }

  #[tokio::test]
  async fn test_invalid_form_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri())).unwrap();

    assert_eq!(run_search(&client, &form("")).await, Err(FormError::EmptyQuery));
  }

  #[tokio::test]
  async fn test_run_search_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "found"))
      .respond_with(
        ResponseTemplate::new(200).set_body_string(feed(&[("2401.00001v1", "2024-01-05T00:00:00Z")])),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "nothing"))
      .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(query_param("search_query", "broken"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;
    let client =
      ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_num_retries(0)).unwrap();

    match run_search(&client, &form("found")).await.unwrap() {
      Outcome::Found(papers) => assert_eq!(papers[0].title, "Paper 2401.00001v1"),
      other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(run_search(&client, &form("nothing")).await.unwrap(), Outcome::NoMatches);
    let failed = run_search(&client, &form("broken")).await.unwrap();
    assert_eq!(failed, Outcome::Failed(ErrorKind::Network));
    assert!(failed.notice().unwrap().contains("Could not reach arXiv"));
  }

  #[tokio::test]
  async fn test_unreadable_feed_is_reported_apart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<feed><entry><title>Cut</entry></feed>"))
      .mount(&server)
      .await;
    let client =
      ArxivClient::new(ClientConfig::for_testing(&server.uri()).with_num_retries(0)).unwrap();

    let failed = run_search(&client, &form("q")).await.unwrap();
    assert_eq!(failed, Outcome::Failed(ErrorKind::Malformed));
    let notice = failed.notice().unwrap();
    assert!(notice.contains("could not be read"));
    assert!(!notice.contains("Could not reach arXiv"));
  }

  #[tokio::test]
  async fn test_records_outside_window_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
        ("2401.00001v1", "2024-01-05T00:00:00Z"),
        ("2301.00002v1", "2023-01-05T00:00:00Z"),
      ])))
      .mount(&server)
      .await;
    let client = ArxivClient::new(ClientConfig::for_testing(&server.uri())).unwrap();

    let form =
      SearchForm { from: Some("2024-01-01".into()), to: Some("2024-12-31".into()), ..form("q") };
    match run_search(&client, &form).await.unwrap() {
      Outcome::Found(papers) => {
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].publication_date, date("2024-01-05"));
      },
      other => panic!("unexpected outcome {other:?}"),
    }
  }
}
