//! Search request construction and the orderings applied after a fetch.
//!
//! arXiv can order results by relevance or by date on its own. Ordering by authors or by title is
//! not something the API offers, so those requests are fetched in relevance order and re-sorted
//! here by [`SearchRequest::arrange`].
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use paperscope::{DateRange, SearchRequest, SortBy};
//!
//! let range = DateRange::new(
//!   NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!   NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//! );
//! let request = SearchRequest::new("quantum").with_date_range(range).with_sort(SortBy::Date, false);
//!
//! assert_eq!(request.search_query(), "quantum AND submittedDate:[2024-01-01 TO 2024-03-31]");
//! ```

use super::*;

/// How search results should be ordered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
  /// Upstream relevance ranking, best match first
  #[default]
  Relevance,
  /// Last-updated date, computed upstream
  Date,
  /// Comma-joined author list, computed locally
  Authors,
  /// Title, computed locally
  Title,
}

impl SortBy {
  /// The `sortBy` and `sortOrder` values sent upstream for this criterion.
  ///
  /// Criteria arXiv can't compute are fetched in relevance order and sorted afterwards.
  pub fn upstream_order(&self) -> (&'static str, &'static str) {
    match self {
      SortBy::Date => ("lastUpdatedDate", "ascending"),
      SortBy::Relevance | SortBy::Authors | SortBy::Title => ("relevance", "descending"),
    }
  }

  /// Whether this criterion is applied after the fetch rather than by the upstream API.
  pub fn is_local(&self) -> bool { matches!(self, SortBy::Authors | SortBy::Title) }
}

impl std::fmt::Display for SortBy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SortBy::Relevance => write!(f, "relevance"),
      SortBy::Date => write!(f, "date"),
      SortBy::Authors => write!(f, "authors"),
      SortBy::Title => write!(f, "title"),
    }
  }
}

impl FromStr for SortBy {
  type Err = PaperscopeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match &s.trim().to_lowercase() as &str {
      "relevance" => Ok(SortBy::Relevance),
      "date" => Ok(SortBy::Date),
      "authors" => Ok(SortBy::Authors),
      "title" => Ok(SortBy::Title),
      s => Err(PaperscopeError::InvalidSortBy(s.to_owned())),
    }
  }
}

/// An inclusive window of submission dates.
///
/// No ordering check happens here: an inverted window is passed upstream as-is, where it simply
/// matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  /// First day of the window
  pub start: NaiveDate,
  /// Last day of the window
  pub end:   NaiveDate,
}

impl DateRange {
  /// Creates a window from `start` to `end`, both inclusive.
  pub fn new(start: NaiveDate, end: NaiveDate) -> Self { Self { start, end } }

  /// Parses both bounds from `YYYY-MM-DD` text.
  pub fn parse(start: &str, end: &str) -> Result<Self, PaperscopeError> {
    Ok(Self {
      start: NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)?,
      end:   NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)?,
    })
  }

  /// Whether `start` lies after `end`.
  pub fn is_inverted(&self) -> bool { self.start > self.end }

  /// Whether `date` falls inside the window, bounds included.
  pub fn contains(&self, date: NaiveDate) -> bool { self.start <= date && date <= self.end }

  /// The upstream filter clause for this window.
  pub fn filter_clause(&self) -> String {
    format!("submittedDate:[{} TO {}]", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
  }
}

/// Everything needed to run one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
  /// Free text passed upstream unmodified
  pub query:       String,
  /// Upper bound on the number of returned records
  pub max_results: usize,
  /// Optional submission date window
  pub date_range:  Option<DateRange>,
  /// Requested ordering
  pub sort_by:     SortBy,
  /// Whether the ordering runs ascending; `false` yields the reverse of the natural order
  pub ascending:   bool,
}

impl SearchRequest {
  /// Default number of records returned by a search.
  pub const DEFAULT_MAX_RESULTS: usize = 10;

  /// Creates a relevance-ordered request for `query` with default limits and no date window.
  pub fn new(query: impl Into<String>) -> Self {
    Self {
      query:       query.into(),
      max_results: Self::DEFAULT_MAX_RESULTS,
      date_range:  None,
      sort_by:     SortBy::default(),
      ascending:   false,
    }
  }

  /// Sets the maximum number of returned records.
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results;
    self
  }

  /// Restricts the search to a submission date window.
  pub fn with_date_range(mut self, date_range: DateRange) -> Self {
    self.date_range = Some(date_range);
    self
  }

  /// Sets the ordering and its direction.
  pub fn with_sort(mut self, sort_by: SortBy, ascending: bool) -> Self {
    self.sort_by = sort_by;
    self.ascending = ascending;
    self
  }

  /// The `search_query` value sent upstream.
  ///
  /// With a date window the filter clause is AND-ed onto the free text, otherwise the text is
  /// returned untouched, empty or not.
  pub fn search_query(&self) -> String {
    match &self.date_range {
      Some(range) => format!("{} AND {}", self.query, range.filter_clause()),
      None => self.query.clone(),
    }
  }

  /// Puts freshly fetched records into the requested order and applies the result limit.
  ///
  /// - `Relevance` keeps the upstream order.
  /// - `Date` arrives oldest first from upstream and is reversed unless `ascending` is set.
  /// - `Authors` and `Title` are sorted case-insensitively here, then reversed unless `ascending`
  ///   is set.
  pub fn arrange(&self, mut papers: Vec<Paper>) -> Vec<Paper> {
    match self.sort_by {
      SortBy::Relevance => {},
      SortBy::Date =>
        if !self.ascending {
          papers.reverse();
        },
      SortBy::Authors => {
        papers.sort_by_cached_key(|paper| paper.authors_joined().to_lowercase());
        if !self.ascending {
          papers.reverse();
        }
      },
      SortBy::Title => {
        papers.sort_by_cached_key(|paper| paper.title.to_lowercase());
        if !self.ascending {
          papers.reverse();
        }
      },
    }
    papers.truncate(self.max_results);
    papers
  }
}
