//! The browser front-end.
//!
//! A single page holds the search form; submitting it re-renders the page with one collapsible
//! panel per record. All values reach the page through autoescaped templates, so titles and
//! abstracts containing markup are shown as text.

use std::{net::SocketAddr, sync::Arc};

use axum::{
  extract::{Query, State},
  response::Html,
  routing::get,
  Router,
};
use minijinja::{context, Environment};
use paperscope::{ArxivClient, Paper, SortBy, DATE_FORMAT};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::{
  errors::PaperscopedErrors,
  form::{self, run_search, FormError, Outcome, SearchForm},
};

/// Sort criteria offered in the form, in display order.
const SORT_OPTIONS: [SortBy; 4] = [SortBy::Relevance, SortBy::Date, SortBy::Authors, SortBy::Title];

/// Shared by every request.
#[derive(Clone)]
struct AppState {
  /// Search client; clones share request pacing
  client:    ArxivClient,
  /// Compiled templates
  templates: Arc<Environment<'static>>,
}

/// Query string of `GET /`. Everything arrives as text so bad input can be reported in the page
/// instead of being rejected outright.
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
  /// Query text; absent on the first visit
  q:           Option<String>,
  /// Requested number of results
  max_results: Option<String>,
  /// Earliest date
  from:        Option<String>,
  /// Latest date
  to:          Option<String>,
  /// Sort criterion
  sort_by:     Option<String>,
  /// Checkbox: present when ticked
  ascending:   Option<String>,
}

impl SearchParams {
  /// Reads the submitted form.
  fn to_form(&self) -> Result<SearchForm, FormError> {
    let sort_by = match self.sort_by.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      Some(raw) => raw.parse().map_err(|_| FormError::InvalidSortBy(raw.to_string()))?,
      None => SortBy::default(),
    };
    let max_results = match self.max_results.as_deref().map(str::trim) {
      None | Some("") => SearchForm::default().max_results,
      Some(raw) => raw.parse().map_err(|_| FormError::InvalidMaxResults(raw.to_string()))?,
    };
    Ok(SearchForm {
      query: self.q.clone().unwrap_or_default(),
      max_results,
      from: self.from.clone(),
      to: self.to.clone(),
      sort_by,
      ascending: self.ascending.is_some(),
    })
  }
}

/// Builds the template environment.
fn templates() -> Result<Environment<'static>, PaperscopedErrors> {
  let mut env = Environment::new();
  env.add_template("index.html", include_str!("../templates/index.html"))?;
  Ok(env)
}

/// Builds the application router around `client`.
pub fn router(client: ArxivClient) -> Result<Router, PaperscopedErrors> {
  let state = AppState { client, templates: Arc::new(templates()?) };
  Ok(
    Router::new()
      .route("/", get(index))
      .route("/health", get(health))
      .layer(TraceLayer::new_for_http())
      .with_state(state),
  )
}

/// Serves the web front-end on `addr` until Ctrl-C.
pub async fn serve(client: ArxivClient, addr: SocketAddr) -> Result<(), PaperscopedErrors> {
  let app = router(client)?;
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!("Listening on http://{}", listener.local_addr()?);

  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!("Web server shut down");
  Ok(())
}

/// Resolves once the process receives Ctrl-C.
async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!("Received shutdown signal"),
    Err(e) => {
      error!("Failed to listen for Ctrl-C, serving until killed: {e}");
      std::future::pending::<()>().await;
    },
  }
}

/// Liveness probe.
async fn health() -> &'static str { "ok" }

/// Renders the search page, running the search when a query was submitted.
async fn index(
  State(state): State<AppState>,
  Query(params): Query<SearchParams>,
) -> Result<Html<String>, PaperscopedErrors> {
  let (default_from, default_to) = form::default_window();
  let mut from = default_from.format(DATE_FORMAT).to_string();
  let mut to = default_to.format(DATE_FORMAT).to_string();
  let mut error = None;
  let mut notice = None;
  let mut notice_level = "warning";
  let mut papers: Vec<Paper> = Vec::new();
  let mut found = None;

  let submitted = params.to_form();
  let input = submitted.clone().unwrap_or_default();

  if params.q.is_some() {
    from = input.from.clone().unwrap_or_default();
    to = input.to.clone().unwrap_or_default();
    debug!("Web search: {input:?}");

    let outcome = match submitted {
      Ok(search) => run_search(&state.client, &search).await,
      Err(e) => Err(e),
    };
    match outcome {
      Ok(Outcome::Found(records)) => {
        found = Some(form::found_message(records.len(), input.has_date_window()));
        papers = records;
      },
      Ok(outcome @ Outcome::Failed(_)) => {
        notice = outcome.notice();
        notice_level = "error";
      },
      Ok(outcome) => notice = outcome.notice(),
      Err(e) => error = Some(e.to_string()),
    }
  }

  let sort_options: Vec<String> = SORT_OPTIONS.iter().map(ToString::to_string).collect();
  let page = state.templates.get_template("index.html")?.render(context! {
    q => input.query,
    max_results => input.max_results,
    from => from,
    to => to,
    sort_by => input.sort_by.to_string(),
    ascending => input.ascending,
    sort_options => sort_options,
    min_date => form::arxiv_launch().format(DATE_FORMAT).to_string(),
    max_date => form::today().format(DATE_FORMAT).to_string(),
    min_results => form::MIN_RESULTS,
    max_results_limit => form::MAX_RESULTS,
    error => error,
    notice => notice,
    notice_level => notice_level,
    papers => papers,
    found => found,
  })?;
  Ok(Html(page))
}
