use std::{net::SocketAddr, path::PathBuf, process::ExitCode, time::Duration};

use clap::{builder::ArgAction, Parser, Subcommand};
use console::style;
use errors::PaperscopedErrors;
use form::{run_search, Outcome, SearchForm};
use paperscope::{
  clients::ARXIV_API_URL, ArxivClient, ClientConfig, Fetcher, Locator, PaperscopeError, SortBy,
};
use render::{BOOKS, ERROR, LOOKING_GLASS, ROCKET, SAVE, SUCCESS, WARNING};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod errors;
pub mod form;
pub mod render;
pub mod web;

#[derive(Parser)]
#[command(author, version, about = "Search arXiv from the terminal or the browser")]
struct Cli {
  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// arXiv query endpoint
  #[arg(long, global = true, env = "PAPERSCOPE_ARXIV_URL", default_value = ARXIV_API_URL)]
  base_url: String,

  /// Records requested per upstream page
  #[arg(long, global = true, default_value_t = 100)]
  page_size: usize,

  /// Minimum number of seconds between two upstream requests
  #[arg(
        long,
        global = true,
        default_value = "3",
        allow_negative_numbers = true,
        value_parser = parse_delay
    )]
  delay_secs: Duration,

  /// How often a transient upstream failure is retried
  #[arg(long, global = true, default_value_t = 3)]
  retries: u32,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Search arXiv by keyword
  Search {
    /// Search query, passed to arXiv as is (e.g. `ti:transformer AND au:vaswani`)
    query:       String,
    /// Number of results to show (1-50)
    #[arg(long, short = 'n', default_value_t = 10)]
    max_results: usize,
    /// Earliest submission date, YYYY-MM-DD
    #[arg(long)]
    from:        Option<String>,
    /// Latest submission date, YYYY-MM-DD
    #[arg(long)]
    to:          Option<String>,
    /// Sort criterion (relevance, date, authors, title)
    #[arg(long, short, default_value = "relevance")]
    sort_by:     SortBy,
    /// Sort in ascending order
    #[arg(long)]
    ascending:   bool,
    /// Print the records as JSON
    #[arg(long)]
    json:        bool,
  },
  /// Look up a single paper by arXiv id or URL
  Fetch {
    /// arXiv id (2103.13916), arXiv URL, or the landing page of any paper
    identifier: String,
    /// Print the record as JSON
    #[arg(long)]
    json:       bool,
  },
  /// Download a paper's PDF
  Download {
    /// arXiv id (2103.13916), arXiv URL, or the landing page of any paper
    identifier:      String,
    /// Target directory, defaults to the user's download directory
    #[arg(long, short)]
    dir:             Option<PathBuf>,
    /// Overwrite existing files without asking
    #[arg(long)]
    accept_defaults: bool,
  },
  /// Serve the search page over HTTP
  Serve {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8501")]
    addr: SocketAddr,
  },
}

impl Cli {
  /// Client settings taken from the global flags.
  fn client_config(&self) -> ClientConfig {
    ClientConfig::default()
      .with_base_url(self.base_url.clone())
      .with_page_size(self.page_size)
      .with_delay(self.delay_secs)
      .with_num_retries(self.retries)
  }
}

/// Reads a delay given in (fractional) seconds.
fn parse_delay(raw: &str) -> Result<Duration, String> {
  let secs: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
  Duration::try_from_secs_f64(secs).map_err(|_| format!("`{raw}` is not a usable number of seconds"))
}

/// Setup logging with the specified verbosity level
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, PaperscopedErrors> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);
  let config = cli.client_config();
  trace!("Client config: {config:?}");

  match cli.command {
    Commands::Search { query, max_results, from, to, sort_by, ascending, json } => {
      let client = ArxivClient::new(config)?;
      let form = SearchForm { query, max_results, from, to, sort_by, ascending };

      if !json {
        println!("{} Searching arXiv for: {}", style(LOOKING_GLASS).cyan(), style(&form.query).yellow());
      }
      let outcome = match run_search(&client, &form).await {
        Ok(outcome) => outcome,
        Err(e) => {
          render::form_error(&e);
          return Ok(ExitCode::from(2));
        },
      };
      debug!("Search outcome: {outcome:?}");

      if json {
        match &outcome {
          Outcome::Found(papers) => println!("{}", serde_json::to_string_pretty(papers)?),
          Outcome::NoMatches => println!("[]"),
          Outcome::Failed(kind) =>
            eprintln!("{} {} ({kind})", ERROR, outcome.notice().unwrap_or_default()),
        }
      } else {
        render::outcome(&outcome, form.has_date_window());
      }

      Ok(match outcome {
        Outcome::Failed(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
      })
    },

    Commands::Fetch { identifier, json } => {
      let locator: Locator = identifier.parse()?;
      let fetcher = Fetcher::new(config)?;
      if !json {
        println!("{} Fetching paper: {}", style(LOOKING_GLASS).cyan(), style(&locator).yellow());
      }

      match fetcher.fetch(&locator).await {
        Ok(paper) => {
          if json {
            println!("{}", serde_json::to_string_pretty(&paper)?);
          } else {
            render::paper(&paper);
          }
          Ok(ExitCode::SUCCESS)
        },
        Err(PaperscopeError::NotFound) => {
          println!("{} Paper not found", style(WARNING).yellow());
          Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e.into()),
      }
    },

    Commands::Download { identifier, dir, accept_defaults } => {
      let locator: Locator = identifier.parse()?;
      let fetcher = Fetcher::new(config)?;

      let dir = dir.unwrap_or_else(|| {
        let default_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        println!(
          "{} Using default download directory: {}",
          style(BOOKS).cyan(),
          style(default_dir.display()).yellow()
        );
        default_dir
      });
      if !dir.exists() {
        trace!("Creating download directory: {}", dir.display());
        std::fs::create_dir_all(&dir)?;
      }

      println!("{} Fetching paper: {}", style(LOOKING_GLASS).cyan(), style(&locator).yellow());
      let paper = match fetcher.fetch(&locator).await {
        Ok(paper) => paper,
        Err(PaperscopeError::NotFound) => {
          println!("{} Paper not found", style(WARNING).yellow());
          return Ok(ExitCode::FAILURE);
        },
        Err(e) => return Err(e.into()),
      };
      println!("   {} {}", style("Title:").green().bold(), style(&paper.title).white());

      let target = paper.pdf_path(&dir);
      if target.exists() && !accept_defaults {
        println!("{} File already exists: {}", style(WARNING).yellow(), style(target.display()).yellow());
        let overwrite = dialoguer::Confirm::new()
          .with_prompt("Do you want to overwrite it?")
          .default(false)
          .interact()?;
        if !overwrite {
          println!("{} Keeping existing file", style("ℹ").blue());
          return Ok(ExitCode::SUCCESS);
        }
      }

      println!("{} Downloading PDF...", style(ROCKET).cyan());
      match paper.download_pdf(fetcher.http(), &dir).await {
        Ok(path) => {
          println!("{} Saved to {}", style(SAVE).green(), style(path.display()).yellow());
          println!("{} Done!", style(SUCCESS).green());
          Ok(ExitCode::SUCCESS)
        },
        Err(PaperscopeError::NoPdf) => {
          println!("{} No PDF available for this paper", style(WARNING).yellow());
          Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e.into()),
      }
    },

    Commands::Serve { addr } => {
      let client = ArxivClient::new(config)?;
      println!("{} Serving on http://{}", style(ROCKET).cyan(), style(addr).yellow());
      web::serve(client, addr).await?;
      Ok(ExitCode::SUCCESS)
    },
  }
}
