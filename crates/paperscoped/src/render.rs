//! Terminal output.

use console::{style, Emoji};
use paperscope::Paper;

use crate::form::{found_message, FormError, Outcome};

pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
pub static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
pub static PAPER: Emoji<'_, '_> = Emoji("📄 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
pub static SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");

/// Prints the result of a search; `windowed` tells whether a date range was asked for.
pub fn outcome(outcome: &Outcome, windowed: bool) {
  match outcome {
    Outcome::Found(papers) => {
      let headline = found_message(papers.len(), windowed);
      println!("\n{} {}", style(SUCCESS).green(), style(headline).yellow());
      for (i, paper) in papers.iter().enumerate() {
        panel(i + 1, paper);
      }
    },
    Outcome::NoMatches => {
      println!("{} {}", style(WARNING).yellow(), outcome.notice().unwrap_or_default());
    },
    Outcome::Failed(kind) => {
      println!(
        "{} {} ({})",
        style(ERROR).red(),
        style(outcome.notice().unwrap_or_default()).red(),
        style(kind).dim()
      );
    },
  }
}

/// Prints a validation message for the search form.
pub fn form_error(error: &FormError) { println!("{} {}", style(ERROR).red(), style(error).red()); }

/// Prints one numbered search result.
fn panel(index: usize, paper: &Paper) {
  println!("\n{}. {}{}", style(index).yellow(), style(PAPER).cyan(), style(&paper.title).white().bold());
  details(paper);
}

/// Prints a single record looked up by identifier.
pub fn paper(paper: &Paper) {
  println!("\n{} {}", style(PAPER).green(), style(&paper.title).white().bold());
  details(paper);
  if let Some(doi) = &paper.doi {
    println!("   {} {}", style("DOI:").green().bold(), style(doi).blue().underlined());
  }
}

/// The metadata lines every record shows.
fn details(paper: &Paper) {
  let authors = if paper.authors.is_empty() {
    style("No authors listed").red().italic().to_string()
  } else {
    style(paper.authors_joined()).white().to_string()
  };
  println!("   {} {}", style("Authors:").green().bold(), authors);
  println!("   {} {}", style("Published:").green().bold(), style(paper.publication_date).white());
  if let Some(url) = &paper.url {
    println!("   {} {}", style("View on arXiv:").green().bold(), style(url).blue().underlined());
  }
  if let Some(url) = &paper.pdf_url {
    println!("   {} {}", style("Download PDF:").green().bold(), style(url).blue().underlined());
  }
  println!("   {}", style("Abstract:").green().bold());
  for line in textwrap(&paper.abstract_text, 96) {
    println!("     {}", style(line).white().italic());
  }
}

/// Greedy word wrap; a single overlong word gets a line of its own.
fn textwrap(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut line = String::new();
  for word in text.split_whitespace() {
    if !line.is_empty() && line.len() + 1 + word.len() > width {
      lines.push(std::mem::take(&mut line));
    }
    if !line.is_empty() {
      line.push(' ');
    }
    line.push_str(word);
  }
  if !line.is_empty() {
    lines.push(line);
  }
  lines
}
