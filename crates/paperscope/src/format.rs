//! Turning paper titles into file names.
//!
//! arXiv titles routinely contain LaTeX, slashes and colons, none of which belong in a file name.
//! [`pdf_filename`] keeps only lowercase letters, digits and hyphens, joins words with
//! underscores and cuts the result at a word boundary.
//!
//! # Examples
//!
//! ```
//! use paperscope::format;
//!
//! let title = "Quantum Error Correction: A Survey of $\\mathbb{Z}_2$ Codes";
//!
//! // Default formatting (50 char limit)
//! assert_eq!(format::pdf_filename(title, None), "quantum_error_correction_a_survey_of_mathbbz2");
//!
//! // Custom length limit
//! assert_eq!(format::pdf_filename(title, Some(20)), "quantum_error");
//! ```

/// Default upper bound on the length of a generated file name stem.
pub const DEFAULT_MAX_LENGTH: usize = 50;

/// Formats a title into a file name stem (no extension).
///
/// - Lowercases the text
/// - Drops every character that isn't ASCII alphanumeric, whitespace or a hyphen
/// - Collapses whitespace runs into single underscores
/// - Truncates at word boundaries to at most `max_length` characters (default 50)
///
/// A title with nothing usable left falls back to `"paper"`.
pub fn pdf_filename(title: &str, max_length: Option<usize>) -> String {
  let cleaned: String = title
    .to_lowercase()
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
    .collect();

  let max_length = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
  let mut result = String::new();

  for word in cleaned.split_whitespace() {
    let separator = usize::from(!result.is_empty());
    if result.len() + separator + word.len() > max_length {
      break;
    }
    if separator == 1 {
      result.push('_');
    }
    result.push_str(word);
  }

  if result.is_empty() {
    // A single word longer than the limit still deserves a name
    result = cleaned.split_whitespace().next().unwrap_or("paper").chars().take(max_length).collect();
  }
  if result.is_empty() {
    result.push_str("paper");
  }
  result
}
