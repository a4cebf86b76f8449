//! Module for the "search" command.

use abstractor::{
  retriever::{MetadataSource, PaperMetadata, SearchQuery, SearchResults, SortBy, SortOrder},
  store::{RecordStore, AUTHOR_SEPARATOR},
};

use super::*;

/// Number of abstract characters shown per result.
const ABSTRACT_PREVIEW_CHARS: usize = 200;

/// Options for [`Commands::Search`].
#[derive(Args, Clone)]
pub struct SearchOptions {
  /// Search query in arXiv syntax, e.g. "ti:quantum AND cat:physics.geo-ph"
  pub query: String,

  /// Offset of the first result
  #[arg(long, default_value_t = 0)]
  pub start: usize,

  /// Maximum number of results
  #[arg(long, default_value_t = 10)]
  pub max_results: usize,

  /// Sort field (relevance, lastUpdatedDate, submittedDate)
  #[arg(long, default_value = "relevance")]
  pub sort_by: SortBy,

  /// Sort order (ascending, descending)
  #[arg(long, default_value = "descending")]
  pub sort_order: SortOrder,

  /// Append the results to a CSV file. Without a value, a timestamped file name is used
  #[arg(long, num_args = 0..=1, value_name = "FILE")]
  pub save_csv: Option<Option<String>>,
}

/// Function for the [`Commands::Search`] in the CLI.
pub async fn search(config: &Config, options: SearchOptions) -> Result<ExitCode> {
  let SearchOptions { query, start, max_results, sort_by, sort_order, save_csv } = options;
  let query = SearchQuery::new(query)
    .with_start(start)
    .with_max_results(max_results)
    .with_sort_by(sort_by)
    .with_sort_order(sort_order);

  println!("{} Searching arXiv for: {}", style(INFO_PREFIX).blue(), style(&query.query).yellow());

  let papers = match config.arxiv_client()?.search(&query).await? {
    SearchResults::NoResults => {
      println!("{} No results found for your search query.", style(INFO_PREFIX).blue());
      return Ok(ExitCode::SUCCESS);
    },
    SearchResults::Papers(papers) => papers,
  };

  println!("{} Found {} papers", style(SUCCESS_PREFIX).green(), style(papers.len()).bold());
  for (index, paper) in papers.iter().enumerate() {
    let prefix = if index + 1 == papers.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
    display_paper(prefix, index + 1, paper);
  }

  if let Some(file) = save_csv {
    let path = csv_path(file);
    let mut store = RecordStore::open_or_create(&path)?;
    let added = store.append(&papers)?;
    println!(
      "{} Saved {} new papers to {}",
      style(SUCCESS_PREFIX).green(),
      style(added).bold(),
      style(path.display()).cyan()
    );
  }
  Ok(ExitCode::SUCCESS)
}

/// Prints one search hit as a tree item.
fn display_paper(prefix: &str, number: usize, paper: &PaperMetadata) {
  println!("{} {}. {}", style(prefix).dim(), number, style(&paper.title).white().bold());
  let continuation = style(CONTINUE_PREFIX).dim();
  println!("{}   Authors: {}", continuation, style(paper.authors.join(AUTHOR_SEPARATOR)).cyan());
  println!("{}   Published: {}", continuation, style(&paper.published).cyan());
  println!("{}   Link: {}", continuation, style(&paper.link).blue().underlined());
  if paper.journal_ref != "N/A" {
    println!("{}   Journal: {}", continuation, paper.journal_ref);
  }

  let preview: String = paper.summary.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
  let ellipsis = if paper.summary.chars().count() > ABSTRACT_PREVIEW_CHARS { "..." } else { "" };
  println!("{}   Abstract: {}{}", continuation, style(preview).dim(), ellipsis);
}

/// Resolves the `--save-csv` value to a file name ending in `.csv`.
fn csv_path(file: Option<String>) -> PathBuf {
  let file = file.filter(|file| !file.trim().is_empty()).unwrap_or_else(|| {
    format!("arxiv_results_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
  });
  if file.ends_with(".csv") {
    PathBuf::from(file)
  } else {
    PathBuf::from(format!("{file}.csv"))
  }
}
