//! Paper metadata retrieval from arXiv.
//!
//! This module feeds the record store. A [`MetadataSource`] takes a [`SearchQuery`] and returns
//! either [`SearchResults::NoResults`] or a list of [`PaperMetadata`] hits in whatever order the
//! source chose; [`RecordStore::append`](crate::store::RecordStore::append) then adds the ones
//! the store has not seen yet.
//!
//! # Search syntax
//!
//! Queries are passed to arXiv verbatim, so its field prefixes and boolean operators apply:
//!
//! | Prefix | Field             |
//! |--------|-------------------|
//! | `ti:`  | Title             |
//! | `au:`  | Author            |
//! | `abs:` | Abstract          |
//! | `co:`  | Comment           |
//! | `jr:`  | Journal reference |
//! | `cat:` | Category          |
//! | `rn:`  | Report number     |
//! | `all:` | All fields        |
//!
//! combined with `AND`, `OR` and `ANDNOT`.
//!
//! # Examples
//!
//! ```no_run
//! use abstractor::retriever::{ArxivClient, MetadataSource, SearchQuery, SearchResults};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let query = SearchQuery::new("cat:physics.geo-ph").with_max_results(5);
//!
//! match ArxivClient::new().search(&query).await? {
//!   SearchResults::NoResults => println!("No results found for your search query."),
//!   SearchResults::Papers(papers) =>
//!     for paper in papers {
//!       println!("{} ({})", paper.title, paper.published);
//!     },
//! }
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use super::*;

mod xml;

pub use self::xml::parse_feed;

/// Endpoint of the arXiv query API.
pub const ARXIV_API: &str = "http://export.arxiv.org/api/query";

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
  /// Paper title, with internal whitespace collapsed
  pub title:       String,
  /// Author names in listed order
  pub authors:     Vec<String>,
  /// Original abstract
  pub summary:     String,
  /// PDF link when the source has one, otherwise the entry id
  pub link:        String,
  /// First publication date, `YYYY-MM-DD`
  pub published:   String,
  /// Last update date, `YYYY-MM-DD`
  pub updated:     String,
  /// Author comment, or `N/A`
  pub comment:     String,
  /// Journal reference, or `N/A`
  pub journal_ref: String,
}

/// What a search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResults {
  /// The source has nothing for this query. Not an error.
  NoResults,
  /// At least one hit.
  Papers(Vec<PaperMetadata>),
}

impl SearchResults {
  /// The hits, empty for [`SearchResults::NoResults`].
  pub fn papers(&self) -> &[PaperMetadata] {
    match self {
      Self::NoResults => &[],
      Self::Papers(papers) => papers,
    }
  }
}

/// Field to sort results by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
  /// Best match first
  #[default]
  Relevance,
  /// Most recently updated
  LastUpdatedDate,
  /// Most recently submitted
  SubmittedDate,
}

impl SortBy {
  /// Wire value of the sort field.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Relevance => "relevance",
      Self::LastUpdatedDate => "lastUpdatedDate",
      Self::SubmittedDate => "submittedDate",
    }
  }
}

impl FromStr for SortBy {
  type Err = AbstractorError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "relevance" => Ok(Self::Relevance),
      "lastUpdatedDate" => Ok(Self::LastUpdatedDate),
      "submittedDate" => Ok(Self::SubmittedDate),
      other => Err(AbstractorError::Config(format!(
        "Invalid sort field \"{other}\", expected relevance, lastUpdatedDate or submittedDate"
      ))),
    }
  }
}

/// Direction to sort results in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
  /// Smallest first
  Ascending,
  /// Largest first
  #[default]
  Descending,
}

impl SortOrder {
  /// Wire value of the sort order.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ascending => "ascending",
      Self::Descending => "descending",
    }
  }
}

impl FromStr for SortOrder {
  type Err = AbstractorError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "ascending" => Ok(Self::Ascending),
      "descending" => Ok(Self::Descending),
      other => Err(AbstractorError::Config(format!(
        "Invalid sort order \"{other}\", expected ascending or descending"
      ))),
    }
  }
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  /// Query in the source's syntax
  pub query:       String,
  /// Offset of the first result
  pub start:       usize,
  /// Maximum number of results
  pub max_results: usize,
  /// Sort field
  pub sort_by:     SortBy,
  /// Sort direction
  pub sort_order:  SortOrder,
}

impl SearchQuery {
  /// A query for the first ten results by relevance.
  pub fn new(query: impl Into<String>) -> Self {
    Self {
      query:       query.into(),
      start:       0,
      max_results: 10,
      sort_by:     SortBy::default(),
      sort_order:  SortOrder::default(),
    }
  }

  /// Sets the offset of the first result.
  pub fn with_start(mut self, start: usize) -> Self {
    self.start = start;
    self
  }

  /// Sets the maximum number of results.
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results;
    self
  }

  /// Sets the sort field.
  pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
    self.sort_by = sort_by;
    self
  }

  /// Sets the sort direction.
  pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
    self.sort_order = sort_order;
    self
  }
}

/// Anything that can answer a [`SearchQuery`] with paper metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
  /// Runs the search.
  async fn search(&self, query: &SearchQuery) -> Result<SearchResults>;
}

/// [`MetadataSource`] backed by the arXiv Atom API.
#[derive(Debug, Clone)]
pub struct ArxivClient {
  /// Underlying HTTP client
  http: reqwest::Client,
  /// Query endpoint
  base: Url,
}

impl ArxivClient {
  /// Creates a client for the public arXiv API.
  pub fn new() -> Self {
    Self {
      http: reqwest::Client::new(),
      base: Url::parse(ARXIV_API).expect("arXiv endpoint is a valid URL"),
    }
  }

  /// Points the client at a different query endpoint.
  pub fn with_base(mut self, base: &str) -> Result<Self> {
    self.base = Url::parse(base)
      .map_err(|e| AbstractorError::Config(format!("Invalid arXiv endpoint {base:?}: {e}")))?;
    Ok(self)
  }

  /// Full request URL for a query.
  pub fn query_url(&self, query: &SearchQuery) -> Url {
    let mut url = self.base.clone();
    url
      .query_pairs_mut()
      .append_pair("search_query", &query.query)
      .append_pair("start", &query.start.to_string())
      .append_pair("max_results", &query.max_results.to_string())
      .append_pair("sortBy", query.sort_by.as_str())
      .append_pair("sortOrder", query.sort_order.as_str());
    url
  }
}

impl Default for ArxivClient {
  fn default() -> Self { Self::new() }
}

#[async_trait]
impl MetadataSource for ArxivClient {
  async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
    let url = self.query_url(query);
    debug!("Querying arXiv: {}", url);

    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(AbstractorError::ApiError(format!("arXiv returned HTTP {status}")));
    }

    let body = response.bytes().await?;
    parse_feed(&String::from_utf8_lossy(&body))
  }
}
