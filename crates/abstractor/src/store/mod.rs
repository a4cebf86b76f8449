//! Durable CSV record store for paper metadata and derived summaries.
//!
//! The store is loaded once at the start of a run and written back in full after every
//! mutation. Writes go to a temporary file next to the store which is then renamed over it, so a
//! process killed at any point leaves either the previous checkpoint or the new one on disk,
//! never a half-written file.
//!
//! A null cell is an empty string, which is how dataframe tools write missing values. A record
//! whose `ai_abstract` cell is null is pending.
//!
//! # Examples
//!
//! ```no_run
//! # use abstractor::store::RecordStore;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RecordStore::open("papers.csv")?;
//! store.ensure_schema()?;
//!
//! for record in store.load_pending() {
//!   println!("Still to summarize: {}", record.title);
//! }
//! # Ok(())
//! # }
//! ```

use std::{collections::HashMap, io::Write};

use tempfile::NamedTempFile;

use super::*;
use crate::retriever::PaperMetadata;

mod record;

pub use self::record::Record;
use self::record::Columns;

/// Column holding the paper title.
pub const TITLE: &str = "title";
/// Column holding the joined author names.
pub const AUTHORS: &str = "authors";
/// Column holding the original abstract.
pub const SUMMARY: &str = "summary";
/// Column holding the unique row key.
pub const LINK: &str = "link";
/// Column holding the publication date written by the metadata source.
pub const PUBLISHED: &str = "published";
/// Column holding the derived summary or error marker.
pub const AI_ABSTRACT: &str = "ai_abstract";
/// Reserved companion column. Ensured by the schema but never written by the pipeline.
pub const AI_SUMMARY: &str = "ai_summary";

/// Columns added (as all-null) by [`RecordStore::ensure_schema`].
pub const DERIVED_COLUMNS: [&str; 2] = [AI_ABSTRACT, AI_SUMMARY];

/// Columns of a store freshly created by [`RecordStore::create`].
pub const SEARCH_COLUMNS: [&str; 5] = [TITLE, AUTHORS, PUBLISHED, LINK, SUMMARY];

/// Separator used when joining author names into one cell.
pub const AUTHOR_SEPARATOR: &str = "; ";

/// A tabular record store backed by a single CSV file.
#[derive(Debug)]
pub struct RecordStore {
  /// Location of the CSV file
  path:    PathBuf,
  /// Header row, in file order
  headers: Vec<String>,
  /// Data rows, in file order, each padded to the header's width
  rows:    Vec<Vec<String>>,
  /// Row index of every `link`
  links:   HashMap<String, usize>,
  /// Positions of the columns the pipeline reads
  columns: Columns,
}

impl RecordStore {
  /// Opens and fully reads an existing store.
  ///
  /// # Errors
  ///
  /// This function will return a storage error if:
  /// - The file cannot be read or is not valid CSV
  /// - Any of `title`, `authors`, `summary` or `link` is missing from the header
  /// - Two rows share the same `link`
  /// - A row has more fields than the header. Shorter rows are padded with nulls.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    for row in reader.records() {
      let row = row?;
      if row.len() > headers.len() {
        return Err(AbstractorError::MalformedRow {
          line:   row.position().map_or(0, csv::Position::line),
          fields: row.len(),
          header: headers.len(),
        });
      }
      let mut row: Vec<String> = row.iter().map(str::to_string).collect();
      row.resize(headers.len(), String::new());
      rows.push(row);
    }

    let mut links = HashMap::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
      let link = row[columns.link].clone();
      if links.insert(link.clone(), index).is_some() {
        return Err(AbstractorError::DuplicateLink(link));
      }
    }

    debug!("Opened record store {:?} with {} rows", path, rows.len());
    Ok(Self { path, headers, rows, links, columns })
  }

  /// Creates an empty store with the [`SEARCH_COLUMNS`] header and writes it to `path`.
  pub fn create(path: impl AsRef<Path>) -> Result<Self> {
    let headers: Vec<String> = SEARCH_COLUMNS.iter().map(|column| column.to_string()).collect();
    let columns = Columns::resolve(&headers)?;
    let store = Self {
      path: path.as_ref().to_path_buf(),
      headers,
      rows: Vec::new(),
      links: HashMap::new(),
      columns,
    };
    store.save()?;
    Ok(store)
  }

  /// Opens the store at `path`, creating an empty one first if there is no file there.
  pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
    if path.as_ref().exists() {
      Self::open(path)
    } else {
      Self::create(path)
    }
  }

  /// The file this store reads from and checkpoints to.
  pub fn path(&self) -> &Path { &self.path }

  /// The header row, in file order.
  pub fn headers(&self) -> &[String] { &self.headers }

  /// Number of data rows.
  pub fn len(&self) -> usize { self.rows.len() }

  /// Whether the store has no data rows.
  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Every record, in row order.
  pub fn records(&self) -> Vec<Record> {
    self.rows.iter().map(|row| self.columns.record(row)).collect()
  }

  /// The record keyed by `link`, if any.
  pub fn get(&self, link: &str) -> Option<Record> {
    self.links.get(link).map(|&index| self.columns.record(&self.rows[index]))
  }

  /// Raw value of `column` in the row keyed by `link`. Null cells are `None`.
  pub fn cell(&self, link: &str, column: &str) -> Option<&str> {
    let column = self.headers.iter().position(|header| header == column)?;
    let value = self.rows.get(*self.links.get(link)?)?.get(column)?;
    (!value.is_empty()).then_some(value.as_str())
  }

  /// Guarantees the presence of the [`DERIVED_COLUMNS`].
  ///
  /// Missing columns are appended as all-null and the store is persisted immediately. Calling
  /// this on a store that already has them does nothing and writes nothing.
  ///
  /// Returns whether any column had to be added.
  pub fn ensure_schema(&mut self) -> Result<bool> {
    let mut added = Vec::new();
    for column in DERIVED_COLUMNS {
      if !self.headers.iter().any(|header| header == column) {
        self.headers.push(column.to_string());
        for row in &mut self.rows {
          row.push(String::new());
        }
        added.push(column);
      }
    }

    if added.is_empty() {
      return Ok(false);
    }

    self.columns = Columns::resolve(&self.headers)?;
    self.save()?;
    info!("Added columns {:?} to {:?}", added, self.path);
    Ok(true)
  }

  /// Records whose `ai_abstract` is null, in original row order.
  ///
  /// An empty result means there is nothing left to do.
  pub fn load_pending(&self) -> Vec<Record> {
    self.rows.iter().map(|row| self.columns.record(row)).filter(Record::is_pending).collect()
  }

  /// Overwrites the `ai_abstract` of the record keyed by `link` and checkpoints the store.
  ///
  /// When this returns `Ok` the new value is on disk. When it returns early or the process dies
  /// first, the file still holds the previous checkpoint.
  ///
  /// # Errors
  ///
  /// - [`AbstractorError::UnknownLink`] if no row has this `link`
  /// - [`AbstractorError::MissingColumn`] if [`ensure_schema`](Self::ensure_schema) was never run
  /// - An I/O, CSV or persist error if writing the checkpoint fails
  pub fn apply_update(&mut self, link: &str, ai_abstract: &str) -> Result<()> {
    let index =
      *self.links.get(link).ok_or_else(|| AbstractorError::UnknownLink(link.to_string()))?;
    let column =
      self.columns.ai_abstract.ok_or_else(|| AbstractorError::MissingColumn(AI_ABSTRACT.into()))?;

    self.rows[index][column] = ai_abstract.to_string();
    self.save()?;
    trace!("Checkpointed {:?} after updating {}", self.path, link);
    Ok(())
  }

  /// Appends a row for every paper whose link is not already in the store, then checkpoints.
  ///
  /// Values land in the `title`, `authors`, `published`, `link` and `summary` columns where
  /// the header has them. Every other column of a new row is null.
  ///
  /// Returns the number of rows added.
  pub fn append(&mut self, papers: &[PaperMetadata]) -> Result<usize> {
    let position = |name: &str| self.headers.iter().position(|header| header == name);
    let published = position(PUBLISHED);

    let mut added = 0;
    for paper in papers {
      if self.links.contains_key(&paper.link) {
        debug!("Skipping {}, already in the record store", paper.link);
        continue;
      }

      let mut row = vec![String::new(); self.headers.len()];
      row[self.columns.title] = paper.title.clone();
      row[self.columns.authors] = paper.authors.join(AUTHOR_SEPARATOR);
      row[self.columns.summary] = paper.summary.clone();
      row[self.columns.link] = paper.link.clone();
      if let Some(published) = published {
        row[published] = paper.published.clone();
      }

      self.links.insert(paper.link.clone(), self.rows.len());
      self.rows.push(row);
      added += 1;
    }

    if added > 0 {
      self.save()?;
    }
    Ok(added)
  }

  /// Writes the whole store to a temporary sibling file and renames it over [`Self::path`].
  fn save(&self) -> Result<()> {
    let directory = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&directory)?;
    {
      let mut writer = csv::Writer::from_writer(&mut file);
      writer.write_record(&self.headers)?;
      for row in &self.rows {
        writer.write_record(row)?;
      }
      writer.flush()?;
    }
    file.flush()?;
    if let Ok(metadata) = std::fs::metadata(&self.path) {
      file.as_file().set_permissions(metadata.permissions())?;
    }
    file.as_file().sync_all()?;
    file.persist(&self.path)?;
    Ok(())
  }
}
