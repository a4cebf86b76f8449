use super::*;

/// One paper as seen by the summarization pipeline.
///
/// Only the columns the pipeline reads are surfaced here; any other columns in the store are
/// carried through untouched by [`RecordStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// The paper's title
  pub title:       String,
  /// Author names, joined with `; ` (or `, ` in older files)
  pub authors:     String,
  /// The original abstract
  pub summary:     String,
  /// Unique key of the row, typically the PDF link
  pub link:        String,
  /// The derived summary or an `Error: ...` marker; `None` means the record is pending
  pub ai_abstract: Option<String>,
}

impl Record {
  /// Whether this record still needs a derived summary.
  pub fn is_pending(&self) -> bool { self.ai_abstract.is_none() }
}

/// Column positions resolved once against the store's header.
#[derive(Debug, Clone, Copy)]
pub(super) struct Columns {
  /// Position of `title`
  pub title:       usize,
  /// Position of `authors`
  pub authors:     usize,
  /// Position of `summary`
  pub summary:     usize,
  /// Position of `link`
  pub link:        usize,
  /// Position of `ai_abstract`, absent until the schema has been ensured
  pub ai_abstract: Option<usize>,
}

impl Columns {
  /// Resolves the required columns, failing on the first one that is missing.
  pub(super) fn resolve(headers: &[String]) -> Result<Self> {
    let find = |name: &str| headers.iter().position(|header| header == name);
    let require =
      |name: &str| find(name).ok_or_else(|| AbstractorError::MissingColumn(name.to_string()));

    Ok(Self {
      title:       require(TITLE)?,
      authors:     require(AUTHORS)?,
      summary:     require(SUMMARY)?,
      link:        require(LINK)?,
      ai_abstract: find(AI_ABSTRACT),
    })
  }

  /// Builds a [`Record`] view over a raw row.
  pub(super) fn record(&self, row: &[String]) -> Record {
    let cell = |index: usize| row.get(index).cloned().unwrap_or_default();
    Record {
      title:       cell(self.title),
      authors:     cell(self.authors),
      summary:     cell(self.summary),
      link:        cell(self.link),
      ai_abstract: self.ai_abstract.and_then(|index| row.get(index)).and_then(|value| {
        if value.is_empty() {
          None
        } else {
          Some(value.clone())
        }
      }),
    }
  }
}
