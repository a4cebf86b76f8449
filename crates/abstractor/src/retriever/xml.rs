use quick_xml::{
  events::{BytesStart, Event},
  Reader,
};

use super::*;

/// Value written for optional entry fields that are absent.
const NOT_AVAILABLE: &str = "N/A";

/// Parses an arXiv Atom feed.
///
/// Element prefixes are ignored, so `opensearch:totalResults` and `arxiv:comment` are matched
/// by their local names.
pub fn parse_feed(xml: &str) -> Result<SearchResults> {
  let mut reader = Reader::from_str(xml);
  let mut path_stack: Vec<String> = Vec::new();
  let mut text = String::new();
  let mut buf = Vec::new();

  let mut total_results: Option<usize> = None;
  let mut entry = EntryBuilder::default();
  let mut papers = Vec::new();

  loop {
    match reader.read_event_into(&mut buf)? {
      Event::Start(e) => {
        let name = local_name(&e);
        if name == "link" {
          entry.observe_link(&e)?;
        }
        path_stack.push(name);
        text.clear();
      },
      Event::Empty(e) =>
        if local_name(&e) == "link" {
          entry.observe_link(&e)?;
        },
      Event::Text(e) => text.push_str(&e.unescape()?),
      Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
      Event::End(_) => {
        let value = text.trim().to_string();
        match path_stack.join("/").as_str() {
          "feed/totalResults" => total_results = value.parse().ok(),
          "feed/entry/id" => entry.id = value,
          "feed/entry/title" => entry.title = collapse_whitespace(&value),
          "feed/entry/summary" => entry.summary = value,
          "feed/entry/published" => entry.published = date_prefix(&value),
          "feed/entry/updated" => entry.updated = date_prefix(&value),
          "feed/entry/comment" => entry.comment = Some(value),
          "feed/entry/journal_ref" => entry.journal_ref = Some(value),
          "feed/entry/author/name" => entry.authors.push(value),
          "feed/entry" => papers.push(std::mem::take(&mut entry).build()),
          _ => (),
        }
        path_stack.pop();
        text.clear();
      },
      Event::Eof => break,
      _ => (),
    }
    buf.clear();
  }

  trace!("Parsed {} entries (totalResults: {:?})", papers.len(), total_results);
  if total_results == Some(0) || papers.is_empty() {
    return Ok(SearchResults::NoResults);
  }
  Ok(SearchResults::Papers(papers))
}

/// Prefix-free element name.
fn local_name(e: &BytesStart) -> String { String::from_utf8_lossy(e.local_name().as_ref()).into_owned() }

/// The `YYYY-MM-DD` part of an RFC 3339 timestamp.
fn date_prefix(timestamp: &str) -> String { timestamp.chars().take(10).collect() }

/// Joins all runs of whitespace into single spaces.
fn collapse_whitespace(value: &str) -> String { value.split_whitespace().collect::<Vec<_>>().join(" ") }

/// Fields of the entry currently being read.
#[derive(Debug, Default)]
struct EntryBuilder {
  /// Entry id, the abstract page URL
  id:          String,
  /// Title
  title:       String,
  /// Abstract
  summary:     String,
  /// Author names
  authors:     Vec<String>,
  /// Link to the PDF, if the entry has one
  pdf_link:    Option<String>,
  /// Publication date
  published:   String,
  /// Update date
  updated:     String,
  /// Author comment
  comment:     Option<String>,
  /// Journal reference
  journal_ref: Option<String>,
}

impl EntryBuilder {
  /// Remembers the target of a `<link title="pdf">`.
  fn observe_link(&mut self, e: &BytesStart) -> Result<()> {
    let mut href = None;
    let mut is_pdf = false;
    for attribute in e.attributes() {
      let attribute = attribute.map_err(quick_xml::Error::from)?;
      match attribute.key.local_name().as_ref() {
        b"href" => href = Some(attribute.unescape_value()?.into_owned()),
        b"title" => is_pdf = attribute.unescape_value()? == "pdf",
        _ => (),
      }
    }
    if is_pdf {
      self.pdf_link = href;
    }
    Ok(())
  }

  /// Finishes the entry.
  fn build(self) -> PaperMetadata {
    PaperMetadata {
      title:       self.title,
      authors:     self.authors,
      summary:     self.summary,
      link:        self.pdf_link.unwrap_or(self.id),
      published:   self.published,
      updated:     self.updated,
      comment:     self.comment.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
      journal_ref: self.journal_ref.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
  }
}
