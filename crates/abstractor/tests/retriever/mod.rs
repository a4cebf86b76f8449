use abstractor::{
  error::AbstractorError,
  retriever::{ArxivClient, MetadataSource, SearchQuery, SearchResults, SortBy},
};
use wiremock::{
  matchers::{method, path, query_param},
  Mock, MockServer, ResponseTemplate,
};

use super::*;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <opensearch:totalResults>1</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2301.07041v2</id>
    <updated>2023-05-10T12:00:00Z</updated>
    <published>2023-01-17T18:00:00Z</published>
    <title>Verifiable Fully Homomorphic Encryption</title>
    <summary>We study FHE.</summary>
    <author><name>Alexander Viand</name></author>
    <author><name>Christian Knabenhans</name></author>
    <link title="pdf" href="http://arxiv.org/pdf/2301.07041v2" rel="related" type="application/pdf"/>
  </entry>
</feed>"#;

const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <opensearch:totalResults>0</opensearch:totalResults>
</feed>"#;

async fn arxiv(body: &str) -> (MockServer, ArxivClient) {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/query"))
    .and(query_param("search_query", "ti:homomorphic"))
    .and(query_param("sortBy", "submittedDate"))
    .respond_with(ResponseTemplate::new(200).set_body_string(body))
    .mount(&server)
    .await;
  let client = ArxivClient::new().with_base(&format!("{}/api/query", server.uri())).unwrap();
  (server, client)
}

fn query() -> SearchQuery { SearchQuery::new("ti:homomorphic").with_sort_by(SortBy::SubmittedDate) }

#[tokio::test]
async fn test_search_then_append() -> TestResult<()> {
  let (_server, client) = arxiv(FEED).await;
  let results = client.search(&query()).await?;
  assert_eq!(results.papers().len(), 1);

  let dir = tempdir()?;
  let path = dir.path().join("arxiv_results.csv");
  let mut store = RecordStore::open_or_create(&path)?;
  assert_eq!(store.append(results.papers())?, 1);
  assert_eq!(store.append(results.papers())?, 0);

  let store = RecordStore::open(&path)?;
  let link = "http://arxiv.org/pdf/2301.07041v2";
  assert_eq!(store.cell(link, "authors"), Some("Alexander Viand; Christian Knabenhans"));
  assert_eq!(store.cell(link, "published"), Some("2023-01-17"));
  assert_eq!(store.load_pending().len(), 1);
  Ok(())
}

#[tokio::test]
async fn test_no_results() -> TestResult<()> {
  let (_server, client) = arxiv(EMPTY_FEED).await;
  assert_eq!(client.search(&query()).await?, SearchResults::NoResults);
  Ok(())
}

#[tokio::test]
async fn test_error_status() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).mount(&server).await;
  let client = ArxivClient::new().with_base(&server.uri())?;

  let error = client.search(&query()).await.unwrap_err();
  assert!(matches!(error, AbstractorError::ApiError(_)));
  assert!(!error.is_storage());
  Ok(())
}
