use super::*;

const ROWS: &str = "A,Ada Lovelace,Abstract of A,link-a\nB,Alan Turing,Abstract of B,link-b\nC,Grace \
                    Hopper,Abstract of C,link-c\n";

#[tokio::test]
async fn test_each_row_gets_its_own_outcome() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, ROWS);
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock)
    .script("B", vec![Err(CallError::Blocked("policy".to_string()))])
    .script("C", vec![transient(), Ok("S-C".to_string())]);

  let report = run(&path, &client, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert_eq!(report, RunReport { pending: 3, succeeded: 2, failed: 1, halted: None });
  assert!(report.is_complete());
  assert_eq!(client.titles(), vec!["A", "B", "C", "C"]);

  let store = RecordStore::open(&path)?;
  assert_eq!(store.cell("link-a", AI_ABSTRACT), Some("S-A"));
  assert_eq!(store.cell("link-b", AI_ABSTRACT), Some("Error: policy"));
  assert_eq!(store.cell("link-c", AI_ABSTRACT), Some("S-C"));
  assert_eq!(store.cell("link-a", AI_SUMMARY), None);
  assert_eq!(store.cell("link-c", "authors"), Some("Grace Hopper"));
  assert_eq!(store.headers(), ["title", "authors", "summary", "link", "ai_abstract", "ai_summary"]);
  Ok(())
}

#[tokio::test]
async fn test_quota_exhaustion_halts_the_run() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, ROWS);
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock).script("A", vec![quota(), quota(), quota()]);

  let report = run(&path, &client, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert_eq!(report.halted.as_deref(), Some("Rate limit exceeded: Quota exceeded"));
  assert!(!report.is_complete());
  assert_eq!(report.unprocessed(), 2);
  assert_eq!(client.titles(), vec!["A", "A", "A"]);

  let store = RecordStore::open(&path)?;
  assert_eq!(
    store.cell("link-a", AI_ABSTRACT),
    Some("Error: Rate limit exceeded: Quota exceeded")
  );
  assert_eq!(store.cell("link-b", AI_ABSTRACT), None);
  assert_eq!(store.cell("link-c", AI_ABSTRACT), None);
  Ok(())
}

#[tokio::test]
async fn test_transient_exhaustion_moves_on() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, ROWS);
  let clock = FakeClock::new();
  let client =
    ScriptedClient::new(&clock).script("A", vec![transient(), transient(), transient()]);

  let report = run(&path, &client, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert_eq!(report, RunReport { pending: 3, succeeded: 2, failed: 1, halted: None });

  let store = RecordStore::open(&path)?;
  assert_eq!(store.cell("link-a", AI_ABSTRACT), Some("Error: HTTP 503: Unavailable"));
  assert_eq!(store.cell("link-b", AI_ABSTRACT), Some("S-B"));
  Ok(())
}

#[tokio::test]
async fn test_retry_backoff_is_linear() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\n");
  let clock = FakeClock::new();
  let client =
    ScriptedClient::new(&clock).script("A", vec![transient(), transient(), transient()]);

  run(&path, &client, &clock, Pacer::default(), RetryPolicy::default()).await?;

  // Backoffs of 120s and 240s already cover the 120s pacing interval.
  assert_eq!(clock.sleeps(), vec![Duration::from_secs(120), Duration::from_secs(240)]);
  assert_eq!(clock.elapsed(), Duration::from_secs(360));
  Ok(())
}

#[tokio::test]
async fn test_unreadable_store_is_an_error() -> TestResult<()> {
  let dir = tempdir()?;
  let path = dir.path().join("papers.csv");
  std::fs::write(&path, "title,authors,link\nA,x,link-a\n")?;

  let error = RecordStore::open(&path).unwrap_err();
  assert!(error.is_storage());
  assert_eq!(error.to_string(), "Record store is missing required column \"summary\"");
  Ok(())
}
