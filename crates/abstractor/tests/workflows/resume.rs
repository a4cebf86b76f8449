use super::*;

#[tokio::test]
async fn test_second_run_makes_no_calls() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\nB,x,y,link-b\n");
  let clock = FakeClock::new();

  let first = ScriptedClient::new(&clock).script("B", vec![blocked()]);
  run(&path, &first, &clock, Pacer::default(), RetryPolicy::default()).await?;
  let checkpoint = std::fs::read(&path)?;

  let second = ScriptedClient::new(&clock);
  let report = run(&path, &second, &clock, Pacer::default(), RetryPolicy::default()).await?;

  assert_eq!(report, RunReport::default());
  assert!(second.titles().is_empty());
  assert_eq!(std::fs::read(&path)?, checkpoint);
  Ok(())
}

#[tokio::test]
async fn test_run_resumes_after_halt() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\nB,x,y,link-b\nC,x,y,link-c\n");
  let clock = FakeClock::new();

  let first = ScriptedClient::new(&clock).script("B", vec![quota(), quota(), quota()]);
  let report = run(&path, &first, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert!(report.halted.is_some());

  // The halting row keeps its error annotation, so only C is left.
  let second = ScriptedClient::new(&clock);
  let report = run(&path, &second, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert_eq!(report, RunReport { pending: 1, succeeded: 1, failed: 0, halted: None });
  assert_eq!(second.titles(), vec!["C"]);

  let store = RecordStore::open(&path)?;
  assert_eq!(store.cell("link-a", AI_ABSTRACT), Some("S-A"));
  assert!(store.cell("link-b", AI_ABSTRACT).is_some_and(|value| value.starts_with("Error: ")));
  assert_eq!(store.cell("link-c", AI_ABSTRACT), Some("S-C"));
  Ok(())
}

#[tokio::test]
async fn test_existing_annotations_are_left_alone() -> TestResult<()> {
  let dir = tempdir()?;
  let path = dir.path().join("papers.csv");
  std::fs::write(
    &path,
    "title,authors,summary,link,ai_abstract,ai_summary,notes\nA,x,y,link-a,Done \
     before,,keep\nB,x,y,link-b,,,keep too\n",
  )?;
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock);

  let report = run(&path, &client, &clock, Pacer::default(), RetryPolicy::default()).await?;
  assert_eq!(report.pending, 1);
  assert_eq!(client.titles(), vec!["B"]);

  let store = RecordStore::open(&path)?;
  assert_eq!(store.cell("link-a", AI_ABSTRACT), Some("Done before"));
  assert_eq!(store.cell("link-b", AI_ABSTRACT), Some("S-B"));
  assert_eq!(store.cell("link-b", "notes"), Some("keep too"));
  Ok(())
}
