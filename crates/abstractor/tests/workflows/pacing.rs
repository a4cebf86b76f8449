use super::*;

const INTERVAL: Duration = Duration::from_secs(120);

fn gaps(starts: &[Instant]) -> Vec<Duration> {
  starts.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

#[tokio::test]
async fn test_call_starts_are_paced() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\nB,x,y,link-b\nC,x,y,link-c\n");
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock).with_latency(Duration::from_secs(15));

  run(&path, &client, &clock, Pacer::new(INTERVAL), RetryPolicy::default()).await?;

  assert_eq!(gaps(&client.call_starts()), vec![INTERVAL, INTERVAL]);
  // Request latency counts towards the interval.
  assert_eq!(clock.sleeps(), vec![Duration::from_secs(105), Duration::from_secs(105)]);
  Ok(())
}

#[tokio::test]
async fn test_slow_calls_are_not_delayed() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\nB,x,y,link-b\n");
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock).with_latency(Duration::from_secs(150));

  run(&path, &client, &clock, Pacer::new(INTERVAL), RetryPolicy::default()).await?;

  assert_eq!(gaps(&client.call_starts()), vec![Duration::from_secs(150)]);
  assert!(clock.sleeps().is_empty());
  Ok(())
}

#[tokio::test]
async fn test_retries_respect_the_interval() -> TestResult<()> {
  let dir = tempdir()?;
  let path = write_store(&dir, "A,x,y,link-a\nB,x,y,link-b\n");
  let clock = FakeClock::new();
  let client = ScriptedClient::new(&clock).script("A", vec![transient(), transient()]);

  let policy = RetryPolicy::new(3, Duration::from_secs(10));
  run(&path, &client, &clock, Pacer::new(INTERVAL), policy).await?;

  assert_eq!(client.titles(), vec!["A", "A", "A", "B"]);
  assert!(gaps(&client.call_starts()).iter().all(|gap| *gap >= INTERVAL));
  Ok(())
}
