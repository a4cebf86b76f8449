//! Module for the "summarize" command.

use abstractor::{clock::SystemClock, pipeline::Pipeline, store::RecordStore};

use super::*;

/// Options for [`Commands::Summarize`].
#[derive(Args, Clone)]
pub struct SummarizeOptions {
  /// CSV file with `title`, `authors`, `summary` and `link` columns
  #[arg(long)]
  pub csv_file: PathBuf,

  /// Skip the API availability check before the first paper
  #[arg(long)]
  pub no_preflight: bool,
}

/// Function for the [`Commands::Summarize`] in the CLI.
pub async fn summarize(config: &Config, options: SummarizeOptions) -> Result<ExitCode> {
  let SummarizeOptions { csv_file, no_preflight } = options;

  if !csv_file.exists() {
    return Err(AbstractorCliError::MissingCsv(csv_file));
  }

  let client = config.gemini_client()?;
  let mut store = RecordStore::open(&csv_file)?;
  info!("Summarizing {} with model {}", csv_file.display(), client.model());

  let report = Pipeline::new(&client, &SystemClock, config.pacer(), config.retry_policy())
    .with_preflight(!no_preflight)
    .run(&mut store)
    .await?;

  if let Some(reason) = &report.halted {
    eprintln!(
      "{} Stopped after a fatal error, {} papers left unprocessed: {}",
      style(ERROR_PREFIX).red(),
      report.unprocessed(),
      reason
    );
    return Ok(ExitCode::FAILURE);
  }

  if report.pending == 0 {
    println!("{} All papers have been summarized!", style(SUCCESS_PREFIX).green());
  } else {
    println!(
      "{} Summarized {} of {} papers in {}",
      style(SUCCESS_PREFIX).green(),
      style(report.succeeded).bold(),
      report.pending,
      csv_file.display()
    );
    if report.failed > 0 {
      println!(
        "{} {} papers were marked with an error and will not be retried",
        style(WARNING_PREFIX).yellow(),
        report.failed
      );
    }
  }
  Ok(ExitCode::SUCCESS)
}
