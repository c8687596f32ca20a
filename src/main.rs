use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;

use message_import::ImportConfig;
use message_import::import::{ImportJob, JsonLinesStore, MessageImporter, read_records};

#[derive(Parser, Debug)]
#[command(
    name = "message-import",
    about = "Resolve display text for exported message rows and import them in batches"
)]
struct Args {
    /// NDJSON file with one message row per line.
    input: PathBuf,

    /// Where to write resolved messages (NDJSON). Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Fixed batch size instead of sizing from the number of rows.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Stop the import after this many milliseconds.
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// Disable the payload extraction cache.
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let mut config = ImportConfig::from_env();
    if let Some(batch_size) = args.batch_size.filter(|size| *size > 0) {
        config.batch_size = Some(batch_size);
    }
    if let Some(millis) = args.cancel_after_ms {
        config.cancel_after = Some(Duration::from_millis(millis));
    }
    if args.no_cache {
        config.extraction_cache = false;
    }

    let input = File::open(&args.input)?;
    let record_set = read_records(BufReader::new(input))?;

    let writer: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let importer = MessageImporter::from_config(JsonLinesStore::new(writer), &config);
    let job = Arc::new(ImportJob::new());

    // Ctrl-C and the optional timer both stop the run at the next batch boundary.
    let ctrl_c_job = Arc::clone(&job);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, stopping import");
            ctrl_c_job.cancel();
        }
    });
    if let Some(limit) = config.cancel_after {
        let timer_job = Arc::clone(&job);
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            log::warn!("import time limit of {:?} reached, stopping", limit);
            timer_job.cancel();
        });
    }

    let report = importer.import(&record_set.records, &job).await?;

    let stats = &report.stats;
    writeln!(
        io::stderr(),
        "{} {} of {} batches: {} verbatim, {} extracted, {} attachment, \
         {} reaction/system, {} unable to parse ({} input lines skipped)",
        if report.cancelled { "cancelled after" } else { "completed" },
        report.batches_processed,
        report.total_batches,
        stats.verbatim,
        stats.extracted,
        stats.attachment,
        stats.reaction_or_system,
        stats.unable_to_parse,
        record_set.skipped_lines
    )?;

    Ok(())
}
