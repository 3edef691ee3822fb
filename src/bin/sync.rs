extern crate dotenv;
#[macro_use]
extern crate log;
extern crate merge_sync;

use clap::{App, Arg, ArgMatches};
use dotenv::dotenv;
use error_chain::ChainedError;
use merge_sync::adapters::ndjson::{NdjsonActionWriter, NdjsonSource};
use merge_sync::app_config::{parse_value, AppConfig};
use merge_sync::errors::{ErrorKind, Result};
use merge_sync::merge::{DuplicateKeys, OrderedSource, SortedMergeDiffer};
use merge_sync::models::{compare_records, Record};
use merge_sync::reporting::metrics::{render, Metrics};
use merge_sync::reporting::stdout::print_report;
use merge_sync::reporting::SyncReport;
use merge_sync::sync::{StreamingPolicy, SyncCounts, SyncMode, Synchronizer};
use prometheus::Registry;
use std::io::{self, Write};
use std::process;
use std::time::Instant;

struct RunOptions {
    mode: SyncMode,
    duplicates: DuplicateKeys,
    policy: StreamingPolicy,
    metrics: bool,
}

/// Reconciles a sorted NDJSON feed against a sorted destination and reports the diff.
fn main() {
    dotenv().ok();
    env_logger::init();
    debug!(target: "merge_sync", "Booting");

    let matches = cli().get_matches();

    if let Err(e) = run(&matches) {
        error!(target: "merge_sync", "{}", e);
        eprintln!("{}", e.display_chain());
        process::exit(1);
    }
}

fn cli<'a, 'b>() -> App<'a, 'b> {
    App::new("merge-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Diffs two key-ordered sources in constant memory")
        .arg(
            Arg::with_name("source")
                .short("s")
                .long("source")
                .value_name("FILE")
                .help("NDJSON feed, sorted by id")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("destination")
                .short("d")
                .long("destination")
                .value_name("FILE")
                .help("NDJSON destination, sorted by id. Reads the records table when omitted")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mode")
                .short("m")
                .long("mode")
                .help("Only count, or also write every action to stdout")
                .takes_value(true)
                .possible_values(&["counts", "actions"])
                .default_value("counts"),
        )
        .arg(
            Arg::with_name("batch-size")
                .long("batch-size")
                .value_name("ROWS")
                .help("Rows per page when reading the records table")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("require-streaming")
                .long("require-streaming")
                .help("Fail instead of warn when an adapter buffers its result set"),
        )
        .arg(
            Arg::with_name("allow-duplicates")
                .long("allow-duplicates")
                .help("Merge through duplicate keys instead of failing"),
        )
        .arg(
            Arg::with_name("metrics")
                .long("metrics")
                .help("Print prometheus metrics after the run"),
        )
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(size) = matches.value_of("batch-size") {
        config.batch_size = parse_value("--batch-size", size)?;
    }
    if matches.is_present("require-streaming") {
        config.require_streaming = true;
    }

    let options = RunOptions {
        mode: match matches.value_of("mode") {
            Some("actions") => SyncMode::Actions,
            _ => SyncMode::Counts,
        },
        duplicates: if matches.is_present("allow-duplicates") {
            DuplicateKeys::Allow
        } else {
            DuplicateKeys::Reject
        },
        policy: config.streaming_policy(),
        metrics: matches.is_present("metrics"),
    };

    let source_path = matches
        .value_of("source")
        .ok_or_else(|| ErrorKind::InvalidConfig("--source is required".into()))?;
    let source = NdjsonSource::<_, Record>::open(source_path)?;

    match matches.value_of("destination") {
        Some(path) => {
            let destination = NdjsonSource::<_, Record>::open(path)?;
            sync_to_stdio(source, destination, &options)
        }
        None => sync_database(source, &config, &options),
    }
}

#[cfg(feature = "postgres")]
fn sync_database<S>(source: S, config: &AppConfig, options: &RunOptions) -> Result<()>
where
    S: OrderedSource<Row = Record>,
{
    use merge_sync::db::db_context::DbContext;
    use merge_sync::db::record_source::RecordPageSource;

    let ctx = DbContext::from_config(config)?;
    let destination = RecordPageSource::open(&ctx, config.batch_size)?;

    sync_to_stdio(source, destination, options)
}

#[cfg(not(feature = "postgres"))]
fn sync_database<S>(_: S, _: &AppConfig, _: &RunOptions) -> Result<()>
where
    S: OrderedSource<Row = Record>,
{
    Err(ErrorKind::InvalidConfig(
        "built without the postgres feature, pass --destination".into(),
    )
    .into())
}

fn sync_to_stdio<S, D>(source: S, destination: D, options: &RunOptions) -> Result<()>
where
    S: OrderedSource<Row = Record>,
    D: OrderedSource<Row = Record>,
{
    let stdout = io::stdout();
    let stderr = io::stderr();

    sync(
        source,
        destination,
        options,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
    .map(|_| ())
}

/// Runs one sync. Actions own `out` in action mode, which moves the summary to `diag`.
fn sync<S, D, O, E>(
    source: S,
    destination: D,
    options: &RunOptions,
    out: &mut O,
    diag: &mut E,
) -> Result<SyncCounts>
where
    S: OrderedSource<Row = Record>,
    D: OrderedSource<Row = Record>,
    O: Write,
    E: Write,
{
    let differ = SortedMergeDiffer::new(source, destination, Record::key, Record::key)
        .with_duplicates(options.duplicates);
    let mut synchronizer = Synchronizer::for_differ(differ, compare_records, options.policy)?;

    let start = Instant::now();
    let counts = match options.mode {
        SyncMode::Counts => synchronizer.tally()?,
        SyncMode::Actions => {
            let mut writer = NdjsonActionWriter::new(&mut *out);
            let counts = synchronizer.apply(&mut writer)?;
            writer.into_inner()?;
            counts
        }
    };

    let report = SyncReport {
        counts,
        merge: synchronizer.outcomes().stats(),
        elapsed: start.elapsed(),
    };
    info!(target: "merge_sync", "Sync complete ({})", counts);

    match options.mode {
        SyncMode::Counts => write_summary(out, &report, options)?,
        SyncMode::Actions => write_summary(diag, &report, options)?,
    }

    Ok(counts)
}

fn write_summary<W: Write>(out: &mut W, report: &SyncReport, options: &RunOptions) -> Result<()> {
    print_report(out, report)?;

    if options.metrics {
        let registry = Registry::new();
        Metrics::register(&registry)?.observe(report);
        out.write_all(render(&registry)?.as_bytes())?;
    }

    Ok(())
}
