//! Scores a corpus of fingerprint files against a query and prints the closest ones.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kdam::{tqdm, BarExt};
use log::{debug, info};

use simselect::config::SearchConfig;
use simselect::fingerprint::{FpType, Metric};
use simselect::report::{OutputFormat, Report};
use simselect::reservoir::checked_count;
use simselect::scoring::ObjectLoader;
use simselect::search::{find_similar, SearchOptions};
use simselect::source::{glob_identifiers, LineSource};
use simselect::{Error, Result, TopKTracker};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find similar molecules", long_about = None)]
struct Args {

    /// comparison molecule fingerprint
    molecule: PathBuf,

    /// file containing the filenames of input molecules (a glob pattern with --glob)
    ligands_file: String,

    /// number of similar molecules to find
    #[arg(allow_negative_numbers = true)]
    top_count: Option<i64>,

    /// output file with log information
    #[arg(short, long)]
    logfile: Option<PathBuf>,

    /// fingerprint type
    #[arg(short = 't', long, value_enum)]
    fp_type: Option<FpType>,

    /// similarity metric: tanimoto, dice, tversky or "tversky <alpha> <beta>"
    #[arg(short, long)]
    metric: Option<Metric>,

    /// treat ligands_file as a glob pattern over fingerprint files
    #[arg(long)]
    glob: bool,

    /// scoring threads
    #[arg(long)]
    threads: Option<usize>,

    /// identifiers read ahead per batch when scoring on several threads
    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// progress bar on stderr
    #[arg(long)]
    progress: bool,

    /// YAML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(logfile: &Option<PathBuf>) -> Result<()> {

    let mut builder = match logfile {
        Some(path) => {
            let file = File::create(path).map_err(|e| Error::io(path, e))?;
            let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.init();

    Ok(())
}

fn merged_config(args: &Args) -> Result<SearchConfig> {

    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };

    if args.top_count.is_some() {
        config.top_count = args.top_count;
    }
    if let Some(fp_type) = args.fp_type {
        config.fp_type = fp_type;
    }
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;

    Ok(config)
}

fn run(args: Args) -> Result<()> {

    let config = merged_config(&args)?;

    let top_count = match config.top_count {
        Some(n) => checked_count(n)?,
        None => return Err(Error::InvalidArgument("no top count given".to_string())),
    };

    let ctx = config.context();
    let loader = ctx.loader();
    let scorer = ctx.scorer();

    let query_id = args.molecule.to_string_lossy().into_owned();
    let query = loader.load(&query_id)?;
    ctx.check_query(&query)?;

    info!("Reading {}:", args.ligands_file);

    let ids: Box<dyn Iterator<Item = Result<String>>> = match args.glob {
        true => Box::new(glob_identifiers(&args.ligands_file)?),
        false => Box::new(LineSource::open(&args.ligands_file)?.skip_blank(config.skip_blank_lines)),
    };

    let mut bar = match args.progress {
        true => Some(tqdm!(desc = "scoring", unit = " mol")),
        false => None,
    };

    let mut tracker = TopKTracker::new(top_count);
    let options = SearchOptions::from(&config);

    let stats = find_similar(&query, ids, &loader, &scorer, &mut tracker, &options, |_| {
        if let Some(bar) = bar.as_mut() {
            if let Err(e) = bar.update(1) {
                debug!("progress bar update failed: {}", e);
            }
        }
    })?;

    if let Some(bar) = bar.as_mut() {
        if let Err(e) = bar.refresh() {
            debug!("progress bar refresh failed: {}", e);
        }
        eprintln!();
    }

    let hits = tracker.into_top_k();

    info!("Found {} molecules.", stats.seen);
    info!("Top similarities:");
    for hit in hits.iter() {
        info!("Molecule '{}' similarity = {}", hit.tag, hit.score);
    }

    let report = Report::new(&query_id, &ctx, stats, &hits);
    let rendered = report.render(args.format)?;

    io::stdout()
        .lock()
        .write_all(rendered.as_bytes())
        .map_err(|e| Error::io("<stdout>", e))
}

fn main() -> ExitCode {

    let args = Args::parse();

    if let Err(e) = init_logging(&args.logfile) {
        eprintln!("find-similar: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("find-similar: {}", e);
            ExitCode::FAILURE
        }
    }
}
