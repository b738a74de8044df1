//! Prints a uniform random sample of lines from a list file, one per line.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use simselect::config::SampleConfig;
use simselect::reservoir::{checked_count, try_sample_with_rng};
use simselect::source::LineSource;
use simselect::{Error, Result};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sample lines from an input file", long_about = None)]
struct Args {

    /// file containing the filenames of input molecules, `-` for stdin
    ligands_file: PathBuf,

    /// number of lines to sample
    #[arg(allow_negative_numbers = true)]
    count: Option<i64>,

    /// seed for a reproducible sample
    #[arg(short, long)]
    seed: Option<u64>,

    /// YAML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// keep lines that are blank after trimming
    #[arg(long)]
    keep_blank: bool,
}

fn merged_config(args: &Args) -> Result<SampleConfig> {

    let mut config = match &args.config {
        Some(path) => SampleConfig::from_file(path)?,
        None => SampleConfig::default(),
    };
    if args.count.is_some() {
        config.count = args.count;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.keep_blank {
        config.skip_blank_lines = false;
    }

    Ok(config)
}

fn run(args: Args) -> Result<()> {

    let config = merged_config(&args)?;

    let count = match config.count {
        Some(count) => checked_count(count)?,
        None => return Err(Error::InvalidArgument("no sample count given".to_string())),
    };

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let lines = LineSource::open(&args.ligands_file)?.skip_blank(config.skip_blank_lines);
    let ligands = try_sample_with_rng(lines, count, &mut rng)?;

    info!("sampled {} of requested {} from {:?}", ligands.len(), count, args.ligands_file);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for ligand in ligands.iter() {
        writeln!(out, "{}", ligand).map_err(|e| Error::io("<stdout>", e))?;
    }

    Ok(())
}

fn main() -> ExitCode {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("random-sample: {}", e);
            ExitCode::FAILURE
        }
    }
}
