//! Command-line runner
//!
//! ```text
//! master-worker <total_items> <max_buf_size> <num_workers> <num_masters>
//! master-worker 10000 1000 4 3
//! ```

use clap::Parser;
use log::LevelFilter;
use master_worker::{
    utils, Config, DrainOrder, Error, MasterWorker, NullObserver, PrintObserver, Result, Role,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "master-worker", version, about = "Run masters and workers over a bounded buffer")]
struct Args {
    /// Total number of items to produce
    total_items: Option<usize>,

    /// Buffer capacity
    max_buf_size: Option<usize>,

    /// Number of worker (consumer) threads
    num_workers: Option<usize>,

    /// Number of master (producer) threads
    num_masters: Option<usize>,

    /// JSON configuration file; positional arguments override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which end of the buffer workers take from (lifo or fifo)
    #[arg(long)]
    order: Option<DrainOrder>,

    /// Do not print produced/consumed lines
    #[arg(short, long)]
    quiet: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

/// Merge the config file (if any) with positional arguments. Every sizing
/// parameter must come from one of the two.
fn resolve_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Some(utils::config::load(path)?),
        None => None,
    };

    let pick = |arg: Option<usize>, from_file: Option<usize>, name: &str| {
        arg.or(from_file)
            .ok_or_else(|| Error::InvalidConfig(format!("missing argument: {}", name)))
    };

    Ok(Config {
        total_items: pick(
            args.total_items,
            base.as_ref().map(|c| c.total_items),
            "total_items",
        )?,
        max_buf_size: pick(
            args.max_buf_size,
            base.as_ref().map(|c| c.max_buf_size),
            "max_buf_size",
        )?,
        num_consumers: pick(
            args.num_workers,
            base.as_ref().map(|c| c.num_consumers),
            "num_workers",
        )?,
        num_producers: pick(
            args.num_masters,
            base.as_ref().map(|c| c.num_producers),
            "num_masters",
        )?,
        order: args
            .order
            .or(base.as_ref().map(|c| c.order))
            .unwrap_or_default(),
    })
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let master_worker = MasterWorker::new(config)?;

    let report = if args.quiet {
        master_worker.run(&NullObserver)?
    } else {
        master_worker.run(&PrintObserver)?
    };

    for task in &report.tasks {
        match task.role {
            Role::Producer => println!("master {} joined", task.id),
            Role::Consumer => println!("worker {} joined", task.id),
        }
    }

    report.verify()?;
    log::info!(
        "Consumed {} of {} items in {:?} (peak buffer {}, {} master waits, {} worker waits)",
        report.consumed(),
        report.config.total_items,
        report.elapsed,
        report.stats.peak_size,
        report.stats.producer_waits,
        report.stats.consumer_waits
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = utils::logging::init_logger(args.log_level) {
        eprintln!("failed to initialize logger: {}", e);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if matches!(e, Error::InvalidConfig(_)) {
                eprintln!(
                    "usage: master-worker <total_items> <max_buf_size> <num_workers> <num_masters>  e.g. master-worker 10000 1000 4 3"
                );
            }
            ExitCode::FAILURE
        }
    }
}
