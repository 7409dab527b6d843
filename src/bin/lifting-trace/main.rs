//! Run one instrumented encode/decode session and print its record as JSON.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lifting_flow::{AccessPattern, InputKind, Session, SessionConfig, TracingSink, Wavelet};

#[derive(Parser, Debug)]
#[command(name = "lifting-trace")]
#[command(about = "Trace the lazy evaluation of a VC-2 lifting wavelet transform")]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wavelet, by VC-2 index or name (e.g. 1 or le_gall_5_3)
    #[arg(short, long)]
    wavelet: Option<Wavelet>,

    /// Input signal (ascending, random)
    #[arg(short, long, value_parser = parse_input_kind)]
    input: Option<InputKind>,

    /// Number of input samples
    #[arg(short, long)]
    num_values: Option<usize>,

    /// Evaluation order (block, chained, lazy, lazy_two_steps)
    #[arg(short, long)]
    order: Option<AccessPattern>,

    /// Random seed for the input signal
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the record here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only print the summary, not the record
    #[arg(long)]
    summary: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_input_kind(s: &str) -> Result<InputKind, String> {
    match s {
        "ascending" => Ok(InputKind::Ascending),
        "random" => Ok(InputKind::Random),
        _ => Err(format!("unknown input kind: {s}")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = build_config(&args)?;
    tracing::info!(?config, "starting session");

    let mut session = Session::new(config);
    if args.verbose >= 3 {
        session = session.with_sink(Arc::new(TracingSink));
    }
    let record = session.run().context("session failed")?;

    if !record.is_lossless() {
        bail!(
            "decoder output {:?} does not match input {:?}",
            record.output,
            record.input
        );
    }

    if args.summary {
        println!("wavelet:      {}", record.config.wavelet);
        println!("order:        {}", record.config.order);
        println!("input:        {:?}", record.input);
        println!("computations: {}", record.trace.calls.len());
        println!("final time:   {}", record.trace.time);
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            record
                .export_to_file(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Record written to {}", path.display());
        }
        None => println!("{}", record.to_json()?),
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(wavelet) = args.wavelet {
        config = config.with_wavelet(wavelet);
    }
    if let Some(input) = args.input {
        config = config.with_input(input);
    }
    if let Some(num_values) = args.num_values {
        config = config.with_num_values(num_values);
    }
    if let Some(order) = args.order {
        config = config.with_order(order);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}
