use clap::Parser;
use flowlens::{AnalysisConfig, FlowLens, KeyMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Characterize captured traffic: per-flow payload entropy and TLS
/// cipher-suite security classification.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Capture file to analyze.
    #[arg(short, long)]
    pcap: PathBuf,

    /// Rényi entropy order (must be positive).
    #[arg(long, default_value_t = flowlens::DEFAULT_RENYI_ORDER)]
    alpha: f64,

    /// Tsallis entropy order.
    #[arg(long, default_value_t = flowlens::DEFAULT_TSALLIS_ORDER)]
    q: f64,

    /// Merge both directions of a conversation into one flow.
    #[arg(long)]
    canonical: bool,

    /// Aggregation worker shards.
    #[arg(long, default_value_t = 1)]
    shards: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AnalysisConfig {
        key_mode: if args.canonical {
            KeyMode::Canonical
        } else {
            KeyMode::Directional
        },
        renyi_order: args.alpha,
        tsallis_order: args.q,
        shards: args.shards,
    };

    match FlowLens::new(config).analyze_pcap(&args.pcap) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to analyze {}: {e}", args.pcap.display());
            ExitCode::FAILURE
        }
    }
}
