// Workpool demo runner
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json output formats for scripting.
// Design Decision: Logs go to stderr so JSON on stdout stays machine-readable.

mod commands;
mod output;
mod workloads;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "workpool")]
#[command(about = "Workpool - run worker pool and concurrency pattern examples")]
#[command(version)]
pub struct Cli {
    /// Number of workers (each example has its own default)
    #[arg(long, short, env = "WORKPOOL_WORKERS", global = true)]
    pub workers: Option<usize>,

    /// Task queue capacity (defaults to twice the worker count)
    #[arg(long, env = "WORKPOOL_QUEUE_CAPACITY", global = true)]
    pub queue_capacity: Option<usize>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json"], global = true)]
    pub output: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// CPU-intensive work with worker pool (factorials)
    Cpu {
        /// Number of jobs to submit
        #[arg(long, default_value = "10")]
        jobs: u32,
    },

    /// I/O-intensive work with worker pool (temp files)
    Io {
        /// Number of jobs to submit
        #[arg(long, default_value = "8")]
        jobs: u32,
    },

    /// Simulated web requests with worker pool
    Web,

    /// Map-reduce pattern example
    Mapreduce,

    /// Producer-consumer pattern example
    Prodcons,

    /// Fan-out fan-in pattern example
    Fanout,

    /// Run all examples
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workpool=warn,workpool_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output_format = output::OutputFormat::from_str(&cli.output);
    let settings = commands::PoolSettings {
        workers: cli.workers,
        queue_capacity: cli.queue_capacity,
    };

    let cpus = workpool::pool::default_workers();
    if output_format.is_text() {
        println!("Running on {} CPU cores", cpus);
    }
    tracing::info!(cpus, "workpool demo starting");

    match cli.command {
        Commands::Cpu { jobs } => commands::pool::cpu(&settings, output_format, jobs).await,
        Commands::Io { jobs } => commands::pool::io(&settings, output_format, jobs).await,
        Commands::Web => commands::pool::web(&settings, output_format).await,
        Commands::Mapreduce => commands::patterns::mapreduce(&settings, output_format).await,
        Commands::Prodcons => commands::patterns::prodcons(output_format).await,
        Commands::Fanout => commands::patterns::fanout(&settings, output_format).await,
        Commands::All => commands::all(&settings, output_format).await,
    }
}
