use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Referral store service
    #[arg(long, env = "REFR_STORE_URL", default_value = "http://localhost:1111")]
    store_url: String,

    /// Where this machine keeps its votes
    #[arg(long, env = "REFR_DATA_DIR", default_value = ".refr")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: cli::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    match cli::run(&args.store_url, &args.data_dir, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}
