use clap::Parser;
use fetch_pools::{cli::FetchArgs, logging, Config, CooperativeFetcher};
use std::process::ExitCode;
use tracing::error;


/// Download the URL list concurrently on a single thread.
/// Failed fetches are logged and never abort the batch.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    fetch: FetchArgs,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let fetcher = CooperativeFetcher::new(cli.fetch.apply(Config::cooperative()));
    match fetcher.run() {
        Ok(report) => {
            println!("{}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "cooperative fetcher failed to start");
            ExitCode::FAILURE
        }
    }
}
