use clap::Parser;
use fetch_pools::{cli::FetchArgs, logging, BatchReport, Config, ThreadedFetcher};
use std::process::ExitCode;
use tracing::error;


/// Download the URL list with a bounded pool of OS threads
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    fetch: FetchArgs,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let fetcher = ThreadedFetcher::new(cli.fetch.apply(Config::threaded()));
    match fetcher.run() {
        Ok(report) => {
            println!("{}", report.summary());
            exit_code(&report)
        }
        Err(e) => {
            error!(error = %e, "thread pool failed to start");
            ExitCode::FAILURE
        }
    }
}

fn exit_code(report: &BatchReport) -> ExitCode {
    for outcome in report.failures() {
        if let Err(e) = &outcome.result {
            error!(url = %outcome.url, worker = %outcome.worker, error = %e, "fetch failed");
        }
    }
    if report.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
