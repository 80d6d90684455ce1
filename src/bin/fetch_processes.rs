use clap::Parser;
use fetch_pools::{
    cli::FetchArgs,
    logging,
    process::protocol::serve_worker,
    BatchReport,
    Config,
    HttpSession,
    ProcessFetcher,
};
use std::{io, process::ExitCode};
use tracing::error;


/// Download the URL list with a bounded pool of worker processes
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Run as a pool worker with this name, serving requests on stdin
    #[arg(long, hide = true)]
    worker_name: Option<String>,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    if let Some(name) = cli.worker_name {
        return run_worker(&name);
    }

    let fetcher = match ProcessFetcher::current_exe(cli.fetch.apply(Config::processes())) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!(error = %e, "cannot locate worker executable");
            return ExitCode::FAILURE;
        }
    };
    match fetcher.fetch_all() {
        Ok(report) => {
            println!("{}", report.summary());
            exit_code(&report)
        }
        Err(e) => {
            error!(error = %e, "process pool failed to start");
            ExitCode::FAILURE
        }
    }
}

fn run_worker(name: &str) -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    match serve_worker(name, HttpSession::new, stdin.lock(), stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(worker = name, error = %e, "worker stopped");
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
