pub mod args;
pub mod connect;
mod hex;
pub mod server;
mod util;

use std::process::ExitCode;

use args::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log)) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("Error: invalid log filter: {err}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let result = match cli.host.as_str() {
        "server" => server::run(cli).await,
        _ => connect::run(cli).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
