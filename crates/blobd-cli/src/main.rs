use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn init_logging(verbose: bool, format: cli::LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        cli::LogFormat::Text => builder.init(),
        cli::LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.log_format);
    commands::run_command(cli).await
}
