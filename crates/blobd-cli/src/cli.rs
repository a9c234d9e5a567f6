use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobd",
    about = "blobd — concurrent named blob store over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the blobd server
    Serve(ServeArgs),
    /// List stored objects without starting a server
    Ls(LsArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Backing directory (overrides the config file)
    #[arg(long)]
    pub root: Option<PathBuf>,
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(long, default_value = blobd_store::config::DEFAULT_ROOT)]
    pub root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["blobd", "serve"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert!(args.bind.is_none());
            assert!(args.root.is_none());
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "blobd", "serve", "--bind", "0.0.0.0:8080", "--root", "/srv/blobs", "-c", "blobd.toml",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert_eq!(args.root, Some(PathBuf::from("/srv/blobs")));
            assert_eq!(args.config, Some(PathBuf::from("blobd.toml")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn reject_bad_bind_addr() {
        assert!(Cli::try_parse_from(["blobd", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_ls_default_root() {
        let cli = Cli::try_parse_from(["blobd", "ls"]).unwrap();
        if let Command::Ls(args) = cli.command {
            assert_eq!(args.root, PathBuf::from("files"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["blobd", "--verbose", "ls"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_logs() {
        let cli = Cli::try_parse_from(["blobd", "serve", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
