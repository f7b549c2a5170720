use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gitdag",
    about = "Migrate git object graphs into a content-addressed DAG store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate one revision into a directory store
    Push(PushArgs),
    /// Speak the git remote-helper protocol on stdin/stdout
    RemoteHelper(RemoteHelperArgs),
    /// Print the content id of a source hash
    Cid(CidArgs),
    /// Write a stored node to stdout
    Show(ShowArgs),
}

#[derive(Args)]
pub struct PushArgs {
    /// Revision to migrate: a hash or a ref name
    pub rev: String,
    #[arg(long, default_value = ".git")]
    pub git_dir: PathBuf,
    /// Destination store directory
    #[arg(long)]
    pub out: PathBuf,
    /// Maximum concurrent node writes
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args)]
pub struct RemoteHelperArgs {
    /// Remote name as given by git
    pub remote: String,
    /// Remote URL; used as the destination store directory
    pub url: Option<String>,
}

#[derive(Args)]
pub struct CidArgs {
    pub hash: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub cid: String,
    /// Destination store directory
    #[arg(long)]
    pub store: PathBuf,
}
