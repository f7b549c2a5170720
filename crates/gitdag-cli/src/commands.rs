use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use gitdag_push::{Push, PushOptions, PushReport};
use gitdag_remote::{serve, DagRemote, RefResolver, RemoteRefs};
use gitdag_store::{BlockSource, DirDagStore, InMemoryTracker, LooseObjectStore};
use gitdag_types::ContentId;
use tokio::io::BufReader;
use tracing::debug;

use crate::cli::*;
use crate::config::GitdagConfig;

/// Prefix git leaves on URLs of the form `gitdag://<path>`.
const URL_SCHEME: &str = "gitdag://";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = GitdagConfig::load(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");
    match cli.command {
        Command::Push(args) => cmd_push(args, config, &cli.format).await,
        Command::RemoteHelper(args) => cmd_remote_helper(args, config).await,
        Command::Cid(args) => cmd_cid(args),
        Command::Show(args) => cmd_show(args).await,
    }
}

async fn cmd_push(args: PushArgs, config: GitdagConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let mut options = config.push;
    if let Some(n) = args.concurrency {
        options.concurrency = n;
    }
    let report = migrate(&args.git_dir, &args.out, &args.rev, options).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("{}", report.content_id);
            eprintln!(
                "{} {} objects migrated, {} already present",
                "✓".green().bold(),
                report.counters.processed.to_string().bold(),
                report.counters.skipped
            );
        }
    }
    Ok(())
}

/// Migrate `rev` of the repository at `git_dir` into a directory store.
async fn migrate(git_dir: &Path, out: &Path, rev: &str, options: PushOptions) -> anyhow::Result<PushReport> {
    let root = RefResolver::new(git_dir)
        .resolve(rev)
        .with_context(|| format!("resolving {rev}"))?;
    let dest = DirDagStore::open(out).with_context(|| format!("opening {}", out.display()))?;
    let push = Push::new(
        Arc::new(LooseObjectStore::open(git_dir)),
        Arc::new(InMemoryTracker::new()),
        Arc::new(dest),
        options,
    );
    Ok(push.push(root).await?)
}

async fn cmd_remote_helper(args: RemoteHelperArgs, config: GitdagConfig) -> anyhow::Result<()> {
    let git_dir = std::env::var_os("GIT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".git"));
    let dest_dir = destination_dir(&git_dir, &args.remote, args.url.as_deref());
    debug!(git_dir = %git_dir.display(), dest = %dest_dir.display(), "starting remote helper");

    let dest = Arc::new(DirDagStore::open(&dest_dir)?);
    let refs = RemoteRefs::load(dest_dir.join("refs.json"))?;
    let mut remote = DagRemote::new(
        &git_dir,
        Arc::new(LooseObjectStore::open(&git_dir)),
        Arc::new(InMemoryTracker::new()),
        dest,
        config.push,
        refs,
    );
    serve(&mut remote, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    Ok(())
}

/// Where a remote's nodes live: the URL's path if given, else a directory
/// per remote inside the git dir.
fn destination_dir(git_dir: &Path, remote: &str, url: Option<&str>) -> PathBuf {
    match url {
        Some(url) if !url.is_empty() => PathBuf::from(url.strip_prefix(URL_SCHEME).unwrap_or(url)),
        _ => git_dir.join("gitdag").join(remote),
    }
}

fn cmd_cid(args: CidArgs) -> anyhow::Result<()> {
    let cid = ContentId::from_hex_hash(&args.hash).with_context(|| format!("invalid hash {:?}", args.hash))?;
    println!("{cid}");
    Ok(())
}

async fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let cid: ContentId = args.cid.parse().with_context(|| format!("invalid content id {:?}", args.cid))?;
    let store = DirDagStore::open(&args.store)?;
    let bytes = store
        .block(&cid)
        .await?
        .with_context(|| format!("{cid} not found in {}", args.store.display()))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}
