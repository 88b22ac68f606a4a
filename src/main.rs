use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use artifact_engine_config::{CopyJob, ProviderConfig};
use artifact_engine_provider::{
  ArtifactItem, ArtifactProvider, FilesystemProvider, NoopAccounting, SizeLedger,
};

/// Artifact Engine - enumerate and copy artifact trees on local storage
#[derive(Parser)]
#[command(name = "artifact-engine")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the items under a directory
  List {
    /// Directory to list
    root: PathBuf,

    /// Relative path given to the root item
    #[arg(long)]
    root_item_path: Option<String>,

    /// Descend into folders
    #[arg(long, short)]
    recursive: bool,

    /// Print items as a JSON array
    #[arg(long)]
    json: bool,
  },

  /// Copy a directory tree into another directory
  Copy {
    /// Source directory
    #[arg(required_unless_present = "job")]
    from: Option<PathBuf>,

    /// Destination directory
    #[arg(required_unless_present = "job")]
    to: Option<PathBuf>,

    /// Write every file directly under the destination
    #[arg(long)]
    flatten: bool,

    /// Path to a copy job file (JSON) instead of FROM and TO
    #[arg(long, conflicts_with_all = ["from", "to", "flatten"])]
    job: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing();

  match cli.command {
    Some(Commands::List {
      root,
      root_item_path,
      recursive,
      json,
    }) => {
      let mut config = ProviderConfig::new(root);
      config.root_item_path = root_item_path;
      run_list(config, recursive, json)?;
    }
    Some(Commands::Copy {
      from,
      to,
      flatten,
      job,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      let job = match (job, from, to) {
        (Some(job_file), _, _) => rt
          .block_on(CopyJob::load(&job_file))
          .with_context(|| format!("failed to load job file: {}", job_file.display()))?,
        (None, Some(from), Some(to)) => CopyJob {
          source: ProviderConfig::new(from),
          destination: ProviderConfig {
            flatten,
            ..ProviderConfig::new(to)
          },
        },
        _ => anyhow::bail!("either FROM and TO or --job is required"),
      };
      rt.block_on(async { run_copy(job).await })?;
    }
    None => {
      println!("artifact-engine - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn run_list(config: ProviderConfig, recursive: bool, json: bool) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_list_async(config, recursive, json).await })
}

async fn run_list_async(config: ProviderConfig, recursive: bool, json: bool) -> Result<()> {
  let provider = FilesystemProvider::from_config(&config, Arc::new(NoopAccounting));

  let mut items = Vec::new();
  for root in provider.get_root_items().await? {
    let mut pending = provider
      .get_artifact_items(&root)
      .await
      .with_context(|| format!("failed to list {}", config.root_location.display()))?;

    while let Some(item) = pending.pop() {
      let descend = recursive
        && item.is_folder()
        && !is_nested_symlink(provider.root_location(), &item).await;
      if descend {
        pending.extend(
          provider
            .get_artifact_items(&item)
            .await
            .with_context(|| format!("failed to list '{}'", item.path))?,
        );
      }
      items.push(item);
    }
  }
  items.sort_by(|a, b| a.path.cmp(&b.path));
  provider.dispose();

  if json {
    println!("{}", serde_json::to_string_pretty(&items)?);
  } else {
    for item in &items {
      print_item(item);
    }
  }

  Ok(())
}

/// Links below the root are enumerated as folders but cannot be descended into.
async fn is_nested_symlink(root: &Path, item: &ArtifactItem) -> bool {
  let Some(path) = item.metadata.source_path.as_deref() else {
    return false;
  };
  if path == root {
    return false;
  }
  tokio::fs::symlink_metadata(path)
    .await
    .is_ok_and(|stat| stat.file_type().is_symlink())
}

fn print_item(item: &ArtifactItem) {
  let modified = item
    .last_modified
    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    .unwrap_or_default();

  if item.is_folder() {
    println!("{:>12}  {:19}  {}/", "-", modified, item.path);
  } else {
    println!("{:>12}  {:19}  {}", item.file_length, modified, item.path);
  }
}

async fn run_copy(job: CopyJob) -> Result<()> {
  let ledger = Arc::new(SizeLedger::new());
  let source = FilesystemProvider::from_config(&job.source, ledger.clone());
  let destination = FilesystemProvider::from_config(&job.destination, ledger.clone());

  info!(
    source = %job.source.root_location.display(),
    destination = %job.destination.root_location.display(),
    "copy started"
  );

  let mut files = 0usize;
  let mut folders = 0usize;
  let mut pending = source.get_root_items().await?;

  while let Some(item) = pending.pop() {
    if is_nested_symlink(source.root_location(), &item).await {
      warn!(path = %item.path, "skipping symbolic link");
    } else if item.is_folder() {
      pending.extend(
        source
          .get_artifact_items(&item)
          .await
          .with_context(|| format!("failed to list '{}'", item.path))?,
      );
      destination
        .put_artifact_item(item, None)
        .await
        .context("failed to create folder")?;
      folders += 1;
    } else {
      let content = source
        .get_artifact_item(&item)
        .await
        .with_context(|| format!("failed to open '{}'", item.path))?;
      let path = item.path.clone();
      destination
        .put_artifact_item(item, Some(content))
        .await
        .with_context(|| format!("failed to copy '{}'", path))?;
      files += 1;
    }
  }

  source.dispose();
  destination.dispose();

  let totals = ledger.snapshot();
  eprintln!("Folders created: {}", folders);
  eprintln!("Files copied: {}", files);
  eprintln!("Bytes read: {}", totals.bytes_downloaded());
  eprintln!("Bytes written: {}", totals.bytes_uploaded());

  Ok(())
}
