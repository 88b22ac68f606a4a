use std::path::{Path, PathBuf};
use std::sync::Arc;

use artifact_engine_config::ProviderConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::accounting::{NoopAccounting, SizeAccounting};
use crate::item::{ArtifactItem, ItemMetadata, ItemType, final_segment, join_item_path};
use crate::{ArtifactProvider, ByteStream, Error};

/// Filesystem-based artifact provider.
///
/// Items are enumerated from, and written to, `{root_location}/{item.path}`.
/// Symbolic links are listed but never followed.
pub struct FilesystemProvider<A: SizeAccounting = NoopAccounting> {
  root_location: PathBuf,
  root_item_path: String,
  flatten: bool,
  accounting: Arc<A>,
}

impl FilesystemProvider<NoopAccounting> {
  /// Create a provider rooted at `root_location` that discards byte counts.
  pub fn new(root_location: impl Into<PathBuf>) -> Self {
    Self::with_accounting(root_location, Arc::new(NoopAccounting))
  }
}

impl<A: SizeAccounting + 'static> FilesystemProvider<A> {
  /// Create a provider that reports byte counts to `accounting`.
  pub fn with_accounting(root_location: impl Into<PathBuf>, accounting: Arc<A>) -> Self {
    Self {
      root_location: root_location.into(),
      root_item_path: String::new(),
      flatten: false,
      accounting,
    }
  }

  /// Create a provider from its configuration.
  pub fn from_config(config: &ProviderConfig, accounting: Arc<A>) -> Self {
    Self::with_accounting(&config.root_location, accounting)
      .with_root_item_path(config.root_item_path.clone().unwrap_or_default())
      .with_flatten(config.flatten)
  }

  /// Relative path given to the root item.
  pub fn with_root_item_path(mut self, root_item_path: impl Into<String>) -> Self {
    self.root_item_path = root_item_path.into();
    self
  }

  /// Write every file directly under the root, keeping only its file name.
  pub fn with_flatten(mut self, flatten: bool) -> Self {
    self.flatten = flatten;
    self
  }

  pub fn root_location(&self) -> &Path {
    &self.root_location
  }

  pub fn accounting(&self) -> &Arc<A> {
    &self.accounting
  }

  /// Where `item` lands when written. Never outside the root.
  fn destination_path(&self, item: &ArtifactItem) -> Result<PathBuf, Error> {
    let unsafe_path = || Error::UnsafePath {
      path: item.path.clone(),
    };

    if item.is_file() {
      let file_name = match &item.file_name_override {
        Some(name) => final_segment(name),
        None if self.flatten => final_segment(&item.path),
        None => None,
      };
      if let Some(name) = file_name {
        if name == ".." || name == "." {
          return Err(unsafe_path());
        }
        return Ok(self.root_location.join(name));
      }
    }

    let mut destination = self.root_location.clone();
    for segment in item.path.split('/') {
      match segment {
        "" | "." => {}
        ".." => return Err(unsafe_path()),
        segment => destination.push(segment),
      }
    }
    Ok(destination)
  }

  /// List one directory level. Any failure discards the whole listing.
  async fn read_items(&self, dir: &Path, parent_path: &str) -> Result<Vec<ArtifactItem>, Error> {
    let read_error = |source: std::io::Error| {
      warn!(path = %dir.display(), error = %source, "unable to read directory");
      Error::DirectoryRead {
        path: dir.to_path_buf(),
        source,
      }
    };

    // Links are listed as folders but never traversed. The configured root
    // itself may be a link.
    if dir != self.root_location.as_path() && is_symlink(dir).await {
      return Err(read_error(std::io::Error::other(
        "symbolic links are not traversed",
      )));
    }

    let mut entries = fs::read_dir(dir).await.map_err(read_error)?;
    let mut items = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
      let name = entry.file_name();
      let entry_path = dir.join(&name);

      // lstat: never follow symbolic links
      let stat = fs::symlink_metadata(&entry_path)
        .await
        .map_err(|source| Error::Stat {
          path: entry_path.clone(),
          source,
        })?;

      let item_type = if stat.file_type().is_file() {
        ItemType::File
      } else {
        ItemType::Folder
      };

      items.push(ArtifactItem {
        path: join_item_path(parent_path, &name.to_string_lossy()),
        item_type,
        file_length: stat.len(),
        last_modified: stat.modified().ok().map(DateTime::<Utc>::from),
        content_type: None,
        metadata: ItemMetadata {
          source_path: Some(entry_path),
          destination_path: None,
        },
        file_name_override: None,
      });
    }

    Ok(items)
  }

  async fn write_folder(&self, item: ArtifactItem) -> Result<ArtifactItem, Error> {
    let destination = self.destination_path(&item)?;
    fs::create_dir_all(&destination)
      .await
      .map_err(|source| Error::CreateDirectory {
        path: destination.clone(),
        source,
      })?;

    debug!(path = %item.path, destination = %destination.display(), "folder created");
    Ok(item)
  }

  async fn write_file(
    &self,
    mut item: ArtifactItem,
    mut content: ByteStream,
  ) -> Result<ArtifactItem, Error> {
    let destination = self.destination_path(&item)?;

    // Parent directories must exist before the file can be opened
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)
        .await
        .map_err(|source| Error::CreateDirectory {
          path: parent.to_path_buf(),
          source,
        })?;
    }

    info!(path = %item.path, destination = %destination.display(), "downloading to");

    let transfer_error = |source: std::io::Error| Error::Transfer {
      path: destination.clone(),
      source,
    };

    let mut file = File::create(&destination).await.map_err(transfer_error)?;
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = content.next().await {
      let chunk = chunk.map_err(transfer_error)?;
      file.write_all(&chunk).await.map_err(transfer_error)?;
      bytes_written += chunk.len() as u64;
    }

    debug!(path = %item.path, bytes = bytes_written, "content received");

    file.flush().await.map_err(transfer_error)?;
    file.sync_all().await.map_err(transfer_error)?;

    // The item is only updated once the write is durable
    item.file_length = bytes_written;
    item.last_modified = None;
    item.metadata.destination_path = Some(destination);
    self.accounting.record_upload(&item, bytes_written);

    info!(path = %item.path, bytes = bytes_written, "downloaded");
    Ok(item)
  }
}

async fn is_symlink(path: &Path) -> bool {
  fs::symlink_metadata(path)
    .await
    .is_ok_and(|stat| stat.file_type().is_symlink())
}

/// State threaded through an accounted download stream.
struct ReadState<A> {
  reader: ReaderStream<File>,
  item: ArtifactItem,
  accounting: Arc<A>,
  bytes_read: u64,
}

/// Stream the file's content, reporting the total once the end is reached.
///
/// A read error is yielded to the consumer and ends the stream without a
/// report.
fn accounted_stream<A: SizeAccounting + 'static>(state: ReadState<A>) -> ByteStream {
  let stream = futures::stream::unfold(Some(state), |state| async move {
    let Some(mut state) = state else {
      return None;
    };
    match state.reader.next().await {
      Some(Ok(chunk)) => {
        state.bytes_read += chunk.len() as u64;
        Some((Ok(chunk), Some(state)))
      }
      Some(Err(e)) => {
        debug!(path = %state.item.path, error = %e, "download failed");
        Some((Err(e), None))
      }
      None => {
        state
          .accounting
          .record_download(&state.item, state.bytes_read);
        debug!(path = %state.item.path, bytes = state.bytes_read, "download finished");
        None
      }
    }
  });
  Box::pin(stream)
}

#[async_trait]
impl<A: SizeAccounting + 'static> ArtifactProvider for FilesystemProvider<A> {
  async fn get_root_items(&self) -> Result<Vec<ArtifactItem>, Error> {
    let root = ArtifactItem::folder(self.root_item_path.clone())
      .with_source_path(self.root_location.clone());
    Ok(vec![root])
  }

  async fn get_artifact_items(&self, item: &ArtifactItem) -> Result<Vec<ArtifactItem>, Error> {
    let dir = item
      .metadata
      .source_path
      .as_deref()
      .ok_or_else(|| Error::MissingSource {
        path: item.path.clone(),
      })?;
    self.read_items(dir, &item.path).await
  }

  async fn get_artifact_item(&self, item: &ArtifactItem) -> Result<ByteStream, Error> {
    let source_path = item
      .metadata
      .source_path
      .as_deref()
      .ok_or_else(|| Error::MissingSource {
        path: item.path.clone(),
      })?;

    // Only regular files are content; links are never dereferenced
    if !item.is_file() || is_symlink(source_path).await {
      return Err(Error::Open {
        path: source_path.to_path_buf(),
        source: std::io::Error::new(
          std::io::ErrorKind::InvalidInput,
          "only regular file items can be read",
        ),
      });
    }

    info!(path = %item.path, source = %source_path.display(), "downloading");

    let file = File::open(source_path)
      .await
      .map_err(|source| Error::Open {
        path: source_path.to_path_buf(),
        source,
      })?;

    Ok(accounted_stream(ReadState {
      reader: ReaderStream::new(file),
      item: item.clone(),
      accounting: Arc::clone(&self.accounting),
      bytes_read: 0,
    }))
  }

  async fn put_artifact_item(
    &self,
    item: ArtifactItem,
    content: Option<ByteStream>,
  ) -> Result<ArtifactItem, Error> {
    match item.item_type {
      ItemType::Folder => self.write_folder(item).await,
      ItemType::File => {
        let content = content.ok_or_else(|| Error::MissingContent {
          path: item.path.clone(),
        })?;
        self.write_file(item, content).await
      }
    }
  }
}
