use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by artifact providers.
#[derive(Debug, Error)]
pub enum Error {
  /// A directory could not be listed.
  #[error("unable to read directory {}: {source}", .path.display())]
  DirectoryRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A directory entry's own status could not be queried.
  #[error("unable to stat {}: {source}", .path.display())]
  Stat {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A source file could not be opened for reading.
  #[error("unable to open {}: {source}", .path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A destination directory or one of its ancestors could not be created.
  #[error("unable to create directory {}: {source}", .path.display())]
  CreateDirectory {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Content could not be transferred to its destination.
  #[error("transfer to {} failed: {source}", .path.display())]
  Transfer {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The item has no source location recorded.
  #[error("item '{path}' has no source location")]
  MissingSource { path: String },

  /// A file item was submitted for writing without content.
  #[error("file item '{path}' has no content stream")]
  MissingContent { path: String },

  /// The item's path would resolve outside the provider root.
  #[error("item path '{path}' escapes the provider root")]
  UnsafePath { path: String },
}
