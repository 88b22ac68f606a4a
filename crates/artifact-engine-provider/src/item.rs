use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an item carries content or only structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
  File,
  Folder,
}

/// Locations recorded on an item by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
  /// Absolute location to read the item from.
  #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
  pub source_path: Option<PathBuf>,
  /// Absolute location the item was written to. Set once the write is durable.
  #[serde(rename = "destinationUrl", skip_serializing_if = "Option::is_none")]
  pub destination_path: Option<PathBuf>,
}

/// A file or folder in an artifact tree.
///
/// The same type describes enumeration results (where the item came from)
/// and transfer requests (where it should go).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactItem {
  /// Path relative to the provider root, `/`-separated. Empty for the root.
  pub path: String,
  pub item_type: ItemType,
  #[serde(default)]
  pub file_length: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_modified: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
  #[serde(default)]
  pub metadata: ItemMetadata,
  /// Write a file directly under the destination root with this name
  /// (its final segment) instead of its relative path.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_name_override: Option<String>,
}

impl ArtifactItem {
  /// A file item with no metadata.
  pub fn file(path: impl Into<String>) -> Self {
    Self::new(path, ItemType::File)
  }

  /// A folder item with no metadata.
  pub fn folder(path: impl Into<String>) -> Self {
    Self::new(path, ItemType::Folder)
  }

  fn new(path: impl Into<String>, item_type: ItemType) -> Self {
    Self {
      path: path.into(),
      item_type,
      file_length: 0,
      last_modified: None,
      content_type: None,
      metadata: ItemMetadata::default(),
      file_name_override: None,
    }
  }

  /// Set the source location.
  pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
    self.metadata.source_path = Some(source_path.into());
    self
  }

  /// Set a flattening file name override.
  pub fn with_file_name_override(mut self, name: impl Into<String>) -> Self {
    self.file_name_override = Some(name.into());
    self
  }

  pub fn is_file(&self) -> bool {
    self.item_type == ItemType::File
  }

  pub fn is_folder(&self) -> bool {
    self.item_type == ItemType::Folder
  }
}

/// Join a relative item path with a child's base name.
pub(crate) fn join_item_path(parent: &str, name: &str) -> String {
  if parent.is_empty() {
    name.to_string()
  } else {
    format!("{}/{}", parent.trim_end_matches('/'), name)
  }
}

/// Final non-empty `/`-separated segment of a path, if any.
pub(crate) fn final_segment(path: &str) -> Option<&str> {
  path.rsplit('/').find(|segment| !segment.is_empty())
}
