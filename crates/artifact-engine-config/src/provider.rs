use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for a filesystem provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
  /// Directory the provider is rooted at. May be relative.
  pub root_location: PathBuf,

  /// Relative path given to the root item. Defaults to the empty path.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root_item_path: Option<String>,

  /// Write files directly under the root by file name only.
  #[serde(default)]
  pub flatten: bool,
}

impl ProviderConfig {
  pub fn new(root_location: impl Into<PathBuf>) -> Self {
    Self {
      root_location: root_location.into(),
      root_item_path: None,
      flatten: false,
    }
  }
}
