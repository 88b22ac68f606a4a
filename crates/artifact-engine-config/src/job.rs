use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::ProviderConfig;

/// A copy of one provider tree into another.
///
/// ```json
/// {
///   "source": { "root_location": "/builds/drop" },
///   "destination": { "root_location": "/srv/artifacts", "flatten": true }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyJob {
  pub source: ProviderConfig,
  pub destination: ProviderConfig,
}

impl CopyJob {
  /// Parse a job from JSON.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Read and parse a job file.
  pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
      })?;
    Self::from_json(&content)
  }
}
