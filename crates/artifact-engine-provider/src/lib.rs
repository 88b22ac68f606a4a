//! Artifact Engine Provider
//!
//! This crate provides the artifact provider trait and its filesystem
//! implementation. A provider exposes a tree of [`ArtifactItem`]s rooted at
//! some location and moves item content in and out as byte streams.
//!
//! The [`ArtifactProvider`] trait is the contract consumed by whatever decides
//! which items to transfer. Implementations handle one backend each
//! (filesystem here); ordering, recursion and parallelism across items belong
//! to the caller.
//!
//! Byte counts for completed transfers are reported to a [`SizeAccounting`]
//! collaborator.

mod accounting;
mod error;
mod fs;
mod item;

pub use accounting::{
  ChannelAccounting, NoopAccounting, SizeAccounting, SizeEvent, SizeLedger, SizeTotals,
};
pub use error::Error;
pub use fs::FilesystemProvider;
pub use item::{ArtifactItem, ItemMetadata, ItemType};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of item content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Artifact provider trait.
///
/// The provider does not coordinate calls against the same item: callers must
/// not overlap a read and a write of one item, or two writes to one
/// destination.
#[async_trait]
pub trait ArtifactProvider: Send + Sync {
  /// Items representing the provider root.
  async fn get_root_items(&self) -> Result<Vec<ArtifactItem>, Error>;

  /// Immediate children of a folder item.
  async fn get_artifact_items(&self, item: &ArtifactItem) -> Result<Vec<ArtifactItem>, Error>;

  /// Content of a file item.
  ///
  /// The download is accounted for when the returned stream is read to the
  /// end.
  async fn get_artifact_item(&self, item: &ArtifactItem) -> Result<ByteStream, Error>;

  /// Materialize an item under the provider root.
  ///
  /// Folder items take no content. File items require `content` and are
  /// returned with their destination recorded once the write is complete.
  async fn put_artifact_item(
    &self,
    item: ArtifactItem,
    content: Option<ByteStream>,
  ) -> Result<ArtifactItem, Error>;

  /// Release any held resources.
  fn dispose(&self) {}
}
