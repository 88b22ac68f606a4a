//! Byte-count reporting for completed transfers.
//!
//! Providers report how many bytes each item moved once a transfer has
//! completed. What happens with those counts (summing, persisting, progress
//! display) is up to the [`SizeAccounting`] implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::item::ArtifactItem;

/// Receives byte counts for completed transfers.
pub trait SizeAccounting: Send + Sync {
  /// Called once after a download stream for `item` has been fully read.
  fn record_download(&self, item: &ArtifactItem, bytes: u64);

  /// Called once after `item` has been durably written.
  fn record_upload(&self, item: &ArtifactItem, bytes: u64);
}

/// Accounting that discards every count.
#[derive(Debug, Clone, Default)]
pub struct NoopAccounting;

impl SizeAccounting for NoopAccounting {
  fn record_download(&self, _item: &ArtifactItem, _bytes: u64) {}

  fn record_upload(&self, _item: &ArtifactItem, _bytes: u64) {}
}

/// A single byte-count report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeEvent {
  Downloaded { path: String, bytes: u64 },
  Uploaded { path: String, bytes: u64 },
}

/// Accounting that forwards reports to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelAccounting {
  sender: mpsc::UnboundedSender<SizeEvent>,
}

impl ChannelAccounting {
  pub fn new(sender: mpsc::UnboundedSender<SizeEvent>) -> Self {
    Self { sender }
  }
}

impl SizeAccounting for ChannelAccounting {
  fn record_download(&self, item: &ArtifactItem, bytes: u64) {
    // Receiver may have been dropped
    let _ = self.sender.send(SizeEvent::Downloaded {
      path: item.path.clone(),
      bytes,
    });
  }

  fn record_upload(&self, item: &ArtifactItem, bytes: u64) {
    let _ = self.sender.send(SizeEvent::Uploaded {
      path: item.path.clone(),
      bytes,
    });
  }
}

/// Per-path byte totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeTotals {
  pub downloaded: HashMap<String, u64>,
  pub uploaded: HashMap<String, u64>,
}

impl SizeTotals {
  pub fn bytes_downloaded(&self) -> u64 {
    self.downloaded.values().sum()
  }

  pub fn bytes_uploaded(&self) -> u64 {
    self.uploaded.values().sum()
  }
}

/// In-memory accounting keyed by item path.
///
/// A later report for the same path replaces the earlier one, so re-running
/// a transfer does not double count.
#[derive(Debug, Default)]
pub struct SizeLedger {
  totals: Mutex<SizeTotals>,
}

impl SizeLedger {
  pub fn new() -> Self {
    Self::default()
  }

  /// Copy of the current totals.
  pub fn snapshot(&self) -> SizeTotals {
    self
      .totals
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  fn with_totals(&self, f: impl FnOnce(&mut SizeTotals)) {
    let mut totals = self
      .totals
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut totals);
  }
}

impl SizeAccounting for SizeLedger {
  fn record_download(&self, item: &ArtifactItem, bytes: u64) {
    self.with_totals(|t| {
      t.downloaded.insert(item.path.clone(), bytes);
    });
  }

  fn record_upload(&self, item: &ArtifactItem, bytes: u64) {
    self.with_totals(|t| {
      t.uploaded.insert(item.path.clone(), bytes);
    });
  }
}
