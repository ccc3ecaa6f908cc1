//! Activate handler: drop stores left over from previous versions.

use color_eyre::Result;
use tracing::{info, warn};

use super::host::HostController;
use crate::cache::NamedStores;
use crate::config::WorkerConfig;

/// Outcome of an activation sweep.
#[derive(Debug, Default)]
pub struct ActivationReport {
  pub deleted: Vec<String>,
  pub failed: Vec<String>,
}

/// Delete every store whose name is not one of the two current-version
/// names, then take over open pages. One failed deletion does not stop the
/// sweep: every stale store is attempted, failures are logged and reported,
/// and activation still claims its pages.
pub async fn activate<S, H>(config: &WorkerConfig, stores: &S, host: &H) -> Result<ActivationReport>
where
  S: NamedStores,
  H: HostController,
{
  let keep = config.current_store_names();
  let mut report = ActivationReport::default();

  for name in stores.store_names()? {
    if keep.contains(&name) {
      continue;
    }
    match stores.delete(&name) {
      Ok(_) => {
        info!("deleted stale store {}", name);
        report.deleted.push(name);
      }
      Err(e) => {
        warn!("failed to delete stale store {}: {:#}", name, e);
        report.failed.push(name);
      }
    }
  }

  host.claim_clients().await?;
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStores, StoredEntry};
  use crate::net::{FetchRequest, RequestKey};
  use crate::testutil::RecordingHost;
  use color_eyre::eyre::eyre;

  #[tokio::test]
  async fn test_activate_deletes_previous_version_stores() {
    let config = WorkerConfig::new("v2", "https://news.example.com");
    let stores = MemoryStores::new();
    for name in ["static-news-v1", "dynamic-news-v1", "static-news-v2", "dynamic-news-v2"] {
      stores.open(name).unwrap();
    }
    let host = RecordingHost::new();

    let report = activate(&config, &stores, &host).await.unwrap();

    assert_eq!(
      report.deleted,
      vec!["dynamic-news-v1".to_string(), "static-news-v1".to_string()]
    );
    assert_eq!(
      stores.store_names().unwrap(),
      vec!["dynamic-news-v2".to_string(), "static-news-v2".to_string()]
    );
    assert!(host.claimed_clients());
  }

  #[tokio::test]
  async fn test_activate_with_nothing_stale_is_a_noop() {
    let config = WorkerConfig::new("v2", "https://news.example.com");
    let stores = MemoryStores::new();
    stores.open("static-news-v2").unwrap();
    stores.open("dynamic-news-v2").unwrap();
    let host = RecordingHost::new();

    let report = activate(&config, &stores, &host).await.unwrap();

    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(stores.store_names().unwrap().len(), 2);
  }

  /// Stores whose delete fails for one specific name.
  struct FlakyStores {
    inner: MemoryStores,
    failing: String,
  }

  impl NamedStores for FlakyStores {
    fn open(&self, name: &str) -> Result<()> {
      self.inner.open(name)
    }

    fn store_names(&self) -> Result<Vec<String>> {
      self.inner.store_names()
    }

    fn delete(&self, name: &str) -> Result<bool> {
      if name == self.failing {
        return Err(eyre!("store {} is busy", name));
      }
      self.inner.delete(name)
    }

    fn get(&self, store: &str, key: &RequestKey) -> Result<Option<StoredEntry>> {
      self.inner.get(store, key)
    }

    fn put(
      &self,
      store: &str,
      key: &RequestKey,
      response: crate::net::FetchResponse,
    ) -> Result<()> {
      self.inner.put(store, key, response)
    }
  }

  #[tokio::test]
  async fn test_one_failed_deletion_does_not_stop_the_sweep() {
    let config = WorkerConfig::new("v2", "https://news.example.com");
    let stores = FlakyStores {
      inner: MemoryStores::new(),
      failing: "dynamic-news-v1".to_string(),
    };
    for name in ["static-news-v1", "dynamic-news-v1", "static-news-v2"] {
      stores.open(name).unwrap();
    }
    let host = RecordingHost::new();

    let report = activate(&config, &stores, &host).await.unwrap();

    // The other stale store still went away, and activation completed.
    assert_eq!(report.deleted, vec!["static-news-v1".to_string()]);
    assert_eq!(report.failed, vec!["dynamic-news-v1".to_string()]);
    assert!(host.claimed_clients());
  }
}
