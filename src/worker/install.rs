//! Install handler: pre-populate the static store with the app shell.

use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use tracing::{info, warn};

use super::host::HostController;
use crate::cache::NamedStores;
use crate::config::WorkerConfig;
use crate::net::{FetchRequest, Method, NetworkFetch};

/// Outcome of an install pass. A failed asset never fails the install; it
/// is reported here instead.
#[derive(Debug, Default)]
pub struct InstallReport {
  pub cached: Vec<String>,
  pub failed: Vec<String>,
}

/// Open the static store, fetch every shell asset, and write the ones that
/// arrive. Assets are fetched concurrently and independently; an
/// unreachable asset (a CDN font, say) is logged and skipped, never
/// retried. Finishes by asking the host to skip the waiting phase.
pub async fn install<S, N, H>(
  config: &WorkerConfig,
  stores: &S,
  network: &N,
  host: &H,
) -> Result<InstallReport>
where
  S: NamedStores,
  N: NetworkFetch,
  H: HostController,
{
  let store = config.static_store_name();
  stores.open(&store)?;

  let store_name = store.as_str();
  let fetches = config.shell_assets.iter().map(|asset| async move {
    let result = precache_asset(config, stores, network, store_name, asset).await;
    (asset.as_str(), result)
  });

  let mut report = InstallReport::default();
  for (asset, result) in join_all(fetches).await {
    match result {
      Ok(()) => report.cached.push(asset.to_string()),
      Err(e) => {
        warn!("failed to pre-cache {}: {:#}", asset, e);
        report.failed.push(asset.to_string());
      }
    }
  }

  info!(
    "app shell installed into {}: {} cached, {} failed",
    store,
    report.cached.len(),
    report.failed.len()
  );

  host.skip_waiting().await?;
  Ok(report)
}

async fn precache_asset<S, N>(
  config: &WorkerConfig,
  stores: &S,
  network: &N,
  store: &str,
  asset: &str,
) -> Result<()>
where
  S: NamedStores,
  N: NetworkFetch,
{
  let url = config.asset_url(asset)?;
  let request = FetchRequest { method: Method::Get, url };

  let response = network.fetch(&request).await?;
  if !response.is_success() {
    return Err(eyre!("unexpected status {} for {}", response.status, asset));
  }

  stores.put(store, &request.key(), response)
}
