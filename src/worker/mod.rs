//! The worker itself: one configuration, one set of collaborators, one
//! handler per lifecycle signal.

mod activate;
mod fetch;
mod host;
mod install;

pub use activate::{activate, ActivationReport};
pub use fetch::{classify, handle_fetch, FetchDecision, RequestClass};
pub use host::{HostController, LoggingHost};
pub use install::{install, InstallReport};

use std::sync::Arc;

use color_eyre::Result;

use crate::cache::NamedStores;
use crate::config::WorkerConfig;
use crate::net::{FetchRequest, NetworkFetch};

/// A worker instance bound to one configuration and one set of
/// collaborators. Clones are cheap and share the collaborators, so each
/// intercepted fetch can run as its own task.
pub struct ServiceWorker<S, N, H> {
  config: Arc<WorkerConfig>,
  stores: Arc<S>,
  network: Arc<N>,
  host: Arc<H>,
}

impl<S, N, H> Clone for ServiceWorker<S, N, H> {
  fn clone(&self) -> Self {
    Self {
      config: Arc::clone(&self.config),
      stores: Arc::clone(&self.stores),
      network: Arc::clone(&self.network),
      host: Arc::clone(&self.host),
    }
  }
}

impl<S, N, H> ServiceWorker<S, N, H>
where
  S: NamedStores,
  N: NetworkFetch,
  H: HostController,
{
  pub fn new(config: WorkerConfig, stores: S, network: N, host: H) -> Self {
    Self {
      config: Arc::new(config),
      stores: Arc::new(stores),
      network: Arc::new(network),
      host: Arc::new(host),
    }
  }

  pub fn config(&self) -> &WorkerConfig {
    &self.config
  }

  /// React to the install signal.
  pub async fn handle_install(&self) -> Result<InstallReport> {
    install(
      &self.config,
      self.stores.as_ref(),
      self.network.as_ref(),
      self.host.as_ref(),
    )
    .await
  }

  /// React to the activate signal.
  pub async fn handle_activate(&self) -> Result<ActivationReport> {
    activate(&self.config, self.stores.as_ref(), self.host.as_ref()).await
  }

  /// React to one intercepted request.
  pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchDecision> {
    handle_fetch(
      &self.config,
      self.stores.as_ref(),
      self.network.as_ref(),
      request,
    )
    .await
  }
}
