//! Host-platform lifecycle seam.

use async_trait::async_trait;
use color_eyre::Result;
use tracing::info;

/// Lifecycle control the host platform exposes to the worker: skipping the
/// wait for previous instances and taking over pages that are already open.
/// Both are deliberate relaxations of version isolation in exchange for
/// faster rollout of a new worker.
#[async_trait]
pub trait HostController: Send + Sync {
  /// Ask the host to activate this instance without waiting for old
  /// instances to wind down.
  async fn skip_waiting(&self) -> Result<()>;

  /// Take over request interception for pages opened before activation.
  async fn claim_clients(&self) -> Result<()>;
}

/// Default host hook that only records the transitions in the log. An
/// embedder with a real page registry supplies its own implementation.
#[derive(Debug, Default, Clone)]
pub struct LoggingHost;

#[async_trait]
impl HostController for LoggingHost {
  async fn skip_waiting(&self) -> Result<()> {
    info!("skipping wait for previous worker instances");
    Ok(())
  }

  async fn claim_clients(&self) -> Result<()> {
    info!("claiming open pages");
    Ok(())
  }
}
