use color_eyre::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use crate::cache::NamedStores;
use crate::net::{FetchRequest, NetworkFetch};
use crate::worker::{FetchDecision, HostController, ServiceWorker};

/// Events the embedding host delivers to the worker. Exactly one handler
/// exists per event kind; fetch events answer through their sender.
#[derive(Debug)]
pub enum WorkerEvent {
  Install,
  Activate,
  Fetch {
    request: FetchRequest,
    respond_to: oneshot::Sender<Result<FetchDecision>>,
  },
}

/// Drive a worker from a host event stream.
///
/// Install and activate are awaited in place, preserving the host's
/// ordering guarantee (install completes before activate, activate before
/// any claimed fetch). Fetch events run as independent tasks and may
/// complete in any order. The loop ends when the host drops its sender.
pub async fn run_worker<S, N, H>(
  worker: ServiceWorker<S, N, H>,
  mut events: mpsc::UnboundedReceiver<WorkerEvent>,
) -> Result<()>
where
  S: NamedStores + 'static,
  N: NetworkFetch + 'static,
  H: HostController + 'static,
{
  while let Some(event) = events.recv().await {
    match event {
      WorkerEvent::Install => {
        if let Err(e) = worker.handle_install().await {
          error!("install failed: {:#}", e);
        }
      }
      WorkerEvent::Activate => {
        if let Err(e) = worker.handle_activate().await {
          error!("activate failed: {:#}", e);
        }
      }
      WorkerEvent::Fetch { request, respond_to } => {
        let worker = worker.clone();
        tokio::spawn(async move {
          let decision = worker.handle_fetch(&request).await;
          if respond_to.send(decision).is_err() {
            warn!("fetch caller went away before the response was ready");
          }
        });
      }
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStores, ResponseSource};
  use crate::config::WorkerConfig;
  use crate::testutil::{text_response, FakeNetwork, RecordingHost};

  #[tokio::test]
  async fn test_full_lifecycle_through_the_event_loop() {
    let config = WorkerConfig::new("v2", "https://news.example.com")
      .with_shell_assets(vec!["/index.html".to_string()]);
    let stores = MemoryStores::new();
    stores.open("static-news-v1").unwrap();

    let network = FakeNetwork::new()
      .with_response("https://news.example.com/index.html", text_response("<html>"))
      .with_response("https://news.example.com/api/news/top", text_response("[]"));

    let worker = ServiceWorker::new(config, stores, network, RecordingHost::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(run_worker(worker, rx));

    tx.send(WorkerEvent::Install).unwrap();
    tx.send(WorkerEvent::Activate).unwrap();

    let request = FetchRequest::get("https://news.example.com/index.html").unwrap();
    let (respond_to, response) = oneshot::channel();
    tx.send(WorkerEvent::Fetch { request, respond_to }).unwrap();

    let decision = response.await.unwrap().unwrap();
    match decision {
      FetchDecision::Respond(served) => {
        // Install ran before this fetch, so the shell came from the store.
        assert_eq!(served.source, ResponseSource::Cache);
      }
      FetchDecision::Ignore => panic!("shell asset was not served"),
    }

    drop(tx);
    driver.await.unwrap().unwrap();
  }
}
