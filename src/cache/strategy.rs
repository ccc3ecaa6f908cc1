//! Retrieval strategies applied per request class.
//!
//! Both strategies take the fetcher as a closure, so the interceptor decides
//! what "the network" means and tests can script outcomes without a server.

use color_eyre::Result;
use std::future::Future;
use tracing::{debug, error, info};

use super::storage::NamedStores;
use crate::net::{FetchResponse, RequestKey};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Found in a store without touching the network.
  Cache,
  /// Live network response.
  Network,
  /// Network failed; a previously stored response stood in.
  OfflineFallback,
}

/// A response produced by one of the strategies.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: FetchResponse,
  pub source: ResponseSource,
}

/// Cache-first: prefer the stored entry, fall back to a live fetch on a
/// miss. The live result is not written back; shell assets only enter the
/// store at install time. If both the lookup misses and the fetch fails,
/// the failure is logged and propagated.
pub async fn cache_first<S, F, Fut>(
  stores: &S,
  store: &str,
  key: &RequestKey,
  fetcher: F,
) -> Result<Served>
where
  S: NamedStores + ?Sized,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<FetchResponse>>,
{
  if let Some(entry) = stores.get(store, key)? {
    debug!("serving {} from {}", key.url, store);
    return Ok(Served {
      response: entry.response,
      source: ResponseSource::Cache,
    });
  }

  match fetcher().await {
    Ok(response) => Ok(Served {
      response,
      source: ResponseSource::Network,
    }),
    Err(e) => {
      error!("{} missed {} and the network fetch failed: {:#}", key.url, store, e);
      Err(e)
    }
  }
}

/// Network-first: prefer a live fetch; a successful (2xx) response is also
/// written to the store, keyed by the request, so the same request can be
/// answered later while offline. On network failure the stored entry is
/// served instead, or the failure propagates if none was ever cached.
pub async fn network_first<S, F, Fut>(
  stores: &S,
  store: &str,
  key: &RequestKey,
  fetcher: F,
) -> Result<Served>
where
  S: NamedStores + ?Sized,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<FetchResponse>>,
{
  match fetcher().await {
    Ok(response) => {
      if response.is_success() {
        // The stored copy is a clone; the original goes back to the caller.
        stores.put(store, key, response.clone())?;
      }
      Ok(Served {
        response,
        source: ResponseSource::Network,
      })
    }
    Err(e) => match stores.get(store, key)? {
      Some(entry) => {
        info!(
          "network unavailable for {}, serving copy stored at {}",
          key.url, entry.stored_at
        );
        Ok(Served {
          response: entry.response,
          source: ResponseSource::OfflineFallback,
        })
      }
      None => Err(e),
    },
  }
}
